use std::fmt;
use std::str::FromStr;

use gtfs::StopID;
use serde::{Deserialize, Serialize};

/// Distinguishes the logical directions of one route. Besides the compass and loop directions,
/// plain integers are allowed, matching GTFS `direction_id`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DirectionTag {
    North,
    South,
    East,
    West,
    Inbound,
    Outbound,
    Clockwise,
    Counterclockwise,
    Clockwise0,
    Clockwise1,
    Counterclockwise0,
    Counterclockwise1,
    Index(u8),
}

const NAMED_TAGS: [(DirectionTag, &str); 12] = [
    (DirectionTag::North, "NORTH"),
    (DirectionTag::South, "SOUTH"),
    (DirectionTag::East, "EAST"),
    (DirectionTag::West, "WEST"),
    (DirectionTag::Inbound, "INBOUND"),
    (DirectionTag::Outbound, "OUTBOUND"),
    (DirectionTag::Clockwise, "CLOCKWISE"),
    (DirectionTag::Counterclockwise, "COUNTERCLOCKWISE"),
    (DirectionTag::Clockwise0, "CLOCKWISE_0"),
    (DirectionTag::Clockwise1, "CLOCKWISE_1"),
    (DirectionTag::Counterclockwise0, "COUNTERCLOCKWISE_0"),
    (DirectionTag::Counterclockwise1, "COUNTERCLOCKWISE_1"),
];

impl fmt::Display for DirectionTag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            DirectionTag::North => "NORTH",
            DirectionTag::South => "SOUTH",
            DirectionTag::East => "EAST",
            DirectionTag::West => "WEST",
            DirectionTag::Inbound => "INBOUND",
            DirectionTag::Outbound => "OUTBOUND",
            DirectionTag::Clockwise => "CLOCKWISE",
            DirectionTag::Counterclockwise => "COUNTERCLOCKWISE",
            DirectionTag::Clockwise0 => "CLOCKWISE_0",
            DirectionTag::Clockwise1 => "CLOCKWISE_1",
            DirectionTag::Counterclockwise0 => "COUNTERCLOCKWISE_0",
            DirectionTag::Counterclockwise1 => "COUNTERCLOCKWISE_1",
            DirectionTag::Index(x) => return write!(f, "{x}"),
        };
        write!(f, "{name}")
    }
}

impl FromStr for DirectionTag {
    type Err = String;

    fn from_str(x: &str) -> Result<Self, Self::Err> {
        let x = x.trim();
        if let Ok(idx) = x.parse::<u8>() {
            return Ok(DirectionTag::Index(idx));
        }
        NAMED_TAGS
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(x))
            .map(|(tag, _)| *tag)
            .ok_or_else(|| format!("unknown direction tag {x:?}"))
    }
}

impl TryFrom<String> for DirectionTag {
    type Error = String;

    fn try_from(x: String) -> Result<Self, Self::Error> {
        x.parse()
    }
}

impl From<DirectionTag> for String {
    fn from(tag: DirectionTag) -> String {
        tag.to_string()
    }
}

/// How strongly a reference stop pins down the direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Marker {
    /// A trip of this direction is expected to pass here. Written `==`, or no marker at all.
    Anchor,
    /// Optional or bridging; a branch may skip it. Written `!=`, `++` or `<>`.
    Soft,
}

impl Marker {
    /// Splits a config entry like `"!= 111296"` into the marker and the stop code.
    pub fn parse_entry(entry: &str) -> Option<(Marker, &str)> {
        let entry = entry.trim();
        let (marker, code) = match entry.split_once(char::is_whitespace) {
            Some((prefix, rest)) => {
                let marker = match prefix {
                    "==" => Marker::Anchor,
                    "!=" | "++" | "<>" => Marker::Soft,
                    _ => return None,
                };
                (marker, rest.trim())
            }
            None => (Marker::Anchor, entry),
        };
        if code.is_empty() || code.contains(char::is_whitespace) {
            return None;
        }
        Some((marker, code))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceStop {
    pub stop: StopID,
    pub marker: Marker,
}

impl ReferenceStop {
    pub fn anchor(stop: StopID) -> Self {
        Self {
            stop,
            marker: Marker::Anchor,
        }
    }

    pub fn soft(stop: StopID) -> Self {
        Self {
            stop,
            marker: Marker::Soft,
        }
    }

    pub fn is_anchor(&self) -> bool {
        self.marker == Marker::Anchor
    }
}

/// One logical direction of a route: a headsign and the order trips are expected to visit
/// stops in. A stop may appear more than once on loops; earlier entries are the earlier pass.
#[derive(Clone, Debug, Serialize)]
pub struct DirectionReference {
    pub tag: DirectionTag,
    pub label: String,
    pub stops: Vec<ReferenceStop>,
}

impl DirectionReference {
    pub fn new(tag: DirectionTag, label: impl Into<String>, stops: Vec<ReferenceStop>) -> Self {
        Self {
            tag,
            label: label.into(),
            stops,
        }
    }
}
