//! Everything that can stop a run. None of these are transient; they all mean the feed or the
//! agency config needs a human to look at it.

use gtfs::{orig, RouteID, UnknownStopError};
use serde::Serialize;

use crate::DirectionTag;

/// How one direction scored against a trip. Reported when a trip can't be classified.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub tag: DirectionTag,
    pub label: String,
    pub score: usize,
    pub anchors: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum SplitError {
    #[error("route {route}: unknown stop code {}", .source.0)]
    UnknownStop {
        route: RouteID,
        #[source]
        source: UnknownStopError,
    },

    #[error("route {route}: trip {trip} doesn't match exactly one direction ({})", describe_candidates(.candidates))]
    AmbiguousTrip {
        route: RouteID,
        trip: orig::TripID,
        candidates: Vec<Candidate>,
    },

    #[error("route {route}: stops {} are served but not in any direction", join(.stops))]
    UncoveredStops {
        route: RouteID,
        stops: Vec<orig::StopCode>,
    },

    #[error("route {route}: direction label {label:?} is used twice")]
    DuplicateDirectionLabel { route: RouteID, label: String },

    #[error("route {route}: direction {tag} is defined twice")]
    DuplicateDirectionTag { route: RouteID, tag: DirectionTag },

    #[error("route {route}: needs at least 2 directions, got {count}")]
    TooFewDirections { route: RouteID, count: usize },

    #[error("route {route}: direction {tag} has no stops")]
    EmptyDirection { route: RouteID, tag: DirectionTag },

    #[error("route {route}: can't parse reference stop {entry:?}")]
    BadStopMarker { route: RouteID, entry: String },

    #[error("route {route}: split is configured, but the feed has no such route")]
    UnknownSplitRoute { route: RouteID },

    #[error("route {route}: unexpected short name {short_name:?}")]
    UnexpectedRouteShortName {
        route: RouteID,
        short_name: Option<String>,
    },

    #[error("route {route}: no color in the feed and none registered for short name {short_name}")]
    UnregisteredRouteColor { route: RouteID, short_name: String },

    #[error("route {route}: trip {trip} has unexpected headsign {headsign:?} in direction {direction_id}")]
    UnexpectedHeadsign {
        route: RouteID,
        trip: orig::TripID,
        direction_id: u8,
        headsign: Option<String>,
    },

    #[error("route {route}: no rule merges headsigns {headsigns:?} of direction {direction}")]
    UnmergeableHeadsigns {
        route: RouteID,
        direction: DirectionTag,
        headsigns: Vec<String>,
    },

    #[error("routes {} share short name {short_name} but not long names {long_names:?}", join(.routes))]
    UnmergeableRoutes {
        short_name: String,
        routes: Vec<RouteID>,
        long_names: Vec<String>,
    },

    #[error("bad agency config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("{} errors:\n{}", .0.len(), describe_all(.0))]
    Multiple(Vec<SplitError>),
}

impl SplitError {
    /// The route this error is about, if it's about a single route.
    pub fn route(&self) -> Option<&RouteID> {
        match self {
            SplitError::UnknownStop { route, .. }
            | SplitError::AmbiguousTrip { route, .. }
            | SplitError::UncoveredStops { route, .. }
            | SplitError::DuplicateDirectionLabel { route, .. }
            | SplitError::DuplicateDirectionTag { route, .. }
            | SplitError::TooFewDirections { route, .. }
            | SplitError::EmptyDirection { route, .. }
            | SplitError::BadStopMarker { route, .. }
            | SplitError::UnknownSplitRoute { route }
            | SplitError::UnexpectedRouteShortName { route, .. }
            | SplitError::UnregisteredRouteColor { route, .. }
            | SplitError::UnexpectedHeadsign { route, .. }
            | SplitError::UnmergeableHeadsigns { route, .. } => Some(route),
            SplitError::UnmergeableRoutes { routes, .. } => routes.first(),
            SplitError::Config(_) | SplitError::Multiple(_) => None,
        }
    }
}

fn describe_candidates(candidates: &[Candidate]) -> String {
    if candidates.is_empty() {
        return "no directions".to_string();
    }
    candidates
        .iter()
        .map(|c| {
            format!(
                "{} {:?} scored {} with {} anchors",
                c.tag, c.label, c.score, c.anchors
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn join<T: std::fmt::Display>(xs: &[T]) -> String {
    xs.iter()
        .map(|x| x.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_all(errors: &[SplitError]) -> String {
    errors
        .iter()
        .map(|err| format!("- {err}"))
        .collect::<Vec<_>>()
        .join("\n")
}
