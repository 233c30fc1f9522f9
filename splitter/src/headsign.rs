//! Headsigns of routes that aren't split by reference stops.

use std::collections::BTreeSet;

use gtfs::{RouteID, Trip};

use crate::clean::clean_trip_headsign;
use crate::{AgencyConfig, DirectionTag, SplitError};

/// The direction and headsign of one trip. Without rules for the short name, the feed direction
/// and cleaned feed headsign are kept. With rules, the trip's feed direction and raw headsign
/// must match one of them.
pub fn trip_headsign(
    route: &RouteID,
    short_name: &str,
    trip: &Trip,
    config: &AgencyConfig,
) -> Result<(DirectionTag, String), SplitError> {
    let unexpected = || SplitError::UnexpectedHeadsign {
        route: route.clone(),
        trip: trip.orig_id.clone(),
        direction_id: trip.direction_id,
        headsign: trip.headsign.clone(),
    };

    let mut rules = config.headsign_rules(short_name).peekable();
    if rules.peek().is_none() {
        return match trip.headsign {
            Some(ref x) => Ok((DirectionTag::Index(trip.direction_id), clean_trip_headsign(x))),
            None => Err(unexpected()),
        };
    }

    for rule in rules.filter(|r| r.direction_id == trip.direction_id) {
        match (&trip.headsign, &rule.blank_label) {
            (Some(x), _) if rule.headsigns.iter().any(|h| h.eq_ignore_ascii_case(x)) => {
                return Ok((rule.tag, clean_trip_headsign(x)));
            }
            (None, Some(label)) => {
                return Ok((rule.tag, label.clone()));
            }
            _ => {}
        }
    }
    Err(unexpected())
}

/// Picks the one headsign that trips of a direction share, merging two at a time.
pub fn merge_headsigns(
    route: &RouteID,
    short_name: &str,
    direction: DirectionTag,
    headsigns: &BTreeSet<String>,
    config: &AgencyConfig,
) -> Result<String, SplitError> {
    let mut iter = headsigns.iter();
    let mut merged = match iter.next() {
        Some(x) => x.clone(),
        None => return Ok(String::new()),
    };
    for next in iter {
        let rule = config
            .headsign_merges
            .iter()
            .filter(|rule| rule.short_name == short_name)
            .find(|rule| rule.headsigns.contains(&merged) && rule.headsigns.contains(next))
            .ok_or_else(|| SplitError::UnmergeableHeadsigns {
                route: route.clone(),
                direction,
                headsigns: headsigns.iter().cloned().collect(),
            })?;
        merged = rule.merged.clone();
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::make_trip;

    const CONFIG: &str = r#"
[[route_headsigns]]
short_name = "1"
direction_id = 1
tag = "EAST"
headsigns = ["Comox Mall Via N.I.C.", "Downtown"]
blank_label = "Comox Mall"

[[route_headsigns]]
short_name = "1"
direction_id = 0
tag = "WEST"
headsigns = ["Anfield Centre Via Downtown", "Downtown"]

[[headsign_merges]]
short_name = "1"
headsigns = ["Downtown", "Anfield Ctr"]
merged = "Anfield Ctr"

[[headsign_merges]]
short_name = "1"
headsigns = ["Downtown", "Comox Mall"]
merged = "Comox Mall"
"#;

    fn route() -> RouteID {
        RouteID("1".to_string())
    }

    fn trip(headsign: Option<&str>, direction_id: u8) -> Trip {
        let mut trip = make_trip("t1", &[]);
        trip.headsign = headsign.map(|x| x.to_string());
        trip.direction_id = direction_id;
        trip
    }

    #[test]
    fn rules_tag_trips() {
        let config = AgencyConfig::parse(CONFIG).unwrap();
        assert_eq!(
            trip_headsign(&route(), "1", &trip(Some("COMOX MALL VIA N.I.C."), 1), &config)
                .unwrap(),
            (DirectionTag::East, "Comox Mall".to_string())
        );
        assert_eq!(
            trip_headsign(&route(), "1", &trip(Some("Anfield Centre Via Downtown"), 0), &config)
                .unwrap(),
            (DirectionTag::West, "Anfield Ctr".to_string())
        );
        assert_eq!(
            trip_headsign(&route(), "1", &trip(None, 1), &config).unwrap(),
            (DirectionTag::East, "Comox Mall".to_string())
        );
    }

    #[test]
    fn unexpected_headsigns() {
        let config = AgencyConfig::parse(CONFIG).unwrap();
        // Right headsign, wrong feed direction
        assert!(matches!(
            trip_headsign(&route(), "1", &trip(Some("Comox Mall Via N.I.C."), 0), &config),
            Err(SplitError::UnexpectedHeadsign { direction_id: 0, .. })
        ));
        // West has no label for blank headsigns
        assert!(matches!(
            trip_headsign(&route(), "1", &trip(None, 0), &config),
            Err(SplitError::UnexpectedHeadsign { headsign: None, .. })
        ));
    }

    #[test]
    fn no_rules_keep_feed_headsigns() {
        let config = AgencyConfig::parse(CONFIG).unwrap();
        assert_eq!(
            trip_headsign(&route(), "6", &trip(Some("DOWNTOWN EXCHANGE"), 1), &config).unwrap(),
            (DirectionTag::Index(1), "Downtown Exch".to_string())
        );
        assert!(matches!(
            trip_headsign(&route(), "6", &trip(None, 0), &config),
            Err(SplitError::UnexpectedHeadsign { .. })
        ));
    }

    #[test]
    fn merging() {
        let config = AgencyConfig::parse(CONFIG).unwrap();
        let set = |xs: &[&str]| xs.iter().map(|x| x.to_string()).collect::<BTreeSet<_>>();

        assert_eq!(
            merge_headsigns(&route(), "1", DirectionTag::West, &set(&["Downtown", "Anfield Ctr"]), &config)
                .unwrap(),
            "Anfield Ctr"
        );
        assert_eq!(
            merge_headsigns(&route(), "1", DirectionTag::East, &set(&["Comox Mall"]), &config)
                .unwrap(),
            "Comox Mall"
        );
        match merge_headsigns(
            &route(),
            "1",
            DirectionTag::East,
            &set(&["Comox Mall", "Anfield Ctr"]),
            &config,
        ) {
            Err(SplitError::UnmergeableHeadsigns {
                direction,
                headsigns,
                ..
            }) => {
                assert_eq!(direction, DirectionTag::East);
                assert_eq!(headsigns, vec!["Anfield Ctr", "Comox Mall"]);
            }
            x => panic!("unexpected {x:?}"),
        }
        // Rules of other short names don't apply
        assert!(merge_headsigns(
            &route(),
            "2",
            DirectionTag::West,
            &set(&["Downtown", "Anfield Ctr"]),
            &config
        )
        .is_err());
    }
}
