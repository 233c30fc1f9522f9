use std::path::PathBuf;

use chrono::NaiveDate;
use gtfs::{RouteID, GTFS};
use splitter::{
    run, AgencyConfig, DirectionTag, ErrorPolicy, OutputRoute, RunOptions, SplitError,
    SplitOutput,
};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../fixtures/comox")
        .join(name)
}

fn load() -> (GTFS, AgencyConfig) {
    let gtfs = GTFS::load(fixture("")).unwrap();
    let config = AgencyConfig::load(fixture("agency.toml")).unwrap();
    (gtfs, config)
}

fn directions(route: &OutputRoute) -> Vec<(&str, DirectionTag)> {
    route
        .trips
        .iter()
        .map(|t| (t.trip_id.0.as_str(), t.direction))
        .collect()
}

fn codes(route: &OutputRoute, trip: &str) -> Vec<String> {
    route
        .trip(trip)
        .unwrap()
        .visits
        .iter()
        .map(|v| v.stop_code.0.clone())
        .collect()
}

#[test]
fn splits_configured_routes() {
    let (gtfs, config) = load();
    let output = run(&gtfs, &config, RunOptions::default()).unwrap();
    assert!(output.skipped.is_empty());
    assert_eq!(output.agency_color.as_deref(), Some("34B233"));

    let route = output.route("295").unwrap();
    assert_eq!(route.short_name, "5");
    assert_eq!(route.color, "8E0C3A");
    assert_eq!(
        directions(route),
        vec![
            ("t295_n1", DirectionTag::North),
            ("t295_n2", DirectionTag::North),
            ("t295_s1", DirectionTag::South),
        ]
    );
    assert_eq!(route.trip("t295_s1").unwrap().headsign, "Downtown Courtenay");
    assert_eq!(route.directions.len(), 2);
    assert_eq!(route.directions[0].label, "Comox Valley Sports Ctr");

    let route = output.route("296").unwrap();
    assert_eq!(route.color, "49176D");
    assert_eq!(
        directions(route),
        vec![
            ("t296_a", DirectionTag::Counterclockwise0),
            ("t296_b", DirectionTag::Counterclockwise1),
        ]
    );
}

#[test]
fn ordinals_replace_stop_sequence() {
    let (gtfs, config) = load();
    let output = run(&gtfs, &config, RunOptions::default()).unwrap();
    let trip = output.route("295").unwrap().trip("t295_n2").unwrap();

    let ordinals: Vec<usize> = trip.visits.iter().map(|v| v.ordinal).collect();
    assert_eq!(ordinals, vec![1, 2, 3, 4]);
    let raw: Vec<u32> = trip.visits.iter().map(|v| v.raw_sequence).collect();
    assert_eq!(raw, vec![10, 20, 30, 40]);
    // Skips the two soft stops at positions 1 and 3
    let positions: Vec<Option<usize>> = trip.visits.iter().map(|v| v.position).collect();
    assert_eq!(positions, vec![Some(0), Some(2), Some(4), Some(5)]);
    assert_eq!(
        trip.visits[1].stop_name,
        "Fitzgerald Ave @ 26th St"
    );
}

#[test]
fn canonical_orders_merge_trips() {
    let (gtfs, config) = load();
    let output = run(&gtfs, &config, RunOptions::default()).unwrap();
    let route = output.route("295").unwrap();

    let north = &route.stop_orders[0];
    assert_eq!(north.tag, DirectionTag::North);
    let stops: Vec<&str> = north.stops.iter().map(|x| x.0.as_str()).collect();
    assert_eq!(
        stops,
        vec!["111486", "111296", "111278", "111337", "110270", "110526"]
    );
    assert_eq!(codes(route, "t295_s1"), vec!["110526", "111380", "111486"]);
}

#[test]
fn unsplit_routes_keep_feed_directions() {
    let (gtfs, config) = load();
    let output = run(&gtfs, &config, RunOptions::default()).unwrap();
    // No headsign rules for short name 6
    let route = output.route("296").unwrap();
    assert!(route.merged_from.is_empty());

    let mut config = config;
    config.split_routes.retain(|r| r.route_id.0 != "296");
    let output = run(&gtfs, &config, RunOptions::default()).unwrap();
    let route = output.route("296").unwrap();
    assert_eq!(route.long_name, "NIC / Downtown Exchange");
    assert!(route.directions.is_empty());
    assert!(route.stop_orders.is_empty());
    let a = route.trip("t296_a").unwrap();
    assert_eq!(a.direction, DirectionTag::Index(0));
    assert_eq!(a.headsign, "NIC");
    assert_eq!(a.visits[2].stop_name, "Ryan Rd @ Puntledge Rd");
    assert!(a.visits.iter().all(|v| v.position.is_none()));
    assert_eq!(route.trip("t296_b").unwrap().headsign, "Downtown");
}

#[test]
fn routes_sharing_a_short_name_merge() {
    let (gtfs, config) = load();
    let output = run(&gtfs, &config, RunOptions::default()).unwrap();
    assert!(output.route("16").is_none());

    let route = output.route("1").unwrap();
    assert_eq!(route.short_name, "1");
    assert_eq!(route.color, "004A8F");
    assert_eq!(route.merged_from, vec![RouteID("16".to_string())]);
    assert_eq!(route.long_name, "Comox Mall / Anfield Ctr Via N.I.C.");
    assert!(route.directions.is_empty());
    assert_eq!(
        directions(route),
        vec![
            ("t1_east", DirectionTag::East),
            ("t1_west", DirectionTag::West),
            ("t1_old", DirectionTag::West),
            ("t16_a", DirectionTag::East),
        ]
    );
    let east = route.trip("t1_east").unwrap();
    assert_eq!(east.visits[2].stop_code.0, "103874");
    assert_eq!(east.visits[2].stop_name, "E Ryan Rd @ Little River Rd");
    assert!(east.visits.iter().all(|v| v.position.is_none()));
}

#[test]
fn headsigns_merge_per_direction() {
    let (gtfs, config) = load();
    let output = run(&gtfs, &config, RunOptions::default()).unwrap();
    let route = output.route("1").unwrap();
    // Downtown folds into the other headsign of each direction
    for (trip, headsign) in [
        ("t1_east", "Comox Mall"),
        ("t16_a", "Comox Mall"),
        ("t1_west", "Anfield Ctr"),
        ("t1_old", "Anfield Ctr"),
    ] {
        assert_eq!(route.trip(trip).unwrap().headsign, headsign);
    }

    // With the old trip gone, westbound trips only say Downtown
    let options = RunOptions {
        active_since: NaiveDate::from_ymd_opt(2024, 6, 1),
        ..Default::default()
    };
    let output = run(&gtfs, &config, options).unwrap();
    let route = output.route("1").unwrap();
    assert_eq!(route.trip("t1_west").unwrap().headsign, "Downtown");
    assert_eq!(route.trip("t16_a").unwrap().headsign, "Comox Mall");
}

#[test]
fn unexpected_headsign() {
    let (gtfs, _) = load();
    let contents = std::fs::read_to_string(fixture("agency.toml"))
        .unwrap()
        .replace(
            r#"headsigns = ["Comox Mall Via N.I.C.", "Downtown"]"#,
            r#"headsigns = ["Comox Mall Via N.I.C."]"#,
        );
    let config = AgencyConfig::parse(&contents).unwrap();
    match run(&gtfs, &config, RunOptions::default()).unwrap_err() {
        SplitError::UnexpectedHeadsign {
            route,
            trip,
            direction_id,
            headsign,
        } => {
            assert_eq!(route.0, "16");
            assert_eq!(trip.0, "t16_a");
            assert_eq!(direction_id, 1);
            assert_eq!(headsign.as_deref(), Some("DOWNTOWN"));
        }
        x => panic!("unexpected {x}"),
    }

    // Route 1 still comes out, without 16 folded in
    let output = run(&gtfs, &config, with_policy(ErrorPolicy::SkipRoute)).unwrap();
    assert!(output.route("1").unwrap().merged_from.is_empty());
    assert_eq!(output.skipped.len(), 1);
}

#[test]
fn unmergeable_headsigns() {
    let (gtfs, mut config) = load();
    config.headsign_merges.clear();
    match run(&gtfs, &config, RunOptions::default()).unwrap_err() {
        SplitError::UnmergeableHeadsigns {
            route,
            direction,
            headsigns,
        } => {
            assert_eq!(route.0, "1");
            assert_eq!(direction, DirectionTag::East);
            assert_eq!(headsigns, vec!["Comox Mall", "Downtown"]);
        }
        x => panic!("unexpected {x}"),
    }

    let output = run(&gtfs, &config, with_policy(ErrorPolicy::SkipRoute)).unwrap();
    assert!(output.route("1").is_none());
    assert!(output.route("16").is_none());
    assert!(output.route("295").is_some());
}

#[test]
fn unmergeable_routes() {
    let (gtfs, mut config) = load();
    config.route_long_names.clear();
    match run(&gtfs, &config, RunOptions::default()).unwrap_err() {
        SplitError::UnmergeableRoutes {
            short_name,
            routes,
            long_names,
        } => {
            assert_eq!(short_name, "1");
            assert_eq!(
                routes,
                vec![RouteID("1".to_string()), RouteID("16".to_string())]
            );
            assert_eq!(
                long_names,
                vec!["Comox Mall / Anfield Ctr", "Comox Mall Via N.I.C."]
            );
        }
        x => panic!("unexpected {x}"),
    }
}

#[test]
fn filters_agency_and_services() {
    let (gtfs, config) = load();
    let output = run(&gtfs, &config, RunOptions::default()).unwrap();
    // Route 40 belongs to another agency
    assert!(output.route("40").is_none());
    assert!(output.route("1").unwrap().trip("t1_old").is_some());

    let options = RunOptions {
        active_since: NaiveDate::from_ymd_opt(2024, 6, 1),
        ..Default::default()
    };
    let output = run(&gtfs, &config, options).unwrap();
    assert!(output.route("1").unwrap().trip("t1_old").is_none());

    // Nothing runs after the end of the feed
    let options = RunOptions {
        active_since: NaiveDate::from_ymd_opt(2030, 1, 1),
        ..Default::default()
    };
    let output = run(&gtfs, &config, options).unwrap();
    assert!(output.routes.is_empty());
}

#[test]
fn parallel_matches_sequential() {
    let (gtfs, config) = load();
    let sequential = run(&gtfs, &config, RunOptions::default()).unwrap();
    let parallel = run(
        &gtfs,
        &config,
        RunOptions {
            parallel: true,
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(
        serde_json::to_string(&sequential).unwrap(),
        serde_json::to_string(&parallel).unwrap()
    );
}

// Drops the one soft stop that only southbound trips serve, so route 295 no longer covers it
fn uncovered_config() -> AgencyConfig {
    let contents = std::fs::read_to_string(fixture("agency.toml"))
        .unwrap()
        .replace(r#"stops = ["110526", "++ 111380", "111486"]"#, r#"stops = ["110526", "111486"]"#);
    AgencyConfig::parse(&contents).unwrap()
}

fn with_policy(policy: ErrorPolicy) -> RunOptions {
    RunOptions {
        policy,
        ..Default::default()
    }
}

#[test]
fn uncovered_stops_abort() {
    let (gtfs, _) = load();
    let config = uncovered_config();
    match run(&gtfs, &config, with_policy(ErrorPolicy::Abort)).unwrap_err() {
        SplitError::UncoveredStops { route, stops } => {
            assert_eq!(route.0, "295");
            assert_eq!(stops.len(), 1);
            assert_eq!(stops[0].0, "111380");
        }
        x => panic!("unexpected {x}"),
    }
}

#[test]
fn lenient_coverage_still_splits() {
    let (gtfs, _) = load();
    let mut config = uncovered_config();
    config.strict_coverage = false;
    let output = run(&gtfs, &config, RunOptions::default()).unwrap();
    let route = output.route("295").unwrap();
    let trip = route.trip("t295_s1").unwrap();
    assert_eq!(trip.direction, DirectionTag::South);
    assert_eq!(trip.visits[1].position, None);
}

#[test]
fn skip_route_carries_on() {
    let (gtfs, _) = load();
    let config = uncovered_config();
    let output: SplitOutput = run(&gtfs, &config, with_policy(ErrorPolicy::SkipRoute)).unwrap();
    assert!(output.route("295").is_none());
    assert!(output.route("296").is_some());
    assert_eq!(output.skipped.len(), 1);
    assert!(output.skipped[0].contains("111380"));
}

#[test]
fn collect_reports_everything() {
    let (gtfs, _) = load();
    let contents = std::fs::read_to_string(fixture("agency.toml"))
        .unwrap()
        .replace(r#"stops = ["110526", "++ 111380", "111486"]"#, r#"stops = ["110526", "111486"]"#)
        .replace(r#""1" = "004A8F""#, "");
    let config = AgencyConfig::parse(&contents).unwrap();
    match run(&gtfs, &config, with_policy(ErrorPolicy::Collect)).unwrap_err() {
        SplitError::Multiple(errors) => {
            // Routes 1 and 16 both lack a color
            assert_eq!(errors.len(), 3);
            assert!(errors
                .iter()
                .any(|e| matches!(e, SplitError::UnregisteredRouteColor { .. })));
            assert!(errors
                .iter()
                .any(|e| matches!(e, SplitError::UncoveredStops { .. })));
        }
        x => panic!("unexpected {x}"),
    }
}

#[test]
fn unknown_split_route() {
    let (gtfs, _) = load();
    let contents = std::fs::read_to_string(fixture("agency.toml"))
        .unwrap()
        .replace(r#"route_id = "296""#, r#"route_id = "999""#);
    let config = AgencyConfig::parse(&contents).unwrap();
    assert!(matches!(
        run(&gtfs, &config, RunOptions::default()),
        Err(SplitError::UnknownSplitRoute { .. })
    ));

    let output = run(&gtfs, &config, with_policy(ErrorPolicy::SkipRoute)).unwrap();
    // 296 passes through unsplit instead
    let route = output.route("296").unwrap();
    assert!(route.directions.is_empty());
    assert_eq!(output.skipped.len(), 1);
}
