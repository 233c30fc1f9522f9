use std::collections::{BTreeMap, BTreeSet};

use gtfs::{orig, Route, RouteID, StopID, Trip, GTFS};
use rayon::prelude::*;
use serde::Serialize;

use crate::clean::clean_stop_name;
use crate::naming::{route_color, route_long_name};
use crate::{
    canonical_stop_order, classify_trip, merge_headsigns, sequence_trip, trip_headsign,
    AgencyConfig, ClassifiedTrip, DirectionTag, OrdinalStopVisit, RouteTripSpec, RunContext,
    RunOptions, SplitError,
};

#[derive(Debug, Serialize)]
pub struct SplitOutput {
    pub agency_color: Option<String>,
    pub routes: Vec<OutputRoute>,
    /// Why routes were left out, when the error policy allowed carrying on
    pub skipped: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct OutputRoute {
    pub route_id: RouteID,
    pub short_name: String,
    pub long_name: String,
    pub color: String,
    /// Empty unless the route is split by direction
    pub directions: Vec<SubTrip>,
    pub trips: Vec<OutputTrip>,
    /// One merged stop list per direction. Empty unless the route is split.
    pub stop_orders: Vec<DirectionStopOrder>,
    /// Other feed routes with the same short name, folded into this one
    pub merged_from: Vec<RouteID>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SubTrip {
    pub tag: DirectionTag,
    pub label: String,
}

#[derive(Debug, Serialize)]
pub struct OutputTrip {
    pub trip_id: orig::TripID,
    pub direction: DirectionTag,
    pub headsign: String,
    pub visits: Vec<OutputVisit>,
}

#[derive(Debug, Serialize)]
pub struct OutputVisit {
    pub stop_code: orig::StopCode,
    pub stop_name: String,
    pub ordinal: usize,
    pub raw_sequence: u32,
    pub position: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct DirectionStopOrder {
    pub tag: DirectionTag,
    pub stops: Vec<orig::StopCode>,
}

impl SplitOutput {
    pub fn route(&self, id: &str) -> Option<&OutputRoute> {
        self.routes.iter().find(|r| r.route_id.0 == id)
    }
}

impl OutputRoute {
    pub fn trip(&self, id: &str) -> Option<&OutputTrip> {
        self.trips.iter().find(|t| t.trip_id.0 == id)
    }
}

/// Splits every route of the feed that the agency config asks for, and passes the rest through
/// with their feed directions.
pub fn run(
    gtfs: &GTFS,
    config: &AgencyConfig,
    options: RunOptions,
) -> Result<SplitOutput, SplitError> {
    let mut ctx = RunContext::new(gtfs, config, options)?;
    let mut routes = Vec::new();

    if ctx.excluding_all() {
        warn!("No service left after filtering, so nothing to emit");
    } else {
        for route in gtfs.routes.values() {
            if ctx.excludes_route(route) {
                debug!("Ignoring {}", route.describe());
                continue;
            }
            match process_route(&ctx, route) {
                Ok(Some(output)) => routes.push(output),
                Ok(None) => debug!("{} has no trips left after filtering", route.describe()),
                Err(errors) => {
                    for err in errors {
                        ctx.report(err)?;
                    }
                }
            }
        }
    }

    let routes = merge_routes(&mut ctx, routes)?;
    let agency_color = ctx.config.agency_color.clone();
    let skipped = ctx.finish()?.iter().map(|err| err.to_string()).collect();
    info!("Emitting {} routes", routes.len());
    Ok(SplitOutput {
        agency_color,
        routes,
        skipped,
    })
}

fn process_route(
    ctx: &RunContext,
    route: &Route,
) -> Result<Option<OutputRoute>, Vec<SplitError>> {
    let trips: Vec<&Trip> = route
        .trips
        .iter()
        .filter(|trip| !ctx.excludes_trip(trip))
        .collect();
    if trips.is_empty() {
        return Ok(None);
    }

    let short_name = match ctx.short_names.get(&route.route_id) {
        Some(name) => name.clone(),
        None => return Ok(None),
    };
    let color = route_color(route, &short_name, ctx.config).map_err(|err| vec![err])?;

    let mut output = OutputRoute {
        route_id: route.route_id.clone(),
        short_name,
        long_name: route_long_name(route),
        color,
        directions: Vec::new(),
        trips: Vec::new(),
        stop_orders: Vec::new(),
        merged_from: Vec::new(),
    };
    match ctx.specs.get(&route.route_id) {
        Some(spec) => split_route(ctx, spec, &trips, &mut output)?,
        None => {
            let mut errors = Vec::new();
            for trip in trips {
                match unsplit_trip(ctx, &output, trip) {
                    Ok(x) => output.trips.push(x),
                    Err(err) => errors.push(err),
                }
            }
            if !errors.is_empty() {
                return Err(errors);
            }
        }
    }
    Ok(Some(output))
}

fn split_route(
    ctx: &RunContext,
    spec: &RouteTripSpec,
    trips: &[&Trip],
    output: &mut OutputRoute,
) -> Result<(), Vec<SplitError>> {
    check_coverage(ctx, spec, trips).map_err(|err| vec![err])?;

    let results: Vec<_> = if ctx.options.parallel {
        trips
            .par_iter()
            .map(|trip| classify_and_sequence(spec, *trip))
            .collect()
    } else {
        trips
            .iter()
            .map(|trip| classify_and_sequence(spec, *trip))
            .collect()
    };

    let mut errors = Vec::new();
    let mut classified = Vec::new();
    for result in results {
        match result {
            Ok(x) => classified.push(x),
            Err(err) => errors.push(err),
        }
    }
    if !errors.is_empty() {
        return Err(errors);
    }

    output.directions = ctx
        .specs
        .all_direction_labels(&spec.route_id)
        .into_iter()
        .map(|(tag, label)| SubTrip {
            tag,
            label: label.to_string(),
        })
        .collect();
    for dir in spec.directions() {
        let stops = canonical_stop_order(
            dir.tag,
            classified.iter().flat_map(|(_, visits)| visits.iter()),
        );
        output.stop_orders.push(DirectionStopOrder {
            tag: dir.tag,
            stops: stops
                .into_iter()
                .map(|x| ctx.gtfs.stop_code(x.stop).clone())
                .collect(),
        });
    }
    output.trips = classified
        .iter()
        .map(|(c, visits)| OutputTrip {
            trip_id: c.trip.orig_id.clone(),
            direction: c.direction.tag,
            headsign: c.direction.label.clone(),
            visits: visits.iter().map(|v| output_visit(ctx.gtfs, v)).collect(),
        })
        .collect();
    Ok(())
}

fn classify_and_sequence<'a>(
    spec: &'a RouteTripSpec,
    trip: &'a Trip,
) -> Result<(ClassifiedTrip<'a>, Vec<OrdinalStopVisit>), SplitError> {
    let classified = classify_trip(spec, trip)?;
    let visits = sequence_trip(&classified);
    Ok((classified, visits))
}

/// Every stop the route serves must appear in at least one direction, or some trip will be
/// sequenced with holes.
fn check_coverage(
    ctx: &RunContext,
    spec: &RouteTripSpec,
    trips: &[&Trip],
) -> Result<(), SplitError> {
    let known = spec.all_stops();
    let uncovered: BTreeSet<StopID> = trips
        .iter()
        .flat_map(|trip| trip.stop_times.iter().map(|st| st.stop_id))
        .filter(|stop| !known.contains(stop))
        .collect();
    if uncovered.is_empty() {
        return Ok(());
    }

    let err = SplitError::UncoveredStops {
        route: spec.route_id.clone(),
        stops: uncovered
            .into_iter()
            .map(|stop| ctx.gtfs.stop_code(stop).clone())
            .collect(),
    };
    if ctx.config.strict_coverage {
        return Err(err);
    }
    warn!("{err}");
    Ok(())
}

fn unsplit_trip(
    ctx: &RunContext,
    route: &OutputRoute,
    trip: &Trip,
) -> Result<OutputTrip, SplitError> {
    let (direction, headsign) =
        trip_headsign(&route.route_id, &route.short_name, trip, ctx.config)?;
    Ok(OutputTrip {
        trip_id: trip.orig_id.clone(),
        direction,
        headsign,
        visits: trip
            .stop_times
            .iter()
            .enumerate()
            .map(|(idx, st)| OutputVisit {
                stop_code: ctx.gtfs.stop_code(st.stop_id).clone(),
                stop_name: stop_name(ctx.gtfs, st.stop_id),
                ordinal: idx + 1,
                raw_sequence: st.sequence,
                position: None,
            })
            .collect(),
    })
}

/// Folds routes sharing a short name into the first of them, then settles on one headsign per
/// direction for routes with headsign rules. Routes that can't be merged are reported and left
/// out.
fn merge_routes(
    ctx: &mut RunContext,
    routes: Vec<OutputRoute>,
) -> Result<Vec<OutputRoute>, SplitError> {
    // Keep the order routes first appear in
    let mut order: Vec<String> = Vec::new();
    let mut groups: BTreeMap<String, Vec<OutputRoute>> = BTreeMap::new();
    for route in routes {
        if !groups.contains_key(&route.short_name) {
            order.push(route.short_name.clone());
        }
        groups
            .entry(route.short_name.clone())
            .or_insert_with(Vec::new)
            .push(route);
    }

    let mut result = Vec::new();
    for short_name in order {
        let mut group = groups.remove(&short_name).unwrap_or_default().into_iter();
        let first = match group.next() {
            Some(x) => x,
            None => continue,
        };
        let merged = merge_group(ctx.config, first, group.collect())
            .and_then(|route| merge_trip_headsigns(ctx.config, route));
        match merged {
            Ok(route) => result.push(route),
            Err(err) => ctx.report(err)?,
        }
    }
    Ok(result)
}

fn merge_group(
    config: &AgencyConfig,
    mut first: OutputRoute,
    rest: Vec<OutputRoute>,
) -> Result<OutputRoute, SplitError> {
    if rest.is_empty() {
        return Ok(first);
    }

    if rest.iter().any(|r| r.long_name != first.long_name) {
        first.long_name = match config.route_long_names.get(&first.short_name) {
            Some(name) => name.clone(),
            None => {
                return Err(SplitError::UnmergeableRoutes {
                    short_name: first.short_name.clone(),
                    routes: std::iter::once(&first)
                        .chain(&rest)
                        .map(|r| r.route_id.clone())
                        .collect(),
                    long_names: std::iter::once(&first)
                        .chain(&rest)
                        .map(|r| r.long_name.clone())
                        .collect(),
                });
            }
        };
    }
    info!(
        "Merging {} routes into {} ({})",
        rest.len(),
        first.route_id,
        first.short_name
    );
    for route in rest {
        first.merged_from.push(route.route_id);
        for dir in route.directions {
            if !first.directions.contains(&dir) {
                first.directions.push(dir);
            }
        }
        first.trips.extend(route.trips);
        first.stop_orders.extend(route.stop_orders);
    }
    Ok(first)
}

/// Trips outside the split directions get one headsign per direction.
fn merge_trip_headsigns(
    config: &AgencyConfig,
    mut route: OutputRoute,
) -> Result<OutputRoute, SplitError> {
    if config.headsign_rules(&route.short_name).next().is_none() {
        return Ok(route);
    }
    let split: BTreeSet<DirectionTag> = route.directions.iter().map(|d| d.tag).collect();
    let mut per_direction: BTreeMap<DirectionTag, BTreeSet<String>> = BTreeMap::new();
    for trip in &route.trips {
        if !split.contains(&trip.direction) {
            per_direction
                .entry(trip.direction)
                .or_insert_with(BTreeSet::new)
                .insert(trip.headsign.clone());
        }
    }

    for (direction, headsigns) in per_direction {
        if headsigns.len() < 2 {
            continue;
        }
        let merged = merge_headsigns(
            &route.route_id,
            &route.short_name,
            direction,
            &headsigns,
            config,
        )?;
        debug!(
            "{}: {direction} headsigns {headsigns:?} become {merged}",
            route.route_id
        );
        for trip in route.trips.iter_mut().filter(|t| t.direction == direction) {
            trip.headsign = merged.clone();
        }
    }
    Ok(route)
}

fn output_visit(gtfs: &GTFS, visit: &OrdinalStopVisit) -> OutputVisit {
    OutputVisit {
        stop_code: gtfs.stop_code(visit.stop).clone(),
        stop_name: stop_name(gtfs, visit.stop),
        ordinal: visit.ordinal,
        raw_sequence: visit.raw_sequence,
        position: visit.position,
    }
}

fn stop_name(gtfs: &GTFS, stop: StopID) -> String {
    gtfs.stops[&stop]
        .name
        .as_deref()
        .map(clean_stop_name)
        .unwrap_or_default()
}
