use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use chrono::NaiveDate;
use gtfs::{Route, RouteID, ServiceID, Trip, GTFS};
use serde::Serialize;

use crate::naming::route_short_name;
use crate::{AgencyConfig, RouteTripSpecs, SplitError};

/// What to do when one route can't be processed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ErrorPolicy {
    /// Stop the whole run at the first error
    Abort,
    /// Leave the route out, log why, and keep going. The run still succeeds.
    SkipRoute,
    /// Keep going to find every problem, then fail with all of them at once
    Collect,
}

impl FromStr for ErrorPolicy {
    type Err = String;

    fn from_str(x: &str) -> Result<Self, Self::Err> {
        match x {
            "abort" => Ok(ErrorPolicy::Abort),
            "skip-route" => Ok(ErrorPolicy::SkipRoute),
            "collect" => Ok(ErrorPolicy::Collect),
            _ => Err(format!(
                "unknown error policy {x:?}; use abort, skip-route, or collect"
            )),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RunOptions {
    pub policy: ErrorPolicy,
    /// Classify the trips of a route on all cores. The output is identical either way.
    pub parallel: bool,
    /// Drop services that stop running before this day
    pub active_since: Option<NaiveDate>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            policy: ErrorPolicy::Abort,
            parallel: false,
            active_since: None,
        }
    }
}

/// Everything scoped to one run over one feed. Nothing here outlives the run, so several runs
/// can happen side by side.
pub struct RunContext<'a> {
    pub gtfs: &'a GTFS,
    pub config: &'a AgencyConfig,
    pub options: RunOptions,
    /// None means every service is kept
    pub service_ids: Option<BTreeSet<ServiceID>>,
    pub specs: RouteTripSpecs,
    /// Filled in for every route that still has trips after filtering
    pub short_names: BTreeMap<RouteID, String>,

    errors: Vec<SplitError>,
    skipped_routes: BTreeSet<RouteID>,
}

impl<'a> RunContext<'a> {
    /// Works out which services to keep, compiles every split route against the feed's stops,
    /// and names the routes that survive filtering.
    pub fn new(
        gtfs: &'a GTFS,
        config: &'a AgencyConfig,
        options: RunOptions,
    ) -> Result<Self, SplitError> {
        let service_ids = useful_service_ids(gtfs, config, &options);
        let mut ctx = Self {
            gtfs,
            config,
            options,
            service_ids,
            specs: RouteTripSpecs::new(),
            short_names: BTreeMap::new(),
            errors: Vec::new(),
            skipped_routes: BTreeSet::new(),
        };

        for route in &config.split_routes {
            if !gtfs.routes.contains_key(&route.route_id) {
                ctx.report(SplitError::UnknownSplitRoute {
                    route: route.route_id.clone(),
                })?;
                continue;
            }
            match route.compile(&gtfs.stop_index) {
                Ok(spec) => ctx.specs.insert(spec),
                Err(err) => ctx.report(err)?,
            }
        }
        info!("{} routes are split by direction", ctx.specs.len());

        for route in gtfs.routes.values() {
            if ctx.excludes_route(route) || route.trips.iter().all(|t| ctx.excludes_trip(t)) {
                continue;
            }
            match route_short_name(route) {
                Ok(name) => {
                    ctx.short_names.insert(route.route_id.clone(), name);
                }
                Err(err) => ctx.report(err)?,
            }
        }
        Ok(ctx)
    }

    /// True if filtering left no service at all, so nothing should be emitted.
    pub fn excluding_all(&self) -> bool {
        self.service_ids
            .as_ref()
            .map(|ids| ids.is_empty())
            .unwrap_or(false)
    }

    pub fn excludes_route(&self, route: &Route) -> bool {
        if self.skipped_routes.contains(&route.route_id) {
            return true;
        }
        match (&self.config.agency_id, &route.agency_id) {
            (Some(wanted), Some(actual)) => wanted != actual,
            // No agency to discriminate
            _ => false,
        }
    }

    pub fn excludes_trip(&self, trip: &Trip) -> bool {
        match self.service_ids {
            Some(ref ids) => !ids.contains(&trip.service_id),
            None => false,
        }
    }

    /// Applies the error policy. Only returns an error when the run should stop right now.
    pub fn report(&mut self, err: SplitError) -> Result<(), SplitError> {
        match self.options.policy {
            ErrorPolicy::Abort => return Err(err),
            ErrorPolicy::SkipRoute => warn!("Skipping: {err}"),
            ErrorPolicy::Collect => error!("{err}"),
        }
        if let Some(route) = err.route() {
            self.skipped_routes.insert(route.clone());
        }
        self.errors.push(err);
        Ok(())
    }

    /// Everything reported so far, consuming the context. With `Collect`, any error fails the
    /// run here.
    pub fn finish(self) -> Result<Vec<SplitError>, SplitError> {
        if self.options.policy == ErrorPolicy::Collect && !self.errors.is_empty() {
            let mut errors = self.errors;
            if errors.len() == 1 {
                return Err(errors.remove(0));
            }
            return Err(SplitError::Multiple(errors));
        }
        Ok(self.errors)
    }
}

fn useful_service_ids(
    gtfs: &GTFS,
    config: &AgencyConfig,
    options: &RunOptions,
) -> Option<BTreeSet<ServiceID>> {
    if config.service_id_contains.is_none() && options.active_since.is_none() {
        return None;
    }
    let mut ids = match options.active_since {
        Some(day) => gtfs.calendar.services_active_since(day),
        None => gtfs.calendar.services.keys().cloned().collect(),
    };
    if let Some(ref part) = config.service_id_contains {
        ids.retain(|id| id.0.contains(part.as_str()));
    }
    info!(
        "Keeping {} of {} services",
        ids.len(),
        gtfs.calendar.services.len()
    );
    Some(ids)
}
