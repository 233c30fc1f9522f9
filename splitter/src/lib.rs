//! Splits the trips of a GTFS route into named directions, using per-agency reference stop
//! lists, and orders each trip's stops against its direction.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

pub mod clean;
mod classify;
mod compare;
mod config;
mod context;
mod direction;
mod error;
mod headsign;
pub mod naming;
mod pipeline;
mod route_trip_spec;
mod sequence;

pub use classify::{align, classify_trip, match_stops, Alignment, ClassifiedTrip, StopMatch};
pub use compare::{canonical_stop_order, compare_early, is_earlier, CanonicalStop};
pub use config::{
    AgencyConfig, DirectionConfig, HeadsignConfig, HeadsignMergeConfig, SplitRouteConfig,
};
pub use context::{ErrorPolicy, RunContext, RunOptions};
pub use direction::{DirectionReference, DirectionTag, Marker, ReferenceStop};
pub use error::{Candidate, SplitError};
pub use headsign::{merge_headsigns, trip_headsign};
pub use pipeline::{
    run, DirectionStopOrder, OutputRoute, OutputTrip, OutputVisit, SplitOutput, SubTrip,
};
pub use route_trip_spec::{RouteTripSpec, RouteTripSpecBuilder, RouteTripSpecs};
pub use sequence::{sequence_trip, OrdinalStopVisit};
