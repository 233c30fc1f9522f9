use gtfs::{StopID, TripID};
use serde::Serialize;

use crate::{ClassifiedTrip, DirectionTag};

/// One stop visited by a classified trip, with where it falls in the direction's reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OrdinalStopVisit {
    pub trip: TripID,
    pub direction: DirectionTag,
    pub stop: StopID,
    /// 1-based, in the trip's visiting order. Replaces the feed's stop_sequence.
    pub ordinal: usize,
    pub raw_sequence: u32,
    /// Index into the direction's reference stops, if this visit could be matched there
    pub position: Option<usize>,
}

/// Resolves every visit of the trip to a position in its direction's reference, using the
/// alignment the trip was classified with. Positions only increase, so a loop visiting the same
/// stop twice gets the early pass first and the late pass second. Visits left out of the
/// alignment stay unresolved.
pub fn sequence_trip(classified: &ClassifiedTrip) -> Vec<OrdinalStopVisit> {
    let direction = classified.direction;
    classified
        .trip
        .stop_times
        .iter()
        .zip(&classified.positions)
        .enumerate()
        .map(|(idx, (st, position))| OrdinalStopVisit {
            trip: classified.trip.id,
            direction: direction.tag,
            stop: st.stop_id,
            ordinal: idx + 1,
            raw_sequence: st.sequence,
            position: *position,
        })
        .collect()
}
