use std::cmp::Ordering;

use gtfs::StopID;
use serde::Serialize;

use crate::{DirectionTag, OrdinalStopVisit};

/// Where a visit falls in its direction. Visits resolved against the reference come first,
/// ordered by position; the rest fall back to the feed's stop_sequence.
fn order_key(visit: &OrdinalStopVisit) -> (bool, usize) {
    match visit.position {
        Some(pos) => (false, pos),
        None => (true, visit.raw_sequence as usize),
    }
}

/// Is `a` logically before `b`? Each direction has its own order, so visits of different
/// directions can't be compared at all and get `None`. Within one direction this is a strict
/// weak ordering; two passes of the same stop are told apart by their reference positions.
pub fn compare_early(a: &OrdinalStopVisit, b: &OrdinalStopVisit) -> Option<Ordering> {
    if a.direction != b.direction {
        return None;
    }
    Some(order_key(a).cmp(&order_key(b)))
}

pub fn is_earlier(a: &OrdinalStopVisit, b: &OrdinalStopVisit) -> bool {
    compare_early(a, b) == Some(Ordering::Less)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CanonicalStop {
    pub stop: StopID,
    pub position: Option<usize>,
}

/// Merges the visits of every trip in one direction into a single stop list for display. Each
/// reference position used by any trip appears once; unresolved stops are appended in
/// stop_sequence order, once per stop.
pub fn canonical_stop_order<'a, I: IntoIterator<Item = &'a OrdinalStopVisit>>(
    direction: DirectionTag,
    visits: I,
) -> Vec<CanonicalStop> {
    let mut visits: Vec<&OrdinalStopVisit> = visits
        .into_iter()
        .filter(|v| v.direction == direction)
        .collect();
    visits.sort_by_key(|v| (order_key(v), v.stop));

    let mut result: Vec<CanonicalStop> = Vec::new();
    for v in visits {
        let duplicate = match v.position {
            Some(pos) => result.last().map(|last| last.position == Some(pos)).unwrap_or(false),
            None => result
                .iter()
                .any(|seen| seen.position.is_none() && seen.stop == v.stop),
        };
        if !duplicate {
            result.push(CanonicalStop {
                stop: v.stop,
                position: v.position,
            });
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use gtfs::TripID;

    use super::*;

    fn visit(
        direction: DirectionTag,
        stop: usize,
        raw_sequence: u32,
        position: Option<usize>,
    ) -> OrdinalStopVisit {
        OrdinalStopVisit {
            trip: TripID(0),
            direction,
            stop: StopID(stop),
            ordinal: 1,
            raw_sequence,
            position,
        }
    }

    #[test]
    fn resolved_positions_win() {
        let early = visit(DirectionTag::North, 7, 40, Some(1));
        let late = visit(DirectionTag::North, 7, 2, Some(4));
        assert!(is_earlier(&early, &late));
        assert!(!is_earlier(&late, &early));
        assert!(!is_earlier(&early, &early));
    }

    #[test]
    fn different_directions_are_never_compared() {
        // Stop Y is at position 4 going north and position 1 going south
        let north = visit(DirectionTag::North, 8, 4, Some(4));
        let south = visit(DirectionTag::South, 8, 1, Some(1));
        assert_eq!(compare_early(&north, &south), None);
        assert_eq!(compare_early(&south, &north), None);
        assert!(!is_earlier(&south, &north));
    }

    #[test]
    fn unresolved_fall_back_to_raw_sequence() {
        let a = visit(DirectionTag::Index(0), 1, 3, None);
        let b = visit(DirectionTag::Index(0), 2, 5, None);
        assert_eq!(compare_early(&a, &b), Some(Ordering::Less));

        let resolved = visit(DirectionTag::Index(0), 3, 9, Some(0));
        assert!(is_earlier(&resolved, &a));
    }

    #[test]
    fn canonical_order_merges_trips() {
        let north = DirectionTag::North;
        let visits = vec![
            // Trip skipping position 1
            visit(north, 10, 1, Some(0)),
            visit(north, 12, 2, Some(2)),
            // Full trip
            visit(north, 10, 1, Some(0)),
            visit(north, 11, 2, Some(1)),
            visit(north, 12, 3, Some(2)),
            visit(north, 99, 4, None),
            // Noise from another direction
            visit(DirectionTag::South, 12, 1, Some(0)),
        ];
        let order = canonical_stop_order(north, &visits);
        assert_eq!(
            order,
            vec![
                CanonicalStop {
                    stop: StopID(10),
                    position: Some(0)
                },
                CanonicalStop {
                    stop: StopID(11),
                    position: Some(1)
                },
                CanonicalStop {
                    stop: StopID(12),
                    position: Some(2)
                },
                CanonicalStop {
                    stop: StopID(99),
                    position: None
                },
            ]
        );
    }
}
