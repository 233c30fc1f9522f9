use gtfs::{RouteID, StopID, Trip};

use crate::{Candidate, DirectionReference, ReferenceStop, RouteTripSpec, SplitError};

/// How well a trip's stops line up with a direction's reference stops, in order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Alignment {
    /// Number of trip stops matched to a reference stop, preserving order on both sides
    pub score: usize,
    /// How many of those matches are anchors
    pub anchors: usize,
}

impl Alignment {
    /// A direction with no matched anchor is never a candidate, no matter how many soft stops
    /// line up.
    pub fn is_eligible(&self) -> bool {
        self.anchors > 0
    }

    fn extend(self, matched: &ReferenceStop) -> Self {
        Self {
            score: self.score + 1,
            anchors: self.anchors + usize::from(matched.is_anchor()),
        }
    }
}

/// One trip lined up against one reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StopMatch {
    pub alignment: Alignment,
    /// The reference position each trip visit was matched to, one entry per visit. Increasing
    /// wherever present.
    pub positions: Vec<Option<usize>>,
}

/// The score of [`match_stops`].
pub fn align(trip: &[StopID], reference: &[ReferenceStop]) -> Alignment {
    match_stops(trip, reference).alignment
}

/// A longest common subsequence between the trip and the reference. Matches don't need to be
/// contiguous, so a trip skipping optional stops isn't penalized. The longest alignment holding
/// at least one anchor wins, even over a longer one made only of soft stops; among equally long
/// ones, more anchors win. Only if no anchor can be matched at all is the best soft-only
/// alignment returned, which is never eligible.
pub fn match_stops(trip: &[StopID], reference: &[ReferenceStop]) -> StopMatch {
    let rows = trip.len() + 1;
    let cols = reference.len() + 1;
    // any[i][j] is the best alignment of trip[..i] against reference[..j]. anchored[i][j] is the
    // same, restricted to alignments with an anchor.
    let mut any = vec![vec![Alignment::default(); cols]; rows];
    let mut anchored: Vec<Vec<Option<Alignment>>> = vec![vec![None; cols]; rows];
    for i in 1..rows {
        for j in 1..cols {
            let mut best_any = any[i - 1][j].max(any[i][j - 1]);
            let mut best_anchored = anchored[i - 1][j].max(anchored[i][j - 1]);
            let rs = &reference[j - 1];
            if rs.stop == trip[i - 1] {
                let matched = any[i - 1][j - 1].extend(rs);
                best_any = best_any.max(matched);
                let matched_anchored = if rs.is_anchor() {
                    Some(matched)
                } else {
                    anchored[i - 1][j - 1].map(|a| a.extend(rs))
                };
                best_anchored = best_anchored.max(matched_anchored);
            }
            any[i][j] = best_any;
            anchored[i][j] = best_anchored;
        }
    }

    let (mut i, mut j) = (trip.len(), reference.len());
    let alignment = anchored[i][j].unwrap_or(any[i][j]);
    let mut in_anchored = anchored[i][j].is_some();
    let mut positions = vec![None; trip.len()];
    // Walk back, dropping trip visits before reference stops, so earlier visits are the ones
    // kept when several could match
    while i > 0 && j > 0 {
        if in_anchored {
            let here = anchored[i][j];
            if anchored[i - 1][j] == here {
                i -= 1;
                continue;
            }
            if anchored[i][j - 1] == here {
                j -= 1;
                continue;
            }
            // An anchor match is where the anchored alignment started
            if reference[j - 1].is_anchor() {
                in_anchored = false;
            }
        } else {
            let here = any[i][j];
            if any[i - 1][j] == here {
                i -= 1;
                continue;
            }
            if any[i][j - 1] == here {
                j -= 1;
                continue;
            }
        }
        positions[i - 1] = Some(j - 1);
        i -= 1;
        j -= 1;
    }

    StopMatch {
        alignment,
        positions,
    }
}

/// A trip bound to the direction it was classified into
#[derive(Clone, Debug)]
pub struct ClassifiedTrip<'a> {
    pub trip: &'a Trip,
    pub direction: &'a DirectionReference,
    pub alignment: Alignment,
    /// Where each visit of the trip landed in the direction's reference
    pub positions: Vec<Option<usize>>,
}

/// Picks the one direction of the route this trip belongs to. Fails if no direction aligns on
/// an anchor, or if the best score is tied.
pub fn classify_trip<'a>(
    spec: &'a RouteTripSpec,
    trip: &'a Trip,
) -> Result<ClassifiedTrip<'a>, SplitError> {
    let stops = trip.stops();
    let scored: Vec<(&'a DirectionReference, StopMatch)> = spec
        .directions()
        .iter()
        .map(|dir| (dir, match_stops(&stops, &dir.stops)))
        .collect();
    for (dir, m) in &scored {
        debug!(
            "{}: trip {} vs {} scored {:?}",
            spec.route_id, trip.orig_id, dir.tag, m.alignment
        );
    }

    let best_score = scored
        .iter()
        .filter(|(_, m)| m.alignment.is_eligible())
        .map(|(_, m)| m.alignment.score)
        .max();
    let mut winners = scored
        .iter()
        .filter(|(_, m)| m.alignment.is_eligible() && Some(m.alignment.score) == best_score);
    if let (Some((direction, m)), None) = (winners.next(), winners.next()) {
        return Ok(ClassifiedTrip {
            trip,
            direction: *direction,
            alignment: m.alignment,
            positions: m.positions.clone(),
        });
    }

    Err(ambiguous(&spec.route_id, trip, &scored))
}

fn ambiguous(
    route: &RouteID,
    trip: &Trip,
    scored: &[(&DirectionReference, StopMatch)],
) -> SplitError {
    SplitError::AmbiguousTrip {
        route: route.clone(),
        trip: trip.orig_id.clone(),
        candidates: scored
            .iter()
            .map(|(dir, m)| Candidate {
                tag: dir.tag,
                label: dir.label.clone(),
                score: m.alignment.score,
                anchors: m.alignment.anchors,
            })
            .collect(),
    }
}
