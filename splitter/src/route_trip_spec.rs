use std::collections::{BTreeMap, BTreeSet};

use gtfs::{RouteID, StopID};
use serde::Serialize;

use crate::{DirectionReference, DirectionTag, ReferenceStop, SplitError};

/// Describes how to split the trips of one route, which the feed lumps into a single direction,
/// into two or more logical directions.
#[derive(Clone, Debug, Serialize)]
pub struct RouteTripSpec {
    pub route_id: RouteID,
    // In declaration order
    directions: Vec<DirectionReference>,
}

impl RouteTripSpec {
    pub fn builder(route_id: RouteID) -> RouteTripSpecBuilder {
        RouteTripSpecBuilder {
            route_id,
            directions: Vec::new(),
        }
    }

    pub fn directions(&self) -> &[DirectionReference] {
        &self.directions
    }

    pub fn direction(&self, tag: DirectionTag) -> Option<&DirectionReference> {
        self.directions.iter().find(|d| d.tag == tag)
    }

    /// Every stop mentioned by any direction
    pub fn all_stops(&self) -> BTreeSet<StopID> {
        self.directions
            .iter()
            .flat_map(|d| d.stops.iter().map(|rs| rs.stop))
            .collect()
    }
}

pub struct RouteTripSpecBuilder {
    route_id: RouteID,
    directions: Vec<DirectionReference>,
}

impl RouteTripSpecBuilder {
    pub fn direction(
        mut self,
        tag: DirectionTag,
        label: impl Into<String>,
        stops: Vec<ReferenceStop>,
    ) -> Self {
        self.directions
            .push(DirectionReference::new(tag, label, stops));
        self
    }

    pub fn build(self) -> Result<RouteTripSpec, SplitError> {
        let route = self.route_id;
        if self.directions.len() < 2 {
            return Err(SplitError::TooFewDirections {
                route,
                count: self.directions.len(),
            });
        }
        let mut tags = BTreeSet::new();
        let mut labels = BTreeSet::new();
        for dir in &self.directions {
            if !tags.insert(dir.tag) {
                return Err(SplitError::DuplicateDirectionTag {
                    route,
                    tag: dir.tag,
                });
            }
            if !labels.insert(dir.label.as_str()) {
                return Err(SplitError::DuplicateDirectionLabel {
                    route,
                    label: dir.label.clone(),
                });
            }
            if dir.stops.is_empty() {
                return Err(SplitError::EmptyDirection {
                    route,
                    tag: dir.tag,
                });
            }
        }
        Ok(RouteTripSpec {
            route_id: route,
            directions: self.directions,
        })
    }
}

/// All of the routes under split management for one run
#[derive(Clone, Debug, Default, Serialize)]
pub struct RouteTripSpecs {
    specs: BTreeMap<RouteID, RouteTripSpec>,
}

impl RouteTripSpecs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any previous spec for the same route.
    pub fn insert(&mut self, spec: RouteTripSpec) {
        self.specs.insert(spec.route_id.clone(), spec);
    }

    pub fn get(&self, route: &RouteID) -> Option<&RouteTripSpec> {
        self.specs.get(route)
    }

    pub fn contains(&self, route: &RouteID) -> bool {
        self.specs.contains_key(route)
    }

    /// Empty if the route isn't split.
    pub fn directions_of(&self, route: &RouteID) -> &[DirectionReference] {
        self.specs
            .get(route)
            .map(|spec| spec.directions())
            .unwrap_or(&[])
    }

    /// One (tag, label) per direction, in declaration order. Each becomes a sub-trip of the
    /// route in the output.
    pub fn all_direction_labels(&self, route: &RouteID) -> Vec<(DirectionTag, &str)> {
        self.directions_of(route)
            .iter()
            .map(|d| (d.tag, d.label.as_str()))
            .collect()
    }

    pub fn routes(&self) -> impl Iterator<Item = &RouteID> {
        self.specs.keys()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
