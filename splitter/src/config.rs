use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use gtfs::{RouteID, StopIndex};
use serde::Deserialize;

use crate::{DirectionTag, Marker, ReferenceStop, RouteTripSpec, SplitError};

/// Everything specific to one agency. Loaded from TOML.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgencyConfig {
    /// Routes with a different, non-empty agency_id are dropped
    pub agency_id: Option<String>,
    pub agency_color: Option<String>,
    /// Only keep services whose ID contains this
    pub service_id_contains: Option<String>,
    /// Fail when a split route serves a stop none of its directions mention
    #[serde(default = "default_true")]
    pub strict_coverage: bool,
    /// Route short name to RRGGBB, for routes the feed doesn't color
    #[serde(default)]
    pub route_colors: BTreeMap<String, String>,
    #[serde(default)]
    pub split_routes: Vec<SplitRouteConfig>,
    /// Headsigns allowed per feed direction, for routes that aren't split. Routes whose short
    /// name has no entry here keep their cleaned feed headsigns.
    #[serde(default)]
    pub route_headsigns: Vec<HeadsignConfig>,
    /// How to pick one headsign when trips of one direction disagree
    #[serde(default)]
    pub headsign_merges: Vec<HeadsignMergeConfig>,
    /// Route short name to the long name used when routes sharing that short name are merged
    /// but don't agree on a long name
    #[serde(default)]
    pub route_long_names: BTreeMap<String, String>,
}

/// The feed headsigns expected on one feed direction of a route.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeadsignConfig {
    pub short_name: String,
    pub direction_id: u8,
    /// What trips matching this rule are tagged with
    pub tag: DirectionTag,
    /// Compared ignoring case, before cleanup
    pub headsigns: Vec<String>,
    /// Used for trips with no headsign at all. Without it, those trips are an error.
    pub blank_label: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeadsignMergeConfig {
    pub short_name: String,
    /// Cleaned headsigns that may be merged with each other
    pub headsigns: Vec<String>,
    pub merged: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SplitRouteConfig {
    pub route_id: RouteID,
    pub directions: Vec<DirectionConfig>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectionConfig {
    pub tag: DirectionTag,
    pub label: String,
    /// Stop codes, each optionally prefixed by a marker like `==` or `!=`
    pub stops: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl AgencyConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|err| anyhow!("{}: {err}", path.display()))?;
        let config = Self::parse(&contents)?;
        info!(
            "Loaded config from {} with {} split routes",
            path.display(),
            config.split_routes.len()
        );
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self, SplitError> {
        Ok(toml::from_str(contents)?)
    }

    /// The headsign rules for one short name. Empty if the route keeps its feed headsigns.
    pub fn headsign_rules<'a>(
        &'a self,
        short_name: &'a str,
    ) -> impl Iterator<Item = &'a HeadsignConfig> + 'a {
        self.route_headsigns
            .iter()
            .filter(move |rule| rule.short_name == short_name)
    }
}

impl SplitRouteConfig {
    /// Resolves stop codes against the feed.
    pub fn compile(&self, stop_index: &StopIndex) -> Result<RouteTripSpec, SplitError> {
        let mut builder = RouteTripSpec::builder(self.route_id.clone());
        for dir in &self.directions {
            let mut stops = Vec::new();
            for entry in &dir.stops {
                let (marker, code) =
                    Marker::parse_entry(entry).ok_or_else(|| SplitError::BadStopMarker {
                        route: self.route_id.clone(),
                        entry: entry.clone(),
                    })?;
                let stop = stop_index
                    .lookup(code)
                    .map_err(|source| SplitError::UnknownStop {
                        route: self.route_id.clone(),
                        source,
                    })?;
                stops.push(ReferenceStop { stop, marker });
            }
            builder = builder.direction(dir.tag, dir.label.clone(), stops);
        }
        builder.build()
    }
}
