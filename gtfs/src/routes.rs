use std::collections::BTreeMap;
use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::Trip;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RouteID(pub String);

impl fmt::Display for RouteID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Route {
    pub route_id: RouteID,
    pub agency_id: Option<String>,
    pub short_name: Option<String>,
    pub long_name: Option<String>,
    /// RRGGBB, no leading `#`
    pub color: Option<String>,

    // In file order
    pub trips: Vec<Trip>,
}

impl Route {
    pub fn describe(&self) -> String {
        let name = self
            .short_name
            .as_ref()
            .or(self.long_name.as_ref())
            .map(|x| x.to_string())
            .unwrap_or_else(|| self.route_id.to_string());
        format!("{name} ({})", self.route_id)
    }
}

pub fn load<R: std::io::Read>(reader: R) -> Result<BTreeMap<RouteID, Route>> {
    let mut routes = BTreeMap::new();
    for rec in csv::Reader::from_reader(reader).deserialize() {
        let rec: Record = rec?;
        if routes.contains_key(&rec.route_id) {
            bail!("Duplicate {:?}", rec.route_id);
        }
        routes.insert(
            rec.route_id.clone(),
            Route {
                route_id: rec.route_id,
                agency_id: non_empty(rec.agency_id),
                short_name: non_empty(rec.route_short_name),
                long_name: non_empty(rec.route_long_name),
                color: non_empty(rec.route_color),

                trips: Vec::new(),
            },
        );
    }
    Ok(routes)
}

fn non_empty(x: Option<String>) -> Option<String> {
    x.map(|x| x.trim().to_string()).filter(|x| !x.is_empty())
}

#[derive(Deserialize)]
struct Record {
    route_id: RouteID,
    agency_id: Option<String>,
    route_short_name: Option<String>,
    route_long_name: Option<String>,
    route_color: Option<String>,
}
