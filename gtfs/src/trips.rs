use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::{orig, IDMapping, RouteID, ServiceID, StopID, StopTime, TripID};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Trip {
    pub id: TripID,
    pub orig_id: orig::TripID,
    pub route_id: RouteID,
    pub service_id: ServiceID,
    pub headsign: Option<String>,
    /// 0 or 1, straight from GTFS. Missing is treated as 0.
    pub direction_id: u8,

    pub stop_times: Vec<StopTime>,
}

impl Trip {
    pub fn stops(&self) -> Vec<StopID> {
        self.stop_times.iter().map(|st| st.stop_id).collect()
    }
}

pub fn load<R: std::io::Read>(reader: R) -> Result<(Vec<Trip>, IDMapping<orig::TripID, TripID>)> {
    let mut trips = Vec::new();
    let mut ids = IDMapping::new();
    for rec in csv::Reader::from_reader(reader).deserialize() {
        let rec: Record = rec?;
        let id = ids.insert_new(rec.trip_id.clone())?;
        trips.push(Trip {
            id,
            orig_id: rec.trip_id,
            route_id: rec.route_id,
            service_id: rec.service_id,
            headsign: rec.trip_headsign.filter(|x| !x.trim().is_empty()),
            direction_id: match rec.direction_id {
                Some(x @ (0 | 1)) => x,
                None => 0,
                x => bail!("Unknown direction_id {:?}", x),
            },

            stop_times: Vec::new(),
        });
    }
    Ok((trips, ids))
}

#[derive(Deserialize)]
struct Record {
    trip_id: orig::TripID,
    route_id: RouteID,
    service_id: ServiceID,
    trip_headsign: Option<String>,
    direction_id: Option<u8>,
}
