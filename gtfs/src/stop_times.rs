use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::{orig, IDMapping, StopID, TripID};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StopTime {
    pub stop_id: StopID,
    /// As given by the feed. Only the relative order within one trip means anything.
    pub sequence: u32,
}

pub fn load<R: std::io::Read>(
    reader: R,
    stop_ids: &IDMapping<orig::StopID, StopID>,
    trip_ids: &IDMapping<orig::TripID, TripID>,
) -> Result<BTreeMap<TripID, Vec<StopTime>>> {
    let mut stop_times: BTreeMap<TripID, Vec<StopTime>> = BTreeMap::new();
    let mut unknown_trips = 0;
    for rec in csv::Reader::from_reader(reader).deserialize() {
        let rec: Record = rec?;
        let trip_id = match trip_ids.lookup(&rec.trip_id) {
            Ok(id) => id,
            Err(_) => {
                unknown_trips += 1;
                continue;
            }
        };
        stop_times.entry(trip_id).or_insert_with(Vec::new).push(StopTime {
            stop_id: stop_ids.lookup(&rec.stop_id)?,
            sequence: rec.stop_sequence,
        });
    }
    if unknown_trips > 0 {
        warn!("{unknown_trips} stop times defined for unknown trips");
    }

    // Sort by stop_sequence, in case the file isn't in order
    for (trip_id, list) in stop_times.iter_mut() {
        list.sort_by_key(|st| st.sequence);
        for pair in list.windows(2) {
            if pair[0].sequence == pair[1].sequence {
                bail!("{:?} repeats stop_sequence {}", trip_id, pair[0].sequence);
            }
        }
    }
    Ok(stop_times)
}

#[derive(Deserialize)]
struct Record {
    trip_id: orig::TripID,
    stop_id: orig::StopID,
    stop_sequence: u32,
}
