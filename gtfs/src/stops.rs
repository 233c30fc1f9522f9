use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::{orig, IDMapping, StopID, UnknownID};

pub type UnknownStopError = UnknownID<orig::StopCode>;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Stop {
    pub id: StopID,
    pub orig_id: orig::StopID,
    pub code: orig::StopCode,
    pub name: Option<String>,
}

/// Looks up stops by their rider-facing code. Built once per feed and read-only afterwards.
#[derive(Clone, Serialize, Deserialize)]
pub struct StopIndex {
    by_code: BTreeMap<orig::StopCode, StopID>,
}

impl StopIndex {
    /// Fails if two stops share a code.
    pub fn new<'a, I: IntoIterator<Item = &'a Stop>>(stops: I) -> Result<Self> {
        let mut by_code = BTreeMap::new();
        for stop in stops {
            if let Some(other) = by_code.insert(stop.code.clone(), stop.id) {
                bail!(
                    "Stop code {} is used by both {:?} and {:?}",
                    stop.code,
                    other,
                    stop.id
                );
            }
        }
        Ok(Self { by_code })
    }

    pub fn lookup(&self, code: &str) -> Result<StopID, UnknownStopError> {
        let code = orig::StopCode(code.to_string());
        match self.by_code.get(&code) {
            Some(id) => Ok(*id),
            None => Err(UnknownID(code)),
        }
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

pub fn load<R: std::io::Read>(
    reader: R,
) -> Result<(BTreeMap<StopID, Stop>, IDMapping<orig::StopID, StopID>)> {
    let mut stops = BTreeMap::new();
    let mut ids = IDMapping::new();
    for rec in csv::Reader::from_reader(reader).deserialize() {
        let rec: Record = rec?;
        let id = ids.insert_new(rec.stop_id.clone())?;
        let code = match rec.stop_code {
            Some(code) if !code.trim().is_empty() => orig::StopCode(code.trim().to_string()),
            _ => orig::StopCode(rec.stop_id.0.clone()),
        };
        stops.insert(
            id,
            Stop {
                id,
                orig_id: rec.stop_id,
                code,
                name: rec.stop_name,
            },
        );
    }
    Ok((stops, ids))
}

#[derive(Deserialize)]
struct Record {
    stop_id: orig::StopID,
    stop_code: Option<String>,
    stop_name: Option<String>,
}
