#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod calendar;
mod ids;
mod routes;
mod stop_times;
mod stops;
mod trips;

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use zip::ZipArchive;

pub use calendar::{Calendar, DaysOfWeek, Service, ServiceID};
pub use ids::{orig, CheapID, IDMapping, StopID, TripID, UnknownID};
pub use routes::{Route, RouteID};
pub use stop_times::StopTime;
pub use stops::{Stop, StopIndex, UnknownStopError};
pub use trips::Trip;

#[derive(Clone, Serialize, Deserialize)]
pub struct GTFS {
    pub stops: BTreeMap<StopID, Stop>,
    pub stop_index: StopIndex,
    // Each route owns its trips
    pub routes: BTreeMap<RouteID, Route>,
    pub calendar: Calendar,
}

impl GTFS {
    /// Reads a feed from either a zip archive or an unzipped directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut source = if path.is_dir() {
            Source::Dir(path.to_path_buf())
        } else {
            let file = File::open(path).map_err(|err| anyhow!("{}: {err}", path.display()))?;
            Source::Zip(ZipArchive::new(file)?)
        };
        Self::load_from_source(&mut source)
    }

    pub fn load_from_zip<R: std::io::Read + std::io::Seek>(
        archive: ZipArchive<R>,
    ) -> Result<Self> {
        Self::load_from_source(&mut Source::Zip(archive))
    }

    fn load_from_source<R: std::io::Read + std::io::Seek>(
        source: &mut Source<R>,
    ) -> Result<Self> {
        let (stops, stop_ids) = stops::load(source.open("stops.txt")?)?;
        let stop_index = StopIndex::new(stops.values())?;
        let mut routes = routes::load(source.open("routes.txt")?)?;
        let (trips, trip_ids) = trips::load(source.open("trips.txt")?)?;
        let mut stop_times =
            stop_times::load(source.open("stop_times.txt")?, &stop_ids, &trip_ids)?;
        info!(
            "Loaded {} stops, {} routes, {} trips",
            stops.len(),
            routes.len(),
            trips.len()
        );

        for mut trip in trips {
            trip.stop_times = match stop_times.remove(&trip.id) {
                Some(list) => list,
                None => bail!("Trip {:?} has no stop times", trip.orig_id),
            };
            match routes.get_mut(&trip.route_id) {
                Some(route) => route.trips.push(trip),
                None => bail!("Trip {:?} belongs to unknown {:?}", trip.orig_id, trip.route_id),
            }
        }

        let mut calendar = match source.maybe_open("calendar.txt")? {
            Some(file) => calendar::load(file)?,
            None => Calendar::default(),
        };
        if let Some(file) = source.maybe_open("calendar_dates.txt")? {
            calendar::load_exceptions(&mut calendar, file)?;
        }

        Ok(Self {
            stops,
            stop_index,
            routes,
            calendar,
        })
    }

    pub fn stop_code(&self, id: StopID) -> &orig::StopCode {
        &self.stops[&id].code
    }
}

enum Source<R> {
    Dir(PathBuf),
    Zip(ZipArchive<R>),
}

impl<R: std::io::Read + std::io::Seek> Source<R> {
    // Adds the path in the error message
    fn open(&mut self, name: &str) -> Result<Box<dyn Read + '_>> {
        match self.maybe_open(name)? {
            Some(file) => Ok(file),
            None => bail!("{name} is missing from the feed"),
        }
    }

    fn maybe_open(&mut self, name: &str) -> Result<Option<Box<dyn Read + '_>>> {
        match self {
            Source::Dir(dir) => {
                let path = dir.join(name);
                if !path.exists() {
                    return Ok(None);
                }
                let file = File::open(&path).map_err(|err| anyhow!("{}: {err}", path.display()))?;
                Ok(Some(Box::new(file)))
            }
            Source::Zip(archive) => match archive.by_name(name) {
                Ok(file) => Ok(Some(Box::new(file))),
                Err(zip::result::ZipError::FileNotFound) => Ok(None),
                Err(err) => Err(anyhow!("{name}: {err}")),
            },
        }
    }
}
