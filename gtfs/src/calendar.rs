use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use anyhow::Result;
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ServiceID(pub String);

impl fmt::Display for ServiceID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Calendar {
    pub services: BTreeMap<ServiceID, Service>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Service {
    pub service_id: ServiceID,
    pub days_of_week: DaysOfWeek,
    /// None when the service is only defined through calendar_dates.txt
    pub date_range: Option<(NaiveDate, NaiveDate)>,

    pub extra_days: BTreeSet<NaiveDate>,
    pub removed_days: BTreeSet<NaiveDate>,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct DaysOfWeek {
    pub monday: bool,
    pub tuesday: bool,
    pub wednesday: bool,
    pub thursday: bool,
    pub friday: bool,
    pub saturday: bool,
    pub sunday: bool,
}

impl Calendar {
    /// Services with at least one day of operation on or after `day`. Used to drop schedules
    /// that have already expired.
    pub fn services_active_since(&self, day: NaiveDate) -> BTreeSet<ServiceID> {
        self.services
            .values()
            .filter(|service| service.last_day().map(|last| last >= day).unwrap_or(false))
            .map(|service| service.service_id.clone())
            .collect()
    }
}

impl Service {
    fn dates_only(service_id: ServiceID) -> Self {
        Self {
            service_id,
            days_of_week: DaysOfWeek::default(),
            date_range: None,
            extra_days: BTreeSet::new(),
            removed_days: BTreeSet::new(),
        }
    }

    pub fn runs_on(&self, day: NaiveDate) -> bool {
        if self.extra_days.contains(&day) {
            return true;
        }
        if self.removed_days.contains(&day) {
            return false;
        }
        match self.date_range {
            Some((start, end)) => start <= day && day <= end && self.days_of_week.includes(&day),
            None => false,
        }
    }

    /// The last day this service operates, if it ever does.
    pub fn last_day(&self) -> Option<NaiveDate> {
        let mut last = self.extra_days.iter().next_back().copied();
        if let Some((start, end)) = self.date_range {
            let mut day = end;
            while day >= start {
                if self.runs_on(day) {
                    last = last.max(Some(day));
                    break;
                }
                match day.pred_opt() {
                    Some(prev) => day = prev,
                    None => break,
                }
            }
        }
        last
    }
}

impl DaysOfWeek {
    pub fn includes(&self, day: &NaiveDate) -> bool {
        match day.weekday() {
            Weekday::Mon => self.monday,
            Weekday::Tue => self.tuesday,
            Weekday::Wed => self.wednesday,
            Weekday::Thu => self.thursday,
            Weekday::Fri => self.friday,
            Weekday::Sat => self.saturday,
            Weekday::Sun => self.sunday,
        }
    }
}

pub fn load<R: std::io::Read>(reader: R) -> Result<Calendar> {
    let mut calendar = Calendar::default();
    for rec in csv::Reader::from_reader(reader).deserialize() {
        let rec: Record = rec?;
        if calendar.services.contains_key(&rec.service_id) {
            bail!("Duplicate {:?}", rec.service_id);
        }
        calendar.services.insert(
            rec.service_id.clone(),
            Service {
                service_id: rec.service_id,
                days_of_week: DaysOfWeek {
                    monday: rec.monday,
                    tuesday: rec.tuesday,
                    wednesday: rec.wednesday,
                    thursday: rec.thursday,
                    friday: rec.friday,
                    saturday: rec.saturday,
                    sunday: rec.sunday,
                },
                date_range: Some((parse_date(&rec.start_date)?, parse_date(&rec.end_date)?)),

                extra_days: BTreeSet::new(),
                removed_days: BTreeSet::new(),
            },
        );
    }
    Ok(calendar)
}

pub fn load_exceptions<R: std::io::Read>(calendar: &mut Calendar, reader: R) -> Result<()> {
    for rec in csv::Reader::from_reader(reader).deserialize() {
        let rec: DateRecord = rec?;
        let date = parse_date(&rec.date)?;
        let service = calendar
            .services
            .entry(rec.service_id.clone())
            .or_insert_with(|| Service::dates_only(rec.service_id));
        if rec.exception_type == 1 {
            service.extra_days.insert(date);
        } else if rec.exception_type == 2 {
            service.removed_days.insert(date);
        } else {
            bail!("Unknown exception_type {}", rec.exception_type);
        }
    }
    Ok(())
}

fn parse_date(x: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(x, "%Y%m%d").map_err(|err| anyhow!("bad date {x}: {err}"))
}

#[derive(Deserialize)]
struct Record {
    service_id: ServiceID,
    #[serde(deserialize_with = "parse_bool")]
    monday: bool,
    #[serde(deserialize_with = "parse_bool")]
    tuesday: bool,
    #[serde(deserialize_with = "parse_bool")]
    wednesday: bool,
    #[serde(deserialize_with = "parse_bool")]
    thursday: bool,
    #[serde(deserialize_with = "parse_bool")]
    friday: bool,
    #[serde(deserialize_with = "parse_bool")]
    saturday: bool,
    #[serde(deserialize_with = "parse_bool")]
    sunday: bool,
    start_date: String,
    end_date: String,
}

fn parse_bool<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    let n = <u8>::deserialize(d)?;
    if n == 1 {
        return Ok(true);
    }
    if n == 0 {
        return Ok(false);
    }
    Err(serde::de::Error::custom(format!("Unknown bool value {n}")))
}

#[derive(Deserialize)]
struct DateRecord {
    service_id: ServiceID,
    date: String,
    exception_type: u8,
}
