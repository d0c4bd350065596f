use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use enum_display::EnumDisplay;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// First and last bookable slot of a working day, inclusive.
const DAY_START: (u32, u32) = (9, 0);
const DAY_END: (u32, u32) = (17, 0);
const SLOT_MINUTES: u32 = 30;

/// A half-hour slot start, written as `HH:MM` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotTime(NaiveTime);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("`{0}` is not a valid slot time, expected HH:MM on a half hour")]
pub struct InvalidSlotTime(pub String);

impl SlotTime {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        if minute % SLOT_MINUTES != 0 {
            return None;
        }
        NaiveTime::from_hms_opt(hour, minute, 0).map(SlotTime)
    }

    /// The 17 slots from 09:00 to 17:00 inclusive.
    pub fn working_day() -> Vec<SlotTime> {
        let start = DAY_START.0 * 60 + DAY_START.1;
        let end = DAY_END.0 * 60 + DAY_END.1;
        (start..=end)
            .step_by(SLOT_MINUTES as usize)
            .filter_map(|minutes| SlotTime::new(minutes / 60, minutes % 60))
            .collect()
    }

    pub fn is_working_slot(&self) -> bool {
        let minutes = self.0.hour() * 60 + self.0.minute();
        minutes >= DAY_START.0 * 60 + DAY_START.1 && minutes <= DAY_END.0 * 60 + DAY_END.1
    }
}

impl fmt::Display for SlotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl FromStr for SlotTime {
    type Err = InvalidSlotTime;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let time = NaiveTime::parse_from_str(s.trim(), "%H:%M")
            .map_err(|_| InvalidSlotTime(s.to_string()))?;
        SlotTime::new(time.hour(), time.minute()).ok_or_else(|| InvalidSlotTime(s.to_string()))
    }
}

impl Serialize for SlotTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SlotTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(
    Debug, EnumDisplay, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn of(date: NaiveDate) -> Self {
        date.weekday().into()
    }

    pub fn is_weekend(&self) -> bool {
        matches!(self, Weekday::Saturday | Weekday::Sunday)
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        Weekday::ALL[day.num_days_from_monday() as usize]
    }
}

impl FromStr for Weekday {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Weekday::ALL
            .into_iter()
            .find(|day| day.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("`{}` is not a day of the week", s))
    }
}

/// One bookable slot for a doctor on a given date.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TimeSlot {
    pub time: SlotTime,
    pub available: bool,
}
