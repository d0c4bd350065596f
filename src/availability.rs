//! Weekly availability of a doctor: a weekday by half-hour slot matrix.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{SlotTime, TimeSlot, Weekday};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AvailabilityError {
    #[error("{0} is unavailable, mark the day available before opening slots")]
    DayUnavailable(Weekday),
    #[error("{0} is outside the 09:00-17:00 working day")]
    UnknownSlot(SlotTime),
    #[error("the schedule has no entry for {0}")]
    MissingDay(Weekday),
    #[error("{day} is unavailable but has open slots")]
    OpenSlotOnUnavailableDay { day: Weekday },
    #[error("{day} must list exactly the working-day slots")]
    IncompleteDay { day: Weekday },
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DayAvailability {
    pub available: bool,
    pub slots: BTreeMap<SlotTime, bool>,
}

impl DayAvailability {
    fn uniform(available: bool) -> Self {
        Self {
            available,
            slots: SlotTime::working_day()
                .into_iter()
                .map(|time| (time, available))
                .collect(),
        }
    }

    pub fn open_slots(&self) -> impl Iterator<Item = SlotTime> + '_ {
        self.slots
            .iter()
            .filter(|(_, open)| **open)
            .map(|(time, _)| *time)
    }

    pub fn is_open(&self, time: SlotTime) -> bool {
        self.available && self.slots.get(&time).copied().unwrap_or(false)
    }
}

/// Serialized as `{"Monday": {"available": true, "slots": {"09:00": true, ...}}, ...}`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct AvailabilityGrid {
    days: BTreeMap<Weekday, DayAvailability>,
}

impl Default for AvailabilityGrid {
    fn default() -> Self {
        Self::seeded()
    }
}

impl AvailabilityGrid {
    /// Weekdays open 09:00-17:00, weekends closed.
    pub fn seeded() -> Self {
        Self {
            days: Weekday::ALL
                .into_iter()
                .map(|day| (day, DayAvailability::uniform(!day.is_weekend())))
                .collect(),
        }
    }

    pub fn day(&self, day: Weekday) -> Option<&DayAvailability> {
        self.days.get(&day)
    }

    /// Flips a day. Closing a day closes all of its slots; opening a day
    /// restores nothing.
    pub fn toggle_day(&mut self, day: Weekday) -> bool {
        let entry = self
            .days
            .entry(day)
            .or_insert_with(|| DayAvailability::uniform(false));
        entry.available = !entry.available;
        if !entry.available {
            entry.slots.values_mut().for_each(|open| *open = false);
        }
        entry.available
    }

    pub fn toggle_slot(&mut self, day: Weekday, time: SlotTime) -> Result<bool, AvailabilityError> {
        if !time.is_working_slot() {
            return Err(AvailabilityError::UnknownSlot(time));
        }
        let entry = self
            .days
            .get_mut(&day)
            .ok_or(AvailabilityError::MissingDay(day))?;
        if !entry.available {
            return Err(AvailabilityError::DayUnavailable(day));
        }
        let open = entry.slots.entry(time).or_insert(false);
        *open = !*open;
        Ok(*open)
    }

    /// Checks a submitted grid before it replaces the stored one.
    pub fn validate(&self) -> Result<(), AvailabilityError> {
        let working_day = SlotTime::working_day();
        for day in Weekday::ALL {
            let entry = self.days.get(&day).ok_or(AvailabilityError::MissingDay(day))?;
            if entry.slots.len() != working_day.len()
                || !working_day.iter().all(|time| entry.slots.contains_key(time))
            {
                return Err(AvailabilityError::IncompleteDay { day });
            }
            if !entry.available && entry.open_slots().next().is_some() {
                return Err(AvailabilityError::OpenSlotOnUnavailableDay { day });
            }
        }
        Ok(())
    }

    /// Slots offered for booking on `date`.
    pub fn slots_on(&self, date: NaiveDate) -> Vec<TimeSlot> {
        let day = self.days.get(&Weekday::of(date));
        SlotTime::working_day()
            .into_iter()
            .map(|time| TimeSlot {
                time,
                available: day.map(|entry| entry.is_open(time)).unwrap_or(false),
            })
            .collect()
    }

    pub fn is_open(&self, date: NaiveDate, time: SlotTime) -> bool {
        self.days
            .get(&Weekday::of(date))
            .map(|entry| entry.is_open(time))
            .unwrap_or(false)
    }
}
