use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::Appointment;
use super::time::{format_minutes, parse_minutes};

/// Appointments of one calendar day, by time slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    /// `None` collects appointments without a date.
    pub date: Option<NaiveDate>,
    pub slots: Vec<TimeSlot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    /// Canonical `HH:MM`; `None` is the "unscheduled" bucket.
    pub time: Option<String>,
    pub minutes: Option<u16>,
    pub appointments: Vec<Appointment>,
}

impl DaySchedule {
    pub fn appointment_count(&self) -> usize {
        self.slots.iter().map(|slot| slot.appointments.len()).sum()
    }
}

/// Group appointments by date, then by parsed time of day, both ascending.
/// Undated days and unparseable times sort last.
pub fn group_by_day(appointments: Vec<Appointment>) -> Vec<DaySchedule> {
    // `Option` orders `None` first, so the keys are flipped into "is missing" flags.
    let mut days: BTreeMap<(bool, Option<NaiveDate>), BTreeMap<(bool, Option<u16>), Vec<Appointment>>> =
        BTreeMap::new();

    for appointment in appointments {
        let minutes = appointment.time.as_deref().and_then(parse_minutes);
        days.entry((appointment.date.is_none(), appointment.date))
            .or_default()
            .entry((minutes.is_none(), minutes))
            .or_default()
            .push(appointment);
    }

    days.into_iter()
        .map(|((_, date), slots)| DaySchedule {
            date,
            slots: slots
                .into_iter()
                .map(|((_, minutes), mut appointments)| {
                    appointments.sort_by_key(|appointment| appointment.id);
                    TimeSlot {
                        time: minutes.map(format_minutes),
                        minutes,
                        appointments,
                    }
                })
                .collect(),
        })
        .collect()
}
