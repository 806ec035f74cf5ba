//! When hands are accepted and when the scheduled jobs fire.
//!
//! All times are wall-clock times at a fixed UTC offset. For a slot at
//! hour `H`, hands are accepted from the recruitment hour until
//! `close_minutes` before `H`, and matching runs at that same moment.

use std::cmp::Ordering;

use time::{Date, Duration, OffsetDateTime, UtcOffset};

use crate::fingerprint::SlotHours;

/// A scheduled job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Trigger {
    /// The daily sweep and recruitment announcement.
    RecruitmentOpen,

    /// Hands for the slot are closed and teams get matched.
    SlotDeadline(u8),
}

/// A wall-clock time of day.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
}

#[derive(Clone, Debug)]
pub struct Schedule {
    hours: SlotHours,
    recruitment: TimeOfDay,
    close_minutes: u8,
    offset: UtcOffset,
}

impl Schedule {
    /// `close_minutes` must be between 1 and 60.
    pub fn new(hours: SlotHours, recruitment: TimeOfDay, close_minutes: u8, offset: UtcOffset) -> Self {
        Self {
            hours,
            recruitment,
            close_minutes,
            offset,
        }
    }

    /// The local time at which hands for `hour` close.
    pub fn deadline_of(&self, hour: u8) -> TimeOfDay {
        TimeOfDay {
            hour: (hour + 23) % 24,
            minute: (60 - self.close_minutes % 60) % 60,
        }
    }

    /// Every job with its daily fire time, in order of time of day.
    pub fn triggers(&self) -> Vec<(TimeOfDay, Trigger)> {
        let mut triggers = self
            .hours
            .iter()
            .map(|hour| (self.deadline_of(hour), Trigger::SlotDeadline(hour)))
            .collect::<Vec<_>>();

        triggers.push((self.recruitment, Trigger::RecruitmentOpen));
        triggers.sort();

        triggers
    }

    /// Whether a hand for `hour` may be raised at `now`: from the moment
    /// recruitment opens until the slot's deadline.
    pub fn is_accepting(&self, hour: i64, now: OffsetDateTime) -> bool {
        if !self.hours.contains(hour) {
            return false;
        }

        let local = now.to_offset(self.offset);
        let deadline = self.deadline_of(hour as u8);
        let current = TimeOfDay {
            hour: local.hour(),
            minute: local.minute(),
        };

        self.recruitment <= current && current.cmp(&deadline) == Ordering::Less
    }

    /// The jobs that fell due after `previous` and up to and including
    /// `now`, oldest first. Never reaches back more than a day.
    pub fn due(&self, previous: OffsetDateTime, now: OffsetDateTime) -> Vec<(OffsetDateTime, Trigger)> {
        let previous = if now - previous > Duration::days(1) {
            now - Duration::days(1)
        } else {
            previous
        };

        let triggers = self.triggers();
        let mut due = vec![];
        let mut date = previous.to_offset(self.offset).date();
        let last = now.to_offset(self.offset).date();

        while date <= last {
            for (time, trigger) in &triggers {
                if let Some(at) = self.at(date, *time) {
                    if previous < at && at <= now {
                        due.push((at, *trigger));
                    }
                }
            }

            date = match date.next_day() {
                Some(next) => next,
                None => break,
            };
        }

        due.sort();
        due
    }

    fn at(&self, date: Date, time: TimeOfDay) -> Option<OffsetDateTime> {
        date.with_hms(time.hour, time.minute, 0)
            .ok()
            .map(|t| t.assume_offset(self.offset))
    }
}
