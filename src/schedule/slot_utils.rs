use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use crate::catalog::ObjectInfo;

/// Absolute operating window of an object on one date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Window {
    pub fn length_secs(&self) -> i64 {
        (self.end - self.start).num_seconds()
    }

    /// Timestamp `offset` seconds after the window opens
    pub fn at(&self, offset: i64) -> NaiveDateTime {
        self.start + Duration::seconds(offset)
    }

    /// Hour of day (0-23) at `offset`
    pub fn hour_at(&self, offset: i64) -> u32 {
        self.at(offset).hour()
    }
}

/// Computes the window for `date`
///
/// A closing time earlier than the opening time ends on the next day
/// (e.g. 22:00 to 02:00). Equal times give a zero-length window, reported
/// as `None`.
pub fn compute_window(object: &ObjectInfo, date: NaiveDate) -> Option<Window> {
    let length = object.open_duration_secs();
    if length <= 0 {
        return None;
    }
    let start = date.and_time(object.begin_time);
    Some(Window {
        start,
        end: start + Duration::seconds(length),
    })
}

/// Formats a second offset as HH:MM:SS
pub fn secs_to_time_string(secs: i64) -> String {
    let secs = secs.max(0);
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs % 60)
}
