use chrono::prelude::*;
use chrono::Duration;
use chrono::LocalResult;
use chrono_tz::Tz;

/// Daily window, in the local time of `timezone`, during which no reminders
/// are sent to patients. The window starts at `start_hour:00` (inclusive) and
/// ends at `end_hour:00` (exclusive) and may wrap around midnight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuietHours {
    pub start_hour: u32,
    pub end_hour: u32,
    pub timezone: Tz,
}

impl Default for QuietHours {
    fn default() -> Self {
        Self {
            start_hour: 21,
            end_hour: 8,
            timezone: chrono_tz::UTC,
        }
    }
}

impl QuietHours {
    pub fn new(start_hour: u32, end_hour: u32, timezone: Tz) -> Option<Self> {
        if start_hour > 23 || end_hour > 23 {
            return None;
        }
        Some(Self {
            start_hour,
            end_hour,
            timezone,
        })
    }

    fn local_time(&self, ts: i64) -> Option<DateTime<Tz>> {
        Utc.timestamp_millis_opt(ts)
            .single()
            .map(|dt| dt.with_timezone(&self.timezone))
    }

    fn hour_is_quiet(&self, hour: u32) -> bool {
        if self.start_hour == self.end_hour {
            false
        } else if self.start_hour < self.end_hour {
            hour >= self.start_hour && hour < self.end_hour
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }

    /// Whether `ts` (unix millis) falls inside the quiet window
    pub fn contains(&self, ts: i64) -> bool {
        match self.local_time(ts) {
            Some(local) => self.hour_is_quiet(local.hour()),
            None => false,
        }
    }

    /// The first instant at or after `ts` that is outside of the quiet window
    pub fn next_allowed(&self, ts: i64) -> i64 {
        let local = match self.local_time(ts) {
            Some(local) if self.hour_is_quiet(local.hour()) => local,
            _ => return ts,
        };

        let mut date = local.date_naive();
        // Evening part of a window that wraps midnight ends tomorrow morning
        if self.start_hour > self.end_hour && local.hour() >= self.start_hour {
            date = date.succ_opt().unwrap_or(date);
        }

        let end = match date.and_hms_opt(self.end_hour, 0, 0) {
            Some(end) => end,
            None => return ts,
        };
        let end = match self.timezone.from_local_datetime(&end) {
            LocalResult::Single(dt) => dt,
            LocalResult::Ambiguous(earliest, _) => earliest,
            // The end hour does not exist on this day because of a DST jump
            LocalResult::None => match self
                .timezone
                .from_local_datetime(&(end + Duration::hours(1)))
                .earliest()
            {
                Some(dt) => dt,
                None => return ts,
            },
        };

        std::cmp::max(ts, end.timestamp_millis())
    }
}
