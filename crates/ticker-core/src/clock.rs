//! Wall-clock helpers
//!
//! Converts an epoch reported by the time-sync collaborator into a local
//! calendar time, and falls back to an uptime clock while no plausible
//! epoch is known.

use core::fmt;

/// Any epoch before this instant (2020-09-13) is treated as "never synced".
pub const MIN_VALID_EPOCH_SECS: u64 = 1_600_000_000;

pub const fn is_plausible_epoch(epoch_secs: u64) -> bool {
    epoch_secs > MIN_VALID_EPOCH_SECS
}

/// Broken-down local calendar time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalTime {
    pub year: i32,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl LocalTime {
    /// Convert a UTC epoch to local time at a fixed offset from UTC.
    pub fn from_epoch(epoch_secs: u64, utc_offset_secs: i32) -> Self {
        let local = epoch_secs as i64 + utc_offset_secs as i64;
        let days = local.div_euclid(86_400);
        let secs_of_day = local.rem_euclid(86_400);

        let (year, month, day) = civil_from_days(days);

        Self {
            year,
            month,
            day,
            hour: (secs_of_day / 3600) as u8,
            minute: (secs_of_day / 60 % 60) as u8,
            second: (secs_of_day % 60) as u8,
        }
    }

    /// `HH:MM:SS`
    pub fn time(&self) -> impl fmt::Display + '_ {
        Hms(self.hour as u64, self.minute, self.second)
    }

    /// `YYYY/MM/DD`
    pub fn date(&self) -> impl fmt::Display + '_ {
        DateFmt(self)
    }
}

struct DateFmt<'a>(&'a LocalTime);

impl fmt::Display for DateFmt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}/{:02}/{:02}", self.0.year, self.0.month, self.0.day)
    }
}

struct Hms(u64, u8, u8);

impl fmt::Display for Hms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.0, self.1, self.2)
    }
}

/// What the status clock shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockReading {
    /// Synchronised local time.
    Local(LocalTime),
    /// Seconds since boot, shown while the time is not valid.
    Uptime(u64),
}

impl ClockReading {
    pub fn new(epoch_secs: Option<u64>, uptime_secs: u64, utc_offset_secs: i32) -> Self {
        match epoch_secs {
            Some(epoch) if is_plausible_epoch(epoch) => {
                Self::Local(LocalTime::from_epoch(epoch, utc_offset_secs))
            }
            _ => Self::Uptime(uptime_secs),
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }

    /// Short mode label drawn next to the clock.
    pub fn mode_label(&self) -> &'static str {
        match self {
            Self::Local(_) => "NTP",
            Self::Uptime(_) => "UP",
        }
    }
}

impl fmt::Display for ClockReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(time) => time.time().fmt(f),
            // Hours wrap at 100 so the field never grows past eight characters
            Self::Uptime(secs) => {
                Hms(secs / 3600 % 100, (secs / 60 % 60) as u8, (secs % 60) as u8).fmt(f)
            }
        }
    }
}

/// Days since 1970-01-01 to a proleptic Gregorian (year, month, day).
fn civil_from_days(days: i64) -> (i32, u8, u8) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u8;
    let month = if mp < 10 { mp + 3 } else { mp - 9 } as u8;
    let year = yoe + era * 400 + if month <= 2 { 1 } else { 0 };
    (year as i32, month, day)
}
