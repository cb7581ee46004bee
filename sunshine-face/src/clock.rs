//! Wall clock helpers
//!
//! Converts wall-clock milliseconds into local time, formats the time and
//! date lines of the face and decodes the BLE Current Time Service values the
//! phone writes to set the clock.

use core::fmt::Write;

use chrono::{
    DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike, Utc, Weekday,
};
use heapless::String;

use crate::error::ClockError;

/// Formatted time, `H:MM:SS` at most
pub type TimeText = String<8>;
/// Formatted date, e.g. `Fri, Jul 22 2016`
pub type DateText = String<24>;

/// Length of the CTS "Current Time" characteristic value
pub const CTS_CURRENT_TIME_LEN: usize = 10;
/// Length of the CTS "Local Time Information" characteristic value
pub const CTS_LOCAL_TIME_INFO_LEN: usize = 2;

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Seconds per CTS time zone / DST step (15 minutes)
const CTS_STEP_SECS: i32 = 15 * 60;
const CTS_TIME_ZONE_UNKNOWN: i8 = -128;
const CTS_DST_UNKNOWN: u8 = 255;

/// Short name of a day of the week
pub fn day_of_week_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Sun => "Sun",
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
    }
}

/// Short name of a zero-based month, or `""` when out of range
pub fn month_name(month0: u32) -> &'static str {
    MONTH_NAMES.get(month0 as usize).copied().unwrap_or("")
}

/// Format the time as `H:MM` (ambient) or `H:MM:SS` (interactive).
///
/// `H` is the hour on a 12-hour dial counted from zero, so noon and midnight
/// both read `0`.
pub fn format_time(time: &NaiveDateTime, ambient: bool) -> TimeText {
    let mut text = TimeText::new();
    let hour = time.hour() % 12;
    // Capacity fits the longest output ("11:59:59")
    let _ = if ambient {
        write!(text, "{}:{:02}", hour, time.minute())
    } else {
        write!(text, "{}:{:02}:{:02}", hour, time.minute(), time.second())
    };
    text
}

/// Format the date as `<Day>, <Mon> <d> <yyyy>`
pub fn format_date(date: &NaiveDate) -> DateText {
    let mut text = DateText::new();
    let _ = write!(
        text,
        "{}, {} {} {}",
        day_of_week_name(date.weekday()),
        month_name(date.month0()),
        date.day(),
        date.year()
    );
    text
}

/// Converts wall-clock time into local time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LocalClock {
    utc_offset_secs: i32,
}

impl LocalClock {
    pub const fn new(utc_offset_secs: i32) -> Self {
        Self { utc_offset_secs }
    }

    pub fn utc_offset_secs(&self) -> i32 {
        self.utc_offset_secs
    }

    pub fn set_utc_offset(&mut self, utc_offset_secs: i32) {
        self.utc_offset_secs = utc_offset_secs;
    }

    /// Local date and time for `now_ms` milliseconds since the Unix epoch
    pub fn local(&self, now_ms: u64) -> Option<NaiveDateTime> {
        let utc = DateTime::<Utc>::from_timestamp_millis(i64::try_from(now_ms).ok()?)?;
        utc.naive_utc()
            .checked_add_signed(TimeDelta::seconds(i64::from(self.utc_offset_secs)))
    }
}

/// Wall-clock milliseconds since the Unix epoch for a UTC date-time
pub fn epoch_millis(time: &NaiveDateTime) -> u64 {
    time.and_utc().timestamp_millis().max(0) as u64
}

/// Decode a CTS "Current Time" value into a date-time.
///
/// Layout: year (u16 LE), month, day, hours, minutes, seconds, day of week,
/// fractions of a second in 1/256 steps, adjust reason.
pub fn decode_current_time(bytes: &[u8]) -> Result<NaiveDateTime, ClockError> {
    if bytes.len() < CTS_CURRENT_TIME_LEN {
        return Err(ClockError::TooShort);
    }

    let year = i32::from(u16::from_le_bytes([bytes[0], bytes[1]]));
    let month = u32::from(bytes[2]);
    let day = u32::from(bytes[3]);
    let hour = u32::from(bytes[4]);
    let minute = u32::from(bytes[5]);
    let second = u32::from(bytes[6]);
    let milli = u32::from(bytes[8]) * 1000 / 256;

    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or(ClockError::InvalidDateTime)?;
    let time = NaiveTime::from_hms_milli_opt(hour, minute, second, milli)
        .ok_or(ClockError::InvalidDateTime)?;

    Ok(NaiveDateTime::new(date, time))
}

/// Decode a CTS "Local Time Information" value into a UTC offset in seconds
pub fn decode_local_time_info(bytes: &[u8]) -> Result<i32, ClockError> {
    if bytes.len() < CTS_LOCAL_TIME_INFO_LEN {
        return Err(ClockError::TooShort);
    }

    let time_zone = bytes[0] as i8;
    if time_zone == CTS_TIME_ZONE_UNKNOWN {
        return Err(ClockError::UnknownTimeZone);
    }

    let dst = match bytes[1] {
        CTS_DST_UNKNOWN => 0,
        steps => i32::from(steps),
    };

    Ok((i32::from(time_zone) + dst) * CTS_STEP_SECS)
}
