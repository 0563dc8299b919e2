// Boot time and uptime formatting

use chrono::{DateTime, Duration, Local, TimeZone};

use crate::models::SystemClock;

const SECS_PER_DAY: u64 = 86_400;
const SECS_PER_HOUR: u64 = 3_600;
const SECS_PER_MINUTE: u64 = 60;

/// "Tuesday, Jan 28, 2025, 9:41 AM"
const BOOT_TIME_FORMAT: &str = "%A, %b %-d, %Y, %-I:%M %p";

/// Boot time relative to the current local wall clock.
pub fn compute_boot_time(uptime_secs: u64) -> String {
    format_boot_time(&boot_time_at(Local::now(), uptime_secs))
}

pub fn boot_time_at<Tz: TimeZone>(now: DateTime<Tz>, uptime_secs: u64) -> DateTime<Tz> {
    let uptime = Duration::try_seconds(uptime_secs.min(i64::MAX as u64) as i64).unwrap_or(Duration::MAX);
    now.clone().checked_sub_signed(uptime).unwrap_or(now)
}

pub fn format_boot_time<Tz: TimeZone>(boot: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    boot.format(BOOT_TIME_FORMAT).to_string()
}

/// "1d 1h 1m 1s"; the day component is left out when zero.
pub fn format_uptime(uptime_secs: u64) -> String {
    let days = uptime_secs / SECS_PER_DAY;
    let hours = (uptime_secs % SECS_PER_DAY) / SECS_PER_HOUR;
    let minutes = (uptime_secs % SECS_PER_HOUR) / SECS_PER_MINUTE;
    let seconds = uptime_secs % SECS_PER_MINUTE;
    if days > 0 {
        format!("{days}d {hours}h {minutes}m {seconds}s")
    } else {
        format!("{hours}h {minutes}m {seconds}s")
    }
}

pub fn system_clock_at<Tz: TimeZone>(now: DateTime<Tz>, uptime_secs: u64) -> SystemClock
where
    Tz::Offset: std::fmt::Display,
{
    let boot = boot_time_at(now, uptime_secs);
    SystemClock {
        boot_timestamp: boot.timestamp(),
        boot_time: format_boot_time(&boot),
        uptime_secs,
        uptime: format_uptime(uptime_secs),
    }
}

pub fn system_clock(uptime_secs: u64) -> SystemClock {
    system_clock_at(Local::now(), uptime_secs)
}
