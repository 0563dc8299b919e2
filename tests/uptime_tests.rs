// Uptime formatting and boot-time computation

use chrono::{FixedOffset, TimeZone, Utc};
use devinfo::uptime::{boot_time_at, format_boot_time, format_uptime, system_clock_at};

#[test]
fn format_uptime_examples() {
    assert_eq!(format_uptime(90061), "1d 1h 1m 1s");
    assert_eq!(format_uptime(3661), "1h 1m 1s");
    assert_eq!(format_uptime(61), "0h 1m 1s");
    assert_eq!(format_uptime(59), "0h 0m 59s");
    assert_eq!(format_uptime(0), "0h 0m 0s");
}

#[test]
fn day_component_only_from_one_day() {
    assert_eq!(format_uptime(86_399), "23h 59m 59s");
    assert_eq!(format_uptime(86_400), "1d 0h 0m 0s");
    assert!(!format_uptime(86_399).contains('d'));
    assert!(format_uptime(10 * 86_400 + 5).starts_with("10d "));
}

#[test]
fn boot_time_is_now_minus_uptime() {
    let now = Utc.with_ymd_and_hms(2025, 1, 28, 10, 41, 0).unwrap();
    let boot = boot_time_at(now, 3600);
    assert_eq!(boot, Utc.with_ymd_and_hms(2025, 1, 28, 9, 41, 0).unwrap());
    assert_eq!(format_boot_time(&boot), "Tuesday, Jan 28, 2025, 9:41 AM");
}

#[test]
fn boot_time_formats_in_given_offset() {
    let tz = FixedOffset::east_opt(2 * 3600).unwrap();
    let now = tz.with_ymd_and_hms(2024, 7, 4, 18, 5, 0).unwrap();
    let boot = boot_time_at(now, 90061);
    assert_eq!(format_boot_time(&boot), "Wednesday, Jul 3, 2024, 5:03 PM");
}

#[test]
fn system_clock_combines_both() {
    let now = Utc.with_ymd_and_hms(2025, 1, 28, 10, 41, 0).unwrap();
    let clock = system_clock_at(now, 3661);
    assert_eq!(clock.uptime_secs, 3661);
    assert_eq!(clock.uptime, "1h 1m 1s");
    assert_eq!(clock.boot_timestamp, now.timestamp() - 3661);
    assert_eq!(clock.boot_time, "Tuesday, Jan 28, 2025, 9:39 AM");
}

#[test]
fn huge_uptime_does_not_panic() {
    let now = Utc.with_ymd_and_hms(2025, 1, 28, 10, 41, 0).unwrap();
    let _ = boot_time_at(now, u64::MAX);
}
