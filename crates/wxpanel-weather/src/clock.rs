//! Wall-clock helpers for day/night and the refresh timestamp.
//!
//! None of these fail on an unsynchronized clock; they just produce
//! whatever the current wall-clock value implies.

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;

/// Epoch seconds below which the clock is assumed not yet synced.
pub const SYNCED_EPOCH_THRESHOLD: i64 = 1_000_000_000;

const DAY_START_HOUR: u32 = 6;
const DAY_END_HOUR: u32 = 18;

/// Local hours 6 through 17 count as day.
pub fn is_daytime_hour(hour: u32) -> bool {
    (DAY_START_HOUR..DAY_END_HOUR).contains(&hour)
}

pub fn is_daytime(now: DateTime<Utc>, tz: Tz) -> bool {
    is_daytime_hour(now.with_timezone(&tz).hour())
}

/// `"14:05 Oct 29"` in the panel's zone.
pub fn format_refresh_time(at: DateTime<Utc>, tz: Tz) -> String {
    at.with_timezone(&tz).format("%H:%M %b %d").to_string()
}

pub fn is_clock_synchronized(now: DateTime<Utc>) -> bool {
    now.timestamp() > SYNCED_EPOCH_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_daytime_hour_boundaries() {
        assert!(!is_daytime_hour(5));
        assert!(is_daytime_hour(6));
        assert!(is_daytime_hour(17));
        assert!(!is_daytime_hour(18));
        assert!(!is_daytime_hour(0));
    }

    #[test]
    fn test_daytime_uses_local_zone() {
        // 04:00 UTC is noon in Shanghai.
        let now = Utc.with_ymd_and_hms(2025, 10, 29, 4, 0, 0).unwrap();
        assert!(!is_daytime(now, chrono_tz::UTC));
        assert!(is_daytime(now, chrono_tz::Asia::Shanghai));
    }

    #[test]
    fn test_refresh_time_format() {
        let at = Utc.with_ymd_and_hms(2025, 10, 29, 6, 5, 0).unwrap();
        assert_eq!(format_refresh_time(at, chrono_tz::UTC), "06:05 Oct 29");
        assert_eq!(
            format_refresh_time(at, chrono_tz::Asia::Shanghai),
            "14:05 Oct 29"
        );
    }

    #[test]
    fn test_epoch_near_clock_is_unsynchronized_but_usable() {
        let boot = Utc.timestamp_opt(42, 0).unwrap();
        assert!(!is_clock_synchronized(boot));
        assert!(!is_daytime(boot, chrono_tz::UTC));
        assert_eq!(format_refresh_time(boot, chrono_tz::UTC), "00:00 Jan 01");

        let synced = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert!(is_clock_synchronized(synced));
    }
}
