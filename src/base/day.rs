//! Calendar day boundaries for the "today's events" query.

use chrono::{DateTime, FixedOffset, Local, TimeZone, Utc};

use super::types::Res;

/// Start (`00:00:00.000`) and end (`23:59:59.999`) of the day containing `now`, in `now`'s timezone.
///
/// Both bounds are inclusive and returned in UTC.
pub fn day_range<Tz: TimeZone>(now: &DateTime<Tz>) -> Res<(DateTime<Utc>, DateTime<Utc>)> {
    let tz = now.timezone();
    let date = now.date_naive();

    let start = date.and_hms_milli_opt(0, 0, 0, 0).ok_or_else(|| anyhow::anyhow!("Invalid start of day for {date}."))?;
    let end = date.and_hms_milli_opt(23, 59, 59, 999).ok_or_else(|| anyhow::anyhow!("Invalid end of day for {date}."))?;

    let start = tz.from_local_datetime(&start).earliest().ok_or_else(|| anyhow::anyhow!("Start of day {date} does not exist locally."))?;
    let end = tz.from_local_datetime(&end).latest().ok_or_else(|| anyhow::anyhow!("End of day {date} does not exist locally."))?;

    Ok((start.with_timezone(&Utc), end.with_timezone(&Utc)))
}

/// Bounds of the current day, in a fixed UTC offset if one is given, else in server local time.
pub fn today_range(utc_offset_minutes: Option<i32>) -> Res<(DateTime<Utc>, DateTime<Utc>)> {
    match utc_offset_minutes {
        Some(minutes) => {
            let offset = FixedOffset::east_opt(minutes * 60).ok_or_else(|| anyhow::anyhow!("Invalid UTC offset: {minutes} minutes."))?;
            day_range(&Utc::now().with_timezone(&offset))
        }
        None => day_range(&Local::now()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_range_utc() {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 13, 45, 12).unwrap();

        let (start, end) = day_range(&now).unwrap();

        assert_eq!(start.to_rfc3339(), "2026-10-18T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2026-10-18T23:59:59.999+00:00");
    }

    #[test]
    fn test_day_range_follows_offset() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = offset.with_ymd_and_hms(2026, 10, 18, 1, 30, 0).unwrap();

        let (start, end) = day_range(&now).unwrap();

        assert_eq!(start, Utc.with_ymd_and_hms(2026, 10, 17, 22, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 10, 18, 21, 59, 59).unwrap() + chrono::Duration::milliseconds(999));
    }

    #[test]
    fn test_today_range_contains_now() {
        let now = Utc::now();

        let (start, end) = today_range(Some(-5 * 60)).unwrap();

        assert!(start <= now && now <= end);
        assert_eq!(end - start, chrono::Duration::milliseconds(24 * 3600 * 1000 - 1));
    }
}
