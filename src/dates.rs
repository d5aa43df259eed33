use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Accepts `YYYY-MM` or a bare `MM`. Bare months carry no year context, so
/// day counting uses a fixed non-leap reference year.
pub fn parse_month_key(month: &str) -> Result<(i32, u32), String> {
    let t = month.trim();
    if let Ok(m) = t.parse::<u32>() {
        if (1..=12).contains(&m) {
            return Ok((2001, m));
        }
        return Err("month must be between 01 and 12".to_string());
    }
    let Some((y, m)) = t.split_once('-') else {
        return Err("month must be MM or YYYY-MM".to_string());
    };
    let year = y
        .parse::<i32>()
        .map_err(|_| "month year must be numeric".to_string())?;
    let month_num = m
        .parse::<u32>()
        .map_err(|_| "month must be YYYY-MM".to_string())?;
    if !(1..=12).contains(&month_num) {
        return Err("month must be between 01 and 12".to_string());
    }
    Ok((year, month_num))
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    match (
        NaiveDate::from_ymd_opt(year, month, 1),
        NaiveDate::from_ymd_opt(next_year, next_month, 1),
    ) {
        (Some(first), Some(next_first)) => next_first.signed_duration_since(first).num_days() as u32,
        _ => 30,
    }
}

pub fn parse_iso_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| "date must be YYYY-MM-DD".to_string())
}

/// Monday through Friday of the week containing `week_of`.
pub fn school_week(week_of: NaiveDate) -> Vec<NaiveDate> {
    let monday = week_of - Duration::days(week_of.weekday().num_days_from_monday() as i64);
    (0..5).map(|i| monday + Duration::days(i)).collect()
}

pub fn weekday_name(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_key_accepts_both_shapes() {
        assert_eq!(parse_month_key("2026-02"), Ok((2026, 2)));
        assert_eq!(parse_month_key("9"), Ok((2001, 9)));
        assert!(parse_month_key("13").is_err());
        assert!(parse_month_key("2026-00").is_err());
        assert!(parse_month_key("feb").is_err());
    }

    #[test]
    fn day_counts_track_leap_years() {
        assert_eq!(days_in_month(2026, 1), 31);
        assert_eq!(days_in_month(2026, 2), 28);
        assert_eq!(days_in_month(2028, 2), 29);
        assert_eq!(days_in_month(2026, 4), 30);
        assert_eq!(days_in_month(2026, 12), 31);
    }

    #[test]
    fn school_week_starts_monday_and_spans_five_days() {
        // 2026-08-26 is a Wednesday.
        let wed = NaiveDate::from_ymd_opt(2026, 8, 26).unwrap();
        let week = school_week(wed);
        assert_eq!(week.len(), 5);
        assert_eq!(week[0], NaiveDate::from_ymd_opt(2026, 8, 24).unwrap());
        assert_eq!(week[4], NaiveDate::from_ymd_opt(2026, 8, 28).unwrap());
        assert_eq!(weekday_name(week[0]), "Monday");
        assert_eq!(weekday_name(week[4]), "Friday");
    }

    #[test]
    fn school_week_crosses_month_boundaries() {
        // 2026-09-01 is a Tuesday; its week starts in August.
        let tue = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        let week = school_week(tue);
        assert_eq!(week[0], NaiveDate::from_ymd_opt(2026, 8, 31).unwrap());
        assert_eq!(week[1], tue);
    }
}
