use chrono::NaiveDate;

use crate::models::Punch;

/// Format decimal hours as `H:MM`, rounded to the nearest minute.
///
/// # Examples
///
/// ```
/// use attendance_core::formatting::format_hours;
///
/// assert_eq!(format_hours(8.25), "8:15");
/// assert_eq!(format_hours(0.0), "0:00");
/// assert_eq!(format_hours(7.999), "8:00");
/// assert_eq!(format_hours(41.5), "41:30");
/// ```
pub fn format_hours(hours: f64) -> String {
    if !hours.is_finite() {
        return "0:00".to_string();
    }
    let total_minutes = (hours * 60.0).round() as i64;
    let sign = if total_minutes < 0 { "-" } else { "" };
    let total_minutes = total_minutes.abs();
    format!("{}{}:{:02}", sign, total_minutes / 60, total_minutes % 60)
}

/// Format a punch for display.
///
/// * no punch → `"--"`
/// * unparseable punch → `"invalid"`
/// * otherwise `"09:25 AM"` (12-hour) or `"09:25"` (24-hour)
///
/// # Examples
///
/// ```
/// use attendance_core::formatting::format_punch;
/// use attendance_core::models::Punch;
/// use chrono::NaiveTime;
///
/// let punch = Punch::At(NaiveTime::from_hms_opt(18, 5, 0).unwrap());
/// assert_eq!(format_punch(Some(&punch), true), "06:05 PM");
/// assert_eq!(format_punch(Some(&punch), false), "18:05");
/// assert_eq!(format_punch(None, true), "--");
/// ```
pub fn format_punch(punch: Option<&Punch>, use_12h: bool) -> String {
    match punch {
        None => "--".to_string(),
        Some(Punch::Unparseable(_)) => "invalid".to_string(),
        Some(Punch::At(t)) if use_12h => t.format("%I:%M %p").to_string(),
        Some(Punch::At(t)) => t.format("%H:%M").to_string(),
    }
}

/// Short calendar label such as `"Mon 04 Mar"`.
pub fn format_day_label(date: NaiveDate) -> String {
    date.format("%a %d %b").to_string()
}

/// Calculate `(part / whole) * 100`, rounded to `decimal_places`.
///
/// Returns `0.0` if `whole` is zero to avoid division by zero.
///
/// # Examples
///
/// ```
/// use attendance_core::formatting::percentage;
///
/// assert!((percentage(20.0, 22.0, 1) - 90.9).abs() < 1e-9);
/// assert_eq!(percentage(0.0, 0.0, 1), 0.0);
/// ```
pub fn percentage(part: f64, whole: f64, decimal_places: u32) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    let raw = (part / whole) * 100.0;
    let factor = 10_f64.powi(decimal_places as i32);
    (raw * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    #[test]
    fn test_format_hours_rounds_to_minute() {
        assert_eq!(format_hours(8.0), "8:00");
        assert_eq!(format_hours(8.5), "8:30");
        assert_eq!(format_hours(1.0 / 60.0), "0:01");
        assert_eq!(format_hours(0.004), "0:00");
    }

    #[test]
    fn test_format_hours_negative_and_nan() {
        assert_eq!(format_hours(-0.5), "-0:30");
        assert_eq!(format_hours(f64::NAN), "0:00");
    }

    #[test]
    fn test_format_punch_midnight_and_noon() {
        let midnight = Punch::At(NaiveTime::from_hms_opt(0, 0, 0).unwrap());
        let noon = Punch::At(NaiveTime::from_hms_opt(12, 0, 0).unwrap());
        assert_eq!(format_punch(Some(&midnight), true), "12:00 AM");
        assert_eq!(format_punch(Some(&noon), true), "12:00 PM");
        assert_eq!(format_punch(Some(&midnight), false), "00:00");
    }

    #[test]
    fn test_format_punch_unparseable() {
        let bad = Punch::Unparseable("soon".to_string());
        assert_eq!(format_punch(Some(&bad), false), "invalid");
    }

    #[test]
    fn test_format_day_label() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert_eq!(format_day_label(date), "Sun 10 Mar");
    }

    #[test]
    fn test_percentage_rounds_to_one_decimal() {
        assert!((percentage(2.0, 3.0, 1) - 66.7).abs() < 1e-9);
        assert!((percentage(1.0, 3.0, 1) - 33.3).abs() < 1e-9);
        assert_eq!(percentage(5.0, 5.0, 1), 100.0);
    }
}
