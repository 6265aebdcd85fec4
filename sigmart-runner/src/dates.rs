//! Run-date parsing and range validation shared by the pipeline and CLI.

use crate::pipeline::PipelineError;
use chrono::NaiveDate;

/// Parse an optional `YYYY-MM-DD` argument; `None` means today.
pub fn parse_run_date(raw: Option<&str>) -> Result<NaiveDate, PipelineError> {
    match raw {
        Some(s) => s
            .parse::<NaiveDate>()
            .map_err(|_| PipelineError::InvalidDate(s.to_string())),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

/// Inclusive date range, validated.
pub fn date_range(start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>, PipelineError> {
    if start > end {
        return Err(PipelineError::InvalidDateRange { start, end });
    }
    let mut dates = Vec::new();
    let mut current = start;
    while current <= end {
        dates.push(current);
        current += chrono::Duration::days(1);
    }
    Ok(dates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    #[test]
    fn parses_iso_dates() {
        assert_eq!(parse_run_date(Some("2024-06-03")).unwrap(), d(3));
    }

    #[test]
    fn rejects_malformed_dates() {
        let err = parse_run_date(Some("06/03/2024")).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidDate(_)));
    }

    #[test]
    fn none_means_today() {
        let today = chrono::Local::now().date_naive();
        assert_eq!(parse_run_date(None).unwrap(), today);
    }

    #[test]
    fn range_is_inclusive() {
        let dates = date_range(d(1), d(3)).unwrap();
        assert_eq!(dates, vec![d(1), d(2), d(3)]);
    }

    #[test]
    fn single_day_range() {
        assert_eq!(date_range(d(5), d(5)).unwrap(), vec![d(5)]);
    }

    #[test]
    fn inverted_range_is_an_error() {
        let err = date_range(d(9), d(3)).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidDateRange { .. }));
    }
}
