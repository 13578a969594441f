//! Point prevalence at the start of each slice.

use crate::algorithm::calculator::RateCalculator;
use crate::algorithm::exposure::{PeriodCounts, prevalence_counts};
use crate::algorithm::period::TimeSlice;
use crate::models::{PatientRecord, RateKind};

/// Point prevalence over a cohort, evaluated on each slice's first day
#[derive(Debug, Clone, Copy, Default)]
pub struct PrevalenceCalculator;

impl RateCalculator for PrevalenceCalculator {
    fn kind(&self) -> RateKind {
        RateKind::Prevalence
    }

    fn counts(&self, records: &[&PatientRecord], slice: &TimeSlice, condition: usize) -> PeriodCounts {
        prevalence_counts(records, slice.start, condition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::models::Cohort;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn cohort() -> Cohort {
        let rows = [
            (date(2000, 1, 1), date(2003, 1, 1), Some(date(2000, 6, 1)), Some("White")),
            (date(2000, 1, 1), date(2003, 1, 1), Some(date(2001, 6, 1)), Some("Asian")),
            (date(2000, 1, 1), date(2001, 6, 1), None, Some("White")),
            (date(2001, 3, 1), date(2003, 1, 1), Some(date(2001, 1, 1)), None),
        ];
        let records = rows
            .iter()
            .enumerate()
            .map(|(row, (start, end, event, ethnicity))| PatientRecord {
                row,
                follow_up_start: *start,
                follow_up_end: *end,
                condition_dates: vec![*event],
                strata: vec![ethnicity.map(str::to_string)],
            })
            .collect();
        Cohort::new(vec!["Condition".to_string()], vec!["ETHNICITY".to_string()], records)
    }

    fn config() -> AnalysisConfig {
        AnalysisConfig::new(
            date(2001, 1, 1),
            date(2002, 12, 31),
            "START_DATE",
            "END_DATE",
            vec!["Condition".to_string()],
        )
        .with_demography(vec!["ETHNICITY".to_string()])
        .with_person_years(100.0)
    }

    #[test]
    fn test_overall_prevalence() {
        let estimates = PrevalenceCalculator.overall(&cohort(), &config()).unwrap();
        assert_eq!(estimates.len(), 2);

        // 2001-01-01: three under follow-up, one case
        assert_eq!(estimates[0].numerator, 1);
        assert_eq!(estimates[0].reported_denominator(), 3.0);
        assert!((estimates[0].value - 100.0 / 3.0).abs() < 1e-4);

        // 2002-01-01: three under follow-up, all with the condition
        assert_eq!(estimates[1].numerator, 3);
        assert_eq!(estimates[1].reported_denominator(), 3.0);
        assert!((estimates[1].value - 100.0).abs() < 1e-4);
    }

    #[test]
    fn test_missing_stratum_value_is_excluded() {
        let estimates = PrevalenceCalculator.grouped(&cohort(), &config()).unwrap();
        let subgroups: Vec<_> = estimates.iter().map(|e| e.subgroup.as_str()).collect();
        assert_eq!(subgroups, vec!["White", "White", "Asian", "Asian"]);

        // White on 2002-01-01: only the first patient remains
        assert_eq!(estimates[1].numerator, 1);
        assert_eq!(estimates[1].reported_denominator(), 1.0);
    }

    #[test]
    fn test_empty_partition_does_not_divide_by_zero() {
        let config = AnalysisConfig::new(
            date(2010, 1, 1),
            date(2010, 12, 31),
            "START_DATE",
            "END_DATE",
            vec!["Condition".to_string()],
        );
        let estimates = PrevalenceCalculator.overall(&cohort(), &config).unwrap();
        assert_eq!(estimates.len(), 1);
        assert_eq!(estimates[0].numerator, 0);
        assert_eq!(estimates[0].value, 0.0);
        assert_eq!(estimates[0].reported_denominator(), 0.0);
        assert_eq!(estimates[0].lower_ci, 0.0);
        assert!(estimates[0].upper_ci.is_finite());
    }
}
