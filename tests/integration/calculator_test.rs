use crate::utils::{date, load_cohort, test_config};
use incprev::{
    ConfidenceMethod, IncidenceCalculator, PeriodWindower, PrevalenceCalculator, RateCalculator,
    RateEstimate,
};

fn find<'a>(
    estimates: &'a [RateEstimate],
    condition: &str,
    label: &str,
    subgroup: &str,
) -> &'a RateEstimate {
    estimates
        .iter()
        .find(|e| e.condition == condition && e.period_label == label && e.subgroup == subgroup)
        .unwrap()
}

#[test]
fn test_overall_incidence_counts() -> incprev::Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config();
    let cohort = load_cohort(dir.path(), &config)?;
    assert_eq!(cohort.len(), 5);

    let estimates = IncidenceCalculator.overall(&cohort, &config)?;
    assert_eq!(estimates.len(), 2 * 3);

    let labels: Vec<_> = estimates.iter().take(3).map(|e| e.period_label.as_str()).collect();
    assert_eq!(labels, vec!["2001-01-01", "2002-01-01", "2003-01-01"]);

    // Events before follow-up start never count, censored exposure does
    let first = find(&estimates, "Asthma", "2001-01-01", "");
    assert_eq!(first.numerator, 1);
    assert!((first.denominator - 700.0 / 365.0).abs() < 1e-6);
    assert!(first.lower_ci <= first.value && first.value <= first.upper_ci);

    assert_eq!(find(&estimates, "Diabetes", "2002-01-01", "").numerator, 1);
    assert_eq!(find(&estimates, "Diabetes", "2003-01-01", "").numerator, 1);
    Ok(())
}

#[test]
fn test_overall_prevalence_counts() -> incprev::Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config();
    let cohort = load_cohort(dir.path(), &config)?;

    let estimates = PrevalenceCalculator.overall(&cohort, &config)?;
    let first = find(&estimates, "Asthma", "2001-01-01", "");
    assert_eq!(first.numerator, 1);
    assert!((first.reported_denominator() - 3.0).abs() < f64::EPSILON);
    assert!((first.value - 1.0 / 3.0).abs() < 1e-6);
    Ok(())
}

#[test]
fn test_grouped_rows_per_stratum_value() -> incprev::Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config();
    let cohort = load_cohort(dir.path(), &config)?;
    let slices = PeriodWindower::from_config(&config)?.slices().count();
    assert_eq!(slices, 3);

    for estimates in [
        IncidenceCalculator.grouped(&cohort, &config)?,
        PrevalenceCalculator.grouped(&cohort, &config)?,
    ] {
        assert_eq!(estimates.len(), config.conditions.len() * 2 * slices);
        assert!(estimates.iter().all(|e| e.group == "SEX"));

        let subgroups: Vec<_> = estimates
            .iter()
            .step_by(slices)
            .map(|e| (e.condition.as_str(), e.subgroup.as_str()))
            .collect();
        assert_eq!(
            subgroups,
            vec![
                ("Asthma", "F"),
                ("Asthma", "M"),
                ("Diabetes", "F"),
                ("Diabetes", "M"),
            ]
        );
    }
    Ok(())
}

#[test]
fn test_missing_stratum_value_belongs_to_no_partition() -> incprev::Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config().with_demography(vec!["REGION".to_string()]);
    let cohort = load_cohort(dir.path(), &config)?;

    let estimates = PrevalenceCalculator.grouped(&cohort, &config)?;
    assert_eq!(estimates.len(), 2 * 2 * 3);

    // Patient 5 has no region and is excluded from both partitions
    let north = find(&estimates, "Asthma", "2001-01-01", "North");
    let south = find(&estimates, "Asthma", "2001-01-01", "South");
    assert_eq!(north.numerator, 0);
    assert!((north.reported_denominator() - 1.0).abs() < f64::EPSILON);
    assert!((south.reported_denominator() - 1.0).abs() < f64::EPSILON);
    Ok(())
}

#[test]
fn test_analyse_concatenates_overall_and_grouped() -> incprev::Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config();
    let cohort = load_cohort(dir.path(), &config)?;

    let all = IncidenceCalculator.analyse(&cohort, &config)?;
    let overall = IncidenceCalculator.overall(&cohort, &config)?;
    let grouped = IncidenceCalculator.grouped(&cohort, &config)?;

    assert_eq!(all.len(), overall.len() + grouped.len());
    assert_eq!(&all[..overall.len()], overall.as_slice());
    assert_eq!(&all[overall.len()..], grouped.as_slice());
    Ok(())
}

#[test]
fn test_small_counts_agree_between_methods() -> incprev::Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config();
    let cohort = load_cohort(dir.path(), &config)?;

    let byars = IncidenceCalculator.overall(&cohort, &config)?;
    let exact = IncidenceCalculator.overall(
        &cohort,
        &config.clone().with_confidence_method(ConfidenceMethod::Exact),
    )?;

    for (b, e) in byars.iter().zip(&exact) {
        assert!((b.lower_ci - e.lower_ci).abs() < 1e-12);
        assert!((b.upper_ci - e.upper_ci).abs() < 1e-12);
    }
    Ok(())
}

#[test]
fn test_person_years_scales_rate_and_bounds() -> incprev::Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config();
    let cohort = load_cohort(dir.path(), &config)?;

    let unit = IncidenceCalculator.overall(&cohort, &config)?;
    let scaled = IncidenceCalculator.overall(&cohort, &config.clone().with_person_years(1000.0))?;

    for (u, s) in unit.iter().zip(&scaled) {
        assert_eq!(u.numerator, s.numerator);
        assert!((u.value * 1000.0 - s.value).abs() < 1e-9);
        assert!((u.upper_ci * 1000.0 - s.upper_ci).abs() < 1e-9);
    }
    assert_eq!(unit[0].period_start, date(2001, 1, 1));
    Ok(())
}
