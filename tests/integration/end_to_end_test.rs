use crate::utils::{data_lines, date, test_config, write_cohort};
use incprev::{
    AnalysisConfig, AnalysisSelection, Analyser, DateFormat, IncPrevError, RawAnalysisConfig,
};

const INCIDENCE_HEADER: &str =
    "Condition,Date,Group,Subgroup,Incidence,Numerator,Denominator,Lower_CI,Upper_CI";
const PREVALENCE_HEADER: &str =
    "Condition,Date,Group,Subgroup,Prevalence,Numerator,Denominator,Lower_CI,Upper_CI";

fn header(path: &std::path::Path) -> String {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .next()
        .unwrap()
        .to_string()
}

#[test]
fn test_run_writes_both_tables() -> incprev::Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let input = write_cohort(dir.path());
    let analyser = Analyser::new(test_config().with_person_years(1000.0))?;

    let outputs = analyser.run(&input, dir.path(), AnalysisSelection::Both)?;
    let incidence = outputs.incidence.unwrap();
    let prevalence = outputs.prevalence.unwrap();
    assert_eq!(incidence, dir.path().join("incidence_analysis.csv"));
    assert_eq!(prevalence, dir.path().join("prevalence_analysis.csv"));

    assert_eq!(header(&incidence), INCIDENCE_HEADER);
    assert_eq!(header(&prevalence), PREVALENCE_HEADER);

    // Overall plus one series per sex, each over three slices
    let rows = 2 * 3 + 2 * 2 * 3;
    assert_eq!(data_lines(&incidence).len(), rows);
    assert_eq!(data_lines(&prevalence).len(), rows);

    let first = &data_lines(&prevalence)[0];
    assert!(first.starts_with("Asthma,2001-01-01,Overall,,"));
    let fields: Vec<_> = first.split(',').collect();
    assert_eq!(fields[5], "1");
    assert_eq!(fields[6], "3");
    Ok(())
}

#[test]
fn test_repeated_runs_are_byte_identical() -> incprev::Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let input = write_cohort(dir.path());
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();

    let analyser = Analyser::new(test_config())?;
    let a = analyser.run(&input, first.path(), AnalysisSelection::Both)?;
    let b = analyser.run(&input, second.path(), AnalysisSelection::Both)?;

    for (left, right) in [(a.incidence, b.incidence), (a.prevalence, b.prevalence)] {
        let left = std::fs::read(left.unwrap()).unwrap();
        let right = std::fs::read(right.unwrap()).unwrap();
        assert_eq!(left, right);
    }
    Ok(())
}

#[test]
fn test_selection_restricts_outputs() -> incprev::Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let input = write_cohort(dir.path());
    let analyser = Analyser::new(test_config())?;

    let outputs = analyser.run(&input, dir.path(), AnalysisSelection::Prevalence)?;
    assert!(outputs.incidence.is_none());
    assert!(outputs.prevalence.is_some());
    assert!(!dir.path().join("incidence_analysis.csv").exists());
    Ok(())
}

#[test]
fn test_missing_columns_fail_before_computation() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_cohort(dir.path());
    let config = AnalysisConfig::new(
        date(2001, 1, 1),
        date(2003, 1, 31),
        "START_DATE",
        "END_DATE",
        vec!["Asthma".to_string(), "Cancer".to_string()],
    )
    .with_demography(vec!["AGE_GROUP".to_string()]);

    let error = Analyser::new(config)
        .unwrap()
        .run(&input, dir.path(), AnalysisSelection::Both)
        .unwrap_err();
    assert!(error.is_configuration_error());
    match error {
        IncPrevError::MissingColumns(missing) => {
            assert_eq!(missing, vec!["Cancer".to_string(), "AGE_GROUP".to_string()]);
        }
        other => panic!("expected missing columns, got {other}"),
    }
    assert!(!dir.path().join("incidence_analysis.csv").exists());
}

#[test]
fn test_invalid_destination_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_cohort(dir.path());
    let analyser = Analyser::new(test_config()).unwrap();

    let error = analyser
        .run(&input, &dir.path().join("missing"), AnalysisSelection::Both)
        .unwrap_err();
    assert!(matches!(error, IncPrevError::InvalidInput { .. }));
    assert!(!error.is_configuration_error());
}

#[test]
fn test_custom_date_format() -> incprev::Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("cohort.csv");
    std::fs::write(
        &input,
        "START,END,Asthma,SEX\n\
         01/01/2000,31/12/2004,01/06/2001,F\n\
         01/06/2000,30/06/2003,,M\n",
    )
    .unwrap();

    let raw = RawAnalysisConfig {
        study_start_date: "01/01/2001".to_string(),
        study_end_date: "31/12/2002".to_string(),
        patient_start_col: "START".to_string(),
        patient_end_col: "END".to_string(),
        conditions: vec!["Asthma".to_string()],
        demography: Vec::new(),
        person_years: 1.0,
        alpha: 0.05,
        increment_by_months: 12,
        confidence_method: Some("exact".to_string()),
        date_format: Some("%d/%m/%Y".to_string()),
    };
    let config = raw.resolve()?;
    assert_eq!(config.date_format, DateFormat::Custom("%d/%m/%Y".to_string()));

    let outputs = Analyser::new(config)?.run(&input, dir.path(), AnalysisSelection::Incidence)?;
    let lines = data_lines(&outputs.incidence.unwrap());
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("Asthma,01/01/2001,Overall,,"));
    assert!(lines[1].starts_with("Asthma,01/01/2002,Overall,,"));
    assert!(lines[0].split(',').nth(5) == Some("1"));
    Ok(())
}
