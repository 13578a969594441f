use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use incprev::{AnalysisConfig, Cohort, Result};

/// Small cohort covering events before, inside and after follow-up,
/// missing event dates and a missing stratum value
pub const COHORT_CSV: &str = "\
ID,START_DATE,END_DATE,Asthma,Diabetes,SEX,REGION
1,2000-01-01,2004-12-31,2001-06-01,,F,North
2,2000-06-01,2003-06-30,,2002-02-15,M,South
3,2001-03-01,2001-09-01,,,F,South
4,2002-01-01,2004-12-31,2003-05-10,2003-01-01,M,North
5,1999-01-01,2004-12-31,1999-06-01,,F,
";

#[must_use]
pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Write the test cohort into `dir`
#[must_use]
pub fn write_cohort(dir: &Path) -> PathBuf {
    let path = dir.join("cohort.csv");
    std::fs::write(&path, COHORT_CSV).unwrap();
    path
}

/// 25 months of study time in 12-month slices
#[must_use]
pub fn test_config() -> AnalysisConfig {
    AnalysisConfig::new(
        date(2001, 1, 1),
        date(2003, 1, 31),
        "START_DATE",
        "END_DATE",
        vec!["Asthma".to_string(), "Diabetes".to_string()],
    )
    .with_demography(vec!["SEX".to_string()])
}

/// Load the test cohort through the regular input path
pub fn load_cohort(dir: &Path, config: &AnalysisConfig) -> Result<Cohort> {
    let path = write_cohort(dir);
    let batches = incprev::io::load_batches(&path, config)?;
    incprev::io::extract_cohort(&batches, config)
}

/// Data lines of a written result table
#[must_use]
pub fn data_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .skip(1)
        .map(str::to_string)
        .collect()
}
