// src/batch.rs
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info};

use crate::config::{Config, JobConfig};
use crate::process::{CleanStats, CsvNormalizer};

/// Result of one job. A failed job carries the error text and no stats;
/// its output path must not be treated as usable.
#[derive(Debug, Clone, Serialize)]
pub struct JobOutcome {
    pub name: String,
    pub input: PathBuf,
    pub output: PathBuf,
    pub stats: Option<CleanStats>,
    pub error: Option<String>,
}

impl JobOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<JobOutcome>,
}

impl BatchReport {
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.succeeded()).count()
    }
}

/// Clean one configured file. Errors are captured, never propagated.
pub fn run_job(config: &Config, job: &JobConfig) -> JobOutcome {
    let input = job.input_path(&config.data_dir);
    let output = job.output_path(&config.data_dir);
    let normalizer = CsvNormalizer::new(job.clean_options(config.progress_interval));

    match normalizer.run(&input, &output) {
        Ok(stats) => {
            info!(job = %job.name, rows = stats.data_rows, "job finished");
            JobOutcome {
                name: job.name.clone(),
                input,
                output,
                stats: Some(stats),
                error: None,
            }
        }
        Err(e) => {
            error!(job = %job.name, path = %e.path().display(), "FATAL: {}", e);
            JobOutcome {
                name: job.name.clone(),
                input,
                output,
                stats: None,
                error: Some(e.to_string()),
            }
        }
    }
}

/// Run `jobs` one after another, or concurrently when `parallel` is set.
///
/// Each job owns its counters and output file, so outcomes are identical either
/// way; they are reported in job order.
pub fn run_jobs(config: &Config, jobs: &[&JobConfig], parallel: bool) -> BatchReport {
    let started_at = Utc::now();
    info!(jobs = jobs.len(), parallel, "starting cleaning batch");

    let outcomes: Vec<JobOutcome> = if parallel {
        jobs.par_iter().map(|job| run_job(config, job)).collect()
    } else {
        jobs.iter().map(|job| run_job(config, job)).collect()
    };

    let report = BatchReport {
        started_at,
        finished_at: Utc::now(),
        outcomes,
    };
    info!(
        failed = report.failed(),
        total = report.outcomes.len(),
        "cleaning batch complete"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TableKind;
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    fn fixture_config(data_dir: PathBuf) -> Config {
        Config {
            data_dir,
            ..Config::default()
        }
    }

    #[test]
    fn one_missing_file_does_not_stop_the_batch() -> Result<()> {
        let dir = tempdir()?;
        fs::write(
            dir.path().join("other_names.csv"),
            "abn,name_type,name\n11000000948,BN\n",
        )?;
        let cfg = fixture_config(dir.path().to_path_buf());
        let jobs = cfg.select(&[])?;

        let report = run_jobs(&cfg, &jobs, false);

        assert_eq!(report.failed(), 1);
        assert_eq!(report.outcomes[0].name, "entities");
        assert!(report.outcomes[0]
            .error
            .as_deref()
            .unwrap()
            .contains("does not exist"));
        let names = report.outcomes[1].stats.as_ref().unwrap();
        assert_eq!(names.data_rows, 1);
        assert_eq!(names.padded_rows, 1);
        assert!(dir.path().join("other_names_cleaned.csv").is_file());
        Ok(())
    }

    #[test]
    fn parallel_run_matches_sequential() -> Result<()> {
        let dir = tempdir()?;
        let mut entities = crate::schema::tables::entities().column_names().join(",");
        entities.push('\n');
        for i in 0..50 {
            entities.push_str(&format!("110000009{:02},NAME {}\n", i, i));
            entities.push_str("bad,row\n");
        }
        fs::write(dir.path().join("entities.csv"), &entities)?;
        fs::write(
            dir.path().join("other_names.csv"),
            "abn,name_type,name\n11000000948,BN,A\n",
        )?;
        let mut cfg = fixture_config(dir.path().to_path_buf());
        cfg.jobs[0].max_rows = Some(20);
        let jobs = cfg.select(&[])?;

        let seq = run_jobs(&cfg, &jobs, false);
        let seq_out = fs::read(dir.path().join("entities_cleaned.csv"))?;
        let par = run_jobs(&cfg, &jobs, true);
        let par_out = fs::read(dir.path().join("entities_cleaned.csv"))?;

        assert_eq!(seq.failed(), 0);
        assert_eq!(par.failed(), 0);
        assert_eq!(seq_out, par_out);
        let seq_stats: Vec<_> = seq.outcomes.iter().map(|o| o.stats.clone()).collect();
        let par_stats: Vec<_> = par.outcomes.iter().map(|o| o.stats.clone()).collect();
        assert_eq!(seq_stats, par_stats);
        let entity_stats = seq.outcomes[0].stats.as_ref().unwrap();
        assert_eq!(entity_stats.data_rows, 20);
        assert_eq!(entity_stats.skipped_invalid_id, 19);
        assert_eq!(cfg.jobs[1].table, TableKind::OtherNames);
        Ok(())
    }
}
