// src/config.rs
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::process::{AbnRule, CleanOptions, DEFAULT_PROGRESS_INTERVAL};
use crate::schema::{tables, TableSchema};

pub const DEFAULT_MAX_ENTITY_ROWS: u64 = 4_000_000;
pub const DEFAULT_MAX_OTHER_NAME_ROWS: u64 = 2_000_000;

/// Which built-in table a job's file loads into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Entities,
    OtherNames,
}

impl TableKind {
    pub fn schema(self) -> TableSchema {
        match self {
            TableKind::Entities => tables::entities(),
            TableKind::OtherNames => tables::other_names(),
        }
    }

    /// Only the primary entity file is filtered on ABN format.
    pub fn validates_identifier(self) -> bool {
        matches!(self, TableKind::Entities)
    }
}

/// One input → output cleaning job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConfig {
    pub name: String,
    pub table: TableKind,
    /// Relative paths resolve against `data_dir`.
    pub input: PathBuf,
    pub output: PathBuf,
    /// Defaults to the table descriptor's width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_columns: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rows: Option<u64>,
    /// Defaults to true for `entities`, false otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate_identifier: Option<bool>,
}

impl JobConfig {
    pub fn input_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.input)
    }

    pub fn output_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.output)
    }

    pub fn clean_options(&self, progress_interval: u64) -> CleanOptions {
        let schema = self.table.schema();
        let validate = self
            .validate_identifier
            .unwrap_or_else(|| self.table.validates_identifier());
        let rule = if validate {
            Some(AbnRule::new(schema.identifier_column.unwrap_or(0)))
        } else {
            None
        };
        CleanOptions::new(self.expected_columns.unwrap_or_else(|| schema.column_count()))
            .with_max_rows(self.max_rows)
            .with_identifier(rule)
            .with_column_names(Some(schema.column_names()))
            .with_progress_interval(progress_interval)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub progress_interval: u64,
    pub jobs: Vec<JobConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            jobs: vec![
                JobConfig {
                    name: "entities".into(),
                    table: TableKind::Entities,
                    input: "entities.csv".into(),
                    output: "entities_cleaned.csv".into(),
                    expected_columns: None,
                    max_rows: Some(DEFAULT_MAX_ENTITY_ROWS),
                    validate_identifier: None,
                },
                JobConfig {
                    name: "other_names".into(),
                    table: TableKind::OtherNames,
                    input: "other_names.csv".into(),
                    output: "other_names_cleaned.csv".into(),
                    expected_columns: None,
                    max_rows: Some(DEFAULT_MAX_OTHER_NAME_ROWS),
                    validate_identifier: None,
                },
            ],
        }
    }
}

impl Config {
    /// Parse a YAML config file. Missing keys take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let cfg: Config = serde_yaml::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// `load(path)` when a path is given, built-in defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for job in &self.jobs {
            if !seen.insert(job.name.as_str()) {
                bail!("duplicate job name `{}`", job.name);
            }
            if job.expected_columns == Some(0) {
                bail!("job `{}`: expected_columns must be positive", job.name);
            }
        }
        Ok(())
    }

    /// Jobs named in `only`, in config order; every job when `only` is empty.
    pub fn select(&self, only: &[String]) -> Result<Vec<&JobConfig>> {
        if only.is_empty() {
            return Ok(self.jobs.iter().collect());
        }
        for name in only {
            if !self.jobs.iter().any(|j| &j.name == name) {
                bail!("unknown job `{}`", name);
            }
        }
        Ok(self
            .jobs
            .iter()
            .filter(|j| only.contains(&j.name))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_mirror_the_bulk_extract_layout() {
        let cfg = Config::default();
        let entities = cfg.jobs[0].clean_options(cfg.progress_interval);
        assert_eq!(entities.expected_columns, 12);
        assert_eq!(entities.max_rows, Some(4_000_000));
        assert_eq!(entities.identifier, Some(AbnRule::new(0)));

        let names = cfg.jobs[1].clean_options(cfg.progress_interval);
        assert_eq!(names.expected_columns, 3);
        assert_eq!(names.max_rows, Some(2_000_000));
        assert_eq!(names.identifier, None);
        assert_eq!(names.progress_interval, 100_000);
    }

    #[test]
    fn loads_yaml_with_partial_keys() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        write!(
            tmp,
            "data_dir: /srv/abn\njobs:\n  - name: names\n    table: other_names\n    input: raw/names.csv\n    output: clean/names.csv\n    validate_identifier: true\n"
        )?;
        tmp.flush()?;

        let cfg = Config::load(tmp.path())?;

        assert_eq!(cfg.data_dir, PathBuf::from("/srv/abn"));
        assert_eq!(cfg.progress_interval, DEFAULT_PROGRESS_INTERVAL);
        assert_eq!(cfg.jobs.len(), 1);
        let job = &cfg.jobs[0];
        assert_eq!(
            job.input_path(&cfg.data_dir),
            PathBuf::from("/srv/abn/raw/names.csv")
        );
        let opts = job.clean_options(cfg.progress_interval);
        assert_eq!(opts.max_rows, None);
        assert!(opts.identifier.is_some());
        Ok(())
    }

    #[test]
    fn rejects_duplicate_job_names() {
        let mut cfg = Config::default();
        cfg.jobs[1].name = "entities".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn select_filters_by_name() -> Result<()> {
        let cfg = Config::default();
        assert_eq!(cfg.select(&[])?.len(), 2);
        let only = cfg.select(&["other_names".to_string()])?;
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].table, TableKind::OtherNames);
        assert!(cfg.select(&["nope".to_string()]).is_err());
        Ok(())
    }
}
