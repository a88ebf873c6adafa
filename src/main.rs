use abnclean::{
    batch::run_jobs,
    config::Config,
    process::{profile_csv, render_profile},
    schema::{copy_sql, create_table_sql},
};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use glob::glob;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "abnclean",
    version,
    about = "Clean and inspect ABN bulk extract CSVs before loading"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Normalise the configured extract files into loader-ready CSVs
    Clean {
        /// YAML config; built-in entities/other_names jobs when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Override the config's data directory
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
        /// Run only the named job (repeatable)
        #[arg(long = "only")]
        only: Vec<String>,
        /// Clean independent files concurrently
        #[arg(long)]
        parallel: bool,
        /// Log progress every N emitted rows (0 disables)
        #[arg(long)]
        progress_interval: Option<u64>,
        /// Print the batch report as JSON on stdout
        #[arg(long)]
        json: bool,
    },
    /// Report column lengths, missing counts and numeric ranges
    Profile {
        /// Files or glob patterns
        #[arg(required = true)]
        files: Vec<String>,
        /// Sample rows to keep per file
        #[arg(long, default_value_t = 5)]
        samples: usize,
        #[arg(long)]
        json: bool,
    },
    /// Print CREATE TABLE and \copy statements for the configured jobs
    Schema {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Clean {
            config,
            data_dir,
            only,
            parallel,
            progress_interval,
            json,
        } => {
            let mut cfg = load_config(config, data_dir)?;
            if let Some(every) = progress_interval {
                cfg.progress_interval = every;
            }
            let jobs = cfg.select(&only)?;
            info!(data_dir = %cfg.data_dir.display(), "startup");

            let report = run_jobs(&cfg, &jobs, parallel);

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for o in &report.outcomes {
                    match (&o.stats, &o.error) {
                        (Some(s), _) => println!(
                            "{}: {} rows → {} (padded {}, truncated {}, invalid ABN {}, \
                             malformed {}, re-encoded {})",
                            o.name,
                            s.data_rows,
                            o.output.display(),
                            s.padded_rows,
                            s.truncated_rows,
                            s.skipped_invalid_id,
                            s.malformed_rows,
                            s.reencoded_rows
                        ),
                        (None, err) => println!(
                            "{}: FAILED: {}",
                            o.name,
                            err.as_deref().unwrap_or("unknown error")
                        ),
                    }
                }
            }

            if report.failed() > 0 {
                bail!(
                    "{} of {} cleaning jobs failed",
                    report.failed(),
                    report.outcomes.len()
                );
            }
            info!("all done");
        }

        Command::Profile {
            files,
            samples,
            json,
        } => {
            let paths = expand_patterns(&files)?;
            let mut failures = 0usize;
            let mut profiles = Vec::with_capacity(paths.len());
            for path in paths {
                match profile_csv(&path, samples) {
                    Ok(p) => profiles.push(p),
                    Err(e) => {
                        error!("profiling {} failed: {}", path.display(), e);
                        failures += 1;
                    }
                }
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&profiles)?);
            } else {
                for p in &profiles {
                    println!("\n--- {} ({} rows) ---", p.path.display(), p.rows);
                    render_profile(p).printstd();
                    for (i, row) in p.samples.iter().enumerate() {
                        println!("sample {}: {:?}", i + 1, row);
                    }
                }
            }

            if failures > 0 {
                bail!("{} file(s) could not be profiled", failures);
            }
        }

        Command::Schema { config, data_dir } => {
            let cfg = load_config(config, data_dir)?;
            for job in &cfg.jobs {
                let schema = job.table.schema();
                println!("-- {}", job.name);
                println!("{}", create_table_sql(&schema));
                println!("{}\n", copy_sql(&schema, &job.output_path(&cfg.data_dir)));
            }
        }
    }
    Ok(())
}

fn load_config(path: Option<PathBuf>, data_dir: Option<PathBuf>) -> Result<Config> {
    let mut cfg = Config::load_or_default(path.as_deref())?;
    if let Some(dir) = data_dir {
        cfg.data_dir = dir;
    }
    Ok(cfg)
}

/// Expand glob patterns; a pattern matching nothing is passed through as a literal
/// path so the missing file is reported by the profiler.
fn expand_patterns(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for pattern in patterns {
        let matched: Vec<PathBuf> = glob(pattern)
            .with_context(|| format!("Failed to read glob pattern '{}'", pattern))?
            .filter_map(|entry| entry.ok())
            .collect();
        if matched.is_empty() {
            warn!(pattern = %pattern, "pattern matched no files");
            out.push(PathBuf::from(pattern));
        } else {
            out.extend(matched);
        }
    }
    Ok(out)
}
