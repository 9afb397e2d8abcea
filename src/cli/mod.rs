pub mod report;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::config::{Manifest, DEFAULT_MANIFEST};

#[derive(Parser, Debug)]
#[command(name = "tributary")]
#[command(about = "Mirror remote assets to disk using conditional requests", long_about = None)]
pub struct Cli {
    /// Path to the manifest file
    #[arg(short, long, default_value = DEFAULT_MANIFEST)]
    pub config: PathBuf,

    /// Directory to mirror into (overrides `output_dir`)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Number of parallel downloads (overrides `fetch.parallel`)
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    pub parallel: Option<u64>,

    /// Deadline for the whole batch, e.g. "90s", "2m" (overrides `fetch.deadline_secs`)
    #[arg(short, long, value_parser = parse_duration)]
    pub deadline: Option<Duration>,

    /// Exit with status 1 if any download fails
    #[arg(long)]
    pub strict: bool,

    /// Log per-item decisions
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded manifest.
    pub fn apply(&self, manifest: &mut Manifest) {
        if let Some(dir) = &self.output_dir {
            manifest.output_dir = dir.clone();
        }
        if let Some(parallel) = self.parallel {
            manifest.fetch.parallel = parallel as usize;
        }
        if let Some(deadline) = self.deadline {
            manifest.fetch.deadline_secs = deadline.as_secs().max(1);
        }
    }
}

/// Parse a duration like "90s", "2m", "1h" or a bare number of seconds.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim().to_lowercase();

    let secs = if let Some(hours) = s.strip_suffix('h') {
        hours
            .parse::<u64>()
            .map_err(|_| format!("Invalid hours: {}", hours))?
            .checked_mul(3600)
            .ok_or_else(|| format!("Duration too large: {}", s))?
    } else if let Some(minutes) = s.strip_suffix('m') {
        minutes
            .parse::<u64>()
            .map_err(|_| format!("Invalid minutes: {}", minutes))?
            .checked_mul(60)
            .ok_or_else(|| format!("Duration too large: {}", s))?
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.parse::<u64>()
            .map_err(|_| format!("Invalid seconds: {}", secs))?
    } else {
        s.parse::<u64>()
            .map_err(|_| format!("Invalid duration: {}. Use format like '90s', '2m'", s))?
    };

    if secs == 0 {
        return Err("Duration must be at least one second".to_string());
    }

    Ok(Duration::from_secs(secs))
}
