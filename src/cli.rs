use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "procprobe",
    version,
    about = "Inspect running processes through the platform's process records"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Open each pid and report every operation's outcome
    Inspect(InspectArgs),
}

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    /// Process ids to inspect
    #[arg(required = true, value_parser = validate_pid)]
    pub pids: Vec<i32>,

    /// Record source [default: native]
    #[arg(long, default_value = "native")]
    pub backend: BackendKind,

    /// Root of the process filesystem [default: /proc]
    #[arg(long)]
    pub procfs: Option<PathBuf>,

    /// Output format [default: text]
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,

    /// Give up on a pid after this many seconds
    #[arg(long, value_parser = validate_timeout)]
    pub timeout: Option<f64>,
}

impl InspectArgs {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs_f64)
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// The backend this binary was built for
    Native,
    /// Binary psinfo records under --procfs
    Psinfo,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

fn validate_pid(s: &str) -> Result<i32, String> {
    let val: i32 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid pid"))?;
    if val <= 0 {
        Err("pid must be positive".to_string())
    } else {
        Ok(val)
    }
}

fn validate_timeout(s: &str) -> Result<f64, String> {
    let val: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if !(0.001..=3600.0).contains(&val) {
        Err("timeout must be between 0.001 and 3600 seconds".to_string())
    } else {
        Ok(val)
    }
}
