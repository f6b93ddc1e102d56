pub mod json;
pub mod text;

use std::io::{self, Write};

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::context::Context;
use crate::error::{Operation, ProcessError};
use crate::process::Process;

/// What one operation produced for one process.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Value { value: serde_json::Value },
    Unsupported,
    Error { message: String },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Field {
    pub operation: &'static str,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Everything learned about one pid.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Report {
    pub pid: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ppid: Option<i32>,
    /// Set when no handle could be opened; `fields` is then empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub fields: Vec<Field>,
}

fn probe<T: Serialize>(operation: Operation, result: Result<T, ProcessError>) -> Field {
    let outcome = match result {
        Ok(v) => match serde_json::to_value(v) {
            Ok(value) => Outcome::Value { value },
            Err(e) => Outcome::Error {
                message: e.to_string(),
            },
        },
        Err(ProcessError::Unsupported(_)) => Outcome::Unsupported,
        Err(e) => Outcome::Error {
            message: e.to_string(),
        },
    };
    Field {
        operation: operation.as_str(),
        outcome,
    }
}

impl Report {
    /// Run every read-only operation against `process`.
    pub fn collect(process: &Process, ctx: &Context) -> Report {
        let parent = process.parent_with(ctx).map(|p| p.pid());
        let children = process
            .children_with(ctx)
            .map(|c| c.iter().map(Process::pid).collect::<Vec<_>>());

        let fields = vec![
            probe(Operation::Name, process.name_with(ctx)),
            probe(Operation::Tgid, process.tgid_with(ctx)),
            probe(Operation::Exe, process.exe_with(ctx)),
            probe(Operation::Cmdline, process.cmdline_with(ctx)),
            probe(Operation::CreateTime, process.create_time_with(ctx)),
            probe(Operation::Cwd, process.cwd_with(ctx)),
            probe(Operation::Parent, parent),
            probe(Operation::Status, process.status_with(ctx)),
            probe(Operation::Uids, process.uids_with(ctx)),
            probe(Operation::Gids, process.gids_with(ctx)),
            probe(Operation::Terminal, process.terminal_with(ctx)),
            probe(Operation::Nice, process.nice_with(ctx)),
            probe(Operation::IoNice, process.ionice_with(ctx)),
            probe(Operation::RlimitUsage, process.rlimit_usage_with(true, ctx)),
            probe(Operation::IoCounters, process.io_counters_with(ctx)),
            probe(Operation::NumCtxSwitches, process.num_ctx_switches_with(ctx)),
            probe(Operation::NumFds, process.num_fds_with(ctx)),
            probe(Operation::NumThreads, process.num_threads_with(ctx)),
            probe(Operation::Times, process.times_with(ctx)),
            probe(Operation::CpuAffinity, process.cpu_affinity_with(ctx)),
            probe(Operation::MemoryInfo, process.memory_info_with(ctx)),
            probe(Operation::MemoryInfoEx, process.memory_info_ex_with(ctx)),
            probe(Operation::Children, children),
            probe(Operation::OpenFiles, process.open_files_with(ctx)),
            probe(Operation::Connections, process.connections_with(ctx)),
            probe(Operation::NetIoCounters, process.net_io_counters_with(false, ctx)),
            probe(Operation::IsRunning, process.is_running_with(ctx)),
            probe(Operation::Username, process.username_with(ctx)),
        ];

        Report {
            pid: process.pid(),
            ppid: Some(process.ppid()),
            error: None,
            fields,
        }
    }

    /// Report for a pid whose record could not be read.
    pub fn failed(pid: i32, err: &ProcessError) -> Report {
        Report {
            pid,
            ppid: None,
            error: Some(err.to_string()),
            fields: Vec::new(),
        }
    }
}

/// Write reports in the specified format.
pub fn write_reports(
    reports: &[Report],
    format: OutputFormat,
    writer: &mut impl Write,
) -> io::Result<()> {
    match format {
        OutputFormat::Text => text::write_text(reports, writer),
        OutputFormat::Json => json::write_json(reports, writer),
    }
}
