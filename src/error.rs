use std::fmt;
use std::io;
use std::path::PathBuf;

/// Every operation a [`Backend`](crate::process::Backend) may decline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ReadRecord,
    Name,
    Tgid,
    Exe,
    Cmdline,
    CmdlineSlice,
    CreateTime,
    Cwd,
    Parent,
    Status,
    Uids,
    Gids,
    Terminal,
    Nice,
    IoNice,
    Rlimit,
    RlimitUsage,
    IoCounters,
    NumCtxSwitches,
    NumFds,
    NumThreads,
    Threads,
    Times,
    CpuAffinity,
    MemoryInfo,
    MemoryInfoEx,
    MemoryMaps,
    Children,
    OpenFiles,
    Connections,
    NetIoCounters,
    IsRunning,
    SendSignal,
    Suspend,
    Resume,
    Terminate,
    Kill,
    Username,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::ReadRecord => "read_record",
            Operation::Name => "name",
            Operation::Tgid => "tgid",
            Operation::Exe => "exe",
            Operation::Cmdline => "cmdline",
            Operation::CmdlineSlice => "cmdline_slice",
            Operation::CreateTime => "create_time",
            Operation::Cwd => "cwd",
            Operation::Parent => "parent",
            Operation::Status => "status",
            Operation::Uids => "uids",
            Operation::Gids => "gids",
            Operation::Terminal => "terminal",
            Operation::Nice => "nice",
            Operation::IoNice => "ionice",
            Operation::Rlimit => "rlimit",
            Operation::RlimitUsage => "rlimit_usage",
            Operation::IoCounters => "io_counters",
            Operation::NumCtxSwitches => "num_ctx_switches",
            Operation::NumFds => "num_fds",
            Operation::NumThreads => "num_threads",
            Operation::Threads => "threads",
            Operation::Times => "times",
            Operation::CpuAffinity => "cpu_affinity",
            Operation::MemoryInfo => "memory_info",
            Operation::MemoryInfoEx => "memory_info_ex",
            Operation::MemoryMaps => "memory_maps",
            Operation::Children => "children",
            Operation::OpenFiles => "open_files",
            Operation::Connections => "connections",
            Operation::NetIoCounters => "net_io_counters",
            Operation::IsRunning => "is_running",
            Operation::SendSignal => "send_signal",
            Operation::Suspend => "suspend",
            Operation::Resume => "resume",
            Operation::Terminate => "terminate",
            Operation::Kill => "kill",
            Operation::Username => "username",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("process record unavailable for pid {pid}: {source}")]
    RecordUnavailable {
        pid: i32,
        #[source]
        source: io::Error,
    },
    #[error("malformed process record for pid {pid}: {detail}")]
    MalformedRecord { pid: i32, detail: String },
    #[error("{0} is not supported on this platform")]
    Unsupported(Operation),
    #[error("process {0} does not exist")]
    NoSuchProcess(i32),
    #[error("access denied to process {0}")]
    AccessDenied(i32),
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot parse {}: {detail}", path.display())]
    Parse { path: PathBuf, detail: String },
    #[error("could not resolve {what} for pid {pid}")]
    Unresolved { pid: i32, what: String },
    #[error("no passwd entry for uid {0}")]
    UnknownUser(u32),
    #[error("operation cancelled")]
    Cancelled,
    #[error("deadline exceeded")]
    DeadlineExceeded,
    #[error("system call failed: {0}")]
    Os(#[source] io::Error),
}

impl ProcessError {
    pub fn is_unsupported(&self) -> bool {
        matches!(self, ProcessError::Unsupported(_))
    }

    /// True when the error means the process is gone rather than unreadable.
    pub fn is_gone(&self) -> bool {
        match self {
            ProcessError::NoSuchProcess(_) => true,
            ProcessError::RecordUnavailable { source, .. } => {
                source.kind() == io::ErrorKind::NotFound
            }
            _ => false,
        }
    }
}
