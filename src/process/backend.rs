// The per-platform process backend and its capability gate.
//
// Every operation has a default body that reports `Unsupported`. A backend
// overrides exactly the operations its platform can answer; anything it
// leaves alone fails explicitly instead of returning an empty value.

use std::collections::BTreeMap;
use std::fmt;

use crate::context::Context;
use crate::error::{Operation, ProcessError};
use crate::model::{
    Connection, CpuTimes, IoCounters, MemoryInfo, MemoryInfoEx, MemoryMap, NetIoCounters,
    NumCtxSwitches, OpenFile, RlimitStat, Signal, Status,
};

/// Fields resolved from the process record at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessFields {
    pub ppid: i32,
}

fn unsupported<T>(op: Operation) -> Result<T, ProcessError> {
    Err(ProcessError::Unsupported(op))
}

/// Platform implementation of process introspection.
///
/// Implementations hold no per-process state: every call re-reads the
/// system, so one backend may serve any number of threads and handles.
pub trait Backend: Send + Sync + fmt::Debug {
    /// Read and validate the process record, returning the fields a handle
    /// keeps. Fails with `RecordUnavailable` when the record cannot be read.
    fn read_record(&self, pid: i32, ctx: &Context) -> Result<ProcessFields, ProcessError>;

    fn name(&self, _pid: i32, _ctx: &Context) -> Result<String, ProcessError> {
        unsupported(Operation::Name)
    }

    fn tgid(&self, _pid: i32, _ctx: &Context) -> Result<i32, ProcessError> {
        unsupported(Operation::Tgid)
    }

    fn exe(&self, _pid: i32, _ctx: &Context) -> Result<String, ProcessError> {
        unsupported(Operation::Exe)
    }

    fn cmdline(&self, _pid: i32, _ctx: &Context) -> Result<String, ProcessError> {
        unsupported(Operation::Cmdline)
    }

    fn cmdline_slice(&self, _pid: i32, _ctx: &Context) -> Result<Vec<String>, ProcessError> {
        unsupported(Operation::CmdlineSlice)
    }

    /// Milliseconds since the Unix epoch.
    fn create_time(&self, _pid: i32, _ctx: &Context) -> Result<i64, ProcessError> {
        unsupported(Operation::CreateTime)
    }

    fn cwd(&self, _pid: i32, _ctx: &Context) -> Result<String, ProcessError> {
        unsupported(Operation::Cwd)
    }

    fn status(&self, _pid: i32, _ctx: &Context) -> Result<Status, ProcessError> {
        unsupported(Operation::Status)
    }

    fn uids(&self, _pid: i32, _ctx: &Context) -> Result<Vec<u32>, ProcessError> {
        unsupported(Operation::Uids)
    }

    fn gids(&self, _pid: i32, _ctx: &Context) -> Result<Vec<u32>, ProcessError> {
        unsupported(Operation::Gids)
    }

    /// `Ok(None)` means the process has no controlling terminal.
    fn terminal(&self, _pid: i32, _ctx: &Context) -> Result<Option<String>, ProcessError> {
        unsupported(Operation::Terminal)
    }

    fn nice(&self, _pid: i32, _ctx: &Context) -> Result<i32, ProcessError> {
        unsupported(Operation::Nice)
    }

    /// I/O scheduling class.
    fn ionice(&self, _pid: i32, _ctx: &Context) -> Result<i32, ProcessError> {
        unsupported(Operation::IoNice)
    }

    fn rlimit(&self, _pid: i32, _ctx: &Context) -> Result<Vec<RlimitStat>, ProcessError> {
        unsupported(Operation::Rlimit)
    }

    fn rlimit_usage(
        &self,
        _pid: i32,
        _gather_used: bool,
        _ctx: &Context,
    ) -> Result<Vec<RlimitStat>, ProcessError> {
        unsupported(Operation::RlimitUsage)
    }

    fn io_counters(&self, _pid: i32, _ctx: &Context) -> Result<IoCounters, ProcessError> {
        unsupported(Operation::IoCounters)
    }

    fn num_ctx_switches(&self, _pid: i32, _ctx: &Context) -> Result<NumCtxSwitches, ProcessError> {
        unsupported(Operation::NumCtxSwitches)
    }

    fn num_fds(&self, _pid: i32, _ctx: &Context) -> Result<i32, ProcessError> {
        unsupported(Operation::NumFds)
    }

    fn num_threads(&self, _pid: i32, _ctx: &Context) -> Result<i32, ProcessError> {
        unsupported(Operation::NumThreads)
    }

    /// CPU times keyed by thread id.
    fn threads(&self, _pid: i32, _ctx: &Context) -> Result<BTreeMap<i32, CpuTimes>, ProcessError> {
        unsupported(Operation::Threads)
    }

    fn times(&self, _pid: i32, _ctx: &Context) -> Result<CpuTimes, ProcessError> {
        unsupported(Operation::Times)
    }

    fn cpu_affinity(&self, _pid: i32, _ctx: &Context) -> Result<Vec<i32>, ProcessError> {
        unsupported(Operation::CpuAffinity)
    }

    fn memory_info(&self, _pid: i32, _ctx: &Context) -> Result<MemoryInfo, ProcessError> {
        unsupported(Operation::MemoryInfo)
    }

    fn memory_info_ex(&self, _pid: i32, _ctx: &Context) -> Result<MemoryInfoEx, ProcessError> {
        unsupported(Operation::MemoryInfoEx)
    }

    fn memory_maps(
        &self,
        _pid: i32,
        _grouped: bool,
        _ctx: &Context,
    ) -> Result<Vec<MemoryMap>, ProcessError> {
        unsupported(Operation::MemoryMaps)
    }

    /// Pids of the direct children.
    fn children(&self, _pid: i32, _ctx: &Context) -> Result<Vec<i32>, ProcessError> {
        unsupported(Operation::Children)
    }

    fn open_files(&self, _pid: i32, _ctx: &Context) -> Result<Vec<OpenFile>, ProcessError> {
        unsupported(Operation::OpenFiles)
    }

    fn connections(&self, _pid: i32, _ctx: &Context) -> Result<Vec<Connection>, ProcessError> {
        unsupported(Operation::Connections)
    }

    fn net_io_counters(
        &self,
        _pid: i32,
        _pernic: bool,
        _ctx: &Context,
    ) -> Result<Vec<NetIoCounters>, ProcessError> {
        unsupported(Operation::NetIoCounters)
    }

    /// Re-reads the record: present means running, `NotFound` means gone.
    fn is_running(&self, pid: i32, ctx: &Context) -> Result<bool, ProcessError> {
        match self.read_record(pid, ctx) {
            Ok(_) => Ok(true),
            Err(e) if e.is_gone() => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn send_signal(&self, _pid: i32, _signal: Signal, _ctx: &Context) -> Result<(), ProcessError> {
        unsupported(Operation::SendSignal)
    }

    fn suspend(&self, _pid: i32, _ctx: &Context) -> Result<(), ProcessError> {
        unsupported(Operation::Suspend)
    }

    fn resume(&self, _pid: i32, _ctx: &Context) -> Result<(), ProcessError> {
        unsupported(Operation::Resume)
    }

    fn terminate(&self, _pid: i32, _ctx: &Context) -> Result<(), ProcessError> {
        unsupported(Operation::Terminate)
    }

    fn kill(&self, _pid: i32, _ctx: &Context) -> Result<(), ProcessError> {
        unsupported(Operation::Kill)
    }

    fn username(&self, _pid: i32, _ctx: &Context) -> Result<String, ProcessError> {
        unsupported(Operation::Username)
    }
}

/// Backend for targets without any process-information source.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedBackend;

impl Backend for UnsupportedBackend {
    fn read_record(&self, _pid: i32, _ctx: &Context) -> Result<ProcessFields, ProcessError> {
        unsupported(Operation::ReadRecord)
    }

    fn is_running(&self, _pid: i32, _ctx: &Context) -> Result<bool, ProcessError> {
        unsupported(Operation::IsRunning)
    }
}
