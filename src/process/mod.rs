// Platform-abstracted process handle.
//
// A `Process` is a pid plus the parent pid read from the process record when
// the handle was built. Everything else is asked of the backend on demand:
//
//   - Linux:            LinuxBackend   (/proc/<pid>/*)
//   - macOS:            MacosBackend   (libproc proc_bsdinfo)
//   - Solaris/illumos:  PsinfoBackend  (/proc/<pid>/psinfo)
//   - anything else:    UnsupportedBackend
//
// Operations a backend cannot answer fail with `ProcessError::Unsupported`.

mod backend;
pub mod procfs;
pub mod psinfo;

#[cfg(target_os = "linux")]
pub mod linux;
#[cfg(target_os = "macos")]
pub mod macos;
#[cfg(any(target_os = "linux", target_os = "macos"))]
mod unix;

use std::collections::BTreeMap;
use std::sync::Arc;

pub use backend::{Backend, ProcessFields, UnsupportedBackend};
#[cfg(target_os = "linux")]
pub use linux::LinuxBackend;
#[cfg(target_os = "macos")]
pub use macos::MacosBackend;
pub use psinfo::PsinfoBackend;

use crate::context::Context;
use crate::error::ProcessError;
use crate::model::{
    Connection, CpuTimes, IoCounters, MemoryInfo, MemoryInfoEx, MemoryMap, NetIoCounters,
    NumCtxSwitches, OpenFile, RlimitStat, Signal, Status,
};

/// The backend for the platform this crate was built for.
#[cfg(target_os = "linux")]
pub fn default_backend() -> Arc<dyn Backend> {
    Arc::new(LinuxBackend::new())
}

#[cfg(target_os = "macos")]
pub fn default_backend() -> Arc<dyn Backend> {
    Arc::new(MacosBackend::new())
}

#[cfg(any(target_os = "solaris", target_os = "illumos"))]
pub fn default_backend() -> Arc<dyn Backend> {
    Arc::new(PsinfoBackend::new())
}

#[cfg(not(any(
    target_os = "linux",
    target_os = "macos",
    target_os = "solaris",
    target_os = "illumos"
)))]
pub fn default_backend() -> Arc<dyn Backend> {
    Arc::new(UnsupportedBackend)
}

/// One operating-system process.
#[derive(Clone, Debug)]
pub struct Process {
    pid: i32,
    ppid: i32,
    backend: Arc<dyn Backend>,
}

/// Generates `op()` and `op_with(ctx)` for operations taking only the pid.
macro_rules! delegate {
    ($($(#[$meta:meta])* $name:ident, $with:ident -> $ret:ty;)*) => {
        $(
            $(#[$meta])*
            pub fn $name(&self) -> Result<$ret, ProcessError> {
                self.$with(&Context::background())
            }

            pub fn $with(&self, ctx: &Context) -> Result<$ret, ProcessError> {
                self.backend.$name(self.pid, ctx)
            }
        )*
    };
}

impl Process {
    /// Open `pid` with the platform backend.
    pub fn new(pid: i32) -> Result<Self, ProcessError> {
        Self::new_with(pid, &Context::background())
    }

    pub fn new_with(pid: i32, ctx: &Context) -> Result<Self, ProcessError> {
        Self::with_backend(pid, default_backend(), ctx)
    }

    /// Open `pid` through an explicit backend. The record is read once; if
    /// that fails no handle is produced.
    pub fn with_backend(
        pid: i32,
        backend: Arc<dyn Backend>,
        ctx: &Context,
    ) -> Result<Self, ProcessError> {
        let fields = backend.read_record(pid, ctx)?;
        log::trace!("opened pid {pid} (ppid {})", fields.ppid);
        Ok(Self {
            pid,
            ppid: fields.ppid,
            backend,
        })
    }

    pub fn pid(&self) -> i32 {
        self.pid
    }

    /// Parent pid as recorded when this handle was built.
    pub fn ppid(&self) -> i32 {
        self.ppid
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    delegate! {
        name, name_with -> String;
        tgid, tgid_with -> i32;
        exe, exe_with -> String;
        /// Arguments joined with single spaces.
        cmdline, cmdline_with -> String;
        cmdline_slice, cmdline_slice_with -> Vec<String>;
        /// Milliseconds since the Unix epoch.
        create_time, create_time_with -> i64;
        cwd, cwd_with -> String;
        status, status_with -> Status;
        uids, uids_with -> Vec<u32>;
        gids, gids_with -> Vec<u32>;
        /// `None` when there is no controlling terminal.
        terminal, terminal_with -> Option<String>;
        nice, nice_with -> i32;
        ionice, ionice_with -> i32;
        rlimit, rlimit_with -> Vec<RlimitStat>;
        io_counters, io_counters_with -> IoCounters;
        num_ctx_switches, num_ctx_switches_with -> NumCtxSwitches;
        num_fds, num_fds_with -> i32;
        num_threads, num_threads_with -> i32;
        /// CPU times keyed by thread id.
        threads, threads_with -> BTreeMap<i32, CpuTimes>;
        times, times_with -> CpuTimes;
        cpu_affinity, cpu_affinity_with -> Vec<i32>;
        memory_info, memory_info_with -> MemoryInfo;
        memory_info_ex, memory_info_ex_with -> MemoryInfoEx;
        open_files, open_files_with -> Vec<OpenFile>;
        connections, connections_with -> Vec<Connection>;
        /// Re-reads the process record.
        is_running, is_running_with -> bool;
        suspend, suspend_with -> ();
        resume, resume_with -> ();
        terminate, terminate_with -> ();
        kill, kill_with -> ();
        username, username_with -> String;
    }

    /// Handle for the parent, through the same backend.
    pub fn parent(&self) -> Result<Process, ProcessError> {
        self.parent_with(&Context::background())
    }

    pub fn parent_with(&self, ctx: &Context) -> Result<Process, ProcessError> {
        Process::with_backend(self.ppid, Arc::clone(&self.backend), ctx)
    }

    /// Direct children. Each child's parent is this process, so no second
    /// record read is needed.
    pub fn children(&self) -> Result<Vec<Process>, ProcessError> {
        self.children_with(&Context::background())
    }

    pub fn children_with(&self, ctx: &Context) -> Result<Vec<Process>, ProcessError> {
        let pids = self.backend.children(self.pid, ctx)?;
        Ok(pids
            .into_iter()
            .map(|pid| Process {
                pid,
                ppid: self.pid,
                backend: Arc::clone(&self.backend),
            })
            .collect())
    }

    /// Limits with current consumption filled in when `gather_used` is set.
    pub fn rlimit_usage(&self, gather_used: bool) -> Result<Vec<RlimitStat>, ProcessError> {
        self.rlimit_usage_with(gather_used, &Context::background())
    }

    pub fn rlimit_usage_with(
        &self,
        gather_used: bool,
        ctx: &Context,
    ) -> Result<Vec<RlimitStat>, ProcessError> {
        self.backend.rlimit_usage(self.pid, gather_used, ctx)
    }

    /// Memory mappings; `grouped` merges entries with the same path.
    pub fn memory_maps(&self, grouped: bool) -> Result<Vec<MemoryMap>, ProcessError> {
        self.memory_maps_with(grouped, &Context::background())
    }

    pub fn memory_maps_with(
        &self,
        grouped: bool,
        ctx: &Context,
    ) -> Result<Vec<MemoryMap>, ProcessError> {
        self.backend.memory_maps(self.pid, grouped, ctx)
    }

    /// Interface counters; with `pernic` false they are summed into one
    /// entry named `all`.
    pub fn net_io_counters(&self, pernic: bool) -> Result<Vec<NetIoCounters>, ProcessError> {
        self.net_io_counters_with(pernic, &Context::background())
    }

    pub fn net_io_counters_with(
        &self,
        pernic: bool,
        ctx: &Context,
    ) -> Result<Vec<NetIoCounters>, ProcessError> {
        self.backend.net_io_counters(self.pid, pernic, ctx)
    }

    pub fn send_signal(&self, signal: Signal) -> Result<(), ProcessError> {
        self.send_signal_with(signal, &Context::background())
    }

    pub fn send_signal_with(&self, signal: Signal, ctx: &Context) -> Result<(), ProcessError> {
        self.backend.send_signal(self.pid, signal, ctx)
    }
}
