// Linux backend: reads /proc/<pid>/* on demand.
//
// The process record is /proc/<pid>/stat. Every other operation reads its own
// file (status, statm, io, limits, smaps, fd/, task/, net/*) fresh on each
// call. Only the few values the kernel does not expose through /proc come
// from syscalls: signals, CPU affinity, I/O priority, passwd lookups.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::mem;
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::path::{Path, PathBuf};

use crate::context::Context;
use crate::error::ProcessError;
use crate::model::{
    AddressFamily, Connection, CpuTimes, IoCounters, MemoryInfo, MemoryInfoEx, MemoryMap,
    NetIoCounters, NumCtxSwitches, OpenFile, Protocol, Resource, RlimitStat, Signal, Status,
};

use super::backend::{Backend, ProcessFields};
use super::procfs::{self, ProcStatus, SocketEntry, Stat};
use super::unix;

/// comm is truncated to TASK_COMM_LEN - 1 bytes.
const COMM_LEN: usize = 15;

const IOPRIO_WHO_PROCESS: libc::c_int = 1;
const IOPRIO_CLASS_SHIFT: libc::c_long = 13;

#[derive(Debug, Clone)]
pub struct LinuxBackend {
    root: PathBuf,
}

impl Default for LinuxBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl LinuxBackend {
    pub fn new() -> Self {
        Self::with_root("/proc")
    }

    /// Read from a procfs mounted somewhere other than /proc.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn proc_dir(&self, pid: i32) -> PathBuf {
        self.root.join(pid.to_string())
    }

    fn io_error(&self, pid: i32, path: PathBuf, err: io::Error) -> ProcessError {
        match err.kind() {
            io::ErrorKind::NotFound if !self.proc_dir(pid).exists() => {
                ProcessError::NoSuchProcess(pid)
            }
            io::ErrorKind::PermissionDenied => ProcessError::AccessDenied(pid),
            _ => ProcessError::Io { path, source: err },
        }
    }

    fn read(&self, pid: i32, file: &str) -> Result<String, ProcessError> {
        let path = self.proc_dir(pid).join(file);
        read_lossy(&path).map_err(|e| self.io_error(pid, path, e))
    }

    fn read_link(&self, pid: i32, file: &str) -> Result<String, ProcessError> {
        let path = self.proc_dir(pid).join(file);
        fs::read_link(&path)
            .map(|target| target.to_string_lossy().into_owned())
            .map_err(|e| self.io_error(pid, path, e))
    }

    fn parse_error(&self, pid: i32, file: &str, detail: &str) -> ProcessError {
        ProcessError::Parse {
            path: self.proc_dir(pid).join(file),
            detail: detail.to_string(),
        }
    }

    fn stat(&self, pid: i32) -> Result<Stat, ProcessError> {
        let content = self.read(pid, "stat")?;
        procfs::parse_stat(&content)
            .ok_or_else(|| self.parse_error(pid, "stat", "malformed stat line"))
    }

    fn proc_status(&self, pid: i32) -> Result<ProcStatus, ProcessError> {
        self.read(pid, "status").map(|c| procfs::parse_status(&c))
    }

    fn missing(&self, pid: i32, file: &str, field: &str) -> ProcessError {
        self.parse_error(pid, file, &format!("no {field} field"))
    }

    fn boot_time(&self) -> Result<u64, ProcessError> {
        let path = self.root.join("stat");
        let content = fs::read_to_string(&path).map_err(|source| ProcessError::Io {
            path: path.clone(),
            source,
        })?;
        procfs::parse_boot_time(&content).ok_or(ProcessError::Parse {
            path,
            detail: "no btime line".to_string(),
        })
    }

    fn cpu_times(stat: &Stat) -> Result<CpuTimes, ProcessError> {
        let ticks = clock_ticks()?;
        Ok(CpuTimes {
            user: stat.utime as f64 / ticks,
            system: stat.stime as f64 / ticks,
            children_user: stat.cutime as f64 / ticks,
            children_system: stat.cstime as f64 / ticks,
            iowait: stat.delayacct_blkio_ticks.map(|t| t as f64 / ticks),
        })
    }

    /// (fd, link target) for every descriptor still open while we look.
    fn fd_links(&self, pid: i32) -> Result<Vec<(i32, String)>, ProcessError> {
        let dir = self.proc_dir(pid).join("fd");
        let entries = fs::read_dir(&dir).map_err(|e| self.io_error(pid, dir.clone(), e))?;

        let mut links = Vec::new();
        for entry in entries.flatten() {
            let Ok(fd) = entry.file_name().to_string_lossy().parse::<i32>() else {
                continue;
            };
            match fs::read_link(entry.path()) {
                Ok(target) => links.push((fd, target.to_string_lossy().into_owned())),
                // closed between readdir and readlink
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    log::trace!("pid {pid}: fd {fd} vanished");
                }
                Err(e) => return Err(self.io_error(pid, entry.path(), e)),
            }
        }
        links.sort_by_key(|(fd, _)| *fd);
        Ok(links)
    }

    fn socket_table(&self, pid: i32) -> Result<HashMap<u64, SocketEntry>, ProcessError> {
        let net = self.proc_dir(pid).join("net");
        let mut table = HashMap::new();

        for (file, family, protocol) in [
            ("tcp", AddressFamily::Inet, Protocol::Tcp),
            ("tcp6", AddressFamily::Inet6, Protocol::Tcp),
            ("udp", AddressFamily::Inet, Protocol::Udp),
            ("udp6", AddressFamily::Inet6, Protocol::Udp),
        ] {
            let path = net.join(file);
            match fs::read_to_string(&path) {
                Ok(content) => {
                    for entry in procfs::parse_proc_net(&content, family, protocol) {
                        table.insert(entry.inode, entry);
                    }
                }
                // IPv6 disabled, or the protocol is not built in
                Err(e) if e.kind() == io::ErrorKind::NotFound && self.proc_dir(pid).exists() => {
                    log::debug!("{} not present, skipping", path.display());
                }
                Err(e) => return Err(self.io_error(pid, path, e)),
            }
        }

        Ok(table)
    }

    fn find_tty(&self, pid: i32, tty_nr: i32) -> Result<String, ProcessError> {
        let (major, minor) = procfs::tty_device(tty_nr);
        for dir in ["/dev/pts", "/dev"] {
            let Ok(entries) = fs::read_dir(dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let Ok(meta) = entry.metadata() else {
                    continue;
                };
                if meta.file_type().is_char_device()
                    && procfs::split_dev(meta.rdev()) == (major, minor)
                {
                    return Ok(entry.path().to_string_lossy().into_owned());
                }
            }
        }
        Err(ProcessError::Unresolved {
            pid,
            what: format!("terminal device {major}:{minor}"),
        })
    }
}

/// Read a /proc text file. comm and other kernel-copied names are raw bytes,
/// so invalid UTF-8 is replaced rather than rejected.
fn read_lossy(path: &Path) -> io::Result<String> {
    fs::read(path).map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}

fn clock_ticks() -> Result<f64, ProcessError> {
    let ticks = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
    if ticks <= 0 {
        return Err(ProcessError::Os(io::Error::last_os_error()));
    }
    Ok(ticks as f64)
}

fn page_size() -> Result<u64, ProcessError> {
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size <= 0 {
        return Err(ProcessError::Os(io::Error::last_os_error()));
    }
    Ok(size as u64)
}

impl Backend for LinuxBackend {
    fn read_record(&self, pid: i32, ctx: &Context) -> Result<ProcessFields, ProcessError> {
        ctx.check()?;
        let path = self.proc_dir(pid).join("stat");
        let content = read_lossy(&path).map_err(|source| {
            log::debug!("cannot read {}: {source}", path.display());
            ProcessError::RecordUnavailable { pid, source }
        })?;
        let stat = procfs::parse_stat(&content).ok_or_else(|| ProcessError::MalformedRecord {
            pid,
            detail: "unparseable stat line".to_string(),
        })?;
        if stat.pid != pid {
            return Err(ProcessError::MalformedRecord {
                pid,
                detail: format!("record describes pid {}", stat.pid),
            });
        }
        Ok(ProcessFields { ppid: stat.ppid })
    }

    fn name(&self, pid: i32, ctx: &Context) -> Result<String, ProcessError> {
        ctx.check()?;
        let name = self
            .proc_status(pid)?
            .name
            .ok_or_else(|| self.missing(pid, "status", "Name"))?;
        if name.len() < COMM_LEN {
            return Ok(name);
        }

        // comm was probably truncated; recover the full name from argv[0]
        if let Ok(args) = self.cmdline_slice(pid, ctx)
            && let Some(arg0) = args.first()
        {
            let base = arg0.rsplit('/').next().unwrap_or(arg0);
            if base.starts_with(&name) {
                return Ok(base.to_string());
            }
        }
        Ok(name)
    }

    fn tgid(&self, pid: i32, ctx: &Context) -> Result<i32, ProcessError> {
        ctx.check()?;
        self.proc_status(pid)?
            .tgid
            .ok_or_else(|| self.missing(pid, "status", "Tgid"))
    }

    fn exe(&self, pid: i32, ctx: &Context) -> Result<String, ProcessError> {
        ctx.check()?;
        self.read_link(pid, "exe")
    }

    fn cmdline(&self, pid: i32, ctx: &Context) -> Result<String, ProcessError> {
        self.cmdline_slice(pid, ctx).map(|args| args.join(" "))
    }

    fn cmdline_slice(&self, pid: i32, ctx: &Context) -> Result<Vec<String>, ProcessError> {
        ctx.check()?;
        let path = self.proc_dir(pid).join("cmdline");
        let raw = fs::read(&path).map_err(|e| self.io_error(pid, path, e))?;
        Ok(procfs::parse_cmdline(&raw))
    }

    fn create_time(&self, pid: i32, ctx: &Context) -> Result<i64, ProcessError> {
        ctx.check()?;
        let stat = self.stat(pid)?;
        let boot = self.boot_time()?;
        let ticks = clock_ticks()?;
        let since_boot = (stat.starttime as f64 * 1000.0 / ticks) as i64;
        i64::try_from(boot)
            .ok()
            .and_then(|secs| secs.checked_mul(1000))
            .and_then(|ms| ms.checked_add(since_boot))
            .ok_or_else(|| self.parse_error(pid, "stat", "start time out of range"))
    }

    fn cwd(&self, pid: i32, ctx: &Context) -> Result<String, ProcessError> {
        ctx.check()?;
        self.read_link(pid, "cwd")
    }

    fn status(&self, pid: i32, ctx: &Context) -> Result<Status, ProcessError> {
        ctx.check()?;
        let stat = self.stat(pid)?;
        Status::from_linux_code(stat.state).ok_or_else(|| {
            self.parse_error(pid, "stat", &format!("unknown state {:?}", stat.state))
        })
    }

    fn uids(&self, pid: i32, ctx: &Context) -> Result<Vec<u32>, ProcessError> {
        ctx.check()?;
        self.proc_status(pid)?
            .uids
            .ok_or_else(|| self.missing(pid, "status", "Uid"))
    }

    fn gids(&self, pid: i32, ctx: &Context) -> Result<Vec<u32>, ProcessError> {
        ctx.check()?;
        self.proc_status(pid)?
            .gids
            .ok_or_else(|| self.missing(pid, "status", "Gid"))
    }

    fn terminal(&self, pid: i32, ctx: &Context) -> Result<Option<String>, ProcessError> {
        ctx.check()?;
        let stat = self.stat(pid)?;
        if stat.tty_nr == 0 {
            return Ok(None);
        }
        self.find_tty(pid, stat.tty_nr).map(Some)
    }

    fn nice(&self, pid: i32, ctx: &Context) -> Result<i32, ProcessError> {
        ctx.check()?;
        Ok(self.stat(pid)?.nice)
    }

    fn ionice(&self, pid: i32, ctx: &Context) -> Result<i32, ProcessError> {
        ctx.check()?;
        let ret = unsafe { libc::syscall(libc::SYS_ioprio_get, IOPRIO_WHO_PROCESS, pid) };
        if ret < 0 {
            return Err(unix::errno_error(pid, io::Error::last_os_error()));
        }
        Ok((ret >> IOPRIO_CLASS_SHIFT) as i32)
    }

    fn rlimit(&self, pid: i32, ctx: &Context) -> Result<Vec<RlimitStat>, ProcessError> {
        ctx.check()?;
        let content = self.read(pid, "limits")?;
        procfs::parse_limits(&content)
            .ok_or_else(|| self.parse_error(pid, "limits", "no recognised limit rows"))
    }

    fn rlimit_usage(
        &self,
        pid: i32,
        gather_used: bool,
        ctx: &Context,
    ) -> Result<Vec<RlimitStat>, ProcessError> {
        let mut limits = self.rlimit(pid, ctx)?;
        if !gather_used {
            return Ok(limits);
        }

        let stat = self.stat(pid)?;
        let status = self.proc_status(pid)?;
        let num_fds = self.num_fds(pid, ctx)?;
        let times = Self::cpu_times(&stat)?;

        for limit in &mut limits {
            limit.used = match limit.resource {
                Resource::Cpu => Some(times.total() as u64),
                Resource::Data => status.vm_data,
                Resource::Stack => status.vm_stk,
                Resource::Rss => status.vm_rss,
                Resource::Memlock => status.vm_lck,
                Resource::As => status.vm_size,
                Resource::Nofile => Some(num_fds as u64),
                Resource::Nproc => Some(stat.num_threads as u64),
                // RLIMIT_NICE is expressed as 20 - nice
                Resource::Nice => Some((20 - stat.nice) as u64),
                Resource::Rtprio => stat.rt_priority.map(u64::from),
                Resource::Fsize
                | Resource::Core
                | Resource::Locks
                | Resource::Sigpending
                | Resource::Msgqueue
                | Resource::Rttime => None,
            };
        }
        Ok(limits)
    }

    fn io_counters(&self, pid: i32, ctx: &Context) -> Result<IoCounters, ProcessError> {
        ctx.check()?;
        let content = self.read(pid, "io")?;
        procfs::parse_io(&content).ok_or_else(|| self.parse_error(pid, "io", "missing counters"))
    }

    fn num_ctx_switches(&self, pid: i32, ctx: &Context) -> Result<NumCtxSwitches, ProcessError> {
        ctx.check()?;
        let status = self.proc_status(pid)?;
        Ok(NumCtxSwitches {
            voluntary: status
                .voluntary_ctxt_switches
                .ok_or_else(|| self.missing(pid, "status", "voluntary_ctxt_switches"))?,
            involuntary: status
                .nonvoluntary_ctxt_switches
                .ok_or_else(|| self.missing(pid, "status", "nonvoluntary_ctxt_switches"))?,
        })
    }

    fn num_fds(&self, pid: i32, ctx: &Context) -> Result<i32, ProcessError> {
        ctx.check()?;
        let dir = self.proc_dir(pid).join("fd");
        let entries = fs::read_dir(&dir).map_err(|e| self.io_error(pid, dir.clone(), e))?;
        Ok(entries.flatten().count() as i32)
    }

    fn num_threads(&self, pid: i32, ctx: &Context) -> Result<i32, ProcessError> {
        ctx.check()?;
        Ok(self.stat(pid)?.num_threads)
    }

    fn threads(&self, pid: i32, ctx: &Context) -> Result<BTreeMap<i32, CpuTimes>, ProcessError> {
        ctx.check()?;
        let dir = self.proc_dir(pid).join("task");
        let entries = fs::read_dir(&dir).map_err(|e| self.io_error(pid, dir.clone(), e))?;

        let mut threads = BTreeMap::new();
        for entry in entries.flatten() {
            let Ok(tid) = entry.file_name().to_string_lossy().parse::<i32>() else {
                continue;
            };
            let path = entry.path().join("stat");
            let content = match read_lossy(&path) {
                Ok(c) => c,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    log::trace!("pid {pid}: thread {tid} exited");
                    continue;
                }
                Err(e) => return Err(self.io_error(pid, path, e)),
            };
            let stat = procfs::parse_stat(&content).ok_or_else(|| ProcessError::Parse {
                path: path.clone(),
                detail: "malformed stat line".to_string(),
            })?;
            threads.insert(tid, Self::cpu_times(&stat)?);
        }
        Ok(threads)
    }

    fn times(&self, pid: i32, ctx: &Context) -> Result<CpuTimes, ProcessError> {
        ctx.check()?;
        Self::cpu_times(&self.stat(pid)?)
    }

    fn cpu_affinity(&self, pid: i32, ctx: &Context) -> Result<Vec<i32>, ProcessError> {
        ctx.check()?;
        let mut set: libc::cpu_set_t = unsafe { mem::zeroed() };
        let ret = unsafe {
            libc::sched_getaffinity(pid, mem::size_of::<libc::cpu_set_t>(), &mut set)
        };
        if ret != 0 {
            return Err(unix::errno_error(pid, io::Error::last_os_error()));
        }
        Ok((0..libc::CPU_SETSIZE as usize)
            .filter(|&cpu| unsafe { libc::CPU_ISSET(cpu, &set) })
            .map(|cpu| cpu as i32)
            .collect())
    }

    fn memory_info(&self, pid: i32, ctx: &Context) -> Result<MemoryInfo, ProcessError> {
        ctx.check()?;
        self.proc_status(pid)?
            .memory_info()
            .ok_or_else(|| self.missing(pid, "status", "Vm*"))
    }

    fn memory_info_ex(&self, pid: i32, ctx: &Context) -> Result<MemoryInfoEx, ProcessError> {
        ctx.check()?;
        let content = self.read(pid, "statm")?;
        procfs::parse_statm(&content, page_size()?)
            .ok_or_else(|| self.parse_error(pid, "statm", "expected 7 page counts"))
    }

    fn memory_maps(
        &self,
        pid: i32,
        grouped: bool,
        ctx: &Context,
    ) -> Result<Vec<MemoryMap>, ProcessError> {
        ctx.check()?;
        let maps = procfs::parse_smaps(&self.read(pid, "smaps")?);
        Ok(if grouped { procfs::group_maps(maps) } else { maps })
    }

    fn children(&self, pid: i32, ctx: &Context) -> Result<Vec<i32>, ProcessError> {
        ctx.check()?;
        if !self.proc_dir(pid).exists() {
            return Err(ProcessError::NoSuchProcess(pid));
        }
        let entries = fs::read_dir(&self.root).map_err(|source| ProcessError::Io {
            path: self.root.clone(),
            source,
        })?;

        let mut children = Vec::new();
        for entry in entries.flatten() {
            let Ok(candidate) = entry.file_name().to_string_lossy().parse::<i32>() else {
                continue;
            };
            match self.stat(candidate) {
                Ok(stat) if stat.ppid == pid => children.push(candidate),
                Ok(_) => {}
                Err(e) => log::trace!("skipping pid {candidate}: {e}"),
            }
        }
        children.sort_unstable();
        Ok(children)
    }

    fn open_files(&self, pid: i32, ctx: &Context) -> Result<Vec<OpenFile>, ProcessError> {
        ctx.check()?;
        Ok(self
            .fd_links(pid)?
            .into_iter()
            .filter(|(_, target)| target.starts_with('/'))
            .map(|(fd, path)| OpenFile { fd, path })
            .collect())
    }

    fn connections(&self, pid: i32, ctx: &Context) -> Result<Vec<Connection>, ProcessError> {
        ctx.check()?;
        let sockets = self.socket_table(pid)?;
        if sockets.is_empty() {
            return Ok(Vec::new());
        }

        let mut connections = Vec::new();
        for (fd, target) in self.fd_links(pid)? {
            if let Some(inode) = procfs::parse_socket_inode(&target)
                && let Some(sock) = sockets.get(&inode)
            {
                connections.push(Connection {
                    fd,
                    family: sock.family,
                    protocol: sock.protocol,
                    local: sock.local,
                    remote: sock.remote,
                    state: sock.state,
                    pid,
                });
            }
        }
        Ok(connections)
    }

    fn net_io_counters(
        &self,
        pid: i32,
        pernic: bool,
        ctx: &Context,
    ) -> Result<Vec<NetIoCounters>, ProcessError> {
        ctx.check()?;
        let counters = procfs::parse_net_dev(&self.read(pid, "net/dev")?);
        if pernic {
            return Ok(counters);
        }
        let mut all = NetIoCounters {
            name: "all".to_string(),
            ..NetIoCounters::default()
        };
        for nic in &counters {
            all.absorb(nic);
        }
        Ok(vec![all])
    }

    fn send_signal(&self, pid: i32, signal: Signal, ctx: &Context) -> Result<(), ProcessError> {
        ctx.check()?;
        unix::send_signal(pid, signal)
    }

    fn suspend(&self, pid: i32, ctx: &Context) -> Result<(), ProcessError> {
        self.send_signal(pid, Signal::Stop, ctx)
    }

    fn resume(&self, pid: i32, ctx: &Context) -> Result<(), ProcessError> {
        self.send_signal(pid, Signal::Continue, ctx)
    }

    fn terminate(&self, pid: i32, ctx: &Context) -> Result<(), ProcessError> {
        self.send_signal(pid, Signal::Terminate, ctx)
    }

    fn kill(&self, pid: i32, ctx: &Context) -> Result<(), ProcessError> {
        self.send_signal(pid, Signal::Kill, ctx)
    }

    fn username(&self, pid: i32, ctx: &Context) -> Result<String, ProcessError> {
        let uids = self.uids(pid, ctx)?;
        let uid = *uids
            .first()
            .ok_or_else(|| self.missing(pid, "status", "Uid"))?;
        unix::username(uid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_root(tag: &str) -> PathBuf {
        let root = std::env::temp_dir().join(format!(
            "procprobe-linux-{tag}-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(root.join("77")).unwrap();
        fs::write(
            root.join("77/stat"),
            "77 (worker) R 5 77 77 0 -1 0 0 0 0 0 100 50 0 0 20 0 2 0 500 1000 10\n",
        )
        .unwrap();
        fs::write(root.join("77/status"), "Name:\tworker\nUid:\t0\t0\t0\t0\n").unwrap();
        fs::write(root.join("77/cmdline"), b"/opt/bin/worker\0--fast\0").unwrap();
        fs::write(root.join("stat"), "cpu 0\nbtime 1000\n").unwrap();
        root
    }

    #[test]
    fn reads_record_from_custom_root() {
        let root = fixture_root("record");
        let backend = LinuxBackend::with_root(&root);
        let ctx = Context::background();
        assert_eq!(backend.read_record(77, &ctx).unwrap(), ProcessFields { ppid: 5 });
        assert_eq!(backend.status(77, &ctx).unwrap(), Status::Running);
        assert_eq!(backend.num_threads(77, &ctx).unwrap(), 2);
        assert_eq!(backend.name(77, &ctx).unwrap(), "worker");
        assert_eq!(backend.cmdline(77, &ctx).unwrap(), "/opt/bin/worker --fast");
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn missing_record_is_unavailable() {
        let root = fixture_root("missing");
        let backend = LinuxBackend::with_root(&root);
        let err = backend.read_record(78, &Context::background()).unwrap_err();
        assert!(matches!(err, ProcessError::RecordUnavailable { pid: 78, .. }));
        assert!(err.is_gone());
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn record_for_other_pid_is_malformed() {
        let root = fixture_root("mismatch");
        fs::create_dir_all(root.join("90")).unwrap();
        fs::copy(root.join("77/stat"), root.join("90/stat")).unwrap();
        let backend = LinuxBackend::with_root(&root);
        let err = backend.read_record(90, &Context::background()).unwrap_err();
        assert!(matches!(err, ProcessError::MalformedRecord { pid: 90, .. }));
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn missing_optional_file_is_not_reported_as_gone() {
        let root = fixture_root("noio");
        let backend = LinuxBackend::with_root(&root);
        let err = backend.io_counters(77, &Context::background()).unwrap_err();
        assert!(matches!(err, ProcessError::Io { .. }));
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn children_scan_matches_ppid() {
        let root = fixture_root("children");
        fs::create_dir_all(root.join("5")).unwrap();
        fs::write(
            root.join("5/stat"),
            "5 (init) S 0 5 5 0 -1 0 0 0 0 0 0 0 0 0 20 0 1 0 1 0 0\n",
        )
        .unwrap();
        let backend = LinuxBackend::with_root(&root);
        assert_eq!(backend.children(5, &Context::background()).unwrap(), vec![77]);
        assert!(backend.children(77, &Context::background()).unwrap().is_empty());
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn create_time_uses_boot_time() {
        let root = fixture_root("ctime");
        let backend = LinuxBackend::with_root(&root);
        let ticks = clock_ticks().unwrap();
        let expected = 1_000_000 + (500.0 * 1000.0 / ticks) as i64;
        assert_eq!(backend.create_time(77, &Context::background()).unwrap(), expected);
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn non_utf8_comm_is_replaced() {
        let root = fixture_root("bytes");
        fs::create_dir_all(root.join("81")).unwrap();
        fs::write(
            root.join("81/stat"),
            b"81 (sl\xff\xfeep) S 77 81 81 0 -1 0 0 0 0 0 1 1 0 0 20 0 1 0 600 0 0\n",
        )
        .unwrap();
        fs::write(root.join("81/status"), b"Name:\tsl\xff\xfeep\nUid:\t0\t0\t0\t0\n").unwrap();
        let backend = LinuxBackend::with_root(&root);
        let ctx = Context::background();

        assert_eq!(backend.read_record(81, &ctx).unwrap(), ProcessFields { ppid: 77 });
        assert_eq!(backend.name(81, &ctx).unwrap(), "sl\u{fffd}\u{fffd}ep");
        assert_eq!(backend.status(81, &ctx).unwrap(), Status::Sleeping);
        assert_eq!(backend.children(77, &ctx).unwrap(), vec![81]);
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn oversized_boot_time_is_rejected() {
        let root = fixture_root("btime");
        fs::write(root.join("stat"), format!("btime {}\n", u64::MAX)).unwrap();
        let backend = LinuxBackend::with_root(&root);
        let err = backend.create_time(77, &Context::background()).unwrap_err();
        assert!(matches!(err, ProcessError::Parse { .. }));
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn cancelled_context_stops_before_reading() {
        let backend = LinuxBackend::new();
        let ctx = Context::background();
        ctx.cancel();
        assert!(matches!(
            backend.read_record(1, &ctx),
            Err(ProcessError::Cancelled)
        ));
        assert!(matches!(backend.name(1, &ctx), Err(ProcessError::Cancelled)));
    }
}
