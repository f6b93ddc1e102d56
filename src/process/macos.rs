// macOS backend over libproc.
//
// The process record is proc_bsdinfo, fetched with
// proc_pidinfo(PROC_PIDTBSDINFO) into a byte buffer and decoded by
// record::bsdinfo. The executable path comes from proc_pidpath.

use std::io;

use crate::context::Context;
use crate::error::ProcessError;
use crate::model::{Signal, Status};
use crate::record::bsdinfo::{self, BsdInfo, PROC_BSDINFO_SIZE};

use super::backend::{Backend, ProcessFields};
use super::unix;

const PROC_PIDTBSDINFO: libc::c_int = 3;
const PROC_PIDPATHINFO_MAXSIZE: usize = 4 * libc::PATH_MAX as usize;

unsafe extern "C" {
    fn proc_pidinfo(
        pid: libc::c_int,
        flavor: libc::c_int,
        arg: u64,
        buffer: *mut libc::c_void,
        buffersize: libc::c_int,
    ) -> libc::c_int;

    fn proc_pidpath(pid: libc::c_int, buffer: *mut libc::c_void, buffersize: u32) -> libc::c_int;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MacosBackend;

impl MacosBackend {
    pub fn new() -> Self {
        Self
    }

    fn bsdinfo(&self, pid: i32, ctx: &Context) -> Result<BsdInfo, ProcessError> {
        ctx.check()?;
        let mut buf = [0u8; PROC_BSDINFO_SIZE];
        let ret = unsafe {
            proc_pidinfo(
                pid,
                PROC_PIDTBSDINFO,
                0,
                buf.as_mut_ptr() as *mut libc::c_void,
                PROC_BSDINFO_SIZE as libc::c_int,
            )
        };
        if ret <= 0 {
            let source = io::Error::last_os_error();
            log::debug!("proc_pidinfo(PROC_PIDTBSDINFO) failed for pid {pid}: {source}");
            // libproc reports a vanished pid as ESRCH; present it like a missing file
            let source = if source.raw_os_error() == Some(libc::ESRCH) {
                io::Error::new(io::ErrorKind::NotFound, source)
            } else {
                source
            };
            return Err(ProcessError::RecordUnavailable { pid, source });
        }
        if ret as usize != PROC_BSDINFO_SIZE {
            return Err(ProcessError::MalformedRecord {
                pid,
                detail: format!("short proc_bsdinfo: {ret} bytes"),
            });
        }

        let info = bsdinfo::decode(&buf).map_err(|e| ProcessError::MalformedRecord {
            pid,
            detail: e.to_string(),
        })?;
        if info.pid != pid {
            return Err(ProcessError::MalformedRecord {
                pid,
                detail: format!("record describes pid {}", info.pid),
            });
        }
        Ok(info)
    }
}

fn status_from_bsd(code: u32) -> Option<Status> {
    let status = match code {
        bsdinfo::SIDL => Status::Idle,
        bsdinfo::SRUN => Status::Running,
        bsdinfo::SSLEEP => Status::Sleeping,
        bsdinfo::SSTOP => Status::Stopped,
        bsdinfo::SZOMB => Status::Zombie,
        _ => return None,
    };
    Some(status)
}

impl Backend for MacosBackend {
    fn read_record(&self, pid: i32, ctx: &Context) -> Result<ProcessFields, ProcessError> {
        let info = self.bsdinfo(pid, ctx)?;
        Ok(ProcessFields { ppid: info.ppid })
    }

    fn name(&self, pid: i32, ctx: &Context) -> Result<String, ProcessError> {
        let info = self.bsdinfo(pid, ctx)?;
        // pbi_name is the longer of the two but left empty for some processes
        Ok(if info.name.is_empty() { info.comm } else { info.name })
    }

    fn exe(&self, pid: i32, ctx: &Context) -> Result<String, ProcessError> {
        ctx.check()?;
        let mut buf = vec![0u8; PROC_PIDPATHINFO_MAXSIZE];
        let ret = unsafe {
            proc_pidpath(pid, buf.as_mut_ptr() as *mut libc::c_void, buf.len() as u32)
        };
        if ret <= 0 {
            return Err(unix::errno_error(pid, io::Error::last_os_error()));
        }
        buf.truncate(ret as usize);
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    fn create_time(&self, pid: i32, ctx: &Context) -> Result<i64, ProcessError> {
        let info = self.bsdinfo(pid, ctx)?;
        info.start_millis().ok_or_else(|| ProcessError::MalformedRecord {
            pid,
            detail: format!("pbi_start_tvsec {} out of range", info.start_sec),
        })
    }

    fn status(&self, pid: i32, ctx: &Context) -> Result<Status, ProcessError> {
        let info = self.bsdinfo(pid, ctx)?;
        status_from_bsd(info.status).ok_or_else(|| ProcessError::MalformedRecord {
            pid,
            detail: format!("unknown pbi_status {}", info.status),
        })
    }

    /// real, effective, saved
    fn uids(&self, pid: i32, ctx: &Context) -> Result<Vec<u32>, ProcessError> {
        let info = self.bsdinfo(pid, ctx)?;
        Ok(vec![info.ruid, info.uid, info.svuid])
    }

    fn gids(&self, pid: i32, ctx: &Context) -> Result<Vec<u32>, ProcessError> {
        let info = self.bsdinfo(pid, ctx)?;
        Ok(vec![info.rgid, info.gid, info.svgid])
    }

    fn nice(&self, pid: i32, ctx: &Context) -> Result<i32, ProcessError> {
        Ok(self.bsdinfo(pid, ctx)?.nice)
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
        let info = self.bsdinfo(pid, ctx)?;
        unix::username(info.ruid)
    }
}
