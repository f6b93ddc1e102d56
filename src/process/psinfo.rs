// psinfo backend for Solaris/illumos style /proc/<pid>/psinfo records.
//
// The record is a fixed binary struct in host byte order. Everything this
// backend answers comes from that one file; the root and data model are
// configurable so a tree of records can be inspected on any host.

use std::fs;
use std::path::{Path, PathBuf};

use crate::context::Context;
use crate::error::ProcessError;
use crate::record::psinfo::{self, Psinfo, PsinfoLayout};

use super::backend::{Backend, ProcessFields};

#[derive(Debug, Clone)]
pub struct PsinfoBackend {
    root: PathBuf,
    layout: &'static PsinfoLayout,
}

impl Default for PsinfoBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl PsinfoBackend {
    pub fn new() -> Self {
        Self::with_root("/proc")
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            layout: PsinfoLayout::native(),
        }
    }

    /// Decode records written for another data model (LP64 or ILP32).
    pub fn with_layout(mut self, layout: &'static PsinfoLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, pid: i32) -> PathBuf {
        self.root.join(pid.to_string()).join("psinfo")
    }

    /// Read, decode and check one record.
    fn load(&self, pid: i32, ctx: &Context) -> Result<Psinfo, ProcessError> {
        ctx.check()?;
        let path = self.record_path(pid);
        let bytes = fs::read(&path).map_err(|source| {
            log::debug!("cannot read {}: {source}", path.display());
            ProcessError::RecordUnavailable { pid, source }
        })?;

        let info = psinfo::decode(&bytes, self.layout).map_err(|e| {
            ProcessError::MalformedRecord {
                pid,
                detail: e.to_string(),
            }
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

impl Backend for PsinfoBackend {
    fn read_record(&self, pid: i32, ctx: &Context) -> Result<ProcessFields, ProcessError> {
        let info = self.load(pid, ctx)?;
        Ok(ProcessFields { ppid: info.ppid })
    }

    fn name(&self, pid: i32, ctx: &Context) -> Result<String, ProcessError> {
        Ok(self.load(pid, ctx)?.fname)
    }

    fn create_time(&self, pid: i32, ctx: &Context) -> Result<i64, ProcessError> {
        let info = self.load(pid, ctx)?;
        info.start.as_millis().ok_or_else(|| ProcessError::MalformedRecord {
            pid,
            detail: format!("pr_start {}s out of range", info.start.sec),
        })
    }

    fn uids(&self, pid: i32, ctx: &Context) -> Result<Vec<u32>, ProcessError> {
        let info = self.load(pid, ctx)?;
        Ok(vec![info.uid, info.euid])
    }

    fn gids(&self, pid: i32, ctx: &Context) -> Result<Vec<u32>, ProcessError> {
        let info = self.load(pid, ctx)?;
        Ok(vec![info.gid, info.egid])
    }

    fn num_threads(&self, pid: i32, ctx: &Context) -> Result<i32, ProcessError> {
        Ok(self.load(pid, ctx)?.nlwp)
    }
}
