//! Capability gate tests.
//!
//! A backend that only knows how to read the process record must report
//! `Unsupported` for everything else, never an empty or zero value.
//!
//! Run with: `cargo test --test capability_gate`

use std::collections::HashSet;
use std::io;
use std::sync::{Arc, Mutex};

use procprobe::error::Operation;
use procprobe::model::Signal;
use procprobe::process::{Backend, ProcessFields, UnsupportedBackend};
use procprobe::{Context, Process, ProcessError};

/// Knows the record of the pids in its set and nothing else.
#[derive(Debug, Default)]
struct RecordOnly {
    alive: Mutex<HashSet<i32>>,
}

impl RecordOnly {
    fn with(pids: &[i32]) -> Arc<Self> {
        Arc::new(Self {
            alive: Mutex::new(pids.iter().copied().collect()),
        })
    }

    fn exit(&self, pid: i32) {
        self.alive.lock().unwrap().remove(&pid);
    }
}

impl Backend for RecordOnly {
    fn read_record(&self, pid: i32, ctx: &Context) -> Result<ProcessFields, ProcessError> {
        ctx.check()?;
        if self.alive.lock().unwrap().contains(&pid) {
            Ok(ProcessFields { ppid: 1 })
        } else {
            Err(ProcessError::RecordUnavailable {
                pid,
                source: io::Error::from(io::ErrorKind::NotFound),
            })
        }
    }
}

fn unsupported<T: std::fmt::Debug>(result: Result<T, ProcessError>, op: Operation) {
    match result {
        Err(ProcessError::Unsupported(got)) => assert_eq!(got, op),
        other => panic!("{op}: expected Unsupported, got {other:?}"),
    }
}

#[test]
fn every_other_operation_is_unsupported() {
    let p = Process::with_backend(10, RecordOnly::with(&[10]), &Context::background()).unwrap();

    unsupported(p.name(), Operation::Name);
    unsupported(p.tgid(), Operation::Tgid);
    unsupported(p.exe(), Operation::Exe);
    unsupported(p.cmdline(), Operation::Cmdline);
    unsupported(p.cmdline_slice(), Operation::CmdlineSlice);
    unsupported(p.create_time(), Operation::CreateTime);
    unsupported(p.cwd(), Operation::Cwd);
    unsupported(p.status(), Operation::Status);
    unsupported(p.uids(), Operation::Uids);
    unsupported(p.gids(), Operation::Gids);
    unsupported(p.terminal(), Operation::Terminal);
    unsupported(p.nice(), Operation::Nice);
    unsupported(p.ionice(), Operation::IoNice);
    unsupported(p.rlimit(), Operation::Rlimit);
    unsupported(p.rlimit_usage(true), Operation::RlimitUsage);
    unsupported(p.io_counters(), Operation::IoCounters);
    unsupported(p.num_ctx_switches(), Operation::NumCtxSwitches);
    unsupported(p.num_fds(), Operation::NumFds);
    unsupported(p.num_threads(), Operation::NumThreads);
    unsupported(p.threads(), Operation::Threads);
    unsupported(p.times(), Operation::Times);
    unsupported(p.cpu_affinity(), Operation::CpuAffinity);
    unsupported(p.memory_info(), Operation::MemoryInfo);
    unsupported(p.memory_info_ex(), Operation::MemoryInfoEx);
    unsupported(p.memory_maps(false), Operation::MemoryMaps);
    unsupported(p.children(), Operation::Children);
    unsupported(p.open_files(), Operation::OpenFiles);
    unsupported(p.connections(), Operation::Connections);
    unsupported(p.net_io_counters(true), Operation::NetIoCounters);
    unsupported(p.send_signal(Signal::Hangup), Operation::SendSignal);
    unsupported(p.suspend(), Operation::Suspend);
    unsupported(p.resume(), Operation::Resume);
    unsupported(p.terminate(), Operation::Terminate);
    unsupported(p.kill(), Operation::Kill);
    unsupported(p.username(), Operation::Username);
}

#[test]
fn unsupported_is_stable_across_calls() {
    let p = Process::with_backend(10, RecordOnly::with(&[10]), &Context::background()).unwrap();
    for _ in 0..3 {
        unsupported(p.cwd(), Operation::Cwd);
    }
}

#[test]
fn unsupported_message_names_operation() {
    let err = ProcessError::Unsupported(Operation::MemoryMaps);
    assert_eq!(err.to_string(), "memory_maps is not supported on this platform");
}

/// is_running follows record presence.
#[test]
fn is_running_tracks_record() {
    let backend = RecordOnly::with(&[10]);
    let p = Process::with_backend(10, backend.clone(), &Context::background()).unwrap();
    assert!(p.is_running().unwrap());

    backend.exit(10);
    assert!(!p.is_running().unwrap());
}

#[test]
fn parent_is_opened_through_backend() {
    let backend = RecordOnly::with(&[10]);
    let p = Process::with_backend(10, backend, &Context::background()).unwrap();
    // pid 1 has no record in this backend
    assert!(matches!(
        p.parent(),
        Err(ProcessError::RecordUnavailable { pid: 1, .. })
    ));
}

/// Without any record source even construction is gated.
#[test]
fn unsupported_backend_refuses_construction() {
    let err = Process::with_backend(1, Arc::new(UnsupportedBackend), &Context::background())
        .unwrap_err();
    assert!(matches!(err, ProcessError::Unsupported(Operation::ReadRecord)));
    assert!(err.is_unsupported());
}

#[test]
fn handles_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Process>();
    assert_send_sync::<Context>();
}
