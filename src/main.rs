use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use procprobe::cli::{BackendKind, Cli, Command, InspectArgs};
use procprobe::context::Context;
use procprobe::output::{self, Report};
use procprobe::process::{self, Backend, Process, PsinfoBackend};

/// Exit codes: 0 every pid opened, 1 at least one pid could not be opened,
/// 2 usage error (reported by clap), 3 output could not be written.
const EXIT_OPEN_FAILED: i32 = 1;
const EXIT_OUTPUT_FAILED: i32 = 3;

fn select_backend(args: &InspectArgs) -> Arc<dyn Backend> {
    match args.backend {
        BackendKind::Psinfo => {
            let root = args.procfs.clone().unwrap_or_else(|| PathBuf::from("/proc"));
            Arc::new(PsinfoBackend::with_root(root))
        }
        BackendKind::Native => native_backend(args.procfs.clone()),
    }
}

#[cfg(target_os = "linux")]
fn native_backend(procfs: Option<PathBuf>) -> Arc<dyn Backend> {
    match procfs {
        Some(root) => Arc::new(process::LinuxBackend::with_root(root)),
        None => process::default_backend(),
    }
}

#[cfg(not(target_os = "linux"))]
fn native_backend(procfs: Option<PathBuf>) -> Arc<dyn Backend> {
    if let Some(root) = procfs {
        log::warn!(
            "--procfs {} ignored: the native backend does not read a process filesystem",
            root.display()
        );
    }
    process::default_backend()
}

fn context(args: &InspectArgs) -> Context {
    match args.timeout() {
        Some(t) => Context::with_timeout(t),
        None => Context::background(),
    }
}

fn inspect(args: InspectArgs) -> i32 {
    let backend = select_backend(&args);
    log::debug!("using backend {backend:?}");

    let mut code = 0;
    let mut reports = Vec::with_capacity(args.pids.len());
    for &pid in &args.pids {
        let ctx = context(&args);
        match Process::with_backend(pid, Arc::clone(&backend), &ctx) {
            Ok(p) => reports.push(Report::collect(&p, &ctx)),
            Err(e) => {
                log::warn!("cannot open pid {pid}: {e}");
                reports.push(Report::failed(pid, &e));
                code = EXIT_OPEN_FAILED;
            }
        }
    }

    let mut stdout = io::stdout().lock();
    if let Err(e) = output::write_reports(&reports, args.format, &mut stdout) {
        eprintln!("error: cannot write output: {e}");
        return EXIT_OUTPUT_FAILED;
    }
    code
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let code = match cli.command {
        Command::Inspect(args) => inspect(args),
    };
    std::process::exit(code);
}
