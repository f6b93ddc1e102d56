// libc helpers shared by the Unix backends.

use std::ffi::CStr;
use std::io;
use std::mem;
use std::ptr;

use crate::error::ProcessError;
use crate::model::Signal;

pub(crate) fn raw_signal(signal: Signal) -> libc::c_int {
    match signal {
        Signal::Hangup => libc::SIGHUP,
        Signal::Interrupt => libc::SIGINT,
        Signal::Quit => libc::SIGQUIT,
        Signal::Kill => libc::SIGKILL,
        Signal::User1 => libc::SIGUSR1,
        Signal::User2 => libc::SIGUSR2,
        Signal::Terminate => libc::SIGTERM,
        Signal::Stop => libc::SIGSTOP,
        Signal::Continue => libc::SIGCONT,
        Signal::Other(n) => n,
    }
}

/// Map an errno from a pid-addressed syscall.
pub(crate) fn errno_error(pid: i32, err: io::Error) -> ProcessError {
    match err.raw_os_error() {
        Some(libc::ESRCH) => ProcessError::NoSuchProcess(pid),
        Some(libc::EPERM) | Some(libc::EACCES) => ProcessError::AccessDenied(pid),
        _ => ProcessError::Os(err),
    }
}

/// Deliver `signal` to exactly one process.
///
/// kill(2) treats 0 and negative pids as process-group addresses; those are
/// refused here rather than fanned out.
pub(crate) fn send_signal(pid: i32, signal: Signal) -> Result<(), ProcessError> {
    if pid <= 0 {
        return Err(ProcessError::NoSuchProcess(pid));
    }
    let ret = unsafe { libc::kill(pid, raw_signal(signal)) };
    if ret == 0 {
        Ok(())
    } else {
        Err(errno_error(pid, io::Error::last_os_error()))
    }
}

/// Look up the login name for `uid` with getpwuid_r.
pub(crate) fn username(uid: u32) -> Result<String, ProcessError> {
    let mut buf: Vec<libc::c_char> = vec![0; 1024];

    loop {
        let mut pwd: libc::passwd = unsafe { mem::zeroed() };
        let mut result: *mut libc::passwd = ptr::null_mut();
        let ret = unsafe {
            libc::getpwuid_r(
                uid as libc::uid_t,
                &mut pwd,
                buf.as_mut_ptr(),
                buf.len(),
                &mut result,
            )
        };

        if ret == libc::ERANGE && buf.len() < (1 << 20) {
            // Entry too large for the buffer, double it
            let len = buf.len() * 2;
            buf.resize(len, 0);
            continue;
        }
        if ret != 0 {
            return Err(ProcessError::Os(io::Error::from_raw_os_error(ret)));
        }
        if result.is_null() || pwd.pw_name.is_null() {
            return Err(ProcessError::UnknownUser(uid));
        }

        let name = unsafe { CStr::from_ptr(pwd.pw_name) };
        return Ok(name.to_string_lossy().into_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_numbers() {
        assert_eq!(raw_signal(Signal::Kill), libc::SIGKILL);
        assert_eq!(raw_signal(Signal::Continue), libc::SIGCONT);
        assert_eq!(raw_signal(Signal::Other(0)), 0);
    }

    #[test]
    fn group_addresses_are_refused() {
        assert!(matches!(
            send_signal(0, Signal::Other(0)),
            Err(ProcessError::NoSuchProcess(0))
        ));
        assert!(matches!(
            send_signal(-1, Signal::Other(0)),
            Err(ProcessError::NoSuchProcess(-1))
        ));
    }

    #[test]
    fn null_signal_probes_self() {
        let me = std::process::id() as i32;
        assert!(send_signal(me, Signal::Other(0)).is_ok());
    }

    #[test]
    fn root_has_a_name() {
        assert_eq!(username(0).unwrap(), "root");
    }

    #[test]
    fn errno_mapping() {
        assert!(matches!(
            errno_error(5, io::Error::from_raw_os_error(libc::ESRCH)),
            ProcessError::NoSuchProcess(5)
        ));
        assert!(matches!(
            errno_error(5, io::Error::from_raw_os_error(libc::EPERM)),
            ProcessError::AccessDenied(5)
        ));
    }
}
