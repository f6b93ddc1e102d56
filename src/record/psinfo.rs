// Solaris / illumos psinfo_t, as exposed at /proc/<pid>/psinfo.
//
// From <sys/procfs.h>:
//
//   int      pr_flag;     pid_t  pr_pid;    pid_t  pr_pgid;   uid_t pr_uid;
//   int      pr_nlwp;     pid_t  pr_ppid;   pid_t  pr_sid;    uid_t pr_euid;
//   gid_t    pr_gid;      gid_t  pr_egid;
//   uintptr_t pr_addr;    size_t pr_size;   size_t pr_rssize; size_t pr_pad1;
//   dev_t    pr_ttydev;   ushort_t pr_pctcpu, pr_pctmem;
//   timestruc_t pr_start, pr_time, pr_ctime;
//   char     pr_fname[PRFNSZ];  char pr_psargs[PRARGSZ];
//   int      pr_wstat, pr_argc;  uintptr_t pr_argv, pr_envp;
//   char     pr_dmodel, pr_pad2[3];
//   taskid_t pr_taskid;  projid_t pr_projid;  int pr_nzomb;
//   poolid_t pr_poolid;  zoneid_t pr_zoneid;  id_t pr_contract;
//   int      pr_filler[1];
//   lwpsinfo_t pr_lwp;
//
// The first ten 4-byte fields sit at the same offsets in both data models;
// everything from pr_addr on depends on the reader's word size.

use super::{ByteOrder, DecodeError, Record};

pub const PRFNSZ: usize = 16;
pub const PRARGSZ: usize = 80;

pub const PR_NLWP: usize = 4;
pub const PR_PID: usize = 8;
pub const PR_PPID: usize = 12;
pub const PR_PGID: usize = 16;
pub const PR_SID: usize = 20;
pub const PR_UID: usize = 24;
pub const PR_EUID: usize = 28;
pub const PR_GID: usize = 32;
pub const PR_EGID: usize = 36;

/// Word-size dependent offsets into psinfo_t.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PsinfoLayout {
    /// Width of size_t, uintptr_t, long and time_t.
    pub word: usize,
    pub size: usize,
    pub rssize: usize,
    pub start: usize,
    pub time: usize,
    pub fname: usize,
    pub psargs: usize,
    pub taskid: usize,
    pub projid: usize,
    pub zoneid: usize,
    /// Offset of pr_lwp; everything this crate decodes lies before it.
    pub header_len: usize,
}

impl PsinfoLayout {
    pub const LP64: PsinfoLayout = PsinfoLayout {
        word: 8,
        size: 48,
        rssize: 56,
        start: 88,
        time: 104,
        fname: 136,
        psargs: 152,
        taskid: 260,
        projid: 264,
        zoneid: 276,
        header_len: 288,
    };

    pub const ILP32: PsinfoLayout = PsinfoLayout {
        word: 4,
        size: 44,
        rssize: 48,
        start: 64,
        time: 72,
        fname: 88,
        psargs: 104,
        taskid: 204,
        projid: 208,
        zoneid: 220,
        header_len: 232,
    };

    /// The layout the kernel hands to a reader built for this target.
    pub fn native() -> &'static PsinfoLayout {
        if cfg!(target_pointer_width = "64") {
            &Self::LP64
        } else {
            &Self::ILP32
        }
    }
}

/// seconds + nanoseconds, as in timestruc_t.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timestruc {
    pub sec: i64,
    pub nsec: i64,
}

impl Timestruc {
    /// Milliseconds, or `None` if the value does not fit in an `i64`.
    pub fn as_millis(&self) -> Option<i64> {
        self.sec.checked_mul(1000)?.checked_add(self.nsec / 1_000_000)
    }
}

/// The decoded subset of psinfo_t.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Psinfo {
    pub nlwp: i32,
    pub pid: i32,
    pub ppid: i32,
    pub pgid: i32,
    pub sid: i32,
    pub uid: u32,
    pub euid: u32,
    pub gid: u32,
    pub egid: u32,
    /// Image size in KiB.
    pub size_kb: u64,
    /// Resident set size in KiB.
    pub rssize_kb: u64,
    pub start: Timestruc,
    pub time: Timestruc,
    pub fname: String,
    pub psargs: String,
    pub taskid: i32,
    pub projid: i32,
    pub zoneid: i32,
}

fn timestruc(rec: &Record<'_>, offset: usize, word: usize) -> Result<Timestruc, DecodeError> {
    Ok(Timestruc {
        sec: rec.sword(offset, word)?,
        nsec: rec.sword(offset + word, word)?,
    })
}

/// Decode a psinfo record. The buffer must hold at least `layout.header_len`
/// bytes; trailing pr_lwp bytes are ignored.
pub fn decode(bytes: &[u8], layout: &PsinfoLayout) -> Result<Psinfo, DecodeError> {
    let rec = Record::new(bytes, ByteOrder::NATIVE);
    rec.require(layout.header_len)?;

    Ok(Psinfo {
        nlwp: rec.i32(PR_NLWP)?,
        pid: rec.i32(PR_PID)?,
        ppid: rec.i32(PR_PPID)?,
        pgid: rec.i32(PR_PGID)?,
        sid: rec.i32(PR_SID)?,
        uid: rec.u32(PR_UID)?,
        euid: rec.u32(PR_EUID)?,
        gid: rec.u32(PR_GID)?,
        egid: rec.u32(PR_EGID)?,
        size_kb: rec.word(layout.size, layout.word)?,
        rssize_kb: rec.word(layout.rssize, layout.word)?,
        start: timestruc(&rec, layout.start, layout.word)?,
        time: timestruc(&rec, layout.time, layout.word)?,
        fname: rec.cstr(layout.fname, PRFNSZ)?,
        psargs: rec.cstr(layout.psargs, PRARGSZ)?,
        taskid: rec.i32(layout.taskid)?,
        projid: rec.i32(layout.projid)?,
        zoneid: rec.i32(layout.zoneid)?,
    })
}

/// Only the parent pid, for callers that need nothing else.
pub fn decode_ppid(bytes: &[u8]) -> Result<i32, DecodeError> {
    Record::new(bytes, ByteOrder::NATIVE).i32(PR_PPID)
}

/// Serialize a psinfo record in host order. Used to build fixture trees for
/// exercising the psinfo backend away from a Solaris kernel.
pub fn encode(info: &Psinfo, layout: &PsinfoLayout) -> Vec<u8> {
    fn put(buf: &mut [u8], offset: usize, bytes: &[u8]) {
        buf[offset..offset + bytes.len()].copy_from_slice(bytes);
    }
    fn word(value: u64, width: usize) -> Vec<u8> {
        if width == 4 {
            (value as u32).to_ne_bytes().to_vec()
        } else {
            value.to_ne_bytes().to_vec()
        }
    }
    fn text(buf: &mut [u8], offset: usize, len: usize, s: &str) {
        let n = s.len().min(len - 1);
        put(buf, offset, &s.as_bytes()[..n]);
    }

    let w = layout.word;
    let mut buf = vec![0u8; layout.header_len];
    put(&mut buf, PR_NLWP, &info.nlwp.to_ne_bytes());
    put(&mut buf, PR_PID, &info.pid.to_ne_bytes());
    put(&mut buf, PR_PPID, &info.ppid.to_ne_bytes());
    put(&mut buf, PR_PGID, &info.pgid.to_ne_bytes());
    put(&mut buf, PR_SID, &info.sid.to_ne_bytes());
    put(&mut buf, PR_UID, &info.uid.to_ne_bytes());
    put(&mut buf, PR_EUID, &info.euid.to_ne_bytes());
    put(&mut buf, PR_GID, &info.gid.to_ne_bytes());
    put(&mut buf, PR_EGID, &info.egid.to_ne_bytes());
    put(&mut buf, layout.size, &word(info.size_kb, w));
    put(&mut buf, layout.rssize, &word(info.rssize_kb, w));
    put(&mut buf, layout.start, &word(info.start.sec as u64, w));
    put(&mut buf, layout.start + w, &word(info.start.nsec as u64, w));
    put(&mut buf, layout.time, &word(info.time.sec as u64, w));
    put(&mut buf, layout.time + w, &word(info.time.nsec as u64, w));
    text(&mut buf, layout.fname, PRFNSZ, &info.fname);
    text(&mut buf, layout.psargs, PRARGSZ, &info.psargs);
    put(&mut buf, layout.taskid, &info.taskid.to_ne_bytes());
    put(&mut buf, layout.projid, &info.projid.to_ne_bytes());
    put(&mut buf, layout.zoneid, &info.zoneid.to_ne_bytes());
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::put;

    fn sample() -> Psinfo {
        Psinfo {
            nlwp: 3,
            pid: 4242,
            ppid: 1,
            pgid: 4242,
            sid: 4000,
            uid: 100,
            euid: 0,
            gid: 10,
            egid: 12,
            size_kb: 8192,
            rssize_kb: 2048,
            start: Timestruc {
                sec: 1_700_000_000,
                nsec: 250_000_000,
            },
            time: Timestruc { sec: 5, nsec: 0 },
            fname: "sshd".to_string(),
            psargs: "/usr/lib/ssh/sshd -D".to_string(),
            taskid: 77,
            projid: 3,
            zoneid: 0,
        }
    }

    #[test]
    fn lp64_fields_land_at_documented_offsets() {
        let bytes = encode(&sample(), &PsinfoLayout::LP64);
        assert_eq!(bytes.len(), 288);
        assert_eq!(&bytes[12..16], &1i32.to_ne_bytes());
        assert_eq!(&bytes[136..140], b"sshd");
        assert_eq!(&bytes[152..157], b"/usr/");
    }

    #[test]
    fn decodes_lp64_record() {
        let info = sample();
        let bytes = encode(&info, &PsinfoLayout::LP64);
        assert_eq!(decode(&bytes, &PsinfoLayout::LP64), Ok(info));
    }

    #[test]
    fn decodes_ilp32_record() {
        let info = sample();
        let bytes = encode(&info, &PsinfoLayout::ILP32);
        assert_eq!(bytes.len(), 232);
        assert_eq!(decode(&bytes, &PsinfoLayout::ILP32), Ok(info));
    }

    #[test]
    fn trailing_lwp_bytes_are_ignored() {
        let mut bytes = encode(&sample(), &PsinfoLayout::LP64);
        bytes.extend_from_slice(&[0xAA; 128]);
        let info = decode(&bytes, &PsinfoLayout::LP64).unwrap();
        assert_eq!(info.ppid, 1);
    }

    #[test]
    fn truncated_record_is_rejected() {
        let bytes = encode(&sample(), &PsinfoLayout::LP64);
        let err = decode(&bytes[..200], &PsinfoLayout::LP64).unwrap_err();
        assert_eq!(err.len, 200);
        assert_eq!(err.width, 288);
    }

    #[test]
    fn ppid_comes_from_offset_twelve_not_eight() {
        let mut bytes = vec![0u8; 16];
        put(&mut bytes, PR_PID, &555i32.to_ne_bytes());
        put(&mut bytes, PR_PPID, &1i32.to_ne_bytes());
        assert_eq!(decode_ppid(&bytes), Ok(1));
    }

    #[test]
    fn start_time_in_millis() {
        assert_eq!(sample().start.as_millis(), Some(1_700_000_000_250));
        let far = Timestruc { sec: i64::MAX / 10, nsec: 0 };
        assert_eq!(far.as_millis(), None);
    }

    #[test]
    fn overlong_name_is_nul_terminated() {
        let mut info = sample();
        info.fname = "a-very-long-executable-name".to_string();
        let bytes = encode(&info, &PsinfoLayout::LP64);
        let decoded = decode(&bytes, &PsinfoLayout::LP64).unwrap();
        assert_eq!(decoded.fname.len(), PRFNSZ - 1);
    }

    #[test]
    fn native_layout_matches_pointer_width() {
        let layout = PsinfoLayout::native();
        assert_eq!(layout.word, std::mem::size_of::<usize>());
    }
}
