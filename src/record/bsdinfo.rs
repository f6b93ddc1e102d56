// macOS struct proc_bsdinfo, returned by proc_pidinfo(PROC_PIDTBSDINFO).
//
// Matches <sys/proc_info.h> (136 bytes, MAXCOMLEN = 16):
//
//   uint32_t pbi_flags, pbi_status, pbi_xstatus, pbi_pid, pbi_ppid;
//   uid_t    pbi_uid;   gid_t pbi_gid;  uid_t pbi_ruid; gid_t pbi_rgid;
//   uid_t    pbi_svuid; gid_t pbi_svgid; uint32_t rfu_1;
//   char     pbi_comm[MAXCOMLEN];  char pbi_name[2 * MAXCOMLEN];
//   uint32_t pbi_nfiles, pbi_pgid, pbi_pjobc, e_tdev, e_tpgid;
//   int32_t  pbi_nice;
//   uint64_t pbi_start_tvsec, pbi_start_tvusec;

use super::{ByteOrder, DecodeError, Record};

pub const PROC_BSDINFO_SIZE: usize = 136;
pub const MAXCOMLEN: usize = 16;

const PBI_STATUS: usize = 4;
const PBI_PID: usize = 12;
const PBI_PPID: usize = 16;
const PBI_UID: usize = 20;
const PBI_GID: usize = 24;
const PBI_RUID: usize = 28;
const PBI_RGID: usize = 32;
const PBI_SVUID: usize = 36;
const PBI_SVGID: usize = 40;
const PBI_COMM: usize = 48;
const PBI_NAME: usize = 64;
const PBI_PGID: usize = 100;
const PBI_NICE: usize = 116;
const PBI_START_TVSEC: usize = 120;
const PBI_START_TVUSEC: usize = 128;

// pbi_status values from <sys/proc.h>
pub const SIDL: u32 = 1;
pub const SRUN: u32 = 2;
pub const SSLEEP: u32 = 3;
pub const SSTOP: u32 = 4;
pub const SZOMB: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BsdInfo {
    pub status: u32,
    pub pid: i32,
    pub ppid: i32,
    pub uid: u32,
    pub gid: u32,
    pub ruid: u32,
    pub rgid: u32,
    pub svuid: u32,
    pub svgid: u32,
    pub comm: String,
    pub name: String,
    pub pgid: i32,
    pub nice: i32,
    pub start_sec: u64,
    pub start_usec: u64,
}

impl BsdInfo {
    /// Milliseconds since the epoch, or `None` if out of range.
    pub fn start_millis(&self) -> Option<i64> {
        let ms = self.start_sec.checked_mul(1000)?.checked_add(self.start_usec / 1000)?;
        i64::try_from(ms).ok()
    }
}

pub fn decode(bytes: &[u8]) -> Result<BsdInfo, DecodeError> {
    let rec = Record::new(bytes, ByteOrder::NATIVE);
    rec.require(PROC_BSDINFO_SIZE)?;

    Ok(BsdInfo {
        status: rec.u32(PBI_STATUS)?,
        pid: rec.i32(PBI_PID)?,
        ppid: rec.i32(PBI_PPID)?,
        uid: rec.u32(PBI_UID)?,
        gid: rec.u32(PBI_GID)?,
        ruid: rec.u32(PBI_RUID)?,
        rgid: rec.u32(PBI_RGID)?,
        svuid: rec.u32(PBI_SVUID)?,
        svgid: rec.u32(PBI_SVGID)?,
        comm: rec.cstr(PBI_COMM, MAXCOMLEN)?,
        name: rec.cstr(PBI_NAME, 2 * MAXCOMLEN)?,
        pgid: rec.i32(PBI_PGID)?,
        nice: rec.i32(PBI_NICE)?,
        start_sec: rec.u64(PBI_START_TVSEC)?,
        start_usec: rec.u64(PBI_START_TVUSEC)?,
    })
}
