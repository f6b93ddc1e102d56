use std::net::SocketAddr;

use serde::Serialize;

/// Scheduler state of a process.
#[derive(Clone, Copy, Serialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Running,
    Sleeping,
    DiskSleep,
    Stopped,
    TracingStop,
    Zombie,
    Dead,
    Idle,
    WakeKill,
    Waking,
    Parked,
}

impl Status {
    /// Map the state letter of /proc/<pid>/stat.
    pub fn from_linux_code(code: char) -> Option<Status> {
        let status = match code {
            'R' => Status::Running,
            'S' => Status::Sleeping,
            'D' => Status::DiskSleep,
            'T' => Status::Stopped,
            't' => Status::TracingStop,
            'Z' => Status::Zombie,
            'X' | 'x' => Status::Dead,
            'I' => Status::Idle,
            'K' => Status::WakeKill,
            'W' => Status::Waking,
            'P' => Status::Parked,
            _ => return None,
        };
        Some(status)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Running => "running",
            Self::Sleeping => "sleeping",
            Self::DiskSleep => "disk-sleep",
            Self::Stopped => "stopped",
            Self::TracingStop => "tracing-stop",
            Self::Zombie => "zombie",
            Self::Dead => "dead",
            Self::Idle => "idle",
            Self::WakeKill => "wake-kill",
            Self::Waking => "waking",
            Self::Parked => "parked",
        };
        f.write_str(s)
    }
}

/// CPU time consumed, in seconds.
#[derive(Clone, Copy, Serialize, Debug, PartialEq, Default)]
pub struct CpuTimes {
    pub user: f64,
    pub system: f64,
    pub children_user: f64,
    pub children_system: f64,
    /// Block I/O delay; only when the kernel keeps delay accounting.
    pub iowait: Option<f64>,
}

impl CpuTimes {
    pub fn total(&self) -> f64 {
        self.user + self.system
    }
}

/// Memory usage in bytes, from /proc/<pid>/status.
#[derive(Clone, Copy, Serialize, Debug, PartialEq, Eq, Default)]
pub struct MemoryInfo {
    pub rss: u64,
    pub vms: u64,
    pub hwm: u64,
    pub data: u64,
    pub stack: u64,
    pub locked: u64,
    /// `None` when the kernel does not report VmSwap.
    pub swap: Option<u64>,
}

/// Memory usage in bytes, from /proc/<pid>/statm.
#[derive(Clone, Copy, Serialize, Debug, PartialEq, Eq, Default)]
pub struct MemoryInfoEx {
    pub rss: u64,
    pub vms: u64,
    pub shared: u64,
    pub text: u64,
    pub lib: u64,
    pub data: u64,
    pub dirty: u64,
}

/// Address range of one mapping; absent once mappings are grouped by path.
#[derive(Clone, Serialize, Debug, PartialEq, Eq)]
pub struct MapRegion {
    pub start: u64,
    pub end: u64,
    pub perms: String,
}

/// One entry of /proc/<pid>/smaps. Sizes in bytes.
#[derive(Clone, Serialize, Debug, PartialEq, Eq, Default)]
pub struct MemoryMap {
    /// Backing path, or a pseudo name such as `[heap]`. Anonymous mappings
    /// are reported as `[anon]`.
    pub path: String,
    pub region: Option<MapRegion>,
    pub size: u64,
    pub rss: u64,
    pub pss: u64,
    pub shared_clean: u64,
    pub shared_dirty: u64,
    pub private_clean: u64,
    pub private_dirty: u64,
    pub referenced: u64,
    pub anonymous: u64,
    pub swap: u64,
}

impl MemoryMap {
    pub(crate) fn absorb(&mut self, other: &MemoryMap) {
        self.size += other.size;
        self.rss += other.rss;
        self.pss += other.pss;
        self.shared_clean += other.shared_clean;
        self.shared_dirty += other.shared_dirty;
        self.private_clean += other.private_clean;
        self.private_dirty += other.private_dirty;
        self.referenced += other.referenced;
        self.anonymous += other.anonymous;
        self.swap += other.swap;
    }
}

#[derive(Clone, Copy, Serialize, Debug, PartialEq, Eq, Default)]
pub struct IoCounters {
    /// read(2)-family syscalls.
    pub read_count: u64,
    pub write_count: u64,
    /// Bytes fetched from the storage layer.
    pub read_bytes: u64,
    pub write_bytes: u64,
    /// Bytes passed through read(2)/write(2), cache hits included.
    pub read_chars: u64,
    pub write_chars: u64,
}

#[derive(Clone, Copy, Serialize, Debug, PartialEq, Eq, Default)]
pub struct NumCtxSwitches {
    pub voluntary: u64,
    pub involuntary: u64,
}

#[derive(Clone, Copy, Serialize, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Cpu,
    Fsize,
    Data,
    Stack,
    Core,
    Rss,
    Nproc,
    Nofile,
    Memlock,
    As,
    Locks,
    Sigpending,
    Msgqueue,
    Nice,
    Rtprio,
    Rttime,
}

impl Resource {
    /// Match a row label of /proc/<pid>/limits.
    pub fn from_limits_label(label: &str) -> Option<Resource> {
        let resource = match label {
            "Max cpu time" => Resource::Cpu,
            "Max file size" => Resource::Fsize,
            "Max data size" => Resource::Data,
            "Max stack size" => Resource::Stack,
            "Max core file size" => Resource::Core,
            "Max resident set" => Resource::Rss,
            "Max processes" => Resource::Nproc,
            "Max open files" => Resource::Nofile,
            "Max locked memory" => Resource::Memlock,
            "Max address space" => Resource::As,
            "Max file locks" => Resource::Locks,
            "Max pending signals" => Resource::Sigpending,
            "Max msgqueue size" => Resource::Msgqueue,
            "Max nice priority" => Resource::Nice,
            "Max realtime priority" => Resource::Rtprio,
            "Max realtime timeout" => Resource::Rttime,
            _ => return None,
        };
        Some(resource)
    }
}

#[derive(Clone, Copy, Serialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Limit {
    Unlimited,
    #[serde(untagged)]
    Value(u64),
}

#[derive(Clone, Copy, Serialize, Debug, PartialEq, Eq)]
pub struct RlimitStat {
    pub resource: Resource,
    pub soft: Limit,
    pub hard: Limit,
    /// Current consumption, when it was asked for and can be measured.
    pub used: Option<u64>,
}

#[derive(Clone, Serialize, Debug, PartialEq, Eq)]
pub struct OpenFile {
    pub fd: i32,
    pub path: String,
}

#[derive(Clone, Copy, Serialize, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

#[derive(Clone, Copy, Serialize, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    Inet,
    Inet6,
}

#[derive(Clone, Copy, Serialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SocketState {
    // TCP states
    Closed,
    Listen,
    SynSent,
    SynReceived,
    Established,
    CloseWait,
    LastAck,
    FinWait1,
    FinWait2,
    Closing,
    TimeWait,
    // UDP states
    Bound,
    Connected,
}

impl std::fmt::Display for SocketState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "CLOSED"),
            Self::Listen => write!(f, "LISTEN"),
            Self::SynSent => write!(f, "SYN_SENT"),
            Self::SynReceived => write!(f, "SYN_RECEIVED"),
            Self::Established => write!(f, "ESTABLISHED"),
            Self::CloseWait => write!(f, "CLOSE_WAIT"),
            Self::LastAck => write!(f, "LAST_ACK"),
            Self::FinWait1 => write!(f, "FIN_WAIT_1"),
            Self::FinWait2 => write!(f, "FIN_WAIT_2"),
            Self::Closing => write!(f, "CLOSING"),
            Self::TimeWait => write!(f, "TIME_WAIT"),
            Self::Bound => write!(f, "BOUND"),
            Self::Connected => write!(f, "CONNECTED"),
        }
    }
}

/// An inet socket held open by the process.
#[derive(Clone, Serialize, Debug, PartialEq, Eq)]
pub struct Connection {
    pub fd: i32,
    pub family: AddressFamily,
    pub protocol: Protocol,
    pub local: SocketAddr,
    pub remote: SocketAddr,
    pub state: SocketState,
    pub pid: i32,
}

/// Interface counters as seen from the process's network namespace.
#[derive(Clone, Serialize, Debug, PartialEq, Eq, Default)]
pub struct NetIoCounters {
    pub name: String,
    pub bytes_sent: u64,
    pub bytes_recv: u64,
    pub packets_sent: u64,
    pub packets_recv: u64,
    pub errin: u64,
    pub errout: u64,
    pub dropin: u64,
    pub dropout: u64,
}

impl NetIoCounters {
    pub(crate) fn absorb(&mut self, other: &NetIoCounters) {
        self.bytes_sent += other.bytes_sent;
        self.bytes_recv += other.bytes_recv;
        self.packets_sent += other.packets_sent;
        self.packets_recv += other.packets_recv;
        self.errin += other.errin;
        self.errout += other.errout;
        self.dropin += other.dropin;
        self.dropout += other.dropout;
    }
}

#[derive(Clone, Copy, Serialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Hangup,
    Interrupt,
    Quit,
    Kill,
    User1,
    User2,
    Terminate,
    Stop,
    Continue,
    /// Any other signal by raw number.
    Other(i32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linux_state_codes() {
        assert_eq!(Status::from_linux_code('R'), Some(Status::Running));
        assert_eq!(Status::from_linux_code('t'), Some(Status::TracingStop));
        assert_eq!(Status::from_linux_code('x'), Some(Status::Dead));
        assert_eq!(Status::from_linux_code('?'), None);
    }

    #[test]
    fn limits_labels() {
        assert_eq!(
            Resource::from_limits_label("Max open files"),
            Some(Resource::Nofile)
        );
        assert_eq!(Resource::from_limits_label("Max widgets"), None);
    }

    #[test]
    fn limit_serializes_as_number_or_keyword() {
        assert_eq!(
            serde_json::to_string(&Limit::Unlimited).unwrap(),
            "\"unlimited\""
        );
        assert_eq!(serde_json::to_string(&Limit::Value(1024)).unwrap(), "1024");
    }

    #[test]
    fn signal_and_absent_swap_serialize() {
        assert_eq!(serde_json::to_string(&Signal::Terminate).unwrap(), "\"terminate\"");
        assert_eq!(serde_json::to_string(&Signal::Other(34)).unwrap(), "{\"other\":34}");
        let mem = MemoryInfo::default();
        assert!(serde_json::to_string(&mem).unwrap().contains("\"swap\":null"));
    }

    #[test]
    fn socket_state_display() {
        assert_eq!(SocketState::FinWait1.to_string(), "FIN_WAIT_1");
        assert_eq!(SocketState::Bound.to_string(), "BOUND");
    }
}
