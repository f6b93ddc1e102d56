// Parsers for Linux /proc text files.
//
// Pure functions over file contents, so they build and test on every host.
// The Linux backend feeds them with what it reads from /proc/<pid>/*.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::str::FromStr;

use crate::model::{
    AddressFamily, IoCounters, Limit, MapRegion, MemoryInfo, MemoryInfoEx, MemoryMap,
    NetIoCounters, Protocol, Resource, RlimitStat, SocketState,
};

/// Fields of /proc/<pid>/stat (see proc(5)).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stat {
    pub pid: i32,
    pub comm: String,
    pub state: char,
    pub ppid: i32,
    pub pgrp: i32,
    pub session: i32,
    pub tty_nr: i32,
    pub minflt: u64,
    pub majflt: u64,
    pub utime: u64,
    pub stime: u64,
    pub cutime: i64,
    pub cstime: i64,
    pub priority: i64,
    pub nice: i32,
    pub num_threads: i32,
    pub starttime: u64,
    pub vsize: u64,
    pub rss: i64,
    pub rt_priority: Option<u32>,
    pub delayacct_blkio_ticks: Option<u64>,
}

/// `n` is the 1-based field number from proc(5); `rest` starts at field 3.
fn stat_field<T: FromStr>(rest: &[&str], n: usize) -> Option<T> {
    rest.get(n.checked_sub(3)?)?.parse().ok()
}

/// Parse /proc/<pid>/stat.
///
/// The command name is the text between the first `(` and the *last* `)`,
/// since it may itself contain spaces and parentheses.
pub fn parse_stat(content: &str) -> Option<Stat> {
    let open = content.find('(')?;
    let close = content.rfind(')')?;
    if close < open {
        return None;
    }
    let pid = content[..open].trim().parse().ok()?;
    let comm = content[open + 1..close].to_string();
    let rest: Vec<&str> = content[close + 1..].split_whitespace().collect();

    Some(Stat {
        pid,
        comm,
        state: rest.first()?.chars().next()?,
        ppid: stat_field(&rest, 4)?,
        pgrp: stat_field(&rest, 5)?,
        session: stat_field(&rest, 6)?,
        tty_nr: stat_field(&rest, 7)?,
        minflt: stat_field(&rest, 10)?,
        majflt: stat_field(&rest, 12)?,
        utime: stat_field(&rest, 14)?,
        stime: stat_field(&rest, 15)?,
        cutime: stat_field(&rest, 16)?,
        cstime: stat_field(&rest, 17)?,
        priority: stat_field(&rest, 18)?,
        nice: stat_field(&rest, 19)?,
        num_threads: stat_field(&rest, 20)?,
        starttime: stat_field(&rest, 22)?,
        vsize: stat_field(&rest, 23)?,
        rss: stat_field(&rest, 24)?,
        rt_priority: stat_field(&rest, 40),
        delayacct_blkio_ticks: stat_field(&rest, 42),
    })
}

/// Selected lines of /proc/<pid>/status. Memory figures are in bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcStatus {
    pub name: Option<String>,
    pub tgid: Option<i32>,
    pub uids: Option<Vec<u32>>,
    pub gids: Option<Vec<u32>>,
    pub threads: Option<i32>,
    pub vm_size: Option<u64>,
    pub vm_rss: Option<u64>,
    pub vm_hwm: Option<u64>,
    pub vm_data: Option<u64>,
    pub vm_stk: Option<u64>,
    pub vm_lck: Option<u64>,
    pub vm_swap: Option<u64>,
    pub voluntary_ctxt_switches: Option<u64>,
    pub nonvoluntary_ctxt_switches: Option<u64>,
}

impl ProcStatus {
    /// Memory lines are only present for processes with an address space.
    pub fn memory_info(&self) -> Option<MemoryInfo> {
        Some(MemoryInfo {
            rss: self.vm_rss?,
            vms: self.vm_size?,
            hwm: self.vm_hwm?,
            data: self.vm_data?,
            stack: self.vm_stk?,
            locked: self.vm_lck?,
            swap: self.vm_swap,
        })
    }
}

fn kb(value: &str) -> Option<u64> {
    let n: u64 = value.split_whitespace().next()?.parse().ok()?;
    n.checked_mul(1024)
}

fn id_list(value: &str) -> Option<Vec<u32>> {
    value.split_whitespace().map(|v| v.parse().ok()).collect()
}

pub fn parse_status(content: &str) -> ProcStatus {
    let mut status = ProcStatus::default();

    for line in content.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key {
            "Name" => status.name = Some(value.to_string()),
            "Tgid" => status.tgid = value.parse().ok(),
            "Uid" => status.uids = id_list(value),
            "Gid" => status.gids = id_list(value),
            "Threads" => status.threads = value.parse().ok(),
            "VmSize" => status.vm_size = kb(value),
            "VmRSS" => status.vm_rss = kb(value),
            "VmHWM" => status.vm_hwm = kb(value),
            "VmData" => status.vm_data = kb(value),
            "VmStk" => status.vm_stk = kb(value),
            "VmLck" => status.vm_lck = kb(value),
            "VmSwap" => status.vm_swap = kb(value),
            "voluntary_ctxt_switches" => status.voluntary_ctxt_switches = value.parse().ok(),
            "nonvoluntary_ctxt_switches" => {
                status.nonvoluntary_ctxt_switches = value.parse().ok()
            }
            _ => {}
        }
    }

    status
}

/// Parse /proc/<pid>/io. All six counters must be present.
pub fn parse_io(content: &str) -> Option<IoCounters> {
    let mut fields: HashMap<&str, u64> = HashMap::new();
    for line in content.lines() {
        if let Some((key, value)) = line.split_once(':')
            && let Ok(v) = value.trim().parse()
        {
            fields.insert(key.trim(), v);
        }
    }

    Some(IoCounters {
        read_count: *fields.get("syscr")?,
        write_count: *fields.get("syscw")?,
        read_bytes: *fields.get("read_bytes")?,
        write_bytes: *fields.get("write_bytes")?,
        read_chars: *fields.get("rchar")?,
        write_chars: *fields.get("wchar")?,
    })
}

/// Parse /proc/<pid>/statm, whose values are in pages.
pub fn parse_statm(content: &str, page_size: u64) -> Option<MemoryInfoEx> {
    let pages: Vec<u64> = content
        .split_whitespace()
        .map(|v| v.parse().ok())
        .collect::<Option<_>>()?;
    if pages.len() < 7 {
        return None;
    }

    let bytes = |i: usize| pages[i].checked_mul(page_size);
    Some(MemoryInfoEx {
        vms: bytes(0)?,
        rss: bytes(1)?,
        shared: bytes(2)?,
        text: bytes(3)?,
        lib: bytes(4)?,
        data: bytes(5)?,
        dirty: bytes(6)?,
    })
}

fn parse_limit(value: &str) -> Option<Limit> {
    if value == "unlimited" {
        Some(Limit::Unlimited)
    } else {
        value.parse().ok().map(Limit::Value)
    }
}

/// Parse /proc/<pid>/limits.
///
/// Rows look like `Max open files   1024   524288   files`; the units column
/// is missing for the nice and realtime priority rows. `used` is left empty.
pub fn parse_limits(content: &str) -> Option<Vec<RlimitStat>> {
    let mut limits = Vec::new();

    for line in content.lines().skip(1) {
        let mut tokens: Vec<&str> = line.split_whitespace().collect();
        if let Some(last) = tokens.last()
            && parse_limit(last).is_none()
        {
            tokens.pop(); // units
        }
        if tokens.len() < 3 {
            continue;
        }
        let (Some(hard), Some(soft)) = (
            tokens.pop().and_then(parse_limit),
            tokens.pop().and_then(parse_limit),
        ) else {
            continue;
        };
        let label = tokens.join(" ");
        match Resource::from_limits_label(&label) {
            Some(resource) => limits.push(RlimitStat {
                resource,
                soft,
                hard,
                used: None,
            }),
            None => log::debug!("unknown limits row {label:?}"),
        }
    }

    if limits.is_empty() { None } else { Some(limits) }
}

/// Parse /proc/<pid>/smaps into one entry per mapping.
pub fn parse_smaps(content: &str) -> Vec<MemoryMap> {
    let mut maps: Vec<MemoryMap> = Vec::new();

    for line in content.lines() {
        let mut parts = line.split_whitespace();
        let Some(first) = parts.next() else {
            continue;
        };

        if !first.ends_with(':') {
            // Header: address perms offset dev inode [path]
            let Some((start, end)) = first.split_once('-') else {
                continue;
            };
            let (Ok(start), Ok(end)) = (
                u64::from_str_radix(start, 16),
                u64::from_str_radix(end, 16),
            ) else {
                continue;
            };
            let perms = parts.next().unwrap_or_default().to_string();
            let path: Vec<&str> = parts.skip(3).collect();
            let path = if path.is_empty() {
                "[anon]".to_string()
            } else {
                path.join(" ")
            };
            maps.push(MemoryMap {
                path,
                region: Some(MapRegion { start, end, perms }),
                ..MemoryMap::default()
            });
            continue;
        }

        let Some(map) = maps.last_mut() else {
            continue;
        };
        let Some(bytes) = parts
            .next()
            .and_then(|v| v.parse::<u64>().ok())
            .and_then(|kb| kb.checked_mul(1024))
        else {
            continue;
        };
        match first {
            "Size:" => map.size = bytes,
            "Rss:" => map.rss = bytes,
            "Pss:" => map.pss = bytes,
            "Shared_Clean:" => map.shared_clean = bytes,
            "Shared_Dirty:" => map.shared_dirty = bytes,
            "Private_Clean:" => map.private_clean = bytes,
            "Private_Dirty:" => map.private_dirty = bytes,
            "Referenced:" => map.referenced = bytes,
            "Anonymous:" => map.anonymous = bytes,
            "Swap:" => map.swap = bytes,
            _ => {}
        }
    }

    maps
}

/// Sum mappings that share a path, keeping first-seen order.
pub fn group_maps(maps: Vec<MemoryMap>) -> Vec<MemoryMap> {
    let mut grouped: Vec<MemoryMap> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for map in maps {
        match index.get(&map.path) {
            Some(&i) => grouped[i].absorb(&map),
            None => {
                index.insert(map.path.clone(), grouped.len());
                grouped.push(MemoryMap {
                    region: None,
                    ..map
                });
            }
        }
    }

    grouped
}

/// Parse /proc/<pid>/net/dev.
pub fn parse_net_dev(content: &str) -> Vec<NetIoCounters> {
    let mut counters = Vec::new();

    for line in content.lines().skip(2) {
        let Some((name, values)) = line.split_once(':') else {
            continue;
        };
        let fields: Vec<u64> = match values
            .split_whitespace()
            .map(|v| v.parse().ok())
            .collect::<Option<Vec<u64>>>()
        {
            Some(f) if f.len() >= 12 => f,
            _ => continue,
        };
        counters.push(NetIoCounters {
            name: name.trim().to_string(),
            bytes_recv: fields[0],
            packets_recv: fields[1],
            errin: fields[2],
            dropin: fields[3],
            bytes_sent: fields[8],
            packets_sent: fields[9],
            errout: fields[10],
            dropout: fields[11],
        });
    }

    counters
}

/// Read `btime` (boot time, seconds since the epoch) from /proc/stat.
pub fn parse_boot_time(content: &str) -> Option<u64> {
    content
        .lines()
        .find_map(|line| line.strip_prefix("btime "))
        .and_then(|v| v.trim().parse().ok())
}

/// Split a NUL-separated /proc/<pid>/cmdline into arguments.
pub fn parse_cmdline(raw: &[u8]) -> Vec<String> {
    let raw = raw.strip_suffix(&[0]).unwrap_or(raw);
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(|&b| b == 0)
        .map(|arg| String::from_utf8_lossy(arg).into_owned())
        .collect()
}

/// Decode the kernel's tty_nr encoding into (major, minor).
pub fn tty_device(tty_nr: i32) -> (u32, u32) {
    let nr = tty_nr as u32;
    let major = (nr >> 8) & 0xfff;
    let minor = (nr & 0xff) | ((nr >> 12) & 0xfff00);
    (major, minor)
}

/// Split a glibc `dev_t` (as in `st_rdev`) into (major, minor).
pub fn split_dev(dev: u64) -> (u32, u32) {
    let major = ((dev >> 8) & 0xfff) | ((dev >> 32) & 0xffff_f000);
    let minor = (dev & 0xff) | ((dev >> 12) & 0xffff_ff00);
    (major as u32, minor as u32)
}

/// One row of /proc/<pid>/net/{tcp,tcp6,udp,udp6}.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketEntry {
    pub inode: u64,
    pub family: AddressFamily,
    pub protocol: Protocol,
    pub local: SocketAddr,
    pub remote: SocketAddr,
    pub state: SocketState,
}

/// Parse the contents of a /proc/net/* socket table.
///
/// Each line after the header has the format:
///   sl  local_address rem_address st tx_queue:rx_queue ... inode ...
///
/// Fields are whitespace-separated. We need fields 1 (local), 2 (remote),
/// 3 (state) and 9 (inode).
pub fn parse_proc_net(
    content: &str,
    family: AddressFamily,
    protocol: Protocol,
) -> Vec<SocketEntry> {
    let parse_addr = match family {
        AddressFamily::Inet => parse_addr_v4,
        AddressFamily::Inet6 => parse_addr_v6,
    };
    let mut entries = Vec::new();

    for line in content.lines().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 10 {
            continue;
        }

        let inode: u64 = match fields[9].parse() {
            Ok(v) => v,
            Err(_) => continue,
        };

        // inode 0 means no socket
        if inode == 0 {
            continue;
        }

        let Some((local_ip, local_port)) = parse_addr(fields[1]) else {
            continue;
        };
        let Some((remote_ip, remote_port)) = parse_addr(fields[2]) else {
            continue;
        };
        let Ok(st) = u8::from_str_radix(fields[3], 16) else {
            continue;
        };
        let state = match protocol {
            Protocol::Tcp => tcp_state_from_hex(st),
            Protocol::Udp if st == 0x01 => SocketState::Connected,
            Protocol::Udp => SocketState::Bound,
        };

        entries.push(SocketEntry {
            inode,
            family,
            protocol,
            local: SocketAddr::new(local_ip, local_port),
            remote: SocketAddr::new(remote_ip, remote_port),
            state,
        });
    }

    entries
}

/// Parse an IPv4 address from /proc/net/tcp format: "AABBCCDD:PORT"
///
/// The hex address is in host byte order (little-endian on x86/ARM).
pub fn parse_addr_v4(s: &str) -> Option<(IpAddr, u16)> {
    let (addr_hex, port_hex) = s.split_once(':')?;
    if addr_hex.len() != 8 {
        return None;
    }
    let raw = u32::from_str_radix(addr_hex, 16).ok()?;
    // The kernel prints the in-memory (network order) word as a host integer.
    let ip = Ipv4Addr::from(raw.to_ne_bytes());
    let port = u16::from_str_radix(port_hex, 16).ok()?;
    Some((IpAddr::V4(ip), port))
}

/// Parse an IPv6 address from /proc/net/tcp6 format: "00000000000000000000000001000000:PORT"
///
/// The 32-char hex is 4 groups of 8 chars, each in host byte order.
pub fn parse_addr_v6(s: &str) -> Option<(IpAddr, u16)> {
    let (addr_hex, port_hex) = s.split_once(':')?;
    if addr_hex.len() != 32 {
        return None;
    }
    let port = u16::from_str_radix(port_hex, 16).ok()?;

    let mut octets = [0u8; 16];
    for i in 0..4 {
        let chunk = addr_hex.get(i * 8..(i + 1) * 8)?;
        let raw = u32::from_str_radix(chunk, 16).ok()?;
        octets[i * 4..i * 4 + 4].copy_from_slice(&raw.to_ne_bytes());
    }

    Some((IpAddr::V6(Ipv6Addr::from(octets)), port))
}

/// Parse a readlink result like "socket:[12345]" → Some(12345)
pub fn parse_socket_inode(link: &str) -> Option<u64> {
    let s = link.strip_prefix("socket:[")?;
    let s = s.strip_suffix(']')?;
    s.parse().ok()
}

/// Convert a Linux /proc/net/tcp hex state to our SocketState.
///
/// State values from include/net/tcp_states.h:
///   01=ESTABLISHED, 02=SYN_SENT, 03=SYN_RECV, 04=FIN_WAIT1,
///   05=FIN_WAIT2, 06=TIME_WAIT, 07=CLOSE, 08=CLOSE_WAIT,
///   09=LAST_ACK, 0A=LISTEN, 0B=CLOSING
pub fn tcp_state_from_hex(hex_state: u8) -> SocketState {
    match hex_state {
        0x01 => SocketState::Established,
        0x02 => SocketState::SynSent,
        0x03 => SocketState::SynReceived,
        0x04 => SocketState::FinWait1,
        0x05 => SocketState::FinWait2,
        0x06 => SocketState::TimeWait,
        0x07 => SocketState::Closed,
        0x08 => SocketState::CloseWait,
        0x09 => SocketState::LastAck,
        0x0A => SocketState::Listen,
        0x0B => SocketState::Closing,
        _ => SocketState::Closed,
    }
}
