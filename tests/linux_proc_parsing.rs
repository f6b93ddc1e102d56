//! Cross-platform tests for the Linux /proc parsers.
//!
//! The parsers in `process::procfs` operate on file contents only, so these
//! tests run on every platform (macOS included) against captured kernel text.
//! Address tests assume the little-endian layout the kernel prints on x86/ARM.
//!
//! Run with: `cargo test --test linux_proc_parsing`

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use procprobe::model::{AddressFamily, Limit, Protocol, Resource, SocketState};
use procprobe::process::procfs::{
    group_maps, parse_limits, parse_net_dev, parse_proc_net, parse_smaps, parse_socket_inode,
    parse_stat, parse_status,
};
#[cfg(target_endian = "little")]
use procprobe::process::procfs::{parse_addr_v4, parse_addr_v6};

// ---------------------------------------------------------------------------
// IPv4 / IPv6 hex address parsing
// ---------------------------------------------------------------------------

#[cfg(target_endian = "little")]
#[test]
fn ipv4_loopback() {
    // 127.0.0.1 in network byte order = 0x7F000001
    // In /proc (little-endian): 0100007F
    let (addr, port) = parse_addr_v4("0100007F:0035").unwrap();
    assert_eq!(addr, IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)));
    assert_eq!(port, 53);
}

#[cfg(target_endian = "little")]
#[test]
fn ipv4_real_address() {
    // 192.168.1.100 = 0xC0A80164 network order → 0x6401A8C0 little-endian
    let (addr, port) = parse_addr_v4("6401A8C0:1F90").unwrap();
    assert_eq!(addr, IpAddr::V4(Ipv4Addr::new(192, 168, 1, 100)));
    assert_eq!(port, 8080);
}

#[cfg(target_endian = "little")]
#[test]
fn ipv4_invalid() {
    assert!(parse_addr_v4("0100007:0035").is_none());
    assert!(parse_addr_v4("0100007F0035").is_none());
}

#[cfg(target_endian = "little")]
#[test]
fn ipv6_loopback() {
    // ::1; each 4-byte group is little-endian
    let (addr, port) = parse_addr_v6("00000000000000000000000001000000:0035").unwrap();
    assert_eq!(addr, IpAddr::V6(Ipv6Addr::LOCALHOST));
    assert_eq!(port, 53);
}

#[cfg(target_endian = "little")]
#[test]
fn ipv6_invalid_short() {
    assert!(parse_addr_v6("0000000000000000000000000000000:0035").is_none());
}

// ---------------------------------------------------------------------------
// /proc/<pid>/net/{tcp,udp}
// ---------------------------------------------------------------------------

#[cfg(target_endian = "little")]
#[test]
fn proc_net_tcp_two_entries() {
    let content = "\
  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode
   0: 0100007F:0035 00000000:0000 0A 00000000:00000000 00:00000000 00000000     0        0 12345 1 0000000000000000 100 0 0 10 0
   1: 6401A8C0:01BB 0200000A:C350 01 00000000:00000000 02:000006C0 00000000  1000        0 67890 1 0000000000000000 20 4 30 10 -1
";
    let entries = parse_proc_net(content, AddressFamily::Inet, Protocol::Tcp);
    assert_eq!(entries.len(), 2);

    assert_eq!(entries[0].local.to_string(), "127.0.0.1:53");
    assert_eq!(entries[0].remote.to_string(), "0.0.0.0:0");
    assert_eq!(entries[0].state, SocketState::Listen);
    assert_eq!(entries[0].inode, 12345);

    assert_eq!(entries[1].local.to_string(), "192.168.1.100:443");
    assert_eq!(entries[1].remote.to_string(), "10.0.0.2:50000");
    assert_eq!(entries[1].state, SocketState::Established);
    assert_eq!(entries[1].inode, 67890);
}

#[test]
fn proc_net_skips_zero_inode() {
    let content = "\
  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode
   0: 0100007F:0035 00000000:0000 0A 00000000:00000000 00:00000000 00000000     0        0 0 1 0000000000000000 100 0 0 10 0
";
    assert!(parse_proc_net(content, AddressFamily::Inet, Protocol::Tcp).is_empty());
}

#[test]
fn proc_net_udp6_bound() {
    let content = "\
  sl  local_address                         remote_address                        st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode ref pointer drops
  120: 00000000000000000000000000000000:14E9 00000000000000000000000000000000:0000 07 00000000:00000000 00:00000000 00000000   101        0 20001 2 0000000000000000 0
";
    let entries = parse_proc_net(content, AddressFamily::Inet6, Protocol::Udp);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].family, AddressFamily::Inet6);
    assert_eq!(entries[0].local.port(), 5353);
    assert_eq!(entries[0].state, SocketState::Bound);
}

#[test]
fn socket_inode() {
    assert_eq!(parse_socket_inode("socket:[12345]"), Some(12345));
    assert_eq!(parse_socket_inode("pipe:[12345]"), None);
    assert_eq!(parse_socket_inode("anon_inode:[eventpoll]"), None);
    assert_eq!(parse_socket_inode("socket:[]"), None);
}

// ---------------------------------------------------------------------------
// Whole-file fixtures
// ---------------------------------------------------------------------------

#[test]
fn stat_of_kernel_worker() {
    let content = "52 (kworker/3:0H-events_highpri) I 2 0 0 0 -1 69238880 0 0 0 0 0 0 0 0 0 -20 1 0 7 0 0 18446744073709551615 0 0 0 0 0 0 0 2147483647 0 0 0 0 17 3 0 0 0 0 0 0 0 0 0 0 0 0 0\n";
    let stat = parse_stat(content).unwrap();
    assert_eq!(stat.pid, 52);
    assert_eq!(stat.comm, "kworker/3:0H-events_highpri");
    assert_eq!(stat.state, 'I');
    assert_eq!(stat.ppid, 2);
    assert_eq!(stat.nice, -20);
    assert_eq!(stat.num_threads, 1);
    assert_eq!(stat.starttime, 7);
    assert_eq!(stat.rt_priority, Some(0));
}

#[test]
fn status_of_shell() {
    let content = "\
Name:\tbash
Umask:\t0022
State:\tS (sleeping)
Tgid:\t4242
Ngid:\t0
Pid:\t4242
PPid:\t4200
Uid:\t1000\t1000\t1000\t1000
Gid:\t1000\t1000\t1000\t1000
FDSize:\t256
VmPeak:\t   12000 kB
VmSize:\t   11800 kB
VmLck:\t       0 kB
VmHWM:\t    5200 kB
VmRSS:\t    5100 kB
VmData:\t    1800 kB
VmStk:\t     132 kB
VmSwap:\t       0 kB
Threads:\t1
voluntary_ctxt_switches:\t310
nonvoluntary_ctxt_switches:\t12
";
    let status = parse_status(content);
    assert_eq!(status.name.as_deref(), Some("bash"));
    assert_eq!(status.tgid, Some(4242));
    assert_eq!(status.uids, Some(vec![1000, 1000, 1000, 1000]));
    assert_eq!(status.threads, Some(1));
    assert_eq!(status.voluntary_ctxt_switches, Some(310));

    let mem = status.memory_info().unwrap();
    assert_eq!(mem.rss, 5100 * 1024);
    assert_eq!(mem.vms, 11800 * 1024);
    assert_eq!(mem.stack, 132 * 1024);
}

#[test]
fn limits_of_shell() {
    let content = "\
Limit                     Soft Limit           Hard Limit           Units
Max cpu time              unlimited            unlimited            seconds
Max file size             unlimited            unlimited            bytes
Max data size             unlimited            unlimited            bytes
Max stack size            8388608              unlimited            bytes
Max core file size        0                    unlimited            bytes
Max resident set          unlimited            unlimited            bytes
Max processes             63382                63382                processes
Max open files            1024                 524288               files
Max locked memory         8388608              8388608              bytes
Max address space         unlimited            unlimited            bytes
Max file locks            unlimited            unlimited            locks
Max pending signals       63382                63382                signals
Max msgqueue size         819200               819200               bytes
Max nice priority         0                    0
Max realtime priority     0                    0
Max realtime timeout      unlimited            unlimited            us
";
    let limits = parse_limits(content).unwrap();
    assert_eq!(limits.len(), 16);

    let nofile = limits.iter().find(|l| l.resource == Resource::Nofile).unwrap();
    assert_eq!(nofile.soft, Limit::Value(1024));
    assert_eq!(nofile.hard, Limit::Value(524288));
    assert_eq!(nofile.used, None);

    let stack = limits.iter().find(|l| l.resource == Resource::Stack).unwrap();
    assert_eq!(stack.hard, Limit::Unlimited);

    // rows without a units column
    let nice = limits.iter().find(|l| l.resource == Resource::Nice).unwrap();
    assert_eq!(nice.soft, Limit::Value(0));
}

#[test]
fn smaps_grouping_sums_by_path() {
    let content = "\
55d4c3a00000-55d4c3a2c000 r--p 00000000 08:01 1835023                    /usr/bin/bash
Size:                176 kB
Rss:                 176 kB
Pss:                  88 kB
Shared_Clean:        176 kB
Shared_Dirty:          0 kB
Private_Clean:         0 kB
Private_Dirty:         0 kB
Referenced:          176 kB
Anonymous:             0 kB
Swap:                  0 kB
55d4c3a2c000-55d4c3b10000 r-xp 0002c000 08:01 1835023                    /usr/bin/bash
Size:                912 kB
Rss:                 900 kB
Pss:                 450 kB
Shared_Clean:        900 kB
Shared_Dirty:          0 kB
Private_Clean:         0 kB
Private_Dirty:         0 kB
Referenced:          900 kB
Anonymous:             0 kB
Swap:                  0 kB
7f2a10000000-7f2a10021000 rw-p 00000000 00:00 0
Size:                132 kB
Rss:                   8 kB
Pss:                   8 kB
Shared_Clean:          0 kB
Shared_Dirty:          0 kB
Private_Clean:         0 kB
Private_Dirty:         8 kB
Referenced:            8 kB
Anonymous:             8 kB
Swap:                  0 kB
";
    let maps = parse_smaps(content);
    assert_eq!(maps.len(), 3);
    assert_eq!(maps[2].path, "[anon]");
    let region = maps[1].region.as_ref().unwrap();
    assert_eq!(region.perms, "r-xp");
    assert_eq!(region.start, 0x55d4c3a2c000);

    let grouped = group_maps(maps);
    assert_eq!(grouped.len(), 2);
    assert_eq!(grouped[0].path, "/usr/bin/bash");
    assert_eq!(grouped[0].size, (176 + 912) * 1024);
    assert_eq!(grouped[0].rss, (176 + 900) * 1024);
    assert!(grouped[0].region.is_none());
}

#[test]
fn net_dev_interfaces() {
    let content = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo:  123456     789    0    0    0     0          0         0   123456     789    0    0    0     0       0          0
  eth0: 9876543   12345    1    2    0     0          0         0  5432109    6789    3    4    0     0       0          0
";
    let nics = parse_net_dev(content);
    assert_eq!(nics.len(), 2);
    assert_eq!(nics[1].name, "eth0");
    assert_eq!(nics[1].bytes_recv, 9876543);
    assert_eq!(nics[1].packets_sent, 6789);
    assert_eq!(nics[1].errin, 1);
    assert_eq!(nics[1].dropout, 4);
}
