//! Built-in Linux binding set.
//!
//! Socket, networking, file-control, epoll, errqueue and scheduling types as
//! exposed to Rust, together with the headers that declare them natively.
//! Layouts target LP64 Linux; the declared size table assumes the same.

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::{c_char, c_int, c_long, c_short, c_uint, c_ulong, c_ushort, c_void};
use std::mem::size_of;

use crate::binding;
use crate::core::{HeaderSet, SkipList};

use super::reflect::Binding;
use super::{BindingCatalog, CheckSpec, StructureDefinition};

binding! { pub struct size_t(usize); }
binding! { pub struct ssize_t(isize); }
binding! { pub struct sa_family_t(c_ushort); }
binding! { pub struct pid_t(c_int); }
binding! { pub struct uid_t(c_uint); }
binding! { pub struct gid_t(c_uint); }
binding! { pub struct socklen_t(c_uint); }
binding! { pub struct off_t(c_long); }
binding! { pub struct time_t(c_long); }
binding! { pub struct mode_t(c_uint); }
binding! { pub struct syscall_arg(c_long); }
binding! { pub struct long_t(c_long); }
binding! { pub struct aio_context_t(c_ulong); }

binding! {
    pub struct iovec {
        pub iov_base: *mut c_void,
        pub iov_len: size_t,
    }
}

binding! {
    pub struct ucred {
        pub pid: pid_t,
        pub uid: uid_t,
        pub gid: gid_t,
    }
}

binding! {
    pub struct linger {
        pub l_onoff: c_int,
        pub l_linger: c_int,
    }
}

binding! {
    pub struct sockaddr {
        pub sa_family: sa_family_t,
        pub sa_data: [c_char; 14],
    }
}

const SS_PADDING: usize = 128 - size_of::<c_ushort>() - size_of::<c_ulong>();

binding! {
    pub struct sockaddr_storage {
        pub ss_family: sa_family_t,
        __ss_padding: [c_char; SS_PADDING],
        __ss_align: c_ulong,
    }
}

binding! {
    pub struct cmsghdr {
        pub cmsg_len: size_t,
        pub cmsg_level: c_int,
        pub cmsg_type: c_int,
    }
}

binding! {
    pub struct msghdr {
        pub msg_name: *mut c_void,
        pub msg_namelen: socklen_t,
        pub msg_iov: *mut iovec,
        pub msg_iovlen: size_t,
        pub msg_control: *mut c_void,
        pub msg_controllen: size_t,
        pub msg_flags: c_int,
    }
}

binding! {
    pub struct mmsghdr {
        pub msg_hdr: msghdr,
        pub msg_len: c_uint,
    }
}

binding! {
    pub struct in_addr {
        pub s_addr: u32,
    }
}

binding! {
    #[repr(align(4))]
    pub struct in6_addr {
        pub s6_addr: [u8; 16],
    }
}

binding! {
    pub struct sockaddr_in {
        pub sin_family: sa_family_t,
        pub sin_port: u16,
        pub sin_addr: in_addr,
        pub sin_zero: [u8; 8],
    }
}

binding! {
    pub struct sockaddr_in6 {
        pub sin6_family: sa_family_t,
        pub sin6_port: u16,
        pub sin6_flowinfo: u32,
        pub sin6_addr: in6_addr,
        pub sin6_scope_id: u32,
    }
}

binding! {
    pub struct ipv6_mreq {
        pub ipv6mr_multiaddr: in6_addr,
        pub ipv6mr_interface: c_uint,
    }
}

binding! {
    pub struct ip_opts {
        pub ip_dst: in_addr,
        pub ip_opts: [c_char; 40],
    }
}

binding! {
    pub struct ip_mreq {
        pub imr_multiaddr: in_addr,
        pub imr_interface: in_addr,
    }
}

binding! {
    pub struct ip_mreqn {
        pub imr_multiaddr: in_addr,
        pub imr_address: in_addr,
        pub imr_ifindex: c_int,
    }
}

binding! {
    pub struct ip_mreq_source {
        pub imr_multiaddr: in_addr,
        pub imr_interface: in_addr,
        pub imr_sourceaddr: in_addr,
    }
}

binding! {
    pub struct group_req {
        pub gr_interface: u32,
        pub gr_group: sockaddr_storage,
    }
}

binding! {
    pub struct group_source_req {
        pub gsr_interface: u32,
        pub gsr_group: sockaddr_storage,
        pub gsr_source: sockaddr_storage,
    }
}

binding! {
    pub struct group_filter {
        pub gf_interface: u32,
        pub gf_group: sockaddr_storage,
        pub gf_fmode: u32,
        pub gf_numsrc: u32,
        pub gf_slist: [sockaddr_storage; 1],
    }
}

binding! {
    pub struct in_pktinfo {
        pub ipi_ifindex: c_int,
        pub ipi_spec_dst: in_addr,
        pub ipi_addr: in_addr,
    }
}

binding! {
    pub struct in6_pktinfo {
        pub ipi6_addr: in6_addr,
        pub ipi6_ifindex: c_uint,
    }
}

binding! {
    pub struct ip6_mtuinfo {
        pub ip6m_addr: sockaddr_in6,
        pub ip6m_mtu: u32,
    }
}

binding! {
    pub struct flock {
        pub l_type: c_short,
        pub l_whence: c_short,
        pub l_start: off_t,
        pub l_len: off_t,
        pub l_pid: pid_t,
    }
}

// The trailing flexible `f_handle` array has no size and is left out.
binding! {
    pub struct file_handle {
        pub handle_bytes: c_uint,
        pub handle_type: c_int,
    }
}

binding! {
    pub struct f_owner_ex {
        pub r#type: c_int,
        pub pid: pid_t,
    }
}

binding! {
    pub struct sockaddr_un {
        pub sun_family: sa_family_t,
        pub sun_path: [c_char; 108],
    }
}

binding! {
    pub union epoll_data_t {
        pub ptr: *mut c_void,
        pub fd: c_int,
        pub u32: u32,
        pub u64: u64,
    }
}

binding! {
    #[cfg_attr(target_arch = "x86_64", repr(packed))]
    pub struct epoll_event {
        pub events: u32,
        pub data: epoll_data_t,
    }
}

binding! {
    pub struct sock_extended_err {
        pub ee_errno: u32,
        pub ee_origin: u8,
        pub ee_type: u8,
        pub ee_code: u8,
        pub ee_pad: u8,
        pub ee_info: u32,
        pub ee_data: u32,
    }
}

binding! {
    pub struct timespec {
        pub tv_sec: time_t,
        pub tv_nsec: c_long,
    }
}

binding! {
    pub struct scm_timestamping {
        pub ts: [timespec; 3],
    }
}

binding! {
    pub struct winsize {
        pub ws_row: c_ushort,
        pub ws_col: c_ushort,
        pub ws_xpixel: c_ushort,
        pub ws_ypixel: c_ushort,
    }
}

binding! {
    pub struct cpu_set_t {
        __bits: [c_ulong; 1024 / (8 * size_of::<c_ulong>())],
    }
}

binding! {
    pub struct io_event {
        pub data: u64,
        pub obj: u64,
        pub res: i64,
        pub res2: i64,
    }
}

binding! {
    pub struct iocb {
        pub aio_data: u64,
        pub aio_key: u32,
        pub aio_rw_flags: u32,
        pub aio_lio_opcode: u16,
        pub aio_reqprio: i16,
        pub aio_fildes: u32,
        pub aio_buf: u64,
        pub aio_nbytes: u64,
        pub aio_offset: i64,
        pub aio_reserved2: u64,
        pub aio_flags: u32,
        pub aio_resfd: u32,
    }
}

binding! {
    pub struct aio_ring {
        pub id: c_uint,
        pub nr: c_uint,
        pub head: c_uint,
        pub tail: c_uint,
        pub magic: c_uint,
        pub compat_features: c_uint,
        pub incompat_features: c_uint,
        pub header_length: c_uint,
    }
}

/// Names referenced without the `struct` keyword.
pub const TYPEDEFS: &[&str] = &[
    "epoll_data_t",
    "size_t",
    "ssize_t",
    "sa_family_t",
    "pid_t",
    "uid_t",
    "gid_t",
    "socklen_t",
    "off_t",
    "time_t",
    "mode_t",
    "syscall_arg",
    "long_t",
    "cpu_set_t",
];

/// Fields whose width differs by C library (`size_t` on glibc, `int` on musl).
pub const SKIP_SIZE_CHECK: &[(&str, &str)] = &[
    ("msghdr", "msg_controllen"),
    ("msghdr", "msg_iovlen"),
    ("cmsghdr", "cmsg_len"),
];

/// Public bindings that are deliberately not checked.
pub const UNCHECKED: &[&str] = &["io_event", "iocb", "aio_ring", "aio_context_t"];

const ERRQUEUE_HEADERS: &[&str] = &["linux/time.h", "linux/errqueue.h"];

/// Conformance checks as `(headers, structure)`.
const CHECKS: &[(&[&str], &str)] = &[
    (&["sys/uio.h"], "iovec"),
    (&["sys/socket.h"], "ucred"),
    (&["sys/socket.h"], "mmsghdr"),
    (&["sys/socket.h"], "linger"),
    (&["sys/socket.h"], "sockaddr"),
    (&["sys/socket.h"], "sockaddr_storage"),
    (&["sys/socket.h"], "cmsghdr"),
    (&["sys/socket.h"], "msghdr"),
    (&["netinet/in.h"], "in_addr"),
    (&["netinet/in.h"], "in6_addr"),
    (&["netinet/in.h"], "sockaddr_in"),
    (&["netinet/in.h"], "sockaddr_in6"),
    (&["netinet/in.h"], "ipv6_mreq"),
    (&["netinet/in.h"], "ip_opts"),
    (&["netinet/in.h"], "ip_mreq"),
    (&["netinet/in.h"], "ip_mreqn"),
    (&["netinet/in.h"], "ip_mreq_source"),
    (&["netinet/in.h"], "group_req"),
    (&["netinet/in.h"], "group_source_req"),
    (&["netinet/in.h"], "group_filter"),
    (&["netinet/in.h"], "in_pktinfo"),
    (&["netinet/in.h"], "in6_pktinfo"),
    (&["netinet/in.h"], "ip6_mtuinfo"),
    (&["fcntl.h"], "flock"),
    (&["fcntl.h"], "file_handle"),
    (&["fcntl.h"], "f_owner_ex"),
    (&["sys/un.h"], "sockaddr_un"),
    (&["sys/epoll.h"], "epoll_data_t"),
    (&["sys/epoll.h"], "epoll_event"),
    (ERRQUEUE_HEADERS, "sock_extended_err"),
    (ERRQUEUE_HEADERS, "scm_timestamping"),
    (&["sys/types.h"], "size_t"),
    (&["sys/types.h"], "ssize_t"),
    (&["sys/socket.h"], "sa_family_t"),
    (&["sys/types.h"], "pid_t"),
    (&["sys/types.h"], "uid_t"),
    (&["sys/types.h"], "gid_t"),
    (&["sys/socket.h"], "socklen_t"),
    (&["sys/types.h"], "off_t"),
    (&["sys/time.h"], "time_t"),
    (&["sys/time.h"], "timespec"),
    (&["sys/types.h"], "mode_t"),
    (&["sys/types.h"], "syscall_arg"),
    (&["sys/types.h"], "long_t"),
    (&["sys/ioctl.h"], "winsize"),
    (&["sched.h"], "cpu_set_t"),
];

#[cfg(target_arch = "x86_64")]
const EPOLL_EVENT_SIZE: u16 = 12;
#[cfg(not(target_arch = "x86_64"))]
const EPOLL_EVENT_SIZE: u16 = 16;

/// Declared sizes, kept by hand and cross-checked against the definitions.
fn declared_sizes() -> BTreeMap<String, u16> {
    [
        ("iovec", 16),
        ("ucred", 12),
        ("mmsghdr", 64),
        ("linger", 8),
        ("sockaddr", 16),
        ("sockaddr_storage", 128),
        ("cmsghdr", 16),
        ("msghdr", 56),
        ("in_addr", 4),
        ("in6_addr", 16),
        ("sockaddr_in", 16),
        ("sockaddr_in6", 28),
        ("ipv6_mreq", 20),
        ("ip_opts", 44),
        ("ip_mreq", 8),
        ("ip_mreqn", 12),
        ("ip_mreq_source", 12),
        ("group_req", 136),
        ("group_source_req", 264),
        ("group_filter", 272),
        ("in_pktinfo", 12),
        ("in6_pktinfo", 20),
        ("ip6_mtuinfo", 32),
        ("flock", 32),
        ("file_handle", 8),
        ("f_owner_ex", 8),
        ("sockaddr_un", 110),
        ("epoll_data_t", 8),
        ("epoll_event", EPOLL_EVENT_SIZE),
        ("sock_extended_err", 16),
        ("scm_timestamping", 48),
        ("size_t", 8),
        ("ssize_t", 8),
        ("sa_family_t", 2),
        ("pid_t", 4),
        ("uid_t", 4),
        ("gid_t", 4),
        ("socklen_t", 4),
        ("off_t", 8),
        ("time_t", 8),
        ("timespec", 16),
        ("mode_t", 4),
        ("syscall_arg", 8),
        ("long_t", 8),
        ("winsize", 8),
        ("cpu_set_t", 128),
        ("io_event", 32),
        ("iocb", 64),
        ("aio_ring", 32),
        ("aio_context_t", 8),
    ]
    .into_iter()
    .map(|(name, size)| (name.to_string(), size))
    .collect()
}

fn definitions() -> Vec<StructureDefinition> {
    vec![
        size_t::definition(),
        ssize_t::definition(),
        sa_family_t::definition(),
        pid_t::definition(),
        uid_t::definition(),
        gid_t::definition(),
        socklen_t::definition(),
        off_t::definition(),
        time_t::definition(),
        mode_t::definition(),
        syscall_arg::definition(),
        long_t::definition(),
        aio_context_t::definition(),
        iovec::definition(),
        ucred::definition(),
        linger::definition(),
        sockaddr::definition(),
        sockaddr_storage::definition(),
        cmsghdr::definition(),
        msghdr::definition(),
        mmsghdr::definition(),
        in_addr::definition(),
        in6_addr::definition(),
        sockaddr_in::definition(),
        sockaddr_in6::definition(),
        ipv6_mreq::definition(),
        ip_opts::definition(),
        ip_mreq::definition(),
        ip_mreqn::definition(),
        ip_mreq_source::definition(),
        group_req::definition(),
        group_source_req::definition(),
        group_filter::definition(),
        in_pktinfo::definition(),
        in6_pktinfo::definition(),
        ip6_mtuinfo::definition(),
        flock::definition(),
        file_handle::definition(),
        f_owner_ex::definition(),
        sockaddr_un::definition(),
        epoll_data_t::definition(),
        epoll_event::definition(),
        sock_extended_err::definition(),
        timespec::definition(),
        scm_timestamping::definition(),
        winsize::definition(),
        cpu_set_t::definition(),
        io_event::definition(),
        iocb::definition(),
        aio_ring::definition(),
    ]
}

/// The built-in Linux catalog.
pub fn catalog() -> BindingCatalog {
    BindingCatalog {
        name: "linux".to_string(),
        definitions: definitions(),
        declared_sizes: declared_sizes(),
        checks: CHECKS
            .iter()
            .map(|(headers, name)| CheckSpec::new(HeaderSet::new(headers.iter().copied()), *name))
            .collect(),
        unchecked: UNCHECKED.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
        typedefs: TYPEDEFS.iter().map(|s| s.to_string()).collect(),
        skip_list: SKIP_SIZE_CHECK.iter().copied().collect::<SkipList>(),
    }
}
