// Raw libc calls. All unsafe code of the crate lives in this file.

use std::ffi::CStr;
use std::ptr;

use super::{AddressFamily, InterfaceFlags, InterfaceRecord, UserIdentity};
use crate::error::ProbeError;

/// NI_MAXHOST; not exported by libc on every target.
const HOST_BUF_LEN: usize = 1025;
const PASSWD_BUF_LEN: usize = 16 * 1024;

/// Owning iterator over the `getifaddrs` linked list. The list is freed on drop.
struct InterfaceAddrs {
    head: *mut libc::ifaddrs,
    cursor: *mut libc::ifaddrs,
}

impl InterfaceAddrs {
    fn query() -> Result<Self, ProbeError> {
        let mut head: *mut libc::ifaddrs = ptr::null_mut();
        // SAFETY: on success getifaddrs stores a list head we own until freeifaddrs.
        if unsafe { libc::getifaddrs(&mut head) } != 0 {
            return Err(ProbeError::last_os_error("getifaddrs"));
        }
        Ok(Self { head, cursor: head })
    }
}

impl Iterator for InterfaceAddrs {
    type Item = InterfaceRecord;

    fn next(&mut self) -> Option<InterfaceRecord> {
        while !self.cursor.is_null() {
            // SAFETY: cursor is a node of the list owned by `head`, which outlives `self`.
            let entry = unsafe { &*self.cursor };
            self.cursor = entry.ifa_next;
            if entry.ifa_name.is_null() {
                continue;
            }
            // SAFETY: ifa_name is a NUL-terminated string owned by the list.
            let name = unsafe { CStr::from_ptr(entry.ifa_name) }
                .to_string_lossy()
                .into_owned();
            // SAFETY: ifa_addr is either null or a sockaddr sized for its family.
            let (family, address) = unsafe { decode_address(entry.ifa_addr) };
            let flags = entry.ifa_flags as libc::c_int;
            return Some(InterfaceRecord {
                name,
                family,
                address,
                flags: InterfaceFlags {
                    up: flags & libc::IFF_UP != 0,
                    running: flags & libc::IFF_RUNNING != 0,
                    loopback: flags & libc::IFF_LOOPBACK != 0,
                },
            });
        }
        None
    }
}

impl Drop for InterfaceAddrs {
    fn drop(&mut self) {
        if !self.head.is_null() {
            // SAFETY: head came from a successful getifaddrs and is freed exactly once.
            unsafe { libc::freeifaddrs(self.head) };
        }
    }
}

#[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
const AF_LINK_LAYER: libc::c_int = libc::AF_LINK;
#[cfg(any(target_os = "linux", target_os = "android"))]
const AF_LINK_LAYER: libc::c_int = libc::AF_PACKET;
#[cfg(not(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "linux",
    target_os = "android"
)))]
const AF_LINK_LAYER: libc::c_int = -1;

/// Numeric-only formatting of an interface address; never performs a DNS lookup.
unsafe fn decode_address(addr: *const libc::sockaddr) -> (AddressFamily, Option<String>) {
    if addr.is_null() {
        return (AddressFamily::Other, None);
    }
    // SAFETY: caller guarantees addr points at a valid sockaddr header.
    let family = unsafe { (*addr).sa_family } as libc::c_int;
    let (kind, len) = match family {
        libc::AF_INET => (AddressFamily::Ipv4, size_of::<libc::sockaddr_in>()),
        libc::AF_INET6 => (AddressFamily::Ipv6, size_of::<libc::sockaddr_in6>()),
        f if f == AF_LINK_LAYER => return (AddressFamily::Link, None),
        _ => return (AddressFamily::Other, None),
    };

    let mut host = [0 as libc::c_char; HOST_BUF_LEN];
    // SAFETY: addr is valid for `len` bytes for this family; host is a writable buffer of its length.
    let rc = unsafe {
        libc::getnameinfo(
            addr,
            len as libc::socklen_t,
            host.as_mut_ptr(),
            host.len() as libc::socklen_t,
            ptr::null_mut(),
            0,
            libc::NI_NUMERICHOST,
        )
    };
    if rc != 0 {
        return (kind, None);
    }
    // SAFETY: getnameinfo NUL-terminates host on success.
    let text = unsafe { CStr::from_ptr(host.as_ptr()) }
        .to_string_lossy()
        .into_owned();
    (kind, Some(text))
}

/// Snapshot of the OS interface list in enumeration order.
pub(super) fn interface_addresses() -> Result<Vec<InterfaceRecord>, ProbeError> {
    Ok(InterfaceAddrs::query()?.collect())
}

/// String-valued sysctl by name (e.g. "hw.model").
#[cfg(any(target_os = "macos", target_os = "ios"))]
pub(super) fn sysctl_string(key: &'static str) -> Result<String, ProbeError> {
    let name = std::ffi::CString::new(key).map_err(|e| ProbeError::QueryFailed {
        key,
        reason: e.to_string(),
    })?;
    let mut size: libc::size_t = 0;
    // SAFETY: a null output buffer asks sysctlbyname for the required size only.
    let rc = unsafe {
        libc::sysctlbyname(name.as_ptr(), ptr::null_mut(), &mut size, ptr::null_mut(), 0)
    };
    if rc != 0 {
        return Err(ProbeError::QueryFailed {
            key,
            reason: std::io::Error::last_os_error().to_string(),
        });
    }
    if size == 0 {
        return Err(ProbeError::Empty(key));
    }

    let mut buf = vec![0u8; size];
    // SAFETY: buf is writable for `size` bytes; sysctlbyname updates size to the bytes written.
    let rc = unsafe {
        libc::sysctlbyname(
            name.as_ptr(),
            buf.as_mut_ptr().cast(),
            &mut size,
            ptr::null_mut(),
            0,
        )
    };
    if rc != 0 {
        return Err(ProbeError::QueryFailed {
            key,
            reason: std::io::Error::last_os_error().to_string(),
        });
    }
    buf.truncate(size);
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    let value = String::from_utf8_lossy(&buf[..end]).trim().to_string();
    if value.is_empty() {
        return Err(ProbeError::Empty(key));
    }
    Ok(value)
}

/// Account name and full name (first GECOS field) of the process owner.
pub(super) fn current_user() -> Result<UserIdentity, ProbeError> {
    // SAFETY: getuid has no preconditions.
    let uid = unsafe { libc::getuid() };
    // SAFETY: passwd is plain old data; all-zero is a valid initial value.
    let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
    let mut buf = vec![0 as libc::c_char; PASSWD_BUF_LEN];
    let mut result: *mut libc::passwd = ptr::null_mut();
    // SAFETY: every pointer refers to a live, correctly sized local.
    let rc = unsafe { libc::getpwuid_r(uid, &mut pwd, buf.as_mut_ptr(), buf.len(), &mut result) };
    if rc != 0 {
        return Err(ProbeError::io("getpwuid_r", std::io::Error::from_raw_os_error(rc)));
    }
    if result.is_null() {
        return Err(ProbeError::Empty("passwd entry"));
    }

    // SAFETY: on success the passwd strings point into `buf`, which is still alive.
    let user_name = unsafe { owned_c_string(pwd.pw_name) };
    let full_name = unsafe { owned_c_string(pwd.pw_gecos) }.and_then(|gecos| {
        let name = gecos.split(',').next().unwrap_or_default().trim().to_string();
        (!name.is_empty()).then_some(name)
    });
    Ok(UserIdentity {
        user_name,
        full_name,
    })
}

unsafe fn owned_c_string(ptr: *const libc::c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: caller guarantees ptr is NUL-terminated and live.
    let s = unsafe { CStr::from_ptr(ptr) }.to_string_lossy().trim().to_string();
    (!s.is_empty()).then_some(s)
}
