/*
 * This file is part of devprint.
 *
 * Copyright (C) 2025 devprint contributors
 *
 * devprint is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * devprint is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with devprint. If not, see <https://www.gnu.org/licenses/>.
 */

//! Active network from the kernel routing table
//!
//! The interface carrying the IPv4 default route is the active one. Its
//! transport is inferred from the interface name and its addresses come
//! from `getifaddrs`.

use std::ffi::CStr;
use std::fs;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::path::Path;

use dp_core::{NetworkSnapshot, Transport};
use tracing::debug;

/// Interface of the lowest-metric default route in `/proc/net/route` format
pub fn parse_default_route(contents: &str) -> Option<String> {
    contents
        .lines()
        .skip(1)
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            if cols.len() < 7 || cols[1] != "00000000" {
                return None;
            }
            let metric = cols[6].parse::<u32>().unwrap_or(u32::MAX);
            Some((metric, cols[0].to_string()))
        })
        .min_by_key(|(metric, _)| *metric)
        .map(|(_, iface)| iface)
}

/// Transport class from the interface naming scheme
pub fn classify_interface(name: &str) -> Transport {
    const VPN_PREFIXES: [&str; 4] = ["tun", "tap", "wg", "ppp"];

    if name.starts_with("wl") {
        Transport::Wifi
    } else if name.starts_with("ww") || name.starts_with("rmnet") {
        Transport::Cellular
    } else if VPN_PREFIXES.iter().any(|p| name.starts_with(p)) {
        Transport::Vpn
    } else {
        Transport::Other
    }
}

fn is_link_local_v6(addr: &Ipv6Addr) -> bool {
    (addr.segments()[0] & 0xffc0) == 0xfe80
}

/// First IPv4 and first non-link-local IPv6 address of `iface`
pub fn interface_addresses(iface: &str) -> (Option<Ipv4Addr>, Option<Ipv6Addr>) {
    let mut ipv4 = None;
    let mut ipv6 = None;
    let mut head: *mut libc::ifaddrs = std::ptr::null_mut();

    // SAFETY: getifaddrs only writes the list head into `head`. On success the
    // list is owned by us until the matching freeifaddrs below.
    if unsafe { libc::getifaddrs(&mut head) } != 0 {
        debug!("getifaddrs failed: {}", std::io::Error::last_os_error());
        return (None, None);
    }

    let mut cursor = head;
    while !cursor.is_null() {
        // SAFETY: cursor is a non-null node of the list returned above, which
        // stays valid until freeifaddrs. ifa_name is a NUL-terminated string and
        // ifa_addr, when non-null, points at a sockaddr whose concrete type is
        // given by sa_family.
        unsafe {
            let entry = &*cursor;
            cursor = entry.ifa_next;

            if entry.ifa_addr.is_null() || entry.ifa_name.is_null() {
                continue;
            }
            if CStr::from_ptr(entry.ifa_name).to_bytes() != iface.as_bytes() {
                continue;
            }

            match i32::from((*entry.ifa_addr).sa_family) {
                libc::AF_INET if ipv4.is_none() => {
                    let sin = &*(entry.ifa_addr as *const libc::sockaddr_in);
                    ipv4 = Some(Ipv4Addr::from(u32::from_be(sin.sin_addr.s_addr)));
                }
                libc::AF_INET6 if ipv6.is_none() => {
                    let sin6 = &*(entry.ifa_addr as *const libc::sockaddr_in6);
                    let addr = Ipv6Addr::from(sin6.sin6_addr.s6_addr);
                    if !is_link_local_v6(&addr) {
                        ipv6 = Some(addr);
                    }
                }
                _ => {}
            }
        }
    }

    // SAFETY: head came from a successful getifaddrs and is freed exactly once.
    unsafe { libc::freeifaddrs(head) };

    (ipv4, ipv6)
}

/// Current network reading; `Transport::None` without a default route.
///
/// SSID and carrier are not available from the kernel and stay unset.
pub fn read_network(route_table: &Path) -> NetworkSnapshot {
    let Some(iface) = fs::read_to_string(route_table)
        .ok()
        .and_then(|contents| parse_default_route(&contents))
    else {
        return NetworkSnapshot::default();
    };

    let (local_ipv4, local_ipv6) = interface_addresses(&iface);

    NetworkSnapshot {
        local_ipv4,
        local_ipv6,
        transport: classify_interface(&iface),
        ssid: None,
        carrier: None,
    }
}
