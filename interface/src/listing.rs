// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Streaming parser for `ip addr show`.
//!
//! ```text
//! 1: lo: <LOOPBACK,UP,LOWER_UP> mtu 65536 qdisc noqueue state UNKNOWN group default qlen 1000
//!     link/loopback 00:00:00:00:00:00 brd 00:00:00:00:00:00
//!     inet 127.0.0.1/8 scope host lo
//!        valid_lft forever preferred_lft forever
//! 2: eth0: <BROADCAST,MULTICAST,UP,LOWER_UP> mtu 1500 qdisc mq state UP group default qlen 1000
//!     link/ether 52:54:00:12:34:56 brd ff:ff:ff:ff:ff:ff
//!     inet 10.0.0.5/24 brd 10.0.0.255 scope global eth0
//! ```
//!
//! A header line opens a new staged interface.
//! The staged interface is finalized into the result when the next header arrives or when the
//! input ends, so interfaces without any address line are still reported.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use ipnet::{Ipv4Net, Ipv6Net};
use ordermap::OrderMap;
use tracing::{debug, warn};

use crate::interface::{LinkKind, NetworkInterface, OperState};
use crate::mac::Mac;

/// Fields of an interface header line.
#[derive(Debug, PartialEq, Eq)]
struct Header<'a> {
    index: u32,
    name: &'a str,
    mtu: Option<u32>,
    state: Option<OperState>,
}

/// Recognize `<digits>: <name>[@parent]: ...`.
fn header(line: &str) -> Option<Header<'_>> {
    let (index, rest) = line.split_once(": ")?;
    if index.is_empty() || !index.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let index = index.parse().ok()?;
    let (name, flags) = rest.split_once(':')?;
    let name = name.split('@').next().unwrap_or_default();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }
    let mut mtu = None;
    let mut state = None;
    let mut tokens = flags.split_whitespace();
    while let Some(token) = tokens.next() {
        match token {
            "mtu" => mtu = tokens.next().and_then(|value| value.parse().ok()),
            "state" => state = tokens.next().and_then(|value| OperState::from_str(value).ok()),
            _ => {}
        }
    }
    Some(Header {
        index,
        name,
        mtu,
        state,
    })
}

/// `address/prefix` or a bare address (point to point links print the latter).
fn is_ipv4(token: &str) -> bool {
    Ipv4Net::from_str(token).is_ok() || Ipv4Addr::from_str(token).is_ok()
}

fn is_ipv6(token: &str) -> bool {
    Ipv6Net::from_str(token).is_ok() || Ipv6Addr::from_str(token).is_ok()
}

/// Line driven parser state.
///
/// Feed every line to [`ListingParser::consume_line`], then collect the interfaces with
/// [`ListingParser::finish`].
#[derive(Debug, Default)]
pub struct ListingParser {
    staged: Option<NetworkInterface>,
    interfaces: OrderMap<u32, NetworkInterface>,
}

impl ListingParser {
    #[must_use]
    pub fn new() -> ListingParser {
        ListingParser::default()
    }

    /// Advance the parser by one line of listing.
    pub fn consume_line(&mut self, line: &str) {
        if let Some(header) = header(line) {
            self.finalize();
            let mut interface = NetworkInterface::new(header.index, header.name);
            interface.set_mtu(header.mtu);
            interface.set_oper_state(header.state);
            self.staged = Some(interface);
            return;
        }
        let Some(staged) = self.staged.as_mut() else {
            debug!("ignoring line before the first interface: {line:?}");
            return;
        };
        let mut tokens = line.split_whitespace();
        let (Some(keyword), value) = (tokens.next(), tokens.next()) else {
            return;
        };
        match (keyword, value) {
            ("inet", Some(address)) => {
                if !is_ipv4(address) {
                    debug!("{staged}: unexpected inet address {address:?}, kept as listed");
                }
                staged.push_ipv4(address);
            }
            ("inet6", Some(address)) => {
                if !is_ipv6(address) {
                    debug!("{staged}: unexpected inet6 address {address:?}, kept as listed");
                }
                staged.push_ipv6(address);
            }
            ("inet" | "inet6", None) => debug!("{staged}: {keyword} without an address"),
            _ => {
                if let Some(kind) = keyword.strip_prefix("link/") {
                    let kind = LinkKind::from_kind(kind);
                    let mac = if kind.carries_mac() {
                        value.and_then(|value| match Mac::try_from(value) {
                            Ok(mac) => Some(mac),
                            Err(err) => {
                                debug!("{staged}: {err}");
                                None
                            }
                        })
                    } else {
                        None
                    };
                    staged.set_link(kind, mac);
                }
            }
        }
    }

    fn finalize(&mut self) {
        let Some(interface) = self.staged.take() else {
            return;
        };
        if self.interfaces.contains_key(&interface.index()) {
            warn!(
                "interface index {} listed again as {}, keeping the first",
                interface.index(),
                interface.name()
            );
            return;
        }
        self.interfaces.insert(interface.index(), interface);
    }

    /// Finalize the last staged interface and return every interface in listing order.
    #[must_use]
    pub fn finish(mut self) -> OrderMap<u32, NetworkInterface> {
        self.finalize();
        self.interfaces
    }
}
