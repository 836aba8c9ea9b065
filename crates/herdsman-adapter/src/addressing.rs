//! Provisioning address allocation and NIC validation
//!
//! Addresses are handed out on a network from its start address (or the
//! first host address) in steps of its increment, skipping addresses
//! already held by a NIC on that network. Networks served by an external
//! DHCP server are never allocated from.

use std::collections::BTreeSet;
use std::net::Ipv4Addr;

use herdsman_db::{Network, RowId, Session};
use tracing::debug;

use crate::error::AdapterError;

/// IPv4 subnet of a network row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subnet {
    base: u32,
    mask: u32,
}

impl Subnet {
    /// Subnet described by a network's address and netmask
    ///
    /// # Errors
    /// Returns `InvalidArgument` if the address or netmask is malformed
    pub fn of(network: &Network) -> Result<Self, AdapterError> {
        let address = parse_ip(&network.address).ok_or_else(|| {
            AdapterError::InvalidArgument(format!(
                "network address [{}] is invalid",
                network.address
            ))
        })?;
        let mask = parse_ip(&network.netmask)
            .map(u32::from)
            .filter(|m| m.leading_ones() + m.trailing_zeros() == 32)
            .ok_or_else(|| {
                AdapterError::InvalidArgument(format!(
                    "netmask [{}] is invalid",
                    network.netmask
                ))
            })?;

        Ok(Self {
            base: u32::from(address) & mask,
            mask,
        })
    }

    #[must_use]
    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        u32::from(ip) & self.mask == self.base
    }

    #[must_use]
    pub fn broadcast(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.base | !self.mask)
    }

    /// Number of addresses, network and broadcast included
    #[must_use]
    pub fn size(&self) -> u64 {
        u64::from(!self.mask) + 1
    }

    fn first_host(&self) -> Option<Ipv4Addr> {
        (self.size() > 1).then(|| Ipv4Addr::from(self.base + 1))
    }
}

impl std::fmt::Display for Subnet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", Ipv4Addr::from(self.base), self.mask.leading_ones())
    }
}

fn parse_ip(s: &str) -> Option<Ipv4Addr> {
    s.trim().parse().ok()
}

/// Normalise a MAC address to lowercase colon-separated form
///
/// Accepts `:` or `-` separators, or none at all.
///
/// # Errors
/// Returns `InvalidMacAddress` if the address is empty or malformed
pub fn normalize_mac(mac: &str) -> Result<String, AdapterError> {
    let mac = mac.trim();
    if mac.is_empty() {
        return Err(AdapterError::InvalidMacAddress(
            "MAC address is empty/undefined".to_string(),
        ));
    }

    let malformed =
        || AdapterError::InvalidMacAddress(format!("MAC address [{mac}] is invalid/malformed"));

    let octets: Vec<&str> = if mac.contains([':', '-']) {
        mac.split([':', '-']).collect()
    } else if mac.len() == 12 && mac.is_ascii() {
        (0..12).step_by(2).map(|i| &mac[i..i + 2]).collect()
    } else {
        return Err(malformed());
    };

    if octets.len() != 6
        || !octets
            .iter()
            .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()))
    {
        return Err(malformed());
    }

    Ok(octets.join(":").to_ascii_lowercase())
}

/// Validates and assigns NIC addresses for one batch of new nodes
///
/// Addresses and MACs handed out by one allocator are remembered, so nodes
/// created in the same request never collide with each other.
#[derive(Debug)]
pub struct NicAllocator<'a> {
    session: &'a Session,
    reserved_ips: BTreeSet<(RowId, Ipv4Addr)>,
    reserved_macs: BTreeSet<(Option<RowId>, String)>,
}

impl<'a> NicAllocator<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self {
            session,
            reserved_ips: BTreeSet::new(),
            reserved_macs: BTreeSet::new(),
        }
    }

    /// Normalise `mac` and make sure it is unused on `network`
    ///
    /// # Errors
    /// `InvalidMacAddress` if malformed, `MacAddressAlreadyExists` if a NIC
    /// on the same network already has it
    pub fn claim_mac(&mut self, mac: &str, network: Option<&Network>) -> Result<String, AdapterError> {
        let mac = normalize_mac(mac)?;
        let network_id = network.map(|n| n.id);

        let in_use = self
            .session
            .nodes()
            .flat_map(|node| node.nics.iter())
            .any(|nic| nic.network == network_id && nic.mac.as_deref() == Some(mac.as_str()));

        if in_use || !self.reserved_macs.insert((network_id, mac.clone())) {
            let on = network.map_or_else(|| "unassigned".to_string(), Network::key);
            return Err(AdapterError::MacAddressAlreadyExists(format!(
                "the MAC address [{mac}] already exists on the network [{on}]"
            )));
        }

        Ok(mac)
    }

    /// Check that `ip` lies on `network` and reserve it
    ///
    /// # Errors
    /// Returns `NetworkNotFound` if the address is malformed or off-network
    pub fn claim_ip(&mut self, ip: &str, network: &Network) -> Result<Ipv4Addr, AdapterError> {
        let addr = parse_ip(ip).ok_or_else(|| {
            AdapterError::NetworkNotFound(format!("IP address [{ip}] is invalid"))
        })?;
        let subnet = Subnet::of(network)?;

        if !subnet.contains(addr) {
            return Err(AdapterError::NetworkNotFound(format!(
                "IP address [{ip}] not on network [{subnet}]"
            )));
        }

        self.reserved_ips.insert((network.id, addr));

        Ok(addr)
    }

    /// Next free address on `network`, `None` when it uses DHCP
    ///
    /// # Errors
    /// Returns `InvalidArgument` when the address space is exhausted
    pub fn allocate_ip(&mut self, network: &Network) -> Result<Option<Ipv4Addr>, AdapterError> {
        if network.using_dhcp {
            return Ok(None);
        }

        let subnet = Subnet::of(network)?;
        let exhausted = || AdapterError::InvalidArgument("IP address space exhausted".to_string());

        let mut ip = match &network.start_ip {
            Some(start) => parse_ip(start).ok_or_else(|| {
                AdapterError::InvalidArgument(format!("start IP address [{start}] is invalid"))
            })?,
            None => subnet.first_host().ok_or_else(exhausted)?,
        };
        let increment = network.increment.max(1);

        let mut found = false;
        for _ in 0..subnet.size() {
            if !self.is_taken(network.id, ip) {
                found = true;
                break;
            }
            ip = u32::from(ip)
                .checked_add(increment)
                .map(Ipv4Addr::from)
                .ok_or_else(exhausted)?;
        }

        if !found || !subnet.contains(ip) || ip == subnet.broadcast() {
            return Err(exhausted());
        }

        self.reserved_ips.insert((network.id, ip));
        debug!(ip = %ip, network = %subnet, "assigned IP address");

        Ok(Some(ip))
    }

    fn is_taken(&self, network: RowId, ip: Ipv4Addr) -> bool {
        self.reserved_ips.contains(&(network, ip))
            || self
                .session
                .nodes()
                .flat_map(|node| node.nics.iter())
                .filter(|nic| nic.network == Some(network))
                .filter_map(|nic| nic.ip.as_deref().and_then(parse_ip))
                .any(|held| held == ip)
    }
}
