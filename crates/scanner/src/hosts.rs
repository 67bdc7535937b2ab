//! Lazy enumeration of the usable host addresses of a CIDR prefix.
//!
//! The host list is derived from the prefix itself rather than a fixed
//! address slice, and is bounded by an explicit, configurable cap checked
//! before any address is produced.

use std::net::IpAddr;

use ipnet::{IpAddrRange, IpNet};

use securenet_common::{SecureNetError, SecureNetResult};

/// Iterator over the usable hosts of a prefix. For IPv4 prefixes shorter
/// than /31 the network and broadcast addresses are excluded.
#[derive(Debug)]
pub struct HostRange {
    inner: IpAddrRange,
}

impl HostRange {
    /// Build a host iterator for `subnet`, refusing prefixes whose usable
    /// host count exceeds `host_cap`. The cap check runs before any work is
    /// dispatched, so an oversized prefix is a pre-scan enumeration fault.
    pub fn new(subnet: IpNet, host_cap: u128) -> SecureNetResult<Self> {
        let count = usable_host_count(&subnet);
        if count == 0 {
            return Err(SecureNetError::Enumeration(format!(
                "{subnet} contains no usable host addresses"
            )));
        }
        if count > host_cap {
            return Err(SecureNetError::Enumeration(format!(
                "{subnet} expands to {count} hosts, over the cap of {host_cap}; \
                 raise the host cap to scan it"
            )));
        }
        Ok(Self {
            inner: subnet.hosts(),
        })
    }
}

impl Iterator for HostRange {
    type Item = IpAddr;

    fn next(&mut self) -> Option<IpAddr> {
        self.inner.next()
    }
}

/// Number of addresses `IpNet::hosts` will yield for this prefix.
pub fn usable_host_count(subnet: &IpNet) -> u128 {
    match subnet {
        IpNet::V4(net) => {
            let bits = 32 - u32::from(net.prefix_len());
            let total = 1u128 << bits;
            if net.prefix_len() >= 31 {
                total
            } else {
                total - 2
            }
        }
        IpNet::V6(net) => {
            let bits = 128 - u32::from(net.prefix_len());
            if bits >= 128 {
                u128::MAX
            } else {
                1u128 << bits
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn net(s: &str) -> IpNet {
        s.parse().unwrap()
    }

    #[test]
    fn slash_30_yields_two_hosts() {
        let hosts: Vec<IpAddr> = HostRange::new(net("192.168.1.0/30"), 4096).unwrap().collect();
        assert_eq!(
            hosts,
            vec![
                IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1)),
                IpAddr::V4(Ipv4Addr::new(192, 168, 1, 2)),
            ]
        );
    }

    #[test]
    fn slash_24_yields_full_usable_range() {
        let hosts: Vec<IpAddr> = HostRange::new(net("10.0.0.0/24"), 4096).unwrap().collect();
        assert_eq!(hosts.len(), 254);
        assert_eq!(hosts[0], IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)));
        assert_eq!(hosts[253], IpAddr::V4(Ipv4Addr::new(10, 0, 0, 254)));
    }

    #[test]
    fn slash_31_and_32_have_no_reserved_addresses() {
        assert_eq!(usable_host_count(&net("10.0.0.0/31")), 2);
        assert_eq!(usable_host_count(&net("10.0.0.1/32")), 1);
    }

    #[test]
    fn oversized_prefix_is_rejected() {
        let err = HostRange::new(net("10.0.0.0/16"), 4096).unwrap_err();
        assert!(matches!(err, SecureNetError::Enumeration(_)));
    }

    #[test]
    fn cap_can_be_raised() {
        assert!(HostRange::new(net("10.0.0.0/16"), 70_000).is_ok());
    }

    #[test]
    fn ipv6_counts_do_not_overflow() {
        assert_eq!(usable_host_count(&net("2001:db8::/128")), 1);
        assert!(usable_host_count(&net("2001:db8::/64")) > 4096);
        assert_eq!(usable_host_count(&net("::/0")), u128::MAX);
    }
}
