// ABOUTME: Decides which instance addresses become certificate principals.
// ABOUTME: IPv4 validity, RFC 1918 private ranges, and per-instance principal selection.

use crate::config::IssuerOptions;
use crate::types::Instance;
use std::net::Ipv4Addr;

/// True if `s` is a dotted-quad IPv4 address. IPv6, including IPv4-mapped
/// forms, is rejected.
pub fn is_valid_ipv4(s: &str) -> bool {
    s.parse::<Ipv4Addr>().is_ok()
}

/// True if `s` is a valid IPv4 address in 10.0.0.0/8, 172.16.0.0/12 or
/// 192.168.0.0/16.
pub fn is_valid_private_ipv4(s: &str) -> bool {
    s.parse::<Ipv4Addr>().map(|ip| ip.is_private()).unwrap_or(false)
}

/// Ordered, deduplicated principal list for `instance` under `options`.
///
/// For each interface the external addresses come first, then the internal
/// one. Internal and external eligibility are controlled independently.
pub fn eligible_principals(instance: &Instance, options: &IssuerOptions) -> Vec<String> {
    let mut principals: Vec<String> = Vec::new();
    let mut push = |ip: &str| {
        if !principals.iter().any(|p| p == ip) {
            principals.push(ip.to_string());
        }
    };

    for nic in &instance.network_interfaces {
        if options.sign_external_ips {
            for ip in nic
                .access_configs
                .iter()
                .filter_map(|ac| ac.external_ip.as_deref())
                .filter(|ip| !ip.is_empty())
            {
                if is_valid_ipv4(ip) {
                    push(ip);
                } else {
                    tracing::warn!(instance = %instance.name, ip, "not a valid IPv4 address");
                }
            }
        }
        if options.sign_internal_ips {
            if let Some(ip) = nic.internal_ip.as_deref().filter(|ip| !ip.is_empty()) {
                if is_valid_private_ipv4(ip) {
                    push(ip);
                } else {
                    tracing::warn!(instance = %instance.name, ip, "not a valid private IPv4 address");
                }
            }
        }
    }

    principals
}
