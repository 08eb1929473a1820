//! Address to instance-id resolution.
//!
//! Addresses come in four shapes: an instance id (passed through), an IPv4
//! literal, an Amazon-provided DNS name (indexed directly by the instance
//! directory, and typically unresolvable from outside the VPC anyway), or an
//! external DNS name that must go through real DNS first.

use std::net::IpAddr;
use std::sync::Arc;

use tokio::net::lookup_host;
use tracing::debug;

use crate::directory::InstanceDirectory;
use crate::error::{Result, TransportError};

/// Resolves an arbitrary host address to a unique managed-instance id by
/// matching it against the connection's instance directory.
///
/// If two instances share an address (e.g. mid-reassignment), the first one
/// in provider listing order wins; ambiguity is not detected.
pub struct AddressResolver {
    directory: Arc<InstanceDirectory>,
}

impl AddressResolver {
    pub fn new(directory: Arc<InstanceDirectory>) -> Self {
        Self { directory }
    }

    /// Resolve `address` to an instance id, fetching the instance directory
    /// on demand. Instance ids short-circuit without any directory fetch.
    pub async fn resolve(&self, address: &str) -> Result<String> {
        if is_instance_id(address) {
            return Ok(address.to_string());
        }

        let target = if is_dns_name(address) && !is_amazon_dns(address) {
            let ip = resolve_dns(address).await?;
            debug!("resolve: {address} resolved to {ip}");
            ip
        } else {
            address.to_string()
        };

        let found = self
            .directory
            .find_by_address(&target)
            .await
            .map_err(|err| {
                TransportError::Resolution(format!(
                    "looking up instance id for {address}: {err}"
                ))
            })?;

        match found {
            Some(instance) => {
                debug!("resolve: {address} is instance {}", instance.instance_id);
                Ok(instance.instance_id)
            }
            None => Err(TransportError::Resolution(format!(
                "no instance found for address {address}"
            ))),
        }
    }
}

/// EC2 (`i-`) and SSM hybrid (`mi-`) instance ids are used as-is.
fn is_instance_id(address: &str) -> bool {
    address.starts_with("i-") || address.starts_with("mi-")
}

fn is_ipv4_literal(address: &str) -> bool {
    address.parse::<std::net::Ipv4Addr>().is_ok()
}

fn is_dns_name(address: &str) -> bool {
    !is_ipv4_literal(address)
}

/// Amazon-provided compute DNS names, public or VPC-internal. These are
/// matched against the directory's DNS fields directly.
fn is_amazon_dns(address: &str) -> bool {
    is_dns_name(address)
        && (address.ends_with(".compute.amazonaws.com") || address.ends_with(".compute.internal"))
}

async fn resolve_dns(name: &str) -> Result<String> {
    let addrs = lookup_host((name, 0))
        .await
        .map_err(|err| {
            TransportError::Resolution(format!("DNS lookup for {name} failed: {err}"))
        })?;

    addrs
        .map(|sock| sock.ip())
        .find_map(|ip| match ip {
            IpAddr::V4(v4) => Some(v4.to_string()),
            IpAddr::V6(_) => None,
        })
        .ok_or_else(|| {
            TransportError::Resolution(format!("DNS lookup for {name} returned no IPv4 address"))
        })
}
