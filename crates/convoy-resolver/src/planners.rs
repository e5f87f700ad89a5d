//! Network and availability-zone planner seams
//!
//! Network binding and zone placement are resolved by their own
//! sub-resolvers; the job resolver only invokes them and stores their
//! output. The traits here are that seam. The manifest-backed
//! implementations below are the defaults: they read the `networks` /
//! `azs` keys of the fragment and resolve each name against the catalog.
//! Callers with richer placement logic inject their own implementations.

use crate::catalog::DeploymentCatalog;
use crate::errors::{ResolveError, ResolveResult};
use crate::fragment::RawJobSpec;
use convoy_types::{AvailabilityZone, NetworkBinding, NetworkDefault};
use std::collections::BTreeSet;
use std::net::IpAddr;
use std::sync::Arc;

/// Resolves a job's ordered network bindings
pub trait NetworkPlanner: Send + Sync {
    fn plan(
        &self,
        spec: &RawJobSpec,
        catalog: &DeploymentCatalog,
    ) -> ResolveResult<Vec<NetworkBinding>>;
}

/// Resolves a job's ordered availability zones
pub trait AvailabilityZonePlanner: Send + Sync {
    fn plan(
        &self,
        spec: &RawJobSpec,
        networks: &[NetworkBinding],
        catalog: &DeploymentCatalog,
    ) -> ResolveResult<Vec<Arc<AvailabilityZone>>>;
}

/// Default planner: binds the networks named in the fragment, in order
///
/// A job with exactly one network gets that network as default for every
/// capability; with several, the manifest's `default` flags decide.
#[derive(Debug, Default)]
pub struct ManifestNetworkPlanner;

impl NetworkPlanner for ManifestNetworkPlanner {
    fn plan(
        &self,
        spec: &RawJobSpec,
        catalog: &DeploymentCatalog,
    ) -> ResolveResult<Vec<NetworkBinding>> {
        if spec.networks.is_empty() {
            return Err(ResolveError::MissingNetworks {
                job: spec.name.clone(),
            });
        }

        let mut bindings = Vec::with_capacity(spec.networks.len());
        for raw in &spec.networks {
            let network =
                catalog
                    .network(&raw.name)
                    .ok_or_else(|| ResolveError::UnknownNetwork {
                        job: spec.name.clone(),
                        network: raw.name.clone(),
                    })?;

            let static_ips = match &raw.static_ips {
                Some(ips) => {
                    let mut parsed = Vec::with_capacity(ips.len());
                    for ip in ips {
                        parsed.push(ip.parse::<IpAddr>().map_err(|_| {
                            ResolveError::InvalidStaticIp {
                                job: spec.name.clone(),
                                network: raw.name.clone(),
                                value: ip.clone(),
                            }
                        })?);
                    }
                    Some(parsed)
                }
                None => None,
            };

            let mut defaults = BTreeSet::new();
            for value in &raw.default {
                let capability = NetworkDefault::parse(value).ok_or_else(|| {
                    ResolveError::InvalidNetworkDefault {
                        job: spec.name.clone(),
                        network: raw.name.clone(),
                        value: value.clone(),
                    }
                })?;
                defaults.insert(capability);
            }

            bindings.push(NetworkBinding {
                network,
                static_ips,
                defaults,
            });
        }

        if bindings.len() == 1 {
            bindings[0].defaults = NetworkDefault::ALL.into_iter().collect();
        }

        Ok(bindings)
    }
}

/// Default planner: resolves the zones named in the fragment, in order
///
/// A job naming no zones is placed without zone constraints; downstream
/// placement decides.
#[derive(Debug, Default)]
pub struct ManifestAvailabilityZonePlanner;

impl AvailabilityZonePlanner for ManifestAvailabilityZonePlanner {
    fn plan(
        &self,
        spec: &RawJobSpec,
        _networks: &[NetworkBinding],
        catalog: &DeploymentCatalog,
    ) -> ResolveResult<Vec<Arc<AvailabilityZone>>> {
        spec.azs
            .iter()
            .map(|name| {
                catalog.availability_zone(name).ok_or_else(|| {
                    ResolveError::UnknownAvailabilityZone {
                        job: spec.name.clone(),
                        zone: name.clone(),
                    }
                })
            })
            .collect()
    }
}
