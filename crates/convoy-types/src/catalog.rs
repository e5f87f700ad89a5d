//! Catalog resource types
//!
//! These are the deployment-wide resources a job fragment references by
//! name: releases, disk types, VM types, stemcells, resource pools,
//! networks and availability zones. They are declared once per deployment
//! by the plan loader and treated as read-only during job resolution.

use crate::Properties;
use serde::{Deserialize, Serialize};

/// A software release the deployment draws job templates from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub name: String,

    /// Release version, kept opaque (release version schemes are not semver)
    pub version: String,
}

impl Release {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// A named persistent-disk offering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskType {
    pub name: String,

    /// Disk size in megabytes
    pub disk_size_mb: u64,

    /// IaaS-specific settings, passed through untouched
    #[serde(default)]
    pub cloud_properties: Properties,
}

impl DiskType {
    pub fn new(name: impl Into<String>, disk_size_mb: u64) -> Self {
        Self {
            name: name.into(),
            disk_size_mb,
            cloud_properties: Properties::new(),
        }
    }
}

/// A named VM sizing/shape offering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VmType {
    pub name: String,

    #[serde(default)]
    pub cloud_properties: Properties,
}

impl VmType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cloud_properties: Properties::new(),
        }
    }
}

/// A base OS image VMs boot from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stemcell {
    pub name: String,

    pub os: Option<String>,

    pub version: String,
}

impl Stemcell {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            os: None,
            version: version.into(),
        }
    }
}

/// Legacy combined declaration of VM shape, stemcell and agent env,
/// superseded by separate `vm_type`/`stemcell` references
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourcePool {
    pub name: String,

    pub stemcell: Stemcell,

    #[serde(default)]
    pub cloud_properties: Properties,

    /// Agent environment carried by the pool; a job using the pool may
    /// declare its own env instead, but never both
    #[serde(default)]
    pub env: Properties,
}

impl ResourcePool {
    pub fn new(name: impl Into<String>, stemcell: Stemcell) -> Self {
        Self {
            name: name.into(),
            stemcell,
            cloud_properties: Properties::new(),
            env: Properties::new(),
        }
    }
}

/// Capabilities a network can be the job's default for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkDefault {
    Dns,
    Gateway,
}

impl NetworkDefault {
    pub const ALL: [NetworkDefault; 2] = [NetworkDefault::Dns, NetworkDefault::Gateway];

    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkDefault::Dns => "dns",
            NetworkDefault::Gateway => "gateway",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "dns" => Some(NetworkDefault::Dns),
            "gateway" => Some(NetworkDefault::Gateway),
            _ => None,
        }
    }
}

impl std::fmt::Display for NetworkDefault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A deployment-level network jobs attach to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Network {
    pub name: String,

    #[serde(default)]
    pub cloud_properties: Properties,
}

impl Network {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cloud_properties: Properties::new(),
        }
    }
}

/// A placement zone instances can be pinned to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityZone {
    pub name: String,

    #[serde(default)]
    pub cloud_properties: Properties,
}

impl AvailabilityZone {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cloud_properties: Properties::new(),
        }
    }
}
