//! Domain types for Convoy deployment plans
//!
//! A deployment plan declares a set of shared resources (releases, disk
//! types, VM types, stemcells, resource pools, networks, availability
//! zones) and a set of jobs that reference them by name. This crate holds
//! the value types for both sides: the catalog resources as declared, and
//! the [`Job`] aggregate produced once a raw job fragment has been
//! resolved against them.
//!
//! Resolution itself lives in `convoy-resolver`; everything here is plain
//! data with no I/O and no references back into the plan builder.

#![deny(unsafe_code)]

pub mod canonical;
pub mod catalog;
pub mod job;
pub mod update;

pub use canonical::{canonicalize, CanonicalizeError};
pub use catalog::{
    AvailabilityZone, DiskType, Network, NetworkDefault, Release, ResourcePool, Stemcell, VmType,
};
pub use job::{
    DesiredInstance, InstanceState, Job, Lifecycle, LinkPath, MigratedFromJob, NetworkBinding,
    PersistentDisk, Template, VmResources,
};
pub use update::{UpdateConfig, UpdateConfigError, UpdateOverrides, WatchTime, WatchTimeSpec};

/// Free-form nested property tree, as it appears in a deployment manifest.
pub type Properties = serde_json::Map<String, serde_json::Value>;
