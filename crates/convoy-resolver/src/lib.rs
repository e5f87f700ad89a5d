//! Job specification resolution for Convoy deployment plans
//!
//! The semantic heart of the plan builder: takes a raw, loosely-typed job
//! fragment from a deployment manifest plus the partially-built plan's
//! catalog of declared resources, and produces a single validated
//! [`Job`](convoy_types::Job) aggregate or a precise diagnostic.
//! Resolution performs multi-way reference resolution (releases,
//! templates, disk types, VM types, stemcells, resource pools, networks,
//! availability zones) and enforces the mutual-exclusivity and
//! cross-field rules that keep a deployment topology consistent.
//!
//! # Usage
//!
//! ```
//! use convoy_resolver::{DeploymentCatalog, JobSpecResolver};
//! use convoy_types::{Network, Release, Stemcell, VmType};
//! use serde_json::json;
//!
//! let catalog = DeploymentCatalog::builder("prod")
//!     .release(Release::new("main", "212"))
//!     .vm_type(VmType::new("small"))
//!     .stemcell(Stemcell::new("ubuntu-jammy", "1.83"))
//!     .network(Network::new("private"))
//!     .build();
//!
//! let fragment = json!({
//!     "name": "router",
//!     "templates": [{"name": "router"}],
//!     "vm_type": "small",
//!     "stemcell": "ubuntu-jammy",
//!     "networks": [{"name": "private"}],
//!     "instances": 2,
//! });
//!
//! let resolution = JobSpecResolver::new().resolve(&fragment, &catalog).unwrap();
//! assert_eq!(resolution.job.instance_count(), 2);
//! assert_eq!(resolution.job.canonical_name, "router");
//! ```
//!
//! Resolution is synchronous and in-memory. The catalog may be shared
//! across concurrent resolutions of different jobs; its template registry
//! is the only mutable part and uses atomic insert-if-absent.

#![deny(unsafe_code)]

pub mod catalog;
pub mod errors;
pub mod fragment;
pub mod planners;
pub mod properties;
pub mod resolver;
pub mod warnings;

pub use catalog::{DeploymentCatalog, DeploymentCatalogBuilder, TemplateRegistry};
pub use errors::{ResolveError, ResolveResult};
pub use fragment::{RawJobSpec, RawMigratedFrom, RawNetworkSpec, RawTemplateSpec, TemplateRef};
pub use planners::{
    AvailabilityZonePlanner, ManifestAvailabilityZonePlanner, ManifestNetworkPlanner,
    NetworkPlanner,
};
pub use resolver::{JobResolution, JobSpecResolver};
pub use warnings::Warning;
