//! Typed view of a raw job fragment
//!
//! Every manifest key the resolver recognizes is declared exactly once
//! here: its name, its expected shape, whether it is required and what it
//! defaults to. The resolver never reaches into untyped maps; it consults
//! this struct. Keys the fragment may carry for other consumers are
//! simply ignored (no `deny_unknown_fields`).

use convoy_types::{Properties, UpdateOverrides};
use serde::Deserialize;
use std::collections::BTreeMap;

/// A job fragment as decoded from the manifest, before any
/// cross-reference resolution
#[derive(Debug, Clone, Deserialize)]
pub struct RawJobSpec {
    pub name: String,

    pub lifecycle: Option<String>,

    pub release: Option<String>,

    /// Legacy single-template key; the array form is deprecated
    pub template: Option<TemplateRef>,

    pub templates: Option<Vec<RawTemplateSpec>>,

    /// Disk size in megabytes; decoded signed so a negative value reaches
    /// the validation step instead of failing as a type error
    pub persistent_disk: Option<i64>,

    pub persistent_disk_type: Option<String>,

    pub persistent_disk_pool: Option<String>,

    #[serde(default)]
    pub properties: Properties,

    /// target key -> dotted source path into the merged properties
    #[serde(default)]
    pub property_mappings: BTreeMap<String, String>,

    #[serde(default)]
    pub env: Properties,

    pub resource_pool: Option<String>,

    pub vm_type: Option<String>,

    pub stemcell: Option<String>,

    pub update: Option<UpdateOverrides>,

    #[serde(default)]
    pub migrated_from: Vec<RawMigratedFrom>,

    pub state: Option<String>,

    /// Required, but decoded as optional so the missing-field diagnostic
    /// can name the job
    pub instances: Option<u32>,

    #[serde(default)]
    pub instance_states: BTreeMap<String, String>,

    /// Consumed by the network planner, not by the resolver core
    #[serde(default)]
    pub networks: Vec<RawNetworkSpec>,

    /// Consumed by the availability-zone planner
    #[serde(default)]
    pub azs: Vec<String>,
}

impl RawJobSpec {
    pub fn from_value(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value.clone())
    }
}

/// The legacy `template` key: a single name or an array of names
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TemplateRef {
    One(String),
    Many(Vec<String>),
}

impl TemplateRef {
    pub fn names(&self) -> &[String] {
        match self {
            TemplateRef::One(name) => std::slice::from_ref(name),
            TemplateRef::Many(names) => names,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, TemplateRef::Many(_))
    }
}

/// One entry of the `templates` key
#[derive(Debug, Clone, Deserialize)]
pub struct RawTemplateSpec {
    pub name: String,

    /// Release override for this template; falls back to the job's release
    pub release: Option<String>,

    /// link name -> producer path; absent and empty are equivalent
    #[serde(default)]
    pub links: BTreeMap<String, String>,
}

/// One entry of the `migrated_from` key
#[derive(Debug, Clone, Deserialize)]
pub struct RawMigratedFrom {
    pub name: String,
    pub az: Option<String>,
}

/// One entry of the `networks` key, as the network planner reads it
#[derive(Debug, Clone, Deserialize)]
pub struct RawNetworkSpec {
    pub name: String,

    pub static_ips: Option<Vec<String>>,

    /// Capabilities this network is the job's default for
    #[serde(default)]
    pub default: Vec<String>,
}
