//! The resolved Job aggregate
//!
//! A [`Job`] is the output of resolving one raw manifest fragment against
//! the deployment catalog. It is built field-by-field in a fixed order by
//! `convoy-resolver` and treated as immutable once returned; downstream
//! placement and provisioning only read it.

use crate::catalog::{
    AvailabilityZone, DiskType, Network, NetworkDefault, Release, ResourcePool, Stemcell, VmType,
};
use crate::update::UpdateConfig;
use crate::Properties;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::net::IpAddr;
use std::sync::Arc;

/// Whether a job runs long-lived instances or a one-off errand
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    #[default]
    Service,
    Errand,
}

impl Lifecycle {
    pub const ALL: [Lifecycle; 2] = [Lifecycle::Service, Lifecycle::Errand];

    pub fn as_str(&self) -> &'static str {
        match self {
            Lifecycle::Service => "service",
            Lifecycle::Errand => "errand",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "service" => Some(Lifecycle::Service),
            "errand" => Some(Lifecycle::Errand),
            _ => None,
        }
    }

    /// Comma-separated list of the valid spellings, for diagnostics
    pub fn valid_names() -> String {
        Self::ALL
            .iter()
            .map(Lifecycle::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Desired state of a job or a single instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceState {
    Started,
    Stopped,
    Detached,
    Recreate,
    Restart,
}

impl InstanceState {
    pub const ALL: [InstanceState; 5] = [
        InstanceState::Started,
        InstanceState::Stopped,
        InstanceState::Detached,
        InstanceState::Recreate,
        InstanceState::Restart,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceState::Started => "started",
            InstanceState::Stopped => "stopped",
            InstanceState::Detached => "detached",
            InstanceState::Recreate => "recreate",
            InstanceState::Restart => "restart",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "started" => Some(InstanceState::Started),
            "stopped" => Some(InstanceState::Stopped),
            "detached" => Some(InstanceState::Detached),
            "recreate" => Some(InstanceState::Recreate),
            "restart" => Some(InstanceState::Restart),
            _ => None,
        }
    }

    /// Comma-separated list of the valid spellings, for diagnostics
    pub fn valid_names() -> String {
        Self::ALL
            .iter()
            .map(InstanceState::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A named unit of software bound to a release
///
/// Templates are handed out by the catalog's registry, so two jobs
/// colocating the same `(release, name)` pair share one instance;
/// identity is observable through `Arc::ptr_eq`.
#[derive(Debug, PartialEq, Eq)]
pub struct Template {
    pub name: String,
    pub release: Arc<Release>,
}

/// Opaque reference from a consumed link to its producer path
///
/// The path is resolved by the link system downstream; resolution only
/// stores it per `(template, link name)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkPath(String);

impl LinkPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Where a job's persistent disk comes from: a bare size or a catalog
/// reference. At most one source may be set; the pairwise exclusivity is
/// enforced during resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum PersistentDisk {
    SizeMb(u64),
    Type(Arc<DiskType>),
    /// Deprecated alias namespace for disk types
    Pool(Arc<DiskType>),
}

/// How a job's VMs are sized: the legacy resource-pool shape or the
/// explicit vm-type + stemcell shape. Exactly one is populated.
#[derive(Debug, Clone, PartialEq)]
pub enum VmResources {
    ResourcePool {
        pool: Arc<ResourcePool>,
        env: Properties,
    },
    Dedicated {
        vm_type: Arc<VmType>,
        stemcell: Arc<Stemcell>,
        env: Properties,
    },
}

impl VmResources {
    /// Agent environment, whichever shape carries it
    pub fn env(&self) -> &Properties {
        match self {
            VmResources::ResourcePool { env, .. } => env,
            VmResources::Dedicated { env, .. } => env,
        }
    }

    pub fn stemcell(&self) -> &Stemcell {
        match self {
            VmResources::ResourcePool { pool, .. } => &pool.stemcell,
            VmResources::Dedicated { stemcell, .. } => stemcell,
        }
    }
}

/// One network attachment of a job, with its static IP allocation and the
/// capabilities this network is the job's default for
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkBinding {
    pub network: Arc<Network>,
    pub static_ips: Option<Vec<IpAddr>>,
    pub defaults: BTreeSet<NetworkDefault>,
}

impl NetworkBinding {
    pub fn default_for(&self, capability: NetworkDefault) -> bool {
        self.defaults.contains(&capability)
    }
}

/// A prior job identity being renamed or merged into this one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigratedFromJob {
    pub name: String,
    pub availability_zone: Option<String>,
}

/// An unbound placeholder for one future instance of a job; index, zone
/// and addresses are assigned by downstream placement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredInstance {
    pub job: String,
    pub deployment: String,
}

/// A fully resolved, cross-referenced job description
#[derive(Debug, Clone)]
pub struct Job {
    pub name: String,
    pub canonical_name: String,
    pub lifecycle: Lifecycle,

    /// The release templates fall back to when they name none themselves
    pub release: Option<Arc<Release>>,

    /// Colocated templates in manifest order; order is significant for
    /// downstream rendering precedence
    pub templates: Vec<Arc<Template>>,

    /// Consumed-link targets keyed by template name, then link name
    pub link_paths: BTreeMap<String, BTreeMap<String, LinkPath>>,

    pub persistent_disk: Option<PersistentDisk>,

    /// Deployment-wide properties merged with job-local overrides and
    /// resolved property mappings; owned by the job, not shared
    pub all_properties: Properties,

    pub vm_resources: VmResources,

    pub update: UpdateConfig,

    pub networks: Vec<NetworkBinding>,

    /// Per capability, the name of the network acting as default
    pub default_network: BTreeMap<NetworkDefault, String>,

    pub availability_zones: Vec<Arc<AvailabilityZone>>,

    pub migrated_from: Vec<MigratedFromJob>,

    /// Job-wide desired-state override
    pub state: Option<InstanceState>,

    /// Sparse per-instance state overrides, keyed by index or instance id
    pub instance_states: BTreeMap<String, InstanceState>,

    pub desired_instances: Vec<DesiredInstance>,
}

impl Job {
    pub fn instance_count(&self) -> usize {
        self.desired_instances.len()
    }

    pub fn is_errand(&self) -> bool {
        self.lifecycle == Lifecycle::Errand
    }

    /// Link paths declared for one colocated template, if any
    pub fn link_paths_for(&self, template: &str) -> Option<&BTreeMap<String, LinkPath>> {
        self.link_paths.get(template)
    }
}
