//! Error types for job specification resolution
//!
//! Every variant corresponds to one concrete validation rule. Messages
//! name the offending job and value so the operator can act on them
//! directly; a failed resolution returns no partial job.

use convoy_types::{CanonicalizeError, InstanceState, Lifecycle};

/// Errors that abort resolution of a single job fragment
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    #[error("Invalid job spec{}: {detail}", .job.as_deref().map(|j| format!(" for '{j}'")).unwrap_or_default())]
    InvalidFragment { job: Option<String>, detail: String },

    #[error(transparent)]
    InvalidName(#[from] CanonicalizeError),

    #[error("Invalid lifecycle '{value}' for '{job}', valid lifecycle profiles are: {}", Lifecycle::valid_names())]
    InvalidLifecycle { job: String, value: String },

    #[error("Job '{job}' references an unknown release '{release}'")]
    UnknownRelease { job: String, release: String },

    #[error("Template '{template}' (job '{job}') references an unknown release '{release}'")]
    TemplateUnknownRelease {
        job: String,
        template: String,
        release: String,
    },

    #[error("Cannot tell what release job '{job}' is supposed to use, please explicitly specify one")]
    MissingRelease { job: String },

    #[error("Cannot tell what release template '{template}' (job '{job}') is supposed to use, please explicitly specify one")]
    TemplateMissingRelease { job: String, template: String },

    #[error("Job '{job}' specifies both template and templates keys, only one is allowed")]
    BothTemplateSections { job: String },

    #[error("Job '{job}' does not specify template or templates keys, one is required")]
    NoTemplateSection { job: String },

    #[error("Colocated job template '{template}' (job '{job}') has the same name in multiple releases; templates with identical names from separate releases cannot be colocated")]
    DuplicateTemplateName { job: String, template: String },

    #[error("Job '{job}' specifies both persistent_disk_type and persistent_disk_pool, only one key is allowed; persistent_disk_pool is deprecated")]
    DiskTypeAndPool { job: String },

    #[error("Job '{job}' references both a persistent disk size '{size}' and a persistent disk {disk_source} '{disk}'")]
    AmbiguousDiskSource {
        job: String,
        size: i64,
        disk_source: &'static str,
        disk: String,
    },

    #[error("Job '{job}' references an invalid persistent disk size '{size}'")]
    InvalidDiskSize { job: String, size: i64 },

    #[error("Job '{job}' references an unknown disk {disk_source} '{disk}'")]
    UnknownDiskType {
        job: String,
        disk_source: &'static str,
        disk: String,
    },

    #[error("Cannot satisfy property mapping '{to}: {from}' for job '{job}', as '{from}' is not in deployment properties")]
    PropertyMappingNotFound {
        job: String,
        to: String,
        from: String,
    },

    #[error("Job '{job}' references an unknown resource pool '{resource_pool}'")]
    UnknownResourcePool { job: String, resource_pool: String },

    #[error("Job '{job}' must specify a vm_type when no resource_pool is given")]
    MissingVmType { job: String },

    #[error("Job '{job}' references an unknown vm type '{vm_type}'")]
    UnknownVmType { job: String, vm_type: String },

    #[error("Job '{job}' must specify a stemcell when no resource_pool is given")]
    MissingStemcell { job: String },

    #[error("Job '{job}' references an unknown stemcell '{stemcell}'")]
    UnknownStemcell { job: String, stemcell: String },

    #[error("Job '{job}' and resource pool '{resource_pool}' both declare env properties")]
    AmbiguousEnv { job: String, resource_pool: String },

    #[error("Invalid update config for job '{job}': {detail}")]
    InvalidUpdateConfig { job: String, detail: String },

    #[error("Job '{job}' must specify at least one network")]
    MissingNetworks { job: String },

    #[error("Job '{job}' references an unknown network '{network}'")]
    UnknownNetwork { job: String, network: String },

    #[error("Job '{job}' declares an invalid static IP '{value}' on network '{network}'")]
    InvalidStaticIp {
        job: String,
        network: String,
        value: String,
    },

    #[error("Job '{job}' declares an invalid network default '{value}' on network '{network}'")]
    InvalidNetworkDefault {
        job: String,
        network: String,
        value: String,
    },

    #[error("Job '{job}' references an unknown availability zone '{zone}'")]
    UnknownAvailabilityZone { job: String, zone: String },

    #[error("Job '{migrated_job}' specified for migration to job '{job}' refers to availability zone '{zone}', which is not in the list of availability zones of job '{job}'")]
    MigratedFromAzNotFound {
        job: String,
        migrated_job: String,
        zone: String,
    },

    #[error("Job '{job}' must specify the number of instances")]
    MissingInstances { job: String },

    #[error("Job '{job}' has {instances} instances but was allocated {static_ips} static IPs on network '{network}'")]
    StaticIpCountMismatch {
        job: String,
        network: String,
        instances: u32,
        static_ips: usize,
    },

    #[error("Invalid state '{state}' for '{job}/{index_or_id}', valid states are: {}", InstanceState::valid_names())]
    InvalidInstanceState {
        job: String,
        index_or_id: String,
        state: String,
    },

    #[error("Invalid state '{state}' for '{job}', valid states are: {}", InstanceState::valid_names())]
    InvalidJobState { job: String, state: String },
}

/// Result type alias for resolution operations
pub type ResolveResult<T> = Result<T, ResolveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_job() {
        let err = ResolveError::UnknownRelease {
            job: "router".into(),
            release: "nats".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("router"));
        assert!(msg.contains("nats"));
    }

    #[test]
    fn test_disk_errors_name_the_offending_namespace() {
        let err = ResolveError::UnknownDiskType {
            job: "router".into(),
            disk_source: "pool",
            disk: "fast".into(),
        };
        assert_eq!(
            err.to_string(),
            "Job 'router' references an unknown disk pool 'fast'"
        );

        let err = ResolveError::AmbiguousDiskSource {
            job: "router".into(),
            size: 5,
            disk_source: "type",
            disk: "fast".into(),
        };
        assert_eq!(
            err.to_string(),
            "Job 'router' references both a persistent disk size '5' and a persistent disk type 'fast'"
        );
    }

    #[test]
    fn test_state_errors_list_valid_states() {
        let err = ResolveError::InvalidJobState {
            job: "router".into(),
            state: "bogus".into(),
        };
        assert!(err.to_string().contains("started, stopped, detached"));
    }

    #[test]
    fn test_fragment_error_with_and_without_job() {
        let with = ResolveError::InvalidFragment {
            job: Some("router".into()),
            detail: "missing field".into(),
        };
        assert!(with.to_string().contains("for 'router'"));

        let without = ResolveError::InvalidFragment {
            job: None,
            detail: "missing field".into(),
        };
        assert_eq!(without.to_string(), "Invalid job spec: missing field");
    }
}
