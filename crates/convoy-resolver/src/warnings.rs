//! Non-fatal resolution diagnostics
//!
//! Deprecations do not fail a resolution but operators need to see them.
//! They are returned in-band on the resolution result so callers and
//! tests can assert on them, and mirrored to `tracing` for the logs.

use std::fmt;

/// A non-fatal notice produced while resolving a job fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// The legacy `template` key was given an array; `templates` is the
    /// supported spelling for multiple colocated templates
    DeprecatedTemplateArray { job: String },

    /// `persistent_disk_pool` is a deprecated alias of
    /// `persistent_disk_type`
    DeprecatedDiskPool { job: String, pool: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::DeprecatedTemplateArray { job } => write!(
                f,
                "Job '{job}': please use 'templates' when specifying multiple templates for a job; \
                 'template' with an array will soon be unsupported"
            ),
            Warning::DeprecatedDiskPool { job, pool } => write!(
                f,
                "Job '{job}': 'persistent_disk_pool' ('{pool}') is deprecated, use 'persistent_disk_type'"
            ),
        }
    }
}
