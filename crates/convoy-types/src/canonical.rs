//! Canonical name derivation
//!
//! Manifest names are human-oriented; downstream consumers (DNS records,
//! agent identifiers) need a restricted canonical form. Canonicalization
//! lowercases, maps underscores to hyphens and drops every other character
//! outside `[a-z0-9-]`. The result must be a usable DNS label: non-empty
//! and not hyphen-edged.

use thiserror::Error;

/// Errors produced when a name has no usable canonical form
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CanonicalizeError {
    #[error("Invalid name '{0}': canonical form is empty")]
    Empty(String),

    #[error("Invalid name '{0}': canonical form cannot begin or end with a hyphen")]
    HyphenEdge(String),
}

/// Derive the canonical identifier for a manifest name
pub fn canonicalize(name: &str) -> Result<String, CanonicalizeError> {
    let canonical: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c == '_' { '-' } else { c })
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect();

    if canonical.is_empty() {
        return Err(CanonicalizeError::Empty(name.to_string()));
    }
    if canonical.starts_with('-') || canonical.ends_with('-') {
        return Err(CanonicalizeError::HyphenEdge(name.to_string()));
    }

    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases() {
        assert_eq!(canonicalize("Router").unwrap(), "router");
    }

    #[test]
    fn test_underscores_become_hyphens() {
        assert_eq!(canonicalize("etcd_server").unwrap(), "etcd-server");
    }

    #[test]
    fn test_invalid_characters_dropped() {
        assert_eq!(canonicalize("web worker #2").unwrap(), "webworker2");
    }

    #[test]
    fn test_already_canonical_passes_through() {
        assert_eq!(canonicalize("postgres-9").unwrap(), "postgres-9");
    }

    #[test]
    fn test_empty_result_rejected() {
        assert!(matches!(canonicalize("!!!"), Err(CanonicalizeError::Empty(_))));
        assert!(matches!(canonicalize(""), Err(CanonicalizeError::Empty(_))));
    }

    #[test]
    fn test_hyphen_edges_rejected() {
        assert!(matches!(
            canonicalize("_worker"),
            Err(CanonicalizeError::HyphenEdge(_))
        ));
        assert!(matches!(
            canonicalize("worker-"),
            Err(CanonicalizeError::HyphenEdge(_))
        ));
    }
}
