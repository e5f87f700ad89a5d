//! The job specification resolver
//!
//! Takes one raw job fragment plus the deployment catalog and produces a
//! validated [`Job`], or the first violated rule as a [`ResolveError`].
//! Steps run in a fixed order because later steps depend on earlier
//! results; each step is a function of the typed fragment, the catalog
//! and previously resolved values only, so construction can only move
//! forward. The sole side effects are template get-or-create on the
//! catalog's registry (idempotent) and the deprecation warnings collected
//! on the result.

use crate::catalog::DeploymentCatalog;
use crate::errors::{ResolveError, ResolveResult};
use crate::fragment::RawJobSpec;
use crate::planners::{
    AvailabilityZonePlanner, ManifestAvailabilityZonePlanner, ManifestNetworkPlanner,
    NetworkPlanner,
};
use crate::properties;
use crate::warnings::Warning;
use convoy_types::{
    canonicalize, AvailabilityZone, DesiredInstance, InstanceState, Job, Lifecycle, LinkPath,
    MigratedFromJob, NetworkBinding, NetworkDefault, PersistentDisk, Properties, Release, Template,
    UpdateConfig, VmResources,
};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// A successful resolution: the job plus any non-fatal notices
#[derive(Debug)]
pub struct JobResolution {
    pub job: Job,
    pub warnings: Vec<Warning>,
}

/// Resolves raw job fragments against a deployment catalog
///
/// One resolver can serve any number of `resolve` calls; resolving
/// several jobs concurrently against the same catalog is safe (the
/// template registry is the only shared mutable state and its
/// get-or-create is atomic).
pub struct JobSpecResolver {
    network_planner: Box<dyn NetworkPlanner>,
    az_planner: Box<dyn AvailabilityZonePlanner>,
}

impl Default for JobSpecResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl JobSpecResolver {
    /// Resolver with the manifest-backed network and zone planners
    pub fn new() -> Self {
        Self {
            network_planner: Box::new(ManifestNetworkPlanner),
            az_planner: Box::new(ManifestAvailabilityZonePlanner),
        }
    }

    /// Resolver with caller-provided planner implementations
    pub fn with_planners(
        network_planner: Box<dyn NetworkPlanner>,
        az_planner: Box<dyn AvailabilityZonePlanner>,
    ) -> Self {
        Self {
            network_planner,
            az_planner,
        }
    }

    /// Resolve one job fragment to completion
    pub fn resolve(
        &self,
        fragment: &serde_json::Value,
        catalog: &DeploymentCatalog,
    ) -> ResolveResult<JobResolution> {
        let raw = fragment
            .as_object()
            .ok_or_else(|| ResolveError::InvalidFragment {
                job: None,
                detail: "job spec must be a mapping".to_string(),
            })?;

        // Steps 1-3 read the raw mapping directly: their diagnostics must
        // win over type errors in fields that later steps own.
        let name = resolve_name(raw)?;
        let canonical_name = canonicalize(&name)?;
        let lifecycle = resolve_lifecycle(&name, raw)?;
        validate_template_sections(&name, raw)?;

        let spec = RawJobSpec::from_value(fragment).map_err(|e| {
            ResolveError::InvalidFragment {
                job: Some(name.clone()),
                detail: e.to_string(),
            }
        })?;

        let mut warnings = Vec::new();

        let release = resolve_release(&spec, catalog)?;
        let (templates, link_paths) =
            resolve_templates(&spec, release.as_ref(), catalog, &mut warnings)?;
        check_template_uniqueness(&spec.name, &templates)?;
        let persistent_disk = resolve_persistent_disk(&spec, catalog, &mut warnings)?;
        let all_properties = resolve_properties(&spec, catalog)?;
        let vm_resources = resolve_vm_resources(&spec, catalog)?;
        let update = resolve_update(&spec, catalog)?;

        let networks = self.network_planner.plan(&spec, catalog)?;
        let default_network = assign_default_networks(&networks);
        let availability_zones = self.az_planner.plan(&spec, &networks, catalog)?;
        let migrated_from = resolve_migrated_from(&spec, &availability_zones)?;
        let (state, instance_states, desired_instances) =
            resolve_desired_instances(&spec, &networks, catalog)?;

        debug!(
            job = %spec.name,
            templates = templates.len(),
            instances = desired_instances.len(),
            "resolved job specification"
        );

        Ok(JobResolution {
            job: Job {
                name: spec.name,
                canonical_name,
                lifecycle,
                release,
                templates,
                link_paths,
                persistent_disk,
                all_properties,
                vm_resources,
                update,
                networks,
                default_network,
                availability_zones,
                migrated_from,
                state,
                instance_states,
                desired_instances,
            },
            warnings,
        })
    }
}

fn resolve_name(fragment: &serde_json::Map<String, serde_json::Value>) -> ResolveResult<String> {
    match fragment.get("name") {
        Some(serde_json::Value::String(name)) => Ok(name.clone()),
        Some(_) => Err(ResolveError::InvalidFragment {
            job: None,
            detail: "invalid type for 'name', expected a string".to_string(),
        }),
        None => Err(ResolveError::InvalidFragment {
            job: None,
            detail: "missing field 'name'".to_string(),
        }),
    }
}

fn resolve_lifecycle(
    job: &str,
    fragment: &serde_json::Map<String, serde_json::Value>,
) -> ResolveResult<Lifecycle> {
    match fragment.get("lifecycle") {
        None | Some(serde_json::Value::Null) => Ok(Lifecycle::default()),
        Some(serde_json::Value::String(value)) => {
            Lifecycle::parse(value).ok_or_else(|| ResolveError::InvalidLifecycle {
                job: job.to_string(),
                value: value.clone(),
            })
        }
        Some(_) => Err(ResolveError::InvalidFragment {
            job: Some(job.to_string()),
            detail: "invalid type for 'lifecycle', expected a string".to_string(),
        }),
    }
}

/// Exactly one of the `template` / `templates` keys must be present
fn validate_template_sections(
    job: &str,
    fragment: &serde_json::Map<String, serde_json::Value>,
) -> ResolveResult<()> {
    let has = |key: &str| fragment.get(key).is_some_and(|v| !v.is_null());
    match (has("template"), has("templates")) {
        (true, true) => Err(ResolveError::BothTemplateSections {
            job: job.to_string(),
        }),
        (false, false) => Err(ResolveError::NoTemplateSection {
            job: job.to_string(),
        }),
        _ => Ok(()),
    }
}

/// A named release must exist; an omitted one is auto-selected only when
/// the deployment declares exactly one
fn resolve_release(
    spec: &RawJobSpec,
    catalog: &DeploymentCatalog,
) -> ResolveResult<Option<Arc<Release>>> {
    match &spec.release {
        Some(release_name) => catalog.release(release_name).map(Some).ok_or_else(|| {
            ResolveError::UnknownRelease {
                job: spec.name.clone(),
                release: release_name.clone(),
            }
        }),
        None => match catalog.releases() {
            [sole] => Ok(Some(Arc::clone(sole))),
            _ => Ok(None),
        },
    }
}

#[allow(clippy::type_complexity)]
fn resolve_templates(
    spec: &RawJobSpec,
    job_release: Option<&Arc<Release>>,
    catalog: &DeploymentCatalog,
    warnings: &mut Vec<Warning>,
) -> ResolveResult<(
    Vec<Arc<Template>>,
    BTreeMap<String, BTreeMap<String, LinkPath>>,
)> {
    let mut templates = Vec::new();
    let mut link_paths: BTreeMap<String, BTreeMap<String, LinkPath>> = BTreeMap::new();

    // Legacy `template` key: string or (deprecated) array of strings,
    // always bound to the job's release.
    if let Some(legacy) = &spec.template {
        if legacy.is_array() {
            let warning = Warning::DeprecatedTemplateArray {
                job: spec.name.clone(),
            };
            warn!(job = %spec.name, "{warning}");
            warnings.push(warning);
        }

        let release = job_release.ok_or_else(|| ResolveError::MissingRelease {
            job: spec.name.clone(),
        })?;
        for name in legacy.names() {
            templates.push(catalog.templates().get_or_create(release, name));
        }
    }

    // Current `templates` key: each entry may name its own release and
    // declare consumed links.
    for entry in spec.templates.iter().flatten() {
        let release = match &entry.release {
            Some(release_name) => catalog.release(release_name).ok_or_else(|| {
                ResolveError::TemplateUnknownRelease {
                    job: spec.name.clone(),
                    template: entry.name.clone(),
                    release: release_name.clone(),
                }
            })?,
            None => {
                job_release
                    .cloned()
                    .ok_or_else(|| ResolveError::TemplateMissingRelease {
                        job: spec.name.clone(),
                        template: entry.name.clone(),
                    })?
            }
        };

        templates.push(catalog.templates().get_or_create(&release, &entry.name));

        debug!(
            job = %spec.name,
            template = %entry.name,
            links = entry.links.len(),
            "parsed template links"
        );
        if !entry.links.is_empty() {
            let paths = link_paths.entry(entry.name.clone()).or_default();
            for (link, path) in &entry.links {
                paths.insert(link.clone(), LinkPath::new(path.clone()));
            }
        }
    }

    Ok((templates, link_paths))
}

/// Colocating two templates with the same name from separate releases is
/// rejected
fn check_template_uniqueness(job: &str, templates: &[Arc<Template>]) -> ResolveResult<()> {
    let mut seen = HashSet::new();
    for template in templates {
        if !seen.insert(template.name.as_str()) {
            return Err(ResolveError::DuplicateTemplateName {
                job: job.to_string(),
                template: template.name.clone(),
            });
        }
    }
    Ok(())
}

fn resolve_persistent_disk(
    spec: &RawJobSpec,
    catalog: &DeploymentCatalog,
    warnings: &mut Vec<Warning>,
) -> ResolveResult<Option<PersistentDisk>> {
    if spec.persistent_disk_type.is_some() && spec.persistent_disk_pool.is_some() {
        return Err(ResolveError::DiskTypeAndPool {
            job: spec.name.clone(),
        });
    }

    // The two namespaces are never compared against each other; only the
    // raw-key exclusivity above applies.
    let named = spec
        .persistent_disk_type
        .as_deref()
        .map(|disk| (disk, "type"))
        .or_else(|| {
            spec.persistent_disk_pool
                .as_deref()
                .map(|disk| (disk, "pool"))
        });

    if let (Some(size), Some((disk, disk_source))) = (spec.persistent_disk, named) {
        return Err(ResolveError::AmbiguousDiskSource {
            job: spec.name.clone(),
            size,
            disk_source,
            disk: disk.to_string(),
        });
    }

    if let Some(size) = spec.persistent_disk {
        if size < 0 {
            return Err(ResolveError::InvalidDiskSize {
                job: spec.name.clone(),
                size,
            });
        }
        return Ok(Some(PersistentDisk::SizeMb(size as u64)));
    }

    if let Some((disk, disk_source)) = named {
        let disk_type =
            catalog
                .disk_type(disk)
                .ok_or_else(|| ResolveError::UnknownDiskType {
                    job: spec.name.clone(),
                    disk_source,
                    disk: disk.to_string(),
                })?;

        return Ok(Some(if disk_source == "type" {
            PersistentDisk::Type(disk_type)
        } else {
            let warning = Warning::DeprecatedDiskPool {
                job: spec.name.clone(),
                pool: disk.to_string(),
            };
            warn!(job = %spec.name, "{warning}");
            warnings.push(warning);
            PersistentDisk::Pool(disk_type)
        }));
    }

    Ok(None)
}

/// Merge deployment-wide properties with the job's, then resolve declared
/// property mappings into the merged tree
fn resolve_properties(spec: &RawJobSpec, catalog: &DeploymentCatalog) -> ResolveResult<Properties> {
    let mut merged = properties::merge(catalog.properties(), &spec.properties);

    for (to, from) in &spec.property_mappings {
        let resolved = properties::lookup_path(&merged, from).cloned().ok_or_else(|| {
            ResolveError::PropertyMappingNotFound {
                job: spec.name.clone(),
                to: to.clone(),
                from: from.clone(),
            }
        })?;
        merged.insert(to.clone(), resolved);
    }

    Ok(merged)
}

fn resolve_vm_resources(
    spec: &RawJobSpec,
    catalog: &DeploymentCatalog,
) -> ResolveResult<VmResources> {
    if let Some(pool_name) = &spec.resource_pool {
        let pool =
            catalog
                .resource_pool(pool_name)
                .ok_or_else(|| ResolveError::UnknownResourcePool {
                    job: spec.name.clone(),
                    resource_pool: pool_name.clone(),
                })?;

        if !spec.env.is_empty() && !pool.env.is_empty() {
            return Err(ResolveError::AmbiguousEnv {
                job: spec.name.clone(),
                resource_pool: pool_name.clone(),
            });
        }

        let env = if spec.env.is_empty() {
            pool.env.clone()
        } else {
            spec.env.clone()
        };

        return Ok(VmResources::ResourcePool { pool, env });
    }

    let vm_type_name = spec
        .vm_type
        .as_deref()
        .ok_or_else(|| ResolveError::MissingVmType {
            job: spec.name.clone(),
        })?;
    let vm_type = catalog
        .vm_type(vm_type_name)
        .ok_or_else(|| ResolveError::UnknownVmType {
            job: spec.name.clone(),
            vm_type: vm_type_name.to_string(),
        })?;

    let stemcell_name = spec
        .stemcell
        .as_deref()
        .ok_or_else(|| ResolveError::MissingStemcell {
            job: spec.name.clone(),
        })?;
    let stemcell =
        catalog
            .stemcell(stemcell_name)
            .ok_or_else(|| ResolveError::UnknownStemcell {
                job: spec.name.clone(),
                stemcell: stemcell_name.to_string(),
            })?;

    Ok(VmResources::Dedicated {
        vm_type,
        stemcell,
        env: spec.env.clone(),
    })
}

fn resolve_update(spec: &RawJobSpec, catalog: &DeploymentCatalog) -> ResolveResult<UpdateConfig> {
    match &spec.update {
        None => Ok(catalog.update().clone()),
        Some(overrides) => catalog.update().merge(overrides).map_err(|e| {
            ResolveError::InvalidUpdateConfig {
                job: spec.name.clone(),
                detail: e.to_string(),
            }
        }),
    }
}

/// Per capability, the first network flagged as default wins
fn assign_default_networks(networks: &[NetworkBinding]) -> BTreeMap<NetworkDefault, String> {
    let mut defaults = BTreeMap::new();
    for capability in NetworkDefault::ALL {
        if let Some(binding) = networks.iter().find(|n| n.default_for(capability)) {
            defaults.insert(capability, binding.network.name.clone());
        }
    }
    defaults
}

fn resolve_migrated_from(
    spec: &RawJobSpec,
    availability_zones: &[Arc<AvailabilityZone>],
) -> ResolveResult<Vec<MigratedFromJob>> {
    let mut migrated = Vec::with_capacity(spec.migrated_from.len());
    for entry in &spec.migrated_from {
        if let Some(zone) = &entry.az {
            if !availability_zones.iter().any(|az| &az.name == zone) {
                return Err(ResolveError::MigratedFromAzNotFound {
                    job: spec.name.clone(),
                    migrated_job: entry.name.clone(),
                    zone: zone.clone(),
                });
            }
        }
        migrated.push(MigratedFromJob {
            name: entry.name.clone(),
            availability_zone: entry.az.clone(),
        });
    }
    Ok(migrated)
}

#[allow(clippy::type_complexity)]
fn resolve_desired_instances(
    spec: &RawJobSpec,
    networks: &[NetworkBinding],
    catalog: &DeploymentCatalog,
) -> ResolveResult<(
    Option<InstanceState>,
    BTreeMap<String, InstanceState>,
    Vec<DesiredInstance>,
)> {
    let instances = spec
        .instances
        .ok_or_else(|| ResolveError::MissingInstances {
            job: spec.name.clone(),
        })?;

    for binding in networks {
        if let Some(static_ips) = &binding.static_ips {
            if static_ips.len() != instances as usize {
                return Err(ResolveError::StaticIpCountMismatch {
                    job: spec.name.clone(),
                    network: binding.network.name.clone(),
                    instances,
                    static_ips: static_ips.len(),
                });
            }
        }
    }

    let mut instance_states = BTreeMap::new();
    for (index_or_id, state) in &spec.instance_states {
        let parsed =
            InstanceState::parse(state).ok_or_else(|| ResolveError::InvalidInstanceState {
                job: spec.name.clone(),
                index_or_id: index_or_id.clone(),
                state: state.clone(),
            })?;
        instance_states.insert(index_or_id.clone(), parsed);
    }

    let state = match spec.state.as_deref() {
        None => None,
        Some(state) => Some(InstanceState::parse(state).ok_or_else(|| {
            ResolveError::InvalidJobState {
                job: spec.name.clone(),
                state: state.to_string(),
            }
        })?),
    };

    let desired_instances = (0..instances)
        .map(|_| DesiredInstance {
            job: spec.name.clone(),
            deployment: catalog.name().to_string(),
        })
        .collect();

    Ok((state, instance_states, desired_instances))
}
