//! The deployment catalog
//!
//! Read-mostly registry of everything a deployment declares: releases,
//! disk types, VM types, stemcells, resource pools, networks,
//! availability zones, global properties and the default update policy.
//! It is built once per deployment-plan build and shared by every job
//! resolution; all lookups are plain reads. The one mutating operation,
//! template get-or-create, is an atomic insert-if-absent and safe under
//! concurrent resolution of multiple jobs.

use convoy_types::{
    AvailabilityZone, DiskType, Network, Properties, Release, ResourcePool, Stemcell, Template,
    UpdateConfig, VmType,
};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;

/// Shared registry of templates keyed by `(release name, template name)`
///
/// Hands out one `Arc<Template>` per key, so colocating the same template
/// in several jobs (or via both the legacy and current manifest keys)
/// yields the same identity.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    entries: DashMap<(String, String), Arc<Template>>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert-if-absent; idempotent and atomic per key
    pub fn get_or_create(&self, release: &Arc<Release>, name: &str) -> Arc<Template> {
        let entry = self
            .entries
            .entry((release.name.clone(), name.to_string()))
            .or_insert_with(|| {
                Arc::new(Template {
                    name: name.to_string(),
                    release: Arc::clone(release),
                })
            });
        Arc::clone(entry.value())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Everything a deployment declares, resolvable by name
#[derive(Debug)]
pub struct DeploymentCatalog {
    name: String,
    releases: Vec<Arc<Release>>,
    disk_types: HashMap<String, Arc<DiskType>>,
    vm_types: HashMap<String, Arc<VmType>>,
    stemcells: HashMap<String, Arc<Stemcell>>,
    resource_pools: HashMap<String, Arc<ResourcePool>>,
    networks: Vec<Arc<Network>>,
    availability_zones: HashMap<String, Arc<AvailabilityZone>>,
    properties: Properties,
    update: UpdateConfig,
    templates: TemplateRegistry,
}

impl DeploymentCatalog {
    pub fn builder(name: impl Into<String>) -> DeploymentCatalogBuilder {
        DeploymentCatalogBuilder::new(name)
    }

    /// Name of the deployment this catalog belongs to
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn release(&self, name: &str) -> Option<Arc<Release>> {
        self.releases
            .iter()
            .find(|r| r.name == name)
            .map(Arc::clone)
    }

    /// All releases, in declaration order
    pub fn releases(&self) -> &[Arc<Release>] {
        &self.releases
    }

    pub fn disk_type(&self, name: &str) -> Option<Arc<DiskType>> {
        self.disk_types.get(name).map(Arc::clone)
    }

    pub fn vm_type(&self, name: &str) -> Option<Arc<VmType>> {
        self.vm_types.get(name).map(Arc::clone)
    }

    pub fn stemcell(&self, name: &str) -> Option<Arc<Stemcell>> {
        self.stemcells.get(name).map(Arc::clone)
    }

    pub fn resource_pool(&self, name: &str) -> Option<Arc<ResourcePool>> {
        self.resource_pools.get(name).map(Arc::clone)
    }

    pub fn network(&self, name: &str) -> Option<Arc<Network>> {
        self.networks
            .iter()
            .find(|n| n.name == name)
            .map(Arc::clone)
    }

    /// All networks, in declaration order
    pub fn networks(&self) -> &[Arc<Network>] {
        &self.networks
    }

    pub fn availability_zone(&self, name: &str) -> Option<Arc<AvailabilityZone>> {
        self.availability_zones.get(name).map(Arc::clone)
    }

    /// Deployment-wide property tree
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Deployment-wide default update policy
    pub fn update(&self) -> &UpdateConfig {
        &self.update
    }

    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }
}

/// Fluent construction for the plan loader and for tests
#[derive(Debug)]
pub struct DeploymentCatalogBuilder {
    catalog: DeploymentCatalog,
}

impl DeploymentCatalogBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            catalog: DeploymentCatalog {
                name: name.into(),
                releases: Vec::new(),
                disk_types: HashMap::new(),
                vm_types: HashMap::new(),
                stemcells: HashMap::new(),
                resource_pools: HashMap::new(),
                networks: Vec::new(),
                availability_zones: HashMap::new(),
                properties: Properties::new(),
                update: UpdateConfig::default(),
                templates: TemplateRegistry::new(),
            },
        }
    }

    pub fn release(mut self, release: Release) -> Self {
        self.catalog.releases.push(Arc::new(release));
        self
    }

    pub fn disk_type(mut self, disk_type: DiskType) -> Self {
        self.catalog
            .disk_types
            .insert(disk_type.name.clone(), Arc::new(disk_type));
        self
    }

    pub fn vm_type(mut self, vm_type: VmType) -> Self {
        self.catalog
            .vm_types
            .insert(vm_type.name.clone(), Arc::new(vm_type));
        self
    }

    pub fn stemcell(mut self, stemcell: Stemcell) -> Self {
        self.catalog
            .stemcells
            .insert(stemcell.name.clone(), Arc::new(stemcell));
        self
    }

    pub fn resource_pool(mut self, pool: ResourcePool) -> Self {
        self.catalog
            .resource_pools
            .insert(pool.name.clone(), Arc::new(pool));
        self
    }

    pub fn network(mut self, network: Network) -> Self {
        self.catalog.networks.push(Arc::new(network));
        self
    }

    pub fn availability_zone(mut self, zone: AvailabilityZone) -> Self {
        self.catalog
            .availability_zones
            .insert(zone.name.clone(), Arc::new(zone));
        self
    }

    pub fn properties(mut self, properties: Properties) -> Self {
        self.catalog.properties = properties;
        self
    }

    pub fn update(mut self, update: UpdateConfig) -> Self {
        self.catalog.update = update;
        self
    }

    pub fn build(self) -> DeploymentCatalog {
        self.catalog
    }
}
