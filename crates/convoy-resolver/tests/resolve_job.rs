//! End-to-end resolution scenarios over a built deployment catalog.

use convoy_resolver::{DeploymentCatalog, JobSpecResolver, ResolveError, Warning};
use convoy_types::{
    AvailabilityZone, DiskType, InstanceState, Lifecycle, Network, NetworkDefault, PersistentDisk,
    Properties, Release, ResourcePool, Stemcell, VmResources, VmType,
};
use serde_json::json;
use std::sync::Arc;

fn props(value: serde_json::Value) -> Properties {
    value.as_object().cloned().expect("fixture is a mapping")
}

fn catalog() -> DeploymentCatalog {
    let pool_with_env = {
        let mut pool = ResourcePool::new("legacy", Stemcell::new("ubuntu-jammy", "1.83"));
        pool.env = props(json!({"bosh": {"password": "pool-secret"}}));
        pool
    };

    DeploymentCatalog::builder("prod")
        .release(Release::new("main", "212"))
        .disk_type(DiskType::new("fast", 10_240))
        .vm_type(VmType::new("small"))
        .stemcell(Stemcell::new("ubuntu-jammy", "1.83"))
        .resource_pool(pool_with_env)
        .resource_pool(ResourcePool::new(
            "plain",
            Stemcell::new("ubuntu-jammy", "1.83"),
        ))
        .network(Network::new("private"))
        .network(Network::new("vip"))
        .availability_zone(AvailabilityZone::new("z1"))
        .availability_zone(AvailabilityZone::new("z2"))
        .properties(props(json!({"a": {"b": 1}})))
        .build()
}

fn catalog_two_releases() -> DeploymentCatalog {
    DeploymentCatalog::builder("prod")
        .release(Release::new("main", "212"))
        .release(Release::new("metrics", "3"))
        .vm_type(VmType::new("small"))
        .stemcell(Stemcell::new("ubuntu-jammy", "1.83"))
        .network(Network::new("private"))
        .build()
}

fn fragment() -> serde_json::Value {
    json!({
        "name": "router",
        "templates": [{"name": "router"}],
        "vm_type": "small",
        "stemcell": "ubuntu-jammy",
        "networks": [{"name": "private"}],
        "instances": 3,
        "azs": ["z1", "z2"],
    })
}

fn resolve(fragment: &serde_json::Value) -> Result<convoy_resolver::JobResolution, ResolveError> {
    JobSpecResolver::new().resolve(fragment, &catalog())
}

#[test]
fn happy_path_resolves_every_field() {
    let resolution = resolve(&fragment()).unwrap();
    let job = &resolution.job;

    assert_eq!(job.name, "router");
    assert_eq!(job.canonical_name, "router");
    assert_eq!(job.lifecycle, Lifecycle::Service);
    // sole release in the deployment is auto-selected
    assert_eq!(job.release.as_ref().unwrap().name, "main");
    assert_eq!(job.templates.len(), 1);
    assert!(job.persistent_disk.is_none());
    assert_eq!(job.instance_count(), 3);
    assert!(resolution.warnings.is_empty());

    let zones: Vec<_> = job
        .availability_zones
        .iter()
        .map(|z| z.name.as_str())
        .collect();
    assert_eq!(zones, ["z1", "z2"]);

    // single network is default for every capability
    assert_eq!(job.default_network[&NetworkDefault::Dns], "private");
    assert_eq!(job.default_network[&NetworkDefault::Gateway], "private");

    for instance in &job.desired_instances {
        assert_eq!(instance.job, "router");
        assert_eq!(instance.deployment, "prod");
    }
}

#[test]
fn canonical_name_is_derived() {
    let mut fragment = fragment();
    fragment["name"] = json!("Router_Main");
    let resolution = resolve(&fragment).unwrap();
    assert_eq!(resolution.job.name, "Router_Main");
    assert_eq!(resolution.job.canonical_name, "router-main");
}

#[test]
fn lifecycle_defaults_to_service_and_accepts_errand() {
    assert_eq!(resolve(&fragment()).unwrap().job.lifecycle, Lifecycle::Service);

    let mut fragment = fragment();
    fragment["lifecycle"] = json!("errand");
    assert_eq!(resolve(&fragment).unwrap().job.lifecycle, Lifecycle::Errand);
}

#[test]
fn unknown_lifecycle_fails() {
    let mut fragment = fragment();
    fragment["lifecycle"] = json!("daemon");
    assert!(matches!(
        resolve(&fragment).unwrap_err(),
        ResolveError::InvalidLifecycle { value, .. } if value == "daemon"
    ));
}

#[test]
fn both_template_keys_fail_regardless_of_other_fields() {
    let mut fragment = fragment();
    fragment["template"] = json!("router");
    // an otherwise-broken field does not mask the template-section error
    fragment["vm_type"] = json!("no-such-type");
    assert!(matches!(
        resolve(&fragment).unwrap_err(),
        ResolveError::BothTemplateSections { .. }
    ));
}

#[test]
fn both_template_keys_win_over_a_mistyped_later_field() {
    // the exactly-one-of check runs before later-step fields are decoded,
    // so a type-invalid `instances` does not mask it
    let mut fragment = fragment();
    fragment["template"] = json!("router");
    fragment["instances"] = json!("three");
    assert!(matches!(
        resolve(&fragment).unwrap_err(),
        ResolveError::BothTemplateSections { .. }
    ));
}

#[test]
fn neither_template_key_fails() {
    let mut fragment = fragment();
    fragment.as_object_mut().unwrap().remove("templates");
    assert!(matches!(
        resolve(&fragment).unwrap_err(),
        ResolveError::NoTemplateSection { .. }
    ));
}

#[test]
fn legacy_template_string_resolves_without_warning() {
    let mut fragment = fragment();
    fragment.as_object_mut().unwrap().remove("templates");
    fragment["template"] = json!("router");

    let resolution = resolve(&fragment).unwrap();
    assert_eq!(resolution.job.templates[0].name, "router");
    assert!(resolution.warnings.is_empty());
}

#[test]
fn legacy_template_array_resolves_with_deprecation_warning() {
    let mut fragment = fragment();
    fragment.as_object_mut().unwrap().remove("templates");
    fragment["template"] = json!(["router", "metron"]);

    let resolution = resolve(&fragment).unwrap();
    let names: Vec<_> = resolution
        .job
        .templates
        .iter()
        .map(|t| t.name.as_str())
        .collect();
    assert_eq!(names, ["router", "metron"]);
    assert_eq!(
        resolution.warnings,
        vec![Warning::DeprecatedTemplateArray {
            job: "router".into()
        }]
    );
}

#[test]
fn two_releases_and_no_release_key_fail_where_a_release_is_required() {
    let mut fragment = fragment();
    fragment.as_object_mut().unwrap().remove("templates");
    fragment["template"] = json!("router");

    let err = JobSpecResolver::new()
        .resolve(&fragment, &catalog_two_releases())
        .unwrap_err();
    assert!(matches!(err, ResolveError::MissingRelease { .. }));

    let err = JobSpecResolver::new()
        .resolve(&self::fragment(), &catalog_two_releases())
        .unwrap_err();
    assert!(matches!(err, ResolveError::TemplateMissingRelease { .. }));
}

#[test]
fn template_entry_can_name_its_own_release() {
    let mut fragment = fragment();
    fragment.as_object_mut().unwrap().remove("azs");
    fragment["templates"] = json!([
        {"name": "router", "release": "main"},
        {"name": "agent", "release": "metrics"},
    ]);

    let resolution = JobSpecResolver::new()
        .resolve(&fragment, &catalog_two_releases())
        .unwrap();
    assert_eq!(resolution.job.templates[0].release.name, "main");
    assert_eq!(resolution.job.templates[1].release.name, "metrics");
}

#[test]
fn template_entry_with_unknown_release_fails() {
    let mut fragment = fragment();
    fragment["templates"] = json!([{"name": "router", "release": "ghost"}]);
    assert!(matches!(
        resolve(&fragment).unwrap_err(),
        ResolveError::TemplateUnknownRelease { release, .. } if release == "ghost"
    ));
}

#[test]
fn unknown_job_release_fails() {
    let mut fragment = fragment();
    fragment["release"] = json!("ghost");
    assert!(matches!(
        resolve(&fragment).unwrap_err(),
        ResolveError::UnknownRelease { release, .. } if release == "ghost"
    ));
}

#[test]
fn colocated_template_name_collision_across_releases_fails() {
    let mut fragment = fragment();
    fragment["templates"] = json!([
        {"name": "agent", "release": "main"},
        {"name": "agent", "release": "metrics"},
    ]);

    let err = JobSpecResolver::new()
        .resolve(&fragment, &catalog_two_releases())
        .unwrap_err();
    assert!(matches!(
        err,
        ResolveError::DuplicateTemplateName { template, .. } if template == "agent"
    ));
}

#[test]
fn disk_size_and_type_together_fail() {
    let mut fragment = fragment();
    fragment["persistent_disk"] = json!(5);
    fragment["persistent_disk_type"] = json!("fast");
    assert!(matches!(
        resolve(&fragment).unwrap_err(),
        ResolveError::AmbiguousDiskSource { size: 5, .. }
    ));
}

#[test]
fn disk_type_and_pool_together_fail() {
    let mut fragment = fragment();
    fragment["persistent_disk_type"] = json!("fast");
    fragment["persistent_disk_pool"] = json!("fast");
    assert!(matches!(
        resolve(&fragment).unwrap_err(),
        ResolveError::DiskTypeAndPool { .. }
    ));
}

#[test]
fn negative_disk_size_fails_and_zero_succeeds() {
    let mut fragment = fragment();
    fragment["persistent_disk"] = json!(-1);
    assert!(matches!(
        resolve(&fragment).unwrap_err(),
        ResolveError::InvalidDiskSize { size: -1, .. }
    ));

    let mut fragment = self::fragment();
    fragment["persistent_disk"] = json!(0);
    let resolution = resolve(&fragment).unwrap();
    assert_eq!(
        resolution.job.persistent_disk,
        Some(PersistentDisk::SizeMb(0))
    );
}

#[test]
fn unknown_disk_type_fails() {
    let mut fragment = fragment();
    fragment["persistent_disk_type"] = json!("warp");
    assert!(matches!(
        resolve(&fragment).unwrap_err(),
        ResolveError::UnknownDiskType { disk, .. } if disk == "warp"
    ));
}

#[test]
fn disk_pool_resolves_with_deprecation_warning() {
    let mut fragment = fragment();
    fragment["persistent_disk_pool"] = json!("fast");

    let resolution = resolve(&fragment).unwrap();
    assert!(matches!(
        resolution.job.persistent_disk,
        Some(PersistentDisk::Pool(ref disk)) if disk.name == "fast"
    ));
    assert_eq!(
        resolution.warnings,
        vec![Warning::DeprecatedDiskPool {
            job: "router".into(),
            pool: "fast".into()
        }]
    );
}

#[test]
fn properties_merge_global_and_job_local() {
    let mut fragment = fragment();
    fragment["properties"] = json!({"a": {"c": 2}});

    let resolution = resolve(&fragment).unwrap();
    assert_eq!(resolution.job.all_properties["a"], json!({"b": 1, "c": 2}));
}

#[test]
fn job_local_scalar_replaces_global_subtree() {
    let mut fragment = fragment();
    fragment["properties"] = json!({"a": 9});
    let resolution = resolve(&fragment).unwrap();
    assert_eq!(resolution.job.all_properties["a"], json!(9));
}

#[test]
fn property_mapping_writes_resolved_target() {
    let mut fragment = fragment();
    fragment["property_mappings"] = json!({"x": "a.b"});
    let resolution = resolve(&fragment).unwrap();
    assert_eq!(resolution.job.all_properties["x"], json!(1));
}

#[test]
fn property_mapping_with_missing_source_fails() {
    let mut fragment = fragment();
    fragment["property_mappings"] = json!({"x": "a.missing"});
    assert!(matches!(
        resolve(&fragment).unwrap_err(),
        ResolveError::PropertyMappingNotFound { from, .. } if from == "a.missing"
    ));
}

#[test]
fn resource_pool_shape_takes_pool_env() {
    let mut fragment = fragment();
    let map = fragment.as_object_mut().unwrap();
    map.remove("vm_type");
    map.remove("stemcell");
    map.insert("resource_pool".into(), json!("legacy"));

    let resolution = resolve(&fragment).unwrap();
    match &resolution.job.vm_resources {
        VmResources::ResourcePool { pool, env } => {
            assert_eq!(pool.name, "legacy");
            assert_eq!(env["bosh"], json!({"password": "pool-secret"}));
        }
        other => panic!("expected resource-pool shape, got {other:?}"),
    }
}

#[test]
fn resource_pool_shape_takes_job_env_when_pool_has_none() {
    let mut fragment = fragment();
    let map = fragment.as_object_mut().unwrap();
    map.remove("vm_type");
    map.remove("stemcell");
    map.insert("resource_pool".into(), json!("plain"));
    map.insert("env".into(), json!({"bosh": {"password": "job-secret"}}));

    let resolution = resolve(&fragment).unwrap();
    assert_eq!(
        resolution.job.vm_resources.env()["bosh"],
        json!({"password": "job-secret"})
    );
}

#[test]
fn job_and_pool_env_together_are_ambiguous() {
    let mut fragment = fragment();
    let map = fragment.as_object_mut().unwrap();
    map.remove("vm_type");
    map.remove("stemcell");
    map.insert("resource_pool".into(), json!("legacy"));
    map.insert("env".into(), json!({"bosh": {"password": "job-secret"}}));

    assert!(matches!(
        resolve(&fragment).unwrap_err(),
        ResolveError::AmbiguousEnv { resource_pool, .. } if resource_pool == "legacy"
    ));
}

#[test]
fn unknown_resource_pool_vm_type_and_stemcell_fail() {
    let mut fragment = fragment();
    let map = fragment.as_object_mut().unwrap();
    map.remove("vm_type");
    map.remove("stemcell");
    map.insert("resource_pool".into(), json!("ghost"));
    assert!(matches!(
        resolve(&fragment).unwrap_err(),
        ResolveError::UnknownResourcePool { resource_pool, .. } if resource_pool == "ghost"
    ));

    let mut fragment = self::fragment();
    fragment["vm_type"] = json!("huge");
    assert!(matches!(
        resolve(&fragment).unwrap_err(),
        ResolveError::UnknownVmType { vm_type, .. } if vm_type == "huge"
    ));

    let mut fragment = self::fragment();
    fragment["stemcell"] = json!("centos");
    assert!(matches!(
        resolve(&fragment).unwrap_err(),
        ResolveError::UnknownStemcell { stemcell, .. } if stemcell == "centos"
    ));
}

#[test]
fn vm_type_without_stemcell_fails() {
    let mut fragment = fragment();
    fragment.as_object_mut().unwrap().remove("stemcell");
    assert!(matches!(
        resolve(&fragment).unwrap_err(),
        ResolveError::MissingStemcell { .. }
    ));
}

#[test]
fn update_overrides_merge_over_deployment_default() {
    let mut fragment = fragment();
    fragment["update"] = json!({"canaries": 4, "canary_watch_time": "1000-5000"});

    let resolution = resolve(&fragment).unwrap();
    assert_eq!(resolution.job.update.canaries, 4);
    assert_eq!(resolution.job.update.canary_watch_time.min_ms, 1000);
    assert_eq!(resolution.job.update.canary_watch_time.max_ms, 5000);
    // untouched fields keep the deployment-wide default
    assert_eq!(resolution.job.update.max_in_flight, 1);
}

#[test]
fn static_ip_count_must_match_instances() {
    let mut fragment = fragment();
    fragment["networks"] = json!([
        {"name": "private", "static_ips": ["10.0.0.5", "10.0.0.6"]},
    ]);
    assert!(matches!(
        resolve(&fragment).unwrap_err(),
        ResolveError::StaticIpCountMismatch { instances: 3, static_ips: 2, .. }
    ));

    let mut fragment = self::fragment();
    fragment["networks"] = json!([
        {"name": "private", "static_ips": ["10.0.0.5", "10.0.0.6", "10.0.0.7"]},
    ]);
    let resolution = resolve(&fragment).unwrap();
    assert_eq!(
        resolution.job.networks[0].static_ips.as_deref().unwrap().len(),
        3
    );
}

#[test]
fn invalid_instance_state_fails_and_valid_one_is_kept() {
    let mut fragment = fragment();
    fragment["instance_states"] = json!({"0": "bogus"});
    assert!(matches!(
        resolve(&fragment).unwrap_err(),
        ResolveError::InvalidInstanceState { index_or_id, state, .. }
            if index_or_id == "0" && state == "bogus"
    ));

    let mut fragment = self::fragment();
    fragment["instance_states"] = json!({"0": "stopped"});
    let resolution = resolve(&fragment).unwrap();
    assert_eq!(
        resolution.job.instance_states["0"],
        InstanceState::Stopped
    );
}

#[test]
fn invalid_job_state_fails_and_valid_one_is_kept() {
    let mut fragment = fragment();
    fragment["state"] = json!("bogus");
    assert!(matches!(
        resolve(&fragment).unwrap_err(),
        ResolveError::InvalidJobState { state, .. } if state == "bogus"
    ));

    let mut fragment = self::fragment();
    fragment["state"] = json!("detached");
    let resolution = resolve(&fragment).unwrap();
    assert_eq!(resolution.job.state, Some(InstanceState::Detached));
}

#[test]
fn migrated_from_az_must_belong_to_the_job() {
    let mut fragment = fragment();
    fragment["migrated_from"] = json!([{"name": "old-router", "az": "z1"}]);
    let resolution = resolve(&fragment).unwrap();
    assert_eq!(resolution.job.migrated_from[0].name, "old-router");
    assert_eq!(
        resolution.job.migrated_from[0].availability_zone.as_deref(),
        Some("z1")
    );

    let mut fragment = self::fragment();
    fragment["migrated_from"] = json!([{"name": "old-router", "az": "z9"}]);
    assert!(matches!(
        resolve(&fragment).unwrap_err(),
        ResolveError::MigratedFromAzNotFound { zone, .. } if zone == "z9"
    ));
}

#[test]
fn migrated_from_without_az_is_accepted() {
    let mut fragment = fragment();
    fragment["migrated_from"] = json!([{"name": "old-router"}]);
    let resolution = resolve(&fragment).unwrap();
    assert!(resolution.job.migrated_from[0].availability_zone.is_none());
}

#[test]
fn missing_instances_fails_naming_the_job() {
    let mut fragment = fragment();
    fragment.as_object_mut().unwrap().remove("instances");
    let err = resolve(&fragment).unwrap_err();
    assert!(matches!(err, ResolveError::MissingInstances { .. }));
    assert!(err.to_string().contains("router"));
}

#[test]
fn mistyped_field_is_an_invalid_fragment_naming_the_job() {
    let mut fragment = fragment();
    fragment["instances"] = json!("three");
    let err = resolve(&fragment).unwrap_err();
    assert!(matches!(
        err,
        ResolveError::InvalidFragment { job: Some(ref j), .. } if j == "router"
    ));
}

#[test]
fn template_identity_is_shared_across_resolutions_and_pathways() {
    let catalog = catalog();
    let resolver = JobSpecResolver::new();

    // current `templates` pathway
    let first = resolver.resolve(&fragment(), &catalog).unwrap();

    // legacy `template` pathway, same (release, name) pair
    let mut legacy = fragment();
    legacy.as_object_mut().unwrap().remove("templates");
    legacy["template"] = json!("router");
    legacy["name"] = json!("router-2");
    let second = resolver.resolve(&legacy, &catalog).unwrap();

    assert!(Arc::ptr_eq(
        &first.job.templates[0],
        &second.job.templates[0]
    ));
    assert_eq!(catalog.templates().len(), 1);
}

#[test]
fn no_links_and_empty_links_are_equivalent() {
    let mut absent = fragment();
    absent["templates"] = json!([{"name": "router"}]);
    let absent = resolve(&absent).unwrap();

    let mut empty = fragment();
    empty["templates"] = json!([{"name": "router", "links": {}}]);
    let empty = resolve(&empty).unwrap();

    assert!(absent.job.link_paths_for("router").is_none());
    assert!(empty.job.link_paths_for("router").is_none());
    assert_eq!(absent.job.link_paths, empty.job.link_paths);
}

#[test]
fn declared_links_are_stored_per_template_and_link_name() {
    let mut fragment = fragment();
    fragment["templates"] = json!([
        {"name": "router", "links": {"db": "other.postgres.db"}},
    ]);
    let resolution = resolve(&fragment).unwrap();
    let links = resolution.job.link_paths_for("router").unwrap();
    assert_eq!(links["db"].as_str(), "other.postgres.db");
}

#[test]
fn default_network_per_capability_uses_first_flagged_network() {
    let mut fragment = fragment();
    fragment["networks"] = json!([
        {"name": "private", "default": ["dns"]},
        {"name": "vip", "default": ["gateway"]},
    ]);
    let resolution = resolve(&fragment).unwrap();
    assert_eq!(
        resolution.job.default_network[&NetworkDefault::Dns],
        "private"
    );
    assert_eq!(
        resolution.job.default_network[&NetworkDefault::Gateway],
        "vip"
    );
}
