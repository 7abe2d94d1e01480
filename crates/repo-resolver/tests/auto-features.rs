//! Discovery and installation of auto features.

use repo_resolver::{Error, RepositoryResolver};
use repo_resolver::catalog::*;
use repo_resolver_test_utils::*;

fn resolver(catalog: &Catalog) -> RepositoryResolver<'_> {
	RepositoryResolver::new(Vec::new(), Vec::new(), Vec::new(), catalog)
}

#[test]
fn unsatisfied_capability_is_not_installed() {
	init_logging();
	let mut catalog = Catalog::new();
	catalog.add_feature(feature("com.example.main-1.0").build());
	catalog.add_feature(feature("com.example.auto-1.0")
		.capability_on(&["com.example.other-1.0"])
		.when_satisfied()
		.build());

	let lists = resolver(&catalog).resolve_single("com.example.main-1.0").unwrap();
	assert_eq!(lists.len(), 1);
	assert_eq!(resource_names(&lists[0]), vec!["com.example.main-1.0"]);
}

#[test]
fn satisfied_by_a_newly_resolved_feature() {
	let mut catalog = Catalog::new();
	catalog.add_feature(feature("com.example.main-1.0").build());
	catalog.add_feature(feature("com.example.auto-1.0")
		.capability_on(&["com.example.main-1.0"])
		.when_satisfied()
		.build());

	let lists = resolver(&catalog).resolve_single("com.example.main-1.0").unwrap();
	assert_eq!(lists.len(), 2);
	assert_eq!(resource_names(&lists[0]), vec!["com.example.main-1.0"]);
	assert_eq!(resource_names(&lists[1]), vec!["com.example.main-1.0", "com.example.auto-1.0"]);
}

#[test]
fn satisfied_through_an_or_group() {
	let mut catalog = Catalog::new();
	catalog.add_feature(feature("com.example.main-1.0").build());
	let expression = any_of_capability_filter(&["com.example.main-1.0", "com.example.absent-1.0"]);
	catalog.add_feature(feature("com.example.auto-1.0")
		.provision_capability(&expression)
		.when_satisfied()
		.build());

	let lists = resolver(&catalog).resolve_single("com.example.main-1.0").unwrap();
	assert_eq!(lists.len(), 2);
	assert_eq!(resource_names(&lists[1]), vec!["com.example.main-1.0", "com.example.auto-1.0"]);
}

#[test]
fn chained_auto_features_reach_a_fixpoint() {
	let mut catalog = Catalog::new();
	catalog.add_feature(feature("com.example.main-1.0").build());
	catalog.add_feature(feature("com.example.auto1-1.0")
		.capability_on(&["com.example.main-1.0"])
		.when_satisfied()
		.build());
	catalog.add_feature(feature("com.example.auto2-1.0")
		.capability_on(&["com.example.main-1.0", "com.example.auto1-1.0"])
		.when_satisfied()
		.build());

	let lists = resolver(&catalog).resolve_single("com.example.main-1.0").unwrap();
	assert_eq!(lists.len(), 3);
	assert_eq!(resource_names(&lists[1]), vec!["com.example.main-1.0", "com.example.auto1-1.0"]);
	assert_eq!(resource_names(&lists[2]), vec!["com.example.main-1.0", "com.example.auto1-1.0", "com.example.auto2-1.0"]);
}

#[test]
fn capability_is_never_satisfied_from_the_repository_alone() {
	let mut catalog = Catalog::new();
	catalog.add_feature(feature("com.example.main-1.0").build());
	/* The capability target exists in the repository but nothing installs it. */
	catalog.add_feature(feature("com.example.other-1.0").build());
	catalog.add_feature(feature("com.example.auto-1.0")
		.capability_on(&["com.example.other-1.0"])
		.when_satisfied()
		.build());

	let lists = resolver(&catalog).resolve_single("com.example.main-1.0").unwrap();
	assert_eq!(lists.len(), 1);
}

#[test]
fn subsystem_content_installs_with_the_auto_feature() {
	let mut catalog = Catalog::new();
	catalog.add_feature(feature("com.example.main-1.0").build());
	catalog.add_feature(feature("com.example.dependent-1.0").build());
	catalog.add_feature(feature("com.example.auto-1.0")
		.require_feature("com.example.dependent-1.0")
		.capability_on(&["com.example.main-1.0"])
		.when_satisfied()
		.build());

	let lists = resolver(&catalog).resolve_single("com.example.main-1.0").unwrap();
	assert_eq!(lists.len(), 2);
	let names = resource_names(&lists[1]);
	assert_eq!(names.len(), 3);
	assert_eq!(names[2], "com.example.auto-1.0");
	assert!(names.contains(&"com.example.dependent-1.0".to_string()));
	assert!(names.contains(&"com.example.main-1.0".to_string()));
}

#[test]
fn explicitly_requested_auto_feature_resolves_normally() {
	let mut catalog = Catalog::new();
	catalog.add_feature(feature("com.example.main-1.0").build());
	catalog.add_feature(feature("com.example.auto-1.0")
		.capability_on(&["com.example.main-1.0"])
		.when_satisfied()
		.build());

	let lists = resolver(&catalog).resolve_single("com.example.auto-1.0").unwrap();
	assert_eq!(lists.len(), 1);
	assert_eq!(resource_names(&lists[0]), vec!["com.example.main-1.0", "com.example.auto-1.0"]);
}

#[test]
fn explicitly_requested_auto_feature_with_a_missing_capability_fails() {
	let mut catalog = Catalog::new();
	let auto = feature("com.example.auto-1.0")
		.capability_on(&["com.example.absent-1.0"])
		.when_satisfied()
		.build();
	catalog.add_feature(auto.clone());

	let error = match resolver(&catalog).resolve_single("com.example.auto-1.0") {
		Err(Error::Resolution(e)) => e,
		other => panic!("expected a resolution error, got {:?}", other.map(|l| l.len())),
	};
	assert!(error.top_level_features_not_resolved().contains("com.example.auto-1.0"));
	assert!(error.all_requirements_not_found().contains("com.example.absent-1.0"));
	assert_eq!(error.all_requirements_resources_not_found()[0].owning_resource, Some(Resource::Feature(auto)));
}

#[test]
fn manual_policy_is_never_auto_installed() {
	let mut catalog = Catalog::new();
	catalog.add_feature(feature("com.example.main-1.0").build());
	catalog.add_feature(feature("com.example.auto-1.0")
		.capability_on(&["com.example.main-1.0"])
		.build());

	let lists = resolver(&catalog).resolve_single("com.example.main-1.0").unwrap();
	assert_eq!(lists.len(), 1);
}

#[test]
fn satisfied_by_an_installed_feature() {
	let mut catalog = Catalog::new();
	catalog.add_feature(feature("com.example.other-1.0").build());
	catalog.add_feature(feature("com.example.auto-1.0")
		.capability_on(&["com.example.main-1.0"])
		.when_satisfied()
		.build());

	let mut resolver = RepositoryResolver::new(Vec::new(), vec![installed("com.example.main-1.0")], Vec::new(), &catalog);
	let lists = resolver.resolve_single("com.example.other-1.0").unwrap();
	assert_eq!(lists.len(), 2);
	assert_eq!(resource_names(&lists[1]), vec!["com.example.auto-1.0"]);
}

#[test]
fn already_installed_auto_feature_is_not_reinstalled() {
	let mut catalog = Catalog::new();
	catalog.add_feature(feature("com.example.main-1.0").build());
	catalog.add_feature(feature("com.example.auto-1.0")
		.capability_on(&["com.example.main-1.0"])
		.when_satisfied()
		.build());

	let mut resolver = RepositoryResolver::new(Vec::new(), vec![installed("com.example.auto-1.0")], Vec::new(), &catalog);
	let lists = resolver.resolve_single("com.example.main-1.0").unwrap();
	assert_eq!(lists.len(), 1);
}

#[test]
fn auto_feature_needing_two_new_features() {
	let mut catalog = Catalog::new();
	catalog.add_feature(feature("com.example.one-1.0").build());
	catalog.add_feature(feature("com.example.two-1.0").build());
	catalog.add_feature(feature("com.example.auto-1.0")
		.capability_on(&["com.example.one-1.0", "com.example.two-1.0"])
		.when_satisfied()
		.build());

	let lists = resolver(&catalog).resolve(["com.example.one-1.0", "com.example.two-1.0"]).unwrap();
	assert_eq!(lists.len(), 3);
	assert_eq!(resource_names(&lists[2]), vec!["com.example.one-1.0", "com.example.two-1.0", "com.example.auto-1.0"]);
}

#[test]
fn partially_satisfied_capability_is_skipped() {
	let mut catalog = Catalog::new();
	catalog.add_feature(feature("com.example.main-1.0").build());
	catalog.add_feature(feature("com.example.auto-1.0")
		.capability_on(&["com.example.main-1.0", "com.example.absent-1.0"])
		.when_satisfied()
		.build());

	let lists = resolver(&catalog).resolve_single("com.example.main-1.0").unwrap();
	assert_eq!(lists.len(), 1);
}

#[test]
fn leftovers_of_a_failed_branch_do_not_satisfy_a_capability() {
	let mut catalog = Catalog::new();
	catalog.add_feature(feature("com.example.a-1.0")
		.require_feature_tolerating("com.example.b-1.0", &["1.5"])
		.build());
	/* b-1.0 resolves c before failing on its second requirement, so the
	 * tolerated b-1.5 wins and c must not linger as a selected resource. */
	catalog.add_feature(feature("com.example.b-1.0")
		.require_feature("com.example.c-1.0")
		.require_feature("com.example.missing-1.0")
		.build());
	catalog.add_feature(feature("com.example.b-1.5").build());
	catalog.add_feature(feature("com.example.c-1.0").build());
	catalog.add_feature(feature("com.example.auto-1.0")
		.capability_on(&["com.example.c-1.0"])
		.when_satisfied()
		.build());

	let lists = resolver(&catalog).resolve_single("com.example.a-1.0").unwrap();
	assert_eq!(lists.len(), 1);
	assert_eq!(resource_names(&lists[0]), vec!["com.example.b-1.5", "com.example.a-1.0"]);
}

#[test]
fn circular_relationship_between_a_root_and_an_auto_feature() {
	let mut catalog = Catalog::new();
	catalog.add_feature(feature("com.example.main-1.0")
		.require_feature("com.example.auto-1.0")
		.build());
	catalog.add_feature(feature("com.example.auto-1.0")
		.capability_on(&["com.example.main-1.0"])
		.when_satisfied()
		.build());

	let lists = resolver(&catalog).resolve_single("com.example.main-1.0").unwrap();
	assert_eq!(lists.len(), 2);
	assert_eq!(resource_names(&lists[0]), vec!["com.example.auto-1.0", "com.example.main-1.0"]);
	assert_eq!(resource_names(&lists[1]), vec!["com.example.main-1.0", "com.example.auto-1.0"]);
}
