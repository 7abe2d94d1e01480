//! Helpers for building catalogs and resolver inputs in tests.
//!
//! The builders only set the fields a test cares about; everything else stays
//! at its default.

use repo_resolver::catalog::*;

/// Call at the start of a test to get resolver logging with `RUST_LOG` set.
pub fn init_logging() {
	let _ = env_logger::builder().is_test(true).try_init();
}

pub fn feature(symbolic_name: &str) -> FeatureBuilder {
	FeatureBuilder {
		feature: FeatureResource { symbolic_name: symbolic_name.to_string(), ..Default::default() },
	}
}

pub struct FeatureBuilder {
	feature: FeatureResource,
}

impl FeatureBuilder {
	pub fn short_name(mut self, short_name: &str) -> Self {
		self.feature.short_name = Some(short_name.to_string());
		self
	}

	pub fn version(mut self, version: &str) -> Self {
		self.feature.version = Some(Version::new(version).expect("fixture version must parse"));
		self
	}

	pub fn require_feature(mut self, name: &str) -> Self {
		self.feature.require_feature.push(FeatureRequirement::new(name));
		self
	}

	pub fn require_feature_tolerating(mut self, name: &str, tolerates: &[&str]) -> Self {
		let mut requirement = FeatureRequirement::new(name);
		requirement.tolerates = tolerates.iter().map(|v| v.to_string()).collect();
		self.feature.require_feature.push(requirement);
		self
	}

	pub fn require_fix(mut self, fix_id: &str) -> Self {
		self.feature.require_fix.push(fix_id.to_string());
		self
	}

	pub fn applies_to(mut self, filter: &str) -> Self {
		self.feature.applies_to = Some(filter.to_string());
		self
	}

	pub fn provision_capability(mut self, expression: &str) -> Self {
		self.feature.provision_capability = Some(expression.to_string());
		self
	}

	/// Capability on all of `names`, in the usual subsystem feature form.
	pub fn capability_on(self, names: &[&str]) -> Self {
		let expression = capability_filter(names);
		self.provision_capability(&expression)
	}

	pub fn when_satisfied(mut self) -> Self {
		self.feature.install_policy = InstallPolicy::WhenSatisfied;
		self
	}

	pub fn build(self) -> FeatureResource {
		self.feature
	}
}

pub fn sample(short_name: &str) -> SampleBuilder {
	SampleBuilder {
		sample: SampleResource { short_name: short_name.to_string(), ..Default::default() },
	}
}

pub struct SampleBuilder {
	sample: SampleResource,
}

impl SampleBuilder {
	pub fn open_source(mut self) -> Self {
		self.sample.kind = SampleKind::OpenSource;
		self
	}

	pub fn require_feature(mut self, name: &str) -> Self {
		self.sample.require_feature.push(name.to_string());
		self
	}

	pub fn applies_to(mut self, filter: &str) -> Self {
		self.sample.applies_to = Some(filter.to_string());
		self
	}

	pub fn build(self) -> SampleResource {
		self.sample
	}
}

pub fn fix(provide_fix: &[&str], applies_to: Option<&str>) -> FixResource {
	FixResource {
		provide_fix: provide_fix.iter().map(|id| id.to_string()).collect(),
		applies_to: applies_to.map(str::to_string),
	}
}

pub fn installed(symbolic_name: &str) -> InstalledFeature {
	InstalledFeature::new(symbolic_name)
}

pub fn installed_with(symbolic_name: &str, short_name: Option<&str>, version: Option<&str>) -> InstalledFeature {
	InstalledFeature {
		symbolic_name: symbolic_name.to_string(),
		short_name: short_name.map(str::to_string),
		version: version.map(|v| Version::new(v).expect("fixture version must parse")),
	}
}

pub fn product(id: &str, version: &str, edition: Option<&str>) -> ProductDefinition {
	let mut product = ProductDefinition::new(id, version).expect("fixture version must parse");
	product.edition = edition.map(str::to_string);
	product
}

/// One required capability clause per name.
pub fn capability_filter(names: &[&str]) -> String {
	names.iter()
		.map(|n| format!("osgi.identity; filter:=\"(&(type=osgi.subsystem.feature)(osgi.identity={}))\"", n))
		.collect::<Vec<_>>()
		.join(",")
}

/// A single clause satisfied by any one of `names`.
pub fn any_of_capability_filter(names: &[&str]) -> String {
	let alternatives = names.iter()
		.map(|n| format!("(&(type=osgi.subsystem.feature)(osgi.identity={}))", n))
		.collect::<String>();
	format!("osgi.identity; filter:=\"(|{})\"", alternatives)
}

/// The display names of a resolved list, in order, for compact assertions.
pub fn resource_names(list: &[Resource]) -> Vec<String> {
	list.iter().map(|r| match r {
		Resource::Feature(f) => f.symbolic_name.clone(),
		Resource::Sample(s) => s.short_name.clone(),
		Resource::Fix(f) => f.provide_fix.join(","),
	}).collect()
}
