//! The resource data model and the catalog holding it.

use serde::{Serialize, Deserialize};

mod version;
pub use version::Version;
pub use version::VersionRange;

mod applies_to;
pub use applies_to::Applicability;
pub use applies_to::ProductDefinition;
pub use applies_to::ProductRequirement;

mod capability;
pub use capability::CapabilityExpression;

mod import;

/// When a feature may be installed without being asked for by name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstallPolicy {
	#[default]
	Manual,
	/// Installs itself once its provision capability is satisfied.
	WhenSatisfied,
}

/// A dependency on another feature plus the alternate versions the owner tolerates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRequirement {
	pub name: String,
	pub tolerates: Vec<String>,
}

impl FeatureRequirement {
	pub fn new(name: impl Into<String>) -> Self {
		FeatureRequirement { name: name.into(), tolerates: Vec::new() }
	}

	/// Every symbolic name able to satisfy this requirement, the declared name first.
	///
	/// Tolerated versions replace the version suffix of the declared name, so
	/// `b-1.0` tolerating `2.0` also accepts `b-2.0`.
	pub fn acceptable_names(&self) -> Vec<String> {
		let mut names = vec![self.name.clone()];
		let base = match self.name.rsplit_once('-') {
			Some((base, _)) => base,
			None => self.name.as_str(),
		};
		for version in &self.tolerates {
			let name = format!("{}-{}", base, version);
			if !names.contains(&name) {
				names.push(name);
			}
		}
		names
	}
}

/// An installable feature as described by the repository.
///
/// The applies-to and provision capability fields keep their raw text so
/// diagnostics can report them verbatim; they are parsed on use.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureResource {
	pub symbolic_name: String,
	pub short_name: Option<String>,
	pub version: Option<Version>,
	pub require_feature: Vec<FeatureRequirement>,
	pub require_fix: Vec<String>,
	pub applies_to: Option<String>,
	pub provision_capability: Option<String>,
	pub install_policy: InstallPolicy,
}

/// What kind of application a sample is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleKind {
	#[default]
	ProductSample,
	OpenSource,
}

/// A sample application. Samples have no symbolic name and are always looked
/// up by their short name, case insensitively.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleResource {
	pub short_name: String,
	pub kind: SampleKind,
	pub require_feature: Vec<String>,
	pub applies_to: Option<String>,
}

/// An interim fix. A single resource can deliver several fix ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FixResource {
	pub provide_fix: Vec<String>,
	pub applies_to: Option<String>,
}

/// Any resource which can appear in an install list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Resource {
	Feature(FeatureResource),
	Sample(SampleResource),
	Fix(FixResource),
}

impl Resource {
	/// Stable identifier used to key graph nodes and shared selections.
	pub(crate) fn key(&self) -> String {
		match self {
			Resource::Feature(f) => f.symbolic_name.clone(),
			Resource::Sample(s) => format!("sample:{}", s.short_name.to_lowercase()),
			Resource::Fix(f) => format!("fix:{}", f.provide_fix.join(",")),
		}
	}

	pub fn applies_to(&self) -> Option<&str> {
		match self {
			Resource::Feature(f) => f.applies_to.as_deref(),
			Resource::Sample(s) => s.applies_to.as_deref(),
			Resource::Fix(f) => f.applies_to.as_deref(),
		}
	}
}

/// A feature already present in the installation being resolved against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstalledFeature {
	pub symbolic_name: String,
	pub short_name: Option<String>,
	pub version: Option<Version>,
}

impl InstalledFeature {
	pub fn new(symbolic_name: impl Into<String>) -> Self {
		InstalledFeature { symbolic_name: symbolic_name.into(), short_name: None, version: None }
	}
}

/// The full set of resources a resolution can draw from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
	pub features: Vec<FeatureResource>,
	pub samples: Vec<SampleResource>,
	pub fixes: Vec<FixResource>,
}

impl Catalog {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add_feature(&mut self, feature: FeatureResource) {
		self.features.push(feature);
	}

	pub fn add_sample(&mut self, sample: SampleResource) {
		self.samples.push(sample);
	}

	pub fn add_fix(&mut self, fix: FixResource) {
		self.fixes.push(fix);
	}
}
