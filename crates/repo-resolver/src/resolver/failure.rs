//! Structured reporting of failed resolutions.

use std::collections::BTreeSet;

use crate::catalog::{ProductRequirement, Resource, Version};

/// A requirement which could not be satisfied.
///
/// `owning_resource` is `None` when the requirement was a name passed to the
/// resolver directly. For a candidate rejected by product matching the owner
/// is the rejected candidate itself and the name is its applies-to text.
#[derive(Debug, Clone, PartialEq)]
pub struct MissingRequirement {
	pub requirement_name: String,
	pub owning_resource: Option<Resource>,
}

impl MissingRequirement {
	pub(crate) fn new(requirement_name: impl Into<String>, owning_resource: Option<Resource>) -> Self {
		MissingRequirement { requirement_name: requirement_name.into(), owning_resource }
	}
}

/// Everything that stopped a resolution from completing.
///
/// Aggregates the failures of every requested name; a resolution either
/// produces all of its install lists or fails as a whole with one of these.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionError {
	top_level: BTreeSet<String>,
	requirements: Vec<MissingRequirement>,
	missing_products: Vec<ProductRequirement>,
}

impl ResolutionError {
	pub(crate) fn new(
		top_level: BTreeSet<String>,
		requirements: Vec<MissingRequirement>,
		missing_products: Vec<ProductRequirement>,
	) -> Self {
		ResolutionError { top_level, requirements, missing_products }
	}

	/// The requested names, exactly as passed in, which could not be resolved.
	pub fn top_level_features_not_resolved(&self) -> &BTreeSet<String> {
		&self.top_level
	}

	/// The distinct names of every requirement that could not be found.
	pub fn all_requirements_not_found(&self) -> BTreeSet<&str> {
		self.requirements.iter().map(|r| r.requirement_name.as_str()).collect()
	}

	/// Every missing requirement along with the resource that declared it.
	pub fn all_requirements_resources_not_found(&self) -> &[MissingRequirement] {
		&self.requirements
	}

	/// Product requirements of candidates rejected by product matching.
	pub fn missing_products(&self) -> &[ProductRequirement] {
		&self.missing_products
	}

	/// The lowest range minimum among the missing products, after filtering.
	///
	/// `version` filters to requirements whose minimum shares its
	/// `major.minor.micro` stream; `edition` keeps requirements listing that
	/// edition or listing none.
	pub fn minimum_version_for_missing_product(
		&self,
		product_id: Option<&str>,
		version: Option<&Version>,
		edition: Option<&str>,
	) -> Option<Version> {
		self.filtered_products(product_id, edition)
			.filter_map(|r| r.version_range.minimum().cloned())
			.filter(|min| version.map_or(true, |v| v.same_stream(min)))
			.min()
	}

	/// The highest range maximum among the missing products, after filtering.
	///
	/// Unbounded ranges contribute no maximum.
	pub fn maximum_version_for_missing_product(
		&self,
		product_id: Option<&str>,
		version: Option<&Version>,
		edition: Option<&str>,
	) -> Option<Version> {
		self.filtered_products(product_id, edition)
			.filter_map(|r| r.version_range.maximum().cloned())
			.filter(|max| version.map_or(true, |v| v.same_stream(max)))
			.max()
	}

	fn filtered_products<'a>(
		&'a self,
		product_id: Option<&'a str>,
		edition: Option<&'a str>,
	) -> impl Iterator<Item = &'a ProductRequirement> {
		self.missing_products.iter()
			.filter(move |r| product_id.map_or(true, |id| r.product_id == id))
			.filter(move |r| edition.map_or(true, |e| r.editions.is_empty() || r.editions.iter().any(|x| x == e)))
	}
}

impl std::fmt::Display for ResolutionError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "could not resolve: [")?;
		for (i, name) in self.top_level.iter().enumerate() {
			if i > 0 {
				write!(f, ", ")?;
			}
			write!(f, "resource={}", name)?;
		}
		write!(f, "], missing requirements: [")?;
		for (i, requirement) in self.requirements.iter().enumerate() {
			if i > 0 {
				write!(f, ", ")?;
			}
			write!(f, "{}", requirement.requirement_name)?;
		}
		write!(f, "]")
	}
}

impl std::error::Error for ResolutionError {}

#[cfg(test)]
mod test {
	use super::*;
	use crate::catalog::VersionRange;

	fn requirement(range: &str, product_id: &str, editions: &[&str]) -> ProductRequirement {
		ProductRequirement {
			version_range: VersionRange::new(range).unwrap(),
			product_id: product_id.to_string(),
			license_type: None,
			install_type: None,
			editions: editions.iter().map(|e| e.to_string()).collect(),
		}
	}

	fn error() -> ResolutionError {
		ResolutionError::new(
			BTreeSet::from(["com.example.a-1.0".to_string()]),
			vec![MissingRequirement::new("com.example.a-1.0", None)],
			vec![
				requirement("[8.5.5.3, 8.5.5.3]", "com.example.runtime", &["BASE"]),
				requirement("[8.5.5.10, 8.5.5.10]", "com.example.runtime", &["ND"]),
				requirement("[9.0.0.2, 9.0.0.2]", "com.example.runtime", &["ND"]),
			],
		)
	}

	#[test]
	fn message_names_each_unresolved_resource() {
		assert!(error().to_string().contains("resource=com.example.a-1.0"));
	}

	#[test]
	fn minimum_over_all_products() {
		assert_eq!(error().minimum_version_for_missing_product(None, None, None), Some(Version::new("8.5.5.3").unwrap()));
	}

	#[test]
	fn maximum_over_all_products() {
		assert_eq!(error().maximum_version_for_missing_product(Some("com.example.runtime"), None, None), Some(Version::new("9.0.0.2").unwrap()));
	}

	#[test]
	fn version_filter_restricts_to_the_stream() {
		let version = Version::new("8.5.5.0").unwrap();
		assert_eq!(error().minimum_version_for_missing_product(None, Some(&version), None), Some(Version::new("8.5.5.3").unwrap()));
		assert_eq!(error().maximum_version_for_missing_product(None, Some(&version), None), Some(Version::new("8.5.5.10").unwrap()));
	}

	#[test]
	fn edition_filter_excludes_other_editions() {
		assert_eq!(error().minimum_version_for_missing_product(None, None, Some("ND")), Some(Version::new("8.5.5.10").unwrap()));
	}

	#[test]
	fn wrong_product_id_yields_nothing() {
		assert_eq!(error().minimum_version_for_missing_product(Some("com.example.other"), None, None), None);
	}
}
