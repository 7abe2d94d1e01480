//! Parsing and matching of applies-to filters.

use serde::{Serialize, Deserialize};

use super::version::{Version, VersionRange};

/// The runtime a resolution is being performed for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDefinition {
	pub id: String,
	pub version: Version,
	pub edition: Option<String>,
	pub install_type: Option<String>,
	pub license_type: Option<String>,
}

impl ProductDefinition {
	pub fn new(id: &str, version: &str) -> crate::Result<Self> {
		Ok(ProductDefinition {
			id: id.to_string(),
			version: Version::new(version)?,
			edition: None,
			install_type: None,
			license_type: None,
		})
	}
}

/// A product requirement that could not be met, kept for diagnostics.
///
/// Compared by value so identical requirements from different candidates collapse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRequirement {
	pub version_range: VersionRange,
	pub product_id: String,
	pub license_type: Option<String>,
	pub install_type: Option<String>,
	pub editions: Vec<String>,
}

/// A single parsed applies-to filter, e.g.
/// `com.example.runtime; productVersion=8.5.5.2+; productEdition="CORE,BASE"`.
///
/// The first segment is the product id; the remaining semicolon separated
/// attributes are all optional and a field left out matches anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Applicability {
	pub product_id: String,
	pub version: VersionRange,
	pub editions: Vec<String>,
	pub install_type: Option<String>,
	pub license_type: Option<String>,
}

impl Applicability {
	pub fn new(filter: &str) -> crate::Result<Self> {
		let mut parts = filter.split(';');
		let product_id = parts.next()
			.map(str::trim)
			.filter(|s| !s.is_empty())
			.ok_or_else(|| crate::Error::Parse(format!("applies-to filter has no product id: {}", filter)))?
			.to_string();

		let mut version = VersionRange::Any;
		let mut editions = Vec::new();
		let mut install_type = None;
		let mut license_type = None;
		for attribute in parts {
			let (key, value) = attribute.split_once('=')
				.ok_or_else(|| crate::Error::Parse(format!("applies-to attribute is not key=value: {}", attribute)))?;
			let value = value.trim().trim_matches('"');
			match key.trim() {
				"productVersion" => version = VersionRange::new(value)?,
				"productEdition" => editions = value.split(',').map(|e| e.trim().to_string()).collect(),
				"productInstallType" => install_type = Some(value.to_string()),
				"productLicenseType" => license_type = Some(value.to_string()),
				other => return Err(crate::Error::Parse(format!("unknown applies-to attribute: {}", other))),
			}
		}

		Ok(Applicability { product_id, version, editions, install_type, license_type })
	}

	/// Whether any of the given products satisfies every field present in the filter.
	pub fn matches(&self, products: &[ProductDefinition]) -> bool {
		products.iter().any(|p| self.matches_product(p))
	}

	fn matches_product(&self, product: &ProductDefinition) -> bool {
		if product.id != self.product_id {
			return false
		}
		if !self.version.is_version_within(&product.version) {
			return false
		}
		if !self.editions.is_empty() {
			match &product.edition {
				Some(edition) => if !self.editions.iter().any(|e| e == edition) { return false },
				None => return false,
			}
		}
		if let Some(required) = &self.install_type {
			if product.install_type.as_deref() != Some(required.as_str()) {
				return false
			}
		}
		if let Some(required) = &self.license_type {
			if product.license_type.as_deref() != Some(required.as_str()) {
				return false
			}
		}
		true
	}

	/// The product requirement this filter expresses, used to report near misses.
	pub fn product_requirement(&self) -> ProductRequirement {
		ProductRequirement {
			version_range: match &self.version {
				/* Reported as a one version wide range. */
				VersionRange::Exact(v) => VersionRange::MinMax(v.clone(), v.clone()),
				other => other.clone(),
			},
			product_id: self.product_id.clone(),
			license_type: self.license_type.clone(),
			install_type: self.install_type.clone(),
			editions: self.editions.clone(),
		}
	}
}
