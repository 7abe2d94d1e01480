//! Reading a catalog from the repository JSON document.
//!
//! The on-disk document uses camelCase keys and a few shorthands (a
//! `requireFeature` entry may be a bare string) so it does not line up with
//! the derived serde shape of the model types. Use
//! [`Catalog::read_from_json`] instead of deserializing directly.

use super::*;

impl FeatureRequirement {
	pub fn from_json(v: &serde_json::Value) -> crate::Result<Self> {
		use crate::Error::Parse;

		if let Some(name) = v.as_str() {
			return Ok(FeatureRequirement::new(name));
		}
		let obj = v.as_object().ok_or_else(|| Parse("requireFeature entry must be a string or an object".to_string()))?;
		let mut requirement = FeatureRequirement::new(
			obj.get("name")
				.and_then(|n| n.as_str())
				.ok_or_else(|| Parse("requireFeature entry has no name".to_string()))?
		);
		if let Some(tolerates) = obj.get("tolerates") {
			requirement.tolerates = string_array(tolerates, "tolerates")?;
		}
		Ok(requirement)
	}
}

impl FeatureResource {
	pub fn from_json(v: &serde_json::Value) -> crate::Result<Self> {
		use crate::Error::Parse;

		let obj = v.as_object().ok_or_else(|| Parse("feature must be an object".to_string()))?;
		Ok(FeatureResource {
			symbolic_name: obj.get("symbolicName")
				.and_then(|s| s.as_str())
				.ok_or_else(|| Parse("feature has no symbolicName".to_string()))?
				.to_string(),
			short_name: optional_string(obj, "shortName"),
			version: match optional_string(obj, "version") {
				Some(s) => Some(Version::new(&s)?),
				None => None,
			},
			require_feature: {
				let mut requirements = Vec::new();
				if let Some(arr) = obj.get("requireFeature") {
					for elem in arr.as_array().ok_or_else(|| Parse("requireFeature must be an array".to_string()))? {
						requirements.push(FeatureRequirement::from_json(elem)?);
					}
				}
				requirements
			},
			require_fix: match obj.get("requireFix") {
				Some(v) => string_array(v, "requireFix")?,
				None => Vec::new(),
			},
			applies_to: optional_string(obj, "appliesTo"),
			provision_capability: optional_string(obj, "provisionCapability"),
			install_policy: match optional_string(obj, "installPolicy").as_deref() {
				Some("WHEN_SATISFIED") => InstallPolicy::WhenSatisfied,
				Some("MANUAL") | None => InstallPolicy::Manual,
				Some(other) => return Err(Parse(format!("unknown installPolicy: {}", other))),
			},
		})
	}
}

impl SampleResource {
	pub fn from_json(v: &serde_json::Value) -> crate::Result<Self> {
		use crate::Error::Parse;

		let obj = v.as_object().ok_or_else(|| Parse("sample must be an object".to_string()))?;
		Ok(SampleResource {
			short_name: obj.get("shortName")
				.and_then(|s| s.as_str())
				.ok_or_else(|| Parse("sample has no shortName".to_string()))?
				.to_string(),
			kind: match optional_string(obj, "type").as_deref() {
				Some("OPENSOURCE") => SampleKind::OpenSource,
				Some("PRODUCTSAMPLE") | None => SampleKind::ProductSample,
				Some(other) => return Err(Parse(format!("unknown sample type: {}", other))),
			},
			require_feature: match obj.get("requireFeature") {
				Some(v) => string_array(v, "requireFeature")?,
				None => Vec::new(),
			},
			applies_to: optional_string(obj, "appliesTo"),
		})
	}
}

impl FixResource {
	pub fn from_json(v: &serde_json::Value) -> crate::Result<Self> {
		use crate::Error::Parse;

		let obj = v.as_object().ok_or_else(|| Parse("fix must be an object".to_string()))?;
		Ok(FixResource {
			provide_fix: string_array(
				obj.get("provideFix").ok_or_else(|| Parse("fix has no provideFix".to_string()))?,
				"provideFix",
			)?,
			applies_to: optional_string(obj, "appliesTo"),
		})
	}
}

impl Catalog {
	pub fn read_from_json(v: &serde_json::Value) -> crate::Result<Self> {
		use crate::Error::Parse;

		let obj = v.as_object().ok_or_else(|| Parse("catalog document is not an object".to_string()))?;
		let mut catalog = Catalog::new();
		if let Some(arr) = obj.get("features") {
			for elem in arr.as_array().ok_or_else(|| Parse("features must be an array".to_string()))? {
				catalog.add_feature(FeatureResource::from_json(elem)?);
			}
		}
		if let Some(arr) = obj.get("samples") {
			for elem in arr.as_array().ok_or_else(|| Parse("samples must be an array".to_string()))? {
				catalog.add_sample(SampleResource::from_json(elem)?);
			}
		}
		if let Some(arr) = obj.get("fixes") {
			for elem in arr.as_array().ok_or_else(|| Parse("fixes must be an array".to_string()))? {
				catalog.add_fix(FixResource::from_json(elem)?);
			}
		}
		Ok(catalog)
	}

	pub fn from_json_str(document: &str) -> crate::Result<Self> {
		Self::read_from_json(&serde_json::from_str(document)?)
	}
}

fn optional_string(obj: &serde_json::Map<String, serde_json::Value>, key: &str) -> Option<String> {
	obj.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

fn string_array(v: &serde_json::Value, key: &str) -> crate::Result<Vec<String>> {
	use crate::Error::Parse;

	let arr = v.as_array().ok_or_else(|| Parse(format!("{} must be an array", key)))?;
	arr.iter()
		.map(|e| e.as_str().map(str::to_string).ok_or_else(|| Parse(format!("{} elements must be strings", key))))
		.collect()
}
