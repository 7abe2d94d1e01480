//! Lookup index over a [`Catalog`] used during resolution.

use std::collections::HashMap;

use crate::catalog::*;

/// How a name lookup against the repository concluded.
#[derive(Debug, Clone)]
pub(crate) enum Selection {
	/// The best applicable candidate.
	Found(Resource),
	/// Nothing in the catalog provides the name at all.
	NoCandidates,
	/// Candidates exist but none applies to the products being resolved for.
	NotApplicable {
		/// The applies-to filter text and the candidate it rejected.
		rejections: Vec<(String, Resource)>,
		products: Vec<ProductRequirement>,
	},
}

pub(crate) struct ResolverRepository<'db> {
	catalog: &'db Catalog,
	features_by_symbolic: HashMap<&'db str, Vec<usize>>,
	features_by_short: HashMap<String, Vec<usize>>,
	samples_by_short: HashMap<String, Vec<usize>>,
}

impl<'db> ResolverRepository<'db> {
	pub fn new(catalog: &'db Catalog) -> Self {
		let mut features_by_symbolic = HashMap::<&str, Vec<usize>>::new();
		let mut features_by_short = HashMap::<String, Vec<usize>>::new();
		for (i, feature) in catalog.features.iter().enumerate() {
			features_by_symbolic.entry(&feature.symbolic_name).or_default().push(i);
			if let Some(short) = &feature.short_name {
				features_by_short.entry(short.to_lowercase()).or_default().push(i);
			}
		}
		let mut samples_by_short = HashMap::<String, Vec<usize>>::new();
		for (i, sample) in catalog.samples.iter().enumerate() {
			samples_by_short.entry(sample.short_name.to_lowercase()).or_default().push(i);
		}
		ResolverRepository { catalog, features_by_symbolic, features_by_short, samples_by_short }
	}

	/// Looks a name up and selects the best applicable candidate.
	///
	/// A `name/version` query pins the exact resource version. Features match by
	/// exact symbolic name or case insensitive short name, samples by case
	/// insensitive short name. Among applicable candidates the highest version
	/// wins, ties broken towards the more specific applies-to version range.
	pub fn select(&self, name: &str, products: &[ProductDefinition]) -> crate::Result<Selection> {
		let (name, pinned) = match name.split_once('/') {
			Some((n, v)) => (n, Some(Version::new(v)?)),
			None => (name, None),
		};

		let mut candidates: Vec<Resource> = Vec::new();
		if let Some(indices) = self.features_by_symbolic.get(name) {
			candidates.extend(indices.iter().map(|i| Resource::Feature(self.catalog.features[*i].clone())));
		}
		if candidates.is_empty() {
			if let Some(indices) = self.features_by_short.get(&name.to_lowercase()) {
				candidates.extend(indices.iter().map(|i| Resource::Feature(self.catalog.features[*i].clone())));
			}
		}
		if candidates.is_empty() {
			if let Some(indices) = self.samples_by_short.get(&name.to_lowercase()) {
				candidates.extend(indices.iter().map(|i| Resource::Sample(self.catalog.samples[*i].clone())));
			}
		}
		if let Some(pin) = &pinned {
			candidates.retain(|c| matches!(c, Resource::Feature(f) if f.version.as_ref() == Some(pin)));
		}
		if candidates.is_empty() {
			return Ok(Selection::NoCandidates);
		}

		let mut applicable: Vec<(Resource, Option<Applicability>)> = Vec::new();
		let mut rejections = Vec::new();
		let mut missing_products = Vec::new();
		for candidate in candidates {
			match candidate.applies_to() {
				Some(filter) => {
					let applicability = Applicability::new(filter)?;
					if applicability.matches(products) {
						applicable.push((candidate, Some(applicability)));
					} else {
						log::trace!("candidate for {} rejected by product filter: {}", name, filter);
						missing_products.push(applicability.product_requirement());
						rejections.push((filter.to_string(), candidate));
					}
				},
				None => applicable.push((candidate, None)),
			}
		}
		if applicable.is_empty() {
			return Ok(Selection::NotApplicable { rejections, products: missing_products });
		}

		let mut best: Option<(Resource, (Option<Version>, u8))> = None;
		for (candidate, applicability) in applicable {
			let rank = (resource_version(&candidate), specificity(applicability.as_ref()));
			match &best {
				Some((_, best_rank)) if rank <= *best_rank => {},
				_ => best = Some((candidate, rank)),
			}
		}
		let (winner, _) = best.expect("applicable candidates are never empty here");
		log::debug!("selected {} for {}", winner.key(), name);
		Ok(Selection::Found(winner))
	}

	/// Finds a fix resource delivering `fix_id` which applies to the given products.
	pub fn select_fix(&self, fix_id: &str, products: &[ProductDefinition]) -> crate::Result<Option<FixResource>> {
		for fix in &self.catalog.fixes {
			if !fix.provide_fix.iter().any(|id| id == fix_id) {
				continue;
			}
			if let Some(filter) = &fix.applies_to {
				if !Applicability::new(filter)?.matches(products) {
					continue;
				}
			}
			return Ok(Some(fix.clone()));
		}
		Ok(None)
	}

	/// Every feature which may install itself once its capability is satisfied.
	pub fn auto_features(&self) -> impl Iterator<Item = &'db FeatureResource> {
		self.catalog.features.iter()
			.filter(|f| f.install_policy == InstallPolicy::WhenSatisfied && f.provision_capability.is_some())
	}
}

fn resource_version(resource: &Resource) -> Option<Version> {
	match resource {
		Resource::Feature(f) => f.version.clone(),
		_ => None,
	}
}

fn specificity(applicability: Option<&Applicability>) -> u8 {
	match applicability {
		None => 0,
		Some(a) => match a.version {
			VersionRange::Exact(_) => 3,
			VersionRange::MinMax(_, _) => 2,
			VersionRange::MinOnly(_) => 1,
			VersionRange::Any => 0,
		},
	}
}
