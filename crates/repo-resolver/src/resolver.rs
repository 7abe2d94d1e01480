//! Resolving requested feature and sample names into ordered install lists.
//!
//! # Usage
//! 1. Build a [`Catalog`](crate::Catalog) of the available resources.
//! 1. Create a [`RepositoryResolver`] with the product definitions, installed
//! features and installed fix ids.
//! 1. Call [`RepositoryResolver::resolve`] with the requested names. On success
//! every requested name not already installed gets a dependency ordered
//! [`InstallList`], followed by one list per auto feature that became
//! satisfied. If any name fails, the whole call fails with a
//! [`ResolutionError`] aggregating every failure.

use std::collections::{BTreeSet, HashMap};

use crate::catalog::*;
use crate::repository::ResolverRepository;

mod graph;
mod session;
use session::{RootOutcome, Session};
mod failure;
pub use failure::MissingRequirement;
pub use failure::ResolutionError;

/// Resources in the order they must be installed, the requested one last.
pub type InstallList = Vec<Resource>;

/// Resolves names against a [`Catalog`](crate::Catalog) handle.
///
/// Results are memoised per requested name set, so repeating a request is
/// cheap and returns an equal result.
pub struct RepositoryResolver<'db> {
	repository: ResolverRepository<'db>,
	products: Vec<ProductDefinition>,
	installed_features: Vec<InstalledFeature>,
	installed_fixes: Vec<String>,
	cache: HashMap<BTreeSet<String>, Vec<InstallList>>,
}

impl<'db> RepositoryResolver<'db> {
	pub fn new(
		products: Vec<ProductDefinition>,
		installed_features: Vec<InstalledFeature>,
		installed_fixes: Vec<String>,
		catalog: &'db Catalog,
	) -> Self {
		RepositoryResolver {
			repository: ResolverRepository::new(catalog),
			products,
			installed_features,
			installed_fixes,
			cache: HashMap::new(),
		}
	}

	/// Convenience form of [`RepositoryResolver::resolve`] for a single name.
	pub fn resolve_single(&mut self, name: impl Into<String>) -> crate::Result<Vec<InstallList>> {
		self.resolve([name.into()])
	}

	pub fn resolve<I, S>(&mut self, names: I) -> crate::Result<Vec<InstallList>>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut requested: Vec<String> = Vec::new();
		for name in names {
			let name = name.into();
			if !requested.contains(&name) {
				requested.push(name);
			}
		}
		let key: BTreeSet<String> = requested.iter().cloned().collect();
		if let Some(lists) = self.cache.get(&key) {
			log::trace!("returning cached resolution for {:?}", key);
			return Ok(lists.clone());
		}

		let mut session = Session::new(&self.repository, &self.products, &self.installed_features, &self.installed_fixes);
		let mut lists = Vec::new();
		let mut top_level = BTreeSet::new();
		let mut requirements: Vec<MissingRequirement> = Vec::new();
		let mut missing_products: Vec<ProductRequirement> = Vec::new();
		for name in &requested {
			match session.resolve_root(name)? {
				RootOutcome::AlreadyInstalled => {},
				RootOutcome::Resolved(list) => lists.push(list),
				RootOutcome::Failed(failure) => {
					top_level.insert(name.clone());
					for requirement in failure.requirements {
						if !requirements.contains(&requirement) {
							requirements.push(requirement);
						}
					}
					for product in failure.missing_products {
						if !missing_products.contains(&product) {
							missing_products.push(product);
						}
					}
				},
			}
		}

		/* All or nothing: one failed name fails the entire request. */
		if !top_level.is_empty() {
			return Err(ResolutionError::new(top_level, requirements, missing_products).into());
		}

		lists.extend(session.discover_auto_features()?);
		self.cache.insert(key, lists.clone());
		Ok(lists)
	}
}
