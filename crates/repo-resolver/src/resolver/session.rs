//! A single resolution pass over the repository.

use std::collections::{HashMap, HashSet};

use petgraph::prelude::*;

use super::failure::MissingRequirement;
use super::graph::DependencyGraph;
use crate::catalog::*;
use crate::repository::{ResolverRepository, Selection};

/// Why a branch of the expansion could not be completed.
#[derive(Debug, Default, Clone)]
pub(super) struct ExpansionFailure {
	pub requirements: Vec<MissingRequirement>,
	pub missing_products: Vec<ProductRequirement>,
}

impl ExpansionFailure {
	fn merge(&mut self, other: ExpansionFailure) {
		self.requirements.extend(other.requirements);
		self.missing_products.extend(other.missing_products);
	}

	fn is_empty(&self) -> bool {
		self.requirements.is_empty()
	}
}

pub(super) enum RootOutcome {
	/// The requested name is already installed; nothing to do, not an error.
	AlreadyInstalled,
	Resolved(Vec<Resource>),
	Failed(ExpansionFailure),
}

enum Expanded {
	Node(NodeIndex),
	Failed(ExpansionFailure),
}

enum RequirementOutcome {
	/// The dependency nodes fulfilling the requirement; empty when it is
	/// satisfied by something already installed.
	Satisfied(Vec<NodeIndex>),
	Failed(ExpansionFailure),
}

/// Holds the shared graph and selections while a set of requested names is
/// expanded. Selections are shared: a name resolves to the same resource in
/// every list produced by the session.
pub(super) struct Session<'a> {
	repository: &'a ResolverRepository<'a>,
	products: &'a [ProductDefinition],
	installed_features: &'a [InstalledFeature],
	installed_fixes: &'a [String],
	installed_symbolics: HashSet<String>,
	graph: DependencyGraph,
	roots: HashSet<NodeIndex>,
	attempted_autos: HashSet<String>,
	failed: HashMap<String, ExpansionFailure>,
}

impl<'a> Session<'a> {
	pub fn new(
		repository: &'a ResolverRepository<'a>,
		products: &'a [ProductDefinition],
		installed_features: &'a [InstalledFeature],
		installed_fixes: &'a [String],
	) -> Self {
		Session {
			repository,
			products,
			installed_features,
			installed_fixes,
			installed_symbolics: installed_features.iter().map(|f| f.symbolic_name.clone()).collect(),
			graph: DependencyGraph::new(),
			roots: HashSet::new(),
			attempted_autos: HashSet::new(),
			failed: HashMap::new(),
		}
	}

	/// Resolves one requested name into its install list.
	pub fn resolve_root(&mut self, name: &str) -> crate::Result<RootOutcome> {
		if self.find_installed(name)?.is_some() {
			log::debug!("{} is already installed, nothing to resolve", name);
			return Ok(RootOutcome::AlreadyInstalled);
		}
		match self.expand_name(name, None)? {
			Expanded::Node(idx) => {
				self.roots.insert(idx);
				Ok(RootOutcome::Resolved(self.graph.install_list(idx)))
			},
			Expanded::Failed(failure) => Ok(RootOutcome::Failed(failure)),
		}
	}

	/// Iterates to a fixpoint over the catalog's auto features, expanding each
	/// one whose capability is satisfied by what this session resolves plus
	/// what is already installed. Returns one extra install list per feature
	/// that triggered.
	pub fn discover_auto_features(&mut self) -> crate::Result<Vec<Vec<Resource>>> {
		let candidates: Vec<FeatureResource> = self.repository.auto_features().cloned().collect();
		/* A failed branch can leave nodes behind which no root reaches; only
		 * resources a root actually installs may satisfy a capability. */
		self.graph.retain_reachable(&self.roots);
		let mut lists = Vec::new();
		loop {
			let mut changed = false;
			for auto in &candidates {
				if self.installed_symbolics.contains(&auto.symbolic_name) {
					continue;
				}
				if let Some(idx) = self.graph.get(&auto.symbolic_name) {
					if self.roots.contains(&idx) {
						continue;
					}
				}
				let expression = match &auto.provision_capability {
					Some(raw) => CapabilityExpression::new(raw)?,
					None => continue,
				};
				let satisfied = expression
					.is_satisfied(|name| self.graph.contains(name) || self.installed_symbolics.contains(name));
				if !satisfied || !self.attempted_autos.insert(auto.symbolic_name.clone()) {
					continue;
				}
				match self.expand_resource(Resource::Feature(auto.clone()))? {
					Expanded::Node(idx) => {
						log::debug!("auto feature {} is satisfied, adding an install list for it", auto.symbolic_name);
						self.roots.insert(idx);
						lists.push(self.graph.install_list(idx));
						changed = true;
					},
					Expanded::Failed(_) => {
						/* Capability satisfied but its own requirements are not. */
						log::warn!("auto feature {} is satisfied but cannot be expanded, skipping it", auto.symbolic_name);
						self.graph.retain_reachable(&self.roots);
					},
				}
			}
			if !changed {
				break;
			}
		}
		Ok(lists)
	}

	fn expand_name(&mut self, name: &str, owner: Option<&Resource>) -> crate::Result<Expanded> {
		match self.repository.select(name, self.products)? {
			Selection::Found(resource) => self.expand_resource(resource),
			Selection::NoCandidates => Ok(Expanded::Failed(ExpansionFailure {
				requirements: vec![MissingRequirement::new(name, owner.cloned())],
				missing_products: Vec::new(),
			})),
			Selection::NotApplicable { rejections, products } => Ok(Expanded::Failed(ExpansionFailure {
				/* Reported under the rejected candidate's applies-to text. */
				requirements: rejections.into_iter()
					.map(|(filter, candidate)| MissingRequirement::new(filter, Some(candidate)))
					.collect(),
				missing_products: products,
			})),
		}
	}

	fn expand_resource(&mut self, resource: Resource) -> crate::Result<Expanded> {
		let key = resource.key();
		if let Some(failure) = self.failed.get(&key) {
			return Ok(Expanded::Failed(failure.clone()));
		}
		if let Some(idx) = self.graph.get(&key) {
			return Ok(Expanded::Node(idx));
		}

		/* The node goes in before its requirements are walked so a cycle back
		 * to it reuses the node instead of recursing forever. */
		let idx = self.graph.add(key.clone(), resource.clone());

		let mut failure = ExpansionFailure::default();
		match &resource {
			Resource::Feature(feature) => {
				for requirement in &feature.require_feature {
					match self.expand_feature_requirement(requirement, &resource)? {
						RequirementOutcome::Satisfied(nodes) => {
							for node in nodes {
								self.graph.add_dependency(idx, node);
							}
						},
						RequirementOutcome::Failed(f) => {
							failure = f;
							break;
						},
					}
				}
				/* Capability names are install requirements too once the
				 * feature itself is being installed. */
				if failure.is_empty() {
					if let Some(raw) = &feature.provision_capability {
						let expression = CapabilityExpression::new(raw)?;
						for group in expression.requirement_groups() {
							match self.expand_capability_group(group, &resource)? {
								RequirementOutcome::Satisfied(nodes) => {
									for node in nodes {
										self.graph.add_dependency(idx, node);
									}
								},
								RequirementOutcome::Failed(f) => {
									failure = f;
									break;
								},
							}
						}
					}
				}
				if failure.is_empty() {
					for fix_id in &feature.require_fix {
						match self.expand_fix_requirement(fix_id, &resource)? {
							RequirementOutcome::Satisfied(nodes) => {
								for node in nodes {
									self.graph.add_dependency(idx, node);
								}
							},
							RequirementOutcome::Failed(f) => {
								failure = f;
								break;
							},
						}
					}
				}
			},
			Resource::Sample(sample) => {
				for name in &sample.require_feature {
					let requirement = FeatureRequirement::new(name.clone());
					match self.expand_feature_requirement(&requirement, &resource)? {
						RequirementOutcome::Satisfied(nodes) => {
							for node in nodes {
								self.graph.add_dependency(idx, node);
							}
						},
						RequirementOutcome::Failed(f) => {
							failure = f;
							break;
						},
					}
				}
			},
			Resource::Fix(_) => {},
		}

		if failure.is_empty() {
			Ok(Expanded::Node(idx))
		} else {
			self.graph.remove(&key);
			self.failed.insert(key, failure.clone());
			Ok(Expanded::Failed(failure))
		}
	}

	fn expand_feature_requirement(
		&mut self,
		requirement: &FeatureRequirement,
		owner: &Resource,
	) -> crate::Result<RequirementOutcome> {
		let names = requirement.acceptable_names();
		/* Anything already installed satisfies the requirement outright and is
		 * preferred over every repository candidate. */
		if names.iter().any(|n| self.installed_symbolics.contains(n)) {
			return Ok(RequirementOutcome::Satisfied(Vec::new()));
		}

		let mut failure = ExpansionFailure::default();
		match self.expand_name(&names[0], Some(owner))? {
			Expanded::Node(idx) => return Ok(RequirementOutcome::Satisfied(vec![idx])),
			Expanded::Failed(f) => failure.merge(f),
		}

		/* The declared name is unavailable: every tolerated version that does
		 * resolve becomes a dependency. */
		let mut nodes = Vec::new();
		for name in &names[1..] {
			match self.expand_name(name, Some(owner))? {
				Expanded::Node(idx) => nodes.push(idx),
				Expanded::Failed(f) => failure.merge(f),
			}
		}
		if nodes.is_empty() {
			Ok(RequirementOutcome::Failed(failure))
		} else {
			Ok(RequirementOutcome::Satisfied(nodes))
		}
	}

	fn expand_capability_group(
		&mut self,
		alternatives: &[String],
		owner: &Resource,
	) -> crate::Result<RequirementOutcome> {
		for name in alternatives {
			if self.installed_symbolics.contains(name) {
				return Ok(RequirementOutcome::Satisfied(Vec::new()));
			}
		}
		/* Prefer whatever this session is installing already. */
		for name in alternatives {
			if let Some(idx) = self.graph.get(name) {
				return Ok(RequirementOutcome::Satisfied(vec![idx]));
			}
		}
		let mut failure = ExpansionFailure::default();
		for name in alternatives {
			match self.expand_name(name, Some(owner))? {
				Expanded::Node(idx) => return Ok(RequirementOutcome::Satisfied(vec![idx])),
				Expanded::Failed(f) => failure.merge(f),
			}
		}
		Ok(RequirementOutcome::Failed(failure))
	}

	fn expand_fix_requirement(&mut self, fix_id: &str, owner: &Resource) -> crate::Result<RequirementOutcome> {
		if self.installed_fixes.iter().any(|id| id == fix_id) {
			return Ok(RequirementOutcome::Satisfied(Vec::new()));
		}
		match self.repository.select_fix(fix_id, self.products)? {
			Some(fix) => match self.expand_resource(Resource::Fix(fix))? {
				Expanded::Node(idx) => Ok(RequirementOutcome::Satisfied(vec![idx])),
				Expanded::Failed(f) => Ok(RequirementOutcome::Failed(f)),
			},
			None => Ok(RequirementOutcome::Failed(ExpansionFailure {
				requirements: vec![MissingRequirement::new(fix_id, Some(owner.clone()))],
				missing_products: Vec::new(),
			})),
		}
	}

	/// Matches a requested name against the installed features, honouring an
	/// optional `/version` pin and case insensitive short names.
	fn find_installed(&self, name: &str) -> crate::Result<Option<&InstalledFeature>> {
		let (name, pinned) = match name.split_once('/') {
			Some((n, v)) => (n, Some(Version::new(v)?)),
			None => (name, None),
		};
		Ok(self.installed_features.iter().find(|f| {
			let name_matches = f.symbolic_name == name
				|| f.short_name.as_deref().map_or(false, |s| s.eq_ignore_ascii_case(name));
			let version_matches = match (&pinned, &f.version) {
				(Some(pin), Some(version)) => pin == version,
				(Some(_), None) => false,
				(None, _) => true,
			};
			name_matches && version_matches
		}))
	}
}
