//! The dependency graph a session builds while expanding requirements.

use std::collections::{HashMap, HashSet};

use petgraph::prelude::*;

use crate::catalog::Resource;

/// Resources selected for install, keyed by [`Resource::key`], with an edge
/// from every resource to each of its install dependencies.
///
/// Installed features never enter the graph; a requirement they satisfy is
/// simply terminal.
pub(super) struct DependencyGraph {
	graph: StableDiGraph<Resource, ()>,
	index: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
	pub fn new() -> Self {
		DependencyGraph { graph: StableDiGraph::default(), index: HashMap::new() }
	}

	pub fn add(&mut self, key: String, resource: Resource) -> NodeIndex {
		let idx = self.graph.add_node(resource);
		self.index.insert(key, idx);
		idx
	}

	pub fn get(&self, key: &str) -> Option<NodeIndex> {
		self.index.get(key).copied()
	}

	pub fn contains(&self, key: &str) -> bool {
		self.index.contains_key(key)
	}

	/// Drops a node whose expansion failed, along with its edges, so no later
	/// walk can reach a resource with unsatisfied requirements.
	pub fn remove(&mut self, key: &str) {
		if let Some(idx) = self.index.remove(key) {
			self.graph.remove_node(idx);
		}
	}

	pub fn add_dependency(&mut self, from: NodeIndex, to: NodeIndex) {
		if !self.graph.contains_edge(from, to) {
			self.graph.add_edge(from, to, ());
		}
	}

	/// Drops every node not reachable from `roots`.
	///
	/// A failed expansion can leave behind dependencies it resolved before the
	/// failure; anything no root reaches must not count as selected.
	pub fn retain_reachable(&mut self, roots: &HashSet<NodeIndex>) {
		let mut reachable = HashSet::new();
		let mut stack: Vec<NodeIndex> = roots.iter().copied().collect();
		while let Some(node) = stack.pop() {
			if !reachable.insert(node) {
				continue;
			}
			stack.extend(self.graph.edges_directed(node, Outgoing).map(|e| e.target()));
		}
		self.index.retain(|_, idx| reachable.contains(&*idx));
		self.graph.retain_nodes(|_, idx| reachable.contains(&idx));
	}

	/// The install order for `root`: dependencies first, `root` itself last.
	///
	/// A depth first post order walk on an explicit stack, so depth is bounded
	/// by the heap rather than the call stack. Marking nodes visited on entry
	/// makes a cyclic edge a no-op, so every member of a cycle is emitted
	/// exactly once and the node the cycle was entered through comes out last.
	pub fn install_list(&self, root: NodeIndex) -> Vec<Resource> {
		let mut list = Vec::new();
		let mut visited = HashSet::new();
		let mut stack = vec![(root, false)];
		while let Some((node, expanded)) = stack.pop() {
			if expanded {
				list.push(self.graph[node].clone());
				continue;
			}
			if !visited.insert(node) {
				continue;
			}
			stack.push((node, true));
			/* Edge iteration order is newest first; pushing in that order pops
			 * the dependencies back out in declaration order. */
			for edge in self.graph.edges_directed(node, Outgoing) {
				stack.push((edge.target(), false));
			}
		}
		list
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::catalog::FeatureResource;

	fn resource(name: &str) -> Resource {
		Resource::Feature(FeatureResource { symbolic_name: name.to_string(), ..Default::default() })
	}

	fn names(list: &[Resource]) -> Vec<&str> {
		list.iter().map(|r| match r {
			Resource::Feature(f) => f.symbolic_name.as_str(),
			_ => unreachable!(),
		}).collect()
	}

	#[test]
	fn dependencies_come_before_dependents() {
		let mut graph = DependencyGraph::new();
		let a = graph.add("a".to_string(), resource("a"));
		let b = graph.add("b".to_string(), resource("b"));
		graph.add_dependency(a, b);
		assert_eq!(names(&graph.install_list(a)), vec!["b", "a"]);
	}

	#[test]
	fn shared_dependency_is_emitted_once() {
		let mut graph = DependencyGraph::new();
		let a = graph.add("a".to_string(), resource("a"));
		let b = graph.add("b".to_string(), resource("b"));
		let c = graph.add("c".to_string(), resource("c"));
		graph.add_dependency(a, b);
		graph.add_dependency(a, c);
		graph.add_dependency(b, c);
		assert_eq!(names(&graph.install_list(a)), vec!["c", "b", "a"]);
	}

	#[test]
	fn a_two_node_cycle_keeps_the_entry_node_last() {
		let mut graph = DependencyGraph::new();
		let a = graph.add("a".to_string(), resource("a"));
		let b = graph.add("b".to_string(), resource("b"));
		graph.add_dependency(a, b);
		graph.add_dependency(b, a);
		assert_eq!(names(&graph.install_list(a)), vec!["b", "a"]);
		assert_eq!(names(&graph.install_list(b)), vec!["a", "b"]);
	}

	#[test]
	fn removal_takes_edges_with_it() {
		let mut graph = DependencyGraph::new();
		let a = graph.add("a".to_string(), resource("a"));
		let b = graph.add("b".to_string(), resource("b"));
		graph.add_dependency(a, b);
		graph.remove("b");
		assert_eq!(names(&graph.install_list(a)), vec!["a"]);
	}

	#[test]
	fn unreachable_nodes_are_pruned() {
		let mut graph = DependencyGraph::new();
		let a = graph.add("a".to_string(), resource("a"));
		let b = graph.add("b".to_string(), resource("b"));
		let c = graph.add("c".to_string(), resource("c"));
		graph.add_dependency(b, c);
		graph.remove("b");
		graph.retain_reachable(&HashSet::from([a]));
		assert!(graph.contains("a"));
		assert!(!graph.contains("c"));
	}

	#[test]
	fn a_deep_chain_does_not_overflow_the_stack() {
		let mut graph = DependencyGraph::new();
		let mut previous = graph.add("n0".to_string(), resource("n0"));
		for i in 1..10_000 {
			let node = graph.add(format!("n{}", i), resource(&format!("n{}", i)));
			graph.add_dependency(previous, node);
			previous = node;
		}
		let list = graph.install_list(graph.get("n0").unwrap());
		assert_eq!(list.len(), 10_000);
		assert_eq!(names(&list)[0], "n9999");
	}
}
