//! Parsing of provision capability expressions.
//!
//! Auto features carry an expression naming the features which must already be
//! present before they install themselves, e.g.
//!
//! `osgi.identity; filter:="(&(type=osgi.subsystem.feature)(osgi.identity=com.example.a-1.0))"`
//!
//! Clauses are comma separated and all required. The filter inside a clause is
//! a small LDAP style expression of `(&...)`, `(|...)` and `(key=value)` atoms;
//! `type` atoms are structural, `osgi.identity` atoms name features and an
//! `(|...)` group offers alternatives.

use serde::{Serialize, Deserialize};

/// A parsed capability expression reduced to its requirement groups.
///
/// Every group must be satisfied; a group is satisfied when any one of its
/// alternative feature names is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityExpression {
	groups: Vec<Vec<String>>,
}

impl CapabilityExpression {
	pub fn new(expression: &str) -> crate::Result<Self> {
		let mut groups = Vec::new();
		for clause in split_clauses(expression) {
			parse_clause(clause, &mut groups)?;
		}
		Ok(CapabilityExpression { groups })
	}

	pub fn requirement_groups(&self) -> &[Vec<String>] {
		&self.groups
	}

	pub fn is_satisfied(&self, present: impl Fn(&str) -> bool) -> bool {
		self.groups.iter().all(|group| group.iter().any(|name| present(name)))
	}
}

/* Clauses are separated by commas outside of quoted filter values. */
fn split_clauses(expression: &str) -> Vec<&str> {
	let mut clauses = Vec::new();
	let mut in_quotes = false;
	let mut start = 0;
	for (i, c) in expression.char_indices() {
		match c {
			'"' => in_quotes = !in_quotes,
			',' if !in_quotes => {
				clauses.push(&expression[start..i]);
				start = i + 1;
			},
			_ => {},
		}
	}
	clauses.push(&expression[start..]);
	clauses
}

fn parse_clause(clause: &str, groups: &mut Vec<Vec<String>>) -> crate::Result<()> {
	use crate::Error::Parse;

	let mut parts = clause.split(';');
	let namespace = parts.next().map(str::trim).unwrap_or_default();
	if namespace != "osgi.identity" {
		return Err(Parse(format!("unsupported capability namespace: {}", namespace)));
	}

	let mut filter = None;
	for attribute in parts {
		if let Some(value) = attribute.trim().strip_prefix("filter:=") {
			filter = Some(value.trim().trim_matches('"'));
		}
	}
	let filter = filter.ok_or_else(|| Parse(format!("capability clause has no filter: {}", clause)))?;

	let mut parser = FilterParser { input: filter.as_bytes(), pos: 0 };
	let node = parser.parse_node()?;
	parser.skip_whitespace();
	if parser.pos != parser.input.len() {
		return Err(Parse(format!("trailing content in capability filter: {}", filter)));
	}

	collect_groups(&node, groups);
	Ok(())
}

enum FilterNode {
	And(Vec<FilterNode>),
	Or(Vec<FilterNode>),
	Attribute(String, String),
}

/* Under an `and` every identity is its own group; under an `or` every identity
 * beneath it is an alternative within one group. */
fn collect_groups(node: &FilterNode, groups: &mut Vec<Vec<String>>) {
	match node {
		FilterNode::And(children) => for c in children { collect_groups(c, groups) },
		FilterNode::Or(children) => {
			let mut alternatives = Vec::new();
			for c in children {
				collect_identities(c, &mut alternatives);
			}
			if !alternatives.is_empty() {
				groups.push(alternatives);
			}
		},
		FilterNode::Attribute(key, value) => if key == "osgi.identity" {
			groups.push(vec![value.clone()]);
		},
	}
}

fn collect_identities(node: &FilterNode, out: &mut Vec<String>) {
	match node {
		FilterNode::And(children) | FilterNode::Or(children) => for c in children { collect_identities(c, out) },
		FilterNode::Attribute(key, value) => if key == "osgi.identity" {
			out.push(value.clone());
		},
	}
}

struct FilterParser<'a> {
	input: &'a [u8],
	pos: usize,
}

impl<'a> FilterParser<'a> {
	fn skip_whitespace(&mut self) {
		while self.pos < self.input.len() && self.input[self.pos].is_ascii_whitespace() {
			self.pos += 1;
		}
	}

	fn parse_node(&mut self) -> crate::Result<FilterNode> {
		use crate::Error::Parse;

		self.skip_whitespace();
		if self.input.get(self.pos) != Some(&b'(') {
			return Err(Parse("capability filter node must start with '('".to_string()));
		}
		self.pos += 1;
		self.skip_whitespace();

		let node = match self.input.get(self.pos) {
			Some(b'&') => {
				self.pos += 1;
				FilterNode::And(self.parse_children()?)
			},
			Some(b'|') => {
				self.pos += 1;
				FilterNode::Or(self.parse_children()?)
			},
			Some(_) => {
				let key = self.take_until(|c| c == b'=')?;
				self.pos += 1; /* '=' */
				let value = self.take_until(|c| c == b')')?;
				FilterNode::Attribute(key.trim().to_string(), value.trim().to_string())
			},
			None => return Err(Parse("capability filter ended unexpectedly".to_string())),
		};

		self.skip_whitespace();
		if self.input.get(self.pos) != Some(&b')') {
			return Err(Parse("capability filter node is not closed".to_string()));
		}
		self.pos += 1;
		Ok(node)
	}

	fn parse_children(&mut self) -> crate::Result<Vec<FilterNode>> {
		let mut children = Vec::new();
		loop {
			self.skip_whitespace();
			if self.input.get(self.pos) == Some(&b'(') {
				children.push(self.parse_node()?);
			} else {
				return Ok(children);
			}
		}
	}

	fn take_until(&mut self, stop: impl Fn(u8) -> bool) -> crate::Result<&'a str> {
		let start = self.pos;
		while self.pos < self.input.len() && !stop(self.input[self.pos]) {
			self.pos += 1;
		}
		if self.pos == self.input.len() {
			return Err(crate::Error::Parse("capability filter attribute ended unexpectedly".to_string()));
		}
		std::str::from_utf8(&self.input[start..self.pos])
			.map_err(|_| crate::Error::Parse("capability filter is not valid UTF-8".to_string()))
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn single(name: &str) -> String {
		format!("osgi.identity; filter:=\"(&(type=osgi.subsystem.feature)(osgi.identity={}))\"", name)
	}

	#[test]
	fn single_clause_yields_one_group() {
		let expr = CapabilityExpression::new(&single("com.example.a-1.0")).unwrap();
		assert_eq!(expr.requirement_groups(), &[vec!["com.example.a-1.0".to_string()]]);
	}

	#[test]
	fn comma_separated_clauses_are_all_required() {
		let expr = CapabilityExpression::new(&format!("{},{}", single("a-1.0"), single("b-1.0"))).unwrap();
		assert_eq!(expr.requirement_groups().len(), 2);
		assert!(expr.is_satisfied(|n| n == "a-1.0" || n == "b-1.0"));
		assert!(!expr.is_satisfied(|n| n == "a-1.0"));
	}

	#[test]
	fn or_group_offers_alternatives() {
		let expr = CapabilityExpression::new(
			"osgi.identity; filter:=\"(|(&(type=osgi.subsystem.feature)(osgi.identity=a-1.0))(&(type=osgi.subsystem.feature)(osgi.identity=b-1.0)))\""
		).unwrap();
		assert_eq!(expr.requirement_groups(), &[vec!["a-1.0".to_string(), "b-1.0".to_string()]]);
		assert!(expr.is_satisfied(|n| n == "b-1.0"));
	}

	#[test]
	fn type_atoms_are_structural_only() {
		let expr = CapabilityExpression::new(&single("a-1.0")).unwrap();
		assert!(expr.is_satisfied(|n| n == "a-1.0"));
	}

	#[test] fn unknown_namespace_is_an_error() { assert!(CapabilityExpression::new("osgi.ee; filter:=\"(x=y)\"").is_err()) }
	#[test] fn missing_filter_is_an_error() { assert!(CapabilityExpression::new("osgi.identity").is_err()) }
	#[test] fn unbalanced_filter_is_an_error() { assert!(CapabilityExpression::new("osgi.identity; filter:=\"(&(osgi.identity=a)\"").is_err()) }
}
