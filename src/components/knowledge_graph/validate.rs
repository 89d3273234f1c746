//! Structural checks on raw graph data.
//!
//! Validation is advisory. Nothing here mutates or rejects the input; callers
//! decide whether to render best-effort or block on a failing report.

use std::collections::{HashMap, HashSet};
use std::fmt;

use log::debug;

use super::types::{EdgeKind, GraphData};

/// A single structural problem found in a graph payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GraphIssue {
	MissingSource { edge: usize, id: String },
	MissingTarget { edge: usize, id: String },
	DuplicateNode { id: String },
	/// Prerequisite cycle, listed as the node path with the first node repeated at the end.
	PrerequisiteCycle { path: Vec<String> },
}

impl fmt::Display for GraphIssue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::MissingSource { edge, id } => {
				write!(f, "Edge {} references missing source node '{}'", edge, id)
			}
			Self::MissingTarget { edge, id } => {
				write!(f, "Edge {} references missing target node '{}'", edge, id)
			}
			Self::DuplicateNode { id } => write!(f, "Duplicate node id '{}'", id),
			Self::PrerequisiteCycle { path } => {
				write!(f, "Prerequisite cycle detected: {}", path.join(" -> "))
			}
		}
	}
}

/// Outcome of [`validate`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationReport {
	pub valid: bool,
	pub errors: Vec<GraphIssue>,
}

impl ValidationReport {
	/// Error messages in display form.
	pub fn messages(&self) -> Vec<String> {
		self.errors.iter().map(ToString::to_string).collect()
	}

	pub fn has_cycle(&self) -> bool {
		self.errors
			.iter()
			.any(|e| matches!(e, GraphIssue::PrerequisiteCycle { .. }))
	}
}

/// Check edge endpoints, node id uniqueness, and prerequisite acyclicity.
///
/// Suggested edges never take part in the cycle check, so a cycle made only of
/// suggested edges (or one closed by a suggested edge) is valid.
pub fn validate(raw: &GraphData) -> ValidationReport {
	let mut errors = Vec::new();
	let mut ids: HashMap<&str, usize> = HashMap::with_capacity(raw.nodes.len());
	let mut reported_dup = HashSet::new();

	for node in &raw.nodes {
		if ids.contains_key(node.id.as_str()) {
			if reported_dup.insert(node.id.as_str()) {
				errors.push(GraphIssue::DuplicateNode {
					id: node.id.clone(),
				});
			}
			continue;
		}
		let next = ids.len();
		ids.insert(node.id.as_str(), next);
	}

	let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); ids.len()];
	for (edge, link) in raw.links.iter().enumerate() {
		let src = ids.get(link.source.as_str()).copied();
		let tgt = ids.get(link.target.as_str()).copied();
		if src.is_none() {
			errors.push(GraphIssue::MissingSource {
				edge,
				id: link.source.clone(),
			});
		}
		if tgt.is_none() {
			errors.push(GraphIssue::MissingTarget {
				edge,
				id: link.target.clone(),
			});
		}
		if let (Some(s), Some(t), EdgeKind::Prerequisite) = (src, tgt, link.kind) {
			adjacency[s].push(t);
		}
	}

	let mut names = vec![""; ids.len()];
	for (id, &i) in &ids {
		names[i] = id;
	}
	for cycle in find_cycles(&adjacency) {
		errors.push(GraphIssue::PrerequisiteCycle {
			path: cycle.into_iter().map(|i| names[i].to_string()).collect(),
		});
	}

	debug!(
		"lesson-graph: validated {} nodes, {} links, {} issue(s)",
		raw.nodes.len(),
		raw.links.len(),
		errors.len()
	);

	ValidationReport {
		valid: errors.is_empty(),
		errors,
	}
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
	Unvisited,
	OnStack,
	Done,
}

/// Depth-first search with an explicit stack. Every back edge into a node that
/// is still on the recursion stack yields one cycle path.
fn find_cycles(adjacency: &[Vec<usize>]) -> Vec<Vec<usize>> {
	let mut marks = vec![Mark::Unvisited; adjacency.len()];
	let mut cycles = Vec::new();
	// (node, index of next child to visit)
	let mut stack: Vec<(usize, usize)> = Vec::new();

	for root in 0..adjacency.len() {
		if marks[root] != Mark::Unvisited {
			continue;
		}
		marks[root] = Mark::OnStack;
		stack.push((root, 0));

		while let Some(top) = stack.last_mut() {
			let node = top.0;
			if let Some(&child) = adjacency[node].get(top.1) {
				top.1 += 1;
				match marks[child] {
					Mark::Unvisited => {
						marks[child] = Mark::OnStack;
						stack.push((child, 0));
					}
					Mark::OnStack => {
						let start = stack
							.iter()
							.position(|&(n, _)| n == child)
							.unwrap_or(0);
						let mut path: Vec<usize> = stack[start..].iter().map(|&(n, _)| n).collect();
						path.push(child);
						cycles.push(path);
					}
					Mark::Done => {}
				}
			} else {
				marks[node] = Mark::Done;
				stack.pop();
			}
		}
	}

	cycles
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::knowledge_graph::types::{GraphEdge, GraphNode, LessonStatus};

	fn graph(ids: &[&str], links: &[(&str, &str, EdgeKind)]) -> GraphData {
		GraphData {
			nodes: ids
				.iter()
				.map(|id| GraphNode::new(*id, *id, LessonStatus::NotStarted))
				.collect(),
			links: links
				.iter()
				.map(|(s, t, k)| GraphEdge::new(*s, *t, *k))
				.collect(),
		}
	}

	#[test]
	fn accepts_a_dag() {
		let g = graph(
			&["a", "b", "c", "d"],
			&[
				("a", "b", EdgeKind::Prerequisite),
				("a", "c", EdgeKind::Prerequisite),
				("b", "d", EdgeKind::Prerequisite),
				("c", "d", EdgeKind::Prerequisite),
			],
		);
		let report = validate(&g);
		assert!(report.valid, "{:?}", report.messages());
	}

	#[test]
	fn reports_prerequisite_cycle_with_path() {
		let g = graph(
			&["1", "2", "3"],
			&[
				("1", "2", EdgeKind::Prerequisite),
				("2", "3", EdgeKind::Prerequisite),
				("3", "1", EdgeKind::Prerequisite),
			],
		);
		let report = validate(&g);
		assert!(!report.valid);
		assert!(report.has_cycle());
		assert_eq!(
			report.errors,
			vec![GraphIssue::PrerequisiteCycle {
				path: vec!["1".into(), "2".into(), "3".into(), "1".into()]
			}]
		);
		assert!(report.messages()[0].to_lowercase().contains("cycle"));
	}

	#[test]
	fn suggested_and_mixed_cycles_are_allowed() {
		let suggested = graph(
			&["1", "2", "3"],
			&[
				("1", "2", EdgeKind::Suggested),
				("2", "3", EdgeKind::Suggested),
				("3", "1", EdgeKind::Suggested),
			],
		);
		assert!(validate(&suggested).valid);

		let mixed = graph(
			&["a", "b"],
			&[("a", "b", EdgeKind::Prerequisite), ("b", "a", EdgeKind::Suggested)],
		);
		assert!(validate(&mixed).valid);
	}

	#[test]
	fn self_loop_is_a_cycle() {
		let g = graph(&["a"], &[("a", "a", EdgeKind::Prerequisite)]);
		let report = validate(&g);
		assert_eq!(
			report.errors,
			vec![GraphIssue::PrerequisiteCycle {
				path: vec!["a".into(), "a".into()]
			}]
		);
	}

	#[test]
	fn reports_each_missing_endpoint_with_id() {
		let g = graph(
			&["a"],
			&[
				("a", "ghost", EdgeKind::Prerequisite),
				("phantom", "spectre", EdgeKind::Suggested),
			],
		);
		let messages = validate(&g).messages();
		assert_eq!(messages.len(), 3);
		assert!(messages[0].contains("ghost"));
		assert!(messages[1].contains("phantom"));
		assert!(messages[2].contains("spectre"));
	}

	#[test]
	fn reports_duplicate_ids_once() {
		let g = graph(&["a", "a", "a", "b"], &[]);
		let report = validate(&g);
		assert_eq!(
			report.errors,
			vec![GraphIssue::DuplicateNode { id: "a".into() }]
		);
	}

	#[test]
	fn diamond_revisit_is_not_a_cycle() {
		// d is reached twice, the second time already finished.
		let g = graph(
			&["a", "b", "c", "d"],
			&[
				("a", "b", EdgeKind::Prerequisite),
				("b", "d", EdgeKind::Prerequisite),
				("a", "c", EdgeKind::Prerequisite),
				("c", "d", EdgeKind::Prerequisite),
				("d", "b", EdgeKind::Suggested),
			],
		);
		assert!(validate(&g).valid);
	}

	#[test]
	fn empty_graph_is_valid() {
		assert!(validate(&GraphData::default()).valid);
	}
}
