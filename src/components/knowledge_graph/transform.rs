//! Conversion from id-referenced graph data into an indexed working graph.
//!
//! Nodes live in an arena addressed by [`NodeHandle`]; edges refer to nodes by
//! handle, never by pointer. The id → handle index is built once per call.

use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;

use log::warn;
use serde::Deserialize;

use super::types::{EdgeKind, GraphData, GraphEdge, GraphNode, LessonStatus};

/// Stable index of a node inside a [`WorkingGraph`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(pub usize);

/// Placement of nodes that arrive without a saved position.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
	/// Radius of the fallback circle.
	pub radius: f64,
	/// Center of the fallback circle, in graph coordinates.
	pub origin: (f64, f64),
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			radius: 200.0,
			origin: (0.0, 0.0),
		}
	}
}

/// Runtime node carrying the live layout position.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkingNode {
	pub id: String,
	pub title: String,
	pub status: LessonStatus,
	pub x: f64,
	pub y: f64,
	pub fx: Option<f64>,
	pub fy: Option<f64>,
}

impl WorkingNode {
	pub fn pinned(&self) -> Option<(f64, f64)> {
		self.fx.zip(self.fy)
	}
}

/// Edge resolved to node handles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkingEdge {
	pub source: NodeHandle,
	pub target: NodeHandle,
	pub kind: EdgeKind,
}

/// Why an input edge was left out of the working graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DropReason {
	MissingSource(String),
	MissingTarget(String),
	MissingBoth { source: String, target: String },
}

/// An input edge excluded from the working graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DroppedEdge {
	/// Position of the edge in the input `links` list.
	pub index: usize,
	pub reason: DropReason,
}

/// Indexed graph used by layout and interaction.
#[derive(Clone, Debug, Default)]
pub struct WorkingGraph {
	pub nodes: Vec<WorkingNode>,
	pub edges: Vec<WorkingEdge>,
	index: HashMap<String, NodeHandle>,
}

impl WorkingGraph {
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn handle(&self, id: &str) -> Option<NodeHandle> {
		self.index.get(id).copied()
	}

	pub fn node(&self, handle: NodeHandle) -> Option<&WorkingNode> {
		self.nodes.get(handle.0)
	}

	pub fn node_mut(&mut self, handle: NodeHandle) -> Option<&mut WorkingNode> {
		self.nodes.get_mut(handle.0)
	}

	/// Handles of every node sharing an edge with `handle`, in either direction.
	pub fn neighbors(&self, handle: NodeHandle) -> HashSet<NodeHandle> {
		let mut out = HashSet::new();
		for edge in &self.edges {
			if edge.source == handle && edge.target != handle {
				out.insert(edge.target);
			} else if edge.target == handle && edge.source != handle {
				out.insert(edge.source);
			}
		}
		out
	}

	/// Ids of the nodes directly connected to `id`. Unknown or isolated ids
	/// yield an empty set.
	pub fn connected_nodes(&self, id: &str) -> HashSet<String> {
		self.handle(id)
			.map(|h| {
				self.neighbors(h)
					.into_iter()
					.filter_map(|n| self.node(n).map(|node| node.id.clone()))
					.collect()
			})
			.unwrap_or_default()
	}

	/// Export the current layout in the backend shape so the host can persist it.
	pub fn snapshot(&self) -> GraphData {
		GraphData {
			nodes: self
				.nodes
				.iter()
				.map(|n| GraphNode {
					id: n.id.clone(),
					title: n.title.clone(),
					status: n.status,
					x: Some(n.x),
					y: Some(n.y),
					fx: n.fx,
					fy: n.fy,
				})
				.collect(),
			links: self
				.edges
				.iter()
				.map(|e| GraphEdge {
					source: self.nodes[e.source.0].id.clone(),
					target: self.nodes[e.target.0].id.clone(),
					kind: e.kind,
				})
				.collect(),
		}
	}
}

/// Result of [`transform`]: the working graph plus what had to be left out.
#[derive(Clone, Debug, Default)]
pub struct TransformOutcome {
	pub graph: WorkingGraph,
	pub dropped_edges: Vec<DroppedEdge>,
	/// Ids that appeared more than once; only the first occurrence is kept.
	pub duplicate_ids: Vec<String>,
}

impl TransformOutcome {
	/// True when nothing was dropped.
	pub fn is_clean(&self) -> bool {
		self.dropped_edges.is_empty() && self.duplicate_ids.is_empty()
	}
}

/// Build a working graph from raw data using the default layout settings.
pub fn transform(raw: &GraphData) -> TransformOutcome {
	transform_with(raw, &LayoutConfig::default())
}

/// Build a working graph from raw data.
///
/// Pinned nodes start at their pin. Nodes with neither a pin nor a saved
/// position are spread evenly around a circle in input order. Edges whose endpoints are missing are dropped and recorded, never
/// treated as a failure.
pub fn transform_with(raw: &GraphData, config: &LayoutConfig) -> TransformOutcome {
	let total = raw.nodes.len().max(1) as f64;
	let mut graph = WorkingGraph::default();
	let mut duplicate_ids = Vec::new();

	for (i, node) in raw.nodes.iter().enumerate() {
		if graph.index.contains_key(&node.id) {
			warn!("lesson-graph: duplicate node id '{}' ignored", node.id);
			duplicate_ids.push(node.id.clone());
			continue;
		}
		let (x, y) = node.pinned().or_else(|| node.position()).unwrap_or_else(|| {
			let angle = (i as f64) / total * 2.0 * PI;
			(
				config.origin.0 + config.radius * angle.cos(),
				config.origin.1 + config.radius * angle.sin(),
			)
		});
		let handle = NodeHandle(graph.nodes.len());
		graph.index.insert(node.id.clone(), handle);
		graph.nodes.push(WorkingNode {
			id: node.id.clone(),
			title: node.title.clone(),
			status: node.status,
			x,
			y,
			fx: node.fx,
			fy: node.fy,
		});
	}

	let mut dropped_edges = Vec::new();
	for (index, link) in raw.links.iter().enumerate() {
		match (graph.handle(&link.source), graph.handle(&link.target)) {
			(Some(source), Some(target)) => graph.edges.push(WorkingEdge {
				source,
				target,
				kind: link.kind,
			}),
			(src, tgt) => {
				let reason = match (src, tgt) {
					(None, None) => DropReason::MissingBoth {
						source: link.source.clone(),
						target: link.target.clone(),
					},
					(None, _) => DropReason::MissingSource(link.source.clone()),
					_ => DropReason::MissingTarget(link.target.clone()),
				};
				warn!(
					"lesson-graph: dropping edge {} ({} -> {}): endpoint not found",
					index, link.source, link.target
				);
				dropped_edges.push(DroppedEdge { index, reason });
			}
		}
	}

	TransformOutcome {
		graph,
		dropped_edges,
		duplicate_ids,
	}
}
