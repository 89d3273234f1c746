//! Graph data structures consumed from the lesson backend.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Completion state of a lesson, as reported by the backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonStatus {
	#[default]
	NotStarted,
	InProgress,
	Completed,
	Locked,
}

impl LessonStatus {
	/// All statuses in legend order.
	pub const ALL: [LessonStatus; 4] = [
		LessonStatus::Completed,
		LessonStatus::InProgress,
		LessonStatus::NotStarted,
		LessonStatus::Locked,
	];

	/// Human readable label used by the legend.
	pub fn label(self) -> &'static str {
		match self {
			LessonStatus::NotStarted => "Not started",
			LessonStatus::InProgress => "In progress",
			LessonStatus::Completed => "Completed",
			LessonStatus::Locked => "Locked",
		}
	}
}

impl fmt::Display for LessonStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			LessonStatus::NotStarted => "not_started",
			LessonStatus::InProgress => "in_progress",
			LessonStatus::Completed => "completed",
			LessonStatus::Locked => "locked",
		};
		f.write_str(s)
	}
}

/// Kind of dependency between two lessons.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
	/// Hard dependency. Must be acyclic.
	#[default]
	Prerequisite,
	/// Soft recommendation. Cycles are allowed.
	Suggested,
}

/// A lesson node in the graph.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct GraphNode {
	/// Backend lesson id. Used to reference nodes in links.
	pub id: String,
	/// Display title.
	#[serde(default, alias = "label")]
	pub title: String,
	#[serde(default)]
	pub status: LessonStatus,
	/// Previously saved position, if any.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub x: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub y: Option<f64>,
	/// Pinned position. While set the simulation never moves the node.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub fx: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub fy: Option<f64>,
}

impl GraphNode {
	/// Convenience constructor for an unpositioned node.
	pub fn new(id: impl Into<String>, title: impl Into<String>, status: LessonStatus) -> Self {
		Self {
			id: id.into(),
			title: title.into(),
			status,
			..Self::default()
		}
	}

	/// Saved position, only when both coordinates are present.
	pub fn position(&self) -> Option<(f64, f64)> {
		self.x.zip(self.y)
	}

	/// Pinned position, only when both coordinates are present.
	pub fn pinned(&self) -> Option<(f64, f64)> {
		self.fx.zip(self.fy)
	}
}

/// A directed dependency between two lessons, referenced by id.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct GraphEdge {
	/// Source lesson id.
	pub source: String,
	/// Target lesson id.
	pub target: String,
	#[serde(default, rename = "type")]
	pub kind: EdgeKind,
}

impl GraphEdge {
	pub fn new(source: impl Into<String>, target: impl Into<String>, kind: EdgeKind) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
			kind,
		}
	}
}

/// Complete graph payload: nodes and links.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct GraphData {
	pub nodes: Vec<GraphNode>,
	#[serde(default, alias = "edges")]
	pub links: Vec<GraphEdge>,
}

/// Per-lesson progress annotation. Not part of the graph structure.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ProgressNodeData {
	pub status: LessonStatus,
	/// Completion percentage in `0..=100`.
	#[serde(default)]
	pub percentage: f64,
	#[serde(
		default,
		rename = "completedAt",
		alias = "completed_at",
		skip_serializing_if = "Option::is_none"
	)]
	pub completed_at: Option<String>,
}

/// Progress payload keyed by lesson id.
pub type ProgressMap = HashMap<String, ProgressNodeData>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_backend_payload() {
		let json = r#"{
			"nodes": [
				{"id": "a", "title": "Intro", "status": "completed"},
				{"id": "b", "title": "Loops", "status": "in_progress", "x": 10.0, "y": -4.5}
			],
			"links": [
				{"source": "a", "target": "b", "type": "prerequisite"},
				{"source": "b", "target": "a", "type": "suggested"}
			]
		}"#;
		let data: GraphData = serde_json::from_str(json).unwrap();
		assert_eq!(data.nodes.len(), 2);
		assert_eq!(data.nodes[0].status, LessonStatus::Completed);
		assert_eq!(data.nodes[1].position(), Some((10.0, -4.5)));
		assert_eq!(data.nodes[1].pinned(), None);
		assert_eq!(data.links[1].kind, EdgeKind::Suggested);
	}

	#[test]
	fn missing_fields_use_defaults() {
		let data: GraphData =
			serde_json::from_str(r#"{"nodes": [{"id": "x"}], "edges": [{"source": "x", "target": "x"}]}"#)
				.unwrap();
		assert_eq!(data.nodes[0].status, LessonStatus::NotStarted);
		assert_eq!(data.links[0].kind, EdgeKind::Prerequisite);
	}

	#[test]
	fn parses_progress_payload() {
		let json = r#"{
			"a": {"status": "completed", "percentage": 100, "completedAt": "2024-05-01T10:00:00Z"},
			"b": {"status": "in_progress", "percentage": 40}
		}"#;
		let progress: ProgressMap = serde_json::from_str(json).unwrap();
		assert_eq!(progress["a"].completed_at.as_deref(), Some("2024-05-01T10:00:00Z"));
		assert_eq!(progress["b"].percentage, 40.0);
		assert!(progress["b"].completed_at.is_none());
	}

	#[test]
	fn status_display_matches_wire_names() {
		for status in LessonStatus::ALL {
			let wire = serde_json::to_string(&status).unwrap();
			assert_eq!(wire, format!("\"{}\"", status));
		}
	}
}
