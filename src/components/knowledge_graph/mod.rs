//! Lesson dependency graph visualization.
//!
//! Turns a lesson graph (lessons plus prerequisite/suggested links) into an
//! interactive canvas with:
//! - Validation of dangling links and prerequisite cycles
//! - A force layout with cooldown, pinning and collision
//! - Status-driven colors, opacity and edge dashes
//! - Hover neighborhoods, click, drag, pan and zoom
//! - A legend with progress statistics
//!
//! The layout and interaction logic is plain Rust and can be driven without a
//! browser; only [`KnowledgeGraphCanvas`] and [`ProgressOverlay`] need the DOM.
//!
//! # Example
//!
//! ```ignore
//! use lesson_graph::{GraphData, GraphEdge, GraphNode, KnowledgeGraphCanvas, LessonStatus, EdgeKind};
//!
//! let data = GraphData {
//!     nodes: vec![
//!         GraphNode::new("intro", "Introduction", LessonStatus::Completed),
//!         GraphNode::new("loops", "Loops", LessonStatus::InProgress),
//!     ],
//!     links: vec![GraphEdge::new("intro", "loops", EdgeKind::Prerequisite)],
//! };
//!
//! view! { <KnowledgeGraphCanvas data=data fullscreen=true /> }
//! ```

mod component;
pub mod config;
mod overlay;
mod render;
pub mod scale;
pub mod simulation;
pub mod state;
pub mod stats;
pub mod theme;
pub mod transform;
pub mod types;
pub mod validate;

pub use component::KnowledgeGraphCanvas;
pub use config::GraphConfig;
pub use overlay::ProgressOverlay;
pub use simulation::{ForceLayout, LayoutState, SimulationConfig};
pub use state::KnowledgeGraphState;
pub use stats::{LegendEntry, ProgressStats, legend_entries, progress_stats};
pub use theme::{EdgeDash, Theme, color_for, edge_dash_for, opacity_for, truncate_text};
pub use transform::{NodeHandle, TransformOutcome, WorkingGraph, transform, transform_with};
pub use types::{EdgeKind, GraphData, GraphEdge, GraphNode, LessonStatus, ProgressMap, ProgressNodeData};
pub use validate::{GraphIssue, ValidationReport, validate};
