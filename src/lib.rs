//! lesson-graph: Interactive knowledge graph of lesson dependencies.
//!
//! This crate provides a WASM-based component that renders lessons as nodes
//! and prerequisite/suggested relations as edges, laid out by a force
//! simulation and colored by each learner's progress.

use std::fmt;

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, debug, info, warn};
use serde::de::DeserializeOwned;
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

pub mod components;

pub use components::knowledge_graph::{
	EdgeKind, GraphConfig, GraphData, GraphEdge, GraphNode, KnowledgeGraphCanvas, LessonStatus,
	ProgressMap, ProgressNodeData, ProgressOverlay, validate,
};

/// Script element holding the lesson graph.
pub const GRAPH_DATA_ID: &str = "graph-data";
/// Script element holding per-lesson progress.
pub const PROGRESS_DATA_ID: &str = "progress-data";
/// Script element holding [`GraphConfig`] overrides.
pub const GRAPH_CONFIG_ID: &str = "graph-config";

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("lesson-graph: logging initialized");
}

/// Failure to read an embedded JSON payload.
#[derive(Debug)]
pub enum LoadError {
	/// No DOM, or no `<script>` element with the given id.
	MissingElement(String),
	/// The element exists but its text is not valid JSON for the target type.
	Parse {
		element: String,
		source: serde_json::Error,
	},
}

impl fmt::Display for LoadError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			LoadError::MissingElement(id) => write!(f, "no script element with id \"{}\"", id),
			LoadError::Parse { element, source } => {
				write!(f, "failed to parse \"{}\": {}", element, source)
			}
		}
	}
}

impl std::error::Error for LoadError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			LoadError::MissingElement(_) => None,
			LoadError::Parse { source, .. } => Some(source),
		}
	}
}

fn script_text(element_id: &str) -> Option<String> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id(element_id)?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	script.text().ok()
}

/// Parse JSON from a script element, e.g. `<script type="application/json" id="graph-data">`.
pub fn load_json<T: DeserializeOwned>(element_id: &str) -> Result<T, LoadError> {
	let text =
		script_text(element_id).ok_or_else(|| LoadError::MissingElement(element_id.to_string()))?;
	parse_json(element_id, &text)
}

fn parse_json<T: DeserializeOwned>(element_id: &str, text: &str) -> Result<T, LoadError> {
	serde_json::from_str(text).map_err(|source| LoadError::Parse {
		element: element_id.to_string(),
		source,
	})
}

/// Load a payload, falling back to the default when it is missing or broken.
fn load_or_default<T: DeserializeOwned + Default>(element_id: &str) -> T {
	match load_json(element_id) {
		Ok(value) => value,
		Err(LoadError::MissingElement(id)) => {
			debug!("lesson-graph: no \"{}\" element, using defaults", id);
			T::default()
		}
		Err(e) => {
			warn!("lesson-graph: {}", e);
			T::default()
		}
	}
}

/// Main application component.
/// Loads lessons, progress and config from the DOM and renders the graph.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let graph_data: GraphData = load_or_default(GRAPH_DATA_ID);
	let progress: ProgressMap = load_or_default(PROGRESS_DATA_ID);
	let config: GraphConfig = load_or_default(GRAPH_CONFIG_ID);
	info!(
		"lesson-graph: loaded {} lessons, {} links, {} progress entries",
		graph_data.nodes.len(),
		graph_data.links.len(),
		progress.len()
	);

	let report = validate(&graph_data);
	if report.valid {
		debug!("lesson-graph: graph is valid");
	} else {
		warn!("lesson-graph: graph has {} issue(s)", report.errors.len());
	}

	let graph_signal = Signal::derive(move || graph_data.clone());
	let progress_signal = Signal::derive(move || progress.clone());
	let html_theme = config.theme().name;

	let on_click = Callback::new(|id: String| info!("lesson-graph: clicked {}", id));
	let on_drag_end = Callback::new(|(id, x, y): (String, f64, f64)| {
		debug!("lesson-graph: {} dropped at ({:.1}, {:.1})", id, x, y)
	});

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme=html_theme />
		<Title text="Lesson Graph" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="fullscreen-graph">
			<KnowledgeGraphCanvas
				data=graph_signal
				progress=progress_signal
				config=config
				fullscreen=true
				on_node_click=on_click
				on_node_drag_end=on_drag_end
			/>
			<div class="graph-overlay">
				<h1>"Lessons"</h1>
				<p class="subtitle">"Hover to see connected lessons. Scroll to zoom. Drag background to pan."</p>
			</div>
		</div>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parse_error_names_the_element() {
		let err = parse_json::<GraphData>(GRAPH_DATA_ID, "{not json").unwrap_err();
		assert!(matches!(err, LoadError::Parse { .. }));
		assert!(err.to_string().starts_with("failed to parse \"graph-data\""));
		assert!(std::error::Error::source(&err).is_some());
	}

	#[test]
	fn payloads_accept_the_host_shapes() {
		let data: GraphData = parse_json(
			GRAPH_DATA_ID,
			r#"{"nodes": [{"id": "a", "title": "A", "status": "completed"}], "links": []}"#,
		)
		.unwrap();
		assert_eq!(data.nodes[0].status, LessonStatus::Completed);

		let progress: ProgressMap = parse_json(
			PROGRESS_DATA_ID,
			r#"{"a": {"status": "in_progress", "percentage": 40}}"#,
		)
		.unwrap();
		assert_eq!(progress["a"].status, LessonStatus::InProgress);
	}

	#[test]
	fn missing_element_message() {
		let err = LoadError::MissingElement("graph-config".into());
		assert_eq!(err.to_string(), "no script element with id \"graph-config\"");
	}
}
