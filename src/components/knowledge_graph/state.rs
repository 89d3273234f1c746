//! Interaction state layered over the force layout.
//!
//! Tracks the pan/zoom transform, hover highlighting and the drag protocol.
//! Dragging never writes node positions itself: it only pins and releases the
//! dragged node through [`ForceLayout::set_pinned`].
//!
//! The `pointer_*` methods turn raw pointer events into what the host hears
//! about ([`PointerOutcome`]), so mouse and touch share one code path.

use std::collections::HashSet;

use log::debug;
use serde::Deserialize;

use super::scale::{ScaleConfig, ScaledValues};
use super::simulation::{ForceLayout, nodes_near};
use super::transform::NodeHandle;

/// Zoom limits and step sizes.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
	pub min_zoom: f64,
	pub max_zoom: f64,
	/// Factor applied by the zoom-in and zoom-out actions.
	pub step: f64,
	/// Factor applied per wheel notch.
	pub wheel_factor: f64,
}

impl Default for ZoomConfig {
	fn default() -> Self {
		Self {
			min_zoom: 0.2,
			max_zoom: 4.0,
			step: 1.25,
			wheel_factor: 1.1,
		}
	}
}

impl ZoomConfig {
	/// Repair host-supplied values: bounds must be finite and positive with
	/// `min_zoom <= max_zoom`, factors must be finite and above 1. Anything
	/// else falls back to the default, and inverted bounds are swapped.
	pub fn normalized(self) -> Self {
		let d = Self::default();
		let bound = |v: f64, fallback: f64| if v.is_finite() && v > 0.0 { v } else { fallback };
		let factor = |v: f64, fallback: f64| if v.is_finite() && v > 1.0 { v } else { fallback };

		let mut min_zoom = bound(self.min_zoom, d.min_zoom);
		let mut max_zoom = bound(self.max_zoom, d.max_zoom);
		if min_zoom > max_zoom {
			std::mem::swap(&mut min_zoom, &mut max_zoom);
		}
		Self {
			min_zoom,
			max_zoom,
			step: factor(self.step, d.step),
			wheel_factor: factor(self.wheel_factor, d.wheel_factor),
		}
	}

	/// Bring `k` into `min_zoom..=max_zoom`. Never panics, whatever the bounds.
	pub fn clamp(&self, k: f64) -> f64 {
		k.max(self.min_zoom).min(self.max_zoom)
	}
}

/// Pan and zoom transform applied to the entire graph view.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	/// Zoom factor (1.0 = 100%).
	pub k: f64,
}

/// Node currently held by the pointer.
#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub node: Option<NodeHandle>,
	/// Offset from the pointer to the node center, in graph units.
	pub offset_x: f64,
	pub offset_y: f64,
}

/// Tracks an in-progress canvas pan operation.
#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// Pointer travel, in screen pixels, below which a press counts as a click.
pub const CLICK_SLOP: f64 = 4.0;

/// A pointer press that has not been released yet.
#[derive(Clone, Debug, PartialEq)]
pub struct Press {
	/// Node under the pointer when it went down.
	pub node: Option<NodeHandle>,
	pub x: f64,
	pub y: f64,
	/// Travelled further than [`CLICK_SLOP`].
	pub moved: bool,
}

/// What the host should hear about after a pointer event.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointerOutcome {
	/// Hovered node changed; `Some(None)` means hover ended.
	pub hover: Option<Option<String>>,
	pub click: Option<String>,
	pub drag_end: Option<DragEnd>,
}

/// Reported to the host when a drag finishes.
#[derive(Clone, Debug, PartialEq)]
pub struct DragEnd {
	pub id: String,
	pub x: f64,
	pub y: f64,
}

/// Hovered node, its neighbors, and a smoothed emphasis level.
///
/// The emphasis eases towards 1 while something is hovered and back to 0
/// afterwards; the highlighted set is kept until the fade-out completes so
/// the dimming does not snap.
#[derive(Clone, Debug, Default)]
pub struct HighlightState {
	pub hovered: Option<NodeHandle>,
	active: HashSet<NodeHandle>,
	intensity: f64,
}

impl HighlightState {
	/// Returns `true` when the hovered node changed.
	pub fn set_hover(&mut self, node: Option<NodeHandle>, neighbors: HashSet<NodeHandle>) -> bool {
		if self.hovered == node {
			return false;
		}
		self.hovered = node;
		if let Some(h) = node {
			self.active = neighbors;
			self.active.insert(h);
		}
		true
	}

	/// Exponential smoothing: value += (target - value) * (1 - e^(-speed * dt)).
	pub fn tick(&mut self, dt: f64) {
		const FADE_IN_SPEED: f64 = 6.0;
		const FADE_OUT_SPEED: f64 = 4.0;

		if self.hovered.is_some() {
			self.intensity += (1.0 - self.intensity) * (1.0 - (-FADE_IN_SPEED * dt).exp());
		} else {
			self.intensity *= (-FADE_OUT_SPEED * dt).exp();
			if self.intensity < 0.005 {
				self.intensity = 0.0;
				self.active.clear();
			}
		}
	}

	/// Hovered node or one of its neighbors.
	pub fn is_highlighted(&self, node: NodeHandle) -> bool {
		self.active.contains(&node)
	}

	/// Both endpoints highlighted, and one of them is the hovered node.
	pub fn is_edge_highlighted(&self, source: NodeHandle, target: NodeHandle) -> bool {
		self.is_highlighted(source)
			&& self.is_highlighted(target)
			&& self.hovered.is_some_and(|h| h == source || h == target)
	}

	/// Emphasis level in `0..=1`.
	pub fn intensity(&self) -> f64 {
		self.intensity
	}
}

/// Layout plus everything the pointer can change.
pub struct KnowledgeGraphState {
	pub layout: ForceLayout,
	pub transform: ViewTransform,
	pub zoom: ZoomConfig,
	pub drag: DragState,
	pub pan: PanState,
	pub highlight: HighlightState,
	pub width: f64,
	pub height: f64,
	/// Whether nodes may be dragged.
	pub editable: bool,
	/// Keep dragged nodes pinned where they were dropped.
	pub pin_on_release: bool,
	pub press: Option<Press>,
}

impl KnowledgeGraphState {
	pub fn new(layout: ForceLayout, width: f64, height: f64, zoom: ZoomConfig) -> Self {
		let zoom = zoom.normalized();
		Self {
			layout,
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: zoom.clamp(1.0),
			},
			zoom,
			drag: DragState::default(),
			pan: PanState::default(),
			highlight: HighlightState::default(),
			width,
			height,
			editable: false,
			pin_on_release: false,
			press: None,
		}
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn graph_to_screen(&self, gx: f64, gy: f64) -> (f64, f64) {
		(
			gx * self.transform.k + self.transform.x,
			gy * self.transform.k + self.transform.y,
		)
	}

	/// Node under a screen position, nearest first.
	pub fn node_at_position(&self, sx: f64, sy: f64, config: &ScaleConfig) -> Option<NodeHandle> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let scale = ScaledValues::new(config, self.transform.k);
		nodes_near(&self.layout.graph().nodes, gx, gy, scale.hit_radius)
			.first()
			.copied()
	}

	pub fn node_id(&self, handle: NodeHandle) -> Option<&str> {
		self.layout.graph().node(handle).map(|n| n.id.as_str())
	}

	/// Returns `true` when the hovered node changed.
	pub fn set_hover(&mut self, node: Option<NodeHandle>) -> bool {
		let neighbors = node
			.map(|h| self.layout.graph().neighbors(h))
			.unwrap_or_default();
		self.highlight.set_hover(node, neighbors)
	}

	/// Start dragging `node` from screen position `(sx, sy)`.
	///
	/// Ignored unless the view is editable. The offset between the pointer and
	/// the node center is kept for the whole drag, so grabbing a node off
	/// center does not make it jump under the cursor.
	pub fn begin_drag(&mut self, node: NodeHandle, sx: f64, sy: f64) -> bool {
		if !self.editable {
			return false;
		}
		let Some(n) = self.layout.graph().node(node) else {
			return false;
		};
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let (nx, ny) = (n.x, n.y);
		self.drag = DragState {
			node: Some(node),
			offset_x: nx - gx,
			offset_y: ny - gy,
		};
		self.layout.set_pinned(node, Some((nx, ny)));
		let target = self.layout.config().drag_alpha_target;
		self.layout.set_alpha_target(target);
		debug!("lesson-graph: drag start {:?}", node);
		true
	}

	/// Move the dragged node so it tracks the pointer.
	pub fn drag_to(&mut self, sx: f64, sy: f64) {
		let Some(node) = self.drag.node else {
			return;
		};
		let (gx, gy) = self.screen_to_graph(sx, sy);
		self.layout
			.set_pinned(node, Some((gx + self.drag.offset_x, gy + self.drag.offset_y)));
	}

	/// Finish a drag. The pin is released unless `pin_on_release` is set.
	pub fn end_drag(&mut self) -> Option<DragEnd> {
		let node = self.drag.node.take()?;
		let (id, x, y) = {
			let n = self.layout.graph().node(node)?;
			(n.id.clone(), n.x, n.y)
		};
		if !self.pin_on_release {
			self.layout.set_pinned(node, None);
		}
		self.layout.set_alpha_target(0.0);
		Some(DragEnd { id, x, y })
	}

	pub fn is_dragging(&self) -> bool {
		self.drag.node.is_some()
	}

	pub fn begin_pan(&mut self, sx: f64, sy: f64) {
		self.pan = PanState {
			active: true,
			start_x: sx,
			start_y: sy,
			transform_start_x: self.transform.x,
			transform_start_y: self.transform.y,
		};
	}

	pub fn pan_to(&mut self, sx: f64, sy: f64) {
		if self.pan.active {
			self.transform.x = self.pan.transform_start_x + (sx - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (sy - self.pan.start_y);
		}
	}

	pub fn end_pan(&mut self) {
		self.pan.active = false;
	}

	/// Multiply the zoom by `factor`, keeping the screen point `(sx, sy)` fixed.
	pub fn zoom_at(&mut self, factor: f64, sx: f64, sy: f64) {
		let new_k = self.zoom.clamp(self.transform.k * factor);
		if !new_k.is_finite() || new_k <= 0.0 {
			return;
		}
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	/// One wheel notch; positive `delta_y` zooms out.
	pub fn wheel(&mut self, delta_y: f64, sx: f64, sy: f64) {
		let factor = if delta_y > 0.0 {
			1.0 / self.zoom.wheel_factor
		} else {
			self.zoom.wheel_factor
		};
		self.zoom_at(factor, sx, sy);
	}

	pub fn zoom_in(&mut self) {
		self.zoom_at(self.zoom.step, self.width / 2.0, self.height / 2.0);
	}

	pub fn zoom_out(&mut self) {
		self.zoom_at(1.0 / self.zoom.step, self.width / 2.0, self.height / 2.0);
	}

	/// Back to 100% (or the nearest allowed zoom) with the graph origin at the
	/// viewport center.
	pub fn reset_zoom(&mut self) {
		self.transform = ViewTransform {
			x: self.width / 2.0,
			y: self.height / 2.0,
			k: self.zoom.clamp(1.0),
		};
	}

	/// Pointer went down at screen position `(x, y)`: grab a node or start panning.
	pub fn pointer_down(&mut self, x: f64, y: f64, scale: &ScaleConfig) {
		let node = self.node_at_position(x, y, scale);
		match node {
			Some(h) => {
				self.begin_drag(h, x, y);
			}
			None => self.begin_pan(x, y),
		}
		self.press = Some(Press {
			node,
			x,
			y,
			moved: false,
		});
	}

	/// Pointer moved: follow with the dragged node, or update hover and pan.
	pub fn pointer_move(&mut self, x: f64, y: f64, scale: &ScaleConfig) -> PointerOutcome {
		let mut out = PointerOutcome::default();
		if let Some(press) = &mut self.press {
			if (x - press.x).hypot(y - press.y) > CLICK_SLOP {
				press.moved = true;
			}
		}

		if self.is_dragging() {
			self.drag_to(x, y);
		} else {
			let hovered = self.node_at_position(x, y, scale);
			if self.set_hover(hovered) {
				out.hover = Some(hovered.and_then(|h| self.node_id(h)).map(str::to_string));
			}
			self.pan_to(x, y);
		}
		out
	}

	/// Mouse button released over the canvas.
	pub fn pointer_up(&mut self) -> PointerOutcome {
		self.release(true)
	}

	/// Mouse left the canvas: finish any drag or pan, but never count it as a
	/// click, and end the hover.
	pub fn pointer_leave(&mut self) -> PointerOutcome {
		self.release(false)
	}

	/// Finger lifted. A tap still clicks; hover ends since there is no pointer left.
	pub fn touch_end(&mut self) -> PointerOutcome {
		let mut out = self.release(true);
		if out.hover.is_none() && self.set_hover(None) {
			out.hover = Some(None);
		}
		out
	}

	fn release(&mut self, allow_click: bool) -> PointerOutcome {
		let mut out = PointerOutcome::default();
		let press = self.press.take();
		let drag_end = self.end_drag();
		self.end_pan();

		if let Some(Press {
			node: Some(h),
			moved,
			..
		}) = press
		{
			if moved {
				out.drag_end = drag_end;
			} else if allow_click {
				out.click = self.node_id(h).map(str::to_string);
			}
		}
		if !allow_click && self.set_hover(None) {
			out.hover = Some(None);
		}
		out
	}

	pub fn tick(&mut self, dt: f64) -> bool {
		self.highlight.tick(dt);
		self.layout.tick(dt)
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.transform.x += (width - self.width) / 2.0;
		self.transform.y += (height - self.height) / 2.0;
		self.width = width;
		self.height = height;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::knowledge_graph::simulation::SimulationConfig;
	use crate::components::knowledge_graph::transform::transform;
	use crate::components::knowledge_graph::types::{
		EdgeKind, GraphData, GraphEdge, GraphNode, LessonStatus,
	};

	fn state() -> KnowledgeGraphState {
		let data = GraphData {
			nodes: ["a", "b", "c", "d"]
				.iter()
				.map(|id| GraphNode::new(*id, *id, LessonStatus::InProgress))
				.collect(),
			links: vec![
				GraphEdge::new("a", "b", EdgeKind::Prerequisite),
				GraphEdge::new("c", "a", EdgeKind::Suggested),
			],
		};
		let layout = ForceLayout::new(transform(&data).graph, SimulationConfig::default());
		KnowledgeGraphState::new(layout, 800.0, 600.0, ZoomConfig::default())
	}

	fn handle(s: &KnowledgeGraphState, id: &str) -> NodeHandle {
		s.layout.graph().handle(id).unwrap()
	}

	#[test]
	fn hover_highlights_node_and_neighbors() {
		let mut s = state();
		let (a, b, c, d) = (handle(&s, "a"), handle(&s, "b"), handle(&s, "c"), handle(&s, "d"));
		assert!(s.set_hover(Some(a)));
		assert!(!s.set_hover(Some(a)));
		assert!(s.highlight.is_highlighted(a));
		assert!(s.highlight.is_highlighted(b));
		assert!(s.highlight.is_highlighted(c));
		assert!(!s.highlight.is_highlighted(d));
		assert!(s.highlight.is_edge_highlighted(a, b));

		assert!(s.set_hover(Some(d)));
		assert!(s.highlight.is_highlighted(d));
		assert!(!s.highlight.is_highlighted(a));
	}

	#[test]
	fn highlight_fades_out_after_hover_ends() {
		let mut s = state();
		let a = handle(&s, "a");
		s.set_hover(Some(a));
		for _ in 0..30 {
			s.highlight.tick(0.016);
		}
		assert!(s.highlight.intensity() > 0.9);
		s.set_hover(None);
		assert!(s.highlight.is_highlighted(a));
		for _ in 0..200 {
			s.highlight.tick(0.016);
		}
		assert_eq!(s.highlight.intensity(), 0.0);
		assert!(!s.highlight.is_highlighted(a));
	}

	#[test]
	fn hit_testing_uses_the_view_transform() {
		let s = state();
		// node a sits at (200, 0) in graph space => (600, 300) on screen
		assert_eq!(s.node_at_position(600.0, 300.0, &ScaleConfig::default()), Some(handle(&s, "a")));
		assert_eq!(s.node_at_position(400.0, 300.0, &ScaleConfig::default()), None);
	}

	#[test]
	fn drag_requires_editable_view() {
		let mut s = state();
		let a = handle(&s, "a");
		assert!(!s.begin_drag(a, 600.0, 300.0));
		assert!(!s.is_dragging());
		assert!(s.end_drag().is_none());
	}

	#[test]
	fn drag_pins_then_releases() {
		let mut s = state();
		s.editable = true;
		let a = handle(&s, "a");
		assert!(s.begin_drag(a, 600.0, 300.0));
		s.drag_to(650.0, 320.0);
		let node = s.layout.graph().node(a).unwrap();
		assert_eq!(node.pinned(), Some((250.0, 20.0)));
		s.tick(0.016);
		let node = s.layout.graph().node(a).unwrap();
		assert_eq!((node.x, node.y), (250.0, 20.0));

		let end = s.end_drag().unwrap();
		assert_eq!(end, DragEnd { id: "a".into(), x: 250.0, y: 20.0 });
		assert_eq!(s.layout.graph().node(a).unwrap().pinned(), None);
		assert!(!s.is_dragging());
	}

	#[test]
	fn drag_can_keep_pin() {
		let mut s = state();
		s.editable = true;
		s.pin_on_release = true;
		let a = handle(&s, "a");
		s.begin_drag(a, 600.0, 300.0);
		s.drag_to(610.0, 300.0);
		s.end_drag();
		assert_eq!(s.layout.graph().node(a).unwrap().pinned(), Some((210.0, 0.0)));
	}

	#[test]
	fn zoom_is_clamped() {
		let mut s = state();
		for _ in 0..50 {
			s.zoom_in();
		}
		assert_eq!(s.transform.k, s.zoom.max_zoom);
		for _ in 0..100 {
			s.wheel(1.0, 10.0, 10.0);
		}
		assert_eq!(s.transform.k, s.zoom.min_zoom);
		s.reset_zoom();
		assert_eq!(s.transform, ViewTransform { x: 400.0, y: 300.0, k: 1.0 });
	}

	#[test]
	fn zoom_keeps_anchor_point_fixed() {
		let mut s = state();
		let before = s.screen_to_graph(123.0, 456.0);
		s.zoom_at(2.0, 123.0, 456.0);
		let after = s.screen_to_graph(123.0, 456.0);
		assert!((before.0 - after.0).abs() < 1e-9 && (before.1 - after.1).abs() < 1e-9);
	}

	#[test]
	fn inverted_or_broken_zoom_bounds_do_not_panic() {
		let config: crate::components::knowledge_graph::config::GraphConfig =
			serde_json::from_str(r#"{"zoom": {"min_zoom": 5.0}}"#).unwrap();
		let layout = state().layout;
		let mut s = KnowledgeGraphState::new(layout, 800.0, 600.0, config.zoom);
		assert_eq!((s.zoom.min_zoom, s.zoom.max_zoom), (4.0, 5.0));
		s.zoom_in();
		s.zoom_out();
		s.wheel(1.0, 10.0, 10.0);
		assert!(s.transform.k >= 4.0 && s.transform.k <= 5.0);

		let zoom = ZoomConfig {
			min_zoom: f64::NAN,
			max_zoom: -1.0,
			step: f64::INFINITY,
			wheel_factor: 0.5,
		}
		.normalized();
		assert_eq!(zoom.min_zoom, 0.2);
		assert_eq!(zoom.max_zoom, 4.0);
		assert_eq!(zoom.step, 1.25);
		assert_eq!(zoom.wheel_factor, 1.1);

		s.zoom = ZoomConfig {
			min_zoom: 3.0,
			max_zoom: 1.0,
			..ZoomConfig::default()
		};
		s.zoom_in();
		assert!(s.transform.k.is_finite());
	}

	#[test]
	fn tap_on_node_clicks() {
		let mut s = state();
		let scale = ScaleConfig::default();
		s.pointer_down(600.0, 300.0, &scale);
		let out = s.pointer_move(601.0, 301.0, &scale);
		assert_eq!(out.hover, Some(Some("a".into())));
		let out = s.pointer_up();
		assert_eq!(out.click.as_deref(), Some("a"));
		assert_eq!(out.drag_end, None);
	}

	#[test]
	fn touch_tap_clicks_and_ends_hover() {
		let mut s = state();
		s.editable = true;
		let scale = ScaleConfig::default();
		s.pointer_down(600.0, 300.0, &scale);
		let out = s.touch_end();
		assert_eq!(out.click.as_deref(), Some("a"));
		assert_eq!(out.drag_end, None);
		assert!(!s.is_dragging());

		s.pointer_move(600.0, 300.0, &scale);
		s.pointer_down(600.0, 300.0, &scale);
		let out = s.touch_end();
		assert_eq!(out.click.as_deref(), Some("a"));
		assert_eq!(out.hover, Some(None));
	}

	#[test]
	fn moving_past_slop_reports_drag_end() {
		let mut s = state();
		s.editable = true;
		let scale = ScaleConfig::default();
		s.pointer_down(600.0, 300.0, &scale);
		s.pointer_move(650.0, 320.0, &scale);
		let out = s.pointer_up();
		assert_eq!(out.click, None);
		assert_eq!(
			out.drag_end,
			Some(DragEnd {
				id: "a".into(),
				x: 250.0,
				y: 20.0
			})
		);
	}

	#[test]
	fn drag_on_read_only_view_reports_nothing() {
		let mut s = state();
		let scale = ScaleConfig::default();
		s.pointer_down(600.0, 300.0, &scale);
		s.pointer_move(650.0, 320.0, &scale);
		let out = s.pointer_up();
		assert_eq!(out, PointerOutcome::default());
		let a = handle(&s, "a");
		assert_eq!(s.layout.graph().node(a).unwrap().pinned(), None);
	}

	#[test]
	fn hover_end_reports_none() {
		let mut s = state();
		let scale = ScaleConfig::default();
		let out = s.pointer_move(600.0, 300.0, &scale);
		assert_eq!(out.hover, Some(Some("a".into())));
		let out = s.pointer_move(400.0, 300.0, &scale);
		assert_eq!(out.hover, Some(None));

		s.pointer_move(600.0, 300.0, &scale);
		let out = s.pointer_leave();
		assert_eq!(out.hover, Some(None));
		assert_eq!(out.click, None);
	}

	#[test]
	fn leaving_mid_press_does_not_click() {
		let mut s = state();
		let scale = ScaleConfig::default();
		s.pointer_down(600.0, 300.0, &scale);
		let out = s.pointer_leave();
		assert_eq!(out.click, None);
		assert!(s.press.is_none());
	}

	#[test]
	fn pan_moves_transform() {
		let mut s = state();
		s.begin_pan(100.0, 100.0);
		s.pan_to(130.0, 90.0);
		s.end_pan();
		s.pan_to(500.0, 500.0);
		assert_eq!((s.transform.x, s.transform.y), (430.0, 290.0));
	}
}
