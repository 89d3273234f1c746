//! Canvas rendering for the knowledge graph.
//!
//! Rendering uses multiple passes for correct z-ordering:
//! 1. Background (screen space)
//! 2. Edges with their dash pattern and arrow heads (world space)
//! 3. Dimmed nodes, then highlighted nodes and labels on top

use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::scale::{ScaleConfig, ScaledValues};
use super::simulation::EdgeSegment;
use super::state::KnowledgeGraphState;
use super::theme::{Theme, edge_dash_for, opacity_for, truncate_text};
use super::transform::{NodeHandle, WorkingNode};

fn smooth_step(t: f64) -> f64 {
	t * t * (3.0 - 2.0 * t)
}

/// Renders the complete graph to the canvas.
pub fn render(
	state: &KnowledgeGraphState,
	ctx: &CanvasRenderingContext2d,
	config: &ScaleConfig,
	theme: &Theme,
) {
	let scale = ScaledValues::new(config, state.transform.k);

	draw_background(state, ctx, theme);

	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);

	let dim = smooth_step(state.highlight.intensity()) * theme.dim_strength;
	for segment in state.layout.edge_segments() {
		draw_edge(state, ctx, &scale, theme, &segment, dim);
	}
	let _ = ctx.set_line_dash(&js_sys::Array::new());

	draw_nodes(state, ctx, &scale, theme, dim);

	ctx.restore();
}

fn draw_background(state: &KnowledgeGraphState, ctx: &CanvasRenderingContext2d, theme: &Theme) {
	let bg = &theme.background;
	let gradient = bg
		.use_gradient
		.then(|| {
			ctx.create_radial_gradient(
				state.width / 2.0,
				state.height / 2.0,
				0.0,
				state.width / 2.0,
				state.height / 2.0,
				state.width.max(state.height) * 0.8,
			)
			.ok()
		})
		.flatten();

	match gradient {
		Some(g) => {
			let _ = g.add_color_stop(0.0, &bg.color_secondary.to_css());
			let _ = g.add_color_stop(1.0, &bg.color.to_css());
			#[allow(deprecated)]
			ctx.set_fill_style(&g);
		}
		None => ctx.set_fill_style_str(&bg.color.to_css()),
	}
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
}

fn draw_edge(
	state: &KnowledgeGraphState,
	ctx: &CanvasRenderingContext2d,
	scale: &ScaledValues,
	theme: &Theme,
	seg: &EdgeSegment,
	dim: f64,
) {
	let (dx, dy) = (seg.x2 - seg.x1, seg.y2 - seg.y1);
	let dist = (dx * dx + dy * dy).sqrt();
	if dist < scale.node_radius * 2.0 {
		return;
	}
	let (ux, uy) = (dx / dist, dy / dist);

	let highlighted = state.highlight.is_edge_highlighted(seg.source, seg.target);
	let (color, width) = if highlighted {
		(theme.edge.highlight_color, scale.edge_width * 1.6)
	} else {
		let c = theme.edge.color;
		(c.with_alpha(c.a * (1.0 - dim)), scale.edge_width)
	};

	ctx.set_stroke_style_str(&color.to_css());
	ctx.set_line_width(width);
	match edge_dash_for(seg.kind, seg.source_locked).pattern() {
		Some((dash, gap)) => {
			let _ = ctx.set_line_dash(&js_sys::Array::of2(
				&JsValue::from_f64(dash),
				&JsValue::from_f64(gap),
			));
		}
		None => {
			let _ = ctx.set_line_dash(&js_sys::Array::new());
		}
	}

	let start = scale.node_radius;
	let end = scale.node_radius + scale.arrow_size;
	ctx.begin_path();
	ctx.move_to(seg.x1 + ux * start, seg.y1 + uy * start);
	ctx.line_to(seg.x2 - ux * end, seg.y2 - uy * end);
	ctx.stroke();

	let _ = ctx.set_line_dash(&js_sys::Array::new());
	ctx.set_fill_style_str(&color.to_css());
	let (tip_x, tip_y) = (seg.x2 - ux * scale.node_radius, seg.y2 - uy * scale.node_radius);
	let (back_x, back_y) = (tip_x - ux * scale.arrow_size, tip_y - uy * scale.arrow_size);
	let (px, py) = (-uy * scale.arrow_size * 0.5, ux * scale.arrow_size * 0.5);
	ctx.begin_path();
	ctx.move_to(tip_x, tip_y);
	ctx.line_to(back_x + px, back_y + py);
	ctx.line_to(back_x - px, back_y - py);
	ctx.close_path();
	ctx.fill();
}

fn draw_nodes(
	state: &KnowledgeGraphState,
	ctx: &CanvasRenderingContext2d,
	scale: &ScaledValues,
	theme: &Theme,
	dim: f64,
) {
	let nodes = &state.layout.graph().nodes;

	// Pass 1: nodes outside the highlight set
	for (i, node) in nodes.iter().enumerate() {
		let h = NodeHandle(i);
		if state.highlight.is_highlighted(h) {
			continue;
		}
		draw_node(ctx, node, scale, theme, false, 1.0 - dim);
	}

	// Pass 2: hovered node and neighbors on top, with the hover palette
	for (i, node) in nodes.iter().enumerate() {
		let h = NodeHandle(i);
		if !state.highlight.is_highlighted(h) {
			continue;
		}
		draw_node(ctx, node, scale, theme, true, 1.0);

		if state.highlight.hovered == Some(h) {
			let ring_t = smooth_step(state.highlight.intensity());
			ctx.begin_path();
			let _ = ctx.arc(node.x, node.y, scale.node_radius + scale.ring_width * 2.0, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str(&format!("rgba(255, 255, 255, {})", 0.8 * ring_t));
			ctx.set_line_width(scale.ring_width);
			ctx.stroke();
		}
	}
}

fn draw_node(
	ctx: &CanvasRenderingContext2d,
	node: &WorkingNode,
	scale: &ScaledValues,
	theme: &Theme,
	hovered: bool,
	emphasis: f64,
) {
	let alpha = opacity_for(node.status) * emphasis;
	let color = theme.status.color(node.status, hovered);
	let radius = if hovered {
		scale.node_radius * 1.15
	} else {
		scale.node_radius
	};

	ctx.set_global_alpha(alpha);
	ctx.begin_path();
	let _ = ctx.arc(node.x, node.y, radius, 0.0, 2.0 * PI);
	ctx.set_fill_style_str(&color.to_css());
	ctx.fill();

	if node.pinned().is_some() {
		ctx.set_stroke_style_str(&theme.label.color.to_css());
		ctx.set_line_width(scale.ring_width);
		ctx.stroke();
	}

	if !node.title.is_empty() {
		ctx.set_fill_style_str(&theme.label.color.to_css());
		ctx.set_font(&scale.label_font);
		ctx.set_text_align("center");
		let label = truncate_text(&node.title, theme.label.max_chars);
		let _ = ctx.fill_text(&label, node.x, node.y + radius + scale.node_radius * 0.8);
	}
	ctx.set_global_alpha(1.0);
}
