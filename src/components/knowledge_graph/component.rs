//! Leptos component wrapping the knowledge-graph canvas.
//!
//! The component creates an HTML canvas element and wires up mouse, touch and
//! wheel handlers for node dragging, panning and zooming. An animation loop
//! runs via `requestAnimationFrame`, ticking the layout and redrawing each
//! frame until the component is unmounted.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use leptos::prelude::*;
use log::{debug, info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, TouchEvent, WheelEvent, Window,
};

use super::config::GraphConfig;
use super::overlay::ProgressOverlay;
use super::render;
use super::scale::ScaleConfig;
use super::simulation::ForceLayout;
use super::state::{KnowledgeGraphState, PointerOutcome};
use super::theme::Theme;
use super::transform::transform_with;
use super::types::{GraphData, ProgressMap};
use super::validate::validate;

/// Fixed simulation step per animation frame.
const FRAME_DT: f64 = 0.016;

/// Host callbacks, copied into every handler.
#[derive(Clone, Copy)]
struct Callbacks {
	click: Option<Callback<String>>,
	hover: Option<Callback<Option<String>>>,
	drag_end: Option<Callback<(String, f64, f64)>>,
}

impl Callbacks {
	fn dispatch(&self, out: PointerOutcome) {
		if let (Some(cb), Some(id)) = (self.hover, out.hover) {
			cb.run(id);
		}
		if let (Some(cb), Some(id)) = (self.click, out.click) {
			cb.run(id);
		}
		if let (Some(cb), Some(end)) = (self.drag_end, out.drag_end) {
			cb.run((end.id, end.x, end.y));
		}
	}
}

/// Bundles graph state with the drawing surface and visual configuration.
struct GraphContext {
	state: KnowledgeGraphState,
	ctx: CanvasRenderingContext2d,
	scale: ScaleConfig,
	theme: Theme,
}

impl GraphContext {
	fn new(
		data: &GraphData,
		progress: &ProgressMap,
		config: &GraphConfig,
		ctx: CanvasRenderingContext2d,
		width: f64,
		height: f64,
	) -> Self {
		let report = validate(data);
		for issue in &report.errors {
			warn!("lesson-graph: {}", issue);
		}
		let outcome = transform_with(data, &config.layout);
		let mut layout = ForceLayout::new(outcome.graph, config.simulation.clone());
		layout.apply_progress(progress);

		let mut state = KnowledgeGraphState::new(layout, width, height, config.zoom.clone());
		state.editable = config.editable;
		state.pin_on_release = config.pin_on_release;

		Self {
			state,
			ctx,
			scale: ScaleConfig::default(),
			theme: config.theme(),
		}
	}
}

type SharedContext = Rc<RefCell<Option<GraphContext>>>;
type FrameSlot = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

/// Browser resources held by one mounted canvas.
///
/// The frame closure only holds a weak reference to its own slot, so dropping
/// this struct frees the closure, the context and the layout.
struct FrameLoop {
	animate: FrameSlot,
	raf_id: Rc<Cell<Option<i32>>>,
	resize: Option<Closure<dyn FnMut()>>,
	context: SharedContext,
}

impl FrameLoop {
	fn is_running(&self) -> bool {
		self.animate.borrow().is_some()
	}

	/// Cancel the pending frame, detach the resize listener and drop both
	/// closures. Must not run from inside the frame closure.
	fn teardown(&mut self) {
		let window = web_sys::window();
		if let (Some(win), Some(id)) = (&window, self.raf_id.take()) {
			let _ = win.cancel_animation_frame(id);
		}
		if let Some(cb) = self.resize.take() {
			if let Some(win) = &window {
				let _ = win.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}
		self.animate.borrow_mut().take();
		if let Some(mut c) = self.context.borrow_mut().take() {
			c.state.layout.stop();
		}
		debug!("lesson-graph: frame loop torn down");
	}
}

fn viewport_size(window: &Window) -> Option<(f64, f64)> {
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

fn local_point(
	canvas_ref: NodeRef<leptos::html::Canvas>,
	client_x: i32,
	client_y: i32,
) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((client_x as f64 - rect.left(), client_y as f64 - rect.top()))
}

fn touch_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &TouchEvent) -> Option<(f64, f64)> {
	let touch = ev.touches().get(0)?;
	local_point(canvas_ref, touch.client_x(), touch.client_y())
}

/// Run `f` against the live context, if there is one.
fn with_context<R>(context: &SharedContext, f: impl FnOnce(&mut GraphContext) -> R) -> Option<R> {
	context.borrow_mut().as_mut().map(f)
}

/// Renders an interactive lesson dependency graph.
///
/// Pass graph data via the reactive `data` signal and, optionally, a progress
/// feed keyed by lesson id. The component sizes itself to its parent container
/// by default; set `fullscreen = true` to fill the viewport. With no nodes it
/// shows an empty-state message and never starts the layout.
#[component]
pub fn KnowledgeGraphCanvas(
	#[prop(into)] data: Signal<GraphData>,
	#[prop(optional, into)] progress: Option<Signal<ProgressMap>>,
	#[prop(optional)] config: GraphConfig,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
	#[prop(default = true)] show_legend: bool,
	/// Called with the lesson id on click.
	#[prop(optional)]
	on_node_click: Option<Callback<String>>,
	/// Called with the hovered lesson id, or `None` when hover ends.
	#[prop(optional)]
	on_node_hover: Option<Callback<Option<String>>>,
	/// Called with the lesson id and final position after a drag.
	#[prop(optional)]
	on_node_drag_end: Option<Callback<(String, f64, f64)>>,
) -> impl IntoView {
	let progress = progress.unwrap_or_else(|| Signal::derive(ProgressMap::new));
	let callbacks = Callbacks {
		click: on_node_click,
		hover: on_node_hover,
		drag_end: on_node_drag_end,
	};
	let theme = config.theme();
	let has_nodes = Signal::derive(move || !data.read().nodes.is_empty());

	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let context: SharedContext = Rc::new(RefCell::new(None));
	let animate: FrameSlot = Rc::new(RefCell::new(None));
	let raf_id = Rc::new(Cell::new(None));
	let cancelled = Arc::new(AtomicBool::new(false));

	let frames = StoredValue::new_local(FrameLoop {
		animate: animate.clone(),
		raf_id: raf_id.clone(),
		resize: None,
		context: context.clone(),
	});

	let cancelled_cleanup = cancelled.clone();
	on_cleanup(move || {
		cancelled_cleanup.store(true, Ordering::Relaxed);
		let _ = frames.try_update_value(FrameLoop::teardown);
	});

	let context_init = context.clone();
	Effect::new(move |_| {
		let graph = data.get();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if graph.nodes.is_empty() {
			info!("lesson-graph: no lessons to display");
			*context_init.borrow_mut() = None;
			return;
		}
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			warn!("lesson-graph: no window, skipping setup");
			return;
		};

		let (w, h) = if fullscreen {
			viewport_size(&window).unwrap_or((800.0, 600.0))
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let ctx: CanvasRenderingContext2d = match canvas.get_context("2d") {
			Ok(Some(obj)) => match obj.dyn_into() {
				Ok(ctx) => ctx,
				Err(_) => {
					warn!("lesson-graph: 2d context has unexpected type");
					return;
				}
			},
			_ => {
				warn!("lesson-graph: canvas 2d context unavailable");
				return;
			}
		};

		*context_init.borrow_mut() = Some(GraphContext::new(
			&graph,
			&progress.get_untracked(),
			&config,
			ctx,
			w,
			h,
		));

		// The frame loop reads whatever context is current, so a data change
		// only needs the context swap above.
		if frames.try_with_value(FrameLoop::is_running).unwrap_or(true) {
			return;
		}

		if fullscreen {
			let (context_resize, canvas_resize) = (context_init.clone(), canvas.clone());
			let on_resize: Closure<dyn FnMut()> = Closure::new(move || {
				let Some((nw, nh)) = web_sys::window().as_ref().and_then(viewport_size) else {
					return;
				};
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				with_context(&context_resize, |c| c.state.resize(nw, nh));
			});
			let _ = window
				.add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref());
			frames.update_value(|f| f.resize = Some(on_resize));
		}

		let (context_anim, raf_anim, cancelled_anim) =
			(context_init.clone(), raf_id.clone(), cancelled.clone());
		let slot = Rc::downgrade(&animate);
		*animate.borrow_mut() = Some(Closure::new(move || {
			raf_anim.set(None);
			if cancelled_anim.load(Ordering::Relaxed) {
				with_context(&context_anim, |c| c.state.layout.stop());
				return;
			}
			with_context(&context_anim, |c| {
				c.state.tick(FRAME_DT);
				render::render(&c.state, &c.ctx, &c.scale, &c.theme);
			});
			let (Some(slot), Some(win)) = (slot.upgrade(), web_sys::window()) else {
				return;
			};
			if let Some(cb) = slot.borrow().as_ref() {
				if let Ok(id) = win.request_animation_frame(cb.as_ref().unchecked_ref()) {
					raf_anim.set(Some(id));
				}
			}
		}));
		if let Some(cb) = animate.borrow().as_ref() {
			if let Ok(id) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
				raf_id.set(Some(id));
			}
		}
	});

	let context_pg = context.clone();
	Effect::new(move |_| {
		let feed = progress.get();
		with_context(&context_pg, |c| c.state.layout.apply_progress(&feed));
	});

	let context_md = context.clone();
	let on_mousedown = move |ev: MouseEvent| {
		if let Some((x, y)) = local_point(canvas_ref, ev.client_x(), ev.client_y()) {
			with_context(&context_md, |c| c.state.pointer_down(x, y, &c.scale));
		}
	};

	let context_mm = context.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = local_point(canvas_ref, ev.client_x(), ev.client_y()) else {
			return;
		};
		if let Some(out) = with_context(&context_mm, |c| c.state.pointer_move(x, y, &c.scale)) {
			callbacks.dispatch(out);
		}
	};

	let context_mu = context.clone();
	let on_mouseup = move |_: MouseEvent| {
		if let Some(out) = with_context(&context_mu, |c| c.state.pointer_up()) {
			callbacks.dispatch(out);
		}
	};

	let context_ml = context.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(out) = with_context(&context_ml, |c| c.state.pointer_leave()) {
			callbacks.dispatch(out);
		}
	};

	let context_wh = context.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		if let Some((x, y)) = local_point(canvas_ref, ev.client_x(), ev.client_y()) {
			with_context(&context_wh, |c| c.state.wheel(ev.delta_y(), x, y));
		}
	};

	let context_ts = context.clone();
	let on_touchstart = move |ev: TouchEvent| {
		if let Some((x, y)) = touch_point(canvas_ref, &ev) {
			ev.prevent_default();
			with_context(&context_ts, |c| c.state.pointer_down(x, y, &c.scale));
		}
	};

	let context_tm = context.clone();
	let on_touchmove = move |ev: TouchEvent| {
		let Some((x, y)) = touch_point(canvas_ref, &ev) else {
			return;
		};
		ev.prevent_default();
		if let Some(out) = with_context(&context_tm, |c| c.state.pointer_move(x, y, &c.scale)) {
			callbacks.dispatch(out);
		}
	};

	let context_te = context.clone();
	let on_touchend = move |_: TouchEvent| {
		if let Some(out) = with_context(&context_te, |c| c.state.touch_end()) {
			callbacks.dispatch(out);
		}
	};

	let context_zi = context.clone();
	let on_zoom_in = move |_: MouseEvent| {
		with_context(&context_zi, |c| c.state.zoom_in());
	};
	let context_zo = context.clone();
	let on_zoom_out = move |_: MouseEvent| {
		with_context(&context_zo, |c| c.state.zoom_out());
	};
	let context_zr = context.clone();
	let on_zoom_reset = move |_: MouseEvent| {
		with_context(&context_zr, |c| c.state.reset_zoom());
	};

	let container_style = if fullscreen {
		"position: relative; width: 100vw; height: 100vh;"
	} else {
		"position: relative; width: 100%; height: 100%;"
	};

	view! {
		<div class="knowledge-graph" style=container_style>
			<canvas
				node_ref=canvas_ref
				class="knowledge-graph-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				on:touchstart=on_touchstart
				on:touchmove=on_touchmove
				on:touchend=on_touchend
				style=move || {
					if has_nodes.get() { "display: block; cursor: grab;" } else { "display: none;" }
				}
			/>
			{move || {
				(!has_nodes.get())
					.then(|| view! { <div class="graph-empty">"No lessons to display"</div> })
			}}
			<div class="zoom-controls">
				<button class="zoom-in" title="Zoom in" on:click=on_zoom_in>"+"</button>
				<button class="zoom-out" title="Zoom out" on:click=on_zoom_out>"−"</button>
				<button class="zoom-reset" title="Reset zoom" on:click=on_zoom_reset>"⟲"</button>
			</div>
			{show_legend.then(|| view! { <ProgressOverlay data=data progress=progress theme=theme /> })}
		</div>
	}
}
