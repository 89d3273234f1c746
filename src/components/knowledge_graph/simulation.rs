//! Force-directed layout of the working graph.
//!
//! The `force_graph` integrator handles pairwise charge and velocity damping.
//! Link springs with a rest length, a weak centering pull and collision
//! separation run as position passes after each integration step. Everything
//! is scaled by a cooling `alpha` that decays towards a target; the layout
//! stops ticking once alpha falls below a threshold.

use force_graph::{ForceGraph, NodeData, SimulationParameters};
use log::{debug, info};
use serde::Deserialize;

use super::transform::{NodeHandle, WorkingGraph, WorkingNode};
use super::types::{EdgeKind, LessonStatus, ProgressMap};

/// Physics tuning.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
	/// Pairwise charge. Negative values repel.
	pub charge_strength: f64,
	/// Rest length of link springs.
	pub link_distance: f64,
	/// Spring stiffness in `0..=1`, divided by the lower endpoint degree.
	pub link_strength: f64,
	/// Fraction of the centroid offset removed each tick.
	pub center_strength: f64,
	/// Point the graph is pulled towards, in graph coordinates.
	pub center: (f64, f64),
	/// Nodes are kept at least twice this far apart.
	pub collision_radius: f64,
	pub alpha_decay: f64,
	/// Layout stops once alpha drops below this.
	pub alpha_min: f64,
	/// Alpha the layout warms to while a node is being dragged.
	pub drag_alpha_target: f64,
	pub max_force: f64,
	pub damping: f64,
	pub node_speed: f64,
	pub node_mass: f64,
}

impl Default for SimulationConfig {
	fn default() -> Self {
		Self {
			charge_strength: -300.0,
			link_distance: 120.0,
			link_strength: 0.7,
			center_strength: 0.05,
			center: (0.0, 0.0),
			collision_radius: 30.0,
			alpha_decay: 0.0228,
			alpha_min: 0.001,
			drag_alpha_target: 0.3,
			max_force: 100.0,
			damping: 0.9,
			node_speed: 3000.0,
			node_mass: 10.0,
		}
	}
}

/// Whether the layout is still producing ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutState {
	Running,
	Stopped,
}

/// Edge endpoints re-projected to the current node positions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeSegment {
	pub source: NodeHandle,
	pub target: NodeHandle,
	pub kind: EdgeKind,
	pub source_locked: bool,
	pub x1: f64,
	pub y1: f64,
	pub x2: f64,
	pub y2: f64,
}

/// Owns node positions for the lifetime of a visualization.
///
/// Outside code never writes positions directly; dragging goes through
/// [`ForceLayout::set_pinned`].
pub struct ForceLayout {
	graph: WorkingGraph,
	physics: ForceGraph<NodeHandle, ()>,
	config: SimulationConfig,
	degree: Vec<usize>,
	alpha: f64,
	alpha_target: f64,
	state: LayoutState,
	ticks: u64,
}

impl ForceLayout {
	pub fn new(graph: WorkingGraph, config: SimulationConfig) -> Self {
		let mut physics = ForceGraph::new(SimulationParameters {
			force_charge: (-config.charge_strength) as f32,
			// springs are handled by the link pass
			force_spring: 0.0,
			force_max: config.max_force as f32,
			node_speed: config.node_speed as f32,
			damping_factor: config.damping as f32,
		});

		for (i, node) in graph.nodes.iter().enumerate() {
			let (x, y) = node.pinned().unwrap_or((node.x, node.y));
			physics.add_node(NodeData {
				x: x as f32,
				y: y as f32,
				mass: config.node_mass as f32,
				is_anchor: node.pinned().is_some(),
				user_data: NodeHandle(i),
			});
		}

		let mut degree = vec![0; graph.len()];
		for edge in &graph.edges {
			degree[edge.source.0] += 1;
			degree[edge.target.0] += 1;
		}

		let state = if graph.is_empty() {
			info!("lesson-graph: empty graph, layout not started");
			LayoutState::Stopped
		} else {
			info!(
				"lesson-graph: layout started with {} nodes, {} edges",
				graph.len(),
				graph.edges.len()
			);
			LayoutState::Running
		};

		Self {
			graph,
			physics,
			config,
			degree,
			alpha: 1.0,
			alpha_target: 0.0,
			state,
			ticks: 0,
		}
	}

	pub fn graph(&self) -> &WorkingGraph {
		&self.graph
	}

	pub fn config(&self) -> &SimulationConfig {
		&self.config
	}

	pub fn state(&self) -> LayoutState {
		self.state
	}

	pub fn is_running(&self) -> bool {
		self.state == LayoutState::Running
	}

	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	/// Number of ticks applied so far.
	pub fn ticks(&self) -> u64 {
		self.ticks
	}

	/// Stop immediately. No tick moves anything until [`ForceLayout::restart`].
	pub fn stop(&mut self) {
		if self.state == LayoutState::Running {
			info!("lesson-graph: layout stopped after {} ticks", self.ticks);
		}
		self.state = LayoutState::Stopped;
	}

	/// Resume ticking without touching alpha.
	pub fn restart(&mut self) {
		if !self.graph.is_empty() {
			self.state = LayoutState::Running;
		}
	}

	/// Set the alpha the layout cools (or warms) towards and resume ticking.
	pub fn set_alpha_target(&mut self, target: f64) {
		self.alpha_target = target.max(0.0);
		if self.alpha_target > 0.0 {
			self.restart();
		}
	}

	/// Reset alpha to `alpha` and resume, e.g. after loading new data.
	pub fn reheat(&mut self, alpha: f64) {
		self.alpha = alpha.clamp(0.0, 1.0);
		self.restart();
	}

	/// Advance the layout by one step.
	///
	/// Returns `true` when positions changed. A stopped or empty layout returns
	/// `false` and leaves every position untouched.
	pub fn tick(&mut self, dt: f64) -> bool {
		if self.state == LayoutState::Stopped {
			return false;
		}

		if self.graph.len() == 1 {
			self.settle_single();
			return true;
		}

		self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;

		self.sync_pins();
		self.physics.update((dt * self.alpha) as f32);
		self.read_back();

		self.apply_links();
		self.apply_centering();
		self.apply_collisions();
		self.snap_pins();
		self.write_back();

		self.ticks += 1;
		if self.alpha < self.config.alpha_min {
			self.state = LayoutState::Stopped;
			info!("lesson-graph: layout settled after {} ticks", self.ticks);
		}
		true
	}

	/// Tick until the layout stops or `max_ticks` is reached. Returns the ticks run.
	pub fn run_until_settled(&mut self, dt: f64, max_ticks: u64) -> u64 {
		let mut n = 0;
		while n < max_ticks && self.tick(dt) {
			n += 1;
		}
		n
	}

	/// Pin a node to a position, or release it with `None`.
	///
	/// Returns `false` for an unknown handle.
	pub fn set_pinned(&mut self, handle: NodeHandle, pin: Option<(f64, f64)>) -> bool {
		let Some(node) = self.graph.node_mut(handle) else {
			return false;
		};
		match pin {
			Some((x, y)) => {
				node.fx = Some(x);
				node.fy = Some(y);
				node.x = x;
				node.y = y;
			}
			None => {
				node.fx = None;
				node.fy = None;
			}
		}
		let (x, y, anchored) = (node.x as f32, node.y as f32, pin.is_some());
		self.physics.visit_nodes_mut(|n| {
			if n.data.user_data == handle {
				n.data.x = x;
				n.data.y = y;
				n.data.is_anchor = anchored;
			}
		});
		true
	}

	/// Update lesson statuses from a progress feed. Nodes without an entry keep
	/// their current status. Positions are not affected.
	pub fn apply_progress(&mut self, progress: &ProgressMap) -> usize {
		let mut changed = 0;
		for node in &mut self.graph.nodes {
			if let Some(entry) = progress.get(&node.id) {
				if node.status != entry.status {
					node.status = entry.status;
					changed += 1;
				}
			}
		}
		debug!("lesson-graph: progress refresh changed {} node(s)", changed);
		changed
	}

	/// Current position of every node.
	pub fn positions(&self) -> impl Iterator<Item = (NodeHandle, f64, f64)> + '_ {
		self.graph
			.nodes
			.iter()
			.enumerate()
			.map(|(i, n)| (NodeHandle(i), n.x, n.y))
	}

	/// Every edge with endpoints at the current node positions.
	pub fn edge_segments(&self) -> Vec<EdgeSegment> {
		self.graph
			.edges
			.iter()
			.map(|e| {
				let (s, t) = (&self.graph.nodes[e.source.0], &self.graph.nodes[e.target.0]);
				EdgeSegment {
					source: e.source,
					target: e.target,
					kind: e.kind,
					source_locked: s.status == LessonStatus::Locked,
					x1: s.x,
					y1: s.y,
					x2: t.x,
					y2: t.y,
				}
			})
			.collect()
	}

	fn settle_single(&mut self) {
		let (cx, cy) = self.config.center;
		let node = &mut self.graph.nodes[0];
		let (x, y) = node.pinned().unwrap_or((cx, cy));
		node.x = x;
		node.y = y;
		self.write_back();
		self.ticks += 1;
		self.alpha = 0.0;
		self.state = LayoutState::Stopped;
		info!("lesson-graph: single node settled at ({}, {})", x, y);
	}

	fn sync_pins(&mut self) {
		let nodes = &self.graph.nodes;
		self.physics.visit_nodes_mut(|n| {
			let node = &nodes[n.data.user_data.0];
			match node.pinned() {
				Some((x, y)) => {
					n.data.x = x as f32;
					n.data.y = y as f32;
					n.data.is_anchor = true;
				}
				None => n.data.is_anchor = false,
			}
		});
	}

	fn read_back(&mut self) {
		let nodes = &mut self.graph.nodes;
		self.physics.visit_nodes(|n| {
			let node = &mut nodes[n.data.user_data.0];
			let (x, y) = (n.x() as f64, n.y() as f64);
			if x.is_finite() && y.is_finite() {
				node.x = x;
				node.y = y;
			}
		});
	}

	fn write_back(&mut self) {
		let nodes = &self.graph.nodes;
		self.physics.visit_nodes_mut(|n| {
			let node = &nodes[n.data.user_data.0];
			n.data.x = node.x as f32;
			n.data.y = node.y as f32;
		});
	}

	fn apply_links(&mut self) {
		let alpha = self.alpha;
		for i in 0..self.graph.edges.len() {
			let edge = self.graph.edges[i];
			let (s, t) = (edge.source.0, edge.target.0);
			if s == t {
				continue;
			}
			let (ds, dt) = (self.degree[s].max(1), self.degree[t].max(1));
			let strength = self.config.link_strength / ds.min(dt) as f64;

			let (sx, sy) = (self.graph.nodes[s].x, self.graph.nodes[s].y);
			let (tx, ty) = (self.graph.nodes[t].x, self.graph.nodes[t].y);
			let (dx, dy) = (tx - sx, ty - sy);
			let len = (dx * dx + dy * dy).sqrt();
			if len < 1e-9 {
				continue;
			}
			let l = (len - self.config.link_distance) / len * alpha * strength;
			let (mx, my) = (dx * l, dy * l);

			let bias = ds as f64 / (ds + dt) as f64;
			let (ws, wt) = split_weights(
				bias,
				self.graph.nodes[s].pinned().is_some(),
				self.graph.nodes[t].pinned().is_some(),
			);
			let ns = &mut self.graph.nodes[s];
			ns.x += mx * ws;
			ns.y += my * ws;
			let nt = &mut self.graph.nodes[t];
			nt.x -= mx * wt;
			nt.y -= my * wt;
		}
	}

	fn apply_centering(&mut self) {
		let n = self.graph.len() as f64;
		let (sx, sy) = self
			.graph
			.nodes
			.iter()
			.fold((0.0, 0.0), |(ax, ay), node| (ax + node.x, ay + node.y));
		let (cx, cy) = self.config.center;
		let shift_x = (cx - sx / n) * self.config.center_strength;
		let shift_y = (cy - sy / n) * self.config.center_strength;
		for node in self.graph.nodes.iter_mut().filter(|n| n.pinned().is_none()) {
			node.x += shift_x;
			node.y += shift_y;
		}
	}

	fn apply_collisions(&mut self) {
		let min_dist = self.config.collision_radius * 2.0;
		let count = self.graph.len();
		for i in 0..count {
			for j in (i + 1)..count {
				let (a, b) = (&self.graph.nodes[i], &self.graph.nodes[j]);
				let (mut dx, mut dy) = (b.x - a.x, b.y - a.y);
				let mut dist = (dx * dx + dy * dy).sqrt();
				if dist >= min_dist {
					continue;
				}
				if dist < 1e-6 {
					// coincident: separate along a per-pair angle
					let angle = (i * 31 + j * 17) as f64;
					dx = angle.cos();
					dy = angle.sin();
					dist = 0.0;
				} else {
					dx /= dist;
					dy /= dist;
				}
				let overlap = min_dist - dist;
				let (wa, wb) = split_weights(0.5, a.pinned().is_some(), b.pinned().is_some());
				let na = &mut self.graph.nodes[i];
				na.x -= dx * overlap * wa;
				na.y -= dy * overlap * wa;
				let nb = &mut self.graph.nodes[j];
				nb.x += dx * overlap * wb;
				nb.y += dy * overlap * wb;
			}
		}
	}

	fn snap_pins(&mut self) {
		for node in &mut self.graph.nodes {
			if let Some((x, y)) = node.pinned() {
				node.x = x;
				node.y = y;
			}
		}
	}
}

/// Split a correction between two endpoints. A pinned endpoint takes none of
/// it; `bias` is the share given to the second endpoint when both are free.
fn split_weights(bias: f64, first_pinned: bool, second_pinned: bool) -> (f64, f64) {
	match (first_pinned, second_pinned) {
		(true, true) => (0.0, 0.0),
		(true, false) => (0.0, 1.0),
		(false, true) => (1.0, 0.0),
		(false, false) => (1.0 - bias, bias),
	}
}

/// Nodes within `radius` world units of a point, nearest first.
pub fn nodes_near(nodes: &[WorkingNode], x: f64, y: f64, radius: f64) -> Vec<NodeHandle> {
	let mut hits: Vec<(f64, NodeHandle)> = nodes
		.iter()
		.enumerate()
		.filter_map(|(i, n)| {
			let d = ((n.x - x).powi(2) + (n.y - y).powi(2)).sqrt();
			(d <= radius).then_some((d, NodeHandle(i)))
		})
		.collect();
	hits.sort_by(|a, b| a.0.total_cmp(&b.0));
	hits.into_iter().map(|(_, h)| h).collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::knowledge_graph::transform::transform;
	use crate::components::knowledge_graph::types::{GraphData, GraphEdge, GraphNode, ProgressNodeData};

	fn chain(n: usize) -> GraphData {
		GraphData {
			nodes: (0..n)
				.map(|i| GraphNode::new(format!("n{i}"), format!("Lesson {i}"), LessonStatus::NotStarted))
				.collect(),
			links: (1..n)
				.map(|i| GraphEdge::new(format!("n{}", i - 1), format!("n{i}"), EdgeKind::Prerequisite))
				.collect(),
		}
	}

	fn layout(data: &GraphData) -> ForceLayout {
		ForceLayout::new(transform(data).graph, SimulationConfig::default())
	}

	#[test]
	fn empty_graph_never_runs() {
		let mut l = layout(&GraphData::default());
		assert_eq!(l.state(), LayoutState::Stopped);
		assert!(!l.tick(0.016));
		l.restart();
		assert_eq!(l.state(), LayoutState::Stopped);
	}

	#[test]
	fn single_node_settles_at_center_immediately() {
		let mut l = layout(&chain(1));
		assert!(l.is_running());
		assert!(l.tick(0.016));
		assert_eq!(l.state(), LayoutState::Stopped);
		let (_, x, y) = l.positions().next().unwrap();
		assert_eq!((x, y), (0.0, 0.0));
		assert!(!l.tick(0.016));
	}

	#[test]
	fn cools_down_and_stops() {
		let mut l = layout(&chain(6));
		let ticks = l.run_until_settled(0.016, 10_000);
		assert!(ticks > 10 && ticks < 1_000, "ran {ticks} ticks");
		assert_eq!(l.state(), LayoutState::Stopped);
		assert!(l.alpha() < l.config().alpha_min);
		for (_, x, y) in l.positions() {
			assert!(x.is_finite() && y.is_finite());
		}
	}

	#[test]
	fn stop_freezes_positions() {
		let mut l = layout(&chain(5));
		l.tick(0.016);
		l.stop();
		let before: Vec<_> = l.positions().collect();
		for _ in 0..10 {
			assert!(!l.tick(0.016));
		}
		let after: Vec<_> = l.positions().collect();
		assert_eq!(before, after);
	}

	#[test]
	fn pinned_node_stays_put() {
		let mut data = chain(5);
		data.nodes[2].fx = Some(300.0);
		data.nodes[2].fy = Some(-40.0);
		let mut l = layout(&data);
		l.run_until_settled(0.016, 1_000);
		let node = &l.graph().nodes[2];
		assert_eq!((node.x, node.y), (300.0, -40.0));
	}

	#[test]
	fn set_pinned_then_release() {
		let mut l = layout(&chain(4));
		let h = l.graph().handle("n1").unwrap();
		assert!(l.set_pinned(h, Some((50.0, 60.0))));
		for _ in 0..20 {
			l.tick(0.016);
		}
		let n = l.graph().node(h).unwrap();
		assert_eq!((n.x, n.y), (50.0, 60.0));
		assert!(l.set_pinned(h, None));
		assert_eq!(l.graph().node(h).unwrap().pinned(), None);
		assert!(!l.set_pinned(NodeHandle(99), None));
	}

	#[test]
	fn collision_separates_coincident_nodes() {
		let mut data = chain(2);
		data.links.clear();
		for n in &mut data.nodes {
			n.x = Some(0.0);
			n.y = Some(0.0);
		}
		let mut l = layout(&data);
		l.tick(0.016);
		let (a, b) = (&l.graph().nodes[0], &l.graph().nodes[1]);
		let d = ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt();
		assert!(d >= l.config().collision_radius * 2.0 - 1e-6, "distance {d}");
	}

	#[test]
	fn edge_segments_follow_nodes() {
		let mut data = chain(3);
		data.nodes[0].status = LessonStatus::Locked;
		let mut l = layout(&data);
		l.tick(0.016);
		let segs = l.edge_segments();
		assert_eq!(segs.len(), 2);
		let n0 = &l.graph().nodes[0];
		assert_eq!((segs[0].x1, segs[0].y1), (n0.x, n0.y));
		assert!(segs[0].source_locked);
		assert!(!segs[1].source_locked);
	}

	#[test]
	fn drag_target_keeps_layout_warm() {
		let mut l = layout(&chain(3));
		l.run_until_settled(0.016, 10_000);
		assert!(!l.is_running());
		l.set_alpha_target(0.3);
		assert!(l.is_running());
		for _ in 0..500 {
			assert!(l.tick(0.016));
		}
		l.set_alpha_target(0.0);
		l.run_until_settled(0.016, 10_000);
		assert!(!l.is_running());
	}

	#[test]
	fn progress_refresh_updates_status_only() {
		let mut l = layout(&chain(2));
		let before: Vec<_> = l.positions().collect();
		let mut progress = ProgressMap::new();
		progress.insert(
			"n0".into(),
			ProgressNodeData {
				status: LessonStatus::Completed,
				percentage: 100.0,
				completed_at: None,
			},
		);
		assert_eq!(l.apply_progress(&progress), 1);
		assert_eq!(l.graph().nodes[0].status, LessonStatus::Completed);
		assert_eq!(l.graph().nodes[1].status, LessonStatus::NotStarted);
		assert_eq!(before, l.positions().collect::<Vec<_>>());
	}

	#[test]
	fn nodes_near_sorts_by_distance() {
		let nodes = transform(&chain(4)).graph.nodes;
		// first fallback node sits at (200, 0)
		let hits = nodes_near(&nodes, 190.0, 0.0, 30.0);
		assert_eq!(hits, vec![NodeHandle(0)]);
		assert!(nodes_near(&nodes, 0.0, 0.0, 10.0).is_empty());
	}
}
