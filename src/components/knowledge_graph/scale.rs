//! Zoom-dependent sizing of graph visuals.
//!
//! Positions live in world space; the canvas transform scales them by the
//! zoom factor `k`. Some elements should grow with zoom (node circles), others
//! should keep their pixel size (line widths, hit targets on small screens).

/// How a visual size reacts to the zoom factor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScaleBehavior {
	/// Constant world-space size. Appears larger when zoomed in.
	World,
	/// Constant screen-space size in pixels.
	Screen,
	/// World-space size kept inside screen-space bounds.
	Clamped { min_screen: f64, max_screen: f64 },
}

impl ScaleBehavior {
	/// World-space value for `base` at zoom `k`.
	pub fn apply(&self, base: f64, k: f64) -> f64 {
		match *self {
			ScaleBehavior::World => base,
			ScaleBehavior::Screen => base / k,
			ScaleBehavior::Clamped {
				min_screen,
				max_screen,
			} => base.clamp(min_screen / k, max_screen / k),
		}
	}
}

/// Base sizes, all in world units unless noted.
#[derive(Clone, Debug)]
pub struct ScaleConfig {
	pub node_radius: f64,
	pub node_behavior: ScaleBehavior,
	/// Pointer hit radius around a node center.
	pub hit_radius: f64,
	pub hit_behavior: ScaleBehavior,
	/// Label font size in screen pixels.
	pub label_size: f64,
	/// Below this zoom the label font stops growing in world space.
	pub label_min_k: f64,
	/// Edge line width in screen pixels.
	pub edge_width: f64,
	pub arrow_size: f64,
	/// Hover ring width in screen pixels.
	pub ring_width: f64,
}

impl Default for ScaleConfig {
	fn default() -> Self {
		Self {
			node_radius: 18.0,
			node_behavior: ScaleBehavior::Clamped {
				min_screen: 6.0,
				max_screen: f64::INFINITY,
			},
			hit_radius: 20.0,
			hit_behavior: ScaleBehavior::Clamped {
				min_screen: 10.0,
				max_screen: f64::INFINITY,
			},
			label_size: 12.0,
			label_min_k: 0.5,
			edge_width: 1.5,
			arrow_size: 7.0,
			ring_width: 2.0,
		}
	}
}

/// Scale values resolved for one zoom level. Build once per frame.
#[derive(Clone, Debug)]
pub struct ScaledValues {
	pub k: f64,
	pub node_radius: f64,
	pub hit_radius: f64,
	pub label_font: String,
	pub edge_width: f64,
	pub arrow_size: f64,
	pub ring_width: f64,
}

impl ScaledValues {
	pub fn new(config: &ScaleConfig, k: f64) -> Self {
		let label_px = config.label_size / k.max(config.label_min_k);
		Self {
			k,
			node_radius: config.node_behavior.apply(config.node_radius, k),
			hit_radius: config.hit_behavior.apply(config.hit_radius, k),
			label_font: format!("{}px sans-serif", label_px),
			edge_width: config.edge_width / k,
			arrow_size: ScaleBehavior::World.apply(config.arrow_size, k),
			ring_width: ScaleBehavior::Screen.apply(config.ring_width, k),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn clamped_keeps_minimum_screen_size() {
		let b = ScaleBehavior::Clamped {
			min_screen: 6.0,
			max_screen: 30.0,
		};
		// zoomed far out: 18 world units would be 1.8px, clamp to 6px => 60 world units
		assert!((b.apply(18.0, 0.1) - 60.0).abs() < 1e-9);
		// zoomed far in: 18 * 4 = 72px > 30px => 7.5 world units
		assert!((b.apply(18.0, 4.0) - 7.5).abs() < 1e-9);
		assert_eq!(b.apply(18.0, 1.0), 18.0);
	}

	#[test]
	fn screen_sizes_counter_zoom() {
		let s = ScaledValues::new(&ScaleConfig::default(), 2.0);
		assert_eq!(s.edge_width, 0.75);
		assert_eq!(s.ring_width, 1.0);
		assert_eq!(s.arrow_size, 7.0);
	}
}
