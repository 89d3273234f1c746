//! Visual theming for the knowledge graph.
//!
//! Status colors, opacity and edge dash lookups are pure functions so the
//! renderer, the legend and tests all agree on one mapping.

use super::types::{EdgeKind, LessonStatus};

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	pub a: f64,
}

impl Color {
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	pub fn with_alpha(self, a: f64) -> Self {
		Self { a, ..self }
	}

	/// Lighten the color by a factor (0.0 = unchanged, 1.0 = white)
	pub fn lighten(self, factor: f64) -> Self {
		let f = factor.clamp(0.0, 1.0);
		Self {
			r: (self.r as f64 + (255.0 - self.r as f64) * f) as u8,
			g: (self.g as f64 + (255.0 - self.g as f64) * f) as u8,
			b: (self.b as f64 + (255.0 - self.b as f64) * f) as u8,
			a: self.a,
		}
	}

	/// Blend towards gray by a factor (0.0 = unchanged, 1.0 = fully gray)
	pub fn desaturate(self, factor: f64) -> Self {
		let f = factor.clamp(0.0, 1.0);
		let gray = 0.299 * self.r as f64 + 0.587 * self.g as f64 + 0.114 * self.b as f64;
		let mix = |c: u8| (c as f64 * (1.0 - f) + gray * f) as u8;
		Self {
			r: mix(self.r),
			g: mix(self.g),
			b: mix(self.b),
			a: self.a,
		}
	}

	/// Perceived brightness in `0..=255`.
	pub fn luminance(self) -> f64 {
		0.299 * self.r as f64 + 0.587 * self.g as f64 + 0.114 * self.b as f64
	}

	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}
}

/// Base and hover colors for each lesson status.
#[derive(Clone, Debug)]
pub struct StatusPalette {
	pub not_started: (Color, Color),
	pub in_progress: (Color, Color),
	pub completed: (Color, Color),
	pub locked: (Color, Color),
}

impl Default for StatusPalette {
	fn default() -> Self {
		Self {
			not_started: (Color::rgb(156, 163, 175), Color::rgb(209, 213, 219)),
			in_progress: (Color::rgb(59, 130, 246), Color::rgb(96, 165, 250)),
			completed: (Color::rgb(34, 197, 94), Color::rgb(74, 222, 128)),
			locked: (Color::rgb(239, 68, 68), Color::rgb(248, 113, 113)),
		}
	}
}

impl StatusPalette {
	pub fn color(&self, status: LessonStatus, hovered: bool) -> Color {
		let (base, hover) = match status {
			LessonStatus::NotStarted => self.not_started,
			LessonStatus::InProgress => self.in_progress,
			LessonStatus::Completed => self.completed,
			LessonStatus::Locked => self.locked,
		};
		if hovered { hover } else { base }
	}
}

/// Color for a node in the default palette. Hovered nodes use the brighter variant.
pub fn color_for(status: LessonStatus, hovered: bool) -> Color {
	StatusPalette::default().color(status, hovered)
}

/// Node opacity. Locked lessons are drawn at half strength.
pub fn opacity_for(status: LessonStatus) -> f64 {
	match status {
		LessonStatus::Locked => 0.5,
		_ => 1.0,
	}
}

/// Stroke pattern of an edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeDash {
	Solid,
	/// Short dashes, used for suggested edges.
	Fine,
	/// Long dashes, used for edges leaving a locked lesson.
	Coarse,
}

impl EdgeDash {
	/// Dash pattern `(dash, gap)` in world units, `None` when solid.
	pub fn pattern(self) -> Option<(f64, f64)> {
		match self {
			EdgeDash::Solid => None,
			EdgeDash::Fine => Some((4.0, 4.0)),
			EdgeDash::Coarse => Some((10.0, 6.0)),
		}
	}
}

/// Dash for an edge. A locked source wins over the edge kind.
pub fn edge_dash_for(kind: EdgeKind, source_is_locked: bool) -> EdgeDash {
	if source_is_locked {
		return EdgeDash::Coarse;
	}
	match kind {
		EdgeKind::Prerequisite => EdgeDash::Solid,
		EdgeKind::Suggested => EdgeDash::Fine,
	}
}

/// Shorten `text` to at most `max_chars` characters, ending in `...` when cut.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
	if text.chars().count() <= max_chars {
		return text.to_string();
	}
	let keep = max_chars.saturating_sub(3);
	let mut out: String = text.chars().take(keep).collect();
	out.push_str(&"..."[..max_chars.min(3)]);
	out
}

/// Background style configuration.
#[derive(Clone, Debug)]
pub struct BackgroundStyle {
	pub color: Color,
	/// Secondary color for the radial gradient
	pub color_secondary: Color,
	pub use_gradient: bool,
}

/// Edge visual style.
#[derive(Clone, Debug)]
pub struct EdgeStyle {
	pub color: Color,
	/// Color of edges touching the hovered node.
	pub highlight_color: Color,
}

/// Label style.
#[derive(Clone, Debug)]
pub struct LabelStyle {
	pub color: Color,
	/// Labels longer than this are truncated.
	pub max_chars: usize,
}

/// Complete visual theme.
#[derive(Clone, Debug)]
pub struct Theme {
	pub name: &'static str,
	pub background: BackgroundStyle,
	pub edge: EdgeStyle,
	pub label: LabelStyle,
	pub status: StatusPalette,
	/// How strongly non-highlighted nodes fade while something is hovered.
	pub dim_strength: f64,
}

impl Theme {
	/// Dark theme (default)
	pub fn dark() -> Self {
		Self {
			name: "dark",
			background: BackgroundStyle {
				color: Color::rgb(22, 27, 34),
				color_secondary: Color::rgb(30, 35, 42),
				use_gradient: true,
			},
			edge: EdgeStyle {
				color: Color::rgba(140, 160, 180, 0.6),
				highlight_color: Color::rgba(226, 232, 240, 0.9),
			},
			label: LabelStyle {
				color: Color::rgba(255, 255, 255, 0.9),
				max_chars: 20,
			},
			status: StatusPalette::default(),
			dim_strength: 0.7,
		}
	}

	/// Light theme for embedding in white dashboards
	pub fn light() -> Self {
		Self {
			name: "light",
			background: BackgroundStyle {
				color: Color::rgb(248, 250, 252),
				color_secondary: Color::rgb(255, 255, 255),
				use_gradient: false,
			},
			edge: EdgeStyle {
				color: Color::rgba(100, 116, 139, 0.6),
				highlight_color: Color::rgba(30, 41, 59, 0.9),
			},
			label: LabelStyle {
				color: Color::rgba(15, 23, 42, 0.9),
				max_chars: 20,
			},
			status: StatusPalette::default(),
			dim_strength: 0.6,
		}
	}
}

impl Default for Theme {
	fn default() -> Self {
		Self::dark()
	}
}
