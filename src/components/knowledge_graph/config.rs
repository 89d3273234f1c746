//! Host-supplied configuration.
//!
//! Every field has a default, so an empty object (or no config at all) gives
//! the stock behavior.

use serde::Deserialize;

use super::simulation::SimulationConfig;
use super::state::ZoomConfig;
use super::theme::Theme;
use super::transform::LayoutConfig;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
	pub layout: LayoutConfig,
	pub simulation: SimulationConfig,
	pub zoom: ZoomConfig,
	/// Allow dragging nodes.
	pub editable: bool,
	/// Keep dragged nodes pinned after release.
	pub pin_on_release: bool,
	/// `"dark"` or `"light"`.
	pub theme: Option<String>,
}

impl GraphConfig {
	pub fn theme(&self) -> Theme {
		match self.theme.as_deref() {
			Some("light") => Theme::light(),
			_ => Theme::dark(),
		}
	}
}
