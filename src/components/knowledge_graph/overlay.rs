//! Legend and progress summary drawn over the canvas.

use leptos::prelude::*;

use super::stats::{legend_entries, progress_stats};
use super::theme::Theme;
use super::types::{GraphData, ProgressMap};

/// Status legend with counts, plus overall completion figures.
#[component]
pub fn ProgressOverlay(
	#[prop(into)] data: Signal<GraphData>,
	#[prop(into)] progress: Signal<ProgressMap>,
	#[prop(optional)] theme: Theme,
) -> impl IntoView {
	let stats = Memo::new(move |_| {
		let graph = data.read();
		progress_stats(graph.nodes.iter().map(|n| n.id.as_str()), &progress.read())
	});

	let rows = move || {
		legend_entries(&stats.get(), &theme)
			.into_iter()
			.map(|entry| {
				let swatch = format!(
					"display: inline-block; width: 10px; height: 10px; border-radius: 50%; background: {}; opacity: {};",
					entry.color.to_css(),
					entry.opacity
				);
				view! {
					<li class="legend-entry" data-status=entry.status.to_string()>
						<span class="legend-swatch" style=swatch></span>
						<span class="legend-label">{entry.label}</span>
						<span class="legend-count">{entry.count}</span>
					</li>
				}
			})
			.collect_view()
	};

	view! {
		<div class="progress-overlay">
			<ul class="legend">{rows}</ul>
			<Show when=move || { stats.read().total_lessons > 0 }>
				<p class="progress-summary">
					{move || {
						let s = stats.get();
						format!(
							"{} of {} lessons completed ({:.0}%), average progress {:.0}%",
							s.completed_lessons,
							s.total_lessons,
							s.completion_rate(),
							s.average_completion,
						)
					}}
				</p>
			</Show>
		</div>
	}
}
