//! Progress statistics and legend data.
//!
//! Lessons that have no progress entry count as locked. Progress entries for
//! ids that are not in the graph are ignored. The average completion only
//! looks at lessons that do have an entry, so a partially loaded feed does not
//! drag the number towards zero.

use super::theme::{Color, Theme};
use super::types::{LessonStatus, ProgressMap};

/// Aggregated progress over one graph.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProgressStats {
	pub total_lessons: usize,
	pub completed_lessons: usize,
	pub in_progress_lessons: usize,
	pub not_started_lessons: usize,
	/// Lessons reported as locked plus lessons with no entry.
	pub locked_lessons: usize,
	/// Lessons that have a progress entry.
	pub tracked_lessons: usize,
	/// Mean percentage over tracked lessons, `0.0` when none are tracked.
	pub average_completion: f64,
}

impl ProgressStats {
	/// Share of all lessons that are completed, in percent.
	pub fn completion_rate(&self) -> f64 {
		if self.total_lessons == 0 {
			0.0
		} else {
			self.completed_lessons as f64 / self.total_lessons as f64 * 100.0
		}
	}

	pub fn count(&self, status: LessonStatus) -> usize {
		match status {
			LessonStatus::Completed => self.completed_lessons,
			LessonStatus::InProgress => self.in_progress_lessons,
			LessonStatus::NotStarted => self.not_started_lessons,
			LessonStatus::Locked => self.locked_lessons,
		}
	}
}

/// Count lessons by status for the given node ids.
pub fn progress_stats<'a, I>(node_ids: I, progress: &ProgressMap) -> ProgressStats
where
	I: IntoIterator<Item = &'a str>,
{
	let mut stats = ProgressStats::default();
	let mut percentage_sum = 0.0;

	for id in node_ids {
		stats.total_lessons += 1;
		let Some(entry) = progress.get(id) else {
			stats.locked_lessons += 1;
			continue;
		};
		stats.tracked_lessons += 1;
		percentage_sum += if entry.percentage.is_finite() {
			entry.percentage.clamp(0.0, 100.0)
		} else {
			0.0
		};
		match entry.status {
			LessonStatus::Completed => stats.completed_lessons += 1,
			LessonStatus::InProgress => stats.in_progress_lessons += 1,
			LessonStatus::NotStarted => stats.not_started_lessons += 1,
			LessonStatus::Locked => stats.locked_lessons += 1,
		}
	}

	if stats.tracked_lessons > 0 {
		stats.average_completion = percentage_sum / stats.tracked_lessons as f64;
	}
	stats
}

/// One row of the legend.
#[derive(Clone, Debug, PartialEq)]
pub struct LegendEntry {
	pub status: LessonStatus,
	pub label: &'static str,
	pub color: Color,
	pub opacity: f64,
	pub count: usize,
}

/// Legend rows in display order: completed, in progress, not started, locked.
pub fn legend_entries(stats: &ProgressStats, theme: &Theme) -> Vec<LegendEntry> {
	LessonStatus::ALL
		.iter()
		.map(|&status| LegendEntry {
			status,
			label: status.label(),
			color: theme.status.color(status, false),
			opacity: super::theme::opacity_for(status),
			count: stats.count(status),
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::knowledge_graph::types::ProgressNodeData;

	fn entry(status: LessonStatus, percentage: f64) -> ProgressNodeData {
		ProgressNodeData {
			status,
			percentage,
			completed_at: None,
		}
	}

	#[test]
	fn nodes_without_entries_count_as_locked() {
		let mut progress = ProgressMap::new();
		progress.insert("a".into(), entry(LessonStatus::Completed, 100.0));
		progress.insert("b".into(), entry(LessonStatus::InProgress, 50.0));
		progress.insert("c".into(), entry(LessonStatus::NotStarted, 0.0));

		let stats = progress_stats(["a", "b", "c", "d"], &progress);
		assert_eq!(stats.total_lessons, 4);
		assert_eq!(stats.completed_lessons, 1);
		assert_eq!(stats.in_progress_lessons, 1);
		assert_eq!(stats.not_started_lessons, 1);
		assert_eq!(stats.locked_lessons, 1);
		assert_eq!(stats.tracked_lessons, 3);
		assert!((stats.average_completion - 50.0).abs() < 1e-9);
		assert!((stats.completion_rate() - 25.0).abs() < 1e-9);
	}

	#[test]
	fn unknown_ids_and_bad_percentages_are_contained() {
		let mut progress = ProgressMap::new();
		progress.insert("a".into(), entry(LessonStatus::Locked, f64::NAN));
		progress.insert("b".into(), entry(LessonStatus::InProgress, 140.0));
		progress.insert("not-in-graph".into(), entry(LessonStatus::Completed, 100.0));

		let stats = progress_stats(["a", "b"], &progress);
		assert_eq!(stats.completed_lessons, 0);
		assert_eq!(stats.locked_lessons, 1);
		assert!((stats.average_completion - 50.0).abs() < 1e-9);
	}

	#[test]
	fn empty_input_has_zero_averages() {
		let stats = progress_stats(std::iter::empty(), &ProgressMap::new());
		assert_eq!(stats, ProgressStats::default());
		assert_eq!(stats.completion_rate(), 0.0);
	}

	#[test]
	fn legend_follows_display_order() {
		let mut progress = ProgressMap::new();
		progress.insert("a".into(), entry(LessonStatus::Completed, 100.0));
		let stats = progress_stats(["a", "b"], &progress);
		let legend = legend_entries(&stats, &Theme::default());
		let statuses: Vec<_> = legend.iter().map(|e| e.status).collect();
		assert_eq!(statuses, LessonStatus::ALL.to_vec());
		assert_eq!(legend[0].count, 1);
		assert_eq!(legend[3].count, 1);
		assert_eq!(legend[3].opacity, 0.5);
	}
}
