use tracing::{debug, warn};

use crate::aggregate::Chart;
use crate::models::{AggregateSummary, SeriesKey, SeriesStats};

pub const FULL_OPACITY: f32 = 1.0;
pub const DIMMED_OPACITY: f32 = 0.15;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HoverState {
    #[default]
    Idle,
    Hovered(SeriesKey),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Summary {
    Series(SeriesStats),
    Aggregate(AggregateSummary),
}

#[derive(Debug, Clone, PartialEq)]
pub struct HighlightView {
    pub opacities: Vec<(SeriesKey, f32)>,
    pub summary: Summary,
}

/// Tracks the hovered series. Everything it reports is derived from the
/// chart passed in plus the current hover state.
#[derive(Debug, Default)]
pub struct InteractionController {
    state: HoverState,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &HoverState {
        &self.state
    }

    pub fn hovered(&self) -> Option<&SeriesKey> {
        match &self.state {
            HoverState::Idle => None,
            HoverState::Hovered(key) => Some(key),
        }
    }

    /// Returns whether the hover state changed. Keys absent from the chart are ignored.
    pub fn pointer_enter(&mut self, chart: &Chart, key: SeriesKey) -> bool {
        if !chart.contains(&key) {
            warn!(%key, "ignoring hover on a series that is not charted");
            return false;
        }
        if self.hovered() == Some(&key) {
            return false;
        }
        debug!(%key, "series hovered");
        self.state = HoverState::Hovered(key);
        true
    }

    pub fn pointer_leave(&mut self) -> bool {
        let changed = self.state != HoverState::Idle;
        self.state = HoverState::Idle;
        changed
    }

    pub fn opacity_for(&self, key: &SeriesKey) -> f32 {
        match self.hovered() {
            Some(hovered) if hovered != key => DIMMED_OPACITY,
            _ => FULL_OPACITY,
        }
    }

    pub fn view(&self, chart: &Chart) -> HighlightView {
        let opacities = chart
            .series
            .iter()
            .map(|series| (series.key.clone(), self.opacity_for(&series.key)))
            .collect();

        let summary = match self.hovered().and_then(|key| chart.stats(key)) {
            Some(stats) => Summary::Series(stats),
            None => Summary::Aggregate(chart.summary()),
        };

        HighlightView { opacities, summary }
    }
}
