use anyhow::{anyhow, bail, Context};

use crate::aggregate::Chart;
use crate::interaction::{HighlightView, InteractionController};
use crate::models::{Dimension, PointDetail, SeriesKey};
use crate::zoom::Zoom;

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Enter(SeriesKey),
    Leave,
    Zoom(f64),
    Point(SeriesKey, u32),
}

impl UiEvent {
    /// Parses one explore command: `enter <key>`, `leave`, `zoom <0..1>`, `point <key> <month>`.
    pub fn parse(line: &str, dimension: Dimension) -> anyhow::Result<UiEvent> {
        let line = line.trim();
        let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        match command.to_ascii_lowercase().as_str() {
            "enter" => Ok(UiEvent::Enter(parse_key(rest, dimension)?)),
            "leave" => Ok(UiEvent::Leave),
            "zoom" => {
                let position = rest
                    .parse::<f64>()
                    .with_context(|| format!("zoom expects a slider position, got {rest:?}"))?;
                Ok(UiEvent::Zoom(position))
            }
            "point" => {
                let (key, month) = rest
                    .rsplit_once(char::is_whitespace)
                    .ok_or_else(|| anyhow!("point expects a series key and a month"))?;
                let month = month
                    .parse::<u32>()
                    .ok()
                    .filter(|month| (1..=12).contains(month))
                    .ok_or_else(|| anyhow!("month must be 1-12, got {month:?}"))?;
                Ok(UiEvent::Point(parse_key(key, dimension)?, month))
            }
            "" => bail!("empty command"),
            other => bail!("unknown command {other:?}"),
        }
    }
}

fn parse_key(text: &str, dimension: Dimension) -> anyhow::Result<SeriesKey> {
    SeriesKey::parse(text, dimension)
        .ok_or_else(|| anyhow!("{text:?} is not a valid {} key", dimension.label()))
}

/// Everything the renderer needs after an event.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub highlight: HighlightView,
    pub zoom_label: String,
    pub y_max: f64,
    pub tooltip: Option<PointDetail>,
}

/// Per-mount UI state: the loaded chart plus hover and zoom.
pub struct ChartState {
    chart: Chart,
    controller: InteractionController,
    zoom: Zoom,
}

impl ChartState {
    pub fn mount(chart: Chart) -> Self {
        let zoom = Zoom::new(chart.max_count());
        Self {
            chart,
            controller: InteractionController::new(),
            zoom,
        }
    }

    pub fn chart(&self) -> &Chart {
        &self.chart
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    /// Applies one event to completion and returns the frame to draw.
    pub fn apply(&mut self, event: UiEvent) -> Frame {
        let mut tooltip = None;
        match event {
            UiEvent::Enter(key) => {
                self.controller.pointer_enter(&self.chart, key);
            }
            UiEvent::Leave => {
                self.controller.pointer_leave();
            }
            UiEvent::Zoom(position) => self.zoom.set_position(position),
            UiEvent::Point(key, month) => {
                tooltip = self.chart.point_detail(&key, month);
                if tooltip.is_some() {
                    self.controller.pointer_enter(&self.chart, key);
                }
            }
        }
        self.frame(tooltip)
    }

    pub fn frame(&self, tooltip: Option<PointDetail>) -> Frame {
        Frame {
            highlight: self.controller.view(&self.chart),
            zoom_label: self.zoom.label(),
            y_max: self.zoom.y_max(),
            tooltip,
        }
    }
}
