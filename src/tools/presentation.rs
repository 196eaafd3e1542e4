use super::chart::ChartView;
use serde_json::Value;

/// Rendering surface for tool output (chart widget, info panel, spinner).
///
/// Every method defaults to a no-op so sinks implement only what they show.
pub trait PresentationSink: Send + Sync {
    fn show_loading(&self) {}

    fn hide_loading(&self) {}

    fn render_chart(&self, _chart: &ChartView) {}

    /// Show the payload of a successful lookup tool.
    fn display_summary(&self, _tool: &str, _data: &Value) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresentation;

impl PresentationSink for NullPresentation {}
