use serde::Serialize;

use crate::progress::ProgressEvent;

/// Turns per-item percentages into one overall percentage.
///
/// Every item of a playlist counts for the same `1 / total_items` share of
/// the job, whatever its size. A single video is a playlist of one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressAggregator {
    current_item: u32,
    total_items: u32,
}

impl Default for ProgressAggregator {
    fn default() -> Self {
        Self {
            current_item: 1,
            total_items: 1,
        }
    }
}

impl ProgressAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_item(&self) -> u32 {
        self.current_item
    }

    pub fn total_items(&self) -> u32 {
        self.total_items
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Record a playlist position. Zero values and `current > total` are
    /// ignored so the state stays positive and consistent.
    pub fn on_item_boundary(&mut self, current: u32, total: u32) {
        if current == 0 || total == 0 || current > total {
            log::debug!("ignoring inconsistent item boundary {current}/{total}");
            return;
        }
        self.current_item = current;
        self.total_items = total;
    }

    /// Overall percentage for `value` percent of the current item.
    ///
    /// `round(((current - 1) + value / 100) / total * 100)`, with `value`
    /// clamped to 0..=100 first and the result rounded half up.
    pub fn overall_percent(&self, value: f64) -> u8 {
        let local = if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 100.0)
        };

        // Multiply before dividing so a single item maps back to `local` exactly.
        let done_items = f64::from(self.current_item - 1) * 100.0;
        let overall = (done_items + local) / f64::from(self.total_items);

        overall.round().clamp(0.0, 100.0) as u8
    }

    /// Feed one parsed event. Returns the new overall percentage for
    /// percentage events and `None` for item boundaries.
    pub fn apply(&mut self, event: ProgressEvent) -> Option<u8> {
        match event {
            ProgressEvent::ItemBoundary { current, total } => {
                self.on_item_boundary(current, total);
                None
            }
            ProgressEvent::ItemPercent { value } => Some(self.overall_percent(value)),
        }
    }
}
