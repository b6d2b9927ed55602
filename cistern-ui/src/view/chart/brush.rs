//! Drag-to-select gesture over the time axis.

use chrono::{DateTime, Duration, Utc};

use super::scale::TimeScale;

/// Selections narrower than this many pixels count as a click.
pub const MIN_SELECTION_WIDTH: f32 = 1.0;

/// State of the brush gesture of one chart.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Brush {
    #[default]
    Idle,
    Dragging {
        origin: f32,
        current: f32,
        extent: (f32, f32),
    },
}

impl Brush {
    /// Start a gesture at `x`, clamped to `extent`.
    pub fn begin(&mut self, x: f32, extent: (f32, f32)) {
        let x = clamp(x, extent);
        *self = Brush::Dragging {
            origin: x,
            current: x,
            extent,
        };
    }

    /// Extend the gesture to `x`. Ignored when idle.
    pub fn drag(&mut self, x: f32) {
        if let Brush::Dragging {
            current, extent, ..
        } = self
        {
            *current = clamp(x, *extent);
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, Brush::Dragging { .. })
    }

    /// Current selection as ordered pixel edges.
    pub fn selection(&self) -> Option<(f32, f32)> {
        match *self {
            Brush::Idle => None,
            Brush::Dragging {
                origin, current, ..
            } => Some((origin.min(current), origin.max(current))),
        }
    }

    /// End the gesture and resolve the selected range.
    ///
    /// A non-empty selection inverts its edges through `scale`; an empty one
    /// (a click) selects the trailing `default_window` ending at `now`.
    /// Returns `None` when no gesture was in progress.
    pub fn finish(
        &mut self,
        scale: &TimeScale,
        now: DateTime<Utc>,
        default_window: Duration,
    ) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let (lo, hi) = self.selection()?;
        *self = Brush::Idle;

        if hi - lo < MIN_SELECTION_WIDTH {
            let start = now
                .checked_sub_signed(default_window.abs())
                .unwrap_or(DateTime::<Utc>::MIN_UTC);
            return Some((start, now));
        }

        Some((scale.invert(lo), scale.invert(hi)))
    }

    /// Abandon the gesture without selecting anything.
    pub fn cancel(&mut self) {
        *self = Brush::Idle;
    }
}

fn clamp(x: f32, (lo, hi): (f32, f32)) -> f32 {
    if x.is_nan() { lo } else { x.clamp(lo, hi.max(lo)) }
}
