//! Anchored positioning with flip-on-overflow and viewport clamping.
//!
//! Everything here is a pure function of the rectangles passed in and the
//! viewport sampled by the caller. Applying the result to the page is the
//! caller's job.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geometry::{Rect, Viewport};
use crate::placement::{Align, Placement, Side};

/// Tuning for [`compute_placement`] and [`auto_position`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionOptions {
    /// Gap between trigger and content, in pixels.
    pub offset: f64,
    /// Minimum distance kept from every viewport edge.
    pub padding: f64,
    /// Try the mirrored placement when the preferred one overflows.
    pub flip: bool,
    /// Clamp the final coordinates into the viewport.
    pub constrain: bool,
    /// Candidates used by [`auto_position`] when the caller has none.
    pub preferred_placements: Vec<Placement>,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            offset: 8.0,
            padding: 8.0,
            flip: true,
            constrain: true,
            preferred_placements: vec![
                Placement::BottomStart,
                Placement::TopStart,
                Placement::BottomEnd,
                Placement::TopEnd,
            ],
        }
    }
}

impl PositionOptions {
    #[must_use]
    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    #[must_use]
    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = padding;
        self
    }

    #[must_use]
    pub fn with_flip(mut self, flip: bool) -> Self {
        self.flip = flip;
        self
    }

    #[must_use]
    pub fn with_constrain(mut self, constrain: bool) -> Self {
        self.constrain = constrain;
        self
    }
}

/// Output of a placement computation, in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionResult {
    pub x: f64,
    pub y: f64,
    /// The placement actually used, after any flip.
    pub placement: Placement,
}

impl PositionResult {
    /// The content rectangle at the computed position.
    #[must_use]
    pub fn rect(&self, content: &Rect) -> Rect {
        content.at(self.x, self.y)
    }
}

/// Unclamped coordinates for `placement`.
fn anchor(trigger: &Rect, content: &Rect, placement: Placement, offset: f64) -> (f64, f64) {
    let side = placement.side();
    let main = match side {
        Side::Top => trigger.top() - content.height - offset,
        Side::Bottom => trigger.bottom() + offset,
        Side::Left => trigger.left() - content.width - offset,
        Side::Right => trigger.right() + offset,
    };

    if side.is_vertical() {
        let x = match placement.align() {
            Align::Start => trigger.left(),
            Align::End => trigger.right() - content.width,
            Align::Center => trigger.x + (trigger.width - content.width) / 2.0,
        };
        (x, main)
    } else {
        let y = match placement.align() {
            Align::Start => trigger.top(),
            Align::End => trigger.bottom() - content.height,
            Align::Center => trigger.y + (trigger.height - content.height) / 2.0,
        };
        (main, y)
    }
}

/// Clamp `value` into `[padding, extent - size - padding]`.
///
/// When the content does not fit, the lower bound wins so the leading edge
/// stays visible.
fn clamp_axis(value: f64, size: f64, extent: f64, padding: f64) -> f64 {
    let max = extent - size - padding;
    value.min(max).max(padding)
}

/// Compute where `content` should render next to `trigger`.
///
/// The preferred placement is mirrored only when the mirror overflows
/// strictly fewer viewport edges. The comparison counts edges; it does not
/// weigh how far each edge is crossed.
pub fn compute_placement(
    trigger: &Rect,
    content: &Rect,
    preferred: Placement,
    options: &PositionOptions,
    viewport: &Viewport,
) -> Result<PositionResult> {
    trigger.validate("trigger")?;
    content.validate("content")?;

    let mut placement = preferred;
    let (mut x, mut y) = anchor(trigger, content, placement, options.offset);

    if options.flip {
        let overflow = viewport.overflow(&content.at(x, y), options.padding);
        if overflow.any() {
            let mirrored = preferred.flipped();
            let (mx, my) = anchor(trigger, content, mirrored, options.offset);
            let mirrored_overflow = viewport.overflow(&content.at(mx, my), options.padding);
            if mirrored_overflow.count() < overflow.count() {
                tracing::debug!(
                    from = %preferred,
                    to = %mirrored,
                    edges = overflow.count(),
                    mirrored_edges = mirrored_overflow.count(),
                    "flipping placement"
                );
                placement = mirrored;
                (x, y) = (mx, my);
            }
        }
    }

    if options.constrain {
        x = clamp_axis(x, content.width, viewport.width, options.padding);
        y = clamp_axis(y, content.height, viewport.height, options.padding);
    }

    Ok(PositionResult { x, y, placement })
}

/// Visible-area ratio of `content` placed at `placement` without flip or clamp.
fn score(trigger: &Rect, content: &Rect, placement: Placement, offset: f64, viewport: &Viewport) -> f64 {
    let (x, y) = anchor(trigger, content, placement, offset);
    viewport.visible_ratio(&content.at(x, y))
}

/// Pick the candidate whose unclamped rectangle is most visible.
///
/// Ties keep the earliest candidate. The winner is then finalized like
/// [`compute_placement`] with flipping disabled, since the choice of side has
/// already been made here.
pub fn auto_position(
    trigger: &Rect,
    content: &Rect,
    candidates: &[Placement],
    options: &PositionOptions,
    viewport: &Viewport,
) -> Result<PositionResult> {
    trigger.validate("trigger")?;
    content.validate("content")?;

    let mut best: Option<(Placement, f64)> = None;
    for &candidate in candidates {
        let ratio = score(trigger, content, candidate, options.offset, viewport);
        tracing::trace!(%candidate, ratio, "scored placement");
        if best.is_none_or(|(_, best_ratio)| ratio > best_ratio) {
            best = Some((candidate, ratio));
        }
    }
    let (placement, _) = best.ok_or(Error::NoViableOverlay)?;

    let finalize = PositionOptions {
        flip: false,
        ..options.clone()
    };
    compute_placement(trigger, content, placement, &finalize, viewport)
}

/// Visible-area ratio for every candidate, in candidate order.
///
/// Exposed for diagnostics and the CLI; [`auto_position`] uses the same score.
pub fn score_candidates(
    trigger: &Rect,
    content: &Rect,
    candidates: &[Placement],
    options: &PositionOptions,
    viewport: &Viewport,
) -> Result<Vec<(Placement, f64)>> {
    trigger.validate("trigger")?;
    content.validate("content")?;
    Ok(candidates
        .iter()
        .map(|&candidate| {
            (
                candidate,
                score(trigger, content, candidate, options.offset, viewport),
            )
        })
        .collect())
}
