// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Crop/scissor arithmetic shared by policy checks and pipe programming.
//!
//! When a layer's destination hangs off the edge of a display (or of one
//! mixer's half of it), the visible part of the destination shrinks and the
//! source crop must shrink by the same proportion — on the side that
//! actually feeds the clipped edge, which depends on how the content is
//! flipped/rotated on its way to the screen.

use kurbo::Rect;

use crate::transform::LayerTransform;

/// Rounds a non-negative pixel coordinate to the nearest whole pixel.
#[inline]
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    reason = "pixel dimensions are far below i64 range"
)]
pub fn round_px(v: f64) -> i64 {
    (v + 0.5) as i64
}

/// Returns whether a layer is scaled, i.e. its cropped source and its
/// destination differ in width or height (to the nearest pixel).
#[inline]
#[must_use]
pub fn needs_scaling(crop: Rect, dst: Rect) -> bool {
    round_px(crop.width()) != round_px(dst.width())
        || round_px(crop.height()) != round_px(dst.height())
}

/// Reorders edge-cut ratios `[left, top, right, bottom]` from screen space
/// into source space for the given transform.
///
/// A horizontally flipped layer feeds its *right* source edge to the
/// screen's left edge, so the cuts swap; a 90° rotation shifts each cut one
/// edge anti-clockwise.
fn cuts_to_source(transform: LayerTransform, cuts: &mut [f64; 4]) {
    let [mut left, mut top, mut right, mut bottom] = *cuts;
    if transform.flip_h {
        core::mem::swap(&mut left, &mut right);
    }
    if transform.flip_v {
        core::mem::swap(&mut top, &mut bottom);
    }
    if transform.rot_90 {
        // Anti-clockwise shift.
        let tmp = left;
        left = top;
        top = right;
        right = bottom;
        bottom = tmp;
    }
    *cuts = [left, top, right, bottom];
}

/// Clips `dst` to `scissor` and shrinks `crop` proportionally.
///
/// Both rectangles must be well-ordered (`x0 <= x1`, `y0 <= y1`). If the
/// destination has zero width or height nothing is changed.
pub fn crop_to_scissor(
    crop: &mut Rect,
    dst: &mut Rect,
    scissor: Rect,
    transform: LayerTransform,
) {
    let crop_w = crop.width();
    let crop_h = crop.height();
    let dst_w = dst.width();
    let dst_h = dst.height();
    if dst_w <= 0.0 || dst_h <= 0.0 {
        return;
    }

    // Ratios of the destination lost on each screen edge.
    let mut cuts = [0.0_f64; 4];
    if dst.x0 < scissor.x0 {
        cuts[0] = (scissor.x0 - dst.x0) / dst_w;
        dst.x0 = scissor.x0;
    }
    if dst.x1 > scissor.x1 {
        cuts[2] = (dst.x1 - scissor.x1) / dst_w;
        dst.x1 = scissor.x1;
    }
    if dst.y0 < scissor.y0 {
        cuts[1] = (scissor.y0 - dst.y0) / dst_h;
        dst.y0 = scissor.y0;
    }
    if dst.y1 > scissor.y1 {
        cuts[3] = (dst.y1 - scissor.y1) / dst_h;
        dst.y1 = scissor.y1;
    }

    cuts_to_source(transform, &mut cuts);

    crop.x0 += crop_w * cuts[0];
    crop.y0 += crop_h * cuts[1];
    crop.x1 -= crop_w * cuts[2];
    crop.y1 -= crop_h * cuts[3];
}
