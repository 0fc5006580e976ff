// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mixer layout strategies and pipe claiming.
//!
//! A display narrow enough for one mixer needs one pipe per overlay layer.
//! A wide display is driven by a left/right mixer pair: a layer confined to
//! one half needs a pipe on that mixer only, while a layer straddling the
//! midpoint needs one on each. Demand estimation and allocation share the
//! same span rule so the feasibility gate's capacity check matches what
//! allocation will actually claim.

use kurbo::Rect;
use strata_core::config::CompositorConfig;
use strata_core::display::DisplayId;
use strata_core::hal::{PipeId, PipePool, PipeType};
use strata_core::layer::{Layer, ListStats};

use crate::frame::{FrameState, PipeAssignment, PipeSlot};
use crate::policy::FallbackReason;

/// Mixer topology of a display, fixed at engine construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MixerLayout {
    /// One mixer drives the whole panel; one pipe per overlay layer.
    Single,
    /// Left/right mixer pair; a layer may need a pipe on each side.
    Split,
}

impl MixerLayout {
    /// Selects the layout for a panel of the given width.
    #[must_use]
    pub fn for_width(width: u32) -> Self {
        if width <= strata_core::config::SINGLE_MIXER_MAX_WIDTH {
            Self::Single
        } else {
            Self::Split
        }
    }

    /// Pipes reserved for the framebuffer target layer, which spans the
    /// full panel width.
    #[must_use]
    pub fn pipes_for_framebuffer(self) -> usize {
        match self {
            Self::Single => 1,
            Self::Split => 2,
        }
    }
}

/// Which mixer half(s) a destination rectangle touches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MixerSpan {
    Left,
    Right,
    Both,
}

pub(crate) fn span_for(dst: Rect, mid_x: f64) -> MixerSpan {
    if dst.x1 <= mid_x {
        MixerSpan::Left
    } else if dst.x0 >= mid_x {
        MixerSpan::Right
    } else {
        MixerSpan::Both
    }
}

/// What class of pipe a layer wants, before fallthrough.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PipeRequest {
    /// Any UI-capable pipe: general-purpose first, video pipe as last
    /// resort.
    Any,
    /// DMA preferred (unscaled UI on capable hardware), falling through to
    /// `Any`.
    Dma,
    /// Video pipe only.
    Video,
}

/// Claims one pipe honoring the request's fallthrough chain.
///
/// A successful DMA claim records itself in `dma_claimed` so the rest of
/// the frame knows the rotation path is starved.
pub(crate) fn claim_pipe(
    pool: &mut dyn PipePool,
    request: PipeRequest,
    display: DisplayId,
    dma_claimed: &mut bool,
) -> Option<PipeId> {
    if request == PipeRequest::Video {
        return pool.claim(PipeType::Video, display);
    }

    if request == PipeRequest::Dma {
        if let Some(pipe) = pool.claim(PipeType::Dma, display) {
            *dma_claimed = true;
            return Some(pipe);
        }
    }

    // Any (or a DMA miss): general-purpose first, then a spare video pipe.
    if let Some(pipe) = pool.claim(PipeType::Ui, display) {
        return Some(pipe);
    }
    pool.claim(PipeType::Video, display)
}

/// Estimated pipe demand for the overlay-marked layers of a frame.
///
/// Uses the same span rule as allocation.
pub(crate) fn pipes_needed(
    layout: MixerLayout,
    frame: &FrameState,
    layers: &[Layer],
    mid_x: f64,
) -> usize {
    match layout {
        MixerLayout::Single => frame.layer_count - frame.fb_count,
        MixerLayout::Split => layers
            .iter()
            .enumerate()
            .take(frame.layer_count)
            .filter(|(index, _)| !frame.fb_composed[*index])
            .map(|(_, layer)| match span_for(layer.display_frame, mid_x) {
                MixerSpan::Left | MixerSpan::Right => 1,
                MixerSpan::Both => 2,
            })
            .sum(),
    }
}

fn claim_assignment(
    layout: MixerLayout,
    pool: &mut dyn PipePool,
    request: PipeRequest,
    display: DisplayId,
    dst: Rect,
    mid_x: f64,
    dma_claimed: &mut bool,
) -> Option<PipeAssignment> {
    match layout {
        MixerLayout::Single => {
            claim_pipe(pool, request, display, dma_claimed).map(PipeAssignment::Single)
        }
        MixerLayout::Split => {
            let span = span_for(dst, mid_x);
            let left = match span {
                MixerSpan::Left | MixerSpan::Both => {
                    Some(claim_pipe(pool, request, display, dma_claimed)?)
                }
                MixerSpan::Right => None,
            };
            let right = match span {
                MixerSpan::Right | MixerSpan::Both => {
                    Some(claim_pipe(pool, request, display, dma_claimed)?)
                }
                MixerSpan::Left => None,
            };
            Some(PipeAssignment::Split { left, right })
        }
    }
}

/// Claims pipes for every overlay-marked layer, videos first.
///
/// Slot entries are filled as claims succeed. Any single failure aborts the
/// whole allocation; the caller rolls the pool back so nothing leaks.
pub(crate) fn allocate_layer_pipes(
    layout: MixerLayout,
    frame: &mut FrameState,
    layers: &[Layer],
    stats: &ListStats,
    config: &CompositorConfig,
    pool: &mut dyn PipePool,
    display: DisplayId,
    mid_x: f64,
) -> Result<(), FallbackReason> {
    // Videos claim the dedicated pipes first.
    for &index in &stats.video_indices {
        if frame.fb_composed[index] {
            continue;
        }
        place_layer(
            layout,
            frame,
            &layers[index],
            index,
            PipeRequest::Video,
            pool,
            display,
            mid_x,
        )?;
    }

    // Remaining UI layers in ascending order.
    for (index, layer) in layers.iter().enumerate().take(frame.layer_count) {
        if frame.fb_composed[index] || layer.is_video() {
            continue;
        }
        let request = if !layer.needs_scaling()
            && !stats.needs_rotator
            && config.generation.allows_ui_dma()
        {
            PipeRequest::Dma
        } else {
            PipeRequest::Any
        };
        place_layer(layout, frame, layer, index, request, pool, display, mid_x)?;
    }

    Ok(())
}

fn place_layer(
    layout: MixerLayout,
    frame: &mut FrameState,
    layer: &Layer,
    index: usize,
    request: PipeRequest,
    pool: &mut dyn PipePool,
    display: DisplayId,
    mid_x: f64,
) -> Result<(), FallbackReason> {
    let mut dma_claimed = frame.dma_claimed;
    let pipes = claim_assignment(
        layout,
        pool,
        request,
        display,
        layer.display_frame,
        mid_x,
        &mut dma_claimed,
    )
    .ok_or(FallbackReason::PipeExhausted)?;
    frame.dma_claimed = dma_claimed;

    let slot = frame.layer_to_slot[index].expect("overlay layer missing from slot map");
    frame.slots[slot] = Some(PipeSlot {
        layer_index: index,
        pipes,
        rotator: None,
        z_order: 0,
    });
    Ok(())
}
