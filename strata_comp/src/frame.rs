// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-frame allocation state and the cross-frame comparison cache.
//!
//! [`FrameState`] is the engine's working record for one frame: which layers
//! are framebuffer-composed, the layer↔pipe-slot mapping, and the slot arena
//! itself. It is fixed-capacity and reset — never reallocated — at the top
//! of every prepare, so an aborted frame can never leak per-frame
//! allocations.
//!
//! [`CachedFrame`] persists across frames and remembers the previous frame's
//! buffer identities per list position, which is what lets an unchanged
//! layer stay on the framebuffer without a redraw.

use strata_core::config::{MAX_LAYERS, MAX_PIPES_PER_MIXER};
use strata_core::hal::{PipeId, RotatorId};
use strata_core::layer::BufferId;

/// Which pipe(s) a layer occupies this frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipeAssignment {
    /// One pipe feeding the display's single mixer.
    Single(PipeId),
    /// Up to one pipe per mixer half on a wide display. A layer entirely
    /// within one half uses only that side.
    Split {
        /// Pipe on the left mixer, if the layer touches the left half.
        left: Option<PipeId>,
        /// Pipe on the right mixer, if the layer touches the right half.
        right: Option<PipeId>,
    },
}

impl PipeAssignment {
    /// Number of hardware pipes this assignment consumes.
    #[must_use]
    pub fn pipe_count(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Split { left, right } => usize::from(left.is_some()) + usize::from(right.is_some()),
        }
    }
}

/// One entry of the per-frame slot arena: a hardware-composed layer's pipes,
/// optional rotator lease, and blend position.
#[derive(Clone, Copy, Debug)]
pub struct PipeSlot {
    /// List index of the layer occupying this slot.
    pub layer_index: usize,
    /// Claimed pipe(s).
    pub pipes: PipeAssignment,
    /// Rotator lease, if the layer needs a 90°-family rotation. Borrowed
    /// from the shared pool; released when the frame is torn down.
    pub rotator: Option<RotatorId>,
    /// Blend stage within the mixer(s).
    pub z_order: u8,
}

/// The engine's working record for one frame.
///
/// After allocation, `overlay_count + fb_count == layer_count` always holds
/// and every non-framebuffer layer maps to exactly one slot.
#[derive(Debug)]
pub struct FrameState {
    pub(crate) layer_count: usize,
    pub(crate) overlay_count: usize,
    pub(crate) fb_count: usize,
    pub(crate) fb_z: Option<u8>,
    pub(crate) needs_redraw: bool,
    /// A DMA pipe was claimed while allocating this frame.
    pub(crate) dma_claimed: bool,
    pub(crate) fb_composed: [bool; MAX_LAYERS],
    /// Set when a layer's overlay routing is published to the caller;
    /// cleared as draw consumes each layer.
    pub(crate) overlay_pending: [bool; MAX_LAYERS],
    pub(crate) layer_to_slot: [Option<usize>; MAX_LAYERS],
    pub(crate) slots: [Option<PipeSlot>; MAX_PIPES_PER_MIXER],
}

impl FrameState {
    /// Creates an empty frame record.
    #[must_use]
    pub fn new() -> Self {
        Self {
            layer_count: 0,
            overlay_count: 0,
            fb_count: 0,
            fb_z: None,
            needs_redraw: false,
            dma_claimed: false,
            fb_composed: [false; MAX_LAYERS],
            overlay_pending: [false; MAX_LAYERS],
            layer_to_slot: [None; MAX_LAYERS],
            slots: [None; MAX_PIPES_PER_MIXER],
        }
    }

    /// Resets for a new frame of `layer_count` layers.
    ///
    /// Slot entries are dropped here; rotator leases recorded in them must
    /// already have been returned by the engine.
    pub(crate) fn reset(&mut self, layer_count: usize) {
        debug_assert!(layer_count <= MAX_LAYERS, "layer list over capacity");
        self.layer_count = layer_count;
        self.overlay_count = 0;
        self.fb_count = 0;
        self.fb_z = None;
        self.needs_redraw = false;
        self.dma_claimed = false;
        self.fb_composed = [false; MAX_LAYERS];
        self.overlay_pending = [false; MAX_LAYERS];
        self.layer_to_slot = [None; MAX_LAYERS];
        self.slots = [None; MAX_PIPES_PER_MIXER];
    }

    /// Routes every layer to the framebuffer and forces a redraw.
    ///
    /// The z-order and slot mapping of any earlier allocation attempt are
    /// discarded.
    pub(crate) fn set_all_framebuffer(&mut self) {
        for composed in self.fb_composed.iter_mut().take(self.layer_count) {
            *composed = true;
        }
        self.fb_count = self.layer_count;
        self.overlay_count = 0;
        self.fb_z = None;
        self.needs_redraw = true;
        self.layer_to_slot = [None; MAX_LAYERS];
        self.slots = [None; MAX_PIPES_PER_MIXER];
    }

    /// Builds the layer↔slot maps for the current `fb_composed` marking.
    ///
    /// Slots are handed out in ascending layer order, so slot indices are
    /// unique and dense in `0..overlay_count`.
    pub(crate) fn build_slot_map(&mut self) {
        let mut slot = 0;
        for index in 0..self.layer_count {
            if !self.fb_composed[index] {
                self.layer_to_slot[index] = Some(slot);
                slot += 1;
            }
        }
        debug_assert_eq!(slot, self.overlay_count, "slot map out of sync");
    }

    /// Number of layers in this frame.
    #[inline]
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layer_count
    }

    /// Layers streamed through overlay pipes.
    #[inline]
    #[must_use]
    pub fn overlay_count(&self) -> usize {
        self.overlay_count
    }

    /// Layers composed into the framebuffer.
    #[inline]
    #[must_use]
    pub fn fb_count(&self) -> usize {
        self.fb_count
    }

    /// Z-slot reserved for the framebuffer target, if any layer needs it.
    #[inline]
    #[must_use]
    pub fn fb_z(&self) -> Option<u8> {
        self.fb_z
    }

    /// Whether the framebuffer contents must be redrawn this frame.
    #[inline]
    #[must_use]
    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    /// Whether the layer at `index` is framebuffer-composed.
    #[inline]
    #[must_use]
    pub fn is_fb_composed(&self, index: usize) -> bool {
        self.fb_composed[index]
    }

    /// Total hardware pipes claimed by the current allocation.
    #[must_use]
    pub fn pipes_claimed(&self) -> usize {
        self.slots
            .iter()
            .flatten()
            .map(|slot| slot.pipes.pipe_count())
            .sum()
    }
}

impl Default for FrameState {
    fn default() -> Self {
        Self::new()
    }
}

/// Previous-frame record used to detect static layers.
///
/// Counts are kept for diagnostics and for the needs-redraw comparison; the
/// buffer identities drive the cache itself.
#[derive(Debug)]
pub struct CachedFrame {
    pub(crate) handles: [Option<BufferId>; MAX_LAYERS],
    pub(crate) layer_count: usize,
    pub(crate) overlay_count: usize,
    pub(crate) cache_count: usize,
}

impl CachedFrame {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handles: [None; MAX_LAYERS],
            layer_count: 0,
            overlay_count: 0,
            cache_count: 0,
        }
    }

    /// Forgets all remembered buffers and counts.
    pub(crate) fn reset(&mut self) {
        self.handles = [None; MAX_LAYERS];
        self.layer_count = 0;
        self.overlay_count = 0;
        self.cache_count = 0;
    }

    /// Previous frame's layer count.
    #[inline]
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layer_count
    }

    /// Previous frame's overlay-composed count.
    #[inline]
    #[must_use]
    pub fn overlay_count(&self) -> usize {
        self.overlay_count
    }

    /// Previous frame's cached (framebuffer, no redraw) count.
    #[inline]
    #[must_use]
    pub fn cache_count(&self) -> usize {
        self.cache_count
    }
}

impl Default for CachedFrame {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_clears_previous_frame() {
        let mut frame = FrameState::new();
        frame.reset(3);
        frame.fb_composed[1] = true;
        frame.fb_count = 1;
        frame.overlay_count = 2;
        frame.build_slot_map();
        assert_eq!(frame.layer_to_slot[0], Some(0));
        assert_eq!(frame.layer_to_slot[1], None);
        assert_eq!(frame.layer_to_slot[2], Some(1));

        frame.reset(2);
        assert_eq!(frame.layer_count(), 2);
        assert_eq!(frame.overlay_count(), 0);
        assert_eq!(frame.fb_count(), 0);
        assert_eq!(frame.layer_to_slot, [None; MAX_LAYERS]);
        assert!(!frame.needs_redraw());
    }

    #[test]
    fn set_all_framebuffer_discards_allocation() {
        let mut frame = FrameState::new();
        frame.reset(4);
        frame.overlay_count = 4;
        frame.build_slot_map();
        frame.fb_z = Some(2);

        frame.set_all_framebuffer();
        assert_eq!(frame.fb_count(), 4);
        assert_eq!(frame.overlay_count(), 0);
        assert_eq!(frame.fb_z(), None);
        assert!(frame.needs_redraw());
        assert!((0..4).all(|i| frame.is_fb_composed(i)));
        assert_eq!(frame.pipes_claimed(), 0);
    }

    #[test]
    fn split_assignment_counts_both_mixers() {
        let both = PipeAssignment::Split {
            left: Some(PipeId(0)),
            right: Some(PipeId(1)),
        };
        let left_only = PipeAssignment::Split {
            left: Some(PipeId(2)),
            right: None,
        };
        assert_eq!(both.pipe_count(), 2);
        assert_eq!(left_only.pipe_count(), 1);
        assert_eq!(PipeAssignment::Single(PipeId(3)).pipe_count(), 1);
    }
}
