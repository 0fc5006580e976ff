// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hardware-collaborator contracts.
//!
//! Strata splits platform-specific work into collaborator objects the
//! display server owns and hands to the engine each frame:
//!
//! - **Pipe pool** — Implements [`PipePool`]: the shared inventory of
//!   overlay pipes. All claims happen inside a
//!   [`begin_config`](PipePool::begin_config)/[`end_config`](PipePool::end_config)
//!   bracket; claims not re-made in the next bracket return to the pool, and
//!   [`rollback`](PipePool::rollback) discards the current bracket's claims
//!   when an allocation aborts mid-frame.
//!
//! - **Rotator pool** — Implements [`RotatorPool`]: shared rotation units
//!   leased per frame. Leases are plain [`RotatorId`] tokens; the engine
//!   never owns a rotator, it borrows one and returns it.
//!
//! Test doubles for both live in `strata_harness`.

use core::fmt;

use kurbo::Rect;

use crate::display::DisplayId;
use crate::transform::LayerTransform;

/// Identifies one overlay pipe within the pool.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PipeId(pub u32);

impl fmt::Debug for PipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PipeId({})", self.0)
    }
}

/// The hardware class of an overlay pipe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PipeType {
    /// General-purpose RGB pipe for UI content.
    Ui,
    /// DMA-backed pipe: no scaling, and shared with the rotation units.
    Dma,
    /// Video pipe with format conversion and scaling.
    Video,
}

/// Everything the hardware needs to stream one layer through one pipe.
#[derive(Clone, Copy, Debug)]
pub struct PipeConfig {
    /// Source region of the buffer.
    pub src_crop: Rect,
    /// Destination region on the display (already clipped to the pipe's
    /// mixer).
    pub dst: Rect,
    /// Flip/180° handled by the pipe itself; 90°-family rotation is
    /// pre-applied by a rotator before the pipe sees the buffer.
    pub transform: LayerTransform,
    /// Blend stage within the mixer, 0 at the back.
    pub z_order: u8,
    /// Whether the content is video (selects format/CSC paths downstream).
    pub is_video: bool,
    /// Whether the pixel format carries alpha.
    pub has_alpha: bool,
    /// Whether a rotator output, not the original buffer, feeds this pipe.
    pub uses_rotator: bool,
}

/// The shared overlay-pipe inventory.
///
/// The display server opens one configuration bracket around each prepare
/// cycle; the engine claims and configures inside it:
///
/// ```rust,ignore
/// pool.begin_config();
/// let outcome = engine.prepare(&mut ctx, layers); // claims, rollback() on abort
/// pool.end_config();
/// ```
pub trait PipePool {
    /// Opens a configuration bracket. Pipes claimed in the previous bracket
    /// but not re-claimed in this one return to the pool.
    fn begin_config(&mut self);

    /// Closes the bracket, committing the claims made since
    /// [`begin_config`](Self::begin_config).
    fn end_config(&mut self);

    /// Discards every claim made since [`begin_config`](Self::begin_config),
    /// restoring availability. The bracket stays open.
    fn rollback(&mut self);

    /// Claims a pipe of the given type for a display, or `None` if that
    /// inventory is exhausted.
    fn claim(&mut self, kind: PipeType, display: DisplayId) -> Option<PipeId>;

    /// Number of pipes (of any type) still claimable for a display.
    fn available(&self, display: DisplayId) -> usize;

    /// Total DMA pipes in the pool, claimed or not.
    fn dma_pipe_count(&self) -> usize;

    /// Programs a claimed pipe. Returns false if the hardware rejects the
    /// configuration.
    fn configure(&mut self, pipe: PipeId, config: &PipeConfig) -> bool;

    /// Queues a buffer into a configured pipe for scanout. Returns false on
    /// rejection.
    fn queue_buffer(&mut self, mem_id: i32, offset: u32, pipe: PipeId) -> bool;
}

/// Identifies one leased rotation unit.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RotatorId(pub u32);

impl fmt::Debug for RotatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RotatorId({})", self.0)
    }
}

/// The shared rotation-unit pool.
///
/// A rotator pre-rotates a buffer into its own output memory before the
/// buffer reaches a pipe. Leases last at most one frame; the engine releases
/// them whenever a frame is torn down or aborted.
pub trait RotatorPool {
    /// Leases a rotator for a display, or `None` if none is free.
    fn lease(&mut self, display: DisplayId) -> Option<RotatorId>;

    /// Returns a leased rotator to the pool.
    fn release(&mut self, rotator: RotatorId);

    /// Feeds a buffer through the rotator. Returns false on rejection.
    fn queue_buffer(&mut self, rotator: RotatorId, mem_id: i32, offset: u32) -> bool;

    /// Memory id of the rotator's output allocation.
    fn output_mem_id(&self, rotator: RotatorId) -> i32;

    /// Byte offset of the rotated pixels within the output allocation.
    fn output_offset(&self, rotator: RotatorId) -> u32;
}
