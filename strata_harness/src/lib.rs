// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fake hardware collaborators and layer builders for tests.
//!
//! [`FakePipePool`] and [`FakeRotatorPool`] implement the `strata_core::hal`
//! contracts over in-memory inventories, recording every claim, configure,
//! and queue so tests can assert on exactly what the engine did. Failure
//! injection flags let tests drive the abort paths.

#![no_std]

extern crate alloc;

use alloc::vec::Vec;

use kurbo::Rect;
use strata_core::display::DisplayId;
use strata_core::hal::{PipeConfig, PipeId, PipePool, PipeType, RotatorId, RotatorPool};
use strata_core::layer::{BufferHandle, BufferId, BufferKind, Layer};

/// One recorded pipe claim.
#[derive(Clone, Copy, Debug)]
pub struct ClaimRecord {
    /// The pipe handed out.
    pub pipe: PipeId,
    /// Inventory it came from.
    pub kind: PipeType,
    /// Display it was claimed for.
    pub display: DisplayId,
}

const fn kind_index(kind: PipeType) -> usize {
    match kind {
        PipeType::Ui => 0,
        PipeType::Dma => 1,
        PipeType::Video => 2,
    }
}

/// In-memory overlay-pipe pool with typed inventories.
///
/// Claims live inside the `begin_config`/`end_config` bracket: opening a new
/// bracket returns every previously claimed pipe, and `rollback` returns the
/// current bracket's claims.
#[derive(Debug, Default)]
pub struct FakePipePool {
    totals: [usize; 3],
    claimed: [usize; 3],
    bracket_open: bool,
    next_id: u32,
    claims: Vec<ClaimRecord>,
    configured: Vec<(PipeId, PipeConfig)>,
    queued: Vec<(i32, u32, PipeId)>,
    /// When set, every `configure` call is rejected.
    pub fail_configure: bool,
    /// When set, every `queue_buffer` call is rejected.
    pub fail_queue: bool,
}

impl FakePipePool {
    /// Creates a pool with the given inventory sizes.
    #[must_use]
    pub fn new(ui: usize, dma: usize, video: usize) -> Self {
        Self {
            totals: [ui, dma, video],
            ..Self::default()
        }
    }

    /// Pipes currently claimed, across all inventories.
    #[must_use]
    pub fn claimed_total(&self) -> usize {
        self.claimed.iter().sum()
    }

    /// The inventory a claimed pipe came from.
    #[must_use]
    pub fn claim_kind(&self, pipe: PipeId) -> Option<PipeType> {
        self.claims
            .iter()
            .find(|record| record.pipe == pipe)
            .map(|record| record.kind)
    }

    /// Claims made in the current bracket, in order.
    #[must_use]
    pub fn claims(&self) -> &[ClaimRecord] {
        &self.claims
    }

    /// Every successful `configure` call, in order.
    #[must_use]
    pub fn configured(&self) -> &[(PipeId, PipeConfig)] {
        &self.configured
    }

    /// Every successful `queue_buffer` call, in order.
    #[must_use]
    pub fn queued(&self) -> &[(i32, u32, PipeId)] {
        &self.queued
    }
}

impl PipePool for FakePipePool {
    fn begin_config(&mut self) {
        self.bracket_open = true;
        self.claimed = [0; 3];
        self.claims.clear();
        self.configured.clear();
        self.queued.clear();
    }

    fn end_config(&mut self) {
        self.bracket_open = false;
    }

    fn rollback(&mut self) {
        self.claimed = [0; 3];
        self.claims.clear();
        self.configured.clear();
    }

    fn claim(&mut self, kind: PipeType, display: DisplayId) -> Option<PipeId> {
        assert!(self.bracket_open, "claim outside configuration bracket");
        let index = kind_index(kind);
        if self.claimed[index] >= self.totals[index] {
            return None;
        }
        self.claimed[index] += 1;
        let pipe = PipeId(self.next_id);
        self.next_id += 1;
        self.claims.push(ClaimRecord {
            pipe,
            kind,
            display,
        });
        Some(pipe)
    }

    fn available(&self, _display: DisplayId) -> usize {
        self.totals.iter().sum::<usize>() - self.claimed_total()
    }

    fn dma_pipe_count(&self) -> usize {
        self.totals[kind_index(PipeType::Dma)]
    }

    fn configure(&mut self, pipe: PipeId, config: &PipeConfig) -> bool {
        if self.fail_configure {
            return false;
        }
        self.configured.push((pipe, *config));
        true
    }

    fn queue_buffer(&mut self, mem_id: i32, offset: u32, pipe: PipeId) -> bool {
        if self.fail_queue {
            return false;
        }
        self.queued.push((mem_id, offset, pipe));
        true
    }
}

/// In-memory rotation-unit pool.
///
/// Rotator output addresses are derived from the lease id so tests can tell
/// rotated buffers from originals: memory id `1000 + id`, offset `64 * id`.
#[derive(Debug, Default)]
pub struct FakeRotatorPool {
    total: usize,
    leased: Vec<RotatorId>,
    released: usize,
    next_id: u32,
    queued: Vec<(RotatorId, i32, u32)>,
    /// When set, every `queue_buffer` call is rejected.
    pub fail_queue: bool,
}

impl FakeRotatorPool {
    /// Creates a pool with `total` rotation units.
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Rotators currently leased out.
    #[must_use]
    pub fn leased_count(&self) -> usize {
        self.leased.len()
    }

    /// Leases returned so far.
    #[must_use]
    pub fn released_count(&self) -> usize {
        self.released
    }

    /// Every successful `queue_buffer` call, in order.
    #[must_use]
    pub fn queued(&self) -> &[(RotatorId, i32, u32)] {
        &self.queued
    }
}

impl RotatorPool for FakeRotatorPool {
    fn lease(&mut self, _display: DisplayId) -> Option<RotatorId> {
        if self.leased.len() >= self.total {
            return None;
        }
        let rotator = RotatorId(self.next_id);
        self.next_id += 1;
        self.leased.push(rotator);
        Some(rotator)
    }

    fn release(&mut self, rotator: RotatorId) {
        let position = self
            .leased
            .iter()
            .position(|leased| *leased == rotator)
            .expect("releasing a rotator that was not leased");
        self.leased.remove(position);
        self.released += 1;
    }

    fn queue_buffer(&mut self, rotator: RotatorId, mem_id: i32, offset: u32) -> bool {
        if self.fail_queue {
            return false;
        }
        self.queued.push((rotator, mem_id, offset));
        true
    }

    fn output_mem_id(&self, rotator: RotatorId) -> i32 {
        1000 + i32::try_from(rotator.0).unwrap_or(0)
    }

    fn output_offset(&self, rotator: RotatorId) -> u32 {
        64 * rotator.0
    }
}

/// Builds a UI layer with an unscaled buffer the size of `display_frame`.
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    reason = "test buffer ids are tiny"
)]
pub fn ui_layer(id: u64, display_frame: Rect) -> Layer {
    let mut layer = Layer::new(
        Rect::new(0.0, 0.0, display_frame.width(), display_frame.height()),
        display_frame,
    );
    layer.buffer = Some(BufferHandle {
        id: BufferId(id),
        kind: BufferKind::Ui,
        mem_id: 100 + id as i32,
        offset: 0,
        has_alpha: false,
    });
    layer
}

/// Builds a video layer with an unscaled buffer the size of `display_frame`.
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    reason = "test buffer ids are tiny"
)]
pub fn video_layer(id: u64, display_frame: Rect) -> Layer {
    let mut layer = ui_layer(id, display_frame);
    layer.buffer = Some(BufferHandle {
        id: BufferId(id),
        kind: BufferKind::Video,
        mem_id: 100 + id as i32,
        offset: 0,
        has_alpha: false,
    });
    layer
}
