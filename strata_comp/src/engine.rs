// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-display composition engine.
//!
//! [`CompositionEngine`] owns one display's allocation state and runs the
//! prepare/draw cycle:
//!
//! ```text
//!   reset ──► feasibility gate ──► comparison cache ──► video override
//!     ──► batching ──► full-frame re-check (fallback + video override)
//!     ──► pipe allocation ──► z-order + pipe programming ──► publish
//!     ──► (later) draw: queue buffers, release fences
//! ```
//!
//! The engine runs synchronously on the caller's thread. `&mut self`
//! receivers make its state single-writer; the display server provides the
//! outer serialization of prepare/draw against display power transitions
//! and external-display attach/detach, exactly as it does for the other
//! per-display modules.

use std::sync::Arc;

use kurbo::Rect;
use strata_core::config::{CompositorConfig, MAX_LAYERS};
use strata_core::display::{DisplayId, DisplayInfo};
use strata_core::geometry::crop_to_scissor;
use strata_core::hal::{PipeConfig, PipePool, RotatorPool};
use strata_core::layer::{CompositionType, Layer, ListStats};
use strata_core::trace::{
    AllocationEvent, CacheEvent, DrawEvent, FallbackEvent, PrepareEvent, Tracer,
};
use strata_core::transform::LayerTransform;

use crate::batch::keep_longest_cached_run;
use crate::dump::{FrameSnapshot, LayerDisposition, LayerRow};
use crate::error::DrawError;
use crate::frame::{CachedFrame, FrameState, PipeAssignment};
use crate::idle::{IdleFlag, IdleTimer};
use crate::pipes::{MixerLayout, allocate_layer_pipes, pipes_needed};
use crate::policy::{FallbackReason, valid_dimension, yuv_doable};

/// Everything the engine borrows from the display server for one
/// prepare/draw call.
pub struct FrameContext<'a> {
    /// The shared overlay-pipe inventory.
    pub pool: &'a mut dyn PipePool,
    /// The shared rotation-unit pool.
    pub rotators: &'a mut dyn RotatorPool,
    /// The caller observed a list-geometry change since the last frame.
    pub geometry_changed: bool,
    /// An external display is mid-reconfiguration.
    pub external_configuring: bool,
    /// A content-protection transition is in flight.
    pub securing: bool,
    /// The DMA pipe type is already reserved outside this engine.
    pub dma_in_use: bool,
    /// Event sink for this frame.
    pub tracer: Tracer<'a>,
}

impl std::fmt::Debug for FrameContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameContext")
            .field("geometry_changed", &self.geometry_changed)
            .field("external_configuring", &self.external_configuring)
            .field("securing", &self.securing)
            .field("dma_in_use", &self.dma_in_use)
            .finish_non_exhaustive()
    }
}

/// What `prepare` decided for the frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrepareOutcome {
    /// No layer uses a pipe; the whole frame is GPU-composed.
    Fallback,
    /// Overlay and framebuffer layers coexist; the framebuffer target
    /// blends at `fb_z`.
    Mixed {
        /// Z-slot reserved for the framebuffer target.
        fb_z: u8,
    },
    /// Every layer is overlay-composed; no framebuffer target is needed.
    AllOverlay,
}

impl PrepareOutcome {
    /// The framebuffer z-slot, if the frame has one.
    #[must_use]
    pub fn fb_z(self) -> Option<u8> {
        match self {
            Self::Mixed { fb_z } => Some(fb_z),
            Self::Fallback | Self::AllOverlay => None,
        }
    }
}

/// Per-display overlay composition engine.
#[derive(Debug)]
pub struct CompositionEngine {
    display: DisplayId,
    info: DisplayInfo,
    layout: MixerLayout,
    config: CompositorConfig,
    frame: FrameState,
    cached: CachedFrame,
    idle_flag: Arc<IdleFlag>,
    idle_timer: Option<IdleTimer>,
}

impl CompositionEngine {
    /// Creates an engine for one display.
    ///
    /// The mixer layout is fixed here from the panel width and never
    /// re-evaluated.
    #[must_use]
    pub fn new(display: DisplayId, info: DisplayInfo, config: CompositorConfig) -> Self {
        Self {
            display,
            info,
            layout: MixerLayout::for_width(info.width),
            config,
            frame: FrameState::new(),
            cached: CachedFrame::new(),
            idle_flag: Arc::new(IdleFlag::new()),
            idle_timer: None,
        }
    }

    /// The engine's idle-fallback flag, for wiring up an [`IdleTimer`].
    #[must_use]
    pub fn idle_flag(&self) -> Arc<IdleFlag> {
        Arc::clone(&self.idle_flag)
    }

    /// Attaches the idle timer that each pipe-using draw will re-arm.
    pub fn set_idle_timer(&mut self, timer: IdleTimer) {
        self.idle_timer = Some(timer);
    }

    /// The mixer layout bound at construction.
    #[must_use]
    pub fn layout(&self) -> MixerLayout {
        self.layout
    }

    /// The current frame's allocation record.
    #[must_use]
    pub fn frame(&self) -> &FrameState {
        &self.frame
    }

    /// Decides composition routing for one frame.
    ///
    /// The caller must have opened the pipe pool's configuration bracket
    /// (`begin_config`) for this cycle; all claims land inside it and are
    /// rolled back if the frame aborts.
    ///
    /// Rebuilds all per-frame state. Layers must arrive with their
    /// composition slots reset to [`CompositionType::Framebuffer`]; the
    /// engine writes [`CompositionType::Overlay`] into the layers it claims
    /// pipes for (and into cached layers that need no GPU redraw).
    pub fn prepare(
        &mut self,
        ctx: &mut FrameContext<'_>,
        layers: &mut [Layer],
    ) -> PrepareOutcome {
        // Leases from the previous frame go back to the pool before the
        // slot arena is reset.
        self.release_rotators(ctx.rotators);

        let layer_count = layers.len();
        if layer_count == 0 || layer_count > MAX_LAYERS {
            self.frame.reset(0);
            return PrepareOutcome::Fallback;
        }
        self.frame.reset(layer_count);

        let stats = ListStats::collect(layers, ctx.geometry_changed);
        ctx.tracer.prepare(&PrepareEvent {
            display: self.display,
            layer_count,
            geometry_changed: ctx.geometry_changed,
        });

        if let Err(reason) = self.frame_doable(ctx, &stats) {
            ctx.tracer.fallback(&FallbackEvent {
                display: self.display,
                reason: reason.label(),
            });
            self.frame.set_all_framebuffer();
            return PrepareOutcome::Fallback;
        }

        self.update_layer_cache(ctx, layers, &stats);
        self.update_video(ctx, layers, &stats);
        keep_longest_cached_run(&mut self.frame);

        if let Err(reason) = self.full_frame_doable(ctx, layers, &stats) {
            // The full frame cannot ride the pipes; give video layers their
            // own chance and GPU-compose the rest.
            ctx.tracer.fallback(&FallbackEvent {
                display: self.display,
                reason: reason.label(),
            });
            self.frame.set_all_framebuffer();
            self.update_video(ctx, layers, &stats);
        }

        self.frame.overlay_count = self.frame.layer_count - self.frame.fb_count;

        if self.frame.overlay_count > 0 {
            self.frame.build_slot_map();
            match self.program(ctx, layers, &stats) {
                Ok(()) => {
                    ctx.tracer.allocation(&AllocationEvent {
                        display: self.display,
                        overlay_count: self.frame.overlay_count,
                        fb_count: self.frame.fb_count,
                        pipes_claimed: self.frame.pipes_claimed(),
                    });
                }
                Err(reason) => {
                    ctx.tracer.fallback(&FallbackEvent {
                        display: self.display,
                        reason: reason.label(),
                    });
                    self.frame.set_all_framebuffer();
                }
            }
        }

        // Any change in the composition split forces a framebuffer redraw.
        if self.frame.fb_count > 0
            && (self.frame.overlay_count != self.cached.overlay_count
                || self.frame.fb_count != self.cached.cache_count
                || self.frame.overlay_count == 0)
        {
            self.frame.needs_redraw = true;
        }

        self.publish_composition(layers);

        debug_assert_eq!(
            self.frame.overlay_count + self.frame.fb_count,
            self.frame.layer_count,
            "composition split must cover every layer"
        );

        match (self.frame.overlay_count, self.frame.fb_count) {
            (0, _) => PrepareOutcome::Fallback,
            (_, 0) => PrepareOutcome::AllOverlay,
            _ => PrepareOutcome::Mixed {
                fb_z: self.frame.fb_z.unwrap_or(0),
            },
        }
    }

    /// Queues this frame's overlay buffers into their claimed pipes.
    ///
    /// Layers already consumed (their pending flag cleared) are skipped, so
    /// a retried draw only touches what is left. Re-arms the idle timer
    /// whenever the frame actually used pipes.
    pub fn draw(
        &mut self,
        ctx: &mut FrameContext<'_>,
        layers: &[Layer],
    ) -> Result<(), DrawError> {
        if !self.config.enabled {
            return Ok(());
        }

        if self.frame.overlay_count > 0 {
            if let Some(timer) = &self.idle_timer {
                timer.mark_for_sleep();
            }
        }

        let mut queued = 0;
        for index in 0..self.frame.layer_count.min(layers.len()) {
            if self.frame.overlay_count == 0 {
                break;
            }
            if self.frame.fb_composed[index] || !self.frame.overlay_pending[index] {
                continue;
            }

            let layer = &layers[index];
            let buffer = layer
                .buffer
                .ok_or(DrawError::MissingBuffer { layer: index })?;

            let slot_index = self.frame.layer_to_slot[index]
                .expect("overlay layer missing from slot map");
            let slot = self.frame.slots[slot_index].expect("slot filled during prepare");

            let mut mem_id = buffer.mem_id;
            let mut offset = buffer.offset;
            if let Some(rotator) = slot.rotator {
                if !ctx.rotators.queue_buffer(rotator, mem_id, offset) {
                    return Err(DrawError::RotatorQueue { layer: index });
                }
                mem_id = ctx.rotators.output_mem_id(rotator);
                offset = ctx.rotators.output_offset(rotator);
            }

            match slot.pipes {
                PipeAssignment::Single(pipe) => {
                    if !ctx.pool.queue_buffer(mem_id, offset, pipe) {
                        return Err(DrawError::PipeQueue { layer: index, pipe });
                    }
                    queued += 1;
                }
                PipeAssignment::Split { left, right } => {
                    // Left mixer first, then right.
                    for pipe in [left, right].into_iter().flatten() {
                        if !ctx.pool.queue_buffer(mem_id, offset, pipe) {
                            return Err(DrawError::PipeQueue { layer: index, pipe });
                        }
                        queued += 1;
                    }
                }
            }
            self.frame.overlay_pending[index] = false;
        }

        ctx.tracer.draw(&DrawEvent {
            display: self.display,
            queued,
        });
        Ok(())
    }

    /// Captures the current frame's counts and per-layer classification.
    #[must_use]
    pub fn snapshot(&self) -> FrameSnapshot {
        let rows = (0..self.frame.layer_count)
            .map(|index| {
                let cached = self.frame.fb_composed[index];
                let slot = self.frame.layer_to_slot[index];
                let disposition = if cached {
                    if self.frame.needs_redraw {
                        LayerDisposition::Gpu
                    } else {
                        LayerDisposition::Cached
                    }
                } else {
                    LayerDisposition::Overlay
                };
                let z_order = if cached {
                    self.frame.fb_z
                } else {
                    slot.and_then(|s| self.frame.slots[s]).map(|s| s.z_order)
                };
                LayerRow {
                    index,
                    cached,
                    slot,
                    disposition,
                    z_order,
                }
            })
            .collect();

        FrameSnapshot {
            display: self.display,
            prev_layer_count: self.cached.layer_count,
            prev_overlay_count: self.cached.overlay_count,
            prev_cache_count: self.cached.cache_count,
            layer_count: self.frame.layer_count,
            overlay_count: self.frame.overlay_count,
            fb_count: self.frame.fb_count,
            needs_redraw: self.frame.needs_redraw,
            pipes_claimed: self.frame.pipes_claimed(),
            mixer_ceiling: self.config.mixer_ceiling(),
            rows,
        }
    }

    // -- Feasibility ---------------------------------------------------------

    fn frame_doable(&self, ctx: &FrameContext<'_>, stats: &ListStats) -> Result<(), FallbackReason> {
        if !self.config.enabled {
            return Err(FallbackReason::Disabled);
        }
        if ctx.external_configuring {
            return Err(FallbackReason::ExternalConfiguring);
        }
        if stats.needs_alpha_scale && !self.config.generation.supports_alpha_downscale() {
            return Err(FallbackReason::AlphaDownscale);
        }
        Ok(())
    }

    fn full_frame_doable(
        &mut self,
        ctx: &FrameContext<'_>,
        layers: &[Layer],
        stats: &ListStats,
    ) -> Result<(), FallbackReason> {
        let overlay_demand = self.frame.layer_count - self.frame.fb_count;
        let fb_needed = usize::from(self.frame.fb_count != 0);

        if !self.display.is_primary() {
            return Err(FallbackReason::SecondaryDisplay);
        }
        if overlay_demand > self.config.mixer_ceiling() - fb_needed {
            return Err(FallbackReason::MixerCeiling);
        }
        if pipes_needed(self.layout, &self.frame, layers, self.info.mid_x())
            > self.available_pipes(ctx, stats)
        {
            return Err(FallbackReason::InsufficientPipes);
        }
        if stats.skip_present() {
            return Err(FallbackReason::SkipLayer);
        }
        if self.idle_flag.consume() {
            return Err(FallbackReason::IdleTimeout);
        }

        for layer in layers.iter().take(self.frame.layer_count) {
            if layer.is_video() {
                continue;
            }
            // Pipes flip and rotate 180° natively; anything 90°-family on a
            // UI layer would need a rotator pass, which is not worth it.
            if layer.transform.involves_rot_90() {
                return Err(FallbackReason::Rotation);
            }
            if !valid_dimension(self.info, layer) {
                return Err(FallbackReason::InvalidDimension);
            }
        }
        Ok(())
    }

    /// Pipes claimable for this frame, after reservations.
    fn available_pipes(&self, ctx: &FrameContext<'_>, stats: &ListStats) -> usize {
        let mut available = ctx.pool.available(self.display);
        // A frame that rotates reserves the DMA pipes for the rotator.
        if stats.needs_rotator {
            available = available.saturating_sub(ctx.pool.dma_pipe_count());
        }
        if self.frame.fb_count > 0 {
            available = available.saturating_sub(self.layout.pipes_for_framebuffer());
        }
        available
    }

    // -- Classification ------------------------------------------------------

    fn update_layer_cache(
        &mut self,
        ctx: &mut FrameContext<'_>,
        layers: &[Layer],
        stats: &ListStats,
    ) {
        // A changed geometry, a changed layer count, or any skip layer
        // invalidates the whole cache for this frame.
        if stats.geometry_changed
            || stats.skip_present()
            || stats.layer_count != self.cached.layer_count
        {
            self.cached.reset();
            if self.config.verbose {
                ctx.tracer.cache(&CacheEvent {
                    display: self.display,
                    cached_count: 0,
                });
            }
            return;
        }

        let mut cached_count = 0;
        for (index, layer) in layers.iter().enumerate() {
            let current = layer.buffer.map(|b| b.id);
            if current.is_some() && self.cached.handles[index] == current {
                cached_count += 1;
                self.frame.fb_composed[index] = true;
            } else {
                self.cached.handles[index] = current;
            }
        }
        self.frame.fb_count = cached_count;

        if self.config.verbose {
            ctx.tracer.cache(&CacheEvent {
                display: self.display,
                cached_count,
            });
        }
    }

    /// Applies the video-only eligibility rule on top of the cache marking,
    /// in either direction.
    fn update_video(&mut self, ctx: &FrameContext<'_>, layers: &[Layer], stats: &ListStats) {
        for &index in &stats.video_indices {
            let doable = yuv_doable(&self.config, &layers[index], ctx.securing, ctx.dma_in_use);
            if !doable {
                if !self.frame.fb_composed[index] {
                    self.frame.fb_composed[index] = true;
                    self.frame.fb_count += 1;
                }
            } else if self.frame.fb_composed[index] {
                self.frame.fb_composed[index] = false;
                self.frame.fb_count -= 1;
            }
        }
    }

    // -- Programming ---------------------------------------------------------

    fn program(
        &mut self,
        ctx: &mut FrameContext<'_>,
        layers: &[Layer],
        stats: &ListStats,
    ) -> Result<(), FallbackReason> {
        self.frame.dma_claimed = false;
        let result = self.program_inner(ctx, layers, stats);
        if result.is_err() {
            // Nothing may leak from an aborted frame: leases back, claims
            // rolled back.
            self.release_rotators(ctx.rotators);
            ctx.pool.rollback();
        }
        result
    }

    fn program_inner(
        &mut self,
        ctx: &mut FrameContext<'_>,
        layers: &[Layer],
        stats: &ListStats,
    ) -> Result<(), FallbackReason> {
        allocate_layer_pipes(
            self.layout,
            &mut self.frame,
            layers,
            stats,
            &self.config,
            ctx.pool,
            self.display,
            self.info.mid_x(),
        )?;

        // Z-orders in ascending layer order; the first framebuffer run
        // claims the reserved framebuffer z-slot.
        let mut next_z: u8 = 0;
        for index in 0..self.frame.layer_count {
            if !self.frame.fb_composed[index] {
                let slot_index = self.frame.layer_to_slot[index]
                    .expect("overlay layer missing from slot map");
                self.frame.slots[slot_index]
                    .as_mut()
                    .expect("slot filled by allocation")
                    .z_order = next_z;
                next_z += 1;
                self.configure_layer(ctx, &layers[index], slot_index)?;
            } else if self.frame.fb_z.is_none() {
                self.frame.fb_z = Some(next_z);
                next_z += 1;
            }
        }
        Ok(())
    }

    fn configure_layer(
        &mut self,
        ctx: &mut FrameContext<'_>,
        layer: &Layer,
        slot_index: usize,
    ) -> Result<(), FallbackReason> {
        let mut slot = self.frame.slots[slot_index].expect("slot filled by allocation");

        if layer.transform.involves_rot_90() {
            // The rotator rides the DMA path; both cannot be in use at once.
            if ctx.dma_in_use || self.frame.dma_claimed {
                return Err(FallbackReason::ConfigRejected);
            }
            let rotator = ctx
                .rotators
                .lease(self.display)
                .ok_or(FallbackReason::ConfigRejected)?;
            slot.rotator = Some(rotator);
            self.frame.dma_claimed = true;
        }

        let mut crop = layer.source_crop;
        let mut dst = layer.display_frame;
        crop_to_scissor(&mut crop, &mut dst, self.info.bounds(), layer.transform);

        // With a rotator in front, the pipe sees pre-rotated pixels.
        let pipe_transform = if slot.rotator.is_some() {
            LayerTransform::IDENTITY
        } else {
            layer.transform
        };
        let base = PipeConfig {
            src_crop: crop,
            dst,
            transform: pipe_transform,
            z_order: slot.z_order,
            is_video: layer.is_video(),
            has_alpha: layer.has_alpha(),
            uses_rotator: slot.rotator.is_some(),
        };

        let configured = match slot.pipes {
            PipeAssignment::Single(pipe) => ctx.pool.configure(pipe, &base),
            PipeAssignment::Split { left, right } => {
                let mid = self.info.mid_x();
                let height = f64::from(self.info.height);
                let width = f64::from(self.info.width);
                let mut configured = true;
                if let Some(pipe) = left {
                    let config =
                        half_config(&base, layer, Rect::new(0.0, 0.0, mid, height));
                    configured = ctx.pool.configure(pipe, &config);
                }
                if configured {
                    if let Some(pipe) = right {
                        let config =
                            half_config(&base, layer, Rect::new(mid, 0.0, width, height));
                        configured = ctx.pool.configure(pipe, &config);
                    }
                }
                configured
            }
        };

        if !configured {
            if let Some(rotator) = slot.rotator.take() {
                ctx.rotators.release(rotator);
            }
            self.frame.slots[slot_index] = Some(slot);
            return Err(FallbackReason::ConfigRejected);
        }

        self.frame.slots[slot_index] = Some(slot);
        Ok(())
    }

    fn release_rotators(&mut self, rotators: &mut dyn RotatorPool) {
        for slot in self.frame.slots.iter_mut().flatten() {
            if let Some(rotator) = slot.rotator.take() {
                rotators.release(rotator);
            }
        }
    }

    // -- Publication ---------------------------------------------------------

    /// Writes the routing decision into the layers and rolls the cache
    /// counters forward.
    fn publish_composition(&mut self, layers: &mut [Layer]) {
        for (index, layer) in layers.iter_mut().enumerate().take(self.frame.layer_count) {
            if !self.frame.fb_composed[index] {
                self.frame.overlay_pending[index] = true;
                layer.composition = CompositionType::Overlay;
                layer.clear_framebuffer = true;
                // An overlay-composed buffer must not read as cached next
                // frame.
                self.cached.handles[index] = None;
            } else if !self.frame.needs_redraw {
                // Cached and nothing else changed: the GPU can skip it.
                layer.composition = CompositionType::Overlay;
            }
        }
        self.cached.overlay_count = self.frame.overlay_count;
        self.cached.cache_count = self.frame.fb_count;
        self.cached.layer_count = self.frame.layer_count;
    }
}

/// Clips a split-layout pipe configuration to one mixer's half.
fn half_config(base: &PipeConfig, layer: &Layer, half: Rect) -> PipeConfig {
    let mut crop = base.src_crop;
    let mut dst = base.dst;
    crop_to_scissor(&mut crop, &mut dst, half, layer.transform);
    PipeConfig {
        src_crop: crop,
        dst,
        ..*base
    }
}
