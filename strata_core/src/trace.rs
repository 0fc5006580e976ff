// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for allocation decisions.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that
//! the composition engine calls at each stage of a frame. All method bodies
//! default to no-ops, so implementing only the events you care about is
//! fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace`
//! feature is **off**, every `Tracer` method compiles to nothing (zero
//! overhead). When **on**, each method performs a single `Option` branch
//! before dispatching.

use crate::display::DisplayId;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted at the start of every `prepare` call.
#[derive(Clone, Copy, Debug)]
pub struct PrepareEvent {
    /// Which display is being prepared.
    pub display: DisplayId,
    /// Number of app layers in the list.
    pub layer_count: usize,
    /// Whether the caller flagged a list-geometry change.
    pub geometry_changed: bool,
}

/// Emitted after the comparison cache has classified the list.
#[derive(Clone, Copy, Debug)]
pub struct CacheEvent {
    /// Which display.
    pub display: DisplayId,
    /// Layers whose buffers are unchanged since the previous frame.
    pub cached_count: usize,
}

/// Emitted whenever a frame routes (fully or partially) back to the
/// framebuffer for a policy or capacity reason.
#[derive(Clone, Copy, Debug)]
pub struct FallbackEvent {
    /// Which display.
    pub display: DisplayId,
    /// Short static label for the reason (e.g. `"idle-timeout"`).
    pub reason: &'static str,
}

/// Emitted after pipe allocation and programming succeed.
#[derive(Clone, Copy, Debug)]
pub struct AllocationEvent {
    /// Which display.
    pub display: DisplayId,
    /// Layers streamed through overlay pipes.
    pub overlay_count: usize,
    /// Layers left to framebuffer composition.
    pub fb_count: usize,
    /// Hardware pipes claimed (a split layer claims two).
    pub pipes_claimed: usize,
}

/// Emitted after a successful `draw`.
#[derive(Clone, Copy, Debug)]
pub struct DrawEvent {
    /// Which display.
    pub display: DisplayId,
    /// Buffers queued to pipes this draw.
    pub queued: usize,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the composition engine.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called at the start of every `prepare`.
    fn on_prepare(&mut self, e: &PrepareEvent) {
        _ = e;
    }

    /// Called after the comparison-cache pass.
    fn on_cache(&mut self, e: &CacheEvent) {
        _ = e;
    }

    /// Called on every framebuffer fallback.
    fn on_fallback(&mut self, e: &FallbackEvent) {
        _ = e;
    }

    /// Called after a successful allocation.
    fn on_allocation(&mut self, e: &AllocationEvent) {
        _ = e;
    }

    /// Called after a successful draw.
    fn on_draw(&mut self, e: &DrawEvent) {
        _ = e;
    }
}

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing.
/// When **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`PrepareEvent`].
    #[inline]
    pub fn prepare(&mut self, e: &PrepareEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_prepare(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`CacheEvent`].
    #[inline]
    pub fn cache(&mut self, e: &CacheEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_cache(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FallbackEvent`].
    #[inline]
    pub fn fallback(&mut self, e: &FallbackEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_fallback(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`AllocationEvent`].
    #[inline]
    pub fn allocation(&mut self, e: &AllocationEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_allocation(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`DrawEvent`].
    #[inline]
    pub fn draw(&mut self, e: &DrawEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_draw(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}
