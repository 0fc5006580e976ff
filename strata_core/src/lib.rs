// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core layer model, policy types, and hardware contracts for overlay
//! composition.
//!
//! `strata_core` provides the foundational data structures for deciding, per
//! frame, which display layers are streamed through dedicated overlay
//! hardware pipes and which are composed into the framebuffer by the GPU. It
//! is `no_std` compatible (with `alloc`).
//!
//! # Architecture
//!
//! The crate is organized around the data that flows through one
//! prepare/draw cycle:
//!
//! ```text
//!   Caller (display server)
//!       │  ordered &mut [Layer]
//!       ▼
//!   ListStats::collect() ──► CompositionEngine::prepare() ──► PrepareOutcome
//!            (strata_comp)        │ claims via PipePool / RotatorPool
//!                                 ▼
//!   CompositionEngine::draw() ──► queue_buffer() per claimed pipe
//! ```
//!
//! **[`layer`]** — The per-layer input/output contract: geometry, transform,
//! buffer handle, skip flag in; composition type and clear-framebuffer hint
//! out. Also [`ListStats`](layer::ListStats), the per-frame digest of a
//! layer list.
//!
//! **[`display`]** — Display identification and mode geometry.
//!
//! **[`transform`]** — Flip/rotate transform type for layer content.
//!
//! **[`geometry`]** — Crop/scissor arithmetic shared by policy checks and
//! pipe programming.
//!
//! **[`config`]** — The process-wide [`CompositorConfig`](config::CompositorConfig)
//! and hardware-generation model, plus the capacity constants.
//!
//! **[`hal`]** — The [`PipePool`](hal::PipePool) and
//! [`RotatorPool`](hal::RotatorPool) traits that platform integrations
//! implement, and the pipe configuration payload.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and event types for
//! allocation-decision instrumentation, with zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one
//!   branch per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod config;
pub mod display;
pub mod geometry;
pub mod hal;
pub mod layer;
pub mod trace;
pub mod transform;
