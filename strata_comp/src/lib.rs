// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-frame overlay-pipe allocation engine.
//!
//! Given an ordered layer list for one frame, `strata_comp` decides which
//! layers stream through the fixed pool of overlay hardware pipes and which
//! fall back to GPU framebuffer composition, respecting pipe capacity,
//! geometry limits, and frame-to-frame stability.
//!
//! # Architecture
//!
//! One [`CompositionEngine`](engine::CompositionEngine) per display runs the
//! prepare/draw cycle:
//!
//! ```text
//!   prepare(ctx, layers)
//!     reset ──► feasibility gate ──► comparison cache ──► video override
//!       ──► batching ──► full-frame re-check ──► allocate ──► program
//!       ──► publish composition types ──► PrepareOutcome
//!   draw(ctx, layers)
//!     queue buffers (rotator output first) into claimed pipes
//! ```
//!
//! **[`engine`]** — The engine itself, [`FrameContext`](engine::FrameContext),
//! and [`PrepareOutcome`](engine::PrepareOutcome).
//!
//! **[`frame`]** — Per-frame allocation state (fixed-capacity slot arena)
//! and the cross-frame comparison cache.
//!
//! **[`policy`]** — Feasibility checks and [`FallbackReason`](policy::FallbackReason).
//!
//! **[`pipes`]** — Mixer layout strategies (single-mixer vs. split
//! left/right) and pipe claiming with type fallthrough.
//!
//! **[`idle`]** — The idle-fallback timer and its one-shot flag.
//!
//! **[`dump`]** — [`FrameSnapshot`](dump::FrameSnapshot) diagnostics.
//!
//! **[`error`]** — Draw-time errors.
//!
//! Everything policy-infeasible routes to the GPU and is never an error;
//! see [`error`] for the few conditions that genuinely fail.

mod batch;
pub mod dump;
pub mod engine;
pub mod error;
pub mod frame;
pub mod idle;
pub mod pipes;
pub mod policy;
