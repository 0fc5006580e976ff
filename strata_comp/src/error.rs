// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Draw-time errors.
//!
//! Allocation never errors — an infeasible or over-capacity frame *routes*
//! to framebuffer composition instead (see
//! [`FallbackReason`](crate::policy::FallbackReason)). Only `draw` can fail
//! hard, when a buffer that was promised at prepare time is missing or the
//! hardware refuses a queue.

use strata_core::hal::PipeId;

/// A hard failure while queuing the frame's buffers into claimed pipes.
///
/// The frame is dropped; the caller retries with the next prepare/draw
/// cycle. Nothing here is fatal to the process.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DrawError {
    /// An overlay-composed layer reached draw with no buffer attached.
    #[error("layer {layer} has no buffer attached")]
    MissingBuffer {
        /// List index of the offending layer.
        layer: usize,
    },

    /// The rotation unit rejected the layer's buffer.
    #[error("rotator rejected buffer for layer {layer}")]
    RotatorQueue {
        /// List index of the offending layer.
        layer: usize,
    },

    /// A pipe rejected the layer's buffer.
    #[error("queue to pipe {pipe:?} failed for layer {layer}")]
    PipeQueue {
        /// List index of the offending layer.
        layer: usize,
        /// The pipe that rejected the queue.
        pipe: PipeId,
    },
}
