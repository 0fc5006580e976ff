// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and JSON export for Strata diagnostics.
//!
//! [`recorder`] keeps a bounded ring of per-frame
//! [`FrameSnapshot`](strata_comp::dump::FrameSnapshot)s and renders them as
//! text. [`json`] exports recordings as JSON for offline analysis.
//!
//! A [`PrettyPrintSink`](recorder::PrettyPrintSink) is also provided for
//! line-per-event trace output when the `trace` feature of `strata_core` is
//! active.

pub mod json;
pub mod recorder;
