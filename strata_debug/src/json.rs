// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON export of recorded frame decisions.
//!
//! The output is a plain JSON array of frame objects, one per retained
//! snapshot, suitable for offline diffing of allocation behavior across
//! builds.

use serde_json::{Value, json};
use strata_comp::dump::FrameSnapshot;

use crate::recorder::FrameLog;

/// Serializes one snapshot.
#[must_use]
pub fn snapshot_to_json(snapshot: &FrameSnapshot) -> Value {
    json!({
        "display": snapshot.display.0,
        "prev": {
            "layers": snapshot.prev_layer_count,
            "overlay": snapshot.prev_overlay_count,
            "cached": snapshot.prev_cache_count,
        },
        "layers": snapshot.layer_count,
        "overlay": snapshot.overlay_count,
        "fb": snapshot.fb_count,
        "needs_redraw": snapshot.needs_redraw,
        "pipes_claimed": snapshot.pipes_claimed,
        "mixer_ceiling": snapshot.mixer_ceiling,
        "rows": snapshot
            .rows
            .iter()
            .map(|row| {
                json!({
                    "index": row.index,
                    "cached": row.cached,
                    "slot": row.slot,
                    "type": row.disposition.label(),
                    "z": row.z_order,
                })
            })
            .collect::<Vec<Value>>(),
    })
}

/// Serializes a whole recording, oldest frame first.
#[must_use]
pub fn log_to_json(log: &FrameLog) -> Value {
    Value::Array(log.frames().map(snapshot_to_json).collect())
}
