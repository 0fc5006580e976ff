// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame-decision snapshots for diagnostics.
//!
//! A [`FrameSnapshot`] captures one prepared frame: previous- and
//! current-frame counts plus the per-layer classification. Its [`Display`]
//! impl renders it as a text table; `strata_debug` records and exports
//! snapshots across frames.

use core::fmt;

use strata_core::display::DisplayId;

/// How one layer ended up composed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerDisposition {
    /// Streamed through overlay pipe(s).
    Overlay,
    /// Unchanged; held on the framebuffer without a GPU redraw.
    Cached,
    /// GPU-composed into the framebuffer this frame.
    Gpu,
}

impl LayerDisposition {
    /// Fixed-width label for the dump table.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Overlay => "OVERLAY",
            Self::Cached => "CACHE",
            Self::Gpu => "GPU",
        }
    }
}

/// One row of the per-layer classification table.
#[derive(Clone, Copy, Debug)]
pub struct LayerRow {
    /// List index of the layer.
    pub index: usize,
    /// Whether the layer is framebuffer-composed.
    pub cached: bool,
    /// Pipe-slot index, for overlay-composed layers.
    pub slot: Option<usize>,
    /// Final classification.
    pub disposition: LayerDisposition,
    /// Assigned z-order (the framebuffer slot for cached/GPU layers).
    pub z_order: Option<u8>,
}

/// Counts and per-layer classification of one prepared frame.
#[derive(Clone, Debug)]
pub struct FrameSnapshot {
    /// Which display this frame targeted.
    pub display: DisplayId,
    /// Previous frame's layer count.
    pub prev_layer_count: usize,
    /// Previous frame's overlay-composed count.
    pub prev_overlay_count: usize,
    /// Previous frame's cached count.
    pub prev_cache_count: usize,
    /// Current frame's layer count.
    pub layer_count: usize,
    /// Current frame's overlay-composed count.
    pub overlay_count: usize,
    /// Current frame's framebuffer-composed count.
    pub fb_count: usize,
    /// Whether the framebuffer must be redrawn.
    pub needs_redraw: bool,
    /// Hardware pipes claimed by this frame.
    pub pipes_claimed: usize,
    /// The per-mixer pipe ceiling in effect.
    pub mixer_ceiling: usize,
    /// Per-layer classification, ascending by index.
    pub rows: Vec<LayerRow>,
}

impl fmt::Display for FrameSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "overlay map for {} display",
            if self.display.is_primary() {
                "PRIMARY"
            } else {
                "EXTERNAL"
            }
        )?;
        writeln!(
            f,
            "prev frame: layers:{:2}  overlay:{:2}  cached:{:2}",
            self.prev_layer_count, self.prev_overlay_count, self.prev_cache_count
        )?;
        writeln!(
            f,
            "curr frame: layers:{:2}  overlay:{:2}  fb:{:2}",
            self.layer_count, self.overlay_count, self.fb_count
        )?;
        writeln!(
            f,
            "needs redraw:{:3}  pipes used:{:2}  mixer ceiling:{:2}",
            if self.needs_redraw { "YES" } else { "NO" },
            self.pipes_claimed,
            self.mixer_ceiling
        )?;
        writeln!(f, " index | cached? | slot | type    |  z")?;
        writeln!(f, "-------+---------+------+---------+----")?;
        for row in &self.rows {
            writeln!(
                f,
                "{:6} | {:>7} | {:>4} | {:<7} | {:>2}",
                row.index,
                if row.cached { "YES" } else { "NO" },
                match row.slot {
                    Some(slot) => format!("{slot}"),
                    None => String::from("-"),
                },
                row.disposition.label(),
                match row.z_order {
                    Some(z) => format!("{z}"),
                    None => String::from("-"),
                },
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_renders_counts_and_rows() {
        let snapshot = FrameSnapshot {
            display: DisplayId::PRIMARY,
            prev_layer_count: 3,
            prev_overlay_count: 2,
            prev_cache_count: 1,
            layer_count: 2,
            overlay_count: 1,
            fb_count: 1,
            needs_redraw: true,
            pipes_claimed: 1,
            mixer_ceiling: 4,
            rows: vec![
                LayerRow {
                    index: 0,
                    cached: true,
                    slot: None,
                    disposition: LayerDisposition::Gpu,
                    z_order: Some(0),
                },
                LayerRow {
                    index: 1,
                    cached: false,
                    slot: Some(0),
                    disposition: LayerDisposition::Overlay,
                    z_order: Some(1),
                },
            ],
        };

        let text = format!("{snapshot}");
        assert!(text.contains("PRIMARY"), "got: {text}");
        assert!(text.contains("overlay: 1"), "got: {text}");
        assert!(text.contains("GPU"), "got: {text}");
        assert!(text.contains("OVERLAY"), "got: {text}");
    }
}
