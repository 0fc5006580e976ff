// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame-snapshot recording and human-readable trace output.
//!
//! [`FrameLog`] is a bounded ring of [`FrameSnapshot`]s — push one per
//! prepared frame, render the recent history on demand as one text report.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per
//! event to a [`Write`](std::io::Write) destination (default: stderr).

use std::collections::VecDeque;
use std::io::Write;

use strata_comp::dump::FrameSnapshot;
use strata_core::trace::{
    AllocationEvent, CacheEvent, DrawEvent, FallbackEvent, PrepareEvent, TraceSink,
};

/// Bounded ring of per-frame snapshots.
#[derive(Debug)]
pub struct FrameLog {
    capacity: usize,
    frames: VecDeque<FrameSnapshot>,
}

impl FrameLog {
    /// Creates a log that retains the most recent `capacity` frames.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "frame log capacity must be non-zero");
        Self {
            capacity,
            frames: VecDeque::with_capacity(capacity),
        }
    }

    /// Records one frame, evicting the oldest when full.
    pub fn push(&mut self, snapshot: FrameSnapshot) {
        if self.frames.len() == self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back(snapshot);
    }

    /// Recorded frames, oldest first.
    pub fn frames(&self) -> impl Iterator<Item = &FrameSnapshot> {
        self.frames.iter()
    }

    /// Number of frames currently retained.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Renders the retained frames as one text report.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for snapshot in &self.frames {
            out.push_str(&snapshot.to_string());
            out.push('\n');
        }
        out
    }
}

/// Writes human-readable trace lines to a [`Write`](std::io::Write)
/// destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_prepare(&mut self, e: &PrepareEvent) {
        let _ = writeln!(
            self.writer,
            "[prepare] display={} layers={} geometry_changed={}",
            e.display.0, e.layer_count, e.geometry_changed,
        );
    }

    fn on_cache(&mut self, e: &CacheEvent) {
        let _ = writeln!(
            self.writer,
            "[cache] display={} cached={}",
            e.display.0, e.cached_count,
        );
    }

    fn on_fallback(&mut self, e: &FallbackEvent) {
        let _ = writeln!(
            self.writer,
            "[fallback] display={} reason={}",
            e.display.0, e.reason,
        );
    }

    fn on_allocation(&mut self, e: &AllocationEvent) {
        let _ = writeln!(
            self.writer,
            "[alloc] display={} overlay={} fb={} pipes={}",
            e.display.0, e.overlay_count, e.fb_count, e.pipes_claimed,
        );
    }

    fn on_draw(&mut self, e: &DrawEvent) {
        let _ = writeln!(
            self.writer,
            "[draw] display={} queued={}",
            e.display.0, e.queued,
        );
    }
}

#[cfg(test)]
mod tests {
    use strata_comp::dump::{LayerDisposition, LayerRow};
    use strata_core::display::DisplayId;

    use super::*;

    fn sample_snapshot(overlay: usize) -> FrameSnapshot {
        FrameSnapshot {
            display: DisplayId::PRIMARY,
            prev_layer_count: 0,
            prev_overlay_count: 0,
            prev_cache_count: 0,
            layer_count: overlay,
            overlay_count: overlay,
            fb_count: 0,
            needs_redraw: false,
            pipes_claimed: overlay,
            mixer_ceiling: 4,
            rows: (0..overlay)
                .map(|index| LayerRow {
                    index,
                    cached: false,
                    slot: Some(index),
                    disposition: LayerDisposition::Overlay,
                    z_order: Some(u8::try_from(index).unwrap_or(u8::MAX)),
                })
                .collect(),
        }
    }

    #[test]
    fn log_evicts_oldest_when_full() {
        let mut log = FrameLog::new(2);
        log.push(sample_snapshot(1));
        log.push(sample_snapshot(2));
        log.push(sample_snapshot(3));

        assert_eq!(log.len(), 2);
        let counts: Vec<usize> = log.frames().map(|s| s.overlay_count).collect();
        assert_eq!(counts, [2, 3]);
    }

    #[test]
    fn render_contains_every_retained_frame() {
        let mut log = FrameLog::new(4);
        log.push(sample_snapshot(1));
        log.push(sample_snapshot(2));
        let text = log.render();
        assert_eq!(text.matches("overlay map").count(), 2, "got: {text}");
    }

    #[test]
    fn pretty_print_prepare_line() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_prepare(&PrepareEvent {
            display: DisplayId::PRIMARY,
            layer_count: 3,
            geometry_changed: true,
        });
        sink.on_fallback(&FallbackEvent {
            display: DisplayId::PRIMARY,
            reason: "idle-timeout",
        });
        let output = String::from_utf8(sink.writer).unwrap();
        assert!(output.contains("[prepare]"), "got: {output}");
        assert!(output.contains("layers=3"), "got: {output}");
        assert!(output.contains("reason=idle-timeout"), "got: {output}");
    }
}
