// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Batching heuristic for cached layers.
//!
//! Contiguous unchanged layers can share one framebuffer region, so they are
//! worth leaving on the GPU path. An isolated unchanged layer wedged between
//! overlay layers saves nothing and costs a z-order slot, so everything
//! outside the single longest cached run is pushed back to overlay
//! eligibility.

use crate::frame::FrameState;

/// Keeps only the longest contiguous run of framebuffer-composed layers.
///
/// Every framebuffer-composed layer outside that run is re-marked
/// overlay-eligible and `fb_count` is updated to the run length. Does
/// nothing when no layer — or every layer — is framebuffer-composed.
pub(crate) fn keep_longest_cached_run(frame: &mut FrameState) {
    if frame.fb_count == 0 || frame.fb_count == frame.layer_count {
        return;
    }

    // Longest run of cached layers; first wins on ties.
    let mut best_start = 0;
    let mut best_len = 0;
    let mut index = 0;
    while index < frame.layer_count {
        let start = index;
        while index < frame.layer_count && frame.fb_composed[index] {
            index += 1;
        }
        let len = index - start;
        if len > best_len {
            best_len = len;
            best_start = start;
        }
        if index < frame.layer_count {
            index += 1;
        }
    }

    for (index, composed) in frame
        .fb_composed
        .iter_mut()
        .enumerate()
        .take(frame.layer_count)
    {
        if index < best_start || index >= best_start + best_len {
            *composed = false;
        }
    }
    frame.fb_count = best_len;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with(pattern: &[bool]) -> FrameState {
        let mut frame = FrameState::new();
        frame.reset(pattern.len());
        for (index, &cached) in pattern.iter().enumerate() {
            frame.fb_composed[index] = cached;
            if cached {
                frame.fb_count += 1;
            }
        }
        frame
    }

    fn marking(frame: &FrameState) -> Vec<bool> {
        (0..frame.layer_count()).map(|i| frame.is_fb_composed(i)).collect()
    }

    #[test]
    fn isolated_cached_layer_is_pushed_back_to_overlay() {
        let mut frame = frame_with(&[true, true, false, true]);
        keep_longest_cached_run(&mut frame);
        assert_eq!(marking(&frame), [true, true, false, false]);
        assert_eq!(frame.fb_count(), 2);
    }

    #[test]
    fn later_longer_run_wins() {
        let mut frame = frame_with(&[true, false, true, true, true, false]);
        keep_longest_cached_run(&mut frame);
        assert_eq!(marking(&frame), [false, false, true, true, true, false]);
        assert_eq!(frame.fb_count(), 3);
    }

    #[test]
    fn first_run_wins_a_tie() {
        let mut frame = frame_with(&[true, true, false, true, true]);
        keep_longest_cached_run(&mut frame);
        assert_eq!(marking(&frame), [true, true, false, false, false]);
        assert_eq!(frame.fb_count(), 2);
    }

    #[test]
    fn nothing_cached_is_a_no_op() {
        let mut frame = frame_with(&[false, false, false]);
        keep_longest_cached_run(&mut frame);
        assert_eq!(marking(&frame), [false, false, false]);
        assert_eq!(frame.fb_count(), 0);
    }

    #[test]
    fn everything_cached_is_a_no_op() {
        let mut frame = frame_with(&[true, true, true]);
        keep_longest_cached_run(&mut frame);
        assert_eq!(marking(&frame), [true, true, true]);
        assert_eq!(frame.fb_count(), 3);
    }
}
