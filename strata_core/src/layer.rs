// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-layer input/output contract and the per-frame list digest.
//!
//! The display server owns the layer list and rebuilds it every frame in
//! z-order (index 0 at the back). The allocator reads each layer's geometry,
//! transform, and buffer, and writes back the composition routing: the
//! [`CompositionType`] slot and the clear-framebuffer hint.

use alloc::vec::Vec;
use core::fmt;

use kurbo::Rect;

use crate::geometry;
use crate::transform::LayerTransform;

/// Identity of a graphics buffer, stable for the lifetime of its allocation.
///
/// Two frames showing the same `BufferId` at the same list position are
/// showing unchanged content; the comparison cache is built on exactly this.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BufferId(pub u64);

impl fmt::Debug for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BufferId({})", self.0)
    }
}

/// What kind of content a buffer carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// RGB UI content.
    Ui,
    /// YUV video content, eligible for the dedicated video pipes.
    Video,
}

/// A layer's attached graphics buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferHandle {
    /// Stable buffer identity.
    pub id: BufferId,
    /// Content kind.
    pub kind: BufferKind,
    /// Memory id handed to the pipe queue (ion/dma-buf fd in practice).
    pub mem_id: i32,
    /// Byte offset of the pixel data within the allocation.
    pub offset: u32,
    /// Whether the pixel format carries an alpha channel.
    pub has_alpha: bool,
}

/// How a layer is composed this frame. Written by the allocator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CompositionType {
    /// GPU-composed into the framebuffer target.
    #[default]
    Framebuffer,
    /// Streamed through an overlay pipe (or cached — no GPU redraw needed).
    Overlay,
}

/// One display layer, as handed to `prepare`/`draw`.
#[derive(Clone, Copy, Debug)]
pub struct Layer {
    /// Source region of the buffer, in buffer pixels.
    pub source_crop: Rect,
    /// Destination region on the display, in display pixels.
    pub display_frame: Rect,
    /// Flip/rotate applied between crop and frame.
    pub transform: LayerTransform,
    /// Attached buffer, if the producer has queued one.
    pub buffer: Option<BufferHandle>,
    /// Producer-set: this layer must not be cached or overlay-composed.
    pub skip: bool,
    /// Output slot: routing decided by the allocator.
    pub composition: CompositionType,
    /// Output hint: the GPU should clear this layer's region of the
    /// framebuffer because an overlay pipe covers it.
    pub clear_framebuffer: bool,
}

impl Layer {
    /// Creates a UI layer mapping `source_crop` onto `display_frame`.
    #[must_use]
    pub fn new(source_crop: Rect, display_frame: Rect) -> Self {
        Self {
            source_crop,
            display_frame,
            transform: LayerTransform::IDENTITY,
            buffer: None,
            skip: false,
            composition: CompositionType::Framebuffer,
            clear_framebuffer: false,
        }
    }

    /// Returns whether the attached buffer is video content.
    #[inline]
    #[must_use]
    pub fn is_video(&self) -> bool {
        matches!(
            self.buffer,
            Some(BufferHandle {
                kind: BufferKind::Video,
                ..
            })
        )
    }

    /// Returns whether the attached buffer carries alpha.
    #[inline]
    #[must_use]
    pub fn has_alpha(&self) -> bool {
        self.buffer.is_some_and(|b| b.has_alpha)
    }

    /// Returns whether crop and destination differ in size.
    #[inline]
    #[must_use]
    pub fn needs_scaling(&self) -> bool {
        geometry::needs_scaling(self.source_crop, self.display_frame)
    }
}

/// Per-frame digest of a layer list, computed once per `prepare`.
#[derive(Clone, Debug, Default)]
pub struct ListStats {
    /// Number of app layers in the list.
    pub layer_count: usize,
    /// Number of layers flagged skip.
    pub skip_count: usize,
    /// Indices of video layers, ascending.
    pub video_indices: Vec<usize>,
    /// Some layer is both scaled and carries alpha.
    pub needs_alpha_scale: bool,
    /// Some video layer needs a 90°-family rotation, so the frame will
    /// claim a rotation unit (and the DMA path that backs it).
    pub needs_rotator: bool,
    /// The caller reported a changed list geometry since last frame.
    pub geometry_changed: bool,
}

impl ListStats {
    /// Digests `layers` for one frame.
    #[must_use]
    pub fn collect(layers: &[Layer], geometry_changed: bool) -> Self {
        let mut stats = Self {
            layer_count: layers.len(),
            geometry_changed,
            ..Self::default()
        };

        for (index, layer) in layers.iter().enumerate() {
            if layer.skip {
                stats.skip_count += 1;
            } else if layer.is_video() {
                stats.video_indices.push(index);
                if layer.transform.involves_rot_90() {
                    stats.needs_rotator = true;
                }
            }
            if !stats.needs_alpha_scale && layer.needs_scaling() && layer.has_alpha() {
                stats.needs_alpha_scale = true;
            }
        }
        stats
    }

    /// Returns whether any skip layer is present.
    #[inline]
    #[must_use]
    pub fn skip_present(&self) -> bool {
        self.skip_count != 0
    }

    /// Returns whether any video layer is present.
    #[inline]
    #[must_use]
    pub fn video_present(&self) -> bool {
        !self.video_indices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ui_layer() -> Layer {
        let mut layer = Layer::new(
            Rect::new(0.0, 0.0, 100.0, 100.0),
            Rect::new(0.0, 0.0, 100.0, 100.0),
        );
        layer.buffer = Some(BufferHandle {
            id: BufferId(1),
            kind: BufferKind::Ui,
            mem_id: 3,
            offset: 0,
            has_alpha: false,
        });
        layer
    }

    fn video_layer() -> Layer {
        let mut layer = ui_layer();
        layer.buffer = Some(BufferHandle {
            id: BufferId(2),
            kind: BufferKind::Video,
            mem_id: 4,
            offset: 0,
            has_alpha: false,
        });
        layer
    }

    #[test]
    fn stats_count_skip_and_video() {
        let mut skipped = ui_layer();
        skipped.skip = true;
        let layers = [ui_layer(), video_layer(), skipped, video_layer()];
        let stats = ListStats::collect(&layers, false);

        assert_eq!(stats.layer_count, 4);
        assert_eq!(stats.skip_count, 1);
        assert_eq!(stats.video_indices, [1, 3]);
        assert!(stats.skip_present());
        assert!(stats.video_present());
        assert!(!stats.needs_rotator);
    }

    #[test]
    fn rotated_video_demands_a_rotator() {
        let mut video = video_layer();
        video.transform = LayerTransform::ROT_90;
        let stats = ListStats::collect(&[ui_layer(), video], false);
        assert!(stats.needs_rotator);
    }

    #[test]
    fn rotated_ui_does_not_demand_a_rotator() {
        let mut ui = ui_layer();
        ui.transform = LayerTransform::ROT_90;
        let stats = ListStats::collect(&[ui], false);
        assert!(!stats.needs_rotator, "only video layers take the rotator path");
    }

    #[test]
    fn alpha_scale_needs_both_alpha_and_scaling() {
        let mut scaled_opaque = ui_layer();
        scaled_opaque.display_frame = Rect::new(0.0, 0.0, 200.0, 200.0);
        assert!(!ListStats::collect(&[scaled_opaque], false).needs_alpha_scale);

        let mut scaled_alpha = scaled_opaque;
        scaled_alpha.buffer = Some(BufferHandle {
            id: BufferId(9),
            kind: BufferKind::Ui,
            mem_id: 5,
            offset: 0,
            has_alpha: true,
        });
        assert!(ListStats::collect(&[scaled_alpha], false).needs_alpha_scale);

        let unscaled_alpha = {
            let mut layer = ui_layer();
            layer.buffer = Some(BufferHandle {
                id: BufferId(10),
                kind: BufferKind::Ui,
                mem_id: 6,
                offset: 0,
                has_alpha: true,
            });
            layer
        };
        assert!(!ListStats::collect(&[unscaled_alpha], false).needs_alpha_scale);
    }

    #[test]
    fn skip_layers_are_not_counted_as_video() {
        let mut skipped_video = video_layer();
        skipped_video.skip = true;
        let stats = ListStats::collect(&[skipped_video], false);
        assert_eq!(stats.skip_count, 1);
        assert!(stats.video_indices.is_empty());
    }
}
