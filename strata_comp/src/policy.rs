// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Feasibility policy: when overlay composition is worth attempting.
//!
//! None of these checks are errors. A failed check routes layers to the GPU
//! for this frame and is reported as a [`FallbackReason`] through trace
//! events and the dump output.

use kurbo::Rect;
use strata_core::config::{
    CompositorConfig, MAX_VIDEO_DOWNSCALE, MIN_BLOCK_HEIGHT, MIN_CROP_DIMENSION,
};
use strata_core::display::DisplayInfo;
use strata_core::geometry::crop_to_scissor;
use strata_core::layer::Layer;

/// Why a frame (or a layer) was routed to framebuffer composition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FallbackReason {
    /// Overlay composition is disabled process-wide.
    Disabled,
    /// An external display is mid-reconfiguration.
    ExternalConfiguring,
    /// The frame needs alpha downscaling this hardware cannot do.
    AlphaDownscale,
    /// Overlay composition is restricted to the primary display.
    SecondaryDisplay,
    /// Pipe demand exceeds the per-mixer ceiling.
    MixerCeiling,
    /// Pipe demand exceeds what the pool can supply.
    InsufficientPipes,
    /// A skip (non-cacheable) layer is present.
    SkipLayer,
    /// The idle-fallback timer fired since the last draw.
    IdleTimeout,
    /// A non-video layer needs a 90°-family rotation.
    Rotation,
    /// A layer's visible crop is below the hardware minimum.
    InvalidDimension,
    /// The pool could not supply a pipe during allocation.
    PipeExhausted,
    /// The hardware rejected a pipe configuration.
    ConfigRejected,
}

impl FallbackReason {
    /// Short static label for trace events and dumps.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::ExternalConfiguring => "external-configuring",
            Self::AlphaDownscale => "alpha-downscale",
            Self::SecondaryDisplay => "secondary-display",
            Self::MixerCeiling => "mixer-ceiling",
            Self::InsufficientPipes => "insufficient-pipes",
            Self::SkipLayer => "skip-layer",
            Self::IdleTimeout => "idle-timeout",
            Self::Rotation => "rotation",
            Self::InvalidDimension => "invalid-dimension",
            Self::PipeExhausted => "pipe-exhausted",
            Self::ConfigRejected => "config-rejected",
        }
    }
}

/// Returns whether a layer's visible source crop clears the hardware
/// minimums.
///
/// If the destination is partially off-screen, the crop is first reduced to
/// the proportion that is actually visible — a large buffer mostly hanging
/// off the panel can still present a sliver too thin for a pipe to fetch.
#[must_use]
pub fn valid_dimension(display: DisplayInfo, layer: &Layer) -> bool {
    if layer.buffer.is_none() {
        return false;
    }

    let bounds = display.bounds();
    let mut crop = layer.source_crop;
    let mut dst = layer.display_frame;
    if dst.x0 < bounds.x0 || dst.y0 < bounds.y0 || dst.x1 > bounds.x1 || dst.y1 > bounds.y1 {
        crop_to_scissor(&mut crop, &mut dst, bounds, layer.transform);
    }

    if crop.width() < MIN_CROP_DIMENSION || crop.height() < MIN_CROP_DIMENSION {
        return false;
    }
    // Minimum fetch block.
    if crop.height() < MIN_BLOCK_HEIGHT {
        return false;
    }
    true
}

/// Returns whether a video layer is eligible for an overlay pipe.
///
/// `securing` reports an in-flight content-protection transition;
/// `dma_in_use` reports that the DMA pipe type is already reserved
/// elsewhere, which starves the rotation path a 90°-rotated video needs.
#[must_use]
pub fn yuv_doable(
    config: &CompositorConfig,
    layer: &Layer,
    securing: bool,
    dma_in_use: bool,
) -> bool {
    if layer.skip {
        return false;
    }

    // Rotator and DMA-backed pipes are mutually exclusive.
    if layer.transform.involves_rot_90() && dma_in_use {
        return false;
    }

    if securing && config.generation.securing_blocks_video() {
        return false;
    }

    if config.generation.caps_video_downscale() && exceeds_downscale_cap(layer) {
        return false;
    }

    true
}

/// Returns whether either axis downscales by more than
/// [`MAX_VIDEO_DOWNSCALE`].
fn exceeds_downscale_cap(layer: &Layer) -> bool {
    let crop = layer.source_crop;
    let dst: Rect = layer.display_frame;
    let (dst_w, dst_h) = (dst.width(), dst.height());
    if dst_w <= 0.0 || dst_h <= 0.0 {
        return true;
    }
    crop.width() / dst_w > MAX_VIDEO_DOWNSCALE || crop.height() / dst_h > MAX_VIDEO_DOWNSCALE
}

#[cfg(test)]
mod tests {
    use strata_core::config::Generation;
    use strata_core::layer::{BufferHandle, BufferId, BufferKind};
    use strata_core::transform::LayerTransform;

    use super::*;

    const DISPLAY: DisplayInfo = DisplayInfo::new(1080, 1920);

    fn layer_with(crop: Rect, dst: Rect) -> Layer {
        let mut layer = Layer::new(crop, dst);
        layer.buffer = Some(BufferHandle {
            id: BufferId(1),
            kind: BufferKind::Video,
            mem_id: 7,
            offset: 0,
            has_alpha: false,
        });
        layer
    }

    #[test]
    fn bufferless_layer_is_invalid() {
        let mut layer = layer_with(
            Rect::new(0.0, 0.0, 100.0, 100.0),
            Rect::new(0.0, 0.0, 100.0, 100.0),
        );
        layer.buffer = None;
        assert!(!valid_dimension(DISPLAY, &layer));
    }

    #[test]
    fn tiny_crop_is_invalid() {
        let layer = layer_with(
            Rect::new(0.0, 0.0, 4.0, 100.0),
            Rect::new(0.0, 0.0, 4.0, 100.0),
        );
        assert!(!valid_dimension(DISPLAY, &layer));

        let layer = layer_with(
            Rect::new(0.0, 0.0, 100.0, 3.0),
            Rect::new(0.0, 0.0, 100.0, 3.0),
        );
        assert!(!valid_dimension(DISPLAY, &layer));
    }

    #[test]
    fn offscreen_destination_shrinks_the_checked_crop() {
        // 100px wide source, but only 4px of the destination are on-screen.
        let layer = layer_with(
            Rect::new(0.0, 0.0, 100.0, 100.0),
            Rect::new(-96.0, 0.0, 4.0, 100.0),
        );
        assert!(!valid_dimension(DISPLAY, &layer));

        // With half visible the crop is still comfortably large.
        let layer = layer_with(
            Rect::new(0.0, 0.0, 100.0, 100.0),
            Rect::new(-50.0, 0.0, 50.0, 100.0),
        );
        assert!(valid_dimension(DISPLAY, &layer));
    }

    #[test]
    fn skip_video_is_not_doable() {
        let config = CompositorConfig::new(Generation::Mdss5);
        let mut layer = layer_with(
            Rect::new(0.0, 0.0, 100.0, 100.0),
            Rect::new(0.0, 0.0, 100.0, 100.0),
        );
        layer.skip = true;
        assert!(!yuv_doable(&config, &layer, false, false));
    }

    #[test]
    fn rotated_video_conflicts_with_reserved_dma() {
        let config = CompositorConfig::new(Generation::Mdss5);
        let mut layer = layer_with(
            Rect::new(0.0, 0.0, 100.0, 100.0),
            Rect::new(0.0, 0.0, 100.0, 100.0),
        );
        layer.transform = LayerTransform::ROT_90;
        assert!(yuv_doable(&config, &layer, false, false));
        assert!(!yuv_doable(&config, &layer, false, true));
        // An unrotated video does not care about the DMA pipe.
        layer.transform = LayerTransform::IDENTITY;
        assert!(yuv_doable(&config, &layer, false, true));
    }

    #[test]
    fn securing_blocks_video_only_on_mid_generation() {
        let layer = layer_with(
            Rect::new(0.0, 0.0, 100.0, 100.0),
            Rect::new(0.0, 0.0, 100.0, 100.0),
        );
        let mdp4 = CompositorConfig::new(Generation::Mdp4);
        let mdss5 = CompositorConfig::new(Generation::Mdss5);
        assert!(!yuv_doable(&mdp4, &layer, true, false));
        assert!(yuv_doable(&mdp4, &layer, false, false));
        assert!(yuv_doable(&mdss5, &layer, true, false));
    }

    #[test]
    fn downscale_cap_applies_to_newest_generation_only() {
        // 4.17x horizontal downscale.
        let layer = layer_with(
            Rect::new(0.0, 0.0, 500.0, 100.0),
            Rect::new(0.0, 0.0, 120.0, 100.0),
        );
        let mdss5 = CompositorConfig::new(Generation::Mdss5);
        let mdp4 = CompositorConfig::new(Generation::Mdp4);
        assert!(!yuv_doable(&mdss5, &layer, false, false));
        assert!(yuv_doable(&mdp4, &layer, false, false));

        // Exactly 4x is allowed.
        let layer = layer_with(
            Rect::new(0.0, 0.0, 480.0, 100.0),
            Rect::new(0.0, 0.0, 120.0, 100.0),
        );
        assert!(yuv_doable(&mdss5, &layer, false, false));
    }

    #[test]
    fn fallback_labels_are_stable() {
        assert_eq!(FallbackReason::IdleTimeout.label(), "idle-timeout");
        assert_eq!(FallbackReason::MixerCeiling.label(), "mixer-ceiling");
    }
}
