// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flip/rotate transform for layer content.
//!
//! Overlay pipes can mirror a buffer on either axis in hardware, so flips
//! and 180° rotations (both flips combined) stream directly. A 90°/270°
//! rotation cannot; it needs a pass through a shared rotation unit first,
//! which is what [`involves_rot_90`](LayerTransform::involves_rot_90) gates.

use core::fmt;

/// How a layer's buffer is flipped/rotated before compositing.
///
/// A 90° clockwise rotation combined with both flips expresses 270°; the
/// allocator only cares whether *any* 90°-family rotation is present.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LayerTransform {
    /// Mirror horizontally.
    pub flip_h: bool,
    /// Mirror vertically.
    pub flip_v: bool,
    /// Rotate 90° clockwise (applied after the flips).
    pub rot_90: bool,
}

impl LayerTransform {
    /// No transform.
    pub const IDENTITY: Self = Self {
        flip_h: false,
        flip_v: false,
        rot_90: false,
    };

    /// 180° rotation, expressed as a flip on both axes.
    pub const ROT_180: Self = Self {
        flip_h: true,
        flip_v: true,
        rot_90: false,
    };

    /// 90° clockwise rotation.
    pub const ROT_90: Self = Self {
        flip_h: false,
        flip_v: false,
        rot_90: true,
    };

    /// Returns whether this transform is the identity.
    #[inline]
    #[must_use]
    pub const fn is_identity(self) -> bool {
        !self.flip_h && !self.flip_v && !self.rot_90
    }

    /// Returns whether a 90°-family rotation (90° or 270°) is involved.
    ///
    /// These require a rotation unit; flips and 180° do not.
    #[inline]
    #[must_use]
    pub const fn involves_rot_90(self) -> bool {
        self.rot_90
    }
}

impl fmt::Debug for LayerTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_identity() {
            return write!(f, "LayerTransform(identity)");
        }
        let mut parts = f.debug_list();
        if self.flip_h {
            parts.entry(&"flip-h");
        }
        if self.flip_v {
            parts.entry(&"flip-v");
        }
        if self.rot_90 {
            parts.entry(&"rot-90");
        }
        parts.finish()
    }
}
