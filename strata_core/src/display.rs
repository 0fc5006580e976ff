// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Display identification and mode geometry.
//!
//! [`DisplayId`] is a lightweight handle identifying a specific display.
//! The display server assigns these; id `0` is always the primary panel and
//! overlay composition is restricted to it.

use core::fmt;

/// Identifies a specific display.
///
/// The display server assigns display IDs. The primary built-in panel is
/// always [`DisplayId::PRIMARY`]; every other id refers to a pluggable
/// (external or virtual) display.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DisplayId(pub u32);

impl DisplayId {
    /// The primary built-in display.
    pub const PRIMARY: Self = Self(0);

    /// Returns whether this is the primary display.
    #[inline]
    #[must_use]
    pub const fn is_primary(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for DisplayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DisplayId({})", self.0)
    }
}

/// Active mode geometry for one display.
///
/// Only the fields the allocator reads are carried here; refresh timing,
/// DPI, and connection state live with the display server.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DisplayInfo {
    /// Horizontal resolution in pixels.
    pub width: u32,
    /// Vertical resolution in pixels.
    pub height: u32,
}

impl DisplayInfo {
    /// Creates display info for the given mode.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Horizontal midpoint of the display, in pixels.
    ///
    /// On wide panels this is the boundary between the left and right mixer.
    #[inline]
    #[must_use]
    pub fn mid_x(self) -> f64 {
        f64::from(self.width) / 2.0
    }

    /// The full display area as a rectangle anchored at the origin.
    #[inline]
    #[must_use]
    pub fn bounds(self) -> kurbo::Rect {
        kurbo::Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_is_id_zero() {
        assert!(DisplayId::PRIMARY.is_primary());
        assert!(!DisplayId(1).is_primary());
        assert!(!DisplayId(2).is_primary());
    }

    #[test]
    fn bounds_and_midpoint() {
        let info = DisplayInfo::new(1080, 1920);
        assert_eq!(info.bounds(), kurbo::Rect::new(0.0, 0.0, 1080.0, 1920.0));
        assert_eq!(info.mid_x(), 540.0);
    }
}
