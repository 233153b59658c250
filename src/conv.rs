// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Type conversion utilities
//!
//! Many indices are represented as `u32` instead of `usize` by this library in
//! order to save space and to match the integer types used by font files
//! (glyph indices, face indices) and by the GLC API (object identifiers).

use crate::Vec2;
use easy_cast::Cast;

/// Convert `usize` → `u32`
///
/// This is a "safer" wrapper around `as` ensuring (on debug builds) that the
/// input value may be represented correctly by `u32`.
#[inline]
pub fn to_u32(x: usize) -> u32 {
    x.cast()
}

/// Convert `u32` → `usize`
///
/// This is a "safer" wrapper around `as` ensuring that the operation is
/// zero-extension.
#[inline]
pub fn to_usize(x: u32) -> usize {
    x.cast()
}

/// Scale factor: output units per font unit
///
/// GLC measures and draws glyphs in em units (one em per unit of the
/// transform), so this is usually `1 / units_per_em`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DPU(pub f32);

impl DPU {
    /// The scale mapping a face's font units to ems
    #[inline]
    pub fn from_units_per_em(units_per_em: u16) -> Self {
        DPU(1.0 / f32::from(units_per_em.max(1)))
    }

    #[inline]
    pub(crate) fn f32_to_em(self, x: f32) -> f32 {
        x * self.0
    }

    #[inline]
    pub(crate) fn vec_to_em(self, v: Vec2) -> Vec2 {
        v * self.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn dpu_scales() {
        let dpu = DPU::from_units_per_em(2048);
        assert_eq!(dpu.f32_to_em(1024.0), 0.5);
        assert_eq!(dpu.vec_to_em(Vec2(2048.0, -512.0)), Vec2(1.0, -0.25));
        assert_eq!(DPU::from_units_per_em(0).f32_to_em(3.0), 3.0);
    }
}
