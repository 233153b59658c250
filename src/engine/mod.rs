// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Glyph engines
//!
//! A [`GlyphEngine`] opens font files, yielding [`EngineFace`] handles. A face
//! handle answers glyph-index, metric, kerning, outline and rasterization
//! queries. The library ships [`TtfEngine`], built on `ttf-parser`; other
//! engines may be supplied when constructing a [`crate::Context`].
//!
//! # Units
//!
//! Metrics, kerning and outlines are reported in *font units* (see
//! [`EngineFace::units_per_em`]). Rasterization takes a transform from *em*
//! space to pixels.

mod ttf;
pub use ttf::{FaceError, TtfEngine, TtfFace};

use crate::raster::{Bitmap, PixelFormat};
use crate::{CodePoint, GlcError, Rect, Transform, Vec2};
use std::path::Path;
use std::sync::Arc;

/// Glyph index within a face
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GlyphId(pub u32);

/// Horizontal metrics of a glyph, in font units
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct GlyphMetrics {
    /// Pen advance
    pub advance: Vec2,
    /// Bounding box of the outline; `None` for empty glyphs such as space
    pub bounds: Option<Rect>,
}

/// Receiver of outline segments
///
/// Contours start with `move_to` and end with `close`. Quadratic segments
/// (`quad_to`) are the TrueType "conic" curves.
pub trait OutlineSink {
    fn move_to(&mut self, to: Vec2);
    fn line_to(&mut self, to: Vec2);
    fn quad_to(&mut self, ctrl: Vec2, to: Vec2);
    fn cubic_to(&mut self, ctrl0: Vec2, ctrl1: Vec2, to: Vec2);
    fn close(&mut self);
}

/// Parameters of a rasterization
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RasterRequest {
    /// Map from em space to pixel space
    pub transform: Transform,
    /// Output format
    pub format: PixelFormat,
    /// Whether the engine may apply hinting
    pub hinting: bool,
}

/// An open font face
///
/// Handles are reference counted (see [`crate::fonts::FaceDescriptor`]);
/// the underlying resource is released when the last handle is dropped.
pub trait EngineFace: Send + Sync {
    /// Font units per em
    fn units_per_em(&self) -> u16;

    /// Map a code point through the face's Unicode mapping table
    fn glyph_index(&self, code: CodePoint) -> Option<GlyphId>;

    /// Get advance and bounding box
    fn metrics(&self, glyph: GlyphId) -> Option<GlyphMetrics>;

    /// Largest advance and the bounding box of all glyphs
    fn max_metrics(&self) -> Option<GlyphMetrics> {
        None
    }

    /// Pair kerning adjustment along the baseline, in font units
    fn kerning(&self, left: GlyphId, right: GlyphId) -> Option<f32>;

    /// Decompose the glyph outline into `sink`
    ///
    /// Returns false if the glyph has no outline.
    fn outline(&self, glyph: GlyphId, sink: &mut dyn OutlineSink) -> bool;

    /// Rasterize a glyph
    fn rasterize(&self, glyph: GlyphId, request: &RasterRequest) -> Option<Bitmap>;
}

/// A font engine
pub trait GlyphEngine: Send + Sync {
    /// Open face `index` of the font file at `path`
    ///
    /// The returned face must have a Unicode mapping table selected; files
    /// without one fail with [`GlcError::Resource`].
    fn open(&self, path: &Path, index: u32) -> Result<Arc<dyn EngineFace>, GlcError>;
}

/// Rasterize by flattening the outline and filling with the even-odd rule
///
/// This is a fallback available to any [`EngineFace`] implementation.
pub fn rasterize_outline(
    face: &dyn EngineFace,
    glyph: GlyphId,
    request: &RasterRequest,
) -> Option<Bitmap> {
    use crate::tessellate::{fill_even_odd, Flattener, PIXEL_TOLERANCE};

    let scale = 1.0 / f32::from(face.units_per_em().max(1));
    let transform = request.transform.then_apply(Transform::scale(scale, scale));
    let mut flattener = Flattener::new(transform, PIXEL_TOLERANCE);
    if !face.outline(glyph, &mut flattener) {
        return Some(Bitmap::empty(request.format));
    }
    fill_even_odd(&flattener.finish(), request.format)
}
