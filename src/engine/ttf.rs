// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Glyph engine over `ttf-parser`

use super::{rasterize_outline, EngineFace, GlyphEngine, GlyphId, GlyphMetrics, OutlineSink};
use super::RasterRequest;
use crate::raster::Bitmap;
use crate::{CodePoint, GlcError, Rect, Vec2};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use ttf_parser::{Face, FaceParsingError};

#[cfg(feature = "ab_glyph")]
use crate::raster::PixelFormat;

/// Face loading errors
#[derive(Error, Debug)]
pub enum FaceError {
    #[error("font load error")]
    TtfParser(#[from] FaceParsingError),
    #[error("face has no Unicode mapping table")]
    NoUnicodeCmap,
}

/// The default [`GlyphEngine`]
///
/// Font files are read fully into memory on open; the data is released when
/// the last handle to the face is dropped.
#[derive(Clone, Copy, Debug, Default)]
pub struct TtfEngine;

impl GlyphEngine for TtfEngine {
    fn open(&self, path: &Path, index: u32) -> Result<Arc<dyn EngineFace>, GlcError> {
        let data = std::fs::read(path)?;
        let face = TtfFace::from_data(data.into(), index).map_err(|err| {
            log::error!("TtfEngine: failed to open {}: {err}", path.display());
            GlcError::Resource
        })?;
        log::debug!("TtfEngine: opened {} (face {index})", path.display());
        Ok(Arc::new(face))
    }
}

/// A face opened by [`TtfEngine`]
pub struct TtfFace {
    data: Arc<[u8]>,
    index: u32,
    units_per_em: u16,
}

impl std::fmt::Debug for TtfFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtfFace")
            .field("len", &self.data.len())
            .field("index", &self.index)
            .field("units_per_em", &self.units_per_em)
            .finish()
    }
}

impl TtfFace {
    /// Construct from font data
    ///
    /// Fails if the data cannot be parsed or the face has no Unicode mapping
    /// table.
    pub fn from_data(data: Arc<[u8]>, index: u32) -> Result<Self, FaceError> {
        let face = Face::parse(&data, index)?;
        let has_unicode = face
            .tables()
            .cmap
            .map(|cmap| cmap.subtables.into_iter().any(|st| st.is_unicode()))
            .unwrap_or(false);
        if !has_unicode {
            return Err(FaceError::NoUnicodeCmap);
        }
        let units_per_em = face.units_per_em();
        Ok(TtfFace {
            data,
            index,
            units_per_em,
        })
    }

    /// Parse the face
    ///
    /// Parsing only reads the table directory, thus this is cheap.
    fn face(&self) -> Option<Face<'_>> {
        Face::parse(&self.data, self.index).ok()
    }

    #[cfg(feature = "ab_glyph")]
    fn raster_ab(&self, glyph: GlyphId, request: &RasterRequest) -> Option<Bitmap> {
        use ab_glyph::Font;
        use easy_cast::*;

        let font = ab_glyph::FontRef::try_from_slice_and_index(&self.data, self.index).ok()?;
        let upem = font.units_per_em()?;
        // ab_glyph scales by line height rather than em size
        let m = request.transform.0;
        let scale = ab_glyph::PxScale {
            x: m[0] * font.height_unscaled() / upem,
            y: m[3] * font.height_unscaled() / upem,
        };
        let glyph = ab_glyph::Glyph {
            id: ab_glyph::GlyphId(u16::try_from(glyph.0).ok()?),
            scale,
            position: ab_glyph::point(0.0, 0.0),
        };
        let Some(outline) = font.outline_glyph(glyph) else {
            return Some(Bitmap::empty(request.format));
        };

        let bounds = outline.px_bounds();
        let width = u32::conv_trunc(bounds.width());
        let height = u32::conv_trunc(bounds.height());
        let mut data = vec![0; usize::conv(width * height)];
        outline.draw(|x, y, c| {
            // ab_glyph rows run top to bottom
            if x < width && y < height {
                let row = height - 1 - y;
                data[usize::conv(row * width + x)] = u8::conv_nearest(c.clamp(0.0, 1.0) * 255.0);
            }
        });

        Some(Bitmap {
            width,
            height,
            origin: (bounds.min.x.cast_trunc(), (-bounds.max.y).cast_trunc()),
            format: request.format,
            data,
        })
    }
}

fn ttf_glyph(id: GlyphId) -> Option<ttf_parser::GlyphId> {
    u16::try_from(id.0).ok().map(ttf_parser::GlyphId)
}

struct SinkAdapter<'a>(&'a mut dyn OutlineSink);

impl<'a> ttf_parser::OutlineBuilder for SinkAdapter<'a> {
    fn move_to(&mut self, x: f32, y: f32) {
        self.0.move_to(Vec2(x, y));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.0.line_to(Vec2(x, y));
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.0.quad_to(Vec2(x1, y1), Vec2(x, y));
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.0.cubic_to(Vec2(x1, y1), Vec2(x2, y2), Vec2(x, y));
    }

    fn close(&mut self) {
        self.0.close();
    }
}

impl EngineFace for TtfFace {
    fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    fn glyph_index(&self, code: CodePoint) -> Option<GlyphId> {
        let c = char::from_u32(code)?;
        let id = self.face()?.glyph_index(c)?;
        // glyph 0 is the "missing glyph"
        (id.0 != 0).then_some(GlyphId(id.0.into()))
    }

    fn metrics(&self, glyph: GlyphId) -> Option<GlyphMetrics> {
        let face = self.face()?;
        let id = ttf_glyph(glyph)?;
        let advance = face.glyph_hor_advance(id)?;
        let bounds = face.glyph_bounding_box(id).map(|r| Rect {
            min: Vec2(r.x_min.into(), r.y_min.into()),
            max: Vec2(r.x_max.into(), r.y_max.into()),
        });
        Some(GlyphMetrics {
            advance: Vec2(advance.into(), 0.0),
            bounds,
        })
    }

    fn max_metrics(&self) -> Option<GlyphMetrics> {
        let face = self.face()?;
        let r = face.global_bounding_box();
        let advance = face
            .tables()
            .hmtx
            .and_then(|hmtx| hmtx.metrics.into_iter().map(|m| m.advance).max())
            .unwrap_or(0);
        Some(GlyphMetrics {
            advance: Vec2(advance.into(), 0.0),
            bounds: Some(Rect {
                min: Vec2(r.x_min.into(), r.y_min.into()),
                max: Vec2(r.x_max.into(), r.y_max.into()),
            }),
        })
    }

    fn kerning(&self, left: GlyphId, right: GlyphId) -> Option<f32> {
        let face = self.face()?;
        let kern = face.tables().kern?;
        let (left, right) = (ttf_glyph(left)?, ttf_glyph(right)?);
        kern.subtables
            .into_iter()
            .filter(|st| st.horizontal && !st.variable)
            .find_map(|st| st.glyphs_kerning(left, right))
            .map(f32::from)
    }

    fn outline(&self, glyph: GlyphId, sink: &mut dyn OutlineSink) -> bool {
        let (Some(face), Some(id)) = (self.face(), ttf_glyph(glyph)) else {
            return false;
        };
        face.outline_glyph(id, &mut SinkAdapter(sink)).is_some()
    }

    fn rasterize(&self, glyph: GlyphId, request: &RasterRequest) -> Option<Bitmap> {
        cfg_if::cfg_if! {
            if #[cfg(feature = "ab_glyph")] {
                let m = request.transform.0;
                if request.format == PixelFormat::Gray
                    && request.transform.is_axis_aligned()
                    && m[0] > 0.0
                    && m[3] > 0.0
                {
                    return self.raster_ab(glyph, request);
                }
            }
        }
        rasterize_outline(self, glyph, request)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unreadable_files_are_resource_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.ttf");
        assert_eq!(TtfEngine.open(&missing, 0).err(), Some(GlcError::Resource));

        let garbage = dir.path().join("garbage.ttf");
        std::fs::write(&garbage, [0u8; 64]).unwrap();
        assert_eq!(TtfEngine.open(&garbage, 0).err(), Some(GlcError::Resource));
    }

    #[test]
    fn garbage_does_not_parse() {
        let data: Arc<[u8]> = Arc::from(&b"not a font"[..]);
        assert!(matches!(
            TtfFace::from_data(data, 0),
            Err(FaceError::TtfParser(_))
        ));
    }
}
