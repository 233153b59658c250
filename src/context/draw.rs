// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Rendering commands

use super::resolve::Resolved;
use super::Context;
use crate::conv::DPU;
use crate::engine::GlyphId;
use crate::fonts::{FaceId, FontId};
use crate::raster::{Bitmap, PixelFormat};
use crate::render::{prepare_atlas, render_glyph, GlyphRequest};
use crate::{CodePoint, GlcError, RenderStyle, Vec2};

/// A glyph located within the context
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct GlyphRef {
    pub font: FontId,
    pub master: usize,
    pub face: FaceId,
    /// Face character, after remapping
    pub code: CodePoint,
    pub glyph: GlyphId,
}

/// A resolved character, ready to draw
enum Located {
    Nothing,
    Glyph(GlyphRef),
    Escape(Vec<GlyphRef>),
}

impl Context {
    /// Look up the glyph font `font` draws for `code`
    pub(super) fn glyph_ref(
        &mut self,
        font: FontId,
        code: CodePoint,
    ) -> Result<GlyphRef, GlcError> {
        let index = self
            .fonts
            .iter()
            .position(|f| f.id() == font)
            .ok_or(GlcError::Parameter)?;
        let master = self
            .master_index(self.fonts[index].master())
            .ok_or(GlcError::Resource)?;
        let face = self.fonts[index].face();
        let desc = self.masters[master]
            .face_mut(face)
            .ok_or(GlcError::Resource)?;
        let charmap = self.fonts[index].charmap_mut();
        let glyph = charmap.lookup_glyph(code, desc, &*self.engine)?;
        Ok(GlyphRef {
            font,
            master,
            face,
            code: charmap.mapped_code(code),
            glyph,
        })
    }

    /// Pair kerning between consecutive glyphs, in ems
    pub(super) fn kerning(&mut self, left: &GlyphRef, right: &GlyphRef) -> Vec2 {
        if left.font != right.font {
            return Vec2::ZERO;
        }
        let Some(desc) = self.masters[right.master].face_mut(right.face) else {
            return Vec2::ZERO;
        };
        let Ok(face) = desc.acquire(&*self.engine) else {
            return Vec2::ZERO;
        };
        let dpu = DPU::from_units_per_em(face.units_per_em());
        face.kerning(left.glyph, right.glyph)
            .map(|k| Vec2(dpu.f32_to_em(k), 0.0))
            .unwrap_or(Vec2::ZERO)
    }

    fn draw(&mut self, glyph: &GlyphRef) -> Result<(), GlcError> {
        prepare_atlas(&self.settings, &mut *self.target, &mut self.atlas);
        self.flush_evictions();
        let Context {
            settings,
            engine,
            target,
            atlas,
            masters,
            ..
        } = self;
        let result = render_glyph(GlyphRequest {
            settings,
            engine: &**engine,
            target: &mut **target,
            atlas,
            master: &mut masters[glyph.master],
            face: glyph.face,
            code: glyph.code,
            glyph: glyph.glyph,
        });
        self.flush_evictions();
        result
    }

    /// Move the pen by `offset` ems
    fn move_pen(&mut self, offset: Vec2) {
        match self.settings.render_style {
            RenderStyle::Bitmap => {
                let offset = self.settings.pixel_transform().apply(offset);
                self.target.draw_bitmap(&Bitmap::empty(PixelFormat::Mono), offset);
            }
            _ => self.target.translate(offset),
        }
    }

    /// Resolve `code` and look up its glyphs without drawing anything
    fn locate(&mut self, code: CodePoint) -> Result<Located, GlcError> {
        Ok(match self.resolve(code)? {
            None => Located::Nothing,
            Some(Resolved::Glyph(font, code)) => Located::Glyph(self.glyph_ref(font, code)?),
            Some(Resolved::Escape(glyphs)) => Located::Escape(
                glyphs
                    .into_iter()
                    .map(|(font, code)| self.glyph_ref(font, code))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }

    /// Draw located characters, kerning consecutive glyphs of one font
    fn draw_located(&mut self, located: &[Located]) -> Result<(), GlcError> {
        let mut prev: Option<&GlyphRef> = None;
        for item in located {
            match item {
                Located::Nothing => prev = None,
                Located::Glyph(glyph) => {
                    if let Some(left) = prev {
                        let kern = self.kerning(left, glyph);
                        if kern != Vec2::ZERO {
                            self.move_pen(kern);
                        }
                    }
                    self.draw(glyph)?;
                    prev = Some(glyph);
                }
                Located::Escape(glyphs) => {
                    for glyph in glyphs {
                        self.draw(glyph)?;
                    }
                    prev = None;
                }
            }
        }
        Ok(())
    }

    /// Render one character
    ///
    /// A code which cannot be resolved is not drawn; this is not an error.
    pub fn render_char(&mut self, code: CodePoint) -> Result<(), GlcError> {
        let located = self.locate(code)?;
        self.draw_located(&[located])
    }

    /// Render a string
    pub fn render_str(&mut self, text: &str) -> Result<(), GlcError> {
        self.render_codes(text.chars().map(CodePoint::from))
    }

    /// Render a sequence of codes
    ///
    /// Consecutive glyphs of the same font are kerned. Every code is resolved
    /// before the first is drawn, thus a failed lookup draws nothing.
    pub fn render_codes(
        &mut self,
        codes: impl IntoIterator<Item = CodePoint>,
    ) -> Result<(), GlcError> {
        let located = codes
            .into_iter()
            .map(|code| self.locate(code))
            .collect::<Result<Vec<_>, _>>()?;
        self.draw_located(&located)
    }
}
