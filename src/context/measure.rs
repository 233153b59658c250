// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Measurement
//!
//! Metrics are computed in ems with the pen starting at the origin, then
//! mapped through the bitmap transform when the render style is
//! [`RenderStyle::Bitmap`]. Resolution is identical to rendering, thus an
//! escape sequence is measured as one character.

use super::draw::GlyphRef;
use super::resolve::Resolved;
use super::Context;
use crate::conv::DPU;
use crate::{CodePoint, GlcError, Rect, RenderStyle, Transform, Vec2};

/// Layout metrics of a character or string
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CharMetric {
    /// Pen position before and after
    pub baseline: [Vec2; 2],
    /// Bounding box corners, counter-clockwise from the lower left
    pub bounds: [Vec2; 4],
}

/// Metrics in ems, before transformation
#[derive(Clone, Copy, Debug)]
struct Span {
    start: Vec2,
    end: Vec2,
    bounds: Option<Rect>,
}

impl Span {
    fn union(self, other: Span) -> Span {
        let bounds = match (self.bounds, other.bounds) {
            (Some(a), Some(b)) => Some(a.union(&b)),
            (a, b) => a.or(b),
        };
        Span {
            start: self.start,
            end: other.end,
            bounds,
        }
    }

    fn to_metric(self, transform: &Transform) -> CharMetric {
        let rect = self.bounds.unwrap_or(Rect {
            min: self.start.min(self.end),
            max: self.start.max(self.end),
        });
        CharMetric {
            baseline: [transform.apply(self.start), transform.apply(self.end)],
            bounds: rect.corners().map(|p| transform.apply(p)),
        }
    }
}

impl Context {
    fn output_transform(&self) -> Transform {
        match self.settings.render_style {
            RenderStyle::Bitmap => self.settings.pixel_transform(),
            _ => Transform::IDENTITY,
        }
    }

    /// Span of one glyph with the pen at `pen`
    fn glyph_span(&mut self, glyph: &GlyphRef, pen: Vec2) -> Result<Span, GlcError> {
        let desc = self.masters[glyph.master]
            .face_mut(glyph.face)
            .ok_or(GlcError::Resource)?;
        let face = desc.acquire(&*self.engine)?;
        let dpu = DPU::from_units_per_em(face.units_per_em());
        let metrics = face.metrics(glyph.glyph).ok_or(GlcError::Resource)?;
        let bounds = metrics.bounds.map(|r| Rect {
            min: pen + dpu.vec_to_em(r.min),
            max: pen + dpu.vec_to_em(r.max),
        });
        Ok(Span {
            start: pen,
            end: pen + dpu.vec_to_em(metrics.advance),
            bounds,
        })
    }

    /// Span of a resolved character; returns the glyph usable for kerning
    fn resolved_span(
        &mut self,
        resolved: &Resolved,
        pen: Vec2,
    ) -> Result<(Span, Option<GlyphRef>), GlcError> {
        match resolved {
            Resolved::Glyph(font, code) => {
                let glyph = self.glyph_ref(*font, *code)?;
                Ok((self.glyph_span(&glyph, pen)?, Some(glyph)))
            }
            Resolved::Escape(glyphs) => {
                let mut span: Option<Span> = None;
                let mut pen = pen;
                for (font, code) in glyphs {
                    let glyph = self.glyph_ref(*font, *code)?;
                    let next = self.glyph_span(&glyph, pen)?;
                    pen = next.end;
                    span = Some(match span {
                        Some(span) => span.union(next),
                        None => next,
                    });
                }
                let span = span.unwrap_or(Span {
                    start: pen,
                    end: pen,
                    bounds: None,
                });
                Ok((span, None))
            }
        }
    }

    /// Measure one character
    ///
    /// Returns `None` if the code cannot be resolved.
    pub fn measure_char(&mut self, code: CodePoint) -> Result<Option<CharMetric>, GlcError> {
        let Some(resolved) = self.resolve(code)? else {
            return Ok(None);
        };
        let (span, _) = self.resolved_span(&resolved, Vec2::ZERO)?;
        Ok(Some(span.to_metric(&self.output_transform())))
    }

    /// Measure a string
    ///
    /// See [`Self::measure_codes`].
    pub fn measure_str(
        &mut self,
        text: &str,
        per_char: bool,
    ) -> Result<Option<CharMetric>, GlcError> {
        self.measure_codes(text.chars().map(CodePoint::from), per_char)
    }

    /// Measure a sequence of codes as [`Self::render_codes`] would draw it
    ///
    /// If `per_char`, the metrics of each drawn character are kept for
    /// [`Self::char_metric`]; otherwise that buffer is cleared. Returns
    /// `None` if nothing would be drawn.
    pub fn measure_codes(
        &mut self,
        codes: impl IntoIterator<Item = CodePoint>,
        per_char: bool,
    ) -> Result<Option<CharMetric>, GlcError> {
        self.measured.clear();
        let transform = self.output_transform();
        let mut pen = Vec2::ZERO;
        let mut total: Option<Span> = None;
        let mut prev: Option<GlyphRef> = None;

        for code in codes {
            let Some(resolved) = self.resolve(code)? else {
                prev = None;
                continue;
            };
            if let (Some(ref left), Resolved::Glyph(font, code)) = (prev, &resolved) {
                let right = self.glyph_ref(*font, *code)?;
                pen += self.kerning(left, &right);
            }
            let (span, glyph) = self.resolved_span(&resolved, pen)?;
            pen = span.end;
            prev = glyph;
            if per_char {
                self.measured.try_reserve(1)?;
                self.measured.push(span.to_metric(&transform));
            }
            total = Some(match total {
                Some(total) => total.union(span),
                None => span,
            });
        }

        Ok(total.map(|span| span.to_metric(&transform)))
    }

    /// Number of characters kept by the last [`Self::measure_codes`]
    pub fn measured_char_count(&self) -> usize {
        self.measured.len()
    }

    /// Metrics of the `index`-th character of the last measured string
    pub fn char_metric(&self, index: usize) -> Option<CharMetric> {
        self.measured.get(index).copied()
    }

    /// Largest advance and bounding box over the current fonts
    ///
    /// Returns `None` when no current font reports global metrics.
    pub fn max_char_metric(&mut self) -> Result<Option<CharMetric>, GlcError> {
        let mut span: Option<(f32, Option<Rect>)> = None;
        for id in self.current.clone() {
            let Some(font) = self.font_by_id(id) else {
                continue;
            };
            let face_id = font.face();
            let master = self.master_index(font.master()).ok_or(GlcError::Resource)?;
            let desc = self.masters[master]
                .face_mut(face_id)
                .ok_or(GlcError::Resource)?;
            let face = desc.acquire(&*self.engine)?;
            let dpu = DPU::from_units_per_em(face.units_per_em());
            let Some(metrics) = face.max_metrics() else {
                continue;
            };
            let advance = dpu.f32_to_em(metrics.advance.0);
            let bounds = metrics.bounds.map(|r| Rect {
                min: dpu.vec_to_em(r.min),
                max: dpu.vec_to_em(r.max),
            });
            span = Some(match span {
                None => (advance, bounds),
                Some((a, b)) => {
                    let bounds = match (b, bounds) {
                        (Some(x), Some(y)) => Some(x.union(&y)),
                        (x, y) => x.or(y),
                    };
                    (a.max(advance), bounds)
                }
            });
        }

        let transform = self.output_transform();
        Ok(span.map(|(advance, bounds)| {
            Span {
                start: Vec2::ZERO,
                end: Vec2(advance, 0.0),
                bounds,
            }
            .to_metric(&transform)
        }))
    }
}
