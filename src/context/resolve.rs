// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Font resolution
//!
//! A code is resolved to a font by trying, in order:
//!
//! 1.  the current font list
//! 2.  the unmapped-code handler, then the current font list again
//! 3.  with [`Flags::AUTO_FONT`]: all fonts, then all masters (instantiating
//!     a new font); the font found is appended to the current font list
//! 4.  the same for the replacement code, if set
//! 5.  the escape sequence `\<XXXX>` (upper-case hex), if every one of its
//!     characters resolves
//!
//! Rendering and measurement both go through [`Context::resolve`] so that
//! they make the same decisions.

use super::Context;
use crate::fonts::{Font, FontId};
use crate::{CodePoint, Flags, GlcError};

/// Result of resolution
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Resolved {
    /// Draw `code` (the requested or replacement code) with a font
    Glyph(FontId, CodePoint),
    /// Draw the escape sequence, one font per character
    Escape(Vec<(FontId, CodePoint)>),
}

impl Context {
    fn find_current(&self, code: CodePoint) -> Option<FontId> {
        self.current.iter().copied().find(|id| {
            self.font_by_id(*id)
                .map(|font| font.charmap().has_char(code))
                .unwrap_or(false)
        })
    }

    fn call_back(&mut self, code: CodePoint) -> bool {
        if self.in_callback {
            log::debug!("resolve: handler re-entered for U+{code:04X}; ignored");
            return false;
        }
        let Some(mut callback) = self.callback.take() else {
            return false;
        };
        self.in_callback = true;
        let handled = callback(self, code);
        self.in_callback = false;
        if self.callback.is_none() {
            self.callback = Some(callback);
        }
        handled
    }

    fn auto_font(&mut self, code: CodePoint) -> Result<Option<FontId>, GlcError> {
        let found = self
            .fonts
            .iter()
            .find(|f| !self.current.contains(&f.id()) && f.charmap().has_char(code))
            .map(|f| f.id());
        if let Some(id) = found {
            log::debug!("resolve: U+{code:04X}: appending font {id:?}");
            self.current.try_reserve(1)?;
            self.current.push(id);
            return Ok(Some(id));
        }

        let found = self.masters.iter().enumerate().find_map(|(i, m)| {
            m.face_for_code(code).map(|face| (i, face.id()))
        });
        let Some((index, face)) = found else {
            return Ok(None);
        };
        let id = self.gen_font_id();
        let font = Font::new(id, &self.masters[index], Some(face))?;
        log::debug!(
            "resolve: U+{code:04X}: new font {id:?} from \"{}\"",
            self.masters[index].family()
        );
        self.fonts.try_reserve(1)?;
        self.current.try_reserve(1)?;
        self.fonts.push(font);
        self.current.push(id);
        Ok(Some(id))
    }

    /// Find the font drawing `code`
    ///
    /// This tries the current font list, the unmapped-code handler and, if
    /// enabled, automatic font selection (which may append to the current
    /// font list). The replacement code is not considered.
    pub fn resolve_font(&mut self, code: CodePoint) -> Result<Option<FontId>, GlcError> {
        if let Some(id) = self.find_current(code) {
            return Ok(Some(id));
        }
        if self.call_back(code) {
            if let Some(id) = self.find_current(code) {
                return Ok(Some(id));
            }
        }
        if self.settings.is_enabled(Flags::AUTO_FONT) {
            return self.auto_font(code);
        }
        Ok(None)
    }

    /// Resolve `code` for drawing or measurement
    ///
    /// `Ok(None)` means nothing is drawn; this is not an error.
    pub(crate) fn resolve(&mut self, code: CodePoint) -> Result<Option<Resolved>, GlcError> {
        if let Some(id) = self.resolve_font(code)? {
            return Ok(Some(Resolved::Glyph(id, code)));
        }

        let replacement = self.settings.replacement_code;
        if replacement != 0 && replacement != code {
            if let Some(id) = self.resolve_font(replacement)? {
                return Ok(Some(Resolved::Glyph(id, replacement)));
            }
        }

        let escape = format!("\\<{code:X}>");
        let mut glyphs = Vec::with_capacity(escape.len());
        for c in escape.chars() {
            let c = CodePoint::from(c);
            match self.resolve_font(c)? {
                Some(id) => glyphs.push((id, c)),
                None => {
                    log::debug!("resolve: U+{code:04X} cannot be drawn");
                    return Ok(None);
                }
            }
        }
        Ok(Some(Resolved::Escape(glyphs)))
    }
}
