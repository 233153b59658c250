// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Font list management

use super::Context;
use crate::fonts::{Font, FontId, MasterId};
use crate::unicode::names;
use crate::{CodePoint, GlcError};

impl Context {
    /// All fonts, in creation order
    #[inline]
    pub fn fonts(&self) -> &[Font] {
        &self.fonts
    }

    /// Find a font
    pub fn font_by_id(&self, id: FontId) -> Option<&Font> {
        self.fonts.iter().find(|f| f.id() == id)
    }

    /// True if font `id` exists
    pub fn is_font(&self, id: FontId) -> bool {
        self.font_by_id(id).is_some()
    }

    fn font_index(&self, id: FontId) -> Result<usize, GlcError> {
        self.fonts
            .iter()
            .position(|f| f.id() == id)
            .ok_or(GlcError::Parameter)
    }

    /// The current font list, in priority order
    #[inline]
    pub fn current_fonts(&self) -> &[FontId] {
        &self.current
    }

    /// The lowest identifier not naming a font
    pub fn gen_font_id(&self) -> FontId {
        let mut ids: Vec<u32> = self.fonts.iter().map(|f| f.id().get()).collect();
        ids.sort_unstable();
        let mut next = 1;
        for id in ids {
            if id == next {
                next += 1;
            } else if id > next {
                break;
            }
        }
        FontId(next)
    }

    /// Create font `id` from master `master`
    ///
    /// An existing font `id` is deleted first (and thus removed from the
    /// current font list). The new font selects the master's first face.
    /// Fails with [`GlcError::Parameter`] if there is no such master.
    pub fn new_font_from_master(
        &mut self,
        id: FontId,
        master: MasterId,
    ) -> Result<FontId, GlcError> {
        let index = self.master_index(master).ok_or(GlcError::Parameter)?;
        self.install_font(id, index)
    }

    /// Create font `id` from the master of `family`
    ///
    /// As [`Self::new_font_from_master`], but fails with
    /// [`GlcError::Resource`] if no master has this family name.
    pub fn new_font_from_family(&mut self, id: FontId, family: &str) -> Result<FontId, GlcError> {
        let index = self
            .masters
            .iter()
            .position(|m| m.family() == family)
            .ok_or_else(|| {
                log::debug!("new_font_from_family: no family \"{family}\"");
                GlcError::Resource
            })?;
        self.install_font(id, index)
    }

    fn install_font(&mut self, id: FontId, master_index: usize) -> Result<FontId, GlcError> {
        let font = Font::new(id, &self.masters[master_index], None)?;
        self.remove_font(id);
        self.fonts.try_reserve(1)?;
        self.fonts.push(font);
        Ok(id)
    }

    /// Delete font `id`
    ///
    /// The font is removed from the current font list.
    pub fn delete_font(&mut self, id: FontId) -> Result<(), GlcError> {
        if self.remove_font(id) {
            Ok(())
        } else {
            Err(GlcError::Parameter)
        }
    }

    pub(crate) fn remove_font(&mut self, id: FontId) -> bool {
        self.current.retain(|f| *f != id);
        match self.fonts.iter().position(|f| f.id() == id) {
            Some(index) => {
                self.fonts.remove(index);
                true
            }
            None => false,
        }
    }

    /// Append font `id` to the current font list
    ///
    /// Fails with [`GlcError::Parameter`] if the font does not exist or is
    /// already current.
    pub fn append_font(&mut self, id: FontId) -> Result<(), GlcError> {
        if !self.is_font(id) || self.current.contains(&id) {
            return Err(GlcError::Parameter);
        }
        self.current.try_reserve(1)?;
        self.current.push(id);
        Ok(())
    }

    /// Make `id` the only current font, or clear the list if `None`
    pub fn font(&mut self, id: Option<FontId>) -> Result<(), GlcError> {
        match id {
            None => self.current.clear(),
            Some(id) => {
                if !self.is_font(id) {
                    return Err(GlcError::Parameter);
                }
                self.current.clear();
                self.current.push(id);
            }
        }
        Ok(())
    }

    /// Select the face of style `style`
    ///
    /// With `Some(id)` this applies to one font; with `None` to each current
    /// font. Returns false if some font's master has no such face (that font
    /// is unchanged). A font whose face changes gets a fresh character map.
    pub fn set_font_face(&mut self, id: Option<FontId>, style: &str) -> Result<bool, GlcError> {
        let ids = match id {
            Some(id) => {
                self.font_index(id)?;
                vec![id]
            }
            None => self.current.clone(),
        };
        let mut all = true;
        for id in ids {
            let index = self.font_index(id)?;
            let master = self
                .master_index(self.fonts[index].master())
                .ok_or(GlcError::Resource)?;
            match self.fonts[index].select_face(&self.masters[master], style) {
                Ok(()) => (),
                Err(GlcError::Parameter) => all = false,
                Err(err) => return Err(err),
            }
        }
        Ok(all)
    }

    /// Style name of the face selected by font `id`
    pub fn font_face(&self, id: FontId) -> Result<&str, GlcError> {
        let font = self.font_by_id(id).ok_or(GlcError::Parameter)?;
        self.master(font.master())
            .and_then(|m| m.face(font.face()))
            .map(|f| f.style())
            .ok_or(GlcError::Resource)
    }

    /// Name of the character font `id` draws for `code`
    pub fn font_map(&self, id: FontId, code: CodePoint) -> Result<Option<&'static str>, GlcError> {
        let font = self.font_by_id(id).ok_or(GlcError::Parameter)?;
        Ok(font.charmap().char_name(code))
    }

    /// Remap `code` in font `id`
    ///
    /// With `Some(name)`, font `id` draws the character `name` for `code`
    /// (which joins the master's character set). With `None`, font `id` no
    /// longer maps `code`.
    pub fn set_font_map(
        &mut self,
        id: FontId,
        code: CodePoint,
        name: Option<&str>,
    ) -> Result<(), GlcError> {
        let index = self.font_index(id)?;
        let Some(name) = name else {
            self.fonts[index].charmap_mut().remove(code);
            return Ok(());
        };
        let master = self
            .master_index(self.fonts[index].master())
            .ok_or(GlcError::Resource)?;
        let face = self.fonts[index].face();
        self.fonts[index].charmap_mut().add_named_char(
            code,
            name,
            &mut self.masters[master],
            face,
            &*self.engine,
        )
    }

    /// Number of characters mapped by font `id`
    pub fn font_char_count(&self, id: FontId) -> Result<usize, GlcError> {
        let font = self.font_by_id(id).ok_or(GlcError::Parameter)?;
        Ok(font.charmap().char_count())
    }

    /// Name of the `index`-th character mapped by font `id`
    pub fn font_char_name(
        &self,
        id: FontId,
        index: usize,
    ) -> Result<Option<&'static str>, GlcError> {
        let font = self.font_by_id(id).ok_or(GlcError::Parameter)?;
        Ok(font
            .charmap()
            .nth_char(index)
            .and_then(|code| names().name_for_code(code)))
    }
}
