// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Fonts

use super::{CharMap, FaceId, Master, MasterId};
use crate::GlcError;

/// Font identifier
///
/// Chosen by the user (or allocated by [`crate::Context::gen_font_id`]).
/// Always non-zero; identifiers may be reused after deletion.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FontId(pub(crate) u32);

impl FontId {
    /// Construct from a raw identifier
    ///
    /// Returns `None` for zero.
    pub fn new(id: u32) -> Option<Self> {
        (id != 0).then_some(FontId(id))
    }

    /// Get the raw identifier
    pub fn get(self) -> u32 {
        self.0
    }
}

/// A font: an instance of a master with a selected face
///
/// The face is always one of the master's faces. The font's [`CharMap`] is
/// built from the selected face's character set.
#[derive(Debug)]
pub struct Font {
    id: FontId,
    master: MasterId,
    face: FaceId,
    charmap: CharMap,
}

impl Font {
    /// Construct on `master`, selecting `face` or else the first face
    pub(crate) fn new(id: FontId, master: &Master, face: Option<FaceId>) -> Result<Self, GlcError> {
        let desc = match face {
            Some(face) => master.face(face),
            None => master.faces().first(),
        };
        let Some(desc) = desc else {
            log::warn!("Font::new: master {:?} has no usable face", master.id());
            return Err(GlcError::Resource);
        };
        Ok(Font {
            id,
            master: master.id(),
            face: desc.id(),
            charmap: CharMap::new(desc.charset()),
        })
    }

    #[inline]
    pub fn id(&self) -> FontId {
        self.id
    }

    /// The master this font was instantiated from
    #[inline]
    pub fn master(&self) -> MasterId {
        self.master
    }

    /// The selected face
    #[inline]
    pub fn face(&self) -> FaceId {
        self.face
    }

    #[inline]
    pub fn charmap(&self) -> &CharMap {
        &self.charmap
    }

    #[inline]
    pub(crate) fn charmap_mut(&mut self) -> &mut CharMap {
        &mut self.charmap
    }

    /// Select the face with style name `style`
    ///
    /// On success the character map is rebuilt for the new face (dropping
    /// any remapping). If the master has no such face the font is unchanged
    /// and [`GlcError::Parameter`] is returned.
    pub(crate) fn select_face(&mut self, master: &Master, style: &str) -> Result<(), GlcError> {
        debug_assert_eq!(master.id(), self.master);
        let desc = master.face_by_style(style).ok_or(GlcError::Parameter)?;
        if desc.id() != self.face {
            self.face = desc.id();
            self.charmap = CharMap::new(desc.charset());
        }
        Ok(())
    }
}
