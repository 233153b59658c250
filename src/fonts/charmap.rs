// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Character maps
//!
//! Each font owns a [`CharMap`]: a table of `(code, mapped code, glyph)`
//! entries sorted by requested code, plus a set of the codes the font
//! accepts. Entries serve two purposes. They cache the glyph index of codes
//! already looked up, and they remap a requested code to another character
//! of the face (see [`CharMap::add_named_char`]).

use super::{FaceDescriptor, FaceId, Master};
use crate::engine::{GlyphEngine, GlyphId};
use crate::unicode::names;
use crate::{CharSet, CodePoint, GlcError};

/// Entries are allocated in blocks of this many
const BLOCK: usize = 16;

/// A character map entry
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CharMapEntry {
    /// The code requested by the user
    pub code: CodePoint,
    /// The code of the face's character drawn for `code`
    pub mapped: CodePoint,
    /// Glyph index of `mapped` within the face
    pub glyph: GlyphId,
}

/// A per-font code → glyph table
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CharMap {
    entries: Vec<CharMapEntry>,
    charset: CharSet,
}

impl CharMap {
    /// Construct for a face's character set
    ///
    /// The set is shared until modified.
    pub fn new(charset: &CharSet) -> Self {
        CharMap {
            entries: vec![],
            charset: charset.clone(),
        }
    }

    fn search(&self, code: CodePoint) -> Result<usize, usize> {
        self.entries.binary_search_by_key(&code, |entry| entry.code)
    }

    /// Explicit entries, sorted by requested code
    #[inline]
    pub fn entries(&self) -> &[CharMapEntry] {
        &self.entries
    }

    /// Codes accepted by this map
    #[inline]
    pub fn charset(&self) -> &CharSet {
        &self.charset
    }

    /// Get the entry for `code`, if any
    pub fn entry(&self, code: CodePoint) -> Option<&CharMapEntry> {
        self.search(code).ok().map(|i| &self.entries[i])
    }

    /// The face character drawn for `code`
    pub fn mapped_code(&self, code: CodePoint) -> CodePoint {
        self.entry(code).map(|e| e.mapped).unwrap_or(code)
    }

    /// Insert or update an entry
    ///
    /// Allocation failure leaves the map unchanged.
    pub fn insert(
        &mut self,
        code: CodePoint,
        mapped: CodePoint,
        glyph: GlyphId,
    ) -> Result<(), GlcError> {
        match self.search(code) {
            Ok(i) => {
                let entry = &mut self.entries[i];
                entry.mapped = mapped;
                entry.glyph = glyph;
            }
            Err(i) => {
                if self.entries.len() == self.entries.capacity() {
                    self.entries.try_reserve_exact(BLOCK)?;
                }
                let entry = CharMapEntry {
                    code,
                    mapped,
                    glyph,
                };
                self.entries.insert(i, entry);
            }
        }
        Ok(())
    }

    /// Remove `code` from the map
    ///
    /// Both the entry (if any) and the accepted set are updated; the font
    /// no longer renders `code`. Removing an absent code is not an error.
    /// Returns true if the map changed.
    pub fn remove(&mut self, code: CodePoint) -> bool {
        let had_entry = match self.search(code) {
            Ok(i) => {
                self.entries.remove(i);
                true
            }
            Err(_) => false,
        };
        self.charset.remove(code) || had_entry
    }

    /// True if this map renders `code`
    pub fn has_char(&self, code: CodePoint) -> bool {
        self.charset.contains(self.mapped_code(code))
    }

    /// Get the glyph for `code`
    ///
    /// Entries act as a cache: on the first lookup of an accepted code the
    /// face is queried and an identity entry is stored. Codes not accepted
    /// fail with [`GlcError::Parameter`] and leave the map unchanged.
    pub fn lookup_glyph(
        &mut self,
        code: CodePoint,
        face: &mut FaceDescriptor,
        engine: &dyn GlyphEngine,
    ) -> Result<GlyphId, GlcError> {
        if let Some(entry) = self.entry(code) {
            return Ok(entry.glyph);
        }
        if !self.charset.contains(code) {
            return Err(GlcError::Parameter);
        }
        let glyph = face.glyph_index(engine, code)?;
        self.insert(code, code, glyph)?;
        Ok(glyph)
    }

    /// Map `code` to the character named `name` of `master`'s face `face`
    ///
    /// Fails with [`GlcError::Parameter`] if `name` is unknown or the named
    /// character is not supported by the face. On success, `code` is added to
    /// this map and to the master's character set.
    pub fn add_named_char(
        &mut self,
        code: CodePoint,
        name: &str,
        master: &mut Master,
        face: FaceId,
        engine: &dyn GlyphEngine,
    ) -> Result<(), GlcError> {
        let mapped = names().code_for_name(name).ok_or(GlcError::Parameter)?;
        let face = master.face_mut(face).ok_or(GlcError::Parameter)?;
        let glyph = face.glyph_index(engine, mapped)?;

        let mut charset = self.charset.clone();
        charset.insert(code);
        self.insert(code, mapped, glyph)?;
        self.charset = charset;
        master.insert_char(code);
        Ok(())
    }

    /// Name of the face character drawn for `code`
    pub fn char_name(&self, code: CodePoint) -> Option<&'static str> {
        let mapped = self.mapped_code(code);
        if self.charset.contains(mapped) {
            names().name_for_code(mapped)
        } else {
            None
        }
    }

    /// Number of accepted codes
    pub fn char_count(&self) -> usize {
        self.charset.len()
    }

    /// The `index`-th accepted code
    pub fn nth_char(&self, index: usize) -> Option<CodePoint> {
        self.charset.nth(index)
    }
}
