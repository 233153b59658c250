// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Masters: font families

use super::{FaceDescriptor, FaceId};
use crate::conv::to_usize;
use crate::render::GlyphCache;
use crate::unicode::names;
use crate::{CharSet, CodePoint};
use std::path::Path;

/// Master identifier
///
/// Identifiers are allocated in increasing order and are not reused within
/// a context.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MasterId(pub(crate) u32);
impl MasterId {
    /// Get as `usize`
    pub fn get(self) -> usize {
        to_usize(self.0)
    }
}

/// Where to insert new items
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Position {
    Prepend,
    #[default]
    Append,
}

/// All faces sharing a family name
///
/// The master's character set is the union of its faces' sets and is kept
/// exact: it grows as faces are added and is rebuilt from the remaining faces
/// when one is removed. Compiled glyph lists for all faces live in the
/// master's cache and are released with it.
#[derive(Debug)]
pub struct Master {
    id: MasterId,
    family: String,
    vendor: String,
    format: String,
    charset: CharSet,
    min_code: Option<CodePoint>,
    max_code: Option<CodePoint>,
    pub(crate) faces: Vec<FaceDescriptor>,
    pub(crate) cache: GlyphCache,
}

impl Master {
    /// Construct an empty master
    pub fn new(id: MasterId, family: String, vendor: String, format: String) -> Self {
        Master {
            id,
            family,
            vendor,
            format,
            charset: CharSet::new(),
            min_code: None,
            max_code: None,
            faces: vec![],
            cache: GlyphCache::default(),
        }
    }

    #[inline]
    pub fn id(&self) -> MasterId {
        self.id
    }

    /// Family name
    #[inline]
    pub fn family(&self) -> &str {
        &self.family
    }

    #[inline]
    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    /// Format label (e.g. "TrueType")
    #[inline]
    pub fn format(&self) -> &str {
        &self.format
    }

    /// Union of all faces' character sets
    #[inline]
    pub fn charset(&self) -> &CharSet {
        &self.charset
    }

    /// Number of supported code points
    pub fn char_count(&self) -> usize {
        self.charset.len()
    }

    /// Smallest supported code point
    #[inline]
    pub fn min_mapped_code(&self) -> Option<CodePoint> {
        self.min_code
    }

    /// Largest supported code point
    #[inline]
    pub fn max_mapped_code(&self) -> Option<CodePoint> {
        self.max_code
    }

    /// True if every face is fixed pitch
    pub fn is_fixed_pitch(&self) -> bool {
        !self.faces.is_empty() && self.faces.iter().all(|f| f.is_fixed_pitch())
    }

    /// Faces in priority order
    #[inline]
    pub fn faces(&self) -> &[FaceDescriptor] {
        &self.faces
    }

    /// Compiled glyph lists of all faces
    #[inline]
    pub fn cache(&self) -> &GlyphCache {
        &self.cache
    }

    /// Number of faces
    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Find a face by style name
    pub fn face_by_style(&self, style: &str) -> Option<&FaceDescriptor> {
        self.faces.iter().find(|f| f.style() == style)
    }

    /// Find a face by identifier
    pub fn face(&self, id: FaceId) -> Option<&FaceDescriptor> {
        self.faces.iter().find(|f| f.id() == id)
    }

    pub(crate) fn face_mut(&mut self, id: FaceId) -> Option<&mut FaceDescriptor> {
        self.faces.iter_mut().find(|f| f.id() == id)
    }

    /// First face supporting `code`
    pub fn face_for_code(&self, code: CodePoint) -> Option<&FaceDescriptor> {
        self.faces.iter().find(|f| f.charset().contains(code))
    }

    /// True if some face supports `code`
    #[inline]
    pub fn has_char(&self, code: CodePoint) -> bool {
        self.charset.contains(code)
    }

    /// Name of `code` if some face supports it
    pub fn char_name(&self, code: CodePoint) -> Option<&'static str> {
        if self.has_char(code) {
            names().name_for_code(code)
        } else {
            None
        }
    }

    /// Name of the `index`-th supported code point
    pub fn char_name_by_index(&self, index: usize) -> Option<&'static str> {
        self.charset
            .nth(index)
            .and_then(|code| names().name_for_code(code))
    }

    /// Add a face
    ///
    /// Returns false (and drops `face`) if a face of the same style exists.
    pub(crate) fn add_face(&mut self, face: FaceDescriptor, position: Position) -> bool {
        if self.face_by_style(face.style()).is_some() {
            return false;
        }
        self.charset.union_with(face.charset());
        if let Some(min) = face.charset().min() {
            self.min_code = Some(self.min_code.map_or(min, |m| m.min(min)));
        }
        if let Some(max) = face.charset().max() {
            self.max_code = Some(self.max_code.map_or(max, |m| m.max(max)));
        }
        match position {
            Position::Prepend => self.faces.insert(0, face),
            Position::Append => self.faces.push(face),
        }
        true
    }

    /// Index of the face backed by `path` (and face `index` within it)
    pub(crate) fn find_face_by_file(&self, path: &Path, index: u32) -> Option<usize> {
        self.faces
            .iter()
            .position(|f| f.path() == path && f.index() == index)
    }

    /// Remove the face at `index`, rebuilding the character set
    pub(crate) fn remove_face_at(&mut self, index: usize) -> FaceDescriptor {
        let face = self.faces.remove(index);
        self.rebuild_charset();
        face
    }

    /// Recompute the union set and code range from the current faces
    pub(crate) fn rebuild_charset(&mut self) {
        let mut charset = CharSet::new();
        for face in &self.faces {
            charset.union_with(face.charset());
        }
        self.min_code = charset.min();
        self.max_code = charset.max();
        self.charset = charset;
    }

    /// Add `code` to the union set (used by named remapping)
    pub(crate) fn insert_char(&mut self, code: CodePoint) {
        if self.charset.insert(code) {
            self.min_code = Some(self.min_code.map_or(code, |m| m.min(code)));
            self.max_code = Some(self.max_code.map_or(code, |m| m.max(code)));
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn face(id: u32, style: &str, ranges: &[(u32, u32)]) -> FaceDescriptor {
        FaceDescriptor::new(
            FaceId(id),
            style.into(),
            format!("{style}.ttf").into(),
            0,
            CharSet::from_ranges(ranges.iter().copied()),
            true,
        )
    }

    #[test]
    fn add_face_unions_and_skips_duplicates() {
        let mut master = Master::new(MasterId(1), "Mono".into(), "X".into(), "TrueType".into());
        assert!(master.add_face(face(1, "Regular", &[(65, 90)]), Position::Append));
        assert!(master.add_face(face(2, "Bold", &[(48, 57)]), Position::Prepend));
        assert!(!master.add_face(face(3, "Bold", &[(0x100, 0x17F)]), Position::Append));
        assert_eq!(master.faces()[0].style(), "Bold");
        assert_eq!(master.charset().ranges(), &[(48, 57), (65, 90)]);
        assert_eq!(master.min_mapped_code(), Some(48));
        assert_eq!(master.max_mapped_code(), Some(90));
        assert_eq!(master.char_count(), 36);
        assert!(master.is_fixed_pitch());
    }

    #[test]
    fn removal_rebuilds_shared_chars() {
        let mut master = Master::new(MasterId(1), "Mono".into(), "X".into(), "TrueType".into());
        master.add_face(face(1, "Regular", &[(65, 90)]), Position::Append);
        master.add_face(face(2, "Bold", &[(70, 100)]), Position::Append);
        let index = master.find_face_by_file(Path::new("Bold.ttf"), 0).unwrap();
        let removed = master.remove_face_at(index);
        assert_eq!(removed.style(), "Bold");
        assert_eq!(master.charset(), master.faces()[0].charset());
        assert_eq!(master.max_mapped_code(), Some(90));
    }

    #[test]
    fn char_names() {
        let mut master = Master::new(MasterId(1), "Mono".into(), "X".into(), "TrueType".into());
        master.add_face(face(1, "Regular", &[(65, 90)]), Position::Append);
        assert_eq!(master.char_name(66), Some("LATIN CAPITAL LETTER B"));
        assert_eq!(master.char_name(97), None);
        assert_eq!(master.char_name_by_index(2), Some("LATIN CAPITAL LETTER C"));
        master.insert_char(97);
        assert_eq!(master.char_name(97), Some("LATIN SMALL LETTER A"));
        assert_eq!(master.max_mapped_code(), Some(97));
    }

    #[test]
    fn names_beyond_latin() {
        let mut master = Master::new(MasterId(1), "Kana".into(), "X".into(), "TrueType".into());
        let kana = face(1, "Regular", &[(0x3041, 0x3096), (0x4E00, 0x4E01)]);
        master.add_face(kana, Position::Append);
        assert!(master.has_char(0x3042));
        assert_eq!(master.char_name(0x3042), Some("HIRAGANA LETTER A"));
        assert_eq!(master.char_name_by_index(1), Some("HIRAGANA LETTER A"));
        assert_eq!(master.char_name(0x4E01), Some("CJK UNIFIED IDEOGRAPH-4E01"));
    }
}
