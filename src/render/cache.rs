// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Per-master cache of compiled glyph lists

use crate::fonts::FaceId;
use crate::raster::{ListId, RasterTarget};
use crate::CodePoint;
use std::collections::HashMap;

/// Render mode component of a cache key
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CacheMode {
    Texture,
    Line,
    Triangle,
}

/// Cache key: which glyph, drawn how
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GlyphKey {
    pub face: FaceId,
    pub code: CodePoint,
    pub mode: CacheMode,
}

/// Compiled lists owned by a master
///
/// Lists are released through the [`RasterTarget`] when removed.
#[derive(Debug, Default)]
pub struct GlyphCache {
    lists: HashMap<GlyphKey, ListId>,
}

impl GlyphCache {
    /// Number of cached lists
    pub fn len(&self) -> usize {
        self.lists.len()
    }

    /// True if nothing is cached
    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// Look up a compiled list
    pub fn get(&self, key: &GlyphKey) -> Option<ListId> {
        self.lists.get(key).copied()
    }

    /// Store a compiled list
    ///
    /// Any list previously stored under `key` is released.
    pub fn insert(&mut self, target: &mut dyn RasterTarget, key: GlyphKey, list: ListId) {
        if let Some(old) = self.lists.insert(key, list) {
            target.delete_list(old);
        }
    }

    /// Remove and release one entry
    pub fn remove(&mut self, target: &mut dyn RasterTarget, key: &GlyphKey) -> bool {
        match self.lists.remove(key) {
            Some(list) => {
                target.delete_list(list);
                true
            }
            None => false,
        }
    }

    /// Remove and release all entries for `face`
    ///
    /// Returns the removed keys.
    pub fn remove_face(&mut self, target: &mut dyn RasterTarget, face: FaceId) -> Vec<GlyphKey> {
        let mut removed = vec![];
        self.lists.retain(|key, list| {
            if key.face == face {
                target.delete_list(*list);
                removed.push(*key);
                false
            } else {
                true
            }
        });
        removed
    }

    /// Remove and release everything
    ///
    /// Returns the removed keys.
    pub fn clear(&mut self, target: &mut dyn RasterTarget) -> Vec<GlyphKey> {
        let mut removed: Vec<_> = self.lists.drain().collect();
        removed.sort();
        removed
            .into_iter()
            .map(|(key, list)| {
                target.delete_list(list);
                key
            })
            .collect()
    }

    /// Iterate over cached lists
    pub fn lists(&self) -> impl Iterator<Item = ListId> + '_ {
        self.lists.values().copied()
    }

    /// Iterate over keys of cached lists
    pub fn keys(&self) -> impl Iterator<Item = &GlyphKey> + '_ {
        self.lists.keys()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::raster::RecordingTarget;

    #[test]
    fn remove_face_releases_lists() {
        let mut target = RecordingTarget::new();
        let handle = target.handle();
        let mut cache = GlyphCache::default();
        for (face, code) in [(1, 65), (1, 66), (2, 65)] {
            let list = target.begin_list().unwrap();
            target.end_list();
            let key = GlyphKey {
                face: FaceId(face),
                code,
                mode: CacheMode::Line,
            };
            cache.insert(&mut target, key, list);
        }
        assert_eq!(handle.lock().live_lists(), 3);
        let removed = cache.remove_face(&mut target, FaceId(1));
        assert_eq!(removed.len(), 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(handle.lock().live_lists(), 1);
        assert_eq!(cache.clear(&mut target).len(), 1);
        assert_eq!(handle.lock().live_lists(), 0);
    }
}
