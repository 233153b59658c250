// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Texture atlas
//!
//! A single square texture divided into a grid of glyph cells. Cells are
//! handed out from a free list; once that is exhausted the least recently
//! used cell is evicted. The evicted key is queued so that its compiled list
//! can be released by the owner of the corresponding [`super::GlyphCache`].

use super::GlyphKey;
use crate::fonts::MasterId;
use crate::raster::{RasterTarget, TextureId};
use crate::GlcError;
use lru::LruCache;

/// Atlas sizes to try, largest first
const ATLAS_SIZES: [u32; 3] = [1024, 512, 256];

/// Atlas slot key: a cache key qualified by its master
pub type AtlasKey = (MasterId, GlyphKey);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Scratch {
    texture: TextureId,
    cell: u32,
    mipmap: bool,
}

/// Glyph texture storage
#[derive(Debug)]
pub struct TextureAtlas {
    texture: Option<TextureId>,
    size: u32,
    cell: u32,
    mipmap: bool,
    slots: LruCache<AtlasKey, u32>,
    free: Vec<u32>,
    evicted: Vec<AtlasKey>,
    scratch: Option<Scratch>,
}

impl Default for TextureAtlas {
    fn default() -> Self {
        TextureAtlas::new()
    }
}

impl TextureAtlas {
    /// Construct (no texture is allocated until first use)
    pub fn new() -> Self {
        TextureAtlas {
            texture: None,
            size: 0,
            cell: 0,
            mipmap: false,
            slots: LruCache::unbounded(),
            free: vec![],
            evicted: vec![],
            scratch: None,
        }
    }

    /// The atlas texture, if allocated
    #[inline]
    pub fn texture(&self) -> Option<TextureId> {
        self.texture
    }

    /// Side length of the atlas texture
    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Side length of one cell
    #[inline]
    pub fn cell_size(&self) -> u32 {
        self.cell
    }

    /// Number of cells
    pub fn capacity(&self) -> usize {
        if self.cell == 0 {
            return 0;
        }
        let per_row = crate::conv::to_usize(self.size / self.cell);
        per_row * per_row
    }

    /// Number of occupied cells
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether `key` occupies a cell (does not count as an access)
    pub fn contains(&self, key: &AtlasKey) -> bool {
        self.slots.contains(key)
    }

    /// Keys from most to least recently used
    pub fn keys(&self) -> impl Iterator<Item = &AtlasKey> + '_ {
        self.slots.iter().map(|(key, _)| key)
    }

    /// Mark `key` as used, returning its cell
    pub(crate) fn touch(&mut self, key: &AtlasKey) -> Option<u32> {
        self.slots.get(key).copied()
    }

    /// Texel offset of cell `index`
    pub fn cell_origin(&self, index: u32) -> (u32, u32) {
        let per_row = (self.size / self.cell.max(1)).max(1);
        ((index % per_row) * self.cell, (index / per_row) * self.cell)
    }

    /// Evict every cell if the cell size or mipmapping changed
    ///
    /// The atlas texture is released; the next allocation creates a new one.
    pub(crate) fn reconfigure(&mut self, target: &mut dyn RasterTarget, cell: u32, mipmap: bool) {
        let Some(texture) = self.texture else {
            return;
        };
        if self.cell == cell && self.mipmap == mipmap {
            return;
        }
        log::debug!("TextureAtlas: reallocating for cell size {cell}, mipmap: {mipmap}");
        while let Some((key, _)) = self.slots.pop_lru() {
            self.evicted.push(key);
        }
        self.free.clear();
        target.delete_texture(texture);
        self.texture = None;
    }

    fn ensure(
        &mut self,
        target: &mut dyn RasterTarget,
        cell: u32,
        mipmap: bool,
    ) -> Result<TextureId, GlcError> {
        self.reconfigure(target, cell, mipmap);
        if let Some(texture) = self.texture {
            return Ok(texture);
        }

        for size in ATLAS_SIZES {
            if size < cell || !target.texture_size_supported(size, size) {
                continue;
            }
            match target.create_texture(size, size, mipmap) {
                Ok(texture) => {
                    log::debug!("TextureAtlas: allocated {size}x{size} texture {texture:?}");
                    self.texture = Some(texture);
                    self.size = size;
                    self.cell = cell;
                    self.mipmap = mipmap;
                    let cells = crate::conv::to_u32(self.capacity());
                    self.free = (0..cells).rev().collect();
                    return Ok(texture);
                }
                Err(err) => log::debug!("TextureAtlas: {size}x{size} refused: {err}"),
            }
        }
        log::warn!("TextureAtlas: no texture size accepted");
        Err(GlcError::Resource)
    }

    /// Allocate a cell for `key`
    ///
    /// Evicts the least recently used cell when full; see
    /// [`Self::take_evicted`]. Returns the atlas texture and the cell index.
    pub(crate) fn allocate(
        &mut self,
        target: &mut dyn RasterTarget,
        key: AtlasKey,
        cell: u32,
        mipmap: bool,
    ) -> Result<(TextureId, u32), GlcError> {
        let texture = self.ensure(target, cell, mipmap)?;
        if let Some(index) = self.slots.get(&key) {
            return Ok((texture, *index));
        }
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                let (old, index) = self.slots.pop_lru().ok_or(GlcError::Resource)?;
                log::debug!("TextureAtlas: evicting {old:?} from cell {index}");
                self.evicted.push(old);
                index
            }
        };
        self.slots.put(key, index);
        Ok((texture, index))
    }

    /// Free the cell held by `key`
    pub(crate) fn release(&mut self, key: &AtlasKey) -> bool {
        match self.slots.pop(key) {
            Some(index) => {
                self.free.push(index);
                true
            }
            None => false,
        }
    }

    /// Keys evicted since the last call
    pub(crate) fn take_evicted(&mut self) -> Vec<AtlasKey> {
        std::mem::take(&mut self.evicted)
    }

    /// Texture used when glyphs are drawn without compiled lists
    pub(crate) fn scratch(
        &mut self,
        target: &mut dyn RasterTarget,
        cell: u32,
        mipmap: bool,
    ) -> Result<TextureId, GlcError> {
        if let Some(scratch) = self.scratch {
            if scratch.cell == cell && scratch.mipmap == mipmap {
                return Ok(scratch.texture);
            }
            target.delete_texture(scratch.texture);
            self.scratch = None;
        }
        let texture = target.create_texture(cell, cell, mipmap)?;
        self.scratch = Some(Scratch {
            texture,
            cell,
            mipmap,
        });
        Ok(texture)
    }

    /// All live textures
    pub fn textures(&self) -> impl Iterator<Item = TextureId> + '_ {
        self.texture
            .into_iter()
            .chain(self.scratch.map(|s| s.texture))
    }

    /// Release all textures
    ///
    /// Returns the keys of all occupied cells; their lists must be released
    /// by the caller.
    pub(crate) fn clear(&mut self, target: &mut dyn RasterTarget) -> Vec<AtlasKey> {
        let mut keys = self.take_evicted();
        while let Some((key, _)) = self.slots.pop_lru() {
            keys.push(key);
        }
        for texture in self.textures().collect::<Vec<_>>() {
            target.delete_texture(texture);
        }
        *self = TextureAtlas::new();
        keys
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fonts::FaceId;
    use crate::raster::RecordingTarget;
    use crate::render::CacheMode;

    fn key(code: u32) -> AtlasKey {
        let key = GlyphKey {
            face: FaceId(1),
            code,
            mode: CacheMode::Texture,
        };
        (MasterId(1), key)
    }

    #[test]
    fn probes_smaller_sizes() {
        let mut target = RecordingTarget::with_max_texture_size(512);
        let mut atlas = TextureAtlas::new();
        atlas.allocate(&mut target, key(65), 64, false).unwrap();
        assert_eq!(atlas.size(), 512);
        assert_eq!(atlas.capacity(), 64);

        let mut target = RecordingTarget::with_max_texture_size(128);
        let mut atlas = TextureAtlas::new();
        let r = atlas.allocate(&mut target, key(65), 64, false);
        assert_eq!(r, Err(GlcError::Resource));
        assert_eq!(atlas.texture(), None);
        assert_eq!(target.handle().lock().live_textures(), 0);
    }

    #[test]
    fn evicts_least_recently_used() {
        let mut target = RecordingTarget::with_max_texture_size(256);
        let mut atlas = TextureAtlas::new();
        // 256 / 128 = 2 cells per row, 4 cells
        for code in 0..4 {
            atlas.allocate(&mut target, key(code), 128, false).unwrap();
        }
        assert_eq!(atlas.capacity(), 4);
        assert!(atlas.take_evicted().is_empty());

        assert!(atlas.touch(&key(0)).is_some());
        let (_, index) = atlas.allocate(&mut target, key(9), 128, false).unwrap();
        assert_eq!(atlas.take_evicted(), vec![key(1)]);
        assert!(!atlas.contains(&key(1)));
        assert_eq!(atlas.cell_origin(index), atlas.cell_origin(1));
        assert_eq!(atlas.len(), 4);

        assert!(atlas.release(&key(2)));
        atlas.allocate(&mut target, key(10), 128, false).unwrap();
        assert!(atlas.take_evicted().is_empty());
    }

    #[test]
    fn clear_releases_textures() {
        let mut target = RecordingTarget::new();
        let handle = target.handle();
        let mut atlas = TextureAtlas::new();
        atlas.allocate(&mut target, key(65), 64, true).unwrap();
        atlas.scratch(&mut target, 64, true).unwrap();
        assert_eq!(handle.lock().live_textures(), 2);
        assert_eq!(atlas.clear(&mut target), vec![key(65)]);
        assert_eq!(handle.lock().live_textures(), 0);
        assert!(atlas.is_empty());
    }
}
