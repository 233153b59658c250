// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Glyph rendering
//!
//! One glyph is drawn by the backend selected by
//! [`Settings::render_style`](crate::Settings::render_style):
//!
//! -   [`RenderStyle::Bitmap`]: rasterized afresh on every call and submitted
//!     as a monochrome bitmap; the pen advances in pixels
//! -   [`RenderStyle::Texture`]: rasterized once into a cell of the
//!     [`TextureAtlas`] and drawn as a textured quad; the pen advances in ems
//! -   [`RenderStyle::Line`] and [`RenderStyle::Triangle`]: the outline is
//!     flattened and drawn as a polygon boundary or a filled polygon
//!
//! When [`Flags::GL_OBJECTS`] is enabled, all but the bitmap style compile
//! their commands into a list stored in the owning master's [`GlyphCache`];
//! subsequent requests replay the list without consulting the glyph engine.

mod atlas;
mod bitmap;
mod cache;
mod scalable;
mod texture;

pub use atlas::{AtlasKey, TextureAtlas};
pub use cache::{CacheMode, GlyphCache, GlyphKey};

use crate::engine::{GlyphEngine, GlyphId};
use crate::fonts::{FaceId, Master, OpenFace};
use crate::raster::RasterTarget;
use crate::{CodePoint, Flags, GlcError, RenderStyle, Settings};

/// Everything needed to draw one glyph
pub(crate) struct GlyphRequest<'a> {
    pub settings: &'a Settings,
    pub engine: &'a dyn GlyphEngine,
    pub target: &'a mut dyn RasterTarget,
    pub atlas: &'a mut TextureAtlas,
    pub master: &'a mut Master,
    pub face: FaceId,
    /// Face character (after any remapping); part of the cache key
    pub code: CodePoint,
    pub glyph: GlyphId,
}

impl<'a> GlyphRequest<'a> {
    fn key(&self, mode: CacheMode) -> GlyphKey {
        GlyphKey {
            face: self.face,
            code: self.code,
            mode,
        }
    }

    fn open_face(&mut self) -> Result<OpenFace<'_>, GlcError> {
        let face = self.master.face_mut(self.face).ok_or_else(|| {
            log::error!("GlyphRequest: face {:?} not found in master", self.face);
            GlcError::Resource
        })?;
        face.acquire(self.engine)
    }

    /// Replay the cached list for `key`, if any
    fn replay(&mut self, key: &GlyphKey) -> bool {
        if !self.settings.is_enabled(Flags::GL_OBJECTS) {
            return false;
        }
        match self.master.cache.get(key) {
            Some(list) => {
                log::trace!("replaying {key:?} as {list:?}");
                self.target.call_list(list);
                true
            }
            None => false,
        }
    }
}

/// Compile `draw` into a list, execute it and store it in `cache`
///
/// Without [`Flags::GL_OBJECTS`] the commands are issued immediately.
fn compile_and_call(
    settings: &Settings,
    target: &mut dyn RasterTarget,
    cache: &mut GlyphCache,
    key: GlyphKey,
    draw: impl FnOnce(&mut dyn RasterTarget),
) -> Result<(), GlcError> {
    if !settings.is_enabled(Flags::GL_OBJECTS) {
        draw(target);
        return Ok(());
    }
    let list = target.begin_list()?;
    draw(target);
    target.end_list();
    target.call_list(list);
    log::debug!("compiled {key:?} as {list:?}");
    cache.insert(target, key, list);
    Ok(())
}

/// Drop atlas cells made stale by a change of texture settings
///
/// Call before [`render_glyph`], then release the lists of evicted cells,
/// so that no stale list is replayed.
pub(crate) fn prepare_atlas(
    settings: &Settings,
    target: &mut dyn RasterTarget,
    atlas: &mut TextureAtlas,
) {
    if settings.render_style == RenderStyle::Texture && settings.is_enabled(Flags::GL_OBJECTS) {
        let mipmap = settings.is_enabled(Flags::MIPMAP);
        atlas.reconfigure(target, texture::cell_size(settings), mipmap);
    }
}

/// Draw one glyph with the active render style
pub(crate) fn render_glyph(request: GlyphRequest<'_>) -> Result<(), GlcError> {
    match request.settings.render_style {
        RenderStyle::Bitmap => bitmap::render(request),
        RenderStyle::Texture => texture::render(request),
        RenderStyle::Line => scalable::render(request, CacheMode::Line),
        RenderStyle::Triangle => scalable::render(request, CacheMode::Triangle),
    }
}
