// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Rendering contexts
//!
//! A [`Context`] owns everything needed to turn character codes into drawing
//! commands: its catalogs and the masters (families) built from them, the
//! fonts instantiated from those masters, the current font list, settings,
//! and the compiled glyph objects held in the masters' caches and the
//! texture atlas.
//!
//! A context is used by one thread at a time. The free functions of
//! [`crate::global`] and [`crate::commands`] bind contexts to threads; a
//! `Context` may also be used directly as an ordinary value.

mod catalog;
mod draw;
mod fonts;
mod measure;
mod resolve;

pub use measure::CharMetric;

use crate::engine::{GlyphEngine, TtfEngine};
use crate::fonts::{CatalogScanner, FaceId, Font, FontId, Master, MasterId, SystemScanner};
use crate::raster::{ListId, RasterTarget, TextureId};
use crate::render::TextureAtlas;
use crate::{CodePoint, Flags, Settings, Transform};
use std::any::Any;
use std::path::PathBuf;
use std::sync::Arc;

/// Handler for codes no current font maps
///
/// Called with the context and the code. If it returns true, the current
/// font list is searched again (the handler would typically have appended a
/// font). The handler is not invoked again while it is running.
pub type Callback = Box<dyn FnMut(&mut Context, CodePoint) -> bool + Send>;

/// A character rendering context
pub struct Context {
    settings: Settings,
    catalogs: Vec<PathBuf>,
    masters: Vec<Master>,
    fonts: Vec<Font>,
    current: Vec<FontId>,
    callback: Option<Callback>,
    in_callback: bool,
    last_face: u32,
    last_master: u32,
    engine: Arc<dyn GlyphEngine>,
    scanner: Arc<dyn CatalogScanner>,
    target: Box<dyn RasterTarget>,
    atlas: TextureAtlas,
    measured: Vec<CharMetric>,
    data: Option<Box<dyn Any + Send>>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("settings", &self.settings)
            .field("catalogs", &self.catalogs)
            .field("masters", &self.masters.len())
            .field("fonts", &self.fonts.len())
            .field("current", &self.current)
            .field("in_callback", &self.in_callback)
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Construct with the default engine and scanner
    ///
    /// No catalogs are added; see [`crate::global::gen_context`] for a
    /// context initialised from the environment.
    pub fn new(target: Box<dyn RasterTarget>) -> Self {
        Self::with_engine(target, Arc::new(TtfEngine), Arc::new(SystemScanner))
    }

    /// Construct with a custom glyph engine and catalog scanner
    pub fn with_engine(
        target: Box<dyn RasterTarget>,
        engine: Arc<dyn GlyphEngine>,
        scanner: Arc<dyn CatalogScanner>,
    ) -> Self {
        Context {
            settings: Settings::default(),
            catalogs: vec![],
            masters: vec![],
            fonts: vec![],
            current: vec![],
            callback: None,
            in_callback: false,
            last_face: 0,
            last_master: 0,
            engine,
            scanner,
            target,
            atlas: TextureAtlas::new(),
            measured: vec![],
            data: None,
        }
    }

    #[inline]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[inline]
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// The glyph engine
    #[inline]
    pub fn engine(&self) -> &dyn GlyphEngine {
        &*self.engine
    }

    /// Enable a flag
    pub fn enable(&mut self, flag: Flags) {
        self.settings.flags.insert(flag);
    }

    /// Disable a flag
    pub fn disable(&mut self, flag: Flags) {
        self.settings.flags.remove(flag);
    }

    /// Test a flag
    pub fn is_enabled(&self, flag: Flags) -> bool {
        self.settings.is_enabled(flag)
    }

    /// Reset the transform to the identity
    pub fn load_identity(&mut self) {
        self.settings.transform = Transform::IDENTITY;
    }

    /// Replace the transform
    pub fn load_matrix(&mut self, matrix: Transform) {
        self.settings.transform = matrix;
    }

    /// Post-multiply the transform by `matrix`
    pub fn multiply_matrix(&mut self, matrix: Transform) {
        self.settings.transform = self.settings.transform.then_apply(matrix);
    }

    /// Post-multiply the transform by a rotation of `degrees`
    pub fn rotate(&mut self, degrees: f32) {
        self.multiply_matrix(Transform::rotation(degrees));
    }

    /// Post-multiply the transform by a scale
    pub fn scale(&mut self, x: f32, y: f32) {
        self.multiply_matrix(Transform::scale(x, y));
    }

    /// Set or clear the unmapped-code handler
    pub fn set_callback(&mut self, callback: Option<Callback>) {
        self.callback = callback;
    }

    /// True if an unmapped-code handler is set
    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    /// True while the unmapped-code handler runs
    #[inline]
    pub fn in_callback(&self) -> bool {
        self.in_callback
    }

    /// Replace the user data, returning the old value
    pub fn set_data(&mut self, data: Option<Box<dyn Any + Send>>) -> Option<Box<dyn Any + Send>> {
        std::mem::replace(&mut self.data, data)
    }

    /// Get the user data
    pub fn data(&self) -> Option<&(dyn Any + Send)> {
        self.data.as_deref()
    }

    /// Get the user data mutably
    pub fn data_mut(&mut self) -> Option<&mut (dyn Any + Send)> {
        self.data.as_deref_mut()
    }

    /// Masters in creation order
    #[inline]
    pub fn masters(&self) -> &[Master] {
        &self.masters
    }

    /// Find a master by identifier
    pub fn master(&self, id: MasterId) -> Option<&Master> {
        self.masters.iter().find(|m| m.id() == id)
    }

    /// Find a master by family name
    pub fn master_by_family(&self, family: &str) -> Option<&Master> {
        self.masters.iter().find(|m| m.family() == family)
    }

    fn master_index(&self, id: MasterId) -> Option<usize> {
        self.masters.iter().position(|m| m.id() == id)
    }

    /// All compiled glyph lists
    pub fn list_objects(&self) -> Vec<ListId> {
        self.masters.iter().flat_map(|m| m.cache.lists()).collect()
    }

    /// All glyph textures
    pub fn texture_objects(&self) -> Vec<TextureId> {
        self.atlas.textures().collect()
    }

    /// The texture atlas
    #[inline]
    pub fn atlas(&self) -> &TextureAtlas {
        &self.atlas
    }

    /// Release every compiled list and texture
    pub fn delete_gl_objects(&mut self) {
        let target = &mut *self.target;
        for master in &mut self.masters {
            master.cache.clear(target);
        }
        // all lists are gone; the atlas keys need no further release
        self.atlas.clear(target);
    }

    /// Release the lists and atlas cells of `face` in master `index`
    fn release_face_objects(&mut self, index: usize, face: FaceId) {
        let master = &mut self.masters[index];
        let id = master.id();
        for key in master.cache.remove_face(&mut *self.target, face) {
            self.atlas.release(&(id, key));
        }
    }

    /// Release lists whose atlas cells were evicted
    fn flush_evictions(&mut self) {
        let target = &mut *self.target;
        for (id, key) in self.atlas.take_evicted() {
            if let Some(master) = self.masters.iter_mut().find(|m| m.id() == id) {
                master.cache.remove(target, &key);
            }
        }
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        self.delete_gl_objects();
    }
}
