// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Face descriptors

use crate::conv::to_usize;
use crate::engine::{EngineFace, GlyphEngine, GlyphId};
use crate::{CharSet, CodePoint, GlcError};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Face identifier
///
/// Unique within a [`crate::Context`] for the lifetime of that context.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FaceId(pub(crate) u32);
impl FaceId {
    /// Get as `usize`
    pub fn get(self) -> usize {
        to_usize(self.0)
    }
}

/// One style of a family, backed by a face within a font file
///
/// The engine handle is opened on demand and shared: [`Self::acquire`]
/// returns a guard; the handle is released when the last guard is dropped.
/// The open count is a plain counter since a descriptor is only ever
/// accessed by the thread owning its context.
pub struct FaceDescriptor {
    id: FaceId,
    style: String,
    path: PathBuf,
    index: u32,
    charset: CharSet,
    fixed_pitch: bool,
    open_count: u32,
    handle: Option<Arc<dyn EngineFace>>,
}

impl std::fmt::Debug for FaceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaceDescriptor")
            .field("id", &self.id)
            .field("style", &self.style)
            .field("path", &self.path)
            .field("index", &self.index)
            .field("chars", &self.charset.len())
            .field("fixed_pitch", &self.fixed_pitch)
            .field("open_count", &self.open_count)
            .finish()
    }
}

impl FaceDescriptor {
    /// Construct
    pub fn new(
        id: FaceId,
        style: String,
        path: PathBuf,
        index: u32,
        charset: CharSet,
        fixed_pitch: bool,
    ) -> Self {
        FaceDescriptor {
            id,
            style,
            path,
            index,
            charset,
            fixed_pitch,
            open_count: 0,
            handle: None,
        }
    }

    /// Identifier
    #[inline]
    pub fn id(&self) -> FaceId {
        self.id
    }

    /// Style name
    #[inline]
    pub fn style(&self) -> &str {
        &self.style
    }

    /// Font file
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Index of the face within its file
    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Supported code points
    #[inline]
    pub fn charset(&self) -> &CharSet {
        &self.charset
    }

    #[inline]
    pub fn is_fixed_pitch(&self) -> bool {
        self.fixed_pitch
    }

    /// Number of outstanding opens
    #[inline]
    pub fn open_count(&self) -> u32 {
        self.open_count
    }

    /// Open the engine face, or share the already-open handle
    ///
    /// Each successful call must be balanced by [`Self::close`]; prefer
    /// [`Self::acquire`].
    pub(crate) fn open(
        &mut self,
        engine: &dyn GlyphEngine,
    ) -> Result<Arc<dyn EngineFace>, GlcError> {
        let handle = match self.handle {
            Some(ref handle) => handle.clone(),
            None => {
                let handle = engine.open(&self.path, self.index)?;
                self.handle = Some(handle.clone());
                handle
            }
        };
        self.open_count += 1;
        Ok(handle)
    }

    /// Balance a call to [`Self::open`]
    pub(crate) fn close(&mut self) {
        debug_assert!(self.open_count > 0);
        self.open_count = self.open_count.saturating_sub(1);
        if self.open_count == 0 {
            self.handle = None;
        }
    }

    /// Open the engine face for the lifetime of the returned guard
    pub fn acquire<'a>(&'a mut self, engine: &dyn GlyphEngine) -> Result<OpenFace<'a>, GlcError> {
        let face = self.open(engine)?;
        Ok(OpenFace { desc: self, face })
    }

    /// Get the engine's glyph index for `code`
    ///
    /// Fails with [`GlcError::Parameter`] if `code` is not supported by this
    /// face.
    pub fn glyph_index(
        &mut self,
        engine: &dyn GlyphEngine,
        code: CodePoint,
    ) -> Result<GlyphId, GlcError> {
        if !self.charset.contains(code) {
            return Err(GlcError::Parameter);
        }
        let face = self.acquire(engine)?;
        face.glyph_index(code).ok_or_else(|| {
            log::warn!(
                "FaceDescriptor: {} claims U+{code:04X} but has no glyph",
                face.descriptor().path.display()
            );
            GlcError::Parameter
        })
    }
}

/// Scoped access to an open engine face
///
/// Dereferences to the engine face; closes the descriptor on drop.
pub struct OpenFace<'a> {
    desc: &'a mut FaceDescriptor,
    face: Arc<dyn EngineFace>,
}

impl<'a> OpenFace<'a> {
    /// The descriptor this face was opened from
    pub fn descriptor(&self) -> &FaceDescriptor {
        self.desc
    }
}

impl<'a> Deref for OpenFace<'a> {
    type Target = dyn EngineFace;

    fn deref(&self) -> &Self::Target {
        &*self.face
    }
}

impl<'a> Drop for OpenFace<'a> {
    fn drop(&mut self) {
        self.desc.close();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::engine::{GlyphMetrics, OutlineSink, RasterRequest};
    use crate::raster::Bitmap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Face;
    impl EngineFace for Face {
        fn units_per_em(&self) -> u16 {
            1000
        }
        fn glyph_index(&self, code: CodePoint) -> Option<GlyphId> {
            (code != 'Z' as u32).then_some(GlyphId(code - 60))
        }
        fn metrics(&self, _: GlyphId) -> Option<GlyphMetrics> {
            None
        }
        fn kerning(&self, _: GlyphId, _: GlyphId) -> Option<f32> {
            None
        }
        fn outline(&self, _: GlyphId, _: &mut dyn OutlineSink) -> bool {
            false
        }
        fn rasterize(&self, _: GlyphId, _: &RasterRequest) -> Option<Bitmap> {
            None
        }
    }

    #[derive(Default)]
    struct Engine(AtomicUsize);
    impl GlyphEngine for Engine {
        fn open(&self, _: &Path, _: u32) -> Result<Arc<dyn EngineFace>, GlcError> {
            self.0.fetch_add(1, Ordering::Relaxed);
            Ok(Arc::new(Face))
        }
    }

    fn descriptor() -> FaceDescriptor {
        FaceDescriptor::new(
            FaceId(1),
            "Regular".into(),
            "mono.ttf".into(),
            0,
            CharSet::from_ranges([(65, 90)]),
            true,
        )
    }

    #[test]
    fn open_is_shared_and_released() {
        let engine = Engine::default();
        let mut desc = descriptor();
        let a = desc.open(&engine).unwrap();
        let b = desc.open(&engine).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(engine.0.load(Ordering::Relaxed), 1);
        desc.close();
        assert!(desc.handle.is_some());
        desc.close();
        assert!(desc.handle.is_none());
        assert_eq!(desc.open_count(), 0);
    }

    #[test]
    fn guard_closes_on_all_paths() {
        let engine = Engine::default();
        let mut desc = descriptor();
        assert_eq!(desc.glyph_index(&engine, 'A' as u32), Ok(GlyphId(5)));
        assert_eq!(desc.open_count(), 0);
        assert_eq!(desc.glyph_index(&engine, 'Z' as u32), Err(GlcError::Parameter));
        assert_eq!(desc.open_count(), 0);
        assert_eq!(desc.glyph_index(&engine, 'a' as u32), Err(GlcError::Parameter));
        assert_eq!(engine.0.load(Ordering::Relaxed), 2);
    }
}
