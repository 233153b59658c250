// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Shared test fixtures: a call-counting glyph engine and an in-memory
//! catalog scanner

#![allow(dead_code)]

use glc::engine::{
    rasterize_outline, EngineFace, GlyphEngine, GlyphId, GlyphMetrics, OutlineSink, RasterRequest,
};
use glc::fonts::{CatalogScanner, FaceRecord};
use glc::raster::{Bitmap, RecordingHandle, RecordingTarget};
use glc::{CharSet, CodePoint, Context, GlcError, Rect, Vec2};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const UNITS_PER_EM: u16 = 1000;
pub const SPACE: CodePoint = 0x20;

/// Kerning between 'A' and 'V', in font units
pub const KERN_AV: f32 = -100.0;

#[derive(Debug, Default)]
pub struct Counters {
    pub opens: AtomicUsize,
    pub outlines: AtomicUsize,
    pub rasters: AtomicUsize,
}

impl Counters {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn outlines(&self) -> usize {
        self.outlines.load(Ordering::SeqCst)
    }

    pub fn rasters(&self) -> usize {
        self.rasters.load(Ordering::SeqCst)
    }

    /// Calls which produce glyph imagery
    pub fn glyph_calls(&self) -> usize {
        self.outlines() + self.rasters()
    }
}

/// An engine whose every face maps code `c` to glyph `c`
#[derive(Debug, Default)]
pub struct StubEngine {
    pub counters: Arc<Counters>,
}

impl GlyphEngine for StubEngine {
    fn open(&self, path: &Path, _: u32) -> Result<Arc<dyn EngineFace>, GlcError> {
        if path.extension().is_some_and(|ext| ext == "broken") {
            return Err(GlcError::Resource);
        }
        self.counters.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(StubFace {
            counters: self.counters.clone(),
        }))
    }
}

pub struct StubFace {
    counters: Arc<Counters>,
}

impl StubFace {
    /// A box with a curved top; nothing for space
    fn draw(&self, glyph: GlyphId, sink: &mut dyn OutlineSink) -> bool {
        if glyph.0 == SPACE {
            return false;
        }
        sink.move_to(Vec2(100.0, 0.0));
        sink.line_to(Vec2(400.0, 0.0));
        sink.line_to(Vec2(400.0, 600.0));
        sink.quad_to(Vec2(250.0, 800.0), Vec2(100.0, 600.0));
        sink.close();
        true
    }
}

impl EngineFace for StubFace {
    fn units_per_em(&self) -> u16 {
        UNITS_PER_EM
    }

    fn glyph_index(&self, code: CodePoint) -> Option<GlyphId> {
        Some(GlyphId(code))
    }

    fn metrics(&self, glyph: GlyphId) -> Option<GlyphMetrics> {
        let bounds = (glyph.0 != SPACE).then_some(Rect {
            min: Vec2(100.0, 0.0),
            max: Vec2(400.0, 700.0),
        });
        Some(GlyphMetrics {
            advance: Vec2(500.0, 0.0),
            bounds,
        })
    }

    fn max_metrics(&self) -> Option<GlyphMetrics> {
        Some(GlyphMetrics {
            advance: Vec2(600.0, 0.0),
            bounds: Some(Rect {
                min: Vec2(0.0, -200.0),
                max: Vec2(600.0, 800.0),
            }),
        })
    }

    fn kerning(&self, left: GlyphId, right: GlyphId) -> Option<f32> {
        (left.0 == 'A' as u32 && right.0 == 'V' as u32).then_some(KERN_AV)
    }

    fn outline(&self, glyph: GlyphId, sink: &mut dyn OutlineSink) -> bool {
        self.counters.outlines.fetch_add(1, Ordering::SeqCst);
        self.draw(glyph, sink)
    }

    fn rasterize(&self, glyph: GlyphId, request: &RasterRequest) -> Option<Bitmap> {
        self.counters.rasters.fetch_add(1, Ordering::SeqCst);
        // count once: bypass the counting outline
        struct Uncounted<'a>(&'a StubFace);
        impl EngineFace for Uncounted<'_> {
            fn units_per_em(&self) -> u16 {
                UNITS_PER_EM
            }
            fn glyph_index(&self, code: CodePoint) -> Option<GlyphId> {
                self.0.glyph_index(code)
            }
            fn metrics(&self, glyph: GlyphId) -> Option<GlyphMetrics> {
                self.0.metrics(glyph)
            }
            fn kerning(&self, _: GlyphId, _: GlyphId) -> Option<f32> {
                None
            }
            fn outline(&self, glyph: GlyphId, sink: &mut dyn OutlineSink) -> bool {
                self.0.draw(glyph, sink)
            }
            fn rasterize(&self, _: GlyphId, _: &RasterRequest) -> Option<Bitmap> {
                None
            }
        }
        rasterize_outline(&Uncounted(self), glyph, request)
    }
}

/// A scanner serving records registered per directory
#[derive(Debug, Default)]
pub struct StubScanner {
    dirs: Mutex<HashMap<PathBuf, Vec<FaceRecord>>>,
}

impl StubScanner {
    pub fn set(&self, dir: &Path, records: Vec<FaceRecord>) {
        self.dirs.lock().unwrap().insert(dir.to_path_buf(), records);
    }
}

impl CatalogScanner for StubScanner {
    fn scan(&self, dir: &Path) -> Result<Vec<FaceRecord>, GlcError> {
        Ok(self.dirs.lock().unwrap().get(dir).cloned().unwrap_or_default())
    }
}

/// A face record for `family`/`style` covering `first..=last`
pub fn face(dir: &Path, family: &str, style: &str, first: char, last: char) -> FaceRecord {
    FaceRecord {
        path: dir.join(format!("{family}-{style}.ttf")),
        index: 0,
        family: family.to_string(),
        style: Some(style.to_string()),
        vendor: Some("Test Foundry".to_string()),
        format: None,
        charset: Some(CharSet::from_ranges([(first as u32, last as u32)])),
        fixed_pitch: false,
    }
}

pub struct Fixture {
    pub context: Context,
    pub recording: RecordingHandle,
    pub engine: Arc<StubEngine>,
    pub scanner: Arc<StubScanner>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_target(RecordingTarget::new())
    }

    pub fn with_target(target: RecordingTarget) -> Self {
        let recording = target.handle();
        let engine = Arc::new(StubEngine::default());
        let scanner = Arc::new(StubScanner::default());
        let context = Context::with_engine(Box::new(target), engine.clone(), scanner.clone());
        Fixture {
            context,
            recording,
            engine,
            scanner,
        }
    }

    pub fn counters(&self) -> &Counters {
        &self.engine.counters
    }

    /// Register `records` under a fresh directory and add it as a catalog
    pub fn add_catalog(
        &mut self,
        records: impl FnOnce(&Path) -> Vec<FaceRecord>,
    ) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        self.scanner.set(dir.path(), records(dir.path()));
        self.context
            .add_catalog(dir.path(), glc::fonts::Position::Append)
            .unwrap();
        dir
    }
}

/// The "Mono" family: Regular and Bold, covering 'A'..='Z'
pub fn mono(dir: &Path) -> Vec<FaceRecord> {
    vec![
        face(dir, "Mono", "Regular", 'A', 'Z'),
        face(dir, "Mono", "Bold", 'A', 'Z'),
    ]
}

/// Assert two vectors agree to within rounding
#[track_caller]
pub fn assert_near(a: Vec2, b: Vec2) {
    assert!(
        (a.0 - b.0).abs() < 1e-4 && (a.1 - b.1).abs() < 1e-4,
        "{a:?} != {b:?}"
    );
}
