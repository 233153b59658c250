// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Raster targets
//!
//! A [`RasterTarget`] receives the drawing commands produced by the render
//! backends: bitmaps, textured quads and polygons, plus compiled command
//! lists which can be replayed by handle. An OpenGL binding would implement
//! this trait with `glBitmap`, `glTexImage2D`, the GLU tessellator and
//! display lists.
//!
//! [`RecordingTarget`] is a headless implementation which records commands
//! into a shared [`Recording`].
//!
//! # Example
//!
//! ```
//! use glc::raster::{Command, RecordingTarget};
//! use glc::{Context, RenderStyle};
//!
//! let target = RecordingTarget::new();
//! let log = target.handle();
//! let mut context = Context::new(Box::new(target));
//! context.settings_mut().render_style = RenderStyle::Line;
//! // ... add a catalog, then:
//! context.render_char('A' as u32);
//! for command in log.commands() {
//!     if let Command::CallList(list) = command {
//!         println!("replayed {list:?}");
//!     }
//! }
//! ```

use crate::tessellate::Contours;
use crate::{GlcError, Vec2};
use easy_cast::*;
use std::result::Result;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Texture object handle
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// Compiled command list handle
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListId(pub u32);

/// Pixel format of a [`Bitmap`]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// One byte per pixel, either 0 or 255
    #[default]
    Mono,
    /// One byte of coverage (luminance/alpha) per pixel
    Gray,
}

/// A glyph image
///
/// Rows are stored bottom to top (y pointing up, as in OpenGL).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    /// Pixel offset of the lower-left corner relative to the pen position
    pub origin: (i32, i32),
    pub format: PixelFormat,
    /// Row-major data, length `width * height`
    pub data: Vec<u8>,
}

impl Bitmap {
    /// A zero-sized bitmap
    pub fn empty(format: PixelFormat) -> Self {
        Bitmap {
            format,
            ..Default::default()
        }
    }

    /// True if no pixels are covered
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Get a pixel, `y` counting from the bottom row
    pub fn pixel(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.data[usize::conv(y * self.width + x)]
    }

    /// Halve both dimensions by averaging 2×2 blocks
    ///
    /// Used to build mipmap chains. Dimensions round up; a 1×1 bitmap stays
    /// 1×1.
    pub fn downsample(&self) -> Bitmap {
        let width = self.width.div_ceil(2).max(1);
        let height = self.height.div_ceil(2).max(1);
        let mut data = Vec::with_capacity(usize::conv(width * height));
        for y in 0..height {
            for x in 0..width {
                let sum: u32 = [(0, 0), (1, 0), (0, 1), (1, 1)]
                    .iter()
                    .map(|(dx, dy)| u32::from(self.pixel(2 * x + dx, 2 * y + dy)))
                    .sum();
                data.push(((sum + 2) / 4).cast());
            }
        }
        Bitmap {
            width,
            height,
            origin: (self.origin.0 / 2, self.origin.1 / 2),
            format: self.format,
            data,
        }
    }
}

/// Polygon drawing mode
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PolygonMode {
    /// Draw contour boundaries as line loops
    Boundary,
    /// Fill the interior
    Filled,
}

/// Winding rule for polygon tessellation
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum FillRule {
    /// Inside if the winding number is odd
    #[default]
    OddWinding,
    /// Inside if the winding number is non-zero
    NonZero,
}

/// A textured quad
///
/// Vertices are listed counter-clockwise from the lower-left corner.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TexturedQuad {
    pub texture: TextureId,
    pub vertices: [Vec2; 4],
    pub tex_coords: [Vec2; 4],
}

/// Consumer of drawing commands
///
/// All positions are relative to the current pen position; [`Self::translate`]
/// moves the pen.
pub trait RasterTarget: Send {
    /// Draw a bitmap at its origin, then advance the pen
    fn draw_bitmap(&mut self, bitmap: &Bitmap, advance: Vec2);

    /// Move the pen
    fn translate(&mut self, offset: Vec2);

    /// Probe whether a texture of this size could be allocated
    fn texture_size_supported(&mut self, width: u32, height: u32) -> bool;

    /// Allocate a texture
    fn create_texture(&mut self, width: u32, height: u32, mipmap: bool)
        -> Result<TextureId, GlcError>;

    /// Upload `image` into mip level `level` at `offset` (in texels)
    fn upload_texture(
        &mut self,
        texture: TextureId,
        level: u32,
        offset: (u32, u32),
        image: &Bitmap,
    );

    /// Release a texture
    fn delete_texture(&mut self, texture: TextureId);

    /// Draw a textured quad
    fn draw_textured_quad(&mut self, quad: &TexturedQuad);

    /// Tessellate and draw a polygon
    fn draw_polygon(&mut self, contours: &Contours, mode: PolygonMode, rule: FillRule);

    /// Start compiling a command list
    ///
    /// Commands until [`Self::end_list`] are recorded into the list and not
    /// executed.
    fn begin_list(&mut self) -> Result<ListId, GlcError>;

    /// Finish compiling
    fn end_list(&mut self);

    /// Execute a compiled list
    fn call_list(&mut self, list: ListId);

    /// Release a compiled list
    fn delete_list(&mut self, list: ListId);
}

/// A recorded command
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Bitmap {
        width: u32,
        height: u32,
        origin: (i32, i32),
        advance: Vec2,
    },
    Translate(Vec2),
    CreateTexture {
        texture: TextureId,
        width: u32,
        height: u32,
        mipmap: bool,
    },
    UploadTexture {
        texture: TextureId,
        level: u32,
        offset: (u32, u32),
        size: (u32, u32),
    },
    DeleteTexture(TextureId),
    TexturedQuad(TexturedQuad),
    Polygon {
        mode: PolygonMode,
        rule: FillRule,
        contours: usize,
        vertices: usize,
    },
    CallList(ListId),
    DeleteList(ListId),
}

/// Commands recorded by a [`RecordingTarget`]
#[derive(Debug)]
pub struct Recording {
    commands: Vec<Command>,
    lists: HashMap<ListId, Vec<Command>>,
    textures: HashMap<TextureId, (u32, u32)>,
    compiling: Option<(ListId, Vec<Command>)>,
    next_id: u32,
    max_texture_size: u32,
}

impl Recording {
    fn push(&mut self, command: Command) {
        match self.compiling {
            Some((_, ref mut list)) => list.push(command),
            None => self.commands.push(command),
        }
    }

    /// Executed commands, in order
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Executed commands with list calls expanded
    pub fn replayed(&self) -> Vec<Command> {
        let mut out = Vec::new();
        for command in &self.commands {
            match command {
                Command::CallList(id) => {
                    if let Some(list) = self.lists.get(id) {
                        out.extend(list.iter().cloned());
                    }
                }
                other => out.push(other.clone()),
            }
        }
        out
    }

    /// Number of live compiled lists
    pub fn live_lists(&self) -> usize {
        self.lists.len()
    }

    /// Number of live textures
    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    /// Forget executed commands (lists and textures are kept)
    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

/// Shared access to a [`Recording`]
#[derive(Clone, Debug)]
pub struct RecordingHandle(Arc<Mutex<Recording>>);

impl RecordingHandle {
    /// Lock the recording
    pub fn lock(&self) -> MutexGuard<'_, Recording> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the executed commands
    pub fn commands(&self) -> Vec<Command> {
        self.lock().commands.clone()
    }

    /// See [`Recording::replayed`]
    pub fn replayed(&self) -> Vec<Command> {
        self.lock().replayed()
    }

    /// See [`Recording::clear`]
    pub fn clear(&self) {
        self.lock().clear();
    }
}

/// A headless [`RasterTarget`]
#[derive(Debug)]
pub struct RecordingTarget(Arc<Mutex<Recording>>);

impl Default for RecordingTarget {
    fn default() -> Self {
        RecordingTarget::with_max_texture_size(4096)
    }
}

impl RecordingTarget {
    /// Construct with a 4096 texel texture size limit
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct with a texture size limit
    ///
    /// Textures larger than `size` in either dimension are refused.
    pub fn with_max_texture_size(size: u32) -> Self {
        RecordingTarget(Arc::new(Mutex::new(Recording {
            commands: vec![],
            lists: HashMap::new(),
            textures: HashMap::new(),
            compiling: None,
            next_id: 1,
            max_texture_size: size,
        })))
    }

    /// Get a handle to inspect the recording
    pub fn handle(&self) -> RecordingHandle {
        RecordingHandle(self.0.clone())
    }

    fn lock(&self) -> MutexGuard<'_, Recording> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RasterTarget for RecordingTarget {
    fn draw_bitmap(&mut self, bitmap: &Bitmap, advance: Vec2) {
        self.lock().push(Command::Bitmap {
            width: bitmap.width,
            height: bitmap.height,
            origin: bitmap.origin,
            advance,
        });
    }

    fn translate(&mut self, offset: Vec2) {
        self.lock().push(Command::Translate(offset));
    }

    fn texture_size_supported(&mut self, width: u32, height: u32) -> bool {
        let max = self.lock().max_texture_size;
        width <= max && height <= max
    }

    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        mipmap: bool,
    ) -> Result<TextureId, GlcError> {
        let mut rec = self.lock();
        if width > rec.max_texture_size || height > rec.max_texture_size {
            return Err(GlcError::Resource);
        }
        let texture = TextureId(rec.next_id);
        rec.next_id += 1;
        rec.textures.insert(texture, (width, height));
        rec.push(Command::CreateTexture {
            texture,
            width,
            height,
            mipmap,
        });
        Ok(texture)
    }

    fn upload_texture(
        &mut self,
        texture: TextureId,
        level: u32,
        offset: (u32, u32),
        image: &Bitmap,
    ) {
        self.lock().push(Command::UploadTexture {
            texture,
            level,
            offset,
            size: (image.width, image.height),
        });
    }

    fn delete_texture(&mut self, texture: TextureId) {
        let mut rec = self.lock();
        rec.textures.remove(&texture);
        rec.push(Command::DeleteTexture(texture));
    }

    fn draw_textured_quad(&mut self, quad: &TexturedQuad) {
        self.lock().push(Command::TexturedQuad(*quad));
    }

    fn draw_polygon(&mut self, contours: &Contours, mode: PolygonMode, rule: FillRule) {
        self.lock().push(Command::Polygon {
            mode,
            rule,
            contours: contours.len(),
            vertices: contours.vertex_count(),
        });
    }

    fn begin_list(&mut self) -> Result<ListId, GlcError> {
        let mut rec = self.lock();
        if rec.compiling.is_some() {
            return Err(GlcError::State);
        }
        let list = ListId(rec.next_id);
        rec.next_id += 1;
        rec.compiling = Some((list, vec![]));
        Ok(list)
    }

    fn end_list(&mut self) {
        let mut rec = self.lock();
        if let Some((list, commands)) = rec.compiling.take() {
            rec.lists.insert(list, commands);
        }
    }

    fn call_list(&mut self, list: ListId) {
        self.lock().push(Command::CallList(list));
    }

    fn delete_list(&mut self, list: ListId) {
        let mut rec = self.lock();
        rec.lists.remove(&list);
        rec.push(Command::DeleteList(list));
    }
}
