// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Texture backend
//!
//! Glyphs are rasterized with coverage into a square cell, scaled so that
//! the bounding box fits with a one texel border. The quad covers the
//! bounding box in ems.

use super::{compile_and_call, CacheMode, GlyphRequest};
use crate::conv::DPU;
use crate::engine::RasterRequest;
use crate::raster::{Bitmap, PixelFormat, RasterTarget, TextureId, TexturedQuad};
use crate::{Flags, GlcError, Rect, Settings, Transform, Vec2};
use easy_cast::*;
use std::result::Result;

struct CellGlyph {
    /// Cell-sized image, the glyph's used area and its extent in ems
    image: Option<(Bitmap, (u32, u32), Rect)>,
    advance: Vec2,
}

/// Atlas cell size in texels
pub(super) fn cell_size(settings: &Settings) -> u32 {
    settings.texture_cell.clamp(8, 256).next_power_of_two()
}

fn rasterize(request: &mut GlyphRequest<'_>, cell: u32) -> Result<CellGlyph, GlcError> {
    let glyph = request.glyph;
    let hinting = request.settings.is_enabled(Flags::HINTING);
    let face = request.open_face()?;
    let dpu = DPU::from_units_per_em(face.units_per_em());
    let metrics = face.metrics(glyph).ok_or(GlcError::Resource)?;
    let advance = dpu.vec_to_em(metrics.advance);

    let Some(bounds) = metrics.bounds else {
        return Ok(CellGlyph {
            image: None,
            advance,
        });
    };
    let size = dpu.vec_to_em(bounds.size());
    let extent = size.0.max(size.1);
    if extent <= 0.0 {
        return Ok(CellGlyph {
            image: None,
            advance,
        });
    }

    let scale = f32::conv(cell - 2) / extent;
    let raster = RasterRequest {
        transform: Transform::scale(scale, scale),
        format: PixelFormat::Gray,
        hinting,
    };
    let bitmap = face.rasterize(glyph, &raster).ok_or(GlcError::Resource)?;
    if bitmap.is_empty() {
        return Ok(CellGlyph {
            image: None,
            advance,
        });
    }
    if bitmap.width > cell || bitmap.height > cell {
        log::warn!(
            "texture: {glyph:?} rasterized to {}x{}, exceeding the {cell} texel cell",
            bitmap.width,
            bitmap.height
        );
        return Err(GlcError::Resource);
    }

    let min = Vec2(bitmap.origin.0.cast(), bitmap.origin.1.cast()) * (1.0 / scale);
    let extent = Vec2(bitmap.width.cast(), bitmap.height.cast()) * (1.0 / scale);
    let used = (bitmap.width, bitmap.height);
    let rect = Rect {
        min,
        max: min + extent,
    };
    Ok(CellGlyph {
        image: Some((pad_to_cell(&bitmap, cell), used, rect)),
        advance,
    })
}

/// Copy into the lower-left corner of a cleared `cell`×`cell` image
fn pad_to_cell(bitmap: &Bitmap, cell: u32) -> Bitmap {
    let mut data = vec![0; usize::conv(cell * cell)];
    for y in 0..bitmap.height {
        let src = usize::conv(y * bitmap.width);
        let dst = usize::conv(y * cell);
        let len = usize::conv(bitmap.width);
        data[dst..dst + len].copy_from_slice(&bitmap.data[src..src + len]);
    }
    Bitmap {
        width: cell,
        height: cell,
        origin: (0, 0),
        format: PixelFormat::Gray,
        data,
    }
}

/// Upload a cell image, with its mipmap chain if requested
fn upload(
    target: &mut dyn RasterTarget,
    texture: TextureId,
    offset: (u32, u32),
    image: Bitmap,
    mipmap: bool,
) {
    target.upload_texture(texture, 0, offset, &image);
    if !mipmap {
        return;
    }
    let mut image = image;
    let mut level = 0;
    while image.width > 1 || image.height > 1 {
        image = image.downsample();
        level += 1;
        let offset = (offset.0 >> level, offset.1 >> level);
        target.upload_texture(texture, level, offset, &image);
    }
}

fn quad(
    texture: TextureId,
    rect: Rect,
    origin: (u32, u32),
    used: (u32, u32),
    size: u32,
) -> TexturedQuad {
    let size = f32::conv(size);
    let t0 = Vec2(origin.0.cast(), origin.1.cast()) * (1.0 / size);
    let t1 = t0 + Vec2(used.0.cast(), used.1.cast()) * (1.0 / size);
    TexturedQuad {
        texture,
        vertices: rect.corners(),
        tex_coords: Rect { min: t0, max: t1 }.corners(),
    }
}

/// Draw through the texture atlas
pub(super) fn render(mut request: GlyphRequest<'_>) -> Result<(), GlcError> {
    let key = request.key(CacheMode::Texture);
    let atlas_key = (request.master.id(), key);
    if request.replay(&key) {
        request.atlas.touch(&atlas_key);
        return Ok(());
    }

    let cell = cell_size(request.settings);
    let mipmap = request.settings.is_enabled(Flags::MIPMAP);
    let glyph = rasterize(&mut request, cell)?;
    let advance = glyph.advance;

    let GlyphRequest {
        settings,
        target,
        atlas,
        master,
        ..
    } = request;

    let Some((image, used, rect)) = glyph.image else {
        return compile_and_call(settings, target, &mut master.cache, key, |target| {
            target.translate(advance);
        });
    };

    if !settings.is_enabled(Flags::GL_OBJECTS) {
        let texture = atlas.scratch(target, cell, mipmap)?;
        upload(target, texture, (0, 0), image, mipmap);
        target.draw_textured_quad(&quad(texture, rect, (0, 0), used, cell));
        target.translate(advance);
        return Ok(());
    }

    let (texture, index) = atlas.allocate(target, atlas_key, cell, mipmap)?;
    let origin = atlas.cell_origin(index);
    upload(target, texture, origin, image, mipmap);
    let textured = quad(texture, rect, origin, used, atlas.size());
    let result = compile_and_call(settings, target, &mut master.cache, key, |target| {
        target.draw_textured_quad(&textured);
        target.translate(advance);
    });
    if result.is_err() {
        atlas.release(&atlas_key);
    }
    result
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn padding_keeps_rows() {
        let bitmap = Bitmap {
            width: 2,
            height: 2,
            origin: (3, -1),
            format: PixelFormat::Gray,
            data: vec![1, 2, 3, 4],
        };
        let cell = pad_to_cell(&bitmap, 8);
        assert_eq!(cell.pixel(0, 0), 1);
        assert_eq!(cell.pixel(1, 1), 4);
        assert_eq!(cell.pixel(2, 0), 0);
        assert_eq!(cell.data.len(), 64);
    }

    #[test]
    fn quad_maps_cell() {
        let rect = Rect {
            min: Vec2(0.0, -0.25),
            max: Vec2(0.5, 0.75),
        };
        let q = quad(TextureId(1), rect, (64, 128), (32, 64), 256);
        assert_eq!(q.vertices[0], Vec2(0.0, -0.25));
        assert_eq!(q.tex_coords[0], Vec2(0.25, 0.5));
        assert_eq!(q.tex_coords[2], Vec2(0.375, 0.75));
    }
}
