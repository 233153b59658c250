// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Bitmap backend

use super::GlyphRequest;
use crate::conv::DPU;
use crate::engine::RasterRequest;
use crate::raster::PixelFormat;
use crate::{Flags, GlcError};

/// Rasterize and submit; nothing is cached
pub(super) fn render(mut request: GlyphRequest<'_>) -> Result<(), GlcError> {
    let transform = request.settings.pixel_transform();
    let raster = RasterRequest {
        transform,
        format: PixelFormat::Mono,
        hinting: request.settings.is_enabled(Flags::HINTING),
    };
    let glyph = request.glyph;

    let (bitmap, advance) = {
        let face = request.open_face()?;
        let dpu = DPU::from_units_per_em(face.units_per_em());
        let metrics = face.metrics(glyph).ok_or(GlcError::Resource)?;
        let bitmap = face.rasterize(glyph, &raster).ok_or_else(|| {
            log::warn!("bitmap: failed to rasterize {glyph:?}");
            GlcError::Resource
        })?;
        (bitmap, transform.apply(dpu.vec_to_em(metrics.advance)))
    };

    request.target.draw_bitmap(&bitmap, advance);
    Ok(())
}
