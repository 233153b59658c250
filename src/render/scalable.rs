// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Line and triangle backends

use super::{compile_and_call, CacheMode, GlyphRequest};
use crate::conv::DPU;
use crate::raster::{FillRule, PolygonMode};
use crate::tessellate::Flattener;
use crate::{GlcError, Transform};

/// Draw the flattened outline, in ems
pub(super) fn render(mut request: GlyphRequest<'_>, mode: CacheMode) -> Result<(), GlcError> {
    let key = request.key(mode);
    if request.replay(&key) {
        return Ok(());
    }

    let glyph = request.glyph;
    let tolerance = request.settings.tolerance;
    let (contours, advance) = {
        let face = request.open_face()?;
        let dpu = DPU::from_units_per_em(face.units_per_em());
        let metrics = face.metrics(glyph).ok_or(GlcError::Resource)?;
        let mut flattener = Flattener::new(Transform::scale(dpu.0, dpu.0), tolerance);
        if !face.outline(glyph, &mut flattener) {
            log::trace!("scalable: {glyph:?} has no outline");
        }
        (flattener.finish(), dpu.vec_to_em(metrics.advance))
    };

    let polygon = match mode {
        CacheMode::Line => PolygonMode::Boundary,
        _ => PolygonMode::Filled,
    };
    let GlyphRequest {
        settings,
        target,
        master,
        ..
    } = request;
    compile_and_call(settings, target, &mut master.cache, key, |target| {
        if !contours.is_empty() {
            target.draw_polygon(&contours, polygon, FillRule::OddWinding);
        }
        target.translate(advance);
    })
}
