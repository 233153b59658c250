// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Outline flattening and filling
//!
//! Curves are approximated by de Casteljau subdivision: a segment is bisected
//! at its parametric midpoint while any control point lies further than the
//! tolerance from the chord. [`Flatten`] yields the resulting vertices
//! lazily. [`Flattener`] is an [`OutlineSink`] collecting whole glyph outlines
//! into [`Contours`], which are drawn by the scalable render styles or filled
//! (odd winding rule) by [`fill_even_odd`].

use crate::engine::OutlineSink;
use crate::raster::{Bitmap, PixelFormat};
use crate::{Rect, Transform, Vec2};
use easy_cast::*;
use smallvec::SmallVec;

/// Chordal tolerance used when rasterizing, in pixels
pub const PIXEL_TOLERANCE: f32 = 0.2;

/// Subdivision depth limit; 2^16 segments per curve is plenty
const MAX_DEPTH: u8 = 16;

/// Largest bitmap (in pixels) [`fill_even_odd`] will produce
const MAX_PIXELS: f32 = 4096.0 * 4096.0;

#[derive(Clone, Copy, Debug)]
struct Segment {
    points: [Vec2; 4],
    len: u8,
    depth: u8,
}

impl Segment {
    fn controls(&self) -> &[Vec2] {
        &self.points[..usize::from(self.len)]
    }

    fn is_flat(&self, tolerance_sq: f32) -> bool {
        let pts = self.controls();
        let (first, last) = (pts[0], pts[pts.len() - 1]);
        let chord = last - first;
        let chord_sq = chord.length_sq();
        pts[1..pts.len() - 1].iter().all(|p| {
            let d = *p - first;
            let dist_sq = if chord_sq <= f32::EPSILON {
                d.length_sq()
            } else {
                let cross = chord.cross(d);
                cross * cross / chord_sq
            };
            dist_sq <= tolerance_sq
        })
    }

    /// Split at t = 0.5
    fn bisect(&self) -> (Segment, Segment) {
        let n = usize::from(self.len);
        let mut left = [Vec2::ZERO; 4];
        let mut right = [Vec2::ZERO; 4];
        let mut work = self.points;
        for i in 0..n {
            left[i] = work[0];
            right[n - 1 - i] = work[n - 1 - i];
            for j in 0..n - 1 - i {
                work[j] = work[j].lerp(work[j + 1], 0.5);
            }
        }
        let depth = self.depth + 1;
        (
            Segment {
                points: left,
                len: self.len,
                depth,
            },
            Segment {
                points: right,
                len: self.len,
                depth,
            },
        )
    }
}

/// Lazily flattened conic or cubic Bézier curve
///
/// Yields the vertices of a polyline approximating the curve, excluding the
/// start point and ending with the end point. The sequence is finite and is
/// consumed by iteration.
#[derive(Clone, Debug)]
pub struct Flatten {
    stack: SmallVec<[Segment; 16]>,
    tolerance_sq: f32,
}

impl Flatten {
    /// Construct from 2 (line), 3 (conic) or 4 (cubic) control points
    ///
    /// Other lengths yield an empty sequence.
    pub fn new(points: &[Vec2], tolerance: f32) -> Self {
        let mut stack = SmallVec::new();
        if (2..=4).contains(&points.len()) {
            let mut array = [Vec2::ZERO; 4];
            array[..points.len()].copy_from_slice(points);
            stack.push(Segment {
                points: array,
                len: points.len().cast(),
                depth: 0,
            });
        }
        Flatten {
            stack,
            tolerance_sq: tolerance * tolerance,
        }
    }
}

impl Iterator for Flatten {
    type Item = Vec2;

    fn next(&mut self) -> Option<Vec2> {
        loop {
            let segment = self.stack.pop()?;
            if segment.depth >= MAX_DEPTH || segment.is_flat(self.tolerance_sq) {
                return Some(segment.controls()[usize::from(segment.len) - 1]);
            }
            let (first, second) = segment.bisect();
            self.stack.push(second);
            self.stack.push(first);
        }
    }
}

/// A set of closed polygonal contours
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Contours {
    points: Vec<Vec2>,
    ends: Vec<usize>,
}

impl Contours {
    /// Number of contours
    pub fn len(&self) -> usize {
        self.ends.len()
    }

    /// True if there are no contours
    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    /// Total number of vertices
    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }

    /// Iterate over contours (each implicitly closed)
    pub fn iter(&self) -> impl Iterator<Item = &[Vec2]> + '_ {
        let mut start = 0;
        self.ends.iter().map(move |&end| {
            let contour = &self.points[start..end];
            start = end;
            contour
        })
    }

    /// Bounding box of all vertices
    pub fn bounds(&self) -> Option<Rect> {
        let first = *self.points.first()?;
        let mut rect = Rect {
            min: first,
            max: first,
        };
        for p in &self.points[1..] {
            rect.min = rect.min.min(*p);
            rect.max = rect.max.max(*p);
        }
        Some(rect)
    }

    /// Append a contour
    ///
    /// Contours with fewer than two vertices are discarded.
    pub fn push(&mut self, contour: &[Vec2]) {
        if contour.len() >= 2 {
            self.points.extend_from_slice(contour);
            self.ends.push(self.points.len());
        }
    }
}

/// An [`OutlineSink`] flattening curves into [`Contours`]
///
/// Input coordinates are mapped through `transform` before flattening, thus
/// the tolerance is in output units.
pub struct Flattener {
    transform: Transform,
    tolerance: f32,
    contours: Contours,
    start: usize,
    pen: Vec2,
}

impl Flattener {
    /// Construct
    pub fn new(transform: Transform, tolerance: f32) -> Self {
        Flattener {
            transform,
            tolerance,
            contours: Contours::default(),
            start: 0,
            pen: Vec2::ZERO,
        }
    }

    fn curve(&mut self, ctrl: &[Vec2]) {
        let mut points: SmallVec<[Vec2; 4]> = SmallVec::new();
        points.push(self.pen);
        points.extend(ctrl.iter().map(|p| self.transform.apply(*p)));
        self.contours
            .points
            .extend(Flatten::new(&points, self.tolerance));
        self.pen = points[points.len() - 1];
    }

    fn end_contour(&mut self) {
        let points = &mut self.contours.points;
        if points.len() > self.start + 1 && points.last() == points.get(self.start) {
            points.pop();
        }
        if points.len() >= self.start + 2 {
            self.contours.ends.push(points.len());
        } else {
            points.truncate(self.start);
        }
        self.start = points.len();
    }

    /// Finish and take the collected contours
    pub fn finish(mut self) -> Contours {
        self.end_contour();
        self.contours
    }
}

impl OutlineSink for Flattener {
    fn move_to(&mut self, to: Vec2) {
        self.end_contour();
        self.pen = self.transform.apply(to);
        self.contours.points.push(self.pen);
    }

    fn line_to(&mut self, to: Vec2) {
        self.pen = self.transform.apply(to);
        self.contours.points.push(self.pen);
    }

    fn quad_to(&mut self, ctrl: Vec2, to: Vec2) {
        self.curve(&[ctrl, to]);
    }

    fn cubic_to(&mut self, ctrl0: Vec2, ctrl1: Vec2, to: Vec2) {
        self.curve(&[ctrl0, ctrl1, to]);
    }

    fn close(&mut self) {
        self.end_contour();
    }
}

/// Fill contours with the odd winding rule
///
/// Coordinates are in pixels with y pointing up. The result covers the pixel
/// bounding box of the contours. [`PixelFormat::Mono`] samples each pixel
/// centre; [`PixelFormat::Gray`] averages a 4×4 grid of samples.
///
/// Returns `None` if the bitmap would be unreasonably large.
pub fn fill_even_odd(contours: &Contours, format: PixelFormat) -> Option<Bitmap> {
    let Some(bounds) = contours.bounds() else {
        return Some(Bitmap::empty(format));
    };
    let x0 = bounds.min.0.floor();
    let y0 = bounds.min.1.floor();
    let w = (bounds.max.0.ceil() - x0).max(1.0);
    let h = (bounds.max.1.ceil() - y0).max(1.0);
    if !(w * h <= MAX_PIXELS) {
        log::warn!("fill_even_odd: refusing to fill {w}×{h} pixels");
        return None;
    }
    let (width, height): (u32, u32) = (w.cast_trunc(), h.cast_trunc());

    let samples: u32 = match format {
        PixelFormat::Mono => 1,
        PixelFormat::Gray => 4,
    };
    let step = 1.0 / samples as f32;
    let mut hits = vec![0u16; (width * height).cast()];
    let mut crossings: Vec<f32> = Vec::new();

    for row in 0..height {
        for sub_y in 0..samples {
            let y = y0 + row as f32 + (sub_y as f32 + 0.5) * step;
            crossings.clear();
            for contour in contours.iter() {
                let n = contour.len();
                for i in 0..n {
                    let (a, b) = (contour[i], contour[(i + 1) % n]);
                    if (a.1 <= y) != (b.1 <= y) {
                        crossings.push(a.0 + (y - a.1) * (b.0 - a.0) / (b.1 - a.1));
                    }
                }
            }
            crossings.sort_unstable_by(f32::total_cmp);

            for span in crossings.chunks_exact(2) {
                // first sample column whose centre lies in [span[0], span[1])
                let first = ((span[0] - x0) * samples as f32 - 0.5).ceil().max(0.0);
                let last = ((span[1] - x0) * samples as f32 - 0.5).ceil();
                let last = last.min((width * samples) as f32);
                let (first, last): (u32, u32) = (first.cast_trunc(), last.cast_trunc());
                for col in first..last {
                    let index: usize = (row * width + col / samples).cast();
                    hits[index] += 1;
                }
            }
        }
    }

    let total = samples * samples;
    let data = hits
        .into_iter()
        .map(|n| {
            let n = u32::from(n);
            match format {
                PixelFormat::Mono => 255 * u8::from(n > 0),
                PixelFormat::Gray => ((n * 255 + total / 2) / total).cast(),
            }
        })
        .collect();

    Some(Bitmap {
        width,
        height,
        origin: (x0.cast_trunc(), y0.cast_trunc()),
        format,
        data,
    })
}
