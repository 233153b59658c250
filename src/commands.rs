// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Commands on the current context
//!
//! These functions follow the conventions of the GLC API: identifiers and
//! indices are plain integers, failures are recorded in the calling
//! thread's pending error (see [`crate::error::get_error`]) and a neutral
//! value is returned.
//!
//! Arguments are validated before the current context is looked up, thus
//! a bad argument yields [`ErrorCode::Parameter`](crate::ErrorCode) even
//! when no context is current. Otherwise a command without a current
//! context, or one issued from within the unmapped-code handler, yields
//! [`ErrorCode::State`](crate::ErrorCode).

use crate::error::record;
use crate::fonts::{FontId, Master, Position};
use crate::global::with_current;
use crate::raster::{ListId, TextureId};
use crate::{Callback, CharMetric, CodePoint, Context, Flags, GlcError, RenderStyle, Transform};
use easy_cast::Cast;
use std::path::{Path, PathBuf};

fn font_id(font: i32) -> Result<FontId, GlcError> {
    u32::try_from(font)
        .ok()
        .and_then(FontId::new)
        .ok_or(GlcError::Parameter)
}

fn index(index: i32) -> Result<usize, GlcError> {
    usize::try_from(index).map_err(|_| GlcError::Parameter)
}

/// Convert a count or identifier to the integer returned by commands
fn to_int(n: impl Cast<i32>) -> Result<i32, GlcError> {
    n.try_cast().map_err(|_| GlcError::Resource)
}

fn master_at(cx: &Context, index: usize) -> Result<&Master, GlcError> {
    cx.masters().get(index).ok_or(GlcError::Parameter)
}

/// Run `f` on the current context, recording any error
fn run<R>(f: impl FnOnce(&mut Context) -> Result<R, GlcError>) -> Option<R> {
    record(with_current(f))
}

// Catalogs

/// Append a catalog directory
pub fn append_catalog(path: impl AsRef<Path>) {
    run(|cx| cx.add_catalog(path, Position::Append));
}

/// Prepend a catalog directory
pub fn prepend_catalog(path: impl AsRef<Path>) {
    run(|cx| cx.add_catalog(path, Position::Prepend));
}

/// Remove the `index`-th catalog
pub fn remove_catalog(i: i32) {
    record(index(i).and_then(|i| with_current(|cx| cx.remove_catalog(i))));
}

/// Number of catalogs
pub fn catalog_count() -> i32 {
    run(|cx| to_int(cx.catalogs().len())).unwrap_or(0)
}

/// Path of the `index`-th catalog
pub fn catalog_list(i: i32) -> Option<PathBuf> {
    record(index(i).and_then(|i| {
        with_current(|cx| cx.catalogs().get(i).cloned().ok_or(GlcError::Parameter))
    }))
}

// Fonts

/// The lowest unused font identifier
pub fn gen_font_id() -> i32 {
    run(|cx| to_int(cx.gen_font_id().get())).unwrap_or(0)
}

/// True if `font` names a font
pub fn is_font(font: i32) -> bool {
    let Ok(id) = font_id(font) else {
        return false;
    };
    run(|cx| Ok(cx.is_font(id))).unwrap_or(false)
}

/// Create font `font` from the `master`-th master; returns `font` or 0
pub fn new_font_from_master(font: i32, master: i32) -> i32 {
    let args = font_id(font).and_then(|f| Ok((f, index(master)?)));
    record(args.and_then(|(font, master)| {
        with_current(|cx| {
            let master = master_at(cx, master)?.id();
            to_int(cx.new_font_from_master(font, master)?.get())
        })
    }))
    .unwrap_or(0)
}

/// Create font `font` from the master of `family`; returns `font` or 0
pub fn new_font_from_family(font: i32, family: &str) -> i32 {
    record(font_id(font).and_then(|font| {
        with_current(|cx| to_int(cx.new_font_from_family(font, family)?.get()))
    }))
    .unwrap_or(0)
}

/// Delete a font
pub fn delete_font(font: i32) {
    record(font_id(font).and_then(|font| with_current(|cx| cx.delete_font(font))));
}

/// Append a font to the current font list
pub fn append_font(font: i32) {
    record(font_id(font).and_then(|font| with_current(|cx| cx.append_font(font))));
}

/// Make `font` the only current font; 0 clears the current font list
pub fn font(font: i32) {
    let id = match font {
        0 => Ok(None),
        _ => font_id(font).map(Some),
    };
    record(id.and_then(|id| with_current(|cx| cx.font(id))));
}

/// Select face `style` of `font`, or of each current font if `font` is 0
///
/// Returns false if some font has no such face.
pub fn font_face(font: i32, style: &str) -> bool {
    let id = match font {
        0 => Ok(None),
        _ => font_id(font).map(Some),
    };
    record(id.and_then(|id| with_current(|cx| cx.set_font_face(id, style)))).unwrap_or(false)
}

/// Style of the face selected by `font`
pub fn get_font_face(font: i32) -> Option<String> {
    record(font_id(font).and_then(|font| with_current(|cx| cx.font_face(font).map(str::to_string))))
}

/// Remap `code` in `font` to the character `name`, or unmap it
pub fn font_map(font: i32, code: CodePoint, name: Option<&str>) {
    record(font_id(font).and_then(|font| with_current(|cx| cx.set_font_map(font, code, name))));
}

/// Name of the character `font` draws for `code`
pub fn get_font_map(font: i32, code: CodePoint) -> Option<&'static str> {
    record(font_id(font).and_then(|font| with_current(|cx| cx.font_map(font, code)))).flatten()
}

/// Name of the `index`-th character mapped by `font`
pub fn font_char_list(font: i32, i: i32) -> Option<&'static str> {
    let args = font_id(font).and_then(|f| Ok((f, index(i)?)));
    record(args.and_then(|(font, i)| {
        with_current(|cx| {
            if i >= cx.font_char_count(font)? {
                return Err(GlcError::Parameter);
            }
            cx.font_char_name(font, i)
        })
    }))
    .flatten()
}

/// Number of characters mapped by `font`
pub fn font_char_count(font: i32) -> i32 {
    record(font_id(font).and_then(|font| with_current(|cx| to_int(cx.font_char_count(font)?))))
        .unwrap_or(0)
}

/// Identifiers of all fonts
pub fn font_list() -> Vec<i32> {
    run(|cx| cx.fonts().iter().map(|f| to_int(f.id().get())).collect()).unwrap_or_default()
}

/// Identifiers of the current fonts, in priority order
pub fn current_font_list() -> Vec<i32> {
    run(|cx| cx.current_fonts().iter().map(|f| to_int(f.get())).collect()).unwrap_or_default()
}

// Masters

/// Number of masters
pub fn master_count() -> i32 {
    run(|cx| to_int(cx.masters().len())).unwrap_or(0)
}

/// Run `f` on the `master`-th master with a validated argument
fn with_master<A, R>(
    master: i32,
    arg: Result<A, GlcError>,
    f: impl FnOnce(&Master, A) -> Result<R, GlcError>,
) -> Option<R> {
    let args = index(master).and_then(|i| Ok((i, arg?)));
    record(args.and_then(|(i, arg)| with_current(|cx| f(master_at(cx, i)?, arg))))
}

/// Family name of the `master`-th master
pub fn master_family(master: i32) -> Option<String> {
    with_master(master, Ok(()), |m, ()| Ok(m.family().to_string()))
}

/// Vendor of the `master`-th master
pub fn master_vendor(master: i32) -> Option<String> {
    with_master(master, Ok(()), |m, ()| Ok(m.vendor().to_string()))
}

/// Format label of the `master`-th master
pub fn master_format(master: i32) -> Option<String> {
    with_master(master, Ok(()), |m, ()| Ok(m.format().to_string()))
}

/// Number of faces of the `master`-th master
pub fn master_face_count(master: i32) -> i32 {
    with_master(master, Ok(()), |m, ()| to_int(m.face_count())).unwrap_or(0)
}

/// Style of the `face`-th face of the `master`-th master
pub fn master_face_list(master: i32, face: i32) -> Option<String> {
    let face = index(face);
    with_master(master, face, |m, face| {
        m.faces()
            .get(face)
            .map(|f| f.style().to_string())
            .ok_or(GlcError::Parameter)
    })
}

/// Number of characters of the `master`-th master
pub fn master_char_count(master: i32) -> i32 {
    with_master(master, Ok(()), |m, ()| to_int(m.char_count())).unwrap_or(0)
}

/// Name of the `index`-th character of the `master`-th master
pub fn master_char_list(master: i32, i: i32) -> Option<&'static str> {
    with_master(master, index(i), |m, i| {
        m.char_name_by_index(i).ok_or(GlcError::Parameter)
    })
}

/// Name of `code` if some face of the `master`-th master maps it
pub fn master_map(master: i32, code: CodePoint) -> Option<&'static str> {
    with_master(master, Ok(()), |m, ()| Ok(m.char_name(code))).flatten()
}

/// Lowest and highest codes mapped by the `master`-th master
pub fn master_mapped_range(master: i32) -> Option<(CodePoint, CodePoint)> {
    with_master(master, Ok(()), |m, ()| Ok(m.min_mapped_code().zip(m.max_mapped_code()))).flatten()
}

/// True if the `master`-th master is fixed pitch
pub fn master_is_fixed_pitch(master: i32) -> bool {
    with_master(master, Ok(()), |m, ()| Ok(m.is_fixed_pitch())).unwrap_or(false)
}

// State

/// Enable flags
pub fn enable(flags: Flags) {
    run(|cx| Ok(cx.enable(flags)));
}

/// Disable flags
pub fn disable(flags: Flags) {
    run(|cx| Ok(cx.disable(flags)));
}

/// Test flags
pub fn is_enabled(flags: Flags) -> bool {
    run(|cx| Ok(cx.is_enabled(flags))).unwrap_or(false)
}

/// Set the render style
pub fn render_style(style: RenderStyle) {
    run(|cx| Ok(cx.settings_mut().render_style = style));
}

/// Get the render style
pub fn get_render_style() -> RenderStyle {
    run(|cx| Ok(cx.settings().render_style)).unwrap_or_default()
}

/// Set the replacement code; 0 disables replacement
pub fn replacement_code(code: CodePoint) {
    run(|cx| Ok(cx.settings_mut().replacement_code = code));
}

/// Get the replacement code
pub fn get_replacement_code() -> CodePoint {
    run(|cx| Ok(cx.settings().replacement_code)).unwrap_or(0)
}

/// Set the resolution in dots per inch; 0 selects 72
pub fn resolution(dpi: f32) {
    if !(dpi >= 0.0) {
        record::<()>(Err(GlcError::Parameter));
        return;
    }
    run(|cx| Ok(cx.settings_mut().resolution = dpi));
}

/// Get the resolution
pub fn get_resolution() -> f32 {
    run(|cx| Ok(cx.settings().resolution)).unwrap_or(0.0)
}

/// Set or clear the unmapped-code handler
pub fn callback(callback: Option<Callback>) {
    run(|cx| Ok(cx.set_callback(callback)));
}

/// Replace the user data, returning the old value
pub fn data_pointer(
    data: Option<Box<dyn std::any::Any + Send>>,
) -> Option<Box<dyn std::any::Any + Send>> {
    run(|cx| Ok(cx.set_data(data))).flatten()
}

// Transform

/// Reset the transform
pub fn load_identity() {
    run(|cx| Ok(cx.load_identity()));
}

/// Replace the transform by a column-major 2×2 matrix
pub fn load_matrix(matrix: [f32; 4]) {
    run(|cx| Ok(cx.load_matrix(Transform(matrix))));
}

/// Post-multiply the transform
pub fn multiply_matrix(matrix: [f32; 4]) {
    run(|cx| Ok(cx.multiply_matrix(Transform(matrix))));
}

/// Rotate by `degrees` counter-clockwise
pub fn rotate(degrees: f32) {
    run(|cx| Ok(cx.rotate(degrees)));
}

/// Scale the transform
pub fn scale(x: f32, y: f32) {
    run(|cx| Ok(cx.scale(x, y)));
}

/// Get the transform
pub fn get_matrix() -> [f32; 4] {
    run(|cx| Ok(cx.settings().transform.0)).unwrap_or(Transform::IDENTITY.0)
}

// Rendering

/// Render one character
pub fn render_char(code: CodePoint) {
    run(|cx| cx.render_char(code));
}

/// Render a string
pub fn render_string(text: &str) {
    run(|cx| cx.render_str(text));
}

/// Render the first `count` characters of `text`
pub fn render_counted_string(count: i32, text: &str) {
    record(index(count).and_then(|n| {
        with_current(|cx| cx.render_codes(text.chars().take(n).map(CodePoint::from)))
    }));
}

// Measurement

/// Measure one character
pub fn measure_char(code: CodePoint) -> Option<CharMetric> {
    run(|cx| cx.measure_char(code)).flatten()
}

/// Measure a string, optionally keeping per-character metrics
pub fn measure_string(per_char: bool, text: &str) -> Option<CharMetric> {
    run(|cx| cx.measure_str(text, per_char)).flatten()
}

/// Measure the first `count` characters of `text`
pub fn measure_counted_string(per_char: bool, count: i32, text: &str) -> Option<CharMetric> {
    record(index(count).and_then(|n| {
        with_current(|cx| cx.measure_codes(text.chars().take(n).map(CodePoint::from), per_char))
    }))
    .flatten()
}

/// Number of characters kept by the last measurement
pub fn measured_char_count() -> i32 {
    run(|cx| to_int(cx.measured_char_count())).unwrap_or(0)
}

/// Metrics of the `index`-th character of the last measured string
pub fn string_char_metric(i: i32) -> Option<CharMetric> {
    record(index(i).and_then(|i| with_current(|cx| cx.char_metric(i).ok_or(GlcError::Parameter))))
}

/// Largest metrics over the current fonts
pub fn max_char_metric() -> Option<CharMetric> {
    run(|cx| cx.max_char_metric()).flatten()
}

// GL objects

/// Compiled glyph lists
pub fn list_objects() -> Vec<ListId> {
    run(|cx| Ok(cx.list_objects())).unwrap_or_default()
}

/// Glyph textures
pub fn texture_objects() -> Vec<TextureId> {
    run(|cx| Ok(cx.texture_objects())).unwrap_or_default()
}

/// Release all compiled lists and textures
pub fn delete_gl_objects() {
    run(|cx| Ok(cx.delete_gl_objects()));
}
