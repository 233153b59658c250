// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Render backends and glyph object caching

mod common;

use common::{assert_near, mono, Fixture};
use glc::fonts::FontId;
use glc::raster::{Command, FillRule, PolygonMode, RecordingTarget};
use glc::{Flags, GlcError, RenderStyle, Transform, Vec2};

const A: u32 = 'A' as u32;

fn setup(style: RenderStyle) -> (Fixture, tempfile::TempDir) {
    setup_with(RecordingTarget::new(), style)
}

fn setup_with(target: RecordingTarget, style: RenderStyle) -> (Fixture, tempfile::TempDir) {
    let mut fx = Fixture::with_target(target);
    let dir = fx.add_catalog(mono);
    let cx = &mut fx.context;
    let font = FontId::new(1).unwrap();
    cx.new_font_from_family(font, "Mono").unwrap();
    cx.font(Some(font)).unwrap();
    cx.settings_mut().render_style = style;
    (fx, dir)
}

fn count(commands: &[Command], f: impl Fn(&Command) -> bool) -> usize {
    commands.iter().filter(|c| f(c)).count()
}

#[test_log::test]
fn scalable_glyphs_are_compiled_once() {
    for (style, mode) in [
        (RenderStyle::Line, PolygonMode::Boundary),
        (RenderStyle::Triangle, PolygonMode::Filled),
    ] {
        let (mut fx, _dir) = setup(style);
        fx.context.render_char(A).unwrap();
        fx.context.render_char(A).unwrap();
        assert_eq!(fx.counters().glyph_calls(), 1);

        let commands = fx.recording.commands();
        assert_eq!(count(&commands, |c| matches!(c, Command::CallList(_))), 2);
        assert_eq!(count(&commands, |c| matches!(c, Command::Polygon { .. })), 0);

        let replayed = fx.recording.replayed();
        let polygons: Vec<_> = replayed
            .iter()
            .filter_map(|c| match c {
                Command::Polygon { mode, rule, .. } => Some((*mode, *rule)),
                _ => None,
            })
            .collect();
        assert_eq!(polygons, [(mode, FillRule::OddWinding); 2]);
        assert_eq!(fx.context.list_objects().len(), 1);
    }
}

#[test_log::test]
fn styles_are_cached_separately() {
    let (mut fx, _dir) = setup(RenderStyle::Line);
    let cx = &mut fx.context;
    cx.render_char(A).unwrap();
    cx.settings_mut().render_style = RenderStyle::Triangle;
    cx.render_char(A).unwrap();
    assert_eq!(cx.list_objects().len(), 2);
    assert_eq!(fx.counters().outlines(), 2);
}

#[test_log::test]
fn without_gl_objects_nothing_is_cached() {
    let (mut fx, _dir) = setup(RenderStyle::Triangle);
    let cx = &mut fx.context;
    cx.disable(Flags::GL_OBJECTS);
    cx.render_char(A).unwrap();
    cx.render_char(A).unwrap();
    assert_eq!(fx.engine.counters.outlines(), 2);
    assert!(cx.list_objects().is_empty());
    let commands = fx.recording.commands();
    assert_eq!(count(&commands, |c| matches!(c, Command::Polygon { .. })), 2);
}

#[test_log::test]
fn texture_glyphs_are_rasterized_once() {
    let (mut fx, _dir) = setup(RenderStyle::Texture);
    let cx = &mut fx.context;
    cx.render_char(A).unwrap();
    cx.render_char(A).unwrap();
    assert_eq!(fx.engine.counters.rasters(), 1);
    assert_eq!(cx.atlas().len(), 1);
    assert_eq!(cx.atlas().size(), 1024);
    assert_eq!(cx.texture_objects().len(), 1);

    let commands = fx.recording.commands();
    assert!(commands.contains(&Command::CreateTexture {
        texture: cx.atlas().texture().unwrap(),
        width: 1024,
        height: 1024,
        mipmap: true,
    }));
    // level 0 plus a chain down to 1×1 for a 64 texel cell
    let uploads = count(&commands, |c| matches!(c, Command::UploadTexture { .. }));
    assert_eq!(uploads, 7);

    let replayed = fx.recording.replayed();
    let quads: Vec<_> = replayed
        .iter()
        .filter_map(|c| match c {
            Command::TexturedQuad(quad) => Some(*quad),
            _ => None,
        })
        .collect();
    assert_eq!(quads.len(), 2);
    let tex = quads[0].tex_coords;
    assert!(tex.iter().all(|t| (0.0..=64.0 / 1024.0).contains(&t.0)));
}

#[test_log::test]
fn texture_size_is_probed() {
    let target = RecordingTarget::with_max_texture_size(512);
    let (mut fx, _dir) = setup_with(target, RenderStyle::Texture);
    fx.context.render_char(A).unwrap();
    assert_eq!(fx.context.atlas().size(), 512);

    let target = RecordingTarget::with_max_texture_size(128);
    let (mut fx, _dir) = setup_with(target, RenderStyle::Texture);
    assert_eq!(fx.context.render_char(A), Err(GlcError::Resource));
    assert!(fx.context.list_objects().is_empty());
}

#[test_log::test]
fn mipmap_change_recreates_atlas() {
    let (mut fx, _dir) = setup(RenderStyle::Texture);
    let cx = &mut fx.context;
    cx.render_char(A).unwrap();
    let first = cx.atlas().texture().unwrap();

    cx.disable(Flags::MIPMAP);
    fx.recording.clear();
    cx.render_char(A).unwrap();
    assert_eq!(fx.engine.counters.rasters(), 2);
    let second = cx.atlas().texture().unwrap();
    assert_ne!(first, second);
    assert_eq!(cx.list_objects().len(), 1);

    let commands = fx.recording.commands();
    assert!(commands.contains(&Command::DeleteTexture(first)));
    assert_eq!(count(&commands, |c| matches!(c, Command::UploadTexture { .. })), 1);
}

#[test_log::test]
fn space_in_texture_style_only_advances() {
    let mut fx = Fixture::new();
    let _dir = fx.add_catalog(|dir| vec![common::face(dir, "Sans", "Regular", ' ', 'Z')]);
    let cx = &mut fx.context;
    cx.settings_mut().render_style = RenderStyle::Texture;
    cx.render_char(' ' as u32).unwrap();
    assert!(cx.atlas().is_empty());
    let replayed = fx.recording.replayed();
    assert_eq!(replayed.len(), 1);
    match replayed[0] {
        Command::Translate(v) => assert_near(v, Vec2(0.5, 0.0)),
        ref other => panic!("unexpected {other:?}"),
    }
}

#[test_log::test]
fn bitmaps_use_pixel_transform() {
    let (mut fx, _dir) = setup(RenderStyle::Bitmap);
    let cx = &mut fx.context;
    cx.scale(24.0, 24.0);
    cx.render_char(A).unwrap();
    cx.render_char(A).unwrap();
    // never cached
    assert_eq!(fx.engine.counters.rasters(), 2);
    assert!(cx.list_objects().is_empty());

    let commands = fx.recording.commands();
    let Command::Bitmap { width, height, advance, .. } = commands[0] else {
        panic!("expected a bitmap, got {:?}", commands[0]);
    };
    assert_near(advance, Vec2(12.0, 0.0));
    assert!(width > 0 && width <= 10);
    assert!(height > 0 && height <= 18);

    // doubling the resolution doubles the advance
    cx.settings_mut().resolution = 144.0;
    fx.recording.clear();
    cx.render_char(A).unwrap();
    let Command::Bitmap { advance, .. } = fx.recording.commands()[0] else {
        panic!("expected a bitmap");
    };
    assert_near(advance, Vec2(24.0, 0.0));
}

#[test_log::test]
fn bitmap_measurement_in_pixels() {
    let (mut fx, _dir) = setup(RenderStyle::Bitmap);
    let cx = &mut fx.context;
    cx.load_matrix(Transform::scale(10.0, 10.0));
    let metric = cx.measure_char(A).unwrap().unwrap();
    assert_near(metric.baseline[1], Vec2(5.0, 0.0));
    assert_near(metric.bounds[0], Vec2(1.0, 0.0));
    assert_near(metric.bounds[2], Vec2(4.0, 7.0));

    cx.settings_mut().render_style = RenderStyle::Line;
    let metric = cx.measure_char(A).unwrap().unwrap();
    assert_near(metric.baseline[1], Vec2(0.5, 0.0));

    let max = cx.max_char_metric().unwrap().unwrap();
    assert_near(max.baseline[1], Vec2(0.6, 0.0));
    assert_near(max.bounds[0], Vec2(0.0, -0.2));
}

#[test_log::test]
fn deleting_gl_objects() {
    let (mut fx, _dir) = setup(RenderStyle::Texture);
    let cx = &mut fx.context;
    cx.render_str("AB").unwrap();
    cx.settings_mut().render_style = RenderStyle::Line;
    cx.render_str("AB").unwrap();
    assert_eq!(cx.list_objects().len(), 4);
    assert_eq!(fx.recording.lock().live_lists(), 4);

    cx.delete_gl_objects();
    assert!(cx.list_objects().is_empty());
    assert!(cx.texture_objects().is_empty());
    assert_eq!(fx.recording.lock().live_lists(), 0);
    assert_eq!(fx.recording.lock().live_textures(), 0);

    // everything is rebuilt on demand
    cx.render_char(A).unwrap();
    assert_eq!(cx.list_objects().len(), 1);
}

#[test_log::test]
fn removing_catalog_releases_objects() {
    let (mut fx, _dir) = setup(RenderStyle::Texture);
    let cx = &mut fx.context;
    cx.render_str("ABC").unwrap();
    assert_eq!(cx.atlas().len(), 3);

    cx.remove_catalog(0).unwrap();
    assert!(cx.atlas().is_empty());
    assert!(cx.list_objects().is_empty());
    assert_eq!(fx.recording.lock().live_lists(), 0);
}

#[test_log::test]
fn dropping_context_releases_objects() {
    let (mut fx, _dir) = setup(RenderStyle::Texture);
    fx.context.render_str("AB").unwrap();
    let recording = fx.recording.clone();
    drop(fx);
    assert_eq!(recording.lock().live_lists(), 0);
    assert_eq!(recording.lock().live_textures(), 0);
}
