// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Context registry, thread binding and the command surface

mod common;

use common::{mono, StubEngine, StubScanner};
use glc::error::get_error;
use glc::global::{
    all_contexts, current_context, delete_context, gen_context, is_context, make_current, register,
    ContextId,
};
use glc::raster::{Command, RecordingTarget};
use glc::{commands, CodePoint, Context, ErrorCode, GlcError, RenderStyle};
use std::sync::{mpsc, Arc, Mutex, MutexGuard};
use std::thread;

// The registry is process-wide; run these tests one at a time.
static SERIAL: Mutex<()> = Mutex::new(());

fn serial() -> MutexGuard<'static, ()> {
    SERIAL.lock().unwrap_or_else(|err| err.into_inner())
}

fn stub_context() -> (ContextId, glc::raster::RecordingHandle, Arc<StubScanner>) {
    let target = RecordingTarget::new();
    let recording = target.handle();
    let scanner = Arc::new(StubScanner::default());
    let context = Context::with_engine(
        Box::new(target),
        Arc::new(StubEngine::default()),
        scanner.clone(),
    );
    (register(context), recording, scanner)
}

#[test_log::test]
fn generate_and_delete() {
    let _guard = serial();
    let a = gen_context();
    let b = gen_context();
    assert_eq!(b.get(), a.get() + 1);
    assert!(is_context(a) && is_context(b));
    assert!(all_contexts().contains(&a));

    delete_context(a).unwrap();
    assert!(!is_context(a));
    assert_eq!(delete_context(a), Err(GlcError::Parameter));
    delete_context(b).unwrap();
    assert!(!all_contexts().contains(&b));
}

#[test_log::test]
fn binding_and_release() {
    let _guard = serial();
    get_error();
    let id = gen_context();
    assert_eq!(current_context(), None);
    assert_eq!(commands::master_count(), 0);
    assert_eq!(get_error(), ErrorCode::State);

    make_current(Some(id)).unwrap();
    assert_eq!(current_context(), Some(id));
    commands::render_style(RenderStyle::Line);
    assert_eq!(commands::get_render_style(), RenderStyle::Line);
    assert_eq!(get_error(), ErrorCode::None);

    // binding again is a no-op
    make_current(Some(id)).unwrap();

    make_current(None).unwrap();
    assert_eq!(current_context(), None);
    commands::render_style(RenderStyle::Bitmap);
    assert_eq!(get_error(), ErrorCode::State);

    // state survives release
    make_current(Some(id)).unwrap();
    assert_eq!(commands::get_render_style(), RenderStyle::Line);
    make_current(None).unwrap();
    delete_context(id).unwrap();

    assert_eq!(make_current(Some(id)), Err(GlcError::Parameter));
}

#[test_log::test]
fn one_thread_per_context() {
    let _guard = serial();
    let id = gen_context();
    let (bound_tx, bound_rx) = mpsc::channel();
    let (done_tx, done_rx) = mpsc::channel::<()>();
    let other = thread::spawn(move || {
        make_current(Some(id)).unwrap();
        bound_tx.send(()).unwrap();
        done_rx.recv().unwrap();
        make_current(None).unwrap();
    });

    bound_rx.recv().unwrap();
    assert_eq!(make_current(Some(id)), Err(GlcError::State));
    done_tx.send(()).unwrap();
    other.join().unwrap();

    make_current(Some(id)).unwrap();
    make_current(None).unwrap();
    delete_context(id).unwrap();
}

#[test_log::test]
fn thread_exit_releases_context() {
    let _guard = serial();
    let id = gen_context();
    thread::spawn(move || make_current(Some(id)).unwrap())
        .join()
        .unwrap();
    make_current(Some(id)).unwrap();
    make_current(None).unwrap();
    delete_context(id).unwrap();
}

#[test_log::test]
fn deletion_is_deferred_while_current() {
    let _guard = serial();
    get_error();
    let id = gen_context();
    make_current(Some(id)).unwrap();
    delete_context(id).unwrap();
    assert!(!is_context(id));

    // still usable until released
    commands::render_style(RenderStyle::Texture);
    assert_eq!(get_error(), ErrorCode::None);
    assert_eq!(current_context(), Some(id));

    make_current(None).unwrap();
    assert_eq!(make_current(Some(id)), Err(GlcError::Parameter));
}

#[test_log::test]
fn commands_in_handler_fail() {
    let _guard = serial();
    get_error();
    let (id, _recording, scanner) = stub_context();
    let dir = tempfile::tempdir().unwrap();
    scanner.set(dir.path(), mono(dir.path()));
    make_current(Some(id)).unwrap();
    commands::append_catalog(dir.path());
    commands::disable(glc::Flags::AUTO_FONT);

    let seen = Arc::new(Mutex::new(vec![]));
    let log = seen.clone();
    commands::callback(Some(Box::new(move |_: &mut Context, _: CodePoint| {
        commands::append_font(1);
        let append = get_error();
        let bind = make_current(None);
        log.lock().unwrap().push((append, bind));
        false
    })));
    commands::render_char('a' as u32);
    assert_eq!(get_error(), ErrorCode::None);

    let seen = seen.lock().unwrap();
    assert!(!seen.is_empty());
    assert_eq!(seen[0], (ErrorCode::State, Err(GlcError::State)));
    assert_eq!(current_context(), Some(id));

    make_current(None).unwrap();
    delete_context(id).unwrap();
}

#[test_log::test]
fn command_surface() {
    let _guard = serial();
    get_error();
    let (id, recording, scanner) = stub_context();
    let dir = tempfile::tempdir().unwrap();
    scanner.set(dir.path(), mono(dir.path()));
    make_current(Some(id)).unwrap();

    commands::append_catalog(dir.path());
    assert_eq!(commands::catalog_count(), 1);
    assert_eq!(commands::catalog_list(0), Some(dir.path().to_path_buf()));
    assert_eq!(commands::master_count(), 1);
    assert_eq!(commands::master_family(0).as_deref(), Some("Mono"));
    assert_eq!(commands::master_face_count(0), 2);
    assert_eq!(commands::master_face_list(0, 1).as_deref(), Some("Bold"));
    assert_eq!(commands::master_char_count(0), 26);
    assert_eq!(commands::master_map(0, 'A' as u32), Some("LATIN CAPITAL LETTER A"));
    assert_eq!(get_error(), ErrorCode::None);

    assert_eq!(commands::master_family(5), None);
    assert_eq!(get_error(), ErrorCode::Parameter);

    let font = commands::gen_font_id();
    assert_eq!(commands::new_font_from_family(font, "Mono"), font);
    commands::font(font);
    assert_eq!(commands::current_font_list(), [font]);
    assert!(commands::font_face(font, "Bold"));
    assert!(!commands::font_face(font, "Oblique"));
    assert_eq!(commands::get_font_face(font).as_deref(), Some("Bold"));
    assert_eq!(commands::font_char_list(font, 0), Some("LATIN CAPITAL LETTER A"));
    assert_eq!(get_error(), ErrorCode::None);

    commands::render_style(RenderStyle::Line);
    commands::render_string("AB");
    commands::render_counted_string(1, "CD");
    let calls = recording
        .commands()
        .iter()
        .filter(|c| matches!(c, Command::CallList(_)))
        .count();
    assert_eq!(calls, 3);
    assert_eq!(commands::list_objects().len(), 3);

    let metric = commands::measure_string(true, "AB").unwrap();
    assert!(metric.baseline[1].0 > 0.9);
    assert_eq!(commands::measured_char_count(), 2);
    assert!(commands::string_char_metric(1).is_some());
    assert_eq!(commands::string_char_metric(2), None);
    assert_eq!(get_error(), ErrorCode::Parameter);

    commands::delete_gl_objects();
    assert!(commands::list_objects().is_empty());

    commands::remove_catalog(0);
    assert_eq!(commands::master_count(), 0);
    assert!(!commands::is_font(font));
    assert_eq!(get_error(), ErrorCode::None);

    make_current(None).unwrap();
    delete_context(id).unwrap();
}
