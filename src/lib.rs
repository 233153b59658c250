// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! OpenGL Character Renderer
//!
//! This library turns character codes into drawing commands. Fonts are
//! discovered by scanning catalog directories, grouped into families
//! ([`fonts::Master`]) and instantiated as [`fonts::Font`]s. A [`Context`]
//! resolves each code to a font (with optional automatic font selection,
//! a replacement code and a final `\<XXXX>` escape) and draws it with the
//! selected [`RenderStyle`] to a [`raster::RasterTarget`]:
//!
//! -   [`RenderStyle::Bitmap`]: monochrome bitmaps
//! -   [`RenderStyle::Texture`]: quads textured from a glyph atlas
//! -   [`RenderStyle::Line`]: outlines as line loops
//! -   [`RenderStyle::Triangle`]: filled outlines
//!
//! A `Context` may be used directly. Alternatively, contexts may be
//! registered and bound to threads via [`global`], then driven through the
//! GLC-style functions of [`commands`].
//!
//! ```
//! use glc::raster::RecordingTarget;
//! use glc::Context;
//!
//! let target = RecordingTarget::new();
//! let mut context = Context::new(Box::new(target));
//! // without any catalog nothing resolves; this draws nothing
//! context.render_str("Hello").unwrap();
//! ```

#![cfg_attr(doc_cfg, feature(doc_cfg))]

mod conv;

mod data;
pub use data::*;

mod env;
pub use env::*;

pub mod error;
pub use error::{ErrorCode, GlcError};

mod charset;
pub use charset::CharSet;

pub mod commands;
pub mod engine;
pub mod fonts;
pub mod global;
pub mod raster;
pub mod render;
pub mod tessellate;
pub mod unicode;

mod context;
pub use context::{Callback, CharMetric, Context};
