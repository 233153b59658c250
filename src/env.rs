// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Context settings and environment configuration

use crate::{CodePoint, Transform};
use std::path::PathBuf;

/// Render style: which backend draws glyphs
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RenderStyle {
    /// Monochrome bitmaps, transformed by [`Settings::transform`]
    #[default]
    Bitmap,
    /// Glyph outlines as line loops
    Line,
    /// Textured quads, one texture cell per glyph
    Texture,
    /// Filled polygons
    Triangle,
}

bitflags::bitflags! {
    /// Boolean context state
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Flags: u8 {
        /// Allow automatic font selection for codes no current font maps
        const AUTO_FONT = 1 << 0;
        /// Compile glyphs into cached lists (Texture, Line and Triangle)
        const GL_OBJECTS = 1 << 1;
        /// Upload mipmap chains for glyph textures
        const MIPMAP = 1 << 2;
        /// Ask the glyph engine to hint bitmaps
        const HINTING = 1 << 3;
    }
}

impl Default for Flags {
    fn default() -> Self {
        Flags::AUTO_FONT | Flags::GL_OBJECTS | Flags::MIPMAP
    }
}

/// Per-context state variables
///
/// Settings may be modified freely through [`crate::Context::settings_mut`];
/// changes take effect on the next render or measure call.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Settings {
    /// Active render style
    pub render_style: RenderStyle,
    /// The 2×2 transform
    ///
    /// In [`RenderStyle::Bitmap`] this maps ems to pixels (thus the identity
    /// draws glyphs one pixel tall); it also applies to measurement in that
    /// style.
    pub transform: Transform,
    /// Code drawn in place of codes no font maps; zero disables
    pub replacement_code: CodePoint,
    pub flags: Flags,
    /// Device resolution in dots per inch; zero means 72
    pub resolution: f32,
    /// Size (texels) of one glyph cell of the texture atlas
    pub texture_cell: u32,
    /// Chordal tolerance of the scalable styles, in ems
    pub tolerance: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            render_style: RenderStyle::default(),
            transform: Transform::IDENTITY,
            replacement_code: 0,
            flags: Flags::default(),
            resolution: 0.0,
            texture_cell: 64,
            tolerance: 0.005,
        }
    }
}

impl Settings {
    /// Alternative default constructor
    pub fn new() -> Self {
        Self::default()
    }

    /// Test a flag
    #[inline]
    pub fn is_enabled(&self, flag: Flags) -> bool {
        self.flags.contains(flag)
    }

    /// Effective resolution (dpi)
    pub fn dpi(&self) -> f32 {
        if self.resolution > 0.0 {
            self.resolution
        } else {
            72.0
        }
    }

    /// The bitmap-style transform: [`Self::transform`] scaled by `dpi / 72`
    pub fn pixel_transform(&self) -> Transform {
        let k = self.dpi() / 72.0;
        Transform::scale(k, k).then_apply(self.transform)
    }
}

#[cfg(unix)]
const DEFAULT_SEPARATOR: &str = ":";
#[cfg(not(unix))]
const DEFAULT_SEPARATOR: &str = ";";

/// Split a catalog list on `separator`, skipping empty entries
pub fn split_catalog_list(list: &str, separator: &str) -> Vec<PathBuf> {
    list.split(separator)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Read default catalogs from the environment
///
/// The list is taken from `GLC_CATALOG_LIST`, or else `GLC_PATH`, and split on
/// `GLC_LIST_SEPARATOR` (default `:` on Unix, `;` elsewhere).
pub fn catalogs_from_env() -> Vec<PathBuf> {
    let Some(list) = std::env::var("GLC_CATALOG_LIST")
        .or_else(|_| std::env::var("GLC_PATH"))
        .ok()
    else {
        return vec![];
    };
    let separator = std::env::var("GLC_LIST_SEPARATOR")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_SEPARATOR.to_string());
    let catalogs = split_catalog_list(&list, &separator);
    log::debug!("catalogs_from_env: {catalogs:?}");
    catalogs
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let settings = Settings::new();
        assert_eq!(settings.render_style, RenderStyle::Bitmap);
        assert!(settings.is_enabled(Flags::AUTO_FONT));
        assert!(settings.is_enabled(Flags::GL_OBJECTS));
        assert!(!settings.is_enabled(Flags::HINTING));
        assert_eq!(settings.dpi(), 72.0);
        assert_eq!(settings.transform, Transform::IDENTITY);
        assert_eq!(settings.pixel_transform(), Transform::IDENTITY);
    }

    #[test]
    fn resolution_scales_bitmaps() {
        let settings = Settings {
            resolution: 144.0,
            transform: Transform::scale(10.0, 20.0),
            ..Settings::default()
        };
        assert_eq!(settings.pixel_transform(), Transform::scale(20.0, 40.0));
    }

    #[test]
    fn split_list() {
        let list = split_catalog_list("/a:/b/c::  :/d ", ":");
        assert_eq!(
            list,
            vec![PathBuf::from("/a"), PathBuf::from("/b/c"), PathBuf::from("/d")]
        );
        assert!(split_catalog_list("", ";").is_empty());
    }
}
