// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Catalog scanning
//!
//! A catalog is a directory of font files. A [`CatalogScanner`] lists the
//! faces found in one directory as [`FaceRecord`]s, from which the context
//! builds its masters (families) and face descriptors.

use crate::{CharSet, GlcError};
use std::path::{Path, PathBuf};

/// Description of one face found by a [`CatalogScanner`]
///
/// `style` and `charset` are required; records lacking either are skipped
/// when a catalog is added.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FaceRecord {
    /// Font file
    pub path: PathBuf,
    /// Index of the face within the file
    pub index: u32,
    /// Family name
    pub family: String,
    /// Style name, e.g. "Bold Italic"
    pub style: Option<String>,
    /// Vendor or foundry
    pub vendor: Option<String>,
    /// Format label, e.g. "TrueType"
    pub format: Option<String>,
    /// Supported code points
    pub charset: Option<CharSet>,
    pub fixed_pitch: bool,
}

impl FaceRecord {
    /// Format label, falling back to the upper-cased file extension
    pub fn format_label(&self) -> String {
        if let Some(ref format) = self.format {
            return format.clone();
        }
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_uppercase())
            .unwrap_or_else(|| "Unknown".to_string())
    }
}

/// Font discovery
pub trait CatalogScanner: Send + Sync {
    /// List the faces provided by files directly within `dir`
    ///
    /// A directory without font files yields an empty list. Failure to read
    /// the directory itself is a [`GlcError::Resource`].
    fn scan(&self, dir: &Path) -> Result<Vec<FaceRecord>, GlcError>;
}

const FONT_EXTENSIONS: &[&str] = &["ttf", "otf", "ttc", "otc"];

/// The default [`CatalogScanner`]
///
/// Uses `fontdb` to enumerate the faces of each font file and `ttf-parser`
/// to read style names, vendor and the Unicode character set.
/// Sub-directories are not scanned.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemScanner;

impl SystemScanner {
    fn scan_file(&self, path: &Path, out: &mut Vec<FaceRecord>) -> Result<(), GlcError> {
        let data = std::fs::read(path)?;
        let mut db = fontdb::Database::new();
        db.load_font_data(data);

        for info in db.faces() {
            let Some((family, _)) = info.families.first() else {
                log::warn!("SystemScanner: face without family in {}", path.display());
                continue;
            };
            let details = db.with_face_data(info.id, |data, index| face_details(data, index));
            let Some(details) = details.flatten() else {
                log::warn!(
                    "SystemScanner: unable to parse face {} of {}",
                    info.index,
                    path.display()
                );
                continue;
            };

            let style = details.style.or_else(|| {
                let bold = info.weight.0 >= fontdb::Weight::BOLD.0;
                let italic = info.style != fontdb::Style::Normal;
                Some(
                    match (bold, italic) {
                        (false, false) => "Regular",
                        (true, false) => "Bold",
                        (false, true) => "Italic",
                        (true, true) => "Bold Italic",
                    }
                    .to_string(),
                )
            });

            out.push(FaceRecord {
                path: path.to_path_buf(),
                index: info.index,
                family: family.clone(),
                style,
                vendor: details.vendor,
                format: Some(details.format.to_string()),
                charset: details.charset,
                fixed_pitch: info.monospaced,
            });
        }
        Ok(())
    }
}

impl CatalogScanner for SystemScanner {
    fn scan(&self, dir: &Path) -> Result<Vec<FaceRecord>, GlcError> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .and_then(|ext| ext.to_str())
                        .map(|ext| FONT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                        .unwrap_or(false)
            })
            .collect();
        paths.sort();

        let mut records = Vec::new();
        for path in paths {
            if let Err(err) = self.scan_file(&path, &mut records) {
                log::warn!("SystemScanner: skipping {}: {err}", path.display());
            }
        }
        log::info!(
            "SystemScanner: found {} faces in {}",
            records.len(),
            dir.display()
        );
        Ok(records)
    }
}

struct FaceDetails {
    style: Option<String>,
    vendor: Option<String>,
    format: &'static str,
    charset: Option<CharSet>,
}

fn face_details(data: &[u8], index: u32) -> Option<FaceDetails> {
    use ttf_parser::name_id;

    let face = ttf_parser::Face::parse(data, index).ok()?;
    let name = |id: u16| {
        face.names()
            .into_iter()
            .filter(|name| name.name_id == id && name.is_unicode())
            .find_map(|name| name.to_string())
    };

    let style = name(name_id::TYPOGRAPHIC_SUBFAMILY).or_else(|| name(name_id::SUBFAMILY));
    let vendor = name(name_id::MANUFACTURER);
    let format = if face.tables().cff.is_some() {
        "CFF"
    } else {
        "TrueType"
    };

    let charset = face.tables().cmap.and_then(|cmap| {
        let mut codes = Vec::new();
        for subtable in cmap.subtables {
            if subtable.is_unicode() {
                subtable.codepoints(|code| {
                    if subtable.glyph_index(code).is_some_and(|id| id.0 != 0) {
                        codes.push(code);
                    }
                });
            }
        }
        let set: CharSet = codes.into_iter().collect();
        (!set.is_empty()).then_some(set)
    });

    Some(FaceDetails {
        style,
        vendor,
        format,
        charset,
    })
}
