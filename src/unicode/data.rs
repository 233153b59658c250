// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Built-in character names (Unicode 14.0.0)
//!
//! `names.txt` holds the first two fields of `UnicodeData.txt` for every
//! character with an individual name. Names derived from the code point
//! (ideographs with a hexadecimal suffix and Hangul syllables) are generated.

use crate::conv::to_usize;
use crate::CodePoint;

/// Code and name of each individually named character, one per line
pub(super) static EXPLICIT: &str = include_str!("names.txt");

/// Ranges named by a prefix and the code point as (at least four) hex digits
pub(super) static HEX_SUFFIXED: &[(CodePoint, CodePoint, &str)] = &[
    (0x3400, 0x4DBF, "CJK UNIFIED IDEOGRAPH-"),
    (0x4E00, 0x9FFF, "CJK UNIFIED IDEOGRAPH-"),
    (0xF900, 0xFA6D, "CJK COMPATIBILITY IDEOGRAPH-"),
    (0xFA70, 0xFAD9, "CJK COMPATIBILITY IDEOGRAPH-"),
    (0x17000, 0x187F7, "TANGUT IDEOGRAPH-"),
    (0x18B00, 0x18CD5, "KHITAN SMALL SCRIPT CHARACTER-"),
    (0x18D00, 0x18D08, "TANGUT IDEOGRAPH-"),
    (0x1B170, 0x1B2FB, "NUSHU CHARACTER-"),
    (0x20000, 0x2A6DF, "CJK UNIFIED IDEOGRAPH-"),
    (0x2A700, 0x2B738, "CJK UNIFIED IDEOGRAPH-"),
    (0x2B740, 0x2B81D, "CJK UNIFIED IDEOGRAPH-"),
    (0x2B820, 0x2CEA1, "CJK UNIFIED IDEOGRAPH-"),
    (0x2CEB0, 0x2EBE0, "CJK UNIFIED IDEOGRAPH-"),
    (0x2F800, 0x2FA1D, "CJK COMPATIBILITY IDEOGRAPH-"),
    (0x30000, 0x3134A, "CJK UNIFIED IDEOGRAPH-"),
];

pub(super) const HANGUL_FIRST: CodePoint = 0xAC00;
pub(super) const HANGUL_LAST: CodePoint = 0xD7A3;

const JAMO_L: [&str; 19] = [
    "G", "GG", "N", "D", "DD", "R", "M", "B", "BB", "S", "SS", "", "J", "JJ", "C", "K", "T", "P",
    "H",
];
const JAMO_V: [&str; 21] = [
    "A", "AE", "YA", "YAE", "EO", "E", "YEO", "YE", "O", "WA", "WAE", "OE", "YO", "U", "WEO", "WE",
    "WI", "YU", "EU", "YI", "I",
];
const JAMO_T: [&str; 28] = [
    "", "G", "GG", "GS", "N", "NJ", "NH", "D", "L", "LG", "LM", "LB", "LS", "LT", "LP", "LH", "M",
    "B", "BS", "S", "SS", "NG", "J", "C", "K", "T", "P", "H",
];

/// Short jamo names composing the Hangul syllable `code`
///
/// `code` must lie in `HANGUL_FIRST..=HANGUL_LAST`.
pub(super) fn hangul_jamo(code: CodePoint) -> [&'static str; 3] {
    let s = to_usize(code - HANGUL_FIRST);
    let (t_count, vt_count) = (JAMO_T.len(), JAMO_V.len() * JAMO_T.len());
    [
        JAMO_L[s / vt_count],
        JAMO_V[(s % vt_count) / t_count],
        JAMO_T[s % t_count],
    ]
}
