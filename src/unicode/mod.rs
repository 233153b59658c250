// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Character names
//!
//! Bidirectional lookup between code points and their canonical Unicode
//! names (e.g. `0x41` ↔ `"LATIN CAPITAL LETTER A"`). The process-wide table
//! is accessed through [`names`]; it is built once on first use from the
//! compiled-in Unicode Character Database, including the names of ideographs
//! and Hangul syllables which are derived from their code points. Further
//! tables may be built with [`UnicodeNameTable::parse_unicode_data`].

mod data;

use crate::conv::{to_u32, to_usize};
use crate::CodePoint;
use std::fmt::Write;
use std::sync::LazyLock;

#[derive(Clone, Copy, Debug)]
struct Entry {
    code: CodePoint,
    start: u32,
    end: u32,
}

impl Entry {
    #[inline]
    fn name<'a>(&self, text: &'a str) -> &'a str {
        &text[to_usize(self.start)..to_usize(self.end)]
    }
}

/// An immutable code point ↔ name table
///
/// All names are stored in a single buffer.
#[derive(Clone, Debug, Default)]
pub struct UnicodeNameTable {
    text: String,
    // Sorted by code
    by_code: Vec<Entry>,
    // Indices into `by_code`, sorted by name (byte order)
    by_name: Vec<u32>,
}

/// Accumulates `(code, name)` pairs
#[derive(Default)]
struct Builder {
    text: String,
    entries: Vec<Entry>,
}

impl Builder {
    fn push(&mut self, code: CodePoint, name: &str) {
        let start = to_u32(self.text.len());
        self.text.push_str(name);
        self.finish(code, start);
    }

    fn push_hex_suffixed(&mut self, code: CodePoint, prefix: &str) {
        let start = to_u32(self.text.len());
        // writing to a String cannot fail
        let _ = write!(self.text, "{prefix}{code:04X}");
        self.finish(code, start);
    }

    fn finish(&mut self, code: CodePoint, start: u32) {
        let end = to_u32(self.text.len());
        self.entries.push(Entry { code, start, end });
    }

    fn build(self) -> UnicodeNameTable {
        let Builder { mut text, entries } = self;

        // Stable sort then keep the last entry of each run of equal codes
        let mut list = entries;
        list.sort_by_key(|entry| entry.code);
        let mut by_code: Vec<Entry> = Vec::with_capacity(list.len());
        for entry in list {
            match by_code.last_mut() {
                Some(last) if last.code == entry.code => *last = entry,
                _ => by_code.push(entry),
            }
        }
        text.shrink_to_fit();

        let mut by_name: Vec<u32> = (0..to_u32(by_code.len())).collect();
        by_name.sort_unstable_by(|a, b| {
            let a = &by_code[to_usize(*a)];
            let b = &by_code[to_usize(*b)];
            a.name(&text).cmp(b.name(&text))
        });

        UnicodeNameTable {
            text,
            by_code,
            by_name,
        }
    }
}

/// Code and name fields of `UnicodeData.txt` lines which name one character
fn unicode_data_entries(text: &str) -> impl Iterator<Item = (CodePoint, &str)> {
    text.lines().filter_map(|line| {
        let mut fields = line.split(';');
        let code = fields.next()?.trim();
        let name = fields.next()?.trim();
        if name.is_empty() || name.starts_with('<') {
            return None;
        }
        match u32::from_str_radix(code, 16) {
            Ok(code) => Some((code, name)),
            Err(_) => {
                log::warn!("UnicodeNameTable: skipping malformed line {line:?}");
                None
            }
        }
    })
}

impl UnicodeNameTable {
    /// Build from `(code, name)` pairs
    ///
    /// Pairs may be given in any order. If a code appears more than once, the
    /// last name given for it is kept.
    pub fn from_entries<N>(entries: impl IntoIterator<Item = (CodePoint, N)>) -> Self
    where
        N: AsRef<str>,
    {
        let mut builder = Builder::default();
        for (code, name) in entries {
            builder.push(code, name.as_ref());
        }
        builder.build()
    }

    /// Build from the contents of a `UnicodeData.txt` file
    ///
    /// Only the first two fields of each line are used. Entries whose name is
    /// a placeholder such as `<control>` or a range marker are skipped, as are
    /// malformed lines.
    pub fn parse_unicode_data(text: &str) -> Self {
        Self::from_entries(unicode_data_entries(text))
    }

    /// The complete built-in table
    fn builtin() -> Self {
        let mut builder = Builder::default();
        for (code, name) in unicode_data_entries(data::EXPLICIT) {
            builder.push(code, name);
        }
        for &(first, last, prefix) in data::HEX_SUFFIXED {
            for code in first..=last {
                builder.push_hex_suffixed(code, prefix);
            }
        }
        for code in data::HANGUL_FIRST..=data::HANGUL_LAST {
            let [l, v, t] = data::hangul_jamo(code);
            let start = to_u32(builder.text.len());
            let _ = write!(builder.text, "HANGUL SYLLABLE {l}{v}{t}");
            builder.finish(code, start);
        }
        builder.build()
    }

    /// Number of named code points
    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    /// True if the table holds no names
    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }

    /// The largest named code point
    pub fn max_code(&self) -> Option<CodePoint> {
        self.by_code.last().map(|e| e.code)
    }

    /// Get the name of a code point
    pub fn name_for_code(&self, code: CodePoint) -> Option<&str> {
        let index = self.by_code.binary_search_by_key(&code, |e| e.code).ok()?;
        Some(self.by_code[index].name(&self.text))
    }

    /// Get the code point of a name
    ///
    /// Names are compared exactly (case and bytes).
    pub fn code_for_name(&self, name: &str) -> Option<CodePoint> {
        let index = self
            .by_name
            .binary_search_by(|&i| self.by_code[to_usize(i)].name(&self.text).cmp(name))
            .ok()?;
        Some(self.by_code[to_usize(self.by_name[index])].code)
    }

    /// Iterate over `(code, name)` pairs in name order
    pub fn iter(&self) -> impl Iterator<Item = (CodePoint, &str)> + '_ {
        self.by_name.iter().map(|&i| {
            let entry = &self.by_code[to_usize(i)];
            (entry.code, entry.name(&self.text))
        })
    }
}

static NAMES: LazyLock<UnicodeNameTable> = LazyLock::new(|| {
    let table = UnicodeNameTable::builtin();
    log::debug!("UnicodeNameTable: loaded {} names", table.len());
    table
});

/// Access the process-wide name table
#[inline]
pub fn names() -> &'static UnicodeNameTable {
    &NAMES
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn builtin_round_trip() {
        let table = names();
        for (code, name) in table.iter() {
            assert_eq!(table.code_for_name(name), Some(code), "{name}");
        }
        assert_eq!(table.name_for_code(0x41), Some("LATIN CAPITAL LETTER A"));
        assert_eq!(table.code_for_name("GREEK SMALL LETTER ALPHA"), Some(0x3B1));
        assert_eq!(table.max_code(), Some(0xE01EF));
        assert_eq!(table.name_for_code(0xE01F0), None);
        assert_eq!(table.name_for_code(0x1F), None);
        assert_eq!(table.name_for_code(0xE000), None);
    }

    #[test]
    fn builtin_covers_all_blocks() {
        let table = names();
        assert_eq!(table.code_for_name("HIRAGANA LETTER A"), Some(0x3042));
        assert_eq!(table.name_for_code(0x0416), Some("CYRILLIC CAPITAL LETTER ZHE"));
        assert_eq!(table.name_for_code(0x1F600), Some("GRINNING FACE"));
        assert_eq!(table.code_for_name("HEBREW LETTER ALEF"), Some(0x5D0));
    }

    #[test]
    fn derived_names() {
        let table = names();
        assert_eq!(table.name_for_code(0x4E00), Some("CJK UNIFIED IDEOGRAPH-4E00"));
        assert_eq!(table.code_for_name("CJK UNIFIED IDEOGRAPH-20000"), Some(0x20000));
        assert_eq!(table.name_for_code(0xF900), Some("CJK COMPATIBILITY IDEOGRAPH-F900"));
        assert_eq!(table.name_for_code(0x17000), Some("TANGUT IDEOGRAPH-17000"));
        assert_eq!(table.name_for_code(0xAC00), Some("HANGUL SYLLABLE GA"));
        assert_eq!(table.name_for_code(0xAC01), Some("HANGUL SYLLABLE GAG"));
        assert_eq!(table.name_for_code(0xC544), Some("HANGUL SYLLABLE A"));
        assert_eq!(table.code_for_name("HANGUL SYLLABLE HIH"), Some(0xD7A3));
        assert_eq!(table.name_for_code(0x2A6E0), None);
    }

    #[test]
    fn names_are_exact() {
        let table = names();
        assert_eq!(table.code_for_name("latin capital letter a"), None);
        assert_eq!(table.code_for_name("LATIN CAPITAL LETTER A "), None);
        assert_eq!(table.code_for_name(""), None);
    }

    #[test]
    fn small_tables() {
        let one = UnicodeNameTable::from_entries([(7, "SEVEN")]);
        assert_eq!(one.code_for_name("SEVEN"), Some(7));
        assert_eq!(one.code_for_name("EIGHT"), None);

        let two = UnicodeNameTable::from_entries([(2, "B"), (1, "A"), (2, "BEE")]);
        assert_eq!(two.len(), 2);
        assert_eq!(two.code_for_name("A"), Some(1));
        assert_eq!(two.code_for_name("BEE"), Some(2));
        assert_eq!(two.code_for_name("B"), None);
        assert_eq!(two.name_for_code(0), None);

        let empty = UnicodeNameTable::from_entries(Vec::<(u32, &str)>::new());
        assert_eq!(empty.code_for_name("A"), None);
        assert_eq!(empty.max_code(), None);
    }

    #[test]
    fn parse_database() {
        let text = "0000;<control>;Cc;0;BN;;;;;N;NULL;;;;\n\
                    0041;LATIN CAPITAL LETTER A;Lu;0;L;;;;;N;;;;0061;\n\
                    zz;BROKEN;;\n\
                    00E9;LATIN SMALL LETTER E WITH ACUTE;Ll;0;L;0065 0301;;;;N;;;00C9;;00C9\n";
        let table = UnicodeNameTable::parse_unicode_data(text);
        assert_eq!(table.len(), 2);
        assert_eq!(table.name_for_code(0), None);
        assert_eq!(table.code_for_name("LATIN SMALL LETTER E WITH ACUTE"), Some(0xE9));
    }
}
