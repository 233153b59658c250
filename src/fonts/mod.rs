// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Font management
//!
//! Fonts are organised in a three-level taxonomy built from the catalogs of
//! a [`crate::Context`]:
//!
//! -   a [`Master`] groups all faces sharing a family name
//! -   a [`FaceDescriptor`] describes one style of the family, backed by a
//!     face within a font file
//! -   a [`Font`] is a user-visible instance of a master, with one selected
//!     face and its own [`CharMap`]
//!
//! Catalog directories are scanned by a [`CatalogScanner`]; the default
//! [`SystemScanner`] uses `fontdb`.
//!
//! Ownership flows one way: the context owns masters and fonts; masters own
//! faces. Fonts refer to their master and face by identifier and are looked
//! up from the context, thus removal never leaves a dangling parent.

mod catalog;
mod charmap;
mod face;
mod font;
mod master;

pub use catalog::{CatalogScanner, FaceRecord, SystemScanner};
pub use charmap::{CharMap, CharMapEntry};
pub use face::{FaceDescriptor, FaceId, OpenFace};
pub use font::{Font, FontId};
pub use master::{Master, MasterId, Position};
