// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Catalog management

use super::Context;
use crate::fonts::{FaceDescriptor, FaceId, FaceRecord, FontId, Master, MasterId, Position};
use crate::GlcError;
use std::path::{Path, PathBuf};

impl Context {
    /// Registered catalog directories, in order
    #[inline]
    pub fn catalogs(&self) -> &[PathBuf] {
        &self.catalogs
    }

    /// Add a catalog directory
    ///
    /// Faces found in `path` are added to the master of their family (created
    /// if new), at the front or back of its face list according to
    /// `position`. A face whose style already exists in its master is
    /// ignored; records lacking a style or character set are skipped.
    ///
    /// Adding a registered path does nothing. A directory without font files
    /// is registered all the same. Fails with [`GlcError::Resource`] if
    /// `path` is not a readable directory.
    pub fn add_catalog(
        &mut self,
        path: impl AsRef<Path>,
        position: Position,
    ) -> Result<(), GlcError> {
        let path = path.as_ref();
        if self.catalogs.iter().any(|p| p == path) {
            return Ok(());
        }
        if !std::fs::metadata(path)?.is_dir() {
            log::warn!("add_catalog: {} is not a directory", path.display());
            return Err(GlcError::Resource);
        }

        let records = self.scanner.scan(path)?;
        let found = records.len();
        let mut added = 0;
        for record in records {
            if self.add_face_record(record, position) {
                added += 1;
            }
        }
        log::info!(
            "add_catalog: {}: {added} of {found} faces added, {} masters",
            path.display(),
            self.masters.len()
        );

        match position {
            Position::Prepend => self.catalogs.insert(0, path.to_path_buf()),
            Position::Append => self.catalogs.push(path.to_path_buf()),
        }
        Ok(())
    }

    fn add_face_record(&mut self, record: FaceRecord, position: Position) -> bool {
        let (Some(style), Some(charset)) = (record.style.clone(), record.charset.clone()) else {
            log::warn!(
                "add_catalog: skipping face {} of {}: missing style or character set",
                record.index,
                record.path.display()
            );
            return false;
        };

        let index = match self.masters.iter().position(|m| m.family() == record.family) {
            Some(index) => index,
            None => {
                self.last_master += 1;
                let master = Master::new(
                    MasterId(self.last_master),
                    record.family.clone(),
                    record.vendor.clone().unwrap_or_default(),
                    record.format_label(),
                );
                log::debug!("add_catalog: new master {:?} \"{}\"", master.id(), master.family());
                self.masters.push(master);
                self.masters.len() - 1
            }
        };

        if self.masters[index].face_by_style(&style).is_some() {
            log::debug!(
                "add_catalog: \"{}\" already has style \"{style}\"",
                record.family
            );
            return false;
        }
        self.last_face += 1;
        let face = FaceDescriptor::new(
            FaceId(self.last_face),
            style,
            record.path,
            record.index,
            charset,
            record.fixed_pitch,
        );
        self.masters[index].add_face(face, position)
    }

    /// Remove the catalog at `index`
    ///
    /// The faces it contributed are those whose file lies in the directory,
    /// together with any the catalog yields when scanned again. For each,
    /// all fonts instantiated from the face's master are deleted, then the
    /// face is removed and its master's character set rebuilt; a master left
    /// without faces is destroyed.
    ///
    /// Fails with [`GlcError::Parameter`] if `index` is out of range.
    pub fn remove_catalog(&mut self, index: usize) -> Result<(), GlcError> {
        let Some(path) = self.catalogs.get(index).cloned() else {
            return Err(GlcError::Parameter);
        };

        let mut files: Vec<(PathBuf, u32)> = self
            .masters
            .iter()
            .flat_map(|m| m.faces())
            .filter(|f| f.path().parent() == Some(path.as_path()))
            .map(|f| (f.path().to_path_buf(), f.index()))
            .collect();
        match self.scanner.scan(&path) {
            Ok(records) => {
                for record in records {
                    let file = (record.path, record.index);
                    if !files.contains(&file) {
                        files.push(file);
                    }
                }
            }
            Err(err) => {
                log::warn!("remove_catalog: rescan of {} failed: {err}", path.display());
            }
        }

        for (file, face_index) in files {
            let found = self.masters.iter().enumerate().find_map(|(i, m)| {
                m.find_face_by_file(&file, face_index).map(|f| (i, f))
            });
            if let Some((master, face)) = found {
                self.remove_face(master, face);
            }
        }

        self.catalogs.remove(index);
        log::info!("remove_catalog: {} removed", path.display());
        Ok(())
    }

    fn remove_face(&mut self, master_index: usize, face_index: usize) {
        let master_id = self.masters[master_index].id();
        let doomed: Vec<FontId> = self
            .fonts
            .iter()
            .filter(|font| font.master() == master_id)
            .map(|font| font.id())
            .collect();
        for id in doomed {
            log::debug!("remove_catalog: deleting font {id:?}");
            self.remove_font(id);
        }

        let face_id = self.masters[master_index].faces()[face_index].id();
        self.release_face_objects(master_index, face_id);
        let face = self.masters[master_index].remove_face_at(face_index);
        log::debug!(
            "remove_catalog: removed \"{}\" from \"{}\"",
            face.style(),
            self.masters[master_index].family()
        );

        if self.masters[master_index].face_count() == 0 {
            let mut master = self.masters.remove(master_index);
            for key in master.cache.clear(&mut *self.target) {
                self.atlas.release(&(master_id, key));
            }
            log::debug!("remove_catalog: destroyed master \"{}\"", master.family());
        }
    }
}
