//! Shard handles.
//!
//! A shard is an opaque on-disk column-data handle constructed across the
//! managed-runtime boundary. This crate never parses shard data itself; the
//! handle carries what term providers need: the shard directory, the field
//! lists, the packed-table pointer, and the table of pre-mapped files.
//!
//! Construction is all-or-nothing: a validation failure returns an error and
//! no partial handle ever escapes.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::context::PackedTablePtr;

/// Opaque handle to one shard's column data.
#[derive(Debug)]
pub struct Shard {
    dir: PathBuf,
    int_fields: Vec<String>,
    str_fields: Vec<String>,
    packed_table: PackedTablePtr,
    map_cache: HashMap<PathBuf, u64>,
}

impl Shard {
    /// Builds a shard handle.
    ///
    /// `mapped_files` and `mapped_addrs` are parallel tables of pre-mapped
    /// file paths and their memory addresses.
    ///
    /// # Errors
    /// `MappedTableMismatch` when the two tables differ in length.
    pub fn new(
        dir: impl Into<PathBuf>,
        int_fields: Vec<String>,
        str_fields: Vec<String>,
        packed_table: PackedTablePtr,
        mapped_files: Vec<PathBuf>,
        mapped_addrs: &[u64],
    ) -> Result<Self, ShardError> {
        if mapped_files.len() != mapped_addrs.len() {
            return Err(ShardError::MappedTableMismatch {
                files: mapped_files.len(),
                addrs: mapped_addrs.len(),
            });
        }

        let map_cache = mapped_files
            .into_iter()
            .zip(mapped_addrs.iter().copied())
            .collect();

        Ok(Self {
            dir: dir.into(),
            int_fields,
            str_fields,
            packed_table,
            map_cache,
        })
    }

    /// Shard directory.
    #[inline]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Integer field names available in this shard.
    #[inline]
    pub fn int_fields(&self) -> &[String] {
        &self.int_fields
    }

    /// String field names available in this shard.
    #[inline]
    pub fn str_fields(&self) -> &[String] {
        &self.str_fields
    }

    /// The caller-owned packed table.
    #[inline]
    pub fn packed_table(&self) -> PackedTablePtr {
        self.packed_table
    }

    /// Pre-mapped address for `file`, if the caller mapped it.
    pub fn mapped_addr(&self, file: &Path) -> Option<u64> {
        self.map_cache.get(file).copied()
    }

    /// Number of pre-mapped files.
    #[inline]
    pub fn mapped_file_count(&self) -> usize {
        self.map_cache.len()
    }
}

impl fmt::Display for Shard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ dir: {} }}", self.dir.display())
    }
}

/// Fatal shard-construction failure.
#[derive(Debug)]
#[non_exhaustive]
pub enum ShardError {
    /// The mapped-file and mapped-address tables differ in length.
    MappedTableMismatch { files: usize, addrs: usize },
}

impl fmt::Display for ShardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MappedTableMismatch { files, addrs } => write!(
                f,
                "mapped table mismatch: {files} files, {addrs} addresses"
            ),
        }
    }
}

impl std::error::Error for ShardError {}
