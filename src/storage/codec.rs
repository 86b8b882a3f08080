//! On-disk container for table and index files
//!
//! ```text
//! +------------------+
//! | Magic            | (4 bytes: "RDBT" table, "RDBI" index)
//! +------------------+
//! | Body Length      | (u32 LE)
//! +------------------+
//! | Checksum         | (u32 LE, CRC32 of body)
//! +------------------+
//! | Body             | (serde_json bytes)
//! +------------------+
//! ```
//!
//! Files are replaced atomically: the new contents are written to a sibling
//! `.tmp` file, synced, then renamed over the target.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crc32fast::Hasher;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::errors::{StorageError, StorageResult};

const HEADER_LEN: usize = 12;

/// Kind of container, determines the magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Table,
    Index,
}

impl FileKind {
    fn magic(&self) -> &'static [u8; 4] {
        match self {
            FileKind::Table => b"RDBT",
            FileKind::Index => b"RDBI",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            FileKind::Table => "table",
            FileKind::Index => "index",
        }
    }
}

/// Computes a CRC32 checksum over the provided data.
pub fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Frames a serialized body with magic, length and checksum.
pub fn encode(kind: FileKind, body: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_LEN + body.len());
    buf.extend_from_slice(kind.magic());
    buf.extend_from_slice(&(body.len() as u32).to_le_bytes());
    buf.extend_from_slice(&compute_checksum(body).to_le_bytes());
    buf.extend_from_slice(body);
    buf
}

/// Validates the frame and returns the body slice.
pub fn decode<'a>(kind: FileKind, bytes: &'a [u8], path: &Path) -> StorageResult<&'a [u8]> {
    if bytes.len() < HEADER_LEN {
        return Err(StorageError::corrupted(
            path,
            format!("truncated header ({} bytes)", bytes.len()),
        ));
    }

    if &bytes[0..4] != kind.magic() {
        return Err(StorageError::corrupted(
            path,
            format!("not a {} file (bad magic)", kind.label()),
        ));
    }

    let mut len_buf = [0u8; 4];
    len_buf.copy_from_slice(&bytes[4..8]);
    let body_len = u32::from_le_bytes(len_buf) as usize;

    let mut crc_buf = [0u8; 4];
    crc_buf.copy_from_slice(&bytes[8..12]);
    let expected = u32::from_le_bytes(crc_buf);

    let body = &bytes[HEADER_LEN..];
    if body.len() != body_len {
        return Err(StorageError::corrupted(
            path,
            format!("body length {} does not match header {}", body.len(), body_len),
        ));
    }

    if compute_checksum(body) != expected {
        return Err(StorageError::corrupted(path, "checksum mismatch"));
    }

    Ok(body)
}

/// Reads and decodes a container. Returns `Ok(None)` if the file is absent.
pub fn read_file<T: DeserializeOwned>(kind: FileKind, path: &Path) -> StorageResult<Option<T>> {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(StorageError::io(
                format!("Failed to read {} file", kind.label()),
                path,
                e,
            ))
        }
    };

    let body = decode(kind, &bytes, path)?;
    let value = serde_json::from_slice(body).map_err(|e| {
        StorageError::serialization(
            format!("Failed to parse {} file {}", kind.label(), path.display()),
            e,
        )
    })?;

    Ok(Some(value))
}

/// Serializes `value` and atomically replaces `path` with it.
///
/// Serialization happens before any file is touched, so a failure leaves the
/// previous contents in place.
pub fn write_file_atomic<T: Serialize + ?Sized>(
    kind: FileKind,
    path: &Path,
    value: &T,
    sync: bool,
) -> StorageResult<()> {
    let body = serde_json::to_vec(value).map_err(|e| {
        StorageError::serialization(format!("Failed to serialize {} file", kind.label()), e)
    })?;
    write_bytes_atomic(path, &encode(kind, &body), sync)
}

/// Atomically replaces `path` with `bytes`.
///
/// Writes a sibling `.tmp` file, fsyncs it if `sync`, renames it over the
/// target, then fsyncs the parent directory. The temp file is removed on
/// failure.
pub fn write_bytes_atomic(path: &Path, bytes: &[u8], sync: bool) -> StorageResult<()> {
    let tmp_path = temp_path(path);
    let result = write_and_rename(&tmp_path, path, bytes, sync);
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

fn write_and_rename(tmp_path: &Path, path: &Path, bytes: &[u8], sync: bool) -> StorageResult<()> {
    let mut file = File::create(tmp_path)
        .map_err(|e| StorageError::io("Failed to create temp file", tmp_path, e))?;

    file.write_all(bytes)
        .map_err(|e| StorageError::io("Failed to write temp file", tmp_path, e))?;

    if sync {
        file.sync_all()
            .map_err(|e| StorageError::io("fsync failed for temp file", tmp_path, e))?;
    }
    drop(file);

    fs::rename(tmp_path, path)
        .map_err(|e| StorageError::io("Failed to replace file", path, e))?;

    if sync {
        if let Some(parent) = path.parent() {
            fsync_dir(parent)?;
        }
    }

    Ok(())
}

/// fsync a directory so a rename inside it is durable.
fn fsync_dir(path: &Path) -> StorageResult<()> {
    let dir = OpenOptions::new()
        .read(true)
        .open(path)
        .map_err(|e| StorageError::io("Failed to open directory for fsync", path, e))?;

    dir.sync_all()
        .map_err(|e| StorageError::io("fsync failed for directory", path, e))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
