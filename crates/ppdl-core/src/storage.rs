//! File lifecycle for one download.
//!
//! Bytes go to a uniquely named hidden part file in the destination directory
//! and are hashed as they are written. Only a sealed, verified part file is
//! moved onto the destination, so the destination never holds partial or
//! unverified content, and an existing file is never replaced. Dropping a
//! part file at any stage removes it.

use crate::checksum::{HashingWriter, Sha1Digest};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Suffix of in-progress files.
pub const TEMP_SUFFIX: &str = ".part";

/// Fixed, short prefix: part names stay short whatever the final name is.
const PART_PREFIX: &str = ".ppdl-";

const WRITE_BUF: usize = 64 * 1024;

/// An open, hashing part file for `final_path`.
pub struct PartFile {
    writer: HashingWriter<BufWriter<NamedTempFile>>,
    final_path: PathBuf,
}

impl PartFile {
    /// Create the parent directory chain (idempotent) and a fresh part file in it.
    pub fn create(final_path: &Path) -> io::Result<Self> {
        let parent = final_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)?;
        let mut builder = tempfile::Builder::new();
        builder.prefix(PART_PREFIX).suffix(TEMP_SUFFIX);
        // Same mode as a plainly created file; umask still applies.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(fs::Permissions::from_mode(0o666));
        }
        let tmp = builder.tempfile_in(parent)?;
        Ok(PartFile {
            writer: HashingWriter::new(BufWriter::with_capacity(WRITE_BUF, tmp)),
            final_path: final_path.to_path_buf(),
        })
    }

    pub fn temp_path(&self) -> &Path {
        self.writer.get_ref().get_ref().path()
    }

    pub fn final_path(&self) -> &Path {
        &self.final_path
    }

    pub fn bytes_written(&self) -> u64 {
        self.writer.bytes_written()
    }

    pub fn write_chunk(&mut self, data: &[u8]) -> io::Result<()> {
        self.writer.write_all(data)
    }

    /// Flush and fsync; returns the digest of exactly the bytes persisted.
    pub fn seal(self) -> io::Result<SealedPart> {
        let len = self.writer.bytes_written();
        let (buf, digest) = self.writer.finish();
        let tmp = buf.into_inner().map_err(io::IntoInnerError::into_error)?;
        tmp.as_file().sync_all()?;
        Ok(SealedPart {
            tmp,
            final_path: self.final_path,
            digest,
            len,
        })
    }

    /// Remove the part file now, reporting removal errors.
    pub fn discard(self) -> io::Result<()> {
        let (buf, _) = self.writer.finish();
        match buf.into_inner() {
            Ok(tmp) => tmp.close(),
            // Dropping the writer still removes the file.
            Err(e) => Err(e.into_error()),
        }
    }
}

/// A fully written and synced part file awaiting verification.
pub struct SealedPart {
    tmp: NamedTempFile,
    final_path: PathBuf,
    digest: Sha1Digest,
    len: u64,
}

impl SealedPart {
    pub fn digest(&self) -> &Sha1Digest {
        &self.digest
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Move onto the destination path. Never replaces an existing file: if
    /// another worker got there first, the part file is removed and the
    /// error has kind [`io::ErrorKind::AlreadyExists`].
    pub fn commit(self) -> io::Result<PathBuf> {
        match self.tmp.persist_noclobber(&self.final_path) {
            Ok(_) => Ok(self.final_path),
            Err(e) => {
                let _ = e.file.close();
                Err(e.error)
            }
        }
    }

    pub fn discard(self) -> io::Result<()> {
        self.tmp.close()
    }
}
