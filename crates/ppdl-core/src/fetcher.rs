//! Download and verify one asset.
//!
//! Steps, in order:
//! 1. destination already exists: skipped, no network access;
//! 2. dry run: report the would-be path, no network or disk access;
//! 3. stream the original into a part file, hashing the bytes as written;
//! 4. accept if the digest matches the declared checksum, either as the
//!    content hash or as the `"path:" + originalPath` hash;
//! 5. move into place unless the destination appeared meanwhile.
//!    Any failure removes the part file.
//!
//! Failures are returned to the caller and never retried here.

use crate::api::{AssetDescriptor, AssetSource};
use crate::config::Settings;
use crate::resolver::destination_path;
use crate::storage::{PartFile, SealedPart};
use crate::transport::TransportError;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// What happened to one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Destination already present.
    Skipped(PathBuf),
    /// Dry run: would have been written here.
    DryRun(PathBuf),
    /// Downloaded, verified and renamed into place.
    Saved { path: PathBuf, bytes: u64 },
}

impl FetchOutcome {
    pub fn path(&self) -> &Path {
        match self {
            FetchOutcome::Skipped(p) | FetchOutcome::DryRun(p) => p,
            FetchOutcome::Saved { path, .. } => path,
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("cannot create part file for {}: {source}", path.display())]
    Prepare {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("download failed: {0}")]
    Transport(#[source] TransportError),
    #[error("write failed: {0}")]
    Write(#[source] io::Error),
    #[error("hash mismatched: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },
    #[error("cannot move into place: {0}")]
    Commit(#[source] io::Error),
}

pub struct AssetFetcher<'a, S: AssetSource + ?Sized> {
    source: &'a S,
    save_root: &'a Path,
    dry_run: bool,
}

impl<'a, S: AssetSource + ?Sized> AssetFetcher<'a, S> {
    pub fn new(source: &'a S, save_root: &'a Path, dry_run: bool) -> Self {
        Self {
            source,
            save_root,
            dry_run,
        }
    }

    pub fn from_settings(source: &'a S, settings: &'a Settings) -> Self {
        Self::new(source, &settings.save_to, settings.dry)
    }

    pub fn destination(&self, asset: &AssetDescriptor) -> PathBuf {
        destination_path(self.save_root, asset)
    }

    /// Fetch `asset` to its resolved destination.
    pub fn fetch(&self, asset: &AssetDescriptor) -> Result<FetchOutcome, FetchError> {
        self.fetch_to(asset, self.destination(asset))
    }

    /// Fetch `asset` to an already resolved `path`.
    pub fn fetch_to(&self, asset: &AssetDescriptor, path: PathBuf) -> Result<FetchOutcome, FetchError> {
        if path.exists() {
            return Ok(FetchOutcome::Skipped(path));
        }
        if self.dry_run {
            return Ok(FetchOutcome::DryRun(path));
        }

        let mut part = PartFile::create(&path).map_err(|source| FetchError::Prepare {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(asset = %asset.id, temp = %part.temp_path().display(), "downloading");

        let streamed = self
            .source
            .download_original(&asset.id, &mut |chunk: &[u8]| part.write_chunk(chunk));
        if let Err(e) = streamed {
            discard(part);
            return Err(match e {
                TransportError::Sink(io_err) => FetchError::Write(io_err),
                other => FetchError::Transport(other),
            });
        }

        let sealed = part.seal().map_err(FetchError::Write)?;
        if !asset.checksum.accepts(sealed.digest(), &asset.original_path) {
            let actual = hex::encode(sealed.digest());
            discard_sealed(sealed);
            return Err(FetchError::ChecksumMismatch {
                expected: asset.checksum.to_hex(),
                actual,
            });
        }

        let bytes = sealed.len();
        match sealed.commit() {
            Ok(path) => Ok(FetchOutcome::Saved { path, bytes }),
            // Same destination, different asset: first writer wins.
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(FetchOutcome::Skipped(path)),
            Err(e) => Err(FetchError::Commit(e)),
        }
    }
}

fn discard(part: PartFile) {
    let temp = part.temp_path().to_path_buf();
    if let Err(e) = part.discard() {
        tracing::warn!("could not remove {}: {}", temp.display(), e);
    }
}

fn discard_sealed(sealed: SealedPart) {
    if let Err(e) = sealed.discard() {
        tracing::warn!("could not remove part file: {}", e);
    }
}
