//! Content verification for downloaded originals.
//!
//! The server records a base64 SHA-1 per asset. For uploaded assets it is the
//! hash of the file bytes; for assets from external libraries it is the hash of
//! `"path:" + originalPath`. A download is valid if it matches either form.
//!
//! Hashing happens inline with the write path ([`HashingWriter`]) so the digest
//! always covers exactly the bytes that were persisted.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha1::{Digest, Sha1};
use std::fmt;
use std::io::{self, Write};

/// Raw SHA-1 digest.
pub type Sha1Digest = [u8; 20];

fn to_digest(out: &[u8]) -> Sha1Digest {
    let mut digest = [0u8; 20];
    digest.copy_from_slice(out);
    digest
}

/// Expected checksum as declared by the server, already base64-decoded.
#[derive(Clone, PartialEq, Eq)]
pub struct Checksum(Vec<u8>);

impl Checksum {
    /// Decode the standard-base64 string sent over the wire.
    pub fn from_base64(encoded: &str) -> Result<Self, base64::DecodeError> {
        STANDARD.decode(encoded.trim()).map(Checksum)
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Checksum(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// True if `content_digest` (hash of the written bytes) or the path-derived
    /// digest of `original_path` equals this checksum.
    pub fn accepts(&self, content_digest: &Sha1Digest, original_path: &str) -> bool {
        self.0 == content_digest[..] || self.0 == path_digest(original_path)[..]
    }
}

impl fmt::Debug for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Checksum({})", self.to_hex())
    }
}

/// SHA-1 of `"path:" + original_path`, used for external-library assets.
pub fn path_digest(original_path: &str) -> Sha1Digest {
    let out = Sha1::new()
        .chain_update(b"path:")
        .chain_update(original_path.as_bytes())
        .finalize();
    to_digest(&out)
}

/// Writer adapter that hashes every byte the inner writer accepted.
pub struct HashingWriter<W> {
    inner: W,
    hasher: Sha1,
    written: u64,
}

impl<W: Write> HashingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Sha1::new(),
            written: 0,
        }
    }

    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Returns the inner writer and the digest of everything written through it.
    pub fn finish(self) -> (W, Sha1Digest) {
        let out = self.hasher.finalize();
        (self.inner, to_digest(&out))
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
