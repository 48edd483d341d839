//! SHA-256 digest of everything written to a bundle.

use std::fmt;
use std::io::{self, Write};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of a bundle's bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl ContentHash {
    /// Compute SHA-256 hash of the given bytes, returning hex-encoded string.
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        ContentHash(hex::encode(hasher.finalize()))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Writer adapter that hashes and counts bytes on their way through.
pub struct DigestWriter<W> {
    inner: W,
    hasher: Sha256,
    bytes_written: u64,
}

impl<W: Write> DigestWriter<W> {
    pub fn new(inner: W) -> Self {
        DigestWriter {
            inner,
            hasher: Sha256::new(),
            bytes_written: 0,
        }
    }

    /// Consume the adapter, returning the byte count and digest.
    pub fn finish(self) -> (u64, ContentHash) {
        (
            self.bytes_written,
            ContentHash(hex::encode(self.hasher.finalize())),
        )
    }
}

impl<W: Write> Write for DigestWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        self.bytes_written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_has_known_digest() {
        assert_eq!(
            ContentHash::compute(b"").0,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn writer_digest_matches_direct_hash() {
        let mut buf = Vec::new();
        let mut writer = DigestWriter::new(&mut buf);
        writer.write_all(b"hello ").unwrap();
        writer.write_all(b"world").unwrap();

        let (bytes, digest) = writer.finish();
        assert_eq!(bytes, 11);
        assert_eq!(digest, ContentHash::compute(b"hello world"));
        assert_eq!(buf, b"hello world");
    }
}
