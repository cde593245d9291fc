use digest::Digest;
use sha2::Sha256;
use std::io::{Result as IOResult, Write};

use crate::hashes::marked::MarkedDigestWriter;

/// A struct that exposes a SHA-256 `Write` interface by wrapping an internal SHA2 instance.
///
/// ```
/// # use std::io::{Result};
/// use std::io::Write;
/// use ccd_core::hashes::{Sha256Writer, MarkedDigestWriter};
///
/// # fn main() -> Result<()> {
/// let mut w = Sha256Writer::default();
/// # let data = [0u8; 32];
///
/// // Writing more than once will update the hasher.
/// w.write_all(&data)?;
///
/// // Call finish to consume the hasher and produce the digest.
/// let digest = w.finish();
/// # Ok(())
/// }
/// ```
#[derive(Default)]
pub struct Sha256Writer {
    internal: Sha256,
}

impl Write for Sha256Writer {
    fn write(&mut self, buf: &[u8]) -> IOResult<usize> {
        self.internal.update(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> IOResult<()> {
        Ok(())
    }
}

impl MarkedDigestWriter<[u8; 32]> for Sha256Writer {
    fn finish(self) -> [u8; 32] {
        self.internal.finalize().into()
    }
}

/// SHA-256 over the concatenation of `parts`.
pub fn sha256(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}
