use std::io::Write;

/// A marked digest: a newtype over a raw hash output that records what the hash is for.
pub trait MarkedDigest: Default + Copy {
    /// The associated raw digest type
    type Digest;

    /// Wrap a raw digest
    fn new(hash: Self::Digest) -> Self;

    /// Return a copy of the raw digest
    fn internal(&self) -> Self::Digest;

    /// Return a clone of the digest bytes
    fn bytes(&self) -> Vec<u8>;
}

/// A `Write` that consumes itself to produce a digest.
pub trait MarkedDigestWriter<T>: Default + Write {
    /// Consume the writer and produce the raw digest
    fn finish(self) -> T;

    /// Consume the writer and produce a marked digest
    fn finish_marked<M: MarkedDigest<Digest = T>>(self) -> M {
        MarkedDigest::new(self.finish())
    }
}
