//! Signer adapters.

mod keyed_digest;

pub use keyed_digest::KeyedDigestSigner;
