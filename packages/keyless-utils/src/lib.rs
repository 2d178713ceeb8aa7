pub mod b64;
pub mod der;
pub mod hash;
pub mod pem;

pub use hash::{Sha1Digest, Sha256Digest, Sha512Digest};
