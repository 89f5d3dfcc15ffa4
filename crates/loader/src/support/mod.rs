#![forbid(unsafe_code)]

pub(crate) mod session_log;
pub(crate) mod time;
pub(crate) mod warn_log;

use sha2::Digest as _;
use std::fmt::Write as _;

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = sha2::Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = String::with_capacity(64);
    for b in digest {
        let _ = write!(&mut out, "{b:02x}");
    }
    out
}
