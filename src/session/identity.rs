//! Random identifiers for sessions and documents.

use std::fmt::Write as _;

/// Fill `buf` from the OS RNG.
/// Falls back to system time if getrandom fails.
fn fill_random(buf: &mut [u8]) {
    if getrandom::getrandom(buf).is_ok() {
        return;
    }
    use std::time::{SystemTime, UNIX_EPOCH};
    let mut seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0x9E37_79B9_7F4A_7C15);
    for byte in buf.iter_mut() {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        *byte = seed as u8;
    }
}

/// `bytes` random bytes as lowercase hex (two characters per byte).
#[must_use]
pub fn random_hex(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    fill_random(&mut buf);
    buf.iter().fold(String::with_capacity(bytes * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

/// Random server shard, a decimal string in `0..1000`.
#[must_use]
pub fn random_shard() -> String {
    let mut buf = [0u8; 4];
    fill_random(&mut buf);
    (u32::from_le_bytes(buf) % 1000).to_string()
}
