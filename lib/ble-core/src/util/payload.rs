/// Lowercase hex rendering of a byte payload.
pub fn to_hex(data: &[u8]) -> String {
    hex::encode(data)
}

/// Best-effort UTF-8 rendering; invalid sequences are dropped rather than
/// replaced.
pub fn to_utf8_ignore_invalid(data: &[u8]) -> String {
    data.utf8_chunks().map(|chunk| chunk.valid()).collect()
}
