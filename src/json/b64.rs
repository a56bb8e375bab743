use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

pub fn encode(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

pub fn decode(text: &str) -> Result<Vec<u8>, base64::DecodeError> {
    BASE64.decode(text)
}

/// Repr payloads that are pure printable ASCII embed directly as `repr_str`;
/// anything else goes through base64.
pub fn is_printable(bytes: &[u8]) -> bool {
    bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ')
}
