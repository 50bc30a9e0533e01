//! Per-family identity decoding.

use marker_tracking_core::{MarkerData, MarkerFamily};

/// Decode the registry identity of a detection.
///
/// Returns `None` for unsupported families. The identity may be empty; the
/// caller decides what to do with that.
pub fn decode_identity(data: &MarkerData) -> Option<(MarkerFamily, String)> {
    match data {
        MarkerData::ArucoOrAprilTag { id } => Some((MarkerFamily::ArucoOrAprilTag, id.to_string())),
        MarkerData::Qr { data } => Some((MarkerFamily::Qr, ascii_decode(data.as_bytes()))),
        MarkerData::Ean13 { data } => Some((MarkerFamily::Ean13, ascii_decode(data.as_bytes()))),
        MarkerData::UpcA { data } => Some((MarkerFamily::UpcA, ascii_decode(data.as_bytes()))),
        MarkerData::Unsupported => None,
    }
}

/// Strict 7-bit ASCII decoding; bytes above 0x7F become `'?'`.
pub fn ascii_decode(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| if b.is_ascii() { b as char } else { '?' })
        .collect()
}
