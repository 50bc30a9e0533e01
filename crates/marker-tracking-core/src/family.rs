//! Marker families and the per-family payload carried by a detection.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fiducial encoding scheme reported by the sensor pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MarkerFamily {
    #[default]
    Qr,
    #[serde(rename = "aruco_april", alias = "aruco", alias = "april_tag")]
    ArucoOrAprilTag,
    #[serde(rename = "ean_13", alias = "ean13")]
    Ean13,
    #[serde(rename = "upc_a", alias = "upca")]
    UpcA,
}

impl MarkerFamily {
    pub const ALL: [MarkerFamily; 4] = [
        MarkerFamily::Qr,
        MarkerFamily::ArucoOrAprilTag,
        MarkerFamily::Ean13,
        MarkerFamily::UpcA,
    ];

    /// Whether detections of this family come with a 6-DOF pose.
    ///
    /// Retail barcodes confirm presence and identity only.
    #[inline]
    pub fn carries_pose(self) -> bool {
        match self {
            MarkerFamily::Qr | MarkerFamily::ArucoOrAprilTag => true,
            MarkerFamily::Ean13 | MarkerFamily::UpcA => false,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MarkerFamily::Qr => "QR",
            MarkerFamily::ArucoOrAprilTag => "Aruco_April",
            MarkerFamily::Ean13 => "EAN_13",
            MarkerFamily::UpcA => "UPC_A",
        }
    }
}

impl fmt::Display for MarkerFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw decoded bytes of a QR code or barcode.
///
/// In JSON a payload is written as a string when it is plain ASCII and as a
/// byte array otherwise; both forms are accepted on input.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "PayloadRepr", into = "PayloadRepr")]
pub struct Payload(pub Vec<u8>);

impl Payload {
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload(s.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload(bytes)
    }
}

impl From<&[u8]> for Payload {
    fn from(bytes: &[u8]) -> Self {
        Payload(bytes.to_vec())
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum PayloadRepr {
    Text(String),
    Bytes(Vec<u8>),
}

impl From<PayloadRepr> for Payload {
    fn from(repr: PayloadRepr) -> Self {
        match repr {
            PayloadRepr::Text(s) => Payload(s.into_bytes()),
            PayloadRepr::Bytes(b) => Payload(b),
        }
    }
}

impl From<Payload> for PayloadRepr {
    fn from(payload: Payload) -> Self {
        if payload.0.is_ascii() {
            // ASCII is always valid UTF-8.
            match String::from_utf8(payload.0) {
                Ok(s) => PayloadRepr::Text(s),
                Err(e) => PayloadRepr::Bytes(e.into_bytes()),
            }
        } else {
            PayloadRepr::Bytes(payload.0)
        }
    }
}

/// Family-tagged marker data of one detection.
///
/// `Unsupported` stands for any family tag outside the four known ones; such
/// detections are accepted on the wire and ignored by the registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum MarkerData {
    #[serde(rename = "aruco_april", alias = "aruco", alias = "april_tag")]
    ArucoOrAprilTag { id: u32 },
    Qr { data: Payload },
    #[serde(rename = "ean_13", alias = "ean13")]
    Ean13 { data: Payload },
    #[serde(rename = "upc_a", alias = "upca")]
    UpcA { data: Payload },
    #[serde(other)]
    Unsupported,
}

impl MarkerData {
    /// Family of this data, `None` for unsupported tags.
    pub fn family(&self) -> Option<MarkerFamily> {
        match self {
            MarkerData::ArucoOrAprilTag { .. } => Some(MarkerFamily::ArucoOrAprilTag),
            MarkerData::Qr { .. } => Some(MarkerFamily::Qr),
            MarkerData::Ean13 { .. } => Some(MarkerFamily::Ean13),
            MarkerData::UpcA { .. } => Some(MarkerFamily::UpcA),
            MarkerData::Unsupported => None,
        }
    }
}
