//! ArUco/AprilTag dictionary selection.
//!
//! Only the dictionary *name* is configured here; the detection backend owns
//! the actual code tables.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Dictionary the backend should use for ArUco/AprilTag scanning.
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ArucoDictionary {
    DICT_4X4_50,
    DICT_4X4_100,
    DICT_4X4_250,
    DICT_4X4_1000,
    DICT_5X5_50,
    #[default]
    DICT_5X5_100,
    DICT_5X5_250,
    DICT_5X5_1000,
    DICT_6X6_50,
    DICT_6X6_100,
    DICT_6X6_250,
    DICT_6X6_1000,
    DICT_7X7_50,
    DICT_7X7_100,
    DICT_7X7_250,
    DICT_7X7_1000,
    DICT_APRILTAG_16h5,
    DICT_APRILTAG_25h9,
    DICT_APRILTAG_36h10,
    DICT_APRILTAG_36h11,
}

use ArucoDictionary::*;

/// Name, inner bits per side, number of marker ids.
const TABLE: [(ArucoDictionary, &str, usize, u32); 20] = [
    (DICT_4X4_50, "DICT_4X4_50", 4, 50),
    (DICT_4X4_100, "DICT_4X4_100", 4, 100),
    (DICT_4X4_250, "DICT_4X4_250", 4, 250),
    (DICT_4X4_1000, "DICT_4X4_1000", 4, 1000),
    (DICT_5X5_50, "DICT_5X5_50", 5, 50),
    (DICT_5X5_100, "DICT_5X5_100", 5, 100),
    (DICT_5X5_250, "DICT_5X5_250", 5, 250),
    (DICT_5X5_1000, "DICT_5X5_1000", 5, 1000),
    (DICT_6X6_50, "DICT_6X6_50", 6, 50),
    (DICT_6X6_100, "DICT_6X6_100", 6, 100),
    (DICT_6X6_250, "DICT_6X6_250", 6, 250),
    (DICT_6X6_1000, "DICT_6X6_1000", 6, 1000),
    (DICT_7X7_50, "DICT_7X7_50", 7, 50),
    (DICT_7X7_100, "DICT_7X7_100", 7, 100),
    (DICT_7X7_250, "DICT_7X7_250", 7, 250),
    (DICT_7X7_1000, "DICT_7X7_1000", 7, 1000),
    (DICT_APRILTAG_16h5, "DICT_APRILTAG_16h5", 4, 30),
    (DICT_APRILTAG_25h9, "DICT_APRILTAG_25h9", 5, 35),
    (DICT_APRILTAG_36h10, "DICT_APRILTAG_36h10", 6, 2320),
    (DICT_APRILTAG_36h11, "DICT_APRILTAG_36h11", 6, 587),
];

impl ArucoDictionary {
    fn entry(self) -> &'static (ArucoDictionary, &'static str, usize, u32) {
        // TABLE is in declaration order.
        &TABLE[self as usize]
    }

    /// OpenCV-style name, e.g. `"DICT_5X5_100"`.
    pub fn name(self) -> &'static str {
        self.entry().1
    }

    /// Marker side length in inner bits.
    pub fn marker_bits(self) -> usize {
        self.entry().2
    }

    /// Number of distinct marker ids in the dictionary.
    pub fn capacity(self) -> u32 {
        self.entry().3
    }

    pub fn is_apriltag(self) -> bool {
        matches!(
            self,
            DICT_APRILTAG_16h5 | DICT_APRILTAG_25h9 | DICT_APRILTAG_36h10 | DICT_APRILTAG_36h11
        )
    }

    /// Look up a dictionary by name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        TABLE
            .iter()
            .find(|(_, n, _, _)| n.eq_ignore_ascii_case(name))
            .map(|(d, _, _, _)| *d)
    }

    pub fn all() -> impl Iterator<Item = ArucoDictionary> {
        TABLE.iter().map(|(d, _, _, _)| *d)
    }
}

impl fmt::Display for ArucoDictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unknown ArUco dictionary `{0}`")]
pub struct UnknownDictionary(pub String);

impl FromStr for ArucoDictionary {
    type Err = UnknownDictionary;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| UnknownDictionary(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_matches_declaration_order() {
        for (idx, (dict, name, _, _)) in TABLE.iter().enumerate() {
            assert_eq!(*dict as usize, idx, "{name} out of order");
            assert_eq!(dict.name(), *name);
            assert_eq!(format!("{dict:?}"), *name);
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!("dict_5x5_100".parse(), Ok(DICT_5X5_100));
        assert_eq!(ArucoDictionary::from_name("DICT_APRILTAG_36h11"), Some(DICT_APRILTAG_36h11));
        assert!("DICT_9X9_1".parse::<ArucoDictionary>().is_err());
    }

    #[test]
    fn metadata_is_consistent() {
        assert_eq!(ArucoDictionary::default(), DICT_5X5_100);
        assert_eq!(DICT_5X5_100.marker_bits(), 5);
        assert_eq!(DICT_5X5_100.capacity(), 100);
        assert!(DICT_APRILTAG_16h5.is_apriltag());
        assert!(!DICT_7X7_1000.is_apriltag());
        assert_eq!(ArucoDictionary::all().count(), 20);
    }

    #[test]
    fn serializes_with_opencv_names() {
        let json = serde_json::to_string(&DICT_6X6_250).expect("serialize");
        assert_eq!(json, "\"DICT_6X6_250\"");
    }
}
