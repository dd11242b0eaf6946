use std::{
    fmt::Display,
    time::{SystemTime, UNIX_EPOCH},
};

use strum_macros::{Display as StrumDisplay, EnumString};

/// Modification time of a disk entry, as milliseconds since unix epoch.
/// `DiskTimestamp::default()` is the zero timestamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DiskTimestamp(pub u64);

impl Display for DiskTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format!("{}", self.0))
    }
}

impl From<SystemTime> for DiskTimestamp {
    fn from(value: SystemTime) -> Self {
        // Times before epoch are clamped to the zero timestamp
        DiskTimestamp(
            value
                .duration_since(UNIX_EPOCH)
                .map(|duration| duration.as_millis() as u64)
                .unwrap_or(0),
        )
    }
}

/// One of the two mirrored trees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Side {
    Primary,
    Secondary,
}

impl Side {
    pub fn other(&self) -> Self {
        match self {
            Side::Primary => Side::Secondary,
            Side::Secondary => Side::Primary,
        }
    }
}

#[cfg(test)]
mod test {
    use std::{str::FromStr, time::Duration};

    use super::*;
    use rstest::*;

    #[rstest]
    #[case(Side::Primary, "primary")]
    #[case(Side::Secondary, "secondary")]
    fn test_side_display(#[case] side: Side, #[case] expected: &str) {
        assert_eq!(side.to_string(), expected);
        assert_eq!(Side::from_str(expected).unwrap(), side);
        assert_eq!(side.other().other(), side);
    }

    #[test]
    fn test_timestamp_from_system_time() {
        // Given
        let time = UNIX_EPOCH + Duration::from_millis(1_500);

        // When
        let timestamp = DiskTimestamp::from(time);

        // Then
        assert_eq!(timestamp, DiskTimestamp(1_500));
        assert_eq!(DiskTimestamp::default(), DiskTimestamp(0));
    }
}
