use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The three coverage namespaces exposed under `/api/{prefix}`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum ZoneKind {
    #[sea_orm(string_value = "zone1")]
    Zone1,
    #[sea_orm(string_value = "zone2")]
    Zone2,
    #[sea_orm(string_value = "zone3")]
    Zone3,
}

impl ZoneKind {
    pub const ALL: [ZoneKind; 3] = [ZoneKind::Zone1, ZoneKind::Zone2, ZoneKind::Zone3];

    /// URL path segment for this kind.
    pub fn prefix(self) -> &'static str {
        match self {
            ZoneKind::Zone1 => "zone1",
            ZoneKind::Zone2 => "zone2",
            ZoneKind::Zone3 => "zone3",
        }
    }

    pub fn profile(self) -> ZoneProfile {
        match self {
            ZoneKind::Zone1 => ZoneProfile {
                supplementary_column: true,
                day_records: true,
                series_window: SeriesWindowKind::Weeks,
                min_series_snapshots: 2,
            },
            ZoneKind::Zone2 | ZoneKind::Zone3 => ZoneProfile {
                supplementary_column: false,
                day_records: false,
                series_window: SeriesWindowKind::Latest,
                min_series_snapshots: 1,
            },
        }
    }
}

impl fmt::Display for ZoneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

impl FromStr for ZoneKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ZoneKind::ALL
            .into_iter()
            .find(|kind| kind.prefix().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown zone kind '{}'", s))
    }
}

/// Which optional columns and which history policy a zone kind uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneProfile {
    pub supplementary_column: bool,
    pub day_records: bool,
    pub series_window: SeriesWindowKind,
    /// Below this many qualifying snapshots the series is reported empty.
    pub min_series_snapshots: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesWindowKind {
    Latest,
    Weeks,
}

impl SeriesWindowKind {
    pub fn with_size(self, size: u32) -> SeriesWindow {
        match self {
            SeriesWindowKind::Latest => SeriesWindow::Latest(size),
            SeriesWindowKind::Weeks => SeriesWindow::Weeks(size),
        }
    }
}

/// Selection of snapshots feeding a history query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesWindow {
    /// The `n` most recent qualifying snapshots.
    Latest(u32),
    /// Every qualifying snapshot created during the last `n * 7` days.
    Weeks(u32),
}

impl SeriesWindow {
    pub fn size(self) -> u32 {
        match self {
            SeriesWindow::Latest(n) | SeriesWindow::Weeks(n) => n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_round_trip_through_from_str() {
        for kind in ZoneKind::ALL {
            assert_eq!(kind.prefix().parse::<ZoneKind>().unwrap(), kind);
        }
        assert!("zone4".parse::<ZoneKind>().is_err());
    }

    #[test]
    fn only_zone1_tracks_days_and_supplementary_counts() {
        assert!(ZoneKind::Zone1.profile().day_records);
        assert!(ZoneKind::Zone1.profile().supplementary_column);
        assert!(!ZoneKind::Zone2.profile().day_records);
        assert!(!ZoneKind::Zone3.profile().supplementary_column);
    }

    #[test]
    fn serializes_as_lowercase_prefix() {
        assert_eq!(
            serde_json::to_string(&ZoneKind::Zone3).unwrap(),
            "\"zone3\""
        );
    }
}
