// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::FusedRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Internal, 0-based index of a finalized session.
///
/// Externally (download URLs, endpoint paths) sessions are numbered from 1;
/// [`SessionIndex::external`] and [`SessionIndex::from_external`] are the only
/// places that mapping is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionIndex(pub u64);

impl SessionIndex {
    pub const FIRST: Self = Self(0);

    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// 1-based number shown to users.
    #[must_use]
    pub const fn external(self) -> u64 {
        self.0 + 1
    }

    /// Map a 1-based external number back; `0` has no session.
    #[must_use]
    pub const fn from_external(external: u64) -> Option<Self> {
        match external {
            0 => None,
            n => Some(Self(n - 1)),
        }
    }

    /// Deterministic download file name, e.g. `ride_1.csv` for index 0.
    #[must_use]
    pub fn file_name(self) -> String {
        format!("ride_{}.csv", self.external())
    }
}

impl fmt::Display for SessionIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Acceleration statistics of a finished ride.
///
/// Computed over records whose `total_accel` is present; the extremes and
/// mean are `None` when there are no such records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RideSummary {
    pub count: usize,
    pub mean: Option<f64>,
    pub max: Option<f64>,
    pub min: Option<f64>,
}

impl RideSummary {
    #[must_use]
    pub fn from_records(records: &[FusedRecord]) -> Self {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut max: Option<f64> = None;
        let mut min: Option<f64> = None;

        for accel in records.iter().filter_map(|r| r.total_accel) {
            count += 1;
            sum += accel;
            max = Some(max.map_or(accel, |m| m.max(accel)));
            min = Some(min.map_or(accel, |m| m.min(accel)));
        }

        Self {
            count,
            mean: (count > 0).then(|| sum / count as f64),
            max,
            min,
        }
    }
}

impl fmt::Display for RideSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.mean, self.max, self.min) {
            (Some(mean), Some(max), Some(min)) => write!(
                f,
                "{} accel samples, mean {mean:.3}, max {max:.3}, min {min:.3}",
                self.count
            ),
            _ => f.write_str("no accel samples"),
        }
    }
}
