//! Major frame of the schedule table.
//!
//! Each populated slot carries a `packet_rate` in timer ticks.  The major
//! frame is the LCM of all non-zero rates: the number of ticks after which
//! the periodic pattern of the whole table repeats.  It is computed and
//! logged once at initialization.
//!
//! | Failure | Variant |
//! |---|---|
//! | No slot has a non-zero rate | [`FrameError::NoPeriodicSlots`] |
//! | LCM does not fit `u64` | [`FrameError::Overflow`] |
//! | Frame longer than the configured limit | [`FrameError::TooLarge`] |

pub mod math;

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::table::ScheduleTable;
use math::lcm_of_slice;

/// Default upper limit on the major frame, in ticks.
pub const DEFAULT_MAJOR_FRAME_LIMIT: u64 = 1_000_000;

#[derive(Debug, PartialEq, Eq)]
pub enum FrameError {
    NoPeriodicSlots,
    Overflow { a: u64, b: u64 },
    TooLarge { ticks: u64, limit: u64 },
}

impl std::fmt::Display for FrameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameError::NoPeriodicSlots => write!(f, "no slot has a non-zero packet rate"),
            FrameError::Overflow { a, b } => write!(f, "LCM overflow computing lcm({a}, {b})"),
            FrameError::TooLarge { ticks, limit } => {
                write!(f, "major frame of {ticks} ticks exceeds limit of {limit} ticks")
            }
        }
    }
}

impl std::error::Error for FrameError {}

/// Major-frame summary of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameInfo {
    /// Frame length in ticks.
    pub major_frame_ticks: u64,
    /// Distinct non-zero packet rates, ascending.
    pub unique_rates: Vec<u64>,
    /// Slots with a non-zero packet rate.
    pub periodic_slots: usize,
}

impl FrameInfo {
    /// Frame length in wall time for a given tick period.
    pub fn duration(&self, tick: Duration) -> Duration {
        let ticks = u32::try_from(self.major_frame_ticks).unwrap_or(u32::MAX);
        tick.saturating_mul(ticks)
    }
}

/// Compute the major frame of `table`, rejecting frames above `limit` ticks.
pub fn major_frame(table: &ScheduleTable, limit: u64) -> Result<FrameInfo, FrameError> {
    let rates: Vec<u64> = table
        .iter()
        .map(|(_, e)| u64::from(e.packet_rate()))
        .filter(|&r| r > 0)
        .collect();

    if rates.is_empty() {
        warn!("schedule table has no periodic slots");
        return Err(FrameError::NoPeriodicSlots);
    }

    let unique_rates = {
        let mut v = rates.clone();
        v.sort_unstable();
        v.dedup();
        v
    };

    let major_frame_ticks = lcm_of_slice(&unique_rates)?;
    if major_frame_ticks > limit {
        warn!(major_frame_ticks, limit, "major frame exceeds configured limit");
        return Err(FrameError::TooLarge {
            ticks: major_frame_ticks,
            limit,
        });
    }

    info!(
        major_frame_ticks,
        periodic_slots = rates.len(),
        unique_rates = unique_rates.len(),
        "Calculated major frame"
    );
    for r in &unique_rates {
        debug!(rate_ticks = r, "  unique packet rate");
    }

    Ok(FrameInfo {
        major_frame_ticks,
        unique_rates,
        periodic_slots: rates.len(),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SlotConfig;

    fn table(rates: &[(usize, u32)]) -> ScheduleTable {
        let cfg: Vec<SlotConfig> = rates
            .iter()
            .map(|&(slot, packet_rate)| SlotConfig {
                slot,
                packet_rate,
                ..Default::default()
            })
            .collect();
        ScheduleTable::from_config(&cfg).unwrap()
    }

    #[test]
    fn default_rates_give_four_tick_frame() {
        let t = table(&[(1, 1), (2, 2), (3, 4), (4, 2), (5, 4)]);
        let info = major_frame(&t, DEFAULT_MAJOR_FRAME_LIMIT).unwrap();
        assert_eq!(info.major_frame_ticks, 4);
        assert_eq!(info.unique_rates, vec![1, 2, 4]);
        assert_eq!(info.periodic_slots, 5);
    }

    #[test]
    fn coprime_rates_multiply() {
        let t = table(&[(1, 3), (2, 5), (3, 7)]);
        assert_eq!(major_frame(&t, 1_000).unwrap().major_frame_ticks, 105);
    }

    #[test]
    fn zero_rate_slots_are_ignored() {
        let t = table(&[(1, 0), (2, 6)]);
        let info = major_frame(&t, 100).unwrap();
        assert_eq!(info.major_frame_ticks, 6);
        assert_eq!(info.periodic_slots, 1);
    }

    #[test]
    fn empty_table_has_no_frame() {
        assert_eq!(
            major_frame(&ScheduleTable::new(), 100),
            Err(FrameError::NoPeriodicSlots)
        );
    }

    #[test]
    fn frame_above_limit_is_rejected() {
        let t = table(&[(1, 7), (2, 11)]);
        assert_eq!(
            major_frame(&t, 50),
            Err(FrameError::TooLarge { ticks: 77, limit: 50 })
        );
    }

    #[test]
    fn duration_scales_with_tick() {
        let info = FrameInfo {
            major_frame_ticks: 4,
            unique_rates: vec![1, 4],
            periodic_slots: 2,
        };
        assert_eq!(info.duration(Duration::from_millis(250)), Duration::from_secs(1));
    }
}
