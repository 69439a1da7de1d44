/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! GCD and checked LCM over packet rates.

use super::FrameError;

/// Iterative Euclidean GCD.  `gcd(0, n) == n`.
pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

/// Checked LCM.  `Ok(0)` when either input is `0`.
pub fn lcm(a: u64, b: u64) -> Result<u64, FrameError> {
    if a == 0 || b == 0 {
        return Ok(0);
    }
    (a / gcd(a, b))
        .checked_mul(b)
        .ok_or(FrameError::Overflow { a, b })
}

/// LCM of every rate in `rates`; `Ok(0)` for an empty slice.
pub fn lcm_of_slice(rates: &[u64]) -> Result<u64, FrameError> {
    rates
        .iter()
        .try_fold(rates.first().copied().unwrap_or(0), |acc, &r| lcm(acc, r))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gcd_basic_cases() {
        assert_eq!(gcd(12, 8), 4);
        assert_eq!(gcd(7, 3), 1);
        assert_eq!(gcd(0, 5), 5);
        assert_eq!(gcd(0, 0), 0);
    }

    #[test]
    fn lcm_of_tick_rates() {
        assert_eq!(lcm(2, 4).unwrap(), 4);
        assert_eq!(lcm(3, 4).unwrap(), 12);
        assert_eq!(lcm(0, 4).unwrap(), 0);
    }

    #[test]
    fn lcm_overflow_returns_error() {
        let a = u64::MAX / 2 + 1;
        let b = u64::MAX / 2 + 3;
        assert!(matches!(lcm(a, b), Err(FrameError::Overflow { .. })));
    }

    #[test]
    fn lcm_of_slice_cases() {
        assert_eq!(lcm_of_slice(&[]).unwrap(), 0);
        assert_eq!(lcm_of_slice(&[5]).unwrap(), 5);
        assert_eq!(lcm_of_slice(&[1, 2, 4, 2, 4]).unwrap(), 4);
        assert_eq!(lcm_of_slice(&[2, 3, 5]).unwrap(), 30);
    }
}
