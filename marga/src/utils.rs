//! Shared utility functions

use std::f64::consts::PI;
use std::time::Instant;

/// Normalize angle to (-π, π]
#[inline]
pub fn normalize_angle(angle: f64) -> f64 {
    let mut a = angle;
    while a > PI {
        a -= 2.0 * PI;
    }
    while a <= -PI {
        a += 2.0 * PI;
    }
    a
}

/// Exact binomial coefficient C(n, k).
pub fn binomial(n: usize, k: usize) -> u64 {
    if k > n {
        return 0;
    }
    // C(n, k) = C(n, n - k)
    let k = k.min(n - k);
    let mut result: u64 = 1;
    for i in 0..k {
        // Stays integral: result * (n - i) is divisible by (i + 1) at each step
        result = result * (n - i) as u64 / (i + 1) as u64;
    }
    result
}

/// Milliseconds elapsed since `start`, for timing logs.
#[inline]
pub fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
