use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Simulation time in seconds. Fixed-point so that accumulating frame
/// deltas is exact and replays of the same delta sequence agree bit for bit.
pub type Seconds = Fixed64;

/// Frames are counted, not timed. One `World::update` call is one frame.
pub type Frames = u64;

/// Convert an f64 number of seconds to [`Seconds`]. Use only for
/// initialization and host input, never inside the tick pipeline.
#[inline]
pub fn seconds(v: f64) -> Seconds {
    Seconds::from_num(v)
}

/// Convert an f64 to Fixed64. Use only for initialization, never in sim loop.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert a non-negative number of seconds from outside the simulation
/// (files, command lines). `None` for negative, non-finite or values past
/// [`Seconds::MAX`].
pub fn checked_seconds(v: f64) -> Option<Seconds> {
    if !v.is_finite() || v < 0.0 {
        return None;
    }
    Seconds::checked_from_num(v)
}

/// Convert Fixed64 to f64. Use only for display, never in sim loop.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Ratio `elapsed / duration` as f32 for interpolation. A zero duration is
/// treated as already finished.
#[inline]
pub fn progress_ratio(elapsed: Seconds, duration: Seconds) -> f32 {
    match elapsed.checked_div(duration) {
        Some(ratio) => ratio.to_num::<f32>(),
        None => 1.0,
    }
}
