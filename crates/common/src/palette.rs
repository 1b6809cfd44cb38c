//! Built-in color palettes for point clouds.
//!
//! Palettes are immutable process-wide tables. Each is a 256-entry RGB ramp
//! evaluated at compile time from a handful of color stops and flattened to
//! `3 * 256` floats, the layout `Cloud::set_palette` expects.

/// Number of entries in each built-in palette.
pub const PALETTE_SIZE: usize = 256;

/// Floats in a flattened built-in palette.
pub const PALETTE_LEN: usize = 3 * PALETTE_SIZE;

const SPEZIA_STOPS: [[f32; 3]; 5] = [
    [0.043, 0.051, 0.318],
    [0.196, 0.353, 0.773],
    [0.149, 0.706, 0.659],
    [0.894, 0.871, 0.235],
    [0.918, 0.310, 0.165],
];

const CALREF_STOPS: [[f32; 3]; 6] = [
    [0.125, 0.000, 0.302],
    [0.102, 0.278, 0.824],
    [0.035, 0.667, 0.812],
    [0.278, 0.851, 0.349],
    [0.957, 0.839, 0.196],
    [0.863, 0.153, 0.137],
];

/// Default key coloring ramp (deep blue through teal and yellow to red).
pub static SPEZIA: [f32; PALETTE_LEN] = ramp(&SPEZIA_STOPS);

/// Ramp tuned for calibrated reflectivity keys.
pub static CALREF: [f32; PALETTE_LEN] = ramp(&CALREF_STOPS);

/// Piecewise-linear interpolation between evenly spaced color stops.
///
/// Entry `i` sits at `i * segments / 255` along the stops; integer division
/// picks the segment so the table can be evaluated in a const context.
const fn ramp(stops: &[[f32; 3]]) -> [f32; PALETTE_LEN] {
    let mut out = [0.0; PALETTE_LEN];
    let segments = stops.len() - 1;
    let last = PALETTE_SIZE - 1;
    let mut i = 0;
    while i < PALETTE_SIZE {
        let x = i * segments;
        let seg = if x / last < segments { x / last } else { segments - 1 };
        let frac = (x - seg * last) as f32 / last as f32;
        let mut c = 0;
        while c < 3 {
            let from = stops[seg][c];
            let to = stops[seg + 1][c];
            out[3 * i + c] = from + (to - from) * frac;
            c += 1;
        }
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palettes_have_expected_length() {
        assert_eq!(SPEZIA.len(), PALETTE_SIZE * 3);
        assert_eq!(CALREF.len(), PALETTE_SIZE * 3);
    }

    #[test]
    fn tables_are_built_at_compile_time() {
        const TABLE: [f32; PALETTE_LEN] = ramp(&SPEZIA_STOPS);
        assert_eq!(TABLE, SPEZIA);
    }

    #[test]
    fn ramp_hits_every_stop() {
        assert_eq!(&SPEZIA[..3], &SPEZIA_STOPS[0]);
        let last = &SPEZIA[PALETTE_LEN - 3..];
        for c in 0..3 {
            assert!((last[c] - SPEZIA_STOPS[4][c]).abs() < 1e-6);
        }
        // 255 / 5 segments puts every CALREF stop on an entry
        for (k, stop) in CALREF_STOPS.iter().enumerate().take(5) {
            assert_eq!(&CALREF[3 * 51 * k..3 * 51 * k + 3], stop);
        }
    }

    #[test]
    fn values_stay_in_unit_range() {
        assert!(SPEZIA.iter().chain(CALREF.iter()).all(|v| (0.0..=1.0).contains(v)));
    }
}
