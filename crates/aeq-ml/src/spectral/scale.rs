//! Power ↔ decibel conversion

use ndarray::Array2;

/// Power to dB referenced to the array's own maximum.
///
/// Values are floored at `amin` before the logarithm and, when `top_db` is
/// set, clipped to `top_db` below the resulting peak. An all-zero input maps
/// to 0 dB everywhere.
pub fn power_to_db(power: &Array2<f32>, amin: f32, top_db: Option<f32>) -> Array2<f32> {
    let reference = power.iter().copied().fold(0.0f32, f32::max);
    let ref_db = 10.0 * reference.max(amin).log10();

    let mut db = power.mapv(|p| 10.0 * p.max(amin).log10() - ref_db);

    if let Some(top_db) = top_db {
        let peak = db.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let floor = peak - top_db;
        db.mapv_inplace(|v| v.max(floor));
    }

    db
}

/// Inverse of [`power_to_db`] with unit reference
pub fn db_to_power(db: &Array2<f32>) -> Array2<f32> {
    db.mapv(|v| 10.0f32.powf(v / 10.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_peak_is_zero_db() {
        let power = array![[1.0f32, 0.1], [0.01, 4.0]];
        let db = power_to_db(&power, 1e-10, Some(80.0));
        assert_abs_diff_eq!(db[[1, 1]], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(db[[0, 0]], -6.0206, epsilon = 1e-3);
    }

    #[test]
    fn test_top_db_floor() {
        let power = array![[1.0f32, 1e-12]];
        let db = power_to_db(&power, 1e-10, Some(80.0));
        assert_abs_diff_eq!(db[[0, 1]], -80.0, epsilon = 1e-4);

        let unclipped = power_to_db(&power, 1e-10, None);
        assert_abs_diff_eq!(unclipped[[0, 1]], -100.0, epsilon = 1e-3);
    }

    #[test]
    fn test_silence_is_finite() {
        let power = Array2::<f32>::zeros((4, 3));
        let db = power_to_db(&power, 1e-10, Some(80.0));
        assert!(db.iter().all(|v| v.is_finite()));
        assert!(db.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_db_round_trip_relative() {
        let power = array![[2.0f32, 0.5], [1.0, 0.25]];
        let back = db_to_power(&power_to_db(&power, 1e-10, None));
        // Referenced to the peak (2.0)
        for (a, b) in back.iter().zip(power.iter()) {
            assert_abs_diff_eq!(*a, b / 2.0, epsilon = 1e-5);
        }
    }
}
