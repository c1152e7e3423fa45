//! Local backscatter anomaly
//!
//! A structure under the canopy lifts the median return above its
//! surroundings. The local z-score is taken against a circular window
//! and scored from `sigma` (0) to `2·sigma` (1).

use subcanopy_algorithms::statistics::{focal_statistics, FocalParams, FocalStatistic};
use subcanopy_core::raster::Raster;

use super::{unit_score, Windowing};
use crate::error::{DetectError, Result};

/// Floor applied to the local standard deviation
pub const STD_FLOOR: f64 = 1e-6;

/// Z-score of every cell against the circular window of `radius` around it.
///
/// The window includes the cell itself and uses the population standard
/// deviation, floored at [`STD_FLOOR`].
pub fn local_zscore(
    raster: &Raster<f64>,
    radius: usize,
    windowing: Windowing,
) -> Result<Raster<f64>> {
    let params = FocalParams {
        radius,
        statistic: FocalStatistic::ZScore {
            std_floor: STD_FLOOR,
        },
        circular: true,
    };
    windowing.apply(raster, |w| focal_statistics(w, params.clone()))
}

/// Anomaly score `clamp((z - sigma) / sigma, 0, 1)` of the median image
pub fn anomaly_score(
    median_db: &Raster<f64>,
    radius: usize,
    sigma: f64,
    windowing: Windowing,
) -> Result<Raster<f64>> {
    if !(sigma > 0.0) {
        return Err(DetectError::InvalidConfig(format!(
            "anomaly_sigma must be positive, got {sigma}"
        )));
    }
    let z = local_zscore(median_db, radius, windowing)?;
    unit_score(&z, |z| (z - sigma) / sigma)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn flat_with_spike(size: usize, spike: f64) -> Raster<f64> {
        let mut r = Raster::filled(size, size, -10.0);
        r.set(size / 2, size / 2, spike).unwrap();
        r
    }

    #[test]
    fn test_flat_scene_scores_zero() {
        let r = Raster::filled(9, 9, -8.0);
        let score = anomaly_score(&r, 3, 1.5, Windowing::whole()).unwrap();
        // Zero variance: z = 0 / floor = 0
        assert!(score.data().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_spike_saturates() {
        let r = flat_with_spike(11, 0.0);
        let score = anomaly_score(&r, 2, 1.5, Windowing::whole()).unwrap();
        // Circle of radius 2 holds 13 cells; a lone spike sits at z = sqrt(12)
        assert_relative_eq!(score.get(5, 5).unwrap(), 1.0);
        assert_relative_eq!(score.get(0, 0).unwrap(), 0.0, epsilon = 1e-6);
        // Neighbours of the spike are pulled below the local mean
        assert_relative_eq!(score.get(5, 6).unwrap(), 0.0);
    }

    #[test]
    fn test_local_zscore_value() {
        let r = flat_with_spike(11, 0.0);
        let z = local_zscore(&r, 2, Windowing::whole()).unwrap();
        assert_relative_eq!(z.get(5, 5).unwrap(), 12f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn test_nan_input_stays_nan() {
        let mut r = flat_with_spike(9, -2.0);
        r.set(1, 1, f64::NAN).unwrap();
        let score = anomaly_score(&r, 2, 1.5, Windowing::whole()).unwrap();
        assert!(score.get(1, 1).unwrap().is_nan());
        assert!(score.get(1, 2).unwrap().is_finite());
    }

    #[test]
    fn test_non_positive_sigma_rejected() {
        let r = Raster::filled(3, 3, 0.0);
        assert!(anomaly_score(&r, 1, 0.0, Windowing::whole()).is_err());
    }
}
