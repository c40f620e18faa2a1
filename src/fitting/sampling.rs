use crate::defaults::STDSIGMA;
use crate::error::{FitError, Result};
use ndarray::prelude::*;
use ndarray_rand::rand_distr::{Distribution, Normal};
use rand::Rng;

/// Draws `nsample` distances per bond type from a normal distribution centred in
/// `[r_min[i], r_max[i]]` and truncated to this interval. The interval spans
/// `2 * STDSIGMA` standard deviations. Samples outside of the interval are rejected.
/// A degenerate interval (`r_min == r_max`) yields this value exactly.
pub fn truncated_normal<R: Rng + ?Sized>(
    rng: &mut R,
    r_min: &[f64],
    r_max: &[f64],
    nsample: usize,
) -> Result<Array2<f64>> {
    if r_min.len() != r_max.len() {
        return Err(FitError::shape("upper bounds of the sampling intervals", r_min.len(), r_max.len()));
    }
    let mut samples: Array2<f64> = Array2::zeros((r_min.len(), nsample));
    for ((mut row, lower), upper) in samples
        .outer_iter_mut()
        .zip(r_min.iter().copied())
        .zip(r_max.iter().copied())
    {
        if !(lower <= upper) {
            return Err(FitError::config(format!(
                "invalid sampling interval [{}, {}]",
                lower, upper
            )));
        }
        if lower == upper {
            row.fill(lower);
            continue;
        }
        let normal = Normal::new(0.5 * (lower + upper), (upper - lower) / (2.0 * STDSIGMA))
            .map_err(|err| FitError::config(format!("invalid sampling distribution: {}", err)))?;
        for value in row.iter_mut() {
            *value = loop {
                let candidate: f64 = normal.sample(rng);
                if candidate >= lower && candidate <= upper {
                    break candidate;
                }
            };
        }
    }
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn degenerate_interval_gives_its_value() {
        let mut rng = StdRng::seed_from_u64(7);
        let samples = truncated_normal(&mut rng, &[2.5, 1.0], &[2.5, 3.0], 64).unwrap();
        assert!(samples.row(0).iter().all(|r| *r == 2.5));
        assert!(samples.row(1).iter().all(|r| *r >= 1.0 && *r <= 3.0));
    }

    #[test]
    fn samples_are_centred() {
        let mut rng = StdRng::seed_from_u64(11);
        let samples = truncated_normal(&mut rng, &[1.0], &[5.0], 4000).unwrap();
        let mean: f64 = samples.mean().unwrap();
        assert!((mean - 3.0).abs() < 0.1);
    }

    #[test]
    fn reversed_interval_is_rejected() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(truncated_normal(&mut rng, &[3.0], &[1.0], 4).is_err());
        assert!(truncated_normal(&mut rng, &[1.0, 2.0], &[3.0], 4).is_err());
    }
}
