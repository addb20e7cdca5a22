use crate::config::ConfigurationError;
use rand::Rng;
use rand_distr::{Distribution, Poisson};

/// draws the number of commuters spawned in one cycle from a Poisson
/// distribution with mean `lambda`. each draw is independent; unspawned
/// demand is not carried into the next cycle.
pub fn sample_spawn_count<R: Rng + ?Sized>(
    lambda: f64,
    rng: &mut R,
) -> Result<u64, ConfigurationError> {
    if !lambda.is_finite() || lambda < 0.0 {
        return Err(ConfigurationError::InvalidSpawnConfig(format!(
            "poisson mean must be finite and non-negative, found {lambda}"
        )));
    }
    if lambda == 0.0 {
        return Ok(0);
    }
    let poisson = Poisson::new(lambda).map_err(|e| {
        ConfigurationError::InvalidSpawnConfig(format!("invalid poisson mean {lambda}: {e}"))
    })?;
    let draw: f64 = poisson.sample(rng);
    Ok(draw as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_zero_lambda_never_spawns() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(sample_spawn_count(0.0, &mut rng).unwrap(), 0);
        }
    }

    #[test]
    fn test_seeded_draws_repeat() {
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        let xs: Vec<u64> = (0..20)
            .map(|_| sample_spawn_count(9.75, &mut a).unwrap())
            .collect();
        let ys: Vec<u64> = (0..20)
            .map(|_| sample_spawn_count(9.75, &mut b).unwrap())
            .collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_sample_mean_near_lambda() {
        let mut rng = StdRng::seed_from_u64(1234);
        let n = 20_000;
        let total: u64 = (0..n)
            .map(|_| sample_spawn_count(9.75, &mut rng).unwrap())
            .sum();
        let mean = total as f64 / n as f64;
        assert!((mean - 9.75).abs() < 0.15, "mean {mean}");
    }

    #[test]
    fn test_invalid_lambda() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(sample_spawn_count(-0.1, &mut rng).is_err());
        assert!(sample_spawn_count(f64::INFINITY, &mut rng).is_err());
    }
}
