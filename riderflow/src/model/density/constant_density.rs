use super::{DensityError, DensitySource};

/// the same count everywhere
#[derive(Debug, Clone)]
pub struct ConstantDensity {
    name: String,
    count: u64,
}

impl ConstantDensity {
    pub fn new(name: &str, count: u64) -> ConstantDensity {
        ConstantDensity {
            name: name.to_string(),
            count,
        }
    }
}

impl DensitySource for ConstantDensity {
    fn name(&self) -> &str {
        &self.name
    }

    fn count_within(&self, _lat: f64, _lon: f64, radius_m: f64) -> Result<u64, DensityError> {
        if !radius_m.is_finite() || radius_m < 0.0 {
            return Err(DensityError::InvalidInput(format!(
                "radius {radius_m} must be finite and non-negative"
            )));
        }
        Ok(self.count)
    }
}
