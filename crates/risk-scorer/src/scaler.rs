//! Amount Scaling

use crate::{read_json, ArtifactError};
use serde::Deserialize;
use std::fmt::Debug;
use std::path::Path;
use tracing::info;

/// Scaler fitted on historical `Amount` values
pub trait AmountScaler: Send + Sync + Debug {
    fn transform(&self, amount: f64) -> f64;
}

/// Robust scaling: `(amount - center) / scale`, where center is the median and
/// scale the interquartile range of the training amounts.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RobustScaler {
    #[serde(alias = "center_")]
    center: f64,
    #[serde(alias = "scale_")]
    scale: f64,
}

impl RobustScaler {
    pub fn new(center: f64, scale: f64) -> Result<Self, ArtifactError> {
        let scaler = Self { center, scale };
        scaler.validate()?;
        Ok(scaler)
    }

    /// Pass-through scaler
    pub fn identity() -> Self {
        Self {
            center: 0.0,
            scale: 1.0,
        }
    }

    /// Load a scaler from JSON `{"center": .., "scale": ..}`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ArtifactError> {
        let scaler: Self = read_json(path.as_ref())?;
        scaler.validate()?;
        info!(
            center = scaler.center,
            scale = scaler.scale,
            "Amount scaler loaded"
        );
        Ok(scaler)
    }

    fn validate(&self) -> Result<(), ArtifactError> {
        if !self.center.is_finite() {
            return Err(ArtifactError::Invalid(format!(
                "scaler center {} is not finite",
                self.center
            )));
        }
        if !self.scale.is_finite() || self.scale == 0.0 {
            return Err(ArtifactError::Invalid(format!(
                "scaler scale {} must be finite and non-zero",
                self.scale
            )));
        }
        Ok(())
    }
}

impl AmountScaler for RobustScaler {
    fn transform(&self, amount: f64) -> f64 {
        (amount - self.center) / self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_transform() {
        let scaler = RobustScaler::new(22.0, 73.5).unwrap();
        assert!((scaler.transform(95.5) - 1.0).abs() < 1e-12);
        assert!((scaler.transform(22.0)).abs() < 1e-12);
        assert_eq!(RobustScaler::identity().transform(42.0), 42.0);
    }

    #[test]
    fn test_invalid_scale() {
        assert!(RobustScaler::new(1.0, 0.0).is_err());
        assert!(RobustScaler::new(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn test_load_with_sklearn_names() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"center_": 10.0, "scale_": 2.0}"#).unwrap();

        let scaler = RobustScaler::load(file.path()).unwrap();
        assert_eq!(scaler.transform(14.0), 2.0);
    }

    #[test]
    fn test_load_rejects_zero_scale() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"center": 10.0, "scale": 0.0}"#).unwrap();
        assert!(matches!(
            RobustScaler::load(file.path()),
            Err(ArtifactError::Invalid(_))
        ));
    }
}
