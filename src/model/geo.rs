use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AbsenError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coordinate {
    #[schema(example = -6.200000)]
    pub latitude: f64,
    #[schema(example = 106.816666)]
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn validate(&self) -> Result<(), AbsenError> {
        if !(-90.0..=90.0).contains(&self.latitude) || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(AbsenError::InvalidInput(format!(
                "Coordinate out of range: {}, {}",
                self.latitude, self.longitude
            )));
        }
        Ok(())
    }
}

/// Reference point and allowed radius, configured by an operator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeofenceSettings {
    pub reference: Coordinate,
    #[schema(example = 100.0)]
    pub limit_m: f64,
}

impl GeofenceSettings {
    pub fn validate(&self) -> Result<(), AbsenError> {
        self.reference.validate()?;
        if !self.limit_m.is_finite() || self.limit_m < 0.0 {
            return Err(AbsenError::InvalidInput("limit_m must be a non-negative number".into()));
        }
        Ok(())
    }
}
