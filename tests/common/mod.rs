#![allow(dead_code)]

use arclight::cosmic::{Aberration, BodyShape, Ephemerides, FrameConverter, TargetEphemeris};
use arclight::linalg::{Vector3, Vector6};
use arclight::time::{Duration, Epoch};
use arclight::EventError;
use std::collections::HashMap;

/// Analytic circular orbit about the origin, in the plane spanned by two
/// orthonormal axes: no propagation needed for a deterministic scene.
pub struct CircularTarget {
    pub name: String,
    pub epoch0: Epoch,
    pub span: Duration,
    pub radius_km: f64,
    pub period_s: f64,
    /// Radial unit vector at the start epoch
    pub u: Vector3<f64>,
    /// Radial unit vector a quarter period later
    pub v: Vector3<f64>,
}

impl CircularTarget {
    pub fn omega(&self) -> f64 {
        std::f64::consts::TAU / self.period_s
    }

    fn theta(&self, epoch: Epoch) -> f64 {
        self.omega() * (epoch - self.epoch0).to_seconds()
    }
}

impl TargetEphemeris for CircularTarget {
    fn name(&self) -> &str {
        &self.name
    }

    fn epoch(&self) -> Epoch {
        self.epoch0
    }

    fn span(&self) -> (Epoch, Epoch) {
        (self.epoch0, self.epoch0 + self.span)
    }

    fn state_km(&self, epoch: Epoch) -> Result<Vector6<f64>, EventError> {
        let (s, c) = self.theta(epoch).sin_cos();
        let pos = (self.u * c + self.v * s) * self.radius_km;
        let vel = (self.v * c - self.u * s) * (self.radius_km * self.omega());
        Ok(Vector6::new(pos.x, pos.y, pos.z, vel.x, vel.y, vel.z))
    }

    fn acceleration_km_s2(&self, epoch: Epoch) -> Option<Vector3<f64>> {
        let (s, c) = self.theta(epoch).sin_cos();
        let pos = (self.u * c + self.v * s) * self.radius_km;
        Some(-pos * self.omega().powi(2))
    }
}

/// Celestial bodies pinned at fixed positions.
#[derive(Default)]
pub struct StaticScene {
    bodies: HashMap<String, (Vector3<f64>, BodyShape)>,
}

impl StaticScene {
    pub fn with_body(mut self, name: &str, pos_km: Vector3<f64>, radius_km: f64) -> Self {
        self.bodies
            .insert(name.to_string(), (pos_km, BodyShape::spherical(name, radius_km)));
        self
    }
}

impl Ephemerides for StaticScene {
    fn state_km(
        &self,
        body: &str,
        epoch: Epoch,
        _ab: Aberration,
    ) -> Result<Vector6<f64>, EventError> {
        self.bodies
            .get(body)
            .map(|(pos, _)| Vector6::new(pos.x, pos.y, pos.z, 0.0, 0.0, 0.0))
            .ok_or_else(|| EventError::EphemerisQuery {
                name: body.to_string(),
                epoch,
                details: "body is not in the scene".to_string(),
            })
    }

    fn shape(&self, body: &str) -> Result<BodyShape, EventError> {
        self.bodies
            .get(body)
            .map(|(_, shape)| shape.clone())
            .ok_or_else(|| EventError::EphemerisQuery {
                name: body.to_string(),
                epoch: Epoch::from_tai_seconds(0.0),
                details: "body is not in the scene".to_string(),
            })
    }
}

/// Identity frame converter: every body fixed frame coincides with MJ2000
/// (non rotating bodies).
pub struct InertialFrames;

impl FrameConverter for InertialFrames {
    fn to_body_fixed(
        &self,
        _body: &str,
        _epoch: Epoch,
        state_mj2000: &Vector6<f64>,
    ) -> Result<Vector6<f64>, EventError> {
        Ok(*state_mj2000)
    }

    fn from_body_fixed(
        &self,
        _body: &str,
        _epoch: Epoch,
        state_fixed: &Vector6<f64>,
    ) -> Result<Vector6<f64>, EventError> {
        Ok(*state_fixed)
    }
}
