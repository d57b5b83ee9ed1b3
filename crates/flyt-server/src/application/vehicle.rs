//! Service seams between the command handlers and the vehicle.
//!
//! Each handler performs exactly one call on [`VehicleControl`] or one read
//! of [`FrameSource`].  Setpoint requests arrive fully resolved: optional
//! wire fields have been replaced with their defaults and a `*_valid` flag.

use std::sync::Arc;

use async_trait::async_trait;
use flyt_core::{Image, Vector3};
use thiserror::Error;

/// Failure reported by a vehicle-control service call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VehicleError {
    /// The service could not be reached.
    #[error("vehicle service unavailable: {0}")]
    Unavailable(String),

    /// The service refused the request.
    #[error("vehicle rejected the request: {0}")]
    Rejected(String),
}

/// A position target as handed to the vehicle service.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSetpoint {
    pub position: Vector3,
    pub yaw: f32,
    /// `false` means "keep the current heading"; `yaw` is then ignored.
    pub yaw_valid: bool,
    pub relative: bool,
    pub body_frame: bool,
    /// Return without waiting for the vehicle to reach the target.
    pub asynchronous: bool,
}

/// A velocity target as handed to the vehicle service.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocitySetpoint {
    pub velocity: Vector3,
    pub yaw_rate: f32,
    pub yaw_rate_valid: bool,
    pub relative: bool,
    pub body_frame: bool,
    pub asynchronous: bool,
}

/// An attitude target: roll/pitch/yaw in radians plus normalized thrust.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttitudeSetpoint {
    pub rpy: Vector3,
    pub thrust: f32,
}

/// Flight-control service the server drives.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VehicleControl: Send + Sync {
    async fn arm(&self) -> Result<(), VehicleError>;

    async fn disarm(&self) -> Result<(), VehicleError>;

    async fn take_off(&self, altitude: f32) -> Result<(), VehicleError>;

    /// `asynchronous` is `None` when the request did not say.
    async fn land(&self, asynchronous: Option<bool>) -> Result<(), VehicleError>;

    async fn position_setpoint(&self, setpoint: PositionSetpoint) -> Result<(), VehicleError>;

    async fn velocity_setpoint(&self, setpoint: VelocitySetpoint) -> Result<(), VehicleError>;

    async fn attitude_setpoint(&self, setpoint: AttitudeSetpoint) -> Result<(), VehicleError>;
}

/// Latest camera frame, if the camera has produced one yet.
///
/// Must not block: `get_image` answers immediately either way.
#[cfg_attr(test, mockall::automock)]
pub trait FrameSource: Send + Sync {
    fn latest_frame(&self) -> Option<Arc<Image>>;
}
