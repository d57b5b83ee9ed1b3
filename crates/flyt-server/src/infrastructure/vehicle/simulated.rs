//! In-process vehicle that records every call.
//!
//! Stands in for the flight-middleware bridge in the binary and in tests.
//! Calls are logged and kept in a bounded in-memory history; flipping
//! [`SimulatedVehicle::set_failing`] makes every call fail, which exercises
//! the `io_error` path end to end.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tracing::info;

use crate::application::vehicle::{
    AttitudeSetpoint, PositionSetpoint, VehicleControl, VehicleError, VelocitySetpoint,
};

/// One recorded service call.
#[derive(Debug, Clone, PartialEq)]
pub enum VehicleCall {
    Arm,
    Disarm,
    TakeOff(f32),
    Land(Option<bool>),
    Position(PositionSetpoint),
    Velocity(VelocitySetpoint),
    Attitude(AttitudeSetpoint),
}

/// Most recent calls kept by [`SimulatedVehicle`]; older ones are dropped.
pub const CALL_HISTORY_LEN: usize = 1024;

#[derive(Debug, Default)]
pub struct SimulatedVehicle {
    calls: Mutex<VecDeque<VehicleCall>>,
    failing: AtomicBool,
}

impl SimulatedVehicle {
    pub fn new() -> Self {
        Self::default()
    }

    /// When `true`, every call returns [`VehicleError::Unavailable`] and is
    /// not recorded.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    /// The last [`CALL_HISTORY_LEN`] successful calls, oldest first.
    pub fn calls(&self) -> Vec<VehicleCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    fn record(&self, call: VehicleCall) -> Result<(), VehicleError> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(VehicleError::Unavailable("simulated failure".into()));
        }
        info!(?call, "vehicle");
        let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        if calls.len() == CALL_HISTORY_LEN {
            calls.pop_front();
        }
        calls.push_back(call);
        Ok(())
    }
}

#[async_trait]
impl VehicleControl for SimulatedVehicle {
    async fn arm(&self) -> Result<(), VehicleError> {
        self.record(VehicleCall::Arm)
    }

    async fn disarm(&self) -> Result<(), VehicleError> {
        self.record(VehicleCall::Disarm)
    }

    async fn take_off(&self, altitude: f32) -> Result<(), VehicleError> {
        self.record(VehicleCall::TakeOff(altitude))
    }

    async fn land(&self, asynchronous: Option<bool>) -> Result<(), VehicleError> {
        self.record(VehicleCall::Land(asynchronous))
    }

    async fn position_setpoint(&self, setpoint: PositionSetpoint) -> Result<(), VehicleError> {
        self.record(VehicleCall::Position(setpoint))
    }

    async fn velocity_setpoint(&self, setpoint: VelocitySetpoint) -> Result<(), VehicleError> {
        self.record(VehicleCall::Velocity(setpoint))
    }

    async fn attitude_setpoint(&self, setpoint: AttitudeSetpoint) -> Result<(), VehicleError> {
        self.record(VehicleCall::Attitude(setpoint))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_calls_are_recorded_in_order() {
        let vehicle = SimulatedVehicle::new();

        vehicle.arm().await.unwrap();
        vehicle.take_off(4.0).await.unwrap();
        vehicle.land(Some(false)).await.unwrap();

        assert_eq!(
            vehicle.calls(),
            vec![VehicleCall::Arm, VehicleCall::TakeOff(4.0), VehicleCall::Land(Some(false))]
        );
    }

    #[tokio::test]
    async fn test_failing_vehicle_rejects_and_records_nothing() {
        let vehicle = SimulatedVehicle::new();
        vehicle.set_failing(true);

        let result = vehicle.disarm().await;

        assert!(matches!(result, Err(VehicleError::Unavailable(_))));
        assert!(vehicle.calls().is_empty());

        vehicle.set_failing(false);
        assert!(vehicle.disarm().await.is_ok());
    }

    #[tokio::test]
    async fn test_history_keeps_only_the_latest_calls() {
        // Arrange
        let vehicle = SimulatedVehicle::new();

        // Act
        for i in 0..CALL_HISTORY_LEN + 10 {
            vehicle.take_off(i as f32).await.unwrap();
        }

        // Assert
        let calls = vehicle.calls();
        assert_eq!(calls.len(), CALL_HISTORY_LEN);
        assert_eq!(calls[0], VehicleCall::TakeOff(10.0));
        assert_eq!(
            calls[CALL_HISTORY_LEN - 1],
            VehicleCall::TakeOff((CALL_HISTORY_LEN + 9) as f32)
        );
    }
}
