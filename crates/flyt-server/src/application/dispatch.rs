//! CommandDispatcher: one handler per command kind.
//!
//! | outcome                          | result code            | data line    |
//! |----------------------------------|------------------------|--------------|
//! | line does not parse              | `22 Invalid argument`  | empty        |
//! | vehicle call succeeded           | `0 Success`            | empty        |
//! | vehicle call failed              | `5 Input/output error` | empty        |
//! | `get_image`, no frame yet        | `63 Out of streams...` | empty        |
//! | `get_image`, frame available     | `0 Success`            | image line   |

use std::sync::Arc;

use flyt_core::{Command, ImageResponse, ResultCode, ResultLine};
use tracing::{debug, warn};

use crate::application::vehicle::{
    AttitudeSetpoint, FrameSource, PositionSetpoint, VehicleControl, VehicleError,
    VelocitySetpoint,
};

/// What to send back for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub result: ResultLine,
    /// Second response line; `None` sends an empty line.
    pub data: Option<String>,
}

impl Reply {
    pub fn status(code: ResultCode) -> Self {
        Self {
            result: code.into(),
            data: None,
        }
    }

    pub fn code(&self) -> i32 {
        self.result.code
    }
}

/// Dispatches parsed commands to the vehicle and camera services.
pub struct CommandDispatcher {
    vehicle: Arc<dyn VehicleControl>,
    frames: Arc<dyn FrameSource>,
}

impl CommandDispatcher {
    pub fn new(vehicle: Arc<dyn VehicleControl>, frames: Arc<dyn FrameSource>) -> Self {
        Self { vehicle, frames }
    }

    /// Parses and handles one request line.
    pub async fn handle_line(&self, line: &str) -> Reply {
        match Command::parse(line) {
            Ok(command) => self.dispatch(&command).await,
            Err(e) => {
                debug!(line, "rejecting request: {e}");
                Reply::status(ResultCode::InvalidArgument)
            }
        }
    }

    /// Handles one parsed command.
    pub async fn dispatch(&self, command: &Command) -> Reply {
        let outcome = match *command {
            Command::Arm => self.vehicle.arm().await,
            Command::Disarm => self.vehicle.disarm().await,
            Command::TakeOff { altitude } => self.vehicle.take_off(altitude).await,
            Command::Land { asynchronous } => self.vehicle.land(asynchronous).await,
            Command::PositionSetpoint {
                position,
                yaw,
                relative,
                body_frame,
            } => {
                self.vehicle
                    .position_setpoint(PositionSetpoint {
                        position,
                        yaw: yaw.unwrap_or(0.0),
                        yaw_valid: yaw.is_some(),
                        relative: relative.unwrap_or(false),
                        body_frame: body_frame.unwrap_or(false),
                        asynchronous: true,
                    })
                    .await
            }
            Command::VelocitySetpoint {
                velocity,
                yaw_rate,
                relative,
                body_frame,
            } => {
                self.vehicle
                    .velocity_setpoint(VelocitySetpoint {
                        velocity,
                        yaw_rate: yaw_rate.unwrap_or(0.0),
                        yaw_rate_valid: yaw_rate.is_some(),
                        relative: relative.unwrap_or(false),
                        body_frame: body_frame.unwrap_or(false),
                        asynchronous: true,
                    })
                    .await
            }
            Command::AttitudeSetpoint { rpy, thrust } => {
                self.vehicle
                    .attitude_setpoint(AttitudeSetpoint { rpy, thrust })
                    .await
            }
            Command::GetImage => return self.get_image(),
        };
        vehicle_reply(command, outcome)
    }

    fn get_image(&self) -> Reply {
        let Some(frame) = self.frames.latest_frame() else {
            return Reply::status(ResultCode::NoResource);
        };
        match ImageResponse::from_image(&frame) {
            Ok(response) => Reply {
                result: ResultCode::Success.into(),
                data: Some(response.encode()),
            },
            Err(e) => {
                warn!("cannot encode camera frame: {e}");
                Reply::status(ResultCode::IoError)
            }
        }
    }
}

fn vehicle_reply(command: &Command, outcome: Result<(), VehicleError>) -> Reply {
    match outcome {
        Ok(()) => Reply::status(ResultCode::Success),
        Err(e) => {
            warn!(command = command.name(), "vehicle call failed: {e}");
            Reply::status(ResultCode::IoError)
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
