//! The closed set of flight commands and their text encoding.
//!
//! # Wire format
//!
//! One command per line, fields in fixed order, optional fields omitted when
//! absent:
//!
//! ```text
//! arm
//! disarm
//! take_off altitude:<float>
//! land [async:<bool>]
//! position_setpoint position:{x,y,z} [yaw:<float>] [relative:<bool>] [body_frame:<bool>]
//! velocity_setpoint velocity:{x,y,z} [yaw_rate:<float>] [relative:<bool>] [body_frame:<bool>]
//! attitude_setpoint rpy:{x,y,z} thrust:<float>
//! get_image
//! ```
//!
//! Every request may also carry `async:<bool>` directly after the name.
//! Only `land` gives it a meaning; for the other kinds it is accepted and
//! dropped.

use std::fmt;

use crate::protocol::error::ProtocolError;
use crate::protocol::grammar::Cursor;

/// A 3-component float vector, written on the wire as `{x,y,z}`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl From<[f32; 3]> for Vector3 {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for Vector3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{},{},{}}}", self.x, self.y, self.z)
    }
}

/// A flight command.
///
/// The same type is used by both ends of the link, so
/// `Command::parse(&cmd.encode()) == Ok(cmd)` for every value.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Arm,
    Disarm,
    TakeOff {
        altitude: f32,
    },
    Land {
        /// Return before the vehicle has touched down.
        asynchronous: Option<bool>,
    },
    PositionSetpoint {
        position: Vector3,
        yaw: Option<f32>,
        relative: Option<bool>,
        body_frame: Option<bool>,
    },
    VelocitySetpoint {
        velocity: Vector3,
        yaw_rate: Option<f32>,
        relative: Option<bool>,
        body_frame: Option<bool>,
    },
    AttitudeSetpoint {
        rpy: Vector3,
        thrust: f32,
    },
    GetImage,
}

impl Command {
    // ── Convenience constructors ─────────────────────────────────────────────

    pub fn take_off(altitude: f32) -> Self {
        Self::TakeOff { altitude }
    }

    /// `land` always carries its `async` flag when built here.
    pub fn land(asynchronous: bool) -> Self {
        Self::Land {
            asynchronous: Some(asynchronous),
        }
    }

    /// Position setpoint with `relative` and `body_frame` spelled out.
    pub fn position_setpoint(
        position: Vector3,
        yaw: Option<f32>,
        relative: bool,
        body_frame: bool,
    ) -> Self {
        Self::PositionSetpoint {
            position,
            yaw,
            relative: Some(relative),
            body_frame: Some(body_frame),
        }
    }

    /// Velocity setpoint with `relative` and `body_frame` spelled out.
    pub fn velocity_setpoint(
        velocity: Vector3,
        yaw_rate: Option<f32>,
        relative: bool,
        body_frame: bool,
    ) -> Self {
        Self::VelocitySetpoint {
            velocity,
            yaw_rate,
            relative: Some(relative),
            body_frame: Some(body_frame),
        }
    }

    pub fn attitude_setpoint(rpy: Vector3, thrust: f32) -> Self {
        Self::AttitudeSetpoint { rpy, thrust }
    }

    // ── Wire format ──────────────────────────────────────────────────────────

    /// The wire token that starts this command's line.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Arm => "arm",
            Self::Disarm => "disarm",
            Self::TakeOff { .. } => "take_off",
            Self::Land { .. } => "land",
            Self::PositionSetpoint { .. } => "position_setpoint",
            Self::VelocitySetpoint { .. } => "velocity_setpoint",
            Self::AttitudeSetpoint { .. } => "attitude_setpoint",
            Self::GetImage => "get_image",
        }
    }

    /// Encodes the command as one line, without the CRLF terminator.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use flyt_core::Command;
    ///
    /// assert_eq!(Command::take_off(12.5).encode(), "take_off altitude:12.5");
    /// assert_eq!(Command::land(true).encode(), "land async:true");
    /// ```
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Parses one request line (terminator already stripped).
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Parse`] if the name is unknown, a required
    /// field is missing, a value is malformed, or anything follows the last
    /// field.
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let mut cursor = Cursor::new(line);
        cursor.skip_whitespace();
        let name_offset = cursor.offset();
        let name = cursor.word()?;

        let asynchronous = if cursor.try_key("async") {
            Some(cursor.boolean()?)
        } else {
            None
        };

        let command = match name {
            "arm" => Self::Arm,
            "disarm" => Self::Disarm,
            "take_off" => {
                cursor.expect_key("altitude")?;
                Self::TakeOff {
                    altitude: cursor.float()?,
                }
            }
            "land" => Self::Land { asynchronous },
            "position_setpoint" => {
                cursor.expect_key("position")?;
                let position = Vector3::from(cursor.vector3()?);
                let yaw = optional_float(&mut cursor, "yaw")?;
                let (relative, body_frame) = frame_flags(&mut cursor)?;
                Self::PositionSetpoint {
                    position,
                    yaw,
                    relative,
                    body_frame,
                }
            }
            "velocity_setpoint" => {
                cursor.expect_key("velocity")?;
                let velocity = Vector3::from(cursor.vector3()?);
                let yaw_rate = optional_float(&mut cursor, "yaw_rate")?;
                let (relative, body_frame) = frame_flags(&mut cursor)?;
                Self::VelocitySetpoint {
                    velocity,
                    yaw_rate,
                    relative,
                    body_frame,
                }
            }
            "attitude_setpoint" => {
                cursor.expect_key("rpy")?;
                let rpy = Vector3::from(cursor.vector3()?);
                cursor.expect_key("thrust")?;
                Self::AttitudeSetpoint {
                    rpy,
                    thrust: cursor.float()?,
                }
            }
            "get_image" => Self::GetImage,
            _ => {
                return Err(ProtocolError::Parse {
                    expected: "command name",
                    offset: name_offset,
                })
            }
        };

        cursor.finish()?;
        Ok(command)
    }
}

fn optional_float(cursor: &mut Cursor<'_>, key: &str) -> Result<Option<f32>, ProtocolError> {
    if cursor.try_key(key) {
        cursor.float().map(Some)
    } else {
        Ok(None)
    }
}

fn optional_bool(cursor: &mut Cursor<'_>, key: &str) -> Result<Option<bool>, ProtocolError> {
    if cursor.try_key(key) {
        cursor.boolean().map(Some)
    } else {
        Ok(None)
    }
}

fn frame_flags(cursor: &mut Cursor<'_>) -> Result<(Option<bool>, Option<bool>), ProtocolError> {
    let relative = optional_bool(cursor, "relative")?;
    let body_frame = optional_bool(cursor, "body_frame")?;
    Ok((relative, body_frame))
}

struct Opt<'a, T>(&'a str, Option<T>);

impl<T: fmt::Display> fmt::Display for Opt<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.1 {
            Some(value) => write!(f, " {}:{}", self.0, value),
            None => Ok(()),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())?;
        match self {
            Self::Arm | Self::Disarm | Self::GetImage => Ok(()),
            Self::TakeOff { altitude } => write!(f, " altitude:{altitude}"),
            Self::Land { asynchronous } => write!(f, "{}", Opt("async", *asynchronous)),
            Self::PositionSetpoint {
                position,
                yaw,
                relative,
                body_frame,
            } => write!(
                f,
                " position:{position}{}{}{}",
                Opt("yaw", *yaw),
                Opt("relative", *relative),
                Opt("body_frame", *body_frame)
            ),
            Self::VelocitySetpoint {
                velocity,
                yaw_rate,
                relative,
                body_frame,
            } => write!(
                f,
                " velocity:{velocity}{}{}{}",
                Opt("yaw_rate", *yaw_rate),
                Opt("relative", *relative),
                Opt("body_frame", *body_frame)
            ),
            Self::AttitudeSetpoint { rpy, thrust } => write!(f, " rpy:{rpy} thrust:{thrust}"),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_off_encodes_exactly() {
        assert_eq!(Command::take_off(12.5).encode(), "take_off altitude:12.5");
    }

    #[test]
    fn test_whole_floats_encode_without_fraction() {
        assert_eq!(Command::take_off(1.0).encode(), "take_off altitude:1");
    }

    #[test]
    fn test_bare_commands_encode_as_name_only() {
        assert_eq!(Command::Arm.encode(), "arm");
        assert_eq!(Command::Disarm.encode(), "disarm");
        assert_eq!(Command::GetImage.encode(), "get_image");
        assert_eq!(Command::Land { asynchronous: None }.encode(), "land");
    }

    #[test]
    fn test_position_setpoint_constructor_spells_out_frame_flags() {
        let cmd = Command::position_setpoint(Vector3::new(1.0, 2.0, -3.5), None, false, true);
        assert_eq!(
            cmd.encode(),
            "position_setpoint position:{1,2,-3.5} relative:false body_frame:true"
        );
    }

    #[test]
    fn test_velocity_setpoint_with_yaw_rate() {
        let cmd = Command::velocity_setpoint(Vector3::new(0.5, 0.0, 0.0), Some(0.25), true, false);
        assert_eq!(
            cmd.encode(),
            "velocity_setpoint velocity:{0.5,0,0} yaw_rate:0.25 relative:true body_frame:false"
        );
    }

    #[test]
    fn test_attitude_setpoint_encoding() {
        let cmd = Command::attitude_setpoint(Vector3::new(0.1, -0.1, 0.0), 0.6);
        assert_eq!(cmd.encode(), "attitude_setpoint rpy:{0.1,-0.1,0} thrust:0.6");
    }

    #[test]
    fn test_parse_tolerates_extra_whitespace() {
        let cmd = Command::parse("  position_setpoint   position:{ 1 , 2 ,3 }\tyaw:90 ").unwrap();
        assert_eq!(
            cmd,
            Command::PositionSetpoint {
                position: Vector3::new(1.0, 2.0, 3.0),
                yaw: Some(90.0),
                relative: None,
                body_frame: None,
            }
        );
    }

    #[test]
    fn test_parse_optional_fields_absent() {
        let cmd = Command::parse("velocity_setpoint velocity:{0,0,1}").unwrap();
        assert_eq!(
            cmd,
            Command::VelocitySetpoint {
                velocity: Vector3::new(0.0, 0.0, 1.0),
                yaw_rate: None,
                relative: None,
                body_frame: None,
            }
        );
    }

    #[test]
    fn test_parse_keeps_async_on_land_only() {
        assert_eq!(
            Command::parse("land async:false").unwrap(),
            Command::Land { asynchronous: Some(false) }
        );
        assert_eq!(Command::parse("arm async:true").unwrap(), Command::Arm);
        assert_eq!(
            Command::parse("take_off async:true altitude:3").unwrap(),
            Command::take_off(3.0)
        );
    }

    #[test]
    fn test_parse_unknown_name_reports_name_offset() {
        assert_eq!(
            Command::parse("  hover"),
            Err(ProtocolError::Parse { expected: "command name", offset: 2 })
        );
    }

    #[test]
    fn test_parse_requires_whole_word_name() {
        assert!(Command::parse("armed").is_err());
        assert!(Command::parse("arm_now").is_err());
    }

    #[test]
    fn test_parse_rejects_trailing_garbage() {
        let err = Command::parse("arm now").unwrap_err();
        assert_eq!(err, ProtocolError::Parse { expected: "end of line", offset: 4 });
    }

    #[test]
    fn test_parse_missing_required_field() {
        let err = Command::parse("take_off").unwrap_err();
        assert!(matches!(err, ProtocolError::Parse { expected: "altitude", .. }));

        let err = Command::parse("attitude_setpoint rpy:{0,0,0}").unwrap_err();
        assert!(matches!(err, ProtocolError::Parse { expected: "thrust", .. }));
    }

    #[test]
    fn test_parse_fields_out_of_order_are_rejected() {
        assert!(Command::parse("position_setpoint position:{0,0,0} relative:true yaw:1").is_err());
    }

    #[test]
    fn test_parse_malformed_value() {
        assert!(Command::parse("take_off altitude:high").is_err());
        assert!(Command::parse("land async:yes").is_err());
        assert!(Command::parse("position_setpoint position:{1,2,}").is_err());
    }

    #[test]
    fn test_parse_empty_line() {
        assert!(matches!(
            Command::parse(""),
            Err(ProtocolError::Parse { expected: "identifier", offset: 0 })
        ));
    }

    #[test]
    fn test_name_matches_encoded_prefix() {
        let commands = [
            Command::Arm,
            Command::land(false),
            Command::take_off(2.0),
            Command::attitude_setpoint(Vector3::default(), 0.5),
        ];
        for cmd in commands {
            assert!(cmd.encode().starts_with(cmd.name()));
        }
    }
}
