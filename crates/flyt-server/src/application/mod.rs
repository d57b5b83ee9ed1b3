//! Application layer use cases for the server application.
//!
//! - **`vehicle`** – The two service seams the handlers call through:
//!   [`vehicle::VehicleControl`] for flight commands and
//!   [`vehicle::FrameSource`] for camera frames.  Implementations live in the
//!   infrastructure layer and are injected at construction time.
//!
//! - **`dispatch`** – Maps each parsed [`flyt_core::Command`] to exactly one
//!   service call and turns the outcome into a result code plus optional
//!   data line.
//!
//! - **`session`** – The read → dispatch → respond loop for one connection.

pub mod dispatch;
pub mod session;
pub mod vehicle;
