//! flyt-server library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does flyt-server do?
//!
//! The server sits next to the vehicle.  It accepts TCP connections, reads
//! one request line at a time, turns each into exactly one call on the
//! vehicle-control service (or one read of the latest camera frame), and
//! answers with a result line and a data line.
//!
//! ```text
//! CommandServer (accept loop)
//!  └─ one task per connection ── serve_connection
//!                                  └─ CommandDispatcher
//!                                       ├─ VehicleControl  (SimulatedVehicle)
//!                                       └─ FrameSource     (LatestFrame ◀── synthetic camera)
//! ```

/// Application layer: command dispatch and the per-connection session loop.
pub mod application;

/// Infrastructure layer: listener, vehicle and camera adapters, configuration.
pub mod infrastructure;
