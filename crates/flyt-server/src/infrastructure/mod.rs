//! Infrastructure layer for the server application.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `flyt_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`network`** – TCP listener and per-connection task spawning.
//! - **`vehicle`** – `VehicleControl` implementations.
//! - **`camera`** – The latest-frame slot and the synthetic camera feed.
//! - **`storage`** – TOML configuration file loading.

pub mod camera;
pub mod network;
pub mod storage;
pub mod vehicle;
