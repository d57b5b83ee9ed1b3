//! Infrastructure layer for the client application.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `flyt_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`network`** – The runtime context, the connection engine that owns the
//!   socket and its task, and the cross-thread command queue.
//!
//! - **`storage`** – TOML configuration file loading.

pub mod network;
pub mod storage;
