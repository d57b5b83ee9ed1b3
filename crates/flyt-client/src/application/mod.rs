//! Application layer use cases for the client application.
//!
//! - **`session`** – One command's round trip on an open line stream: write
//!   the request, read the result line and the data line, and hand a decoded
//!   camera frame to the request's callback.  The socket and the task that
//!   owns it live in the infrastructure layer; this module only sees a
//!   [`flyt_core::LineStream`].

pub mod session;
