//! Vehicle-control adapters.
//!
//! Only the in-process simulator ships here.  A bridge to real flight
//! middleware implements the same [`VehicleControl`] trait.
//!
//! [`VehicleControl`]: crate::application::vehicle::VehicleControl

pub mod simulated;
