//! End-to-end flows across the subsystems.

pub mod flows;
