//! Domain layer: payment value objects, notification types, result
//! aggregation and the ports the application layer talks through.

pub mod notification;
pub mod outcome;
pub mod payment;
pub mod ports;
