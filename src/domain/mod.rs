//! Domain layer: value objects, entities and the ports the application
//! layer depends on.

pub mod audit;
pub mod balance;
pub mod job;
pub mod ports;
pub mod transaction;
