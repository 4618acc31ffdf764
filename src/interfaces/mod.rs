//! Inbound/outbound data interfaces for the demo binary.

pub mod csv;
