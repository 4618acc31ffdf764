//! Storage, audit and cache adapters behind the domain ports.

pub mod in_memory;
