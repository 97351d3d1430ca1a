//! Password hashing and credential extraction adapters.

mod argon2_processor;

pub use argon2_processor::Argon2Processor;
