//! Inbound adapters that translate external requests into user manager calls
//! while keeping framework details at the edge.

pub mod http;
