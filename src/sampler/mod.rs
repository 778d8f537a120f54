//! Step-driven sampling
//!
//! - Observer registration and the sampler capability
//! - The sampling pipeline
//! - Proxies sharing one pipeline

pub mod observer;
pub mod pipeline;
pub mod proxy;
