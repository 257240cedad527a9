//! Data models

mod distribution;
mod port;
mod proxy;
mod service;

pub use distribution::*;
pub use port::*;
pub use proxy::*;
pub use service::*;
