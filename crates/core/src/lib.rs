#![forbid(unsafe_code)]

pub mod error;
pub mod milestone;
pub mod model;
pub mod progress;
pub mod ranking;
pub mod time;
pub mod window;

pub use error::Error;
pub use time::Clock;
