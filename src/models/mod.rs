pub mod dataset;
pub mod message;

pub use dataset::*;
pub use message::*;
