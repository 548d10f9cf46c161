pub mod agent;
pub mod message;
pub mod quiz;
pub mod workflow;

pub use agent::*;
pub use message::*;
pub use quiz::*;
pub use workflow::*;
