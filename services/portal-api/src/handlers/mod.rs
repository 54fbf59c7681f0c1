//! REST API handlers

pub mod access;
pub mod attendance;
pub mod company;
pub mod health;
pub mod roster;

pub use access::*;
pub use attendance::*;
pub use company::*;
pub use health::*;
pub use roster::*;
