pub mod client;
pub mod error;
pub mod projection;
pub mod query;
