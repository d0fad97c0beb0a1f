pub mod enricher;
pub mod error;
pub mod lookup;
pub mod output;
