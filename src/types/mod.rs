pub mod coordinate;
pub mod outcome;
pub mod row;
pub mod value;
