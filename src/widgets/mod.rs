//! Widget records and the collections they are stored in

mod data;

pub use data::*;
