pub mod coerce;
pub mod data_type;
pub mod value;
