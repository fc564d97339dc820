pub mod absence;
pub mod shared;
