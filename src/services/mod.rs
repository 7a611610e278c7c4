pub mod persistence;
pub mod serving;
pub mod training;
