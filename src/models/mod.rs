pub mod context;
pub mod token;
