pub mod filter;
pub mod id;
pub mod payload;
pub mod validation;
