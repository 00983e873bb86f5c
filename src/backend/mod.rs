pub mod client;
pub mod product;
