pub mod catalog;
pub mod label;
pub mod lenient;
pub mod product;
