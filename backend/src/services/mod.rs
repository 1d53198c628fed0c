pub mod catalog;
pub mod labels;
pub mod products;
