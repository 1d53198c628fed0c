//! Models shared between the label service and its clients.

pub mod jobs;
pub mod model;
pub mod requests;
