#![cfg_attr(not(test), warn(unused_crate_dependencies))]

pub mod error;
pub mod model;
pub mod view;

pub use error::ViewError;
pub use model::EventViewModel;
pub use view::{EventView, Freshness, Listing};
