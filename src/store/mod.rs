pub mod file;
pub mod types;

pub use file::ServiceStore;
pub use types::{Service, sort_for_display};
