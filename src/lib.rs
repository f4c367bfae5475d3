pub mod config;
pub mod dcel;
pub mod error;
pub mod ir;
pub mod layout;
pub mod layout_dump;

pub use config::LayoutOptions;
pub use error::LayoutError;
pub use layout::{Layout, LayoutPipeline, compute_layout};
