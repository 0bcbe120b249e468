pub mod attribute;
pub mod error;
pub mod heatmap;
pub mod record;
pub mod scoring;

pub use attribute::*;
pub use error::*;
pub use heatmap::*;
pub use record::*;
pub use scoring::*;
