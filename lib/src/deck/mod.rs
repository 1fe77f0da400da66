//! Card data: records, loading, and the card rendering transform.

mod record;
mod load;
mod render;

pub use record::*;
pub use load::*;
pub use render::*;
