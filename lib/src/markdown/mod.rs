//! A Markdown to HTML pipeline built from [`Plugin`]s.
//!
//! ```rust
//! use cardpress::markdown::{Markdown, AutoHeading, Renderer};
//! use cardpress::value::Slot;
//!
//! let html = Slot::new();
//! Markdown::from("# Setup\n\nShuffle the deck.")
//!     .plugin(AutoHeading::default())
//!     .plugin(Renderer::new(&html))
//!     .run()
//!     .unwrap();
//!
//! let html = html.take().unwrap();
//! assert!(html.as_str().unwrap().contains(r#"<h1 id="setup">"#));
//! ```

mod plugin;
mod markdown;
mod render;
mod auto_heading;
mod frontmatter;

pub use plugin::*;
pub use markdown::*;
pub use render::*;
pub use auto_heading::*;
pub use frontmatter::*;
