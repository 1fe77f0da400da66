#![doc = svgbobdoc::transform!(
//! Renders a deck of game cards to a single printable page.
//!
//! # Overview
//!
//! A deck lives in an asset directory. Its files share a _prefix_, `_card` by
//! default:
//!
//!   * `_card.csv` or `_card.json`: the card data, one record per card.
//!   * `_card.html.jinja2`: the template every card is rendered through.
//!   * `_card.html`: an optional header embedded in the page.
//!   * `rules.md`: an optional rules document.
//!
//! Every render runs the following pipeline from scratch:
//!
//! ```svgbob
//!  +-----------+     +--------------+     +-----------+     +------------+
//!  | _card.csv |---->| load records |---->| fan out + |---->|  compose   |
//!  | .json     |     +--------------+     |  render   |     |    page    |
//!  +-----------+                          +-----+-----+     +-----+------+
//!                                               ^                 |
//!                      +------------------+     |                 v
//!                      | _card.html.jinja2|-----+           +------------+
//!                      +------------------+                 | index.html |
//!                                                           +------------+
//!  +----------+     +----------+     +----------------+     +------------+
//!  | rules.md |---->| markdown |---->| rules template |---->| rules.html |
//!  +----------+     +----------+     +----------------+     +------------+
//! ```
//!
//! ## Fan-out
//!
//! Each record produces zero or more card _fragments_, in record order:
//!
//! 1. A record whose `ignore` field is `true` produces nothing.
//! 2. A record with non-empty `suits` produces one fragment per suit, with
//!    `suit` set to that suit.
//! 3. Otherwise the record renders once and repeats `num_cards` times,
//!    defaulting to one.
//!
//! Templates also see the original record as `__card_data` and the render
//! time in milliseconds as `__time`.
//!
//! ## Watching
//!
//! A [`Pipeline`](pipeline::Pipeline) re-renders on every
//! [`Change`](pipeline::Change) from a [`ChangeSource`](pipeline::ChangeSource)
//! that touches anything other than its own output.
)]

#[macro_use]
pub mod error;
pub mod util;
pub mod value;
pub mod config;
pub mod deck;
pub mod templating;
pub mod markdown;
pub mod compose;
pub mod rules;
pub mod pipeline;

pub use config::{Config, Settings};
pub use pipeline::{Pipeline, Report, Change, ChangeSource, watch};

pub use rayon;
