use std::borrow::Cow;

use pulldown_cmark::Event;

use crate::error::Result;

/// A stream of Markdown events.
pub type Events<'a> = Box<dyn Iterator<Item = Event<'a>> + 'a>;

/// One stage of a [`Markdown`](crate::markdown::Markdown) pipeline.
///
/// Plugins see the raw input first, in the order they were added, then wrap
/// the event stream, again in order. `finalize` runs once the stream has
/// been consumed.
pub trait Plugin {
    #[inline(always)]
    fn preprocess<'a>(&self, input: &'a str) -> Result<Cow<'a, str>> {
        Ok(Cow::Borrowed(input))
    }

    #[inline(always)]
    fn remap<'a>(&'a mut self, events: Events<'a>) -> Events<'a> {
        events
    }

    #[inline(always)]
    fn finalize(&mut self) -> Result<()> {
        Ok(())
    }
}
