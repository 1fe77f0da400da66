use pulldown_cmark::html;

use crate::markdown::{Events, Plugin};
use crate::error::Result;
use crate::value::Sink;

/// Renders the event stream as HTML into `output`.
#[derive(Debug, Clone)]
pub struct Renderer<O> {
    output: O,
    rendered: String,
}

impl<O: Sink> Renderer<O> {
    pub fn new(output: O) -> Self {
        Renderer { output, rendered: String::new() }
    }
}

impl<O: Sink> Plugin for Renderer<O> {
    fn remap<'a>(&'a mut self, events: Events<'a>) -> Events<'a> {
        let mut html_output = String::new();
        html::push_html(&mut html_output, events);
        self.rendered = html_output;
        Box::new(std::iter::empty())
    }

    fn finalize(&mut self) -> Result<()> {
        let string = std::mem::take(&mut self.rendered);
        self.output.write(string)
    }
}
