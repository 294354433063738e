/// An org-mode document parser and HTML renderer
pub mod ast;
pub mod classify;
pub mod error;
pub mod inline;
pub mod org;
pub mod parser;
pub mod renderer;

use std::io::BufRead;

pub use ast::{Document, Event, NodeId, NodeKind, Options};
pub use error::{Error, Result};
pub use parser::Parser;
pub use renderer::{HtmlRenderer, RenderOptions};

/// Parse org text into a document tree
pub fn parse(input: &str) -> Document {
    Parser::new().parse(input)
}

/// Parse an already split sequence of lines
pub fn parse_lines<I, S>(lines: I) -> Document
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parser = Parser::new();
    for line in lines {
        parser.feed(line.as_ref());
    }
    parser.finish()
}

/// Parse org text from a reader. Fails on I/O errors and non-UTF-8 input.
pub fn parse_reader<R: BufRead>(reader: R) -> Result<Document> {
    let mut parser = Parser::new();
    for line in reader.lines() {
        parser.feed(&line?);
    }
    Ok(parser.finish())
}

/// Parse org text and render it to HTML
pub fn org_to_html(input: &str, options: &RenderOptions) -> String {
    let doc = parse(input);
    HtmlRenderer::with_options(*options).render(&doc)
}
