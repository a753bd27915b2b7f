//! Markdown-to-HTML rendering.

use pulldown_cmark::{Options, Parser, html};

use ghostwriter_shared::ParseError;

fn options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_FOOTNOTES
}

/// Render a CommonMark body (plus tables, strikethrough and footnotes) to HTML.
pub(crate) fn render_html(markdown: &str) -> Result<String, ParseError> {
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    let parser = Parser::new_ext(markdown, options());

    html::write_html_fmt(&mut out, parser)
        .map_err(|e| ParseError::RenderFailed(e.to_string()))?;

    Ok(out)
}
