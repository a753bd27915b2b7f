//! Frontmatter splitting and Markdown rendering for post and page sources.
//!
//! A document is an optional YAML block fenced by `---` lines followed by a
//! Markdown body. [`parse`] splits the two, decodes the metadata and renders
//! the body to HTML.

mod render;

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;
use tokio::io::AsyncReadExt;
use tracing::{debug, instrument};

use ghostwriter_shared::{GhostwriterError, ParseError, Result};

/// Line that opens and closes the metadata block.
pub const DELIMITER: &str = "---";

/// Path that selects standard input in [`parse_file`].
pub const STDIN_PATH: &str = "-";

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A split and rendered document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedContent {
    /// Decoded metadata block; empty when the document has none.
    pub metadata: BTreeMap<String, Value>,
    /// Markdown body, one `\n` after every line.
    pub body: String,
    /// Rendered HTML of `body`.
    pub html: String,
}

/// Metadata keys understood by post and page commands. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostFrontmatter {
    pub title: Option<String>,
    pub slug: Option<String>,
    /// Accepts a list or a single string.
    #[serde(deserialize_with = "one_or_many")]
    pub tags: Vec<String>,
    pub featured: bool,
    pub status: Option<String>,
    pub excerpt: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub feature_image: Option<String>,
    pub published_at: Option<String>,
}

impl ParsedContent {
    /// Decode the metadata into the typed post fields.
    pub fn frontmatter(&self) -> std::result::Result<PostFrontmatter, ParseError> {
        let value = serde_yaml::to_value(&self.metadata).map_err(ParseError::BadMetadata)?;
        serde_yaml::from_value(value).map_err(ParseError::BadMetadata)
    }
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(tag)) => vec![tag],
        Some(OneOrMany::Many(tags)) => tags,
        None => Vec::new(),
    })
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

enum State {
    Start,
    InMetadata,
    Body,
}

/// Split `raw` into metadata and body, then render the body.
///
/// The first line opens a metadata block only if it trims to `---`. The block
/// runs to the next line that trims to `---`; input ending first is
/// [`ParseError::UnterminatedFrontmatter`]. After that every line, including
/// later `---` lines, is body text.
#[instrument(skip_all, fields(bytes = raw.len()))]
pub fn parse(raw: &[u8]) -> std::result::Result<ParsedContent, ParseError> {
    let text = std::str::from_utf8(raw).map_err(|_| ParseError::NotUtf8)?;

    let mut state = State::Start;
    let mut metadata_block = String::new();
    let mut body = String::new();

    for line in text.lines() {
        match state {
            State::Start => {
                if line.trim() == DELIMITER {
                    state = State::InMetadata;
                } else {
                    push_line(&mut body, line);
                    state = State::Body;
                }
            }
            State::InMetadata => {
                if line.trim() == DELIMITER {
                    state = State::Body;
                } else {
                    push_line(&mut metadata_block, line);
                }
            }
            State::Body => push_line(&mut body, line),
        }
    }

    if matches!(state, State::InMetadata) {
        return Err(ParseError::UnterminatedFrontmatter);
    }

    let metadata = decode_metadata(&metadata_block)?;
    let html = render::render_html(&body)?;
    debug!(keys = metadata.len(), body_len = body.len(), "document parsed");

    Ok(ParsedContent {
        metadata,
        body,
        html,
    })
}

/// Read and parse a file, or standard input when `path` is `-`.
///
/// Reads go through tokio so the caller can drop the future to abandon them.
pub async fn parse_file(path: &Path) -> Result<ParsedContent> {
    let raw = if path == Path::new(STDIN_PATH) {
        let mut buf = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut buf)
            .await
            .map_err(|e| GhostwriterError::io("<stdin>", e))?;
        buf
    } else {
        tokio::fs::read(path)
            .await
            .map_err(|e| GhostwriterError::io(path, e))?
    };

    Ok(parse(&raw)?)
}

fn push_line(buf: &mut String, line: &str) {
    buf.push_str(line);
    buf.push('\n');
}

fn decode_metadata(block: &str) -> std::result::Result<BTreeMap<String, Value>, ParseError> {
    if block.trim().is_empty() {
        return Ok(BTreeMap::new());
    }

    match serde_yaml::from_str::<Value>(block).map_err(ParseError::BadMetadata)? {
        Value::Null => Ok(BTreeMap::new()),
        mapping @ Value::Mapping(_) => {
            serde_yaml::from_value(mapping).map_err(ParseError::BadMetadata)
        }
        _ => Err(ParseError::BadMetadata(serde::de::Error::custom(
            "frontmatter must be a mapping of keys to values",
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_metadata_and_body() {
        let parsed = parse(b"---\ntitle: Hi\n---\nBody text\n").unwrap();
        assert_eq!(parsed.metadata.len(), 1);
        assert_eq!(parsed.metadata["title"], Value::String("Hi".into()));
        assert_eq!(parsed.body, "Body text\n");
        assert!(parsed.html.contains("<p>Body text</p>"));
    }

    #[test]
    fn no_delimiter_means_whole_input_is_body() {
        let input = "# Heading\n\nParagraph one.\n";
        let parsed = parse(input.as_bytes()).unwrap();
        assert!(parsed.metadata.is_empty());
        assert_eq!(parsed.body, input);
        assert!(parsed.html.contains("<h1>Heading</h1>"));
    }

    #[test]
    fn unterminated_block_fails() {
        let err = parse(b"---\ntitle: Hi\n").unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedFrontmatter));
    }

    #[test]
    fn empty_input_is_empty_document() {
        let parsed = parse(b"").unwrap();
        assert_eq!(parsed, ParsedContent::default());
    }

    #[test]
    fn later_delimiters_are_body_text() {
        let parsed = parse(b"---\ntitle: A\n---\nabove\n\n---\n\nbelow\n").unwrap();
        assert_eq!(parsed.metadata.len(), 1);
        assert_eq!(parsed.body, "above\n\n---\n\nbelow\n");
        assert!(parsed.html.contains("<hr />"));
    }

    #[test]
    fn blank_metadata_block_is_empty_map() {
        let parsed = parse(b"---\n---\nbody\n").unwrap();
        assert!(parsed.metadata.is_empty());
        assert_eq!(parsed.body, "body\n");
    }

    #[test]
    fn crlf_and_padded_delimiters() {
        let parsed = parse(b"--- \r\ntitle: Hi\r\n  ---\r\nline\r\n").unwrap();
        assert_eq!(parsed.metadata["title"], Value::String("Hi".into()));
        assert_eq!(parsed.body, "line\n");
    }

    #[test]
    fn bad_yaml_is_bad_metadata() {
        let err = parse(b"---\ntitle: [unclosed\n---\nbody\n").unwrap_err();
        assert!(matches!(err, ParseError::BadMetadata(_)));
    }

    #[test]
    fn non_mapping_metadata_is_bad_metadata() {
        let err = parse(b"---\n- a\n- b\n---\nbody\n").unwrap_err();
        assert!(matches!(err, ParseError::BadMetadata(_)));
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let err = parse(&[0x2d, 0x2d, 0x2d, 0x0a, 0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, ParseError::NotUtf8));
    }

    #[test]
    fn typed_frontmatter() {
        let input = b"---\n\
title: Launch\n\
slug: launch\n\
tags: [news, rust]\n\
featured: true\n\
status: published\n\
published_at: 2024-05-01T09:00:00Z\n\
custom_key: ignored\n\
---\n\
Hello\n";
        let fm = parse(input).unwrap().frontmatter().unwrap();
        assert_eq!(fm.title.as_deref(), Some("Launch"));
        assert_eq!(fm.tags, vec!["news", "rust"]);
        assert!(fm.featured);
        assert_eq!(fm.status.as_deref(), Some("published"));
        assert_eq!(fm.published_at.as_deref(), Some("2024-05-01T09:00:00Z"));
        assert!(fm.excerpt.is_none());
    }

    #[test]
    fn single_tag_string_is_accepted() {
        let fm = parse(b"---\ntags: announcements\n---\n")
            .unwrap()
            .frontmatter()
            .unwrap();
        assert_eq!(fm.tags, vec!["announcements"]);
    }

    #[test]
    fn missing_frontmatter_gives_defaults() {
        let fm = parse(b"just text\n").unwrap().frontmatter().unwrap();
        assert_eq!(fm, PostFrontmatter::default());
    }

    #[tokio::test]
    async fn parse_file_reads_from_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("post.md");
        std::fs::write(&path, "---\ntitle: From disk\n---\nContent\n").unwrap();

        let parsed = parse_file(&path).await.unwrap();
        assert_eq!(parsed.frontmatter().unwrap().title.as_deref(), Some("From disk"));
    }

    #[tokio::test]
    async fn parse_file_missing_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = parse_file(&tmp.path().join("missing.md")).await.unwrap_err();
        assert!(matches!(err, GhostwriterError::Io { .. }));
    }
}
