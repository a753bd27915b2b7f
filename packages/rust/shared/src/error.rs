//! Error types for ghostwriter.
//!
//! Library crates use [`GhostwriterError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level error type for all ghostwriter operations.
#[derive(Debug, thiserror::Error)]
pub enum GhostwriterError {
    /// The admin key could not be turned into a token.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Structured error returned by the remote service.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Network failure, or an error response without a decodable body.
    #[error("{}", transport_message(.status, .message))]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// Local document could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A successful response did not have the expected shape.
    #[error("unexpected response: {message}")]
    ResponseShape { message: String },

    /// Neither lookup strategy found the requested resource.
    #[error("{resource} not found: {ident}")]
    NotFound { resource: String, ident: String },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Invalid user input (payloads, flags, frontmatter values).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// The server handed out a page cursor that was already visited.
    #[error("pagination loop detected: cursor {cursor} was already fetched")]
    PaginationLoop { cursor: u64 },

    /// The operation was cancelled before it completed.
    #[error("operation cancelled")]
    Cancelled,
}

fn transport_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("API error: {message} (status {code})"),
        None => format!("network error: {message}"),
    }
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, GhostwriterError>;

impl GhostwriterError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a response-shape error from any displayable message.
    pub fn response_shape(msg: impl Into<String>) -> Self {
        Self::ResponseShape {
            message: msg.into(),
        }
    }

    /// Create a transport error for a failed network exchange.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport {
            status: None,
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn not_found(resource: impl Into<String>, ident: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            ident: ident.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// Malformed admin key.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The key has no `:` separating key id and secret.
    #[error("invalid admin key format: expected 'id:secret'")]
    BadFormat,

    /// The secret half is not valid hex.
    #[error("invalid admin key secret: {0}")]
    BadSecret(#[source] MalformedInput),
}

/// Hex input with an odd length or a non-hex character.
#[derive(Debug, thiserror::Error)]
#[error("malformed hex input: {0}")]
pub struct MalformedInput(#[from] pub hex::FromHexError);

// ---------------------------------------------------------------------------
// Api
// ---------------------------------------------------------------------------

/// Error envelope returned by the Admin API for 4xx/5xx responses.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ApiError {
    #[serde(default)]
    pub errors: Vec<ApiErrorItem>,
}

/// A single entry of the `errors` array.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ApiErrorItem {
    /// Empty when the server omits it or sends `null`.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub message: String,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl ApiError {
    /// Decode an error body. Returns `None` unless it holds at least one item.
    pub fn decode(body: &[u8]) -> Option<Self> {
        serde_json::from_slice::<ApiError>(body)
            .ok()
            .filter(|e| !e.errors.is_empty())
    }

    /// Message of the first error item, if any.
    pub fn message(&self) -> Option<&str> {
        self.errors.first().map(|item| item.message.as_str())
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Some(item) = self.errors.first() else {
            return write!(f, "unknown API error");
        };
        let context = item.context.as_deref().filter(|c| !c.is_empty());
        match (item.message.as_str(), context) {
            ("", Some(ctx)) => write!(f, "{ctx}"),
            ("", None) => write!(f, "{}", item.kind.as_deref().unwrap_or("unknown API error")),
            (msg, Some(ctx)) => write!(f, "{msg}: {ctx}"),
            (msg, None) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

// ---------------------------------------------------------------------------
// Parse
// ---------------------------------------------------------------------------

/// Failure to split or render a frontmatter document.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("document is not valid UTF-8")]
    NotUtf8,

    /// Input ended inside the leading metadata block.
    #[error("frontmatter block is not terminated by a closing '---' line")]
    UnterminatedFrontmatter,

    #[error("parsing frontmatter: {0}")]
    BadMetadata(#[source] serde_yaml::Error),

    #[error("converting markdown: {0}")]
    RenderFailed(String),
}
