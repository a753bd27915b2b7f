//! Image uploads sent as `multipart/form-data`.

use std::path::Path;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, instrument};

use ghostwriter_shared::{GhostwriterError, Result};

use crate::pipeline::{AdminClient, HttpMethod, Query};

/// Multipart field carrying the file bytes.
pub const FILE_FIELD: &str = "file";

/// Optional text field naming the upload.
pub const REF_FIELD: &str = "ref";

/// Content type of the file part.
pub const FILE_MIME: &str = "application/octet-stream";

const UPLOAD_PATH: &str = "/images/upload/";

/// A file read into memory, ready to be sent as a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadBody {
    /// Base name sent as the part's filename.
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Sent as the `ref` field; never empty.
    pub ref_name: Option<String>,
}

impl UploadBody {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>, ref_name: Option<&str>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            ref_name: ref_name.filter(|r| !r.is_empty()).map(str::to_string),
        }
    }

    /// Read `path` fully, using its base name as the filename.
    pub async fn from_file(path: &Path, ref_name: Option<&str>) -> Result<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| GhostwriterError::io(path, e))?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        Ok(Self::new(file_name, bytes, ref_name))
    }

    /// The `file` part, followed by the `ref` part when one is set.
    pub fn into_form(self) -> Result<Form> {
        let part = Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(FILE_MIME)
            .map_err(|e| GhostwriterError::validation(format!("building upload part: {e}")))?;

        let mut form = Form::new().part(FILE_FIELD, part);
        if let Some(reference) = self.ref_name {
            form = form.text(REF_FIELD, reference);
        }
        Ok(form)
    }
}

// ---------------------------------------------------------------------------
// Upload call
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    images: Vec<UploadedImage>,
}

#[derive(Debug, Deserialize)]
struct UploadedImage {
    #[serde(default)]
    url: Option<String>,
}

impl AdminClient<'_> {
    /// Upload the image at `path` and return its public URL.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn upload_image(&self, path: &Path, ref_name: Option<&str>) -> Result<String> {
        let upload = self.cancellable(UploadBody::from_file(path, ref_name)).await?;
        debug!(bytes = upload.bytes.len(), "upload file read");

        let form = upload.into_form()?;
        debug!(boundary = form.boundary(), "upload form built");

        let request = self
            .request(HttpMethod::Post, UPLOAD_PATH, &Query::new())?
            .multipart(form);
        let body = self.dispatch(request).await?;

        extract_image_url(&body)
    }
}

fn extract_image_url(body: &[u8]) -> Result<String> {
    let response: UploadResponse = serde_json::from_slice(body)
        .map_err(|e| GhostwriterError::response_shape(format!("decoding upload response: {e}")))?;

    response
        .images
        .into_iter()
        .next()
        .and_then(|image| image.url)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| GhostwriterError::response_shape("no image URL in upload response"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ClientOptions;
    use ghostwriter_shared::Endpoint;
    use wiremock::matchers::{header_regex, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const UPLOADED: &str =
        r#"{"images":[{"url":"https://blog.example.com/content/images/cover.jpg","ref":"hero"}]}"#;

    async fn upload_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ghost/api/admin/images/upload/"))
            .and(header_regex("content-type", "^multipart/form-data; boundary="))
            .respond_with(ResponseTemplate::new(201).set_body_string(UPLOADED))
            .mount(&server)
            .await;
        server
    }

    fn write_image(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let file = dir.path().join("cover.jpg");
        std::fs::write(&file, b"JPEG").unwrap();
        file
    }

    #[test]
    fn empty_ref_is_dropped() {
        let without = UploadBody::new("a.jpg", b"x".to_vec(), None);
        let empty = UploadBody::new("a.jpg", b"x".to_vec(), Some(""));
        assert_eq!(without, empty);
        assert_eq!(
            UploadBody::new("a.jpg", Vec::new(), Some("hero")).ref_name.as_deref(),
            Some("hero")
        );
    }

    #[tokio::test]
    async fn from_file_uses_base_name() {
        let tmp = tempfile::tempdir().unwrap();
        let file = write_image(&tmp);

        let upload = UploadBody::from_file(&file, None).await.unwrap();
        assert_eq!(upload.file_name, "cover.jpg");
        assert_eq!(upload.bytes, b"JPEG");
        assert!(upload.ref_name.is_none());
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = UploadBody::from_file(&tmp.path().join("nope.png"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, GhostwriterError::Io { .. }));
    }

    #[test]
    fn response_without_url_is_shape_error() {
        for body in [
            r#"{"images":[]}"#,
            r#"{"images":[{"url":""}]}"#,
            r#"{"images":[{"ref":"x"}]}"#,
            r#"{}"#,
        ] {
            let err = extract_image_url(body.as_bytes()).unwrap_err();
            assert!(matches!(err, GhostwriterError::ResponseShape { .. }), "{body}");
        }
    }

    #[tokio::test]
    async fn uploads_file_and_ref_parts() {
        let server = upload_server().await;
        let tmp = tempfile::tempdir().unwrap();
        let file = write_image(&tmp);

        let endpoint = Endpoint::new(&server.uri(), "abc123:deadbeef").unwrap();
        let client = AdminClient::new(&endpoint, ClientOptions::default()).unwrap();
        let url = client.upload_image(&file, Some("hero")).await.unwrap();

        assert_eq!(url, "https://blog.example.com/content/images/cover.jpg");
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let body = String::from_utf8_lossy(&requests[0].body);
        assert!(body.contains("name=\"file\""));
        assert!(body.contains("filename=\"cover.jpg\""));
        assert!(body.contains("Content-Type: application/octet-stream"));
        assert!(body.contains("JPEG"));
        assert!(body.contains("name=\"ref\"\r\n\r\nhero\r\n"));
        assert!(!body.contains(tmp.path().to_str().unwrap()));
        assert!(requests[0].headers.get("authorization").is_some());
    }

    #[tokio::test]
    async fn empty_ref_sends_file_part_only() {
        let server = upload_server().await;
        let tmp = tempfile::tempdir().unwrap();
        let file = write_image(&tmp);

        let endpoint = Endpoint::new(&server.uri(), "abc123:deadbeef").unwrap();
        let client = AdminClient::new(&endpoint, ClientOptions::default()).unwrap();
        client.upload_image(&file, Some("")).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body = String::from_utf8_lossy(&requests[0].body);
        assert_eq!(body.matches("Content-Disposition").count(), 1);
        assert!(!body.contains("name=\"ref\""));
    }

    #[tokio::test]
    async fn missing_file_makes_no_request() {
        let server = MockServer::start().await;
        let tmp = tempfile::tempdir().unwrap();

        let endpoint = Endpoint::new(&server.uri(), "abc123:deadbeef").unwrap();
        let client = AdminClient::new(&endpoint, ClientOptions::default()).unwrap();
        let err = client
            .upload_image(&tmp.path().join("missing.png"), None)
            .await
            .unwrap_err();

        assert!(matches!(err, GhostwriterError::Io { .. }));
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
