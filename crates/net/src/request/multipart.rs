//! `multipart/form-data` payloads
//!
//! A [`MultipartForm`] carries the fields of an upload; the encoder frames
//! them with a caller-supplied boundary. The formatter generates a fresh
//! boundary per build, so identical forms never share one across attempts.

use super::mime;

/// Multipart payload attached to an endpoint
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    pub fields: Vec<MultipartField>,
}

impl MultipartForm {
    #[must_use]
    pub fn new(fields: Vec<MultipartField>) -> Self {
        Self { fields }
    }
}

/// One field of a multipart payload
#[derive(Debug, Clone)]
pub struct MultipartField {
    pub name: String,
    pub value: MultipartValue,
}

/// Content carried by a multipart field
#[derive(Debug, Clone)]
pub enum MultipartValue {
    /// Plain form value
    Text(String),
    /// Named file part; `mime` is sniffed from the leading bytes when absent
    File { data: Vec<u8>, file_name: String, mime: Option<String> },
}

impl MultipartField {
    /// Plain text field.
    #[must_use]
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: MultipartValue::Text(value.into()) }
    }

    /// File field with an explicitly declared MIME type.
    #[must_use]
    pub fn file(
        name: impl Into<String>,
        data: Vec<u8>,
        file_name: impl Into<String>,
        mime: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: MultipartValue::File {
                data,
                file_name: file_name.into(),
                mime: Some(mime.into()),
            },
        }
    }

    /// File field whose MIME type is inferred from its leading bytes.
    #[must_use]
    pub fn file_sniffed(name: impl Into<String>, data: Vec<u8>, file_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: MultipartValue::File { data, file_name: file_name.into(), mime: None },
        }
    }
}

/// Encode `form` into a request body framed by `boundary`.
pub(crate) fn encode(form: &MultipartForm, boundary: &str) -> Vec<u8> {
    let mut body = Vec::new();

    for field in &form.fields {
        match &field.value {
            MultipartValue::Text(value) => {
                body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", field.name)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
                body.extend_from_slice(b"\r\n");
            }
            MultipartValue::File { data, file_name, mime } => {
                let mime = mime.as_deref().unwrap_or_else(|| mime::sniff(data));
                body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        field.name, file_name
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(format!("Content-Type: {mime}\r\n\r\n").as_bytes());
                body.extend_from_slice(data);
                body.extend_from_slice(b"\r\n");
            }
        }
    }

    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

/// Render the `Content-Type` header value naming `boundary`.
pub(crate) fn content_type(boundary: &str) -> String {
    format!("multipart/form-data; boundary={boundary}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_text_field_with_crlf_framing() {
        let form = MultipartForm::new(vec![MultipartField::text("caption", "hello")]);
        let body = encode(&form, "B");

        let expected = "--B\r\nContent-Disposition: form-data; name=\"caption\"\r\n\r\nhello\r\n--B--\r\n";
        assert_eq!(body, expected.as_bytes());
    }

    #[test]
    fn encodes_file_field_with_explicit_mime() {
        let form = MultipartForm::new(vec![MultipartField::file(
            "avatar",
            vec![1, 2, 3],
            "avatar.bin",
            "application/octet-stream",
        )]);
        let body = encode(&form, "B");
        let text = String::from_utf8_lossy(&body);

        assert!(text.contains("Content-Disposition: form-data; name=\"avatar\"; filename=\"avatar.bin\""));
        assert!(text.contains("Content-Type: application/octet-stream\r\n\r\n"));
        assert!(text.ends_with("--B--\r\n"));
    }

    #[test]
    fn sniffs_mime_for_undeclared_file_fields() {
        let png = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        let form =
            MultipartForm::new(vec![MultipartField::file_sniffed("image", png, "pic.png")]);
        let body = encode(&form, "B");

        assert!(String::from_utf8_lossy(&body).contains("Content-Type: image/png"));
    }

    #[test]
    fn terminal_boundary_closes_the_body() {
        let body = encode(&MultipartForm::default(), "edge");
        assert_eq!(body, b"--edge--\r\n");
    }

    #[test]
    fn content_type_names_the_boundary() {
        assert_eq!(content_type("abc"), "multipart/form-data; boundary=abc");
    }
}
