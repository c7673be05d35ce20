//! Input resources: URLs or in-memory file objects.

use std::fmt;

/// Binary file-like object (the equivalent of a browser `File`).
#[derive(Clone, PartialEq, Eq)]
pub struct FileBlob {
    bytes: Vec<u8>,
    name: Option<String>,
    mime: Option<String>,
}

impl FileBlob {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            name: None,
            mime: None,
        }
    }

    /// Attach a file name, used in log and error messages
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attach a MIME type hint (e.g. `image/png`)
    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// File name, or the byte count for unnamed files
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("<file {} bytes>", self.bytes.len()),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn mime(&self) -> Option<&str> {
        self.mime.as_deref()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for FileBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileBlob")
            .field("len", &self.bytes.len())
            .field("name", &self.name)
            .field("mime", &self.mime)
            .finish()
    }
}

/// A single image source handed to [`crate::watermark`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    /// `http(s)://`, `data:`, `file://` URL or a plain filesystem path
    Url(String),
    /// In-memory file contents
    File(FileBlob),
}

impl Resource {
    /// Short human-readable label for logs
    pub fn label(&self) -> String {
        match self {
            Resource::Url(u) if u.starts_with("data:") => "data: URL".to_string(),
            Resource::Url(u) => u.clone(),
            Resource::File(f) => f.label(),
        }
    }
}

impl From<&str> for Resource {
    fn from(url: &str) -> Self {
        Resource::Url(url.to_string())
    }
}

impl From<String> for Resource {
    fn from(url: String) -> Self {
        Resource::Url(url)
    }
}

impl From<&String> for Resource {
    fn from(url: &String) -> Self {
        Resource::Url(url.clone())
    }
}

impl From<FileBlob> for Resource {
    fn from(file: FileBlob) -> Self {
        Resource::File(file)
    }
}

impl From<Vec<u8>> for Resource {
    fn from(bytes: Vec<u8>) -> Self {
        Resource::File(FileBlob::new(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions_pick_the_right_variant() {
        assert_eq!(Resource::from("a.png"), Resource::Url("a.png".into()));
        assert!(matches!(Resource::from(vec![1u8, 2, 3]), Resource::File(_)));
    }

    #[test]
    fn labels_hide_data_payloads() {
        assert_eq!(Resource::from("data:image/png;base64,AAAA").label(), "data: URL");
        let f = FileBlob::new(vec![0u8; 4]).with_name("mark.png");
        assert_eq!(Resource::from(f).label(), "mark.png");
        assert_eq!(Resource::from(vec![0u8; 4]).label(), "<file 4 bytes>");
    }

    #[test]
    fn file_label_and_bytes_without_a_resource() {
        let f = FileBlob::new(vec![7u8; 3]);
        assert_eq!(f.label(), "<file 3 bytes>");
        assert_eq!(f.into_bytes(), vec![7u8; 3]);
    }
}
