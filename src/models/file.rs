use serde::{Deserialize, Serialize};

/// Stored file metadata returned by the backend after an upload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
  #[serde(rename = "$id")]
  pub id: String,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub mime_type: String,
  #[serde(default)]
  pub size_original: u64,
}

/// Kind of media a stored file holds, controls the preview parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
  Image,
  Video,
}

impl FileKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      FileKind::Image => "image",
      FileKind::Video => "video",
    }
  }

  /// Does the mime type belong to this kind of media.
  pub fn accepts(&self, mime_type: &str) -> bool {
    mime_type.starts_with(&format!("{}/", self.as_str()))
  }
}

impl std::fmt::Display for FileKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for FileKind {
  type Err = crate::Error;

  fn from_str(s: &str) -> crate::error::Result<Self> {
    match s {
      "image" => Ok(FileKind::Image),
      "video" => Ok(FileKind::Video),
      _ => Err(crate::Error::validation("Invalid file type")),
    }
  }
}
