use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::*;
use crate::models::*;

use super::require_filled;

/// Where a post's media comes from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "source", rename_all = "camelCase")]
pub enum MediaSource {
  /// Nothing picked yet.
  Unset,
  /// A file on the local device, not yet uploaded.
  #[serde(rename_all = "camelCase")]
  LocalAsset {
    path: PathBuf,
    mime_type: String,
  },
  /// Already stored, referenced by its preview url.
  RemoteUrl {
    url: String,
  },
}

impl Default for MediaSource {
  fn default() -> Self {
    MediaSource::Unset
  }
}

impl MediaSource {
  /// Local asset with the mime type guessed from the file extension.
  pub fn local(path: impl Into<PathBuf>) -> Self {
    let path = path.into();
    let mime_type = mime_guess::from_path(&path)
      .first_raw()
      .unwrap_or("application/octet-stream")
      .to_string();
    MediaSource::LocalAsset { path, mime_type }
  }

  pub fn remote(url: impl Into<String>) -> Self {
    MediaSource::RemoteUrl { url: url.into() }
  }

  pub fn is_set(&self) -> bool {
    !matches!(self, MediaSource::Unset)
  }

  pub fn is_local(&self) -> bool {
    matches!(self, MediaSource::LocalAsset { .. })
  }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreatePostForm {
  pub title: String,
  pub prompt: String,
  pub video: MediaSource,
  pub thumbnail: MediaSource,
}

impl CreatePostForm {
  pub fn validate(&self) -> Result<()> {
    require_filled(&[&self.title, &self.prompt])?;
    if !self.video.is_set() || !self.thumbnail.is_set() {
      return Err(Error::validation("Please fill in all the fields"));
    }
    // a new post owns its files, so both must be fresh uploads.
    if !self.video.is_local() || !self.thumbnail.is_local() {
      return Err(Error::validation("Please pick the video and thumbnail to upload"));
    }
    Ok(())
  }
}

/// Edit an existing post. The video itself can't be replaced.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EditPostForm {
  pub id: String,
  pub title: String,
  pub prompt: String,
  pub thumbnail: MediaSource,
  pub is_public: bool,
}

impl EditPostForm {
  /// Start an edit from the stored post.
  pub fn from_post(post: &Post) -> Self {
    EditPostForm {
      id: post.id.clone(),
      title: post.title.clone(),
      prompt: post.prompt.clone(),
      thumbnail: MediaSource::remote(post.thumbnail.clone()),
      is_public: post.is_public,
    }
  }

  pub fn validate(&self) -> Result<()> {
    require_filled(&[&self.id, &self.title, &self.prompt])?;
    if !self.thumbnail.is_set() {
      return Err(Error::validation("Thumbnail not found!"));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn local_asset_guesses_mime() {
    match MediaSource::local("/tmp/clip.mp4") {
      MediaSource::LocalAsset { mime_type, .. } => assert_eq!(mime_type, "video/mp4"),
      src => panic!("unexpected: {:?}", src),
    }
    match MediaSource::local("/tmp/thumb.png") {
      MediaSource::LocalAsset { mime_type, .. } => assert_eq!(mime_type, "image/png"),
      src => panic!("unexpected: {:?}", src),
    }
  }

  #[test]
  fn create_form_needs_media() {
    let mut form = CreatePostForm {
      title: "Sunset".into(),
      prompt: "a timelapse of a sunset".into(),
      video: MediaSource::local("/tmp/sunset.mp4"),
      thumbnail: MediaSource::Unset,
    };
    assert!(form.validate().is_err());
    form.thumbnail = MediaSource::local("/tmp/sunset.jpg");
    assert!(form.validate().is_ok());
  }

  #[test]
  fn create_form_rejects_stored_media() {
    let form = CreatePostForm {
      title: "Sunset".into(),
      prompt: "a timelapse of a sunset".into(),
      video: MediaSource::remote("https://h/v1/storage/buckets/b/files/v1/preview"),
      thumbnail: MediaSource::local("/tmp/sunset.jpg"),
    };
    match form.validate() {
      Err(Error::Validation(msg)) => assert_eq!(msg, "Please pick the video and thumbnail to upload"),
      res => panic!("unexpected: {:?}", res),
    }
  }

  #[test]
  fn media_source_json_shape() {
    let json = serde_json::to_value(MediaSource::remote("https://x/files/1/preview")).unwrap();
    assert_eq!(json["source"], "remoteUrl");
    assert_eq!(json["url"], "https://x/files/1/preview");
    let src: MediaSource = serde_json::from_str(r#"{"source":"unset"}"#).unwrap();
    assert_eq!(src, MediaSource::Unset);
  }
}
