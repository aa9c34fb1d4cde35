use log::*;

use crate::error::*;
use crate::app::*;
use crate::backend::{BoxBackend, FileUpload, PreviewOptions};
use crate::forms::MediaSource;
use crate::models::*;
use crate::util::{extract_file_id, unique_id};

fn capitalize(s: &str) -> String {
  let mut chars = s.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars).collect(),
    None => String::new(),
  }
}

fn missing(kind: FileKind) -> Error {
  Error::validation(format!("{} not found!", capitalize(kind.as_str())))
}

fn invalid_type(kind: FileKind, mime_type: &str) -> Error {
  Error::validation(format!("Invalid file type: expected {}, got {}", kind, mime_type))
}

/// File uploads, previews and deletes.
#[derive(Clone)]
pub struct StorageService {
  backend: BoxBackend,
}

impl StorageService {
  pub fn new(backend: BoxBackend) -> Self {
    Self { backend }
  }

  /// Check that `source` can be used for a file of `kind`, without touching it.
  pub fn check_source(&self, source: &MediaSource, kind: FileKind) -> Result<()> {
    match source {
      MediaSource::Unset => Err(missing(kind)),
      MediaSource::LocalAsset { mime_type, .. } if !kind.accepts(mime_type) => {
        Err(invalid_type(kind, mime_type))
      },
      _ => Ok(()),
    }
  }

  /// Upload a local asset and return its preview url. Remote urls are already stored.
  pub async fn upload_file(&self, source: &MediaSource, kind: FileKind) -> Result<String> {
    let (path, mime_type) = match source {
      MediaSource::LocalAsset { path, mime_type } => (path, mime_type),
      MediaSource::RemoteUrl { url } => return Ok(url.clone()),
      MediaSource::Unset => return Err(missing(kind)),
    };
    if !kind.accepts(mime_type) {
      return Err(invalid_type(kind, mime_type));
    }

    let bytes = tokio::fs::read(path).await.map_err(|err| {
      if err.kind() == std::io::ErrorKind::NotFound {
        Error::not_found(format!("{} not found!", capitalize(kind.as_str())))
      } else {
        err.into()
      }
    })?;
    let name = path.file_name()
      .map(|n| n.to_string_lossy().to_string())
      .unwrap_or_else(|| format!("{}.bin", kind));

    let file = self.backend.create_file(&unique_id(), FileUpload {
      name,
      mime_type: mime_type.clone(),
      bytes,
    }).await.map_err(|err| {
      warn!("upload {} failed: {:?}", kind, err);
      err
    })?;
    debug!("uploaded {}: id={}, size={}", kind, file.id, file.size_original);
    self.get_file_preview(&file.id, kind)
  }

  pub fn get_file_preview(&self, file_id: &str, kind: FileKind) -> Result<String> {
    self.backend.file_preview_url(file_id, &PreviewOptions::for_kind(kind))
  }

  pub async fn delete_file(&self, file_id: &str) -> Result<()> {
    self.backend.delete_file(file_id).await
  }

  /// Delete the stored file a preview url points at.
  pub async fn delete_file_by_url(&self, url: &str) -> Result<()> {
    match extract_file_id(url) {
      Some(file_id) => self.delete_file(file_id).await,
      None => Err(Error::not_found("File not found")),
    }
  }

  /// Delete files uploaded by a failed operation, logging what can't be removed.
  pub async fn discard_uploads(&self, urls: &[String]) {
    for url in urls {
      if let Err(err) = self.delete_file_by_url(url).await {
        warn!("failed to remove orphaned file {}: {:?}", url, err);
      }
    }
  }
}

impl super::Service for StorageService {
  fn load_app_config(&mut self, _config: &AppConfig) -> Result<()> {
    Ok(())
  }
}
