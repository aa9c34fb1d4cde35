use log::*;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use url::Url;

use crate::error::*;
use crate::app::*;
use crate::models::*;

pub mod query;
pub use query::Query;

pub mod appwrite;
pub mod memory;

pub use self::{
  appwrite::AppwriteBackend,
  memory::MemoryBackend,
};

/// Static identifiers of the hosted project.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
  pub endpoint: String,
  pub project_id: String,
  pub platform: String,
  pub database_id: String,
  pub bucket_id: String,
}

impl Default for BackendConfig {
  fn default() -> Self {
    Self {
      endpoint: "http://localhost/v1".to_string(),
      project_id: "aora".to_string(),
      platform: "com.aora.cli".to_string(),
      database_id: "aora".to_string(),
      bucket_id: "files".to_string(),
    }
  }
}

impl BackendConfig {
  pub fn load_app_config(config: &AppConfig) -> Result<Self> {
    let mut cfg = BackendConfig::default();
    if let Some(endpoint) = config.get_str("backend.endpoint")? {
      cfg.endpoint = endpoint;
    }
    if let Some(project_id) = config.get_str("backend.project_id")? {
      cfg.project_id = project_id;
    }
    if let Some(platform) = config.get_str("backend.platform")? {
      cfg.platform = platform;
    }
    if let Some(database_id) = config.get_str("backend.database_id")? {
      cfg.database_id = database_id;
    }
    if let Some(bucket_id) = config.get_str("backend.storage_id")? {
      cfg.bucket_id = bucket_id;
    }
    Ok(cfg)
  }

  /// Endpoint without the trailing slash.
  pub fn endpoint(&self) -> &str {
    self.endpoint.trim_end_matches('/')
  }

  /// Url of a stored file's preview, `file_preview_url` adds the options.
  pub fn file_preview_base(&self, file_id: &str) -> String {
    format!("{}/storage/buckets/{}/files/{}/preview", self.endpoint(), self.bucket_id, file_id)
  }

  /// Preview url with the transformation options and the project id.
  pub fn file_preview_url(&self, file_id: &str, opts: &PreviewOptions) -> Result<String> {
    let mut url = Url::parse(&self.file_preview_base(file_id))?;
    {
      let mut pairs = url.query_pairs_mut();
      for (key, val) in opts.query_pairs() {
        pairs.append_pair(key, &val);
      }
      pairs.append_pair("project", &self.project_id);
    }
    Ok(url.into())
  }

  /// Generated avatar with the initials of `name`.
  pub fn initials_avatar_url(&self, name: &str) -> Result<String> {
    let mut url = Url::parse(&format!("{}/avatars/initials", self.endpoint()))?;
    url.query_pairs_mut()
      .append_pair("name", name)
      .append_pair("project", &self.project_id);
    Ok(url.into())
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentList {
  pub total: u64,
  pub documents: Vec<JsonValue>,
}

/// File contents to upload.
#[derive(Debug, Clone)]
pub struct FileUpload {
  pub name: String,
  pub mime_type: String,
  pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gravity {
  Center,
  Top,
  Bottom,
}

impl Gravity {
  pub fn as_str(&self) -> &'static str {
    match self {
      Gravity::Center => "center",
      Gravity::Top => "top",
      Gravity::Bottom => "bottom",
    }
  }
}

/// Image transformation options for a preview url.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreviewOptions {
  pub width: Option<u32>,
  pub height: Option<u32>,
  pub gravity: Option<Gravity>,
  pub quality: Option<u8>,
}

impl PreviewOptions {
  pub fn for_kind(kind: FileKind) -> Self {
    match kind {
      FileKind::Image => PreviewOptions {
        width: Some(2000),
        height: Some(2000),
        gravity: Some(Gravity::Top),
        quality: Some(100),
      },
      FileKind::Video => PreviewOptions::default(),
    }
  }

  pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();
    if let Some(width) = self.width {
      pairs.push(("width", width.to_string()));
    }
    if let Some(height) = self.height {
      pairs.push(("height", height.to_string()));
    }
    if let Some(gravity) = self.gravity {
      pairs.push(("gravity", gravity.as_str().to_string()));
    }
    if let Some(quality) = self.quality {
      pairs.push(("quality", quality.to_string()));
    }
    pairs
  }
}

/// Backend-as-a-service operations: account, documents and storage.
#[async_trait]
pub trait Backend: Send + Sync {
  fn config(&self) -> &BackendConfig;

  // account
  async fn create_account(&self, account_id: &str, email: &str, password: &str, name: &str)
    -> Result<Account>;
  async fn create_email_session(&self, email: &str, password: &str) -> Result<AccountSession>;
  async fn delete_session(&self, session_id: &str) -> Result<()>;
  async fn get_account(&self) -> Result<Account>;
  async fn update_name(&self, name: &str) -> Result<Account>;
  async fn update_email(&self, email: &str, password: &str) -> Result<Account>;
  async fn update_password(&self, password: &str, old_password: &str) -> Result<Account>;

  // documents
  async fn list_documents(&self, collection_id: &str, queries: &[Query]) -> Result<DocumentList>;
  async fn get_document(&self, collection_id: &str, document_id: &str) -> Result<JsonValue>;
  async fn create_document(&self, collection_id: &str, document_id: &str, data: JsonValue)
    -> Result<JsonValue>;
  async fn update_document(&self, collection_id: &str, document_id: &str, data: JsonValue)
    -> Result<JsonValue>;
  async fn delete_document(&self, collection_id: &str, document_id: &str) -> Result<()>;

  // storage
  async fn create_file(&self, file_id: &str, file: FileUpload) -> Result<StoredFile>;
  async fn delete_file(&self, file_id: &str) -> Result<()>;
  fn file_preview_url(&self, file_id: &str, opts: &PreviewOptions) -> Result<String> {
    self.config().file_preview_url(file_id, opts)
  }

  // avatars
  fn initials_avatar_url(&self, name: &str) -> Result<String> {
    self.config().initials_avatar_url(name)
  }
}

pub type BoxBackend = Arc<dyn Backend>;

/// Build the backend selected by `backend.kind`.
pub fn connect(config: &AppConfig) -> Result<BoxBackend> {
  let cfg = BackendConfig::load_app_config(config)?;
  let kind = config.get_str("backend.kind")?.unwrap_or_else(|| "appwrite".to_string());
  info!("Backend: kind={}, endpoint={}, project={}", kind, cfg.endpoint, cfg.project_id);
  match kind.as_str() {
    "appwrite" => Ok(Arc::new(AppwriteBackend::new(cfg)?)),
    "memory" => {
      let users = config.get_str("backend.user_collection_id")?
        .unwrap_or_else(|| crate::services::DEFAULT_USER_COLLECTION.to_string());
      let videos = config.get_str("backend.video_collection_id")?
        .unwrap_or_else(|| crate::services::DEFAULT_VIDEO_COLLECTION.to_string());
      Ok(Arc::new(MemoryBackend::new(cfg).relate(&videos, "creator", &users)))
    },
    kind => Err(Error::BadRequest(format!("unknown backend kind: {}", kind))),
  }
}
