use log::*;

use async_trait::async_trait;

use reqwest::{
  header::{HeaderMap, HeaderValue, USER_AGENT},
  multipart::{Form, Part},
  Client, RequestBuilder, StatusCode,
};

use serde::de::DeserializeOwned;
use serde_json::{json, Value as JsonValue};

use url::Url;

use crate::error::*;
use crate::models::*;

use super::*;

const RESPONSE_FORMAT: &str = "1.5.0";

/// Backend speaking the Appwrite REST api.
///
/// The session cookie handed out by `create_email_session` is kept in the
/// client's cookie store, so one `AppwriteBackend` is one logged in device.
pub struct AppwriteBackend {
  cfg: BackendConfig,
  http: Client,
}

fn header(val: &str) -> Result<HeaderValue> {
  HeaderValue::from_str(val)
    .map_err(|e| Error::BadRequest(format!("invalid header value {:?}: {}", val, e)))
}

impl AppwriteBackend {
  pub fn new(cfg: BackendConfig) -> Result<Self> {
    let mut headers = HeaderMap::new();
    headers.insert("X-Appwrite-Project", header(&cfg.project_id)?);
    headers.insert("X-Appwrite-Response-Format", header(RESPONSE_FORMAT)?);
    headers.insert(USER_AGENT, header(&format!("aora/{} ({})",
      env!("CARGO_PKG_VERSION"), cfg.platform))?);

    let http = Client::builder()
      .cookie_store(true)
      .default_headers(headers)
      .build()?;

    Ok(Self { cfg, http })
  }

  fn url(&self, path: &str) -> Result<Url> {
    Ok(Url::parse(&format!("{}{}", self.cfg.endpoint(), path))?)
  }

  fn documents_path(&self, collection_id: &str) -> String {
    format!("/databases/{}/collections/{}/documents", self.cfg.database_id, collection_id)
  }

  async fn check(&self, req: RequestBuilder) -> Result<reqwest::Response> {
    let resp = req.send().await?;
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    let body: BackendErrorBody = resp.json().await.unwrap_or_default();
    debug!("backend request failed: status={}, type={}, message={}",
      status, body.kind, body.message);
    Err(Error::from_backend(status.as_u16(), body))
  }

  async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
    let resp = self.check(req).await?;
    Ok(resp.json().await?)
  }

  async fn send_empty(&self, req: RequestBuilder) -> Result<()> {
    let resp = self.check(req).await?;
    if resp.status() != StatusCode::NO_CONTENT {
      trace!("ignoring response body, status={}", resp.status());
    }
    Ok(())
  }
}

#[async_trait]
impl Backend for AppwriteBackend {
  fn config(&self) -> &BackendConfig {
    &self.cfg
  }

  async fn create_account(&self, account_id: &str, email: &str, password: &str, name: &str)
    -> Result<Account>
  {
    let req = self.http.post(self.url("/account")?).json(&json!({
      "userId": account_id,
      "email": email,
      "password": password,
      "name": name,
    }));
    self.send(req).await
  }

  async fn create_email_session(&self, email: &str, password: &str) -> Result<AccountSession> {
    let req = self.http.post(self.url("/account/sessions/email")?).json(&json!({
      "email": email,
      "password": password,
    }));
    self.send(req).await
  }

  async fn delete_session(&self, session_id: &str) -> Result<()> {
    let req = self.http.delete(self.url(&format!("/account/sessions/{}", session_id))?);
    self.send_empty(req).await
  }

  async fn get_account(&self) -> Result<Account> {
    let req = self.http.get(self.url("/account")?);
    self.send(req).await
  }

  async fn update_name(&self, name: &str) -> Result<Account> {
    let req = self.http.patch(self.url("/account/name")?).json(&json!({ "name": name }));
    self.send(req).await
  }

  async fn update_email(&self, email: &str, password: &str) -> Result<Account> {
    let req = self.http.patch(self.url("/account/email")?).json(&json!({
      "email": email,
      "password": password,
    }));
    self.send(req).await
  }

  async fn update_password(&self, password: &str, old_password: &str) -> Result<Account> {
    let req = self.http.patch(self.url("/account/password")?).json(&json!({
      "password": password,
      "oldPassword": old_password,
    }));
    self.send(req).await
  }

  async fn list_documents(&self, collection_id: &str, queries: &[Query]) -> Result<DocumentList> {
    let params: Vec<(&str, String)> = queries.iter()
      .map(|q| ("queries[]", q.encode()))
      .collect();
    let req = self.http.get(self.url(&self.documents_path(collection_id))?).query(&params);
    self.send(req).await
  }

  async fn get_document(&self, collection_id: &str, document_id: &str) -> Result<JsonValue> {
    let path = format!("{}/{}", self.documents_path(collection_id), document_id);
    self.send(self.http.get(self.url(&path)?)).await
  }

  async fn create_document(&self, collection_id: &str, document_id: &str, data: JsonValue)
    -> Result<JsonValue>
  {
    let req = self.http.post(self.url(&self.documents_path(collection_id))?).json(&json!({
      "documentId": document_id,
      "data": data,
    }));
    self.send(req).await
  }

  async fn update_document(&self, collection_id: &str, document_id: &str, data: JsonValue)
    -> Result<JsonValue>
  {
    let path = format!("{}/{}", self.documents_path(collection_id), document_id);
    let req = self.http.patch(self.url(&path)?).json(&json!({ "data": data }));
    self.send(req).await
  }

  async fn delete_document(&self, collection_id: &str, document_id: &str) -> Result<()> {
    let path = format!("{}/{}", self.documents_path(collection_id), document_id);
    self.send_empty(self.http.delete(self.url(&path)?)).await
  }

  async fn create_file(&self, file_id: &str, file: FileUpload) -> Result<StoredFile> {
    let size = file.bytes.len();
    let part = Part::bytes(file.bytes)
      .file_name(file.name.clone())
      .mime_str(&file.mime_type)?;
    let form = Form::new()
      .text("fileId", file_id.to_string())
      .part("file", part);
    debug!("upload file: id={}, name={}, size={}", file_id, file.name, size);
    let path = format!("/storage/buckets/{}/files", self.cfg.bucket_id);
    self.send(self.http.post(self.url(&path)?).multipart(form)).await
  }

  async fn delete_file(&self, file_id: &str) -> Result<()> {
    let path = format!("/storage/buckets/{}/files/{}", self.cfg.bucket_id, file_id);
    self.send_empty(self.http.delete(self.url(&path)?)).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn backend() -> AppwriteBackend {
    AppwriteBackend::new(BackendConfig {
      endpoint: "https://cloud.appwrite.io/v1".into(),
      project_id: "proj".into(),
      platform: "com.aora.test".into(),
      database_id: "db".into(),
      bucket_id: "bkt".into(),
    }).unwrap()
  }

  #[test]
  fn image_preview_url() {
    let url = backend()
      .file_preview_url("f1", &PreviewOptions::for_kind(FileKind::Image))
      .unwrap();
    assert_eq!(url, "https://cloud.appwrite.io/v1/storage/buckets/bkt/files/f1/preview\
      ?width=2000&height=2000&gravity=top&quality=100&project=proj");
    assert_eq!(crate::util::extract_file_id(&url), Some("f1"));
  }

  #[test]
  fn video_preview_url() {
    let url = backend()
      .file_preview_url("v9", &PreviewOptions::for_kind(FileKind::Video))
      .unwrap();
    assert_eq!(url, "https://cloud.appwrite.io/v1/storage/buckets/bkt/files/v9/preview?project=proj");
  }

  #[test]
  fn initials_url_is_encoded() {
    let url = backend().initials_avatar_url("Jane Doe").unwrap();
    assert_eq!(url, "https://cloud.appwrite.io/v1/avatars/initials?name=Jane+Doe&project=proj");
  }

  #[test]
  fn documents_path() {
    assert_eq!(backend().documents_path("videos"), "/databases/db/collections/videos/documents");
  }
}
