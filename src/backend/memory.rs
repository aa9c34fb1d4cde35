use log::*;

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use chrono::{SecondsFormat, Utc};

use serde_json::{Map, Value as JsonValue};

use crate::error::*;
use crate::models::*;
use crate::util::unique_id;

use super::*;

struct StoredAccount {
  account: Account,
  password: String,
}

#[derive(Default)]
struct MemoryState {
  accounts: Vec<StoredAccount>,
  session: Option<AccountSession>,
  collections: HashMap<String, Vec<JsonValue>>,
  files: HashMap<String, (StoredFile, Vec<u8>)>,
  failures: HashSet<&'static str>,
}

/// Relationship attribute expanded into the related document on reads.
#[derive(Debug, Clone)]
struct Relation {
  collection: String,
  attribute: String,
  target: String,
}

/// Process-local backend keeping accounts, documents and files in memory.
///
/// Behaves like the hosted backend for everything the services use:
/// one session at a time, `401` without a session, `404` for missing
/// documents/files, `409` for duplicate ids or emails.
pub struct MemoryBackend {
  cfg: BackendConfig,
  relations: Vec<Relation>,
  state: Mutex<MemoryState>,
}

fn now() -> String {
  Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn backend_err(code: u16, kind: &str, message: &str) -> Error {
  Error::from_backend(code, BackendErrorBody {
    message: message.to_string(),
    code,
    kind: kind.to_string(),
  })
}

fn no_session() -> Error {
  backend_err(401, "general_unauthorized_scope", "User (role: guests) missing scope (account)")
}

fn invalid_credentials() -> Error {
  backend_err(401, "user_invalid_credentials",
    "Invalid credentials. Please check the email and password.")
}

fn document_not_found() -> Error {
  backend_err(404, "document_not_found", "Document with the requested ID could not be found.")
}

fn file_not_found() -> Error {
  backend_err(404, "storage_file_not_found", "The requested file could not be found.")
}

fn as_object(data: JsonValue) -> Result<Map<String, JsonValue>> {
  match data {
    JsonValue::Object(map) => Ok(map),
    _ => Err(backend_err(400, "document_invalid_structure", "Document data must be an object.")),
  }
}

impl Default for MemoryBackend {
  fn default() -> Self {
    Self::new(BackendConfig::default())
  }
}

impl MemoryBackend {
  pub fn new(cfg: BackendConfig) -> Self {
    Self {
      cfg,
      relations: Vec::new(),
      state: Mutex::new(MemoryState::default()),
    }
  }

  /// Expand `collection.attribute` (holding an id) into the `target` document on reads.
  pub fn relate(mut self, collection: &str, attribute: &str, target: &str) -> Self {
    self.relations.push(Relation {
      collection: collection.to_string(),
      attribute: attribute.to_string(),
      target: target.to_string(),
    });
    self
  }

  /// Make the next call to `method` fail with a server error.
  pub fn fail_next(&self, method: &'static str) {
    self.lock().failures.insert(method);
  }

  /// Number of stored files.
  pub fn file_count(&self) -> usize {
    self.lock().files.len()
  }

  pub fn has_file(&self, file_id: &str) -> bool {
    self.lock().files.contains_key(file_id)
  }

  fn lock(&self) -> MutexGuard<'_, MemoryState> {
    // state stays consistent across a panicked holder, every mutation is a single step.
    self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  fn guard(&self, method: &'static str) -> Result<MutexGuard<'_, MemoryState>> {
    let mut state = self.lock();
    if state.failures.remove(method) {
      debug!("memory backend: injected failure for {}", method);
      return Err(backend_err(500, "general_unknown", "Server Error"));
    }
    Ok(state)
  }

  fn session_account<'a>(state: &'a mut MemoryState) -> Result<&'a mut StoredAccount> {
    let user_id = match state.session {
      Some(ref session) => session.user_id.clone(),
      None => return Err(no_session()),
    };
    state.accounts.iter_mut()
      .find(|a| a.account.id == user_id)
      .ok_or_else(no_session)
  }

  fn expand(&self, state: &MemoryState, collection_id: &str, mut doc: JsonValue) -> JsonValue {
    for rel in self.relations.iter().filter(|r| r.collection == collection_id) {
      let target_id = match doc.get(&rel.attribute).and_then(|v| v.as_str()) {
        Some(id) => id.to_string(),
        None => continue,
      };
      let related = state.collections.get(&rel.target)
        .and_then(|docs| docs.iter().find(|d| d["$id"] == target_id.as_str()))
        .cloned();
      if let Some(related) = related {
        doc[rel.attribute.as_str()] = related;
      }
    }
    doc
  }
}

#[async_trait]
impl Backend for MemoryBackend {
  fn config(&self) -> &BackendConfig {
    &self.cfg
  }

  async fn create_account(&self, account_id: &str, email: &str, password: &str, name: &str)
    -> Result<Account>
  {
    let mut state = self.guard("create_account")?;
    if state.accounts.iter().any(|a| a.account.id == account_id || a.account.email == email) {
      return Err(backend_err(409, "user_already_exists",
        "A user with the same id, email, or phone already exists in this project."));
    }
    let account = Account {
      id: account_id.to_string(),
      name: name.to_string(),
      email: email.to_string(),
    };
    state.accounts.push(StoredAccount {
      account: account.clone(),
      password: password.to_string(),
    });
    Ok(account)
  }

  async fn create_email_session(&self, email: &str, password: &str) -> Result<AccountSession> {
    let mut state = self.guard("create_email_session")?;
    let user_id = state.accounts.iter()
      .find(|a| a.account.email == email && a.password == password)
      .map(|a| a.account.id.clone())
      .ok_or_else(invalid_credentials)?;
    let session = AccountSession {
      id: unique_id(),
      user_id,
      expire: (Utc::now() + chrono::Duration::days(365))
        .to_rfc3339_opts(SecondsFormat::Millis, true),
    };
    state.session = Some(session.clone());
    Ok(session)
  }

  async fn delete_session(&self, session_id: &str) -> Result<()> {
    let mut state = self.guard("delete_session")?;
    let current = match state.session {
      Some(ref session) => session_id == "current" || session.id == session_id,
      None => return Err(no_session()),
    };
    if !current {
      return Err(backend_err(404, "user_session_not_found",
        "The current user session could not be found."));
    }
    state.session = None;
    Ok(())
  }

  async fn get_account(&self) -> Result<Account> {
    let mut state = self.guard("get_account")?;
    Ok(Self::session_account(&mut state)?.account.clone())
  }

  async fn update_name(&self, name: &str) -> Result<Account> {
    let mut state = self.guard("update_name")?;
    let stored = Self::session_account(&mut state)?;
    stored.account.name = name.to_string();
    Ok(stored.account.clone())
  }

  async fn update_email(&self, email: &str, password: &str) -> Result<Account> {
    let mut state = self.guard("update_email")?;
    let taken = state.accounts.iter().any(|a| a.account.email == email);
    let stored = Self::session_account(&mut state)?;
    if stored.password != password {
      return Err(invalid_credentials());
    }
    if taken && stored.account.email != email {
      return Err(backend_err(409, "user_email_already_exists",
        "A user with the same email already exists in the current project."));
    }
    stored.account.email = email.to_string();
    Ok(stored.account.clone())
  }

  async fn update_password(&self, password: &str, old_password: &str) -> Result<Account> {
    let mut state = self.guard("update_password")?;
    let stored = Self::session_account(&mut state)?;
    if stored.password != old_password {
      return Err(invalid_credentials());
    }
    stored.password = password.to_string();
    Ok(stored.account.clone())
  }

  async fn list_documents(&self, collection_id: &str, queries: &[Query]) -> Result<DocumentList> {
    let state = self.guard("list_documents")?;
    let docs = state.collections.get(collection_id).cloned().unwrap_or_default();
    let documents: Vec<JsonValue> = query::apply(queries, docs).into_iter()
      .map(|doc| self.expand(&state, collection_id, doc))
      .collect();
    Ok(DocumentList {
      total: documents.len() as u64,
      documents,
    })
  }

  async fn get_document(&self, collection_id: &str, document_id: &str) -> Result<JsonValue> {
    let state = self.guard("get_document")?;
    let doc = state.collections.get(collection_id)
      .and_then(|docs| docs.iter().find(|d| d["$id"] == document_id))
      .cloned()
      .ok_or_else(document_not_found)?;
    Ok(self.expand(&state, collection_id, doc))
  }

  async fn create_document(&self, collection_id: &str, document_id: &str, data: JsonValue)
    -> Result<JsonValue>
  {
    let mut state = self.guard("create_document")?;
    let mut map = as_object(data)?;
    let docs = state.collections.entry(collection_id.to_string()).or_default();
    if docs.iter().any(|d| d["$id"] == document_id) {
      return Err(backend_err(409, "document_already_exists",
        "Document with the requested ID already exists."));
    }
    let ts = now();
    map.insert("$id".into(), document_id.into());
    map.insert("$collectionId".into(), collection_id.into());
    map.insert("$databaseId".into(), self.cfg.database_id.clone().into());
    map.insert("$createdAt".into(), ts.clone().into());
    map.insert("$updatedAt".into(), ts.into());
    let doc = JsonValue::Object(map);
    docs.push(doc.clone());
    Ok(self.expand(&state, collection_id, doc))
  }

  async fn update_document(&self, collection_id: &str, document_id: &str, data: JsonValue)
    -> Result<JsonValue>
  {
    let mut state = self.guard("update_document")?;
    let changes = as_object(data)?;
    let doc = state.collections.get_mut(collection_id)
      .and_then(|docs| docs.iter_mut().find(|d| d["$id"] == document_id))
      .ok_or_else(document_not_found)?;
    if let JsonValue::Object(ref mut map) = doc {
      for (key, val) in changes.into_iter().filter(|(k, _)| !k.starts_with('$')) {
        map.insert(key, val);
      }
      map.insert("$updatedAt".into(), now().into());
    }
    let doc = doc.clone();
    Ok(self.expand(&state, collection_id, doc))
  }

  async fn delete_document(&self, collection_id: &str, document_id: &str) -> Result<()> {
    let mut state = self.guard("delete_document")?;
    let docs = state.collections.get_mut(collection_id).ok_or_else(document_not_found)?;
    let len = docs.len();
    docs.retain(|d| d["$id"] != document_id);
    if docs.len() == len {
      return Err(document_not_found());
    }
    Ok(())
  }

  async fn create_file(&self, file_id: &str, file: FileUpload) -> Result<StoredFile> {
    let mut state = self.guard("create_file")?;
    if state.files.contains_key(file_id) {
      return Err(backend_err(409, "storage_file_already_exists",
        "A storage file with the requested ID already exists."));
    }
    let stored = StoredFile {
      id: file_id.to_string(),
      name: file.name,
      mime_type: file.mime_type,
      size_original: file.bytes.len() as u64,
    };
    state.files.insert(file_id.to_string(), (stored.clone(), file.bytes));
    Ok(stored)
  }

  async fn delete_file(&self, file_id: &str) -> Result<()> {
    let mut state = self.guard("delete_file")?;
    match state.files.remove(file_id) {
      Some(_) => Ok(()),
      None => Err(file_not_found()),
    }
  }
}
