use log::*;

use serde_json::{json, Value as JsonValue};

use crate::error::*;
use crate::app::*;
use crate::backend::{BoxBackend, Query};
use crate::forms::*;
use crate::models::*;
use crate::util::unique_id;

use super::{decode, DEFAULT_USER_COLLECTION};

/// Accounts, sessions and the user profile documents.
#[derive(Clone)]
pub struct UserService {
  backend: BoxBackend,
  pub collection_id: String,
  pub allow_register: bool,
}

impl UserService {
  pub fn new(backend: BoxBackend) -> Self {
    Self {
      backend,
      collection_id: DEFAULT_USER_COLLECTION.to_string(),
      allow_register: true,
    }
  }

  /// Register a new account, sign in and create its profile document.
  pub async fn create_user(&self, form: &SignUpForm) -> Result<User> {
    form.validate()?;
    if !self.allow_register {
      return Err(Error::unauthorized("Registration is disabled"));
    }

    let account = self.backend
      .create_account(&unique_id(), &form.email, &form.password, &form.username)
      .await
      .map_err(|err| {
        warn!("create_user: failed to create account: {:?}", err);
        err
      })?;
    let avatar = self.backend.initials_avatar_url(&form.username)?;

    self.sign_in(&SignInForm {
      email: form.email.clone(),
      password: form.password.clone(),
    }).await?;

    let doc = self.backend.create_document(&self.collection_id, &unique_id(), json!({
      "accountId": account.id,
      "email": form.email,
      "username": form.username,
      "avatar": avatar,
      "followers": 0,
      "savedPosts": [],
    })).await?;
    info!("create_user: registered {} (account={})", form.username, account.id);
    decode(doc)
  }

  pub async fn sign_in(&self, form: &SignInForm) -> Result<AccountSession> {
    form.validate()?;
    let session = self.backend.create_email_session(&form.email, &form.password).await?;
    debug!("sign_in: session={} account={}", session.id, session.user_id);
    Ok(session)
  }

  pub async fn sign_out(&self) -> Result<()> {
    self.backend.delete_session("current").await
  }

  /// Profile document of the signed in account.
  pub async fn get_current_user(&self) -> Result<User> {
    let account = self.backend.get_account().await?;
    let list = self.backend.list_documents(&self.collection_id, &[
      Query::equal("accountId", [account.id.as_str()]),
      Query::limit(1),
    ]).await?;
    match list.documents.into_iter().next() {
      Some(doc) => decode(doc),
      None => Err(Error::not_found("User not found")),
    }
  }

  pub(crate) async fn update_user(&self, user_id: &str, data: JsonValue) -> Result<User> {
    let doc = self.backend.update_document(&self.collection_id, user_id, data).await?;
    decode(doc)
  }

  /// Apply a settings change to the account and the profile document.
  pub async fn change_user_data(&self, change: &UserChange) -> Result<User> {
    change.validate()?;
    let user = self.get_current_user().await?;
    let data = match change {
      UserChange::Username { username } => {
        self.backend.update_name(username).await?;
        json!({ "username": username })
      },
      UserChange::Email { email, current_password } => {
        self.backend.update_email(email, current_password).await?;
        json!({ "email": email })
      },
      UserChange::Password { password, current_password, .. } => {
        self.backend.update_password(password, current_password).await?;
        // password lives on the account only.
        return Ok(user);
      },
      UserChange::Avatar { url } => json!({ "avatar": url }),
    };
    info!("change_user_data: user={} field={}", user.id, change.field());
    self.update_user(&user.id, data).await
  }

  pub async fn change_user_followers(&self, followers: i64) -> Result<User> {
    if followers < 0 {
      return Err(Error::validation("Followers must be a positive number"));
    }
    let user = self.get_current_user().await?;
    self.update_user(&user.id, json!({ "followers": followers })).await
  }
}

impl super::Service for UserService {
  fn load_app_config(&mut self, config: &AppConfig) -> Result<()> {
    if let Some(collection_id) = config.get_str("backend.user_collection_id")? {
      self.collection_id = collection_id;
    }
    self.allow_register = config.get_bool("user.allow_register")?.unwrap_or(true);
    Ok(())
  }
}
