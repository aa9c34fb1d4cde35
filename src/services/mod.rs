use log::*;

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::error::*;
use crate::app::*;
use crate::backend::{self, BoxBackend};

mod user;
mod post;
mod storage;

pub use self::{
  user::*,
  post::*,
  storage::*,
};

pub const DEFAULT_USER_COLLECTION: &str = "users";
pub const DEFAULT_VIDEO_COLLECTION: &str = "videos";

pub trait Service {
  /// Load Service config from AppConfig.
  fn load_app_config(&mut self, config: &AppConfig) -> Result<()>;
}

pub(crate) fn decode<T: DeserializeOwned>(doc: JsonValue) -> Result<T> {
  Ok(serde_json::from_value(doc)?)
}

pub(crate) fn decode_all<T: DeserializeOwned>(docs: Vec<JsonValue>) -> Result<Vec<T>> {
  docs.into_iter().map(decode).collect()
}

/// The backend access layer: every operation returns `Result`.
#[derive(Clone)]
pub struct Services {
  pub users: UserService,
  pub posts: PostService,
  pub storage: StorageService,
}

impl Services {
  pub fn new(backend: BoxBackend) -> Services {
    let users = UserService::new(backend.clone());
    let storage = StorageService::new(backend.clone());
    let posts = PostService::new(backend, users.clone(), storage.clone());
    Services {
      users,
      posts,
      storage,
    }
  }

  /// Load Service config from AppConfig.
  pub fn load_app_config(&mut self, config: &AppConfig) -> Result<()> {
    info!("Loading UserService config");
    self.users.load_app_config(config)?;
    info!("Loading StorageService config");
    self.storage.load_app_config(config)?;
    info!("Loading PostService config");
    self.posts.users = self.users.clone();
    self.posts.storage = self.storage.clone();
    self.posts.load_app_config(config)?;
    Ok(())
  }
}

pub fn config_services(config: &AppConfig) -> Result<Services> {
  let backend = backend::connect(config)?;
  let mut services = Services::new(backend);
  services.load_app_config(config)?;
  Ok(services)
}
