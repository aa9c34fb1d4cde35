use chrono::{DateTime, Utc};

use serde::{Deserialize, Serialize};

use crate::models::*;

/// Reference to a post's creator.
///
/// The backend expands relationship attributes when it can, so the creator
/// arrives either as a bare user id or as the embedded profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CreatorRef {
  Id(String),
  Expanded(Profile),
}

impl CreatorRef {
  pub fn id(&self) -> &str {
    match self {
      CreatorRef::Id(id) => id,
      CreatorRef::Expanded(profile) => &profile.id,
    }
  }

  pub fn profile(&self) -> Option<&Profile> {
    match self {
      CreatorRef::Id(_) => None,
      CreatorRef::Expanded(profile) => Some(profile),
    }
  }
}

/// Video post document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
  #[serde(rename = "$id")]
  pub id: String,
  pub title: String,
  pub prompt: String,
  pub thumbnail: String,
  pub video: String,
  pub creator: CreatorRef,
  #[serde(default)]
  pub is_public: bool,
  #[serde(rename = "$createdAt")]
  pub created_at: DateTime<Utc>,
}

impl Post {
  pub fn is_created_by(&self, user: &User) -> bool {
    self.creator.id() == user.id
  }
}
