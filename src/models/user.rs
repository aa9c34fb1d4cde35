use serde::{Deserialize, Serialize};

/// User profile document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
  #[serde(rename = "$id")]
  pub id: String,
  pub account_id: String,
  pub username: String,
  pub email: String,
  pub avatar: String,
  #[serde(default)]
  pub followers: u64,
  #[serde(default)]
  pub saved_posts: Vec<String>,
}

impl User {
  pub fn has_saved(&self, post_id: &str) -> bool {
    self.saved_posts.iter().any(|id| id == post_id)
  }
}

/// Public view of a post's creator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
  #[serde(rename = "$id")]
  pub id: String,
  pub username: String,
  pub avatar: String,
}

impl From<&User> for Profile {
  fn from(user: &User) -> Self {
    Profile {
      id: user.id.clone(),
      username: user.username.clone(),
      avatar: user.avatar.clone(),
    }
  }
}
