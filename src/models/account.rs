use serde::{Deserialize, Serialize};

/// Backend auth account (not the user profile document).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
  #[serde(rename = "$id")]
  pub id: String,
  #[serde(default)]
  pub name: String,
  pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountSession {
  #[serde(rename = "$id")]
  pub id: String,
  pub user_id: String,
  #[serde(default)]
  pub expire: String,
}
