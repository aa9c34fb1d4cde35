use serde::{Deserialize, Serialize};

use crate::error::*;

/// The `{isSuccess, data|message}` shape shown to users.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ApiResponse<T> {
  Success {
    #[serde(rename = "isSuccess")]
    is_success: True,
    data: T,
  },
  Failure {
    #[serde(rename = "isSuccess")]
    is_success: False,
    message: String,
  },
}

macro_rules! bool_tag {
  ($name:ident, $val:expr) => {
    #[derive(Debug, Clone, Copy, Default, PartialEq)]
    pub struct $name;

    impl Serialize for $name {
      fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_bool($val)
      }
    }

    impl<'de> Deserialize<'de> for $name {
      fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        if bool::deserialize(d)? == $val {
          Ok($name)
        } else {
          Err(serde::de::Error::custom(concat!("expected isSuccess = ", stringify!($val))))
        }
      }
    }
  };
}

bool_tag!(True, true);
bool_tag!(False, false);

impl<T> ApiResponse<T> {
  pub fn success(data: T) -> Self {
    ApiResponse::Success { is_success: True, data }
  }

  pub fn failure(message: impl Into<String>) -> Self {
    ApiResponse::Failure { is_success: False, message: message.into() }
  }

  pub fn is_success(&self) -> bool {
    matches!(self, ApiResponse::Success { .. })
  }

  pub fn message(&self) -> Option<&str> {
    match self {
      ApiResponse::Failure { message, .. } => Some(message),
      _ => None,
    }
  }
}

impl<T> From<Result<T>> for ApiResponse<T> {
  fn from(res: Result<T>) -> Self {
    match res {
      Ok(data) => ApiResponse::success(data),
      Err(err) => ApiResponse::failure(err.message()),
    }
  }
}
