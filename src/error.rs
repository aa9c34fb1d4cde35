use log::*;

use serde::Deserialize;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
  // 401
  #[error("unauthorized: {0}")]
  Unauthorized(String),

  // 404
  #[error("not found: {0}")]
  NotFound(String),

  // 422
  #[error("validation failed: {0}")]
  Validation(String),

  // 500
  #[error("internal server error")]
  InternalServerError,

  // 400
  #[error("bad request: {0}")]
  BadRequest(String),

  // Backend returned an error we don't map to a category.
  #[error("backend error ({code} {kind}): {message}")]
  Backend {
    code: u16,
    kind: String,
    message: String,
  },

  // Json error
  #[error("Json error: {source}")]
  JsonError {
    #[from]
    source: serde_json::Error,
  },

  #[error("http error: {source}")]
  HttpError {
    #[from]
    source: reqwest::Error,
  },

  #[error("url error: {source}")]
  UrlError {
    #[from]
    source: url::ParseError,
  },

  #[error("std io error")]
  IOError {
    #[from]
    source: std::io::Error,
  },

  #[error("config error")]
  ConfigError {
    #[from]
    source: config::ConfigError,
  },

  #[error(transparent)]
  Other(#[from] anyhow::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error body returned by the backend for non-success responses.
#[derive(Debug, Default, Deserialize)]
pub struct BackendErrorBody {
  #[serde(default)]
  pub message: String,
  #[serde(default)]
  pub code: u16,
  #[serde(default, rename = "type")]
  pub kind: String,
}

impl Error {
  /// Map a backend status code and error body to an error category.
  pub fn from_backend(status: u16, body: BackendErrorBody) -> Self {
    match status {
      401 => Error::Unauthorized(body.message),
      404 => Error::NotFound(body.message),
      400 | 409 => Error::BadRequest(body.message),
      code => Error::Backend {
        code,
        kind: body.kind,
        message: body.message,
      },
    }
  }

  pub fn validation(msg: impl Into<String>) -> Self {
    Error::Validation(msg.into())
  }

  pub fn not_found(msg: impl Into<String>) -> Self {
    Error::NotFound(msg.into())
  }

  pub fn unauthorized(msg: impl Into<String>) -> Self {
    Error::Unauthorized(msg.into())
  }

  /// User-visible message for this error.
  pub fn message(&self) -> String {
    match self {
      Error::Unauthorized(ref message) => message.clone(),
      Error::NotFound(ref message) => message.clone(),
      Error::Validation(ref message) => message.clone(),
      Error::BadRequest(ref message) => message.clone(),
      Error::Backend { ref message, .. } if !message.is_empty() => message.clone(),
      ref err => {
        error!("InternalServerError: {:?}", err);
        "Internal server error".to_string()
      },
    }
  }
}
