use serde::{Deserialize, Serialize};

use crate::error::*;
use crate::util::is_valid_email;

use super::require_filled;

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignInForm {
  pub email: String,
  pub password: String,
}

impl SignInForm {
  pub fn validate(&self) -> Result<()> {
    require_filled(&[&self.email, &self.password])?;
    if !is_valid_email(&self.email) {
      return Err(Error::validation("Invalid email address"));
    }
    Ok(())
  }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignUpForm {
  pub username: String,
  pub email: String,
  pub password: String,
}

impl SignUpForm {
  pub fn validate(&self) -> Result<()> {
    require_filled(&[&self.username, &self.email, &self.password])?;
    if !is_valid_email(&self.email) {
      return Err(Error::validation("Invalid email address"));
    }
    check_password_len(&self.password)
  }
}

fn check_password_len(password: &str) -> Result<()> {
  if password.chars().count() < MIN_PASSWORD_LEN {
    return Err(Error::validation(format!(
      "Password must be at least {} characters", MIN_PASSWORD_LEN)));
  }
  Ok(())
}

/// A single settings change for the current user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum UserChange {
  Username {
    username: String,
  },
  #[serde(rename_all = "camelCase")]
  Email {
    email: String,
    current_password: String,
  },
  #[serde(rename_all = "camelCase")]
  Password {
    password: String,
    confirm_password: String,
    current_password: String,
  },
  Avatar {
    url: String,
  },
}

impl UserChange {
  /// Field name used in user-visible messages.
  pub fn field(&self) -> &'static str {
    match self {
      UserChange::Username { .. } => "username",
      UserChange::Email { .. } => "email",
      UserChange::Password { .. } => "password",
      UserChange::Avatar { .. } => "avatar",
    }
  }

  pub fn validate(&self) -> Result<()> {
    match self {
      UserChange::Username { username } => require_filled(&[username]),
      UserChange::Email { email, current_password } => {
        require_filled(&[email, current_password])?;
        if !is_valid_email(email) {
          return Err(Error::validation("Invalid email address"));
        }
        Ok(())
      },
      UserChange::Password { password, confirm_password, current_password } => {
        require_filled(&[password, confirm_password, current_password])?;
        if password != confirm_password {
          return Err(Error::validation("Passwords do not match!"));
        }
        check_password_len(password)
      },
      UserChange::Avatar { url } => {
        require_filled(&[url])?;
        url::Url::parse(url)
          .map_err(|_| Error::validation("Invalid avatar url"))?;
        Ok(())
      },
    }
  }
}
