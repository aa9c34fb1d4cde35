pub mod user;
pub mod post;
pub mod response;

pub use self::{
  user::*,
  post::*,
  response::*,
};

use crate::error::*;

/// Reject empty (or whitespace only) required fields.
pub(crate) fn require_filled(fields: &[&str]) -> Result<()> {
  if fields.iter().any(|f| f.trim().is_empty()) {
    return Err(Error::validation("Please fill in all the fields"));
  }
  Ok(())
}
