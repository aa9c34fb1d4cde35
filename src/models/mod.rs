pub mod user;
pub mod post;
pub mod account;
pub mod file;

pub use self::{
  user::*,
  post::*,
  account::*,
  file::*,
};
