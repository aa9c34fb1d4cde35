//! Client-side state shared by the commands: fetch results and the session.
//!
//! Both are single-threaded handles (`Rc<RefCell<_>>`), cloned freely and
//! mutated only between awaits.

mod fetch;
mod session;

pub use self::{
  fetch::*,
  session::*,
};
