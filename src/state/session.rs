use log::*;

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::*;
use crate::forms::*;
use crate::models::*;
use crate::services::UserService;

#[derive(Debug, Default)]
struct SessionState {
  is_logged_in: bool,
  user: Option<User>,
  is_loading: bool,
}

/// Logged in user and login flag for the running client.
///
/// Create one with `Session::init` at startup and pass it (or its clones)
/// to whatever needs it.
#[derive(Clone)]
pub struct Session {
  users: UserService,
  state: Rc<RefCell<SessionState>>,
}

impl Session {
  /// Session that hasn't asked the backend yet.
  pub fn new(users: UserService) -> Self {
    Self {
      users,
      state: Rc::new(RefCell::new(SessionState {
        is_loading: true,
        ..Default::default()
      })),
    }
  }

  /// Create the session and load the current user, if any.
  pub async fn init(users: UserService) -> Self {
    let session = Self::new(users);
    session.refetch().await;
    session
  }

  /// Ask the backend for the current user again.
  pub async fn refetch(&self) {
    self.state.borrow_mut().is_loading = true;
    let res = self.users.get_current_user().await;
    let mut state = self.state.borrow_mut();
    match res {
      Ok(user) => {
        debug!("session: logged in as {}", user.username);
        state.is_logged_in = true;
        state.user = Some(user);
      },
      Err(err) => {
        debug!("session: no current user: {}", err);
        state.is_logged_in = false;
        state.user = None;
      },
    }
    state.is_loading = false;
  }

  pub fn is_logged_in(&self) -> bool {
    self.state.borrow().is_logged_in
  }

  pub fn is_loading(&self) -> bool {
    self.state.borrow().is_loading
  }

  pub fn user(&self) -> Option<User> {
    self.state.borrow().user.clone()
  }

  /// Current user, or `Unauthorized` when signed out.
  pub fn require_user(&self) -> Result<User> {
    self.user().ok_or_else(|| Error::unauthorized("Please sign in first"))
  }

  pub fn set_user(&self, user: Option<User>) {
    self.state.borrow_mut().user = user;
  }

  pub fn set_logged_in(&self, is_logged_in: bool) {
    self.state.borrow_mut().is_logged_in = is_logged_in;
  }

  fn logged_in_as(&self, user: User) {
    self.set_user(Some(user));
    self.set_logged_in(true);
  }

  fn logged_out(&self) {
    self.set_user(None);
    self.set_logged_in(false);
  }

  /// Sign in and load the user. An existing session is closed first.
  pub async fn sign_in(&self, form: &SignInForm) -> Result<User> {
    form.validate()?;
    if self.is_logged_in() {
      if let Err(err) = self.users.sign_out().await {
        debug!("session: closing previous session failed: {}", err);
      }
      self.logged_out();
    }
    self.users.sign_in(form).await?;
    let user = match self.users.get_current_user().await {
      Ok(user) => user,
      Err(err) => {
        // don't leave a backend session behind that local state doesn't know about.
        if let Err(close_err) = self.users.sign_out().await {
          warn!("session: closing session after failed sign in: {}", close_err);
        }
        return Err(err);
      },
    };
    self.logged_in_as(user.clone());
    Ok(user)
  }

  pub async fn sign_up(&self, form: &SignUpForm) -> Result<User> {
    form.validate()?;
    if self.is_logged_in() {
      return Err(Error::validation("Please sign out before creating a new account"));
    }
    let user = self.users.create_user(form).await?;
    self.logged_in_as(user.clone());
    Ok(user)
  }

  pub async fn sign_out(&self) -> Result<()> {
    let res = self.users.sign_out().await;
    // local state is cleared even if the backend already dropped the session.
    self.logged_out();
    res
  }
}
