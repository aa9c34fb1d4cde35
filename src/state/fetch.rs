use log::*;

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture};

use crate::error::*;

type Producer<T> = Rc<dyn Fn() -> LocalBoxFuture<'static, Result<T>>>;

struct FetchState<T> {
  data: T,
  is_loading: bool,
  error: Option<Rc<Error>>,
}

/// Loading/data/error state around a zero-argument async producer.
///
/// Data starts at `T::default()`, is replaced on every successful fetch and
/// left untouched when a fetch fails; the failure is kept in `error()` until
/// the next success.
pub struct UseFetch<T> {
  state: Rc<RefCell<FetchState<T>>>,
  producer: Producer<T>,
}

impl<T> Clone for UseFetch<T> {
  fn clone(&self) -> Self {
    Self {
      state: self.state.clone(),
      producer: self.producer.clone(),
    }
  }
}

impl<T: Clone + Default + 'static> UseFetch<T> {
  /// Create without fetching. `is_loading` starts true, as nothing was fetched yet.
  pub fn new<F, Fut>(producer: F) -> Self
  where
    F: Fn() -> Fut + 'static,
    Fut: Future<Output = Result<T>> + 'static,
  {
    Self {
      state: Rc::new(RefCell::new(FetchState {
        data: T::default(),
        is_loading: true,
        error: None,
      })),
      producer: Rc::new(move || producer().boxed_local()),
    }
  }

  /// Create and run the first fetch.
  pub async fn mount<F, Fut>(producer: F) -> Self
  where
    F: Fn() -> Fut + 'static,
    Fut: Future<Output = Result<T>> + 'static,
  {
    let fetch = Self::new(producer);
    fetch.refetch().await;
    fetch
  }

  /// Run the producer again and store its outcome.
  pub async fn refetch(&self) {
    self.state.borrow_mut().is_loading = true;
    let res = (self.producer)().await;
    let mut state = self.state.borrow_mut();
    match res {
      Ok(data) => {
        state.data = data;
        state.error = None;
      },
      Err(err) => {
        debug!("fetch failed: {}", err);
        state.error = Some(Rc::new(err));
      },
    }
    state.is_loading = false;
  }

  pub fn data(&self) -> T {
    self.state.borrow().data.clone()
  }

  /// Borrow the data without cloning it.
  pub fn with_data<R>(&self, f: impl FnOnce(&T) -> R) -> R {
    f(&self.state.borrow().data)
  }

  pub fn is_loading(&self) -> bool {
    self.state.borrow().is_loading
  }

  pub fn error(&self) -> Option<Rc<Error>> {
    self.state.borrow().error.clone()
  }

  /// Current state as a result: the data, or the last error.
  pub fn result(&self) -> std::result::Result<T, Rc<Error>> {
    let state = self.state.borrow();
    match state.error {
      Some(ref err) => Err(err.clone()),
      None => Ok(state.data.clone()),
    }
  }
}
