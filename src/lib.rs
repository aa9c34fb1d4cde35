#[macro_use]
extern crate lazy_static;

pub mod error;
pub use error::Error;

pub mod util;

pub mod app;

pub mod forms;

pub mod models;

pub mod backend;

pub mod services;

pub mod state;
