#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use aora::backend::MemoryBackend;
use aora::forms::*;
use aora::models::*;
use aora::services::Services;

pub fn setup() -> (Arc<MemoryBackend>, Services) {
  let backend = Arc::new(MemoryBackend::default().relate("videos", "creator", "users"));
  let services = Services::new(backend.clone());
  (backend, services)
}

pub fn sign_up_form(name: &str) -> SignUpForm {
  SignUpForm {
    username: name.to_string(),
    email: format!("{}@aora.dev", name),
    password: format!("{}-password", name),
  }
}

pub fn sign_in_form(name: &str) -> SignInForm {
  SignInForm {
    email: format!("{}@aora.dev", name),
    password: format!("{}-password", name),
  }
}

/// Local media files for post forms.
pub struct Media {
  pub dir: TempDir,
}

impl Media {
  pub fn new() -> Self {
    let dir = tempfile::tempdir().unwrap();
    Self { dir }
  }

  pub fn file(&self, name: &str) -> PathBuf {
    let path = self.dir.path().join(name);
    std::fs::write(&path, name.as_bytes()).unwrap();
    path
  }

  pub fn post_form(&self, title: &str) -> CreatePostForm {
    CreatePostForm {
      title: title.to_string(),
      prompt: format!("prompt for {}", title),
      video: MediaSource::local(self.file(&format!("{}.mp4", title.replace(' ', "_")))),
      thumbnail: MediaSource::local(self.file(&format!("{}.png", title.replace(' ', "_")))),
    }
  }
}

pub async fn user_with_post(services: &Services, media: &Media, name: &str) -> (User, Post) {
  let user = services.users.create_user(&sign_up_form(name)).await.unwrap();
  let post = services.posts.create_post(&media.post_form(&format!("{} video", name)))
    .await
    .unwrap();
  (user, post)
}
