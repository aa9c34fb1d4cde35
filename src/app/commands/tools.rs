use crate::{
  error::*,
  app::*,
  backend,
  forms::ApiResponse,
  models::FileKind,
  services::StorageService,
  util,
};

/// Follower count as shown on a profile.
pub fn followers(count: u64) -> ApiResponse<String> {
  ApiResponse::success(util::format_followers(count))
}

pub fn check_email(email: &str) -> ApiResponse<String> {
  if util::is_valid_email(email) {
    ApiResponse::success(email.to_string())
  } else {
    ApiResponse::failure("Invalid email address")
  }
}

/// Preview url of a stored file, no request is made.
pub fn preview(config: &AppConfig, file_id: &str, kind: FileKind) -> Result<String> {
  let storage = StorageService::new(backend::connect(config)?);
  storage.get_file_preview(file_id, kind)
}

/// Stored file id referenced by a preview url.
pub fn file_id(url: &str) -> ApiResponse<String> {
  match util::extract_file_id(url) {
    Some(id) => ApiResponse::success(id.to_string()),
    None => ApiResponse::failure("File not found"),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tool_responses() {
    assert_eq!(followers(2500000), ApiResponse::success("2.50M".to_string()));
    assert!(!check_email("abc").is_success());
    assert_eq!(file_id("https://h/v1/storage/buckets/b/files/f7/preview"),
      ApiResponse::success("f7".to_string()));
  }

  #[test]
  fn preview_from_config() {
    let config = AppConfig::from_pairs(&[
      ("backend.kind", "memory"),
      ("backend.endpoint", "https://cloud.example.io/v1"),
      ("backend.project_id", "proj"),
      ("backend.storage_id", "bkt"),
    ]).unwrap();
    let url = preview(&config, "f1", FileKind::Video).unwrap();
    assert_eq!(url, "https://cloud.example.io/v1/storage/buckets/bkt/files/f1/preview?project=proj");
  }
}
