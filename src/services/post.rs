use log::*;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::*;
use crate::app::*;
use crate::backend::{BoxBackend, Query};
use crate::forms::*;
use crate::models::*;
use crate::util::unique_id;

use super::{decode, decode_all, UserService, StorageService, DEFAULT_VIDEO_COLLECTION};

pub const DEFAULT_LATEST_LIMIT: u64 = 7;

const CREATED_AT: &str = "$createdAt";

/// Result of toggling a bookmark.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
  pub post_id: String,
  pub saved: bool,
  pub message: String,
}

/// Video posts and bookmarks.
#[derive(Clone)]
pub struct PostService {
  backend: BoxBackend,
  pub users: UserService,
  pub storage: StorageService,
  pub collection_id: String,
  pub latest_limit: u64,
}

impl PostService {
  pub fn new(backend: BoxBackend, users: UserService, storage: StorageService) -> Self {
    Self {
      backend,
      users,
      storage,
      collection_id: DEFAULT_VIDEO_COLLECTION.to_string(),
      latest_limit: DEFAULT_LATEST_LIMIT,
    }
  }

  async fn list(&self, queries: &[Query]) -> Result<Vec<Post>> {
    let list = self.backend.list_documents(&self.collection_id, queries).await?;
    decode_all(list.documents)
  }

  /// Public posts, newest first.
  pub async fn get_all_posts(&self) -> Result<Vec<Post>> {
    self.list(&[
      Query::equal("isPublic", [true]),
      Query::order_desc(CREATED_AT),
    ]).await
  }

  pub async fn get_latest_posts(&self) -> Result<Vec<Post>> {
    self.list(&[
      Query::equal("isPublic", [true]),
      Query::order_desc(CREATED_AT),
      Query::limit(self.latest_limit),
    ]).await
  }

  pub async fn search_posts(&self, query: &str) -> Result<Vec<Post>> {
    let query = query.trim();
    if query.is_empty() {
      return Err(Error::validation(
        "Please input something to search results across database."));
    }
    self.list(&[
      Query::search("title", query),
      Query::equal("isPublic", [true]),
    ]).await
  }

  /// All posts of a creator, private ones included.
  pub async fn get_user_posts(&self, user_id: &str) -> Result<Vec<Post>> {
    self.list(&[
      Query::equal("creator", [user_id]),
      Query::order_desc(CREATED_AT),
    ]).await
  }

  /// The current user's bookmarked posts, optionally narrowed by a title search.
  pub async fn get_saved_posts(&self, query: Option<&str>) -> Result<Vec<Post>> {
    let user = self.users.get_current_user().await?;
    if user.saved_posts.is_empty() {
      return Ok(Vec::new());
    }
    let mut queries = vec![
      Query::equal("$id", user.saved_posts.iter().map(String::as_str)),
      Query::order_desc(CREATED_AT),
    ];
    if let Some(query) = query.map(str::trim).filter(|q| !q.is_empty()) {
      queries.push(Query::search("title", query));
    }
    self.list(&queries).await
  }

  pub async fn get_post_by_id(&self, post_id: &str) -> Result<Post> {
    match self.backend.get_document(&self.collection_id, post_id).await {
      Ok(doc) => decode(doc),
      Err(Error::NotFound(_)) => Err(Error::not_found("Post not found")),
      Err(err) => Err(err),
    }
  }

  /// Upload both media files and create the post for the current user.
  ///
  /// Files uploaded before a failure are removed again.
  pub async fn create_post(&self, form: &CreatePostForm) -> Result<Post> {
    form.validate()?;
    self.storage.check_source(&form.thumbnail, FileKind::Image)?;
    self.storage.check_source(&form.video, FileKind::Video)?;
    let user = self.users.get_current_user().await?;

    let (thumbnail, video) = futures::join!(
      self.storage.upload_file(&form.thumbnail, FileKind::Image),
      self.storage.upload_file(&form.video, FileKind::Video),
    );
    let mut uploaded = Vec::new();
    if let (MediaSource::LocalAsset { .. }, Ok(url)) = (&form.thumbnail, &thumbnail) {
      uploaded.push(url.clone());
    }
    if let (MediaSource::LocalAsset { .. }, Ok(url)) = (&form.video, &video) {
      uploaded.push(url.clone());
    }
    let (thumbnail, video) = match (thumbnail, video) {
      (Ok(thumbnail), Ok(video)) => (thumbnail, video),
      (Err(err), _) | (_, Err(err)) => {
        self.storage.discard_uploads(&uploaded).await;
        return Err(err);
      },
    };

    let res = self.backend.create_document(&self.collection_id, &unique_id(), json!({
      "title": form.title,
      "prompt": form.prompt,
      "thumbnail": thumbnail,
      "video": video,
      "creator": user.id,
      "isPublic": true,
    })).await;
    match res {
      Ok(doc) => {
        let post: Post = decode(doc)?;
        info!("create_post: post={} creator={}", post.id, user.id);
        Ok(post)
      },
      Err(err) => {
        error!("create_post: failed to store post: {:?}", err);
        self.storage.discard_uploads(&uploaded).await;
        Err(err)
      },
    }
  }

  /// Update title, prompt, visibility and thumbnail of the current user's post.
  ///
  /// A new thumbnail is uploaded first and the old file deleted only after
  /// the post points at the new one.
  pub async fn edit_post(&self, form: &EditPostForm) -> Result<Post> {
    form.validate()?;
    self.storage.check_source(&form.thumbnail, FileKind::Image)?;
    let post = self.get_post_by_id(&form.id).await?;
    let user = self.users.get_current_user().await?;
    if !post.is_created_by(&user) {
      return Err(Error::unauthorized("You are not allowed to edit this post"));
    }
    if let MediaSource::RemoteUrl { ref url } = form.thumbnail {
      // only the post's own stored thumbnail can be kept.
      if url != &post.thumbnail {
        return Err(Error::validation("Please pick a new thumbnail to upload"));
      }
    }

    let thumbnail = self.storage.upload_file(&form.thumbnail, FileKind::Image).await?;
    let replaced = thumbnail != post.thumbnail;

    let res = self.backend.update_document(&self.collection_id, &post.id, json!({
      "title": form.title,
      "prompt": form.prompt,
      "thumbnail": thumbnail,
      "isPublic": form.is_public,
    })).await;
    let doc = match res {
      Ok(doc) => doc,
      Err(err) => {
        if let MediaSource::LocalAsset { .. } = form.thumbnail {
          self.storage.discard_uploads(&[thumbnail]).await;
        }
        return Err(err);
      },
    };

    if replaced {
      if let Err(err) = self.storage.delete_file_by_url(&post.thumbnail).await {
        warn!("edit_post: failed to delete old thumbnail {}: {:?}", post.thumbnail, err);
      }
    }
    info!("edit_post: post={} thumbnail_replaced={}", post.id, replaced);
    decode(doc)
  }

  /// Delete the current user's post and its stored files.
  pub async fn delete_post_by_id(&self, post_id: &str) -> Result<()> {
    let post = self.get_post_by_id(post_id).await?;
    let user = self.users.get_current_user().await?;
    if !post.is_created_by(&user) {
      return Err(Error::unauthorized("You are not allowed to delete this post"));
    }

    self.backend.delete_document(&self.collection_id, &post.id).await?;
    for url in [&post.thumbnail, &post.video] {
      if let Err(err) = self.storage.delete_file_by_url(url).await {
        warn!("delete_post: failed to delete file {}: {:?}", url, err);
      }
    }
    info!("delete_post: post={}", post.id);
    Ok(())
  }

  /// Toggle a post in the current user's bookmarks.
  pub async fn bookmark_post_by_id(&self, post_id: &str) -> Result<Bookmark> {
    let post = self.get_post_by_id(post_id).await?;
    let mut user = self.users.get_current_user().await?;

    let saved = if user.has_saved(&post.id) {
      user.saved_posts.retain(|id| id != &post.id);
      false
    } else {
      user.saved_posts.push(post.id.clone());
      true
    };
    self.users.update_user(&user.id, json!({ "savedPosts": user.saved_posts })).await?;

    let message = if saved {
      "Post saved to bookmarks"
    } else {
      "Post removed from bookmarks"
    };
    Ok(Bookmark {
      post_id: post.id,
      saved,
      message: message.to_string(),
    })
  }
}

impl super::Service for PostService {
  fn load_app_config(&mut self, config: &AppConfig) -> Result<()> {
    if let Some(collection_id) = config.get_str("backend.video_collection_id")? {
      self.collection_id = collection_id;
    }
    if let Some(limit) = config.get_int("post.latest_limit")? {
      if limit <= 0 {
        return Err(Error::BadRequest("post.latest_limit must be > 0".to_string()));
      }
      self.latest_limit = limit as u64;
    }
    Ok(())
  }
}
