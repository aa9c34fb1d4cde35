mod common;

use aora::error::Error;
use aora::forms::*;
use aora::models::*;
use aora::util::extract_file_id;

use common::*;

#[tokio::test]
async fn sign_up_creates_profile_and_session() {
  let (_backend, services) = setup();
  let user = services.users.create_user(&sign_up_form("alice")).await.unwrap();
  assert_eq!(user.username, "alice");
  assert_eq!(user.email, "alice@aora.dev");
  assert_eq!(user.followers, 0);
  assert!(user.saved_posts.is_empty());
  assert!(user.avatar.contains("/avatars/initials?name=alice"));

  let current = services.users.get_current_user().await.unwrap();
  assert_eq!(current, user);
}

#[tokio::test]
async fn registration_can_be_disabled() {
  let (_backend, mut services) = setup();
  services.users.allow_register = false;
  let res = services.users.create_user(&sign_up_form("alice")).await;
  assert!(matches!(res, Err(Error::Unauthorized(_))));
}

#[tokio::test]
async fn sign_in_and_out() {
  let (_backend, services) = setup();
  services.users.create_user(&sign_up_form("alice")).await.unwrap();
  services.users.sign_out().await.unwrap();

  let res = services.users.get_current_user().await;
  assert!(matches!(res, Err(Error::Unauthorized(_))));

  let mut form = sign_in_form("alice");
  form.password = "not-the-password".into();
  let res: ApiResponse<AccountSession> = services.users.sign_in(&form).await.into();
  assert_eq!(res.message(), Some("Invalid credentials. Please check the email and password."));

  services.users.sign_in(&sign_in_form("alice")).await.unwrap();
  assert_eq!(services.users.get_current_user().await.unwrap().username, "alice");
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
  let (_backend, services) = setup();
  services.users.create_user(&sign_up_form("alice")).await.unwrap();
  services.users.sign_out().await.unwrap();
  let mut form = sign_up_form("bob");
  form.email = "alice@aora.dev".into();
  assert!(matches!(services.users.create_user(&form).await, Err(Error::BadRequest(_))));
}

#[tokio::test]
async fn create_post_uploads_media() {
  let (backend, services) = setup();
  let media = Media::new();
  let (user, post) = user_with_post(&services, &media, "alice").await;

  assert_eq!(backend.file_count(), 2);
  assert!(post.thumbnail.contains("/preview?width=2000&height=2000&gravity=top&quality=100"));
  assert!(post.video.ends_with("/preview?project=aora"));
  for url in [&post.thumbnail, &post.video] {
    let file_id = extract_file_id(url).unwrap();
    assert!(backend.has_file(file_id));
  }
  assert!(post.is_public);
  assert!(post.is_created_by(&user));
  let creator = post.creator.profile().expect("creator is expanded");
  assert_eq!(creator.username, "alice");

  let fetched = services.posts.get_post_by_id(&post.id).await.unwrap();
  assert_eq!(fetched, post);
}

#[tokio::test]
async fn create_post_validates_form() {
  let (backend, services) = setup();
  let media = Media::new();
  services.users.create_user(&sign_up_form("alice")).await.unwrap();

  let mut form = media.post_form("clip");
  form.title = "  ".into();
  assert!(matches!(services.posts.create_post(&form).await, Err(Error::Validation(_))));

  let mut form = media.post_form("clip");
  form.video = MediaSource::local(media.file("not_a_video.png"));
  match services.posts.create_post(&form).await {
    Err(Error::Validation(msg)) => assert!(msg.starts_with("Invalid file type")),
    res => panic!("unexpected: {:?}", res),
  }

  let mut form = media.post_form("clip");
  form.thumbnail = MediaSource::local(media.dir.path().join("missing.png"));
  match services.posts.create_post(&form).await {
    Err(Error::NotFound(msg)) => assert_eq!(msg, "Image not found!"),
    res => panic!("unexpected: {:?}", res),
  }
  // the video uploaded alongside the missing thumbnail is removed again.
  assert_eq!(backend.file_count(), 0);
}

#[tokio::test]
async fn create_post_requires_session() {
  let (backend, services) = setup();
  let media = Media::new();
  let res = services.posts.create_post(&media.post_form("clip")).await;
  assert!(matches!(res, Err(Error::Unauthorized(_))));
  assert_eq!(backend.file_count(), 0);
}

#[tokio::test]
async fn failed_post_removes_uploaded_files() {
  let (backend, services) = setup();
  let media = Media::new();
  services.users.create_user(&sign_up_form("alice")).await.unwrap();

  backend.fail_next("create_document");
  let res = services.posts.create_post(&media.post_form("clip")).await;
  assert!(matches!(res, Err(Error::Backend { code: 500, .. })));
  assert_eq!(backend.file_count(), 0);

  backend.fail_next("create_file");
  assert!(services.posts.create_post(&media.post_form("clip")).await.is_err());
  assert_eq!(backend.file_count(), 0);
}

#[tokio::test]
async fn listing_respects_visibility() {
  let (_backend, services) = setup();
  let media = Media::new();
  let (alice, public) = user_with_post(&services, &media, "alice").await;
  let private = services.posts.create_post(&media.post_form("secret cat")).await.unwrap();
  let mut form = EditPostForm::from_post(&private);
  form.is_public = false;
  services.posts.edit_post(&form).await.unwrap();

  let all = services.posts.get_all_posts().await.unwrap();
  assert_eq!(all.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(), vec![public.id.as_str()]);

  let mine = services.posts.get_user_posts(&alice.id).await.unwrap();
  assert_eq!(mine.len(), 2);

  let found = services.posts.search_posts("CAT").await.unwrap();
  assert!(found.is_empty());
  let found = services.posts.search_posts("alice").await.unwrap();
  assert_eq!(found.len(), 1);

  assert!(matches!(services.posts.search_posts("   ").await, Err(Error::Validation(_))));
}

#[tokio::test]
async fn latest_posts_are_newest_first_and_limited() {
  let (_backend, mut services) = setup();
  services.posts.latest_limit = 3;
  let media = Media::new();
  services.users.create_user(&sign_up_form("alice")).await.unwrap();
  for n in 0..5 {
    services.posts.create_post(&media.post_form(&format!("clip {}", n))).await.unwrap();
  }
  let titles = |posts: Vec<Post>| posts.into_iter().map(|p| p.title).collect::<Vec<_>>();
  assert_eq!(titles(services.posts.get_latest_posts().await.unwrap()),
    vec!["clip 4", "clip 3", "clip 2"]);
  assert_eq!(titles(services.posts.get_all_posts().await.unwrap()),
    vec!["clip 4", "clip 3", "clip 2", "clip 1", "clip 0"]);
}

#[tokio::test]
async fn missing_post_is_not_found() {
  let (_backend, services) = setup();
  let res: ApiResponse<Post> = services.posts.get_post_by_id("nope").await.into();
  assert_eq!(res, ApiResponse::failure("Post not found"));
}

#[tokio::test]
async fn edit_post_replaces_thumbnail_after_update() {
  let (backend, services) = setup();
  let media = Media::new();
  let (_alice, post) = user_with_post(&services, &media, "alice").await;
  let old_file = extract_file_id(&post.thumbnail).unwrap().to_string();

  let mut form = EditPostForm::from_post(&post);
  form.title = "Renamed".into();
  form.thumbnail = MediaSource::local(media.file("new_thumb.jpg"));
  let edited = services.posts.edit_post(&form).await.unwrap();

  assert_eq!(edited.title, "Renamed");
  assert_eq!(edited.video, post.video);
  assert_ne!(edited.thumbnail, post.thumbnail);
  assert!(!backend.has_file(&old_file));
  assert!(backend.has_file(extract_file_id(&edited.thumbnail).unwrap()));
  assert_eq!(backend.file_count(), 2);
}

#[tokio::test]
async fn edit_post_keeps_remote_thumbnail() {
  let (backend, services) = setup();
  let media = Media::new();
  let (_alice, post) = user_with_post(&services, &media, "alice").await;

  let mut form = EditPostForm::from_post(&post);
  form.prompt = "better prompt".into();
  let edited = services.posts.edit_post(&form).await.unwrap();
  assert_eq!(edited.prompt, "better prompt");
  assert_eq!(edited.thumbnail, post.thumbnail);
  assert_eq!(backend.file_count(), 2);
}

#[tokio::test]
async fn failed_edit_keeps_old_thumbnail() {
  let (backend, services) = setup();
  let media = Media::new();
  let (_alice, post) = user_with_post(&services, &media, "alice").await;

  let mut form = EditPostForm::from_post(&post);
  form.thumbnail = MediaSource::local(media.file("other.png"));
  backend.fail_next("update_document");
  assert!(services.posts.edit_post(&form).await.is_err());

  let stored = services.posts.get_post_by_id(&post.id).await.unwrap();
  assert_eq!(stored.thumbnail, post.thumbnail);
  assert!(backend.has_file(extract_file_id(&post.thumbnail).unwrap()));
  assert_eq!(backend.file_count(), 2);
}

#[tokio::test]
async fn posts_cannot_share_stored_files() {
  let (backend, services) = setup();
  let media = Media::new();
  let (_alice, first) = user_with_post(&services, &media, "alice").await;

  let mut form = media.post_form("copy");
  form.thumbnail = MediaSource::remote(first.thumbnail.clone());
  form.video = MediaSource::remote(first.video.clone());
  assert!(matches!(services.posts.create_post(&form).await, Err(Error::Validation(_))));

  let second = services.posts.create_post(&media.post_form("second")).await.unwrap();
  let mut form = EditPostForm::from_post(&second);
  form.thumbnail = MediaSource::remote(first.thumbnail.clone());
  match services.posts.edit_post(&form).await {
    Err(Error::Validation(msg)) => assert_eq!(msg, "Please pick a new thumbnail to upload"),
    res => panic!("unexpected: {:?}", res),
  }

  services.posts.delete_post_by_id(&second.id).await.unwrap();
  assert_eq!(backend.file_count(), 2);
  for url in [&first.thumbnail, &first.video] {
    assert!(backend.has_file(extract_file_id(url).unwrap()));
  }
  assert_eq!(services.posts.get_post_by_id(&first.id).await.unwrap(), first);
}

#[tokio::test]
async fn only_creator_can_edit_or_delete() {
  let (_backend, services) = setup();
  let media = Media::new();
  let (_alice, post) = user_with_post(&services, &media, "alice").await;
  services.users.sign_out().await.unwrap();
  services.users.create_user(&sign_up_form("bob")).await.unwrap();

  let mut form = EditPostForm::from_post(&post);
  form.title = "mine now".into();
  match services.posts.edit_post(&form).await {
    Err(Error::Unauthorized(msg)) => assert_eq!(msg, "You are not allowed to edit this post"),
    res => panic!("unexpected: {:?}", res),
  }
  assert!(matches!(services.posts.delete_post_by_id(&post.id).await, Err(Error::Unauthorized(_))));
  assert_eq!(services.posts.get_post_by_id(&post.id).await.unwrap().title, post.title);
}

#[tokio::test]
async fn delete_post_removes_files() {
  let (backend, services) = setup();
  let media = Media::new();
  let (_alice, post) = user_with_post(&services, &media, "alice").await;

  services.posts.delete_post_by_id(&post.id).await.unwrap();
  assert_eq!(backend.file_count(), 0);
  assert!(matches!(services.posts.get_post_by_id(&post.id).await, Err(Error::NotFound(_))));
  assert!(matches!(services.posts.delete_post_by_id(&post.id).await, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn bookmarks_toggle_and_list() {
  let (_backend, services) = setup();
  let media = Media::new();
  let (_alice, first) = user_with_post(&services, &media, "alice").await;
  let second = services.posts.create_post(&media.post_form("dancing dog")).await.unwrap();

  assert!(services.posts.get_saved_posts(None).await.unwrap().is_empty());

  let mark = services.posts.bookmark_post_by_id(&first.id).await.unwrap();
  assert!(mark.saved);
  assert_eq!(mark.message, "Post saved to bookmarks");
  services.posts.bookmark_post_by_id(&second.id).await.unwrap();

  let user = services.users.get_current_user().await.unwrap();
  assert_eq!(user.saved_posts, vec![first.id.clone(), second.id.clone()]);
  assert_eq!(services.posts.get_saved_posts(None).await.unwrap().len(), 2);

  let found = services.posts.get_saved_posts(Some("dog")).await.unwrap();
  assert_eq!(found.iter().map(|p| p.id.clone()).collect::<Vec<_>>(), vec![second.id.clone()]);

  let mark = services.posts.bookmark_post_by_id(&first.id).await.unwrap();
  assert!(!mark.saved);
  assert_eq!(mark.message, "Post removed from bookmarks");
  assert_eq!(services.posts.get_saved_posts(Some("")).await.unwrap().len(), 1);

  assert!(matches!(services.posts.bookmark_post_by_id("nope").await, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn change_user_settings() {
  let (_backend, services) = setup();
  services.users.create_user(&sign_up_form("alice")).await.unwrap();

  let user = services.users
    .change_user_data(&UserChange::Username { username: "alicia".into() })
    .await
    .unwrap();
  assert_eq!(user.username, "alicia");

  let res = services.users.change_user_data(&UserChange::Email {
    email: "alicia@aora.dev".into(),
    current_password: "wrong password".into(),
  }).await;
  assert!(matches!(res, Err(Error::Unauthorized(_))));

  let user = services.users.change_user_data(&UserChange::Email {
    email: "alicia@aora.dev".into(),
    current_password: "alice-password".into(),
  }).await.unwrap();
  assert_eq!(user.email, "alicia@aora.dev");

  let res: ApiResponse<User> = services.users.change_user_data(&UserChange::Password {
    password: "brand new pass".into(),
    confirm_password: "brand new pas".into(),
    current_password: "alice-password".into(),
  }).await.into();
  assert_eq!(res.message(), Some("Passwords do not match!"));

  services.users.change_user_data(&UserChange::Password {
    password: "brand new pass".into(),
    confirm_password: "brand new pass".into(),
    current_password: "alice-password".into(),
  }).await.unwrap();
  services.users.sign_out().await.unwrap();
  services.users.sign_in(&SignInForm {
    email: "alicia@aora.dev".into(),
    password: "brand new pass".into(),
  }).await.unwrap();

  let user = services.users
    .change_user_data(&UserChange::Avatar { url: "https://img.aora.dev/a.png".into() })
    .await
    .unwrap();
  assert_eq!(user.avatar, "https://img.aora.dev/a.png");
}

#[tokio::test]
async fn change_followers() {
  let (_backend, services) = setup();
  services.users.create_user(&sign_up_form("alice")).await.unwrap();
  let user = services.users.change_user_followers(2_500_000).await.unwrap();
  assert_eq!(user.followers, 2_500_000);
  assert_eq!(aora::util::format_followers(user.followers), "2.50M");
  assert!(matches!(services.users.change_user_followers(-1).await, Err(Error::Validation(_))));
}
