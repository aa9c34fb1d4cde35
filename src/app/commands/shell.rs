use log::*;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use serde::Serialize;
use serde_json::Value as JsonValue;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::{
  error::*,
  app::*,
  forms::*,
  models::*,
  services::{config_services, Services},
  state::{Session, UseFetch},
};

#[derive(Parser, Debug)]
#[command(name = "aora", no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
  #[command(subcommand)]
  command: ShellCommand,
}

#[derive(Subcommand, Debug, PartialEq)]
enum ShellCommand {
  /// Create an account and sign in
  SignUp { username: String, email: String, password: String },
  SignIn { email: String, password: String },
  SignOut,
  /// Show the signed in user
  Whoami,
  /// Public posts, newest first
  Home,
  /// Latest public posts
  Latest,
  Search { query: Vec<String> },
  /// Posts of the signed in user
  Mine,
  /// Bookmarked posts, optionally filtered by title
  Saved { query: Vec<String> },
  Post { id: String },
  Create {
    #[arg(long)]
    title: String,
    #[arg(long)]
    prompt: String,
    #[arg(long)]
    video: PathBuf,
    #[arg(long)]
    thumbnail: PathBuf,
  },
  Edit {
    id: String,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    prompt: Option<String>,
    /// Local image replacing the thumbnail
    #[arg(long)]
    thumbnail: Option<PathBuf>,
    #[arg(long)]
    public: Option<bool>,
  },
  Delete { id: String },
  /// Toggle a bookmark
  Bookmark { id: String },
  SetUsername { username: String },
  SetEmail { email: String, current_password: String },
  SetPassword { password: String, confirm_password: String, current_password: String },
  SetAvatar { url: String },
  SetFollowers {
    #[arg(allow_negative_numbers = true)]
    count: i64,
  },
  /// Reload the session from the backend
  Refresh,
  Quit,
}

/// Split a command line into words following POSIX shell quoting.
pub fn split_words(line: &str) -> Result<Vec<String>> {
  shell_words::split(line).map_err(|e| Error::validation(format!("Invalid command line: {}", e)))
}

fn respond<T: Serialize>(res: Result<T>) -> ApiResponse<JsonValue> {
  match res {
    Ok(data) => match serde_json::to_value(data) {
      Ok(data) => ApiResponse::success(data),
      Err(err) => ApiResponse::from(Err(err.into())),
    },
    Err(err) => ApiResponse::failure(err.message()),
  }
}

fn respond_fetch<T: Serialize + Clone + Default + 'static>(fetch: &UseFetch<T>) -> ApiResponse<JsonValue> {
  match fetch.result() {
    Ok(data) => respond(Ok(data)),
    Err(err) => ApiResponse::failure(err.message()),
  }
}

/// Interactive client: one session, commands read line by line.
pub struct Shell {
  services: Services,
  session: Session,
  feed: UseFetch<Vec<Post>>,
  latest: UseFetch<Vec<Post>>,
}

impl Shell {
  pub async fn start(services: Services) -> Self {
    let session = Session::init(services.users.clone()).await;
    let posts = services.posts.clone();
    let feed = UseFetch::mount(move || {
      let posts = posts.clone();
      async move { posts.get_all_posts().await }
    }).await;
    let posts = services.posts.clone();
    let latest = UseFetch::mount(move || {
      let posts = posts.clone();
      async move { posts.get_latest_posts().await }
    }).await;
    Self {
      services,
      session,
      feed,
      latest,
    }
  }

  pub fn session(&self) -> &Session {
    &self.session
  }

  /// Run one command line. `None` means the shell should stop.
  pub async fn run_line(&self, line: &str) -> Option<String> {
    let words = match split_words(line) {
      Ok(words) if words.is_empty() => return Some(String::new()),
      Ok(words) => words,
      Err(err) => return Some(render(&ApiResponse::<JsonValue>::failure(err.message()))),
    };
    let cmd = match ShellLine::try_parse_from(words) {
      Ok(line) => line.command,
      // help and usage errors
      Err(err) => return Some(err.to_string()),
    };
    if cmd == ShellCommand::Quit {
      return None;
    }
    debug!("shell: {:?}", cmd);
    Some(render(&self.dispatch(cmd).await))
  }

  async fn dispatch(&self, cmd: ShellCommand) -> ApiResponse<JsonValue> {
    let posts = &self.services.posts;
    let users = &self.services.users;
    match cmd {
      ShellCommand::SignUp { username, email, password } => {
        respond(self.session.sign_up(&SignUpForm { username, email, password }).await)
      },
      ShellCommand::SignIn { email, password } => {
        respond(self.session.sign_in(&SignInForm { email, password }).await)
      },
      ShellCommand::SignOut => respond(self.session.sign_out().await),
      ShellCommand::Whoami => respond(self.session.require_user()),
      ShellCommand::Home => {
        self.feed.refetch().await;
        respond_fetch(&self.feed)
      },
      ShellCommand::Latest => {
        self.latest.refetch().await;
        respond_fetch(&self.latest)
      },
      ShellCommand::Search { query } => respond(posts.search_posts(&query.join(" ")).await),
      ShellCommand::Mine => {
        let res = match self.session.require_user() {
          Ok(user) => posts.get_user_posts(&user.id).await,
          Err(err) => Err(err),
        };
        respond(res)
      },
      ShellCommand::Saved { query } => {
        let query = query.join(" ");
        respond(posts.get_saved_posts(Some(query.as_str())).await)
      },
      ShellCommand::Post { id } => respond(posts.get_post_by_id(&id).await),
      ShellCommand::Create { title, prompt, video, thumbnail } => {
        let form = CreatePostForm {
          title,
          prompt,
          video: MediaSource::local(video),
          thumbnail: MediaSource::local(thumbnail),
        };
        let res = posts.create_post(&form).await;
        if res.is_ok() {
          self.feed.refetch().await;
        }
        respond(res)
      },
      ShellCommand::Edit { id, title, prompt, thumbnail, public } => {
        respond(self.edit(&id, title, prompt, thumbnail, public).await)
      },
      ShellCommand::Delete { id } => {
        let res = posts.delete_post_by_id(&id).await;
        if res.is_ok() {
          self.feed.refetch().await;
        }
        respond(res.map(|_| "Post deleted successfully"))
      },
      ShellCommand::Bookmark { id } => {
        let res = posts.bookmark_post_by_id(&id).await;
        self.session.refetch().await;
        respond(res)
      },
      ShellCommand::SetUsername { username } => {
        self.change(UserChange::Username { username }).await
      },
      ShellCommand::SetEmail { email, current_password } => {
        self.change(UserChange::Email { email, current_password }).await
      },
      ShellCommand::SetPassword { password, confirm_password, current_password } => {
        self.change(UserChange::Password { password, confirm_password, current_password }).await
      },
      ShellCommand::SetAvatar { url } => self.change(UserChange::Avatar { url }).await,
      ShellCommand::SetFollowers { count } => {
        let res = users.change_user_followers(count).await;
        if let Ok(ref user) = res {
          self.session.set_user(Some(user.clone()));
        }
        respond(res.map(|user| crate::util::format_followers(user.followers)))
      },
      ShellCommand::Refresh => {
        self.session.refetch().await;
        respond(self.session.require_user())
      },
      ShellCommand::Quit => ApiResponse::success(JsonValue::Null),
    }
  }

  async fn edit(&self, id: &str, title: Option<String>, prompt: Option<String>,
    thumbnail: Option<PathBuf>, public: Option<bool>) -> Result<Post>
  {
    let post = self.services.posts.get_post_by_id(id).await?;
    let mut form = EditPostForm::from_post(&post);
    if let Some(title) = title {
      form.title = title;
    }
    if let Some(prompt) = prompt {
      form.prompt = prompt;
    }
    if let Some(thumbnail) = thumbnail {
      form.thumbnail = MediaSource::local(thumbnail);
    }
    if let Some(public) = public {
      form.is_public = public;
    }
    let post = self.services.posts.edit_post(&form).await?;
    self.feed.refetch().await;
    Ok(post)
  }

  async fn change(&self, change: UserChange) -> ApiResponse<JsonValue> {
    let res = self.services.users.change_user_data(&change).await;
    if let Ok(ref user) = res {
      self.session.set_user(Some(user.clone()));
    }
    respond(res.map(|_| format!("{} changed!", change.field())))
  }
}

fn render(res: &ApiResponse<JsonValue>) -> String {
  serde_json::to_string_pretty(res).unwrap_or_else(|err| {
    error!("failed to render response: {}", err);
    r#"{"isSuccess":false,"message":"Internal server error"}"#.to_string()
  })
}

async fn run(config: AppConfig) -> Result<()> {
  let services = config_services(&config)?;
  let shell = Shell::start(services).await;
  match shell.session().user() {
    Some(user) => info!("Signed in as {}", user.username),
    None => info!("Not signed in"),
  }

  let mut stdout = tokio::io::stdout();
  let mut lines = BufReader::new(tokio::io::stdin()).lines();
  loop {
    stdout.write_all(b"aora> ").await?;
    stdout.flush().await?;
    let line = match lines.next_line().await? {
      Some(line) => line,
      None => break,
    };
    match shell.run_line(&line).await {
      Some(out) if out.is_empty() => (),
      Some(out) => {
        stdout.write_all(out.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
      },
      None => break,
    }
  }
  info!("Shell finished");
  Ok(())
}

pub fn execute(config: AppConfig) -> Result<()> {
  let rt = tokio::runtime::Builder::new_current_thread()
    .enable_all()
    .build()?;
  rt.block_on(run(config))
}
