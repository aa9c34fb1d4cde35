use dotenv::dotenv;

use clap::{Parser, Subcommand};

use aora::{app::*, error::*, models::FileKind};

#[derive(Parser, Debug)]
#[command(name = "aora", version, about = "Short video sharing client")]
struct Cli {
  /// Config file, replaces conf/{RUN_MODE} and environment overrides
  #[arg(short, long, env = "AORA_CONFIG")]
  config: Option<String>,

  /// Use the in-memory backend instead of the configured one
  #[arg(long)]
  memory: bool,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Interactive client (default)
  Shell,
  /// Format a follower count
  Followers { count: u64 },
  /// Check an email address
  CheckEmail { email: String },
  /// Preview url for a stored file
  Preview {
    file_id: String,
    #[arg(long, default_value = "image")]
    kind: FileKind,
  },
  /// Stored file id from a preview url
  FileId { url: String },
}

fn print_json<T: serde::Serialize>(val: &T) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(val)?);
  Ok(())
}

fn main() -> Result<()> {
  dotenv().ok();
  env_logger::init();

  let cli = Cli::parse();

  let mut config = AppConfig::new(cli.config.as_deref())?;
  if cli.memory {
    config = config.with_override("backend.kind", "memory")?;
  }

  match cli.command.unwrap_or(Command::Shell) {
    Command::Shell => shell::execute(config)?,
    Command::Followers { count } => print_json(&tools::followers(count))?,
    Command::CheckEmail { email } => print_json(&tools::check_email(&email))?,
    Command::Preview { file_id, kind } => {
      let res: aora::forms::ApiResponse<String> = tools::preview(&config, &file_id, kind).into();
      print_json(&res)?
    },
    Command::FileId { url } => print_json(&tools::file_id(&url))?,
  }
  log::info!("Main finished");
  Ok(())
}
