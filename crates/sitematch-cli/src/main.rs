//! `sitematch`: drive the sitematch session machine from the command line.
//!
//! Each invocation is one application load: fixtures are seeded, any
//! persisted session is restored, the command runs, and the result is printed
//! as JSON. Sessions logged in without `--remember` live only in the
//! in-memory tier and end with the process.
//!
//! # Usage
//!
//! ```
//! sitematch login --role worker --phone 01011112222 --remember
//! sitematch whoami
//! sitematch sites --filter 아파트
//! sitematch logout
//! ```

mod app;
mod settings;

use std::path::PathBuf;

use anyhow::Context as _;
use app::App;
use clap::{Parser, Subcommand};
use sitematch_core::identity::Role;
use sitematch_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::settings::AppConfig;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "sitematch", author, version, about = "Site labor matching sessions")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "sitematch.toml")]
  config: PathBuf,

  /// Override the store path from the config.
  #[arg(long)]
  store: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Seed fixture workers, employers, and sites if the store is near empty.
  Seed,
  /// Show the landing surface: role labels, test hints, admin accounts.
  Landing,
  /// Log in with a phone number. Verification always succeeds.
  Login {
    #[arg(long, default_value = "worker")]
    role:     Role,
    #[arg(long)]
    phone:    String,
    /// Keep the session after this process exits.
    #[arg(long)]
    remember: bool,
  },
  /// Log in as an admin. Admin sessions are always kept.
  AdminLogin {
    #[arg(long)]
    username: String,
    #[arg(long, env = "SITEMATCH_ADMIN_PASSWORD", hide_env_values = true)]
    password: String,
  },
  /// Show the current session and surface.
  Whoami,
  /// Complete worker registration from a JSON payload (`-` for stdin).
  Register {
    #[arg(long)]
    file: PathBuf,
  },
  /// Complete employer registration.
  RegisterEmployer {
    #[arg(long)]
    name:    String,
    #[arg(long)]
    company: String,
  },
  /// Apply a partial profile edit from a JSON payload (`-` for stdin).
  EditProfile {
    #[arg(long)]
    file: PathBuf,
  },
  /// List approved sites.
  Sites {
    /// Fuzzy filter over name, address, and job type.
    #[arg(short, long)]
    filter: Option<String>,
  },
  /// List the logged-in employer's sites.
  MySites,
  /// Submit a new site for review.
  AddSite {
    #[arg(long)]
    name:             String,
    #[arg(long)]
    address:          String,
    #[arg(long)]
    supervisor_name:  String,
    #[arg(long)]
    supervisor_phone: String,
    #[arg(long)]
    job_type:         String,
  },
  /// Apply to an approved site as the logged-in worker.
  Apply { site_id: String },
  /// End the current session.
  Logout,
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Logs go to stderr so stdout stays valid JSON.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  let mut cfg = AppConfig::load(&cli.config)?;
  if let Some(store) = cli.store {
    cfg.store_path = store;
  }

  let store = SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;
  tracing::debug!(path = ?cfg.store_path, "opened store");

  let mut app = App::new(store, cfg.latency());
  let output = app.run(cli.command).await?;
  println!("{}", serde_json::to_string_pretty(&output)?);

  Ok(())
}
