//! CLI entry point for chatdesk

mod client;
mod terminal;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chatdesk_client::flows::{CrudOutcome, UploadOutcome};
use chatdesk_client::{FileUpload, SubmitOutcome, SyncOutcome};
use chatdesk_core::config::{Config, ConfigLoader, LoggingConfig};
use chatdesk_core::logging::init_logging;
use chatdesk_core::view::messages::CHAT_FAILED_TEXT;
use chatdesk_core::view::SessionDialog;
use chatdesk_core::Role;
use clap::{Parser, Subcommand};
use console::style;
use dialoguer::{Confirm, Input, Password};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use crate::client::ClientSetup;

#[derive(Parser)]
#[command(name = "chatdesk")]
#[command(about = "Terminal client for the chatdesk RAG chat service")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration directory
    #[arg(short, long, global = true)]
    config_dir: Option<PathBuf>,

    /// Active session id
    #[arg(short, long, global = true)]
    session: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List sessions
    Sessions,
    /// Show the message history of the active session
    History,
    /// Send a message to the active session
    Send {
        /// Message to send
        message: String,
    },
    /// Upload a file to the active session
    Upload {
        /// File to upload
        file: PathBuf,
        /// Add to the session's attachments without posting to the chat
        #[arg(short, long)]
        attach: bool,
    },
    /// List the attachments of the active session
    Attachments,
    /// Create a session
    New {
        /// Session name
        name: String,
    },
    /// Rename the active session
    Rename {
        /// New name
        name: String,
    },
    /// Delete the active session
    Delete {
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Log in and store the access token
    Login {
        #[arg(short, long)]
        username: Option<String>,
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Register with an invite code
    Register {
        #[arg(short, long)]
        username: Option<String>,
        #[arg(short, long)]
        password: Option<String>,
        #[arg(short, long)]
        invite_code: Option<String>,
    },
    /// Forget the stored access token
    Logout,
    /// Load the page and print it as HTML
    Render {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loader = if let Some(dir) = cli.config_dir {
        ConfigLoader::with_dir(dir)
    } else {
        ConfigLoader::new()
    };

    if let Commands::Config {
        command: ConfigCommands::Init { force },
    } = &cli.command
    {
        return run_config_init(&loader, *force);
    }

    let config = loader
        .load()
        .with_context(|| format!("Failed to load {}", loader.config_path().display()))?;
    let _log_guard = init_file_logging(&loader, &config.logging)?;

    let setup = ClientSetup::new(&loader, config)?;
    let session = cli.session;

    let result = match cli.command {
        Commands::Sessions => run_sessions(&setup, session).await,
        Commands::History => run_history(&setup, require_session(session)?).await,
        Commands::Send { message } => run_send(&setup, require_session(session)?, &message).await,
        Commands::Upload { file, attach } => {
            run_upload(&setup, require_session(session)?, &file, attach).await
        }
        Commands::Attachments => run_attachments(&setup, require_session(session)?).await,
        Commands::New { name } => run_new(&setup, name).await,
        Commands::Rename { name } => run_rename(&setup, require_session(session)?, name).await,
        Commands::Delete { yes } => run_delete(&setup, require_session(session)?, yes).await,
        Commands::Login { username, password } => run_login(&setup, username, password).await,
        Commands::Register {
            username,
            password,
            invite_code,
        } => run_register(&setup, username, password, invite_code).await,
        Commands::Logout => run_logout(&setup),
        Commands::Render { out } => run_render(&setup, session, out).await,
        Commands::Config {
            command: ConfigCommands::Show,
        } => run_config_show(&loader, &setup.config),
        Commands::Config { .. } => Ok(()),
    };

    if result.is_err() {
        if let Some(location) = setup.surface.last_redirect() {
            if location == setup.config.server.login_path {
                eprintln!(
                    "{} run {} to sign in",
                    style("Not signed in:").yellow(),
                    style("chatdesk login").cyan()
                );
            }
        }
    }
    result
}

/// Log files live under the config directory unless an absolute path is set
fn init_file_logging(loader: &ConfigLoader, logging: &LoggingConfig) -> Result<WorkerGuard> {
    let mut logging = logging.clone();
    let dir = Path::new(&logging.dir);
    if dir.is_relative() {
        logging.dir = loader.config_dir().join(dir).to_string_lossy().into_owned();
    }

    let guard = init_logging(&logging)?;
    info!("Logging to {}", logging.dir);
    Ok(guard)
}

fn require_session(session: Option<String>) -> Result<String> {
    match session {
        Some(id) if !id.trim().is_empty() => Ok(id),
        _ => bail!("No session selected, pass --session <ID>"),
    }
}

fn check_sync(outcome: SyncOutcome, what: &str) -> Result<usize> {
    match outcome {
        SyncOutcome::Loaded(count) => Ok(count),
        SyncOutcome::Failed(error) => bail!("{}: {}", what, error),
    }
}

async fn run_sessions(setup: &ClientSetup, session: Option<String>) -> Result<()> {
    let page = setup.page(session)?;
    check_sync(page.load_sessions().await, "加载会话失败")?;

    let view = page.view();
    let view = view.lock();
    if view.sessions.is_empty() {
        println!("{}", style("No sessions yet").dim());
        return Ok(());
    }
    for entry in view.sessions.entries() {
        if entry.active {
            println!(
                "{} {}  {}",
                style("*").green(),
                style(&entry.label).green().bold(),
                style(&entry.id).dim()
            );
        } else {
            println!("  {}  {}", entry.label, style(&entry.id).dim());
        }
    }
    Ok(())
}

async fn run_history(setup: &ClientSetup, session: String) -> Result<()> {
    let api = setup.api()?;
    let messages = api
        .list_messages(&session)
        .await
        .context("加载历史消息失败")?;

    for message in messages {
        let label = match message.role {
            Role::User => style("you").cyan().bold(),
            Role::Assistant => style("assistant").magenta().bold(),
        };
        println!("{}\n{}\n", label, message.content);
    }
    Ok(())
}

async fn run_send(setup: &ClientSetup, session: String, message: &str) -> Result<()> {
    let page = setup.page(Some(session))?;
    match page.submit_text(message).await {
        SubmitOutcome::Resolved { answer, .. } => {
            println!("{}", answer);
            Ok(())
        }
        SubmitOutcome::Failed { error, .. } => bail!("{} ({})", CHAT_FAILED_TEXT, error),
        SubmitOutcome::Rejected => bail!("Message is empty"),
        SubmitOutcome::Abandoned { id } => bail!("Reply for {} arrived after the view was reset", id),
    }
}

async fn run_upload(setup: &ClientSetup, session: String, file: &Path, attach: bool) -> Result<()> {
    let upload = FileUpload::from_path(file).await?;
    let page = setup.page(Some(session.clone()))?;

    let outcome = if attach {
        page.open_dialog(SessionDialog::Attachments {
            session_id: Some(session),
            name: String::new(),
        });
        page.upload_to_dialog_session(upload).await
    } else {
        page.upload(upload).await
    };

    match outcome {
        Some(UploadOutcome::Uploaded { attachment, .. }) => {
            if let Some(item) = attachment {
                println!("{}  {}", item.filename, style(&item.filepath).dim());
            }
            Ok(())
        }
        Some(UploadOutcome::Failed(error)) => bail!("上传文件失败: {}", error),
        None => bail!("No session selected"),
    }
}

async fn run_attachments(setup: &ClientSetup, session: String) -> Result<()> {
    let page = setup.page(Some(session.clone()))?;
    check_sync(page.load_attachments(&session).await, "加载引用资料失败")?;

    let view = page.view();
    let view = view.lock();
    if view.attachments.items().is_empty() {
        println!("{}", style("No attachments").dim());
    }
    for item in view.attachments.items() {
        println!("{}  {}", item.filename, style(&item.filepath).dim());
    }
    Ok(())
}

async fn run_new(setup: &ClientSetup, name: String) -> Result<()> {
    let page = setup.page(None)?;
    page.open_new_session();
    page.set_dialog_name(name);
    finish_crud(page.confirm_dialog().await)
}

async fn run_rename(setup: &ClientSetup, session: String, name: String) -> Result<()> {
    let page = setup.page(Some(session.clone()))?;
    page.open_dialog(SessionDialog::Rename {
        session_id: Some(session),
        name,
    });
    finish_crud(page.confirm_dialog().await)
}

async fn run_delete(setup: &ClientSetup, session: String, yes: bool) -> Result<()> {
    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete session {}?", session))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Delete cancelled.");
            return Ok(());
        }
    }

    let page = setup.page(Some(session.clone()))?;
    page.open_dialog(SessionDialog::Delete {
        session_id: Some(session),
        name: String::new(),
    });
    finish_crud(page.confirm_dialog().await)
}

fn finish_crud(outcome: Option<CrudOutcome>) -> Result<()> {
    match outcome {
        Some(CrudOutcome::Navigated(href)) => {
            println!("{} {}", style("Created").green(), href);
            Ok(())
        }
        Some(CrudOutcome::Reloaded) => {
            println!("{}", style("Done").green());
            Ok(())
        }
        Some(CrudOutcome::Failed(text)) => bail!(text),
        Some(CrudOutcome::Invalid(e)) => bail!(e.to_string()),
        None => bail!("No dialog open"),
    }
}

async fn run_login(
    setup: &ClientSetup,
    username: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let username = match username {
        Some(name) => name,
        None => Input::new().with_prompt("Username").interact_text()?,
    };
    let password = match password {
        Some(password) => password,
        None => Password::new().with_prompt("Password").interact()?,
    };

    setup.account()?.login(&username, &password).await?;
    println!(
        "{} token stored in {}",
        style("Signed in.").green().bold(),
        setup.token_path().display()
    );
    Ok(())
}

async fn run_register(
    setup: &ClientSetup,
    username: Option<String>,
    password: Option<String>,
    invite_code: Option<String>,
) -> Result<()> {
    let username = match username {
        Some(name) => name,
        None => Input::new().with_prompt("Username").interact_text()?,
    };
    let password = match password {
        Some(password) => password,
        None => Password::new()
            .with_prompt("Password")
            .with_confirmation("Repeat password", "Passwords do not match")
            .interact()?,
    };
    let invite_code = match invite_code {
        Some(code) => code,
        None => Input::new().with_prompt("Invite code").interact_text()?,
    };

    setup
        .account()?
        .register(&username, &password, &invite_code)
        .await?;
    println!("{}", style("Registered and signed in.").green().bold());
    Ok(())
}

fn run_logout(setup: &ClientSetup) -> Result<()> {
    setup.account()?.logout()?;
    println!("Signed out.");
    Ok(())
}

async fn run_render(setup: &ClientSetup, session: Option<String>, out: Option<PathBuf>) -> Result<()> {
    let page = setup.page(session)?;
    let load = page.load().await;
    if let SyncOutcome::Failed(error) = &load.sessions {
        warn!("Rendering without session list: {}", error);
    }

    let html = page.render();
    match out {
        Some(path) => {
            std::fs::write(&path, &html)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => println!("{}", html),
    }
    Ok(())
}

fn run_config_show(loader: &ConfigLoader, config: &Config) -> Result<()> {
    let mut shown = config.clone();
    if !shown.auth.token.is_empty() {
        shown.auth.token = "********".to_string();
    }

    println!("{}", style("chatdesk configuration").bold().cyan());
    println!("Config file: {}\n", loader.config_path().display());
    println!("{}", serde_json::to_string_pretty(&shown)?);
    Ok(())
}

fn run_config_init(loader: &ConfigLoader, force: bool) -> Result<()> {
    let config_path = loader.config_path();
    if config_path.exists() && !force {
        let overwrite = Confirm::new()
            .with_prompt("Configuration already exists. Overwrite?")
            .default(false)
            .interact()?;
        if !overwrite {
            println!("Init cancelled.");
            return Ok(());
        }
    }

    loader.save(&Config::default())?;
    println!(
        "{} {}",
        style("Configuration saved:").green().bold(),
        config_path.display()
    );
    Ok(())
}
