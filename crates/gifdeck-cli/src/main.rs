//! gifdeck CLI - drive the gifdeck gallery forms from the terminal.
//!
//! Each subcommand opens the matching form mode on the controller, fills
//! its fields, and submits, so the command line goes through the same
//! state machine as any other gifdeck surface.

use std::path::Path;

use clap::Parser;
use gifdeck_core::auth::{AuthError, JwtAuthClient};
use gifdeck_core::config::{BackendConfig, ConfigError};
use gifdeck_core::form::{FormController, Notice, SubmitOutcome};
use gifdeck_core::gifs::{GifApiError, GifFile, HttpGifStore};
use gifdeck_core::util::normalize_text_option;
use thiserror::Error;

mod cli;
mod session;

use cli::{Cli, Commands};
use session::KeyringSessionStore;

type AppController = FormController<JwtAuthClient, HttpGifStore, KeyringSessionStore>;

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Gif(#[from] GifApiError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("The gif path has no file name: {0}")]
    InvalidFilePath(String),
    #[error("The submission was rejected; see the messages above")]
    Rejected,
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gifdeck=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let mut controller = build_controller(cli.api_url)?;

    match cli.command {
        Commands::Login { username, password } => {
            run_login(&mut controller, &username, &password).await
        }
        Commands::Signup {
            username,
            password,
            password_confirm,
        } => run_signup(&mut controller, &username, &password, &password_confirm).await,
        Commands::Upload { file, name, tags } => {
            run_upload(&mut controller, &file, name, tags).await
        }
        Commands::Update { id, name, tags } => {
            run_update(&mut controller, id, &name, tags).await
        }
        Commands::Status => run_status(&controller),
        Commands::Logout => run_logout(&mut controller),
    }
}

fn build_controller(api_url: Option<String>) -> Result<AppController, CliError> {
    let config = match api_url {
        Some(url) => BackendConfig::new(url)?,
        None => BackendConfig::from_env()?,
    };
    let credentials = JwtAuthClient::new(config.clone())?;
    let gifs = HttpGifStore::new(config)?;
    let controller = FormController::new(credentials, gifs, KeyringSessionStore::default())?;
    Ok(controller)
}

async fn run_login(
    controller: &mut AppController,
    username: &str,
    password: &str,
) -> Result<(), CliError> {
    controller.open_login();
    controller.set_name(username);
    controller.set_password(password);

    finish_submission(controller, "Logged in").await
}

async fn run_signup(
    controller: &mut AppController,
    username: &str,
    password: &str,
    password_confirm: &str,
) -> Result<(), CliError> {
    controller.open_sign_up();
    controller.set_name(username);
    controller.set_password(password);
    controller.set_password_confirm(password_confirm);

    finish_submission(controller, "Signed up and logged in").await
}

async fn run_upload(
    controller: &mut AppController,
    path: &Path,
    name: Option<String>,
    tags: Vec<String>,
) -> Result<(), CliError> {
    let bytes = std::fs::read(path)?;
    let file_name = resolve_file_name(path)?;
    let display_name = name.unwrap_or_else(|| default_gif_name(&file_name));

    controller.open_upload();
    controller.set_name(display_name);
    controller.set_file(Some(GifFile::new(file_name, bytes)));
    for tag in normalize_tags(tags) {
        controller.select_tag(tag);
    }

    finish_submission(controller, "Uploaded").await
}

async fn run_update(
    controller: &mut AppController,
    id: u64,
    name: &str,
    tags: Vec<String>,
) -> Result<(), CliError> {
    controller.open_update(id);
    controller.set_name(name);
    for tag in normalize_tags(tags) {
        controller.select_tag(tag);
    }

    finish_submission(controller, "Updated").await
}

fn run_status(controller: &AppController) -> Result<(), CliError> {
    if controller.is_authenticated() {
        println!("Logged in (session tokens stored in the keychain)");
    } else {
        println!("Not logged in");
    }
    Ok(())
}

fn run_logout(controller: &mut AppController) -> Result<(), CliError> {
    controller.sign_out()?;
    println!("Logged out");
    Ok(())
}

/// Submit the active form and print everything the controller surfaced.
async fn finish_submission(
    controller: &mut AppController,
    completed_message: &str,
) -> Result<(), CliError> {
    tracing::debug!(form = %controller.descriptor().header, "submitting form");
    let outcome = controller.submit().await?;
    print_feedback(controller);

    if outcome == SubmitOutcome::Completed {
        println!("{completed_message}");
        let gallery_tags = controller.gallery_tags();
        if !gallery_tags.is_empty() {
            println!("Gallery tags: {}", gallery_tags.join(", "));
        }
        Ok(())
    } else {
        Err(CliError::Rejected)
    }
}

fn print_feedback(controller: &mut AppController) {
    for notice in controller.drain_notices() {
        match notice {
            Notice::Info(message) => println!("{message}"),
            Notice::Error(message) => eprintln!("{message}"),
        }
    }

    let errors = controller.errors();
    let surfaces = [
        ("name", &errors.name),
        ("file", &errors.file),
        ("tags", &errors.tags),
        ("password", &errors.password),
        ("password confirmation", &errors.password_confirm),
    ];
    for (label, message) in surfaces {
        if !message.is_empty() {
            eprintln!("{label}: {message}");
        }
    }
}

fn resolve_file_name(path: &Path) -> Result<String, CliError> {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(|| CliError::InvalidFilePath(path.display().to_string()))
}

/// Default display name for an uploaded gif: the file name without its
/// `.gif` extension.
fn default_gif_name(file_name: &str) -> String {
    file_name
        .strip_suffix(".gif")
        .unwrap_or(file_name)
        .to_string()
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .filter_map(|tag| normalize_text_option(Some(tag)))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{default_gif_name, normalize_tags, resolve_file_name, CliError};

    #[test]
    fn resolve_file_name_takes_the_last_component() {
        let name = resolve_file_name(Path::new("/gifs/party.gif")).unwrap();
        assert_eq!(name, "party.gif");
    }

    #[test]
    fn resolve_file_name_rejects_paths_without_a_name() {
        assert!(matches!(
            resolve_file_name(Path::new("/")),
            Err(CliError::InvalidFilePath(_))
        ));
    }

    #[test]
    fn default_gif_name_strips_only_the_gif_extension() {
        assert_eq!(default_gif_name("party.gif"), "party");
        assert_eq!(default_gif_name("party.png"), "party.png");
        assert_eq!(default_gif_name("party"), "party");
    }

    #[test]
    fn normalize_tags_trims_and_drops_empties() {
        let tags = vec![
            " cats ".to_string(),
            String::new(),
            "   ".to_string(),
            "loop".to_string(),
        ];
        assert_eq!(normalize_tags(tags), vec!["cats", "loop"]);
    }
}
