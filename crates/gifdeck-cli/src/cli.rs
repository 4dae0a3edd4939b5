use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "gifdeck")]
#[command(about = "Upload and manage gifs in a gifdeck gallery")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Backend base URL (defaults to GIFDECK_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and store session tokens in the keychain
    Login {
        /// Account username
        #[arg(long, value_name = "NAME")]
        username: String,
        /// Account password
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Create an account and log in
    Signup {
        /// Account username
        #[arg(long, value_name = "NAME")]
        username: String,
        /// Account password
        #[arg(long, value_name = "PASSWORD")]
        password: String,
        /// Repeat of the password
        #[arg(long, value_name = "PASSWORD")]
        password_confirm: String,
    },
    /// Upload a gif
    Upload {
        /// Path to the gif file
        file: PathBuf,
        /// Display name (defaults to the file name)
        #[arg(long, value_name = "NAME")]
        name: Option<String>,
        /// Tag to attach (repeatable)
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,
    },
    /// Update a gif's name and tags
    Update {
        /// Gif id
        id: u64,
        /// New display name
        #[arg(long, value_name = "NAME")]
        name: String,
        /// Tag to attach (repeatable)
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,
    },
    /// Show whether a session is stored
    Status,
    /// Clear the stored session
    Logout,
}
