use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use taskboard::config::TaskboardConfig;
use taskboard::logging::init_tracing;

mod cmd;

#[derive(Parser)]
#[command(name = "taskboard")]
#[command(version, about = "Project task board with an AI assistant")]
pub struct Cli {
    /// Directory holding taskboard.toml and .env (defaults to the current directory)
    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the REST API server
    Serve {
        /// Port to serve on (overrides PORT and taskboard.toml)
        #[arg(short, long)]
        port: Option<u16>,

        /// Database path (overrides DATABASE_PATH and taskboard.toml)
        #[arg(long)]
        db_path: Option<PathBuf>,

        /// Enable dev mode (permissive CORS, bind on all interfaces)
        #[arg(long)]
        dev: bool,
    },
    /// Create the database and its tables without starting the server
    Init {
        /// Database path (overrides DATABASE_PATH and taskboard.toml)
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
    /// View or initialize configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Work with the board through the REST API, falling back to local state
    Board {
        /// Backend base URL (overrides TASKBOARD_API_URL and taskboard.toml)
        #[arg(long)]
        api_url: Option<String>,

        /// Never contact the backend
        #[arg(long)]
        offline: bool,

        #[command(subcommand)]
        command: BoardCommands,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show the effective configuration (file + environment)
    Show,
    /// Write a default taskboard.toml
    Init,
}

#[derive(Subcommand, Clone)]
pub enum BoardCommands {
    /// List projects, newest first
    Projects,
    /// Show a project's board
    Show { project: String },
    /// Create a project
    AddProject { name: String, description: String },
    /// Change a project's name and description
    EditProject {
        project: String,
        name: String,
        description: String,
    },
    /// Delete a project and all of its tasks
    DeleteProject { project: String },
    /// Add a task to the "To Do" column
    AddTask {
        project: String,
        title: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Change a task's title, and its description when given
    EditTask {
        project: String,
        task: String,
        title: String,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Move a task to a column (todo, in-progress, done)
    Move {
        project: String,
        task: String,
        #[arg(value_parser = cmd::board::parse_status)]
        status: taskboard_common::TaskStatus,
        /// Position in the destination column (defaults to the top)
        #[arg(long, default_value = "0")]
        position: usize,
    },
    /// Delete a task
    DeleteTask { project: String, task: String },
    /// AI summary of a project
    Summary { project: String },
    /// Ask the AI assistant about a task
    Ask {
        project: String,
        task: String,
        question: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };
    let config = TaskboardConfig::resolve(&project_dir)?;
    init_tracing(config.log.format);

    match cli.command {
        Commands::Serve { port, db_path, dev } => {
            cmd::cmd_serve(config, port, db_path, dev).await?;
        }
        Commands::Init { db_path } => cmd::cmd_init(&config, db_path)?,
        Commands::Config { command } => cmd::cmd_config(&project_dir, &config, command)?,
        Commands::Board {
            api_url,
            offline,
            command,
        } => {
            let mut settings = config.client;
            if let Some(url) = api_url {
                settings.api_url = url;
            }
            settings.offline |= offline;
            cmd::cmd_board(&settings, command).await?;
        }
    }

    Ok(())
}
