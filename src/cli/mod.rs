pub mod init;
pub mod serve;
pub mod sync;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vitrine")]
#[command(version)]
#[command(about = "Portfolio content service and sync client", long_about = None)]
pub struct Cli {
    #[arg(short, long, default_value = "vitrine.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scaffold a new site directory with a config file and data layout
    Init {
        #[arg(default_value = ".")]
        path: PathBuf,
        #[arg(long)]
        name: Option<String>,
    },
    /// Run the projects API and storage server
    Serve {
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },
    /// Fetch the manifest, resolve all project metadata, and write the
    /// aggregated portfolio as JSON
    Sync {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
