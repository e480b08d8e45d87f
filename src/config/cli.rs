use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "contest-provisioner")]
#[command(about = "Provision one game server per contest team behind the router")]
pub struct CliConfig {
    /// Directory holding config.toml, data.toml and the deployment template
    #[arg(long, global = true, default_value = "./data")]
    pub data_dir: PathBuf,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Clone, Subcommand)]
pub enum CliCommand {
    /// Restore routes, start the HTTP API and read console commands from stdin
    Serve,
    /// Run one contest command, e.g. `contest create t1 TeamOne alice,bob`
    Contest {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}
