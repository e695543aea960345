use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use crate::{
    commands::{
        ClearCommand, CompletionsCommand, CurrentCommand, ExportCommand, ListCommand,
        RefreshCommand, StatusCommand, UseCommand,
    },
    config::ConfigStore,
};

#[derive(Debug, Clone, Parser)]
#[command(name = "awsctx", version, about = "Switch the active AWS session between profiles", long_about = None)]
pub struct Cli {
    #[arg(short = 'v', long, global = true, action = ArgAction::Count, help = "Increase verbosity (-v info, -vv debug, -vvv trace)")]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    #[command(about = "Resolve a profile and make it the active [default] session")]
    Use(UseCommand),
    #[command(about = "Resolve a profile and print shell export statements")]
    Export(ExportCommand),
    #[command(about = "Show which profile the active session came from")]
    Current(CurrentCommand),
    #[command(about = "Check whether a profile's credentials are fresh")]
    Status(StatusCommand),
    #[command(about = "Refresh a profile's SSO session")]
    Refresh(RefreshCommand),
    #[command(about = "Remove the active session")]
    Clear(ClearCommand),
    #[command(about = "List configured profiles")]
    List(ListCommand),
    #[command(about = "Generate shell completion scripts for awsctx")]
    Completions(CompletionsCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let command = self
            .command
            .unwrap_or(Commands::Current(CurrentCommand {}));

        if let Commands::Completions(cmd) = command {
            cmd.execute();
            return Ok(());
        }

        let store = ConfigStore::from_env()?;
        match command {
            Commands::Use(cmd) => cmd.execute(&store).await,
            Commands::Export(cmd) => cmd.execute(&store).await,
            Commands::Current(cmd) => {
                cmd.execute(&store);
                Ok(())
            }
            Commands::Status(cmd) => cmd.execute(&store).await,
            Commands::Refresh(cmd) => cmd.execute(&store),
            Commands::Clear(cmd) => cmd.execute(&store),
            Commands::List(cmd) => cmd.execute(&store),
            Commands::Completions(_) => Ok(()),
        }
    }
}
