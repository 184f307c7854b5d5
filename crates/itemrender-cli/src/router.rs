// Command routing and dispatch

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use itemrender_config::{ConfigContext, ManagerOptions, View};

use crate::commands;
use crate::error::CliResult;
use crate::output::OutputStyle;

/// ItemRender - per-item render configuration
#[derive(Parser, Debug)]
#[command(name = "itemrender")]
#[command(bin_name = "itemrender")]
#[command(about = "Inspect and edit per-item render configuration")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration root (overrides ITEMRENDER_HOME)
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimize output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    #[command(about = "Show the record for an item")]
    Get {
        #[arg(value_name = "ID")]
        id: String,
    },

    #[command(about = "List items that have a record file")]
    List,

    #[command(about = "List enabled items")]
    Enabled,

    #[command(about = "Enable custom rendering for an item")]
    Enable {
        #[arg(value_name = "ID")]
        id: String,
    },

    #[command(about = "Disable custom rendering for an item")]
    Disable {
        #[arg(value_name = "ID")]
        id: String,
    },

    #[command(about = "Change the transform of one view")]
    Set(SetArgs),

    #[command(about = "Choose what an item is drawn as")]
    Target {
        #[arg(value_name = "ID")]
        id: String,

        #[arg(value_enum)]
        kind: TargetKind,

        /// Block id or entity type
        #[arg(value_name = "REF")]
        reference: Option<String>,
    },

    #[command(about = "Delete the record file for an item")]
    Delete {
        #[arg(value_name = "ID")]
        id: String,
    },

    #[command(about = "Reload everything from disk")]
    Reload,

    #[command(about = "Show cache statistics")]
    Stats,

    #[command(about = "Check the directory is writable and every record validates")]
    Check,

    #[command(about = "Reload whenever files change (press Enter to stop)")]
    Watch,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SetArgs {
    #[arg(value_name = "ID")]
    pub id: String,

    #[arg(long, value_enum, default_value_t = ViewArg::First)]
    pub view: ViewArg,

    #[arg(long, allow_negative_numbers = true)]
    pub scale: Option<f32>,

    #[arg(long = "rot-x", allow_negative_numbers = true)]
    pub rot_x: Option<f32>,

    #[arg(long = "rot-y", allow_negative_numbers = true)]
    pub rot_y: Option<f32>,

    #[arg(long = "rot-z", allow_negative_numbers = true)]
    pub rot_z: Option<f32>,

    #[arg(long, allow_negative_numbers = true)]
    pub tx: Option<f32>,

    #[arg(long, allow_negative_numbers = true)]
    pub ty: Option<f32>,

    #[arg(long, allow_negative_numbers = true)]
    pub tz: Option<f32>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewArg {
    #[default]
    First,
    Third,
}

impl From<ViewArg> for View {
    fn from(view: ViewArg) -> Self {
        match view {
            ViewArg::First => View::FirstPerson,
            ViewArg::Third => View::ThirdPerson,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Block,
    Entity,
    /// Keep stock rendering
    #[value(name = "none")]
    Neither,
}

/// Command router
pub struct CommandRouter;

impl CommandRouter {
    /// Parse arguments, set up logging and run the command
    pub fn route() -> CliResult<()> {
        let cli = Cli::parse();
        crate::logging::init_logging(cli.verbose, cli.quiet);
        Self::execute(&cli)
    }

    pub fn execute(cli: &Cli) -> CliResult<()> {
        let options = match &cli.root {
            Some(root) => ManagerOptions::new(root),
            None => ManagerOptions::from_env()?,
        }
        .preload_enabled_records(matches!(cli.command, Commands::Watch));

        let context = ConfigContext::new(options);
        let manager = context.manager();
        let style = OutputStyle::default();

        let output = match &cli.command {
            Commands::Get { id } => commands::get(&manager, id)?,
            Commands::List => commands::list(&manager, &style),
            Commands::Enabled => commands::enabled(&manager, &style),
            Commands::Enable { id } => commands::set_enabled(&manager, &style, id, true)?,
            Commands::Disable { id } => commands::set_enabled(&manager, &style, id, false)?,
            Commands::Set(args) => commands::set(&manager, &style, args)?,
            Commands::Target {
                id,
                kind,
                reference,
            } => commands::target(&manager, &style, id, *kind, reference.as_deref())?,
            Commands::Delete { id } => commands::delete(&manager, &style, id)?,
            Commands::Reload => commands::reload(&manager, &style)?,
            Commands::Stats => commands::stats(&manager),
            Commands::Check => commands::check(&manager, &style)?,
            Commands::Watch => commands::watch(manager.clone(), &style)?,
        };

        if !output.is_empty() && !cli.quiet {
            println!("{}", output);
        }
        Ok(())
    }
}
