//! SpdIU CLI - Manage Shattered Pixel Dungeon save slots from the command line

use clap::{Parser, Subcommand};
use spdiu::cheats::{BonesTask, ConsumablesTask, EnergyTask, GoldTask};
use spdiu::tasks::{
    BackupTask, CleanTask, DumpTask, ListTask, LoadTask, SaveTask, ShowTask, Task, WatchTask,
};
use spdiu::{Config, Formatters};
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "spdiu")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ./spdiu.yaml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output formatter (shell, text, json)
    #[arg(short, long, global = true, default_value = "shell")]
    formatter: String,

    /// Log what is going on under the hood
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Back up the active data into backup.<backup_slot>
    Backup,

    /// Delete every saved state, keeping a backup of the active data
    Clean,

    /// Save the active data into a manual slot
    Save {
        /// Slot name, alphanumeric only
        #[arg(short, long)]
        slot: Option<String>,
    },

    /// Load a slot into the active data
    Load {
        /// Load the newest manual or auto save
        #[arg(short, long)]
        last: bool,

        /// Slot to load, e.g. tengu, auto.floor3 or backup.bak
        #[arg(short, long, conflicts_with = "last")]
        slot: Option<String>,

        /// Only load this game, keeping the rest of the active profile
        #[arg(short, long)]
        game: Option<String>,
    },

    /// List saved states chronologically
    Ls,

    /// Show details for a save slot
    Show {
        /// Slot to show, defaults to the default slot
        #[arg(short, long)]
        slot: Option<String>,

        /// Show the active data instead
        #[arg(short, long, conflicts_with = "slot")]
        active: bool,
    },

    /// Print a dat file as JSON
    Dump {
        /// Slot to read, defaults to the active data
        #[arg(short, long)]
        slot: Option<String>,

        /// Read from a game; without a name, the latest played one
        #[arg(short, long, num_args = 0..=1, default_missing_value = "")]
        game: Option<String>,

        /// Dat file name, defaults to rankings.dat or game.dat
        #[arg(short = 'F', long)]
        file: Option<String>,

        /// Dot separated path inside the file, e.g. hero.belongings.0
        #[arg(short, long)]
        entity: Option<String>,

        /// How many levels to walk, everything when unset
        #[arg(short, long)]
        levels: Option<usize>,
    },

    /// Run the game, autosaving on floor changes
    Watch,

    /// Edit the active game data. Make a save first!
    Cheats {
        #[command(subcommand)]
        cheat: Cheats,
    },
}

#[derive(Subcommand)]
enum Cheats {
    /// Set your gold
    Gold {
        /// Game to edit, defaults to the latest played
        #[arg(short, long)]
        game: Option<String>,

        #[arg(short, long, default_value_t = 10000)]
        number: i64,
    },

    /// Set your alchemical energy
    Energy {
        /// Game to edit, defaults to the latest played
        #[arg(short, long)]
        game: Option<String>,

        #[arg(short, long, default_value_t = 1000)]
        number: i64,
    },

    /// Set the bones a new run will find
    Bones {
        /// plate, blade, wealth, reroll, regrowth or zip. Food otherwise.
        #[arg(short, long)]
        package: Option<String>,

        /// Hero class, e.g. warrior or cleric
        #[arg(long)]
        hero: Option<String>,

        /// Only display the current bones
        #[arg(short, long)]
        display: bool,
    },

    /// List potion, ring and scroll identities
    Consumables {
        /// Game to read, defaults to the latest played
        #[arg(short, long)]
        game: Option<String>,
    },
}

impl Commands {
    fn into_task(self) -> Box<dyn Task> {
        match self {
            Commands::Backup => Box::new(BackupTask),
            Commands::Clean => Box::new(CleanTask),
            Commands::Save { slot } => Box::new(SaveTask { slot }),
            Commands::Load { last, slot, game } => Box::new(LoadTask { last, slot, game }),
            Commands::Ls => Box::new(ListTask),
            Commands::Show { slot, active } => Box::new(ShowTask { slot, active }),
            Commands::Dump {
                slot,
                game,
                file,
                entity,
                levels,
            } => Box::new(DumpTask {
                slot,
                game,
                file,
                entity,
                levels,
            }),
            Commands::Watch => Box::new(WatchTask),
            Commands::Cheats { cheat } => match cheat {
                Cheats::Gold { game, number } => Box::new(GoldTask { game, number }),
                Cheats::Energy { game, number } => Box::new(EnergyTask { game, number }),
                Cheats::Bones {
                    package,
                    hero,
                    display,
                } => Box::new(BonesTask {
                    package,
                    hero,
                    display,
                }),
                Cheats::Consumables { game } => Box::new(ConsumablesTask { game }),
            },
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp_secs()
        .init();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> spdiu::Result<bool> {
    let config = Config::load(cli.config.as_deref())?;
    let formatter = Formatters::by_name(&cli.formatter);

    let task = cli.command.into_task();
    log::debug!("running {}", task.operation());
    let result = task.run(&config)?;

    let mut stdout = io::stdout();
    formatter.write_to(&result, &mut stdout)?;
    stdout.flush()?;

    Ok(result.success)
}
