mod commands;
mod config;
mod fetch;
mod photo;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    MealForm, cmd_meal_add, cmd_meal_list, cmd_recipe_import, cmd_recipe_list, cmd_recipe_search,
    json_error,
};
use crate::config::Config;
use crate::fetch::PageClient;
use carol_core::journal::Journal;

#[derive(Parser)]
#[command(
    name = "carol",
    version,
    about = "Record your meals and bookmark recipes, all stored locally"
)]
struct Cli {
    /// Data directory (default: the platform data directory)
    #[arg(long, global = true, value_name = "PATH")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record and browse meals
    Meal {
        #[command(subcommand)]
        command: MealCommands,
    },
    /// Import, list and search saved recipes
    Recipe {
        #[command(subcommand)]
        command: RecipeCommands,
    },
}

impl Cli {
    /// Whether the chosen command asked for JSON output.
    fn json(&self) -> bool {
        match &self.command {
            Commands::Meal { command } => match command {
                MealCommands::Add { json, .. } | MealCommands::List { json, .. } => *json,
            },
            Commands::Recipe { command } => match command {
                RecipeCommands::Import { json, .. }
                | RecipeCommands::List { json }
                | RecipeCommands::Search { json, .. } => *json,
            },
        }
    }
}

#[derive(Subcommand)]
enum MealCommands {
    /// Record a meal
    Add {
        /// Dish name or short description
        title: String,
        /// Meal type: breakfast, lunch, dinner, snack (or 早餐, 午餐, 晚餐, 加餐)
        #[arg(short, long, default_value = "breakfast")]
        meal: String,
        /// Taste, ingredients, impressions
        #[arg(long)]
        notes: Option<String>,
        /// Comma-separated tags (e.g. "家常,低脂,快手")
        #[arg(long)]
        tags: Option<String>,
        /// Photo file to attach
        #[arg(long, value_name = "FILE")]
        photo: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List recorded meals, newest first
    List {
        /// Show at most N meals
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum RecipeCommands {
    /// Save a recipe from a web page (title and cover are fetched when possible)
    Import {
        /// Recipe page URL
        url: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List saved recipes
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search saved recipes by title or tag
    Search {
        /// Text to look for (empty lists everything)
        #[arg(default_value = "")]
        query: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .try_init()
        .ok();

    let cli = Cli::parse();
    let json = cli.json();

    if let Err(e) = run(cli).await {
        if json {
            println!("{}", json_error(&format!("{e:#}")));
        } else {
            eprintln!("Error: {e:#}");
        }
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.data_dir)?;
    let mut journal = Journal::open(&config.db_path)?;

    match cli.command {
        Commands::Meal { command } => match command {
            MealCommands::Add {
                title,
                meal,
                notes,
                tags,
                photo,
                json,
            } => cmd_meal_add(
                &mut journal,
                MealForm {
                    title: &title,
                    meal: &meal,
                    notes,
                    tags,
                    photo: photo.as_deref(),
                },
                json,
            ),
            MealCommands::List { limit, json } => cmd_meal_list(&journal, limit, json),
        },
        Commands::Recipe { command } => match command {
            RecipeCommands::Import { url, json } => {
                let client = PageClient::new()?;
                cmd_recipe_import(&mut journal, &client, &url, json).await
            }
            RecipeCommands::List { json } => cmd_recipe_list(&journal, json),
            RecipeCommands::Search { query, json } => cmd_recipe_search(&journal, &query, json),
        },
    }
}
