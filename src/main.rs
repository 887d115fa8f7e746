mod backfill;
mod config;
mod export;
mod fetch;
mod pack;
mod parser;
mod wago;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use config::{BackfillConfig, ExportConfig};

#[derive(Parser)]
#[command(
    name = "datapack_tools",
    about = "Profession datapack export + cooldown backfill for cached wowhead pages"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Backfill recipe cooldownSeconds by parsing cached spell pages
    BackfillCooldowns {
        /// Repo data/ directory (contains version folders)
        #[arg(long, default_value = "data")]
        data_root: PathBuf,
        /// Game version folder under data/ (e.g. Anniversary, Era)
        #[arg(long, default_value = "Anniversary")]
        version: String,
        /// Cache root containing wowhead spell pages
        #[arg(long, default_value = ".wago-cache")]
        cache_root: PathBuf,
        /// Overwrite existing cooldownSeconds (default: only fill missing)
        #[arg(long)]
        overwrite: bool,
    },
    /// Export a profession skill page into datapack JSON
    ExportProfession {
        #[arg(long, default_value_t = config::DEFAULT_PROFESSION_ID)]
        profession_id: u32,
        #[arg(long, default_value = config::DEFAULT_PROFESSION_NAME)]
        profession_name: String,
        #[arg(long, default_value = "data/Anniversary/professions/tailoring.json")]
        out_profession_json: PathBuf,
        #[arg(long, default_value = "data/Anniversary/items.json")]
        out_items_json: PathBuf,
        #[arg(long, default_value = ".wago-cache")]
        cache_dir: PathBuf,
        #[arg(long, default_value = config::DEFAULT_USER_AGENT)]
        user_agent: String,
        #[arg(long, default_value = config::DEFAULT_SKILL_URL)]
        wowhead_skill_url: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::BackfillCooldowns {
            data_root,
            version,
            cache_root,
            overwrite,
        } => backfill::run(&BackfillConfig {
            data_root,
            version,
            cache_root,
            overwrite,
        }),
        Commands::ExportProfession {
            profession_id,
            profession_name,
            out_profession_json,
            out_items_json,
            cache_dir,
            user_agent,
            wowhead_skill_url,
        } => export::run(&ExportConfig {
            profession_id,
            profession_name,
            out_profession_json,
            out_items_json,
            cache_dir,
            user_agent,
            skill_url: wowhead_skill_url,
            wago_build: config::DEFAULT_WAGO_BUILD.to_string(),
            item_search_csv_base: config::DEFAULT_ITEM_SEARCH_CSV_BASE.to_string(),
        }),
    }
}
