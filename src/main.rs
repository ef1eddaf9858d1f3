use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use playlist_scheduler::display::{print_playlist_result, write_results_json, write_results_to_file};
use playlist_scheduler::{load_catalog, GeneratorConfig, PlaylistGenerator};

#[derive(Parser)]
#[command(name = "playlist-scheduler")]
#[command(about = "Builds daily in-store music and advert playlists", long_about = None)]
struct Cli {
    /// Catalog fixture (JSON)
    #[arg(short, long, default_value = "demos/catalog.json")]
    catalog: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate playlists for one object
    Generate {
        /// Object id
        #[arg(short, long)]
        object: i64,
        /// First date (YYYY-MM-DD)
        #[arg(short, long)]
        date: NaiveDate,
        /// Number of consecutive days
        #[arg(long, default_value_t = 1)]
        days: u32,
        /// Configuration file path
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write the results to this file (.json for JSON, text otherwise)
        #[arg(short = 'O', long)]
        output: Option<PathBuf>,
        /// Print the generator log
        #[arg(short, long)]
        verbose: bool,
    },
    /// List the objects in the catalog
    Objects,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "playlist_scheduler=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let catalog = load_catalog(&cli.catalog)
        .with_context(|| format!("loading catalog {}", cli.catalog.display()))?;

    match cli.command {
        Commands::Objects => {
            println!("Objects in {}:", cli.catalog.display());
            for object in &catalog.data().objects {
                println!(
                    "  {:>4} {} ({} - {})",
                    object.id, object.name, object.begin_time, object.end_time
                );
            }
        }
        Commands::Generate {
            object,
            date,
            days,
            config,
            output,
            verbose,
        } => {
            let config = GeneratorConfig::load(config.as_deref())?;
            let generator = PlaylistGenerator::new(Arc::new(catalog), config);

            println!("Generating {} day(s) for object {} from {}...", days, object, date);
            let results = generator.generate_range(object, date, days).await?;

            for (day, result) in &results {
                print_playlist_result(object, *day, result, verbose);
            }

            if let Some(path) = output {
                let written = if path.extension().map_or(false, |ext| ext == "json") {
                    write_results_json(&results, &path)
                } else {
                    write_results_to_file(object, &results, &path)
                };
                written.map_err(|e| anyhow::anyhow!("writing {}: {}", path.display(), e))?;
                println!("\nResults saved to {}", path.display());
            }
        }
    }

    Ok(())
}
