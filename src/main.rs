use clap::{Parser, Subcommand};
use tracing::error;

use paris_listings::config::Config;
use paris_listings::logging;
use paris_listings::pipeline::Pipeline;
use paris_listings::resolver::Resolver;

#[derive(Parser)]
#[command(name = "paris_listings")]
#[command(about = "Airbnb Paris listings data pipeline")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the source archive and extract the raw listings file
    Fetch,
    /// Derive the cleaned Paris artifact from the raw file
    Clean,
    /// Rebuild the SQLite store from the cleaned artifact
    Rebuild,
    /// Resolve the dataset (store, then file, then pipeline) and summarize it
    Load {
        /// Print the first N resolved rows
        #[arg(long)]
        preview: Option<usize>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Fetch => {
            let path = Pipeline::new(config).fetch()?;
            println!("📥 Raw file ready: {}", path.display());
        }
        Commands::Clean => {
            let path = Pipeline::new(config).clean()?;
            println!("🧹 Cleaned artifact: {}", path.display());
        }
        Commands::Rebuild => {
            let path = Pipeline::new(config).rebuild()?;
            println!("🗄️  Store rebuilt: {}", path.display());
        }
        Commands::Load { preview } => {
            let resolver = Resolver::new(config);
            match resolver.load() {
                Ok(rows) => {
                    println!("📊 Resolved {} Paris listings", rows.len());
                    if let Some(count) = preview {
                        for row in rows.iter().take(count) {
                            println!(
                                "   {} | {} | {} | {:.2} EUR",
                                row.listing_id,
                                row.district.as_deref().unwrap_or("-"),
                                row.room_type.as_deref().unwrap_or("-"),
                                row.price
                            );
                        }
                    }
                }
                Err(e) => {
                    error!("Resolution failed: {e}");
                    return Err(e.into());
                }
            }
        }
    }

    Ok(())
}
