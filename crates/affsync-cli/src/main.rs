mod collect;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "affsync")]
#[command(about = "Collect AliExpress affiliate products into a hosted table")]
struct Cli {
    /// Search keyword for the affiliate product query
    #[arg(env = "AFFSYNC_KEYWORD")]
    keyword: String,

    /// Also write results to this CSV file (appended if it already exists)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = affsync_core::load_app_config_from_env()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::debug!(?config, "configuration loaded");

    match collect::run_collect(&config, &cli.keyword, cli.output.as_deref()).await? {
        Some(report) => {
            match &report.export {
                collect::ExportStatus::Created(path) => println!("created {}", path.display()),
                collect::ExportStatus::Appended(path) => println!("appended to {}", path.display()),
                collect::ExportStatus::Failed(reason) => {
                    eprintln!("warning: CSV export failed: {reason}");
                }
                collect::ExportStatus::Skipped => {}
            }
            for failure in report.upload.failures() {
                eprintln!("record {} not uploaded: {}", failure.index, failure.reason);
            }
            println!(
                "collected {} products for '{}'; uploaded {} of {} to {} ({} known columns)",
                report.dataset.len(),
                cli.keyword,
                report.upload.uploaded,
                report.upload.attempted,
                config.supabase_table,
                report.schema.len()
            );
        }
        None => println!("no products found for '{}'", cli.keyword),
    }

    Ok(())
}
