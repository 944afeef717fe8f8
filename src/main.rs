use clap::Parser;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::File;

use banter::core::config;
use banter::tui;

#[derive(Parser)]
#[command(name = "banter", about = "Streaming terminal chat for Anthropic models")]
struct Args {
    /// Model ID override (also: BANTER_MODEL env var or config file)
    #[arg(short, long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // File logger - a full-screen TUI can't log to stdout
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Ok(log_file) = File::create("banter.log") {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    let file_config = match config::load_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("banter: {e}");
            std::process::exit(1);
        }
    };
    let resolved = config::resolve(&file_config, args.model.as_deref());

    if resolved.api_key.is_none() {
        log::warn!("No API key configured; requests will fail until one is set");
    }
    log::info!("Banter starting up with model: {}", resolved.model_name);

    tui::run(resolved)
}
