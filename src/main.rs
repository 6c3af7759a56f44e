use anyhow::Result;
use tny_shortener::{config, logging, server};

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load()?;
    logging::init_tracing(&config.log_level, &config.log_format);
    config.print_summary();

    server::run(config).await
}
