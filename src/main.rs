use anyhow::Result;
use shelfscan::{
    config::{Config, LogFormat},
    extractor::{ExtractionSession, ProfileRegistry, tiers::emergency::EMERGENCY_SITE},
    fetcher::HttpPageFetcher,
    runner::{RunConfig, Runner, SiteJob, cancel_on_ctrl_c},
    sinks::{CsvFileSink, JsonFileSink, PostgresSink, RecordSink, write_all},
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Records printed in the closing summary.
const SAMPLE_SIZE: usize = 5;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration; `site[=query]` arguments replace the site list
    let config = Config::from_env()?.with_site_args(std::env::args().skip(1))?;

    init_tracing(config.log_format());

    let registry = ProfileRegistry::builtin()?;
    config.check_sites(&registry)?;
    let jobs = config
        .sites()
        .iter()
        .map(|selection| SiteJob::resolve(&registry, selection))
        .collect::<Result<Vec<_>, _>>()?;

    let shutdown_token = CancellationToken::new();
    cancel_on_ctrl_c(shutdown_token.clone());

    let runner = Runner::new(HttpPageFetcher::new(), RunConfig::from(&config))
        .with_shutdown(shutdown_token);
    let session = runner.run(&jobs).await;

    print_summary(&session);

    let sinks = build_sinks(&config, session.run_id()).await;
    let results = write_all(&sinks, session.records()).await;
    let failed = results.iter().filter(|(_, result)| result.is_err()).count();
    if failed > 0 {
        warn!(failed, total = results.len(), "some sinks failed");
    }

    info!(run_id = %session.run_id(), records = session.len(), "scraping completed");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

async fn build_sinks(config: &Config, run_id: Uuid) -> Vec<Box<dyn RecordSink>> {
    let mut sinks: Vec<Box<dyn RecordSink>> = Vec::new();
    if config.write_json() {
        sinks.push(Box::new(JsonFileSink::in_dir(config.output_dir())));
    }
    if config.write_csv() {
        sinks.push(Box::new(CsvFileSink::in_dir(config.output_dir())));
    }

    if let Some(database_url) = config.database_url() {
        match sqlx::postgres::PgPoolOptions::new()
            .max_connections(2)
            .connect(database_url)
            .await
        {
            Ok(pool) => {
                let sink = PostgresSink::new(pool, run_id);
                match sink.migrate().await {
                    Ok(()) => sinks.push(Box::new(sink)),
                    Err(e) => error!(error = %e, "database migrations failed, skipping database sink"),
                }
            }
            Err(e) => error!(error = %e, "database unreachable, skipping database sink"),
        }
    } else {
        info!("DATABASE_URL not set, skipping database sink");
    }

    sinks
}

fn print_summary(session: &ExtractionSession) {
    println!("\nScraping summary (run {})", session.run_id());
    println!("  Total products found: {}", session.len());
    for (site, count) in session.summary() {
        let note = if site == EMERGENCY_SITE { " (placeholder)" } else { "" };
        println!("  {site}: {count} products{note}");
    }

    if session.is_empty() {
        return;
    }
    println!("\nSample products:");
    for (position, record) in session.records().iter().take(SAMPLE_SIZE).enumerate() {
        let row = record.to_row();
        let name: String = row.name.chars().take(50).collect();
        println!("  {}. [{}] {}", position + 1, row.site, name);
        println!("     Search: {}", row.search_query);
        println!(
            "     Price: {} | Rating: {} | Reviews: {}",
            row.current_price, row.rating, row.reviews
        );
        println!("     Image: {}", row.image_url);
    }
}
