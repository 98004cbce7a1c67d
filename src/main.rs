use anyhow::Result;
use tracing::{debug, info};

use rowcast::config::Config;
use rowcast::types::ParsePolicy;
use rowcast::{Args, Context, DbHandler, Options, Param, QueryRunner};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(config.log_level.clone())
        .init();

    info!("rowcast v{}", env!("CARGO_PKG_VERSION"));

    let db_path = config.db_path();
    if config.in_memory {
        info!("Using in-memory SQLite database");
    }

    let db_handler = DbHandler::new(db_path)
        .map_err(|e| anyhow::anyhow!("Failed to open database {}: {}", db_path, e))?;

    for sql in &config.init {
        debug!("Running init statement: {}", sql);
        db_handler.execute_batch(sql).await?;
    }

    let options = Options::new()
        .with_single_result(config.single_result)
        .with_panic_on_error(config.panic)
        .with_parse_policy(if config.strict {
            ParsePolicy::Strict
        } else {
            ParsePolicy::Permissive
        });

    let ctx = match config.timeout() {
        Some(timeout) => Context::with_timeout(timeout),
        None => Context::background(),
    };

    let args: Args = config.args.iter().map(|raw| parse_arg(raw)).collect();
    let output = QueryRunner::query(&ctx, &db_handler, &config.query, &options, args).await;
    db_handler.shutdown().await;

    println!("{}", serde_json::to_string_pretty(&output?)?);
    Ok(())
}

fn parse_arg(raw: &str) -> Param {
    if raw.eq_ignore_ascii_case("null") {
        Param::Null
    } else if let Ok(i) = raw.parse::<i64>() {
        Param::Int(i)
    } else if let Ok(f) = raw.parse::<f64>() {
        Param::Float(f)
    } else {
        Param::Text(raw.to_string())
    }
}
