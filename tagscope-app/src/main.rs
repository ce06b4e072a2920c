use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use actix_web::{App, HttpServer, web};
use anyhow::{Context, Result};
use clap::Parser;
use tagscope_app::{AppState, configure, cors};
use tagscope_common::observability::{LogConfig, LogFormat, init_logging};
use tagscope_config::{CsvHeaderStyle, TagscopeConfig, TagscopeConfigLoader};
use tagscope_social::{CsvHeader, InstagramApi, InstagramCredentials, TagPipeline};
use tracing_actix_web::TracingLogger;

#[derive(Debug, Parser)]
#[command(name = "tagscope", version, about = "Hashtag post extraction service")]
struct Args {
    /// YAML configuration file; skipped when it does not exist.
    #[arg(long, env = "TAGSCOPE_CONFIG", default_value = "tagscope.yaml")]
    config: PathBuf,

    /// Listen address, overriding `server.host`/`server.port`.
    #[arg(long)]
    bind: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    log_json: bool,

    /// Mirror logs to stderr.
    #[arg(long)]
    log_stderr: bool,
}

fn build_pipeline(cfg: &TagscopeConfig) -> Result<TagPipeline> {
    let ig = &cfg.instagram;
    let credentials = InstagramCredentials {
        cookie: ig.cookie.clone(),
        user_agent: ig.user_agent.clone(),
        asbd_id: ig.asbd_id.clone(),
        csrf_token: ig.csrf_token.clone(),
        ig_app_id: ig.ig_app_id.clone(),
        ig_www_claim: ig.ig_www_claim.clone(),
    };
    let api = InstagramApi::new(
        &ig.base_url,
        credentials,
        Duration::from_secs(ig.timeout_secs),
    )
    .with_context(|| format!("invalid instagram.base_url '{}'", ig.base_url))?;

    let header = match cfg.export.csv_header {
        CsvHeaderStyle::Indonesian => CsvHeader::Indonesian,
        CsvHeaderStyle::English => CsvHeader::English,
    };
    Ok(TagPipeline::new(Arc::new(api), cfg.output.dir.clone()).with_csv_header(header))
}

#[actix_web::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Environment overrides win over the file.
    let cfg = TagscopeConfigLoader::new()
        .with_optional_file(&args.config)
        .load()
        .with_context(|| format!("loading config {}", args.config.display()))?;

    let log_path = init_logging(LogConfig {
        emit_stderr: args.log_stderr,
        format: if args.log_json {
            LogFormat::Json
        } else {
            LogFormat::from_env()
        },
        ..LogConfig::default()
    })?;

    let bind = args.bind.clone().unwrap_or_else(|| cfg.server.bind_addr());
    tracing::info!(
        config = %args.config.display(),
        version = ?cfg.version,
        log = %log_path.display(),
        output_dir = %cfg.output.dir.display(),
        %bind,
        "tagscope.start"
    );

    let state = web::Data::new(
        AppState::new(build_pipeline(&cfg)?)
            .with_default_window_days(cfg.filter.default_window_days),
    );
    let origins = cfg.server.cors_allowed_origins.clone();

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(cors(&origins))
            .wrap(TracingLogger::default())
            .configure(configure)
    })
    .bind(&bind)
    .with_context(|| format!("binding {bind}"))?
    .run()
    .await
    .context("http server terminated")
}
