pub mod chat;
pub mod cli;
pub mod config;
pub mod http;
pub mod knowledge;
pub mod llm;
pub mod quiz;
pub mod render;
pub mod tools;
pub mod trace;
pub mod video;

use anyhow::Result;
use cli::{AppState, CliArgs, run_repl};
use config::AppConfig;
use http::{HttpClient, HttpDebugConfig};
use llm::GeminiProvider;
use std::time::{SystemTime, UNIX_EPOCH};
use trace::SessionTrace;
use video::YouTubeSearch;

pub async fn run(args: CliArgs) -> Result<()> {
    let config = AppConfig::load_with_path(args.config.as_deref())?;
    let session_id = generate_session_id();
    let trace = SessionTrace::create(&session_id)?;

    let client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()?;
    let http = HttpClient::new(client, HttpDebugConfig::from_verbose(args.verbose))
        .with_trace(trace.clone());

    let llm = GeminiProvider::new(
        http.clone(),
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
        config.gemini_base_url.clone(),
    )
    .ok();
    let videos = config
        .youtube_api_key
        .clone()
        .map(|key| YouTubeSearch::new(http, key, config.youtube_base_url.clone()));

    let mut app_state = AppState::new(&config, session_id, llm, videos, trace);
    run_repl(&mut app_state).await
}

fn generate_session_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_millis());
    format!("{millis:x}-{:x}", std::process::id())
}
