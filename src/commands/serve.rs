use std::path::Path;

use quill::web;

pub fn run(db_path: &Path, port: u16) -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("quill=info,tower_http=info")),
        )
        .init();

    let rt = tokio::runtime::Runtime::new().map_err(|e| format!("failed to start runtime: {e}"))?;
    rt.block_on(web::serve(db_path, port))
}
