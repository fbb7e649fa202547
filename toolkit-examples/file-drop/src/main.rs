use anyhow::Result;
use toolkit_core::{Settings, ToolkitConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let settings = Settings::from_env("TOOLKIT__");
    let config = ToolkitConfig::from_settings(&settings)?;

    let host = settings.get("http.host").unwrap_or("127.0.0.1");
    let port = settings.get("http.port").unwrap_or("3030");
    let upload_dir = settings.get("storage.dir").unwrap_or("./uploads");

    let router = file_drop::build(config, upload_dir);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, upload_dir, "file-drop listening");

    axum::serve(listener, router).await?;

    Ok(())
}
