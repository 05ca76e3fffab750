//! `escapebot serve`

use escapebot_infra::config::Credentials;

use crate::http::router::build_router;
use crate::state::Runtime;

pub async fn serve(runtime: &Runtime, host: &str, port: u16) -> anyhow::Result<()> {
    let credentials = Credentials::from_env()?;
    let state = runtime.live_state(credentials);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!(
        "  {} escapebot listening on {}",
        console::style("⚡").bold(),
        console::style(format!("http://{addr}/callback")).cyan()
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());
    tracing::info!(%addr, data_dir = %runtime.data_dir.display(), "webhook server started");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    println!("\n  Server stopped.");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
