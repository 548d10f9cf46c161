//! `quizmesh server` — Start the QuizMesh HTTP backend server.

use console::style;

pub async fn run(
    host: String,
    port: u16,
    config_path: Option<&str>,
    discovery: bool,
) -> Result<(), String> {
    let orchestrator = super::load_config(config_path)?;
    let agents = orchestrator.agents.len();

    let config = quizmesh_server::ServerConfig {
        host: host.clone(),
        port,
        orchestrator,
        discovery,
    };

    println!(
        "Starting QuizMesh server on {}:{} ({} agents configured)...",
        host, port, agents
    );

    let addr = quizmesh_server::start_server(config).await?;
    println!(
        "QuizMesh server listening on {}",
        style(format!("http://{}", addr)).cyan().bold()
    );

    // Keep the process running until interrupted
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("Failed to listen for Ctrl+C: {}", e))?;

    println!("\nShutting down...");
    Ok(())
}
