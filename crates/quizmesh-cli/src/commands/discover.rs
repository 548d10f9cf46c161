//! `quizmesh discover` — One discovery pass over the configured agents.

use console::style;

use quizmesh_core::actions::agents;
use quizmesh_core::models::AgentStatus;
use quizmesh_core::state::AppState;

pub async fn run(state: &AppState) -> Result<(), String> {
    let result = agents::discover(state).await;
    let report = result.report;

    println!(
        "Discovered {} agents: {} online, {} offline",
        report.agents.len(),
        style(report.online).green().bold(),
        style(report.offline).red().bold()
    );
    for agent in &report.agents {
        let status = match agent.status {
            AgentStatus::Online => style(agent.status.as_str()).green(),
            AgentStatus::Busy => style(agent.status.as_str()).yellow(),
            AgentStatus::Offline => style(agent.status.as_str()).red(),
            AgentStatus::Unknown => style(agent.status.as_str()).dim(),
        };
        println!("  {:<8} {} {}", status, agent.name, style(&agent.id).dim());
        if !agent.capabilities.is_empty() {
            println!("           skills: {}", agent.capabilities.join(", "));
        }
    }
    Ok(())
}
