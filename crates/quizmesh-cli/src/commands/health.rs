//! `quizmesh health` — Probe agents and print a system health report.

use console::style;

use quizmesh_core::actions::health::{self, OverallHealth};
use quizmesh_core::state::AppState;

pub async fn run(state: &AppState) -> Result<(), String> {
    let report = health::monitor(state).await;

    let overall = match report.status {
        OverallHealth::Healthy => style("HEALTHY").green().bold(),
        OverallHealth::Degraded => style("DEGRADED").yellow().bold(),
        OverallHealth::Unhealthy => style("UNHEALTHY").red().bold(),
    };
    println!(
        "System {} ({}/{} agents healthy)",
        overall, report.healthy_agents, report.total_agents
    );

    for agent in &report.agents {
        let mark = if agent.healthy {
            style("ok").green()
        } else {
            style("down").red()
        };
        println!(
            "  {:<4} {} {} circuit={}",
            mark,
            agent.name,
            style(&agent.agent_id).dim(),
            agent.circuit.state.as_str()
        );
        if let Some(error) = &agent.error {
            println!("       {}", style(error).dim());
        }
    }

    println!(
        "Workflows: {} total, {} running, {} completed, {} failed",
        report.workflows.total,
        report.workflows.running,
        report.workflows.completed,
        report.workflows.failed
    );
    Ok(())
}
