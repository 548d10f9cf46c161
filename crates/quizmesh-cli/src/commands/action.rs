//! `quizmesh action` — Raw orchestrator action invocation.

use quizmesh_core::actions::ActionRouter;
use quizmesh_core::state::AppState;

use super::print_json;

/// Build the `{ action, ...params }` body the router expects.
pub fn build_request(name: &str, params_str: &str) -> Result<serde_json::Value, String> {
    let params: serde_json::Value =
        serde_json::from_str(params_str).map_err(|e| format!("Invalid JSON params: {}", e))?;
    let mut body = match params {
        serde_json::Value::Object(map) => map,
        serde_json::Value::Null => serde_json::Map::new(),
        _ => return Err("Action params must be a JSON object".to_string()),
    };
    body.insert(
        "action".to_string(),
        serde_json::Value::String(name.to_string()),
    );
    Ok(serde_json::Value::Object(body))
}

pub async fn call(state: &AppState, name: &str, params_str: &str) -> Result<(), String> {
    let request = build_request(name, params_str)?;
    let router = ActionRouter::new(state.clone());
    let response = router
        .handle_value(request)
        .await
        .map_err(|e| e.to_string())?;

    print_json(&response);
    Ok(())
}
