use crate::api::ApiClient;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request, Role, Session};
use serde_json::json;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "role": state.session.as_ref().map(|s| s.role.key()),
            "apiBase": state
                .session
                .as_ref()
                .map(|s| s.client.base_url().to_string())
                .unwrap_or_else(|| state.config.base_url.clone()),
        }),
    )
}

fn handle_session_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let r = req.params.get("role").and_then(|v| v.as_str());
    let Some(role_str) = r else {
        return err(&req.id, "bad_params", "missing params.role", None);
    };
    let Some(role) = Role::parse(role_str) else {
        return err(
            &req.id,
            "bad_params",
            format!("unknown role: {role_str}"),
            None,
        );
    };

    let token = req
        .params
        .get("token")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());
    // Optional per-session override of the configured API base.
    let config = match req.params.get("apiBase").and_then(|v| v.as_str()) {
        Some(base) => state.config.with_base(base),
        None => state.config.clone(),
    };

    match ApiClient::new(&config) {
        Ok(client) => {
            let api_base = client.base_url().to_string();
            let authenticated = token.is_some();
            state.session = Some(Session {
                role,
                token,
                client,
            });
            // A new identity invalidates any in-flight wizard.
            state.wizards.clear();
            ok(
                &req.id,
                json!({
                    "role": role.key(),
                    "apiBase": api_base,
                    "authenticated": authenticated,
                }),
            )
        }
        Err(e) => err(&req.id, "bad_params", format!("{e:#}"), None),
    }
}

fn handle_session_close(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.session = None;
    state.wizards.clear();
    ok(&req.id, json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "session.open" => Some(handle_session_open(state, req)),
        "session.close" => Some(handle_session_close(state, req)),
        _ => None,
    }
}
