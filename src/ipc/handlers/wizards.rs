use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::wizard::{WizardInstance, WizardKind, WIZARD_KINDS};
use serde_json::json;
use std::collections::HashMap;

struct HandlerErr {
    code: &'static str,
    message: String,
    details: Option<serde_json::Value>,
}

impl HandlerErr {
    fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

fn get_wizard_kind(params: &serde_json::Value) -> Result<WizardKind, HandlerErr> {
    let raw = params
        .get("wizard")
        .and_then(|v| v.as_str())
        .ok_or_else(|| HandlerErr {
            code: "bad_params",
            message: "missing wizard".to_string(),
            details: None,
        })?;
    WizardKind::parse(raw).ok_or_else(|| {
        let known: Vec<&str> = WIZARD_KINDS.iter().map(|k| k.key()).collect();
        HandlerErr {
            code: "bad_params",
            message: format!("unknown wizard: {}", raw),
            details: Some(json!({ "known": known })),
        }
    })
}

fn get_instance(
    wizards: &mut HashMap<WizardKind, WizardInstance>,
    kind: WizardKind,
) -> Result<&mut WizardInstance, HandlerErr> {
    wizards.get_mut(&kind).ok_or_else(|| HandlerErr {
        code: "wizard_not_started",
        message: format!("no active {} wizard", kind.key()),
        details: None,
    })
}

fn wizard_start(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let kind = get_wizard_kind(params)?;
    // Re-mounting a page restarts its wizard from scratch.
    let instance = WizardInstance::start(kind);
    let payload = instance.state_json();
    state.wizards.insert(kind, instance);
    Ok(payload)
}

fn wizard_state(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let kind = get_wizard_kind(params)?;
    let instance = get_instance(&mut state.wizards, kind)?;
    Ok(instance.state_json())
}

fn wizard_goto(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let kind = get_wizard_kind(params)?;
    let instance = get_instance(&mut state.wizards, kind)?;

    let index = match (params.get("index"), params.get("step")) {
        (Some(idx), _) => idx.as_u64().map(|n| n as usize).ok_or_else(|| HandlerErr {
            code: "bad_params",
            message: "index must be a non-negative integer".to_string(),
            details: None,
        })?,
        (None, Some(step)) => {
            let name = step.as_str().ok_or_else(|| HandlerErr {
                code: "bad_params",
                message: "step must be a string".to_string(),
                details: None,
            })?;
            instance.flow.step_index(name).ok_or_else(|| HandlerErr {
                code: "bad_params",
                message: format!("unknown step: {}", name),
                details: None,
            })?
        }
        (None, None) => {
            return Err(HandlerErr {
                code: "bad_params",
                message: "missing index or step".to_string(),
                details: None,
            });
        }
    };

    if !instance.flow.go_to(index) {
        return Err(HandlerErr {
            code: "bad_params",
            message: format!("step index {} out of range", index),
            details: Some(json!({ "stepCount": instance.flow.step_count() })),
        });
    }
    Ok(instance.state_json())
}

fn wizard_next(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let kind = get_wizard_kind(params)?;
    let instance = get_instance(&mut state.wizards, kind)?;
    // Advancing past the last step stays put; the caller sees the same state.
    instance.flow.next();
    Ok(instance.state_json())
}

fn wizard_back(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let kind = get_wizard_kind(params)?;
    let instance = get_instance(&mut state.wizards, kind)?;
    instance.flow.back();
    Ok(instance.state_json())
}

fn wizard_discard(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let kind = get_wizard_kind(params)?;
    state.wizards.remove(&kind);
    Ok(json!({ "ok": true }))
}

fn handle_wizard_start(state: &mut AppState, req: &Request) -> serde_json::Value {
    match wizard_start(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_wizard_state(state: &mut AppState, req: &Request) -> serde_json::Value {
    match wizard_state(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_wizard_goto(state: &mut AppState, req: &Request) -> serde_json::Value {
    match wizard_goto(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_wizard_next(state: &mut AppState, req: &Request) -> serde_json::Value {
    match wizard_next(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_wizard_back(state: &mut AppState, req: &Request) -> serde_json::Value {
    match wizard_back(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_wizard_discard(state: &mut AppState, req: &Request) -> serde_json::Value {
    match wizard_discard(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "wizard.start" => Some(handle_wizard_start(state, req)),
        "wizard.state" => Some(handle_wizard_state(state, req)),
        "wizard.goto" => Some(handle_wizard_goto(state, req)),
        "wizard.next" => Some(handle_wizard_next(state, req)),
        "wizard.back" => Some(handle_wizard_back(state, req)),
        "wizard.discard" => Some(handle_wizard_discard(state, req)),
        _ => None,
    }
}
