use crate::api::ApiError;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::wizard::{FormAggregate, WizardKind};
use serde_json::json;

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

fn api_err(e: ApiError) -> HandlerErr {
    HandlerErr {
        code: e.wire_code(),
        message: e.to_string(),
        details: e.details(),
    }
}

fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr {
            code: "bad_params",
            message: format!("missing {}", key),
            details: None,
        })
}

fn get_required_object(
    params: &serde_json::Value,
    key: &str,
) -> Result<serde_json::Map<String, serde_json::Value>, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_object())
        .cloned()
        .ok_or_else(|| HandlerErr {
            code: "bad_params",
            message: format!("{} must be an object", key),
            details: None,
        })
}

fn get_required_index(params: &serde_json::Value) -> Result<usize, HandlerErr> {
    params
        .get("index")
        .and_then(|v| v.as_u64())
        .map(|n| n as usize)
        .ok_or_else(|| HandlerErr {
            code: "bad_params",
            message: "missing index".to_string(),
            details: None,
        })
}

fn get_form(state: &mut AppState) -> Result<&mut FormAggregate, HandlerErr> {
    let instance = state
        .wizards
        .get_mut(&WizardKind::Onboarding)
        .ok_or_else(|| HandlerErr {
            code: "wizard_not_started",
            message: "no active onboarding wizard".to_string(),
            details: None,
        })?;
    instance.form.as_mut().ok_or_else(|| HandlerErr {
        code: "wizard_not_started",
        message: "onboarding form is not initialized".to_string(),
        details: None,
    })
}

fn onboarding_merge(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let section = get_required_str(params, "section")?;
    let patch = get_required_object(params, "patch")?;
    let form = get_form(state)?;
    form.merge_section(&section, &patch)
        .map_err(|message| HandlerErr {
            code: "bad_params",
            message,
            details: None,
        })?;
    Ok(json!({ "aggregate": form.snapshot() }))
}

fn onboarding_owner_add(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let owner = get_required_object(params, "owner")?;
    let form = get_form(state)?;
    let index = form.owner_add(owner);
    Ok(json!({ "index": index, "owners": form.owners() }))
}

fn onboarding_owner_update(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let index = get_required_index(params)?;
    let patch = get_required_object(params, "patch")?;
    let form = get_form(state)?;
    form.owner_update(index, &patch)
        .map_err(|message| HandlerErr {
            code: "bad_params",
            message,
            details: Some(json!({ "owners": form.owner_count() })),
        })?;
    Ok(json!({ "owners": form.owners() }))
}

fn onboarding_owner_remove(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let index = get_required_index(params)?;
    let form = get_form(state)?;
    form.owner_remove(index).map_err(|message| HandlerErr {
        code: "bad_params",
        message,
        details: Some(json!({ "owners": form.owner_count() })),
    })?;
    Ok(json!({ "owners": form.owners() }))
}

fn onboarding_snapshot(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    let form = get_form(state)?;
    Ok(json!({ "aggregate": form.snapshot() }))
}

fn onboarding_submit(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    let Some(session) = state.session.as_ref() else {
        return Err(HandlerErr {
            code: "no_session",
            message: "open a session first".to_string(),
            details: None,
        });
    };
    let instance = state
        .wizards
        .get(&WizardKind::Onboarding)
        .ok_or_else(|| HandlerErr {
            code: "wizard_not_started",
            message: "no active onboarding wizard".to_string(),
            details: None,
        })?;
    if !instance.flow.is_terminal() {
        return Err(HandlerErr {
            code: "bad_state",
            message: "submission is only allowed from the review step".to_string(),
            details: Some(json!({
                "current": instance.flow.current().name,
                "activeIndex": instance.flow.active_index(),
            })),
        });
    }
    let Some(form) = instance.form.as_ref() else {
        return Err(HandlerErr {
            code: "wizard_not_started",
            message: "onboarding form is not initialized".to_string(),
            details: None,
        });
    };

    // A failed attempt must leave the step and the aggregate exactly as they
    // were so the user can correct and resubmit.
    let aggregate = form.snapshot();
    let body = session
        .client
        .submit_school(&aggregate, session.token())
        .map_err(api_err)?;
    Ok(body)
}

fn handle_merge(state: &mut AppState, req: &Request) -> serde_json::Value {
    match onboarding_merge(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_owner_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    match onboarding_owner_add(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_owner_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    match onboarding_owner_update(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_owner_remove(state: &mut AppState, req: &Request) -> serde_json::Value {
    match onboarding_owner_remove(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_snapshot(state: &mut AppState, req: &Request) -> serde_json::Value {
    match onboarding_snapshot(state) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_submit(state: &mut AppState, req: &Request) -> serde_json::Value {
    match onboarding_submit(state) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "onboarding.merge" => Some(handle_merge(state, req)),
        "onboarding.ownerAdd" => Some(handle_owner_add(state, req)),
        "onboarding.ownerUpdate" => Some(handle_owner_update(state, req)),
        "onboarding.ownerRemove" => Some(handle_owner_remove(state, req)),
        "onboarding.snapshot" => Some(handle_snapshot(state, req)),
        "onboarding.submit" => Some(handle_submit(state, req)),
        _ => None,
    }
}
