use crate::api::ApiError;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request, Session};
use crate::stores;
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

fn get_page(params: &serde_json::Value) -> Result<usize, HandlerErr> {
    match params.get("page") {
        None => Ok(1),
        Some(v) => match v.as_u64() {
            Some(p) if p >= 1 => Ok(p as usize),
            _ => Err(HandlerErr {
                code: "bad_params",
                message: "page must be a positive integer".to_string(),
                details: None,
            }),
        },
    }
}

fn get_per_page(params: &serde_json::Value) -> Result<usize, HandlerErr> {
    match params.get("perPage") {
        None => Ok(stores::DEFAULT_PER_PAGE as usize),
        Some(v) => match v.as_u64() {
            Some(p) if (1..=stores::MAX_PER_PAGE).contains(&p) => Ok(p as usize),
            _ => Err(HandlerErr {
                code: "bad_params",
                message: format!("perPage must be between 1 and {}", stores::MAX_PER_PAGE),
                details: None,
            }),
        },
    }
}

fn notices_list(
    session: &Session,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let page = get_page(params)?;
    let per_page = get_per_page(params)?;
    let audience = params.get("audience").and_then(|v| v.as_str());

    let mut items = stores::collection(
        session
            .client
            .get("notices", &[], session.token())
            .map_err(api_err)?,
    );
    if let Some(a) = audience {
        items = stores::filter_audience(items, a);
    }
    stores::sort_notices_newest_first(&mut items);

    let mut result = stores::paginate(&items, page, per_page);
    if let Some(obj) = result.as_object_mut() {
        if let Some(a) = audience {
            obj.insert("audience".to_string(), json!(a));
        }
    }
    Ok(result)
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return err(&req.id, "no_session", "open a session first", None);
    };
    match notices_list(session, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "notices.list" => Some(handle_list(state, req)),
        _ => None,
    }
}
