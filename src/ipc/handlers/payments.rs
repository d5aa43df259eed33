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

fn payments_summary(
    session: &Session,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = params
        .get("studentId")
        .and_then(|v| v.as_str())
        .ok_or_else(|| HandlerErr {
            code: "bad_params",
            message: "missing studentId".to_string(),
            details: None,
        })?;

    let rows = stores::collection(
        session
            .client
            .get("payments", &[("studentId", student_id)], session.token())
            .map_err(api_err)?,
    );

    Ok(json!({
        "studentId": student_id,
        "rows": rows,
        "totals": stores::payment_totals(&rows),
    }))
}

fn handle_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return err(&req.id, "no_session", "open a session first", None);
    };
    match payments_summary(session, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "payments.summary" => Some(handle_summary(state, req)),
        _ => None,
    }
}
