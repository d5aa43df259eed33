use crate::api::ApiError;
use crate::dates;
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

fn get_iso_date(params: &serde_json::Value) -> Result<chrono::NaiveDate, HandlerErr> {
    let raw = get_required_str(params, "date")?;
    dates::parse_iso_date(&raw).map_err(|message| HandlerErr {
        code: "bad_params",
        message,
        details: None,
    })
}

/// Marks are validated before anything goes on the wire; one bad code fails
/// the whole batch.
fn parse_entries(params: &serde_json::Value) -> Result<Vec<serde_json::Value>, HandlerErr> {
    let Some(raw) = params.get("entries").and_then(|v| v.as_array()) else {
        return Err(HandlerErr {
            code: "bad_params",
            message: "missing entries".to_string(),
            details: None,
        });
    };
    if raw.is_empty() {
        return Err(HandlerErr {
            code: "bad_params",
            message: "entries must not be empty".to_string(),
            details: None,
        });
    }
    let mut entries = Vec::with_capacity(raw.len());
    for (i, entry) in raw.iter().enumerate() {
        let student_id = entry
            .get("studentId")
            .and_then(|v| v.as_str())
            .ok_or_else(|| HandlerErr {
                code: "bad_params",
                message: format!("entries[{}] missing studentId", i),
                details: None,
            })?;
        let code = entry
            .get("code")
            .and_then(|v| v.as_str())
            .ok_or_else(|| HandlerErr {
                code: "bad_params",
                message: format!("entries[{}] missing code", i),
                details: None,
            })?;
        if !stores::is_attendance_code(code) {
            return Err(HandlerErr {
                code: "bad_params",
                message: format!("entries[{}] has unknown code: {}", i, code),
                details: Some(json!({ "allowed": stores::ATTENDANCE_CODES })),
            });
        }
        entries.push(json!({ "studentId": student_id, "code": code }));
    }
    Ok(entries)
}

fn attendance_sheet_open(
    session: &Session,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let class_section = get_required_str(params, "classSection")?;
    let date = get_iso_date(params)?;
    let date_key = date.format("%Y-%m-%d").to_string();
    let token = session.token();

    let roster = stores::collection(
        session
            .client
            .get("students", &[("classSection", class_section.as_str())], token)
            .map_err(api_err)?,
    );
    let marks = stores::collection(
        session
            .client
            .get(
                "attendances",
                &[
                    ("classSection", class_section.as_str()),
                    ("date", date_key.as_str()),
                ],
                token,
            )
            .map_err(api_err)?,
    );

    Ok(json!({
        "classSection": class_section,
        "date": date_key,
        "day": dates::weekday_name(date),
        "rows": stores::sheet_rows(&roster, &marks),
    }))
}

fn attendance_save(
    session: &Session,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let class_section = get_required_str(params, "classSection")?;
    let date = get_iso_date(params)?;
    let entries = parse_entries(params)?;
    let saved = entries.len();

    let body = json!({
        "classSection": class_section,
        "date": date.format("%Y-%m-%d").to_string(),
        "entries": entries,
    });
    session
        .client
        .post("attendances", &body, session.token())
        .map_err(api_err)?;
    Ok(json!({ "saved": saved }))
}

fn attendance_student_summary(
    session: &Session,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let month_key = get_required_str(params, "month")?;
    let (year, month_num) = dates::parse_month_key(&month_key).map_err(|message| HandlerErr {
        code: "bad_params",
        message,
        details: None,
    })?;

    let marks = stores::collection(
        session
            .client
            .get(
                "attendances",
                &[
                    ("studentId", student_id.as_str()),
                    ("month", month_key.trim()),
                ],
                session.token(),
            )
            .map_err(api_err)?,
    );

    let mut summary = stores::attendance_summary(&marks);
    if let Some(obj) = summary.as_object_mut() {
        obj.insert("studentId".to_string(), json!(student_id));
        obj.insert("month".to_string(), json!(month_key.trim()));
        obj.insert(
            "daysInMonth".to_string(),
            json!(dates::days_in_month(year, month_num)),
        );
    }
    Ok(summary)
}

fn handle_sheet_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return err(&req.id, "no_session", "open a session first", None);
    };
    match attendance_sheet_open(session, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return err(&req.id, "no_session", "open a session first", None);
    };
    match attendance_save(session, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_student_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return err(&req.id, "no_session", "open a session first", None);
    };
    match attendance_student_summary(session, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.sheetOpen" => Some(handle_sheet_open(state, req)),
        "attendance.save" => Some(handle_save(state, req)),
        "attendance.studentSummary" => Some(handle_student_summary(state, req)),
        _ => None,
    }
}
