use crate::api::ApiError;
use crate::dates;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request, Role, Session};
use crate::stores;
use chrono::{Local, NaiveDate};
use serde_json::json;

const DASHBOARD_NOTICES: usize = 5;

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

/// The UI passes its rendering date so "today" matches what the user sees;
/// without one the daemon's local date applies.
fn effective_date(params: &serde_json::Value) -> Result<NaiveDate, HandlerErr> {
    match params.get("date").and_then(|v| v.as_str()) {
        Some(s) => dates::parse_iso_date(s).map_err(|message| HandlerErr {
            code: "bad_params",
            message,
            details: None,
        }),
        None => Ok(Local::now().date_naive()),
    }
}

fn latest_notices_for(
    session: &Session,
    audience: Option<&str>,
) -> Result<Vec<serde_json::Value>, HandlerErr> {
    let items = stores::collection(
        session
            .client
            .get("notices", &[], session.token())
            .map_err(api_err)?,
    );
    let items = match audience {
        Some(a) => stores::filter_audience(items, a),
        None => items,
    };
    Ok(stores::latest_notices(items, DASHBOARD_NOTICES))
}

fn admin_dashboard(session: &Session) -> Result<serde_json::Value, HandlerErr> {
    let token = session.token();
    let students = stores::collection(session.client.get("students", &[], token).map_err(api_err)?);
    let staffs = stores::collection(session.client.get("staffs", &[], token).map_err(api_err)?);
    Ok(json!({
        "role": "admin",
        "students": students.len(),
        "staffs": staffs.len(),
        "notices": latest_notices_for(session, None)?,
    }))
}

/// Staff and student dashboards share the shape: today's lessons plus the
/// notices addressed to them.
fn timetable_dashboard(
    session: &Session,
    role_key: &str,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let today = effective_date(params)?;
    let class_section = params.get("classSection").and_then(|v| v.as_str());
    let query: Vec<(&str, &str)> = match class_section {
        Some(cs) => vec![("classSection", cs)],
        None => Vec::new(),
    };
    let timetable = stores::collection(
        session
            .client
            .get("timetables", &query, session.token())
            .map_err(api_err)?,
    );
    let day = dates::weekday_name(today);
    Ok(json!({
        "role": role_key,
        "date": today.format("%Y-%m-%d").to_string(),
        "day": day,
        "lessons": stores::lessons_for_day(&timetable, day),
        "notices": latest_notices_for(session, Some(role_key))?,
    }))
}

fn parent_dashboard(
    session: &Session,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let guardian_id = params.get("guardianId").and_then(|v| v.as_str());
    let query: Vec<(&str, &str)> = match guardian_id {
        Some(g) => vec![("guardianId", g)],
        None => Vec::new(),
    };
    let children = stores::collection(
        session
            .client
            .get("students", &query, session.token())
            .map_err(api_err)?,
    );
    Ok(json!({
        "role": "parent",
        "children": children,
        "notices": latest_notices_for(session, Some("parent"))?,
    }))
}

fn dashboard_open(
    session: &Session,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    // The role always comes from the session, never from params.
    match session.role {
        Role::Admin => admin_dashboard(session),
        Role::Staff => timetable_dashboard(session, "staff", params),
        Role::Parent => parent_dashboard(session, params),
        Role::Student => timetable_dashboard(session, "student", params),
    }
}

fn handle_dashboard_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return err(&req.id, "no_session", "open a session first", None);
    };
    match dashboard_open(session, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "dashboard.open" => Some(handle_dashboard_open(state, req)),
        _ => None,
    }
}
