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

fn timetable_week_open(
    session: &Session,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let class_section = get_required_str(params, "classSection")?;
    let week_of_raw = get_required_str(params, "weekOf")?;
    let week_of = dates::parse_iso_date(&week_of_raw).map_err(|message| HandlerErr {
        code: "bad_params",
        message,
        details: None,
    })?;

    let timetable = stores::collection(
        session
            .client
            .get(
                "timetables",
                &[("classSection", class_section.as_str())],
                session.token(),
            )
            .map_err(api_err)?,
    );

    // Monday through Friday, every day present even when it has no lessons.
    let days: Vec<serde_json::Value> = dates::school_week(week_of)
        .into_iter()
        .map(|date| {
            let day = dates::weekday_name(date);
            json!({
                "date": date.format("%Y-%m-%d").to_string(),
                "day": day,
                "lessons": stores::lessons_for_day(&timetable, day),
            })
        })
        .collect();

    Ok(json!({
        "classSection": class_section,
        "days": days,
    }))
}

fn handle_week_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return err(&req.id, "no_session", "open a session first", None);
    };
    match timetable_week_open(session, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "timetable.weekOpen" => Some(handle_week_open(state, req)),
        _ => None,
    }
}
