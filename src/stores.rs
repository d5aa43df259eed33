//! Reshaping of remote collections: sorting, filtering, pagination, and
//! aggregation. Handlers fetch raw JSON and shape it here; nothing in this
//! module performs I/O.

use serde_json::{json, Value};
use std::collections::HashMap;

pub const ATTENDANCE_CODES: [&str; 4] = ["present", "absent", "late", "excused"];

pub const DEFAULT_PER_PAGE: u64 = 10;
pub const MAX_PER_PAGE: u64 = 50;

pub fn is_attendance_code(code: &str) -> bool {
    ATTENDANCE_CODES.contains(&code)
}

/// Remote collections are plain JSON arrays; anything else reads as empty.
pub fn collection(v: Value) -> Vec<Value> {
    match v {
        Value::Array(items) => items,
        _ => Vec::new(),
    }
}

fn str_field<'a>(item: &'a Value, key: &str) -> &'a str {
    item.get(key).and_then(|v| v.as_str()).unwrap_or("")
}

fn num_field(item: &Value, key: &str) -> f64 {
    item.get(key).and_then(|v| v.as_f64()).unwrap_or(0.0)
}

/// ISO timestamps order lexicographically, so a string sort is enough.
pub fn sort_notices_newest_first(items: &mut [Value]) {
    items.sort_by(|a, b| str_field(b, "publishedAt").cmp(&str_field(a, "publishedAt")));
}

pub fn latest_notices(mut items: Vec<Value>, n: usize) -> Vec<Value> {
    sort_notices_newest_first(&mut items);
    items.truncate(n);
    items
}

/// Notices addressed to `all`, or carrying no audience at all, show for every
/// role.
pub fn filter_audience(items: Vec<Value>, audience: &str) -> Vec<Value> {
    items
        .into_iter()
        .filter(|n| {
            let a = str_field(n, "audience");
            a == audience || a == "all" || a.is_empty()
        })
        .collect()
}

/// Page numbering is 1-based. A page past the end is an empty page, not an
/// error. Callers validate `page >= 1` and `1 <= per_page <= MAX_PER_PAGE`.
pub fn paginate(items: &[Value], page: usize, per_page: usize) -> Value {
    let total = items.len();
    let total_pages = (total + per_page - 1) / per_page;
    let start = (page - 1).saturating_mul(per_page);
    let page_items: Vec<Value> = items.iter().skip(start).take(per_page).cloned().collect();
    json!({
        "items": page_items,
        "page": page,
        "perPage": per_page,
        "total": total,
        "totalPages": total_pages,
    })
}

pub fn lessons_for_day(items: &[Value], day: &str) -> Vec<Value> {
    let mut lessons: Vec<Value> = items
        .iter()
        .filter(|l| str_field(l, "day").eq_ignore_ascii_case(day))
        .cloned()
        .collect();
    lessons.sort_by_key(|l| l.get("period").and_then(|v| v.as_u64()).unwrap_or(0));
    lessons
}

/// Roster joined with any marks recorded for the day; unmarked students carry
/// a null code. Roster order is preserved.
pub fn sheet_rows(roster: &[Value], marks: &[Value]) -> Vec<Value> {
    let mut code_by_student: HashMap<&str, &str> = HashMap::new();
    for mark in marks {
        let sid = str_field(mark, "studentId");
        let code = str_field(mark, "code");
        if !sid.is_empty() && !code.is_empty() {
            code_by_student.insert(sid, code);
        }
    }
    roster
        .iter()
        .map(|s| {
            let id = str_field(s, "id");
            json!({
                "studentId": id,
                "displayName": str_field(s, "name"),
                "rollNumber": s.get("rollNumber").cloned().unwrap_or(Value::Null),
                "code": code_by_student
                    .get(id)
                    .map(|c| json!(c))
                    .unwrap_or(Value::Null),
            })
        })
        .collect()
}

/// Per-code counts plus an attendance percentage: present and late days over
/// all marked days, one decimal place. No marks at all reads as 0.0.
pub fn attendance_summary(items: &[Value]) -> Value {
    let mut present = 0u64;
    let mut absent = 0u64;
    let mut late = 0u64;
    let mut excused = 0u64;
    for item in items {
        match str_field(item, "code") {
            "present" => present += 1,
            "absent" => absent += 1,
            "late" => late += 1,
            "excused" => excused += 1,
            _ => {}
        }
    }
    let marked = present + absent + late + excused;
    let percentage = if marked == 0 {
        0.0
    } else {
        ((present + late) as f64 * 1000.0 / marked as f64).round() / 10.0
    };
    json!({
        "counts": {
            "present": present,
            "absent": absent,
            "late": late,
            "excused": excused,
        },
        "daysMarked": marked,
        "percentage": percentage,
    })
}

pub fn payment_totals(rows: &[Value]) -> Value {
    let total_due: f64 = rows.iter().map(|r| num_field(r, "amountDue")).sum();
    let total_paid: f64 = rows.iter().map(|r| num_field(r, "amountPaid")).sum();
    json!({
        "totalDue": total_due,
        "totalPaid": total_paid,
        "balance": total_due - total_paid,
    })
}
