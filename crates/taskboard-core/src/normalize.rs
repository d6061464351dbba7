//! Payload Normalizer
//!
//! The backend names and nests the same logical field differently depending
//! on the endpoint (an assignee id shows up as `assigment.idUser.idUser`,
//! `assigment.idUserId` or a bare number). Every lookup here is a priority
//! chain: the first path that yields a usable value wins.
//!
//! Nothing in this module fails. Malformed input degrades to "unassigned",
//! the default status, or a provisional id.

use serde_json::Value;

use crate::domain::{
    Assignee, Project, ProjectId, SessionUser, Task, TaskId, TaskStatus, User, UserId,
};

// ========================
// Lookup helpers
// ========================

/// Walk `path` through nested objects; JSON `null` counts as absent.
fn at<'a>(raw: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = raw;
    for key in path {
        current = current.get(key)?;
    }
    (!current.is_null()).then_some(current)
}

/// Integer from a number, an integral float or a numeric string.
fn int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn text(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

fn flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(_) => int(value).map(|n| n != 0),
        Value::String(s) => match s.trim() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// First path whose value passes `extract`.
fn first<T>(raw: &Value, paths: &[&[&str]], extract: impl Fn(&Value) -> Option<T>) -> Option<T> {
    paths
        .iter()
        .find_map(|path| at(raw, path).and_then(&extract))
}

// ========================
// Collections
// ========================

/// Elements of a list payload. Accepts a bare array or a `{data}` / `{items}`
/// wrapper; anything else is an empty list.
pub fn items(raw: &Value) -> &[Value] {
    let list = match raw {
        Value::Array(_) => Some(raw),
        Value::Object(_) => at(raw, &["data"]).or_else(|| at(raw, &["items"])),
        _ => None,
    };
    list.and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

// ========================
// Assignment
// ========================

fn assignment_object(raw: &Value) -> Option<&Value> {
    at(raw, &["assigment"])
        .or_else(|| at(raw, &["assignment"]))
        .filter(|value| value.is_object())
}

/// Reads a user-task junction row (or the nested `assigment` of a task).
pub fn assignment(row: &Value) -> Option<Assignee> {
    let user_id = first(
        row,
        &[
            &["idUser", "idUser"],
            &["user", "idUser"],
            &["idUserId"],
            &["idUser"],
        ],
        int,
    )?;
    let user_name = first(
        row,
        &[
            &["idUser", "userName"],
            &["userName"],
            &["user", "userName"],
            &["idUser", "email"],
        ],
        text,
    );
    Some(Assignee {
        user_id: UserId(user_id),
        user_name,
    })
}

/// Assignee of a raw task record, if any.
pub fn assignee(raw: &Value) -> Option<Assignee> {
    if let Some(found) = assignment_object(raw).and_then(assignment) {
        return Some(found);
    }
    let user_id = at(raw, &["assignedUserId"]).and_then(int)?;
    Some(Assignee {
        user_id: UserId(user_id),
        user_name: at(raw, &["assignedUserName"]).and_then(text),
    })
}

// ========================
// Task
// ========================

/// Status chain: nested object, flat id, numeric string, default Pending.
pub fn task_status(raw: &Value) -> TaskStatus {
    let id = first(
        raw,
        &[&["status", "idStatus"], &["statusId"], &["statusText"], &["status"]],
        int,
    )
    .unwrap_or(1);
    TaskStatus::from_id(id).unwrap_or_default()
}

pub fn task_id(raw: &Value) -> Option<TaskId> {
    first(raw, &[&["tasks"], &["id"]], int).map(TaskId)
}

pub fn task(raw: &Value) -> Task {
    let id = task_id(raw).unwrap_or_else(TaskId::provisional);
    Task {
        id,
        project_id: first(raw, &[&["idProjects", "idProject"], &["projectId"]], int)
            .map(ProjectId),
        title: first(raw, &[&["name"], &["title"]], text)
            .unwrap_or_else(|| format!("Task #{id}")),
        description: at(raw, &["description"]).and_then(text).unwrap_or_default(),
        status: task_status(raw),
        start_at: first(raw, &[&["plannedStartDate"], &["startAt"]], text),
        end_at: first(raw, &[&["plannedEndDate"], &["endAt"]], text),
        assignee: assignee(raw),
    }
}

// ========================
// Project
// ========================

pub fn project_id(raw: &Value) -> Option<ProjectId> {
    first(raw, &[&["idProject"], &["id"]], int).map(ProjectId)
}

pub fn project(raw: &Value) -> Project {
    Project {
        id: project_id(raw).unwrap_or_else(ProjectId::provisional),
        name: first(raw, &[&["project"], &["name"]], text).unwrap_or_default(),
        description: at(raw, &["description"]).and_then(text).unwrap_or_default(),
        created_at: first(raw, &[&["createdDate"], &["createdAt"]], text),
        owner_id: first(raw, &[&["idOwnerUser", "idUser"], &["ownerId"]], int).map(UserId),
        owner_name: first(raw, &[&["idOwnerUser", "userName"], &["ownerName"]], text),
        owner_email: at(raw, &["idOwnerUser", "email"]).and_then(text),
        status: first(raw, &[&["projectStatus"], &["status"]], flag).unwrap_or(false),
        task_count: at(raw, &["tasksCount"])
            .and_then(int)
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(0),
        member_ids: Default::default(),
    }
}

// ========================
// User
// ========================

fn user_id(raw: &Value) -> Option<UserId> {
    first(raw, &[&["idUser"], &["id"], &["userId"]], int).map(UserId)
}

fn user_status(raw: &Value) -> Option<i64> {
    first(raw, &[&["userStatus"], &["status"]], |v| {
        int(v).or_else(|| v.as_bool().map(i64::from))
    })
}

/// A user record; records without any id are dropped by the caller.
pub fn user(raw: &Value) -> Option<User> {
    Some(User {
        id: user_id(raw)?,
        name: first(raw, &[&["userName"], &["name"]], text).unwrap_or_default(),
        email: at(raw, &["email"]).and_then(text).unwrap_or_default(),
        status: user_status(raw),
    })
}

pub fn session_user(raw: &Value) -> SessionUser {
    SessionUser {
        id: user_id(raw),
        user_name: first(raw, &[&["userName"], &["name"]], text).unwrap_or_default(),
        email: at(raw, &["email"]).and_then(text).unwrap_or_default(),
        user_status: user_status(raw),
    }
}
