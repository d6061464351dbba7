//! Test Transports
//!
//! `ScriptedTransport` replays canned responses per (method, path).
//! `FakeBackend` keeps task and assignment rows in memory so protocol tests
//! can inspect the resulting server state.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::client::ApiClient;
use crate::domain::ClientError;
use crate::transport::{ApiRequest, ApiResponse, Method, Transport};

#[derive(Clone)]
enum Reply {
    Respond(ApiResponse),
    Fail(String),
}

/// Canned responses; the last reply for a route repeats.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<Reply>>>,
    log: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn client(self: &Arc<Self>) -> ApiClient {
        ApiClient::new(self.clone())
    }

    pub(crate) fn on(&self, method: Method, path: &str, status: u16, body: impl Into<String>) -> &Self {
        self.push(method, path, Reply::Respond(ApiResponse::new(status, body)))
    }

    pub(crate) fn on_json(&self, method: Method, path: &str, status: u16, body: Value) -> &Self {
        self.on(method, path, status, body.to_string())
    }

    pub(crate) fn fail(&self, method: Method, path: &str, reason: &str) -> &Self {
        self.push(method, path, Reply::Fail(reason.to_string()))
    }

    fn push(&self, method: Method, path: &str, reply: Reply) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
        self
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.log.lock().unwrap().clone()
    }

    /// "METHOD /path" for every request, in send order.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| format!("{} {}", r.method, r.path))
            .collect()
    }

    pub(crate) fn count(&self, method: Method, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }
}

#[async_trait(?Send)]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        let key = (request.method, request.path.clone());
        self.log.lock().unwrap().push(request);

        let reply = {
            let mut routes = self.routes.lock().unwrap();
            let queue = routes.get_mut(&key);
            match queue {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };
        match reply {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Fail(reason)) => Err(ClientError::Transport(reason)),
            None => Err(ClientError::Transport(format!(
                "no scripted reply for {} {}",
                key.0, key.1
            ))),
        }
    }
}

// ========================
// Fake backend
// ========================

#[derive(Default)]
struct FakeState {
    tasks: BTreeMap<i64, Value>,
    users: BTreeMap<i64, String>,
    /// (task, user); the junction table allows several rows per task
    assignments: Vec<(i64, i64)>,
    /// Answer 500 instead of 404 when deleting a missing row
    strict_deletes: bool,
    failing_assignees: Vec<i64>,
}

/// In-memory stand-in for the task and assignment endpoints.
#[derive(Default)]
pub(crate) struct FakeBackend {
    state: Mutex<FakeState>,
    log: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn client(self: &Arc<Self>) -> ApiClient {
        ApiClient::new(self.clone())
    }

    pub(crate) fn add_user(&self, id: i64, name: &str) {
        self.state.lock().unwrap().users.insert(id, name.to_string());
    }

    pub(crate) fn add_task(&self, id: i64, project: i64, name: &str) {
        let record = json!({
            "tasks": id,
            "idProjects": { "idProject": project },
            "name": name,
            "status": { "idStatus": 1 },
        });
        self.state.lock().unwrap().tasks.insert(id, record);
    }

    /// Inserts a junction row directly, bypassing the client.
    pub(crate) fn seed_assignment(&self, task: i64, user: i64) {
        self.state.lock().unwrap().assignments.push((task, user));
    }

    pub(crate) fn strict_deletes(&self) {
        self.state.lock().unwrap().strict_deletes = true;
    }

    pub(crate) fn fail_assignments_to(&self, user: i64) {
        self.state.lock().unwrap().failing_assignees.push(user);
    }

    pub(crate) fn assignees_of(&self, task: i64) -> Vec<i64> {
        self.state
            .lock()
            .unwrap()
            .assignments
            .iter()
            .filter(|(t, _)| *t == task)
            .map(|(_, u)| *u)
            .collect()
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn task_view(state: &FakeState, id: i64) -> Option<Value> {
        let mut record = state.tasks.get(&id)?.clone();
        let row = state.assignments.iter().find(|(t, _)| *t == id);
        record["assigment"] = match row {
            Some((_, user)) => json!({
                "idUser": {
                    "idUser": user,
                    "userName": state.users.get(user).cloned(),
                }
            }),
            None => Value::Null,
        };
        Some(record)
    }

    fn handle(&self, request: &ApiRequest) -> ApiResponse {
        let mut state = self.state.lock().unwrap();
        let segments: Vec<&str> = request.path.trim_start_matches('/').split('/').collect();
        let id = segments.get(1).and_then(|s| s.parse::<i64>().ok());

        match (request.method, segments.first().copied(), id) {
            (Method::Get, Some("tasks"), Some(id)) => match Self::task_view(&state, id) {
                Some(view) => ApiResponse::new(200, view.to_string()),
                None => ApiResponse::new(404, r#"{"message":"task not found"}"#),
            },
            (Method::Patch, Some("tasks"), Some(id)) => {
                let Some(record) = state.tasks.get_mut(&id) else {
                    return ApiResponse::new(404, "");
                };
                if let Some(body) = &request.body {
                    for key in ["name", "description", "status", "plannedStartDate", "plannedEndDate"] {
                        if let Some(value) = body.get(key) {
                            record[key] = value.clone();
                        }
                    }
                }
                let view = Self::task_view(&state, id).unwrap_or(Value::Null);
                ApiResponse::new(200, view.to_string())
            }
            (Method::Delete, Some("users-tasks"), Some(task)) => {
                let before = state.assignments.len();
                state.assignments.retain(|(t, _)| *t != task);
                if state.assignments.len() < before {
                    ApiResponse::new(204, "")
                } else if state.strict_deletes {
                    ApiResponse::new(500, r#"{"message":"nothing to delete"}"#)
                } else {
                    ApiResponse::new(404, "")
                }
            }
            (Method::Post, Some("users-tasks"), None) => {
                let body = request.body.clone().unwrap_or(Value::Null);
                let user = body["idUser"]["idUser"].as_i64().unwrap_or_default();
                let task = body["idTask"]["tasks"].as_i64().unwrap_or_default();
                if state.failing_assignees.contains(&user) {
                    return ApiResponse::new(500, r#"{"message":"could not assign"}"#);
                }
                state.assignments.push((task, user));
                let name = state.users.get(&user).cloned();
                ApiResponse::new(
                    201,
                    json!({ "idUser": { "idUser": user, "userName": name }, "idTask": { "tasks": task } })
                        .to_string(),
                )
            }
            _ => ApiResponse::new(404, ""),
        }
    }
}

#[async_trait(?Send)]
impl Transport for FakeBackend {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        self.log
            .lock()
            .unwrap()
            .push(format!("{} {}", request.method, request.path));
        Ok(self.handle(&request))
    }
}
