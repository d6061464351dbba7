//! Project Resources
//!
//! `/projects`, `/users-projects` and the per-project user listing.

use serde_json::{json, Value};

use super::{require_persisted, ApiClient};
use crate::domain::{ClientError, ClientResult, Project, ProjectId, Role, User, UserId};
use crate::normalize;
use crate::transport::ApiRequest;

/// Editable project fields
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectDraft {
    pub name: String,
    pub description: String,
    /// ISO-8601; `None` means "now"
    pub created_at: Option<String>,
    pub active: bool,
}

impl ProjectDraft {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            created_at: None,
            active: true,
        }
    }

    pub fn validate(&self) -> ClientResult<()> {
        if self.name.trim().is_empty() {
            return Err(ClientError::Invalid("Project name is required".into()));
        }
        Ok(())
    }

    fn body(&self, owner: UserId) -> Value {
        let created = self
            .created_at
            .clone()
            .unwrap_or_else(|| chrono::Utc::now().to_rfc3339());
        json!({
            "idOwnerUser": { "idUser": owner },
            "project": self.name.trim(),
            "description": self.description.trim(),
            "createdDate": created,
            "projectStatus": self.active,
        })
    }

    /// Fill whatever an echo-less write response left blank.
    fn complete(&self, project: &mut Project, owner: UserId) {
        if project.name.is_empty() {
            project.name = self.name.trim().to_string();
        }
        if project.description.is_empty() {
            project.description = self.description.trim().to_string();
        }
        project.owner_id.get_or_insert(owner);
    }
}

impl ApiClient {
    /// Projects visible to `user`. 204/404 mean "owns nothing"; the
    /// endpoint also answers 500 for users without projects.
    pub async fn list_projects_for_user(&self, user: UserId) -> ClientResult<Vec<Project>> {
        let rows = self
            .fetch_list(
                ApiRequest::get(format!("/projects/all-user/{user}")),
                &[204, 404, 500],
            )
            .await?;
        Ok(rows.iter().map(normalize::project).collect())
    }

    pub async fn get_project(&self, id: ProjectId) -> ClientResult<Project> {
        let body = self
            .fetch_json(ApiRequest::get(format!("/projects/{id}")))
            .await?;
        let mut project = normalize::project(&body);
        if normalize::project_id(&body).is_none() {
            project.id = id;
        }
        Ok(project)
    }

    pub async fn create_project(&self, owner: UserId, draft: &ProjectDraft) -> ClientResult<Project> {
        draft.validate()?;
        let body = self
            .fetch_json(ApiRequest::post("/projects", draft.body(owner)))
            .await?;
        let mut project = normalize::project(&body);
        draft.complete(&mut project, owner);
        Ok(project)
    }

    /// PATCH; the owner reference is re-sent from the caller's session.
    pub async fn update_project(
        &self,
        id: ProjectId,
        owner: UserId,
        draft: &ProjectDraft,
    ) -> ClientResult<Project> {
        draft.validate()?;
        require_persisted("project", id.is_provisional())?;
        let body = self
            .fetch_json(ApiRequest::patch(format!("/projects/{id}"), draft.body(owner)))
            .await?;
        let mut project = normalize::project(&body);
        if normalize::project_id(&body).is_none() {
            project.id = id;
        }
        draft.complete(&mut project, owner);
        Ok(project)
    }

    /// Members of a project; 404 means none.
    pub async fn list_users_for_project(&self, project: ProjectId) -> ClientResult<Vec<User>> {
        let rows = self
            .fetch_list(ApiRequest::get(format!("/users/project/{project}")), &[404])
            .await?;
        Ok(rows.iter().filter_map(normalize::user).collect())
    }

    /// Inserts a membership row. Memberships are never updated or removed here.
    pub async fn assign_user_to_project(
        &self,
        user: UserId,
        project: ProjectId,
        role: Role,
    ) -> ClientResult<()> {
        require_persisted("project", project.is_provisional())?;
        let body = json!({
            "idUser": { "idUser": user },
            "projects": { "idProject": project },
            "idRole": { "idRole": role.id() },
        });
        self.fetch_json(ApiRequest::post("/users-projects", body))
            .await?;
        Ok(())
    }
}
