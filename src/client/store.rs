//! Client-side board state with optimistic, fallback-aware sync.
//!
//! `BoardStore` owns the project list, the selected project and its board.
//! Every mutation goes through one `SyncPolicy`: in `Remote` mode the
//! backend is tried first and a transport failure degrades to a local-only
//! change (`Origin::Local`, `local-<uuid>` ids). Rejections from the backend
//! are returned to the caller and leave state untouched.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use taskboard_common::{AskRequest, Project, ProjectInput, Task, TaskInput, TaskStatus, now_timestamp};

use super::api::RemoteApi;
use super::board::{MoveOutcome, Slot, TaskBoard};
use crate::errors::{ClientError, StoreError};

pub const DEMO_PROJECT_ID: &str = "demo-1";
const LOCAL_ID_PREFIX: &str = "local-";

/// Where a record's current state came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Returned by the backend.
    Confirmed,
    /// Created or changed only in this store; the backend has not seen it.
    Local,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncMode {
    #[default]
    Remote,
    LocalOnly,
}

/// The single fallback rule shared by every store operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncPolicy {
    pub mode: SyncMode,
}

impl SyncPolicy {
    pub fn remote() -> Self {
        Self {
            mode: SyncMode::Remote,
        }
    }

    pub fn local_only() -> Self {
        Self {
            mode: SyncMode::LocalOnly,
        }
    }

    /// Run `remote`, or `local` when the backend must not or cannot be used.
    ///
    /// `skip_remote` forces the local path, for records the backend has never
    /// seen. Only transport failures fall back; rejections propagate.
    async fn run<T, R, Fut, L>(
        &self,
        operation: &str,
        skip_remote: bool,
        remote: R,
        local: L,
    ) -> Result<(T, Origin), ClientError>
    where
        R: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
        L: FnOnce() -> T,
    {
        if skip_remote || self.mode == SyncMode::LocalOnly {
            return Ok((local(), Origin::Local));
        }
        match remote().await {
            Ok(value) => Ok((value, Origin::Confirmed)),
            Err(e) if e.is_transport() => {
                tracing::warn!(operation, error = %e, "backend unavailable, applying locally");
                Ok((local(), Origin::Local))
            }
            Err(e) => Err(e),
        }
    }
}

pub fn local_id() -> String {
    format!("{}{}", LOCAL_ID_PREFIX, uuid::Uuid::new_v4())
}

pub fn demo_project() -> Project {
    Project {
        id: DEMO_PROJECT_ID.to_string(),
        name: "Demo Project".to_string(),
        description: "This is a demo project to show how the application works.".to_string(),
        created_at: now_timestamp(),
    }
}

pub struct BoardStore {
    api: Arc<dyn RemoteApi>,
    policy: SyncPolicy,
    projects: Vec<Project>,
    selected: Option<String>,
    board: TaskBoard,
    origins: HashMap<String, Origin>,
}

impl BoardStore {
    pub fn new(api: Arc<dyn RemoteApi>, policy: SyncPolicy) -> Self {
        Self {
            api,
            policy,
            projects: Vec::new(),
            selected: None,
            board: TaskBoard::new(),
            origins: HashMap::new(),
        }
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn board(&self) -> &TaskBoard {
        &self.board
    }

    pub fn selected_project(&self) -> Option<&Project> {
        let id = self.selected.as_deref()?;
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn origin(&self, id: &str) -> Option<Origin> {
        self.origins.get(id).copied()
    }

    /// Ids of records that exist only in this store, sorted.
    pub fn pending_local(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .origins
            .iter()
            .filter(|(_, origin)| **origin == Origin::Local)
            .map(|(id, _)| id.as_str())
            .collect();
        ids.sort_unstable();
        ids
    }

    fn is_local(&self, id: &str) -> bool {
        self.origin(id) == Some(Origin::Local)
    }

    fn selected_id(&self) -> Result<String, StoreError> {
        self.selected.clone().ok_or(StoreError::NoProjectSelected)
    }

    fn task(&self, task_id: &str) -> Result<Task, StoreError> {
        self.board
            .find(task_id)
            .map(|(_, task)| task.clone())
            .ok_or_else(|| StoreError::TaskNotFound { id: task_id.to_string() })
    }

    /// Fetch the project list. An unreachable backend yields the demo project.
    pub async fn load_projects(&mut self) -> Result<&[Project], StoreError> {
        let api = self.api.clone();
        let (projects, origin) = self
            .policy
            .run(
                "load projects",
                false,
                || async move { api.list_projects().await },
                || vec![demo_project()],
            )
            .await?;
        self.origins.clear();
        for project in &projects {
            self.origins.insert(project.id.clone(), origin);
        }
        self.projects = projects;
        self.selected = None;
        self.board = TaskBoard::new();
        Ok(&self.projects)
    }

    /// Select a known project and load its tasks. Returns `false` for an
    /// unknown id.
    pub async fn select_project(&mut self, project_id: &str) -> Result<bool, StoreError> {
        if !self.projects.iter().any(|p| p.id == project_id) {
            return Ok(false);
        }
        let api = self.api.clone();
        let id = project_id.to_string();
        let (tasks, origin) = self
            .policy
            .run(
                "load tasks",
                self.is_local(project_id),
                || async move { api.list_tasks(&id).await },
                Vec::new,
            )
            .await?;
        for task in &tasks {
            self.origins.insert(task.id.clone(), origin);
        }
        self.selected = Some(project_id.to_string());
        self.board = TaskBoard::from_tasks(tasks);
        Ok(true)
    }

    /// Create a project; it becomes the selection with an empty board.
    pub async fn add_project(&mut self, name: &str, description: &str) -> Result<Project, StoreError> {
        let input = ProjectInput {
            name: name.trim().to_string(),
            description: description.trim().to_string(),
        };
        let api = self.api.clone();
        let remote_input = input.clone();
        let (project, origin) = self
            .policy
            .run(
                "create project",
                false,
                || async move { api.create_project(&remote_input).await },
                || Project {
                    id: local_id(),
                    name: input.name,
                    description: input.description,
                    created_at: now_timestamp(),
                },
            )
            .await?;
        tracing::info!(project_id = %project.id, ?origin, "project added");
        self.origins.insert(project.id.clone(), origin);
        self.projects.insert(0, project.clone());
        self.selected = Some(project.id.clone());
        self.board = TaskBoard::new();
        Ok(project)
    }

    /// Rename or re-describe a project, keeping its place in the list.
    pub async fn edit_project(
        &mut self,
        project_id: &str,
        name: &str,
        description: &str,
    ) -> Result<Project, StoreError> {
        let current = self
            .projects
            .iter()
            .find(|p| p.id == project_id)
            .cloned()
            .ok_or_else(|| StoreError::ProjectNotFound {
                id: project_id.to_string(),
            })?;
        let input = ProjectInput {
            name: name.trim().to_string(),
            description: description.trim().to_string(),
        };
        let api = self.api.clone();
        let id = project_id.to_string();
        let remote_input = input.clone();
        let (project, origin) = self
            .policy
            .run(
                "edit project",
                self.is_local(project_id),
                || async move { api.update_project(&id, &remote_input).await },
                || Project {
                    name: input.name,
                    description: input.description,
                    ..current
                },
            )
            .await?;
        self.origins.insert(project.id.clone(), origin);
        if let Some(slot) = self.projects.iter_mut().find(|p| p.id == project.id) {
            *slot = project.clone();
        }
        Ok(project)
    }

    pub async fn delete_project(&mut self, project_id: &str) -> Result<(), StoreError> {
        if !self.projects.iter().any(|p| p.id == project_id) {
            return Err(StoreError::ProjectNotFound {
                id: project_id.to_string(),
            });
        }
        let api = self.api.clone();
        let id = project_id.to_string();
        self.policy
            .run(
                "delete project",
                self.is_local(project_id),
                || async move { api.delete_project(&id).await },
                || (),
            )
            .await?;
        self.projects.retain(|p| p.id != project_id);
        self.origins.remove(project_id);
        if self.selected.as_deref() == Some(project_id) {
            for status in TaskStatus::ALL {
                for task in self.board.bucket(status) {
                    self.origins.remove(&task.id);
                }
            }
            self.selected = None;
            self.board = TaskBoard::new();
        }
        Ok(())
    }

    /// Add a `To Do` task to the selected project.
    pub async fn add_task(&mut self, title: &str, description: &str) -> Result<Task, StoreError> {
        let project_id = self.selected_id()?;
        let input = TaskInput {
            title: title.trim().to_string(),
            description: Some(description.trim().to_string()),
            project: project_id.clone(),
            status: Some(TaskStatus::ToDo),
        };
        let api = self.api.clone();
        let remote_input = input.clone();
        let (task, origin) = self
            .policy
            .run(
                "create task",
                self.is_local(&project_id),
                || async move { api.create_task(&remote_input).await },
                || Task {
                    id: local_id(),
                    title: input.title,
                    description: input.description.unwrap_or_default(),
                    status: TaskStatus::ToDo,
                    project: input.project,
                    created_at: now_timestamp(),
                    deleted_at: None,
                },
            )
            .await?;
        self.origins.insert(task.id.clone(), origin);
        self.board.push(task.clone());
        Ok(task)
    }

    /// Change a task's title. A `None` description keeps the stored one.
    pub async fn edit_task(
        &mut self,
        task_id: &str,
        title: &str,
        description: Option<&str>,
    ) -> Result<Task, StoreError> {
        let current = self.task(task_id)?;
        let input = TaskInput {
            title: title.trim().to_string(),
            description: description.map(|d| d.trim().to_string()),
            project: current.project.clone(),
            status: None,
        };
        let api = self.api.clone();
        let id = task_id.to_string();
        let remote_input = input.clone();
        let (task, origin) = self
            .policy
            .run(
                "edit task",
                self.is_local(task_id),
                || async move { api.update_task(&id, &remote_input).await },
                || Task {
                    title: input.title,
                    description: input.description.unwrap_or_else(|| current.description.clone()),
                    ..current
                },
            )
            .await?;
        self.origins.insert(task.id.clone(), origin);
        self.board.replace(task.clone());
        Ok(task)
    }

    pub async fn delete_task(&mut self, task_id: &str) -> Result<(), StoreError> {
        self.task(task_id)?;
        let api = self.api.clone();
        let id = task_id.to_string();
        self.policy
            .run(
                "delete task",
                self.is_local(task_id),
                || async move { api.delete_task(&id).await },
                || (),
            )
            .await?;
        self.board.remove(task_id);
        self.origins.remove(task_id);
        Ok(())
    }

    /// Move a task on the board, then persist a status change.
    ///
    /// The board changes first. A rejected status update rolls the move
    /// back; a transport failure keeps it.
    pub async fn move_task(
        &mut self,
        source: Slot,
        destination: Option<Slot>,
        task_id: &str,
    ) -> Result<MoveOutcome, StoreError> {
        let snapshot = self.board.clone();
        let outcome = self.board.apply_move(source, destination, task_id);
        let MoveOutcome::StatusChanged { to, .. } = outcome else {
            return Ok(outcome);
        };

        let api = self.api.clone();
        let id = task_id.to_string();
        let result = self
            .policy
            .run(
                "move task",
                self.is_local(task_id),
                || async move { api.update_task_status(&id, to).await.map(Some) },
                || None,
            )
            .await;
        match result {
            Ok((Some(task), origin)) => {
                self.origins.insert(task.id.clone(), origin);
                self.board.replace(task);
            }
            Ok((None, origin)) => {
                self.origins.insert(task_id.to_string(), origin);
            }
            Err(e) => {
                self.board = snapshot;
                return Err(e.into());
            }
        }
        tracing::info!(task_id, status = %to, "task moved");
        Ok(outcome)
    }

    /// Summary of the selected project; computed locally when the backend
    /// is unavailable.
    pub async fn project_summary(&self) -> Result<String, StoreError> {
        let project = self
            .selected_project()
            .cloned()
            .ok_or(StoreError::NoProjectSelected)?;
        let api = self.api.clone();
        let id = project.id.clone();
        let (summary, _) = self
            .policy
            .run(
                "project summary",
                self.is_local(&project.id),
                || async move { api.project_summary(&id).await },
                || offline_summary(&project, &self.board),
            )
            .await?;
        Ok(summary)
    }

    /// Ask about a task on the board.
    pub async fn ask(&self, task_id: &str, question: &str) -> Result<String, StoreError> {
        let task = self.task(task_id)?;
        let request = AskRequest {
            question: question.to_string(),
            task_id: task_id.to_string(),
            context_type: "task".to_string(),
        };
        let api = self.api.clone();
        let (answer, _) = self
            .policy
            .run(
                "ask",
                self.is_local(task_id),
                || async move { api.ask(&request).await },
                || offline_answer(question, &task),
            )
            .await?;
        Ok(answer)
    }
}

/// Board statistics standing in for the AI summary.
pub fn offline_summary(project: &Project, board: &TaskBoard) -> String {
    let [todo, in_progress, done] = board.counts();
    let total = board.len();
    let progress = if total > 0 { done * 100 / total } else { 0 };
    let status = if total == 0 {
        "No tasks created yet - consider adding your first task"
    } else if done == total {
        "All tasks completed - great job!"
    } else if in_progress > 0 {
        "Active development in progress"
    } else {
        "Ready to start - tasks are planned and ready to begin"
    };
    format!(
        "Project Summary (Offline)\n\n\
         Project: {}\n\
         Description: {}\n\n\
         Task Overview:\n\
         - Total Tasks: {}\n\
         - To Do: {}\n\
         - In Progress: {}\n\
         - Completed: {}\n\
         - Progress: {}% complete\n\n\
         Project Status: {}\n\n\
         AI insights require a running backend with GEMINI_API_KEY set.",
        project.name, project.description, total, todo, in_progress, done, progress, status,
    )
}

pub fn offline_answer(question: &str, task: &Task) -> String {
    format!(
        "AI Assistant (Offline)\n\n\
         Question: \"{}\"\n\
         Task: \"{}\"\n\n\
         The backend AI service is not available. General suggestions:\n\
         - Review task requirements and resources\n\
         - Break down complex tasks into smaller steps\n\
         - Set realistic deadlines and milestones",
        question, task.title,
    )
}
