use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row, params};
use taskboard_common::{Project, ProjectInput, Task, TaskInput, TaskStatus, new_object_id, now_timestamp};

/// Async-safe handle to the taskboard database.
///
/// Wraps `TaskboardDb` behind `Arc<Mutex>` and runs all access on tokio's
/// blocking thread pool via `spawn_blocking`, preventing synchronous SQLite
/// I/O from tying up async worker threads.
#[derive(Clone)]
pub struct DbHandle {
    inner: Arc<std::sync::Mutex<TaskboardDb>>,
}

impl DbHandle {
    pub fn new(db: TaskboardDb) -> Self {
        Self {
            inner: Arc::new(std::sync::Mutex::new(db)),
        }
    }

    /// Run a closure with access to the database on a blocking thread.
    /// All data passed into `f` must be owned (`'static`).
    pub async fn call<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&TaskboardDb) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let db = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = db.lock().map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
            f(&guard)
        })
        .await
        .context("DB task panicked")?
    }
}

pub struct TaskboardDb {
    conn: Connection,
}

const PROJECT_COLUMNS: &str = "id, name, description, created_at";
const TASK_COLUMNS: &str = "id, title, description, status, project_id, created_at, deleted_at";

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: row.get(3)?,
    })
}

/// Raw task row; `status` is parsed after the row is read.
struct TaskRow {
    id: String,
    title: String,
    description: String,
    status: String,
    project: String,
    created_at: String,
    deleted_at: Option<String>,
}

impl TaskRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            status: row.get(3)?,
            project: row.get(4)?,
            created_at: row.get(5)?,
            deleted_at: row.get(6)?,
        })
    }

    fn into_task(self) -> Result<Task> {
        let status = TaskStatus::from_str(&self.status).map_err(|e| anyhow::anyhow!(e))?;
        Ok(Task {
            id: self.id,
            title: self.title,
            description: self.description,
            status,
            project: self.project,
            created_at: self.created_at,
            deleted_at: self.deleted_at,
        })
    }
}

impl TaskboardDb {
    /// Open (or create) a SQLite database at the given path and run migrations.
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).context("Failed to open SQLite database")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Create an in-memory SQLite database (for testing).
    pub fn new_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> Result<()> {
        self.conn
            .execute_batch("PRAGMA foreign_keys = ON;")
            .context("Failed to enable foreign keys")?;
        self.run_migrations().context("Failed to run migrations")?;
        Ok(())
    }

    // Tasks reference projects without a foreign key; `delete_project`
    // removes dependents itself.
    fn run_migrations(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS projects (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    description TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS tasks (
                    id TEXT PRIMARY KEY,
                    project_id TEXT NOT NULL,
                    title TEXT NOT NULL,
                    description TEXT NOT NULL DEFAULT '',
                    status TEXT NOT NULL DEFAULT 'To Do',
                    created_at TEXT NOT NULL,
                    deleted_at TEXT
                );

                CREATE INDEX IF NOT EXISTS idx_projects_name ON projects(name);
                CREATE INDEX IF NOT EXISTS idx_tasks_project_status ON tasks(project_id, status);
                CREATE INDEX IF NOT EXISTS idx_tasks_deleted ON tasks(deleted_at);
                ",
            )
            .context("Failed to create tables")?;
        Ok(())
    }

    // ── Project CRUD ──────────────────────────────────────────────────

    pub fn create_project(&self, input: &ProjectInput) -> Result<Project> {
        let id = new_object_id();
        self.conn
            .execute(
                "INSERT INTO projects (id, name, description, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![id, input.name, input.description, now_timestamp()],
            )
            .context("Failed to insert project")?;
        self.get_project(&id)?
            .context("Project not found after insert")
    }

    /// All projects, newest first.
    pub fn list_projects(&self) -> Result<Vec<Project>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM projects ORDER BY created_at DESC, rowid DESC",
                PROJECT_COLUMNS
            ))
            .context("Failed to prepare list_projects")?;
        let rows = stmt
            .query_map([], project_from_row)
            .context("Failed to query projects")?;
        let mut projects = Vec::new();
        for row in rows {
            projects.push(row.context("Failed to read project row")?);
        }
        Ok(projects)
    }

    pub fn get_project(&self, id: &str) -> Result<Option<Project>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM projects WHERE id = ?1", PROJECT_COLUMNS),
                params![id],
                project_from_row,
            )
            .optional()
            .context("Failed to query project")
    }

    /// Returns `None` when no project has the given id.
    pub fn update_project(&self, id: &str, input: &ProjectInput) -> Result<Option<Project>> {
        let count = self
            .conn
            .execute(
                "UPDATE projects SET name = ?1, description = ?2 WHERE id = ?3",
                params![input.name, input.description, id],
            )
            .context("Failed to update project")?;
        if count == 0 {
            return Ok(None);
        }
        self.get_project(id)
    }

    /// Delete a project and every task that references it, live or
    /// soft-deleted. Both deletes commit together. Returns `false` when the
    /// project does not exist.
    pub fn delete_project(&self, id: &str) -> Result<bool> {
        // DbHandle's Mutex serializes access to the connection.
        let tx = self
            .conn
            .unchecked_transaction()
            .context("Failed to begin transaction")?;

        let exists: bool = tx
            .query_row(
                "SELECT COUNT(*) > 0 FROM projects WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .context("Failed to check project")?;
        if !exists {
            return Ok(false);
        }

        tx.execute("DELETE FROM tasks WHERE project_id = ?1", params![id])
            .context("Failed to delete project tasks")?;
        tx.execute("DELETE FROM projects WHERE id = ?1", params![id])
            .context("Failed to delete project")?;
        tx.commit().context("Failed to commit project delete")?;
        Ok(true)
    }

    // ── Task CRUD ─────────────────────────────────────────────────────

    pub fn create_task(&self, input: &TaskInput) -> Result<Task> {
        let id = new_object_id();
        let status = input.status.unwrap_or_default();
        self.conn
            .execute(
                "INSERT INTO tasks (id, project_id, title, description, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    id,
                    input.project,
                    input.title,
                    input.description.as_deref().unwrap_or_default(),
                    status.as_str(),
                    now_timestamp()
                ],
            )
            .context("Failed to insert task")?;
        self.get_task(&id)?.context("Task not found after insert")
    }

    /// Live tasks of a project, newest first.
    pub fn list_tasks(&self, project_id: &str) -> Result<Vec<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM tasks
                 WHERE project_id = ?1 AND deleted_at IS NULL
                 ORDER BY created_at DESC, rowid DESC",
                TASK_COLUMNS
            ))
            .context("Failed to prepare list_tasks")?;
        let rows = stmt
            .query_map(params![project_id], TaskRow::from_row)
            .context("Failed to query tasks")?;
        let mut tasks = Vec::new();
        for row in rows {
            let r = row.context("Failed to read task row")?;
            tasks.push(r.into_task()?);
        }
        Ok(tasks)
    }

    /// A live task by id; soft-deleted tasks are invisible.
    pub fn get_task(&self, id: &str) -> Result<Option<Task>> {
        let row = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM tasks WHERE id = ?1 AND deleted_at IS NULL",
                    TASK_COLUMNS
                ),
                params![id],
                TaskRow::from_row,
            )
            .optional()
            .context("Failed to query task")?;
        row.map(TaskRow::into_task).transpose()
    }

    /// Update title, description and owning project of a live task. An
    /// absent description keeps the stored one; status is never touched here.
    pub fn update_task(&self, id: &str, input: &TaskInput) -> Result<Option<Task>> {
        let count = self
            .conn
            .execute(
                "UPDATE tasks
                 SET title = ?1, description = COALESCE(?2, description), project_id = ?3
                 WHERE id = ?4 AND deleted_at IS NULL",
                params![input.title, input.description, input.project, id],
            )
            .context("Failed to update task")?;
        if count == 0 {
            return Ok(None);
        }
        self.get_task(id)
    }

    pub fn update_task_status(&self, id: &str, status: TaskStatus) -> Result<Option<Task>> {
        let count = self
            .conn
            .execute(
                "UPDATE tasks SET status = ?1 WHERE id = ?2 AND deleted_at IS NULL",
                params![status.as_str(), id],
            )
            .context("Failed to update task status")?;
        if count == 0 {
            return Ok(None);
        }
        self.get_task(id)
    }

    /// Stamp `deleted_at` on a live task. Returns `false` when the task is
    /// missing or already deleted.
    pub fn soft_delete_task(&self, id: &str) -> Result<bool> {
        let count = self
            .conn
            .execute(
                "UPDATE tasks SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
                params![now_timestamp(), id],
            )
            .context("Failed to soft-delete task")?;
        Ok(count > 0)
    }

    /// Count every stored task of a project, including soft-deleted ones.
    pub fn count_all_tasks(&self, project_id: &str) -> Result<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM tasks WHERE project_id = ?1",
                params![project_id],
                |row| row.get(0),
            )
            .context("Failed to count tasks")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project_input(name: &str) -> ProjectInput {
        ProjectInput {
            name: name.to_string(),
            description: "A project used in tests".to_string(),
        }
    }

    fn task_input(project: &str, title: &str) -> TaskInput {
        TaskInput {
            title: title.to_string(),
            description: Some(String::new()),
            project: project.to_string(),
            status: None,
        }
    }

    #[test]
    fn test_create_and_get_project() {
        let db = TaskboardDb::new_in_memory().unwrap();
        let project = db.create_project(&project_input("Alpha Launch")).unwrap();
        assert_eq!(project.id.len(), 24);
        assert_eq!(project.name, "Alpha Launch");

        let fetched = db.get_project(&project.id).unwrap().unwrap();
        assert_eq!(fetched, project);
        assert!(db.get_project("0123456789abcdef01234567").unwrap().is_none());
    }

    #[test]
    fn test_list_projects_newest_first() {
        let db = TaskboardDb::new_in_memory().unwrap();
        let first = db.create_project(&project_input("First")).unwrap();
        let second = db.create_project(&project_input("Second")).unwrap();
        let ids: Vec<String> = db.list_projects().unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[test]
    fn test_update_project() {
        let db = TaskboardDb::new_in_memory().unwrap();
        let project = db.create_project(&project_input("Before")).unwrap();
        let updated = db
            .update_project(
                &project.id,
                &ProjectInput {
                    name: "After".into(),
                    description: "Updated description".into(),
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "After");
        assert_eq!(updated.created_at, project.created_at);
        assert!(
            db.update_project("missing", &project_input("Nope"))
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_create_task_defaults_to_todo() {
        let db = TaskboardDb::new_in_memory().unwrap();
        let project = db.create_project(&project_input("Tasks")).unwrap();
        let task = db.create_task(&task_input(&project.id, "Draft brief")).unwrap();
        assert_eq!(task.status, TaskStatus::ToDo);
        assert_eq!(task.project, project.id);
        assert_eq!(task.description, "");
        assert!(task.deleted_at.is_none());
    }

    #[test]
    fn test_create_task_with_explicit_status() {
        let db = TaskboardDb::new_in_memory().unwrap();
        let project = db.create_project(&project_input("Tasks")).unwrap();
        let mut input = task_input(&project.id, "Already going");
        input.status = Some(TaskStatus::InProgress);
        let task = db.create_task(&input).unwrap();
        assert_eq!(task.status, TaskStatus::InProgress);
    }

    #[test]
    fn test_list_tasks_excludes_soft_deleted() {
        let db = TaskboardDb::new_in_memory().unwrap();
        let project = db.create_project(&project_input("Tasks")).unwrap();
        let keep = db.create_task(&task_input(&project.id, "Keep me")).unwrap();
        let gone = db.create_task(&task_input(&project.id, "Delete me")).unwrap();

        assert!(db.soft_delete_task(&gone.id).unwrap());
        let tasks = db.list_tasks(&project.id).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, keep.id);
        assert!(db.get_task(&gone.id).unwrap().is_none());
        // Still stored.
        assert_eq!(db.count_all_tasks(&project.id).unwrap(), 2);
    }

    #[test]
    fn test_soft_delete_twice_reports_missing() {
        let db = TaskboardDb::new_in_memory().unwrap();
        let project = db.create_project(&project_input("Tasks")).unwrap();
        let task = db.create_task(&task_input(&project.id, "Once only")).unwrap();
        assert!(db.soft_delete_task(&task.id).unwrap());
        assert!(!db.soft_delete_task(&task.id).unwrap());
    }

    #[test]
    fn test_list_tasks_newest_first() {
        let db = TaskboardDb::new_in_memory().unwrap();
        let project = db.create_project(&project_input("Tasks")).unwrap();
        let a = db.create_task(&task_input(&project.id, "Older")).unwrap();
        let b = db.create_task(&task_input(&project.id, "Newer")).unwrap();
        let ids: Vec<String> = db
            .list_tasks(&project.id)
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }

    #[test]
    fn test_update_task_status_only_changes_status() {
        let db = TaskboardDb::new_in_memory().unwrap();
        let project = db.create_project(&project_input("Tasks")).unwrap();
        let task = db.create_task(&task_input(&project.id, "Move me")).unwrap();
        let moved = db
            .update_task_status(&task.id, TaskStatus::Done)
            .unwrap()
            .unwrap();
        assert_eq!(moved.status, TaskStatus::Done);
        assert_eq!(moved.title, task.title);
        assert_eq!(moved.description, task.description);
        assert_eq!(moved.project, task.project);
        assert_eq!(moved.created_at, task.created_at);
    }

    #[test]
    fn test_update_task_keeps_description_when_absent() {
        let db = TaskboardDb::new_in_memory().unwrap();
        let project = db.create_project(&project_input("Tasks")).unwrap();
        let mut input = task_input(&project.id, "Original");
        input.description = Some("Original details".into());
        let task = db.create_task(&input).unwrap();

        let update = TaskInput {
            title: "Renamed".into(),
            description: None,
            project: project.id.clone(),
            status: Some(TaskStatus::Done),
        };
        let updated = db.update_task(&task.id, &update).unwrap().unwrap();
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.description, "Original details");
        assert_eq!(updated.status, TaskStatus::ToDo);
    }

    #[test]
    fn test_updates_skip_deleted_tasks() {
        let db = TaskboardDb::new_in_memory().unwrap();
        let project = db.create_project(&project_input("Tasks")).unwrap();
        let task = db.create_task(&task_input(&project.id, "Deleted")).unwrap();
        db.soft_delete_task(&task.id).unwrap();
        assert!(
            db.update_task_status(&task.id, TaskStatus::Done)
                .unwrap()
                .is_none()
        );
        assert!(
            db.update_task(&task.id, &task_input(&project.id, "Revived"))
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_delete_project_cascades_to_all_tasks() {
        let db = TaskboardDb::new_in_memory().unwrap();
        let project = db.create_project(&project_input("Doomed")).unwrap();
        let other = db.create_project(&project_input("Survivor")).unwrap();
        let live = db.create_task(&task_input(&project.id, "Live task")).unwrap();
        let dead = db.create_task(&task_input(&project.id, "Dead task")).unwrap();
        db.soft_delete_task(&dead.id).unwrap();
        let unrelated = db.create_task(&task_input(&other.id, "Other task")).unwrap();

        assert!(db.delete_project(&project.id).unwrap());
        assert!(db.get_project(&project.id).unwrap().is_none());
        assert!(db.get_task(&live.id).unwrap().is_none());
        assert_eq!(db.count_all_tasks(&project.id).unwrap(), 0);
        assert!(db.get_task(&unrelated.id).unwrap().is_some());
    }

    #[test]
    fn test_delete_missing_project() {
        let db = TaskboardDb::new_in_memory().unwrap();
        assert!(!db.delete_project("0123456789abcdef01234567").unwrap());
    }

    #[test]
    fn test_file_backed_db_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taskboard.db");
        let id = {
            let db = TaskboardDb::new(&path).unwrap();
            db.create_project(&project_input("Durable")).unwrap().id
        };
        let reopened = TaskboardDb::new(&path).unwrap();
        assert_eq!(reopened.get_project(&id).unwrap().unwrap().name, "Durable");
    }

    #[tokio::test]
    async fn test_handle_runs_on_blocking_pool() {
        let handle = DbHandle::new(TaskboardDb::new_in_memory().unwrap());
        let project = handle
            .call(|db| db.create_project(&project_input("Async")))
            .await
            .unwrap();
        let listed = handle.call(|db| db.list_projects()).await.unwrap();
        assert_eq!(listed, vec![project]);
    }
}
