//! Three-bucket task board and its move semantics.
//!
//! Order inside a bucket is display order only. Reloading from the backend
//! re-derives it from the newest-first listing.

use console::{Alignment, pad_str};
use taskboard_common::{Task, TaskStatus};

const COLUMN_WIDTH: usize = 30;

/// A position on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub status: TaskStatus,
    pub index: usize,
}

impl Slot {
    pub fn new(status: TaskStatus, index: usize) -> Self {
        Self { status, index }
    }
}

/// Result of `TaskBoard::apply_move`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Dropped outside any bucket.
    Cancelled,
    /// Source slot empty, out of range, or holding a different task.
    Ignored,
    Reordered,
    StatusChanged { from: TaskStatus, to: TaskStatus },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskBoard {
    buckets: [Vec<Task>; 3],
}

impl TaskBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group tasks by status, keeping input order within each bucket.
    pub fn from_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let mut board = Self::new();
        for task in tasks {
            board.push(task);
        }
        board
    }

    pub fn bucket(&self, status: TaskStatus) -> &[Task] {
        &self.buckets[status.index()]
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(Vec::is_empty)
    }

    /// Per-bucket counts in `TaskStatus::ALL` order.
    pub fn counts(&self) -> [usize; 3] {
        [
            self.buckets[0].len(),
            self.buckets[1].len(),
            self.buckets[2].len(),
        ]
    }

    pub fn find(&self, task_id: &str) -> Option<(Slot, &Task)> {
        TaskStatus::ALL.iter().find_map(|&status| {
            self.bucket(status)
                .iter()
                .position(|t| t.id == task_id)
                .map(|index| (Slot::new(status, index), &self.bucket(status)[index]))
        })
    }

    pub fn push(&mut self, task: Task) {
        self.buckets[task.status.index()].push(task);
    }

    pub fn remove(&mut self, task_id: &str) -> Option<Task> {
        let (slot, _) = self.find(task_id)?;
        Some(self.buckets[slot.status.index()].remove(slot.index))
    }

    /// Swap in new content for a task, keeping its slot. The stored status
    /// wins over the incoming one so a reconciled task never jumps buckets.
    pub fn replace(&mut self, task: Task) -> bool {
        let Some((slot, _)) = self.find(&task.id) else {
            return false;
        };
        let bucket = &mut self.buckets[slot.status.index()];
        bucket[slot.index] = Task {
            status: slot.status,
            ..task
        };
        true
    }

    pub fn apply_move(&mut self, source: Slot, destination: Option<Slot>, task_id: &str) -> MoveOutcome {
        let Some(destination) = destination else {
            return MoveOutcome::Cancelled;
        };
        let from = &self.buckets[source.status.index()];
        match from.get(source.index) {
            Some(task) if task.id == task_id => {}
            _ => return MoveOutcome::Ignored,
        }

        let mut task = self.buckets[source.status.index()].remove(source.index);
        let to = &mut self.buckets[destination.status.index()];
        let index = destination.index.min(to.len());

        if source.status == destination.status {
            to.insert(index, task);
            MoveOutcome::Reordered
        } else {
            task.status = destination.status;
            to.insert(index, task);
            MoveOutcome::StatusChanged {
                from: source.status,
                to: destination.status,
            }
        }
    }

    /// Plain-text three-column view with per-column counts.
    pub fn render(&self) -> String {
        let mut lines = Vec::new();
        let header: Vec<String> = TaskStatus::ALL
            .iter()
            .map(|&s| format!("{} ({})", s, self.bucket(s).len()))
            .collect();
        lines.push(row(&header));
        lines.push(row(&vec!["-".repeat(COLUMN_WIDTH - 2); 3]));

        let depth = self.buckets.iter().map(Vec::len).max().unwrap_or(0);
        for i in 0..depth {
            let cells: Vec<String> = self
                .buckets
                .iter()
                .map(|b| b.get(i).map(|t| t.title.clone()).unwrap_or_default())
                .collect();
            lines.push(row(&cells));
        }
        if depth == 0 {
            lines.push(row(&["(empty)".to_string(), String::new(), String::new()]));
        }
        lines.join("\n")
    }
}

fn row(cells: &[String]) -> String {
    cells
        .iter()
        .map(|c| pad_str(c, COLUMN_WIDTH, Alignment::Left, Some("…")).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, status: TaskStatus) -> Task {
        Task {
            id: id.into(),
            title: format!("Task {}", id),
            description: String::new(),
            status,
            project: "p".repeat(24),
            created_at: "2026-01-01T00:00:00.000Z".into(),
            deleted_at: None,
        }
    }

    fn ids(board: &TaskBoard, status: TaskStatus) -> Vec<&str> {
        board.bucket(status).iter().map(|t| t.id.as_str()).collect()
    }

    fn sample() -> TaskBoard {
        TaskBoard::from_tasks(vec![
            task("a", TaskStatus::ToDo),
            task("b", TaskStatus::Done),
            task("c", TaskStatus::ToDo),
            task("d", TaskStatus::ToDo),
        ])
    }

    #[test]
    fn from_tasks_groups_and_keeps_order() {
        let board = sample();
        assert_eq!(ids(&board, TaskStatus::ToDo), vec!["a", "c", "d"]);
        assert!(board.bucket(TaskStatus::InProgress).is_empty());
        assert_eq!(ids(&board, TaskStatus::Done), vec!["b"]);
        assert_eq!(board.counts(), [3, 0, 1]);
        assert_eq!(board.len(), 4);
        assert!(TaskBoard::new().is_empty());
    }

    #[test]
    fn same_bucket_move_reorders_only() {
        let mut board = sample();
        let outcome = board.apply_move(
            Slot::new(TaskStatus::ToDo, 0),
            Some(Slot::new(TaskStatus::ToDo, 2)),
            "a",
        );
        assert_eq!(outcome, MoveOutcome::Reordered);
        assert_eq!(ids(&board, TaskStatus::ToDo), vec!["c", "d", "a"]);
        assert_eq!(board.find("a").unwrap().1.status, TaskStatus::ToDo);
    }

    #[test]
    fn cross_bucket_move_changes_status() {
        let mut board = sample();
        let outcome = board.apply_move(
            Slot::new(TaskStatus::ToDo, 1),
            Some(Slot::new(TaskStatus::Done, 0)),
            "c",
        );
        assert_eq!(
            outcome,
            MoveOutcome::StatusChanged {
                from: TaskStatus::ToDo,
                to: TaskStatus::Done
            }
        );
        assert_eq!(ids(&board, TaskStatus::ToDo), vec!["a", "d"]);
        assert_eq!(ids(&board, TaskStatus::Done), vec!["c", "b"]);
        assert_eq!(board.find("c").unwrap().1.status, TaskStatus::Done);
    }

    #[test]
    fn destination_index_is_clamped() {
        let mut board = sample();
        board.apply_move(
            Slot::new(TaskStatus::ToDo, 0),
            Some(Slot::new(TaskStatus::InProgress, 99)),
            "a",
        );
        assert_eq!(ids(&board, TaskStatus::InProgress), vec!["a"]);
    }

    #[test]
    fn missing_destination_cancels() {
        let mut board = sample();
        let before = board.clone();
        let outcome = board.apply_move(Slot::new(TaskStatus::ToDo, 0), None, "a");
        assert_eq!(outcome, MoveOutcome::Cancelled);
        assert_eq!(board, before);
    }

    #[test]
    fn bad_source_is_ignored() {
        let mut board = sample();
        let before = board.clone();
        let dest = Some(Slot::new(TaskStatus::Done, 0));

        assert_eq!(
            board.apply_move(Slot::new(TaskStatus::InProgress, 0), dest, "a"),
            MoveOutcome::Ignored
        );
        assert_eq!(
            board.apply_move(Slot::new(TaskStatus::ToDo, 7), dest, "a"),
            MoveOutcome::Ignored
        );
        assert_eq!(
            board.apply_move(Slot::new(TaskStatus::ToDo, 1), dest, "a"),
            MoveOutcome::Ignored
        );
        assert_eq!(board, before);
    }

    #[test]
    fn remove_and_replace() {
        let mut board = sample();
        let removed = board.remove("c").unwrap();
        assert_eq!(removed.id, "c");
        assert!(board.remove("c").is_none());

        let mut updated = task("d", TaskStatus::Done);
        updated.title = "Renamed".into();
        assert!(board.replace(updated));
        let (slot, found) = board.find("d").unwrap();
        assert_eq!(slot, Slot::new(TaskStatus::ToDo, 1));
        assert_eq!(found.title, "Renamed");
        assert!(!board.replace(task("zzz", TaskStatus::ToDo)));
    }

    #[test]
    fn render_shows_counts_and_titles() {
        let text = sample().render();
        let first = text.lines().next().unwrap();
        assert!(first.contains("To Do (3)"));
        assert!(first.contains("In Progress (0)"));
        assert!(first.contains("Done (1)"));
        assert!(text.contains("Task a"));
        assert!(TaskBoard::new().render().contains("(empty)"));
    }
}
