//! Board client commands: `taskboard board`.

use std::sync::Arc;

use anyhow::{Result, bail};
use console::style;
use taskboard::client::{BoardStore, HttpApi, MoveOutcome, Origin, Slot, SyncPolicy};
use taskboard::config::ClientSettings;
use taskboard_common::TaskStatus;

use super::super::BoardCommands;

/// Accepts `todo`, `in-progress`, `done` and the display names.
pub fn parse_status(s: &str) -> Result<TaskStatus, String> {
    let key: String = s
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .collect::<String>()
        .to_lowercase();
    match key.as_str() {
        "todo" => Ok(TaskStatus::ToDo),
        "inprogress" => Ok(TaskStatus::InProgress),
        "done" => Ok(TaskStatus::Done),
        _ => Err(format!(
            "invalid status '{}' (expected todo, in-progress or done)",
            s
        )),
    }
}

pub async fn cmd_board(settings: &ClientSettings, command: BoardCommands) -> Result<()> {
    let api = Arc::new(HttpApi::from_settings(settings)?);
    let policy = if settings.offline {
        SyncPolicy::local_only()
    } else {
        SyncPolicy::remote()
    };
    let mut store = BoardStore::new(api, policy);
    store.load_projects().await?;

    match command {
        BoardCommands::Projects => print_projects(&store),
        BoardCommands::Show { project } => {
            open(&mut store, &project).await?;
            print_board(&store);
        }
        BoardCommands::AddProject { name, description } => {
            let project = store.add_project(&name, &description).await?;
            println!("Created project {} {}", style(&project.name).bold(), project.id);
            print_origin(&store, &project.id);
        }
        BoardCommands::EditProject {
            project,
            name,
            description,
        } => {
            let project = store.edit_project(&project, &name, &description).await?;
            println!("Updated project {} {}", style(&project.name).bold(), project.id);
            print_origin(&store, &project.id);
        }
        BoardCommands::DeleteProject { project } => {
            store.delete_project(&project).await?;
            println!("Deleted project {} and its tasks", project);
        }
        BoardCommands::AddTask {
            project,
            title,
            description,
        } => {
            open(&mut store, &project).await?;
            let task = store.add_task(&title, &description).await?;
            println!("Added task {} {}", style(&task.title).bold(), task.id);
            print_origin(&store, &task.id);
        }
        BoardCommands::EditTask {
            project,
            task,
            title,
            description,
        } => {
            open(&mut store, &project).await?;
            let task = store.edit_task(&task, &title, description.as_deref()).await?;
            println!("Updated task {} {}", style(&task.title).bold(), task.id);
        }
        BoardCommands::Move {
            project,
            task,
            status,
            position,
        } => {
            open(&mut store, &project).await?;
            let Some(source) = store.board().find(&task).map(|(slot, _)| slot) else {
                bail!("Task {} not found on board", task);
            };
            let outcome = store
                .move_task(source, Some(Slot::new(status, position)), &task)
                .await?;
            match outcome {
                MoveOutcome::StatusChanged { from, to } => {
                    println!("Moved {} from {} to {}", task, from, style(to).green())
                }
                MoveOutcome::Reordered => println!("Reordered {} within {}", task, status),
                MoveOutcome::Cancelled | MoveOutcome::Ignored => println!("Nothing to move"),
            }
            print_board(&store);
        }
        BoardCommands::DeleteTask { project, task } => {
            open(&mut store, &project).await?;
            store.delete_task(&task).await?;
            println!("Deleted task {}", task);
        }
        BoardCommands::Summary { project } => {
            open(&mut store, &project).await?;
            println!("{}", store.project_summary().await?);
        }
        BoardCommands::Ask {
            project,
            task,
            question,
        } => {
            open(&mut store, &project).await?;
            println!("{}", store.ask(&task, &question).await?);
        }
    }

    Ok(())
}

async fn open(store: &mut BoardStore, project_id: &str) -> Result<()> {
    if !store.select_project(project_id).await? {
        bail!("Project {} not found", project_id);
    }
    Ok(())
}

fn local_marker(store: &BoardStore, id: &str) -> String {
    if store.origin(id) == Some(Origin::Local) {
        style(" (local)").dim().to_string()
    } else {
        String::new()
    }
}

fn print_origin(store: &BoardStore, id: &str) {
    if store.origin(id) == Some(Origin::Local) {
        println!(
            "{}",
            style("Backend unavailable; change kept locally only.").yellow()
        );
    }
}

fn print_projects(store: &BoardStore) {
    println!();
    println!("{}", style("Projects").bold().underlined());
    if store.projects().is_empty() {
        println!("  (none)");
    }
    for project in store.projects() {
        println!(
            "  {}  {}{}",
            style(&project.id).cyan(),
            project.name,
            local_marker(store, &project.id)
        );
        println!("      {}", style(&project.description).dim());
    }
    println!();
}

fn print_board(store: &BoardStore) {
    let Some(project) = store.selected_project() else {
        return;
    };
    println!();
    println!("{}", style(&project.name).bold().underlined());
    println!("{}", style(&project.description).dim());
    println!();
    println!("{}", store.board().render());
    println!();
    for status in TaskStatus::ALL {
        for task in store.board().bucket(status) {
            println!(
                "  {}  {:<12} {}{}",
                style(&task.id).cyan(),
                status.as_str(),
                task.title,
                local_marker(store, &task.id)
            );
        }
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_status_accepts_aliases() {
        assert_eq!(parse_status("todo").unwrap(), TaskStatus::ToDo);
        assert_eq!(parse_status("To Do").unwrap(), TaskStatus::ToDo);
        assert_eq!(parse_status("in-progress").unwrap(), TaskStatus::InProgress);
        assert_eq!(parse_status("IN_PROGRESS").unwrap(), TaskStatus::InProgress);
        assert_eq!(parse_status("Done").unwrap(), TaskStatus::Done);
        assert!(parse_status("blocked").is_err());
    }
}
