//! Task CLI commands
//!
//! Each command is a thin wrapper over the matching assistant tool, so the
//! terminal and an assistant see the same validation and the same replies.

use anyhow::Result;

use super::output::Output;
use crate::agent::{Toolbox, ToolOutput, UpdateArgs};
use crate::domain::{SystemClock, TaskId, TaskReference};
use crate::storage::{Project, SqliteStore};

/// Opens the current project and runs `f` against its tools
fn with_tools<T>(f: impl FnOnce(&mut Toolbox<'_, SqliteStore>) -> Result<T>) -> Result<T> {
    let project = Project::open_current()?;
    let mut store = project.store()?;
    let clock = SystemClock;
    let mut tools = Toolbox::new(&mut store, &clock).with_policy(project.config().project.ordinal_policy);
    f(&mut tools)
}

fn print(output: &Output, result: &ToolOutput) {
    if output.is_json() {
        output.data(result);
    } else {
        output.success(&result.to_string());
    }
}

pub fn add(
    output: &Output,
    title: &str,
    priority: Option<&str>,
    at: Option<&str>,
    category: Option<&str>,
) -> Result<()> {
    let result = with_tools(|tools| Ok(tools.create_task(title, priority, at, category)?))?;
    print(output, &result);
    Ok(())
}

pub fn list(output: &Output, category: Option<&str>) -> Result<()> {
    let result = with_tools(|tools| Ok(tools.list_tasks(category)?))?;
    print(output, &result);
    Ok(())
}

pub fn search(output: &Output, query: &str) -> Result<()> {
    let result = with_tools(|tools| Ok(tools.search_tasks(query)?))?;
    print(output, &result);
    Ok(())
}

pub fn update(output: &Output, target: &TaskReference, changes: UpdateArgs<'_>) -> Result<()> {
    let result = with_tools(|tools| Ok(tools.update_task(target, changes)?))?;
    print(output, &result);
    Ok(())
}

pub fn delete(output: &Output, target: &TaskReference) -> Result<()> {
    let result = with_tools(|tools| Ok(tools.delete_task(target)?))?;
    print(output, &result);
    Ok(())
}

/// Builds a reference from `--id`, `--match` and `--number`
pub fn reference(id: Option<TaskId>, title: Option<&str>, number: Option<u64>) -> TaskReference {
    TaskReference::from_parts(id.map(TaskId::get), title, number)
}
