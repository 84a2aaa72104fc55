use anyhow::{Context, anyhow, bail};
use chrono::Utc;
use chrono_tz::Tz;
use taskdeck_shared::dashboard::{Dashboard, DashboardClock, TimeWindow};
use taskdeck_shared::forms::{SubtaskDraft, TaskDraft};
use taskdeck_shared::pages::PageContext;
use taskdeck_shared::task::TaskStatus;
use tracing::{debug, info, instrument};

use crate::api::TaskBackend;
use crate::cli::{Command, SubCommand};
use crate::config::Config;
use crate::manager::TaskManager;
use crate::render::Renderer;

/// Everything a command needs besides
/// the backend.
pub struct CommandContext<'a> {
    pub cfg: &'a Config,
    pub renderer: &'a Renderer,
    pub page: &'a PageContext,
    pub tz: Tz,
}

#[instrument(skip(manager, ctx, command))]
pub fn dispatch<B: TaskBackend>(
    manager: &mut TaskManager<B>,
    ctx: &CommandContext<'_>,
    command: Command,
) -> anyhow::Result<()> {
    debug!(?command, page = %ctx.page.page_name, "dispatching command");

    match command {
        Command::List => cmd_list(manager, ctx),
        Command::Add {
            name,
            description,
            subtasks,
        } => cmd_add(manager, ctx, name, description, subtasks),
        Command::Start { id } => cmd_start(manager, ctx, id),
        Command::Done { id } => cmd_done(manager, ctx, id),
        Command::Delete { id } => cmd_delete(manager, ctx, id),
        Command::Sub { action } => cmd_sub(manager, ctx, action),
        Command::Dashboard { window } => cmd_dashboard(manager, ctx, window),
        Command::Summary => cmd_summary(manager, ctx),
        Command::Pages => ctx.renderer.print_pages(),
        Command::Config => ctx.renderer.print_config(ctx.cfg),
    }
}

/// Turns an error recorded in the store
/// into a command failure.
fn check<B: TaskBackend>(manager: &TaskManager<B>) -> anyhow::Result<()> {
    match manager.error() {
        Some(message) => Err(anyhow!("{message}")),
        None => Ok(()),
    }
}

fn show_page<B: TaskBackend>(manager: &TaskManager<B>, ctx: &CommandContext<'_>) -> anyhow::Result<()> {
    ctx.renderer.print_page(ctx.page, manager.store(), Utc::now())
}

#[instrument(skip(manager, ctx))]
fn cmd_list<B: TaskBackend>(manager: &mut TaskManager<B>, ctx: &CommandContext<'_>) -> anyhow::Result<()> {
    manager.fetch_tasks();
    show_page(manager, ctx)?;
    check(manager)
}

#[instrument(skip(manager, ctx, description, subtasks))]
fn cmd_add<B: TaskBackend>(
    manager: &mut TaskManager<B>,
    ctx: &CommandContext<'_>,
    name: String,
    description: Option<String>,
    subtasks: Vec<String>,
) -> anyhow::Result<()> {
    let mut draft = TaskDraft::new(name, description.unwrap_or_default());
    for raw in &subtasks {
        draft.pending = SubtaskDraft::from_spec(raw);
        draft
            .add_subtask()
            .with_context(|| format!("invalid --sub value '{raw}'"))?;
    }
    let payload = draft.to_payload()?;

    let task = manager.create_task(&payload).context("Failed to create task")?;
    info!(task_id = task.id, "command add");
    println!("Created task {} ({}).", task.id, task.name);
    show_page(manager, ctx)?;
    check(manager)
}

fn require_loaded<B: TaskBackend>(manager: &mut TaskManager<B>, id: u64) -> anyhow::Result<TaskStatus> {
    manager.fetch_tasks();
    check(manager)?;
    manager
        .store()
        .task(id)
        .map(|task| task.status)
        .ok_or_else(|| anyhow!("no task {id} on page {}", manager.page_name()))
}

#[instrument(skip(manager, ctx))]
fn cmd_start<B: TaskBackend>(manager: &mut TaskManager<B>, ctx: &CommandContext<'_>, id: u64) -> anyhow::Result<()> {
    let status = require_loaded(manager, id)?;
    if !status.can_start() {
        bail!("task {id} is {status}; only pending tasks can be started");
    }
    manager.start_task(id);
    check(manager)?;
    println!("Started task {id}.");
    show_page(manager, ctx)
}

#[instrument(skip(manager, ctx))]
fn cmd_done<B: TaskBackend>(manager: &mut TaskManager<B>, ctx: &CommandContext<'_>, id: u64) -> anyhow::Result<()> {
    let status = require_loaded(manager, id)?;
    if !status.can_complete() {
        bail!("task {id} is {status}; only tasks in progress can be completed");
    }
    manager.complete_task(id);
    check(manager)?;
    println!("Completed task {id}.");
    show_page(manager, ctx)
}

#[instrument(skip(manager, ctx))]
fn cmd_delete<B: TaskBackend>(manager: &mut TaskManager<B>, ctx: &CommandContext<'_>, id: u64) -> anyhow::Result<()> {
    manager.delete_task(id);
    check(manager)?;
    println!("Deleted task {id}.");
    show_page(manager, ctx)
}

#[instrument(skip(manager, ctx, action))]
fn cmd_sub<B: TaskBackend>(
    manager: &mut TaskManager<B>,
    ctx: &CommandContext<'_>,
    action: SubCommand,
) -> anyhow::Result<()> {
    // Subtask patches apply to the loaded list, so load it first.
    manager.fetch_tasks();
    check(manager)?;

    match action {
        SubCommand::Add {
            task_id,
            title,
            description,
        } => {
            let payload = SubtaskDraft::new(title, description.unwrap_or_default()).to_payload()?;
            manager.add_subtask(task_id, &payload);
            check(manager)?;
            println!("Added subtask to task {task_id}.");
        }
        SubCommand::Status { id, status } => {
            manager.update_subtask_status(id, status);
            check(manager)?;
            println!("Subtask {id} is now {status}.");
        }
        SubCommand::Toggle { id } => {
            manager.toggle_subtask_status(id);
            check(manager)?;
            let status = manager
                .store()
                .find_subtask(id)
                .map(|(_, sub)| sub.status.to_string())
                .unwrap_or_default();
            println!("Subtask {id} is now {status}.");
        }
        SubCommand::Delete { id } => {
            manager.delete_subtask(id);
            check(manager)?;
            println!("Deleted subtask {id}.");
        }
    }

    show_page(manager, ctx)
}

#[instrument(skip(manager, ctx))]
fn cmd_dashboard<B: TaskBackend>(
    manager: &mut TaskManager<B>,
    ctx: &CommandContext<'_>,
    window: Option<TimeWindow>,
) -> anyhow::Result<()> {
    let window = match window {
        Some(window) => window,
        None => ctx.cfg.dashboard_window()?,
    };
    let settings = ctx.cfg.dashboard_settings()?;

    manager.fetch_all_tasks_for_analytics();
    check(manager)?;

    let clock = DashboardClock::new(Utc::now(), ctx.tz);
    let dashboard = Dashboard::compute(manager.tasks(), window, &clock, &settings);
    ctx.renderer.print_dashboard(&dashboard)
}

#[instrument(skip(manager, ctx))]
fn cmd_summary<B: TaskBackend>(manager: &mut TaskManager<B>, ctx: &CommandContext<'_>) -> anyhow::Result<()> {
    let summary = manager
        .analytics()
        .context("Failed to fetch analytics summary")?;
    ctx.renderer.print_summary(&summary)
}
