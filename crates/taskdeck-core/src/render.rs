use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use taskdeck_shared::dashboard::{Dashboard, ProductivityBand};
use taskdeck_shared::datetime::format_day;
use taskdeck_shared::display::{BadgeTone, ItemAction, SubtaskTone, TaskView};
use taskdeck_shared::pages::{PAGES, PageContext};
use taskdeck_shared::store::TaskStore;
use taskdeck_shared::task::AnalyticsSummary;
use unicode_width::UnicodeWidthStr;

use crate::config::Config;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
    tz: Tz,
}

impl Renderer {
    pub fn new(cfg: &Config, tz: Tz) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self {
            color: color && io::stdout().is_terminal(),
            tz,
        })
    }

    pub fn plain(tz: Tz) -> Self {
        Self { color: false, tz }
    }

    #[tracing::instrument(skip(self, page, store, now))]
    pub fn print_page(
        &self,
        page: &PageContext,
        store: &TaskStore,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        self.write_page(io::stdout().lock(), page, store, now)
    }

    pub fn write_page<W: Write>(
        &self,
        mut out: W,
        page: &PageContext,
        store: &TaskStore,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        writeln!(out, "{}", self.paint(&page.title, "1"))?;
        writeln!(out, "{}", "=".repeat(UnicodeWidthStr::width(page.title.as_str())))?;

        if let Some(message) = store.error() {
            writeln!(out, "{}", self.paint(&format!("! {message}"), "31"))?;
        }

        if store.tasks().is_empty() {
            if !store.is_loading() {
                writeln!(out, "{}", page.empty_message)?;
            }
            return Ok(());
        }

        for task in store.tasks() {
            let view = TaskView::derive(task, &self.tz, now);
            self.write_task(&mut out, &view)?;
        }
        Ok(())
    }

    fn write_task<W: Write>(&self, out: &mut W, view: &TaskView) -> anyhow::Result<()> {
        let badge_code = match view.badge {
            BadgeTone::Warning => "33",
            BadgeTone::Default => "34",
            BadgeTone::Success => "32",
        };
        let badge = self.paint(&format!("[{}]", view.status), badge_code);
        let id = self.paint(&format!("#{}", view.id), "33");

        writeln!(out)?;
        writeln!(out, "{} {id} {} {badge}", view.icon.glyph(), view.name)?;
        if let Some(description) = &view.description {
            writeln!(out, "    {description}")?;
        }
        writeln!(out, "    {}", self.paint(&view.meta.join(" · "), "2"))?;

        for sub in &view.subtasks {
            let tone = match sub.tone {
                SubtaskTone::Muted => "2",
                SubtaskTone::Primary => "34",
                SubtaskTone::Accent => "32",
            };
            let mut line = format!("    {} #{} {}", sub.icon.glyph(), sub.id, sub.title);
            if !sub.duration.is_empty() {
                line.push_str(&format!(" ({})", sub.duration));
            }
            writeln!(out, "{}", self.paint(&line, tone))?;
            if let Some(description) = &sub.description {
                writeln!(out, "        {description}")?;
            }
        }

        let hints: Vec<String> = view
            .actions
            .iter()
            .map(|action| match action {
                ItemAction::Start => format!("start {}", view.id),
                ItemAction::Complete => format!("done {}", view.id),
                ItemAction::Delete => format!("delete {}", view.id),
            })
            .collect();
        writeln!(out, "    {}", self.paint(&format!("> {}", hints.join(" | ")), "2"))?;
        Ok(())
    }

    #[tracing::instrument(skip(self, dashboard))]
    pub fn print_dashboard(&self, dashboard: &Dashboard) -> anyhow::Result<()> {
        self.write_dashboard(io::stdout().lock(), dashboard)
    }

    pub fn write_dashboard<W: Write>(&self, mut out: W, dashboard: &Dashboard) -> anyhow::Result<()> {
        let stats = &dashboard.stats;
        let score_code = match stats.band() {
            ProductivityBand::High => "32",
            ProductivityBand::Fair => "33",
            ProductivityBand::Low => "31",
        };

        writeln!(out, "{}", self.paint(&format!("Dashboard ({})", dashboard.window.label()), "1"))?;
        writeln!(
            out,
            "Tasks {} · pending {} · in progress {} · completed {}",
            stats.total_tasks, stats.pending_tasks, stats.in_progress_tasks, stats.completed_tasks
        )?;
        writeln!(
            out,
            "Completion rate {:.1}% · subtasks {}/{} · {:.1} subtasks/task",
            stats.completion_rate, stats.completed_subtasks, stats.total_subtasks, stats.avg_subtasks_per_task
        )?;
        writeln!(
            out,
            "Avg completion {:.1} days · stagnant {} · productivity {}",
            stats.avg_completion_days,
            stats.stagnant_tasks,
            self.paint(&format!("{:.1}", stats.productivity_score), score_code)
        )?;

        writeln!(out)?;
        writeln!(out, "{}", self.paint("Goals", "1"))?;
        for (label, goal) in [("Weekly", &dashboard.goals.weekly), ("Monthly", &dashboard.goals.monthly)] {
            writeln!(
                out,
                "{label:<8} {}/{} ({:.0}%)",
                goal.completed, goal.goal, goal.progress
            )?;
        }

        if !stats.focus_ratio.is_empty() {
            writeln!(out)?;
            writeln!(out, "{}", self.paint("Focus", "1"))?;
            let rows = stats
                .focus_ratio
                .iter()
                .map(|(name, share)| vec![name.clone(), format!("{share:.1}%")])
                .collect();
            write_table(&mut out, vec!["Category".to_string(), "Share".to_string()], rows)?;
        }

        if !dashboard.categories.is_empty() {
            writeln!(out)?;
            writeln!(out, "{}", self.paint("Categories", "1"))?;
            let rows = dashboard
                .categories
                .iter()
                .map(|c| {
                    vec![
                        c.name.clone(),
                        c.count.to_string(),
                        c.pending.to_string(),
                        c.in_progress.to_string(),
                        c.completed.to_string(),
                        format!("{:.0}%", c.completion_rate),
                    ]
                })
                .collect();
            write_table(
                &mut out,
                ["Category", "Tasks", "Pending", "Active", "Done", "Rate"]
                    .map(String::from)
                    .to_vec(),
                rows,
            )?;
        }

        let attention = dashboard.needs_attention();
        if !attention.is_empty() {
            writeln!(out)?;
            writeln!(out, "{}", self.paint("Needs attention", "1"))?;
            let rows = attention
                .iter()
                .map(|entry| {
                    let age = entry.days_since_creation.to_string();
                    let age = if entry.is_overdue { self.paint(&age, "31") } else { age };
                    vec![
                        format!("#{}", entry.task_id),
                        entry.name.clone(),
                        entry.category.clone(),
                        entry.status.to_string(),
                        age,
                        entry.attention.label().to_string(),
                    ]
                })
                .collect();
            write_table(
                &mut out,
                ["ID", "Task", "Category", "Status", "Age", "Priority"]
                    .map(String::from)
                    .to_vec(),
                rows,
            )?;
        }

        let speed = &dashboard.speed;
        if !speed.entries.is_empty() {
            writeln!(out)?;
            writeln!(out, "{}", self.paint("Completion speed", "1"))?;
            writeln!(
                out,
                "Avg {:.1} days to start · {:.1} days to complete",
                speed.avg_days_to_start, speed.avg_days_to_complete
            )?;
            if let (Some(fast), Some(slow)) = (&speed.fastest, &speed.slowest) {
                writeln!(out, "Fastest #{} {} ({} days)", fast.task_id, fast.name, fast.total_days)?;
                writeln!(out, "Slowest #{} {} ({} days)", slow.task_id, slow.name, slow.total_days)?;
            }
        }

        if !dashboard.timeline.is_empty() {
            writeln!(out)?;
            writeln!(out, "{}", self.paint("Timeline", "1"))?;
            let rows = dashboard
                .timeline
                .iter()
                .map(|entry| {
                    vec![
                        format!("#{}", entry.task_id),
                        entry.name.clone(),
                        format_day(entry.start, &self.tz),
                        format_day(entry.end, &self.tz),
                        entry.duration_days.to_string(),
                    ]
                })
                .collect();
            write_table(
                &mut out,
                ["ID", "Task", "Start", "End", "Days"].map(String::from).to_vec(),
                rows,
            )?;
        }

        writeln!(out)?;
        writeln!(out, "{}", self.paint("Trend (30 days)", "1"))?;
        let sparkline: String = dashboard
            .trend
            .iter()
            .map(|day| spark(day.productivity_score, day.total))
            .collect();
        writeln!(out, "{sparkline}")?;
        Ok(())
    }

    pub fn print_summary(&self, summary: &AnalyticsSummary) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        let overall = &summary.overall;
        let rows = vec![
            vec!["Total".to_string(), overall.total.to_string()],
            vec!["Pending".to_string(), overall.pending.to_string()],
            vec!["In progress".to_string(), overall.in_progress.to_string()],
            vec!["Completed".to_string(), overall.completed.to_string()],
            vec!["With subtasks".to_string(), summary.by_subtasks.with_subtasks.to_string()],
            vec!["Without subtasks".to_string(), summary.by_subtasks.without_subtasks.to_string()],
        ];
        write_table(&mut out, vec!["Metric".to_string(), "Count".to_string()], rows)
    }

    pub fn print_pages(&self) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        let rows = PAGES
            .iter()
            .map(|page| {
                vec![
                    self.paint(page.slug, "33"),
                    page.page_name.to_string(),
                    page.title.to_string(),
                    page.group.label().to_string(),
                ]
            })
            .collect();
        write_table(&mut out, ["Slug", "Page", "Title", "Group"].map(String::from).to_vec(), rows)
    }

    pub fn print_config(&self, cfg: &Config) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        for path in &cfg.loaded_files {
            writeln!(out, "# {}", path.display())?;
        }
        let rows = cfg
            .entries()
            .into_iter()
            .map(|(k, v)| vec![k.clone(), v.clone()])
            .collect();
        write_table(&mut out, vec!["Key".to_string(), "Value".to_string()], rows)
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn spark(score: f64, total: usize) -> char {
    const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
    if total == 0 {
        return '·';
    }
    let idx = ((score / 100.0) * 7.0).round().clamp(0.0, 7.0) as usize;
    BARS[idx]
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for (header, width) in headers.iter().zip(&widths) {
        write!(writer, "{header:width$} ", width = *width)?;
    }
    writeln!(writer)?;

    for width in &widths {
        write!(writer, "{:-<width$} ", "", width = *width)?;
    }
    writeln!(writer)?;

    for row in rows {
        for (cell, width) in row.iter().zip(&widths) {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = width.saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use taskdeck_shared::store::TaskAction;
    use taskdeck_shared::task::{Subtask, Task, TaskStatus};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).single().expect("valid")
    }

    fn render(page: &PageContext, store: &TaskStore) -> String {
        let mut buf = Vec::new();
        Renderer::plain(chrono_tz::UTC)
            .write_page(&mut buf, page, store, now())
            .expect("render");
        String::from_utf8(buf).expect("utf8")
    }

    #[test]
    fn empty_page_shows_its_message_once_loaded() {
        let page = PageContext::resolve("risk");
        let mut store = TaskStore::new();
        assert!(!render(&page, &store).contains("No tasks related to risk"));

        store.apply(TaskAction::TasksLoaded(vec![]));
        store.apply(TaskAction::Failed("Failed to fetch tasks".to_string()));
        let text = render(&page, &store);
        assert!(text.starts_with("Risk\n===="));
        assert!(text.contains("! Failed to fetch tasks"));
        assert!(text.contains("No tasks related to risk"));
    }

    #[test]
    fn task_lines_carry_meta_subtasks_and_actions() {
        let created = Utc.with_ymd_and_hms(2024, 1, 5, 9, 0, 0).single().expect("valid");
        let task = Task {
            id: 3,
            name: "Wire broker".to_string(),
            description: None,
            created_at: created,
            started_at: Some(created),
            completed_at: None,
            status: TaskStatus::InProgress,
            subtasks: vec![Subtask {
                id: 8,
                task_id: Some(3),
                title: "Auth".to_string(),
                description: None,
                status: TaskStatus::Pending,
                created_at: created,
                started_at: None,
                completed_at: None,
                updated_at: None,
            }],
            page_name: "Broker".to_string(),
        };
        let mut store = TaskStore::new();
        store.apply(TaskAction::TasksLoaded(vec![task]));

        let text = render(&PageContext::resolve("broker"), &store);
        assert!(text.contains("#3 Wire broker [In progress]"));
        assert!(text.contains("Created: Jan 5, 2024 · 1 subtask · Started 6 days ago"));
        assert!(text.contains("○ #8 Auth"));
        assert!(text.contains("> done 3 | delete 3"));
    }

    #[test]
    fn table_pads_by_visible_width() {
        let mut buf = Vec::new();
        write_table(
            &mut buf,
            vec!["A".to_string(), "B".to_string()],
            vec![vec!["\x1b[31mxx\x1b[0m".to_string(), "y".to_string()]],
        )
        .expect("table");
        let text = String::from_utf8(buf).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "A  B ");
        assert_eq!(strip_ansi(lines[2]), "xx y ");
    }
}
