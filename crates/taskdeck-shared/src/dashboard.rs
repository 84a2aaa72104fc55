use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{
  DateTime,
  Datelike,
  Duration,
  Months,
  NaiveDate,
  NaiveTime,
  TimeZone,
  Utc
};
use chrono_tz::Tz;
use serde::{
  Deserialize,
  Serialize
};
use thiserror::Error;

use crate::datetime::days_between;
use crate::task::{
  Task,
  TaskStatus
};

pub const STAGNANT_AFTER_DAYS: i64 = 7;
pub const OVERDUE_AFTER_DAYS: i64 = 14;
pub const TREND_DAYS: i64 = 30;
pub const ATTENTION_LIMIT: usize = 10;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
  Today,
  #[default]
  Week,
  Month,
  All
}

impl TimeWindow {
  pub const ALL: [TimeWindow; 4] = [
    TimeWindow::Today,
    TimeWindow::Week,
    TimeWindow::Month,
    TimeWindow::All
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      | TimeWindow::Today => "today",
      | TimeWindow::Week => "week",
      | TimeWindow::Month => "month",
      | TimeWindow::All => "all"
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      | TimeWindow::Today => "Today",
      | TimeWindow::Week => "This Week",
      | TimeWindow::Month => "This Month",
      | TimeWindow::All => "All Time"
    }
  }

  /// Earliest creation time inside the
  /// window; `None` for all time.
  pub fn since(
    self,
    clock: &DashboardClock
  ) -> Option<DateTime<Utc>> {
    match self {
      | TimeWindow::Today => {
        Some(clock.start_of_today())
      }
      | TimeWindow::Week => {
        Some(clock.now - Duration::days(7))
      }
      | TimeWindow::Month => {
        let local =
          clock.now.with_timezone(&clock.tz);
        Some(
          local
            .checked_sub_months(Months::new(1))
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(
              clock.now - Duration::days(30)
            )
        )
      }
      | TimeWindow::All => None
    }
  }
}

impl fmt::Display for TimeWindow {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error(
  "unknown time window '{0}' (expected today, week, month or all)"
)]
pub struct WindowParseError(pub String);

impl FromStr for TimeWindow {
  type Err = WindowParseError;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "today" | "day" => Ok(TimeWindow::Today),
      | "week" => Ok(TimeWindow::Week),
      | "month" => Ok(TimeWindow::Month),
      | "all" => Ok(TimeWindow::All),
      | _ => Err(WindowParseError(s.to_string()))
    }
  }
}

/// The instant aggregates are computed
/// at, and the zone that decides where
/// calendar days begin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DashboardClock {
  pub now: DateTime<Utc>,
  pub tz:  Tz
}

impl DashboardClock {
  pub fn new(
    now: DateTime<Utc>,
    tz: Tz
  ) -> Self {
    Self {
      now,
      tz
    }
  }

  pub fn local_date(
    &self,
    dt: DateTime<Utc>
  ) -> NaiveDate {
    dt.with_timezone(&self.tz).date_naive()
  }

  pub fn today(&self) -> NaiveDate {
    self.local_date(self.now)
  }

  /// First instant of a local date.
  pub fn start_of(
    &self,
    date: NaiveDate
  ) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    self
      .tz
      .from_local_datetime(&naive)
      .earliest()
      .map(|dt| dt.with_timezone(&Utc))
      .unwrap_or_else(|| naive.and_utc())
  }

  pub fn start_of_today(
    &self
  ) -> DateTime<Utc> {
    self.start_of(self.today())
  }

  /// Sunday 00:00 of the current week.
  pub fn start_of_week(
    &self
  ) -> DateTime<Utc> {
    let today = self.today();
    let back = i64::from(
      today.weekday().num_days_from_sunday()
    );
    self.start_of(today - Duration::days(back))
  }

  pub fn start_of_month(
    &self
  ) -> DateTime<Utc> {
    let today = self.today();
    let first =
      today.with_day(1).unwrap_or(today);
    self.start_of(first)
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
pub struct DashboardSettings {
  pub weekly_goal:  u32,
  pub monthly_goal: u32
}

impl Default for DashboardSettings {
  fn default() -> Self {
    Self {
      weekly_goal:  10,
      monthly_goal: 40
    }
  }
}

const CATEGORY_KEYWORDS: [(&[&str], &str); 10] = [
  (&["ml", "machine", "learning"], "Machine Learning"),
  (&["risk"], "Risk Management"),
  (&["algo", "algorithm"], "Algorithms"),
  (&["broker"], "Broker"),
  (&["backtest"], "Backtesting"),
  (&["trader"], "Trading"),
  (&["portfolio"], "Portfolio"),
  (&["research"], "Research"),
  (&["log"], "Logging"),
  (&["front", "ui"], "Frontend")
];

/// The task's page when it has one,
/// otherwise guessed from its name.
pub fn task_category(task: &Task) -> String {
  let page = task.page_name.trim();
  if !page.is_empty() {
    return page.to_string();
  }

  let name = task.name.to_lowercase();
  CATEGORY_KEYWORDS
    .iter()
    .find(|(keywords, _)| {
      keywords.iter().any(|k| name.contains(k))
    })
    .map(|(_, category)| category.to_string())
    .unwrap_or_else(|| "Other".to_string())
}

fn percent(part: usize, whole: usize) -> f64 {
  if whole == 0 {
    0.0
  } else {
    part as f64 / whole as f64 * 100.0
  }
}

fn mean(values: &[f64]) -> f64 {
  if values.is_empty() {
    0.0
  } else {
    values.iter().sum::<f64>() / values.len() as f64
  }
}

fn floor_days(
  from: DateTime<Utc>,
  to: DateTime<Utc>
) -> i64 {
  days_between(from, to).floor() as i64
}

fn ceil_days(
  from: DateTime<Utc>,
  to: DateTime<Utc>
) -> i64 {
  days_between(from, to).ceil() as i64
}

fn count_status(
  tasks: &[&Task],
  status: TaskStatus
) -> usize {
  tasks.iter().filter(|t| t.status == status).count()
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum ProductivityBand {
  High,
  Fair,
  Low
}

impl ProductivityBand {
  pub fn for_score(score: f64) -> Self {
    if score >= 80.0 {
      ProductivityBand::High
    } else if score >= 60.0 {
      ProductivityBand::Fair
    } else {
      ProductivityBand::Low
    }
  }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DashboardStats {
  pub total_tasks:           usize,
  pub completed_tasks:       usize,
  pub in_progress_tasks:     usize,
  pub pending_tasks:         usize,
  pub total_subtasks:        usize,
  pub completed_subtasks:    usize,
  pub completion_rate:       f64,
  pub subtask_rate:          f64,
  pub avg_subtasks_per_task: f64,
  pub avg_completion_days:   f64,
  pub focus_ratio:           Vec<(String, f64)>,
  pub productivity_score:    f64,
  pub stagnant_tasks:        usize
}

impl DashboardStats {
  pub fn compute(
    all: &[Task],
    filtered: &[&Task],
    clock: &DashboardClock
  ) -> Self {
    let total_tasks = filtered.len();
    let completed_tasks =
      count_status(filtered, TaskStatus::Completed);
    let total_subtasks: usize = filtered
      .iter()
      .map(|t| t.subtasks.len())
      .sum();
    let completed_subtasks: usize = filtered
      .iter()
      .map(|t| t.completed_subtasks())
      .sum();

    let completion_rate =
      percent(completed_tasks, total_tasks);
    let subtask_rate = completed_subtasks as f64
      / total_subtasks.max(1) as f64
      * 100.0;
    let avg_subtasks_per_task = if total_tasks == 0
    {
      0.0
    } else {
      total_subtasks as f64 / total_tasks as f64
    };

    let durations: Vec<f64> = filtered
      .iter()
      .filter(|t| t.status == TaskStatus::Completed)
      .filter_map(|t| {
        match (t.started_at, t.completed_at) {
          | (Some(s), Some(c)) => {
            Some(days_between(s, c))
          }
          | _ => None
        }
      })
      .collect();
    let avg_completion_days = mean(&durations);

    let mut per_category: HashMap<String, usize> =
      HashMap::new();
    for task in filtered {
      *per_category
        .entry(task_category(task))
        .or_default() += 1;
    }
    let mut focus_ratio: Vec<(String, f64)> =
      per_category
        .into_iter()
        .map(|(name, count)| {
          (name, percent(count, total_tasks))
        })
        .collect();
    focus_ratio.sort_by(|a, b| {
      b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0))
    });

    let productivity_score = if total_tasks == 0 {
      0.0
    } else {
      (completion_rate * 0.4
        + subtask_rate.min(100.0) * 0.3
        + (100.0 - avg_completion_days * 10.0)
          .max(0.0)
          * 0.3)
        .clamp(0.0, 100.0)
    };

    let stagnant_tasks = all
      .iter()
      .filter(|t| is_stagnant(t, clock.now))
      .count();

    Self {
      total_tasks,
      completed_tasks,
      in_progress_tasks: count_status(
        filtered,
        TaskStatus::InProgress
      ),
      pending_tasks: count_status(
        filtered,
        TaskStatus::Pending
      ),
      total_subtasks,
      completed_subtasks,
      completion_rate,
      subtask_rate,
      avg_subtasks_per_task,
      avg_completion_days,
      focus_ratio,
      productivity_score,
      stagnant_tasks
    }
  }

  pub fn band(&self) -> ProductivityBand {
    ProductivityBand::for_score(self.productivity_score)
  }
}

pub fn is_stagnant(
  task: &Task,
  now: DateTime<Utc>
) -> bool {
  task.status == TaskStatus::Pending
    && floor_days(task.created_at, now)
      > STAGNANT_AFTER_DAYS
}

pub fn is_overdue(
  task: &Task,
  now: DateTime<Utc>
) -> bool {
  task.status != TaskStatus::Completed
    && floor_days(task.created_at, now)
      > OVERDUE_AFTER_DAYS
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryBreakdown {
  pub name:            String,
  pub count:           usize,
  pub pending:         usize,
  pub in_progress:     usize,
  pub completed:       usize,
  pub completion_rate: f64
}

pub fn category_breakdown(
  tasks: &[Task]
) -> Vec<CategoryBreakdown> {
  let mut grouped: HashMap<String, Vec<&Task>> =
    HashMap::new();
  for task in tasks {
    grouped
      .entry(task_category(task))
      .or_default()
      .push(task);
  }

  let mut rows: Vec<CategoryBreakdown> = grouped
    .into_iter()
    .map(|(name, members)| {
      let completed =
        count_status(&members, TaskStatus::Completed);
      CategoryBreakdown {
        count: members.len(),
        pending: count_status(
          &members,
          TaskStatus::Pending
        ),
        in_progress: count_status(
          &members,
          TaskStatus::InProgress
        ),
        completed,
        completion_rate: percent(
          completed,
          members.len()
        ),
        name
      }
    })
    .collect();
  rows.sort_by(|a, b| {
    b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name))
  });
  rows
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum Attention {
  High,
  Medium,
  Low
}

impl Attention {
  pub fn label(self) -> &'static str {
    match self {
      | Attention::High => "High",
      | Attention::Medium => "Medium",
      | Attention::Low => "Low"
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgingEntry {
  pub task_id:             u64,
  pub name:                String,
  pub category:            String,
  pub status:              TaskStatus,
  pub days_since_creation: i64,
  pub days_to_start:       Option<i64>,
  pub days_to_complete:    Option<i64>,
  pub is_stagnant:         bool,
  pub is_overdue:          bool,
  pub attention:           Attention
}

pub fn aging_report(
  tasks: &[Task],
  now: DateTime<Utc>
) -> Vec<AgingEntry> {
  tasks
    .iter()
    .map(|task| {
      let stagnant = is_stagnant(task, now);
      let overdue = is_overdue(task, now);
      let attention = if overdue {
        Attention::High
      } else if stagnant {
        Attention::Medium
      } else {
        Attention::Low
      };
      AgingEntry {
        task_id: task.id,
        name: task.name.clone(),
        category: task_category(task),
        status: task.status,
        days_since_creation: floor_days(
          task.created_at,
          now
        ),
        days_to_start: task
          .started_at
          .map(|s| floor_days(task.created_at, s)),
        days_to_complete: task
          .completed_at
          .map(|c| floor_days(task.created_at, c)),
        is_stagnant: stagnant,
        is_overdue: overdue,
        attention
      }
    })
    .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEntry {
  pub task_id:       u64,
  pub name:          String,
  pub status:        TaskStatus,
  pub start:         DateTime<Utc>,
  pub end:           DateTime<Utc>,
  pub duration_days: i64
}

pub fn timeline(
  tasks: &[Task],
  now: DateTime<Utc>
) -> Vec<TimelineEntry> {
  let mut entries: Vec<TimelineEntry> = tasks
    .iter()
    .filter(|t| {
      t.started_at.is_some() || t.completed_at.is_some()
    })
    .map(|task| {
      let start =
        task.started_at.unwrap_or(task.created_at);
      let end = task.completed_at.unwrap_or(now);
      TimelineEntry {
        task_id: task.id,
        name: task.name.clone(),
        status: task.status,
        start,
        end,
        duration_days: ceil_days(start, end)
      }
    })
    .collect();
  entries.sort_by_key(|e| e.start);
  entries
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendDay {
  pub date:               NaiveDate,
  pub total:              usize,
  pub completed:          usize,
  pub in_progress:        usize,
  pub completion_rate:    f64,
  pub productivity_score: f64
}

/// One row per local day for the last
/// thirty days, today last. Each day
/// counts the tasks created on it.
pub fn productivity_trend(
  tasks: &[Task],
  clock: &DashboardClock
) -> Vec<TrendDay> {
  let mut cohorts: HashMap<NaiveDate, Vec<&Task>> =
    HashMap::new();
  for task in tasks {
    cohorts
      .entry(clock.local_date(task.created_at))
      .or_default()
      .push(task);
  }

  let today = clock.today();
  (0..TREND_DAYS)
    .rev()
    .map(|back| {
      let date = today - Duration::days(back);
      let cohort = cohorts
        .get(&date)
        .map(Vec::as_slice)
        .unwrap_or_default();
      let total = cohort.len();
      let completed =
        count_status(cohort, TaskStatus::Completed);
      let in_progress =
        count_status(cohort, TaskStatus::InProgress);
      let productivity_score = if total == 0 {
        0.0
      } else {
        (2 * completed + in_progress) as f64
          / (2 * total) as f64
          * 100.0
      };
      TrendDay {
        date,
        total,
        completed,
        in_progress,
        completion_rate: percent(completed, total),
        productivity_score
      }
    })
    .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeedEntry {
  pub task_id:          u64,
  pub name:             String,
  pub days_to_start:    i64,
  pub days_to_complete: i64,
  pub total_days:       i64
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompletionSpeed {
  pub entries:              Vec<SpeedEntry>,
  pub avg_days_to_start:    f64,
  pub avg_days_to_complete: f64,
  pub fastest:              Option<SpeedEntry>,
  pub slowest:              Option<SpeedEntry>
}

pub fn completion_speed(
  tasks: &[Task]
) -> CompletionSpeed {
  let entries: Vec<SpeedEntry> = tasks
    .iter()
    .filter_map(|task| {
      let started = task.started_at?;
      let completed = task.completed_at?;
      let days_to_start =
        ceil_days(task.created_at, started);
      let days_to_complete =
        ceil_days(started, completed);
      Some(SpeedEntry {
        task_id: task.id,
        name: task.name.clone(),
        days_to_start,
        days_to_complete,
        total_days: days_to_start + days_to_complete
      })
    })
    .collect();

  let starts: Vec<f64> = entries
    .iter()
    .map(|e| e.days_to_start as f64)
    .collect();
  let completes: Vec<f64> = entries
    .iter()
    .map(|e| e.days_to_complete as f64)
    .collect();

  // Strict comparisons keep the first
  // entry on ties.
  let mut fastest: Option<&SpeedEntry> = None;
  let mut slowest: Option<&SpeedEntry> = None;
  for entry in &entries {
    if fastest
      .is_none_or(|f| entry.total_days < f.total_days)
    {
      fastest = Some(entry);
    }
    if slowest
      .is_none_or(|s| entry.total_days > s.total_days)
    {
      slowest = Some(entry);
    }
  }

  CompletionSpeed {
    avg_days_to_start: mean(&starts),
    avg_days_to_complete: mean(&completes),
    fastest: fastest.cloned(),
    slowest: slowest.cloned(),
    entries
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GoalProgress {
  pub completed: usize,
  pub goal:      u32,
  pub progress:  f64
}

impl GoalProgress {
  pub fn new(completed: usize, goal: u32) -> Self {
    let progress = if goal == 0 {
      0.0
    } else {
      (completed as f64 / f64::from(goal) * 100.0)
        .min(100.0)
    };
    Self {
      completed,
      goal,
      progress
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Goals {
  pub weekly:  GoalProgress,
  pub monthly: GoalProgress
}

pub fn goal_progress(
  tasks: &[Task],
  clock: &DashboardClock,
  settings: &DashboardSettings
) -> Goals {
  let completed_since = |since: DateTime<Utc>| {
    tasks
      .iter()
      .filter(|t| {
        t.created_at >= since
          && t.status == TaskStatus::Completed
      })
      .count()
  };

  Goals {
    weekly:  GoalProgress::new(
      completed_since(clock.start_of_week()),
      settings.weekly_goal
    ),
    monthly: GoalProgress::new(
      completed_since(clock.start_of_month()),
      settings.monthly_goal
    )
  }
}

/// Every aggregate the dashboard shows,
/// recomputed from scratch.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
  pub window:     TimeWindow,
  pub stats:      DashboardStats,
  pub categories: Vec<CategoryBreakdown>,
  pub aging:      Vec<AgingEntry>,
  pub timeline:   Vec<TimelineEntry>,
  pub trend:      Vec<TrendDay>,
  pub speed:      CompletionSpeed,
  pub goals:      Goals
}

impl Dashboard {
  pub fn compute(
    tasks: &[Task],
    window: TimeWindow,
    clock: &DashboardClock,
    settings: &DashboardSettings
  ) -> Self {
    let since = window.since(clock);
    let filtered: Vec<&Task> = tasks
      .iter()
      .filter(|t| since.is_none_or(|s| t.created_at >= s))
      .collect();

    tracing::debug!(
      window = %window,
      total = tasks.len(),
      in_window = filtered.len(),
      "computing dashboard"
    );

    Self {
      window,
      stats: DashboardStats::compute(
        tasks, &filtered, clock
      ),
      categories: category_breakdown(tasks),
      aging: aging_report(tasks, clock.now),
      timeline: timeline(tasks, clock.now),
      trend: productivity_trend(tasks, clock),
      speed: completion_speed(tasks),
      goals: goal_progress(tasks, clock, settings)
    }
  }

  /// Stagnant or overdue tasks, oldest
  /// first, capped for display.
  pub fn needs_attention(&self) -> Vec<&AgingEntry> {
    let mut flagged: Vec<&AgingEntry> = self
      .aging
      .iter()
      .filter(|e| e.is_stagnant || e.is_overdue)
      .collect();
    flagged.sort_by(|a, b| {
      b.days_since_creation.cmp(&a.days_since_creation)
    });
    flagged.truncate(ATTENTION_LIMIT);
    flagged
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn clock() -> DashboardClock {
    DashboardClock::new(
      Utc
        .with_ymd_and_hms(2024, 6, 12, 15, 0, 0)
        .single()
        .expect("valid"),
      chrono_tz::UTC
    )
  }

  fn task(
    id: u64,
    name: &str,
    status: TaskStatus,
    created: DateTime<Utc>
  ) -> Task {
    Task {
      id,
      name: name.to_string(),
      description: None,
      created_at: created,
      started_at: None,
      completed_at: None,
      status,
      subtasks: vec![],
      page_name: String::new()
    }
  }

  fn finished(
    id: u64,
    created: DateTime<Utc>,
    start_after_hours: i64,
    done_after_hours: i64
  ) -> Task {
    let started =
      created + Duration::hours(start_after_hours);
    Task {
      started_at: Some(started),
      completed_at: Some(
        started + Duration::hours(done_after_hours)
      ),
      ..task(id, "done", TaskStatus::Completed, created)
    }
  }

  #[test]
  fn empty_input_is_all_zero() {
    let dashboard = Dashboard::compute(
      &[],
      TimeWindow::All,
      &clock(),
      &DashboardSettings::default()
    );
    assert_eq!(dashboard.stats.completion_rate, 0.0);
    assert_eq!(dashboard.stats.productivity_score, 0.0);
    assert_eq!(dashboard.stats.avg_completion_days, 0.0);
    assert!(dashboard.stats.focus_ratio.is_empty());
    assert!(dashboard.speed.fastest.is_none());
    assert_eq!(dashboard.trend.len(), 30);
    assert!(
      dashboard
        .trend
        .iter()
        .all(|d| d.productivity_score == 0.0)
    );
  }

  #[test]
  fn stagnant_boundary_is_strictly_after_seven_days() {
    let now = clock().now;
    let seven = task(
      1,
      "x",
      TaskStatus::Pending,
      now - Duration::days(7)
    );
    let eight = task(
      2,
      "y",
      TaskStatus::Pending,
      now - Duration::days(8)
    );
    assert!(!is_stagnant(&seven, now));
    assert!(is_stagnant(&eight, now));

    let started = Task {
      status: TaskStatus::InProgress,
      ..eight.clone()
    };
    assert!(!is_stagnant(&started, now));
  }

  #[test]
  fn stagnant_count_ignores_window() {
    let c = clock();
    let old = task(
      1,
      "old",
      TaskStatus::Pending,
      c.now - Duration::days(20)
    );
    let dashboard = Dashboard::compute(
      &[old],
      TimeWindow::Today,
      &c,
      &DashboardSettings::default()
    );
    assert_eq!(dashboard.stats.total_tasks, 0);
    assert_eq!(dashboard.stats.stagnant_tasks, 1);
    assert_eq!(
      dashboard.needs_attention()[0].attention,
      Attention::High
    );
  }

  #[test]
  fn weekly_goal_caps_at_full() {
    let c = clock();
    let tasks: Vec<Task> = (0..12)
      .map(|i| {
        finished(i, c.now - Duration::hours(2), 0, 1)
      })
      .collect();
    let goals = goal_progress(
      &tasks,
      &c,
      &DashboardSettings::default()
    );
    assert_eq!(goals.weekly.completed, 12);
    assert_eq!(goals.weekly.progress, 100.0);
    assert_eq!(goals.monthly.progress, 30.0);

    let zero = GoalProgress::new(3, 0);
    assert_eq!(zero.progress, 0.0);
  }

  #[test]
  fn week_starts_on_local_sunday() {
    // 2024-06-12 is a Wednesday.
    let c = clock();
    assert_eq!(
      c.start_of_week(),
      Utc
        .with_ymd_and_hms(2024, 6, 9, 0, 0, 0)
        .single()
        .expect("valid")
    );
    let tokyo = DashboardClock::new(
      c.now,
      chrono_tz::Asia::Tokyo
    );
    assert_eq!(
      tokyo.start_of_month(),
      Utc
        .with_ymd_and_hms(2024, 5, 31, 15, 0, 0)
        .single()
        .expect("valid")
    );
  }

  #[test]
  fn categories_prefer_page_name() {
    let c = clock();
    let mut paged =
      task(1, "ml pipeline", TaskStatus::Pending, c.now);
    paged.page_name = "Broker".to_string();
    assert_eq!(task_category(&paged), "Broker");

    let guessed = [
      ("Tune ML model", "Machine Learning"),
      ("risk limits", "Risk Management"),
      ("algo rewrite", "Algorithms"),
      ("fix login", "Logging"),
      ("new button", "Other")
    ];
    for (name, expected) in guessed {
      let t = task(2, name, TaskStatus::Pending, c.now);
      assert_eq!(task_category(&t), expected, "{name}");
    }
  }

  #[test]
  fn breakdown_sorted_by_count() {
    let c = clock();
    let tasks = vec![
      task(1, "broker a", TaskStatus::Pending, c.now),
      task(2, "risk a", TaskStatus::Completed, c.now),
      task(3, "risk b", TaskStatus::Pending, c.now),
    ];
    let rows = category_breakdown(&tasks);
    assert_eq!(rows[0].name, "Risk Management");
    assert_eq!(rows[0].count, 2);
    assert_eq!(rows[0].completion_rate, 50.0);
    assert_eq!(rows[1].name, "Broker");
  }

  #[test]
  fn stats_over_window() {
    let c = clock();
    let mut with_subs = finished(1, c.now - Duration::days(2), 0, 48);
    with_subs.page_name = "Trader".to_string();
    let pending =
      task(2, "trader", TaskStatus::Pending, c.now);
    let tasks = vec![with_subs, pending];

    let stats = Dashboard::compute(
      &tasks,
      TimeWindow::Week,
      &c,
      &DashboardSettings::default()
    )
    .stats;
    assert_eq!(stats.total_tasks, 2);
    assert_eq!(stats.completion_rate, 50.0);
    assert_eq!(stats.avg_completion_days, 2.0);
    // 0.4*50 + 0.3*0 + 0.3*(100-20)
    assert!((stats.productivity_score - 44.0).abs() < 1e-9);
    assert_eq!(
      stats.focus_ratio,
      vec![
        ("Trading".to_string(), 50.0),
        ("Trader".to_string(), 50.0)
      ]
    );
  }

  #[test]
  fn trend_ends_today_and_scores_cohort() {
    let c = clock();
    let today = c.now - Duration::hours(1);
    let tasks = vec![
      finished(1, today, 0, 0),
      Task {
        started_at: Some(today),
        ..task(2, "b", TaskStatus::InProgress, today)
      },
    ];
    let trend = productivity_trend(&tasks, &c);
    let last = trend.last().expect("30 days");
    assert_eq!(last.date, c.today());
    assert_eq!(last.total, 2);
    assert_eq!(last.productivity_score, 75.0);
    assert_eq!(
      trend[0].date,
      c.today() - Duration::days(29)
    );
  }

  #[test]
  fn speed_rounds_up_and_keeps_first_on_ties() {
    let c = clock();
    let base = c.now - Duration::days(10);
    let tasks = vec![
      finished(1, base, 1, 1),
      finished(2, base, 1, 1),
      finished(3, base, 30, 50),
    ];
    let speed = completion_speed(&tasks);
    assert_eq!(speed.entries[0].total_days, 2);
    assert_eq!(
      speed.fastest.map(|e| e.task_id),
      Some(1)
    );
    assert_eq!(
      speed.slowest.map(|e| e.task_id),
      Some(3)
    );
    assert_eq!(speed.entries[2].days_to_start, 2);
    assert_eq!(speed.entries[2].days_to_complete, 3);
  }

  #[test]
  fn timeline_sorted_by_start() {
    let c = clock();
    let late = finished(1, c.now - Duration::days(1), 0, 1);
    let early = finished(2, c.now - Duration::days(5), 0, 1);
    let idle =
      task(3, "idle", TaskStatus::Pending, c.now);
    let entries = timeline(&[late, early, idle], c.now);
    assert_eq!(
      entries.iter().map(|e| e.task_id).collect::<Vec<_>>(),
      vec![2, 1]
    );
    assert_eq!(entries[0].duration_days, 1);
  }

  #[test]
  fn window_parsing() {
    assert_eq!(
      "Month".parse::<TimeWindow>(),
      Ok(TimeWindow::Month)
    );
    assert!("year".parse::<TimeWindow>().is_err());
  }
}
