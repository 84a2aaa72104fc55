use std::cell::RefCell;

use chrono::{TimeZone, Utc};
use taskdeck_core::api::{ApiError, TaskBackend};
use taskdeck_core::manager::TaskManager;
use taskdeck_shared::forms::TaskDraft;
use taskdeck_shared::task::{
    AnalyticsSummary, OverallCounts, Subtask, SubtaskCreate, SubtaskCoverage, Task, TaskCreate,
    TaskStatus,
};

#[derive(Default)]
struct MemoryBackend {
    tasks: RefCell<Vec<Task>>,
    next_id: RefCell<u64>,
    fail_with: RefCell<Option<u16>>,
    calls: RefCell<Vec<String>>,
}

impl MemoryBackend {
    fn failing(&self, status: u16) {
        *self.fail_with.borrow_mut() = Some(status);
    }

    fn healthy(&self) {
        *self.fail_with.borrow_mut() = None;
    }

    fn guard(&self, call: String) -> Result<(), ApiError> {
        self.calls.borrow_mut().push(call.clone());
        match *self.fail_with.borrow() {
            Some(status) => Err(ApiError::Status { status, url: call }),
            None => Ok(()),
        }
    }

    fn id(&self) -> u64 {
        let mut next = self.next_id.borrow_mut();
        *next += 1;
        *next
    }

    fn with_task<T>(&self, task_id: u64, f: impl FnOnce(&mut Task) -> T) -> Result<T, ApiError> {
        let mut tasks = self.tasks.borrow_mut();
        tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .map(f)
            .ok_or(ApiError::Status {
                status: 404,
                url: format!("task/{task_id}"),
            })
    }
}

fn stamp() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 2, 1, 8, 0, 0).single().expect("valid")
}

impl TaskBackend for MemoryBackend {
    fn list_page_tasks(&self, page_name: &str) -> Result<Vec<Task>, ApiError> {
        self.guard(format!("GET page {page_name}"))?;
        Ok(self
            .tasks
            .borrow()
            .iter()
            .filter(|t| t.page_name == page_name)
            .cloned()
            .collect())
    }

    fn list_all_tasks(&self) -> Result<Vec<Task>, ApiError> {
        self.guard("GET all".to_string())?;
        Ok(self.tasks.borrow().clone())
    }

    fn create_task(&self, page_name: &str, payload: &TaskCreate) -> Result<Task, ApiError> {
        self.guard(format!("POST {page_name}"))?;
        let id = self.id();
        let subtasks = payload
            .subtasks
            .iter()
            .map(|s| Subtask {
                id: self.id(),
                task_id: None,
                title: s.title.clone(),
                description: s.description.clone(),
                status: TaskStatus::Pending,
                created_at: stamp(),
                started_at: None,
                completed_at: None,
                updated_at: Some(stamp()),
            })
            .collect();
        let task = Task {
            id,
            name: payload.name.clone(),
            description: payload.description.clone(),
            created_at: stamp(),
            started_at: None,
            completed_at: None,
            status: TaskStatus::Pending,
            subtasks,
            page_name: page_name.to_string(),
        };
        self.tasks.borrow_mut().push(task.clone());
        Ok(task)
    }

    fn start_task(&self, _page_name: &str, task_id: u64) -> Result<Task, ApiError> {
        self.guard(format!("PUT start {task_id}"))?;
        self.with_task(task_id, |t| {
            t.status = TaskStatus::InProgress;
            t.started_at = Some(stamp());
            t.clone()
        })
    }

    fn complete_task(&self, _page_name: &str, task_id: u64) -> Result<Task, ApiError> {
        self.guard(format!("PUT complete {task_id}"))?;
        self.with_task(task_id, |t| {
            t.status = TaskStatus::Completed;
            t.completed_at = Some(stamp());
            t.clone()
        })
    }

    fn delete_task(&self, _page_name: &str, task_id: u64) -> Result<(), ApiError> {
        self.guard(format!("DELETE {task_id}"))?;
        self.tasks.borrow_mut().retain(|t| t.id != task_id);
        Ok(())
    }

    fn add_subtask(&self, task_id: u64, payload: &SubtaskCreate) -> Result<Subtask, ApiError> {
        self.guard(format!("POST subtask {task_id}"))?;
        let subtask = Subtask {
            id: self.id(),
            task_id: None,
            title: payload.title.clone(),
            description: payload.description.clone(),
            status: TaskStatus::Pending,
            created_at: stamp(),
            started_at: None,
            completed_at: None,
            updated_at: None,
        };
        self.with_task(task_id, |t| t.subtasks.push(subtask.clone()))?;
        Ok(subtask)
    }

    fn update_subtask_status(&self, subtask_id: u64, status: TaskStatus) -> Result<Subtask, ApiError> {
        self.guard(format!("PUT subtask {subtask_id} {status}"))?;
        let mut tasks = self.tasks.borrow_mut();
        let subtask = tasks
            .iter_mut()
            .flat_map(|t| t.subtasks.iter_mut())
            .find(|s| s.id == subtask_id)
            .ok_or(ApiError::Status {
                status: 404,
                url: format!("subtask/{subtask_id}"),
            })?;
        subtask.status = status;
        Ok(subtask.clone())
    }

    fn delete_subtask(&self, subtask_id: u64) -> Result<(), ApiError> {
        self.guard(format!("DELETE subtask {subtask_id}"))?;
        for task in self.tasks.borrow_mut().iter_mut() {
            task.subtasks.retain(|s| s.id != subtask_id);
        }
        Ok(())
    }

    fn analytics(&self) -> Result<AnalyticsSummary, ApiError> {
        self.guard("GET analytics".to_string())?;
        let tasks = self.tasks.borrow();
        let count = |status: TaskStatus| tasks.iter().filter(|t| t.status == status).count() as u64;
        let with = tasks.iter().filter(|t| !t.subtasks.is_empty()).count() as u64;
        Ok(AnalyticsSummary {
            overall: OverallCounts {
                total: tasks.len() as u64,
                pending: count(TaskStatus::Pending),
                in_progress: count(TaskStatus::InProgress),
                completed: count(TaskStatus::Completed),
            },
            by_subtasks: SubtaskCoverage {
                with_subtasks: with,
                without_subtasks: tasks.len() as u64 - with,
            },
        })
    }
}

fn draft(name: &str, subtasks: &[&str]) -> TaskCreate {
    let mut draft = TaskDraft::new(name, "");
    for title in subtasks {
        draft.pending.title = title.to_string();
        draft.add_subtask().expect("subtask title");
    }
    draft.to_payload().expect("payload")
}

#[test]
fn task_lifecycle_refetches_after_each_mutation() {
    let mut manager = TaskManager::new(MemoryBackend::default(), "Broker");
    assert!(manager.store().is_loading());

    manager.fetch_tasks();
    assert!(!manager.store().is_loading());
    assert!(manager.tasks().is_empty());

    let created = manager.create_task(&draft("Wire broker", &["Auth"])).expect("create");
    assert_eq!(manager.tasks().len(), 1);
    assert!(!manager.store().is_submitting());

    manager.start_task(created.id);
    assert_eq!(manager.store().task(created.id).map(|t| t.status), Some(TaskStatus::InProgress));

    manager.complete_task(created.id);
    let task = manager.store().task(created.id).expect("task");
    assert_eq!(task.status, TaskStatus::Completed);
    assert!(task.check_lifecycle().is_ok());

    manager.delete_task(created.id);
    assert!(manager.tasks().is_empty());
    assert_eq!(manager.error(), None);
    assert!(!manager.store().is_processing());
}

#[test]
fn subtasks_patch_local_state_without_refetch() {
    let mut manager = TaskManager::new(MemoryBackend::default(), "Home");
    let task = manager.create_task(&draft("Plan", &[])).expect("create");

    let calls_before = manager.backend().calls.borrow().len();
    manager.add_subtask(
        task.id,
        &SubtaskCreate {
            title: "Outline".to_string(),
            description: None,
        },
    );
    let sub_id = manager.store().task(task.id).expect("task").subtasks[0].id;
    assert_eq!(manager.backend().calls.borrow().len(), calls_before + 1);

    for expected in [TaskStatus::InProgress, TaskStatus::Completed, TaskStatus::Pending] {
        manager.toggle_subtask_status(sub_id);
        let (_, sub) = manager.store().find_subtask(sub_id).expect("subtask");
        assert_eq!(sub.status, expected);
        assert_eq!(sub.task_id, Some(task.id));
    }

    manager.delete_subtask(sub_id);
    assert!(manager.store().find_subtask(sub_id).is_none());
    assert_eq!(manager.error(), None);
}

#[test]
fn creating_a_bare_task_yields_one_pending_task() {
    let mut manager = TaskManager::new(MemoryBackend::default(), "Home");
    manager.fetch_tasks();

    let created = manager.create_task(&draft("A", &[])).expect("create");

    assert_eq!(manager.tasks().len(), 1);
    let task = &manager.tasks()[0];
    assert_eq!(task, &created);
    assert_eq!(task.name, "A");
    assert_eq!(task.status, TaskStatus::Pending);
    assert!(task.subtasks.is_empty());
    assert_eq!(task.started_at, None);
    assert_eq!(task.completed_at, None);
    assert_eq!(task.page_name, "Home");
}

#[test]
fn deleting_a_task_keeps_other_tasks_subtasks() {
    let mut manager = TaskManager::new(MemoryBackend::default(), "Home");
    let doomed = manager.create_task(&draft("Doomed", &["d1", "d2"])).expect("create");
    let kept = manager.create_task(&draft("Kept", &["k1", "k2"])).expect("create");

    let kept_sub = kept.subtasks[0].id;
    manager.toggle_subtask_status(kept_sub);
    let shape = |task: &Task| -> Vec<(u64, String, TaskStatus)> {
        task.subtasks
            .iter()
            .map(|s| (s.id, s.title.clone(), s.status))
            .collect()
    };
    let before = shape(manager.store().task(kept.id).expect("kept"));

    manager.delete_task(doomed.id);

    assert_eq!(manager.tasks().len(), 1);
    let after = manager.store().task(kept.id).expect("kept");
    assert_eq!(shape(after), before);
    assert_eq!(after.subtasks[0].status, TaskStatus::InProgress);
    for sub in &doomed.subtasks {
        assert!(manager.store().find_subtask(sub.id).is_none());
    }
    assert_eq!(manager.error(), None);
}

#[test]
fn repeated_subtask_adds_all_stay_after_a_start() {
    let mut manager = TaskManager::new(MemoryBackend::default(), "Home");
    let task = manager.create_task(&draft("Launch", &[])).expect("create");

    manager.start_task(task.id);
    for title in ["Docs", "Release notes"] {
        manager.add_subtask(
            task.id,
            &SubtaskCreate {
                title: title.to_string(),
                description: None,
            },
        );
    }

    let local = manager.store().task(task.id).expect("task");
    assert_eq!(local.status, TaskStatus::InProgress);
    let titles: Vec<_> = local.subtasks.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, ["Docs", "Release notes"]);

    manager.backend().failing(503);
    manager.add_subtask(
        task.id,
        &SubtaskCreate {
            title: "Lost".to_string(),
            description: None,
        },
    );
    assert_eq!(manager.error(), Some("Failed to add subtask"));
    assert_eq!(manager.store().task(task.id).map(|t| t.subtasks.len()), Some(2));
}

#[test]
fn failures_record_generic_messages_and_keep_state() {
    let mut manager = TaskManager::new(MemoryBackend::default(), "Risk");
    let task = manager.create_task(&draft("Limits", &[])).expect("create");

    manager.backend().failing(500);
    manager.fetch_tasks();
    assert_eq!(manager.error(), Some("Failed to fetch tasks"));
    assert_eq!(manager.tasks().len(), 1);

    manager.start_task(task.id);
    assert_eq!(manager.error(), Some("Failed to start task"));
    assert_eq!(manager.tasks()[0].status, TaskStatus::Pending);

    let err = manager.create_task(&draft("Other", &[])).expect_err("create fails");
    assert_eq!(err.to_string(), "HTTP error! status: 500");
    assert_eq!(manager.error(), Some("Failed to create task"));
    assert!(!manager.store().is_submitting());

    manager.fetch_all_tasks_for_analytics();
    assert_eq!(manager.error(), Some("Failed to fetch tasks for analytics"));

    manager.backend().healthy();
    manager.refresh_tasks();
    assert_eq!(manager.error(), None);
    assert!(!manager.store().is_loading());
}

#[test]
fn toggling_an_unknown_subtask_is_reported() {
    let mut manager = TaskManager::new(MemoryBackend::default(), "Home");
    manager.fetch_tasks();
    manager.toggle_subtask_status(99);
    assert_eq!(manager.error(), Some("Failed to update subtask"));
    assert!(manager.backend().calls.borrow().iter().all(|c| !c.starts_with("PUT subtask")));
}

#[test]
fn analytics_pass_through_backend_counts() {
    let mut manager = TaskManager::new(MemoryBackend::default(), "Home");
    manager.create_task(&draft("a", &["x"])).expect("create");
    manager.create_task(&draft("b", &[])).expect("create");

    let summary = manager.analytics().expect("analytics");
    assert_eq!(summary.overall.total, 2);
    assert_eq!(summary.by_subtasks.with_subtasks, 1);

    manager.fetch_all_tasks_for_analytics();
    assert_eq!(manager.tasks().len(), 2);
}
