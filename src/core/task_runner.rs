// src/core/task_runner.rs

use anyhow::{Context as _, Result, anyhow};
use colored::Colorize;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

/// Caller-owned mutable state shared by every task in one run.
///
/// The runner hands each skip predicate and action a clone of this handle;
/// the caller keeps its own clone and reads the final state after the run.
/// Beyond the mutex there is no synchronization: concurrent runs are only
/// correct when tasks write disjoint fields of the context. That discipline
/// is a caller obligation, not something the runner enforces.
pub type SharedContext<C> = Arc<Mutex<C>>;

/// Wraps a context value for one run.
pub fn shared_context<C>(context: C) -> SharedContext<C> {
    Arc::new(Mutex::new(context))
}

/// Outcome of a task's skip predicate, evaluated before its action.
///
/// The reason is surfaced verbatim to the reporter; an empty reason is still
/// a skip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipDecision {
    Proceed,
    Skip(String),
}

type SkipFuture = Pin<Box<dyn Future<Output = SkipDecision> + Send>>;
type ActionFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;

type SkipFn<C> = Box<dyn Fn(SharedContext<C>) -> SkipFuture + Send + Sync>;
type ActionFn<C> = Box<dyn Fn(SharedContext<C>, Arc<TaskHandle>) -> ActionFuture + Send + Sync>;

/// One independently skippable unit of work.
pub struct Task<C> {
    title: String,
    skip: Option<SkipFn<C>>,
    action: ActionFn<C>,
}

impl<C> Task<C> {
    pub fn new<F, Fut>(title: impl Into<String>, action: F) -> Self
    where
        F: Fn(SharedContext<C>, Arc<TaskHandle>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            title: title.into(),
            skip: None,
            action: Box::new(move |context, handle| Box::pin(action(context, handle))),
        }
    }

    /// Attaches a guard evaluated before the action. A [`SkipDecision::Skip`]
    /// means the action never runs and the task is recorded as skipped with
    /// that reason.
    pub fn with_skip<F, Fut>(mut self, skip: F) -> Self
    where
        F: Fn(SharedContext<C>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = SkipDecision> + Send + 'static,
    {
        self.skip = Some(Box::new(move |context| Box::pin(skip(context))));
        self
    }
}

impl<C> fmt::Debug for Task<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("title", &self.title)
            .field("has_skip", &self.skip.is_some())
            .finish()
    }
}

/// Lets a running action mutate its own displayed title or mark itself
/// skipped mid-execution (used to report a partial remote failure without
/// failing the whole task).
#[derive(Debug)]
pub struct TaskHandle {
    title: Mutex<String>,
    skip_reason: Mutex<Option<String>>,
}

impl TaskHandle {
    fn new(title: String) -> Self {
        Self {
            title: Mutex::new(title),
            skip_reason: Mutex::new(None),
        }
    }

    pub fn set_title(&self, title: impl Into<String>) {
        *self.title.lock().unwrap() = title.into();
    }

    pub fn title(&self) -> String {
        self.title.lock().unwrap().clone()
    }

    /// Marks the task as skipped with a reason. The action should return
    /// `Ok(())` afterwards; an error outranks the skip.
    pub fn skip(&self, reason: impl Into<String>) {
        *self.skip_reason.lock().unwrap() = Some(reason.into());
    }

    fn skip_reason(&self) -> Option<String> {
        self.skip_reason.lock().unwrap().clone()
    }
}

/// How a run schedules its tasks and reacts to action failures.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Start every non-skipped action together instead of one at a time in
    /// list order.
    pub concurrent: bool,
    /// Sequential runs only: record an action failure and keep going instead
    /// of aborting the run. Concurrent runs always isolate failures.
    pub keep_going: bool,
}

impl RunOptions {
    pub const fn sequential() -> Self {
        Self {
            concurrent: false,
            keep_going: false,
        }
    }

    pub const fn concurrent() -> Self {
        Self {
            concurrent: true,
            keep_going: false,
        }
    }

    pub const fn keep_going(mut self) -> Self {
        self.keep_going = true;
        self
    }
}

/// Terminal state of one task.
#[derive(Debug)]
pub enum TaskOutcome {
    Succeeded,
    Skipped(String),
    Failed(anyhow::Error),
}

#[derive(Debug)]
pub struct TaskReport {
    /// Final title, including any retitle the action performed.
    pub title: String,
    pub outcome: TaskOutcome,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub reports: Vec<TaskReport>,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.count(|outcome| matches!(outcome, TaskOutcome::Succeeded))
    }

    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, TaskOutcome::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, TaskOutcome::Failed(_)))
    }

    fn count(&self, predicate: impl Fn(&TaskOutcome) -> bool) -> usize {
        self.reports
            .iter()
            .filter(|report| predicate(&report.outcome))
            .count()
    }
}

/// Runs every task against the shared context and reports per-task outcomes.
///
/// Concurrent mode starts all tasks together, isolates failures per task and
/// always resolves once every task has settled; completion order carries no
/// guarantee. Sequential mode evaluates skips and starts actions strictly in
/// list order, so a later task's skip predicate can observe context written
/// by an earlier action; an action failure aborts the run (remaining tasks
/// never start) unless `keep_going` is set.
pub async fn run<C>(
    tasks: Vec<Task<C>>,
    context: &SharedContext<C>,
    options: RunOptions,
) -> Result<RunSummary>
where
    C: Send + 'static,
{
    let mut summary = RunSummary::default();

    if options.concurrent {
        let handles: Vec<(String, tokio::task::JoinHandle<TaskReport>)> = tasks
            .into_iter()
            .map(|task| {
                let title = task.title.clone();
                (title, tokio::spawn(run_one(task, Arc::clone(context))))
            })
            .collect();

        for (title, handle) in handles {
            let report = match handle.await {
                Ok(report) => report,
                Err(e) => TaskReport {
                    title,
                    outcome: TaskOutcome::Failed(anyhow!("Task panicked: {e}")),
                },
            };
            summary.reports.push(report);
        }
    } else {
        for task in tasks {
            let report = run_one(task, Arc::clone(context)).await;
            match report.outcome {
                TaskOutcome::Failed(error) if !options.keep_going => {
                    return Err(error).with_context(|| format!("Task '{}' failed", report.title));
                }
                outcome => summary.reports.push(TaskReport {
                    title: report.title,
                    outcome,
                }),
            }
        }
    }

    Ok(summary)
}

async fn run_one<C>(task: Task<C>, context: SharedContext<C>) -> TaskReport {
    log::debug!("Task '{}' starting", task.title);

    if let Some(skip) = &task.skip {
        if let SkipDecision::Skip(reason) = skip(Arc::clone(&context)).await {
            report_skipped(&task.title, &reason);
            return TaskReport {
                title: task.title,
                outcome: TaskOutcome::Skipped(reason),
            };
        }
    }

    let handle = Arc::new(TaskHandle::new(task.title.clone()));
    let outcome = match (task.action)(context, Arc::clone(&handle)).await {
        Ok(()) => match handle.skip_reason() {
            Some(reason) => TaskOutcome::Skipped(reason),
            None => TaskOutcome::Succeeded,
        },
        Err(error) => TaskOutcome::Failed(error),
    };

    let title = handle.title();
    match &outcome {
        TaskOutcome::Succeeded => println!("{} {}", "✔".green(), title),
        TaskOutcome::Skipped(reason) => report_skipped(&title, reason),
        TaskOutcome::Failed(error) => {
            println!("{} {} {}", "✖".red(), title, error.to_string().red());
        }
    }

    TaskReport { title, outcome }
}

fn report_skipped(title: &str, reason: &str) {
    println!("{} {} {}", "↓".yellow(), title, format!("[{reason}]").dimmed());
}
