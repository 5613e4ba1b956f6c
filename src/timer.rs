use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::events::Notice;
use crate::hms::{format_hms, parse_hms};
use crate::models::{Id, Task, TimerStatus};
use crate::projects::ProjectStore;
use crate::ticker::Ticker;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    Idle,
    Running,
    Stopped,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerState {
    pub is_running: bool,
    pub start_time: Option<DateTime<Utc>>,
    /// Seconds since `start_time`, refreshed by the ticker. Display only.
    pub elapsed: u64,
    /// Server-reported total, parsed from `H:M:S`.
    pub total: u64,
    pub active_task_id: Option<Id>,
    /// Task whose toggle request is still waiting for the server.
    pub pending_task_id: Option<Id>,
}

impl TimerState {
    pub fn phase(&self) -> TimerPhase {
        match (self.is_running, self.active_task_id) {
            (true, _) => TimerPhase::Running,
            (false, Some(_)) => TimerPhase::Stopped,
            (false, None) => TimerPhase::Idle,
        }
    }

    /// Task the timer is committed to: the running one, or the one a
    /// toggle is in flight for.
    pub fn busy_with(&self) -> Option<Id> {
        if self.is_running {
            self.active_task_id
        } else {
            self.pending_task_id
        }
    }

    pub fn display_seconds(&self) -> u64 {
        if self.is_running {
            self.total + self.elapsed
        } else {
            self.total
        }
    }
}

pub fn format_time(total_seconds: u64) -> String {
    format_hms(total_seconds)
}

/// Time tracking for the task open in the editor. At most one task runs at
/// a time; the server decides whether a toggle started or stopped it.
pub struct TaskTimer {
    store: Arc<ProjectStore>,
    clock: Arc<dyn Clock>,
    tick_interval: Duration,
    state: Arc<Mutex<TimerState>>,
    ticker: Mutex<Option<Ticker>>,
}

impl TaskTimer {
    pub fn new(store: Arc<ProjectStore>, clock: Arc<dyn Clock>, tick_interval: Duration) -> Self {
        Self {
            store,
            clock,
            tick_interval,
            state: Arc::new(Mutex::new(TimerState::default())),
            ticker: Mutex::new(None),
        }
    }

    pub fn state(&self) -> TimerState {
        self.state.lock().expect("timer poisoned").clone()
    }

    pub fn display(&self) -> String {
        format_time(self.state().display_seconds())
    }

    fn notify(&self, notice: Notice) {
        self.store.api().ui().notify(notice);
    }

    fn cancel_tick(&self) {
        if let Some(ticker) = self.ticker.lock().expect("ticker poisoned").take() {
            ticker.cancel();
        }
    }

    /// Opens `task` in the editor. Refused while another task's timer runs
    /// or is being toggled.
    pub fn select_task(&self, task: Task) -> bool {
        let mut timer = self.state.lock().expect("timer poisoned");
        let busy_with = timer.busy_with();
        if busy_with.is_some_and(|id| id != task.id) {
            log::warn!(
                "refusing to open task {} while timer is busy with {busy_with:?}",
                task.id
            );
            self.notify(Notice::warning(
                "Cannot open another task",
                "Stop the timer before opening a different task.",
            ));
            return false;
        }

        let board = self.store.state();
        board.set_selected_task(Some(task.clone()));
        board.set_editor_open(true);
        if busy_with.is_some() {
            return true;
        }

        self.cancel_tick();
        *timer = TimerState {
            active_task_id: Some(task.id),
            total: seed_total(&task),
            ..TimerState::default()
        };
        true
    }

    /// Clears the selection and returns to idle. Refused while running.
    pub fn deselect(&self) -> bool {
        let mut timer = self.state.lock().expect("timer poisoned");
        if timer.busy_with().is_some() {
            self.notify(Notice::warning(
                "Timer is running",
                "Stop the timer before closing the task.",
            ));
            return false;
        }
        self.cancel_tick();
        *timer = TimerState::default();
        let board = self.store.state();
        board.set_selected_task(None);
        board.set_editor_open(false);
        true
    }

    /// Hides the editor; the selection and the timer are kept.
    pub fn close_editor(&self) {
        self.store.state().set_editor_open(false);
    }

    /// Asks the server to start or stop tracking the selected task and
    /// applies the reported status. Failures are logged and surfaced as a
    /// notice; the state stays as it was, except that the ticker is always
    /// cancelled before the request goes out.
    pub async fn toggle(&self) -> TimerState {
        let Some(selected) = self.store.state().selected_task() else {
            log::debug!("timer toggle ignored: no task selected");
            return self.state();
        };
        let task_id = {
            let mut timer = self.state.lock().expect("timer poisoned");
            if let Some(pending) = timer.pending_task_id {
                log::debug!("timer toggle ignored: request for task {pending} in flight");
                return timer.clone();
            }
            let task_id = timer.active_task_id.unwrap_or(selected.id);
            timer.pending_task_id = Some(task_id);
            task_id
        };

        self.cancel_tick();

        match self.store.api().toggle_timer(task_id).await {
            Ok(response) => match response.status {
                TimerStatus::TimerStarted => self.start(task_id),
                TimerStatus::TimerStopped => {
                    self.stop(response.total_time.as_deref());
                    if let Err(err) = self.store.refresh_one(task_id).await {
                        log::error!("failed to refresh task {task_id}: {err}");
                        self.notify(Notice::error("Failed to refresh task data"));
                    }
                }
                TimerStatus::Unknown => {
                    self.settle();
                    log::warn!("unexpected timer status for task {task_id}");
                    self.notify(Notice::error("Timer control failed"));
                }
            },
            Err(err) => {
                self.settle();
                log::error!("timer toggle failed for task {task_id}: {err}");
                self.notify(Notice::error("Timer control failed"));
            }
        }

        self.state()
    }

    fn start(&self, task_id: Id) {
        {
            let mut timer = self.state.lock().expect("timer poisoned");
            timer.pending_task_id = None;
            timer.is_running = true;
            timer.start_time = Some(self.clock.now());
            timer.active_task_id = Some(task_id);
            timer.elapsed = 0;
        }
        log::info!("timer started task_id={task_id}");

        let state = self.state.clone();
        let clock = self.clock.clone();
        let ticker = Ticker::start(self.tick_interval, move || {
            let mut timer = state.lock().expect("timer poisoned");
            if let (true, Some(start)) = (timer.is_running, timer.start_time) {
                timer.elapsed = (clock.now() - start).num_seconds().max(0) as u64;
            }
        });
        *self.ticker.lock().expect("ticker poisoned") = Some(ticker);
    }

    fn settle(&self) {
        self.state.lock().expect("timer poisoned").pending_task_id = None;
    }

    fn stop(&self, total_time: Option<&str>) {
        let mut timer = self.state.lock().expect("timer poisoned");
        timer.pending_task_id = None;
        timer.is_running = false;
        timer.start_time = None;
        if let Some(text) = total_time {
            match parse_hms(text) {
                Ok(total) => timer.total = total,
                Err(err) => log::warn!("ignoring unparsable total_time: {err}"),
            }
        }
        log::info!(
            "timer stopped task_id={:?} total={}",
            timer.active_task_id,
            timer.total
        );
    }
}

fn seed_total(task: &Task) -> u64 {
    match task.time.as_deref().map(parse_hms) {
        Some(Ok(total)) => total,
        Some(Err(err)) => {
            log::warn!("task {} has unparsable time: {err}", task.id);
            0
        }
        None => 0,
    }
}
