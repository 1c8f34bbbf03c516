use parking_lot::Mutex;
use serde::Serialize;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, sleep_until, timeout, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;
use vidcraft_engine::{Action, ActionKind, StudioError};

use crate::config::Timing;
use crate::studio::Studio;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionOutcome {
    Executed,
    /// Unknown kind; reported and skipped.
    Skipped { reason: String },
    /// A newer run started before this step finished.
    Superseded,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionRecord {
    pub index: usize,
    pub kind: String,
    pub reasoning: String,
    /// Offset from the start of the run at which the step began.
    #[serde(serialize_with = "as_millis")]
    pub started_after: Duration,
    pub outcome: ActionOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub records: Vec<ActionRecord>,
}

impl RunReport {
    pub fn executed(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.outcome == ActionOutcome::Executed)
            .count()
    }
}

pub struct RunHandle {
    pub run_id: Uuid,
    task: JoinHandle<RunReport>,
}

impl RunHandle {
    pub async fn finished(self) -> RunReport {
        match self.task.await {
            Ok(report) => report,
            Err(e) => {
                warn!("[Interpreter] Run {} aborted: {}", self.run_id, e);
                RunReport {
                    run_id: self.run_id,
                    records: Vec::new(),
                }
            }
        }
    }
}

/// Plays a planner's action list as a paced sequence of panel transitions.
///
/// Action `i` starts no earlier than `i * stagger` after `run` and never before action
/// `i - 1` has finished. Starting a new run cancels whatever the previous run still had
/// pending; steps that already happened stay applied.
pub struct ActionInterpreter {
    studio: Studio,
    timing: Timing,
    current: Mutex<Option<CancellationToken>>,
}

impl ActionInterpreter {
    pub fn new(studio: Studio) -> Self {
        let timing = studio.config().timing;
        ActionInterpreter {
            studio,
            timing,
            current: Mutex::new(None),
        }
    }

    pub fn run(&self, actions: Vec<Action>) -> RunHandle {
        let run_id = Uuid::new_v4();
        let token = CancellationToken::new();
        if let Some(previous) = self.current.lock().replace(token.clone()) {
            if !previous.is_cancelled() {
                debug!("[Interpreter] Run {} supersedes pending steps", run_id);
            }
            previous.cancel();
        }
        info!("[Interpreter] Run {} with {} actions", run_id, actions.len());

        let studio = self.studio.clone();
        let timing = self.timing;
        let task = tokio::spawn(async move {
            let records = execute(&studio, timing, actions, &token).await;
            RunReport { run_id, records }
        });
        RunHandle { run_id, task }
    }
}

async fn execute(
    studio: &Studio,
    timing: Timing,
    actions: Vec<Action>,
    token: &CancellationToken,
) -> Vec<ActionRecord> {
    let started = Instant::now();
    let mut records = Vec::with_capacity(actions.len());

    for (index, action) in actions.into_iter().enumerate() {
        let not_before = started + timing.stagger * index as u32;
        let step = async {
            sleep_until(not_before).await;
            let began = Instant::now();
            (began, perform(studio, timing, &action).await)
        };
        let (began, outcome) = tokio::select! {
            biased;
            _ = token.cancelled() => (Instant::now(), ActionOutcome::Superseded),
            finished = step => finished,
        };
        if outcome == ActionOutcome::Superseded {
            debug!("[Interpreter] Action {} superseded", index + 1);
        }
        records.push(ActionRecord {
            index,
            kind: action.kind.as_str().to_string(),
            reasoning: action.reasoning.clone(),
            started_after: began.saturating_duration_since(started),
            outcome,
        });
    }
    records
}

async fn perform(studio: &Studio, timing: Timing, action: &Action) -> ActionOutcome {
    match &action.kind {
        ActionKind::OpenLibrary => {
            info!("[Interpreter] Opening library: {}", action.reason());
            open_library(studio, timing).await;
            ActionOutcome::Executed
        }
        ActionKind::OpenEditor => {
            info!("[Interpreter] Opening editor: {}", action.reason());
            open_editor(studio, timing, action).await;
            ActionOutcome::Executed
        }
        ActionKind::Unknown(kind) => {
            let error = StudioError::UnknownActionKind(kind.clone());
            warn!("[Interpreter] {}", error);
            ActionOutcome::Skipped {
                reason: error.to_string(),
            }
        }
    }
}

/// Show the library, let it mount, then ask for data. Does not wait for the data.
async fn open_library(studio: &Studio, timing: Timing) -> u64 {
    studio.panels().set_library_visible(true);
    sleep(timing.mount_delay).await;
    studio.panels().request_refresh()
}

async fn open_editor(studio: &Studio, timing: Timing, action: &Action) {
    let ticket = open_library(studio, timing).await;
    if timeout(timing.editor_settle, studio.panels().wait_refreshed(ticket))
        .await
        .is_err()
    {
        debug!("[Interpreter] Catalog not refreshed within settle delay; seeding from cached data");
    }

    let suggested = action.suggested_asset_ids();
    if !suggested.is_empty() {
        studio.install_selection(suggested);
    }
    studio.panels().set_library_visible(false);
    sleep(timing.editor_open_delay).await;
    studio.open_editor_seeded();
}

fn as_millis<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}
