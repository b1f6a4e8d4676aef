//! Terminal rendering of review progress.

use crate::review::{ProjectId, ReviewEvent, ReviewPhase, ReviewState};
use crate::ui::icons::{CHECK, CROSS, REVIEW, STOP};
use console::{Term, style};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::collections::HashMap;
use std::io::Write;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Output mode for the review board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UiMode {
    /// One progress bar per project
    #[default]
    Full,
    /// A line per phase change
    Minimal,
    /// Every event as a JSON line
    Json,
}

impl std::str::FromStr for UiMode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "json" => Self::Json,
            "minimal" => Self::Minimal,
            _ => Self::Full,
        })
    }
}

impl UiMode {
    pub fn parse(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

/// Live view of several project reviews.
///
/// Feed it every [`ReviewEvent`] from the controller; it keeps one bar per
/// project and never shows 100% unless the review actually completed there.
pub struct ReviewBoard {
    mode: UiMode,
    multi: MultiProgress,
    bars: Mutex<HashMap<ProjectId, ProgressBar>>,
    /// Last phase printed per project in minimal mode
    printed: Mutex<HashMap<ProjectId, ReviewPhase>>,
    term: Term,
}

impl ReviewBoard {
    pub fn new(mode: UiMode) -> Self {
        Self::with_multi(mode, MultiProgress::new())
    }

    /// Board that draws nothing; events are still tracked.
    pub fn hidden(mode: UiMode) -> Self {
        Self::with_multi(
            mode,
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
        )
    }

    fn with_multi(mode: UiMode, multi: MultiProgress) -> Self {
        Self {
            mode,
            multi,
            bars: Mutex::new(HashMap::new()),
            printed: Mutex::new(HashMap::new()),
            term: Term::stdout(),
        }
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("  {prefix:.bold} [{bar:30.green/white}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░")
    }

    /// Add a bar for `project_id` ahead of its first event so bars appear in
    /// the order projects were requested.
    pub fn track(&self, project_id: ProjectId, initial: &ReviewState) {
        if self.mode != UiMode::Full {
            return;
        }
        let mut bars = self.bars.lock().unwrap_or_else(PoisonError::into_inner);
        let bar = bars.entry(project_id).or_insert_with(|| {
            let bar = self.multi.add(ProgressBar::new(100));
            bar.set_style(Self::bar_style());
            bar.set_prefix(format!("[project {}]", project_id));
            bar
        });
        apply_state(bar, initial);
    }

    /// Render one event.
    pub fn handle_event(&self, event: &ReviewEvent) {
        match self.mode {
            UiMode::Json => {
                if let Ok(json) = serde_json::to_string(event) {
                    let _ = writeln!(&self.term, "{}", json);
                }
            }
            UiMode::Minimal => self.handle_minimal(event),
            UiMode::Full => self.track(event.project_id, &event.state),
        }
    }

    fn handle_minimal(&self, event: &ReviewEvent) {
        let phase = event.state.phase();
        let mut printed = self.printed.lock().unwrap_or_else(PoisonError::into_inner);
        if printed.get(&event.project_id) == Some(&phase) {
            return;
        }
        printed.insert(event.project_id, phase);
        let _ = writeln!(
            &self.term,
            "project {}: {}",
            event.project_id,
            console::strip_ansi_codes(&status_line(&event.state))
        );
    }

    /// Current bar position for a project, if it has a bar.
    pub fn position(&self, project_id: ProjectId) -> Option<u64> {
        let bars = self.bars.lock().unwrap_or_else(PoisonError::into_inner);
        bars.get(&project_id).map(ProgressBar::position)
    }

    /// Stop all spinners and print a final summary line per project.
    pub fn finish(&self, states: &[(ProjectId, ReviewState)]) {
        {
            let bars = self.bars.lock().unwrap_or_else(PoisonError::into_inner);
            for bar in bars.values() {
                if !bar.is_finished() {
                    bar.abandon();
                }
            }
        }
        if self.mode == UiMode::Json {
            return;
        }

        let completed = states
            .iter()
            .filter(|(_, s)| s.phase() == ReviewPhase::Completed)
            .count();
        println!();
        println!(
            "{} {}/{} reviews completed",
            REVIEW,
            style(completed).green().bold(),
            states.len()
        );
    }
}

fn apply_state(bar: &ProgressBar, state: &ReviewState) {
    if state.is_running() {
        if bar.is_finished() {
            bar.reset();
        }
        bar.enable_steady_tick(Duration::from_millis(120));
        bar.set_position(u64::from(state.progress()));
        bar.set_message(status_line(state));
    } else if state.phase() == ReviewPhase::Idle {
        bar.set_position(0);
        bar.set_message(status_line(state));
    } else {
        // `finish_*` would jump the bar to its length; keep the real position.
        bar.set_position(u64::from(state.progress()));
        bar.abandon_with_message(status_line(state));
    }
}

/// Human-readable status for a review state.
pub fn status_line(state: &ReviewState) -> String {
    match state.phase() {
        ReviewPhase::Idle => style("waiting").dim().to_string(),
        ReviewPhase::Running => format!("{}{}", REVIEW, style("reviewing...").cyan()),
        ReviewPhase::Completed => {
            let comment = state.comment().unwrap_or_default();
            if comment.is_empty() {
                format!("{}{}", CHECK, style("done").green().bold())
            } else {
                format!("{}{} {}", CHECK, style("done").green().bold(), comment)
            }
        }
        ReviewPhase::Failed => format!(
            "{}{} {}",
            CROSS,
            style("failed:").red().bold(),
            state.error_message().unwrap_or_default()
        ),
        ReviewPhase::Cancelled => format!(
            "{}{}",
            STOP,
            style(state.error_message().unwrap_or_default()).yellow()
        ),
    }
}
