//! Terminal progress driven by the event bus.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::domain::models::{EventKind, HunterEvent};
use crate::services::EventBus;

const PROGRESS_TEMPLATE: &str = "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}";
const SPINNER_TEMPLATE: &str = "[{elapsed_precise}] {spinner:.green} {msg}";
const PROGRESS_CHARS: &str = "█▓▒░ ";
const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Spinner on stderr.
pub fn create_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template(SPINNER_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars(SPINNER_CHARS),
    );
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(PROGRESS_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars(PROGRESS_CHARS)
}

/// Spinner that turns into a bar once a validation pass announces its size.
pub struct EventProgress {
    bar: ProgressBar,
    listener: JoinHandle<()>,
}

impl EventProgress {
    /// Start listening. A hidden bar is used in JSON mode so stdout stays clean.
    pub fn attach(bus: &EventBus, visible: bool) -> Self {
        let bar = create_spinner();
        if !visible {
            bar.set_draw_target(ProgressDrawTarget::hidden());
        }
        let mut receiver = bus.subscribe();
        let listener_bar = bar.clone();
        let listener = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => apply(&listener_bar, &event),
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                }
            }
        });
        Self { bar, listener }
    }

    /// Stop the spinner and the listener.
    pub fn finish(self) {
        self.listener.abort();
        self.bar.finish_and_clear();
    }
}

fn apply(bar: &ProgressBar, event: &HunterEvent) {
    match &event.kind {
        EventKind::ProductReceived { .. } => bar.set_message("product received"),
        EventKind::MarketResearchStarted => bar.set_message("researching market"),
        EventKind::MarketResearchDone { competitors, .. } => {
            bar.set_message(format!("research done ({competitors} competitors)"));
        }
        EventKind::StrategyGenerated { mode, .. } => {
            bar.set_message(format!("strategy drafted ({})", mode.as_str()));
        }
        EventKind::StrategyStored { version, .. } => {
            bar.set_message(format!("stored strategy v{version}"));
        }
        EventKind::ValidationStarted { version, total } => {
            bar.set_style(bar_style());
            bar.set_length(*total as u64);
            bar.set_position(0);
            bar.set_message(format!("validating v{version}"));
        }
        EventKind::LeadValidating { company, .. } => bar.set_message(company.clone()),
        EventKind::LeadValidated {
            company,
            classification,
            ..
        } => {
            bar.inc(1);
            bar.set_message(format!("{company}: {classification}"));
        }
        EventKind::LeadValidationFailed { company, .. } => {
            bar.inc(1);
            bar.set_message(format!("{company}: failed"));
        }
        EventKind::PivotTriggered { disregard_rate, .. } => {
            bar.println(format!("pivot triggered at {:.0}% disregard", disregard_rate * 100.0));
        }
        EventKind::TriggerReceived { competitor, status } => {
            bar.set_message(format!("{status} at {competitor}"));
        }
        EventKind::OutreachDrafted { domain, .. } => bar.set_message(format!("drafted for {domain}")),
        EventKind::ValidationCompleted { .. }
        | EventKind::TriggerHandled { .. }
        | EventKind::AgentError { .. } => {}
    }
}
