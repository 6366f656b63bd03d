//! Display status classification and the per-card action state machine.

use serde::{Deserialize, Serialize};

use crate::ContainerStatusResponse;

/// How long a "Done!" marker stays on an action button after success.
pub const ACTION_FEEDBACK_MS: u32 = 3_000;

/// The closed set of states an environment container is displayed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisplayStatus {
    Running,
    Starting,
    Error,
    Stopped,
}

impl DisplayStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayStatus::Running => "Running",
            DisplayStatus::Starting => "Starting",
            DisplayStatus::Error => "Error",
            DisplayStatus::Stopped => "Stopped",
        }
    }

    /// CSS modifier used by the status badge.
    pub fn css_class(&self) -> &'static str {
        match self {
            DisplayStatus::Running => "running",
            DisplayStatus::Starting => "starting",
            DisplayStatus::Error => "error",
            DisplayStatus::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for DisplayStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a free-text Azure status onto a [`DisplayStatus`].
///
/// Case-insensitive substring match, first hit wins:
/// "running"/"succeed" > "stop" > "fail"/"error". Anything else, including the
/// empty string and transitional provisioning states, is `Starting`.
pub fn classify(raw: &str) -> DisplayStatus {
    let s = raw.to_lowercase();
    if s.contains("running") || s.contains("succeed") {
        DisplayStatus::Running
    } else if s.contains("stop") {
        DisplayStatus::Stopped
    } else if s.contains("fail") || s.contains("error") {
        DisplayStatus::Error
    } else {
        DisplayStatus::Starting
    }
}

/// Coarse health of a card, used for its accent colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverallHealth {
    Healthy,
    Starting,
    Error,
}

/// Display statuses for the two container roles of an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPair {
    pub frontend: DisplayStatus,
    pub backend: DisplayStatus,
}

impl StatusPair {
    pub fn uniform(status: DisplayStatus) -> Self {
        Self {
            frontend: status,
            backend: status,
        }
    }

    pub fn all(&self, status: DisplayStatus) -> bool {
        self.frontend == status && self.backend == status
    }

    pub fn any(&self, status: DisplayStatus) -> bool {
        self.frontend == status || self.backend == status
    }

    pub fn all_running(&self) -> bool {
        self.all(DisplayStatus::Running)
    }

    pub fn all_stopped(&self) -> bool {
        self.all(DisplayStatus::Stopped)
    }

    pub fn overall(&self) -> OverallHealth {
        if self.any(DisplayStatus::Error) {
            OverallHealth::Error
        } else if self.any(DisplayStatus::Starting) {
            OverallHealth::Starting
        } else {
            OverallHealth::Healthy
        }
    }
}

impl From<&ContainerStatusResponse> for StatusPair {
    fn from(raw: &ContainerStatusResponse) -> Self {
        Self {
            frontend: classify(&raw.frontend_status),
            backend: classify(&raw.backend_status),
        }
    }
}

/// Lifecycle actions a user can trigger on an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvAction {
    Start,
    Stop,
    Restart,
}

impl EnvAction {
    /// Path segment of the action endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvAction::Start => "start",
            EnvAction::Stop => "stop",
            EnvAction::Restart => "restart",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EnvAction::Start => "Start",
            EnvAction::Stop => "Stop",
            EnvAction::Restart => "Restart",
        }
    }

    pub fn progress_label(&self) -> &'static str {
        match self {
            EnvAction::Start => "Starting...",
            EnvAction::Stop => "Stopping...",
            EnvAction::Restart => "Restarting...",
        }
    }
}

impl std::fmt::Display for EnvAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visibility and enablement of one action button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlState {
    pub visible: bool,
    pub enabled: bool,
}

/// Gating for the three action buttons of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Controls {
    pub start: ControlState,
    pub stop: ControlState,
    pub restart: ControlState,
}

/// Local state of one environment card: the latest display statuses plus
/// the in-flight flags of user-triggered actions.
///
/// Start and restart optimistically flip both statuses to `Starting` before
/// the backend call goes out. A failed action only clears its flag; the
/// predicted statuses stay until the next poll reconciles them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardState {
    pub statuses: StatusPair,
    pub starting: bool,
    pub stopping: bool,
    pub restarting: bool,
    /// Last action that succeeded, cleared after [`ACTION_FEEDBACK_MS`].
    pub succeeded: Option<EnvAction>,
}

impl CardState {
    pub fn new(statuses: StatusPair) -> Self {
        Self {
            statuses,
            starting: false,
            stopping: false,
            restarting: false,
            succeeded: None,
        }
    }

    /// Replace both statuses with a poll result.
    pub fn apply_poll(&mut self, statuses: StatusPair) {
        self.statuses = statuses;
    }

    pub fn in_flight(&self, action: EnvAction) -> bool {
        match action {
            EnvAction::Start => self.starting,
            EnvAction::Stop => self.stopping,
            EnvAction::Restart => self.restarting,
        }
    }

    fn set_in_flight(&mut self, action: EnvAction, value: bool) {
        match action {
            EnvAction::Start => self.starting = value,
            EnvAction::Stop => self.stopping = value,
            EnvAction::Restart => self.restarting = value,
        }
    }

    fn any_in_flight(&self) -> bool {
        self.starting || self.stopping || self.restarting
    }

    /// Mark `action` as issued. Call right before sending the request.
    pub fn begin(&mut self, action: EnvAction) {
        self.set_in_flight(action, true);
        if self.succeeded == Some(action) {
            self.succeeded = None;
        }
        if matches!(action, EnvAction::Start | EnvAction::Restart) {
            self.statuses = StatusPair::uniform(DisplayStatus::Starting);
        }
    }

    /// Record the backend's answer to an action issued with [`begin`](Self::begin).
    pub fn complete(&mut self, action: EnvAction, ok: bool) {
        self.set_in_flight(action, false);
        if !ok {
            return;
        }
        self.succeeded = Some(action);
        if action == EnvAction::Stop {
            self.statuses = StatusPair::uniform(DisplayStatus::Stopped);
        }
    }

    /// Drop the "done" marker, unless a newer success replaced it.
    pub fn clear_feedback(&mut self, action: EnvAction) {
        if self.succeeded == Some(action) {
            self.succeeded = None;
        }
    }

    pub fn is_busy(&self) -> bool {
        self.any_in_flight() || self.statuses.any(DisplayStatus::Starting)
    }

    pub fn controls(&self) -> Controls {
        let all_stopped = self.statuses.all_stopped();
        let all_running = self.statuses.all_running();
        let busy = self.is_busy();

        Controls {
            start: ControlState {
                visible: all_stopped || self.starting,
                enabled: !busy,
            },
            stop: ControlState {
                visible: all_running || self.stopping,
                enabled: !self.any_in_flight(),
            },
            restart: ControlState {
                visible: all_running || self.restarting,
                enabled: !busy && !all_stopped,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_running_wins_over_everything() {
        for raw in [
            "Running",
            "RUNNING",
            "running but error reported",
            "Succeeded",
            "provisioning succeeded after failed attempt",
            "stopped? no, running",
        ] {
            assert_eq!(classify(raw), DisplayStatus::Running, "{raw}");
        }
    }

    #[test]
    fn classify_precedence_and_default() {
        assert_eq!(classify("Failed"), DisplayStatus::Error);
        assert_eq!(classify("error: timeout"), DisplayStatus::Error);
        assert_eq!(classify("Stopping"), DisplayStatus::Stopped);
        assert_eq!(classify("Stopped"), DisplayStatus::Stopped);
        assert_eq!(classify("stop failed"), DisplayStatus::Stopped);
        assert_eq!(classify(""), DisplayStatus::Starting);
        assert_eq!(classify("Provisioning"), DisplayStatus::Starting);
        assert_eq!(classify("Deprovisioning"), DisplayStatus::Starting);
    }

    #[test]
    fn overall_health_prefers_error() {
        let pair = StatusPair {
            frontend: DisplayStatus::Starting,
            backend: DisplayStatus::Error,
        };
        assert_eq!(pair.overall(), OverallHealth::Error);
        assert_eq!(
            StatusPair::uniform(DisplayStatus::Stopped).overall(),
            OverallHealth::Healthy
        );
    }

    #[test]
    fn start_flow_flips_to_starting_then_poll_reconciles() {
        let mut card = CardState::new(StatusPair::uniform(DisplayStatus::Stopped));
        let controls = card.controls();
        assert!(controls.start.visible && controls.start.enabled);
        assert!(!controls.stop.visible);
        assert!(!controls.restart.visible);

        card.begin(EnvAction::Start);
        assert_eq!(card.statuses, StatusPair::uniform(DisplayStatus::Starting));
        let controls = card.controls();
        assert!(controls.start.visible);
        assert!(!controls.start.enabled);
        assert!(!controls.stop.visible);
        assert!(!controls.restart.visible);
        assert!(!controls.restart.enabled);

        card.complete(EnvAction::Start, true);
        assert_eq!(card.succeeded, Some(EnvAction::Start));
        assert_eq!(card.statuses, StatusPair::uniform(DisplayStatus::Starting));

        card.apply_poll(StatusPair::uniform(DisplayStatus::Running));
        let controls = card.controls();
        assert!(!controls.start.visible);
        assert!(controls.stop.visible && controls.stop.enabled);
        assert!(controls.restart.visible && controls.restart.enabled);
    }

    #[test]
    fn confirmed_stop_sets_stopped() {
        let mut card = CardState::new(StatusPair::uniform(DisplayStatus::Running));
        card.begin(EnvAction::Stop);
        assert_eq!(card.statuses, StatusPair::uniform(DisplayStatus::Running));
        let controls = card.controls();
        assert!(controls.stop.visible && !controls.stop.enabled);
        assert!(!controls.restart.enabled);

        card.complete(EnvAction::Stop, true);
        assert_eq!(card.statuses, StatusPair::uniform(DisplayStatus::Stopped));
        assert!(card.controls().start.visible);
    }

    #[test]
    fn failed_restart_keeps_optimistic_status() {
        let mut card = CardState::new(StatusPair::uniform(DisplayStatus::Running));
        card.begin(EnvAction::Restart);
        card.complete(EnvAction::Restart, false);

        assert!(!card.restarting);
        assert_eq!(card.succeeded, None);
        assert_eq!(card.statuses, StatusPair::uniform(DisplayStatus::Starting));
        assert!(card.is_busy());
    }

    #[test]
    fn failed_stop_leaves_statuses_alone() {
        let mut card = CardState::new(StatusPair::uniform(DisplayStatus::Running));
        card.begin(EnvAction::Stop);
        card.complete(EnvAction::Stop, false);
        assert_eq!(card.statuses, StatusPair::uniform(DisplayStatus::Running));
        assert!(!card.is_busy());
    }

    #[test]
    fn restart_disabled_when_mixed_or_stopped() {
        let card = CardState::new(StatusPair {
            frontend: DisplayStatus::Running,
            backend: DisplayStatus::Error,
        });
        let controls = card.controls();
        assert!(!controls.start.visible);
        assert!(!controls.stop.visible);
        assert!(!controls.restart.visible);

        let card = CardState::new(StatusPair::uniform(DisplayStatus::Stopped));
        assert!(!card.controls().restart.enabled);
    }

    #[test]
    fn feedback_marker_clears_only_matching_action() {
        let mut card = CardState::new(StatusPair::uniform(DisplayStatus::Running));
        card.begin(EnvAction::Restart);
        card.complete(EnvAction::Restart, true);
        card.clear_feedback(EnvAction::Stop);
        assert_eq!(card.succeeded, Some(EnvAction::Restart));
        card.clear_feedback(EnvAction::Restart);
        assert_eq!(card.succeeded, None);
    }
}
