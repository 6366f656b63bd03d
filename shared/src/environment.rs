//! Environment records as the backend stores them, the view model the
//! dashboard renders, and the list that backs the dashboard grid.

use serde::{Deserialize, Serialize};

use crate::status::{DisplayStatus, StatusPair};

/// Backend identifier of an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvironmentId(pub i64);

impl std::fmt::Display for EnvironmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for EnvironmentId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(EnvironmentId)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EnvironmentType {
    Prod,
    Qa,
    #[default]
    Dev,
    Integration,
}

impl EnvironmentType {
    pub const ALL: [EnvironmentType; 4] = [
        EnvironmentType::Prod,
        EnvironmentType::Qa,
        EnvironmentType::Dev,
        EnvironmentType::Integration,
    ];

    /// Wire value, e.g. "INTEGRATION".
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvironmentType::Prod => "PROD",
            EnvironmentType::Qa => "QA",
            EnvironmentType::Dev => "DEV",
            EnvironmentType::Integration => "INTEGRATION",
        }
    }

    /// Badge text shown on a card.
    pub fn short_label(&self) -> &'static str {
        match self {
            EnvironmentType::Integration => "INT",
            other => other.as_str(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EnvironmentType::Prod => "Production",
            EnvironmentType::Qa => "QA / Staging",
            EnvironmentType::Dev => "Development",
            EnvironmentType::Integration => "Integration",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "PROD" => EnvironmentType::Prod,
            "QA" => EnvironmentType::Qa,
            "INTEGRATION" | "INT" => EnvironmentType::Integration,
            _ => EnvironmentType::Dev,
        }
    }
}

impl std::fmt::Display for EnvironmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn lossy_type<'de, D>(deserializer: D) -> Result<EnvironmentType, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .as_deref()
        .map(EnvironmentType::from_str_lossy)
        .unwrap_or_default())
}

fn default_true() -> bool {
    true
}

/// An environment as returned by `GET /environments/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentRecord {
    pub id: EnvironmentId,
    pub name: String,
    pub resource_group: String,
    pub frontend_app_name: String,
    pub backend_app_name: String,
    /// Not every backend version stores a type; missing means DEV
    #[serde(rename = "type", default, deserialize_with = "lossy_type")]
    pub env_type: EnvironmentType,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Body of `POST /environments/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateEnvironmentRequest {
    pub name: String,
    pub resource_group: String,
    pub frontend_app_name: String,
    pub backend_app_name: String,
    #[serde(rename = "type")]
    pub env_type: EnvironmentType,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("{0} is required")]
    Missing(&'static str),
}

/// Contents of the add-environment form.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewEnvironment {
    pub name: String,
    pub env_type: EnvironmentType,
    pub resource_group: String,
    pub frontend_name: String,
    pub backend_name: String,
}

impl NewEnvironment {
    pub fn validate(&self) -> Result<CreateEnvironmentRequest, FormError> {
        let required = |value: &str, field: &'static str| {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                Err(FormError::Missing(field))
            } else {
                Ok(trimmed.to_string())
            }
        };

        Ok(CreateEnvironmentRequest {
            name: required(&self.name, "Environment name")?,
            resource_group: required(&self.resource_group, "Resource group")?,
            frontend_app_name: required(&self.frontend_name, "Frontend app name")?,
            backend_app_name: required(&self.backend_name, "Backend app name")?,
            env_type: self.env_type,
            is_active: true,
        })
    }
}

/// One container app of an environment with its current display status.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerApp {
    pub name: String,
    pub status: DisplayStatus,
}

/// An environment as the dashboard shows it.
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    pub id: EnvironmentId,
    pub name: String,
    pub env_type: EnvironmentType,
    pub resource_group: String,
    pub frontend: ContainerApp,
    pub backend: ContainerApp,
}

impl Environment {
    pub fn statuses(&self) -> StatusPair {
        StatusPair {
            frontend: self.frontend.status,
            backend: self.backend.status,
        }
    }

    pub fn set_statuses(&mut self, statuses: StatusPair) {
        self.frontend.status = statuses.frontend;
        self.backend.status = statuses.backend;
    }
}

impl From<EnvironmentRecord> for Environment {
    /// Statuses start as `Stopped` until the first poll lands.
    fn from(record: EnvironmentRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            env_type: record.env_type,
            resource_group: record.resource_group,
            frontend: ContainerApp {
                name: record.frontend_app_name,
                status: DisplayStatus::Stopped,
            },
            backend: ContainerApp {
                name: record.backend_app_name,
                status: DisplayStatus::Stopped,
            },
        }
    }
}

/// Headline counts shown above the dashboard grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoardStats {
    pub total: usize,
    pub healthy: usize,
    pub starting: usize,
    pub errored: usize,
}

/// The environments currently listed on the dashboard.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnvironmentBoard {
    environments: Vec<Environment>,
}

impl EnvironmentBoard {
    pub fn new(environments: Vec<Environment>) -> Self {
        Self { environments }
    }

    pub fn from_records(records: Vec<EnvironmentRecord>) -> Self {
        Self::new(records.into_iter().map(Environment::from).collect())
    }

    pub fn environments(&self) -> &[Environment] {
        &self.environments
    }

    pub fn len(&self) -> usize {
        self.environments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.environments.is_empty()
    }

    pub fn get(&self, id: EnvironmentId) -> Option<&Environment> {
        self.environments.iter().find(|e| e.id == id)
    }

    /// Append a newly created environment. A record with an id already on the
    /// board replaces the old entry instead.
    pub fn add(&mut self, environment: Environment) {
        match self.environments.iter_mut().find(|e| e.id == environment.id) {
            Some(existing) => *existing = environment,
            None => self.environments.push(environment),
        }
    }

    /// Remove an environment after the backend confirmed the delete.
    pub fn remove(&mut self, id: EnvironmentId) -> Option<Environment> {
        let idx = self.environments.iter().position(|e| e.id == id)?;
        Some(self.environments.remove(idx))
    }

    /// Record the statuses a card most recently displayed.
    pub fn update_statuses(&mut self, id: EnvironmentId, statuses: StatusPair) -> bool {
        match self.environments.iter_mut().find(|e| e.id == id) {
            Some(env) if env.statuses() != statuses => {
                env.set_statuses(statuses);
                true
            }
            _ => false,
        }
    }

    pub fn stats(&self) -> BoardStats {
        let count = |pred: fn(&StatusPair) -> bool| {
            self.environments
                .iter()
                .filter(|e| pred(&e.statuses()))
                .count()
        };

        BoardStats {
            total: self.environments.len(),
            healthy: count(StatusPair::all_running),
            starting: count(|s: &StatusPair| s.any(DisplayStatus::Starting)),
            errored: count(|s: &StatusPair| s.any(DisplayStatus::Error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: i64, name: &str) -> EnvironmentRecord {
        serde_json::from_value(json!({
            "id": id,
            "name": name,
            "resource_group": "rg-kpit-qa",
            "frontend_app_name": format!("{name}-frontend"),
            "backend_app_name": format!("{name}-backend"),
        }))
        .unwrap()
    }

    #[test]
    fn record_without_type_defaults_to_dev() {
        let rec = record(3, "qa");
        assert_eq!(rec.env_type, EnvironmentType::Dev);
        assert!(rec.is_active);

        let rec: EnvironmentRecord = serde_json::from_value(json!({
            "id": 4,
            "name": "prod",
            "resource_group": "rg",
            "frontend_app_name": "f",
            "backend_app_name": "b",
            "type": "PROD",
            "is_active": false
        }))
        .unwrap();
        assert_eq!(rec.env_type, EnvironmentType::Prod);
        assert!(!rec.is_active);

        let rec: EnvironmentRecord = serde_json::from_value(json!({
            "id": 5,
            "name": "x",
            "resource_group": "rg",
            "frontend_app_name": "f",
            "backend_app_name": "b",
            "type": null
        }))
        .unwrap();
        assert_eq!(rec.env_type, EnvironmentType::Dev);
    }

    #[test]
    fn create_request_uses_backend_field_names() {
        let form = NewEnvironment {
            name: " KPIT GM QA ".into(),
            env_type: EnvironmentType::Qa,
            resource_group: "rg-kpit-gm-qa".into(),
            frontend_name: "kpit-gm-qa-frontend".into(),
            backend_name: "kpit-gm-qa-backend".into(),
        };
        let body = serde_json::to_value(form.validate().unwrap()).unwrap();
        assert_eq!(
            body,
            json!({
                "name": "KPIT GM QA",
                "resource_group": "rg-kpit-gm-qa",
                "frontend_app_name": "kpit-gm-qa-frontend",
                "backend_app_name": "kpit-gm-qa-backend",
                "type": "QA",
                "is_active": true
            })
        );
    }

    #[test]
    fn blank_fields_fail_validation() {
        let form = NewEnvironment {
            name: "env".into(),
            resource_group: "   ".into(),
            ..Default::default()
        };
        assert_eq!(
            form.validate().unwrap_err(),
            FormError::Missing("Resource group")
        );
    }

    #[test]
    fn type_labels() {
        assert_eq!(EnvironmentType::Integration.short_label(), "INT");
        assert_eq!(EnvironmentType::Prod.short_label(), "PROD");
        assert_eq!(EnvironmentType::from_str_lossy("int"), EnvironmentType::Integration);
        assert_eq!(EnvironmentType::from_str_lossy("staging"), EnvironmentType::Dev);
    }

    #[test]
    fn new_environments_start_stopped() {
        let env = Environment::from(record(1, "dev"));
        assert_eq!(env.statuses(), StatusPair::uniform(DisplayStatus::Stopped));
        assert_eq!(env.frontend.name, "dev-frontend");
    }

    #[test]
    fn board_add_remove_and_stats() {
        let mut board = EnvironmentBoard::from_records(vec![record(1, "a"), record(2, "b")]);
        board.add(Environment::from(record(3, "c")));
        assert_eq!(board.len(), 3);

        board.update_statuses(EnvironmentId(1), StatusPair::uniform(DisplayStatus::Running));
        board.update_statuses(
            EnvironmentId(2),
            StatusPair {
                frontend: DisplayStatus::Starting,
                backend: DisplayStatus::Error,
            },
        );

        assert_eq!(
            board.stats(),
            BoardStats {
                total: 3,
                healthy: 1,
                starting: 1,
                errored: 1,
            }
        );

        let removed = board.remove(EnvironmentId(2)).unwrap();
        assert_eq!(removed.name, "b");
        assert!(board.get(EnvironmentId(2)).is_none());
        assert!(board.remove(EnvironmentId(2)).is_none());
        assert_eq!(board.stats().errored, 0);
    }

    #[test]
    fn update_statuses_reports_changes_only() {
        let mut board = EnvironmentBoard::from_records(vec![record(1, "a")]);
        assert!(!board.update_statuses(EnvironmentId(1), StatusPair::uniform(DisplayStatus::Stopped)));
        assert!(board.update_statuses(EnvironmentId(1), StatusPair::uniform(DisplayStatus::Running)));
        assert!(!board.update_statuses(EnvironmentId(9), StatusPair::uniform(DisplayStatus::Running)));
    }
}
