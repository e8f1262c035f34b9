//! Visit session domain model.
//!
//! This module contains the core `VisitSession` entity that represents a
//! technician's on-site visit in the domain layer. It is independent of any
//! specific storage format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lifecycle state of the single active visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitStatus {
    NotStarted,
    InProgress,
    Completed,
}

/// A contact reference selected as a requester during the visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRef {
    pub contact_id: i64,
    pub name: String,
}

/// Where the visit takes place. `label` is resolved asynchronously and may
/// lag the coordinates; the coordinates alone remain authoritative for the
/// backend payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitLocation {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub label: Option<String>,
}

/// Represents the single active visit in the application's core logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitSession {
    /// Backend identifier, `None` until the backend confirms creation.
    pub session_id: Option<String>,
    pub company_id: Option<i64>,
    pub client_id: Option<i64>,
    pub requesters: Vec<ContactRef>,
    pub checklist: HashMap<String, bool>,
    pub form_draft: HashMap<String, String>,
    pub location: Option<VisitLocation>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub status: VisitStatus,
}

/// A partial update merged shallowly into the in-progress session.
///
/// `checklist` and `form_draft` merge key-wise; `requesters` replaces the
/// whole selection; the remaining fields overwrite when present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisitUpdate {
    #[serde(default)]
    pub checklist: Option<HashMap<String, bool>>,
    #[serde(default)]
    pub form_draft: Option<HashMap<String, String>>,
    #[serde(default)]
    pub requesters: Option<Vec<ContactRef>>,
    #[serde(default)]
    pub location: Option<VisitLocation>,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl VisitUpdate {
    /// Shorthand for an update carrying only checklist toggles.
    pub fn checklist(entries: HashMap<String, bool>) -> Self {
        Self {
            checklist: Some(entries),
            ..Self::default()
        }
    }

    /// Shorthand for an update carrying only form-draft fields.
    pub fn form_draft(fields: HashMap<String, String>) -> Self {
        Self {
            form_draft: Some(fields),
            ..Self::default()
        }
    }

    /// Shorthand for an update carrying a single form-draft field.
    pub fn form_field(name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut fields = HashMap::new();
        fields.insert(name.into(), value.into());
        Self::form_draft(fields)
    }
}

impl VisitSession {
    /// The initial, empty session.
    pub fn initial() -> Self {
        Self {
            session_id: None,
            company_id: None,
            client_id: None,
            requesters: Vec::new(),
            checklist: HashMap::new(),
            form_draft: HashMap::new(),
            location: None,
            started_at: None,
            ended_at: None,
            status: VisitStatus::NotStarted,
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == VisitStatus::InProgress
    }

    /// Merges a partial update into the session.
    pub fn apply(&mut self, update: VisitUpdate) {
        if let Some(entries) = update.checklist {
            self.checklist.extend(entries);
        }
        if let Some(fields) = update.form_draft {
            self.form_draft.extend(fields);
        }
        if let Some(requesters) = update.requesters {
            self.requesters = requesters;
        }
        if let Some(location) = update.location {
            self.location = Some(location);
        }
        if let Some(session_id) = update.session_id {
            self.session_id = Some(session_id);
        }
    }

    /// Renders the time since `started_at` as `HH:MM`, or `None` when the
    /// visit is not in progress.
    pub fn elapsed_label(&self, now: DateTime<Utc>) -> Option<String> {
        if self.status != VisitStatus::InProgress {
            return None;
        }
        let started = self.started_at?;
        let elapsed = now.signed_duration_since(started);
        let minutes = elapsed.num_minutes().max(0);
        Some(format!("{:02}:{:02}", minutes / 60, minutes % 60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_apply_merges_checklist_keywise() {
        let mut session = VisitSession::initial();
        session.checklist.insert("printers".to_string(), false);
        session.checklist.insert("phones".to_string(), true);

        let mut entries = HashMap::new();
        entries.insert("printers".to_string(), true);
        session.apply(VisitUpdate::checklist(entries));

        assert_eq!(session.checklist.get("printers"), Some(&true));
        assert_eq!(session.checklist.get("phones"), Some(&true));
    }

    #[test]
    fn test_apply_replaces_requesters_wholesale() {
        let mut session = VisitSession::initial();
        session.requesters.push(ContactRef {
            contact_id: 1,
            name: "Ana".to_string(),
        });

        session.apply(VisitUpdate {
            requesters: Some(vec![ContactRef {
                contact_id: 2,
                name: "Benito".to_string(),
            }]),
            ..VisitUpdate::default()
        });

        assert_eq!(session.requesters.len(), 1);
        assert_eq!(session.requesters[0].contact_id, 2);
    }

    #[test]
    fn test_elapsed_label_formats_hours_and_minutes() {
        let mut session = VisitSession::initial();
        session.status = VisitStatus::InProgress;
        session.started_at = Some(Utc.with_ymd_and_hms(2025, 5, 10, 9, 0, 0).unwrap());

        let now = Utc.with_ymd_and_hms(2025, 5, 10, 11, 5, 0).unwrap();
        assert_eq!(session.elapsed_label(now), Some("02:05".to_string()));
    }

    #[test]
    fn test_elapsed_label_absent_when_not_in_progress() {
        let session = VisitSession::initial();
        assert_eq!(session.elapsed_label(Utc::now()), None);
    }
}
