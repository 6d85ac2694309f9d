//! Process record types shared by the store and the registry service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored process definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Process {
    /// Generated at creation, never changes
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Opaque BPMN document, never parsed here
    pub bpmn_xml: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields to merge into an existing record.
///
/// `None` leaves a field untouched. For the optional fields `Some(None)`
/// clears the stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub bpmn_xml: Option<Option<String>>,
    pub updated_at: DateTime<Utc>,
}

impl ProcessChanges {
    /// Changes that only refresh `updated_at`
    pub fn touch(updated_at: DateTime<Utc>) -> Self {
        Self {
            name: None,
            description: None,
            bpmn_xml: None,
            updated_at,
        }
    }

    /// Applies the changes to a record in place
    pub fn apply_to(&self, process: &mut Process) {
        if let Some(name) = &self.name {
            process.name = name.clone();
        }
        if let Some(description) = &self.description {
            process.description = description.clone();
        }
        if let Some(bpmn_xml) = &self.bpmn_xml {
            process.bpmn_xml = bpmn_xml.clone();
        }
        process.updated_at = self.updated_at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample() -> Process {
        let now = Utc::now();
        Process {
            id: "p-1".to_string(),
            name: "Order Flow".to_string(),
            description: Some("orders".to_string()),
            bpmn_xml: Some("<xml>A</xml>".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_apply_only_touches_supplied_fields() {
        let mut process = sample();
        let later = process.updated_at + Duration::seconds(5);
        let changes = ProcessChanges {
            name: Some("Order Flow v2".to_string()),
            ..ProcessChanges::touch(later)
        };

        changes.apply_to(&mut process);

        assert_eq!(process.name, "Order Flow v2");
        assert_eq!(process.description.as_deref(), Some("orders"));
        assert_eq!(process.bpmn_xml.as_deref(), Some("<xml>A</xml>"));
        assert_eq!(process.updated_at, later);
        assert!(process.created_at <= process.updated_at);
    }

    #[test]
    fn test_apply_clears_optional_field() {
        let mut process = sample();
        let changes = ProcessChanges {
            bpmn_xml: Some(None),
            ..ProcessChanges::touch(process.updated_at)
        };

        changes.apply_to(&mut process);

        assert_eq!(process.bpmn_xml, None);
        assert_eq!(process.description.as_deref(), Some("orders"));
    }
}
