//! Survey registry
//!
//! A static, ordered mapping from survey id to display name. The pipeline
//! orchestrator runs one export per entry, in registry order. Entries come
//! from configuration or are built programmatically; nothing here talks to
//! the network.

use crate::error::Result;
use crate::types::SurveyId;
use serde::{Deserialize, Serialize};

/// One registry entry: a survey and its human-readable name
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyEntry {
    /// The survey identifier
    pub id: SurveyId,
    /// Display name used in logs and output labeling
    pub name: String,
}

/// Ordered collection of surveys to export
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurveyRegistry {
    entries: Vec<SurveyEntry>,
}

impl SurveyRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from (id, name) pairs, validating each id
    pub fn from_entries<I, S, N>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, N)>,
        S: Into<String>,
        N: Into<String>,
    {
        let mut entries = Vec::new();
        for (id, name) in pairs {
            entries.push(SurveyEntry {
                id: SurveyId::new(id)?,
                name: name.into(),
            });
        }
        Ok(Self { entries })
    }

    /// Append a survey to the end of the registry
    pub fn push(&mut self, id: SurveyId, name: impl Into<String>) {
        self.entries.push(SurveyEntry {
            id,
            name: name.into(),
        });
    }

    /// Look up the display name for a survey
    pub fn name_of(&self, id: &SurveyId) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| &e.id == id)
            .map(|e| e.name.as_str())
    }

    /// Iterate entries in registration order
    pub fn iter(&self) -> impl Iterator<Item = &SurveyEntry> {
        self.entries.iter()
    }

    /// Number of registered surveys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a SurveyRegistry {
    type Item = &'a SurveyEntry;
    type IntoIter = std::slice::Iter<'a, SurveyEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
