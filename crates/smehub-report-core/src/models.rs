//! Core data models for report requests and report documents.
//!
//! Field names on the wire follow the frontend's camelCase convention
//! (`reportId`, `businessInfo`, `generatedReport`, ...).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Profile of the business a report is written for.
///
/// Presence of the individual fields is not enforced; missing fields
/// deserialize as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BusinessInfo {
    pub business_name: String,
    pub postal_code: String,
    pub country: String,
    pub industry: String,
}

/// Inbound report-generation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportRequest {
    pub report_id: String,
    pub user_id: String,
    pub business_info: BusinessInfo,
    pub final_prompt: String,
}

/// Check that `id` can address a single report document.
///
/// Ids are used verbatim as the last path segment of the document name, so
/// they must be non-empty, free of `/` and surrounding whitespace, and not
/// one of the names Firestore reserves (`.`, `..`, `__*__`).
pub fn check_document_id(id: &str) -> anyhow::Result<()> {
    if id.is_empty() {
        anyhow::bail!("document id must not be empty");
    }
    if id.trim() != id {
        anyhow::bail!("document id must not have surrounding whitespace: '{}'", id);
    }
    if id.contains('/') {
        anyhow::bail!("document id must not contain '/': '{}'", id);
    }
    let dunder = id.len() >= 4 && id.starts_with("__") && id.ends_with("__");
    if id == "." || id == ".." || dunder {
        anyhow::bail!("document id is reserved: '{}'", id);
    }
    Ok(())
}

/// Lifecycle status of a report document.
///
/// Transitions only move forward:
/// `pending_backend_processing → processing → completed | failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    PendingBackendProcessing,
    Processing,
    Completed,
    Failed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::PendingBackendProcessing => "pending_backend_processing",
            ReportStatus::Processing => "processing",
            ReportStatus::Completed => "completed",
            ReportStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending_backend_processing" => Ok(ReportStatus::PendingBackendProcessing),
            "processing" => Ok(ReportStatus::Processing),
            "completed" => Ok(ReportStatus::Completed),
            "failed" => Ok(ReportStatus::Failed),
            other => anyhow::bail!("unrecognized report status: '{}'", other),
        }
    }
}

/// A report document as held by the document store.
///
/// `status` is `None` when the stored value is missing or not one of the
/// known statuses; processing never branches on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportDocument {
    pub id: String,
    pub status: Option<ReportStatus>,
    pub generated_report: String,
    pub error: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ReportDocument {
    /// A freshly created document, as the frontend writes it before
    /// calling the service.
    pub fn pending(id: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            status: Some(ReportStatus::PendingBackendProcessing),
            created_at: Some(created_at),
            ..Default::default()
        }
    }
}

/// Partial update merged into a report document.
///
/// Only fields that are `Some` are written; everything else on the stored
/// document is left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportUpdate {
    pub status: Option<ReportStatus>,
    pub generated_report: Option<String>,
    pub error: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ReportUpdate {
    /// Entry transition, written before any generation work.
    pub fn processing(now: DateTime<Utc>) -> Self {
        Self {
            status: Some(ReportStatus::Processing),
            updated_at: Some(now),
            ..Default::default()
        }
    }

    /// Terminal success, carrying the report body.
    pub fn completed(report: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            status: Some(ReportStatus::Completed),
            generated_report: Some(report.into()),
            updated_at: Some(now),
            completed_at: Some(now),
            ..Default::default()
        }
    }

    /// Terminal failure note. Never sets `generatedReport` or `completedAt`.
    pub fn failed(note: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            status: Some(ReportStatus::Failed),
            error: Some(note.into()),
            updated_at: Some(now),
            ..Default::default()
        }
    }

    /// Wire names of the fields this update writes, in a stable order.
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.status.is_some() {
            fields.push("status");
        }
        if self.generated_report.is_some() {
            fields.push("generatedReport");
        }
        if self.error.is_some() {
            fields.push("error");
        }
        if self.updated_at.is_some() {
            fields.push("updatedAt");
        }
        if self.completed_at.is_some() {
            fields.push("completedAt");
        }
        fields
    }

    pub fn is_empty(&self) -> bool {
        self.field_names().is_empty()
    }
}
