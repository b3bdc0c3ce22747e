//! Data models for SiteTrack entities
//!
//! Field names follow the backend's camelCase JSON. Every record deserializes
//! leniently (see the `lenient` module): missing or malformed fields fall back
//! to defaults instead of failing the whole response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{Result, SiteTrackError};
use crate::lenient;
use crate::roles::Role;

/// Reference to another entity, either by id or as a populated object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl EntityRef {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }

    #[must_use]
    pub fn named(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
        }
    }

    /// Interpret a raw JSON value as a reference
    ///
    /// Accepts a non-empty id string or an object carrying `_id` (or `id`).
    /// The display name is taken from `name`, then `title`.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(id) if !id.is_empty() => Some(Self::new(id.clone())),
            Value::Object(map) => {
                let id = map
                    .get("_id")
                    .or_else(|| map.get("id"))
                    .and_then(Value::as_str)
                    .filter(|id| !id.is_empty())?;
                let name = map
                    .get("name")
                    .or_else(|| map.get("title"))
                    .and_then(Value::as_str)
                    .map(str::to_string);
                Some(Self {
                    id: id.to_string(),
                    name,
                })
            }
            _ => None,
        }
    }
}

/// Whether an optional reference points at `id`
#[must_use]
pub fn refers_to(reference: Option<&EntityRef>, id: &str) -> bool {
    reference.is_some_and(|r| !id.is_empty() && r.id == id)
}

/// Project status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ProjectStatus {
    #[serde(rename = "Planning")]
    Planning,
    #[serde(rename = "Active")]
    Active,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Completed")]
    Completed,
    #[serde(rename = "Cancelled")]
    Cancelled,
    #[serde(rename = "On Hold")]
    OnHold,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ProjectStatus {
    /// Whether work is underway on the project
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, ProjectStatus::Active | ProjectStatus::InProgress)
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ProjectStatus::Planning => "Planning",
            ProjectStatus::Active => "Active",
            ProjectStatus::InProgress => "In Progress",
            ProjectStatus::Completed => "Completed",
            ProjectStatus::Cancelled => "Cancelled",
            ProjectStatus::OnHold => "On Hold",
            ProjectStatus::Unknown => "Unknown",
        }
    }
}

/// Task status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum TaskStatus {
    #[serde(rename = "Pending")]
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Completed")]
    Completed,
    #[serde(rename = "Cancelled")]
    Cancelled,
    #[default]
    #[serde(other)]
    Unknown,
}

impl TaskStatus {
    /// Every status, including `Unknown`; these partition any task list
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Cancelled,
        TaskStatus::Unknown,
    ];

    /// Whether the task still has outstanding work
    #[must_use]
    pub fn is_open(self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::InProgress)
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
            TaskStatus::Cancelled => "Cancelled",
            TaskStatus::Unknown => "Unknown",
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = SiteTrackError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace(['-', '_'], " ").as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "in progress" => Ok(TaskStatus::InProgress),
            "completed" | "done" => Ok(TaskStatus::Completed),
            "cancelled" | "canceled" => Ok(TaskStatus::Cancelled),
            _ => Err(SiteTrackError::validation(format!("Unknown task status: {s}"))),
        }
    }
}

/// Task priority enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TaskPriority {
    #[serde(rename = "Low")]
    Low,
    #[serde(rename = "Medium")]
    Medium,
    #[serde(rename = "High")]
    High,
    #[serde(rename = "Critical")]
    Critical,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Financial transaction type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TransactionType {
    #[serde(rename = "Income")]
    Income,
    #[serde(rename = "Expense")]
    Expense,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Equipment availability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum EquipmentStatus {
    #[serde(rename = "Available")]
    Available,
    #[serde(rename = "In Use")]
    InUse,
    #[serde(rename = "Maintenance")]
    Maintenance,
    #[serde(rename = "Out of Service")]
    OutOfService,
    #[default]
    #[serde(other)]
    Unknown,
}

/// User account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", default, deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub role: Role,
    #[serde(
        default = "lenient::default_true",
        deserialize_with = "lenient::flag_default_true"
    )]
    pub is_active: bool,
    #[serde(default, deserialize_with = "lenient::string")]
    pub phone: String,
}

/// Construction project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "_id", default, deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub location: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub status: ProjectStatus,
    #[serde(default, deserialize_with = "lenient::number")]
    pub budget: f64,
    #[serde(default, deserialize_with = "lenient::entity_ref")]
    pub client: Option<EntityRef>,
    #[serde(
        default,
        alias = "projectManager",
        deserialize_with = "lenient::entity_ref"
    )]
    pub manager: Option<EntityRef>,
    #[serde(default, deserialize_with = "lenient::datetime")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::datetime")]
    pub end_date: Option<DateTime<Utc>>,
}

impl Project {
    #[must_use]
    pub fn client_id(&self) -> Option<&str> {
        self.client.as_ref().map(|r| r.id.as_str())
    }

    #[must_use]
    pub fn manager_id(&self) -> Option<&str> {
        self.manager.as_ref().map(|r| r.id.as_str())
    }
}

/// Unit of work on a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(rename = "_id", default, deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub status: TaskStatus,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub priority: TaskPriority,
    #[serde(default, deserialize_with = "lenient::entity_ref")]
    pub project: Option<EntityRef>,
    #[serde(default, deserialize_with = "lenient::entity_ref")]
    pub assigned_to: Option<EntityRef>,
    #[serde(default, deserialize_with = "lenient::datetime")]
    pub due_date: Option<DateTime<Utc>>,
}

impl Task {
    #[must_use]
    pub fn belongs_to(&self, project_id: &str) -> bool {
        refers_to(self.project.as_ref(), project_id)
    }

    #[must_use]
    pub fn is_assigned_to(&self, user_id: &str) -> bool {
        refers_to(self.assigned_to.as_ref(), user_id)
    }
}

/// Customer commissioning projects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    #[serde(rename = "_id", default, deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub company: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub phone: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub address: String,
    #[serde(
        default = "lenient::default_true",
        deserialize_with = "lenient::flag_default_true"
    )]
    pub is_active: bool,
}

/// Site progress report filed against a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    #[serde(rename = "_id", default, deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::entity_ref")]
    pub project: Option<EntityRef>,
    #[serde(default, deserialize_with = "lenient::entity_ref")]
    pub reported_by: Option<EntityRef>,
    #[serde(default, alias = "progress", deserialize_with = "lenient::number")]
    pub percent_complete: f64,
    #[serde(default, deserialize_with = "lenient::string")]
    pub work_description: String,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub images: Vec<String>,
    #[serde(default, alias = "createdAt", deserialize_with = "lenient::datetime")]
    pub date: Option<DateTime<Utc>>,
}

/// Income or expense entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialRecord {
    #[serde(rename = "_id", default, deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(rename = "type", default, deserialize_with = "lenient::or_default")]
    pub record_type: TransactionType,
    #[serde(default, deserialize_with = "lenient::string")]
    pub category: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub amount: f64,
    #[serde(default, deserialize_with = "lenient::entity_ref")]
    pub project: Option<EntityRef>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient::datetime")]
    pub date: Option<DateTime<Utc>>,
}

/// Stock item held for projects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    #[serde(rename = "_id", default, deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub category: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub quantity: f64,
    #[serde(default, deserialize_with = "lenient::string")]
    pub unit: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub min_stock_level: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub unit_price: f64,
    #[serde(default, deserialize_with = "lenient::string")]
    pub supplier: String,
    #[serde(default, deserialize_with = "lenient::entity_ref")]
    pub project: Option<EntityRef>,
}

impl Material {
    /// Whether the stock level is at or below its reorder threshold
    #[must_use]
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.min_stock_level
    }

    /// Low-stock check against `threshold`, or the material's own level when `None`
    #[must_use]
    pub fn is_low_stock_at(&self, threshold: Option<f64>) -> bool {
        threshold.map_or_else(|| self.is_low_stock(), |t| self.quantity <= t)
    }
}

/// Piece of site equipment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    #[serde(rename = "_id", default, deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(rename = "type", default, deserialize_with = "lenient::string")]
    pub equipment_type: String,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub status: EquipmentStatus,
    #[serde(default, deserialize_with = "lenient::entity_ref")]
    pub assigned_project: Option<EntityRef>,
    #[serde(default, deserialize_with = "lenient::datetime")]
    pub last_maintenance: Option<DateTime<Utc>>,
}

/// Free-form report document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(rename = "_id", default, deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(rename = "type", default, deserialize_with = "lenient::string")]
    pub report_type: String,
    #[serde(default, deserialize_with = "lenient::entity_ref")]
    pub project: Option<EntityRef>,
    #[serde(default, deserialize_with = "lenient::entity_ref")]
    pub created_by: Option<EntityRef>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub content: String,
    #[serde(default, deserialize_with = "lenient::datetime")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Company-wide income and expense totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSummary {
    #[serde(default, deserialize_with = "lenient::number")]
    pub total_income: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub total_expense: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub net_profit: f64,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub by_category: BTreeMap<String, f64>,
}

/// Where a financial summary came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummarySource {
    /// Provided by `/financials/summary`
    Server,
    /// Reduced locally from the financial records
    Computed,
}

/// User creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl CreateUserRequest {
    /// # Errors
    /// Returns `SiteTrackError::Validation` for a blank name, a malformed email, a short password or an unknown role
    pub fn validate(&self) -> Result<()> {
        require_non_blank("name", &self.name)?;
        require_email(&self.email)?;
        if self.password.len() < 6 {
            return Err(SiteTrackError::validation(
                "password must be at least 6 characters",
            ));
        }
        if self.role == Role::Unknown {
            return Err(SiteTrackError::validation("role must be a known role"));
        }
        Ok(())
    }
}

/// Password change request for `PATCH /users/:id/change-password`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

impl ChangePasswordRequest {
    /// # Errors
    /// Returns `SiteTrackError::Validation` when either password is missing or the new one is too short
    pub fn validate(&self) -> Result<()> {
        require_non_blank("currentPassword", &self.current_password)?;
        if self.new_password.len() < 6 {
            return Err(SiteTrackError::validation(
                "new password must be at least 6 characters",
            ));
        }
        Ok(())
    }
}

/// Partial user update
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl UpdateUserRequest {
    /// # Errors
    /// Returns `SiteTrackError::Validation` for a malformed email or an unknown role
    pub fn validate(&self) -> Result<()> {
        if let Some(email) = &self.email {
            require_email(email)?;
        }
        if self.role == Some(Role::Unknown) {
            return Err(SiteTrackError::validation("role must be a known role"));
        }
        Ok(())
    }
}

/// Project creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub name: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub budget: f64,
    /// Client id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    /// Manager user id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
}

impl CreateProjectRequest {
    /// # Errors
    /// Returns `SiteTrackError::Validation` for a blank name, a negative budget or an end date before the start date
    pub fn validate(&self) -> Result<()> {
        require_non_blank("name", &self.name)?;
        require_non_negative("budget", self.budget)?;
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(SiteTrackError::validation(
                    "end date must not be before start date",
                ));
            }
        }
        Ok(())
    }
}

/// Partial project update
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
}

/// Task creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Project id
    pub project: String,
    /// Assignee user id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
}

impl CreateTaskRequest {
    /// # Errors
    /// Returns `SiteTrackError::Validation` for a blank title or a missing project
    pub fn validate(&self) -> Result<()> {
        require_non_blank("title", &self.title)?;
        require_non_blank("project", &self.project)
    }
}

/// Partial task update
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
}

/// Client creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClientRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl CreateClientRequest {
    /// # Errors
    /// Returns `SiteTrackError::Validation` for a blank name or a malformed email
    pub fn validate(&self) -> Result<()> {
        require_non_blank("name", &self.name)?;
        require_email(&self.email)
    }
}

/// Progress report submission
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProgressRequest {
    /// Project id
    pub project: String,
    pub percent_complete: f64,
    pub work_description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

impl CreateProgressRequest {
    /// # Errors
    /// Returns `SiteTrackError::Validation` for a missing project, a blank description or a percentage outside 0..=100
    pub fn validate(&self) -> Result<()> {
        require_non_blank("project", &self.project)?;
        require_non_blank("workDescription", &self.work_description)?;
        if !(0.0..=100.0).contains(&self.percent_complete) {
            return Err(SiteTrackError::validation(
                "percentComplete must be between 0 and 100",
            ));
        }
        Ok(())
    }
}

/// Financial record submission
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFinancialRequest {
    #[serde(rename = "type")]
    pub record_type: TransactionType,
    pub category: String,
    pub amount: f64,
    /// Project id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
}

impl CreateFinancialRequest {
    /// # Errors
    /// Returns `SiteTrackError::Validation` for an unknown type, a blank category or a non-positive amount
    pub fn validate(&self) -> Result<()> {
        if self.record_type == TransactionType::Unknown {
            return Err(SiteTrackError::validation(
                "type must be Income or Expense",
            ));
        }
        require_non_blank("category", &self.category)?;
        if self.amount <= 0.0 || !self.amount.is_finite() {
            return Err(SiteTrackError::validation("amount must be positive"));
        }
        Ok(())
    }
}

/// Material creation or replacement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMaterialRequest {
    pub name: String,
    pub category: String,
    pub quantity: f64,
    pub unit: String,
    pub min_stock_level: f64,
    pub unit_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
}

impl CreateMaterialRequest {
    /// # Errors
    /// Returns `SiteTrackError::Validation` for a blank name or negative quantities and prices
    pub fn validate(&self) -> Result<()> {
        require_non_blank("name", &self.name)?;
        require_non_negative("quantity", self.quantity)?;
        require_non_negative("minStockLevel", self.min_stock_level)?;
        require_non_negative("unitPrice", self.unit_price)
    }
}

/// Equipment creation or replacement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEquipmentRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub equipment_type: String,
    pub status: EquipmentStatus,
    /// Project id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_project: Option<String>,
}

impl CreateEquipmentRequest {
    /// # Errors
    /// Returns `SiteTrackError::Validation` for a blank name
    pub fn validate(&self) -> Result<()> {
        require_non_blank("name", &self.name)
    }
}

fn require_non_blank(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SiteTrackError::validation(format!("{field} is required")));
    }
    Ok(())
}

fn require_non_negative(field: &str, value: f64) -> Result<()> {
    if value < 0.0 || !value.is_finite() {
        return Err(SiteTrackError::validation(format!(
            "{field} must be a non-negative number"
        )));
    }
    Ok(())
}

fn require_email(email: &str) -> Result<()> {
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        return Err(SiteTrackError::validation(format!(
            "invalid email address: {email}"
        )));
    }
    Ok(())
}
