//! User roles, dashboard kinds and capabilities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SiteTrackError;
use crate::snapshot::Resource;

/// Role of a user account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Role {
    #[serde(rename = "Admin")]
    Admin,
    #[serde(rename = "Project Manager")]
    ProjectManager,
    #[serde(rename = "Site Supervisor")]
    SiteSupervisor,
    #[serde(rename = "Inventory Manager")]
    InventoryManager,
    #[serde(rename = "Worker")]
    Worker,
    #[serde(rename = "Client")]
    Client,
    /// A role string this client does not recognize
    #[default]
    #[serde(other)]
    Unknown,
}

/// Which dashboard a viewer sees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardKind {
    Admin,
    ProjectManager,
    SiteSupervisor,
    Inventory,
    Client,
}

impl Role {
    /// All known roles, in display order
    pub const ALL: [Role; 6] = [
        Role::Admin,
        Role::ProjectManager,
        Role::SiteSupervisor,
        Role::InventoryManager,
        Role::Worker,
        Role::Client,
    ];

    /// Human-readable label, identical to the wire value
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::ProjectManager => "Project Manager",
            Role::SiteSupervisor => "Site Supervisor",
            Role::InventoryManager => "Inventory Manager",
            Role::Worker => "Worker",
            Role::Client => "Client",
            Role::Unknown => "Unknown",
        }
    }

    /// Dashboard shown to this role, if any
    #[must_use]
    pub fn dashboard_kind(self) -> Option<DashboardKind> {
        match self {
            Role::Admin => Some(DashboardKind::Admin),
            Role::ProjectManager => Some(DashboardKind::ProjectManager),
            Role::SiteSupervisor => Some(DashboardKind::SiteSupervisor),
            Role::InventoryManager => Some(DashboardKind::Inventory),
            Role::Client => Some(DashboardKind::Client),
            Role::Worker | Role::Unknown => None,
        }
    }

    #[must_use]
    pub fn can_manage_users(self) -> bool {
        match self {
            Role::Admin => true,
            Role::ProjectManager
            | Role::SiteSupervisor
            | Role::InventoryManager
            | Role::Worker
            | Role::Client
            | Role::Unknown => false,
        }
    }

    #[must_use]
    pub fn can_manage_projects(self) -> bool {
        match self {
            Role::Admin | Role::ProjectManager => true,
            Role::SiteSupervisor
            | Role::InventoryManager
            | Role::Worker
            | Role::Client
            | Role::Unknown => false,
        }
    }

    /// Whether the role may file progress reports and change task status
    #[must_use]
    pub fn can_report_progress(self) -> bool {
        match self {
            Role::Admin | Role::ProjectManager | Role::SiteSupervisor => true,
            Role::InventoryManager | Role::Worker | Role::Client | Role::Unknown => false,
        }
    }

    #[must_use]
    pub fn can_manage_inventory(self) -> bool {
        match self {
            Role::Admin | Role::InventoryManager => true,
            Role::ProjectManager
            | Role::SiteSupervisor
            | Role::Worker
            | Role::Client
            | Role::Unknown => false,
        }
    }

    /// Whether the role sees company-wide financial figures
    #[must_use]
    pub fn can_view_financials(self) -> bool {
        match self {
            Role::Admin | Role::ProjectManager => true,
            Role::SiteSupervisor
            | Role::InventoryManager
            | Role::Worker
            | Role::Client
            | Role::Unknown => false,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Role {
    type Err = SiteTrackError;

    /// Parse a role from its label or a kebab/snake-case spelling
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "admin" => Ok(Role::Admin),
            "project manager" | "pm" => Ok(Role::ProjectManager),
            "site supervisor" | "supervisor" => Ok(Role::SiteSupervisor),
            "inventory manager" | "inventory" => Ok(Role::InventoryManager),
            "worker" => Ok(Role::Worker),
            "client" => Ok(Role::Client),
            _ => Err(SiteTrackError::validation(format!("Unknown role: {s}"))),
        }
    }
}

impl DashboardKind {
    /// Resources fetched on every refresh of this dashboard
    #[must_use]
    pub fn resources(self) -> &'static [Resource] {
        match self {
            DashboardKind::Admin => &[
                Resource::Users,
                Resource::Projects,
                Resource::Tasks,
                Resource::Clients,
                Resource::Progress,
                Resource::Financials,
                Resource::FinancialSummary,
            ],
            DashboardKind::ProjectManager => &[
                Resource::Users,
                Resource::Projects,
                Resource::Tasks,
                Resource::Clients,
                Resource::Progress,
            ],
            DashboardKind::SiteSupervisor => &[
                Resource::Users,
                Resource::Projects,
                Resource::Tasks,
                Resource::Progress,
            ],
            DashboardKind::Inventory => &[
                Resource::Projects,
                Resource::Materials,
                Resource::Equipment,
            ],
            DashboardKind::Client => &[
                Resource::Clients,
                Resource::Projects,
                Resource::Tasks,
                Resource::Progress,
                Resource::Financials,
            ],
        }
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            DashboardKind::Admin => "Admin Dashboard",
            DashboardKind::ProjectManager => "Project Manager Dashboard",
            DashboardKind::SiteSupervisor => "Site Supervisor Dashboard",
            DashboardKind::Inventory => "Inventory Dashboard",
            DashboardKind::Client => "Client Dashboard",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serialization() {
        assert_eq!(
            serde_json::to_string(&Role::ProjectManager).unwrap(),
            "\"Project Manager\""
        );
        let role: Role = serde_json::from_str("\"Inventory Manager\"").unwrap();
        assert_eq!(role, Role::InventoryManager);
    }

    #[test]
    fn test_unknown_role_deserializes() {
        let role: Role = serde_json::from_str("\"Superuser\"").unwrap();
        assert_eq!(role, Role::Unknown);
        assert!(role.dashboard_kind().is_none());
        assert!(!role.can_manage_users());
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(
            "project-manager".parse::<Role>().unwrap(),
            Role::ProjectManager
        );
        assert_eq!(
            "Site Supervisor".parse::<Role>().unwrap(),
            Role::SiteSupervisor
        );
        assert_eq!(
            "inventory_manager".parse::<Role>().unwrap(),
            Role::InventoryManager
        );
        assert!("janitor".parse::<Role>().is_err());
    }

    #[test]
    fn test_label_round_trips_through_from_str() {
        for role in Role::ALL {
            assert_eq!(role.label().parse::<Role>().unwrap(), role);
            assert_eq!(role.to_string(), role.label());
        }
    }

    #[test]
    fn test_dashboard_kinds() {
        assert_eq!(Role::Admin.dashboard_kind(), Some(DashboardKind::Admin));
        assert_eq!(
            Role::InventoryManager.dashboard_kind(),
            Some(DashboardKind::Inventory)
        );
        assert_eq!(Role::Client.dashboard_kind(), Some(DashboardKind::Client));
        assert_eq!(Role::Worker.dashboard_kind(), None);
    }

    #[test]
    fn test_capabilities() {
        assert!(Role::Admin.can_manage_users());
        assert!(!Role::ProjectManager.can_manage_users());
        assert!(Role::ProjectManager.can_manage_projects());
        assert!(Role::SiteSupervisor.can_report_progress());
        assert!(!Role::Client.can_report_progress());
        assert!(Role::InventoryManager.can_manage_inventory());
        assert!(!Role::SiteSupervisor.can_manage_inventory());
        assert!(Role::Admin.can_view_financials());
        assert!(!Role::Worker.can_view_financials());
    }

    #[test]
    fn test_every_dashboard_needs_projects() {
        for role in Role::ALL {
            if let Some(kind) = role.dashboard_kind() {
                assert!(kind.resources().contains(&Resource::Projects));
                assert!(!kind.title().is_empty());
            }
        }
    }

    #[test]
    fn test_only_admin_fetches_server_summary() {
        assert!(DashboardKind::Admin
            .resources()
            .contains(&Resource::FinancialSummary));
        assert!(!DashboardKind::Client
            .resources()
            .contains(&Resource::FinancialSummary));
    }
}
