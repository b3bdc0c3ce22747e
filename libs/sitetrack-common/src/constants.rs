//! Constants shared by the SiteTrack crates

/// Default REST API base URL
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";

/// Default refresh interval for the admin dashboard, in seconds
pub const DEFAULT_ADMIN_POLL_SECS: u64 = 30;

/// Default refresh interval for the supervisor dashboard, in seconds
pub const DEFAULT_SUPERVISOR_POLL_SECS: u64 = 10;

/// Default refresh interval for financial views, in seconds
pub const DEFAULT_FINANCIAL_POLL_SECS: u64 = 10;

/// Default port for the dashboard JSON endpoint
pub const DEFAULT_SERVE_PORT: u16 = 3000;

/// Placeholder shown for a missing project or client reference
pub const NOT_AVAILABLE: &str = "N/A";

/// Placeholder shown for a missing manager or assignee reference
pub const UNASSIGNED: &str = "Unassigned";

/// Plain date formats accepted where the backend sends dates without a time
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_intervals() {
        assert_eq!(DEFAULT_ADMIN_POLL_SECS, 30);
        assert_eq!(DEFAULT_SUPERVISOR_POLL_SECS, 10);
        assert_eq!(DEFAULT_FINANCIAL_POLL_SECS, 10);
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(NOT_AVAILABLE, "N/A");
        assert_eq!(UNASSIGNED, "Unassigned");
    }

    #[test]
    fn test_default_api_url_is_http() {
        assert!(DEFAULT_API_BASE_URL.starts_with("http://"));
        assert!(DEFAULT_API_BASE_URL.ends_with("/api"));
    }

    #[test]
    fn test_date_formats() {
        assert_eq!(DATE_FORMATS.len(), 3);
        assert!(DATE_FORMATS.contains(&"%Y-%m-%d"));
    }
}
