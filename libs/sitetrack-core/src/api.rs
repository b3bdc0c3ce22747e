//! REST client for the SiteTrack backend
//!
//! Every request carries the session's bearer token. List endpoints answer
//! with an envelope such as `{"projects": [...]}`; single entities arrive as
//! `{"project": {...}}`. Bare arrays and bare objects are accepted as well.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::SiteTrackConfig;
use crate::dashboard::Viewer;
use crate::error::{Result, SiteTrackError};
use crate::models::{
    ChangePasswordRequest, Client, CreateClientRequest, CreateEquipmentRequest,
    CreateFinancialRequest, CreateMaterialRequest, CreateProgressRequest, CreateProjectRequest,
    CreateTaskRequest, CreateUserRequest, Equipment, FinancialRecord, FinancialSummary, Material,
    ProgressReport, Project, Report, Task, TaskStatus, UpdateProjectRequest, UpdateTaskRequest,
    UpdateUserRequest, User,
};
use crate::roles::Role;
use crate::snapshot::{EntitySource, Resource, SnapshotPart};

/// Credentials and identity of the signed-in user
///
/// Passed into [`ApiClient`] explicitly; nothing is read from global state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: Option<String>,
    pub viewer: Viewer,
}

impl Session {
    /// Unauthenticated session with no known viewer
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            token: None,
            viewer: Viewer::new(Role::Unknown),
        }
    }

    #[must_use]
    pub fn new(token: impl Into<String>, viewer: Viewer) -> Self {
        Self {
            token: Some(token.into()),
            viewer,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::anonymous()
    }
}

/// HTTP client bound to one API base URL and session
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    session: Session,
}

impl ApiClient {
    /// Create a client for `base_url`
    ///
    /// # Errors
    /// Returns `SiteTrackError::InvalidUrl` if `base_url` does not parse
    pub fn new(base_url: &str, session: Session) -> Result<Self> {
        Self::with_http_client(base_url, session, reqwest::Client::new())
    }

    /// Create a client from configuration, applying its token and timeout
    ///
    /// The configured token fills in when `session` carries none.
    ///
    /// # Errors
    /// Returns an error if the base URL does not parse or the HTTP client cannot be built
    pub fn from_config(config: &SiteTrackConfig, mut session: Session) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        if session.token.is_none() {
            session.token.clone_from(&config.api_token);
        }
        Self::with_http_client(&config.api_base_url, session, builder.build()?)
    }

    fn with_http_client(base_url: &str, session: Session, http: reqwest::Client) -> Result<Self> {
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        Ok(Self {
            http,
            base_url: Url::parse(&normalized)?,
            session,
        })
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Endpoint URL for `segments`, each one percent-encoded under the base path
    ///
    /// Ids travel as single segments, so `/`, `?` and `#` inside an id never
    /// change which endpoint is addressed.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        for segment in segments {
            check_segment(segment)?;
        }
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                SiteTrackError::configuration(format!(
                    "API base URL cannot carry a path: {}",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments.iter().copied());
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let url = self.url(segments)?;
        let mut builder = self.http.request(method, url);
        if let Some(token) = &self.session.token {
            builder = builder.bearer_auth(token);
        }
        Ok(builder)
    }

    /// Send a request and decode the JSON body; an empty body decodes as `null`
    async fn execute(&self, builder: RequestBuilder, endpoint: &str) -> Result<Value> {
        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body)
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_default();
            debug!(status = status.as_u16(), endpoint, %message, "Request failed");
            return Err(SiteTrackError::Status {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
                message,
            });
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn get(&self, segments: &[&str]) -> Result<Value> {
        let endpoint = endpoint_label(segments);
        debug!(%endpoint, "GET");
        let builder = self.request(Method::GET, segments)?;
        self.execute(builder, &endpoint).await
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> Result<Value> {
        let endpoint = endpoint_label(segments);
        debug!(%method, %endpoint, "Sending");
        let builder = self.request(method, segments)?.json(body);
        self.execute(builder, &endpoint).await
    }

    /// Fetch one list resource
    ///
    /// # Errors
    /// Returns transport, status or decoding errors
    #[instrument(skip(self))]
    pub async fn list<T: DeserializeOwned>(&self, resource: Resource) -> Result<Vec<T>> {
        let segments: Vec<&str> = resource.path().split('/').collect();
        let body = self.get(&segments).await?;
        let items = unwrap_list(body, resource.envelope_keys());
        debug!(count = items.len(), "Fetched list");
        Ok(items)
    }

    pub async fn users(&self) -> Result<Vec<User>> {
        self.list(Resource::Users).await
    }

    pub async fn projects(&self) -> Result<Vec<Project>> {
        self.list(Resource::Projects).await
    }

    pub async fn tasks(&self) -> Result<Vec<Task>> {
        self.list(Resource::Tasks).await
    }

    pub async fn clients(&self) -> Result<Vec<Client>> {
        self.list(Resource::Clients).await
    }

    /// Latest progress report of every project
    pub async fn latest_progress(&self) -> Result<Vec<ProgressReport>> {
        self.list(Resource::Progress).await
    }

    pub async fn financials(&self) -> Result<Vec<FinancialRecord>> {
        self.list(Resource::Financials).await
    }

    pub async fn materials(&self) -> Result<Vec<Material>> {
        self.list(Resource::Materials).await
    }

    pub async fn equipment(&self) -> Result<Vec<Equipment>> {
        self.list(Resource::Equipment).await
    }

    pub async fn reports(&self) -> Result<Vec<Report>> {
        self.list(Resource::Reports).await
    }

    /// Server-computed financial summary, or `None` if the server provides none
    ///
    /// A 404, an empty body and a `null` or non-object `summary` all count as
    /// no summary.
    ///
    /// # Errors
    /// Returns transport errors and any non-404 status
    #[instrument(skip(self))]
    pub async fn financial_summary(&self) -> Result<Option<FinancialSummary>> {
        match self.get(&["financials", "summary"]).await {
            Ok(body) => summary_from_body(body),
            Err(e) if e.is_not_found() => {
                debug!("Server has no financial summary, falling back to local reduction");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Fetch a single client by id
    ///
    /// # Errors
    /// Returns `SiteTrackError::NotFound` when the server answers 404
    pub async fn client(&self, id: &str) -> Result<Client> {
        match self.get(&["clients", id]).await {
            Ok(body) => unwrap_one(body, "client"),
            Err(e) if e.is_not_found() => Err(SiteTrackError::not_found("Client", id)),
            Err(e) => Err(e),
        }
    }

    /// Full progress history of one project
    pub async fn progress_for_project(&self, project_id: &str) -> Result<Vec<ProgressReport>> {
        let body = self.get(&["progress", "project", project_id]).await?;
        Ok(unwrap_list(body, Resource::Progress.envelope_keys()))
    }

    pub async fn create_user(&self, request: &CreateUserRequest) -> Result<User> {
        request.validate()?;
        let body = self.send_json(Method::POST, &["users"], request).await?;
        unwrap_one(body, "user")
    }

    pub async fn update_user(&self, id: &str, request: &UpdateUserRequest) -> Result<User> {
        request.validate()?;
        let body = self
            .send_json(Method::PUT, &["users", id], request)
            .await?;
        unwrap_one(body, "user")
    }

    /// Activate or deactivate a user account
    pub async fn set_user_status(&self, id: &str, is_active: bool) -> Result<User> {
        let body = self
            .send_json(
                Method::PATCH,
                &["users", id, "status"],
                &json!({ "isActive": is_active }),
            )
            .await?;
        unwrap_one(body, "user")
    }

    pub async fn change_password(&self, id: &str, request: &ChangePasswordRequest) -> Result<()> {
        request.validate()?;
        self.send_json(
            Method::PATCH,
            &["users", id, "change-password"],
            request,
        )
        .await?;
        Ok(())
    }

    pub async fn create_project(&self, request: &CreateProjectRequest) -> Result<Project> {
        request.validate()?;
        let body = self.send_json(Method::POST, &["projects"], request).await?;
        unwrap_one(body, "project")
    }

    pub async fn update_project(
        &self,
        id: &str,
        request: &UpdateProjectRequest,
    ) -> Result<Project> {
        let body = self
            .send_json(Method::PUT, &["projects", id], request)
            .await?;
        unwrap_one(body, "project")
    }

    pub async fn create_task(&self, request: &CreateTaskRequest) -> Result<Task> {
        request.validate()?;
        let body = self.send_json(Method::POST, &["tasks"], request).await?;
        unwrap_one(body, "task")
    }

    pub async fn update_task(&self, id: &str, request: &UpdateTaskRequest) -> Result<Task> {
        let body = self
            .send_json(Method::PUT, &["tasks", id], request)
            .await?;
        unwrap_one(body, "task")
    }

    /// Move a task to `status`
    ///
    /// # Errors
    /// Returns `SiteTrackError::Validation` for `TaskStatus::Unknown` without
    /// contacting the server
    pub async fn set_task_status(&self, id: &str, status: TaskStatus) -> Result<Task> {
        if status == TaskStatus::Unknown {
            return Err(SiteTrackError::validation("cannot set an unknown task status"));
        }
        let body = self
            .send_json(
                Method::PATCH,
                &["tasks", id, "status"],
                &json!({ "status": status }),
            )
            .await?;
        unwrap_one(body, "task")
    }

    pub async fn create_client(&self, request: &CreateClientRequest) -> Result<Client> {
        request.validate()?;
        let body = self.send_json(Method::POST, &["clients"], request).await?;
        unwrap_one(body, "client")
    }

    pub async fn update_client(&self, id: &str, request: &CreateClientRequest) -> Result<Client> {
        request.validate()?;
        let body = self
            .send_json(Method::PUT, &["clients", id], request)
            .await?;
        unwrap_one(body, "client")
    }

    pub async fn submit_progress(&self, request: &CreateProgressRequest) -> Result<ProgressReport> {
        request.validate()?;
        let body = self.send_json(Method::POST, &["progress"], request).await?;
        unwrap_one(body, "report")
    }

    pub async fn create_financial(
        &self,
        request: &CreateFinancialRequest,
    ) -> Result<FinancialRecord> {
        request.validate()?;
        let body = self.send_json(Method::POST, &["financials"], request).await?;
        unwrap_one(body, "financial")
    }

    pub async fn create_material(&self, request: &CreateMaterialRequest) -> Result<Material> {
        request.validate()?;
        let body = self.send_json(Method::POST, &["materials"], request).await?;
        unwrap_one(body, "material")
    }

    pub async fn update_material(
        &self,
        id: &str,
        request: &CreateMaterialRequest,
    ) -> Result<Material> {
        request.validate()?;
        let body = self
            .send_json(Method::PUT, &["materials", id], request)
            .await?;
        unwrap_one(body, "material")
    }

    pub async fn create_equipment(&self, request: &CreateEquipmentRequest) -> Result<Equipment> {
        request.validate()?;
        let body = self.send_json(Method::POST, &["equipment"], request).await?;
        unwrap_one(body, "equipment")
    }

    pub async fn update_equipment(
        &self,
        id: &str,
        request: &CreateEquipmentRequest,
    ) -> Result<Equipment> {
        request.validate()?;
        let body = self
            .send_json(Method::PUT, &["equipment", id], request)
            .await?;
        unwrap_one(body, "equipment")
    }

    /// Delete one entity
    ///
    /// # Errors
    /// Returns `SiteTrackError::Validation` for resources that cannot be
    /// deleted by id, and `SiteTrackError::NotFound` when the server answers 404
    #[instrument(skip(self))]
    pub async fn delete(&self, resource: Resource, id: &str) -> Result<()> {
        let collection = collection_path(resource).ok_or_else(|| {
            SiteTrackError::validation(format!("{resource} does not support deletion"))
        })?;
        let segments = [collection, id];
        let builder = self.request(Method::DELETE, &segments)?;
        match self.execute(builder, &endpoint_label(&segments)).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => Err(SiteTrackError::not_found(collection, id)),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl EntitySource for ApiClient {
    async fn fetch(&self, resource: Resource) -> Result<SnapshotPart> {
        Ok(match resource {
            Resource::Users => SnapshotPart::Users(self.users().await?),
            Resource::Projects => SnapshotPart::Projects(self.projects().await?),
            Resource::Tasks => SnapshotPart::Tasks(self.tasks().await?),
            Resource::Clients => SnapshotPart::Clients(self.clients().await?),
            Resource::Progress => SnapshotPart::Progress(self.latest_progress().await?),
            Resource::Financials => SnapshotPart::Financials(self.financials().await?),
            Resource::FinancialSummary => {
                SnapshotPart::FinancialSummary(self.financial_summary().await?)
            }
            Resource::Materials => SnapshotPart::Materials(self.materials().await?),
            Resource::Equipment => SnapshotPart::Equipment(self.equipment().await?),
            Resource::Reports => SnapshotPart::Reports(self.reports().await?),
        })
    }
}

/// Path of the collection whose items are addressed as `<collection>/<id>`
fn collection_path(resource: Resource) -> Option<&'static str> {
    match resource {
        Resource::Progress => Some("progress"),
        Resource::FinancialSummary => None,
        other => Some(other.path()),
    }
}

/// Reject path segments that would be dropped or resolved away in a URL
fn check_segment(segment: &str) -> Result<()> {
    if segment.is_empty() || segment == "." || segment == ".." {
        return Err(SiteTrackError::validation(format!(
            "invalid path segment: {segment:?}"
        )));
    }
    Ok(())
}

/// Human-readable endpoint such as `/tasks/t1/status`, used in errors and logs
fn endpoint_label(segments: &[&str]) -> String {
    format!("/{}", segments.join("/"))
}

/// Decode `/financials/summary`, which may wrap the totals in `summary`
fn summary_from_body(body: Value) -> Result<Option<FinancialSummary>> {
    match body {
        Value::Object(mut map) => match map.remove("summary") {
            Some(inner @ Value::Object(_)) => Ok(Some(serde_json::from_value(inner)?)),
            Some(_) => {
                debug!("Summary envelope is empty, falling back to local reduction");
                Ok(None)
            }
            None => Ok(Some(serde_json::from_value(Value::Object(map))?)),
        },
        _ => Ok(None),
    }
}

/// Pull the list out of its envelope and decode each element
///
/// Elements that are not objects are dropped with a warning.
fn unwrap_list<T: DeserializeOwned>(body: Value, keys: &[&str]) -> Vec<T> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match keys.iter().find_map(|k| map.remove(*k)) {
            Some(Value::Array(items)) => items,
            Some(Value::Null) | None => {
                warn!(?keys, "Response has no recognised list envelope");
                Vec::new()
            }
            Some(single) => vec![single],
        },
        Value::Null => Vec::new(),
        other => {
            warn!(kind = value_kind(&other), "Unexpected list response");
            Vec::new()
        }
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!(error = %e, "Skipping malformed list element");
                None
            }
        })
        .collect()
}

/// Decode a single entity from `{ "<key>": {...} }` or a bare object
fn unwrap_one<T: DeserializeOwned>(body: Value, key: &str) -> Result<T> {
    let inner = match body {
        Value::Object(mut map) if map.get(key).is_some_and(Value::is_object) => {
            map.remove(key).unwrap_or(Value::Null)
        }
        other => other,
    };
    Ok(serde_json::from_value(inner)?)
}

/// `message` or `error` field of a JSON error body, else the trimmed text
fn error_message(body: &str) -> Option<String> {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for key in ["message", "error", "msg"] {
            if let Some(Value::String(text)) = map.get(key) {
                return Some(text.clone());
            }
        }
    }
    let trimmed = body.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwrap_list_envelopes() {
        let projects: Vec<Project> =
            unwrap_list(json!({ "projects": [{ "_id": "p1" }] }), &["projects"]);
        assert_eq!(projects.len(), 1);

        let bare: Vec<Project> = unwrap_list(json!([{ "_id": "p1" }, { "_id": "p2" }]), &["projects"]);
        assert_eq!(bare.len(), 2);

        let reports: Vec<ProgressReport> = unwrap_list(
            json!({ "progress": [{ "_id": "r1", "percentComplete": 40 }] }),
            Resource::Progress.envelope_keys(),
        );
        assert_eq!(reports[0].id, "r1");

        let missing: Vec<Project> = unwrap_list(json!({ "items": [] }), &["projects"]);
        assert!(missing.is_empty());
    }

    #[test]
    fn test_unwrap_list_drops_non_objects() {
        let users: Vec<User> = unwrap_list(json!({ "users": [{ "_id": "u1" }, 7, "x"] }), &["users"]);
        assert_eq!(users.len(), 1);
    }

    #[test]
    fn test_unwrap_one() {
        let client: Client = unwrap_one(json!({ "client": { "_id": "c1", "name": "Acme" } }), "client").unwrap();
        assert_eq!(client.name, "Acme");

        let bare: Client = unwrap_one(json!({ "_id": "c2", "name": "Beta" }), "client").unwrap();
        assert_eq!(bare.id, "c2");
    }

    #[test]
    fn test_error_message() {
        assert_eq!(
            error_message(r#"{"message":"Token expired"}"#).as_deref(),
            Some("Token expired")
        );
        assert_eq!(error_message("  Bad Gateway \n").as_deref(), Some("Bad Gateway"));
        assert_eq!(error_message(""), None);
    }

    #[test]
    fn test_base_url_is_normalized() {
        let client = ApiClient::new("http://localhost:5000/api", Session::anonymous()).unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:5000/api/");
        assert!(ApiClient::new("not a url", Session::anonymous()).is_err());
    }

    #[test]
    fn test_from_config_uses_configured_token() {
        let config = SiteTrackConfig {
            api_token: Some("from-config".to_string()),
            request_timeout: Some(5),
            ..SiteTrackConfig::default()
        };
        let client = ApiClient::from_config(&config, Session::anonymous()).unwrap();
        assert_eq!(client.session().token.as_deref(), Some("from-config"));

        let explicit = Session::new("explicit", Viewer::new(Role::Admin));
        let client = ApiClient::from_config(&config, explicit).unwrap();
        assert_eq!(client.session().token.as_deref(), Some("explicit"));
    }

    #[test]
    fn test_ids_stay_inside_one_segment() {
        let client = ApiClient::new("http://localhost:5000/api", Session::anonymous()).unwrap();

        let url = client.url(&["tasks", "../users/u1"]).unwrap();
        assert_eq!(url.path(), "/api/tasks/..%2Fusers%2Fu1");

        let url = client.url(&["clients", "c1?force=1#x", "status"]).unwrap();
        assert_eq!(url.path(), "/api/clients/c1%3Fforce=1%23x/status");
        assert!(url.query().is_none());
    }

    #[test]
    fn test_dot_and_empty_ids_are_rejected() {
        let client = ApiClient::new("http://localhost:5000/api", Session::anonymous()).unwrap();
        for id in ["", ".", ".."] {
            assert!(matches!(
                client.url(&["tasks", id]),
                Err(SiteTrackError::Validation { .. })
            ));
        }
    }

    #[test]
    fn test_summary_envelope_variants() {
        let wrapped = summary_from_body(json!({ "summary": { "totalIncome": 10 } })).unwrap();
        assert!((wrapped.unwrap().total_income - 10.0).abs() < f64::EPSILON);

        let bare = summary_from_body(json!({ "netProfit": 5 })).unwrap();
        assert!((bare.unwrap().net_profit - 5.0).abs() < f64::EPSILON);

        assert!(summary_from_body(json!({ "summary": null })).unwrap().is_none());
        assert!(summary_from_body(json!({ "summary": [] })).unwrap().is_none());
        assert!(summary_from_body(Value::Null).unwrap().is_none());
    }

    #[test]
    fn test_collection_paths() {
        assert_eq!(collection_path(Resource::Progress), Some("progress"));
        assert_eq!(collection_path(Resource::Tasks), Some("tasks"));
        assert_eq!(collection_path(Resource::FinancialSummary), None);
    }
}
