//! Portal API client

use portal_types::{
    AttendanceRecord, AttendanceStats, AttendanceStatus, BreakSession, Employee, InternalUser,
    NewAttendance, Organization,
};
use reqwest::{Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::retry::with_retry;

/// Successful access validation
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccessGrant {
    pub message: String,
    pub user: InternalUser,
    pub member: Option<Organization>,
}

/// Attendance listing and its statistics
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AttendanceReport {
    pub attendance: Vec<AttendanceRecord>,
    pub stats: AttendanceStats,
}

/// Filters for an attendance listing; `None` means no filter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttendanceQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AttendanceStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidateAccessRequest<'a> {
    #[serde(skip_serializing_if = "str::is_empty")]
    supabase_user_id: &'a str,
    email: &'a str,
}

#[derive(Debug, Deserialize)]
struct UserEnvelope {
    user: Option<InternalUser>,
}

#[derive(Debug, Deserialize)]
struct EmployeesEnvelope {
    employees: Vec<Employee>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BreaksEnvelope {
    break_sessions: Vec<BreakSession>,
}

#[derive(Debug, Deserialize)]
struct CreatedAttendance {
    attendance: AttendanceRecord,
}

/// HTTP client for the portal API.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone, Debug)]
pub struct PortalClient {
    http: Client,
    config: ClientConfig,
}

impl PortalClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let request = self.http.request(method, self.config.url(path));
        match token.or(self.config.bearer_token()) {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        metrics::counter!("portal_client_requests", "status" => status.as_u16().to_string())
            .increment(1);

        if !status.is_success() {
            return Err(ClientError::from_response(response).await);
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Serialization(e.to_string()))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
    ) -> Result<T, ClientError> {
        with_retry(self.config.retry().clone(), || {
            self.send(self.request(Method::GET, path, token))
        })
        .await
    }

    /// Run the role check for an identity
    #[instrument(skip(self))]
    pub async fn validate_access(
        &self,
        external_id: &str,
        email: &str,
    ) -> Result<AccessGrant, ClientError> {
        let body = ValidateAccessRequest {
            supabase_user_id: external_id,
            email,
        };
        self.send(self.request(Method::POST, "/api/user-type", None).json(&body))
            .await
    }

    /// Internal user for an email, if any
    #[instrument(skip(self))]
    pub async fn user_type(&self, email: &str) -> Result<Option<InternalUser>, ClientError> {
        let request = self
            .request(Method::GET, "/api/user-type", None)
            .query(&[("email", email)]);
        let envelope: UserEnvelope = self.send(request).await?;
        Ok(envelope.user)
    }

    /// Organization of the token holder
    #[instrument(skip_all)]
    pub async fn company(&self, token: &str) -> Result<Organization, ClientError> {
        self.get("/api/company", Some(token)).await
    }

    /// Agents placed with the token holder's organization
    #[instrument(skip_all)]
    pub async fn employees(&self, token: &str) -> Result<Vec<Employee>, ClientError> {
        let envelope: EmployeesEnvelope = self.get("/api/employees", Some(token)).await?;
        debug!(count = envelope.employees.len(), "employees fetched");
        Ok(envelope.employees)
    }

    /// Breaks currently running today
    #[instrument(skip_all)]
    pub async fn break_sessions(&self, token: &str) -> Result<Vec<BreakSession>, ClientError> {
        let envelope: BreaksEnvelope = self.get("/api/breaks", Some(token)).await?;
        Ok(envelope.break_sessions)
    }

    #[instrument(skip(self, token))]
    pub async fn attendance(
        &self,
        token: &str,
        query: &AttendanceQuery,
    ) -> Result<AttendanceReport, ClientError> {
        with_retry(self.config.retry().clone(), || {
            self.send(
                self.request(Method::GET, "/api/attendance", Some(token))
                    .query(query),
            )
        })
        .await
    }

    /// Store an attendance entry. Not retried.
    #[instrument(skip(self, token))]
    pub async fn record_attendance(
        &self,
        token: &str,
        entry: &NewAttendance,
    ) -> Result<AttendanceRecord, ClientError> {
        let created: CreatedAttendance = self
            .send(
                self.request(Method::POST, "/api/attendance", Some(token))
                    .json(entry),
            )
            .await?;
        Ok(created.attendance)
    }
}
