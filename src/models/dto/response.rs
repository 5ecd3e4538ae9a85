use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;

use crate::{
    errors::{AppError, AppResult},
    models::domain::User,
};

/// Body returned by the login and register endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default, alias = "accessToken")]
    pub token: Option<String>,
}

impl AuthResponse {
    /// Splits the body into the session token and user snapshot, rejecting
    /// bodies that carry no token.
    pub fn into_session(self) -> AppResult<(String, User)> {
        let token = self
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Decode("No access token returned".to_string()))?;
        Ok((token, self.user.unwrap_or_default()))
    }
}

/// One page of a listing: `{ data, total, totalPages }`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct Paginated<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub total: i64,
    #[serde(default = "one")]
    pub total_pages: i64,
}

fn one() -> i64 {
    1
}

impl<T> Paginated<T> {
    pub fn has_next(&self, page: u32) -> bool {
        i64::from(page) < self.total_pages
    }
}

/// Some endpoints wrap lists in `{ data: [...] }`, others return the bare array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub enum ListResponse<T> {
    Bare(Vec<T>),
    Wrapped {
        #[serde(default = "Vec::new")]
        data: Vec<T>,
    },
}

impl<T> ListResponse<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            ListResponse::Bare(items) => items,
            ListResponse::Wrapped { data } => data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DashboardSummary {
    pub totals: DashboardTotals,
    #[serde(default)]
    pub analytics: Value,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardTotals {
    #[serde(default)]
    pub users: i64,
    #[serde(default)]
    pub exams: i64,
    #[serde(default)]
    pub exam_histories: i64,
}

/// Target handed out for a direct-to-storage upload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUpload {
    pub upload_url: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadOutcome {
    /// Exam created by server-side processing, when the response names one.
    pub exam_id: Option<i64>,
    pub response: Value,
}

impl UploadOutcome {
    pub fn from_response(response: Value) -> Self {
        Self {
            exam_id: extract_exam_id(&response),
            response,
        }
    }
}

/// Processing responses are not uniform; look in the known places.
pub fn extract_exam_id(response: &Value) -> Option<i64> {
    static PATHS: [&str; 4] = ["/examId", "/id", "/data/id", "/data/exam/id"];

    let scopes = [response.get("ocrResponse"), Some(response)];
    scopes
        .into_iter()
        .flatten()
        .flat_map(|scope| PATHS.iter().filter_map(move |p| scope.pointer(p)))
        .find_map(as_id)
}

fn as_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
