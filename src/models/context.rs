use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

/// Identity of whoever is asking. Opaque to the token manager, which only
/// forwards it to the compute service or cell router.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    pub request_id: String,
    pub user_id: Option<String>,
    pub project_id: Option<String>,
    pub is_admin: bool,
}

impl RequestContext {
    /// Context used by internal callers such as the CLI.
    pub fn admin() -> Self {
        Self {
            request_id: new_request_id(),
            user_id: None,
            project_id: None,
            is_admin: true,
        }
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
        };

        let is_admin = header("x-roles")
            .map(|roles| roles.split(',').any(|r| r.trim().eq_ignore_ascii_case("admin")))
            .unwrap_or(false);

        Self {
            request_id: header("x-request-id").unwrap_or_else(new_request_id),
            user_id: header("x-user-id"),
            project_id: header("x-project-id"),
            is_admin,
        }
    }
}

fn new_request_id() -> String {
    format!("req-{}", uuid::Uuid::new_v4())
}
