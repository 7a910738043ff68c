// Connection metadata for one authorized console. Immutable once stored:
// a token is either retrievable exactly as written or gone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleToken {
    pub token: String,
    /// e.g. "novnc", "xvpvnc", "spice-html5"
    pub console_type: String,
    pub host: String,
    pub port: String,
    pub internal_access_path: Option<String>,
    pub instance_uuid: String,
    pub last_activity_at: DateTime<Utc>,
}

/// Arguments to `authorize_console`, as supplied by the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsoleGrant {
    pub console_type: String,
    pub host: String,
    pub port: String,
    #[serde(default)]
    pub internal_access_path: Option<String>,
    #[serde(default)]
    pub instance_uuid: Option<String>,
}

impl ConsoleGrant {
    pub fn new(
        console_type: impl Into<String>,
        host: impl Into<String>,
        port: impl Into<String>,
        internal_access_path: Option<String>,
        instance_uuid: Option<String>,
    ) -> Self {
        Self {
            console_type: console_type.into(),
            host: host.into(),
            port: port.into(),
            internal_access_path,
            instance_uuid,
        }
    }

    /// Build the stored record. `None` when there is no owning instance,
    /// since such a token could never be validated.
    pub fn into_token(self, token: &str) -> Option<ConsoleToken> {
        let instance_uuid = self.instance_uuid?;
        Some(ConsoleToken {
            token: token.to_string(),
            console_type: self.console_type,
            host: self.host,
            port: self.port,
            internal_access_path: self.internal_access_path,
            instance_uuid,
            last_activity_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_without_instance_builds_nothing() {
        let grant = ConsoleGrant::new("novnc", "127.0.0.1", "8080", None, None);
        assert!(grant.into_token("tok").is_none());
    }

    #[test]
    fn test_grant_copies_connection_fields() {
        let grant = ConsoleGrant::new(
            "spice-html5",
            "10.0.0.5",
            "5900",
            Some("path".into()),
            Some("inst-1".into()),
        );
        let token = grant.into_token("tok").unwrap();
        assert_eq!(token.token, "tok");
        assert_eq!(token.console_type, "spice-html5");
        assert_eq!(token.host, "10.0.0.5");
        assert_eq!(token.port, "5900");
        assert_eq!(token.internal_access_path.as_deref(), Some("path"));
        assert_eq!(token.instance_uuid, "inst-1");
    }

    #[test]
    fn test_grant_port_accepts_json_string() {
        let grant: ConsoleGrant = serde_json::from_value(serde_json::json!({
            "console_type": "novnc",
            "host": "h",
            "port": "6080",
        }))
        .unwrap();
        assert!(grant.instance_uuid.is_none());
        assert!(grant.internal_access_path.is_none());
    }
}
