// SPDX-License-Identifier: MIT
// Copyright 2026 The classroom-gallery authors

//! Google OAuth app credentials and the cached Drive token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The application's registered identity with Google.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// `oauth_credentials.json` as downloaded from the Google Cloud console.
#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    web: Option<ClientSecretEntry>,
    installed: Option<ClientSecretEntry>,
}

#[derive(Debug, Deserialize)]
struct ClientSecretEntry {
    client_id: String,
    client_secret: String,
    #[serde(default)]
    redirect_uris: Vec<String>,
}

impl AppCredentials {
    /// Parse the client-secret document. The first redirect URI is used.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        use serde::de::Error as _;

        let file: ClientSecretFile = serde_json::from_str(raw)?;
        let entry = file
            .web
            .or(file.installed)
            .ok_or_else(|| serde_json::Error::custom("missing \"web\" or \"installed\" section"))?;
        let redirect_uri = entry
            .redirect_uris
            .into_iter()
            .next()
            .ok_or_else(|| serde_json::Error::custom("no redirect_uris configured"))?;

        Ok(Self {
            client_id: entry.client_id,
            client_secret: entry.client_secret,
            redirect_uri,
        })
    }
}

/// Drive token as persisted in `token.json`.
///
/// Field names match the token file written by Google's Node client so an
/// existing file keeps working.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    /// Expiry as epoch milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<i64>,
}

impl StoredToken {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expiry_date.and_then(DateTime::from_timestamp_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_web_credentials() {
        let raw = r#"{"web":{"client_id":"cid","client_secret":"sec","redirect_uris":["http://localhost:3000/oauth2callback","http://other"]}}"#;
        let creds = AppCredentials::from_json(raw).unwrap();
        assert_eq!(creds.client_id, "cid");
        assert_eq!(creds.client_secret, "sec");
        assert_eq!(creds.redirect_uri, "http://localhost:3000/oauth2callback");
    }

    #[test]
    fn test_parse_installed_credentials() {
        let raw = r#"{"installed":{"client_id":"cid","client_secret":"sec","redirect_uris":["http://localhost"]}}"#;
        assert!(AppCredentials::from_json(raw).is_ok());
    }

    #[test]
    fn test_reject_credentials_without_redirect() {
        let raw = r#"{"web":{"client_id":"cid","client_secret":"sec","redirect_uris":[]}}"#;
        assert!(AppCredentials::from_json(raw).is_err());
        assert!(AppCredentials::from_json(r#"{"other":{}}"#).is_err());
        assert!(AppCredentials::from_json("not json").is_err());
    }

    #[test]
    fn test_token_expiry_from_millis() {
        let token = StoredToken {
            access_token: "a".to_string(),
            refresh_token: None,
            scope: None,
            token_type: None,
            expiry_date: Some(1_700_000_000_123),
        };
        assert_eq!(token.expires_at().unwrap().timestamp(), 1_700_000_000);
    }
}
