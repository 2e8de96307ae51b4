// src/net/mailchimp.rs

use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;

lazy_static! {
    // Every Mailchimp api key ends with "-<datacenter>" (e.g. "-us5"); the
    // datacenter selects the API host.
    static ref DATACENTER_RE: Regex = Regex::new(r"-(\w+\d)$").unwrap();
}

#[derive(Error, Debug)]
pub enum MailchimpError {
    #[error("The API key is malformed (expected a '-<datacenter>' suffix, e.g. '-us5').")]
    MalformedApiKey,
    #[error("Request to Mailchimp failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Extracts the datacenter suffix from an api key, if present.
pub fn datacenter(api_key: &str) -> Option<&str> {
    DATACENTER_RE
        .captures(api_key)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Validator for the api key question.
pub fn validate_api_key(candidate: &str) -> Result<(), String> {
    if candidate.is_empty() {
        return Err("API Key must be defined".to_string());
    }
    if datacenter(candidate).is_none() {
        return Err("The API Key is incorrect".to_string());
    }
    Ok(())
}

/// A completed API call: either accepted, or rejected with the JSON problem
/// document Mailchimp returns (its `title` is the human-readable reason).
#[derive(Debug)]
pub enum ApiOutcome {
    Accepted,
    Rejected(Value),
}

/// A list member as returned by the member endpoint. Only the subscription
/// status matters to us.
#[derive(Debug, Deserialize)]
pub struct Member {
    pub status: String,
}

/// Minimal client for the Mailchimp marketing API (v3.0).
#[derive(Debug, Clone)]
pub struct MailchimpClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl MailchimpClient {
    /// Builds a client from a stored api key.
    ///
    /// Fails when the key has no datacenter suffix: a key that validated at
    /// prompt time can still be malformed here if it was supplied via a flag
    /// or the store was edited by hand.
    pub fn new(api_key: &str) -> Result<Self, MailchimpError> {
        let dc = datacenter(api_key).ok_or(MailchimpError::MalformedApiKey)?;
        Ok(Self {
            http: Client::new(),
            base_url: format!("https://{dc}.api.mailchimp.com/3.0"),
            api_key: api_key.to_string(),
        })
    }

    /// Mailchimp addresses list members by the md5 of the lowercased email.
    pub fn member_hash(email: &str) -> String {
        format!("{:x}", md5::compute(email.to_lowercase()))
    }

    fn member_url(&self, list: &str, email: &str) -> String {
        format!(
            "{}/lists/{}/members/{}",
            self.base_url,
            list,
            Self::member_hash(email)
        )
    }

    /// Upserts a member as subscribed (existing members keep their status).
    pub async fn subscribe(&self, list: &str, email: &str) -> Result<ApiOutcome, MailchimpError> {
        let body = json!({ "email_address": email, "status_if_new": "subscribed" });
        self.send(self.http.put(self.member_url(list, email)).json(&body))
            .await
    }

    /// Rewrites an existing member's subscription status
    /// ("subscribed" / "unsubscribed").
    pub async fn set_status(
        &self,
        list: &str,
        email: &str,
        status: &str,
    ) -> Result<ApiOutcome, MailchimpError> {
        let body = json!({ "status": status });
        self.send(self.http.patch(self.member_url(list, email)).json(&body))
            .await
    }

    /// Creates a brand-new subscribed member.
    pub async fn add_member(&self, list: &str, email: &str) -> Result<ApiOutcome, MailchimpError> {
        let body = json!({ "email_address": email, "status": "subscribed" });
        let url = format!("{}/lists/{}/members", self.base_url, list);
        self.send(self.http.post(url).json(&body)).await
    }

    /// Reads a member's current state. A member that is not visible yet maps
    /// to a placeholder status, so pollers can keep waiting instead of
    /// failing on the 404.
    pub async fn member(&self, list: &str, email: &str) -> Result<Member, MailchimpError> {
        let response = self
            .http
            .get(self.member_url(list, email))
            .basic_auth("sst", Some(&self.api_key))
            .send()
            .await?;

        if !response.status().is_success() {
            return Ok(Member {
                status: format!("http {}", response.status().as_u16()),
            });
        }
        Ok(response.json().await?)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<ApiOutcome, MailchimpError> {
        let response = request
            .basic_auth("sst", Some(&self.api_key))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(ApiOutcome::Accepted)
        } else {
            log::debug!("Mailchimp rejected the request with HTTP {status}");
            let payload = response.json().await.unwrap_or(Value::Null);
            Ok(ApiOutcome::Rejected(payload))
        }
    }
}

/// Pulls the human-readable reason out of a rejection payload.
pub fn rejection_title(payload: &Value) -> &str {
    payload
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or("unknown error")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datacenter_is_the_key_suffix() {
        assert_eq!(datacenter("abc123def456-us5"), Some("us5"));
        assert_eq!(datacenter("abc123def456-gb12"), Some("gb12"));
        assert_eq!(datacenter("abc123def456"), None);
        assert_eq!(datacenter("abc123def456-us"), None);
        assert_eq!(datacenter(""), None);
    }

    #[test]
    fn api_key_validator_messages() {
        assert!(validate_api_key("abc-us5").is_ok());
        assert_eq!(
            validate_api_key(""),
            Err("API Key must be defined".to_string())
        );
        assert_eq!(
            validate_api_key("nodatacenter"),
            Err("The API Key is incorrect".to_string())
        );
    }

    #[test]
    fn member_hash_is_case_insensitive_md5() {
        assert_eq!(
            MailchimpClient::member_hash("Anna@Example.COM"),
            MailchimpClient::member_hash("anna@example.com")
        );
        // md5 of the empty string, as a smoke check of the hex encoding.
        assert_eq!(
            MailchimpClient::member_hash(""),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
    }

    #[test]
    fn malformed_key_is_rejected_at_construction() {
        assert!(matches!(
            MailchimpClient::new("no-suffix-here"),
            Err(MailchimpError::MalformedApiKey)
        ));
        let client = MailchimpClient::new("abc-us5").unwrap();
        assert_eq!(
            client.member_url("l1", "anna@example.com"),
            format!(
                "https://us5.api.mailchimp.com/3.0/lists/l1/members/{}",
                MailchimpClient::member_hash("anna@example.com")
            )
        );
    }

    #[test]
    fn rejection_title_falls_back_when_absent() {
        assert_eq!(
            rejection_title(&serde_json::json!({ "title": "Member Exists" })),
            "Member Exists"
        );
        assert_eq!(rejection_title(&Value::Null), "unknown error");
    }
}
