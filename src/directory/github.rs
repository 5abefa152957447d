//! GitHub REST implementation of the membership directory.
//!
//! Talks to the organization endpoints of the GitHub REST API
//! (`/orgs/{org}/invitations`, `/orgs/{org}/memberships/{username}`,
//! `/orgs/{org}/members`). The base URL is configurable for GitHub
//! Enterprise and for tests.

use chrono::{DateTime, Utc};
use reqwest::{
    Client, Response, StatusCode,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT},
};
use serde::Deserialize;

use super::{
    DirectoryError, InvitationReceipt, MembershipDirectory, RemoteInvitation, RemoteMember,
};
use crate::config::GitHubConfig;

const API_VERSION_HEADER: &str = "X-GitHub-Api-Version";
const API_VERSION: &str = "2022-11-28";
const PRODUCT_USER_AGENT: &str = concat!("scim-bridge/", env!("CARGO_PKG_VERSION"));

/// Page size for member listing. Pages are followed via the `Link` header
/// until the full membership has been fetched.
const MEMBERS_PER_PAGE: u32 = 100;

/// GitHub-backed membership directory.
#[derive(Clone)]
pub struct GitHubDirectory {
    http_client: Client,
    base_url: String,
    org: String,
}

impl GitHubDirectory {
    /// Create a client for the configured organization.
    pub fn new(config: &GitHubConfig) -> Result<Self, DirectoryError> {
        let mut headers = HeaderMap::new();

        let mut auth = HeaderValue::try_from(format!("Bearer {}", config.token))
            .map_err(|e| DirectoryError::Auth(format!("Invalid token: {}", e)))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(API_VERSION_HEADER, HeaderValue::from_static(API_VERSION));
        headers.insert(USER_AGENT, HeaderValue::from_static(PRODUCT_USER_AGENT));

        let http_client = Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        let mut base_url = config.api_base_url.clone();
        // Remove trailing slash
        if base_url.ends_with('/') {
            base_url.pop();
        }

        Ok(Self {
            http_client,
            base_url,
            org: config.org.clone(),
        })
    }

    fn org_url(&self, suffix: &str) -> String {
        format!("{}/orgs/{}/{}", self.base_url, self.org, suffix)
    }
}

#[async_trait::async_trait]
impl MembershipDirectory for GitHubDirectory {
    async fn invite(
        &self,
        invitation: &RemoteInvitation,
    ) -> Result<InvitationReceipt, DirectoryError> {
        let response = self
            .http_client
            .post(self.org_url("invitations"))
            .json(&serde_json::json!({
                "email": invitation.email,
                "role": invitation.role,
            }))
            .send()
            .await?;

        if response.status() != StatusCode::CREATED {
            return Err(error_from_response(response).await);
        }

        let receipt: InvitationReceipt = response
            .json()
            .await
            .map_err(|e| DirectoryError::Decode(e.to_string()))?;

        tracing::debug!(
            invitation_id = receipt.id,
            org = %self.org,
            "Organization invitation created"
        );
        Ok(receipt)
    }

    async fn remove(&self, login: &str) -> Result<(), DirectoryError> {
        let response = self
            .http_client
            .delete(self.org_url(&format!("memberships/{}", login)))
            .send()
            .await?;

        if response.status() != StatusCode::NO_CONTENT {
            return Err(error_from_response(response).await);
        }

        tracing::debug!(%login, org = %self.org, "Organization membership removed");
        Ok(())
    }

    async fn get(&self, login: &str) -> Result<Option<RemoteMember>, DirectoryError> {
        let response = self
            .http_client
            .get(self.org_url(&format!("memberships/{}", login)))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let membership: MembershipPayload = response
            .json()
            .await
            .map_err(|e| DirectoryError::Decode(e.to_string()))?;

        Ok(Some(membership.into_member()))
    }

    async fn list_all(&self) -> Result<Vec<RemoteMember>, DirectoryError> {
        let mut members = Vec::new();
        let mut next_url = Some(format!(
            "{}?per_page={}",
            self.org_url("members"),
            MEMBERS_PER_PAGE
        ));

        while let Some(url) = next_url.take() {
            let response = self.http_client.get(&url).send().await?;

            if !response.status().is_success() {
                return Err(error_from_response(response).await);
            }

            next_url = next_page_url(&response);

            let page: Vec<MemberPayload> = response
                .json()
                .await
                .map_err(|e| DirectoryError::Decode(e.to_string()))?;
            members.extend(page.into_iter().map(MemberPayload::into_member));
        }

        tracing::debug!(count = members.len(), org = %self.org, "Fetched organization members");
        Ok(members)
    }
}

// =============================================================================
// Wire payloads
// =============================================================================

/// `GET /orgs/{org}/memberships/{username}` response.
#[derive(Debug, Deserialize)]
struct MembershipPayload {
    state: String,
    user: MemberPayload,
}

impl MembershipPayload {
    fn into_member(self) -> RemoteMember {
        let mut member = self.user.into_member();
        member.state = self.state;
        member
    }
}

/// User object as it appears in membership and member-list payloads.
#[derive(Debug, Deserialize)]
struct MemberPayload {
    login: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl MemberPayload {
    fn into_member(self) -> RemoteMember {
        RemoteMember {
            login: self.login,
            name: self.name,
            email: self.email,
            // The members endpoint only returns active members
            state: "active".to_string(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// GitHub error body: `{message, documentation_url?, errors?}`.
#[derive(Debug, Deserialize)]
struct GitHubErrorBody {
    message: String,
}

// =============================================================================
// Error translation
// =============================================================================

/// Map a non-success response to a [`DirectoryError`].
///
/// The body is parsed for GitHub's `message` field; unparseable bodies fall
/// back to a raw snippet or the status code's canonical reason.
async fn error_from_response(response: Response) -> DirectoryError {
    let status = response.status();
    let rate_limited = status == StatusCode::FORBIDDEN && rate_limit_exhausted(response.headers());
    let message = extract_error_message(response).await;

    match status {
        StatusCode::TOO_MANY_REQUESTS => DirectoryError::RateLimited,
        StatusCode::FORBIDDEN if rate_limited => DirectoryError::RateLimited,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => DirectoryError::Auth(message),
        StatusCode::UNPROCESSABLE_ENTITY => DirectoryError::Rejected(message),
        StatusCode::NOT_FOUND => DirectoryError::NotFound(message),
        _ => DirectoryError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

fn rate_limit_exhausted(headers: &HeaderMap) -> bool {
    headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == "0")
}

async fn extract_error_message(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    if let Ok(parsed) = serde_json::from_str::<GitHubErrorBody>(&body) {
        return parsed.message;
    }

    let snippet: String = body.chars().take(200).collect();
    if snippet.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    } else {
        snippet
    }
}

/// Extract the `rel="next"` URL from a `Link` header, if any.
fn next_page_url(response: &Response) -> Option<String> {
    let link = response.headers().get("link")?.to_str().ok()?;

    link.split(',').find_map(|part| {
        let (url_part, params) = part.split_once(';')?;
        if !params.contains("rel=\"next\"") {
            return None;
        }
        let url = url_part.trim().strip_prefix('<')?.strip_suffix('>')?;
        Some(url.to_string())
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, header, method, path, query_param},
    };

    use super::*;

    fn test_config(base_url: &str) -> GitHubConfig {
        GitHubConfig {
            token: "ghp_test_token".to_string(),
            org: "acme".to_string(),
            api_base_url: base_url.to_string(),
        }
    }

    fn directory(server: &MockServer) -> GitHubDirectory {
        GitHubDirectory::new(&test_config(&server.uri())).unwrap()
    }

    fn invitation() -> RemoteInvitation {
        RemoteInvitation {
            email: "ada@example.com".to_string(),
            username: "ada".to_string(),
            role: "direct_member".to_string(),
        }
    }

    #[tokio::test]
    async fn test_invite_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/orgs/acme/invitations"))
            .and(header("authorization", "Bearer ghp_test_token"))
            .and(header("x-github-api-version", API_VERSION))
            .and(body_json(json!({
                "email": "ada@example.com",
                "role": "direct_member",
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 42,
                "email": "ada@example.com",
                "role": "direct_member",
                "created_at": "2024-03-01T12:00:00Z",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let receipt = directory(&server).invite(&invitation()).await.unwrap();
        assert_eq!(receipt.id, 42);
        assert_eq!(
            receipt.created_at,
            "2024-03-01T12:00:00Z".parse::<DateTime<Utc>>().unwrap()
        );
    }

    #[tokio::test]
    async fn test_invite_duplicate_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/orgs/acme/invitations"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "message": "Validation Failed",
                "errors": [{"code": "unprocessable", "field": "data"}],
            })))
            .mount(&server)
            .await;

        let err = directory(&server).invite(&invitation()).await.unwrap_err();
        match err {
            DirectoryError::Rejected(message) => assert_eq!(message, "Validation Failed"),
            other => panic!("expected Rejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invite_bad_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/orgs/acme/invitations"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({"message": "Bad credentials"})),
            )
            .mount(&server)
            .await;

        let err = directory(&server).invite(&invitation()).await.unwrap_err();
        assert!(matches!(err, DirectoryError::Auth(_)));
    }

    #[tokio::test]
    async fn test_get_membership() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orgs/acme/memberships/octocat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "state": "active",
                "role": "member",
                "user": {"login": "octocat", "name": "Mona Lisa", "email": null},
            })))
            .mount(&server)
            .await;

        let member = directory(&server).get("octocat").await.unwrap().unwrap();
        assert_eq!(member.login, "octocat");
        assert_eq!(member.name.as_deref(), Some("Mona Lisa"));
        assert_eq!(member.email, None);
        assert_eq!(member.state, "active");
    }

    #[tokio::test]
    async fn test_get_not_found_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orgs/acme/memberships/ghost"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})),
            )
            .mount(&server)
            .await;

        let result = directory(&server).get("ghost").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_remove_not_a_member_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/orgs/acme/memberships/ghost"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})),
            )
            .mount(&server)
            .await;

        let err = directory(&server).remove("ghost").await.unwrap_err();
        assert!(matches!(err, DirectoryError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_remove_success() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/orgs/acme/memberships/octocat"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        directory(&server).remove("octocat").await.unwrap();
    }

    #[tokio::test]
    async fn test_list_follows_link_pagination() {
        let server = MockServer::start().await;
        let page_two = format!("{}/orgs/acme/members?per_page=100&page=2", server.uri());

        Mock::given(method("GET"))
            .and(path("/orgs/acme/members"))
            .and(query_param("page", "2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{"login": "second"}])),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/orgs/acme/members"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"login": "first"}]))
                    .insert_header("link", format!("<{}>; rel=\"next\"", page_two).as_str()),
            )
            .mount(&server)
            .await;

        let members = directory(&server).list_all().await.unwrap();
        let logins: Vec<&str> = members.iter().map(|m| m.login.as_str()).collect();
        assert_eq!(logins, vec!["first", "second"]);
        assert!(members.iter().all(|m| m.state == "active"));
    }

    #[tokio::test]
    async fn test_list_empty_org() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orgs/acme/members"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let members = directory(&server).list_all().await.unwrap();
        assert!(members.is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_error_body_falls_back_to_snippet() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orgs/acme/members"))
            .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = directory(&server).list_all().await.unwrap_err();
        match err {
            DirectoryError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "<html>oops</html>");
            }
            other => panic!("expected Api, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_error_body_falls_back_to_canonical_reason() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orgs/acme/members"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let err = directory(&server).list_all().await.unwrap_err();
        match err {
            DirectoryError::Api { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("expected Api, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rate_limit_exhaustion_via_forbidden() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orgs/acme/members"))
            .respond_with(
                ResponseTemplate::new(403)
                    .insert_header("x-ratelimit-remaining", "0")
                    .set_body_json(json!({"message": "API rate limit exceeded"})),
            )
            .mount(&server)
            .await;

        let err = directory(&server).list_all().await.unwrap_err();
        assert!(matches!(err, DirectoryError::RateLimited));
    }

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let config = GitHubConfig {
            token: "t".to_string(),
            org: "acme".to_string(),
            api_base_url: "https://api.github.com/".to_string(),
        };
        let directory = GitHubDirectory::new(&config).unwrap();
        assert_eq!(
            directory.org_url("members"),
            "https://api.github.com/orgs/acme/members"
        );
    }
}
