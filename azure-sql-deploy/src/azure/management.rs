// Azure Resource Manager REST client
//
// Builds versioned URLs and decodes the `{ value: [...] }` envelope. Non-2xx responses are
// returned as `ArmResponse` with the decoded ARM error so callers decide what they mean.

use serde::de::DeserializeOwned;
use std::sync::Arc;
use url::Url;

use super::transport::HttpTransport;
use crate::config::ManagementSettings;
use crate::error::{DeployError, DeployResult};
use crate::models::azure::{
    AccessToken, ArmErrorBody, ArmErrorDetail, ArmList, SqlDatabase, SqlServer, SubscriptionDto,
};

/// Upper bound on `nextLink` pages followed for one listing.
const MAX_PAGES: usize = 50;

#[derive(Debug, Clone)]
pub struct ArmResponse<T> {
    pub status: u16,
    pub value: Vec<T>,
    pub error: Option<ArmErrorDetail>,
}

impl<T> ArmResponse<T> {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx answer into `DeployError::ManagementStatus`.
    pub fn into_result(self, context: &str) -> DeployResult<Vec<T>> {
        if self.is_success() {
            return Ok(self.value);
        }
        let message = self
            .error
            .map(|e| {
                if e.code.is_empty() {
                    e.message
                } else if e.message.is_empty() {
                    e.code
                } else {
                    format!("{}: {}", e.code, e.message)
                }
            })
            .unwrap_or_default();
        Err(DeployError::ManagementStatus {
            status: self.status,
            context: context.to_string(),
            message,
        })
    }
}

pub struct ManagementClient {
    transport: Arc<dyn HttpTransport>,
    settings: ManagementSettings,
}

impl ManagementClient {
    pub fn new(transport: Arc<dyn HttpTransport>, settings: ManagementSettings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    fn versioned_url(&self, path: &str, api_version: &str) -> DeployResult<String> {
        let base = self.settings.endpoint.trim_end_matches('/');
        let mut url = Url::parse(base).map_err(|e| DeployError::Transport {
            url: base.to_string(),
            details: format!("invalid management endpoint: {}", e),
        })?;
        url.set_path(path);
        url.query_pairs_mut().append_pair("api-version", api_version);
        Ok(url.to_string())
    }

    pub fn subscriptions_url(&self) -> DeployResult<String> {
        self.versioned_url("/subscriptions", &self.settings.subscriptions_api_version)
    }

    pub fn sql_servers_url(&self, subscription_id: &str) -> DeployResult<String> {
        self.versioned_url(
            &format!(
                "/subscriptions/{}/providers/Microsoft.Sql/servers",
                subscription_id.trim()
            ),
            &self.settings.sql_api_version,
        )
    }

    pub fn databases_url(&self, server_id: &str) -> DeployResult<String> {
        self.versioned_url(
            &format!("{}/databases", server_id.trim().trim_end_matches('/')),
            &self.settings.databases_api_version,
        )
    }

    /// The bearer token only ever goes to the configured endpoint's scheme, host and port.
    fn is_management_origin(&self, link: &str) -> bool {
        let (Ok(base), Ok(next)) = (
            Url::parse(self.settings.endpoint.trim_end_matches('/')),
            Url::parse(link.trim()),
        ) else {
            return false;
        };
        base.scheme() == next.scheme()
            && base.host_str().map(str::to_ascii_lowercase)
                == next.host_str().map(str::to_ascii_lowercase)
            && base.port_or_known_default() == next.port_or_known_default()
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        url: String,
        token: &AccessToken,
        context: &str,
    ) -> DeployResult<ArmResponse<T>> {
        let mut value = Vec::new();
        let mut next = Some(url);
        let mut pages = 0;

        while let Some(page_url) = next.take() {
            pages += 1;
            let resp = self.transport.get(&page_url, &token.token).await?;
            if !resp.is_success() {
                let error = serde_json::from_str::<ArmErrorBody>(&resp.body)
                    .ok()
                    .and_then(|b| b.error);
                log::warn!(
                    "[PHASE: azure] [STEP: {}] HTTP {}: {}",
                    context,
                    resp.status,
                    error.as_ref().map(|e| e.message.as_str()).unwrap_or("")
                );
                return Ok(ArmResponse {
                    status: resp.status,
                    value: Vec::new(),
                    error,
                });
            }

            let list: ArmList<T> =
                serde_json::from_str(&resp.body).map_err(|e| DeployError::Decode {
                    context: context.to_string(),
                    details: e.to_string(),
                })?;
            value.extend(list.value);

            if pages >= MAX_PAGES {
                log::warn!(
                    "[PHASE: azure] [STEP: {}] Stopped after {} pages",
                    context,
                    MAX_PAGES
                );
                break;
            }
            next = list.next_link.filter(|l| !l.trim().is_empty());
            if let Some(link) = &next {
                if !self.is_management_origin(link) {
                    log::error!(
                        "[PHASE: azure] [STEP: {}] Refusing nextLink outside {}",
                        context,
                        self.settings.endpoint
                    );
                    return Err(DeployError::Decode {
                        context: context.to_string(),
                        details: "nextLink points outside the management endpoint".to_string(),
                    });
                }
            }
        }

        Ok(ArmResponse {
            status: 200,
            value,
            error: None,
        })
    }

    pub async fn list_subscriptions(
        &self,
        token: &AccessToken,
    ) -> DeployResult<ArmResponse<SubscriptionDto>> {
        let url = self.subscriptions_url()?;
        self.get_list(url, token, "list_subscriptions").await
    }

    pub async fn list_sql_servers(
        &self,
        token: &AccessToken,
        subscription_id: &str,
    ) -> DeployResult<ArmResponse<SqlServer>> {
        let url = self.sql_servers_url(subscription_id)?;
        self.get_list(url, token, "list_sql_servers").await
    }

    pub async fn list_databases(
        &self,
        token: &AccessToken,
        server_id: &str,
    ) -> DeployResult<ArmResponse<SqlDatabase>> {
        let url = self.databases_url(server_id)?;
        self.get_list(url, token, "list_databases").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::azure::transport::CannedTransport;
    use serde_json::json;

    fn token() -> AccessToken {
        AccessToken {
            token: "tok".to_string(),
            token_type: "Bearer".to_string(),
        }
    }

    fn client(transport: Arc<CannedTransport>) -> ManagementClient {
        ManagementClient::new(transport, ManagementSettings::default())
    }

    #[test]
    fn urls_carry_api_versions() {
        let c = client(Arc::new(CannedTransport::new()));
        assert_eq!(
            c.sql_servers_url("X").unwrap(),
            "https://management.azure.com/subscriptions/X/providers/Microsoft.Sql/servers?api-version=2019-06-01-preview"
        );
        assert_eq!(
            c.subscriptions_url().unwrap(),
            "https://management.azure.com/subscriptions?api-version=2020-01-01"
        );
        assert_eq!(
            c.databases_url("/subscriptions/X/resourceGroups/RG1/providers/Microsoft.Sql/servers/srv1")
                .unwrap(),
            "https://management.azure.com/subscriptions/X/resourceGroups/RG1/providers/Microsoft.Sql/servers/srv1/databases?api-version=2017-10-01-preview"
        );
    }

    #[tokio::test]
    async fn server_list_decodes_value_envelope() {
        let transport = Arc::new(CannedTransport::new().with_json(
            "/subscriptions/X/providers/Microsoft.Sql/servers",
            200,
            json!({ "value": [
                { "name": "srv1", "id": "/subscriptions/X/resourceGroups/RG1/providers/Microsoft.Sql/servers/srv1" }
            ]}),
        ));
        let resp = client(transport).list_sql_servers(&token(), "X").await.unwrap();
        assert!(resp.is_success());
        assert_eq!(resp.value.len(), 1);
        assert_eq!(resp.value[0].name, "srv1");
    }

    #[tokio::test]
    async fn non_2xx_is_returned_with_arm_error() {
        let transport = Arc::new(CannedTransport::new().with_json(
            "/subscriptions/X/providers/Microsoft.Sql/servers",
            403,
            json!({ "error": { "code": "AuthorizationFailed", "message": "no access" } }),
        ));
        let resp = client(transport).list_sql_servers(&token(), "X").await.unwrap();
        assert_eq!(resp.status, 403);
        assert!(resp.value.is_empty());
        assert_eq!(resp.error.as_ref().unwrap().code, "AuthorizationFailed");

        let err = resp.into_result("list servers").unwrap_err();
        assert_eq!(
            err.user_message(),
            "Azure returned an error (HTTP 403): AuthorizationFailed: no access"
        );
    }

    #[tokio::test]
    async fn non_json_error_body_still_returns_status() {
        let transport = Arc::new(CannedTransport::new());
        transport.route_json("/subscriptions", 500, json!("gateway exploded"));
        let resp = client(transport).list_subscriptions(&token()).await.unwrap();
        assert_eq!(resp.status, 500);
        assert!(resp.error.is_none());
    }

    #[tokio::test]
    async fn malformed_success_body_is_decode_error() {
        let transport = Arc::new(CannedTransport::new().with_json(
            "/subscriptions",
            200,
            json!({ "value": "not-a-list" }),
        ));
        let err = client(transport).list_subscriptions(&token()).await.unwrap_err();
        assert!(matches!(err, DeployError::Decode { .. }));
    }

    #[tokio::test]
    async fn next_link_pages_are_concatenated() {
        let transport = Arc::new(
            CannedTransport::new()
                .with_json(
                    "/subscriptions",
                    200,
                    json!({
                        "value": [{ "subscriptionId": "s1", "displayName": "One" }],
                        "nextLink": "https://management.azure.com/subscriptions/page2?api-version=2020-01-01"
                    }),
                )
                .with_json(
                    "/subscriptions/page2",
                    200,
                    json!({ "value": [{ "subscriptionId": "s2", "displayName": "Two" }] }),
                ),
        );
        let resp = client(transport.clone())
            .list_subscriptions(&token())
            .await
            .unwrap();
        let ids: Vec<&str> = resp.value.iter().map(|s| s.subscription_id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s2"]);
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn next_link_to_foreign_host_is_not_followed() {
        let transport = Arc::new(CannedTransport::new().with_json(
            "/subscriptions",
            200,
            json!({
                "value": [{ "subscriptionId": "s1", "displayName": "One" }],
                "nextLink": "https://collector.example.net/subscriptions/page2?api-version=2020-01-01"
            }),
        ));
        let err = client(transport.clone())
            .list_subscriptions(&token())
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::Decode { .. }));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn relative_or_downgraded_next_link_is_refused() {
        for link in [
            "/subscriptions/page2",
            "http://management.azure.com/subscriptions/page2",
        ] {
            let transport = Arc::new(CannedTransport::new().with_json(
                "/subscriptions",
                200,
                json!({ "value": [], "nextLink": link }),
            ));
            let err = client(transport.clone())
                .list_subscriptions(&token())
                .await
                .unwrap_err();
            assert!(matches!(err, DeployError::Decode { .. }), "{}", link);
            assert_eq!(transport.requests().len(), 1);
        }
    }
}
