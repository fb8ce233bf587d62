//! OAuth linking of a user's Meta business account
//!
//! Two-step redirect flow: `authorize_url` sends the browser to the Meta
//! login dialog with the application user id riding along as `state`;
//! the callback then calls [`OauthClient::link`] to turn the returned
//! code into a long-lived token plus the associated WhatsApp business
//! account id and phone number.

use reqwest::{Client, Url};
use relay_core::config::MetaConfig;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{MetaError, Result};

/// Meta login dialog endpoint
const DIALOG_OAUTH_URL: &str = "https://www.facebook.com/v19.0/dialog/oauth";

/// Scopes requested for WhatsApp business linking
const OAUTH_SCOPES: &str = "whatsapp_business_management,whatsapp_business_messaging";

/// OAuth client for the account-linking flow
#[derive(Clone)]
pub struct OauthClient {
    client: Client,
    base_url: String,
    dialog_url: String,
    app_id: String,
    app_secret: String,
    redirect_uri: String,
}

/// Result of a completed link: the long-lived token and the business
/// identifiers found for it. Identifier lookup is best-effort; the token
/// is the load-bearing part.
#[derive(Debug, Clone)]
pub struct LinkedAccount {
    pub access_token: String,
    pub waba_id: String,
    pub phone_number: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct DataList<T> {
    #[serde(default)]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct IdObject {
    id: String,
}

#[derive(Debug, Deserialize)]
struct PhoneNumberObject {
    #[serde(default)]
    display_phone_number: String,
}

impl OauthClient {
    /// Build a client from configuration, or None when the OAuth fields
    /// are absent
    pub fn from_config(meta: &MetaConfig) -> Option<Self> {
        match (&meta.app_id, &meta.app_secret, &meta.redirect_uri) {
            (Some(app_id), Some(app_secret), Some(redirect_uri)) => Some(Self {
                client: Client::new(),
                base_url: meta.graph_base_url.clone(),
                dialog_url: DIALOG_OAUTH_URL.to_string(),
                app_id: app_id.clone(),
                app_secret: app_secret.clone(),
                redirect_uri: redirect_uri.clone(),
            }),
            _ => None,
        }
    }

    /// Build the login dialog URL, carrying the user id as `state`
    pub fn authorize_url(&self, state: &str) -> String {
        // Statically valid base URL, parameters are all encoded by Url.
        Url::parse_with_params(
            &self.dialog_url,
            &[
                ("client_id", self.app_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", OAUTH_SCOPES),
                ("state", state),
            ],
        )
        .map(|u| u.to_string())
        .unwrap_or_else(|_| self.dialog_url.clone())
    }

    /// Exchange an authorization code for a short-lived token
    pub async fn exchange_code(&self, code: &str) -> Result<String> {
        debug!("Exchanging authorization code for access token");
        let response = self
            .client
            .get(format!("{}/oauth/access_token", self.base_url))
            .query(&[
                ("client_id", self.app_id.as_str()),
                ("client_secret", self.app_secret.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("code", code),
            ])
            .send()
            .await?;

        Self::parse_token(response).await
    }

    /// Exchange a short-lived token for a long-lived one
    pub async fn extend_token(&self, short_lived_token: &str) -> Result<String> {
        debug!("Exchanging short-lived token for long-lived token");
        let response = self
            .client
            .get(format!("{}/oauth/access_token", self.base_url))
            .query(&[
                ("grant_type", "fb_exchange_token"),
                ("client_id", self.app_id.as_str()),
                ("client_secret", self.app_secret.as_str()),
                ("fb_exchange_token", short_lived_token),
            ])
            .send()
            .await?;

        Self::parse_token(response).await
    }

    async fn parse_token(response: reqwest::Response) -> Result<String> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(MetaError::OAuth(format!("{} - {}", status, body)));
        }

        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| MetaError::OAuth(format!("Malformed token response: {} - {}", e, body)))?;

        if parsed.access_token.is_empty() {
            return Err(MetaError::OAuth("Empty access token".to_string()));
        }

        Ok(parsed.access_token)
    }

    /// Find the WhatsApp business account id and display phone number the
    /// token can manage
    pub async fn lookup_business(&self, access_token: &str) -> Result<(String, String)> {
        let business: IdObject = self
            .get_first(&format!("{}/me/businesses", self.base_url), access_token)
            .await?;

        let waba: IdObject = self
            .get_first(
                &format!(
                    "{}/{}/owned_whatsapp_business_accounts",
                    self.base_url, business.id
                ),
                access_token,
            )
            .await?;

        let phone: PhoneNumberObject = self
            .get_first(
                &format!("{}/{}/phone_numbers", self.base_url, waba.id),
                access_token,
            )
            .await?;

        Ok((waba.id, phone.display_phone_number))
    }

    async fn get_first<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        access_token: &str,
    ) -> Result<T> {
        let response = self
            .client
            .get(url)
            .query(&[("access_token", access_token)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(MetaError::Api(format!("{} - {}", status, body)));
        }

        let list: DataList<T> = serde_json::from_str(&body)?;
        list.data
            .into_iter()
            .next()
            .ok_or_else(|| MetaError::Api(format!("Empty result from {}", url)))
    }

    /// Run the whole exchange: code → short-lived token → long-lived token
    /// → business lookup.
    ///
    /// The identifier lookup is tolerated to fail: the record is still
    /// linkable with the token alone, so a lookup error stores empty
    /// identifiers instead of failing the callback.
    pub async fn link(&self, code: &str) -> Result<LinkedAccount> {
        let short_lived = self.exchange_code(code).await?;
        let access_token = self.extend_token(&short_lived).await?;

        let (waba_id, phone_number) = match self.lookup_business(&access_token).await {
            Ok(found) => found,
            Err(e) => {
                warn!("Business account lookup failed, linking token only: {}", e);
                (String::new(), String::new())
            }
        };

        info!("Linked business account: waba_id={}", waba_id);
        Ok(LinkedAccount {
            access_token,
            waba_id,
            phone_number,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, routing::get, Json, Router};
    use std::collections::HashMap;

    fn oauth_config(graph_base_url: &str) -> MetaConfig {
        MetaConfig {
            app_id: Some("424242".to_string()),
            app_secret: Some("shhh".to_string()),
            redirect_uri: Some("https://relay.example.com/auth/callback".to_string()),
            graph_base_url: graph_base_url.to_string(),
            ..MetaConfig::default()
        }
    }

    async fn spawn_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_from_config_requires_all_fields() {
        assert!(OauthClient::from_config(&MetaConfig::default()).is_none());
        assert!(OauthClient::from_config(&oauth_config("https://graph.facebook.com/v19.0")).is_some());
    }

    #[test]
    fn test_authorize_url() {
        let client =
            OauthClient::from_config(&oauth_config("https://graph.facebook.com/v19.0")).unwrap();
        let url = client.authorize_url("user-77");

        assert!(url.starts_with("https://www.facebook.com/v19.0/dialog/oauth?"));
        assert!(url.contains("client_id=424242"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("state=user-77"));
        assert!(url.contains("whatsapp_business_management"));
        // redirect_uri must arrive percent-encoded
        assert!(url.contains("redirect_uri=https%3A%2F%2Frelay.example.com%2Fauth%2Fcallback"));
    }

    #[tokio::test]
    async fn test_link_full_exchange() {
        let router = Router::new()
            .route(
                "/oauth/access_token",
                get(|Query(params): Query<HashMap<String, String>>| async move {
                    // Second call swaps the short-lived token for a
                    // long-lived one.
                    let token = if params.get("grant_type").map(String::as_str)
                        == Some("fb_exchange_token")
                    {
                        assert_eq!(params["fb_exchange_token"], "short-token");
                        "long-token"
                    } else {
                        assert_eq!(params["code"], "auth-code");
                        "short-token"
                    };
                    Json(serde_json::json!({"access_token": token, "token_type": "bearer"}))
                }),
            )
            .route(
                "/me/businesses",
                get(|| async { Json(serde_json::json!({"data": [{"id": "biz-1", "name": "Acme"}]})) }),
            )
            .route(
                "/biz-1/owned_whatsapp_business_accounts",
                get(|| async { Json(serde_json::json!({"data": [{"id": "waba-9"}]})) }),
            )
            .route(
                "/waba-9/phone_numbers",
                get(|| async {
                    Json(serde_json::json!({"data": [{"display_phone_number": "+1 555 000 1111"}]}))
                }),
            );
        let base_url = spawn_stub(router).await;

        let client = OauthClient::from_config(&oauth_config(&base_url)).unwrap();
        let linked = client.link("auth-code").await.unwrap();

        assert_eq!(linked.access_token, "long-token");
        assert_eq!(linked.waba_id, "waba-9");
        assert_eq!(linked.phone_number, "+1 555 000 1111");
    }

    #[tokio::test]
    async fn test_link_tolerates_lookup_failure() {
        let router = Router::new().route(
            "/oauth/access_token",
            get(|| async { Json(serde_json::json!({"access_token": "long-token"})) }),
        );
        let base_url = spawn_stub(router).await;

        let client = OauthClient::from_config(&oauth_config(&base_url)).unwrap();
        let linked = client.link("auth-code").await.unwrap();

        assert_eq!(linked.access_token, "long-token");
        assert!(linked.waba_id.is_empty());
        assert!(linked.phone_number.is_empty());
    }

    #[tokio::test]
    async fn test_exchange_failure_is_an_error() {
        let router = Router::new().route(
            "/oauth/access_token",
            get(|| async { (axum::http::StatusCode::BAD_REQUEST, "code expired") }),
        );
        let base_url = spawn_stub(router).await;

        let client = OauthClient::from_config(&oauth_config(&base_url)).unwrap();
        assert!(client.link("stale-code").await.is_err());
    }
}
