//! Minimal wrapper around Instagram's tag web-info endpoint.
//!
//! Attaches the browser-like headers and session credentials the endpoint
//! expects, then delegates to the shared HTTP client. One page, one attempt:
//! pagination (`next_max_id`) and retries are deliberately not handled.
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tagscope_common::Hashtag;
use tagscope_http::{HttpClient, HttpError, RequestOpts};

use crate::pipeline::TagFeedSource;

pub const FALLBACK_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";
const TAG_WEB_INFO_PATH: &str = "api/v1/tags/web_info/";
const SEC_CH_UA: &str = r#""Not/A)Brand";v="8", "Chromium";v="126", "Google Chrome";v="126""#;

/// Session values copied from a logged-in browser. Every field is optional;
/// missing ones are reported when the client is built.
#[derive(Clone, Default)]
pub struct InstagramCredentials {
    pub cookie: Option<String>,
    pub user_agent: Option<String>,
    pub asbd_id: Option<String>,
    pub csrf_token: Option<String>,
    pub ig_app_id: Option<String>,
    pub ig_www_claim: Option<String>,
}

impl InstagramCredentials {
    fn optional_headers(&self) -> [(&'static str, Option<&str>); 4] {
        [
            ("x-asbd-id", self.asbd_id.as_deref()),
            ("x-csrftoken", self.csrf_token.as_deref()),
            ("x-ig-app-id", self.ig_app_id.as_deref()),
            ("x-ig-www-claim", self.ig_www_claim.as_deref()),
        ]
    }
}

impl fmt::Debug for InstagramCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Presence only; values are session secrets.
        f.debug_struct("InstagramCredentials")
            .field("cookie", &self.cookie.is_some())
            .field("user_agent", &self.user_agent)
            .field("asbd_id", &self.asbd_id.is_some())
            .field("csrf_token", &self.csrf_token.is_some())
            .field("ig_app_id", &self.ig_app_id.is_some())
            .field("ig_www_claim", &self.ig_www_claim.is_some())
            .finish()
    }
}

#[derive(Clone)]
pub struct InstagramApi {
    http: HttpClient,
    credentials: InstagramCredentials,
}

impl InstagramApi {
    pub fn new(
        base_url: &str,
        credentials: InstagramCredentials,
        timeout: Duration,
    ) -> Result<Self, HttpError> {
        let http = HttpClient::new(base_url)?.with_timeout(timeout);

        if credentials.cookie.is_none() {
            tracing::warn!(
                "instagram.credentials.cookie_missing: requests will likely be rejected"
            );
        }
        for (header, value) in credentials.optional_headers() {
            if value.is_none() {
                tracing::warn!(header, "instagram.credentials.header_missing");
            }
        }

        Ok(Self { http, credentials })
    }

    fn headers_for(&self, hashtag: &Hashtag) -> Result<HeaderMap, HttpError> {
        let creds = &self.credentials;
        let mut headers = HeaderMap::new();

        let referer = format!("https://www.instagram.com/explore/tags/{hashtag}/");
        let user_agent = creds.user_agent.as_deref().unwrap_or(FALLBACK_USER_AGENT);
        let fixed: [(&str, &str); 10] = [
            ("accept", "*/*"),
            ("accept-language", "en-US,en;q=0.9"),
            ("referer", &referer),
            ("sec-ch-ua", SEC_CH_UA),
            ("sec-ch-ua-mobile", "?0"),
            ("sec-ch-ua-platform", "Linux"),
            ("sec-fetch-dest", "empty"),
            ("sec-fetch-mode", "cors"),
            ("sec-fetch-site", "same-origin"),
            ("x-requested-with", "XMLHttpRequest"),
        ];
        for (name, value) in fixed {
            insert(&mut headers, name, value)?;
        }
        insert(&mut headers, "user-agent", user_agent)?;

        if let Some(cookie) = creds.cookie.as_deref() {
            insert(&mut headers, "cookie", cookie)?;
        }
        for (name, value) in creds.optional_headers() {
            if let Some(value) = value {
                insert(&mut headers, name, value)?;
            }
        }
        Ok(headers)
    }

    /// Fetch the raw `tags/web_info` document for `hashtag`.
    pub async fn tag_web_info(&self, hashtag: &Hashtag) -> Result<Bytes, HttpError> {
        tracing::info!(%hashtag, "instagram.tag_web_info.start");
        let body = self
            .http
            .get_bytes(
                TAG_WEB_INFO_PATH,
                RequestOpts {
                    headers: Some(self.headers_for(hashtag)?),
                    query: Some(vec![("tag_name", hashtag.as_str().into())]),
                    ..Default::default()
                },
            )
            .await?;
        tracing::info!(%hashtag, bytes = body.len(), "instagram.tag_web_info.done");
        Ok(body)
    }
}

#[async_trait]
impl TagFeedSource for InstagramApi {
    async fn fetch_tag_feed(&self, hashtag: &Hashtag) -> Result<Bytes, HttpError> {
        self.tag_web_info(hashtag).await
    }
}

fn insert(headers: &mut HeaderMap, name: &str, value: &str) -> Result<(), HttpError> {
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| HttpError::Build(format!("invalid header name {name}: {e}")))?;
    let value = HeaderValue::from_str(value)
        .map_err(|e| HttpError::Build(format!("invalid value for header {name}: {e}")))?;
    headers.insert(name, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(credentials: InstagramCredentials) -> InstagramApi {
        InstagramApi::new("https://example.invalid", credentials, Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn falls_back_to_default_user_agent_and_skips_missing_credentials() {
        let tag = Hashtag::parse("kitten").unwrap();
        let headers = api(InstagramCredentials::default()).headers_for(&tag).unwrap();

        assert_eq!(headers["user-agent"], FALLBACK_USER_AGENT);
        assert_eq!(
            headers["referer"],
            "https://www.instagram.com/explore/tags/kitten/"
        );
        assert!(headers.get("cookie").is_none());
        assert!(headers.get("x-csrftoken").is_none());
    }

    #[test]
    fn configured_credentials_become_headers() {
        let tag = Hashtag::parse("kitten").unwrap();
        let headers = api(InstagramCredentials {
            cookie: Some("sessionid=1".into()),
            user_agent: Some("custom-agent".into()),
            asbd_id: Some("129477".into()),
            csrf_token: Some("csrf".into()),
            ig_app_id: Some("936619743392459".into()),
            ig_www_claim: Some("0".into()),
        })
        .headers_for(&tag)
        .unwrap();

        assert_eq!(headers["cookie"], "sessionid=1");
        assert_eq!(headers["user-agent"], "custom-agent");
        assert_eq!(headers["x-asbd-id"], "129477");
        assert_eq!(headers["x-csrftoken"], "csrf");
        assert_eq!(headers["x-ig-app-id"], "936619743392459");
        assert_eq!(headers["x-ig-www-claim"], "0");
    }

    #[test]
    fn control_characters_in_credentials_are_rejected() {
        let tag = Hashtag::parse("kitten").unwrap();
        let err = api(InstagramCredentials {
            cookie: Some("bad\nvalue".into()),
            ..Default::default()
        })
        .headers_for(&tag)
        .unwrap_err();
        assert!(matches!(err, HttpError::Build(_)));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let creds = InstagramCredentials {
            cookie: Some("sessionid=topsecret".into()),
            ..Default::default()
        };
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("topsecret"));
        assert!(rendered.contains("cookie: true"));
    }
}
