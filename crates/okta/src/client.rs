use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

use crate::directory::{DirectoryClient, DirectoryGroup, DirectoryUser};
use crate::error::DirectoryError;

/// Page size requested from every Okta listing endpoint.
pub const PAGE_LIMIT: u32 = 200;

/// Upper bound on pages per listing: 2M records at [`PAGE_LIMIT`].
pub const MAX_PAGES: usize = 10_000;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Okta management API client authenticated with an SSWS API token.
#[derive(Debug, Clone)]
pub struct OktaClient {
    http: Client,
    base: Url,
}

impl OktaClient {
    pub fn new(org_url: &str, token: &str) -> Result<Self, DirectoryError> {
        let mut base = Url::parse(org_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("SSWS {token}"))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()?;

        Ok(Self { http, base })
    }

    #[must_use]
    pub fn org_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str, search: Option<&str>) -> Result<Url, DirectoryError> {
        let mut url = self.base.join(path)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("limit", &PAGE_LIMIT.to_string());
            if let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) {
                query.append_pair("search", search);
            }
        }
        Ok(url)
    }

    /// Follows `Link: rel="next"` until the listing is exhausted.
    ///
    /// The SSWS token rides on every request, so next links must stay on the
    /// org's origin. A page that is seen twice fails the listing.
    async fn get_all<T: DeserializeOwned>(&self, first: Url) -> Result<Vec<T>, DirectoryError> {
        let mut items = Vec::new();
        let mut visited = HashSet::new();
        let mut next = Some(first);

        while let Some(url) = next.take() {
            if visited.len() >= MAX_PAGES {
                return Err(DirectoryError::TooManyPages {
                    pages: visited.len(),
                });
            }
            if !visited.insert(url.clone()) {
                return Err(DirectoryError::PaginationCycle {
                    url: url.to_string(),
                });
            }

            log::debug!("GET {url} (page {})", visited.len());
            let response = self.http.get(url.clone()).send().await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(DirectoryError::Status {
                    status: status.as_u16(),
                    body: body.chars().take(200).collect(),
                });
            }

            next = next_link(response.headers())
                .map(|raw| self.same_origin(url.join(&raw)?))
                .transpose()?;
            let page: Vec<T> = response.json().await?;
            items.extend(page);
        }

        Ok(items)
    }

    fn same_origin(&self, candidate: Url) -> Result<Url, DirectoryError> {
        if candidate.origin() == self.base.origin() {
            Ok(candidate)
        } else {
            Err(DirectoryError::ForeignNextLink {
                url: candidate.to_string(),
                origin: self.base.origin().ascii_serialization(),
            })
        }
    }
}

#[async_trait]
impl DirectoryClient for OktaClient {
    async fn list_groups(
        &self,
        filter: Option<&str>,
    ) -> Result<Vec<DirectoryGroup>, DirectoryError> {
        self.get_all(self.endpoint("api/v1/groups", filter)?).await
    }

    async fn list_group_members(
        &self,
        group_id: &str,
    ) -> Result<Vec<DirectoryUser>, DirectoryError> {
        let mut url = self.base.join("api/v1/groups/")?;
        url.path_segments_mut()
            .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .push(group_id)
            .push("users");
        url.query_pairs_mut()
            .append_pair("limit", &PAGE_LIMIT.to_string());
        self.get_all(url).await
    }

    async fn list_users(&self, filter: Option<&str>) -> Result<Vec<DirectoryUser>, DirectoryError> {
        self.get_all(self.endpoint("api/v1/users", filter)?).await
    }
}

/// Extracts the `rel="next"` target from an RFC 8288 `Link` header.
pub fn next_link(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(LINK)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .find_map(|link| {
            let mut parts = link.split(';');
            let target = parts.next()?.trim();
            let is_next = parts.any(|param| {
                let param = param.trim();
                param
                    .strip_prefix("rel=")
                    .map(|rel| rel.trim_matches('"'))
                    .is_some_and(|rel| rel.split_whitespace().any(|r| r == "next"))
            });
            if !is_next {
                return None;
            }
            target
                .strip_prefix('<')
                .and_then(|t| t.strip_suffix('>'))
                .map(str::to_string)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(values: &[&str]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for value in values {
            map.append(LINK, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn finds_next_link_among_several() {
        let map = headers(&[
            r#"<https://okta/api/v1/groups?limit=200>; rel="self""#,
            r#"<https://okta/api/v1/groups?after=00g2&limit=200>; rel="next""#,
        ]);
        assert_eq!(
            next_link(&map).as_deref(),
            Some("https://okta/api/v1/groups?after=00g2&limit=200")
        );

        let combined = headers(&[
            r#"<https://okta/a>; rel="self", <https://okta/b>; rel="next""#,
        ]);
        assert_eq!(next_link(&combined).as_deref(), Some("https://okta/b"));
    }

    #[test]
    fn no_next_link_on_last_page() {
        let map = headers(&[r#"<https://okta/api/v1/groups?limit=200>; rel="self""#]);
        assert_eq!(next_link(&map), None);
        assert_eq!(next_link(&HeaderMap::new()), None);
    }

    #[test]
    fn endpoints_keep_org_path_and_encode_search() {
        let client = OktaClient::new("https://example.okta.com/tenant", "t").unwrap();
        let url = client
            .endpoint("api/v1/users", Some(r#"profile.organization eq "engineering""#))
            .unwrap();
        assert_eq!(url.path(), "/tenant/api/v1/users");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("limit".to_string(), "200".to_string()),
                (
                    "search".to_string(),
                    r#"profile.organization eq "engineering""#.to_string()
                ),
            ]
        );
    }

    #[test]
    fn rejects_invalid_org_url() {
        assert!(matches!(
            OktaClient::new("not a url", "t"),
            Err(DirectoryError::InvalidUrl(_))
        ));
    }
}
