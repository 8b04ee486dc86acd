//! DuckDuckGo HTML search.
//!
//! Uses the JavaScript-free endpoint at `html.duckduckgo.com`, which returns a
//! plain results page. Each organic result looks like:
//!
//! ```html
//! <div class="result results_links web-result">
//!   <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2F&rut=...">Title</a>
//!   <a class="result__snippet" href="...">Excerpt with <b>highlights</b></a>
//! </div>
//! ```
//!
//! Links go through DuckDuckGo's redirector; the real target is in the
//! `uddg` query parameter. Sponsored results carry `result--ad` and are
//! skipped.

use super::{SearchProvider, SearchRequest};
use crate::models::RawSnippet;
use itertools::Itertools;
use scraper::{ElementRef, Html, Selector};
use std::error::Error;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

const ENDPOINT: &str = "https://html.duckduckgo.com/html/";
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct DuckDuckGo {
    http: reqwest::Client,
    endpoint: String,
}

impl DuckDuckGo {
    /// Build a client whose every call is bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, Box<dyn Error>> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            http,
            endpoint: ENDPOINT.to_string(),
        })
    }

    fn request_url(&self, request: &SearchRequest) -> String {
        format!(
            "{}?q={}&kl={}&df={}",
            self.endpoint,
            urlencoding::encode(&request.query),
            urlencoding::encode(&request.region),
            request.recency.code()
        )
    }
}

impl SearchProvider for DuckDuckGo {
    #[instrument(level = "info", skip_all, fields(query = %request.query))]
    async fn search(&self, request: &SearchRequest) -> Result<Vec<RawSnippet>, Box<dyn Error>> {
        let response = self.http.get(self.request_url(request)).send().await?;

        // 202 is the anti-bot challenge page, not results
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            warn!(%status, "DuckDuckGo refused the query");
            return Err(format!("DuckDuckGo returned {}", status).into());
        }

        let html = response.text().await?;
        let snippets = parse_results(&html, request.max_results)?;
        debug!(count = snippets.len(), bytes = html.len(), "Parsed DuckDuckGo results");
        Ok(snippets)
    }
}

/// Extract up to `max` organic results from a DuckDuckGo HTML results page.
pub fn parse_results(html: &str, max: usize) -> Result<Vec<RawSnippet>, Box<dyn Error>> {
    let document = Html::parse_document(html);
    let result_selector = Selector::parse(".result:not(.result--ad)")?;
    let link_selector = Selector::parse("a.result__a")?;
    let snippet_selector = Selector::parse(".result__snippet")?;

    let mut snippets = Vec::new();
    for result in document.select(&result_selector) {
        if snippets.len() >= max {
            break;
        }
        let Some(link) = result.select(&link_selector).next() else {
            continue;
        };
        let Some(url) = link.value().attr("href").and_then(resolve_link) else {
            continue;
        };
        let body = result
            .select(&snippet_selector)
            .next()
            .map(element_text)
            .unwrap_or_default();

        snippets.push(RawSnippet {
            title: element_text(link),
            url,
            body,
        });
    }
    Ok(snippets)
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().split_whitespace().join(" ")
}

/// Turn a result href into an absolute http(s) URL, unwrapping the redirector.
fn resolve_link(href: &str) -> Option<String> {
    let base = Url::parse("https://duckduckgo.com/").ok()?;
    let mut url = base.join(href).ok()?;

    if url.host_str().is_some_and(|h| h.ends_with("duckduckgo.com")) && url.path() == "/l/" {
        let target = url
            .query_pairs()
            .find(|(k, _)| k == "uddg")
            .map(|(_, v)| v.into_owned())?;
        url = Url::parse(&target).ok()?;
    }

    match url.scheme() {
        "http" | "https" => Some(url.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Recency;

    const PAGE: &str = r##"
        <html><body>
        <div class="result results_links result--ad">
          <a class="result__a" href="https://ads.example.com/">Sponsored</a>
          <a class="result__snippet">buy now</a>
        </div>
        <div class="result results_links web-result">
          <h2 class="result__title">
            <a rel="nofollow" class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fnews.example.com%2Fkfc%3Fid%3D1&amp;rut=abc">王者荣耀 x <b>肯德基</b> 联动</a>
          </h2>
          <a class="result__snippet" href="#">官宣 <b>联动</b>
             限定皮肤上线</a>
        </div>
        <div class="result results_links web-result">
          <a class="result__a" href="https://direct.example.org/post">Direct link</a>
        </div>
        <div class="result results_links web-result">
          <a class="result__a" href="javascript:void(0)">Broken</a>
          <a class="result__snippet">ignored</a>
        </div>
        <div class="result results_links web-result">
          <span>No link at all</span>
        </div>
        </body></html>
    "##;

    #[test]
    fn test_parse_results_unwraps_and_skips() {
        let snippets = parse_results(PAGE, 10).unwrap();
        assert_eq!(snippets.len(), 2);

        assert_eq!(snippets[0].title, "王者荣耀 x 肯德基 联动");
        assert_eq!(snippets[0].url, "https://news.example.com/kfc?id=1");
        assert_eq!(snippets[0].body, "官宣 联动 限定皮肤上线");

        assert_eq!(snippets[1].url, "https://direct.example.org/post");
        assert_eq!(snippets[1].body, "");
    }

    #[test]
    fn test_parse_results_respects_max() {
        assert_eq!(parse_results(PAGE, 1).unwrap().len(), 1);
        assert!(parse_results(PAGE, 0).unwrap().is_empty());
    }

    #[test]
    fn test_parse_results_on_unrelated_page() {
        assert!(parse_results("<html><p>captcha</p></html>", 8).unwrap().is_empty());
    }

    #[test]
    fn test_request_url_encodes_query() {
        let ddg = DuckDuckGo::new(Duration::from_secs(1)).unwrap();
        let url = ddg.request_url(&SearchRequest {
            query: "KPL (联动 OR 合作)".to_string(),
            region: "cn-zh".to_string(),
            recency: Recency::Year,
            max_results: 8,
        });

        assert!(url.starts_with("https://html.duckduckgo.com/html/?q=KPL%20%28"));
        assert!(url.ends_with("&kl=cn-zh&df=y"));
    }
}
