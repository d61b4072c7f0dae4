//! GitHub code search snippet source.
//!
//! One search query per keyword (`<keyword> org:<name>[ branch:<b>]`), paged
//! to the end of its results. Each matched file is fetched individually and
//! turned into one snippet. Nothing is prefetched beyond the current page of
//! search hits, and file contents are fetched only when the orchestrator asks
//! for the next snippet.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use regex::Regex;
use tracing::{error, info, warn};

use dml_config::{GithubConfig, ScanConfig};
use dml_core::{CodeSnippet, SnippetSource};

use crate::context::{ContextPolicy, keyword_matcher, line_number, locate_match};
use crate::error::SourceError;
use crate::http::check_response;

/// Results per search page (the API maximum).
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// The search API never returns more than this many results per query.
const MAX_SEARCH_RESULTS: u32 = 1_000;

const API_VERSION: &str = "2022-11-28";
const TEXT_MATCH_MEDIA_TYPE: &str = "application/vnd.github.text-match+json";
const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";

// ── Wire types ─────────────────────────────────────────────────────

#[derive(Debug, serde::Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub total_count: u32,
    #[serde(default)]
    pub items: Vec<SearchItem>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct SearchItem {
    pub path: String,
    pub repository: SearchRepository,
    #[serde(default)]
    pub text_matches: Vec<TextMatch>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct SearchRepository {
    pub name: String,
    pub full_name: String,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct TextMatch {
    #[serde(default)]
    pub fragment: String,
}

#[derive(serde::Deserialize)]
struct ContentResponse {
    #[serde(default)]
    encoding: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

// ── Client ─────────────────────────────────────────────────────────

/// Thin client over the two REST endpoints the source needs.
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl GitHubClient {
    /// Create a client for `api_url` authenticating with `token`.
    ///
    /// # Panics
    ///
    /// Panics if the underlying `reqwest::Client` fails to build.
    #[must_use]
    pub fn new(api_url: &str, token: &str) -> Self {
        Self {
            http: reqwest::Client::builder()
                .user_agent("dmlcat/0.1")
                .timeout(Duration::from_secs(30))
                .build()
                .expect("reqwest client should build"),
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    /// Fetch one page of code search results, with text-match fragments.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::RateLimited`] when throttled, and
    /// [`SourceError`] for transport, status, or parse failures.
    pub async fn search_code(
        &self,
        query: &str,
        page: u32,
        per_page: u32,
    ) -> Result<SearchPage, SourceError> {
        let url = format!(
            "{}/search/code?q={}&per_page={per_page}&page={page}",
            self.api_url,
            urlencoding::encode(query)
        );
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, TEXT_MATCH_MEDIA_TYPE)
            .header("X-GitHub-Api-Version", API_VERSION)
            .send()
            .await?;
        let resp = check_response(resp).await?;
        Ok(resp.json().await?)
    }

    /// Fetch and decode the content of one file, optionally at `git_ref`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the request fails, the path is not a
    /// regular file, or the content is not base64-encoded UTF-8.
    pub async fn file_content(
        &self,
        repo_full_name: &str,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<String, SourceError> {
        let mut url = format!(
            "{}/repos/{}/contents/{}",
            self.api_url,
            encode_segments(repo_full_name),
            encode_segments(path)
        );
        if let Some(git_ref) = git_ref {
            url.push_str("?ref=");
            url.push_str(&urlencoding::encode(git_ref));
        }

        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, JSON_MEDIA_TYPE)
            .header("X-GitHub-Api-Version", API_VERSION)
            .send()
            .await?;
        let resp = check_response(resp).await?;
        let body: ContentResponse = resp.json().await?;
        decode_content(body)
    }
}

/// Percent-encode each `/`-separated segment, keeping the separators.
fn encode_segments(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn decode_content(body: ContentResponse) -> Result<String, SourceError> {
    match (body.encoding.as_deref(), body.content) {
        (Some("base64"), Some(content)) => {
            let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(compact)
                .map_err(|e| SourceError::Decode(e.to_string()))?;
            String::from_utf8(bytes).map_err(|e| SourceError::Decode(e.to_string()))
        }
        (encoding, _) => Err(SourceError::Decode(format!(
            "unsupported content encoding: {}",
            encoding.unwrap_or("none")
        ))),
    }
}

// ── Source ─────────────────────────────────────────────────────────

/// Progress through one keyword's result pages.
struct KeywordCursor {
    keyword: String,
    matcher: Regex,
    query: String,
    next_page: u32,
    pending: VecDeque<SearchItem>,
    exhausted: bool,
}

/// Lazy snippet stream over GitHub code search.
pub struct GitHubSearchSource {
    client: GitHubClient,
    qualifiers: String,
    branch: Option<String>,
    keywords: VecDeque<(String, Regex)>,
    policy: ContextPolicy,
    keyword_delay: Duration,
    rate_limit_backoff: Duration,
    page_size: u32,
    keywords_started: usize,
    cursor: Option<KeywordCursor>,
}

impl GitHubSearchSource {
    /// Build a source from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Config`] when the token is missing, when both
    /// or neither of `org`/`user` are set, or when no keywords are
    /// configured; [`SourceError::Pattern`] if a keyword cannot be compiled.
    pub fn new(github: &GithubConfig, scan: &ScanConfig) -> Result<Self, SourceError> {
        if github.token.trim().is_empty() {
            return Err(dml_config::ConfigError::Missing {
                field: "github.token".into(),
            }
            .into());
        }
        let scope = github.scope()?;
        if scan.keywords.is_empty() {
            return Err(dml_config::ConfigError::Missing {
                field: "scan.keywords".into(),
            }
            .into());
        }

        let mut qualifiers = scope.qualifier();
        if let Some(branch) = github.branch() {
            qualifiers.push_str(" branch:");
            qualifiers.push_str(branch);
        }
        for extension in github.file_extensions.iter().map(|e| e.trim()) {
            if !extension.is_empty() {
                qualifiers.push_str(" extension:");
                qualifiers.push_str(extension.trim_start_matches('.'));
            }
        }

        let keywords = scan
            .keywords
            .iter()
            .map(|k| Ok((k.clone(), keyword_matcher(k)?)))
            .collect::<Result<VecDeque<_>, regex::Error>>()?;

        Ok(Self {
            client: GitHubClient::new(&github.api_url, &github.token),
            qualifiers,
            branch: github.branch().map(String::from),
            keywords,
            policy: ContextPolicy::from_config(scan),
            keyword_delay: scan.keyword_delay(),
            rate_limit_backoff: scan.rate_limit_backoff(),
            page_size: DEFAULT_PAGE_SIZE,
            keywords_started: 0,
            cursor: None,
        })
    }

    /// Override the number of results requested per page.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, DEFAULT_PAGE_SIZE);
        self
    }

    /// The query issued for `keyword`.
    #[must_use]
    pub fn query_for(&self, keyword: &str) -> String {
        format!("{keyword} {}", self.qualifiers)
    }

    async fn begin_keyword(&mut self, keyword: String, matcher: Regex) {
        if self.keywords_started > 0 && !self.keyword_delay.is_zero() {
            tokio::time::sleep(self.keyword_delay).await;
        }
        self.keywords_started += 1;

        let query = self.query_for(&keyword);
        info!(%keyword, %query, "executing code search");
        self.cursor = Some(KeywordCursor {
            keyword,
            matcher,
            query,
            next_page: 1,
            pending: VecDeque::new(),
            exhausted: false,
        });
    }

    async fn fetch_page(&mut self) {
        let Some(cursor) = self.cursor.as_mut() else {
            return;
        };
        let page = cursor.next_page;

        match self
            .client
            .search_code(&cursor.query, page, self.page_size)
            .await
        {
            Ok(results) => {
                let fetched = u32::try_from(results.items.len()).unwrap_or(u32::MAX);
                let seen = page.saturating_mul(self.page_size);
                cursor.exhausted = fetched < self.page_size
                    || seen >= results.total_count
                    || seen >= MAX_SEARCH_RESULTS;
                cursor.next_page += 1;
                cursor.pending.extend(results.items);
            }
            Err(SourceError::RateLimited { retry_after_secs }) => {
                warn!(
                    keyword = %cursor.keyword,
                    page,
                    retry_after_secs,
                    backoff_ms = self.rate_limit_backoff.as_millis(),
                    "search rate limit hit; moving on to the next keyword after a delay"
                );
                cursor.exhausted = true;
                tokio::time::sleep(self.rate_limit_backoff).await;
            }
            Err(err) => {
                error!(keyword = %cursor.keyword, page, error = %err, "code search failed");
                cursor.exhausted = true;
            }
        }
    }

    async fn snippet_for(&self, item: SearchItem, matcher: &Regex) -> Option<CodeSnippet> {
        let content = match self
            .client
            .file_content(&item.repository.full_name, &item.path, self.branch.as_deref())
            .await
        {
            Ok(content) => content,
            Err(err) => {
                warn!(
                    repo = %item.repository.full_name,
                    path = %item.path,
                    error = %err,
                    "failed to fetch file content; skipping"
                );
                return None;
            }
        };

        let lines: Vec<&str> = content.lines().collect();
        let index = locate_match(
            &lines,
            item.text_matches.iter().map(|m| m.fragment.as_str()),
            matcher,
        );
        let code = self.policy.extract(&content, index.unwrap_or(0));

        Some(CodeSnippet {
            repo_name: item.repository.name,
            file_path: item.path,
            line: line_number(index.unwrap_or(0)),
            code,
        })
    }
}

#[async_trait]
impl SnippetSource for GitHubSearchSource {
    async fn next_snippet(&mut self) -> Option<CodeSnippet> {
        loop {
            if self.cursor.is_none() {
                let (keyword, matcher) = self.keywords.pop_front()?;
                self.begin_keyword(keyword, matcher).await;
            }
            let Some(cursor) = self.cursor.as_mut() else {
                continue;
            };

            if let Some(item) = cursor.pending.pop_front() {
                let matcher = cursor.matcher.clone();
                if let Some(snippet) = self.snippet_for(item, &matcher).await {
                    return Some(snippet);
                }
                continue;
            }

            if cursor.exhausted {
                self.cursor = None;
                continue;
            }
            self.fetch_page().await;
        }
    }
}
