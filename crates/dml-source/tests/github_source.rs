//! GitHub search source against a mocked REST API.

use std::time::{Duration, Instant};

use base64::Engine as _;
use mockito::{Matcher, Mock, ServerGuard};
use pretty_assertions::assert_eq;
use serde_json::json;

use dml_config::{ContextMode, GithubConfig, ScanConfig};
use dml_core::SnippetSource;
use dml_source::GitHubSearchSource;

const USERS_PY: &str = "import db\n\ndef deactivate(uid):\n    db.run(\"UPDATE users SET active=0 WHERE id=?\", uid)\n    return True\n";

fn github(server: &ServerGuard) -> GithubConfig {
    GithubConfig {
        token: "ghp_test".into(),
        org: "acme".into(),
        api_url: server.url(),
        ..Default::default()
    }
}

fn scan(keywords: &[&str]) -> ScanConfig {
    ScanConfig {
        keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
        keyword_delay_ms: 50,
        rate_limit_backoff_ms: 150,
        ..Default::default()
    }
}

fn item(repo: &str, path: &str, fragment: Option<&str>) -> serde_json::Value {
    let mut value = json!({
        "name": path.rsplit('/').next().unwrap_or(path),
        "path": path,
        "repository": { "name": repo, "full_name": format!("acme/{repo}") },
    });
    if let Some(fragment) = fragment {
        value["text_matches"] = json!([{ "fragment": fragment }]);
    }
    value
}

fn content_body(text: &str) -> String {
    json!({
        "encoding": "base64",
        "content": base64::engine::general_purpose::STANDARD.encode(text),
    })
    .to_string()
}

async fn search_mock(
    server: &mut ServerGuard,
    query: &str,
    page: u32,
    total: u32,
    items: Vec<serde_json::Value>,
) -> Mock {
    server
        .mock("GET", "/search/code")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("q".into(), query.into()),
            Matcher::UrlEncoded("page".into(), page.to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "total_count": total, "items": items }).to_string())
        .expect(1)
        .create_async()
        .await
}

async fn content_mock(server: &mut ServerGuard, repo: &str, path: &str, text: &str) -> Mock {
    server
        .mock("GET", format!("/repos/acme/{repo}/contents/{path}").as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(content_body(text))
        .create_async()
        .await
}

async fn drain(source: &mut GitHubSearchSource) -> Vec<dml_core::CodeSnippet> {
    let mut snippets = Vec::new();
    while let Some(snippet) = source.next_snippet().await {
        snippets.push(snippet);
    }
    snippets
}

#[tokio::test]
async fn search_hit_becomes_windowed_snippet_and_failed_fetch_is_skipped() {
    let mut server = mockito::Server::new_async().await;
    let search = search_mock(
        &mut server,
        "UPDATE org:acme",
        1,
        2,
        vec![
            item(
                "svc-a",
                "db/users.py",
                Some("    db.run(\"UPDATE users SET active=0 WHERE id=?\", uid)"),
            ),
            item("svc-b", "gone.sql", None),
        ],
    )
    .await;
    let users = content_mock(&mut server, "svc-a", "db/users.py", USERS_PY).await;
    let gone = server
        .mock("GET", "/repos/acme/svc-b/contents/gone.sql")
        .with_status(404)
        .with_body(r#"{"message": "Not Found"}"#)
        .create_async()
        .await;

    let mut source = GitHubSearchSource::new(&github(&server), &scan(&["UPDATE"])).unwrap();
    let snippets = drain(&mut source).await;

    search.assert_async().await;
    users.assert_async().await;
    gone.assert_async().await;
    assert_eq!(snippets.len(), 1);
    let snippet = &snippets[0];
    assert_eq!(snippet.repo_name, "svc-a");
    assert_eq!(snippet.file_path, "db/users.py");
    assert_eq!(snippet.line, 4);
    assert_eq!(
        snippet.code,
        "\ndef deactivate(uid):\n    db.run(\"UPDATE users SET active=0 WHERE id=?\", uid)\n    return True"
    );
}

#[tokio::test]
async fn one_query_per_keyword_with_delay_between() {
    let mut server = mockito::Server::new_async().await;
    let mut mocks = Vec::new();
    for keyword in ["INSERT", "UPDATE", "DELETE", "MERGE"] {
        mocks.push(search_mock(&mut server, &format!("{keyword} org:acme"), 1, 0, vec![]).await);
    }

    let mut source = GitHubSearchSource::new(
        &github(&server),
        &scan(&["INSERT", "UPDATE", "DELETE", "MERGE"]),
    )
    .unwrap();
    let started = Instant::now();
    let snippets = drain(&mut source).await;

    assert!(snippets.is_empty());
    assert!(started.elapsed() >= Duration::from_millis(3 * 50));
    for mock in mocks {
        mock.assert_async().await;
    }
    assert!(source.next_snippet().await.is_none());
}

#[tokio::test]
async fn rate_limit_backs_off_and_moves_to_next_keyword() {
    let mut server = mockito::Server::new_async().await;
    let limited = server
        .mock("GET", "/search/code")
        .match_query(Matcher::UrlEncoded("q".into(), "INSERT org:acme".into()))
        .with_status(403)
        .with_header("x-ratelimit-remaining", "0")
        .with_body(r#"{"message": "API rate limit exceeded"}"#)
        .expect(1)
        .create_async()
        .await;
    let update = search_mock(
        &mut server,
        "UPDATE org:acme",
        1,
        1,
        vec![item("svc-a", "db/users.py", None)],
    )
    .await;
    let _users = content_mock(&mut server, "svc-a", "db/users.py", USERS_PY).await;

    let mut source =
        GitHubSearchSource::new(&github(&server), &scan(&["INSERT", "UPDATE"])).unwrap();
    let started = Instant::now();
    let snippets = drain(&mut source).await;

    assert!(started.elapsed() >= Duration::from_millis(150 + 50));
    limited.assert_async().await;
    update.assert_async().await;
    assert_eq!(snippets.len(), 1);
    // no fragment: first keyword line in the file
    assert_eq!(snippets[0].line, 4);
}

#[tokio::test]
async fn server_error_ends_only_that_keyword() {
    let mut server = mockito::Server::new_async().await;
    let broken = server
        .mock("GET", "/search/code")
        .match_query(Matcher::UrlEncoded("q".into(), "DELETE org:acme".into()))
        .with_status(500)
        .expect(1)
        .create_async()
        .await;
    let merge = search_mock(
        &mut server,
        "MERGE org:acme",
        1,
        1,
        vec![item("svc-c", "etl.sql", None)],
    )
    .await;
    let _etl = content_mock(&mut server, "svc-c", "etl.sql", "MERGE INTO t USING s ON t.id = s.id;\n").await;

    let mut source =
        GitHubSearchSource::new(&github(&server), &scan(&["DELETE", "MERGE"])).unwrap();
    let snippets = drain(&mut source).await;

    broken.assert_async().await;
    merge.assert_async().await;
    assert_eq!(snippets.len(), 1);
    assert_eq!(snippets[0].repo_name, "svc-c");
    assert_eq!(snippets[0].line, 1);
}

#[tokio::test]
async fn branch_is_a_qualifier_and_a_content_ref() {
    let mut server = mockito::Server::new_async().await;
    let search = search_mock(
        &mut server,
        "UPDATE org:acme branch:release",
        1,
        1,
        vec![item("svc-a", "db/users.py", None)],
    )
    .await;
    let content = server
        .mock("GET", "/repos/acme/svc-a/contents/db/users.py")
        .match_query(Matcher::UrlEncoded("ref".into(), "release".into()))
        .with_status(200)
        .with_body(content_body(USERS_PY))
        .expect(1)
        .create_async()
        .await;

    let config = GithubConfig {
        branch: "release".into(),
        ..github(&server)
    };
    let mut source = GitHubSearchSource::new(&config, &scan(&["UPDATE"])).unwrap();
    let snippets = drain(&mut source).await;

    search.assert_async().await;
    content.assert_async().await;
    assert_eq!(snippets.len(), 1);
}

#[tokio::test]
async fn whole_file_policy_carries_full_content() {
    let mut server = mockito::Server::new_async().await;
    let _search = search_mock(
        &mut server,
        "UPDATE org:acme",
        1,
        1,
        vec![item("svc-a", "db/users.py", None)],
    )
    .await;
    let _users = content_mock(&mut server, "svc-a", "db/users.py", USERS_PY).await;

    let scan = ScanConfig {
        context: ContextMode::File,
        ..scan(&["UPDATE"])
    };
    let mut source = GitHubSearchSource::new(&github(&server), &scan).unwrap();
    let snippets = drain(&mut source).await;

    assert_eq!(snippets.len(), 1);
    assert_eq!(snippets[0].code, USERS_PY);
    assert_eq!(snippets[0].line, 4);
}

#[tokio::test]
async fn pages_until_a_short_page() {
    let mut server = mockito::Server::new_async().await;
    let first = search_mock(
        &mut server,
        "INSERT org:acme",
        1,
        3,
        vec![item("svc-a", "a.sql", None), item("svc-a", "b.sql", None)],
    )
    .await;
    let second = search_mock(
        &mut server,
        "INSERT org:acme",
        2,
        3,
        vec![item("svc-b", "c.sql", None)],
    )
    .await;
    let mut contents = Vec::new();
    for (repo, path) in [("svc-a", "a.sql"), ("svc-a", "b.sql"), ("svc-b", "c.sql")] {
        contents.push(content_mock(&mut server, repo, path, "INSERT INTO audit VALUES (1);\n").await);
    }

    let mut source = GitHubSearchSource::new(&github(&server), &scan(&["INSERT"]))
        .unwrap()
        .with_page_size(2);
    let paths: Vec<String> = drain(&mut source)
        .await
        .into_iter()
        .map(|s| s.file_path)
        .collect();

    first.assert_async().await;
    second.assert_async().await;
    assert_eq!(paths, ["a.sql", "b.sql", "c.sql"]);
}
