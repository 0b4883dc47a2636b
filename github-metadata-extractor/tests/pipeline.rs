use std::path::{Path, PathBuf};
use std::sync::Arc;

use github_metadata_extractor::{
    load_settings, ClientError, CredentialSource, Pipeline, PipelineConfig, PipelineError,
    QualityMetrics, RepositoryMetadata, Settings, SinkKind, SinkOutcome, StaticSecretStore,
    StepError,
};
use mockito::{Matcher, Mock, ServerGuard};
use serde_json::Value;
use tempfile::TempDir;

fn fixtures_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn fixture(path: &str) -> String {
    std::fs::read_to_string(fixtures_root().join(path)).unwrap()
}

fn settings_for(server: &ServerGuard, output: &Path) -> Settings {
    let mut settings = load_settings(&fixtures_root().join("settings/fast.toml")).unwrap();
    settings.github.api_base_url = server.url();
    settings.output.dir = output.to_path_buf();
    settings
}

async fn mock_page(server: &mut ServerGuard, page: u32, body: String) -> Mock {
    server
        .mock("GET", "/users/octocat/repos")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("page".into(), page.to_string()),
            Matcher::UrlEncoded("per_page".into(), "100".into()),
        ]))
        .match_header("authorization", "token ghp_fixture")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .expect(1)
        .create_async()
        .await
}

async fn mock_octocat(server: &mut ServerGuard) -> Vec<Mock> {
    let user = server
        .mock("GET", "/users/octocat")
        .match_header("authorization", "token ghp_fixture")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(fixture("github/user.json"))
        .expect(2)
        .create_async()
        .await;
    vec![
        user,
        mock_page(server, 1, fixture("github/repos_page1.json")).await,
        mock_page(server, 2, fixture("github/repos_page2.json")).await,
        mock_page(server, 3, "[]".to_string()).await,
    ]
}

fn pipeline(config: PipelineConfig, settings: &Settings) -> Pipeline {
    let secrets = StaticSecretStore::new().with_token("github-guid", "ghp_fixture");
    Pipeline::from_settings(
        config,
        CredentialSource::Reference("github-guid".to_string()),
        settings,
        Arc::new(secrets),
    )
    .unwrap()
}

#[tokio::test]
async fn extracts_octocat_into_files() {
    let mut server = mockito::Server::new_async().await;
    let mocks = mock_octocat(&mut server).await;
    let output = TempDir::new().unwrap();
    let settings = settings_for(&server, output.path());

    let config = PipelineConfig::from_settings("octocat", &settings).with_sink(SinkKind::Files);
    let report = pipeline(config, &settings).run().await.unwrap();

    for mock in mocks {
        mock.assert_async().await;
    }

    assert_eq!(report.workflow_id, "github_extraction_octocat");
    assert_eq!(report.account.name, "The Octocat");
    assert_eq!(report.account.bio, "No bio provided.");
    assert_eq!(report.account.email, "N/A");

    let names: Vec<_> = report.repositories.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["Spoon-Knife", "hello-worId", "linguist"]);
    assert_eq!(report.repositories[1].auto_tags, Some(Vec::new()));
    assert!(report.repositories[0]
        .auto_tags
        .as_ref()
        .is_some_and(|tags| !tags.is_empty() && tags.len() <= 5));

    let user_file = output.path().join("octocat_user_metadata.json");
    let content = std::fs::read_to_string(&user_file).unwrap();
    assert!(content.contains("\n    \"name\": \"The Octocat\""));
    let user: Value = serde_json::from_str(&content).unwrap();
    assert_eq!(user["type"], "User");
    assert_eq!(user["followers"], 100);

    let raw: Vec<RepositoryMetadata> = serde_json::from_str(
        &std::fs::read_to_string(output.path().join("octocat_repo_metadata.json")).unwrap(),
    )
    .unwrap();
    assert!(raw.iter().all(|r| r.auto_tags.is_none()));

    let metrics: QualityMetrics = serde_json::from_str(
        &std::fs::read_to_string(output.path().join("octocat_quality_metrics.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(metrics.total_public_repos, 3);
    assert_eq!(metrics.total_followers, 100);
    assert_eq!(metrics.total_public_gists, 8);
    assert_eq!(metrics.average_stars_per_repo, 6.0);
    assert_eq!(metrics.repos_with_description_percentage, 200.0 / 3.0);
    assert_eq!(metrics.repos_with_auto_tags_percentage, 200.0 / 3.0);
    assert_eq!(Some(metrics), report.metrics);

    assert_eq!(
        report.sink,
        SinkOutcome::Files {
            paths: vec![
                user_file,
                output.path().join("octocat_repo_metadata.json"),
            ]
        }
    );
    assert_eq!(report.files.len(), 4);
}

#[tokio::test]
async fn unknown_account_fails_after_retries_without_output() {
    let mut server = mockito::Server::new_async().await;
    let user = server
        .mock("GET", "/users/ghost-account")
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message": "Not Found"}"#)
        .expect(2)
        .create_async()
        .await;
    let repos = server
        .mock("GET", Matcher::Regex("/repos".to_string()))
        .expect(0)
        .create_async()
        .await;
    let output = TempDir::new().unwrap();
    let settings = settings_for(&server, output.path());

    let config =
        PipelineConfig::from_settings("ghost-account", &settings).with_sink(SinkKind::Files);
    let error = pipeline(config, &settings).run().await.unwrap_err();

    user.assert_async().await;
    repos.assert_async().await;
    assert_eq!(error.failed_step(), Some("preflight_check"));
    let PipelineError::Step(step_error @ StepError::RetriesExhausted { attempts: 2, .. }) = &error
    else {
        panic!("unexpected error: {error:?}");
    };
    let source = step_error.downcast_source::<ClientError>().unwrap();
    assert_eq!(source.status(), Some(404));
    assert_eq!(std::fs::read_dir(output.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn missing_credential_fails_before_any_request() {
    let mut server = mockito::Server::new_async().await;
    let any = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;
    let output = TempDir::new().unwrap();
    let settings = settings_for(&server, output.path());

    let config = PipelineConfig::from_settings("octocat", &settings);
    let error = Pipeline::from_settings(
        config,
        CredentialSource::Reference("absent".to_string()),
        &settings,
        Arc::new(StaticSecretStore::new()),
    )
    .unwrap()
    .run()
    .await
    .unwrap_err();

    any.assert_async().await;
    assert!(matches!(
        error,
        PipelineError::Step(StepError::NonRetryable { .. })
    ));
}

#[tokio::test]
async fn catalog_sink_requires_catalog_url() {
    let settings = Settings::default();
    let config = PipelineConfig::from_settings("octocat", &settings).with_sink(SinkKind::Catalog);

    let result = Pipeline::from_settings(
        config,
        CredentialSource::None,
        &settings,
        Arc::new(StaticSecretStore::new()),
    );

    assert!(matches!(result, Err(PipelineError::Configuration(_))));
}

#[tokio::test]
async fn uploads_octocat_to_catalog() {
    let mut server = mockito::Server::new_async().await;
    let _github = mock_octocat(&mut server).await;
    let catalog = server
        .mock("POST", "/api/meta/entity/bulk")
        .match_query(Matcher::UrlEncoded("replaceTags".into(), "true".into()))
        .match_header("authorization", "Bearer catalog-secret")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "entities": [
                {"typeName": "Connection", "name": "Octo GitHub", "qualifiedName": "default/github/octo"},
                {"typeName": "AccountFolder", "qualifiedName": "default/github/octo/The Octocat"},
                {"typeName": "RepositoryFolder", "qualifiedName": "default/github/octo/The Octocat/Spoon-Knife"},
                {"typeName": "RepositoryFolder", "name": "hello-worId"},
                {"typeName": "RepositoryFolder", "name": "linguist"}
            ]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"mutatedEntities": {"CREATE": [{}, {}, {}, {}, {}]}}"#)
        .expect(1)
        .create_async()
        .await;

    let output = TempDir::new().unwrap();
    let mut settings = settings_for(&server, output.path());
    settings.catalog.base_url = Some(server.url());
    settings.catalog.api_key_reference = Some("catalog-guid".to_string());

    let secrets = StaticSecretStore::new()
        .with_token("github-guid", "ghp_fixture")
        .with_token("catalog-guid", "catalog-secret");
    let config = PipelineConfig::from_settings("octocat", &settings)
        .with_sink(SinkKind::Catalog)
        .with_analysis(false);
    let report = Pipeline::from_settings(
        config,
        CredentialSource::Reference("github-guid".to_string()),
        &settings,
        Arc::new(secrets),
    )
    .unwrap()
    .run()
    .await
    .unwrap();

    catalog.assert_async().await;
    assert_eq!(
        report.sink,
        SinkOutcome::Catalog {
            assets: 5,
            created: 5
        }
    );
    assert!(report.metrics.is_none());
    assert_eq!(std::fs::read_dir(output.path()).unwrap().count(), 0);
}
