//! End-to-end scenarios for the load → resolve → compile → execute pipeline.
//!
//! Fixtures are written to a temp dir and loaded through the real
//! filesystem loader.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tempfile::tempdir;

use pal::domain::entities::Artifact;
use pal::domain::ports::{ArtifactLoader, ModelError};
use pal::domain::value_objects::Locator;
use pal::infrastructure::MockClient;
use pal::{compile, resolve, ExecuteOptions, FsLoader, PalError, PromptExecutor, PromptPipeline};

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

fn vars(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

/// Wraps the filesystem loader and counts every load.
#[derive(Default)]
struct CountingLoader {
    inner: FsLoader,
    loads: AtomicUsize,
}

#[async_trait]
impl ArtifactLoader for CountingLoader {
    async fn load(&self, locator: &Locator) -> pal::PalResult<Artifact> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.inner.load(locator).await
    }

    fn load_blocking(&self, locator: &Locator) -> pal::PalResult<Artifact> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.inner.load_blocking(locator)
    }
}

const HELLO: &str = r#"
pal_version: "1.0"
id: hello
version: 1.0.0
description: Hello world
variables:
  - name: name
    type: string
composition:
  - "Hello {{ name }}"
"#;

#[tokio::test]
async fn hello_world_compiles() {
    let dir = tempdir().unwrap();
    let path = write(dir.path(), "hello.pal", HELLO);

    let loader = FsLoader::new();
    let assembly = loader.load_assembly_async(&path).await.unwrap();
    let symbols = resolve(&assembly, &loader).await.unwrap();
    let text = compile(&assembly, &vars(json!({"name": "World"})), &symbols).unwrap();

    assert_eq!(text, "Hello World");
}

#[tokio::test]
async fn missing_required_variable_fails_compile() {
    let dir = tempdir().unwrap();
    let path = write(dir.path(), "hello.pal", HELLO);

    let pipeline = PromptPipeline::default();
    let err = pipeline.compile_file(&path, &Map::new()).await.unwrap_err();

    match err {
        PalError::MissingVariable { prompt_id, name } => {
            assert_eq!(prompt_id, "hello");
            assert_eq!(name, "name");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn library_components_compose_in_order() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "libs/rules.pal.lib",
        r#"
library_id: house-rules
version: 1.0.0
description: House rules
type: rules
components:
  - name: concise
    content: "- Be concise"
  - name: cite
    content: "- Cite {{ source }}"
"#,
    );
    let path = write(
        dir.path(),
        "prompts/main.pal",
        r#"
id: main
version: 1.0.0
description: Main prompt
variables:
  - name: source
    type: string
    required: false
    default: docs
imports:
  rules: ../libs/rules.pal.lib
composition:
  - "Rules:"
  - library: rules
  - component: rules.cite
    vars:
      source: the manual
"#,
    );

    let (_, report) = PromptPipeline::default()
        .compile_file(&path, &Map::new())
        .await
        .unwrap();

    assert_eq!(
        report.text,
        "Rules:\n\n- Be concise\n- Cite docs\n\n- Cite the manual"
    );
}

#[tokio::test]
async fn import_cycle_reports_ids() {
    let dir = tempdir().unwrap();
    let a = write(
        dir.path(),
        "a.pal",
        "id: a\nversion: 1.0.0\ndescription: A\nimports:\n  b: ./b.pal\ncomposition:\n  - A\n",
    );
    write(
        dir.path(),
        "b.pal",
        "id: b\nversion: 1.0.0\ndescription: B\nimports:\n  c: ./c.pal\ncomposition:\n  - B\n",
    );
    write(
        dir.path(),
        "c.pal",
        "id: c\nversion: 1.0.0\ndescription: C\nimports:\n  b: ./b.pal\ncomposition:\n  - C\n",
    );

    let loader = FsLoader::new();
    let assembly = loader.load_assembly(&a).unwrap();
    let err = resolve(&assembly, &loader).await.unwrap_err();

    match err {
        PalError::CircularDependency { cycle } => assert_eq!(cycle, vec!["b", "c", "b"]),
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn diamond_imports_load_each_artifact_once() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "shared.pal.lib",
        "library_id: shared\nversion: 1.0.0\ndescription: Shared\ntype: note\ncomponents:\n  - name: n\n    content: shared\n",
    );
    write(
        dir.path(),
        "left.pal",
        "id: left\nversion: 1.0.0\ndescription: L\nimports:\n  s: ./shared.pal.lib\ncomposition:\n  - L\n",
    );
    write(
        dir.path(),
        "right.pal",
        "id: right\nversion: 1.0.0\ndescription: R\nimports:\n  s: ./shared.pal.lib\ncomposition:\n  - R\n",
    );
    let root = write(
        dir.path(),
        "root.pal",
        r#"
id: root
version: 1.0.0
description: Root
imports:
  l: ./left.pal
  r: ./right.pal
  s: ./shared.pal.lib
composition:
  - component: s.n
"#,
    );

    let loader = CountingLoader::default();
    let assembly = loader.inner.load_assembly(&root).unwrap();
    let symbols = resolve(&assembly, &loader).await.unwrap();

    assert_eq!(loader.loads.load(Ordering::SeqCst), 3);
    assert_eq!(symbols.len(), 3);
    assert_eq!(
        compile(&assembly, &Map::new(), &symbols).unwrap(),
        "shared"
    );
}

#[tokio::test]
async fn failed_execution_is_recorded_once() {
    let dir = tempdir().unwrap();
    let path = write(dir.path(), "hello.pal", HELLO);

    let (resolved, report) = PromptPipeline::default()
        .compile_file(&path, &vars(json!({"name": "World"})))
        .await
        .unwrap();

    let client = Arc::new(MockClient::failing(ModelError::Other("boom".into())));
    let executor = PromptExecutor::new(client);
    let err = executor
        .execute(&report.text, &resolved.assembly, &ExecuteOptions::new("test-model"))
        .await
        .unwrap_err();

    assert!(err.is_executor_error());
    assert!(err.to_string().contains("hello"));

    let history = executor.get_execution_history();
    assert_eq!(history.len(), 1);
    assert!(!history[0].success);
    assert_eq!(history[0].compiled_prompt, "Hello World");
    assert!(history[0].error.as_deref().is_some_and(|e| e.contains("boom")));
}

#[tokio::test]
async fn successful_execution_uses_mock_response() {
    let dir = tempdir().unwrap();
    let path = write(dir.path(), "hello.pal", HELLO);

    let (resolved, report) = PromptPipeline::default()
        .compile_file(&path, &vars(json!({"name": "World"})))
        .await
        .unwrap();

    let client = Arc::new(MockClient::new("Hi there"));
    let executor = PromptExecutor::new(client.clone());
    let result = executor
        .execute(&report.text, &resolved.assembly, &ExecuteOptions::new("gpt-4"))
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.response, "Hi there");
    assert_eq!(result.prompt_id, "hello");
    assert_eq!(client.last_prompt().as_deref(), Some("Hello World"));
    assert!(result.cost_usd.is_some_and(|c| c > 0.0));
}
