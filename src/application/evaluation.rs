//! Evaluation Use Case
//!
//! Drives one assembly through every case of an evaluation suite: compile
//! with the case's variables, execute, then check the response against
//! the case's assertions.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::application::executor::{ExecuteOptions, PromptExecutor};
use crate::application::pipeline::{PromptPipeline, ResolvedAssembly};
use crate::domain::entities::{
    Assertion, AssertionResult, EvaluationResult, EvaluationSuite, TestCase, TestResult,
};
use crate::error::{PalError, PalResult};

/// Read an evaluation suite file.
pub fn load_suite(path: &Path) -> PalResult<EvaluationSuite> {
    let content = std::fs::read_to_string(path).map_err(|e| PalError::Load {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    serde_yaml_ng::from_str(&content).map_err(|e| PalError::Load {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Check one assertion against a model response.
pub fn check_assertion(assertion: &Assertion, response: &str) -> AssertionResult {
    let (passed, message) = match assertion {
        Assertion::Contains {
            text,
            case_sensitive,
        } => {
            let found = contains(response, text, case_sensitive.unwrap_or(true));
            (found, format!("expected response to contain '{text}'"))
        }
        Assertion::NotContains {
            text,
            case_sensitive,
        } => {
            let found = contains(response, text, case_sensitive.unwrap_or(true));
            (!found, format!("expected response not to contain '{text}'"))
        }
        Assertion::Equals { text } => (
            response.trim() == text.trim(),
            format!("expected response to equal '{text}'"),
        ),
        Assertion::Regex { pattern } => match Regex::new(pattern) {
            Ok(re) => (
                re.is_match(response),
                format!("expected response to match /{pattern}/"),
            ),
            Err(e) => (false, format!("invalid regex /{pattern}/: {e}")),
        },
        Assertion::Length { min, max } => {
            let len = response.chars().count();
            let ok = min.map_or(true, |m| len >= m) && max.map_or(true, |m| len <= m);
            let bounds = match (min, max) {
                (Some(lo), Some(hi)) => format!("between {lo} and {hi}"),
                (Some(lo), None) => format!("at least {lo}"),
                (None, Some(hi)) => format!("at most {hi}"),
                (None, None) => "any".to_string(),
            };
            (ok, format!("expected length {bounds}, got {len}"))
        }
        Assertion::JsonValid => match serde_json::from_str::<Value>(response) {
            Ok(_) => (true, "response is valid JSON".to_string()),
            Err(e) => (false, format!("response is not valid JSON: {e}")),
        },
    };

    AssertionResult {
        assertion: assertion.name().to_string(),
        passed,
        message,
    }
}

fn contains(haystack: &str, needle: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        haystack.contains(needle)
    } else {
        haystack.to_lowercase().contains(&needle.to_lowercase())
    }
}

pub struct EvaluationRunner {
    pipeline: PromptPipeline,
    executor: PromptExecutor,
}

impl EvaluationRunner {
    pub fn new(pipeline: PromptPipeline, executor: PromptExecutor) -> Self {
        Self { pipeline, executor }
    }

    pub fn executor(&self) -> &PromptExecutor {
        &self.executor
    }

    /// Run the suite at `suite_path`.
    ///
    /// `pal_file` overrides the suite's own `pal_file`, which is resolved
    /// against the suite's directory.
    pub async fn run(
        &self,
        suite_path: &Path,
        pal_file: Option<&Path>,
        options: &ExecuteOptions,
    ) -> PalResult<EvaluationResult> {
        let suite = load_suite(suite_path)?;
        let pal_path = target_assembly(suite_path, &suite, pal_file)?;
        let resolved = self.pipeline.prepare(&pal_path).await?;
        self.run_suite(&suite, &resolved, options).await
    }

    pub async fn run_suite(
        &self,
        suite: &EvaluationSuite,
        resolved: &ResolvedAssembly,
        options: &ExecuteOptions,
    ) -> PalResult<EvaluationResult> {
        let mut test_results = Vec::with_capacity(suite.test_cases.len());
        for case in &suite.test_cases {
            let result = self.run_case(case, resolved, options).await;
            debug!(case = %case.name, passed = result.passed, "Evaluated test case");
            test_results.push(result);
        }

        let result = EvaluationResult {
            prompt_id: resolved.assembly.id.clone(),
            prompt_version: resolved.assembly.version.clone(),
            model: options.model.clone(),
            test_results,
        };
        info!(
            prompt = %result.prompt_id,
            passed = result.passed_tests(),
            total = result.total_tests(),
            "Evaluation finished"
        );
        Ok(result)
    }

    async fn run_case(
        &self,
        case: &TestCase,
        resolved: &ResolvedAssembly,
        options: &ExecuteOptions,
    ) -> TestResult {
        let variables: Map<String, Value> = case
            .variables
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let failed = |error: PalError| TestResult {
            name: case.name.clone(),
            passed: false,
            assertions: Vec::new(),
            execution: None,
            error: Some(error.to_string()),
        };

        let report = match resolved.compile(&variables) {
            Ok(report) => report,
            Err(e) => return failed(e),
        };
        let execution = match self
            .executor
            .execute(&report.text, &resolved.assembly, options)
            .await
        {
            Ok(execution) => execution,
            Err(e) => return failed(e),
        };

        let assertions: Vec<AssertionResult> = case
            .assertions
            .iter()
            .map(|a| check_assertion(a, &execution.response))
            .collect();

        TestResult {
            name: case.name.clone(),
            passed: assertions.iter().all(|a| a.passed),
            assertions,
            execution: Some(execution),
            error: None,
        }
    }
}

fn target_assembly(
    suite_path: &Path,
    suite: &EvaluationSuite,
    pal_file: Option<&Path>,
) -> PalResult<PathBuf> {
    if let Some(path) = pal_file {
        return Ok(path.to_path_buf());
    }
    let declared = suite.pal_file.as_ref().ok_or_else(|| PalError::Load {
        path: suite_path.to_path_buf(),
        message: "no pal_file in suite and none given".to_string(),
    })?;
    if declared.is_absolute() {
        return Ok(declared.clone());
    }
    let base = suite_path.parent().unwrap_or_else(|| Path::new(""));
    Ok(base.join(declared))
}

/// Renders evaluation results for people and for machines.
#[derive(Debug, Default, Clone, Copy)]
pub struct EvaluationReporter;

impl EvaluationReporter {
    pub fn console_report(&self, result: &EvaluationResult) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Evaluation: {}@{} on {}",
            result.prompt_id, result.prompt_version, result.model
        );
        let _ = writeln!(
            out,
            "Passed {}/{} ({:.1}%)",
            result.passed_tests(),
            result.total_tests(),
            result.pass_rate() * 100.0
        );
        out.push('\n');

        for test in &result.test_results {
            let mark = if test.passed { "PASS" } else { "FAIL" };
            let _ = writeln!(out, "[{mark}] {}", test.name);
            if let Some(error) = &test.error {
                let _ = writeln!(out, "    error: {error}");
            }
            for assertion in test.assertions.iter().filter(|a| !a.passed) {
                let _ = writeln!(out, "    {}: {}", assertion.assertion, assertion.message);
            }
        }
        out
    }

    pub fn json_report(&self, result: &EvaluationResult) -> Value {
        json!({
            "prompt_id": result.prompt_id,
            "prompt_version": result.prompt_version,
            "model": result.model,
            "summary": {
                "total_tests": result.total_tests(),
                "passed_tests": result.passed_tests(),
                "failed_tests": result.failed_tests(),
                "pass_rate": result.pass_rate(),
            },
            "test_results": result.test_results,
        })
    }
}
