//! Evaluation suite entities
//!
//! A suite drives one assembly through a batch of test cases and checks each
//! model response against simple assertions.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::entities::ExecutionResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Assertion {
    Contains {
        text: String,
        #[serde(default)]
        case_sensitive: Option<bool>,
    },
    NotContains {
        text: String,
        #[serde(default)]
        case_sensitive: Option<bool>,
    },
    Equals {
        text: String,
    },
    Regex {
        pattern: String,
    },
    Length {
        #[serde(default)]
        min: Option<usize>,
        #[serde(default)]
        max: Option<usize>,
    },
    JsonValid,
}

impl Assertion {
    pub fn name(&self) -> &'static str {
        match self {
            Assertion::Contains { .. } => "contains",
            Assertion::NotContains { .. } => "not_contains",
            Assertion::Equals { .. } => "equals",
            Assertion::Regex { .. } => "regex",
            Assertion::Length { .. } => "length",
            Assertion::JsonValid => "json_valid",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub variables: IndexMap<String, Value>,
    #[serde(default)]
    pub assertions: Vec<Assertion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSuite {
    #[serde(default)]
    pub pal_file: Option<PathBuf>,
    #[serde(default)]
    pub description: String,
    pub test_cases: Vec<TestCase>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssertionResult {
    pub assertion: String,
    pub passed: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub assertions: Vec<AssertionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution: Option<ExecutionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    pub prompt_id: String,
    pub prompt_version: String,
    pub model: String,
    pub test_results: Vec<TestResult>,
}

impl EvaluationResult {
    pub fn total_tests(&self) -> usize {
        self.test_results.len()
    }

    pub fn passed_tests(&self) -> usize {
        self.test_results.iter().filter(|t| t.passed).count()
    }

    pub fn failed_tests(&self) -> usize {
        self.total_tests() - self.passed_tests()
    }

    /// Fraction of passing cases; an empty suite counts as fully passing.
    pub fn pass_rate(&self) -> f64 {
        if self.test_results.is_empty() {
            1.0
        } else {
            self.passed_tests() as f64 / self.total_tests() as f64
        }
    }
}
