//! Tester tool — checks declarative test cases against expected values.
//!
//! Each case pairs an `input` value with an `expected` value; the tool
//! compares them with deep structural equality (arrays element-wise,
//! objects key-wise, scalars by value and type) and reports per-case
//! results plus a summary.

use async_trait::async_trait;
use confidant_core::tool::{Tool, ToolResult, validate_params};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// One test case supplied to the tool.
#[derive(Debug, Clone, Deserialize)]
pub struct TestCase {
    pub description: String,
    pub input: Value,
    pub expected: Value,
}

/// The outcome of one test case.
#[derive(Debug, Clone, Serialize)]
pub struct CaseResult {
    pub passed: bool,
    pub description: String,
    pub expected: Value,
    pub actual: Value,
}

pub struct TesterTool;

#[async_trait]
impl Tool for TesterTool {
    fn name(&self) -> &str {
        "tester"
    }

    fn description(&self) -> &str {
        "Run declarative test cases and validate expected values"
    }

    async fn execute(&self, params: Value) -> ToolResult {
        if let Err(e) = validate_params(&params, &["cases"]) {
            return ToolResult::fail(self.name(), e.to_string());
        }

        let cases: Vec<TestCase> = match serde_json::from_value(params["cases"].clone()) {
            Ok(cases) => cases,
            Err(e) => {
                return ToolResult::fail(self.name(), format!("Invalid test cases: {e}"));
            }
        };

        let results: Vec<CaseResult> = cases
            .into_iter()
            .map(|case| CaseResult {
                passed: deep_equal(&case.input, &case.expected),
                description: case.description,
                actual: case.input,
                expected: case.expected,
            })
            .collect();

        let total = results.len();
        let passed = results.iter().filter(|r| r.passed).count();
        let failed = total - passed;
        let success_rate = if total == 0 {
            100.0
        } else {
            passed as f64 / total as f64 * 100.0
        };

        let data = json!({
            "results": results,
            "summary": {
                "total": total,
                "passed": passed,
                "failed": failed,
                "successRate": success_rate,
            }
        });

        if failed > 0 {
            let mut result = ToolResult::fail(self.name(), format!("{failed} test(s) failed"));
            result.data = Some(data);
            result
        } else {
            ToolResult::ok(self.name(), data)
        }
    }
}

/// Deep structural equality over JSON values. A type mismatch fails;
/// arrays compare element-wise, objects key-wise.
fn deep_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Array(a), Value::Array(e)) => {
            a.len() == e.len() && a.iter().zip(e).all(|(x, y)| deep_equal(x, y))
        }
        (Value::Object(a), Value::Object(e)) => {
            a.len() == e.len()
                && a.iter()
                    .all(|(k, v)| e.get(k).is_some_and(|ev| deep_equal(v, ev)))
        }
        (a, e) => a == e,
    }
}
