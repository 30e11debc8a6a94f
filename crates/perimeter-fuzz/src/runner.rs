//! Counting fuzz runner
//!
//! Draws cases from a proptest strategy and records every pass and failure,
//! which `proptest!` does not expose. Used by the CLI for long runs.

use chrono::{DateTime, Utc};
use proptest::strategy::{Strategy, ValueTree};
use proptest::test_runner::{Config, RngAlgorithm, TestRng, TestRunner};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::time::{Duration, Instant};

/// Failures kept per target; the rest are only counted
const MAX_RECORDED_FAILURES: usize = 20;

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuzzConfig {
    /// Number of cases per target
    pub cases: u64,
    /// Random seed (0 = random)
    pub seed: u64,
}

impl Default for FuzzConfig {
    fn default() -> Self {
        Self {
            cases: 10_000,
            seed: 0,
        }
    }
}

impl FuzzConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cases(mut self, n: u64) -> Self {
        self.cases = n;
        self
    }

    pub fn seed(mut self, s: u64) -> Self {
        self.seed = s;
        self
    }

    fn test_runner(&self) -> TestRunner {
        if self.seed == 0 {
            return TestRunner::new(Config::default());
        }
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&self.seed.to_le_bytes());
        TestRunner::new_with_rng(Config::default(), TestRng::from_seed(RngAlgorithm::ChaCha, &bytes))
    }
}

// ============================================================================
// Results
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuzzFailure {
    pub message: String,
    pub input: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuzzResult {
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub cases_run: u64,
    pub cases_passed: u64,
    pub cases_failed: u64,
    pub duration_ms: u64,
    /// Cases per second
    pub throughput: f64,
    pub failures: Vec<FuzzFailure>,
    pub passed: bool,
}

impl FuzzResult {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            started_at: Utc::now(),
            cases_run: 0,
            cases_passed: 0,
            cases_failed: 0,
            duration_ms: 0,
            throughput: 0.0,
            failures: Vec::new(),
            passed: true,
        }
    }

    pub fn record_pass(&mut self) {
        self.cases_run += 1;
        self.cases_passed += 1;
    }

    pub fn record_fail(&mut self, failure: FuzzFailure) {
        self.cases_run += 1;
        self.cases_failed += 1;
        self.passed = false;
        if self.failures.len() < MAX_RECORDED_FAILURES {
            self.failures.push(failure);
        }
    }

    pub fn finalize(&mut self, duration: Duration) {
        self.duration_ms = duration.as_millis() as u64;
        let secs = duration.as_secs_f64();
        if secs > 0.0 {
            self.throughput = self.cases_run as f64 / secs;
        }
    }

    pub fn summary_line(&self) -> String {
        format!(
            "{:<32} {:>8} cases  {:>8} passed  {:>6} failed  {:>6} ms  {}",
            self.name,
            self.cases_run,
            self.cases_passed,
            self.cases_failed,
            self.duration_ms,
            if self.passed { "PASSED" } else { "FAILED" }
        )
    }
}

// ============================================================================
// Runner
// ============================================================================

pub struct FuzzRunner {
    config: FuzzConfig,
    results: Vec<FuzzResult>,
}

impl FuzzRunner {
    pub fn new(config: FuzzConfig) -> Self {
        Self {
            config,
            results: Vec::new(),
        }
    }

    /// Check `property` against `config.cases` values drawn from `strategy`
    pub fn run<S, F>(&mut self, name: &str, strategy: S, property: F) -> &FuzzResult
    where
        S: Strategy,
        S::Value: Debug,
        F: Fn(&S::Value) -> Result<(), String>,
    {
        let mut result = FuzzResult::new(name);
        let mut runner = self.config.test_runner();
        let start = Instant::now();

        for _ in 0..self.config.cases {
            let value = match strategy.new_tree(&mut runner) {
                Ok(tree) => tree.current(),
                Err(reason) => {
                    result.record_fail(FuzzFailure {
                        message: format!("generator rejected case: {}", reason.message()),
                        input: None,
                    });
                    continue;
                }
            };

            match property(&value) {
                Ok(()) => result.record_pass(),
                Err(message) => result.record_fail(FuzzFailure {
                    message,
                    input: Some(format!("{:?}", value)),
                }),
            }
        }

        result.finalize(start.elapsed());
        tracing::debug!("{}", result.summary_line());
        self.results.push(result);
        &self.results[self.results.len() - 1]
    }

    pub fn results(&self) -> &[FuzzResult] {
        &self.results
    }

    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    pub fn export_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.results)
    }
}
