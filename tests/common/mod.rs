#![allow(dead_code)]

use std::error::Error;

use jobrun::exec::ExecutionOptions;

pub use jobrun_test_utils::{init_tracing, with_timeout};

pub type TestResult = Result<(), Box<dyn Error>>;

/// Options for tests: output is captured but never echoed.
pub fn quiet() -> ExecutionOptions {
    ExecutionOptions::new().suppress_output(true)
}

/// Arguments for `sh -c <script>`.
pub fn sh_args(script: &str) -> Vec<String> {
    vec!["-c".to_string(), script.to_string()]
}
