//! In-tree scenario test harness.
//!
//! Scenario tests are plain `fn() -> TestResult` functions grouped into
//! suites with [`define_test_suite!`].  A runner crate lists the generated
//! `*_SUITE_DESC` statics and drives them through its own registry, so the
//! same suites run under `cargo test` and inside an embedding kernel.

pub mod config;
pub mod harness;

mod assertions;
pub use config::{TestConfig, Verbosity, config_from_cmdline};
pub use harness::{HARNESS_MAX_SUITES, TestRunSummary, TestSuiteDesc, TestSuiteResult};

use crate::klog_info;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TestResult {
    Pass,
    Fail,
    Skipped,
}

impl TestResult {
    #[inline]
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass | Self::Skipped)
    }

    #[inline]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Fail)
    }
}

/// Run one scenario, logging its name on failure.
pub fn run_single_test(name: &str, test: impl FnOnce() -> TestResult) -> TestResult {
    let result = test();
    if result.is_failure() {
        klog_info!("TEST FAIL: {}", name);
    }
    result
}

#[macro_export]
macro_rules! pass {
    () => {
        $crate::testing::TestResult::Pass
    };
}

#[macro_export]
macro_rules! fail {
    () => {
        $crate::testing::TestResult::Fail
    };
    ($msg:expr) => {{
        $crate::klog_info!("TEST FAIL: {}", $msg);
        $crate::testing::TestResult::Fail
    }};
    ($fmt:expr, $($arg:tt)*) => {{
        $crate::klog_info!(concat!("TEST FAIL: ", $fmt), $($arg)*);
        $crate::testing::TestResult::Fail
    }};
}

#[macro_export]
macro_rules! run_test {
    ($passed:expr, $total:expr, $test_fn:expr) => {{
        $total += 1;
        let result = $crate::testing::run_single_test(stringify!($test_fn), || $test_fn());
        if result.is_pass() {
            $passed += 1;
        }
        result
    }};

    ($test_fn:expr) => {{ $crate::testing::run_single_test(stringify!($test_fn), || $test_fn()) }};
}

/// Define a suite runner plus its `<NAME>_SUITE_DESC` descriptor.
#[macro_export]
macro_rules! define_test_suite {
    ($suite_name:ident, [$($test_fn:path),* $(,)?]) => {
        $crate::paste::paste! {
            pub fn [<run_ $suite_name _suite>]() -> $crate::testing::TestSuiteResult {
                let mut passed = 0u32;
                let mut total = 0u32;

                $(
                    $crate::run_test!(passed, total, $test_fn);
                )*

                let mut result = $crate::testing::TestSuiteResult::new(stringify!($suite_name));
                result.fill(passed, total);
                result
            }

            pub static [<$suite_name:upper _SUITE_DESC>]: $crate::testing::TestSuiteDesc =
                $crate::testing::TestSuiteDesc {
                    name: stringify!($suite_name),
                    run: [<run_ $suite_name _suite>],
                };
        }
    };
}
