#![no_std]

#[cfg(test)]
extern crate std;

pub use ringnet_lib::testing::{
    HARNESS_MAX_SUITES, TestConfig, TestRunSummary, TestSuiteDesc, TestSuiteResult, Verbosity,
    config_from_cmdline,
};
use ringnet_lib::{klog_get_level, klog_info, klog_set_level};
use ringnet_net::{stream_buffer_tests, tcp_stream_tests};

/// Every scenario suite shipped with the stack, in execution order.
pub static SUITE_REGISTRY: [&TestSuiteDesc; 2] = [
    &stream_buffer_tests::STREAM_BUFFER_SUITE_DESC,
    &tcp_stream_tests::TCP_STREAM_SUITE_DESC,
];

pub fn tests_run_all(config: &TestConfig, registry: &[&TestSuiteDesc]) -> TestRunSummary {
    let mut summary = TestRunSummary::default();
    if !config.enabled {
        klog_info!("TESTS: Harness disabled");
        return summary;
    }

    let saved_level = klog_get_level();
    if let Some(level) = config.log_level {
        klog_set_level(level);
    }

    klog_info!("TESTS: Starting {} test suites", registry.len());

    for (idx, desc) in registry.iter().enumerate() {
        let res = (desc.run)();
        if config.verbosity != Verbosity::Quiet {
            klog_info!(
                "SUITE{} {} total={} pass={} fail={}",
                idx,
                desc.name,
                res.total,
                res.passed,
                res.failed,
            );
        }
        summary.add_suite_result(&res);
    }

    klog_info!(
        "TESTS SUMMARY: total={} passed={} failed={}",
        summary.total_tests,
        summary.passed,
        summary.failed,
    );

    klog_set_level(saved_level);
    summary
}

/// Parse `cmdline`, run the registry, and return a process-style status.
pub fn tests_run_from_cmdline(cmdline: Option<&str>) -> i32 {
    let config = config_from_cmdline(cmdline);
    let summary = tests_run_all(&config, &SUITE_REGISTRY);
    if summary.all_passed() { 0 } else { -1 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringnet_lib::klog::{KlogLevel, klog_register_backend};
    use std::println;

    fn stdout_backend(level: KlogLevel, args: core::fmt::Arguments<'_>) {
        println!("[{}] {}", level, args);
    }

    #[test]
    fn test_all_registered_suites_pass() {
        klog_register_backend(stdout_backend);
        let config = config_from_cmdline(Some("itests=on itests.verbosity=verbose"));
        let summary = tests_run_all(&config, &SUITE_REGISTRY);

        assert_eq!(summary.suite_count, SUITE_REGISTRY.len());
        for suite in summary.suites() {
            assert!(suite.total > 0, "suite {} ran no tests", suite.name);
            assert!(suite.all_passed(), "suite {} failed: {:?}", suite.name, suite);
        }
        assert!(summary.all_passed());
    }

    #[test]
    fn test_disabled_harness_runs_nothing() {
        let config = config_from_cmdline(Some("itests=off"));
        let summary = tests_run_all(&config, &SUITE_REGISTRY);
        assert_eq!(summary.suite_count, 0);
        assert_eq!(summary.total_tests, 0);
    }

    #[test]
    fn test_cmdline_entry_point() {
        assert_eq!(tests_run_from_cmdline(Some("itests.verbosity=quiet")), 0);
    }
}
