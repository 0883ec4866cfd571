use crate::klog::KlogLevel;

const DEFAULT_ENABLED: bool = true;
const DEFAULT_VERBOSITY: Verbosity = Verbosity::Summary;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Summary,
    Verbose,
}

impl Verbosity {
    pub fn from_str(value: &str) -> Self {
        if value.eq_ignore_ascii_case("quiet") {
            Verbosity::Quiet
        } else if value.eq_ignore_ascii_case("verbose") {
            Verbosity::Verbose
        } else {
            Verbosity::Summary
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "quiet",
            Verbosity::Summary => "summary",
            Verbosity::Verbose => "verbose",
        }
    }
}

impl core::fmt::Display for Verbosity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct TestConfig {
    pub enabled: bool,
    pub verbosity: Verbosity,
    /// Log level applied for the duration of the run, if any.
    pub log_level: Option<KlogLevel>,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            enabled: DEFAULT_ENABLED,
            verbosity: DEFAULT_VERBOSITY,
            log_level: None,
        }
    }
}

pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("on")
        || value.eq_ignore_ascii_case("true")
        || value.eq_ignore_ascii_case("yes")
        || value == "1"
    {
        Some(true)
    } else if value.eq_ignore_ascii_case("off")
        || value.eq_ignore_ascii_case("false")
        || value.eq_ignore_ascii_case("no")
        || value == "0"
    {
        Some(false)
    } else {
        None
    }
}

/// Build a [`TestConfig`] from a kernel-style command line.
///
/// Recognised tokens: `itests=<bool>`, `itests.verbosity=<quiet|summary|verbose>`
/// and `klog=<level>`.  Anything else is ignored.
pub fn config_from_cmdline(cmdline: Option<&str>) -> TestConfig {
    let mut cfg = TestConfig::default();
    if let Some(cmdline) = cmdline {
        for token in cmdline.split_whitespace() {
            if let Some(value) = token.strip_prefix("itests=") {
                // Any non-boolean value (e.g. "stream") just enables tests.
                cfg.enabled = parse_bool(value).unwrap_or(true);
            } else if let Some(value) = token.strip_prefix("itests.verbosity=") {
                cfg.verbosity = Verbosity::from_str(value);
            } else if let Some(value) = token.strip_prefix("klog=") {
                cfg.log_level = KlogLevel::from_str(value);
            }
        }
    }
    cfg
}
