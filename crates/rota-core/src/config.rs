//! Rotation configuration.
//!
//! [`RotationConfig`] bundles the two ports and the payload codec. It is
//! built once per process and only read while events are handled.
//! [`RotationSettings`] belong to the hosting process, which hands them to
//! [`init_tracing`](crate::telemetry::init_tracing).

use crate::codec::SecretCodec;
use crate::service::ServiceClient;
use crate::store::SecretStore;

/// Environment variable enabling verbose logging.
pub const DEBUG_ENV: &str = "DEBUG";

/// Parses a truthy flag: `y`, `yes`, `true` or `1`, case-insensitively.
///
/// Anything else, including an empty string, is false.
#[must_use]
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "y" | "yes" | "true" | "1"
    )
}

/// Runtime settings supplied by the bootstrapping layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RotationSettings {
    /// Emit debug-level logs for every step.
    pub debug: bool,
}

impl RotationSettings {
    /// Creates settings with debug logging switched as given.
    #[must_use]
    pub const fn new(debug: bool) -> Self {
        Self { debug }
    }

    /// Reads settings from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, which maps a variable name to its value.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            debug: lookup(DEBUG_ENV).is_some_and(|value| parse_flag(&value)),
        }
    }
}

/// Everything a [`Rotator`](crate::rotator::Rotator) needs to handle events.
#[derive(Debug, Clone)]
pub struct RotationConfig<St, Sc, C> {
    /// The secret store port.
    pub store: St,
    /// The service client port.
    pub service: Sc,
    /// Decoder/encoder for the staged payloads.
    pub codec: C,
}

impl<St, Sc, C> RotationConfig<St, Sc, C>
where
    St: SecretStore,
    Sc: ServiceClient,
    C: SecretCodec<Secret = Sc::Secret>,
{
    /// Creates a configuration.
    #[must_use]
    pub const fn new(store: St, service: Sc, codec: C) -> Self {
        Self {
            store,
            service,
            codec,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("y", true)]
    #[test_case("Yes", true)]
    #[test_case("TRUE", true)]
    #[test_case("1", true)]
    #[test_case(" true ", true ; "surrounding whitespace")]
    #[test_case("0", false)]
    #[test_case("no", false)]
    #[test_case("", false ; "empty")]
    #[test_case("enabled", false)]
    fn parse_flag_values(input: &str, expected: bool) {
        assert_eq!(parse_flag(input), expected);
    }

    #[test]
    fn settings_from_lookup() {
        let settings = RotationSettings::from_lookup(|key| {
            (key == DEBUG_ENV).then(|| "yes".to_string())
        });
        assert!(settings.debug);

        let settings = RotationSettings::from_lookup(|_| None);
        assert_eq!(settings, RotationSettings::default());
    }
}
