// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Resolving an effective timeout out of explicit, hook-level and
//! configuration-level [`TimeoutSpec`]s.

use std::{str::FromStr, time::Duration};

use derive_more::with_trait::Display;
use lazy_regex::regex_captures;

use crate::{config::Config, error::ConfigError};

/// Unit of a [`TimeoutSpec`].
#[derive(Clone, Copy, Debug, Default, Display, Eq, Hash, PartialEq)]
pub enum TimeUnit {
    /// Milliseconds.
    #[default]
    #[display("ms")]
    Milliseconds,

    /// Seconds.
    #[display("s")]
    Seconds,

    /// Minutes.
    #[display("m")]
    Minutes,

    /// Hours.
    #[display("h")]
    Hours,
}

impl TimeUnit {
    /// Number of milliseconds in one unit.
    #[must_use]
    pub const fn millis(self) -> f64 {
        match self {
            Self::Milliseconds => 1.0,
            Self::Seconds => 1_000.0,
            Self::Minutes => 60_000.0,
            Self::Hours => 3_600_000.0,
        }
    }
}

/// Declared timeout: a value in some [`TimeUnit`].
///
/// Non-positive values are treated as unset.
#[derive(Clone, Copy, Debug, Display, PartialEq)]
#[display("{value}{unit}")]
pub struct TimeoutSpec {
    /// Amount of [`TimeUnit`]s.
    pub value: f64,

    /// [`TimeUnit`] of the `value`.
    pub unit: TimeUnit,
}

impl TimeoutSpec {
    /// Creates a new [`TimeoutSpec`].
    #[must_use]
    pub const fn new(value: f64, unit: TimeUnit) -> Self {
        Self { value, unit }
    }

    /// Creates a new [`TimeoutSpec`] in milliseconds.
    #[allow(clippy::cast_precision_loss)] // timeouts are far below 2^52
    #[must_use]
    pub fn millis(value: i64) -> Self {
        Self::new(value as f64, TimeUnit::Milliseconds)
    }

    /// Normalizes this [`TimeoutSpec`] to whole milliseconds, rounding
    /// positive sub-millisecond values up to a single one.
    ///
    /// Returns [`None`] for non-positive or non-finite values.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    #[must_use]
    pub fn to_millis(self) -> Option<u64> {
        let ms = self.value * self.unit.millis();
        (ms.is_finite() && ms > 0.0).then(|| ms.round().max(1.0) as u64)
    }
}

impl From<u64> for TimeoutSpec {
    #[allow(clippy::cast_precision_loss)]
    fn from(ms: u64) -> Self {
        Self::new(ms as f64, TimeUnit::Milliseconds)
    }
}

impl From<Duration> for TimeoutSpec {
    fn from(d: Duration) -> Self {
        Self::new(d.as_secs_f64() * 1_000.0, TimeUnit::Milliseconds)
    }
}

impl FromStr for TimeoutSpec {
    type Err = ConfigError;

    /// Parses `500`, `500ms`, `2s`, `1.5m`, `1h` or any [`humantime`] duration
    /// like `1min 30s`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((_, value, unit)) =
            regex_captures!(r"^\s*(-?\d+(?:\.\d+)?)\s*(ms|s|m|h)?\s*$", s)
        {
            let value = value
                .parse::<f64>()
                .map_err(|e| ConfigError::timeout(s, e))?;
            let unit = match unit {
                "s" => TimeUnit::Seconds,
                "m" => TimeUnit::Minutes,
                "h" => TimeUnit::Hours,
                _ => TimeUnit::Milliseconds,
            };
            return Ok(Self::new(value, unit));
        }

        humantime::parse_duration(s.trim())
            .map(Self::from)
            .map_err(|e| ConfigError::timeout(s, e))
    }
}

/// Origin of a [`ResolvedTimeout`].
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum TimeoutSource {
    /// Declared on the scenario (or passed explicitly).
    #[display("scenario")]
    Scenario,

    /// Declared on a hook.
    #[display("hook")]
    Hook,

    /// Taken from the [`Config`].
    #[display("config")]
    Config,
}

/// Effective timeout to hand over to a host runtime.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ResolvedTimeout {
    /// Timeout in milliseconds.
    pub milliseconds: u64,

    /// Where this timeout comes from.
    pub source: TimeoutSource,
}

impl ResolvedTimeout {
    /// Returns this timeout as a [`Duration`].
    #[must_use]
    pub const fn duration(&self) -> Duration {
        Duration::from_millis(self.milliseconds)
    }
}

/// Resolves the effective timeout: the `explicit` one first, then the
/// [`Config`] default.
///
/// [`None`] means the host runtime default applies.
#[must_use]
pub fn resolve_timeout(
    explicit: Option<TimeoutSpec>,
    config: &Config,
) -> Option<ResolvedTimeout> {
    resolve_with(explicit, TimeoutSource::Scenario, config)
}

/// Resolves the effective timeout of a hook: the `hook` one first, then the
/// `scenario` one, then the [`Config`] default.
#[must_use]
pub fn resolve_hook_timeout(
    hook: Option<TimeoutSpec>,
    scenario: Option<TimeoutSpec>,
    config: &Config,
) -> Option<ResolvedTimeout> {
    hook.and_then(TimeoutSpec::to_millis)
        .map(|milliseconds| ResolvedTimeout {
            milliseconds,
            source: TimeoutSource::Hook,
        })
        .or_else(|| resolve_timeout(scenario, config))
}

/// Resolves the `explicit` timeout attributing it to the given `source`,
/// falling back to the [`Config`] default.
fn resolve_with(
    explicit: Option<TimeoutSpec>,
    source: TimeoutSource,
    config: &Config,
) -> Option<ResolvedTimeout> {
    explicit
        .and_then(TimeoutSpec::to_millis)
        .map(|milliseconds| ResolvedTimeout { milliseconds, source })
        .or_else(|| {
            config.timeout.and_then(TimeoutSpec::to_millis).map(|milliseconds| {
                ResolvedTimeout { milliseconds, source: TimeoutSource::Config }
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(ms: u64) -> Config {
        Config::default().with_timeout(ms)
    }

    #[test]
    fn falls_back_to_config() {
        assert_eq!(
            resolve_timeout(None, &config(2000)),
            Some(ResolvedTimeout {
                milliseconds: 2000,
                source: TimeoutSource::Config,
            }),
        );
    }

    #[test]
    fn explicit_wins() {
        assert_eq!(
            resolve_timeout(Some(TimeoutSpec::millis(500)), &config(2000)),
            Some(ResolvedTimeout {
                milliseconds: 500,
                source: TimeoutSource::Scenario,
            }),
        );
    }

    #[test]
    fn unresolved_without_config() {
        assert_eq!(resolve_timeout(None, &Config::default()), None);
    }

    #[test]
    fn non_positive_is_unset() {
        let spec = TimeoutSpec::millis(-5);
        assert_eq!(spec.to_millis(), None);
        assert_eq!(TimeoutSpec::millis(0).to_millis(), None);
        assert_eq!(TimeoutSpec::new(-0.4, TimeUnit::Milliseconds).to_millis(), None);
        assert_eq!(TimeoutSpec::new(f64::NAN, TimeUnit::Seconds).to_millis(), None);
        assert_eq!(
            resolve_timeout(Some(spec), &config(100)).map(|t| t.source),
            Some(TimeoutSource::Config),
        );
    }

    #[test]
    fn hook_overrides_scenario() {
        let cfg = config(2000);

        let t = resolve_hook_timeout(
            Some(TimeoutSpec::new(1.0, TimeUnit::Seconds)),
            Some(TimeoutSpec::millis(500)),
            &cfg,
        );
        assert_eq!(t.map(|t| (t.milliseconds, t.source)), Some((1000, TimeoutSource::Hook)));

        let t = resolve_hook_timeout(None, Some(TimeoutSpec::millis(500)), &cfg);
        assert_eq!(t.map(|t| t.source), Some(TimeoutSource::Scenario));

        let t = resolve_hook_timeout(None, None, &cfg);
        assert_eq!(t.map(|t| t.source), Some(TimeoutSource::Config));
    }

    #[test]
    fn normalizes_units() {
        let parse = |s: &str| s.parse::<TimeoutSpec>().unwrap().to_millis();

        assert_eq!(parse("250"), Some(250));
        assert_eq!(parse("250ms"), Some(250));
        assert_eq!(parse("2s"), Some(2_000));
        assert_eq!(parse("1.5m"), Some(90_000));
        assert_eq!(parse("1h"), Some(3_600_000));
        assert_eq!(parse("1min 30s"), Some(90_000));
        assert_eq!(parse("0.4ms"), Some(1));
        assert_eq!(parse("1.6"), Some(2));
        assert!("soon".parse::<TimeoutSpec>().is_err());
    }
}
