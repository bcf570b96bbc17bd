// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Engine [`Config`] and its [`Cli`] options.

use std::{fmt, sync::Arc, time::Duration};

use crate::{
    error::ConfigError,
    tag::TagFilter,
    timeout::TimeoutSpec,
};

/// Callback receiving messages logged by hooks.
pub type Logger = Arc<dyn Fn(&str) + Send + Sync>;

/// Configuration of a whole run.
#[derive(Clone, Default)]
pub struct Config {
    /// [`TagFilter`] deciding which scenarios are run.
    ///
    /// [`None`] runs every scenario.
    pub tag_filter: Option<TagFilter>,

    /// Default timeout of scenarios and hooks.
    ///
    /// [`None`] leaves it to a host runtime.
    pub timeout: Option<TimeoutSpec>,

    /// [`Logger`] made available to hooks.
    pub logger: Option<Logger>,
}

// Implemented manually, as `Logger` doesn't implement `Debug`.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("tag_filter", &self.tag_filter)
            .field("timeout", &self.timeout)
            .field("logger", &self.logger.as_ref().map(|_| ".."))
            .finish()
    }
}

impl Config {
    /// Sets the [`TagFilter`] compiled from the given `expression`.
    ///
    /// # Errors
    ///
    /// If the `expression` cannot be parsed.
    pub fn with_tags(mut self, expression: &str) -> Result<Self, ConfigError> {
        self.tag_filter = Some(TagFilter::new(expression)?);
        Ok(self)
    }

    /// Sets the [`TagFilter`].
    #[must_use]
    pub fn with_tag_filter(mut self, filter: TagFilter) -> Self {
        self.tag_filter = Some(filter);
        self
    }

    /// Sets the default timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: impl Into<TimeoutSpec>) -> Self {
        self.timeout = Some(timeout.into());
        self
    }

    /// Sets the [`Logger`] of hooks.
    #[must_use]
    pub fn with_logger<F>(mut self, logger: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.logger = Some(Arc::new(logger));
        self
    }

    /// Indicates whether a scenario with the given `tags` passes the
    /// configured [`TagFilter`].
    #[must_use]
    pub fn accepts<I, S>(&self, tags: I) -> bool
    where
        S: AsRef<str>,
        I: IntoIterator<Item = S> + Clone,
    {
        self.tag_filter.as_ref().map_or(true, |f| f.evaluate(tags))
    }
}

/// CLI options of the engine.
///
/// Can be flattened into a host's own [`clap::Parser`].
#[derive(Clone, Debug, Default, clap::Args)]
#[group(skip)]
pub struct Cli {
    /// Tag expression to filter scenarios with.
    ///
    /// Scenarios not matching it are registered as skipped.
    #[arg(long = "tags", short = 't', value_name = "tagexpr", global = true)]
    pub tags: Option<TagFilter>,

    /// Default timeout of scenarios and hooks.
    ///
    /// Duration is represented in a human-readable format like `1min30s`.
    /// Supported suffixes:
    /// - `msec`, `ms` - milliseconds.
    /// - `seconds`, `second`, `sec`, `s` - seconds.
    /// - `minutes`, `minute`, `min`, `m` - minutes.
    /// - `hours`, `hour`, `hr`, `h` - hours.
    #[arg(
        long,
        value_name = "duration",
        value_parser = humantime::parse_duration,
        verbatim_doc_comment,
        global = true,
    )]
    pub timeout: Option<Duration>,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Self {
            tag_filter: cli.tags,
            timeout: cli.timeout.map(TimeoutSpec::from),
            logger: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use clap::Parser;

    use super::*;

    #[derive(Debug, Parser)]
    struct Opts {
        #[command(flatten)]
        engine: Cli,
    }

    #[test]
    fn parses_cli() {
        let opts = Opts::try_parse_from([
            "test",
            "--tags",
            "@smoke and not @slow",
            "--timeout",
            "1min 30s",
        ])
        .unwrap();
        let config = Config::from(opts.engine);

        assert_eq!(
            config.tag_filter.as_ref().and_then(TagFilter::expression),
            Some("@smoke and not @slow"),
        );
        assert_eq!(config.timeout.and_then(TimeoutSpec::to_millis), Some(90_000));
        assert!(config.accepts(["@smoke"]));
        assert!(!config.accepts(["@smoke", "@slow"]));
    }

    #[test]
    fn rejects_invalid_tags() {
        assert!(Opts::try_parse_from(["test", "--tags", "(@a or"]).is_err());
        assert!(Config::default().with_tags("@a and (@b").is_err());
    }

    #[test]
    fn accepts_everything_by_default() {
        assert!(Config::default().accepts(["@any"]));
        assert!(Config::default().accepts(Vec::<String>::new()));
    }

    #[test]
    fn stores_logger() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let config = Config::default().with_logger({
            let seen = Arc::clone(&seen);
            move |msg| seen.lock().unwrap().push(msg.to_owned())
        });

        (config.logger.unwrap())("hello");

        assert_eq!(*seen.lock().unwrap(), ["hello"]);
    }
}
