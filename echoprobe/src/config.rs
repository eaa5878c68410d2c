use core::cell::RefCell;
use core::fmt;
use core::fmt::Write;
use core::time::Duration;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use toml::Value;

/// Loaded configuration file.
#[derive(Default, Debug, PartialEq)]
pub struct Config {
    /// Targets to probe.
    pub targets: Vec<String>,
    /// Probes per target.
    pub count: Option<u32>,
    /// Reply timeout.
    pub timeout: Option<Duration>,
    /// Pause between probes to the same target.
    pub pause: Option<Duration>,
    /// ICMP packet size.
    pub size: Option<usize>,
}

impl Config {
    /// Add to configuration from the given path. Missing files are skipped.
    pub fn add_from_path(&mut self, path: &Path, diag: &Diagnostics) -> Result<()> {
        let Ok(bytes) = fs::read(path) else {
            tracing::debug!(path = %path.display(), "skipping unreadable config");
            return Ok(());
        };

        let value: Value = toml::from_slice(&bytes).context("failed to parse config file")?;
        self.add_value(value, diag);
        Ok(())
    }

    fn add_value(&mut self, value: Value, diag: &Diagnostics) {
        let mut parser = Parser::new(value, diag);

        parser.take("targets", |targets| match targets.value {
            Value::Array(values) => {
                for (index, value) in values.into_iter().enumerate() {
                    targets.diag.index(index);

                    if let Some(target) = Parser::new(value, targets.diag).string() {
                        self.targets.push(target);
                    }
                }

                targets.diag.pop();
            }
            Value::String(target) => {
                self.targets.push(target);
                targets.diag.pop();
            }
            other => {
                targets.diag.error(format_args!(
                    "expected array or string, found {}",
                    other.type_str()
                ));
                targets.diag.pop();
            }
        });

        if let Some(count) = parser.take("count", Parser::integer).flatten() {
            self.count = Some(count);
        }

        if let Some(timeout) = parser.take("timeout", Parser::seconds).flatten() {
            self.timeout = Some(timeout);
        }

        if let Some(pause) = parser.take("pause", Parser::seconds).flatten() {
            self.pause = Some(pause);
        }

        if let Some(size) = parser.take("size", Parser::integer).flatten() {
            self.size = Some(size);
        }

        parser.check();
    }
}

#[must_use = "Parser must be consumed to maintain diagnostics"]
struct Parser<'a> {
    value: Value,
    diag: &'a Diagnostics,
}

impl<'a> Parser<'a> {
    fn new(value: Value, diag: &'a Diagnostics) -> Self {
        Self { value, diag }
    }

    fn string(self) -> Option<String> {
        let out = match self.value {
            Value::String(value) => Some(value),
            other => {
                self.diag
                    .error(format_args!("expected string, found {}", other.type_str()));
                None
            }
        };

        self.diag.pop();
        out
    }

    fn integer<T>(self) -> Option<T>
    where
        T: TryFrom<i64>,
    {
        let out = match self.value {
            Value::Integer(value) => match T::try_from(value) {
                Ok(value) => Some(value),
                Err(..) => {
                    self.diag.error(format_args!("{value} is out of range"));
                    None
                }
            },
            other => {
                self.diag
                    .error(format_args!("expected integer, found {}", other.type_str()));
                None
            }
        };

        self.diag.pop();
        out
    }

    fn seconds(self) -> Option<Duration> {
        let secs = match self.value {
            Value::Integer(value) => Some(value as f64),
            Value::Float(value) => Some(value),
            ref other => {
                self.diag.error(format_args!(
                    "expected number of seconds, found {}",
                    other.type_str()
                ));
                None
            }
        };

        let out = secs.and_then(|secs| match Duration::try_from_secs_f64(secs) {
            Ok(duration) => Some(duration),
            Err(error) => {
                self.diag.error(format_args!("{secs}: {error}"));
                None
            }
        });

        self.diag.pop();
        out
    }

    fn take<O>(&mut self, key: &str, parser: impl FnOnce(Parser<'a>) -> O) -> Option<O> {
        let value = match &mut self.value {
            Value::Table(table) => table.remove(key)?,
            _ => return None,
        };

        self.diag.key(key);
        let output = parser(Parser::new(value, self.diag));
        Some(output)
    }

    fn check(self) {
        match self.value {
            Value::Table(table) => {
                for (key, value) in table {
                    self.diag.key(&key);
                    self.diag
                        .error(format_args!("unexpected key of type {}", value.type_str()));
                    self.diag.pop();
                }
            }
            value => {
                self.diag.error(format_args!(
                    "unexpected value of type {}",
                    value.type_str()
                ));
            }
        }
    }
}

/// One step of the key path leading to the value being parsed.
enum Step {
    Key(String),
    Index(usize),
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Key(key) => write!(f, ".{key}"),
            Step::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// Errors collected while parsing, each prefixed by the key path it was
/// found at.
#[derive(Default)]
pub struct Diagnostics {
    path: RefCell<Vec<Step>>,
    errors: RefCell<Vec<String>>,
}

impl Diagnostics {
    /// Construct new empty diagnostics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert into errors.
    pub(crate) fn into_errors(self) -> Vec<String> {
        self.errors.into_inner()
    }

    fn index(&self, index: usize) {
        self.path.borrow_mut().push(Step::Index(index));
    }

    fn key(&self, key: &str) {
        self.path.borrow_mut().push(Step::Key(key.to_owned()));
    }

    fn pop(&self) {
        self.path.borrow_mut().pop();
    }

    fn error(&self, message: impl fmt::Display) {
        let mut error = String::new();

        for step in self.path.borrow().iter() {
            _ = write!(error, "{step}");
        }

        if !error.is_empty() {
            error.push_str(": ");
        }

        _ = write!(error, "{message}");
        self.errors.borrow_mut().push(error);
    }
}
