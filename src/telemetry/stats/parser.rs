//! Generic machinery for parsing the key/value shaped stat files exposed by the kernel,
//! such as `cpu.stat`, `memory.stat` and the per-device lines of `io.stat`.
//!
//! # Traits
//!
//! - [`KeyValueStat`]: parses multi-line content into a typed record. Implementors pick the
//!   separator (whitespace or a split character), whether repeated keys are allowed and how
//!   many pairs a line may carry, and provide a table of field handlers.
//!
//! # Error policy
//!
//! Kernel files are loosely specified and grow new keys over time. Unknown keys are ignored
//! and a value that is not an integer is routed through [`KeyValueStat::on_invalid_value`],
//! which skips the pair by default. Only structural violations an implementor opts into
//! (duplicate keys when `ALLOW_DUPLICATE_KEYS` is `false`) abort the parse.
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use std::sync::LazyLock;
//! use mc_docker_manager::telemetry::stats::KeyValueStat;
//!
//! #[derive(Default)]
//! struct PressureStat {
//!     some: u64,
//!     full: u64,
//! }
//!
//! type Setter = fn(&mut PressureStat, u64);
//! static SETTERS: LazyLock<HashMap<&'static str, Setter>> = LazyLock::new(|| {
//!     let mut m: HashMap<&'static str, Setter> = HashMap::new();
//!     m.insert("some", |s: &mut PressureStat, v: u64| s.some = v);
//!     m.insert("full", |s: &mut PressureStat, v: u64| s.full = v);
//!     m
//! });
//!
//! impl KeyValueStat for PressureStat {
//!     const SPLIT_CHAR: Option<char> = Some('=');
//!     const SKIP_VALUES: usize = 0;
//!     const ALLOW_DUPLICATE_KEYS: bool = true;
//!     const ALLOW_MULTIPLE_KV_PER_LINE: bool = true;
//!
//!     fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
//!         &SETTERS
//!     }
//! }
//!
//! let stat = PressureStat::parse("some=10 full=4\n").unwrap();
//! assert_eq!(stat.some, 10);
//! assert_eq!(stat.full, 4);
//! ```

use std::collections::{HashMap, HashSet};

use super::StatParseError;

/// Handler table type shared by all [`KeyValueStat`] implementors.
pub type FieldHandlers<T> = HashMap<&'static str, fn(&mut T, u64)>;

/// Declares a lazily built handler table, named by the first argument, whose handlers
/// assign the parsed value to the listed field of the same name.
macro_rules! field_setters {
    ($table:ident: $ty:ty { $($field:ident),+ $(,)? }) => {
        static $table: ::std::sync::LazyLock<$crate::telemetry::stats::parser::FieldHandlers<$ty>> =
            ::std::sync::LazyLock::new(|| {
                let mut m: $crate::telemetry::stats::parser::FieldHandlers<$ty> =
                    ::std::collections::HashMap::new();
                $(
                    m.insert(stringify!($field), |stat: &mut $ty, v: u64| stat.$field = v);
                )+
                m
            });
    };
}

pub(crate) use field_setters;

/// A trait for parsing structured key-value stat content into a typed record.
pub trait KeyValueStat: Default
where
    Self: 'static,
{
    /// If set to `Some(char)`, each key-value pair is joined by that character
    /// (`rbytes=123`). If `None`, keys and values are separate whitespace tokens
    /// (`anon 123`).
    const SPLIT_CHAR: Option<char>;

    /// The number of whitespace-separated tokens to skip at the start of *each line*.
    const SKIP_VALUES: usize;

    /// If `false`, a key appearing twice aborts the parse with
    /// [`StatParseError::DuplicateField`]. If `true`, the handler simply runs again, which
    /// for plain setters means the last occurrence wins.
    const ALLOW_DUPLICATE_KEYS: bool;

    /// If `true`, every pair on a line is consumed; otherwise only the first one.
    const ALLOW_MULTIPLE_KV_PER_LINE: bool;

    /// Returns the map of known field names to the functions applying a parsed value.
    fn field_handlers() -> &'static FieldHandlers<Self>;

    /// Parses `content` line by line into a new record.
    ///
    /// # Errors
    ///
    /// Returns [`StatParseError::DuplicateField`] when duplicates are disallowed, or
    /// whatever error an overridden [`KeyValueStat::on_invalid_value`] chooses to raise.
    fn parse(content: &str) -> Result<Self, StatParseError> {
        let mut stat = Self::default();
        let handlers = Self::field_handlers();
        let mut seen_keys = HashSet::with_capacity(handlers.len());

        for (idx, line) in content.lines().enumerate() {
            Self::parse_line(&mut stat, line, idx + 1, handlers, &mut seen_keys)?;
        }

        Ok(stat)
    }

    /// Parses a single line into one or more key-value pairs.
    fn parse_line(
        stat: &mut Self,
        line: &str,
        lineno: usize,
        handlers: &FieldHandlers<Self>,
        seen_keys: &mut HashSet<&'static str>,
    ) -> Result<(), StatParseError> {
        let mut parts = line.split_whitespace().skip(Self::SKIP_VALUES);

        match Self::SPLIT_CHAR {
            Some(split_char) => {
                for part in parts {
                    if let Some((key, val)) = part.split_once(split_char) {
                        Self::parse_and_set(key, val, stat, lineno, handlers, seen_keys)?;
                    }
                    if !Self::ALLOW_MULTIPLE_KV_PER_LINE {
                        break;
                    }
                }
            }
            None => {
                while let (Some(key), Some(val)) = (parts.next(), parts.next()) {
                    Self::parse_and_set(key, val, stat, lineno, handlers, seen_keys)?;
                    if !Self::ALLOW_MULTIPLE_KV_PER_LINE {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    /// Parses one value and applies it through the matching handler.
    fn parse_and_set(
        key: &str,
        val: &str,
        stat: &mut Self,
        lineno: usize,
        handlers: &FieldHandlers<Self>,
        seen_keys: &mut HashSet<&'static str>,
    ) -> Result<(), StatParseError> {
        let Some((k, handler)) = handlers.get_key_value(key) else {
            return Self::on_unknown_key(key, val, lineno);
        };

        let parsed = match val.parse::<u64>() {
            Ok(parsed) => parsed,
            Err(source) => {
                return Self::on_invalid_value(StatParseError::InvalidKeyValue {
                    key: key.to_string(),
                    value: val.to_string(),
                    line: lineno,
                    source,
                });
            }
        };

        if !Self::ALLOW_DUPLICATE_KEYS && !seen_keys.insert(k) {
            return Err(StatParseError::DuplicateField {
                field: key.to_string(),
                line: lineno,
            });
        }
        handler(stat, parsed);
        Ok(())
    }

    /// Called for keys missing from [`KeyValueStat::field_handlers`]. Ignored by default.
    #[inline]
    fn on_unknown_key(_key: &str, _val: &str, _lineno: usize) -> Result<(), StatParseError> {
        Ok(())
    }

    /// Called when a known key carries a value that is not an unsigned integer.
    ///
    /// The default logs and skips the pair.
    #[inline]
    fn on_invalid_value(err: StatParseError) -> Result<(), StatParseError> {
        log::debug!("skipping malformed stat entry: {err}");
        Ok(())
    }
}
