//! Textual rewriting of the relay-chain argument list.
//!
//! The relay node's flags are treated as opaque strings: an override
//! `KEY=VALUE` replaces the first occurrence of `KEY`, either in its split
//! form (`KEY VALUE`, two elements) or inline form (`KEY=...`), and is
//! appended when `KEY` does not occur at all.

use std::fmt;

use tracing::debug;

use crate::args::ProxyFlags;
use crate::error::ProxyError;

pub const BASE_PATH_FLAG: &str = "--base-path";
pub const KEYSTORE_PATH_FLAG: &str = "--keystore-path";

/// Directory created under the relay base path when the keystore is relocated.
pub const TMP_KEYSTORE_DIR: &str = "tmp_keystore_zombie_test";

/// A `KEY=VALUE` relay argument.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct ArgumentOverride(String);

impl ArgumentOverride {
    pub fn new(key: &str, value: &str) -> Self {
        Self(format!("{key}={value}"))
    }

    /// Everything before the first `=`, or the whole entry if it has none.
    pub fn key(&self) -> &str {
        self.0.split_once('=').map_or(self.0.as_str(), |(key, _)| key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ArgumentOverride {
    fn from(entry: String) -> Self {
        Self(entry)
    }
}

impl From<&str> for ArgumentOverride {
    fn from(entry: &str) -> Self {
        Self(entry.to_string())
    }
}

impl fmt::Display for ArgumentOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Value of the first `KEY VALUE` or `KEY=VALUE` occurrence in `args`.
fn find_value<'a>(args: &'a [String], key: &str) -> Option<&'a str> {
    args.iter().enumerate().find_map(|(i, arg)| {
        if arg == key {
            // A trailing key without a value does not count.
            args.get(i + 1).map(String::as_str)
        } else {
            arg.strip_prefix(key).and_then(|rest| rest.strip_prefix('='))
        }
    })
}

pub fn compute_keystore_path(polkadot_args: &[String]) -> Result<String, ProxyError> {
    let base = find_value(polkadot_args, BASE_PATH_FLAG)
        .ok_or(ProxyError::MissingArgument(BASE_PATH_FLAG))?;
    Ok(format!("{base}/{TMP_KEYSTORE_DIR}"))
}

pub fn keystore_override(polkadot_args: &[String]) -> Result<ArgumentOverride, ProxyError> {
    let path = compute_keystore_path(polkadot_args)?;
    Ok(ArgumentOverride::new(KEYSTORE_PATH_FLAG, &path))
}

pub fn apply_override(args: &mut Vec<String>, entry: &ArgumentOverride) {
    let key = entry.key();
    let found = args.iter().position(|arg| {
        arg == key || arg.strip_prefix(key).is_some_and(|rest| rest.starts_with('='))
    });

    match found {
        Some(i) if args[i] == key => {
            // Split form: the value element goes away together with the key.
            let end = (i + 2).min(args.len());
            debug!("replacing {:?} with {}", &args[i..end], entry);
            args.drain(i + 1..end);
            args[i] = entry.to_string();
        }
        Some(i) => {
            debug!("replacing {} with {}", args[i], entry);
            args[i] = entry.to_string();
        }
        None => {
            debug!("appending {}", entry);
            args.push(entry.to_string());
        }
    }
}

pub fn apply_overrides<'a>(
    args: &mut Vec<String>,
    overrides: impl IntoIterator<Item = &'a ArgumentOverride>,
) {
    for entry in overrides {
        apply_override(args, entry);
    }
}

/// Applies the keystore relocation, if requested, then the explicit overrides.
///
/// The explicit overrides run last so `--set-relay-arg=--keystore-path=...`
/// wins over the computed keystore path.
pub fn rewrite_relay_args(
    flags: &ProxyFlags,
    polkadot_args: &mut Vec<String>,
) -> Result<(), ProxyError> {
    if flags.change_relay_keystore {
        let keystore = keystore_override(polkadot_args)?;
        apply_override(polkadot_args, &keystore);
    }
    apply_overrides(polkadot_args, &flags.override_relay_args);
    Ok(())
}
