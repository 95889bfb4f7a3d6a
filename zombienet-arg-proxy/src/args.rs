//! Command line layout of the proxy.
//!
//! ```text
//! zombienet-arg-proxy [PROXY FLAGS] -- <command> [<tanssi_arg>...] [-- <polkadot_arg>...]
//! ```
//!
//! Everything before the first bare `--` belongs to the proxy itself. The next
//! element is the command to launch, followed by its own arguments. A second
//! bare `--` starts the relay-chain arguments, which are the only ones the
//! proxy rewrites.

use std::ffi::OsString;

use clap::Parser;
use clap::error::{ContextKind, ContextValue};

use crate::error::ProxyError;
use crate::overrides::ArgumentOverride;

/// Bare separator between the proxy flags, the command and the relay arguments.
pub const SEPARATOR: &str = "--";

pub const USAGE: &str = "\
Usage: zombienet-arg-proxy [--set-relay-arg=<KEY=VALUE>]... [--change-relay-keystore-path]
           -- <command> [<tanssi_arg>...] [-- <polkadot_arg>...]

Options:
  --set-relay-arg=<KEY=VALUE>    Replace or append KEY=VALUE in the relay-chain arguments
                                 (repeatable, applied in order)
  --change-relay-keystore-path   Point --keystore-path at a temporary directory under --base-path";

const SET_RELAY_ARG_PREFIX: &str = "--set-relay-arg=";
const CHANGE_RELAY_KEYSTORE_FLAG: &str = "--change-relay-keystore-path";

/// Flags consumed by the proxy, i.e. everything before the first `--`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Parser)]
#[command(
    name = "zombienet-arg-proxy",
    no_binary_name = true,
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct ProxyFlags {
    /// Relay argument overrides, applied in the order given.
    #[arg(
        long = "set-relay-arg",
        value_name = "KEY=VALUE",
        require_equals = true,
        allow_hyphen_values = true,
        action = clap::ArgAction::Append
    )]
    pub override_relay_args: Vec<ArgumentOverride>,
    #[arg(
        long = "change-relay-keystore-path",
        action = clap::ArgAction::SetTrue,
        overrides_with = "change_relay_keystore"
    )]
    pub change_relay_keystore: bool,
}

/// The command to launch, split into its own arguments and the relay-chain arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSections {
    /// Command name followed by its arguments.
    pub tanssi_args: Vec<String>,
    pub polkadot_args: Vec<String>,
}

impl CommandSections {
    pub fn command(&self) -> &str {
        &self.tanssi_args[0]
    }

    /// Arguments handed to the child: its own, a bare `--`, then the relay arguments.
    pub fn child_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.tanssi_args.len() + self.polkadot_args.len());
        args.extend_from_slice(&self.tanssi_args[1..]);
        args.push(SEPARATOR.to_string());
        args.extend_from_slice(&self.polkadot_args);
        args
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedInvocation {
    pub flags: ProxyFlags,
    pub sections: CommandSections,
}

/// Converts the raw process arguments, rejecting any that is not valid UTF-8.
pub fn collect_argv(args: impl IntoIterator<Item = OsString>) -> Result<Vec<String>, ProxyError> {
    args.into_iter()
        .map(|arg| {
            arg.into_string()
                .map_err(|raw| ProxyError::NonUtf8Argument(raw.to_string_lossy().into_owned()))
        })
        .collect()
}

pub fn parse(argv: &[String]) -> Result<ParsedInvocation, ProxyError> {
    let (flags, remaining) = parse_proxy_flags(argv)?;
    let sections = split_command_sections(remaining)?;
    Ok(ParsedInvocation { flags, sections })
}

/// Parses the flags in front of the first `--` and returns them with everything after it.
pub fn parse_proxy_flags(argv: &[String]) -> Result<(ProxyFlags, &[String]), ProxyError> {
    let separator = argv
        .iter()
        .position(|arg| arg == SEPARATOR)
        .ok_or(ProxyError::MissingSeparator)?;
    let (prefix, rest) = (&argv[..separator], &argv[separator + 1..]);

    if let Some(unknown) = prefix.iter().find(|arg| !is_proxy_flag(arg)) {
        return Err(ProxyError::UnknownFlag(unknown.clone()));
    }
    let flags = ProxyFlags::try_parse_from(prefix)
        .map_err(|err| ProxyError::UnknownFlag(offending_flag(&err, prefix)))?;
    Ok((flags, rest))
}

fn is_proxy_flag(arg: &str) -> bool {
    arg == CHANGE_RELAY_KEYSTORE_FLAG || arg.starts_with(SET_RELAY_ARG_PREFIX)
}

fn offending_flag(err: &clap::Error, prefix: &[String]) -> String {
    match err.get(ContextKind::InvalidArg) {
        Some(ContextValue::String(arg)) => arg.clone(),
        _ => prefix.first().cloned().unwrap_or_default(),
    }
}

pub fn split_command_sections(remaining: &[String]) -> Result<CommandSections, ProxyError> {
    let (command, rest) = remaining.split_first().ok_or(ProxyError::MissingCommand)?;

    let (own, relay) = match rest.iter().position(|arg| arg == SEPARATOR) {
        Some(i) => (&rest[..i], &rest[i + 1..]),
        None => (rest, &[][..]),
    };

    let mut tanssi_args = Vec::with_capacity(own.len() + 1);
    tanssi_args.push(command.clone());
    tanssi_args.extend_from_slice(own);

    Ok(CommandSections {
        tanssi_args,
        polkadot_args: relay.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn splits_on_second_separator() {
        let sections = split_command_sections(&argv(&["node", "--a", "--", "--b"])).unwrap();
        assert_eq!(sections.tanssi_args, argv(&["node", "--a"]));
        assert_eq!(sections.polkadot_args, argv(&["--b"]));
    }

    #[test]
    fn no_second_separator_leaves_relay_args_empty() {
        let sections = split_command_sections(&argv(&["node", "--a", "--b"])).unwrap();
        assert_eq!(sections.tanssi_args, argv(&["node", "--a", "--b"]));
        assert!(sections.polkadot_args.is_empty());
    }

    #[test]
    fn only_the_first_inner_separator_splits() {
        let sections = split_command_sections(&argv(&["node", "--", "--x", "--", "--y"])).unwrap();
        assert_eq!(sections.tanssi_args, argv(&["node"]));
        assert_eq!(sections.polkadot_args, argv(&["--x", "--", "--y"]));
    }

    #[test]
    fn empty_command_section_is_rejected() {
        assert!(matches!(split_command_sections(&[]), Err(ProxyError::MissingCommand)));
        assert!(matches!(parse(&argv(&["--"])), Err(ProxyError::MissingCommand)));
    }

    #[test]
    fn missing_separator_is_rejected() {
        let err = parse(&argv(&["--change-relay-keystore-path", "node"])).unwrap_err();
        assert!(matches!(err, ProxyError::MissingSeparator));
        assert!(err.is_usage());
        assert!(matches!(parse(&[]), Err(ProxyError::MissingSeparator)));
    }

    #[test]
    fn collects_overrides_in_order() {
        let input = argv(&[
            "--set-relay-arg=--foo=bar",
            "--change-relay-keystore-path",
            "--set-relay-arg=--foo=baz",
            "--",
            "node",
        ]);
        let (flags, rest) = parse_proxy_flags(&input).unwrap();

        let overrides: Vec<&str> =
            flags.override_relay_args.iter().map(|o| o.as_str()).collect();
        assert_eq!(overrides, ["--foo=bar", "--foo=baz"]);
        assert!(flags.change_relay_keystore);
        assert_eq!(rest, argv(&["node"]).as_slice());
    }

    #[test]
    fn no_flags_is_fine() {
        let parsed = parse(&argv(&["--", "node"])).unwrap();
        assert_eq!(parsed.flags, ProxyFlags::default());
        assert_eq!(parsed.sections.tanssi_args, argv(&["node"]));
    }

    fn unknown_flag(args: &[&str]) -> String {
        match parse(&argv(args)) {
            Err(ProxyError::UnknownFlag(flag)) => flag,
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn unknown_flag_is_reported_as_typed() {
        assert_eq!(unknown_flag(&["--verbose", "--", "node"]), "--verbose");
        assert_eq!(unknown_flag(&["stray", "--", "node"]), "stray");
        assert_eq!(
            unknown_flag(&["--set-relay-arg=--x=1", "-v", "--", "node"]),
            "-v"
        );
    }

    #[test]
    fn help_is_not_a_proxy_flag() {
        assert_eq!(unknown_flag(&["--help", "--", "node"]), "--help");
    }

    #[test]
    fn relay_arg_requires_inline_value() {
        assert_eq!(
            unknown_flag(&["--set-relay-arg", "--foo=bar", "--", "node"]),
            "--set-relay-arg"
        );
    }

    #[test]
    fn keystore_flag_takes_no_value() {
        assert_eq!(
            unknown_flag(&["--change-relay-keystore-path=yes", "--", "node"]),
            "--change-relay-keystore-path=yes"
        );
    }

    #[test]
    fn collects_utf8_arguments() {
        let collected = collect_argv([OsString::from("--"), OsString::from("node")]).unwrap();
        assert_eq!(collected, argv(&["--", "node"]));
    }

    #[test]
    fn non_utf8_argument_is_a_usage_error() {
        use std::os::unix::ffi::OsStringExt;

        let raw = OsString::from_vec(b"--base-path=/tmp/\xff".to_vec());
        let err = collect_argv([OsString::from("--"), raw]).unwrap_err();
        assert!(err.is_usage());
        match err {
            ProxyError::NonUtf8Argument(lossy) => {
                assert_eq!(lossy, "--base-path=/tmp/\u{FFFD}")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn repeated_keystore_flag_is_accepted() {
        let parsed = parse(&argv(&[
            "--change-relay-keystore-path",
            "--change-relay-keystore-path",
            "--",
            "node",
        ]))
        .unwrap();
        assert!(parsed.flags.change_relay_keystore);
    }

    #[test]
    fn flags_after_the_separator_belong_to_the_command() {
        let parsed = parse(&argv(&["--", "node", "--set-relay-arg=--x=1"])).unwrap();
        assert!(parsed.flags.override_relay_args.is_empty());
        assert_eq!(parsed.sections.tanssi_args, argv(&["node", "--set-relay-arg=--x=1"]));
    }

    #[test]
    fn child_args_put_separator_before_relay_args() {
        let sections =
            split_command_sections(&argv(&["node", "x", "--", "--base-path=/tmp"])).unwrap();
        assert_eq!(sections.command(), "node");
        assert_eq!(sections.child_args(), argv(&["x", "--", "--base-path=/tmp"]));

        let bare = split_command_sections(&argv(&["node"])).unwrap();
        assert_eq!(bare.child_args(), argv(&["--"]));
    }
}
