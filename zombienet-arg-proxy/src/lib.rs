//! Zombienet argument proxy
//!
//! Zombienet starts every collator with a single command line. Tanssi
//! collators embed a relay-chain node whose arguments follow a second `--`,
//! and some tests need those relay arguments changed in ways the network
//! config cannot express. This crate sits in between: zombienet launches the
//! proxy, the proxy rewrites the relay arguments and launches the collator.
//!
//! ## Usage
//!
//! ```bash
//! zombienet-arg-proxy \
//!     --change-relay-keystore-path \
//!     --set-relay-arg=--pool-limit=100 \
//!     -- tanssi-node --collator -- --base-path=/data/relay-data
//! ```
//!
//! launches
//!
//! ```bash
//! tanssi-node --collator -- --base-path=/data/relay-data \
//!     --keystore-path=/data/relay-data/tmp_keystore_zombie_test --pool-limit=100
//! ```
//!
//! ## Pipeline
//!
//! 1. [`args::parse`] splits the command line into proxy flags, the collator
//!    command and the relay arguments.
//! 2. [`overrides::rewrite_relay_args`] relocates the keystore (if asked to)
//!    and applies each `--set-relay-arg` in order.
//! 3. [`supervisor::launch`] spawns the collator with inherited stdio and
//!    [`supervisor::supervise`] waits for it, forwarding SIGINT, SIGTERM and
//!    SIGHUP.
//!
//! The proxy exits with the collator's exit code, `1` if the collator was
//! killed by a signal or anything went wrong before it started, and `0`
//! after handing a shutdown signal on.

pub mod args;
pub mod error;
pub mod logging;
pub mod overrides;
pub mod supervisor;

pub use args::USAGE;
pub use error::ProxyError;

use tracing::debug;

use crate::args::ParsedInvocation;
use crate::supervisor::ShutdownSignals;

/// Runs the whole proxy and returns the exit code to terminate with.
pub async fn run(argv: &[String]) -> Result<i32, ProxyError> {
    let ParsedInvocation {
        flags,
        mut sections,
    } = args::parse(argv)?;
    overrides::rewrite_relay_args(&flags, &mut sections.polkadot_args)?;
    debug!(?flags, relay_args = ?sections.polkadot_args, "relay arguments rewritten");

    let mut signals = ShutdownSignals::install()?;
    let mut child = supervisor::launch(&sections)?;
    let termination = supervisor::supervise(&mut child, signals.recv()).await?;
    Ok(termination.exit_code())
}
