//! CLI subcommand implementations for the `llhls` binary.
//!
//! - [`fetch`] - download one chunk through a registered transport
//! - [`protocols`] - list registered schemes

pub mod fetch;

#[doc(inline)]
pub use fetch::{fetch, fetch_to_file, FetchSummary};

use std::io::Write;

use anyhow::Result;

use crate::registry::ProtocolRegistry;

/// Print one registered scheme per line, with its capability flags.
pub fn protocols(registry: &ProtocolRegistry, out: &mut dyn Write) -> Result<()> {
    for name in registry.names() {
        let Some(entry) = registry.lookup(name) else {
            continue;
        };
        let mut flags = Vec::new();
        if entry.flags.network {
            flags.push("network");
        }
        if entry.flags.nonblocking {
            flags.push("nonblocking");
        }
        writeln!(out, "{name}\t{}", flags.join(","))?;
    }
    Ok(())
}
