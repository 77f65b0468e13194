//! The static table of which commands are cacheable and which of their
//! arguments name server-side keys.
//!
//! This is the one piece of the command catalogue the cache owns outright:
//! the authoritative list of read-only commands lives with the database
//! client, but nothing else supplies this lookup, so it lives here.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Which positional arguments of a command name server-side keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPositions {
    /// No arguments are keys (e.g. a command with no key-bearing form).
    None,
    /// A fixed set of 0-indexed positional argument slots are keys.
    Fixed(&'static [usize]),
    /// Every positional argument is a key (e.g. `MGET key [key ...]`).
    AllArgs,
}

/// One row of the command catalogue.
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    /// Whether the command's replies are safe to cache.
    pub cacheable: bool,
    /// Which arguments are server-side keys, for building `touched_keys`.
    pub key_positions: KeyPositions,
    /// Whether a successful reply to this command should flush the whole cache.
    pub is_flush: bool,
}

impl CommandSpec {
    const fn cacheable_fixed(positions: &'static [usize]) -> Self {
        Self {
            cacheable: true,
            key_positions: KeyPositions::Fixed(positions),
            is_flush: false,
        }
    }

    const fn cacheable_all_args() -> Self {
        Self {
            cacheable: true,
            key_positions: KeyPositions::AllArgs,
            is_flush: false,
        }
    }

    const fn not_cacheable() -> Self {
        Self {
            cacheable: false,
            key_positions: KeyPositions::None,
            is_flush: false,
        }
    }

    const fn flush() -> Self {
        Self {
            cacheable: false,
            key_positions: KeyPositions::None,
            is_flush: true,
        }
    }
}

static CATALOGUE: Lazy<HashMap<&'static str, CommandSpec>> = Lazy::new(|| {
    let mut table = HashMap::new();

    table.insert("GET", CommandSpec::cacheable_fixed(&[0]));
    table.insert("MGET", CommandSpec::cacheable_all_args());
    table.insert("HGET", CommandSpec::cacheable_fixed(&[0]));
    table.insert("HMGET", CommandSpec::cacheable_fixed(&[0]));
    table.insert("HGETALL", CommandSpec::cacheable_fixed(&[0]));
    table.insert("SMEMBERS", CommandSpec::cacheable_fixed(&[0]));
    table.insert("ZRANGE", CommandSpec::cacheable_fixed(&[0]));
    table.insert("LRANGE", CommandSpec::cacheable_fixed(&[0]));
    table.insert("EXISTS", CommandSpec::cacheable_all_args());
    table.insert("STRLEN", CommandSpec::cacheable_fixed(&[0]));

    // Nondeterministic readers: read-only, but two calls can disagree, so
    // they must never be served from cache.
    table.insert("HRANDFIELD", CommandSpec::not_cacheable());
    table.insert("SRANDMEMBER", CommandSpec::not_cacheable());
    table.insert("RANDOMKEY", CommandSpec::not_cacheable());

    table.insert("FLUSHDB", CommandSpec::flush());
    table.insert("FLUSHALL", CommandSpec::flush());

    table
});

/// Looks up the catalogue entry for a command name.
///
/// `name` must already be uppercased; commands absent from the table
/// default to non-cacheable.
pub fn lookup(name: &str) -> CommandSpec {
    CATALOGUE.get(name).copied().unwrap_or_else(CommandSpec::not_cacheable)
}

/// Whether `name` is a flush command (`FLUSHDB`/`FLUSHALL`).
pub fn is_flush_command(name: &str) -> bool {
    lookup(name).is_flush
}

/// Extracts the `DatabaseKey`s a command touches, given its positional
/// arguments, using this command's catalogue entry.
pub fn touched_keys(name: &str, args: &[Vec<u8>]) -> Vec<Vec<u8>> {
    match lookup(name).key_positions {
        KeyPositions::None => Vec::new(),
        KeyPositions::AllArgs => args.to_vec(),
        KeyPositions::Fixed(positions) => positions
            .iter()
            .filter_map(|&pos| args.get(pos).cloned())
            .collect(),
    }
}
