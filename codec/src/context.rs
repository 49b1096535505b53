// SPDX-License-Identifier: MPL-2.0

//! Ambient configuration threaded through every encode/decode call.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::{refs::RefTable, resolver::Resolver, source::Source, Error};

/// Default ceiling on a single message, in bytes. 0 would mean "no limit";
/// this crate always ships a real ceiling so a malformed length prefix can
/// never drive an unbounded allocation.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 64 * 1024 * 1024;
/// Default ceiling on a decoded string's byte length.
pub const DEFAULT_MAX_STRING_LENGTH: usize = 8 * 1024 * 1024;
/// Default ceiling on a decoded array/slice/map element count.
pub const DEFAULT_MAX_ARRAY_LENGTH: usize = 1 << 20;
/// Default ceiling on decode recursion depth.
pub const DEFAULT_MAX_NESTING_DEPTH: u64 = 200;

/// A lease on recursion depth. Decrements the gauge on drop, including on a
/// panicking unwind, so a failed decode never leaves the gauge stuck.
#[derive(Debug)]
pub struct DepthLock<'a> {
    gauge: &'a DepthGauge,
}

impl Drop for DepthLock<'_> {
    fn drop(&mut self) {
        self.gauge.current.fetch_sub(1, Ordering::Release);
    }
}

impl<'a> DepthLock<'a> {
    /// Take a depth lease, failing if the gauge is already at its ceiling.
    pub fn obtain(gauge: &'a DepthGauge) -> Result<Self, Error> {
        let previous = gauge.current.fetch_add(1, Ordering::Acquire);
        if previous >= gauge.max {
            gauge.current.fetch_sub(1, Ordering::Release);
            Err(Error::malformed(
                "decode aborted: maximum nesting depth reached",
            ))
        } else {
            Ok(Self { gauge })
        }
    }
}

/// Bounds recursion depth during decode of compound/recursive values.
///
/// Grounded directly on this crate's pre-existing depth-guard idiom: a single
/// atomic counter, incremented on entry and decremented on drop of the lease.
#[derive(Debug)]
pub struct DepthGauge {
    max: u64,
    current: AtomicU64,
}

impl Clone for DepthGauge {
    fn clone(&self) -> Self {
        Self::new(self.max)
    }
}

impl Default for DepthGauge {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_NESTING_DEPTH)
    }
}

impl DepthGauge {
    /// Create a gauge with the given ceiling.
    pub fn new(max: u64) -> Self {
        Self {
            max,
            current: AtomicU64::new(0),
        }
    }

    /// The configured ceiling.
    pub fn max_depth(&self) -> u64 {
        self.max
    }
}

/// Decoding/encoding configuration knobs (§6 of the design). Cheap to clone;
/// carried by value inside [`Context`].
#[derive(Clone, Debug)]
pub struct DecodingOptions {
    /// Whether the resolver and struct codecs reject loose-half-only type
    /// matches. `true` is strict, `false` is loose.
    pub strict_typing: bool,
    /// Upper bound on a whole message, in bytes.
    pub max_message_size: usize,
    /// Upper bound on a decoded string, in bytes.
    pub max_string_length: usize,
    /// Upper bound on a decoded array/slice/map element count.
    pub max_array_length: usize,
    /// Recursion depth ceiling, shared across one decode call.
    pub depth_gauge: DepthGauge,
}

impl Default for DecodingOptions {
    fn default() -> Self {
        Self {
            strict_typing: true,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            max_string_length: DEFAULT_MAX_STRING_LENGTH,
            max_array_length: DEFAULT_MAX_ARRAY_LENGTH,
            depth_gauge: DepthGauge::default(),
        }
    }
}

impl DecodingOptions {
    /// Options suitable for tests: small ceilings, shallow depth, so that a
    /// runaway malformed decode fails fast instead of allocating heavily.
    pub fn test() -> Self {
        Self {
            strict_typing: true,
            max_string_length: 4096,
            max_array_length: 4096,
            depth_gauge: DepthGauge::new(32),
            ..Default::default()
        }
    }

    /// Loose-typed variant of [`Self::default`], for interop tests.
    pub fn loose() -> Self {
        Self {
            strict_typing: false,
            ..Default::default()
        }
    }

    /// Take a recursion-depth lease for the duration of one nested decode.
    pub fn depth_lock(&self) -> Result<DepthLock<'_>, Error> {
        DepthLock::obtain(&self.depth_gauge)
    }
}

/// Owning counterpart of [`Context`]: holds the backing [`Resolver`] and
/// [`Source`] by value so a caller can construct one once and borrow a
/// [`Context`] from it for every subsequent call.
///
/// Grounded directly on this crate's existing `Context`/`ContextOwned` split:
/// the owned half holds real collections, the borrowed half is what gets
/// threaded through every codec call.
pub struct ContextOwned {
    options: DecodingOptions,
    resolver: Resolver,
    source: Source,
}

impl ContextOwned {
    /// Build a new owned context from its parts.
    pub fn new(options: DecodingOptions, resolver: Resolver, source: Source) -> Self {
        Self {
            options,
            resolver,
            source,
        }
    }

    /// Borrow a [`Context`] referencing this owned state, scoped to a
    /// caller-supplied reference table for one top-level encode/decode
    /// operation. The table is intentionally not owned here: §3's lifecycle
    /// rule is that `P` is allocated at the top of one call and discarded
    /// at the end, while the rest of a [`ContextOwned`] outlives many calls.
    pub fn context<'a>(&'a self, ref_table: &'a RefTable) -> Context<'a> {
        Context {
            options: &self.options,
            resolver: &self.resolver,
            source: &self.source,
            ref_table,
        }
    }

    /// The backing resolver.
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// The backing source.
    pub fn source(&self) -> &Source {
        &self.source
    }
}

/// Borrowed bundle of configuration, resolver, and source passed into every
/// encode/decode call. Cheap to copy (three references).
#[derive(Clone, Copy)]
pub struct Context<'a> {
    options: &'a DecodingOptions,
    resolver: &'a Resolver,
    source: &'a Source,
    ref_table: &'a RefTable,
}

impl<'a> Context<'a> {
    /// Build a context from borrowed parts directly, without an owning
    /// shell, and without a caller-supplied reference table (a fresh, empty
    /// one is leaked for the duration of the process — fine for leaf-only
    /// tests and one-off calls that never touch a reference-kind field; a
    /// real top-level façade call always supplies its own table via
    /// [`Self::with_ref_table`] instead).
    pub fn new(options: &'a DecodingOptions, resolver: &'a Resolver, source: &'a Source) -> Self {
        Self::with_ref_table(options, resolver, source, leaked_ref_table())
    }

    /// Build a context from borrowed parts including an explicit reference
    /// table, scoped to one top-level encode/decode operation. This is what
    /// [`super::facade::Encoder`]/[`super::facade::Decoder`] use.
    pub fn with_ref_table(
        options: &'a DecodingOptions,
        resolver: &'a Resolver,
        source: &'a Source,
        ref_table: &'a RefTable,
    ) -> Self {
        Self {
            options,
            resolver,
            source,
            ref_table,
        }
    }

    /// The active decoding options.
    pub fn options(&self) -> &'a DecodingOptions {
        self.options
    }

    /// The active type resolver.
    pub fn resolver(&self) -> &'a Resolver {
        self.resolver
    }

    /// The active codec source.
    pub fn source(&self) -> &'a Source {
        self.source
    }

    /// The reference table for the current top-level operation.
    pub fn ref_table(&self) -> &'a RefTable {
        self.ref_table
    }
}

/// Leak a fresh, empty [`RefTable`] to get a `'static` (and therefore any
/// `'a`) reference to it. Only used by [`Context::new`]'s leaf-test-only
/// convenience path; real operations always thread a stack-allocated table
/// in through [`Context::with_ref_table`], which leaks nothing.
fn leaked_ref_table<'a>() -> &'a RefTable {
    Box::leak(Box::new(RefTable::new()))
}
