// SPDX-License-Identifier: MPL-2.0

//! Stable fingerprints for local type descriptors (the "Type resolver").
//!
//! Grounded on this crate's `DataTypeTree`/`StructTypeInfo` structural
//! registry and on `TypeLoaderCollection`'s priority/fallback matching; here
//! the registry key is a content-derived [`Fingerprint`] rather than a fixed
//! `NodeId`.

use std::sync::RwLock;

use hashbrown::HashMap;

use crate::{descriptor::DescriptorRef, fingerprint::Fingerprint, Error};

#[derive(Default)]
struct ResolverMaps {
    by_descriptor: HashMap<DescriptorRef, Fingerprint>,
    by_fingerprint: HashMap<Fingerprint, DescriptorRef>,
    /// Descriptors observed on the wire but never explicitly registered.
    /// Consulted as a lookup fallback; never authoritative.
    observed: HashMap<Fingerprint, DescriptorRef>,
}

/// Registers descriptors against stable fingerprints and resolves fingerprints
/// back to descriptors on decode.
///
/// Read-mostly: lookups are far more frequent than registrations, which only
/// happen lazily the first time a type is encoded/decoded. Writes are
/// guarded by a lock, matching this crate's existing read-mostly-shared-map
/// idiom for its static type registries.
pub struct Resolver {
    maps: RwLock<ResolverMaps>,
    strict_typing: bool,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Resolver {
    /// Build an empty resolver under the given strict/loose policy.
    pub fn new(strict_typing: bool) -> Self {
        Self {
            maps: RwLock::new(ResolverMaps::default()),
            strict_typing,
        }
    }

    /// Whether this resolver rejects loose-half-only matches.
    pub fn is_strict(&self) -> bool {
        self.strict_typing
    }

    /// Register a descriptor, computing its fingerprint. Registering the
    /// same `(descriptor, fingerprint)` pair twice is an idempotent no-op;
    /// registering a different descriptor under a colliding fingerprint (in
    /// either half) is a hard [`Error::Registration`].
    pub fn register(&self, descriptor: DescriptorRef) -> Result<Fingerprint, Error> {
        let fingerprint = Fingerprint::of(&descriptor);
        let mut maps = self.maps.write().expect("resolver lock poisoned");

        if let Some(existing) = maps.by_fingerprint.get(&fingerprint) {
            if *existing == descriptor {
                return Ok(fingerprint);
            }
            return Err(Error::registration(format!(
                "fingerprint {fingerprint} already registered to a different descriptor \
                 (existing: {:?}, new: {:?})",
                existing.name, descriptor.name
            )));
        }

        if let Some(existing_fp) = maps.by_descriptor.get(&descriptor) {
            if *existing_fp != fingerprint {
                return Err(Error::registration(format!(
                    "descriptor {:?} already registered under a different fingerprint",
                    descriptor.name
                )));
            }
        }

        maps.by_descriptor.insert(descriptor.clone(), fingerprint);
        maps.by_fingerprint.insert(fingerprint, descriptor);
        Ok(fingerprint)
    }

    /// Look up the fingerprint for an already-registered descriptor,
    /// auto-registering it (and logging a non-fatal diagnostic — the
    /// `Error` taxonomy has no variant for this because it is deliberately
    /// not an error; see §7's diagnostic channel) if it has never been seen.
    pub fn fingerprint_of(&self, descriptor: &DescriptorRef) -> Result<Fingerprint, Error> {
        {
            let maps = self.maps.read().expect("resolver lock poisoned");
            if let Some(fp) = maps.by_descriptor.get(descriptor) {
                return Ok(*fp);
            }
        }
        log::warn!(
            "encoding previously-unregistered type {:?}; peers will not be able to decode it \
             unless they register an equivalent descriptor",
            descriptor.name
        );
        self.register(descriptor.clone())
    }

    /// Resolve a fingerprint read off the wire to a local descriptor.
    ///
    /// Lookup order: (a) registered map; (b) observed-but-unregistered map;
    /// (c) the caller-supplied expected descriptor, if its fingerprint
    /// matches; (d) under loose typing, any known descriptor whose loose
    /// half matches (strict half may differ); (e) fail bad-type.
    pub fn resolve(
        &self,
        fingerprint: Fingerprint,
        expected: Option<&DescriptorRef>,
    ) -> Result<DescriptorRef, Error> {
        let maps = self.maps.read().expect("resolver lock poisoned");

        if let Some(d) = maps.by_fingerprint.get(&fingerprint) {
            return Ok(d.clone());
        }
        if let Some(d) = maps.observed.get(&fingerprint) {
            return Ok(d.clone());
        }
        if let Some(expected) = expected {
            if Fingerprint::of(expected) == fingerprint {
                return Ok(expected.clone());
            }
        }
        if !self.strict_typing {
            if let Some((_, d)) = maps
                .by_fingerprint
                .iter()
                .find(|(fp, _)| fp.loose == fingerprint.loose)
            {
                log::warn!(
                    "loose type match: wire fingerprint {fingerprint} has no strict match, \
                     substituting local descriptor {:?}",
                    d.name
                );
                return Ok(d.clone());
            }
        }

        drop(maps);
        log::warn!("observed unregistered type with fingerprint {fingerprint}");
        Err(Error::bad_type(
            expected
                .map(|d| d.name.clone())
                .unwrap_or_else(|| "<none>".to_string()),
            fingerprint,
        ))
    }

    /// Record that a fingerprint was observed on the wire without being
    /// registered, so subsequent lookups of the same fingerprint succeed
    /// (the "observed-but-unregistered" fallback map).
    pub fn note_observed(&self, fingerprint: Fingerprint, descriptor: DescriptorRef) {
        let mut maps = self.maps.write().expect("resolver lock poisoned");
        maps.observed.insert(fingerprint, descriptor);
    }
}
