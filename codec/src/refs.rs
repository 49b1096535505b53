// SPDX-License-Identifier: MPL-2.0

//! The Recursive wrapper: the reference table `P` and the `Recursive<T>`
//! codec that owns it at run time (§4.3).
//!
//! Grounded on this crate's `ExtensionObject`'s boxed-dyn-trait indirection
//! for stable-identity storage, and directly on the distilled spec's §4.3
//! run-time protocol. The construction-time "in-progress placeholder" half
//! of Recursive is, for statically-known recursive types, subsumed by
//! Rust's own monomorphized generic trait resolution (see `SPEC_FULL.md`
//! §4.3's Rust-specific translation note) — `Recursive<T>` below only needs
//! to implement the run-time half: detecting a cycle/shared reference and
//! closing it back during decode.

use std::any::TypeId;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::{descriptor::DescriptorRef, Error};

/// Per-operation mapping between addresses and wire indices, used to encode
/// and decode back-references (§4.3). Allocated at the top of one top-level
/// encode/decode call and discarded at the end; never shared across calls.
#[derive(Default)]
pub struct RefTable {
    inner: RefCell<RefTableInner>,
}

/// Identity used to validate that a decoded back-reference points at a
/// compatible local type. Interface/AnyValue slots are dynamically typed, so
/// they carry a real [`DescriptorRef`]; a statically-typed `Pointer<T>` (or
/// `Slice<T>`/`Map<K, V>`) field has no dynamic type to check against and
/// uses the Rust `TypeId` of `T` instead — equally sufficient to catch a
/// back-reference disagreeing with the expected local type (§4.3), without
/// requiring every leaf/compound type to implement [`crate::dynamic::DescribedType`].
#[derive(Clone, PartialEq, Eq)]
enum CellIdentity {
    Descriptor(DescriptorRef),
    TypeId(TypeId),
}

impl std::fmt::Display for CellIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellIdentity::Descriptor(d) => write!(f, "{}", d.name),
            CellIdentity::TypeId(_) => write!(f, "<statically-typed field>"),
        }
    }
}

#[derive(Default)]
struct RefTableInner {
    /// Encode direction: allocation address -> index already assigned to it.
    seen: HashMap<usize, i64>,
    /// Decode direction: index -> the identity and type-erased cell reserved
    /// for it. A cell is inserted *before* its inner value is decoded, so a
    /// self-reference encountered while decoding that inner value can still
    /// resolve back to it.
    cells: Vec<(CellIdentity, Rc<dyn std::any::Any>)>,
}

impl RefTable {
    /// Fresh, empty table for a new top-level operation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode-side lookup. If `addr` was already seen in this operation,
    /// returns its assigned index (the caller should emit that as the
    /// back-reference and stop). Otherwise assigns and records a fresh
    /// index, returning `None` (the caller should emit `-1` then encode the
    /// value in full).
    pub fn encode_seen_or_insert(&self, addr: usize) -> Option<i64> {
        let mut inner = self.inner.borrow_mut();
        if let Some(idx) = inner.seen.get(&addr) {
            return Some(*idx);
        }
        let idx = inner.seen.len() as i64;
        inner.seen.insert(addr, idx);
        None
    }

    /// Decode-side: reserve the next index for a value about to be decoded,
    /// inserting a placeholder cell it can close a self-reference back to.
    /// Returns the reserved index and the placeholder cell; the caller must
    /// fill the cell (via the cell's own interior mutability) once the
    /// inner decode completes.
    pub fn decode_reserve<T: 'static>(&self, descriptor: DescriptorRef) -> (usize, Rc<RefCell<Option<T>>>) {
        self.reserve_with(CellIdentity::Descriptor(descriptor))
    }

    /// Decode-side reservation for a statically-typed field (Pointer/Slice/
    /// Map element) that has no dynamic descriptor of its own — identified
    /// by `T`'s `TypeId` instead (see [`CellIdentity`]).
    pub fn decode_reserve_typed<T: 'static>(&self) -> (usize, Rc<RefCell<Option<T>>>) {
        self.reserve_with(CellIdentity::TypeId(TypeId::of::<T>()))
    }

    fn reserve_with<T: 'static>(&self, identity: CellIdentity) -> (usize, Rc<RefCell<Option<T>>>) {
        let cell: Rc<RefCell<Option<T>>> = Rc::new(RefCell::new(None));
        let mut inner = self.inner.borrow_mut();
        let idx = inner.cells.len();
        inner.cells.push((identity, cell.clone()));
        (idx, cell)
    }

    /// Decode-side: fetch the cell reserved at `index`, verifying its
    /// descriptor matches `expected` (a mismatch is malformed-stream: the
    /// back-reference disagrees with the expected local type).
    pub fn decode_fetch<T: 'static>(
        &self,
        index: usize,
        expected: &DescriptorRef,
    ) -> Result<Rc<RefCell<Option<T>>>, Error> {
        self.fetch_with(index, CellIdentity::Descriptor(expected.clone()))
    }

    /// Statically-typed counterpart of [`Self::decode_fetch`], for
    /// Pointer/Slice/Map fields reserved via [`Self::decode_reserve_typed`].
    pub fn decode_fetch_typed<T: 'static>(&self, index: usize) -> Result<Rc<RefCell<Option<T>>>, Error> {
        self.fetch_with(index, CellIdentity::TypeId(TypeId::of::<T>()))
    }

    fn fetch_with<T: 'static>(
        &self,
        index: usize,
        expected: CellIdentity,
    ) -> Result<Rc<RefCell<Option<T>>>, Error> {
        let inner = self.inner.borrow();
        let Some((identity, cell)) = inner.cells.get(index) else {
            return Err(Error::malformed(format!(
                "back-reference index {index} out of range"
            )));
        };
        if *identity != expected {
            return Err(Error::bad_type(expected.to_string(), identity.to_string()));
        }
        cell.clone()
            .downcast::<RefCell<Option<T>>>()
            .map_err(|_| Error::malformed("back-reference descriptor/type mismatch"))
    }
}

/// The run-time half of the Recursive wrapper: owns (or borrows) the shared
/// reference table `P` and defers construction of its inner value so a
/// self-referential or cyclic value can be decoded.
///
/// The backing storage is `Rc<RefCell<Option<T>>>` rather than a bare `T`
/// precisely so a self-reference discovered mid-decode has something
/// stable to point at before the inner decode has produced a value (the
/// "tie the knot" pattern). Use [`Recursive::get`] once decode has
/// completed; accessing it earlier than that is an internal invariant
/// violation, never something external callers can trigger.
pub struct Recursive<T> {
    cell: Rc<RefCell<Option<T>>>,
}

impl<T> Recursive<T> {
    /// Wrap an already-available value (the common case: encode, or a
    /// freshly constructed value with no cycles).
    pub fn new(value: T) -> Self {
        Self {
            cell: Rc::new(RefCell::new(Some(value))),
        }
    }

    /// Wrap an existing reserved cell (the decode-time cycle-closing case).
    pub fn from_cell(cell: Rc<RefCell<Option<T>>>) -> Self {
        Self { cell }
    }

    /// Stable identity of the backing allocation, used as the reference
    /// table's address key.
    pub fn address(&self) -> usize {
        Rc::as_ptr(&self.cell) as *const () as usize
    }

    /// Number of live handles sharing this allocation.
    pub fn strong_count(&self) -> usize {
        Rc::strong_count(&self.cell)
    }

    /// Fill the cell after decoding the inner value.
    pub fn fill(&self, value: T) {
        *self.cell.borrow_mut() = Some(value);
    }

    /// Borrow the inner value without cloning, for encode. Only ever called
    /// on a filled cell: encode-side `Recursive<T>` values are always built
    /// via [`Self::new`], which fills the cell immediately.
    pub fn borrow(&self) -> std::cell::Ref<'_, Option<T>> {
        self.cell.borrow()
    }
}

impl<T: Clone> Recursive<T> {
    /// Clone the inner value out. Panics if called before the cell has been
    /// filled, which cannot happen through this crate's own codecs (they
    /// always fill a reserved cell before returning it to a caller).
    pub fn get(&self) -> T {
        self.cell
            .borrow()
            .as_ref()
            .cloned()
            .expect("Recursive<T> read before its cell was filled")
    }
}

impl<T> Clone for Recursive<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

/// Run-time back-reference protocol shared by every reference-bearing kind
/// (§4.3): write the address's assigned index if it was already seen in this
/// operation (`index >= 0`, a pure back-reference), otherwise write `-1` and
/// encode the value in full. Used directly by `compound::pointer`, and by
/// any other compound codec whose element type is itself wrapped in
/// [`Recursive`] (e.g. a self-referential map value).
pub fn encode_recursive<T, S>(
    value: &Recursive<T>,
    stream: &mut S,
    ref_table: &RefTable,
    encode_inner: impl FnOnce(&T, &mut S) -> Result<(), Error>,
) -> Result<(), Error>
where
    S: std::io::Write + ?Sized,
{
    let addr = value.address();
    match ref_table.encode_seen_or_insert(addr) {
        Some(idx) => crate::varint::write_varint_signed(stream, idx),
        None => {
            crate::varint::write_varint_signed(stream, -1)?;
            let guard = value.borrow();
            let inner = guard
                .as_ref()
                .expect("Recursive<T> encoded before its cell was filled");
            encode_inner(inner, stream)
        }
    }
}

/// Decode-side counterpart of [`encode_recursive`]: read the back-reference
/// varint, either fetching a previously reserved cell (`index >= 0`) or
/// reserving a fresh one, decoding the inner value into it (under a
/// recursion-depth lease), and returning the assembled [`Recursive<T>`].
pub fn decode_recursive<T, S>(
    stream: &mut S,
    ctx: &crate::context::Context<'_>,
    decode_inner: impl FnOnce(&mut S) -> Result<T, Error>,
) -> Result<Recursive<T>, Error>
where
    T: 'static,
    S: std::io::Read + ?Sized,
{
    let idx = crate::varint::read_varint_signed(stream)?;
    if idx >= 0 {
        let cell = ctx.ref_table().decode_fetch_typed::<T>(idx as usize)?;
        return Ok(Recursive::from_cell(cell));
    }
    if idx != -1 {
        return Err(Error::malformed(format!(
            "invalid back-reference index {idx}"
        )));
    }
    let (_, cell) = ctx.ref_table().decode_reserve_typed::<T>();
    let recursive = Recursive::from_cell(cell);
    let _lease = ctx.options().depth_lock()?;
    let value = decode_inner(stream)?;
    recursive.fill(value);
    Ok(recursive)
}

impl<T: std::fmt::Debug> std::fmt::Debug for Recursive<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recursive").field("cell", &self.cell).finish()
    }
}

impl<T: PartialEq> PartialEq for Recursive<T> {
    fn eq(&self, other: &Self) -> bool {
        *self.cell.borrow() == *other.cell.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Leaf(i32);

    #[test]
    fn ref_table_assigns_stable_indices() {
        let table = RefTable::new();
        let a = 0x1000usize;
        let b = 0x2000usize;
        assert_eq!(table.encode_seen_or_insert(a), None);
        assert_eq!(table.encode_seen_or_insert(b), None);
        assert_eq!(table.encode_seen_or_insert(a), Some(0));
        assert_eq!(table.encode_seen_or_insert(b), Some(1));
    }

    #[test]
    fn decode_reserve_then_fill_closes_self_reference() {
        let table = RefTable::new();
        let descriptor: DescriptorRef = std::sync::Arc::new(crate::descriptor::Descriptor::int32());
        let (idx, cell) = table.decode_reserve::<Leaf>(descriptor.clone());
        let recursive = Recursive::from_cell(cell);
        recursive.fill(Leaf(42));
        let fetched = table.decode_fetch::<Leaf>(idx, &descriptor).unwrap();
        assert_eq!(*fetched.borrow(), Some(Leaf(42)));
    }
}
