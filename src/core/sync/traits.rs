/*!
 * Synchronization Traits
 *
 * The construction contract shared by every primitive: a handle is a region
 * plus a byte offset, and any agent holding the region can attach its own
 * handle to the same control words.
 */

use super::codec::{decode, encode, PrimitiveKind};
use super::region::SharedRegion;
use super::spinwait::SpinWait;
use super::word::AtomicWord;
use crate::core::errors::SyncResult;
use crate::core::limits::WORD_SIZE;
use std::sync::atomic::Ordering;

/// A primitive whose state lives entirely in a `SharedRegion`
///
/// Implementations must be:
/// - **Stateless**: all mutable state lives in the region
/// - **Aliasable**: any number of handles may attach to the same words
/// - **Validated**: `attach` rejects regions that do not hold this kind
pub trait SharedPrimitive: Sized + Clone + Send + Sync {
    /// Kind encoded in the control word
    const KIND: PrimitiveKind;

    /// Bytes occupied in the region
    const SIZE: usize = Self::KIND.word_count() * WORD_SIZE;

    /// Attach to the primitive at `byte_offset` of `region`
    ///
    /// A zeroed span is claimed and initialized with the primitive's default
    /// state.
    fn attach(region: &SharedRegion, byte_offset: usize) -> SyncResult<Self>;

    /// Region holding the control words
    fn buffer(&self) -> &SharedRegion;

    /// Byte offset of the control word in the region
    fn byte_offset(&self) -> usize;

    /// Bytes occupied in the region
    fn byte_len(&self) -> usize {
        Self::SIZE
    }
}

/// Validate the span for `kind` and return its control word
pub(crate) fn locate(
    region: &SharedRegion,
    byte_offset: usize,
    kind: PrimitiveKind,
) -> SyncResult<AtomicWord> {
    region.check_span(byte_offset, kind.word_count())?;
    Ok(AtomicWord::new_unchecked(
        region.clone(),
        byte_offset / WORD_SIZE,
    ))
}

/// Claim a zero single-word primitive with `initial`, then validate it
pub(crate) fn claim(word: &AtomicWord, kind: PrimitiveKind, initial: u32) -> SyncResult<u16> {
    let _ = word.compare_exchange(0, initial);
    decode(kind, word.load(Ordering::Acquire))
}

/// Outcome of claiming a multi-word primitive
pub(crate) enum Claim {
    /// The span was zero; the caller now owns initialization
    Fresh,
    /// Another agent initialized it; carries the current state
    Existing(u16),
}

/// Claim a multi-word primitive's control word
///
/// The winner sees `Claim::Fresh` with the word parked at `initializing` and
/// must write the remaining words before publishing a real state. Everyone
/// else spins until that happens.
pub(crate) fn claim_multi(
    word: &AtomicWord,
    kind: PrimitiveKind,
    initializing: u16,
) -> SyncResult<Claim> {
    if word.compare_exchange(0, encode(kind, initializing)).is_ok() {
        return Ok(Claim::Fresh);
    }

    let mut spin = SpinWait::new();
    loop {
        let state = decode(kind, word.load(Ordering::Acquire))?;
        if state != initializing {
            return Ok(Claim::Existing(state));
        }
        spin.spin_once();
    }
}
