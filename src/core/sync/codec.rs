/*!
 * Handle Codec
 *
 * Packs a type tag and a state ordinal into one control word.
 *
 * Shared memory carries no type information, so every control word encodes
 * which kind of primitive owns it: a single tag bit in the high half and the
 * state ordinal in the low half. Attaching to a region decodes the word and
 * rejects anything whose tag or state does not belong to the expected kind.
 */

use crate::core::errors::{SyncError, SyncResult};
use crate::core::limits::{STATE_MASK, TAG_MASK, TAG_SHIFT};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kinds of primitive that can own a control word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveKind {
    ManualResetEvent,
    AutoResetEvent,
    Mutex,
    ConditionVariable,
    Semaphore,
    CountdownEvent,
}

impl PrimitiveKind {
    /// All kinds, in tag order
    pub const ALL: [PrimitiveKind; 6] = [
        PrimitiveKind::ManualResetEvent,
        PrimitiveKind::AutoResetEvent,
        PrimitiveKind::Mutex,
        PrimitiveKind::ConditionVariable,
        PrimitiveKind::Semaphore,
        PrimitiveKind::CountdownEvent,
    ];

    /// Tag bit identifying this kind
    #[inline]
    pub const fn tag(self) -> u32 {
        let bit = match self {
            PrimitiveKind::ManualResetEvent => 0,
            PrimitiveKind::AutoResetEvent => 1,
            PrimitiveKind::Mutex => 2,
            PrimitiveKind::ConditionVariable => 3,
            PrimitiveKind::Semaphore => 4,
            PrimitiveKind::CountdownEvent => 5,
        };
        1 << (TAG_SHIFT + bit)
    }

    /// Number of consecutive 32-bit words the primitive occupies
    #[inline]
    pub const fn word_count(self) -> usize {
        match self {
            PrimitiveKind::Semaphore => 4,
            PrimitiveKind::CountdownEvent => 3,
            _ => 1,
        }
    }

    /// Whether `state` is one of this kind's declared states
    #[inline]
    pub const fn accepts_state(self, state: u32) -> bool {
        match self {
            // Mutex: unlocked, locked, contended
            PrimitiveKind::Mutex => state <= 2,
            // Generation counter, every value is legal
            PrimitiveKind::ConditionVariable => state <= STATE_MASK,
            // Ready, initializing
            PrimitiveKind::Semaphore => state <= 1,
            // Nonsignaled, signaled, initializing
            PrimitiveKind::CountdownEvent => state <= 2,
            // Nonsignaled, signaled, notifying
            PrimitiveKind::AutoResetEvent => state <= 2,
            // Nonsignaled, signaled
            PrimitiveKind::ManualResetEvent => state <= 1,
        }
    }

    /// Look up the kind owning a tag, if any
    pub fn from_tag(tag: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrimitiveKind::ManualResetEvent => "ManualResetEvent",
            PrimitiveKind::AutoResetEvent => "AutoResetEvent",
            PrimitiveKind::Mutex => "Mutex",
            PrimitiveKind::ConditionVariable => "ConditionVariable",
            PrimitiveKind::Semaphore => "Semaphore",
            PrimitiveKind::CountdownEvent => "CountdownEvent",
        };
        f.write_str(name)
    }
}

/// Encode `kind`'s tag and a state ordinal into one word
#[inline]
pub const fn encode(kind: PrimitiveKind, state: u16) -> u32 {
    kind.tag() | state as u32
}

/// Return the state ordinal of `word` if it belongs to `kind`
pub fn decode(kind: PrimitiveKind, word: u32) -> SyncResult<u16> {
    let state = word & STATE_MASK;
    if word & TAG_MASK != kind.tag() || !kind.accepts_state(state) {
        tracing::warn!(expected = %kind, word, "rejected control word");
        return Err(SyncError::InvalidHandle {
            expected: kind,
            word,
        });
    }
    Ok(state as u16)
}

/// Identify which kind of primitive a word belongs to, if any
pub fn identify(word: u32) -> Option<PrimitiveKind> {
    PrimitiveKind::from_tag(word & TAG_MASK)
        .filter(|kind| kind.accepts_state(word & STATE_MASK))
}
