//! Transposition table for caching search results.
//!
//! Uses Zobrist hashes to store and retrieve position evaluations,
//! enabling significant search tree pruning. The table is lock-free:
//! each cluster slot is a single `AtomicU64` word, so `probe`/`store`
//! take `&self` and the table can be shared across Lazy-SMP worker
//! threads behind an `Arc` without any locking.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::board::Move;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoundType {
    Exact,      // Score is the exact value
    LowerBound, // Score is at least this value (failed low - score <= alpha)
    UpperBound, // Score is at most this value (failed high - score >= beta)
}

impl BoundType {
    const fn to_bits(self) -> u64 {
        match self {
            BoundType::Exact => 0,
            BoundType::LowerBound => 1,
            BoundType::UpperBound => 2,
        }
    }

    const fn from_bits(bits: u64) -> Self {
        match bits & 0b11 {
            0 => BoundType::Exact,
            1 => BoundType::LowerBound,
            _ => BoundType::UpperBound,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct TTEntry {
    depth: u32,
    score: i32,
    bound_type: BoundType,
    best_move: Option<Move>,
    generation: u16,
}

impl TTEntry {
    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn bound_type(&self) -> BoundType {
        self.bound_type
    }

    pub fn best_move(&self) -> Option<Move> {
        self.best_move
    }
}

/// Number of entries per cluster. Probing and replacement scan the whole
/// cluster, trading a bit of memory for fewer collisions than a single slot.
const CLUSTER_SIZE: usize = 3;

/// Pack an entry into a single 64-bit word:
/// bits  0-15: key fragment (verifies we found the right position)
/// bits 16-31: best move (0 = none)
/// bits 32-47: score (as i16 bit pattern)
/// bits 48-55: depth
/// bits 56-57: bound type
/// bits 58-63: generation (mod 64, for aging)
fn pack(key16: u16, best_move: Option<Move>, score: i32, depth: u32, bound: BoundType, generation: u16) -> u64 {
    let mv_bits = best_move.map_or(0u16, Move::as_u16) as u64;
    let score_bits = (score as i16 as u16) as u64;
    let depth_bits = u64::from(depth.min(255) as u8);
    let gen_bits = u64::from(generation & 0x3F);

    u64::from(key16)
        | (mv_bits << 16)
        | (score_bits << 32)
        | (depth_bits << 48)
        | (bound.to_bits() << 56)
        | (gen_bits << 58)
}

fn unpack_key(word: u64) -> u16 {
    word as u16
}

fn unpack_entry(word: u64) -> TTEntry {
    let mv_bits = ((word >> 16) & 0xFFFF) as u16;
    let best_move = if mv_bits == 0 { None } else { Some(Move::from_u16(mv_bits)) };
    let score = (((word >> 32) & 0xFFFF) as u16) as i16 as i32;
    let depth = ((word >> 48) & 0xFF) as u32;
    let bound_type = BoundType::from_bits((word >> 56) & 0x3);
    let generation = ((word >> 58) & 0x3F) as u16;

    TTEntry {
        depth,
        score,
        bound_type,
        best_move,
        generation,
    }
}

type Cluster = [AtomicU64; CLUSTER_SIZE];

pub struct TranspositionTable {
    clusters: Vec<Cluster>,
    mask: usize, // To wrap index around using bitwise AND (table size must be power of 2)
    occupied: AtomicU64,
}

impl TranspositionTable {
    // size_mb: Desired size in Megabytes
    #[must_use]
    pub fn new(size_mb: usize) -> Self {
        let cluster_size = std::mem::size_of::<Cluster>();
        let mut num_clusters = (size_mb * 1024 * 1024) / cluster_size;

        // Ensure num_clusters is a power of 2 for efficient indexing
        num_clusters = num_clusters.next_power_of_two() / 2;
        if num_clusters == 0 {
            num_clusters = 1024;
        }

        let mut clusters = Vec::with_capacity(num_clusters);
        clusters.resize_with(num_clusters, || {
            [AtomicU64::new(0), AtomicU64::new(0), AtomicU64::new(0)]
        });

        TranspositionTable {
            clusters,
            mask: num_clusters - 1,
            occupied: AtomicU64::new(0),
        }
    }

    // Calculate index using the hash and mask
    fn index(&self, hash: u64) -> usize {
        (hash as usize) & self.mask
    }

    // Probe the table for a given hash
    pub(crate) fn probe(&self, hash: u64) -> Option<TTEntry> {
        let key16 = (hash >> 48) as u16;
        let cluster = &self.clusters[self.index(hash)];
        for slot in cluster {
            let word = slot.load(Ordering::Relaxed);
            if word != 0 && unpack_key(word) == key16 {
                return Some(unpack_entry(word));
            }
        }
        None
    }

    /// Warm the cache line holding `hash`'s cluster ahead of a probe/store.
    #[cfg(target_arch = "x86_64")]
    pub(crate) fn prefetch(&self, hash: u64) {
        use std::arch::x86_64::{_mm_prefetch, _MM_HINT_T0};
        let cluster = &self.clusters[self.index(hash)];
        let ptr = std::ptr::from_ref(cluster).cast::<i8>();
        unsafe {
            _mm_prefetch(ptr, _MM_HINT_T0);
        }
    }

    #[cfg(not(target_arch = "x86_64"))]
    pub(crate) fn prefetch(&self, _hash: u64) {}

    // Store an entry in the table
    pub(crate) fn store(
        &self,
        hash: u64,
        depth: u32,
        score: i32,
        bound_type: BoundType,
        best_move: Option<Move>,
        generation: u16,
    ) {
        let key16 = (hash >> 48) as u16;
        let generation = generation & 0x3F;
        let new_word = pack(key16, best_move, score, depth, bound_type, generation);
        let cluster = &self.clusters[self.index(hash)];

        for slot in cluster {
            let word = slot.load(Ordering::Relaxed);
            if word == 0 || unpack_key(word) == key16 {
                if word == 0 {
                    self.occupied.fetch_add(1, Ordering::Relaxed);
                }
                slot.store(new_word, Ordering::Relaxed);
                return;
            }
        }

        let mut replace_idx = 0;
        let mut worst_priority = i32::MAX;
        for (idx, slot) in cluster.iter().enumerate() {
            let entry = unpack_entry(slot.load(Ordering::Relaxed));
            let age = generation.wrapping_sub(entry.generation) & 0x3F;
            let priority = entry.depth.saturating_mul(2) as i32 - i32::from(age);
            if idx == 0 || priority < worst_priority {
                worst_priority = priority;
                replace_idx = idx;
            }
        }

        cluster[replace_idx].store(new_word, Ordering::Relaxed);
    }

    #[must_use]
    pub fn hashfull_per_mille(&self) -> u32 {
        let total_slots = (self.clusters.len() * CLUSTER_SIZE) as u64;
        if total_slots == 0 {
            return 0;
        }
        let occupied = self.occupied.load(Ordering::Relaxed);
        ((occupied * 1000) / total_slots) as u32
    }
}
