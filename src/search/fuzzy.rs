//! Bitap approximate substring matching.
//!
//! Shift-and with Wu-Manber error levels: for each allowed error count `d`
//! a bit mask tracks which pattern prefixes end at the current text position
//! with at most `d` edits. The score of a pattern against a text is the
//! fewest edits needed to find it anywhere in the text, divided by the
//! pattern length, so `0.0` is an exact substring and `1.0` is no match at
//! all. Position in the text does not affect the score.

use std::collections::HashMap;

/// Longest pattern handled in one pass; longer patterns are split.
pub const MAX_CHUNK_LEN: usize = 32;

/// A lowercased query compiled into one or more bitap chunks.
#[derive(Debug, Clone)]
pub struct FuzzyPattern {
    chunks: Vec<Chunk>,
}

#[derive(Debug, Clone)]
struct Chunk {
    len: usize,
    masks: HashMap<char, u64>,
}

impl Chunk {
    fn new(chars: &[char]) -> Self {
        let mut masks = HashMap::new();
        for (i, c) in chars.iter().enumerate() {
            *masks.entry(*c).or_insert(0u64) |= 1 << i;
        }
        Self {
            len: chars.len(),
            masks,
        }
    }

    /// Fewest edits (insert, delete, substitute) that place this chunk
    /// somewhere in `text`.
    fn errors(&self, text: &[char]) -> usize {
        let goal = 1u64 << (self.len - 1);
        // With `len` errors every pattern char can be deleted.
        let mut best = self.len;
        let mut levels: Vec<u64> = (0..=self.len).map(|d| (1u64 << d) - 1).collect();

        for c in text {
            let mask = self.masks.get(c).copied().unwrap_or(0);

            let mut prev_old = levels[0];
            levels[0] = ((levels[0] << 1) | 1) & mask;
            if levels[0] & goal != 0 {
                return 0;
            }

            for d in 1..best {
                let old = levels[d];
                levels[d] = (((old << 1) | 1) & mask)
                    | prev_old
                    | (prev_old << 1)
                    | (levels[d - 1] << 1)
                    | 1;
                prev_old = old;
                if levels[d] & goal != 0 {
                    best = d;
                    break;
                }
            }
        }
        best
    }
}

impl FuzzyPattern {
    /// Compile `pattern`. Returns `None` for a blank pattern.
    pub fn new(pattern: &str) -> Option<Self> {
        let chars: Vec<char> = pattern.trim().to_lowercase().chars().collect();
        if chars.is_empty() {
            return None;
        }
        let chunks = chars.chunks(MAX_CHUNK_LEN).map(Chunk::new).collect();
        Some(Self { chunks })
    }

    /// Score in `[0.0, 1.0]`; chunk scores are averaged.
    pub fn score(&self, text: &str) -> f64 {
        let text: Vec<char> = text.to_lowercase().chars().collect();
        let total: f64 = self
            .chunks
            .iter()
            .map(|chunk| chunk.errors(&text) as f64 / chunk.len as f64)
            .sum();
        total / self.chunks.len() as f64
    }
}
