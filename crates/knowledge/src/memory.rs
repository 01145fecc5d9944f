//! Bounded conversation memory.
//!
//! A sliding window of past (question, answer) turns, oldest evicted first.
//! Not persisted across process restarts.

use crate::types::ConversationTurn;
use std::collections::VecDeque;

/// Default window size in turns.
pub const DEFAULT_WINDOW: usize = 5;

/// Bounded sliding window over conversation turns.
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    window: usize,
    turns: VecDeque<ConversationTurn>,
}

impl ConversationMemory {
    /// Create a memory holding at most `window` turns.
    pub fn new(window: usize) -> Self {
        Self {
            window,
            turns: VecDeque::with_capacity(window),
        }
    }

    /// Record one turn, evicting the oldest beyond the window.
    pub fn append(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.turns.push_back(ConversationTurn {
            question: question.into(),
            answer: answer.into(),
        });

        while self.turns.len() > self.window {
            self.turns.pop_front();
        }
    }

    /// Turns in chronological order.
    pub fn history(&self) -> impl Iterator<Item = &ConversationTurn> {
        self.turns.iter()
    }

    /// Forget all turns.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Configured window size.
    pub fn window(&self) -> usize {
        self.window
    }
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}
