//! Step-wise vehicle motion with cooperative cancellation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::types::{Path, Position};

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Lazy sequence of positions along a path.
///
/// The token is checked before every step, so a cancellation stops the trail
/// within one step. Once interrupted the trail stays finished; start a new
/// `MotionTrail` to move again.
#[derive(Debug, Clone)]
pub struct MotionTrail {
    path: Path,
    emitted: usize,
    interrupted: bool,
    cancel: CancellationToken,
}

impl MotionTrail {
    pub fn new(path: Path, cancel: CancellationToken) -> Self {
        Self {
            path,
            emitted: 0,
            interrupted: false,
            cancel,
        }
    }

    /// Positions emitted so far, for trail rendering
    pub fn trail(&self) -> &[Position] {
        &self.path[..self.emitted]
    }

    pub fn path(&self) -> &[Position] {
        &self.path
    }

    /// Last emitted position
    pub fn current(&self) -> Option<Position> {
        self.trail().last().copied()
    }

    pub fn remaining(&self) -> usize {
        self.path.len() - self.emitted
    }

    pub fn is_complete(&self) -> bool {
        self.emitted == self.path.len()
    }

    pub fn was_interrupted(&self) -> bool {
        self.interrupted
    }
}

impl Iterator for MotionTrail {
    type Item = Position;

    fn next(&mut self) -> Option<Position> {
        if self.interrupted || self.is_complete() {
            return None;
        }
        if self.cancel.is_cancelled() {
            self.interrupted = true;
            return None;
        }

        let position = self.path[self.emitted];
        self.emitted += 1;
        Some(position)
    }
}
