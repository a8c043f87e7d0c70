//! Memory ramp used to get the process killed for exceeding its memory limit.
//!
//! The ramp runs on its own OS thread and never returns. Every block is a
//! separate allocation whose bytes are written, so resident memory grows
//! by a block per step. All blocks stay in `blocks` for the rest of the
//! process lifetime.

use std::thread;
use std::time::Duration;

use crate::config::{
    MEMORY_BLOCK_BYTES, MEMORY_HOLD_TICK_SECS, MEMORY_PROGRESS_EVERY, MEMORY_PROGRESS_PAUSE_MS,
};

/// Byte written into every allocated block to force the pages resident.
const FILL_BYTE: u8 = 0xA5;

/// How a ramp ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampOutcome {
    /// All requested blocks were allocated
    Completed { blocks: u64 },
    /// The allocator refused a block; `blocks` were allocated before that
    Exhausted { blocks: u64 },
}

/// Allocates and holds `target_blocks` distinct blocks of `block_bytes`.
pub struct MemoryRamp {
    target_blocks: u64,
    block_bytes: usize,
    pause: Duration,
    blocks: Vec<Vec<u8>>,
}

impl MemoryRamp {
    /// Ramp of `target_mb` one-megabyte blocks.
    pub fn new(target_mb: u64) -> Self {
        Self::with_block_size(
            target_mb,
            MEMORY_BLOCK_BYTES,
            Duration::from_millis(MEMORY_PROGRESS_PAUSE_MS),
        )
    }

    pub fn with_block_size(target_blocks: u64, block_bytes: usize, pause: Duration) -> Self {
        Self {
            target_blocks,
            block_bytes,
            pause,
            blocks: Vec::new(),
        }
    }

    /// Bytes currently held.
    pub fn held_bytes(&self) -> usize {
        self.blocks.iter().map(Vec::len).sum()
    }

    /// Allocate blocks until the target is reached or the allocator refuses.
    pub fn fill(&mut self) -> RampOutcome {
        for i in 0..self.target_blocks {
            let Some(block) = allocate_block(self.block_bytes) else {
                return RampOutcome::Exhausted {
                    blocks: self.blocks.len() as u64,
                };
            };
            if self.blocks.try_reserve(1).is_err() {
                return RampOutcome::Exhausted {
                    blocks: self.blocks.len() as u64,
                };
            }
            self.blocks.push(block);

            if i % MEMORY_PROGRESS_EVERY == 0 && i > 0 {
                tracing::info!(allocated_mb = i, "Memory ramp progress");
                thread::sleep(self.pause);
            }
        }

        RampOutcome::Completed {
            blocks: self.blocks.len() as u64,
        }
    }

    /// Fill, then keep the blocks alive forever.
    pub fn run(mut self) -> ! {
        tracing::info!(target_mb = self.target_blocks, "Starting memory ramp");

        match self.fill() {
            RampOutcome::Completed { blocks } => {
                tracing::info!(allocated_mb = blocks, "Memory ramp done, holding memory");
            }
            RampOutcome::Exhausted { blocks } => {
                tracing::warn!(
                    allocated_mb = blocks,
                    "Allocation failed before the memory limit kill, holding what was allocated"
                );
            }
        }

        loop {
            thread::sleep(Duration::from_secs(MEMORY_HOLD_TICK_SECS));
        }
    }
}

fn allocate_block(len: usize) -> Option<Vec<u8>> {
    let mut block = Vec::new();
    block.try_reserve_exact(len).ok()?;
    block.resize(len, FILL_BYTE);
    Some(block)
}

/// Start the ramp on a dedicated thread when `target_mb` is non-zero.
pub fn spawn_ramp(target_mb: u64) -> std::io::Result<()> {
    if target_mb == 0 {
        return Ok(());
    }

    thread::Builder::new()
        .name("memory-ramp".to_string())
        .spawn(move || MemoryRamp::new(target_mb).run())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_fill_reaches_target() {
        let mut ramp = MemoryRamp::with_block_size(25, 4096, Duration::ZERO);
        assert_eq!(ramp.fill(), RampOutcome::Completed { blocks: 25 });
        assert_eq!(ramp.held_bytes(), 25 * 4096);
    }

    #[test]
    fn test_blocks_are_distinct_and_written() {
        let mut ramp = MemoryRamp::with_block_size(3, 64, Duration::ZERO);
        ramp.fill();
        let ptrs: Vec<*const u8> = ramp.blocks.iter().map(|b| b.as_ptr()).collect();
        assert_ne!(ptrs[0], ptrs[1]);
        assert_ne!(ptrs[1], ptrs[2]);
        assert!(ramp.blocks.iter().all(|b| b.iter().all(|&x| x == FILL_BYTE)));
    }

    #[test]
    fn test_zero_target_allocates_nothing() {
        let mut ramp = MemoryRamp::with_block_size(0, 4096, Duration::ZERO);
        assert_eq!(ramp.fill(), RampOutcome::Completed { blocks: 0 });
        assert_eq!(ramp.held_bytes(), 0);
    }

    #[test]
    fn test_impossible_block_reports_exhaustion() {
        let mut ramp = MemoryRamp::with_block_size(2, usize::MAX, Duration::ZERO);
        assert_eq!(ramp.fill(), RampOutcome::Exhausted { blocks: 0 });
    }

    #[test]
    fn test_pauses_at_every_tenth_block_after_the_first() {
        // i = 10 and i = 20 pause; i = 0 does not
        let pause = Duration::from_millis(25);
        let mut ramp = MemoryRamp::with_block_size(21, 64, pause);
        let start = Instant::now();
        assert_eq!(ramp.fill(), RampOutcome::Completed { blocks: 21 });
        let elapsed = start.elapsed();
        assert!(elapsed >= pause * 2, "{elapsed:?}");
        assert!(elapsed < pause * 3, "{elapsed:?}");
    }

    #[test]
    fn test_no_pause_before_eleventh_block() {
        let mut ramp = MemoryRamp::with_block_size(10, 64, Duration::from_secs(10));
        let start = Instant::now();
        assert_eq!(ramp.fill(), RampOutcome::Completed { blocks: 10 });
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_spawn_ramp_disabled() {
        assert!(spawn_ramp(0).is_ok());
    }
}
