// PlayHead - tick-domain clock driven by the audio device callback
//
// Musical time is derived from the audio callbacks themselves: each callback
// covers `block_duration_ms`, and the play head remembers how long ago the last
// tick happened (`time_since_last_tick_ms`). That residual carries the sub-tick
// position from one buffer to the next, so the schedule never drifts no matter
// how many callbacks run, and no wall clock is involved.
//
// The play head moves exactly once per callback (`advance_device_buffer`). Every
// consumer inside the callback walks the same tick sequence with `ticks()` /
// `for_each_tick`, which only read it.

use std::iter::FusedIterator;

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum PlayHeadError {
    #[error("invalid tick time {0} ms: must be finite and greater than zero")]
    InvalidTickTime(f64),

    #[error("invalid loop range [{start}, {end}): end must be after start")]
    InvalidLoopRange { start: u64, end: u64 },
}

/// Half-open loop range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopRange {
    start: u64,
    end: u64,
}

impl LoopRange {
    pub fn new(start: u64, end: u64) -> Result<Self, PlayHeadError> {
        if end <= start {
            return Err(PlayHeadError::InvalidLoopRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    /// First tick after the loop (never played while looping)
    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, tick: u64) -> bool {
        (self.start..self.end).contains(&tick)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlayHead {
    tick_time_ms: f64,
    block_duration_ms: f64,
    current_tick: u64,
    time_since_last_tick_ms: f64,
    looping_range: Option<LoopRange>,
}

impl PlayHead {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the duration of one tick. The residual is reset to a full tick,
    /// so the current tick falls on the very start of the next buffer.
    pub fn set_tick_time_ms(&mut self, tick_time_ms: f64) -> Result<(), PlayHeadError> {
        if !tick_time_ms.is_finite() || tick_time_ms <= 0.0 {
            return Err(PlayHeadError::InvalidTickTime(tick_time_ms));
        }
        self.tick_time_ms = tick_time_ms;
        self.time_since_last_tick_ms = tick_time_ms;
        Ok(())
    }

    /// Duration of one device buffer: `samples_per_block / sample_rate * 1000`
    pub fn set_device_callback_duration_ms(&mut self, duration_ms: f64) {
        self.block_duration_ms = duration_ms;
    }

    /// Move to `tick`; while looping, positions outside the loop snap to its start
    pub fn set_position_in_ticks(&mut self, tick: u64) {
        self.current_tick = match self.looping_range {
            Some(range) if !range.contains(tick) => range.start,
            _ => tick,
        };
    }

    pub fn set_time_since_last_tick_ms(&mut self, time_ms: f64) {
        self.time_since_last_tick_ms = time_ms;
    }

    /// Loop over `[start, end)`. A current tick outside the range snaps to `start`.
    pub fn set_looping(&mut self, start: u64, end: u64) -> Result<(), PlayHeadError> {
        let range = LoopRange::new(start, end)?;
        self.looping_range = Some(range);
        if !range.contains(self.current_tick) {
            self.current_tick = range.start;
        }
        Ok(())
    }

    pub fn clear_looping(&mut self) {
        self.looping_range = None;
    }

    pub fn is_looping(&self) -> bool {
        self.looping_range.is_some()
    }

    pub fn looping_range(&self) -> Option<LoopRange> {
        self.looping_range
    }

    pub fn loop_start(&self) -> Option<u64> {
        self.looping_range.map(|r| r.start)
    }

    pub fn loop_end(&self) -> Option<u64> {
        self.looping_range.map(|r| r.end)
    }

    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    pub fn tick_time_ms(&self) -> f64 {
        self.tick_time_ms
    }

    pub fn device_callback_duration_ms(&self) -> f64 {
        self.block_duration_ms
    }

    /// Time elapsed between the last tick handled and the end of the previous buffer.
    /// E.g. the last tick of a 10ms buffer was at 9ms: this returns 1.
    pub fn time_since_last_tick_ms(&self) -> f64 {
        self.time_since_last_tick_ms
    }

    pub fn tick_after(&self, tick: u64) -> u64 {
        let next = tick.saturating_add(1);
        match self.looping_range {
            Some(range) if next >= range.end => range.start,
            _ => next,
        }
    }

    /// Ticks falling inside the current device buffer, with their offset in ms
    pub fn ticks(&self) -> Ticks<'_> {
        Ticks {
            play_head: self,
            tick: self.current_tick,
            time_point_ms: self.tick_time_ms - self.time_since_last_tick_ms,
        }
    }

    /// Sample index of a time offset inside the current buffer, clamped to the buffer
    pub fn sample_offset(&self, offset_ms: f64, num_samples: usize) -> u32 {
        if num_samples == 0 || self.block_duration_ms <= 0.0 {
            return 0;
        }
        let position = (offset_ms / self.block_duration_ms * num_samples as f64).floor();
        if position.is_nan() {
            return 0;
        }
        position.clamp(0.0, (num_samples - 1) as f64) as u32
    }

    /// Move forward by one device buffer. Must be called once per callback,
    /// after every consumer has walked `ticks()`.
    pub fn advance_device_buffer(&mut self) {
        let (last_offset, next_tick) = {
            let mut ticks = self.ticks();
            let last = ticks.by_ref().last();
            (last.map(|(_, offset)| offset), ticks.tick)
        };

        self.time_since_last_tick_ms = match last_offset {
            Some(offset) => self.block_duration_ms - offset,
            // No tick in this buffer: the last one only got further away
            None => self.time_since_last_tick_ms + self.block_duration_ms,
        };
        // First tick of the next buffer
        self.current_tick = next_tick;
    }

    fn has_valid_tick_time(&self) -> bool {
        self.tick_time_ms.is_finite() && self.tick_time_ms > 0.0
    }
}

/// Lazy `(tick, offset_ms)` sequence of one device buffer.
///
/// Borrowing iterator over a frozen play head; clone it to walk the buffer again.
/// An unset (zero) tick time yields nothing instead of looping forever.
#[derive(Debug, Clone)]
pub struct Ticks<'a> {
    play_head: &'a PlayHead,
    tick: u64,
    time_point_ms: f64,
}

impl Ticks<'_> {
    /// Tick that the next call to `next()` would produce (or the first tick of the
    /// following buffer once exhausted)
    pub fn peek_tick(&self) -> u64 {
        self.tick
    }
}

impl Iterator for Ticks<'_> {
    type Item = (u64, f64);

    fn next(&mut self) -> Option<Self::Item> {
        let play_head = self.play_head;
        if !play_head.has_valid_tick_time() || !(self.time_point_ms < play_head.block_duration_ms) {
            return None;
        }

        let item = (self.tick, self.time_point_ms);
        self.time_point_ms += play_head.tick_time_ms;
        self.tick = play_head.tick_after(self.tick);
        Some(item)
    }
}

impl FusedIterator for Ticks<'_> {}

/// Call `function(tick, offset_ms)` for every tick inside the current buffer
pub fn for_each_tick(play_head: &PlayHead, mut function: impl FnMut(u64, f64)) {
    for (tick, offset_ms) in play_head.ticks() {
        function(tick, offset_ms);
    }
}
