// MIDI capture queue - midir callback thread -> audio thread
//
// The MIDI input callback pushes parsed events with their driver timestamp into a
// lock-free SPSC ring buffer. Once per audio callback the collector drains whatever
// arrived and lays it out inside the block, keeping the relative spacing of the
// messages (the oldest pending message lands on sample 0).

use ringbuf::HeapRb;
use ringbuf::traits::{Consumer, Producer, Split};

use crate::midi::buffer::MidiBuffer;
use crate::midi::event::MidiEvent;

/// Default queue capacity (taille du ringbuffer MIDI)
pub const DEFAULT_MIDI_QUEUE_CAPACITY: usize = 512;

/// MIDI event stamped with the driver's arrival time in microseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedMidiMessage {
    pub event: MidiEvent,
    pub timestamp_us: u64,
}

pub type MidiQueueProducer = ringbuf::HeapProd<TimedMidiMessage>;
pub type MidiQueueConsumer = ringbuf::HeapCons<TimedMidiMessage>;

/// Create a capture queue, returning the producer for the MIDI thread and the
/// collector for the audio thread.
pub fn create_midi_queue(capacity: usize) -> (MidiQueueProducer, MidiCollector) {
    let rb = HeapRb::<TimedMidiMessage>::new(capacity);
    let (producer, consumer) = rb.split();
    (producer, MidiCollector::new(consumer, capacity))
}

/// Push one message; returns false if the queue was full and the message was dropped
pub fn push_message(producer: &mut MidiQueueProducer, event: MidiEvent, timestamp_us: u64) -> bool {
    producer
        .try_push(TimedMidiMessage {
            event,
            timestamp_us,
        })
        .is_ok()
}

pub struct MidiCollector {
    consumer: MidiQueueConsumer,
    // Pre-allocated so draining never allocates on the audio thread
    pending: Vec<TimedMidiMessage>,
    sample_rate: f64,
}

impl MidiCollector {
    fn new(consumer: MidiQueueConsumer, capacity: usize) -> Self {
        Self {
            consumer,
            pending: Vec::with_capacity(capacity),
            sample_rate: 44100.0,
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        if sample_rate > 0.0 {
            self.sample_rate = sample_rate;
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Drain pending messages into `destination`, bounded to `num_samples`.
    pub fn remove_next_block_of_messages(&mut self, destination: &mut MidiBuffer, num_samples: usize) {
        if num_samples == 0 {
            return;
        }

        self.pending.clear();
        self.pending.extend(self.consumer.pop_iter());

        let Some(oldest) = self.pending.iter().map(|m| m.timestamp_us).min() else {
            return;
        };

        let last_sample = (num_samples - 1) as u64;
        for message in &self.pending {
            let delta_us = message.timestamp_us.saturating_sub(oldest);
            let sample = (delta_us as f64 * self.sample_rate / 1_000_000.0) as u64;
            destination.add_event(message.event, sample.min(last_sample) as u32);
        }
    }
}
