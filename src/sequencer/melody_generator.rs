// Random melody generator - a one bar walk over the major scale

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::note::Note;
use super::time_signature::TimeSignature;

/// Semitone offsets of the major scale degrees
const MAJOR_SCALE: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];

/// Step sizes in scale degrees; small steps dominate
const STEP_DISTANCES: [i32; 14] = [0, 0, 0, 1, 1, 1, 1, 1, 1, 1, 1, 2, 3, 4];

const GENERATED_VELOCITY: u8 = 127;

pub struct MelodyGenerator {
    rng: StdRng,
}

impl MelodyGenerator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible sequence for a given seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// `numerator * 2` consecutive eighth notes starting at tick 0
    pub fn generate(&mut self, time_signature: &TimeSignature) -> Vec<Note> {
        let ticks_per_note = (time_signature.ticks_per_quarter_note() as u64 / 2).max(1);
        let num_notes = time_signature.numerator() as usize * 2;
        let root: u8 = self.rng.gen_range(60..80);

        self.scale_walk(num_notes)
            .into_iter()
            .enumerate()
            .filter_map(|(index, offset)| {
                Note::new(
                    root + offset,
                    GENERATED_VELOCITY,
                    index as u64 * ticks_per_note,
                    ticks_per_note,
                )
                .ok()
            })
            .collect()
    }

    /// Semitone offsets of a random walk over the scale, reversed
    fn scale_walk(&mut self, num_notes: usize) -> Vec<u8> {
        let mut degree: i32 = self.rng.gen_range(1..5);
        let mut offsets = Vec::with_capacity(num_notes);
        if num_notes == 0 {
            return offsets;
        }
        offsets.push(MAJOR_SCALE[degree as usize]);

        let last_degree = MAJOR_SCALE.len() as i32 - 1;
        for _ in 1..num_notes {
            let direction = if self.rng.gen_bool(0.5) { 1 } else { -1 };
            let distance = STEP_DISTANCES[self.rng.gen_range(0..STEP_DISTANCES.len())];
            degree = (degree + direction * distance).clamp(0, last_degree);
            offsets.push(MAJOR_SCALE[degree as usize]);
        }

        offsets.reverse();
        offsets
    }
}

impl Default for MelodyGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generates_two_notes_per_beat() {
        let mut generator = MelodyGenerator::with_seed(7);
        let notes = generator.generate(&TimeSignature::default());

        assert_eq!(notes.len(), 8);
        for (index, note) in notes.iter().enumerate() {
            assert_eq!(note.start_ticks(), index as u64 * 24);
            assert_eq!(note.length_ticks(), 24);
            assert_eq!(note.velocity(), 127);
        }
    }

    #[test]
    fn test_notes_stay_on_scale_above_root_range() {
        let mut generator = MelodyGenerator::with_seed(42);
        for _ in 0..50 {
            let notes = generator.generate(&TimeSignature::new(3, 4, 48).unwrap());
            assert_eq!(notes.len(), 6);
            for note in &notes {
                // root in 60..80, highest degree adds 11
                assert!((60..91).contains(&note.note_number()));
            }
        }
    }

    #[test]
    fn test_same_seed_same_melody() {
        let ts = TimeSignature::default();
        let a = MelodyGenerator::with_seed(1234).generate(&ts);
        let b = MelodyGenerator::with_seed(1234).generate(&ts);
        assert_eq!(a, b);
    }

    #[test]
    fn test_walk_steps_are_scale_degrees() {
        let mut generator = MelodyGenerator::with_seed(99);
        let walk = generator.scale_walk(32);
        assert_eq!(walk.len(), 32);
        assert!(walk.iter().all(|offset| MAJOR_SCALE.contains(offset)));
        assert!(generator.scale_walk(0).is_empty());
    }
}
