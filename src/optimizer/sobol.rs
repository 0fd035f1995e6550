//! One-dimensional Sobol low-discrepancy sequence
//!
//! Gray-code construction over base-2 direction numbers. Points start at
//! index 1, skipping the origin, so the sequence reads
//! 0.5, 0.75, 0.25, 0.375, 0.875, ...

const BITS: usize = 52;
const SCALE: f64 = (1u64 << BITS) as f64;

/// Stateful generator of the sequence
#[derive(Debug, Clone)]
pub struct SobolSequence {
    directions: [u64; BITS],
    state: u64,
    index: u64,
}

impl Default for SobolSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl SobolSequence {
    pub fn new() -> Self {
        let mut directions = [0u64; BITS];
        for (i, v) in directions.iter_mut().enumerate() {
            *v = 1u64 << (BITS - 1 - i);
        }
        Self {
            directions,
            state: 0,
            index: 0,
        }
    }

    /// Next value of the sequence, in `[0, 1)`
    pub fn next_value(&mut self) -> f64 {
        // position of the lowest zero bit of the current index
        let c = ((!self.index).trailing_zeros() as usize).min(BITS - 1);
        self.state ^= self.directions[c];
        self.index += 1;
        self.state as f64 / SCALE
    }

    /// Generate the next `n` values
    pub fn generate(&mut self, n: usize) -> Vec<f64> {
        (0..n).map(|_| self.next_value()).collect()
    }
}

/// First `n` values of the sequence
pub fn sobol_1d(n: usize) -> Vec<f64> {
    SobolSequence::new().generate(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_values() {
        let values = sobol_1d(8);
        assert_eq!(values, vec![0.5, 0.75, 0.25, 0.375, 0.875, 0.625, 0.125, 0.1875]);
    }

    #[test]
    fn test_generator_continues_sequence() {
        let mut seq = SobolSequence::new();
        let mut values = seq.generate(3);
        values.extend(seq.generate(2));
        assert_eq!(values, sobol_1d(5));
    }

    #[test]
    fn test_values_in_unit_interval() {
        assert!(sobol_1d(1024).iter().all(|&v| (0.0..1.0).contains(&v)));
    }

    #[test]
    fn test_values_are_distinct() {
        let mut values = sobol_1d(128);
        values.sort_by(|a, b| a.partial_cmp(b).unwrap());
        values.dedup();
        assert_eq!(values.len(), 128);
    }
}
