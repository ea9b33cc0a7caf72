//! Slot packing geometry.
//!
//! A ciphertext has `max_slots` lanes. A query embedding of dimension D is
//! replicated `targets_per_batch = max_slots / D` times, so one packed batch
//! of that many reference vectors can be compared against it with a single
//! subtraction and squaring. Segment `i` of the slot vector holds the
//! coordinates belonging to reference row `i` of the batch.

use std::ops::Range;

use crate::error::{err, Result};

/// Number of D-dimensional vectors that fit side by side in `max_slots` slots.
pub fn batch_size(dimension: usize, max_slots: usize) -> Result<usize> {
    if dimension == 0 {
        return Err(err!(Configuration, "embedding dimension must be positive"));
    }
    if dimension > max_slots {
        return Err(err!(
            Configuration,
            "embedding dimension {} exceeds the {} slots of one ciphertext",
            dimension,
            max_slots
        ));
    }
    Ok(max_slots / dimension)
}

/// Packing geometry for one embedding dimension and parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotLayout {
    dimension: usize,
    max_slots: usize,
    targets_per_batch: usize,
}

impl SlotLayout {
    pub fn new(dimension: usize, max_slots: usize) -> Result<Self> {
        let targets_per_batch = batch_size(dimension, max_slots)?;
        Ok(Self {
            dimension,
            max_slots,
            targets_per_batch,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn max_slots(&self) -> usize {
        self.max_slots
    }

    /// Reference vectors per packed batch, also the query replication count.
    pub fn targets_per_batch(&self) -> usize {
        self.targets_per_batch
    }

    /// Slot range of segment `i`.
    pub fn segment(&self, i: usize) -> Range<usize> {
        i * self.dimension..(i + 1) * self.dimension
    }

    /// `vector` repeated `targets_per_batch` times.
    pub fn replicate(&self, vector: &[f64]) -> Result<Vec<f64>> {
        if vector.len() != self.dimension {
            return Err(err!(
                DataFormat,
                "embedding has {} values, expected {}",
                vector.len(),
                self.dimension
            ));
        }
        Ok(vector.repeat(self.targets_per_batch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_batch_size() {
        assert_eq!(batch_size(512, 8192).unwrap(), 16);
        assert_eq!(batch_size(4, 16).unwrap(), 4);
        assert_eq!(batch_size(5, 16).unwrap(), 3);
        assert_eq!(batch_size(16, 16).unwrap(), 1);
    }

    #[test]
    fn test_oversized_dimension_is_configuration_error() {
        let err = batch_size(17, 16).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(SlotLayout::new(0, 16).is_err());
    }

    #[test]
    fn test_segments_tile_the_slots() {
        let layout = SlotLayout::new(5, 16).unwrap();
        assert_eq!(layout.targets_per_batch(), 3);
        assert_eq!(layout.segment(0), 0..5);
        assert_eq!(layout.segment(2), 10..15);
    }

    #[test]
    fn test_replicate() {
        let layout = SlotLayout::new(2, 8).unwrap();
        assert_eq!(
            layout.replicate(&[1.0, 2.0]).unwrap(),
            vec![1.0, 2.0, 1.0, 2.0, 1.0, 2.0, 1.0, 2.0]
        );
        assert_eq!(
            layout.replicate(&[1.0]).unwrap_err().kind(),
            ErrorKind::DataFormat
        );
    }
}
