//! Groups reference rows into packed plaintext batches.

use super::store::ReferenceStore;
use crate::error::{err, Result};

/// Up to `targets_per_batch` reference rows concatenated in row order, with
/// their labels in the same order.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub packed: Vec<f64>,
    pub labels: Vec<String>,
}

/// Partitions the store into consecutive groups of at most `max_repeat`
/// rows. The final batch may be shorter; it is never padded.
///
/// The output depends only on the store and `max_repeat`: the client maps
/// slot segments back to labels by position within a batch.
pub fn pack(store: &ReferenceStore, max_repeat: usize) -> Result<Vec<Batch>> {
    if max_repeat == 0 {
        return Err(err!(Configuration, "batches must hold at least one row"));
    }

    let batches: Vec<Batch> = store
        .rows()
        .chunks(max_repeat)
        .zip(store.labels().chunks(max_repeat))
        .map(|(rows, labels)| Batch {
            packed: rows.concat(),
            labels: labels.to_vec(),
        })
        .collect();

    tracing::debug!(
        batches = batches.len(),
        max_repeat,
        rows = store.len(),
        "packed reference set"
    );
    Ok(batches)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(rows: usize, dimension: usize) -> ReferenceStore {
        let data = (0..rows)
            .map(|r| vec![r as f64; dimension])
            .collect::<Vec<_>>();
        let labels = (0..rows).map(|r| format!("row{r}")).collect();
        ReferenceStore::from_rows(data, labels, dimension).unwrap()
    }

    #[test]
    fn test_partition_preserves_order() {
        let batches = pack(&store(7, 2), 3).unwrap();
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].packed, vec![0.0, 0.0, 1.0, 1.0, 2.0, 2.0]);
        assert_eq!(batches[2].labels, vec!["row6".to_string()]);
        assert_eq!(batches[2].packed, vec![6.0, 6.0]);

        let labels: Vec<String> = batches.iter().flat_map(|b| b.labels.clone()).collect();
        assert_eq!(labels, store(7, 2).labels());
    }

    #[test]
    fn test_small_store_fits_one_batch() {
        let batches = pack(&store(2, 4), 4).unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].labels.len(), 2);
        assert_eq!(batches[0].packed.len(), 8);
    }

    #[test]
    fn test_deterministic() {
        let s = store(10, 3);
        assert_eq!(pack(&s, 4).unwrap(), pack(&s, 4).unwrap());
    }

    #[test]
    fn test_zero_repeat_rejected() {
        assert!(pack(&store(1, 1), 0).is_err());
    }

    #[test]
    fn test_empty_store() {
        let empty = ReferenceStore::from_rows(vec![], vec![], 3).unwrap();
        assert!(pack(&empty, 2).unwrap().is_empty());
    }
}
