use burn::data::dataset::Dataset;
use rand::{seq::SliceRandom, Rng};

use crate::domain::patch::PatchPair;

/// All training patches of a run, in the order batches are cut.
pub struct PatchDataset {
    pairs: Vec<PatchPair>,
}

impl PatchDataset {
    pub fn new(pairs: Vec<PatchPair>) -> Self { Self { pairs } }

    pub fn shuffle<R: Rng>(&mut self, rng: &mut R) { self.pairs.shuffle(rng) }

    /// Full batches per epoch; the remainder is dropped.
    pub fn batch_count(&self, batch_size: usize) -> usize { self.pairs.len() / batch_size }

    /// The `index`-th full batch.
    pub fn batch(&self, index: usize, batch_size: usize) -> &[PatchPair] {
        &self.pairs[index * batch_size..(index + 1) * batch_size]
    }
}

impl Dataset<PatchPair> for PatchDataset {
    fn get(&self, index: usize) -> Option<PatchPair> {
        self.pairs.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.pairs.len()
    }
}
