#[allow(unused_imports)]
use crate::RankTree;

/// Depth calculates minimum, maximum, average and percentile of the
/// depths at which empty subtrees hang in a [`RankTree`]. The maximum
/// is the height of the tree, counted in nodes.
#[derive(Clone, Debug, Default)]
pub struct Depth {
    samples: usize,
    min: usize,
    max: usize,
    total: usize,
    depths: Vec<u64>, // count of samples, indexed by depth.
}

impl Depth {
    pub(crate) fn new() -> Depth {
        Default::default()
    }

    pub(crate) fn sample(&mut self, depth: usize) {
        if self.samples == 0 || depth < self.min {
            self.min = depth
        }
        if self.samples == 0 || depth > self.max {
            self.max = depth
        }
        self.samples += 1;
        self.total += depth;
        if depth >= self.depths.len() {
            self.depths.resize(depth + 1, 0);
        }
        self.depths[depth] += 1;
    }

    /// Return number of empty subtrees sampled in [`RankTree`] instance.
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Return minimum depth of an empty subtree.
    pub fn min(&self) -> usize {
        self.min
    }

    /// Return maximum depth of an empty subtree.
    pub fn max(&self) -> usize {
        self.max
    }

    /// Return the average depth of empty subtrees.
    pub fn mean(&self) -> usize {
        match self.samples {
            0 => 0,
            n => self.total / n,
        }
    }

    /// Return depth as tuple of percentiles, each tuple provides
    /// (percentile, depth). Returned percentiles from 90, 91 .. 99
    pub fn percentiles(&self) -> Vec<(u8, usize)> {
        let mut percentiles: Vec<(u8, usize)> = vec![];
        let (mut acc, mut prev_perc) = (0_u64, 90_u8);
        let iter = self.depths.iter().enumerate().filter(|(_, &item)| item > 0);
        for (depth, samples) in iter {
            acc += *samples;
            let perc = ((acc as f64 / self.samples as f64) * 100_f64) as u8;
            if perc >= prev_perc {
                percentiles.push((perc, depth));
                prev_perc = perc;
            }
        }
        percentiles
    }
}
