//! Randomised partition search.
//!
//! Each iteration shuffles the whole roster with its own seed, carves the
//! shuffled order into contiguous runs sized by the schema, and scores the
//! result. Only the seed and score are kept; the winning partition is drawn
//! again from its seed once selection is done.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;
use tracing::debug;

use crate::core::roster::{GroupSchema, Roster};
use crate::core::stats::{rank_sum, sample_std};

/// Subject indices per group, in schema order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Partition {
    groups: Vec<Vec<usize>>,
}

impl Partition {
    /// Shuffle every subject with `seed`, then slice by the schema's sizes.
    /// Subjects past the schema total are left out.
    pub fn draw(roster: &Roster, schema: &GroupSchema, seed: u64) -> Self {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let mut order: Vec<usize> = (0..roster.len()).collect();
        order.shuffle(&mut rng);

        let mut groups = Vec::with_capacity(schema.len());
        let mut pos = 0;
        for spec in schema.groups() {
            let end = (pos + spec.size).min(order.len());
            groups.push(order[pos..end].to_vec());
            pos = end;
        }
        Self { groups }
    }

    pub fn groups(&self) -> &[Vec<usize>] {
        &self.groups
    }

    /// Number of subjects assigned across all groups.
    pub fn assigned(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }

    /// Size values per group, looked up in a precomputed size table.
    pub fn values(&self, sizes: &[f64]) -> Vec<Vec<f64>> {
        self.groups
            .iter()
            .map(|g| g.iter().map(|&i| sizes[i]).collect())
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CandidateScore {
    /// Smallest pairwise rank-sum p-value; 1 when there is a single group.
    pub p_min: f64,
    /// Largest finite within-group standard deviation; NaN if none is finite.
    pub sd_max: f64,
}

impl CandidateScore {
    pub fn of(groups: &[Vec<f64>]) -> Self {
        let mut p_min = 1.0f64;
        for i in 0..groups.len() {
            for j in 0..i {
                let p = rank_sum(&groups[i], &groups[j]).p_value;
                if p.is_nan() || p < p_min {
                    p_min = p;
                }
            }
        }

        let sd_max = groups
            .iter()
            .map(|g| sample_std(g))
            .filter(|sd| sd.is_finite())
            .fold(f64::NAN, f64::max);

        Self { p_min, sd_max }
    }

    pub fn passes(&self, threshold: f64) -> bool {
        self.p_min > threshold
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    pub iteration: usize,
    pub seed: u64,
    pub score: CandidateScore,
}

#[derive(Clone, Copy, Debug)]
pub struct SearchParams {
    pub iterations: usize,
    pub seed: u64,
    pub parallel: bool,
}

impl SearchParams {
    pub fn new(iterations: usize, seed: u64) -> Self {
        Self {
            iterations,
            seed,
            parallel: false,
        }
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// One seed per iteration, drawn from a stream keyed by `master`.
pub fn iteration_seeds(master: u64, iterations: usize) -> Vec<u64> {
    let mut rng = ChaCha20Rng::seed_from_u64(master);
    (0..iterations).map(|_| rng.random::<u64>()).collect()
}

fn score_one(roster: &Roster, schema: &GroupSchema, sizes: &[f64], iteration: usize, seed: u64) -> Candidate {
    let partition = Partition::draw(roster, schema, seed);
    let score = CandidateScore::of(&partition.values(sizes));
    Candidate {
        iteration,
        seed,
        score,
    }
}

/// Score `params.iterations` random partitions. The result is in iteration
/// order and identical whether or not it ran in parallel.
pub fn search(roster: &Roster, schema: &GroupSchema, params: &SearchParams) -> Vec<Candidate> {
    let seeds = iteration_seeds(params.seed, params.iterations);
    let sizes = roster.sizes();
    debug!(
        iterations = params.iterations,
        seed = params.seed,
        parallel = params.parallel,
        subjects = roster.len(),
        groups = schema.len(),
        "starting partition search"
    );

    if params.parallel {
        seeds
            .par_iter()
            .enumerate()
            .map(|(i, &seed)| score_one(roster, schema, &sizes, i, seed))
            .collect()
    } else {
        seeds
            .iter()
            .enumerate()
            .map(|(i, &seed)| score_one(roster, schema, &sizes, i, seed))
            .collect()
    }
}
