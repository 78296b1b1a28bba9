//! Pick the most balanced candidate.
//!
//! Candidates whose `p_min` does not exceed the threshold are dropped. The
//! survivors are ranked separately on `p_min` and `sd_max` (average ranks,
//! truncated to integers), scored as `rank(p_min) - rank(sd_max)`, and sorted
//! best first. Equal scores keep iteration order.

use tracing::debug;

use crate::core::search::Candidate;
use crate::core::stats::average_ranks;
use crate::error::{Error, Result};

/// Significance threshold used when none is configured.
pub const DEFAULT_P_THRESHOLD: f64 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RankedCandidate {
    pub iteration: usize,
    pub rank_p: i64,
    pub rank_sd: i64,
    pub score: i64,
}

#[derive(Clone, Debug)]
pub struct Selection {
    pub chosen: Candidate,
    /// Candidates that passed the filter, best first.
    pub ranked: Vec<RankedCandidate>,
}

impl Selection {
    pub fn passing(&self) -> usize {
        self.ranked.len()
    }

    pub fn best(&self) -> &RankedCandidate {
        &self.ranked[0]
    }
}

pub fn select(candidates: &[Candidate], threshold: f64) -> Result<Selection> {
    let kept: Vec<&Candidate> = candidates
        .iter()
        .filter(|c| c.score.passes(threshold))
        .collect();
    if kept.is_empty() {
        return Err(Error::NoBalancedCandidate {
            threshold,
            iterations: candidates.len(),
        });
    }

    let p: Vec<f64> = kept.iter().map(|c| c.score.p_min).collect();
    let sd: Vec<f64> = kept.iter().map(|c| c.score.sd_max).collect();
    let rank_p = average_ranks(&p);
    let rank_sd = average_ranks(&sd);

    let mut ranked: Vec<(usize, RankedCandidate)> = kept
        .iter()
        .enumerate()
        .map(|(k, c)| {
            let rp = rank_p[k].trunc() as i64;
            let rs = rank_sd[k].trunc() as i64;
            (
                k,
                RankedCandidate {
                    iteration: c.iteration,
                    rank_p: rp,
                    rank_sd: rs,
                    score: rp - rs,
                },
            )
        })
        .collect();
    ranked.sort_by(|a, b| b.1.score.cmp(&a.1.score));

    let chosen = *kept[ranked[0].0];
    debug!(
        passing = kept.len(),
        total = candidates.len(),
        iteration = chosen.iteration,
        "selected candidate"
    );
    Ok(Selection {
        chosen,
        ranked: ranked.into_iter().map(|(_, r)| r).collect(),
    })
}
