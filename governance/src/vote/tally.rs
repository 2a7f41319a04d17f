use serde::{Deserialize, Serialize};

use super::{ActiveVote, VoteChoice};

/// Voting power summed per choice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub approved: u64,
    pub disapproved: u64,
    pub neutral: u64,
}

/// Where a tally stands against a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// Enough power has voted, in any direction
    pub consensus_reached: bool,
    /// Approving power alone meets the threshold
    pub is_approved: bool,
}

impl Tally {
    /// Sum the votes in ascending ID order.
    pub fn from_votes<'a>(votes: impl IntoIterator<Item = &'a ActiveVote>) -> Self {
        let mut votes = votes.into_iter().collect::<Vec<_>>();
        votes.sort_by_key(|vote| vote.id);
        votes.into_iter().fold(Tally::default(), |mut tally, vote| {
            tally.add(vote.vote.choice, vote.power);
            tally
        })
    }

    pub fn add(&mut self, choice: VoteChoice, power: u64) {
        let bucket = match choice {
            VoteChoice::Approve => &mut self.approved,
            VoteChoice::Disapprove => &mut self.disapproved,
            VoteChoice::Neutral => &mut self.neutral,
        };
        *bucket = bucket.saturating_add(power);
    }

    pub fn total(&self) -> u64 {
        self.approved
            .saturating_add(self.disapproved)
            .saturating_add(self.neutral)
    }

    /// Approval is judged against the absolute threshold, not a majority
    /// over disapproval.
    pub fn resolve(&self, threshold: u64) -> Resolution {
        Resolution {
            consensus_reached: self.total() >= threshold,
            is_approved: self.approved >= threshold,
        }
    }
}
