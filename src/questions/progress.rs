//! Completion statistics derived from a sheet's current questions.
//!
//! Nothing here is stored; callers recompute after every mutation.

use serde::Serialize;

use crate::questions::repo_types::{Difficulty, Question};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub total: usize,
    pub completed: usize,
    pub percentage: u8,
}

impl Tally {
    fn from_counts(total: usize, completed: usize) -> Self {
        Self {
            total,
            completed,
            percentage: completion_rate(completed, total),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub total: usize,
    pub completed: usize,
    pub percentage: u8,
    pub easy: Tally,
    pub medium: Tally,
    pub hard: Tally,
}

/// `round(100 * completed / total)`, halves rounded up, 0 when `total == 0`.
pub fn completion_rate(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total);
    ((200 * completed + total) / (2 * total)) as u8
}

pub fn summarize(questions: &[Question]) -> Progress {
    let tally = |pred: &dyn Fn(&Question) -> bool| {
        let (total, completed) = questions
            .iter()
            .filter(|q| pred(q))
            .fold((0, 0), |(t, c), q| (t + 1, c + usize::from(q.completed)));
        Tally::from_counts(total, completed)
    };

    let overall = tally(&|_| true);
    Progress {
        total: overall.total,
        completed: overall.completed,
        percentage: overall.percentage,
        easy: tally(&|q| q.difficulty == Difficulty::Easy),
        medium: tally(&|q| q.difficulty == Difficulty::Medium),
        hard: tally(&|q| q.difficulty == Difficulty::Hard),
    }
}
