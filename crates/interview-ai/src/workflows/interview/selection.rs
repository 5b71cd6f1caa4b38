use std::collections::BTreeSet;

use rand::Rng;
use tracing::{debug, warn};

use super::bank::QuestionBank;
use super::domain::{Difficulty, QaEntry, Question};

pub const DEFAULT_QUESTION_LIMIT: usize = 5;
/// Candidates with at most this many years never draw hard questions.
pub const JUNIOR_MAX_YEARS: u32 = 2;
/// Candidates with at least this many years never draw easy questions.
pub const SENIOR_MIN_YEARS: u32 = 8;

/// Difficulty/experience policy applied to every drawn question.
pub fn accepts(difficulty: Difficulty, experience_years: u32) -> bool {
    if experience_years <= JUNIOR_MAX_YEARS {
        difficulty != Difficulty::Hard
    } else if experience_years >= SENIOR_MIN_YEARS {
        difficulty != Difficulty::Easy
    } else {
        true
    }
}

/// Samples a bounded, experience-appropriate subset of the bank.
#[derive(Debug, Clone, Copy)]
pub struct SelectionEngine {
    limit: usize,
}

impl Default for SelectionEngine {
    fn default() -> Self {
        Self::new(DEFAULT_QUESTION_LIMIT)
    }
}

impl SelectionEngine {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Draw questions from the selected domains.
    ///
    /// The target is `min(pool, limit)`. Each draw removes the question from the pool
    /// whether the policy accepts it or not, so a pool dominated by rejected difficulties
    /// can run dry first; sampling then stops and returns fewer than the target.
    pub fn select<R>(
        &self,
        bank: &QuestionBank,
        selected_domains: &BTreeSet<String>,
        experience_years: u32,
        rng: &mut R,
    ) -> Vec<Question>
    where
        R: Rng + ?Sized,
    {
        let mut pool: Vec<&Question> = bank
            .all_questions()
            .iter()
            .filter(|question| selected_domains.contains(&question.domain))
            .collect();
        let target = pool.len().min(self.limit);
        let mut chosen = Vec::with_capacity(target);

        while chosen.len() < target && !pool.is_empty() {
            let index = rng.gen_range(0..pool.len());
            let drawn = pool.remove(index);

            if accepts(drawn.difficulty, experience_years) {
                chosen.push(drawn.clone());
            } else {
                debug!(
                    question = %drawn.id,
                    difficulty = %drawn.difficulty,
                    experience_years,
                    "question rejected for experience level"
                );
            }
        }

        if chosen.len() < target {
            warn!(
                selected = chosen.len(),
                target, experience_years, "question pool exhausted before reaching target"
            );
        }

        chosen
    }
}

/// Wrap selected questions into fresh, unscored QA entries.
pub fn into_entries(questions: Vec<Question>) -> Vec<QaEntry> {
    questions.into_iter().map(QaEntry::new).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::interview::domain::RecordId;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn question(id: u64, domain: &str, difficulty: Difficulty) -> Question {
        Question {
            id: RecordId(id),
            prompt: format!("{domain} question {id}"),
            reference_answer: format!("reference {id}"),
            difficulty,
            domain: domain.to_string(),
        }
    }

    fn domains(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    /// 8 Backend/Frontend questions (3 hard, 3 medium, 2 easy) plus unrelated DevOps noise.
    fn mixed_bank() -> QuestionBank {
        QuestionBank::new(vec![
            question(1, "Backend", Difficulty::Hard),
            question(2, "Backend", Difficulty::Medium),
            question(3, "Frontend", Difficulty::Easy),
            question(4, "Frontend", Difficulty::Hard),
            question(5, "Backend", Difficulty::Easy),
            question(6, "DevOps", Difficulty::Medium),
            question(7, "Frontend", Difficulty::Medium),
            question(8, "Backend", Difficulty::Hard),
            question(9, "Frontend", Difficulty::Medium),
            question(10, "DevOps", Difficulty::Easy),
        ])
    }

    #[test]
    fn policy_boundaries_are_inclusive() {
        assert!(!accepts(Difficulty::Hard, 0));
        assert!(!accepts(Difficulty::Hard, 2));
        assert!(accepts(Difficulty::Easy, 2));
        assert!(accepts(Difficulty::Hard, 3));
        assert!(accepts(Difficulty::Easy, 7));
        assert!(!accepts(Difficulty::Easy, 8));
        assert!(accepts(Difficulty::Hard, 8));
        assert!(!accepts(Difficulty::Easy, 30));
    }

    #[test]
    fn junior_candidates_get_five_questions_and_no_hard_ones() {
        let bank = mixed_bank();
        let selected = domains(&["Backend", "Frontend"]);

        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let questions = SelectionEngine::default().select(&bank, &selected, 1, &mut rng);

            assert_eq!(questions.len(), 5, "seed {seed}");
            assert!(questions.iter().all(|q| q.difficulty != Difficulty::Hard));
            assert!(questions.iter().all(|q| selected.contains(&q.domain)));
        }
    }

    #[test]
    fn senior_candidates_never_get_easy_questions() {
        let bank = mixed_bank();
        let selected = domains(&["Backend", "Frontend"]);

        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let questions = SelectionEngine::default().select(&bank, &selected, 9, &mut rng);

            assert!(questions.len() <= 5);
            assert!(questions.iter().all(|q| q.difficulty != Difficulty::Easy));
        }
    }

    #[test]
    fn boundary_experience_levels_apply_exclusions() {
        let bank = mixed_bank();
        let selected = domains(&["Backend", "Frontend"]);
        let mut rng = StdRng::seed_from_u64(7);

        let at_two = SelectionEngine::default().select(&bank, &selected, 2, &mut rng);
        let at_eight = SelectionEngine::default().select(&bank, &selected, 8, &mut rng);

        assert!(at_two.iter().all(|q| q.difficulty != Difficulty::Hard));
        assert!(at_eight.iter().all(|q| q.difficulty != Difficulty::Easy));
    }

    #[test]
    fn mid_level_result_length_is_min_of_pool_and_limit() {
        for pool_size in 0..=12_u64 {
            let bank = QuestionBank::new(
                (1..=pool_size)
                    .map(|id| {
                        let difficulty = Difficulty::ordered()[(id % 3) as usize];
                        question(id, "Backend", difficulty)
                    })
                    .collect(),
            );
            let mut rng = StdRng::seed_from_u64(pool_size);
            let questions =
                SelectionEngine::default().select(&bank, &domains(&["Backend"]), 5, &mut rng);

            assert_eq!(questions.len(), (pool_size as usize).min(5));
            let unique: BTreeSet<RecordId> = questions.iter().map(|q| q.id).collect();
            assert_eq!(unique.len(), questions.len(), "questions are not repeated");
        }
    }

    #[test]
    fn exhausted_pool_returns_fewer_than_target() {
        let bank = QuestionBank::new(vec![
            question(1, "Backend", Difficulty::Hard),
            question(2, "Backend", Difficulty::Hard),
            question(3, "Backend", Difficulty::Medium),
        ]);
        let mut rng = StdRng::seed_from_u64(3);

        let questions =
            SelectionEngine::default().select(&bank, &domains(&["Backend"]), 0, &mut rng);

        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].id, RecordId(3));
    }

    #[test]
    fn no_selected_domains_yields_nothing() {
        let mut rng = StdRng::seed_from_u64(1);
        let questions =
            SelectionEngine::default().select(&mixed_bank(), &BTreeSet::new(), 5, &mut rng);
        assert!(questions.is_empty());
    }

    #[test]
    fn entries_start_unscored() {
        let entries = into_entries(vec![question(1, "Backend", Difficulty::Easy)]);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].score, 0);
        assert!(entries[0].answer.is_empty());
        assert!(!entries[0].persistence.is_persisted());
    }
}
