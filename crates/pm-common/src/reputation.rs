//! Derived level/experience/rank shown to a user based on aggregated quiz
//! performance. Pure arithmetic over the `quiz_results` aggregates; the db
//! layer only supplies sums.

pub const EXPERIENCE_PER_LEVEL: i64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizAggregate {
    pub user_id: i64,
    pub total_score: i64,
    pub quizzes_taken: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reputation {
    pub experience: i64,
    pub level: i32,
    pub rank: i64,
}

pub fn level_for_experience(experience: i64) -> i32 {
    (experience.max(0) / EXPERIENCE_PER_LEVEL + 1) as i32
}

/// Rank users by experience descending. Ties share a rank and the next
/// distinct value skips past them (standard competition ranking).
pub fn compute_ranks(mut aggregates: Vec<QuizAggregate>) -> Vec<(i64, Reputation)> {
    aggregates.sort_by(|a, b| b.total_score.cmp(&a.total_score).then(a.user_id.cmp(&b.user_id)));

    let mut ranked = Vec::with_capacity(aggregates.len());
    let mut previous_score: Option<i64> = None;
    let mut rank = 0i64;

    for (position, aggregate) in aggregates.iter().enumerate() {
        if previous_score != Some(aggregate.total_score) {
            rank = position as i64 + 1;
            previous_score = Some(aggregate.total_score);
        }

        ranked.push((
            aggregate.user_id,
            Reputation {
                experience: aggregate.total_score,
                level: level_for_experience(aggregate.total_score),
                rank,
            },
        ));
    }

    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregate(user_id: i64, total_score: i64) -> QuizAggregate {
        QuizAggregate {
            user_id,
            total_score,
            quizzes_taken: 1,
        }
    }

    #[test]
    fn level_starts_at_one_and_steps_every_500() {
        assert_eq!(level_for_experience(0), 1);
        assert_eq!(level_for_experience(499), 1);
        assert_eq!(level_for_experience(500), 2);
        assert_eq!(level_for_experience(1250), 3);
    }

    #[test]
    fn negative_experience_is_clamped() {
        assert_eq!(level_for_experience(-100), 1);
    }

    #[test]
    fn ties_share_a_rank_and_the_next_rank_skips() {
        let ranked = compute_ranks(vec![
            aggregate(1, 900),
            aggregate(2, 1200),
            aggregate(3, 900),
            aggregate(4, 100),
        ]);

        let by_user: std::collections::HashMap<i64, Reputation> = ranked.into_iter().collect();
        assert_eq!(by_user[&2].rank, 1);
        assert_eq!(by_user[&1].rank, 2);
        assert_eq!(by_user[&3].rank, 2);
        assert_eq!(by_user[&4].rank, 4);
    }
}
