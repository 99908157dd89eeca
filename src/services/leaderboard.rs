// src/services/leaderboard.rs

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::{
    config::LeaderboardConfig,
    error::AppError,
    models::attempt::{LeaderboardEntry, LeaderboardRow, round2},
    utils::mask::mask_email,
};

/// Ranking order between two attempts. `Less` means `a` ranks above `b`.
///
/// Higher score first (the unrounded percentage refines the integer score), then
/// shorter time (a missing time loses to any recorded one), then the earlier attempt.
/// Attempt ids settle whatever is left so the order is total.
pub fn compare_attempts(a: &LeaderboardRow, b: &LeaderboardRow) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| b.percentage.total_cmp(&a.percentage))
        .then_with(|| match (a.time_taken_seconds, b.time_taken_seconds) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.attempted_at.cmp(&b.attempted_at))
        .then_with(|| a.attempt_id.cmp(&b.attempt_id))
}

/// Collapses every user's retakes into their single best attempt.
pub fn best_per_user(rows: Vec<LeaderboardRow>) -> Vec<LeaderboardRow> {
    let mut best: HashMap<i64, LeaderboardRow> = HashMap::new();

    for row in rows {
        match best.get(&row.user_id) {
            Some(current) if compare_attempts(&row, current) != Ordering::Less => {}
            _ => {
                best.insert(row.user_id, row);
            }
        }
    }

    best.into_values().collect()
}

/// Ranks all attempts of a quiz: one entry per user, dense distinct ranks, masked contacts.
pub fn leaderboard(rows: Vec<LeaderboardRow>, limit: usize) -> Vec<LeaderboardEntry> {
    let mut ranked = best_per_user(rows);
    ranked.sort_by(compare_attempts);

    ranked
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(position, row)| LeaderboardEntry {
            rank: position + 1,
            user_id: row.user_id,
            name: row.name,
            masked_email: mask_email(&row.email),
            score: row.score,
            percentage: round2(row.percentage),
            time_taken_seconds: row.time_taken_seconds,
            attempted_at: row.attempted_at,
        })
        .collect()
}

/// Applies the default and the cap to a requested limit.
pub fn resolve_limit(requested: Option<i64>, config: &LeaderboardConfig) -> Result<usize, AppError> {
    let limit = requested.unwrap_or(config.default_limit);
    if limit < 1 {
        return Err(AppError::BadRequest("limit must be at least 1".to_string()));
    }
    Ok(limit.min(config.max_limit) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn row(attempt_id: i64, user_id: i64, score: i32, time: Option<i32>, minute: i64) -> LeaderboardRow {
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        LeaderboardRow {
            attempt_id,
            user_id,
            name: format!("User {}", user_id),
            email: format!("user{}@example.com", user_id),
            score,
            percentage: score as f64,
            time_taken_seconds: time,
            attempted_at: base + Duration::minutes(minute),
        }
    }

    #[test]
    fn test_faster_time_breaks_score_tie() {
        let rows = vec![row(1, 1, 80, Some(120), 0), row(2, 2, 80, Some(90), 1)];
        let board = leaderboard(rows, 10);

        assert_eq!(board[0].user_id, 2);
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[1].user_id, 1);
        assert_eq!(board[1].rank, 2);
    }

    #[test]
    fn test_one_entry_per_user_with_best_attempt() {
        let rows = vec![
            row(1, 1, 60, Some(50), 0),
            row(2, 1, 90, Some(200), 1),
            row(3, 1, 90, Some(150), 2),
            row(4, 2, 70, Some(10), 3),
        ];
        let board = leaderboard(rows, 10);

        assert_eq!(board.len(), 2);
        assert_eq!(board[0].user_id, 1);
        assert_eq!(board[0].score, 90);
        assert_eq!(board[0].time_taken_seconds, Some(150));
    }

    #[test]
    fn test_missing_time_ranks_below_recorded_time() {
        let rows = vec![row(1, 1, 75, None, 0), row(2, 2, 75, Some(3600), 5)];
        let board = leaderboard(rows, 10);
        assert_eq!(board[0].user_id, 2);
    }

    #[test]
    fn test_earliest_attempt_wins_full_tie() {
        let rows = vec![
            row(7, 1, 50, Some(30), 10),
            row(3, 1, 50, Some(30), 2),
            row(9, 2, 50, Some(30), 5),
        ];
        let best = best_per_user(rows.clone());
        let user_one = best.iter().find(|r| r.user_id == 1).unwrap();
        assert_eq!(user_one.attempt_id, 3);

        let board = leaderboard(rows, 10);
        assert_eq!(board[0].user_id, 1);
        assert_eq!(board[1].user_id, 2);
    }

    #[test]
    fn test_unrounded_percentage_separates_equal_scores() {
        let mut a = row(1, 1, 44, Some(100), 0);
        a.percentage = 43.75;
        let mut b = row(2, 2, 44, Some(100), 0);
        b.percentage = 44.25;

        let board = leaderboard(vec![a, b], 10);
        assert_eq!(board[0].user_id, 2);
    }

    #[test]
    fn test_limit_truncates_and_ranks_are_distinct() {
        let rows = (1..=5).map(|u| row(u, u, 50, Some(60), 0)).collect();
        let board = leaderboard(rows, 3);

        assert_eq!(board.len(), 3);
        let ranks: Vec<usize> = board.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn test_emails_are_masked() {
        let board = leaderboard(vec![row(1, 1, 10, Some(5), 0)], 10);
        assert_eq!(board[0].masked_email, "us***");
        let json = serde_json::to_string(&board).unwrap();
        assert!(!json.contains("user1@example.com"));
    }

    #[test]
    fn test_empty_input_gives_empty_board() {
        assert!(leaderboard(Vec::new(), 10).is_empty());
    }

    #[test]
    fn test_ranking_is_repeatable() {
        let rows = vec![
            row(1, 1, 40, Some(10), 0),
            row(2, 2, 40, Some(10), 0),
            row(3, 3, 90, None, 1),
        ];
        assert_eq!(leaderboard(rows.clone(), 10), leaderboard(rows, 10));
    }

    #[test]
    fn test_resolve_limit() {
        let config = LeaderboardConfig::default();
        assert_eq!(resolve_limit(None, &config).unwrap(), 10);
        assert_eq!(resolve_limit(Some(3), &config).unwrap(), 3);
        assert_eq!(resolve_limit(Some(10_000), &config).unwrap(), 100);
        assert!(resolve_limit(Some(0), &config).is_err());
    }
}
