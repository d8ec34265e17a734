//! Pain and validation scoring heuristics.
//!
//! Cheap, deterministic, explainable — a pre-filter computed from already
//! fetched engagement numbers, not the LLM enrichment path. Both scorers are
//! total functions: missing numeric fields arrive as zero, never as an error.

use crate::types::RawPost;

/// Emotional-intensity vocabulary. Each entry that appears (as a lowercase
/// substring of title+body) counts once, regardless of repetitions.
const EMOTIONAL_WORDS: &[&str] = &[
    "hate",
    "terrible",
    "awful",
    "frustrated",
    "angry",
    "desperate",
    "impossible",
    "nightmare",
];

/// Pain score in `[1, 10]`.
///
/// Base 5, plus a capped engagement term `min((upvotes/100 + comments/20)/2, 3)`
/// so viral posts cannot dominate, plus a capped emotional term
/// `min(0.5 × matched_words, 2)`. The sum is rounded to the nearest integer and
/// clamped to `[1, 10]`.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn pain_score(post: &RawPost) -> i32 {
    let mut score = 5.0_f64;

    let engagement = (post.upvotes as f64 / 100.0 + post.comments as f64 / 20.0) / 2.0;
    score += engagement.min(3.0);

    score += (0.5 * emotional_matches(post) as f64).min(2.0);

    (score.round() as i32).clamp(1, 10)
}

/// Validation score: `2 × upvotes + 3 × comments`.
///
/// Fixed linear weighting favouring discussion depth over raw approval.
/// No upper bound, no normalization.
#[must_use]
pub fn validation_score(post: &RawPost) -> i64 {
    2 * post.upvotes + 3 * post.comments
}

/// Number of distinct emotional-vocabulary entries present in the post text.
fn emotional_matches(post: &RawPost) -> usize {
    let text = format!("{} {}", post.title, post.body).to_lowercase();
    EMOTIONAL_WORDS
        .iter()
        .filter(|word| text.contains(*word))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(title: &str, body: &str, upvotes: i64, comments: i64) -> RawPost {
        RawPost {
            id: "t3_test".to_string(),
            title: title.to_string(),
            body: body.to_string(),
            url: "https://reddit.com/r/test/comments/test".to_string(),
            upvotes,
            comments,
            created_utc: 1_700_000_000,
            source: "test".to_string(),
        }
    }

    #[test]
    fn baseline_post_scores_five() {
        // (0 upvotes, 0 comments, no emotional words): 5 + 0 + 0 = 5.
        assert_eq!(pain_score(&post("plain title", "plain body", 0, 0)), 5);
    }

    #[test]
    fn moderate_engagement_rounds_to_seven() {
        // (150, 40): engagement = (1.5 + 2.0) / 2 = 1.75 → 6.75 → rounds to 7.
        assert_eq!(pain_score(&post("plain title", "plain body", 150, 40)), 7);
    }

    #[test]
    fn tiny_engagement_rounds_back_to_five() {
        // (5, 1): engagement = (0.05 + 0.05) / 2 = 0.05 → 5.05 → rounds to 5.
        assert_eq!(pain_score(&post("plain title", "plain body", 5, 1)), 5);
    }

    #[test]
    fn engagement_term_caps_at_three() {
        // Viral numbers cannot push the engagement term past +3.
        let viral = pain_score(&post("plain", "plain", 1_000_000, 1_000_000));
        assert_eq!(viral, 8);
    }

    #[test]
    fn emotional_term_caps_at_two() {
        // All eight vocabulary words present: 0.5 × 8 = 4, capped at 2 → 7.
        let text = "hate terrible awful frustrated angry desperate impossible nightmare";
        assert_eq!(pain_score(&post(text, "", 0, 0)), 7);
    }

    #[test]
    fn repeated_emotional_word_counts_once() {
        let once = pain_score(&post("I hate this", "", 0, 0));
        let thrice = pain_score(&post("hate hate hate", "", 0, 0));
        assert_eq!(once, thrice);
    }

    #[test]
    fn both_caps_together_hit_the_upper_clamp() {
        // 5 + 3 (engagement cap) + 2 (emotional cap) = 10.
        let text = "hate terrible awful frustrated angry";
        assert_eq!(pain_score(&post(text, "", 1_000_000, 1_000_000)), 10);
    }

    #[test]
    fn pain_score_is_always_in_bounds() {
        for upvotes in [0, 1, 99, 100, 5_000, 10_000_000] {
            for comments in [0, 7, 20, 400, 1_000_000] {
                let s = pain_score(&post("frustrated and angry", "nightmare", upvotes, comments));
                assert!((1..=10).contains(&s), "score {s} out of bounds");
            }
        }
    }

    #[test]
    fn pain_score_is_monotone_in_upvotes_and_comments() {
        let mut last = 0;
        for upvotes in [0, 50, 100, 200, 400, 800] {
            let s = pain_score(&post("plain", "plain", upvotes, 0));
            assert!(s >= last, "score decreased as upvotes grew");
            last = s;
        }

        let mut last = 0;
        for comments in [0, 10, 20, 40, 80, 160] {
            let s = pain_score(&post("plain", "plain", 0, comments));
            assert!(s >= last, "score decreased as comments grew");
            last = s;
        }
    }

    #[test]
    fn pain_score_is_monotone_in_emotional_words() {
        let texts = [
            "plain",
            "hate",
            "hate terrible",
            "hate terrible awful",
            "hate terrible awful angry",
        ];
        let mut last = 0;
        for text in texts {
            let s = pain_score(&post(text, "", 0, 0));
            assert!(s >= last, "score decreased as emotional words grew");
            last = s;
        }
    }

    #[test]
    fn validation_score_is_exact() {
        assert_eq!(validation_score(&post("t", "b", 0, 0)), 0);
        assert_eq!(validation_score(&post("t", "b", 10, 5)), 35);
        assert_eq!(validation_score(&post("t", "b", 150, 40)), 420);
    }

    #[test]
    fn validation_score_weights_comments_over_upvotes() {
        let comments_heavy = validation_score(&post("t", "b", 0, 10));
        let upvotes_heavy = validation_score(&post("t", "b", 10, 0));
        assert!(comments_heavy > upvotes_heavy);
    }
}
