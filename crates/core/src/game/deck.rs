//! Deck construction from a flat oracle batch into the per-team, ordered deck
//! `RoomState` plays from.

use rand::seq::SliceRandom;
use rand::Rng;

use super::state::{QuestionState, Team};

/// A single question as returned by the question oracle: options in display
/// order and `correct_option` **1-based** (`spec.md` §9).
#[derive(Debug, Clone)]
pub struct OracleQuestion {
    pub text: String,
    pub options: [String; 4],
    pub correct_option: u8,
}

/// Shuffles a flat `2 * questions_per_team` oracle batch and splits it into
/// team A/B halves with sequential `order_index`, converting `correct_option`
/// from the oracle's 1-based representation to the deck's 0-based one exactly
/// once. Panics if `batch.len() != 2 * questions_per_team` since that would
/// indicate an oracle contract violation the caller should have already
/// rejected.
pub fn build_deck(
    mut batch: Vec<OracleQuestion>,
    questions_per_team: u8,
    id_gen: impl Fn() -> String,
    rng: &mut impl Rng,
) -> Vec<QuestionState> {
    let expected = 2 * questions_per_team as usize;
    assert_eq!(batch.len(), expected, "oracle batch size does not match 2 * questions_per_team");

    batch.shuffle(rng);

    let (half_a, half_b) = batch.split_at(questions_per_team as usize);

    let mut deck = Vec::with_capacity(expected);
    for (team, half) in [(Team::A, half_a), (Team::B, half_b)] {
        for (order_index, question) in half.iter().enumerate() {
            deck.push(QuestionState {
                id: id_gen(),
                team,
                order_index: order_index as u8,
                text: question.text.clone(),
                options: question.options.clone(),
                correct_option: question.correct_option.saturating_sub(1),
                answered: false,
            });
        }
    }
    deck
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use super::*;

    fn sample_batch(n: usize) -> Vec<OracleQuestion> {
        (0..n)
            .map(|i| OracleQuestion {
                text: format!("Question {i}"),
                options: ["a".into(), "b".into(), "c".into(), "d".into()],
                correct_option: ((i % 4) + 1) as u8,
            })
            .collect()
    }

    #[test]
    fn test_splits_into_equal_halves() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let deck = build_deck(sample_batch(10), 5, || "qst_x".into(), &mut rng);
        assert_eq!(deck.iter().filter(|q| q.team == Team::A).count(), 5);
        assert_eq!(deck.iter().filter(|q| q.team == Team::B).count(), 5);
    }

    #[test]
    fn test_order_index_sequential_per_team() {
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let deck = build_deck(sample_batch(10), 5, || "qst_x".into(), &mut rng);
        let mut a_indices: Vec<u8> = deck.iter().filter(|q| q.team == Team::A).map(|q| q.order_index).collect();
        a_indices.sort();
        assert_eq!(a_indices, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_correct_option_converted_to_zero_based() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let deck = build_deck(sample_batch(10), 5, || "qst_x".into(), &mut rng);
        assert!(deck.iter().all(|q| q.correct_option <= 3));
    }

    #[test]
    #[should_panic(expected = "oracle batch size")]
    fn test_rejects_mismatched_batch_size() {
        let mut rng = ChaCha20Rng::seed_from_u64(4);
        build_deck(sample_batch(9), 5, || "qst_x".into(), &mut rng);
    }
}
