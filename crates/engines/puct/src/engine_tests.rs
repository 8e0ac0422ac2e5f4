use super::*;
use crate::evaluator::{EvaluatorError, NetworkOutput, UniformEvaluator, ValueSchema};
use crate::planes::EncodedPosition;
use crate::policy_map::{policy_index, POLICY_SIZE};
use chess_core::{parse_uci_move, STARTPOS_FEN};

/// Puts all policy mass on one move of the start position.
struct FavouriteMove {
    index: usize,
}

impl Evaluator for FavouriteMove {
    fn schema(&self) -> ValueSchema {
        ValueSchema::Legacy
    }

    fn evaluate(&self, batch: &[EncodedPosition]) -> Result<Vec<NetworkOutput>, EvaluatorError> {
        let mut policy = vec![0.0; POLICY_SIZE];
        policy[self.index] = 10.0;
        Ok(batch
            .iter()
            .map(|_| NetworkOutput {
                policy: policy.clone(),
                value: vec![0.0],
            })
            .collect())
    }
}

struct BrokenEvaluator;

impl Evaluator for BrokenEvaluator {
    fn schema(&self) -> ValueSchema {
        ValueSchema::Legacy
    }

    fn evaluate(&self, _batch: &[EncodedPosition]) -> Result<Vec<NetworkOutput>, EvaluatorError> {
        Err(EvaluatorError::EvaluationFailed("broken".to_string()))
    }
}

fn engine(config: EngineConfig) -> PuctEngine {
    let mut engine = PuctEngine::new(config);
    engine.set_evaluator(Box::new(UniformEvaluator::new()));
    engine
}

#[test]
fn test_best_move_requires_evaluator() {
    let engine = PuctEngine::default();
    assert!(!engine.is_initialized());
    let err = engine.best_move(&SearchLimits::simulations(10)).unwrap_err();
    assert!(matches!(err, EngineError::NotInitialized));
}

#[test]
fn test_ensure_initialized_without_model_path() {
    let mut engine = PuctEngine::default();
    assert!(!engine.ensure_initialized().unwrap());

    engine.set_evaluator(Box::new(UniformEvaluator::new()));
    assert!(engine.ensure_initialized().unwrap());
}

#[cfg(not(feature = "onnx"))]
#[test]
fn test_load_model_without_onnx_feature() {
    let mut engine = PuctEngine::new(EngineConfig::default().with_model_path("nets/missing.onnx"));
    let err = engine.ensure_initialized().unwrap_err();
    assert!(matches!(err, EngineError::ModelLoad { .. }));
    assert!(!engine.is_initialized());
}

#[test]
fn test_greedy_move_from_start_position() {
    let engine = engine(EngineConfig::default().with_search_enabled(false));

    let chosen = engine.best_move(&SearchLimits::simulations(0)).unwrap();

    let legal = engine.game().legal_moves();
    assert_eq!(legal.len(), 20);
    // Uniform priors: the first maximum is the first legal move
    assert_eq!(chosen.mv, legal[0]);
    assert!(chosen.search.is_none());
    assert_eq!(chosen.uci, chosen.mv.to_string());
}

#[test]
fn test_greedy_move_follows_policy() {
    let game = Game::new();
    let e4 = parse_uci_move(game.board(), "e2e4").unwrap();
    let index = policy_index(game.board(), e4).unwrap();

    let mut engine = PuctEngine::new(EngineConfig::default().with_search_enabled(false));
    engine.set_evaluator(Box::new(FavouriteMove { index }));

    let chosen = engine.best_move(&SearchLimits::default()).unwrap();
    assert_eq!(chosen.uci, "e2e4");
}

#[test]
fn test_greedy_move_surfaces_evaluator_failure() {
    let mut engine = PuctEngine::new(EngineConfig::default().with_search_enabled(false));
    engine.set_evaluator(Box::new(BrokenEvaluator));
    let err = engine.best_move(&SearchLimits::default()).unwrap_err();
    assert!(matches!(err, EngineError::Evaluation(_)));
}

#[test]
fn test_search_move_reports_statistics() {
    let engine = engine(EngineConfig::default());
    let chosen = engine.best_move(&SearchLimits::simulations(30)).unwrap();

    let outcome = chosen.search.expect("search ran");
    assert_eq!(outcome.stats.root_visits, 30);
    assert!(engine.game().is_legal(chosen.mv));
}

#[test]
fn test_set_position_with_moves() {
    let mut engine = engine(EngineConfig::default());
    engine
        .set_position(None, &["e2e4", "e7e5", "g1f3"])
        .unwrap();

    assert_eq!(engine.moves(), ["e2e4", "e7e5", "g1f3"]);
    assert_eq!(engine.game().ply(), 3);
    assert_eq!(
        engine.game().fen(),
        "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2"
    );
}

#[test]
fn test_set_position_truncates_at_illegal_move() {
    let mut engine = engine(EngineConfig::default());
    engine
        .set_position(Some(STARTPOS_FEN), &["e2e4", "e2e4", "e7e5"])
        .unwrap();

    assert_eq!(engine.moves(), ["e2e4"]);
    assert_eq!(engine.game().ply(), 1);
}

#[test]
fn test_set_position_rejects_bad_fen() {
    let mut engine = engine(EngineConfig::default());
    engine.set_position(None, &["d2d4"]).unwrap();

    let err = engine.set_position(Some("not a fen"), &[]).unwrap_err();
    assert!(matches!(err, EngineError::InvalidPosition(_)));
    // The previous position is kept
    assert_eq!(engine.moves(), ["d2d4"]);
}

#[test]
fn test_castling_is_reported_in_standard_form() {
    let mut engine = engine(EngineConfig::default().with_search_enabled(false));
    let fen = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";
    engine.set_position(Some(fen), &[]).unwrap();

    let game = engine.game().clone();
    let castle = parse_uci_move(game.board(), "e1g1").unwrap();
    let index = policy_index(game.board(), castle).unwrap();
    engine.set_evaluator(Box::new(FavouriteMove { index }));

    let chosen = engine.best_move(&SearchLimits::default()).unwrap();
    assert_eq!(chosen.mv, castle);
    assert_eq!(chosen.uci, "e1g1");
}

#[test]
fn test_new_game_resets_position() {
    let mut engine = engine(EngineConfig::default());
    engine.set_position(None, &["e2e4"]).unwrap();
    engine.new_game();
    assert_eq!(engine.game().fen(), STARTPOS_FEN);
    assert!(engine.moves().is_empty());
}

#[test]
fn test_no_move_in_finished_game() {
    let mut engine = engine(EngineConfig::default());
    engine
        .set_position(Some("k7/8/1Q6/8/8/8/8/1K6 b - - 0 1"), &[])
        .unwrap();
    let err = engine.best_move(&SearchLimits::simulations(5)).unwrap_err();
    assert!(matches!(err, EngineError::Search(SearchError::NoLegalMoves)));
}

#[test]
fn test_play_move_extends_move_list() {
    let mut engine = engine(EngineConfig::default());
    engine
        .set_position(Some("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1"), &[])
        .unwrap();
    let castle = parse_uci_move(engine.game().board(), "e1g1").unwrap();
    engine.play_move(castle).unwrap();
    assert_eq!(engine.moves(), ["e1g1"]);
    assert_eq!(engine.game().side_to_move(), chess_core::Color::Black);

    // An illegal move leaves game and list untouched
    let before = engine.game().fen();
    assert!(engine.play_move(castle).is_err());
    assert_eq!(engine.game().fen(), before);
    assert_eq!(engine.moves().len(), 1);
}
