//! End-to-end behaviour of the engine through its public API.

use chess_core::{Game, SearchLimits, STARTPOS_FEN};
use puct_engine::{
    decode_policy, encode_position, EngineConfig, PuctEngine, SearchConfig, UctSearch,
    UniformEvaluator, ValueSchema, POLICY_SIZE,
};

const POSITIONS: [&str; 5] = [
    STARTPOS_FEN,
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R b KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "n1n5/PPPk4/8/8/8/8/4Kppp/5N1N b - - 0 1",
];

#[test]
fn test_encoder_shape_for_all_positions() {
    for fen in POSITIONS {
        let game = Game::from_fen(fen).unwrap();
        let planes = encode_position(game.board()).unwrap();
        assert_eq!(planes.shape(), [112, 8, 8], "{fen}");
        assert_eq!(planes.as_slice().len(), 112 * 64);
    }
}

#[test]
fn test_decoder_probabilities_are_valid() {
    for fen in POSITIONS {
        let game = Game::from_fen(fen).unwrap();
        let raw: Vec<f32> = (0..POLICY_SIZE).map(|i| (i as f32 * 0.61).sin() * 4.0).collect();
        let priors = decode_policy(game.board(), &raw);

        assert_eq!(priors.len(), game.legal_moves().len(), "{fen}");
        assert!(priors.iter().all(|(_, p)| *p >= 0.0));
        let total: f32 = priors.iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-4, "{fen}: sum {total}");
    }
}

#[test]
fn test_search_visits_match_simulations_everywhere() {
    let config = SearchConfig::default();
    let evaluator = UniformEvaluator::new().with_schema(ValueSchema::Wdl);
    for fen in POSITIONS {
        let game = Game::from_fen(fen).unwrap();
        let outcome = UctSearch::new(&evaluator, &config)
            .run(&game, &SearchLimits::simulations(25))
            .unwrap();
        assert_eq!(outcome.stats.root_visits, 25, "{fen}");
        assert!(game.is_legal(outcome.best_move), "{fen}");
    }
}

#[test]
fn test_engine_plays_a_short_game() {
    let mut engine = PuctEngine::new(EngineConfig::default());
    engine.set_evaluator(Box::new(UniformEvaluator::new()));

    let mut played: Vec<String> = Vec::new();
    for _ in 0..6 {
        let moves: Vec<&str> = played.iter().map(String::as_str).collect();
        engine.set_position(None, &moves).unwrap();
        if engine.game().is_terminal() {
            break;
        }
        let chosen = engine.best_move(&SearchLimits::simulations(20)).unwrap();
        played.push(chosen.uci);
    }

    engine.set_position(None, &played.iter().map(String::as_str).collect::<Vec<_>>()).unwrap();
    assert_eq!(engine.moves(), played.as_slice());
    assert_eq!(engine.game().ply() as usize, played.len());
}
