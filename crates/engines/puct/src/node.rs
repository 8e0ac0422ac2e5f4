//! Search tree node representation.
//!
//! Each node is a position reached by playing `mv` from its parent. Values
//! are stored from the point of view of the player who made that move, so
//! a parent simply picks the child with the highest score.

use chess_core::{Game, Move};

/// Index into the node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node's position, computed on first selection rather than at creation.
#[derive(Debug, Clone)]
pub enum NodePosition {
    /// Not built yet: parent's position plus the node's move.
    Pending,
    Materialized(Box<Game>),
}

/// A node in the search tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// Parent node (None for root). Never used for ownership.
    pub parent: Option<NodeId>,

    /// Move that led here from the parent (None for root).
    pub mv: Option<Move>,

    /// Children in expansion order. Move keys are unique per node.
    pub children: Vec<NodeId>,

    pub visits: u32,

    /// Sum of backed-up values, preset to the first-play urgency value.
    pub value_sum: f32,

    /// Policy prior assigned when the parent was expanded.
    pub prior: f32,

    pub position: NodePosition,

    /// Set once the evaluator has produced children for this node.
    pub expanded: bool,

    /// Win/draw/loss of the evaluation, when the network reports one.
    pub wdl: Option<[f32; 3]>,
}

impl Node {
    pub fn new_root(game: Game) -> Self {
        Self {
            parent: None,
            mv: None,
            children: Vec::new(),
            visits: 0,
            value_sum: 0.0,
            prior: 1.0,
            position: NodePosition::Materialized(Box::new(game)),
            expanded: false,
            wdl: None,
        }
    }

    pub fn new_child(parent: NodeId, mv: Move, prior: f32, initial_value: f32) -> Self {
        Self {
            parent: Some(parent),
            mv: Some(mv),
            children: Vec::new(),
            visits: 0,
            value_sum: initial_value,
            prior,
            position: NodePosition::Pending,
            expanded: false,
            wdl: None,
        }
    }

    pub fn game(&self) -> Option<&Game> {
        match &self.position {
            NodePosition::Materialized(game) => Some(game),
            NodePosition::Pending => None,
        }
    }

    pub fn is_materialized(&self) -> bool {
        matches!(self.position, NodePosition::Materialized(_))
    }

    /// Q = value_sum / (1 + visits). The +1 keeps unvisited nodes finite
    /// and damps early estimates.
    #[inline]
    pub fn mean_value(&self) -> f32 {
        self.value_sum / (1.0 + self.visits as f32)
    }

    /// PUCT score: Q + c_puct * sqrt(N_parent) * P / (1 + N).
    ///
    /// Takes pre-computed sqrt(parent_visits) so siblings share one sqrt.
    #[inline]
    pub fn puct_score(&self, parent_visits_sqrt: f32, c_puct: f32) -> f32 {
        let u = parent_visits_sqrt * self.prior / (1.0 + self.visits as f32);
        self.mean_value() + c_puct * u
    }
}
