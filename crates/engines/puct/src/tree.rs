//! Search tree with arena allocation.
//!
//! Nodes live in a contiguous Vec and are referenced by [`NodeId`]. The
//! root is always `NodeId(0)`. A tree belongs to exactly one search call.

use chess_core::{Game, Move, RulesError};

use crate::node::{Node, NodeId, NodePosition};

#[derive(Debug)]
pub struct SearchTree {
    nodes: Vec<Node>,
}

impl SearchTree {
    /// Create a tree whose root holds `game`.
    pub fn new(game: Game) -> Self {
        Self {
            nodes: vec![Node::new_root(game)],
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.get(id).children
    }

    /// Position of a node, if it has been materialized.
    pub fn game(&self, id: NodeId) -> Option<&Game> {
        self.get(id).game()
    }

    /// Append a child to `parent` and return its id.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        mv: Move,
        prior: f32,
        initial_value: f32,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new_child(parent, mv, prior, initial_value));
        self.get_mut(parent).children.push(id);
        id
    }

    /// Create one child per `(move, prior)` pair and mark `id` expanded.
    pub fn expand(
        &mut self,
        id: NodeId,
        priors: &[(Move, f32)],
        initial_value: f32,
        wdl: Option<[f32; 3]>,
    ) {
        for &(mv, prior) in priors {
            self.add_child(id, mv, prior, initial_value);
        }
        let node = self.get_mut(id);
        node.expanded = true;
        node.wdl = wdl;
    }

    /// Child of `id` with the highest PUCT score; the first one wins ties.
    pub fn select_child(&self, id: NodeId, c_puct: f32) -> Option<NodeId> {
        let node = self.get(id);
        let parent_visits_sqrt = (node.visits as f32).sqrt();

        let mut best: Option<(NodeId, f32)> = None;
        for &child in &node.children {
            let score = self.get(child).puct_score(parent_visits_sqrt, c_puct);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((child, score));
            }
        }
        best.map(|(child, _)| child)
    }

    /// Build the position of `id` from its parent's, materializing
    /// ancestors first if needed. No-op when already materialized.
    pub fn materialize(&mut self, id: NodeId) -> Result<(), RulesError> {
        let node = self.get(id);
        if node.is_materialized() {
            return Ok(());
        }
        let (Some(parent), Some(mv)) = (node.parent, node.mv) else {
            // Only the root lacks a parent, and it is created materialized.
            return Ok(());
        };

        self.materialize(parent)?;
        let game = match self.game(parent) {
            Some(parent_game) => parent_game.after(mv)?,
            None => return Ok(()),
        };
        self.get_mut(id).position = NodePosition::Materialized(Box::new(game));
        Ok(())
    }

    /// Propagate `value` (from the leaf's side-to-move view) to the root.
    ///
    /// The leaf receives `-value` because it is scored from the mover into
    /// it; the sign flips at every level. Every node on the path, root
    /// included, gets exactly one visit.
    pub fn backup(&mut self, leaf: NodeId, value: f32) {
        let mut current = leaf;
        let mut signed = -value;
        loop {
            let node = self.get_mut(current);
            node.visits += 1;
            node.value_sum += signed;
            match node.parent {
                Some(parent) => {
                    current = parent;
                    signed = -signed;
                }
                None => break,
            }
        }
    }
}
