//! The game tree: positions linked by moves, stored in a per-game arena.
//!
//! Node ids are arena indices. They are only meaningful within the game
//! that issued them and stay valid until the node is deleted; deleted slots
//! are never reused.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, ParseError};
use crate::fen::START_FEN;
use crate::moves::Move;
use crate::pgn::{self, Tags};
use crate::piece::{Color, PieceKind};
use crate::position::Position;
use crate::san;
use crate::square::Square;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug)]
pub struct Node {
    id: NodeId,
    parent: Option<NodeId>,
    mv: Option<Move>,
    san: Option<String>,
    position: Position,
    children: Vec<NodeId>,
    comment: String,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The move leading here; `None` at the root.
    pub fn mv(&self) -> Option<&Move> {
        self.mv.as_ref()
    }

    /// SAN of the move leading here.
    pub fn notation(&self) -> Option<&str> {
        self.san.as_deref()
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Child 0 is the mainline continuation, the rest are variations.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// What a UI needs to render one node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub fen: String,
    pub side_to_play: Color,
    pub legal_moves: Vec<String>,
    pub san: Option<String>,
    pub comment: String,
    pub children: Vec<NodeId>,
    pub check: bool,
    pub checkmate: bool,
    pub stalemate: bool,
}

impl NodeSnapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[derive(Clone, Debug)]
pub struct Game {
    tags: Tags,
    nodes: Vec<Option<Node>>,
    source_path: Option<PathBuf>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new_empty()
    }
}

impl Game {
    /// A game holding only the standard initial position.
    pub fn new_empty() -> Self {
        Self::with_root(Position::new(), Tags::new())
    }

    /// A game starting from a set-up position. The FEN tag is recorded so
    /// the PGN output can be read back.
    pub fn from_position(position: Position) -> Self {
        let fen = position.to_fen();
        let mut tags = Tags::new();
        if fen != START_FEN {
            tags.set("SetUp", "1");
            tags.set("FEN", fen);
        }
        Self::with_root(position, tags)
    }

    pub(crate) fn with_root(position: Position, tags: Tags) -> Self {
        let root = Node {
            id: NodeId(0),
            parent: None,
            mv: None,
            san: None,
            position,
            children: Vec::new(),
            comment: String::new(),
        };
        Game {
            tags,
            nodes: vec![Some(root)],
            source_path: None,
        }
    }

    pub fn from_pgn(bytes: &[u8]) -> Result<Game, ParseError> {
        pgn::read(bytes)
    }

    pub fn to_pgn(&self) -> Vec<u8> {
        pgn::write(self)
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    /// # Panics
    ///
    /// If `id` was not issued by this game or its node was deleted.
    pub fn node(&self, id: NodeId) -> &Node {
        self.get(id)
            .unwrap_or_else(|| panic!("node {id} does not exist in this game"))
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut Node, DomainError> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(DomainError::UnknownNode(id.0))
    }

    fn existing(&self, id: NodeId) -> Result<&Node, DomainError> {
        self.get(id).ok_or(DomainError::UnknownNode(id.0))
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.node(self.root()).children.is_empty()
    }

    /// Append `mv` below `parent` as a new child. The move must be legal in
    /// the parent position; its flags are taken from the legal move list.
    pub fn append(&mut self, parent: NodeId, mv: Move) -> Result<NodeId, DomainError> {
        let position = &self.existing(parent)?.position;
        let illegal = DomainError::IllegalMove {
            from: mv.from,
            to: mv.to,
        };
        let legal = position.move_if_valid(mv.from, mv.to).ok_or(illegal.clone())?;
        let legal = match mv.promotion {
            Some(kind) if legal.promotion != Some(kind) => {
                position.with_promotion(legal, kind).ok_or(illegal)?
            }
            _ => legal,
        };
        Ok(self.push_child(parent, legal))
    }

    /// Play a move the way a board UI submits it. If the same move already
    /// exists below `node`, that child is returned instead of a duplicate.
    pub fn play(
        &mut self,
        node: NodeId,
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
    ) -> Result<NodeId, DomainError> {
        let current = self.existing(node)?;
        let position = &current.position;
        let illegal = DomainError::IllegalMove { from, to };
        let mut mv = position.move_if_valid(from, to).ok_or(illegal.clone())?;
        if let Some(kind) = promotion {
            mv = position.with_promotion(mv, kind).ok_or(illegal)?;
        }

        let existing = current.children.iter().copied().find(|&child| {
            self.node(child)
                .mv
                .map_or(false, |played| played.same_action(&mv))
        });
        match existing {
            Some(child) => Ok(child),
            None => Ok(self.push_child(node, mv)),
        }
    }

    /// Add a child without checking legality; `mv` must come from the parent
    /// position's legal moves.
    pub(crate) fn push_child(&mut self, parent: NodeId, mv: Move) -> NodeId {
        let id = NodeId(self.nodes.len());
        let parent_node = self.node(parent);
        let san = san::encode(&mv, &parent_node.position);
        let position = parent_node.position.apply(&mv);
        self.nodes.push(Some(Node {
            id,
            parent: Some(parent),
            mv: Some(mv),
            san: Some(san),
            position,
            children: Vec::new(),
            comment: String::new(),
        }));
        if let Some(Some(p)) = self.nodes.get_mut(parent.0) {
            p.children.push(id);
        }
        id
    }

    /// Replace the comment of `id`. Braces are removed and whitespace runs
    /// collapse to single spaces.
    pub fn set_comment(&mut self, id: NodeId, text: &str) -> Result<(), DomainError> {
        let node = self.get_mut(id)?;
        node.comment = normalize_comment(text);
        Ok(())
    }

    pub(crate) fn append_comment(&mut self, id: NodeId, text: &str) {
        if let Ok(node) = self.get_mut(id) {
            let text = normalize_comment(text);
            if text.is_empty() {
                return;
            }
            if node.comment.is_empty() {
                node.comment = text;
            } else {
                node.comment.push(' ');
                node.comment.push_str(&text);
            }
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent
    }

    /// Mainline continuation of `id`.
    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.children.first().copied()
    }

    /// Mainline nodes after the root, in playing order.
    pub fn mainline(&self) -> Vec<NodeId> {
        let mut line = Vec::new();
        let mut current = self.root();
        while let Some(next) = self.next(current) {
            line.push(next);
            current = next;
        }
        line
    }

    /// Tail of the mainline; the root for a game without moves.
    pub fn last_position(&self) -> NodeId {
        self.mainline().last().copied().unwrap_or_else(|| self.root())
    }

    /// Nodes from the first move down to `id`, inclusive. Empty for the root.
    pub fn line_to(&self, id: NodeId) -> Vec<NodeId> {
        let mut line = Vec::new();
        let mut current = self.get(id).map(|n| n.id);
        while let Some(node) = current.and_then(|c| self.get(c)) {
            if node.parent.is_none() {
                break;
            }
            line.push(node.id);
            current = node.parent;
        }
        line.reverse();
        line
    }

    /// Half-moves played from the root to reach `id`.
    pub fn ply(&self, id: NodeId) -> usize {
        self.line_to(id).len()
    }

    /// Full-move number of the move leading to `id`, as printed in PGN.
    pub fn move_number(&self, id: NodeId) -> u32 {
        let node = self.node(id);
        match node.parent {
            Some(parent) => self.node(parent).position.fullmove_number(),
            None => node.position.fullmove_number(),
        }
    }

    /// Move `id` one slot earlier among its siblings. A variation in slot 1
    /// becomes the mainline.
    pub fn promote_variation(&mut self, id: NodeId) -> Result<(), DomainError> {
        let parent = self.existing(id)?.parent.ok_or(DomainError::RootNode)?;
        let siblings = &mut self.get_mut(parent)?.children;
        if let Some(slot) = siblings.iter().position(|&c| c == id) {
            if slot > 0 {
                siblings.swap(slot - 1, slot);
            }
        }
        Ok(())
    }

    /// Remove `id` and everything below it.
    pub fn delete_subtree(&mut self, id: NodeId) -> Result<(), DomainError> {
        let parent = self.existing(id)?.parent.ok_or(DomainError::RootNode)?;
        self.get_mut(parent)?.children.retain(|&c| c != id);

        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(node) = self.nodes.get_mut(next.0).and_then(Option::take) {
                pending.extend(node.children);
            }
        }
        Ok(())
    }

    pub fn snapshot(&self, id: NodeId) -> Option<NodeSnapshot> {
        let node = self.get(id)?;
        let position = &node.position;
        Some(NodeSnapshot {
            id,
            fen: position.to_fen(),
            side_to_play: position.side_to_play(),
            legal_moves: position.legal_moves().iter().map(Move::to_uci).collect(),
            san: node.san.clone(),
            comment: node.comment.clone(),
            children: node.children.clone(),
            check: position.is_check(),
            checkmate: position.is_checkmate(),
            stalemate: position.is_stalemate(),
        })
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key)
    }

    /// Set a tag, keeping its position if it already exists. Line breaks in
    /// the value are written as spaces.
    pub fn set_tag(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), DomainError> {
        let key = key.into();
        if !pgn::is_valid_key(&key) {
            return Err(DomainError::InvalidTagKey(key));
        }
        self.tags.set(key, value);
        Ok(())
    }

    pub fn remove_tag(&mut self, key: &str) -> Option<String> {
        self.tags.remove(key)
    }

    /// Where the game was loaded from, if it came from a library.
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    pub fn set_source_path(&mut self, path: impl Into<PathBuf>) {
        self.source_path = Some(path.into());
    }
}

fn normalize_comment(text: &str) -> String {
    text.split(|c: char| c.is_whitespace() || c == '{' || c == '}')
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    fn play_line(game: &mut Game, from: NodeId, moves: &[&str]) -> NodeId {
        moves.iter().fold(from, |node, uci| {
            let mv = game.node(node).position().move_from_uci(uci).unwrap();
            game.append(node, mv).unwrap()
        })
    }

    #[test]
    fn mainline_and_variations_keep_insertion_order() {
        let mut game = Game::new_empty();
        let root = game.root();
        let e4 = play_line(&mut game, root, &["e2e4"]);
        let e5 = play_line(&mut game, e4, &["e7e5"]);
        let c5 = play_line(&mut game, e4, &["c7c5"]);
        assert_eq!(game.node(e4).children(), &[e5, c5]);
        assert_eq!(game.mainline(), vec![e4, e5]);
        assert_eq!(game.last_position(), e5);
        assert_eq!(game.node(c5).notation(), Some("c5"));
        assert_eq!(game.line_to(c5), vec![e4, c5]);
        assert_eq!(game.ply(c5), 2);
        assert_eq!(game.move_number(c5), 1);
        assert_eq!(game.parent(c5), Some(e4));
        assert_eq!(game.next(root), Some(e4));
    }

    #[test]
    fn play_reuses_an_identical_child() {
        let mut game = Game::new_empty();
        let root = game.root();
        let first = game.play(root, sq("e2"), sq("e4"), None).unwrap();
        let again = game.play(root, sq("e2"), sq("e4"), None).unwrap();
        assert_eq!(first, again);
        assert_eq!(game.node(root).children().len(), 1);
        assert_eq!(
            game.play(root, sq("e2"), sq("e5"), None),
            Err(DomainError::IllegalMove {
                from: sq("e2"),
                to: sq("e5")
            })
        );
        assert_eq!(
            game.play(root, sq("e2"), sq("e4"), Some(PieceKind::Queen)),
            Err(DomainError::IllegalMove {
                from: sq("e2"),
                to: sq("e4")
            })
        );
    }

    #[test]
    fn promotion_choice_reaches_the_tree() {
        let position = Position::from_fen("4k3/1P6/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let mut game = Game::from_position(position);
        assert_eq!(game.tag("SetUp"), Some("1"));
        let root = game.root();
        let knight = game.play(root, sq("b7"), sq("b8"), Some(PieceKind::Knight)).unwrap();
        assert_eq!(game.node(knight).notation(), Some("b8=N"));
        let queen = game.play(root, sq("b7"), sq("b8"), None).unwrap();
        assert_ne!(knight, queen);
        assert_eq!(game.node(queen).notation(), Some("b8=Q+"));
    }

    #[test]
    fn comments_are_normalized() {
        let mut game = Game::new_empty();
        let root = game.root();
        game.set_comment(root, "  a {braced}\n comment ").unwrap();
        assert_eq!(game.node(root).comment(), "a braced comment");
        game.append_comment(root, "more");
        assert_eq!(game.node(root).comment(), "a braced comment more");
    }

    #[test]
    fn promote_and_delete_variations() {
        let mut game = Game::new_empty();
        let root = game.root();
        let e4 = play_line(&mut game, root, &["e2e4"]);
        let d4 = play_line(&mut game, root, &["d2d4"]);
        let d5 = play_line(&mut game, d4, &["d7d5"]);

        game.promote_variation(d4).unwrap();
        assert_eq!(game.mainline(), vec![d4, d5]);
        assert_eq!(game.promote_variation(root), Err(DomainError::RootNode));

        game.delete_subtree(d4).unwrap();
        assert_eq!(game.mainline(), vec![e4]);
        assert!(game.get(d5).is_none());
        assert_eq!(game.len(), 2);
        assert_eq!(game.set_comment(d5, "x"), Err(DomainError::UnknownNode(d5.index())));
    }

    #[test]
    fn snapshot_reports_the_position() {
        let mut game = Game::new_empty();
        let root = game.root();
        let snapshot = game.snapshot(root).unwrap();
        assert_eq!(snapshot.legal_moves.len(), 20);
        assert_eq!(snapshot.fen, START_FEN);
        let tip = play_line(&mut game, root, &["f2f3", "e7e5", "g2g4", "d8h4"]);
        let snapshot = game.snapshot(tip).unwrap();
        assert!(snapshot.checkmate);
        assert!(snapshot.legal_moves.is_empty());
        assert_eq!(snapshot.san.as_deref(), Some("Qh4#"));
        let json = snapshot.to_json().unwrap();
        assert!(json.contains("\"checkmate\":true"));
    }
}
