//! Interaction state for the visual course editor.
//!
//! ```text
//! Idle ──start_connection(a)──▶ Connecting(a) ──click(b ≠ a)──▶ Idle  (edge a→b)
//!                                    └──────click(a) / cancel──▶ Idle  (no edge)
//! Idle ──pointer_down(n)──▶ Dragging(n) ──pointer_move(x,y)*──▶ ──pointer_up──▶ Idle
//! ```
//!
//! Nothing here touches the network; the graph is saved separately.

use crate::{Result, graph::LessonGraph};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditorMode {
  #[default]
  Idle,
  Connecting { from: String },
  Dragging { node: String },
}

/// What a click did while connecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
  /// A new edge was added.
  Committed,
  /// The connection was abandoned, or the edge already existed.
  Aborted,
  /// The editor was not connecting; the click was only a selection.
  Ignored,
}

/// A lesson graph plus the editor's current interaction mode.
#[derive(Debug, Clone, Default)]
pub struct CourseEditor {
  graph: LessonGraph,
  mode:  EditorMode,
}

impl CourseEditor {
  pub fn new(graph: LessonGraph) -> Self {
    Self {
      graph,
      mode: EditorMode::Idle,
    }
  }

  pub fn graph(&self) -> &LessonGraph { &self.graph }

  /// Direct access for form edits, additions and deletions.
  pub fn graph_mut(&mut self) -> &mut LessonGraph { &mut self.graph }

  pub fn into_graph(self) -> LessonGraph { self.graph }

  pub fn mode(&self) -> &EditorMode { &self.mode }

  /// Enter `Connecting(from)`. Returns `false` if not idle.
  pub fn start_connection(&mut self, from: &str) -> Result<bool> {
    if self.mode != EditorMode::Idle {
      return Ok(false);
    }
    if !self.graph.contains(from) {
      return Err(crate::Error::NodeNotFound(from.to_owned()));
    }
    self.mode = EditorMode::Connecting {
      from: from.to_owned(),
    };
    Ok(true)
  }

  /// Handle a click on node `id`.
  pub fn click_node(&mut self, id: &str) -> Result<ClickOutcome> {
    let EditorMode::Connecting { from } = &self.mode else {
      return Ok(ClickOutcome::Ignored);
    };
    let from = from.clone();
    self.mode = EditorMode::Idle;
    if from == id {
      return Ok(ClickOutcome::Aborted);
    }
    if self.graph.connect(&from, id)? {
      Ok(ClickOutcome::Committed)
    } else {
      Ok(ClickOutcome::Aborted)
    }
  }

  /// Abandon a pending connection or drag.
  pub fn cancel(&mut self) { self.mode = EditorMode::Idle; }

  /// Begin dragging `id`. Returns `false` if not idle.
  pub fn pointer_down(&mut self, id: &str) -> Result<bool> {
    if self.mode != EditorMode::Idle {
      return Ok(false);
    }
    if !self.graph.contains(id) {
      return Err(crate::Error::NodeNotFound(id.to_owned()));
    }
    self.mode = EditorMode::Dragging { node: id.to_owned() };
    Ok(true)
  }

  /// Stream a position update for the dragged node. Ignored unless dragging.
  pub fn pointer_move(&mut self, x: f64, y: f64) -> Result<bool> {
    let EditorMode::Dragging { node } = &self.mode else {
      return Ok(false);
    };
    let node = node.clone();
    self.graph.move_node(&node, x, y)?;
    Ok(true)
  }

  pub fn pointer_up(&mut self) {
    if matches!(self.mode, EditorMode::Dragging { .. }) {
      self.mode = EditorMode::Idle;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    course::{LessonRecord, Position},
    graph::{MAX_COORD, MIN_COORD},
  };

  fn editor() -> CourseEditor {
    let lessons: Vec<_> = ["a", "b", "c"]
      .iter()
      .map(|id| LessonRecord::bare(*id, id.to_uppercase()))
      .collect();
    CourseEditor::new(LessonGraph::from_lessons(&lessons))
  }

  #[test]
  fn connecting_then_clicking_target_commits() {
    let mut ed = editor();
    assert!(ed.start_connection("a").unwrap());
    assert_eq!(ed.mode(), &EditorMode::Connecting { from: "a".into() });

    assert_eq!(ed.click_node("c").unwrap(), ClickOutcome::Committed);
    assert_eq!(ed.mode(), &EditorMode::Idle);
    assert_eq!(ed.graph().get("a").unwrap().connections, vec!["b", "c"]);
  }

  #[test]
  fn clicking_source_aborts() {
    let mut ed = editor();
    ed.start_connection("a").unwrap();
    assert_eq!(ed.click_node("a").unwrap(), ClickOutcome::Aborted);
    assert_eq!(ed.mode(), &EditorMode::Idle);
    assert_eq!(ed.graph().get("a").unwrap().connections, vec!["b"]);
  }

  #[test]
  fn cancel_aborts_connection() {
    let mut ed = editor();
    ed.start_connection("b").unwrap();
    ed.cancel();
    assert_eq!(ed.click_node("a").unwrap(), ClickOutcome::Ignored);
    assert_eq!(ed.graph().get("b").unwrap().connections, vec!["c"]);
  }

  #[test]
  fn drag_streams_clamped_positions() {
    let mut ed = editor();
    assert!(ed.pointer_down("b").unwrap());
    assert!(!ed.start_connection("a").unwrap());

    ed.pointer_move(30.0, 40.0).unwrap();
    ed.pointer_move(120.0, -3.0).unwrap();
    ed.pointer_up();

    assert_eq!(ed.mode(), &EditorMode::Idle);
    assert_eq!(
      ed.graph().get("b").unwrap().position,
      Position { x: MAX_COORD, y: MIN_COORD }
    );
    assert!(!ed.pointer_move(50.0, 50.0).unwrap());
  }

  #[test]
  fn unknown_nodes_are_rejected() {
    let mut ed = editor();
    assert!(ed.start_connection("zzz").is_err());
    assert!(ed.pointer_down("zzz").is_err());
    assert_eq!(ed.mode(), &EditorMode::Idle);
  }
}
