//! The lesson graph: a course as positioned nodes joined by directed edges.
//!
//! A graph is built from a course's stored lessons by [`LessonGraph::load`],
//! edited in memory, and written back through [`crate::adapter`]. Edges may
//! point at ids that no longer exist; traversal skips them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  course::{Course, LessonRecord, LessonType, Position, lessons_from_value},
};

/// Nodes are kept inside this band on each axis so they stay on the canvas.
pub const MIN_COORD: f64 = 5.0;
pub const MAX_COORD: f64 = 95.0;

/// Fallback layout: nodes per row.
const ROW_LEN: usize = 4;

/// Where the `index`-th lesson goes when it has no stored position.
pub fn fallback_position(index: usize) -> Position {
  let col = (index % ROW_LEN) as f64;
  let row = (index / ROW_LEN) as f64;
  Position {
    x: 20.0 + col * 25.0,
    y: 80.0 - row * 20.0,
  }
}

fn clamp_coord(v: f64) -> f64 {
  if v.is_nan() { MIN_COORD } else { v.clamp(MIN_COORD, MAX_COORD) }
}

// ─── Node ────────────────────────────────────────────────────────────────────

/// A lesson on the course map, with every field present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonNode {
  pub id:             String,
  pub title:          String,
  pub description:    String,
  #[serde(rename = "type")]
  pub kind:           LessonType,
  pub position:       Position,
  pub connections:    Vec<String>,
  pub prerequisites:  Vec<String>,
  pub xp_reward:      u32,
  pub estimated_time: String,
  pub content:        Option<String>,
  pub video_url:      Option<String>,
  pub pdf_url:        Option<String>,
  pub order:          i64,
}

/// The editable fields of a node, as shown in the editor's form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeFields {
  pub title:          String,
  pub description:    String,
  #[serde(rename = "type")]
  pub kind:           LessonType,
  pub xp_reward:      u32,
  pub estimated_time: String,
  pub content:        Option<String>,
  pub video_url:      Option<String>,
  pub pdf_url:        Option<String>,
  pub order:          i64,
}

impl From<&LessonNode> for NodeFields {
  fn from(n: &LessonNode) -> Self {
    Self {
      title:          n.title.clone(),
      description:    n.description.clone(),
      kind:           n.kind,
      xp_reward:      n.xp_reward,
      estimated_time: n.estimated_time.clone(),
      content:        n.content.clone(),
      video_url:      n.video_url.clone(),
      pdf_url:        n.pdf_url.clone(),
      order:          n.order,
    }
  }
}

/// Returned by [`LessonGraph::add_node`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewNode {
  pub id:   String,
  /// Pre-filled with the new node's values.
  pub form: NodeFields,
}

// ─── Graph ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LessonGraph {
  nodes: Vec<LessonNode>,
}

impl LessonGraph {
  /// Build the graph for `course`, filling in layout and edges that older
  /// documents do not store.
  pub fn load(course: &Course) -> Self { Self::from_lessons(&course.lessons) }

  /// Build the graph from a raw stored `lessons` value. Anything other than
  /// an array yields an empty graph.
  pub fn from_stored(lessons: &serde_json::Value) -> Self {
    Self::from_lessons(&lessons_from_value(lessons))
  }

  pub fn from_lessons(lessons: &[LessonRecord]) -> Self {
    let mut seen = std::collections::HashSet::new();
    let lessons: Vec<&LessonRecord> = lessons
      .iter()
      .filter(|l| !l.id.is_empty() && seen.insert(l.id.as_str()))
      .collect();

    let nodes = lessons
      .iter()
      .enumerate()
      .map(|(i, l)| {
        let next = lessons.get(i + 1).map(|n| n.id.clone());
        let prev = i.checked_sub(1).map(|p| lessons[p].id.clone());
        LessonNode {
          id:             l.id.clone(),
          title:          l.title.clone(),
          description:    l.description.clone(),
          kind:           l.kind,
          position:       l.position.unwrap_or_else(|| fallback_position(i)),
          connections:    dedup(
            l.connections.clone().unwrap_or_else(|| next.into_iter().collect()),
          ),
          prerequisites:  dedup(
            l.prerequisites.clone().unwrap_or_else(|| prev.into_iter().collect()),
          ),
          xp_reward:      l.xp,
          estimated_time: l.estimated_time.clone(),
          content:        l.content.clone(),
          video_url:      l.video_url.clone(),
          pdf_url:        l.pdf_url.clone(),
          order:          l.order.unwrap_or(i as i64),
        }
      })
      .collect();

    Self { nodes }
  }

  pub fn nodes(&self) -> &[LessonNode] { &self.nodes }

  pub fn len(&self) -> usize { self.nodes.len() }

  pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

  pub fn get(&self, id: &str) -> Option<&LessonNode> {
    self.nodes.iter().find(|n| n.id == id)
  }

  pub fn contains(&self, id: &str) -> bool { self.get(id).is_some() }

  fn get_mut(&mut self, id: &str) -> Result<&mut LessonNode> {
    self
      .nodes
      .iter_mut()
      .find(|n| n.id == id)
      .ok_or_else(|| Error::NodeNotFound(id.to_owned()))
  }

  /// Nodes reachable by one edge from `id`. Dangling edges are skipped.
  pub fn successors<'a>(
    &'a self,
    id: &str,
  ) -> impl Iterator<Item = &'a LessonNode> + 'a {
    let targets = self
      .get(id)
      .map(|n| n.connections.as_slice())
      .unwrap_or_default();
    targets.iter().filter_map(|t| self.get(t))
  }

  /// Every `(from, to)` edge or prerequisite whose target does not exist.
  pub fn dangling_references(&self) -> Vec<(String, String)> {
    self
      .nodes
      .iter()
      .flat_map(|n| {
        n.connections
          .iter()
          .chain(n.prerequisites.iter())
          .filter(move |t| !self.contains(t))
          .map(move |t| (n.id.clone(), t.clone()))
      })
      .collect()
  }

  // ── Mutations ─────────────────────────────────────────────────────────────

  /// Append a blank reading lesson and return its id and form values.
  pub fn add_node(&mut self) -> NewNode {
    let id = loop {
      let candidate = format!("lesson-{}", Uuid::new_v4().simple());
      if !self.contains(&candidate) {
        break candidate;
      }
    };
    let order = self.nodes.iter().map(|n| n.order).max().map_or(0, |m| m + 1);
    let node = LessonNode {
      id:             id.clone(),
      title:          "New Lesson".to_owned(),
      description:    String::new(),
      kind:           LessonType::Reading,
      position:       fallback_position(self.nodes.len()),
      connections:    Vec::new(),
      prerequisites:  Vec::new(),
      xp_reward:      100,
      estimated_time: "15 min".to_owned(),
      content:        None,
      video_url:      None,
      pdf_url:        None,
      order,
    };
    let form = NodeFields::from(&node);
    self.nodes.push(node);
    NewNode { id, form }
  }

  /// Overwrite every editable field of `id`.
  pub fn edit_node(&mut self, id: &str, fields: NodeFields) -> Result<()> {
    let node = self.get_mut(id)?;
    node.title = fields.title;
    node.description = fields.description;
    node.kind = fields.kind;
    node.xp_reward = fields.xp_reward;
    node.estimated_time = fields.estimated_time;
    node.content = fields.content;
    node.video_url = fields.video_url;
    node.pdf_url = fields.pdf_url;
    node.order = fields.order;
    Ok(())
  }

  /// Remove `id` and every reference to it held by other nodes.
  pub fn delete_node(&mut self, id: &str) -> Result<LessonNode> {
    let idx = self
      .nodes
      .iter()
      .position(|n| n.id == id)
      .ok_or_else(|| Error::NodeNotFound(id.to_owned()))?;
    let removed = self.nodes.remove(idx);
    for node in &mut self.nodes {
      node.connections.retain(|c| c != id);
      node.prerequisites.retain(|p| p != id);
    }
    Ok(removed)
  }

  /// Add the edge `from → to`. Returns `false` for self-loops and edges that
  /// already exist.
  pub fn connect(&mut self, from: &str, to: &str) -> Result<bool> {
    if !self.contains(to) {
      return Err(Error::NodeNotFound(to.to_owned()));
    }
    let node = self.get_mut(from)?;
    if from == to || node.connections.iter().any(|c| c == to) {
      return Ok(false);
    }
    node.connections.push(to.to_owned());
    Ok(true)
  }

  /// Remove the edge `from → to`. Returns `false` if it was not there.
  pub fn disconnect(&mut self, from: &str, to: &str) -> Result<bool> {
    let node = self.get_mut(from)?;
    let before = node.connections.len();
    node.connections.retain(|c| c != to);
    Ok(node.connections.len() != before)
  }

  /// Move `id`, clamping each axis to `[MIN_COORD, MAX_COORD]`.
  pub fn move_node(&mut self, id: &str, x: f64, y: f64) -> Result<Position> {
    let node = self.get_mut(id)?;
    node.position = Position {
      x: clamp_coord(x),
      y: clamp_coord(y),
    };
    Ok(node.position)
  }
}

fn dedup(ids: Vec<String>) -> Vec<String> {
  let mut out: Vec<String> = Vec::with_capacity(ids.len());
  for id in ids {
    if !out.contains(&id) {
      out.push(id);
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn flat_lessons(n: usize) -> Vec<LessonRecord> {
    (0..n)
      .map(|i| LessonRecord::bare(format!("l{i}"), format!("Lesson {i}")))
      .collect()
  }

  #[test]
  fn default_layout_is_a_chain() {
    let graph = LessonGraph::from_lessons(&flat_lessons(6));
    let nodes = graph.nodes();

    for i in 0..5 {
      assert_eq!(nodes[i].connections, vec![format!("l{}", i + 1)]);
    }
    assert!(nodes[5].connections.is_empty());
    assert!(nodes[0].prerequisites.is_empty());
    assert_eq!(nodes[3].prerequisites, vec!["l2"]);
    assert_eq!(nodes[4].order, 4);
  }

  #[test]
  fn fallback_positions_fill_rows_of_four() {
    let graph = LessonGraph::from_lessons(&flat_lessons(6));
    let nodes = graph.nodes();
    assert_eq!(nodes[0].position, Position { x: 20.0, y: 80.0 });
    assert_eq!(nodes[3].position, Position { x: 95.0, y: 80.0 });
    assert_eq!(nodes[4].position, Position { x: 20.0, y: 60.0 });
    assert_eq!(nodes[5].position, Position { x: 45.0, y: 60.0 });
  }

  #[test]
  fn stored_layout_is_kept() {
    let mut lessons = flat_lessons(3);
    lessons[0].position = Some(Position { x: 50.0, y: 50.0 });
    lessons[0].connections = Some(vec!["l2".into()]);
    lessons[2].connections = Some(vec![]);
    let graph = LessonGraph::from_lessons(&lessons);

    assert_eq!(graph.nodes()[0].position, Position { x: 50.0, y: 50.0 });
    assert_eq!(graph.nodes()[0].connections, vec!["l2"]);
    assert_eq!(graph.nodes()[1].connections, vec!["l2"]);
    assert!(graph.nodes()[2].connections.is_empty());
  }

  #[test]
  fn malformed_lessons_value_gives_empty_graph() {
    assert!(LessonGraph::from_stored(&json!("oops")).is_empty());
    assert!(LessonGraph::from_stored(&json!(null)).is_empty());
    assert_eq!(LessonGraph::from_stored(&json!([{ "id": "a" }])).len(), 1);
  }

  #[test]
  fn duplicate_ids_keep_first() {
    let mut lessons = flat_lessons(2);
    lessons.push(LessonRecord::bare("l0", "Shadow"));
    let graph = LessonGraph::from_lessons(&lessons);
    assert_eq!(graph.len(), 2);
    assert_eq!(graph.get("l0").unwrap().title, "Lesson 0");
  }

  #[test]
  fn delete_strips_every_reference() {
    let mut graph = LessonGraph::from_lessons(&flat_lessons(4));
    graph.connect("l0", "l2").unwrap();
    graph.connect("l3", "l2").unwrap();

    graph.delete_node("l2").unwrap();

    assert!(!graph.contains("l2"));
    for node in graph.nodes() {
      assert!(!node.connections.iter().any(|c| c == "l2"), "{node:?}");
      assert!(!node.prerequisites.iter().any(|p| p == "l2"), "{node:?}");
    }
    assert!(graph.dangling_references().is_empty());
  }

  #[test]
  fn delete_missing_node_errors() {
    let mut graph = LessonGraph::from_lessons(&flat_lessons(1));
    assert!(matches!(graph.delete_node("nope"), Err(Error::NodeNotFound(_))));
  }

  #[test]
  fn connect_rejects_self_loops_and_duplicates() {
    let mut graph = LessonGraph::from_lessons(&flat_lessons(3));
    assert!(!graph.connect("l1", "l1").unwrap());
    assert!(!graph.connect("l0", "l1").unwrap());
    assert!(graph.connect("l0", "l2").unwrap());
    assert_eq!(graph.get("l0").unwrap().connections, vec!["l1", "l2"]);
    assert!(graph.connect("l0", "ghost").is_err());
  }

  #[test]
  fn disconnect_removes_edge() {
    let mut graph = LessonGraph::from_lessons(&flat_lessons(2));
    assert!(graph.disconnect("l0", "l1").unwrap());
    assert!(!graph.disconnect("l0", "l1").unwrap());
    assert!(graph.get("l0").unwrap().connections.is_empty());
  }

  #[test]
  fn move_clamps_each_axis() {
    let mut graph = LessonGraph::from_lessons(&flat_lessons(1));
    let cases = [
      (-40.0, 200.0),
      (0.0, 0.0),
      (100.0, 100.0),
      (f64::INFINITY, f64::NEG_INFINITY),
      (f64::NAN, 50.0),
      (42.0, 57.5),
    ];
    for (x, y) in cases {
      let p = graph.move_node("l0", x, y).unwrap();
      assert!((MIN_COORD..=MAX_COORD).contains(&p.x), "x={} from {x}", p.x);
      assert!((MIN_COORD..=MAX_COORD).contains(&p.y), "y={} from {y}", p.y);
    }
    assert_eq!(graph.get("l0").unwrap().position, Position { x: 42.0, y: 57.5 });
  }

  #[test]
  fn add_node_prefills_form() {
    let mut graph = LessonGraph::from_lessons(&flat_lessons(2));
    let new = graph.add_node();
    let node = graph.get(&new.id).unwrap();

    assert_eq!(node.kind, LessonType::Reading);
    assert!(node.connections.is_empty());
    assert_eq!(node.order, 2);
    assert_eq!(new.form, NodeFields::from(node));

    let other = graph.add_node();
    assert_ne!(new.id, other.id);
  }

  #[test]
  fn edit_node_overwrites_fields() {
    let mut graph = LessonGraph::from_lessons(&flat_lessons(1));
    let mut fields = NodeFields::from(graph.get("l0").unwrap());
    fields.title = "Neural nets".into();
    fields.kind = LessonType::Quiz;
    fields.xp_reward = 250;
    graph.edit_node("l0", fields).unwrap();

    let node = graph.get("l0").unwrap();
    assert_eq!(node.title, "Neural nets");
    assert_eq!(node.kind, LessonType::Quiz);
    assert_eq!(node.xp_reward, 250);
  }

  #[test]
  fn successors_skip_dangling_edges() {
    let mut lessons = flat_lessons(2);
    lessons[0].connections = Some(vec!["gone".into(), "l1".into()]);
    let graph = LessonGraph::from_lessons(&lessons);

    let next: Vec<_> = graph.successors("l0").map(|n| n.id.as_str()).collect();
    assert_eq!(next, vec!["l1"]);
    assert_eq!(graph.dangling_references(), vec![("l0".to_string(), "gone".to_string())]);
    assert_eq!(graph.successors("missing").count(), 0);
  }
}
