//! The id-addressed value graph.
//!
//! A [`Graph`] is an arena `{id -> Node}`. Containers hold child ids, not
//! inlined values — dereferencing means looking the id up in the same
//! mapping, so cycles and shared children (a DAG in practice, though not
//! enforced as one) fall out for free instead of fighting the borrow checker.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::value::{Value, ValueType};

/// Value-graph node id. The wire ceiling for newly allocated ids is 2^16,
/// even though ids observed from the wire may use the full `u32` range.
pub type Id = u32;

/// The ceiling below which the server-role allocator must find a free id.
pub const ALLOCATABLE_ID_CEILING: Id = 1 << 16;

/// Guards [`Graph::materialize`] against unbounded recursion; revisiting an
/// id already on the current path is treated as a cycle and yields
/// [`Value::Unresolved`] well before this would be reached in practice.
const MATERIALIZE_DEPTH_LIMIT: usize = 4096;

/// A node's stored body. Primitives and STRING/ARRAY are absolute; OBJECT
/// is a diff target, so it is stored as `added`/mutated in place rather
/// than ever being fully replaced.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Bool(bool),
    Int8(i8),
    Uint8(u8),
    Int32(i32),
    Uint32(u32),
    Float(f32),
    String(String),
    Array(Vec<Id>),
    Object(BTreeMap<String, Id>),
}

impl Node {
    pub fn value_type(&self) -> ValueType {
        match self {
            Node::Bool(_) => ValueType::Bool,
            Node::Int8(_) => ValueType::Int8,
            Node::Uint8(_) => ValueType::Uint8,
            Node::Int32(_) => ValueType::Int32,
            Node::Uint32(_) => ValueType::Uint32,
            Node::Float(_) => ValueType::Float,
            Node::String(_) => ValueType::String,
            Node::Array(_) => ValueType::Array,
            Node::Object(_) => ValueType::Object,
        }
    }
}

/// A decoded `DATA_UPDATE` record body, ready to be applied to a [`Graph`].
/// Distinct from [`Node`] because OBJECT arrives as a diff (`added`/
/// `removed`), never as an absolute map.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordBody {
    Bool(bool),
    Int8(i8),
    Uint8(u8),
    Int32(i32),
    Uint32(u32),
    Float(f32),
    String(String),
    Array(Vec<Id>),
    Object {
        added: BTreeMap<String, Id>,
        removed: Vec<Id>,
    },
}

impl RecordBody {
    pub fn value_type(&self) -> ValueType {
        match self {
            RecordBody::Bool(_) => ValueType::Bool,
            RecordBody::Int8(_) => ValueType::Int8,
            RecordBody::Uint8(_) => ValueType::Uint8,
            RecordBody::Int32(_) => ValueType::Int32,
            RecordBody::Uint32(_) => ValueType::Uint32,
            RecordBody::Float(_) => ValueType::Float,
            RecordBody::String(_) => ValueType::String,
            RecordBody::Array(_) => ValueType::Array,
            RecordBody::Object { .. } => ValueType::Object,
        }
    }

    /// Converts an absolute (non-OBJECT-diff) body into its stored [`Node`].
    /// Panics if called on `Object` without going through [`Graph::apply`]'s
    /// create path — callers should not need this directly.
    fn into_absolute_node(self) -> Node {
        match self {
            RecordBody::Bool(v) => Node::Bool(v),
            RecordBody::Int8(v) => Node::Int8(v),
            RecordBody::Uint8(v) => Node::Uint8(v),
            RecordBody::Int32(v) => Node::Int32(v),
            RecordBody::Uint32(v) => Node::Uint32(v),
            RecordBody::Float(v) => Node::Float(v),
            RecordBody::String(v) => Node::String(v),
            RecordBody::Array(v) => Node::Array(v),
            RecordBody::Object { .. } => unreachable!("OBJECT has no absolute node representation"),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("value type mismatch for id {id}: node is {existing:?}, update claims {update:?}")]
    TypeMismatch {
        id: Id,
        existing: ValueType,
        update: ValueType,
    },
    #[error("OBJECT update for previously-unseen id {id} carried a non-empty removed list")]
    NonEmptyRemovedOnNewObject { id: Id },
    #[error("no free id below {ALLOCATABLE_ID_CEILING} remains")]
    IdSpaceExhausted,
}

/// The id-addressed mapping of typed nodes, rooted at id 0.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: HashMap<Id, Node>,
}

impl Graph {
    pub fn new() -> Self {
        Self { nodes: HashMap::new() }
    }

    pub fn get(&self, id: Id) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: Id) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn root(&self) -> Option<&Node> {
        self.get(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = Id> + '_ {
        self.nodes.keys().copied()
    }

    /// Applies one decoded `DATA_UPDATE` record, enforcing that a node's
    /// type never changes after its first appearance and that OBJECT
    /// updates are diffs while every other type is absolute. Returns the
    /// id that was created or mutated so callers can notify subscribers.
    pub fn apply(&mut self, id: Id, body: RecordBody) -> Result<Id, GraphError> {
        match self.nodes.get(&id) {
            None => {
                // First appearance of this id.
                match body {
                    RecordBody::Object { added, removed } => {
                        if !removed.is_empty() {
                            return Err(GraphError::NonEmptyRemovedOnNewObject { id });
                        }
                        self.nodes.insert(id, Node::Object(added));
                    }
                    other => {
                        self.nodes.insert(id, other.into_absolute_node());
                    }
                }
            }
            Some(existing) => {
                // The type must match the id's first appearance.
                let existing_type = existing.value_type();
                let update_type = body.value_type();
                if existing_type != update_type {
                    return Err(GraphError::TypeMismatch {
                        id,
                        existing: existing_type,
                        update: update_type,
                    });
                }
                match body {
                    // OBJECT updates are diffs; every other type is absolute.
                    RecordBody::Object { added, removed } => {
                        let Node::Object(map) = self
                            .nodes
                            .get_mut(&id)
                            .expect("checked present above")
                        else {
                            unreachable!("type checked above")
                        };
                        map.retain(|_, v| !removed.contains(v));
                        map.extend(added);
                    }
                    other => {
                        self.nodes.insert(id, other.into_absolute_node());
                    }
                }
            }
        }
        Ok(id)
    }

    /// Smallest non-negative integer not present in the mapping.
    /// Server-role only; the client role never allocates.
    pub fn allocate_id(&self) -> Result<Id, GraphError> {
        let mut candidate: Id = 0;
        while self.nodes.contains_key(&candidate) {
            candidate = candidate.checked_add(1).ok_or(GraphError::IdSpaceExhausted)?;
        }
        if candidate >= ALLOCATABLE_ID_CEILING {
            return Err(GraphError::IdSpaceExhausted);
        }
        Ok(candidate)
    }

    /// Allocates an id and stores `node` locally (server role only).
    pub fn insert_local(&mut self, node: Node) -> Result<Id, GraphError> {
        let id = self.allocate_id()?;
        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Recursively unfolds `id` into a [`Value`] tree.
    /// Dangling references materialise as `Unresolved`, never panic.
    pub fn materialize(&self, id: Id) -> Value {
        let mut path = HashSet::new();
        self.materialize_inner(id, &mut path, MATERIALIZE_DEPTH_LIMIT)
    }

    fn materialize_inner(&self, id: Id, path: &mut HashSet<Id>, budget: usize) -> Value {
        if budget == 0 {
            return Value::Unresolved;
        }
        let Some(node) = self.get(id) else {
            return Value::Unresolved;
        };
        // A revisit of an id already on the current path is a cycle, not
        // a legitimately-shared child: shared children are fine, we just
        // backtrack `path` after each branch.
        if !path.insert(id) {
            return Value::Unresolved;
        }
        let result = match node {
            Node::Bool(v) => Value::Bool(*v),
            Node::Int8(v) => Value::Int8(*v),
            Node::Uint8(v) => Value::Uint8(*v),
            Node::Int32(v) => Value::Int32(*v),
            Node::Uint32(v) => Value::Uint32(*v),
            Node::Float(v) => Value::Float(*v),
            Node::String(v) => Value::String(v.clone()),
            Node::Array(children) => Value::Array(
                children
                    .iter()
                    .map(|child| self.materialize_inner(*child, path, budget - 1))
                    .collect(),
            ),
            Node::Object(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, child)| (key.clone(), self.materialize_inner(*child, path, budget - 1)))
                    .collect(),
            ),
        };
        path.remove(&id);
        result
    }

    /// Walks from `roots`, emitting a referenced-before-referencing id
    /// order suitable for a full snapshot. Shared children are emitted
    /// once; a visited set tolerates cycles.
    pub fn snapshot_order(&self, roots: &[Id]) -> Vec<Id> {
        let mut visited = HashSet::new();
        let mut order = Vec::new();
        for &root in roots {
            self.snapshot_order_inner(root, &mut visited, &mut order);
        }
        order
    }

    fn snapshot_order_inner(&self, id: Id, visited: &mut HashSet<Id>, order: &mut Vec<Id>) {
        if !visited.insert(id) {
            return;
        }
        if let Some(node) = self.get(id) {
            match node {
                Node::Array(children) => {
                    for &child in children {
                        self.snapshot_order_inner(child, visited, order);
                    }
                }
                Node::Object(entries) => {
                    for &child in entries.values() {
                        self.snapshot_order_inner(child, visited, order);
                    }
                }
                _ => {}
            }
        }
        order.push(id);
    }

    /// Mark-and-sweep GC rooted at id 0. The protocol never reclaims
    /// orphaned ids itself; this is an opt-in the embedder calls between
    /// `DATA_UPDATE` batches (a quiescent point), never from inside the
    /// decoder.
    pub fn collect_garbage(&mut self) {
        let reachable: HashSet<Id> = self.snapshot_order(&[0]).into_iter().collect();
        self.nodes.retain(|id, _| reachable.contains(id));
    }
}
