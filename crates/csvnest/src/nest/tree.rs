//! Nested result tree keyed by row key path segments.

use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::Serialize;

use crate::error::{CsvNestError, Result};
use crate::interpret::ParsedRow;

/// A node of the nested result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Node {
    Leaf(ParsedRow),
    Branch(IndexMap<String, Node>),
}

impl Node {
    pub fn as_leaf(&self) -> Option<&ParsedRow> {
        match self {
            Node::Leaf(row) => Some(row),
            Node::Branch(_) => None,
        }
    }

    pub fn as_branch(&self) -> Option<&IndexMap<String, Node>> {
        match self {
            Node::Branch(children) => Some(children),
            Node::Leaf(_) => None,
        }
    }

    fn collect_leaves<'a>(&'a self, path: &mut Vec<String>, out: &mut Vec<(Vec<String>, &'a ParsedRow)>) {
        match self {
            Node::Leaf(row) => out.push((path.clone(), row)),
            Node::Branch(children) => {
                for (segment, child) in children {
                    path.push(segment.clone());
                    child.collect_leaves(path, out);
                    path.pop();
                }
            }
        }
    }
}

/// Parsed rows grouped along their key paths.
///
/// Re-inserting at an existing leaf replaces it (last writer wins). A path
/// that runs into a leaf where it needs a branch, or ends on a branch, is a
/// [`CsvNestError::StructuralKeyConflict`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NestedResult {
    root: IndexMap<String, Node>,
}

impl NestedResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `row` at `path`, returning the leaf it replaced.
    pub fn insert(&mut self, path: &[String], row: ParsedRow) -> Result<Option<ParsedRow>> {
        let (last, prefix) = path.split_last().ok_or_else(|| CsvNestError::StructuralKeyConflict {
            path: Vec::new(),
        })?;

        let mut map = &mut self.root;
        for (depth, segment) in prefix.iter().enumerate() {
            let node = map
                .entry(segment.clone())
                .or_insert_with(|| Node::Branch(IndexMap::new()));
            map = match node {
                Node::Branch(children) => children,
                Node::Leaf(_) => {
                    return Err(CsvNestError::StructuralKeyConflict {
                        path: path[..=depth].to_vec(),
                    });
                }
            };
        }

        match map.entry(last.clone()) {
            Entry::Occupied(mut entry) => match entry.get_mut() {
                Node::Leaf(existing) => Ok(Some(std::mem::replace(existing, row))),
                Node::Branch(_) => Err(CsvNestError::StructuralKeyConflict {
                    path: path.to_vec(),
                }),
            },
            Entry::Vacant(entry) => {
                entry.insert(Node::Leaf(row));
                Ok(None)
            }
        }
    }

    /// Find the node at `path`.
    pub fn get<S: AsRef<str>>(&self, path: &[S]) -> Option<&Node> {
        let (first, rest) = path.split_first()?;
        let mut node = self.root.get(first.as_ref())?;
        for segment in rest {
            node = node.as_branch()?.get(segment.as_ref())?;
        }
        Some(node)
    }

    /// Find the parsed row stored at `path`.
    pub fn leaf<S: AsRef<str>>(&self, path: &[S]) -> Option<&ParsedRow> {
        self.get(path).and_then(Node::as_leaf)
    }

    /// Top-level entries.
    pub fn root(&self) -> &IndexMap<String, Node> {
        &self.root
    }

    /// Every leaf with its full path, in insertion order.
    pub fn leaves(&self) -> Vec<(Vec<String>, &ParsedRow)> {
        let mut out = Vec::new();
        let mut path = Vec::new();
        for (segment, node) in &self.root {
            path.push(segment.clone());
            node.collect_leaves(&mut path, &mut out);
            path.pop();
        }
        out
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves().len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Render as a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
