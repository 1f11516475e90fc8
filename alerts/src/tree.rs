//! A JSON-shaped configuration tree edited through key paths.
//!
//! Paths are slices of segments. A segment addressing a [`ConfigNode::List`]
//! must be a decimal index inside the list; a segment addressing a
//! [`ConfigNode::Branch`] is a key.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::TreeError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigNode {
    Number(f64),
    Text(String),
    List(Vec<ConfigNode>),
    Branch(IndexMap<String, ConfigNode>),
}

impl Default for ConfigNode {
    fn default() -> Self {
        ConfigNode::Branch(IndexMap::new())
    }
}

fn joined(path: &[&str]) -> String {
    path.join(".")
}

fn list_index(segment: &str, len: usize, path: &[&str]) -> Result<usize, TreeError> {
    let index: usize = segment.parse().map_err(|_| TreeError::NotAnIndex {
        segment: segment.to_string(),
    })?;
    if index >= len {
        return Err(TreeError::IndexOutOfRange {
            index,
            len,
            path: joined(path),
        });
    }
    Ok(index)
}

impl ConfigNode {
    pub fn as_branch(&self) -> Option<&IndexMap<String, ConfigNode>> {
        match self {
            ConfigNode::Branch(map) => Some(map),
            _ => None,
        }
    }

    /// True for non-empty branches, lists and text and for non-zero numbers.
    pub fn has_content(&self) -> bool {
        match self {
            ConfigNode::Number(n) => *n != 0.0,
            ConfigNode::Text(t) => !t.is_empty(),
            ConfigNode::List(items) => !items.is_empty(),
            ConfigNode::Branch(map) => !map.is_empty(),
        }
    }

    fn child(&self, segment: &str, seen: &[&str]) -> Result<&ConfigNode, TreeError> {
        match self {
            ConfigNode::Branch(map) => map.get(segment).ok_or_else(|| TreeError::KeyNotFound {
                key: segment.to_string(),
                path: joined(seen),
            }),
            ConfigNode::List(items) => Ok(&items[list_index(segment, items.len(), seen)?]),
            _ => Err(TreeError::NotAContainer { path: joined(seen) }),
        }
    }

    fn child_mut(&mut self, segment: &str, seen: &[&str], create: bool) -> Result<&mut ConfigNode, TreeError> {
        match self {
            ConfigNode::Branch(map) => {
                if create {
                    Ok(map.entry(segment.to_string()).or_default())
                } else {
                    map.get_mut(segment).ok_or_else(|| TreeError::KeyNotFound {
                        key: segment.to_string(),
                        path: joined(seen),
                    })
                }
            }
            ConfigNode::List(items) => {
                let index = list_index(segment, items.len(), seen)?;
                Ok(&mut items[index])
            }
            _ => Err(TreeError::NotAContainer { path: joined(seen) }),
        }
    }

    pub fn get(&self, path: &[&str]) -> Result<&ConfigNode, TreeError> {
        if path.is_empty() {
            return Err(TreeError::EmptyPath);
        }
        let mut node = self;
        for (depth, segment) in path.iter().enumerate() {
            node = node.child(segment, &path[..depth])?;
        }
        Ok(node)
    }

    /// Stores `value` at `path`, creating missing branches on the way.
    /// List indices must already exist.
    pub fn set(&mut self, path: &[&str], value: ConfigNode) -> Result<(), TreeError> {
        let Some((last, parents)) = path.split_last() else {
            return Err(TreeError::EmptyPath);
        };
        let mut node = self;
        for (depth, segment) in parents.iter().enumerate() {
            node = node.child_mut(segment, &path[..depth], true)?;
        }
        *node.child_mut(last, parents, true)? = value;
        Ok(())
    }

    /// Detaches and returns the node at `path`.
    pub fn remove(&mut self, path: &[&str]) -> Result<ConfigNode, TreeError> {
        let Some((last, parents)) = path.split_last() else {
            return Err(TreeError::EmptyPath);
        };
        let mut node = self;
        for (depth, segment) in parents.iter().enumerate() {
            node = node.child_mut(segment, &path[..depth], false)?;
        }
        match node {
            ConfigNode::Branch(map) => map.shift_remove(*last).ok_or_else(|| TreeError::KeyNotFound {
                key: last.to_string(),
                path: joined(parents),
            }),
            ConfigNode::List(items) => {
                let index = list_index(last, items.len(), parents)?;
                Ok(items.remove(index))
            }
            _ => Err(TreeError::NotAContainer {
                path: joined(parents),
            }),
        }
    }

    /// Whether the node at `path` exists and [has content](Self::has_content).
    pub fn is_populated(&self, path: &[&str]) -> Result<bool, TreeError> {
        Ok(self.get(path)?.has_content())
    }
}
