//! Current-scene state machine.
//!
//! The selector starts with no scene selected. Once a file is opened the
//! reader selects scene 0, and from then on exactly one scene is current.
//! A failed switch leaves the state untouched.

use std::fmt;

use crate::error::ReaderError;

/// Reference to a scene, either by OME id or by position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SceneRef {
    Id(String),
    Index(usize),
}

impl fmt::Display for SceneRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneRef::Id(id) => write!(f, "{id:?}"),
            SceneRef::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<usize> for SceneRef {
    fn from(index: usize) -> Self {
        SceneRef::Index(index)
    }
}

impl From<&str> for SceneRef {
    fn from(id: &str) -> Self {
        SceneRef::Id(id.to_string())
    }
}

impl From<String> for SceneRef {
    fn from(id: String) -> Self {
        SceneRef::Id(id)
    }
}

/// Tracks which scene is current.
#[derive(Debug, Clone)]
pub struct SceneSelector {
    ids: Vec<String>,
    current: Option<usize>,
}

impl SceneSelector {
    /// Create a selector over the given scene ids with nothing selected.
    pub fn new(ids: Vec<String>) -> Self {
        Self { ids, current: None }
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Index of the current scene, `None` before the first selection.
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current.map(|i| self.ids[i].as_str())
    }

    /// Resolve a reference to an index without changing state.
    pub fn resolve(&self, scene: &SceneRef) -> Option<usize> {
        match scene {
            SceneRef::Index(index) => (*index < self.ids.len()).then_some(*index),
            SceneRef::Id(id) => self.ids.iter().position(|known| known == id),
        }
    }

    /// Make `scene` current.
    ///
    /// Returns `true` if the current scene changed, `false` if `scene` was
    /// already current.
    ///
    /// # Errors
    ///
    /// Returns `ReaderError::UnknownScene` when `scene` is not in the list;
    /// the current scene is left unchanged.
    pub fn select(&mut self, scene: &SceneRef) -> Result<bool, ReaderError> {
        let index = self
            .resolve(scene)
            .ok_or_else(|| ReaderError::UnknownScene {
                requested: scene.clone(),
                available: self.ids.len(),
            })?;

        let changed = self.current != Some(index);
        self.current = Some(index);
        Ok(changed)
    }
}
