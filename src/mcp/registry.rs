//! Tool registry
//!
//! Built once at startup from an ordered list of tools and read-only afterwards.

use crate::mcp::protocol::Tool;
use crate::mcp::tools::ToolHandler;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Tools keyed by unique name, enumerated in registration order
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn ToolHandler>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Build a registry. When two tools share a name the later one replaces the
    /// earlier one but keeps its position.
    #[inline]
    pub fn new<I>(tools: I) -> Self
    where
        I: IntoIterator<Item = Box<dyn ToolHandler>>,
    {
        let mut registry = Self::default();
        for tool in tools {
            registry.insert(tool);
        }
        registry
    }

    fn insert(&mut self, tool: Box<dyn ToolHandler>) {
        let name = tool.name().to_string();
        match self.index.get(&name) {
            Some(&position) => {
                warn!("Duplicate tool name '{}': keeping the last registration", name);
                self.tools[position] = tool;
            }
            None => {
                debug!("Registered tool: {}", name);
                self.index.insert(name, self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    /// All tools in registration order
    #[inline]
    pub fn all(&self) -> impl Iterator<Item = &(dyn ToolHandler + 'static)> {
        self.tools.iter().map(AsRef::as_ref)
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&dyn ToolHandler> {
        self.index
            .get(name)
            .and_then(|&position| self.tools.get(position))
            .map(AsRef::as_ref)
    }

    /// Descriptors for `tools/list`
    #[inline]
    pub fn definitions(&self) -> Vec<Tool> {
        self.all().map(|tool| tool.definition()).collect()
    }

    #[inline]
    pub fn names(&self) -> Vec<&str> {
        self.all().map(|tool| tool.name()).collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
