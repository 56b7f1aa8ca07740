//! Agent arena
//!
//! Owns every node agent and memoizes them by node identifier. Handles are
//! indices and stay valid for the life of the arena.

use std::collections::HashMap;

use crate::agent::{AgentId, AgentLookup, NodeAgent};

/// Memoizing store of node agents
#[derive(Debug, Default)]
pub struct AgentArena {
    agents: Vec<NodeAgent>,
    by_node: HashMap<String, AgentId>,
}

impl AgentArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle of the agent for `node_id`, creating it with `factory` on first request
    pub fn get_or_create<F>(&mut self, node_id: &str, factory: F) -> AgentId
    where
        F: FnOnce() -> NodeAgent,
    {
        if let Some(id) = self.by_node.get(node_id) {
            return *id;
        }
        let id = AgentId(self.agents.len());
        self.agents.push(factory());
        self.by_node.insert(node_id.to_string(), id);
        id
    }

    /// Handle of an existing agent
    pub fn lookup(&self, node_id: &str) -> Option<AgentId> {
        self.by_node.get(node_id).copied()
    }

    pub fn get(&self, id: AgentId) -> Option<&NodeAgent> {
        self.agents.get(id.0)
    }

    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut NodeAgent> {
        self.agents.get_mut(id.0)
    }

    /// Agents in creation order
    pub fn iter(&self) -> impl Iterator<Item = &NodeAgent> {
        self.agents.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut NodeAgent> {
        self.agents.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl AgentLookup for AgentArena {
    fn agent(&self, id: AgentId) -> Option<&NodeAgent> {
        self.get(id)
    }

    fn agent_mut(&mut self, id: AgentId) -> Option<&mut NodeAgent> {
        self.get_mut(id)
    }
}
