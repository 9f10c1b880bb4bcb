//! The collapse engine.
//!
//! Groups are kept in an arena and linked by node id: `owner` maps every
//! grouped node to the group that directly holds it, and a group's master
//! may itself be owned by an outer group. Resolving a node to what is shown
//! for it walks that chain upward until it reaches a node nobody owns.
//!
//! The state is plain data, so it can be cloned or serialized for undo and
//! redo. A collapser is tied to one graph session and is not thread-safe;
//! exposed graphs it produces are independent snapshots.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

use super::data::{CollapseData, GroupId};
use crate::error::{DepanError, Result};
use crate::graph::{GraphBuilder, GraphEdge, GraphModel, GraphNode};
use crate::hierarchy::TreeModel;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Collapser {
    groups: Vec<Option<CollapseData>>,
    owner: HashMap<String, GroupId>,
    /// Groups each node masters, most recent last.
    mastered: HashMap<String, Vec<GroupId>>,
}

impl Collapser {
    /// A collapser with no groups.
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Mutation ───────────────────────────────────────────────

    /// Group `picked` behind `master`.
    ///
    /// Every picked node other than the master is re-owned by the new group,
    /// whatever group held it before. A picked node that masters its own
    /// group keeps that group, which ends up nested inside the new one.
    ///
    /// `erase` decides what happens to a picked node's previous group:
    /// with `erase` the node is removed from that group's member list, and
    /// the group is dropped once only its master is left. Without it the old
    /// group keeps listing the node but no longer owns it. The exposed graph
    /// is the same either way.
    pub fn collapse(
        &mut self,
        graph: &GraphModel,
        master: &GraphNode,
        picked: &[Arc<GraphNode>],
        erase: bool,
    ) -> Result<&CollapseData> {
        let master_id = master.id();
        if !graph.contains_node(master_id) {
            return Err(DepanError::UnknownNode(master_id.to_string()));
        }

        let mut seen: HashSet<&str> = HashSet::with_capacity(picked.len());
        let mut members: Vec<String> = Vec::with_capacity(picked.len());
        for node in picked {
            if !graph.contains_node(node.id()) {
                return Err(DepanError::UnknownNode(node.id().to_string()));
            }
            if seen.insert(node.id()) {
                members.push(node.id().to_string());
            }
        }
        if !seen.contains(master_id) {
            return Err(DepanError::MasterNotPicked(master_id.to_string()));
        }

        // A member that already (transitively) holds the master would end up
        // owning itself.
        let ancestors = self.ancestors(master_id);
        if let Some(member) = members
            .iter()
            .find(|m| m.as_str() != master_id && ancestors.contains(m.as_str()))
        {
            return Err(DepanError::CollapseCycle {
                master: master_id.to_string(),
                member: member.clone(),
            });
        }

        let id = GroupId::new(self.groups.len());
        for member in members.iter().filter(|m| m.as_str() != master_id) {
            if let Some(previous) = self.owner.insert(member.clone(), id) {
                if erase {
                    self.detach(previous, member);
                }
            }
        }
        self.mastered.entry(master_id.to_string()).or_default().push(id);

        debug!(master = master_id, group = %id, members = members.len(), erase, "collapsed nodes");
        self.groups.push(None);
        let data = self.groups[id.index()].insert(CollapseData::new(id, master_id.to_string(), members));
        Ok(&*data)
    }

    /// Remove the most recent group mastered by `master`, one level only.
    ///
    /// Members it still owns become exposed; members that master their own
    /// groups keep them.
    pub fn uncollapse(&mut self, master: &str) -> Result<CollapseData> {
        let id = self
            .mastered
            .get_mut(master)
            .and_then(Vec::pop)
            .ok_or_else(|| DepanError::NotAGroupMaster(master.to_string()))?;
        if self.mastered.get(master).is_some_and(Vec::is_empty) {
            self.mastered.remove(master);
        }

        let data = self
            .groups
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or_else(|| DepanError::NotAGroupMaster(master.to_string()))?;

        for member in data.children() {
            if self.owner.get(member) == Some(&id) {
                self.owner.remove(member);
            }
        }
        debug!(master, group = %id, "uncollapsed group");
        Ok(data)
    }

    /// Group every node of the tree's spanning forest with its tree
    /// children, bottom-up, so inner groups nest inside outer ones.
    ///
    /// Returns the groups in creation order.
    pub fn collapse_tree(&mut self, graph: &GraphModel, tree: &TreeModel) -> Result<Vec<CollapseData>> {
        let mut created = Vec::new();
        for (node, children) in tree.walk_post_order(graph) {
            let mut picked = Vec::with_capacity(children.len() + 1);
            picked.push(node.clone());
            picked.extend(children);
            let data = self.collapse(graph, &node, &picked, true)?;
            created.push(data.clone());
        }
        info!(groups = created.len(), "collapsed tree");
        Ok(created)
    }

    /// Drop every group.
    pub fn clear(&mut self) {
        self.groups.clear();
        self.owner.clear();
        self.mastered.clear();
    }

    /// Move `member` out of group `id`, dropping the group if only its
    /// master is left.
    fn detach(&mut self, id: GroupId, member: &str) {
        let Some(slot) = self.groups.get_mut(id.index()) else {
            return;
        };
        let Some(group) = slot.as_mut() else {
            return;
        };
        group.remove_member(member);
        if group.children().next().is_some() {
            return;
        }
        let master = group.master().to_string();
        *slot = None;
        if let Some(stack) = self.mastered.get_mut(&master) {
            stack.retain(|g| *g != id);
            if stack.is_empty() {
                self.mastered.remove(&master);
            }
        }
        debug!(master = %master, group = %id, "dropped emptied group");
    }

    // ─── Queries ────────────────────────────────────────────────

    /// The node shown in place of `id`: follow owners upward until a node
    /// nobody owns.
    pub fn exposed_id<'a>(&'a self, id: &'a str) -> &'a str {
        let mut current = id;
        // Bounded by the number of groups so corrupt state cannot spin.
        for _ in 0..=self.groups.len() {
            let Some(group) = self.owner_group(current) else {
                break;
            };
            current = group.master();
        }
        current
    }

    /// Whether `id` masters at least one active group.
    pub fn is_master(&self, id: &str) -> bool {
        self.mastered.contains_key(id)
    }

    /// Whether `id` is held by some group.
    pub fn is_grouped(&self, id: &str) -> bool {
        self.owner.contains_key(id)
    }

    /// The group that directly holds `id`.
    pub fn owner_of(&self, id: &str) -> Option<&CollapseData> {
        self.owner_group(id)
    }

    /// The most recent group mastered by `master`.
    pub fn collapse_data(&self, master: &str) -> Option<&CollapseData> {
        let id = self.mastered.get(master)?.last()?;
        self.groups.get(id.index())?.as_ref()
    }

    /// Active groups in creation order.
    pub fn groups(&self) -> impl Iterator<Item = &CollapseData> {
        self.groups.iter().flatten()
    }

    /// Number of active groups.
    pub fn group_count(&self) -> usize {
        self.groups().count()
    }

    /// Whether no group is active.
    pub fn is_empty(&self) -> bool {
        self.groups().next().is_none()
    }

    fn owner_group(&self, id: &str) -> Option<&CollapseData> {
        let group = self.owner.get(id)?;
        self.groups.get(group.index())?.as_ref()
    }

    /// Every master above `id` in the grouping forest.
    fn ancestors<'a>(&'a self, id: &'a str) -> HashSet<&'a str> {
        let mut result = HashSet::new();
        let mut current = id;
        while let Some(group) = self.owner_group(current) {
            current = group.master();
            if !result.insert(current) {
                break;
            }
        }
        result
    }

    // ─── Exposed Graph ──────────────────────────────────────────

    /// Rebuild the graph as currently shown.
    ///
    /// Every node is replaced by its exposed node. Edges are redirected the
    /// same way; edges that end up inside one group are dropped, and of
    /// several edges landing on the same exposed pair, in either direction,
    /// only the first one in graph order is kept, with its orientation and
    /// relation.
    pub fn build_exposed_graph(&self, graph: &GraphModel) -> Result<GraphModel> {
        let mut resolved: HashMap<&str, Arc<GraphNode>> = HashMap::with_capacity(graph.node_count());
        let mut builder = GraphBuilder::new();

        for node in graph.nodes() {
            let exposed = self.resolve(graph, node.id(), &mut resolved)?;
            builder.map_node(exposed);
        }

        // Keyed on the unordered pair: a -> b and b -> a merge into one edge.
        let mut pairs: HashSet<(String, String)> = HashSet::new();
        for edge in graph.edges() {
            let head = self.resolve(graph, edge.head().id(), &mut resolved)?;
            let tail = self.resolve(graph, edge.tail().id(), &mut resolved)?;
            if head.id() == tail.id() {
                continue;
            }
            let key = if head.id() < tail.id() {
                (head.id().to_string(), tail.id().to_string())
            } else {
                (tail.id().to_string(), head.id().to_string())
            };
            if pairs.insert(key) {
                builder.add_edge(GraphEdge::new(head, tail, edge.relation()));
            }
        }

        let exposed = builder.create_graph_model();
        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            exposed_nodes = exposed.node_count(),
            exposed_edges = exposed.edge_count(),
            "built exposed graph"
        );
        Ok(exposed)
    }

    fn resolve<'g>(
        &self,
        graph: &'g GraphModel,
        id: &'g str,
        resolved: &mut HashMap<&'g str, Arc<GraphNode>>,
    ) -> Result<Arc<GraphNode>> {
        if let Some(node) = resolved.get(id) {
            return Ok(node.clone());
        }
        let exposed_id = self.exposed_id(id);
        let node = graph
            .find_node(exposed_id)
            .cloned()
            .ok_or_else(|| DepanError::UnknownNode(exposed_id.to_string()))?;
        resolved.insert(id, node.clone());
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeKind;
    use crate::hierarchy::compute_spanning_hierarchy;
    use crate::relation::{BuiltinRelation, RelationId, RelationRegistry, FORWARD};

    /// n1..n5 with an edge for every pair i < j.
    fn complete5() -> (GraphModel, RelationId) {
        let mut registry = RelationRegistry::new();
        let calls = registry.builtin(BuiltinRelation::Calls);
        let mut builder = GraphBuilder::new();
        for i in 1..=5 {
            builder
                .new_node(GraphNode::new(format!("n{i}"), NodeKind::GENERIC))
                .unwrap();
        }
        for i in 1..=5 {
            for j in (i + 1)..=5 {
                let head = builder.find_node(&format!("n{i}")).unwrap().clone();
                let tail = builder.find_node(&format!("n{j}")).unwrap().clone();
                builder.add_edge(GraphEdge::new(head, tail, calls));
            }
        }
        (builder.create_graph_model(), calls)
    }

    fn nodes(graph: &GraphModel, ids: &[&str]) -> Vec<Arc<GraphNode>> {
        ids.iter()
            .map(|id| graph.find_node(id).unwrap().clone())
            .collect()
    }

    fn counts(collapser: &Collapser, graph: &GraphModel) -> (usize, usize) {
        let exposed = collapser.build_exposed_graph(graph).unwrap();
        (exposed.node_count(), exposed.edge_count())
    }

    #[test]
    fn test_complete5_baseline() {
        let (graph, _) = complete5();
        assert_eq!(graph.edge_count(), 10);

        let mut collapser = Collapser::new();
        assert_eq!(counts(&collapser, &graph), (5, 10));

        let picked = nodes(&graph, &["n1", "n2"]);
        collapser.collapse(&graph, &picked[0], &picked, false).unwrap();
        assert_eq!(counts(&collapser, &graph), (4, 6));
        assert_eq!(collapser.exposed_id("n2"), "n1");
    }

    #[test]
    fn test_any_pair_of_complete5_collapses_to_4_and_6() {
        let (graph, _) = complete5();
        for i in 1..=5 {
            for j in (i + 1)..=5 {
                let (a, b) = (format!("n{i}"), format!("n{j}"));
                let mut collapser = Collapser::new();
                let picked = nodes(&graph, &[a.as_str(), b.as_str()]);
                collapser.collapse(&graph, &picked[0], &picked, false).unwrap();
                assert_eq!(counts(&collapser, &graph), (4, 6), "{a}+{b}");
            }
        }
    }

    #[test]
    fn test_opposite_edges_merge_keeping_first_orientation() {
        let (graph, calls) = complete5();
        let mut collapser = Collapser::new();
        let picked = nodes(&graph, &["n1", "n3"]);
        collapser.collapse(&graph, &picked[0], &picked, false).unwrap();

        // n1 -> n2 comes before n2 -> n3 in graph order.
        let exposed = collapser.build_exposed_graph(&graph).unwrap();
        assert!(exposed.find_edge("n1", "n2", calls).is_some());
        assert!(exposed.find_edge("n2", "n1", calls).is_none());
    }

    #[test]
    fn test_ancestor_check_on_nested_groups() {
        let (graph, _) = complete5();
        let mut collapser = Collapser::new();
        let inner = nodes(&graph, &["n4", "n5"]);
        collapser.collapse(&graph, &inner[0], &inner, true).unwrap();
        let outer = nodes(&graph, &["n3", "n4"]);
        collapser.collapse(&graph, &outer[0], &outer, true).unwrap();

        // n3 holds n4, which holds n5: n5 cannot take in n3.
        let back = nodes(&graph, &["n5", "n3"]);
        assert!(matches!(
            collapser.collapse(&graph, &back[0], &back, true),
            Err(DepanError::CollapseCycle { member, .. }) if member == "n3"
        ));
        assert_eq!(collapser.group_count(), 2);
    }

    #[test]
    fn test_collapse_with_trailing_master() {
        let (graph, _) = complete5();
        let mut collapser = Collapser::new();
        let picked = nodes(&graph, &["n4", "n5"]);
        collapser.collapse(&graph, &picked[1], &picked, true).unwrap();
        assert_eq!(counts(&collapser, &graph), (4, 6));
    }

    #[test]
    fn test_nested_collapse() {
        let (graph, _) = complete5();
        let mut collapser = Collapser::new();

        let inner = nodes(&graph, &["n3", "n4"]);
        collapser.collapse(&graph, &inner[0], &inner, false).unwrap();
        let outer = nodes(&graph, &["n3", "n2"]);
        collapser.collapse(&graph, &outer[1], &outer, false).unwrap();

        assert_eq!(counts(&collapser, &graph), (3, 3));
        assert_eq!(collapser.exposed_id("n4"), "n2");
        assert!(collapser.is_master("n3"));
        assert_eq!(collapser.owner_of("n3").unwrap().master(), "n2");

        // Single level: the inner group survives.
        collapser.uncollapse("n2").unwrap();
        assert_eq!(counts(&collapser, &graph), (4, 6));
        assert_eq!(collapser.exposed_id("n4"), "n3");
    }

    #[test]
    fn test_collapse_tree_then_uncollapse_level_by_level() {
        let (graph, _) = complete5();
        let tree = TreeModel::Hierarchical(compute_spanning_hierarchy(&graph, &FORWARD));

        let mut collapser = Collapser::new();
        let created = collapser.collapse_tree(&graph, &tree).unwrap();
        let masters: Vec<&str> = created.iter().map(CollapseData::master).collect();
        assert_eq!(masters, vec!["n4", "n3", "n2", "n1"]);
        assert_eq!(counts(&collapser, &graph), (1, 0));

        let mut previous = (1, 0);
        for master in ["n1", "n2", "n3", "n4"] {
            collapser.uncollapse(master).unwrap();
            let now = counts(&collapser, &graph);
            assert!(now.0 > previous.0 && now.1 > previous.1, "{master}: {now:?}");
            previous = now;
        }
        assert_eq!(previous, (5, 10));
        assert!(collapser.is_empty());
    }

    #[test]
    fn test_collapse_tree_then_uncollapse_innermost_first() {
        let (graph, _) = complete5();
        let tree = TreeModel::Hierarchical(compute_spanning_hierarchy(&graph, &FORWARD));
        let mut collapser = Collapser::new();
        collapser.collapse_tree(&graph, &tree).unwrap();

        let mut seen = Vec::new();
        for master in ["n4", "n3", "n2", "n1"] {
            collapser.uncollapse(master).unwrap();
            seen.push(counts(&collapser, &graph));
        }
        assert_eq!(seen, vec![(2, 1), (3, 3), (4, 6), (5, 10)]);
        assert!(collapser.is_empty());
    }

    #[test]
    fn test_uncollapse_non_master_fails() {
        let (graph, _) = complete5();
        let mut collapser = Collapser::new();
        assert!(matches!(
            collapser.uncollapse("n1"),
            Err(DepanError::NotAGroupMaster(id)) if id == "n1"
        ));

        let picked = nodes(&graph, &["n1", "n2"]);
        collapser.collapse(&graph, &picked[0], &picked, false).unwrap();
        assert!(matches!(
            collapser.uncollapse("n2"),
            Err(DepanError::NotAGroupMaster(_))
        ));
        collapser.uncollapse("n1").unwrap();
        assert!(matches!(
            collapser.uncollapse("n1"),
            Err(DepanError::NotAGroupMaster(_))
        ));
    }

    #[test]
    fn test_master_must_be_picked() {
        let (graph, _) = complete5();
        let mut collapser = Collapser::new();
        let master = graph.find_node("n1").unwrap().clone();
        let picked = nodes(&graph, &["n2", "n3"]);
        assert!(matches!(
            collapser.collapse(&graph, &master, &picked, false),
            Err(DepanError::MasterNotPicked(_))
        ));
        assert!(collapser.is_empty());
    }

    #[test]
    fn test_foreign_node_is_rejected() {
        let (graph, _) = complete5();
        let mut collapser = Collapser::new();
        let stranger = Arc::new(GraphNode::new("elsewhere", NodeKind::GENERIC));
        let picked = vec![graph.find_node("n1").unwrap().clone(), stranger];
        assert!(matches!(
            collapser.collapse(&graph, &picked[0], &picked, false),
            Err(DepanError::UnknownNode(id)) if id == "elsewhere"
        ));
    }

    #[test]
    fn test_collapse_cycle_is_rejected() {
        let (graph, _) = complete5();
        let mut collapser = Collapser::new();
        let first = nodes(&graph, &["n1", "n2"]);
        collapser.collapse(&graph, &first[0], &first, false).unwrap();

        let back = nodes(&graph, &["n2", "n1"]);
        assert!(matches!(
            collapser.collapse(&graph, &back[0], &back, false),
            Err(DepanError::CollapseCycle { .. })
        ));
        assert_eq!(collapser.group_count(), 1);
    }

    #[test]
    fn test_erase_drops_emptied_group() {
        let (graph, _) = complete5();
        let mut collapser = Collapser::new();
        let first = nodes(&graph, &["n1", "n3"]);
        collapser.collapse(&graph, &first[0], &first, true).unwrap();
        let second = nodes(&graph, &["n2", "n3"]);
        collapser.collapse(&graph, &second[0], &second, true).unwrap();

        assert!(!collapser.is_master("n1"));
        assert_eq!(collapser.group_count(), 1);
        assert_eq!(collapser.owner_of("n3").unwrap().master(), "n2");
        assert_eq!(counts(&collapser, &graph), (4, 6));
    }

    #[test]
    fn test_without_erase_old_group_keeps_stale_member() {
        let (graph, _) = complete5();
        let mut collapser = Collapser::new();
        let first = nodes(&graph, &["n1", "n3"]);
        collapser.collapse(&graph, &first[0], &first, false).unwrap();
        let second = nodes(&graph, &["n2", "n3"]);
        collapser.collapse(&graph, &second[0], &second, false).unwrap();

        assert!(collapser.is_master("n1"));
        assert!(collapser.collapse_data("n1").unwrap().contains("n3"));
        assert_eq!(counts(&collapser, &graph), (4, 6));

        // n1's group no longer owns n3, so releasing it leaves n3 under n2.
        collapser.uncollapse("n1").unwrap();
        assert_eq!(collapser.exposed_id("n3"), "n2");
        assert_eq!(counts(&collapser, &graph), (4, 6));
    }

    #[test]
    fn test_same_master_twice_stacks_groups() {
        let (graph, _) = complete5();
        let mut collapser = Collapser::new();
        let first = nodes(&graph, &["n1", "n2"]);
        collapser.collapse(&graph, &first[0], &first, false).unwrap();
        let second = nodes(&graph, &["n1", "n3"]);
        collapser.collapse(&graph, &second[0], &second, false).unwrap();
        assert_eq!(counts(&collapser, &graph), (3, 3));

        let popped = collapser.uncollapse("n1").unwrap();
        assert!(popped.contains("n3"));
        assert_eq!(counts(&collapser, &graph), (4, 6));
        assert!(collapser.is_master("n1"));
    }

    #[test]
    fn test_merged_edges_keep_first_relation() {
        let mut registry = RelationRegistry::new();
        let imports = registry.builtin(BuiltinRelation::Imports);
        let calls = registry.builtin(BuiltinRelation::Calls);
        let mut builder = GraphBuilder::new();
        let a = GraphNode::new("a", NodeKind::FILE);
        let b = GraphNode::new("b", NodeKind::FILE);
        let c = GraphNode::new("c", NodeKind::FILE);
        builder.add_dependency(a.clone(), b, imports);
        builder.add_dependency(a, c, calls);
        let graph = builder.create_graph_model();

        let mut collapser = Collapser::new();
        let picked = nodes(&graph, &["b", "c"]);
        collapser.collapse(&graph, &picked[0], &picked, false).unwrap();

        let exposed = collapser.build_exposed_graph(&graph).unwrap();
        assert_eq!(exposed.edge_count(), 1);
        assert!(exposed.find_edge("a", "b", imports).is_some());
        assert!(exposed.find_edge("a", "b", calls).is_none());
    }

    #[test]
    fn test_state_serializes_for_undo() {
        let (graph, _) = complete5();
        let mut collapser = Collapser::new();
        let picked = nodes(&graph, &["n4", "n5"]);
        collapser.collapse(&graph, &picked[0], &picked, false).unwrap();

        let saved = serde_json::to_string(&collapser).unwrap();
        collapser.uncollapse("n4").unwrap();
        assert_eq!(counts(&collapser, &graph), (5, 10));

        let restored: Collapser = serde_json::from_str(&saved).unwrap();
        assert_eq!(counts(&restored, &graph), (4, 6));
    }
}
