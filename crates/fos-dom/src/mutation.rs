//! Mutation records
//!
//! Records queued for registered observations until taken as a batch.

use crate::NodeId;

/// Mutation type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationType {
    Attributes,
    CharacterData,
    ChildList,
}

/// Mutation record
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRecord {
    pub mutation_type: MutationType,
    pub target: NodeId,
    pub added_nodes: Vec<NodeId>,
    pub removed_nodes: Vec<NodeId>,
    pub previous_sibling: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    pub attribute_name: Option<String>,
    pub old_value: Option<String>,
}

impl MutationRecord {
    /// Attribute change on `target`
    pub fn attributes(target: NodeId, name: &str, old_value: Option<String>) -> Self {
        Self {
            mutation_type: MutationType::Attributes,
            target,
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            previous_sibling: None,
            next_sibling: None,
            attribute_name: Some(name.to_string()),
            old_value,
        }
    }

    /// Child list change under `target`
    pub fn child_list(target: NodeId, added: Vec<NodeId>, removed: Vec<NodeId>) -> Self {
        Self {
            mutation_type: MutationType::ChildList,
            target,
            added_nodes: added,
            removed_nodes: removed,
            previous_sibling: None,
            next_sibling: None,
            attribute_name: None,
            old_value: None,
        }
    }

    /// Text change on `target`
    pub fn character_data(target: NodeId, old_value: String) -> Self {
        Self {
            mutation_type: MutationType::CharacterData,
            target,
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            previous_sibling: None,
            next_sibling: None,
            attribute_name: None,
            old_value: Some(old_value),
        }
    }

    pub(crate) fn with_siblings(mut self, previous: NodeId, next: NodeId) -> Self {
        self.previous_sibling = previous.is_valid().then_some(previous);
        self.next_sibling = next.is_valid().then_some(next);
        self
    }
}

/// Mutation observer options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationObserverInit {
    pub child_list: bool,
    pub attributes: bool,
    pub character_data: bool,
    pub subtree: bool,
    pub attribute_old_value: bool,
    pub attribute_filter: Option<Vec<String>>,
}

impl MutationObserverInit {
    /// Accepts the record's type and attribute filter
    pub(crate) fn accepts(&self, record: &MutationRecord) -> bool {
        match record.mutation_type {
            MutationType::ChildList => self.child_list,
            MutationType::CharacterData => self.character_data,
            MutationType::Attributes => {
                self.attributes && match (&self.attribute_filter, &record.attribute_name) {
                    (Some(filter), Some(name)) => filter.contains(name),
                    _ => true,
                }
            }
        }
    }
}

/// Handle for one registered observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub(crate) u64);

#[derive(Debug)]
struct Observation {
    id: ObserverId,
    target: NodeId,
    options: MutationObserverInit,
    pending: Vec<MutationRecord>,
}

/// Registered observations and their pending records
#[derive(Debug, Default)]
pub(crate) struct MutationLog {
    observations: Vec<Observation>,
    next_id: u64,
}

impl MutationLog {
    pub fn observe(&mut self, target: NodeId, options: MutationObserverInit) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observations.push(Observation {
            id,
            target,
            options,
            pending: Vec::new(),
        });
        id
    }

    pub fn disconnect(&mut self, id: ObserverId) {
        self.observations.retain(|o| o.id != id);
    }

    pub fn take_records(&mut self, id: ObserverId) -> Vec<MutationRecord> {
        self.observations.iter_mut()
            .find(|o| o.id == id)
            .map(|o| std::mem::take(&mut o.pending))
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Queue `record` for every observation covering it. `ancestors` is the
    /// inclusive ancestor chain of the record target at mutation time.
    pub fn record(&mut self, record: &MutationRecord, ancestors: &[NodeId]) {
        for observation in &mut self.observations {
            let covers = if observation.options.subtree {
                ancestors.contains(&observation.target)
            } else {
                observation.target == record.target
            };

            if covers && observation.options.accepts(record) {
                let mut record = record.clone();
                if !observation.options.attribute_old_value
                    && record.mutation_type == MutationType::Attributes
                {
                    record.old_value = None;
                }
                observation.pending.push(record);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_filter() {
        let options = MutationObserverInit {
            attributes: true,
            attribute_filter: Some(vec!["class".to_string()]),
            ..Default::default()
        };

        assert!(options.accepts(&MutationRecord::attributes(NodeId(1), "class", None)));
        assert!(!options.accepts(&MutationRecord::attributes(NodeId(1), "id", None)));
        assert!(!options.accepts(&MutationRecord::child_list(NodeId(1), vec![], vec![])));
    }

    #[test]
    fn test_subtree_delivery() {
        let mut log = MutationLog::default();
        let shallow = log.observe(NodeId(1), MutationObserverInit {
            child_list: true,
            ..Default::default()
        });
        let deep = log.observe(NodeId(1), MutationObserverInit {
            child_list: true,
            subtree: true,
            ..Default::default()
        });

        let record = MutationRecord::child_list(NodeId(2), vec![NodeId(3)], vec![]);
        log.record(&record, &[NodeId(2), NodeId(1), NodeId(0)]);

        assert!(log.take_records(shallow).is_empty());
        assert_eq!(log.take_records(deep), vec![record]);
        assert!(log.take_records(deep).is_empty());
    }

    #[test]
    fn test_disconnect_drops_pending() {
        let mut log = MutationLog::default();
        let id = log.observe(NodeId(1), MutationObserverInit {
            attributes: true,
            ..Default::default()
        });

        log.record(&MutationRecord::attributes(NodeId(1), "id", None), &[NodeId(1)]);
        log.disconnect(id);

        assert!(log.take_records(id).is_empty());
        assert!(log.is_empty());
    }
}
