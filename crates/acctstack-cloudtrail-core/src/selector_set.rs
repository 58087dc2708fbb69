//! Normalized, set-based view of a trail's event selectors.
//!
//! The wire format is a list of records, each holding a list of
//! `{Type, Values}` pairs. [`EventSelectorSet`] re-keys that into
//! `ReadWriteType -> Selector` and `ResourceType -> set of ARN prefixes`, so
//! desired state can be applied with plain set union and difference.

use std::collections::{BTreeMap, BTreeSet};

use acctstack_cloudtrail_model::{
    DataEventSelectors, DataResource, EventSelector, ManagementEventSelection, ReadWriteType,
};

/// Selector for one read/write partition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    /// Whether management events are captured under this partition.
    pub include_management_events: bool,
    /// Resource type -> ARN prefixes.
    pub data_resources: BTreeMap<String, BTreeSet<String>>,
    /// Management event sources excluded from logging. Carried through as-is.
    pub exclude_management_event_sources: BTreeSet<String>,
}

impl Selector {
    /// ARN prefixes for `resource_type`, creating an empty set if absent.
    pub fn resource_values_mut(&mut self, resource_type: &str) -> &mut BTreeSet<String> {
        self.data_resources
            .entry(resource_type.to_owned())
            .or_default()
    }

    /// Whether the selector logs any data resource.
    #[must_use]
    pub fn has_data_resources(&self) -> bool {
        self.data_resources.values().any(|values| !values.is_empty())
    }

    /// A selector that captures nothing and must not be written.
    #[must_use]
    pub fn is_vacuous(&self) -> bool {
        !self.include_management_events && !self.has_data_resources()
    }
}

/// A trail's event selectors keyed by read/write type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventSelectorSet {
    selectors: BTreeMap<ReadWriteType, Selector>,
}

impl EventSelectorSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from `GetEventSelectors` records.
    ///
    /// Missing `ReadWriteType` and `IncludeManagementEvents` take CloudTrail's
    /// defaults (`All`, `true`). Records sharing a read/write type are merged.
    #[must_use]
    pub fn from_wire(records: &[EventSelector]) -> Self {
        let mut set = Self::new();
        for record in records {
            let rw = record.read_write_type.unwrap_or(ReadWriteType::All);
            let selector = set.selector_mut(rw);

            selector.include_management_events |= record.include_management_events.unwrap_or(true);
            for resource in &record.data_resources {
                selector
                    .resource_values_mut(&resource.resource_type)
                    .extend(resource.values.iter().cloned());
            }
            selector
                .exclude_management_event_sources
                .extend(record.exclude_management_event_sources.iter().cloned());
        }
        set
    }

    /// The selector for `rw`, if present.
    #[must_use]
    pub fn get(&self, rw: ReadWriteType) -> Option<&Selector> {
        self.selectors.get(&rw)
    }

    /// The selector for `rw`, creating an empty one (no management events,
    /// no data resources) if absent.
    pub fn selector_mut(&mut self, rw: ReadWriteType) -> &mut Selector {
        self.selectors.entry(rw).or_default()
    }

    /// Iterate selectors in read/write type order, including vacuous ones.
    pub fn iter(&self) -> impl Iterator<Item = (ReadWriteType, &Selector)> {
        self.selectors.iter().map(|(rw, selector)| (*rw, selector))
    }

    /// Add every desired ARN prefix. Existing, unrelated entries are kept.
    pub fn union(&mut self, desired: &DataEventSelectors) {
        for (rw, resources) in desired {
            let selector = self.selector_mut(*rw);
            for (resource_type, values) in resources {
                selector
                    .resource_values_mut(resource_type)
                    .extend(values.iter().cloned());
            }
        }
    }

    /// Remove every desired ARN prefix.
    ///
    /// Sets left empty stay in the map; serialization skips them.
    pub fn subtract(&mut self, desired: &DataEventSelectors) {
        for (rw, resources) in desired {
            let Some(selector) = self.selectors.get_mut(rw) else {
                continue;
            };
            for (resource_type, values) in resources {
                if let Some(existing) = selector.data_resources.get_mut(resource_type) {
                    existing.retain(|value| !values.contains(value));
                }
            }
        }
    }

    /// Route management events to exactly one partition (or none).
    ///
    /// Clears the flag everywhere before setting it, so at most one selector
    /// includes management events afterwards.
    pub fn select_management_events(&mut self, selection: ManagementEventSelection) {
        for selector in self.selectors.values_mut() {
            selector.include_management_events = false;
        }
        if let Some(rw) = selection.read_write_type() {
            self.selector_mut(rw).include_management_events = true;
        }
    }

    /// Whether every selector is vacuous.
    #[must_use]
    pub fn is_vacuous(&self) -> bool {
        self.selectors.values().all(Selector::is_vacuous)
    }

    /// Serialize to `PutEventSelectors` records, dropping vacuous selectors
    /// and resource types with no ARN prefixes.
    #[must_use]
    pub fn to_wire(&self) -> Vec<EventSelector> {
        self.iter()
            .filter(|(_, selector)| !selector.is_vacuous())
            .map(|(rw, selector)| EventSelector {
                read_write_type: Some(rw),
                include_management_events: Some(selector.include_management_events),
                data_resources: selector
                    .data_resources
                    .iter()
                    .filter(|(_, values)| !values.is_empty())
                    .map(|(resource_type, values)| DataResource {
                        resource_type: resource_type.clone(),
                        values: values.iter().cloned().collect(),
                    })
                    .collect(),
                exclude_management_event_sources: selector
                    .exclude_management_event_sources
                    .iter()
                    .cloned()
                    .collect(),
            })
            .collect()
    }
}
