//! Layout Index Builder
//!
//! Positions of every (class, spec) pair, used for horizontal placement.
//! Lookups are always keyed by the pair: "holy" exists under both
//! paladin and priest and the two must never collide.

use serde::Serialize;
use std::collections::HashMap;

use super::registry::ClassSpecRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LayoutIndex {
    pub class_position: usize,
    pub class_count: usize,
    pub spec_position: usize,
    pub spec_count: usize,
    pub global_position: usize,
    pub global_count: usize,
}

impl LayoutIndex {
    /// Horizontal slot in `[0, 1)`
    pub fn relative_x(&self) -> f64 {
        self.global_position as f64 / self.global_count as f64
    }
}

/// class → spec → LayoutIndex
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LayoutTable {
    classes: HashMap<String, HashMap<String, LayoutIndex>>,
}

impl LayoutTable {
    pub fn get(&self, class_name: &str, spec_name: &str) -> Option<&LayoutIndex> {
        self.classes.get(class_name)?.get(spec_name)
    }

    pub fn len(&self) -> usize {
        self.classes.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &LayoutIndex)> {
        self.classes.iter().flat_map(|(class, specs)| {
            specs
                .iter()
                .map(move |(spec, index)| (class.as_str(), spec.as_str(), index))
        })
    }
}

/// Compute the layout of every (class, spec) pair in registry order.
pub fn build_index(registry: &ClassSpecRegistry) -> LayoutTable {
    let class_count = registry.class_count();
    let global_count = registry.pairs().count();

    let mut classes: HashMap<String, HashMap<String, LayoutIndex>> = HashMap::new();
    let mut global_position = 0;
    for (class_position, entry) in registry.entries().iter().enumerate() {
        let spec_count = entry.specs.len();
        let specs = classes.entry(entry.class_name.clone()).or_default();
        for (spec_position, spec) in entry.specs.iter().enumerate() {
            specs.insert(
                spec.clone(),
                LayoutIndex {
                    class_position,
                    class_count,
                    spec_position,
                    spec_count,
                    global_position,
                    global_count,
                },
            );
            global_position += 1;
        }
    }

    LayoutTable { classes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classes::ClassSpecEntry;

    #[test]
    fn test_global_positions_cover_range() {
        let registry = ClassSpecRegistry::default();
        let table = build_index(&registry);
        let total = registry.pairs().count();
        assert_eq!(table.len(), total);

        let mut positions: Vec<usize> = table.iter().map(|(_, _, i)| i.global_position).collect();
        positions.sort_unstable();
        assert_eq!(positions, (0..total).collect::<Vec<_>>());
        assert!(table.iter().all(|(_, _, i)| i.global_count == total));
    }

    #[test]
    fn test_shared_spec_names_are_distinct() {
        let table = build_index(&ClassSpecRegistry::default());
        let paladin = table.get("paladin", "holy").unwrap();
        let priest = table.get("priest", "holy").unwrap();
        assert_ne!(paladin.class_position, priest.class_position);
        assert_ne!(paladin.global_position, priest.global_position);
        assert_eq!(paladin.spec_position, 0);
        assert_eq!(priest.spec_position, 1);
    }

    #[test]
    fn test_class_major_order() {
        let registry = ClassSpecRegistry::new(vec![
            ClassSpecEntry::new("demon_hunter", &["havoc", "vengeance"]),
            ClassSpecEntry::new("druid", &["balance", "guardian", "feral", "restoration"]),
        ])
        .unwrap();
        let table = build_index(&registry);

        let order: Vec<usize> = registry
            .pairs()
            .map(|(c, s)| table.get(c, s).unwrap().global_position)
            .collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4, 5]);

        let feral = table.get("druid", "feral").unwrap();
        assert_eq!(
            *feral,
            LayoutIndex {
                class_position: 1,
                class_count: 2,
                spec_position: 2,
                spec_count: 4,
                global_position: 4,
                global_count: 6,
            }
        );
        assert!((feral.relative_x() - 4.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_rebuild_is_stable() {
        let registry = ClassSpecRegistry::default();
        assert_eq!(build_index(&registry), build_index(&registry));
        assert!(table_missing_pairs_are_none(&build_index(&registry)));
    }

    fn table_missing_pairs_are_none(table: &LayoutTable) -> bool {
        table.get("mage", "holy").is_none() && table.get("bard", "lute").is_none()
    }
}
