//! Aggregate counts over a structure model.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::structure::{ElementId, ElementKind, RelationKind, StructureModel};

/// A named structural metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Metric {
    TotalElements,
    Elements(ElementKind),
    Relations(RelationKind),
    MaxDepth,
    AvgDepth,
    MaxChildren,
    AvgChildren,
}

impl Metric {
    pub fn name(&self) -> &'static str {
        match self {
            Self::TotalElements => "total_elements",
            Self::Elements(kind) => match kind {
                ElementKind::Package => "packages",
                ElementKind::Interface => "interfaces",
                ElementKind::Type => "types",
                ElementKind::Function => "functions",
                ElementKind::Method => "methods",
                ElementKind::Variable => "variables",
            },
            Self::Relations(kind) => kind.as_str(),
            Self::MaxDepth => "max_depth",
            Self::AvgDepth => "avg_depth",
            Self::MaxChildren => "max_children",
            Self::AvgChildren => "avg_children",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Metrics computed from one structure model. Collection never mutates
/// the model.
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    values: BTreeMap<Metric, usize>,
}

impl MetricsCollector {
    pub fn collect(model: &StructureModel) -> Self {
        let mut values = BTreeMap::new();

        values.insert(Metric::TotalElements, model.elements().len());
        for kind in ElementKind::ALL {
            values.insert(Metric::Elements(kind), model.elements_of_kind(kind).count());
        }
        for kind in RelationKind::ALL {
            values.insert(
                Metric::Relations(kind),
                model.relationships_of_kind(kind).count(),
            );
        }

        // Depth and fan-out come from the containment tree only.
        let mut depth: HashMap<ElementId, usize> = HashMap::new();
        let mut children: HashMap<ElementId, usize> = HashMap::new();
        for rel in model.relationships_of_kind(RelationKind::Contains) {
            let parent_depth = depth.get(&rel.source).copied().unwrap_or(0);
            depth.insert(rel.target, parent_depth + 1);
            *children.entry(rel.source).or_insert(0) += 1;
        }

        let (max_depth, avg_depth) = max_and_mean(depth.values().copied());
        let (max_children, avg_children) = max_and_mean(children.values().copied());
        values.insert(Metric::MaxDepth, max_depth);
        values.insert(Metric::AvgDepth, avg_depth);
        values.insert(Metric::MaxChildren, max_children);
        values.insert(Metric::AvgChildren, avg_children);

        Self { values }
    }

    pub fn get(&self, metric: Metric) -> usize {
        self.values.get(&metric).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, usize)> + '_ {
        self.values.iter().map(|(m, v)| (*m, *v))
    }

    /// Metrics keyed by their report name.
    pub fn to_map(&self) -> BTreeMap<&'static str, usize> {
        self.iter().map(|(m, v)| (m.name(), v)).collect()
    }
}

/// Maximum and integer mean; both zero for an empty input.
fn max_and_mean(values: impl Iterator<Item = usize>) -> (usize, usize) {
    let (mut max, mut sum, mut count) = (0usize, 0usize, 0usize);
    for v in values {
        max = max.max(v);
        sum += v;
        count += 1;
    }
    if count == 0 { (0, 0) } else { (max, sum / count) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::Attributes;

    #[test]
    fn empty_model_reports_zeroes() {
        let metrics = MetricsCollector::collect(&StructureModel::new("go"));
        assert_eq!(metrics.get(Metric::TotalElements), 0);
        assert_eq!(metrics.get(Metric::MaxDepth), 0);
        assert_eq!(metrics.get(Metric::AvgChildren), 0);
        assert_eq!(metrics.to_map().len(), 1 + 6 + 7 + 4);
    }

    #[test]
    fn depth_and_children_use_containment_only() {
        let mut model = StructureModel::new("go");
        let a = model.add_element(ElementKind::Package, "a", Attributes::new());
        let b = model.add_element(ElementKind::Package, "b", Attributes::new());
        let mut last = a;
        for name in ["t1", "t2", "t3"] {
            last = model.add_element(ElementKind::Type, name, Attributes::new());
            model.add_relationship(RelationKind::Contains, a, last);
        }
        let f = model.add_element(ElementKind::Function, "f", Attributes::new());
        model.add_relationship(RelationKind::Contains, b, f);
        model.add_relationship(RelationKind::References, f, last);

        let metrics = MetricsCollector::collect(&model);
        assert_eq!(metrics.get(Metric::TotalElements), 6);
        assert_eq!(metrics.get(Metric::Elements(ElementKind::Package)), 2);
        assert_eq!(metrics.get(Metric::Relations(RelationKind::Contains)), 4);
        assert_eq!(metrics.get(Metric::Relations(RelationKind::References)), 1);
        assert_eq!(metrics.get(Metric::MaxDepth), 1);
        assert_eq!(metrics.get(Metric::AvgDepth), 1);
        assert_eq!(metrics.get(Metric::MaxChildren), 3);
        // (3 + 1) / 2 packages with children.
        assert_eq!(metrics.get(Metric::AvgChildren), 2);
    }

    #[test]
    fn nested_containment_accumulates_depth() {
        let mut model = StructureModel::new("go");
        let p = model.add_element(ElementKind::Package, "p", Attributes::new());
        let t = model.add_element(ElementKind::Type, "T", Attributes::new());
        let m = model.add_element(ElementKind::Method, "M", Attributes::new());
        model.add_relationship(RelationKind::Contains, p, t);
        model.add_relationship(RelationKind::Contains, t, m);

        let metrics = MetricsCollector::collect(&model);
        assert_eq!(metrics.get(Metric::MaxDepth), 2);
        // (1 + 2) / 2 truncates.
        assert_eq!(metrics.get(Metric::AvgDepth), 1);
        assert_eq!(metrics.to_map()["max_depth"], 2);
    }
}
