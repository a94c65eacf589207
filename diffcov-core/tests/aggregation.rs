//! Integration test for diff-aware aggregation.
//!
//! Exercises: DiffRegistry::populate, SourceNode::tracked, line replay from
//! methods into classes and source files, and package/bundle rollup.

use diffcov_core::{
    ClassInfo, Counter, CounterEntity, CoverageData, CoverageNode, DiffRegistry, ElementType,
    LineRange, MethodFingerprint, SourceData, SourceNode,
};

const CLASS: &str = "org/acme/Foo";
const SOURCE: &str = "org/acme/Foo.java";

fn registry() -> DiffRegistry {
    let registry = DiffRegistry::new(true);
    let changed = MethodFingerprint {
        enclosing_class_path: "org.acme.Foo".to_owned(),
        method_name: "work".to_owned(),
        parameter_signatures: vec!["int n".to_owned()],
        content_hash: "abc".to_owned(),
        is_anonymous_class: false,
    };
    registry
        .populate(vec![ClassInfo::new(CLASS, SOURCE, vec![changed], vec![LineRange::new(10, 13)])])
        .unwrap();
    registry
}

/// Method spanning lines 10..=14; lines 10-12 are covered and changed,
/// lines 13-14 are missed and unchanged.
fn work_method(registry: &DiffRegistry) -> SourceNode {
    let mut method = SourceNode::tracked(ElementType::Method, "work", Some(SOURCE), registry);
    method.ensure_capacity(Some(10), Some(14));
    for nr in 10..=12 {
        method.increment(Counter::new(0, 3), Counter::ZERO, Some(nr));
    }
    for nr in 13..=14 {
        method.increment(Counter::new(2, 0), Counter::ZERO, Some(nr));
    }
    let is_diff = registry.is_changed_method(SOURCE, "org.acme.Foo", "work");
    method.increment_method(is_diff);
    method
}

#[test]
fn method_line_and_diff_line_counters() {
    let registry = registry();
    let method = work_method(&registry);

    assert_eq!(method.counter(CounterEntity::Line), Counter::new(2, 3));
    assert_eq!(method.counter(CounterEntity::DiffLine), Counter::new(0, 3));
    assert_eq!(method.counter(CounterEntity::DiffMethod), Counter::COVERED_ONE);
    assert_eq!((method.first_line(), method.last_line()), (Some(10), Some(14)));
}

#[test]
fn rollup_to_bundle() {
    let registry = registry();
    let method = work_method(&registry);

    let mut class = SourceNode::tracked(ElementType::Class, CLASS, Some(SOURCE), &registry);
    class.increment_child(&method).unwrap();
    class.increment_class(registry.is_diff_class(CLASS));

    let mut file = SourceNode::tracked(ElementType::SourceFile, SOURCE, Some(SOURCE), &registry);
    file.increment_child(&class).unwrap();

    let mut package = CoverageNode::new(ElementType::Package, "org/acme");
    package.increment(&class);
    let mut bundle = CoverageNode::new(ElementType::Bundle, "app");
    bundle.increment(&package);

    for node in [class.plain_copy(), file.plain_copy(), bundle.plain_copy()] {
        assert_eq!(node.counter(CounterEntity::Line), Counter::new(2, 3), "{node}");
        assert_eq!(node.counter(CounterEntity::DiffLine), Counter::new(0, 3), "{node}");
        assert_eq!(node.counter(CounterEntity::Instruction), Counter::new(4, 9), "{node}");
    }
    assert_eq!(bundle.counter(CounterEntity::DiffClass), Counter::COVERED_ONE);
    assert_eq!(file.line(11).instructions(), Counter::new(0, 3));
    assert!(file.line(11).is_diff_line());
}

#[test]
fn disabled_diff_mode_keeps_diff_counters_at_zero() {
    let registry = DiffRegistry::disabled();
    let method = work_method(&registry);

    assert_eq!(method.counter(CounterEntity::Line), Counter::new(2, 3));
    assert_eq!(method.counter(CounterEntity::DiffLine), Counter::ZERO);
    assert_eq!(method.counter(CounterEntity::DiffMethod), Counter::ZERO);
}
