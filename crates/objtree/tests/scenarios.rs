use obj_tree::prelude::*;
use obj_tree::value::{Function, Object, Value};
use obj_tree::InspectError;
use pretty_assertions::assert_eq;

fn structural_rows(tree: &ObjectTree<Value>, parent: NodeId) -> Vec<(String, String)> {
    tree.child_ids(parent)
        .iter()
        .map(|&id| tree.get(id).unwrap())
        .filter(|n| n.kind == NodeKind::Structural)
        .map(|n| (n.path.clone(), n.value.to_text().unwrap()))
        .collect()
}

fn child_named(tree: &ObjectTree<Value>, parent: NodeId, name: &str) -> NodeId {
    tree.child_ids(parent)
        .iter()
        .copied()
        .find(|&id| tree.name(id) == Some(name))
        .unwrap_or_else(|| panic!("{name} not found"))
}

fn sample() -> Value {
    Value::dict(vec![
        (Value::from("x"), Value::from(1)),
        (Value::from("y"), Value::list(vec![2.into(), 3.into()])),
    ])
}

#[test]
fn test_expanding_a_named_mapping() {
    let mut tree = ObjectTree::new(sample(), "root");

    assert!(tree.inspected_node_visible());
    assert_eq!(tree.child_ids(tree.root()).len(), 1);
    let inspected = tree.inspected();
    assert_eq!(tree.name(inspected), Some("root"));
    assert_eq!(tree.kind(inspected), Some(NodeKind::Root));

    tree.fetch_children(inspected, &mut ()).unwrap();
    assert_eq!(
        structural_rows(&tree, inspected),
        vec![
            ("root['x']".to_string(), "1".to_string()),
            ("root['y']".to_string(), "[2, 3]".to_string()),
        ]
    );
    // attributes of the dict come after the entries
    let kinds: Vec<_> = tree
        .child_ids(inspected)
        .iter()
        .map(|&id| tree.kind(id).unwrap())
        .collect();
    assert_eq!(&kinds[..2], &[NodeKind::Structural, NodeKind::Structural]);
    assert!(kinds[2..].iter().all(|k| *k == NodeKind::Attribute));

    let y = child_named(&tree, inspected, "y");
    tree.fetch_children(y, &mut ()).unwrap();
    assert_eq!(
        structural_rows(&tree, y),
        vec![
            ("root['y'][0]".to_string(), "2".to_string()),
            ("root['y'][1]".to_string(), "3".to_string()),
        ]
    );
}

#[test]
fn test_refresh_after_appending() {
    let data = sample();
    let mut tree = ObjectTree::new(data.clone(), "root");
    let inspected = tree.inspected();
    tree.fetch_children(inspected, &mut ()).unwrap();
    let x = child_named(&tree, inspected, "x");
    let y = child_named(&tree, inspected, "y");
    tree.fetch_children(y, &mut ()).unwrap();

    let list = data.as_dict().unwrap().get(&Value::from("y")).unwrap();
    list.push(Value::from(4)).unwrap();

    let mut log = EventLog::new();
    let stats = tree.refresh(&mut log);

    assert_eq!(child_named(&tree, inspected, "x"), x);
    assert_eq!(child_named(&tree, inspected, "y"), y);
    assert!(tree.is_fetched(y));
    assert_eq!(log.inserted_ranges(), vec![(y, 2, 2)]);
    assert!(log.removed_ranges().is_empty());
    assert_eq!(log.events().last(), Some(&TreeEvent::DataChanged));
    assert_eq!(stats.inserted, 1);
    assert_eq!(stats.removed, 0);

    let y2 = tree.child(y, 2).unwrap();
    assert_eq!(tree.path(y2), Some("root['y'][2]"));
    assert_eq!(tree.value(y2).unwrap().repr().unwrap(), "4");
    assert!(!tree.is_fetched(y2));
    assert_eq!(tree.value(y).unwrap().repr().unwrap(), "[2, 3, 4]");
}

#[test]
fn test_failing_property_does_not_hide_the_others() {
    let sensor = Value::object(
        Object::new("Sensor")
            .with_field("id", Value::from(7))
            .with_property("reading", |_| Err(InspectError::raised("device offline")))
            .with_property("unit", |_| Ok(Value::from("C"))),
    );
    let mut tree = ObjectTree::new(sensor, "sensor");
    let inspected = tree.inspected();

    assert_eq!(tree.fetch_children(inspected, &mut ()), Ok(()));
    let names: Vec<_> = tree
        .child_ids(inspected)
        .iter()
        .filter_map(|&id| tree.name(id))
        .collect();
    assert!(names.contains(&"id"));
    assert!(names.contains(&"unit"));
    assert!(!names.contains(&"reading"));
    assert_eq!(tree.fetch_error(inspected), None);
}

#[test]
fn test_filter_only_masks() {
    let obj = Value::object(
        Object::new("Job")
            .with_field("name", Value::from("build"))
            .with_method(Function::new("run")),
    );
    let mut tree = ObjectTree::new(obj, "");
    let snapshot = |tree: &ObjectTree<Value>| -> Vec<(NodeId, bool)> {
        tree.walk(TraversalOrder::PreOrder)
            .map(|id| (id, tree.is_fetched(id)))
            .collect()
    };
    let name = child_named(&tree, NodeId::ROOT, "name");
    tree.fetch_children(name, &mut ()).unwrap();
    let before = snapshot(&tree);

    let all = ViewFilter::default();
    let quiet = all.with_callables(false).with_dunder_attributes(false);
    let shown_all = all.visible_children(&tree, NodeId::ROOT);
    let shown_quiet = quiet.visible_children(&tree, NodeId::ROOT);

    assert!(shown_quiet.len() < shown_all.len());
    let quiet_names: Vec<_> = shown_quiet
        .iter()
        .filter_map(|&(_, id)| tree.name(id))
        .collect();
    assert_eq!(quiet_names, vec!["name"]);
    assert_eq!(snapshot(&tree), before);
    assert_eq!(all.visible_children(&tree, NodeId::ROOT), shown_all);
}

#[test]
fn test_cyclic_values_expand_lazily() {
    let lst = Value::list(vec![Value::from(1)]);
    lst.push(lst.clone()).unwrap();
    let mut tree = ObjectTree::new(lst, "lst");

    let mut current = tree.inspected();
    for depth in 0..5 {
        tree.fetch_children(current, &mut ()).unwrap();
        current = tree.child(current, 1).unwrap();
        assert_eq!(tree.depth(current), depth + 2);
    }
    assert_eq!(tree.path(current), Some("lst[1][1][1][1][1]"));
    assert_eq!(tree.value(current).unwrap().repr().unwrap(), "[1, [...]]");
}

#[test]
fn test_json_documents() {
    let doc: serde_json::Value =
        serde_json::from_str(r#"{"name": "demo", "tags": ["a", "b"]}"#).unwrap();
    let mut tree = ObjectTree::new(doc, "doc");
    let inspected = tree.inspected();
    tree.fetch_children(inspected, &mut ()).unwrap();
    let tags = tree.find_by_path("doc[\"tags\"]").unwrap();
    assert!(tree.has_children(tags));
    tree.fetch_children(tags, &mut ()).unwrap();
    assert_eq!(tree.child_count(tags), ChildCount::Known(2));
    let first = tree.child(tags, 0).unwrap();
    assert!(!tree.has_children(first));
}
