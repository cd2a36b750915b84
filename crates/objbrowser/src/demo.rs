//! A sample object graph covering the shapes the browser can show

use obj_tree::value::{Function, Object, Value};
use obj_tree::InspectError;

/// Build the demo graph.
///
/// Contains every container kind, a list that holds itself, an object with
/// a property that always fails and a few functions.
pub fn demo_value() -> Value {
    let cyclic = Value::list(vec![Value::from("head")]);
    // the list ends up inside itself
    let _ = cyclic.push(cyclic.clone());

    let area = Function::new("area")
        .with_doc("Return the area of a circle with radius r.")
        .with_source("def area(r):\n    return math.pi * r ** 2");

    let point = Object::new("Point")
        .with_doc("A point in the plane.")
        .with_field("x", Value::from(3))
        .with_field("y", Value::from(4))
        .with_property("norm", |p| {
            let coordinate = |name: &str| match p.field(name) {
                Some(Value::Int(i)) => Ok(i as f64),
                _ => Err(InspectError::raised(format!("{name} is not an int"))),
            };
            Ok(Value::from(coordinate("x")?.hypot(coordinate("y")?)))
        })
        .with_property("broken", |_| {
            Err(InspectError::raised("ZeroDivisionError: division by zero"))
        })
        .with_method(Function::new("translate").with_doc("Move the point by (dx, dy)."));

    let settings = Value::ordered_dict(vec![
        (Value::from("theme"), Value::from("dark")),
        (Value::from("font_size"), Value::from(11)),
        (Value::from("plugins"), Value::list(Vec::new())),
    ]);

    Value::dict(vec![
        (Value::from("nothing"), Value::None),
        (Value::from("flag"), Value::from(true)),
        (Value::from("answer"), Value::from(42)),
        (Value::from("pi"), Value::from(std::f64::consts::PI)),
        (
            Value::from("text"),
            Value::from("multi line\nstring with \"quotes\""),
        ),
        (Value::from("raw"), Value::bytes(b"\x00\x01binary".to_vec())),
        (
            Value::from("numbers"),
            Value::list((1..=5i64).map(Value::from).collect()),
        ),
        (
            Value::from("pair"),
            Value::tuple(vec![Value::from("a"), Value::from(1.5)]),
        ),
        (
            Value::from("tags"),
            Value::set(vec![
                Value::from("red"),
                Value::from("green"),
                Value::from("blue"),
            ]),
        ),
        (
            Value::from("mixed_keys"),
            Value::dict(vec![
                (Value::from(1), Value::from("int key")),
                (Value::from("1"), Value::from("str key")),
            ]),
        ),
        (Value::from("settings"), settings),
        (Value::from("cyclic"), cyclic),
        (Value::from("point"), Value::object(point)),
        (Value::from("area"), Value::function(area)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use obj_tree::prelude::*;

    #[test]
    fn test_demo_expands_everywhere() {
        let mut tree = ObjectTree::new(demo_value(), "demo");
        let inspected = tree.inspected();
        tree.fetch_children(inspected, &mut ()).unwrap();
        let children: Vec<NodeId> = tree.child_ids(inspected).to_vec();
        for id in children {
            tree.fetch_children(id, &mut ()).unwrap();
            assert_eq!(tree.fetch_error(id), None, "{:?}", tree.path(id));
        }
        let cyclic = tree.find_by_path("demo['cyclic']").unwrap();
        assert_eq!(
            tree.value(cyclic).unwrap().repr().unwrap(),
            "['head', [...]]"
        );
    }

    #[test]
    fn test_failing_property_is_skipped() {
        let mut tree = ObjectTree::new(demo_value(), "demo");
        let inspected = tree.inspected();
        tree.fetch_children(inspected, &mut ()).unwrap();
        let point = tree.find_by_path("demo['point']").unwrap();
        tree.fetch_children(point, &mut ()).unwrap();
        assert!(tree.find_by_path("demo['point'].norm").is_some());
        assert!(tree.find_by_path("demo['point'].broken").is_none());
        let norm = tree.find_by_path("demo['point'].norm").unwrap();
        assert_eq!(tree.value(norm).unwrap().repr().unwrap(), "5.0");
    }
}
