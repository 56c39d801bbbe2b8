//! Convert-then-release materialization of foreign values.
//!
//! [`materialize`] takes ownership of a foreign handle, walks it into a
//! [`NativeValue`] with no remaining link to the runtime, and releases every
//! handle it reached (nested ones first, the top-level one last). Each handle
//! is released exactly once because the token is moved into the release call.
//!
//! If the runtime fails while being inspected, the error is returned as-is
//! and no cleanup is attempted beyond what the runtime does on its own error
//! path. The handles collected so far are dropped without being released.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::trace;

use crate::error::{EngineError, EngineResult};
use crate::foreign::{ForeignHandle, ForeignItem, ForeignNode, ForeignRuntime};

/// Plain Rust data materialized from the foreign runtime.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NativeValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<NativeValue>),
    Record(BTreeMap<String, NativeValue>),
}

impl NativeValue {
    /// Look up a record field.
    pub fn field(&self, name: &str) -> EngineResult<&NativeValue> {
        match self {
            NativeValue::Record(fields) => {
                fields.get(name).ok_or_else(|| EngineError::MissingField {
                    field: name.to_string(),
                })
            }
            _ => Err(EngineError::TypeMismatch {
                what: name.to_string(),
                expected: "record",
            }),
        }
    }

    pub fn as_f64(&self, what: &str) -> EngineResult<f64> {
        match self {
            NativeValue::Number(v) => Ok(*v),
            _ => Err(EngineError::TypeMismatch {
                what: what.to_string(),
                expected: "number",
            }),
        }
    }

    pub fn as_f64_vec(&self, what: &str) -> EngineResult<Vec<f64>> {
        match self {
            NativeValue::List(items) => items.iter().map(|v| v.as_f64(what)).collect(),
            _ => Err(EngineError::TypeMismatch {
                what: what.to_string(),
                expected: "list of numbers",
            }),
        }
    }

    /// Number stored under `name` in a record.
    pub fn number(&self, name: &str) -> EngineResult<f64> {
        self.field(name)?.as_f64(name)
    }
}

/// Convert a foreign value into native data, releasing everything reached.
///
/// Returns `Ok(None)` without touching the runtime when `value` is absent.
pub fn materialize<R>(runtime: &R, value: Option<ForeignHandle>) -> EngineResult<Option<NativeValue>>
where
    R: ForeignRuntime + ?Sized,
{
    let Some(root) = value else {
        return Ok(None);
    };

    let mut reached = Vec::new();
    let native = convert(runtime, &root, &mut reached)?;

    trace!(nested = reached.len(), root = root.raw(), "materialized foreign value");
    for handle in reached {
        runtime.release(handle);
    }
    runtime.release(root);
    Ok(Some(native))
}

fn convert<R>(
    runtime: &R,
    handle: &ForeignHandle,
    reached: &mut Vec<ForeignHandle>,
) -> EngineResult<NativeValue>
where
    R: ForeignRuntime + ?Sized,
{
    match runtime.inspect(handle)? {
        ForeignNode::Scalar(value) => Ok(value),
        ForeignNode::List(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(convert_item(runtime, item, reached)?);
            }
            Ok(NativeValue::List(out))
        }
        ForeignNode::Record(fields) => {
            let mut out = BTreeMap::new();
            for (name, item) in fields {
                let value = convert_item(runtime, item, reached)?;
                out.insert(name, value);
            }
            Ok(NativeValue::Record(out))
        }
    }
}

fn convert_item<R>(
    runtime: &R,
    item: ForeignItem,
    reached: &mut Vec<ForeignHandle>,
) -> EngineResult<NativeValue>
where
    R: ForeignRuntime + ?Sized,
{
    match item {
        ForeignItem::Immediate(value) => Ok(value),
        ForeignItem::Object(handle) => {
            let converted = convert(runtime, &handle, reached);
            reached.push(handle);
            converted
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Tiny runtime: a table of nodes described by closures over ids.
    #[derive(Default)]
    struct TableRuntime {
        nodes: HashMap<u64, Shape>,
        released: RefCell<Vec<u64>>,
        failing: Option<u64>,
    }

    #[derive(Clone)]
    enum Shape {
        Number(f64),
        List(Vec<u64>),
        Record(Vec<(&'static str, u64)>),
        Numbers(Vec<f64>),
    }

    impl ForeignRuntime for TableRuntime {
        fn inspect(&self, handle: &ForeignHandle) -> EngineResult<ForeignNode> {
            if self.failing == Some(handle.raw()) {
                return Err(EngineError::Foreign {
                    message: "boom".into(),
                });
            }
            let shape = self
                .nodes
                .get(&handle.raw())
                .cloned()
                .ok_or(EngineError::StaleHandle { id: handle.raw() })?;
            Ok(match shape {
                Shape::Number(v) => ForeignNode::Scalar(NativeValue::Number(v)),
                Shape::List(ids) => ForeignNode::List(
                    ids.into_iter()
                        .map(|id| ForeignItem::Object(ForeignHandle::from_raw(id)))
                        .collect(),
                ),
                Shape::Record(fields) => ForeignNode::Record(
                    fields
                        .into_iter()
                        .map(|(k, id)| (k.to_string(), ForeignItem::Object(ForeignHandle::from_raw(id))))
                        .collect(),
                ),
                Shape::Numbers(values) => ForeignNode::List(
                    values
                        .into_iter()
                        .map(|v| ForeignItem::Immediate(NativeValue::Number(v)))
                        .collect(),
                ),
            })
        }

        fn release(&self, handle: ForeignHandle) {
            self.released.borrow_mut().push(handle.raw());
        }
    }

    fn nested_runtime() -> TableRuntime {
        let mut rt = TableRuntime::default();
        rt.nodes.insert(1, Shape::Record(vec![("x", 2), ("inner", 3)]));
        rt.nodes.insert(2, Shape::Numbers(vec![0.0, 1.0]));
        rt.nodes.insert(3, Shape::List(vec![4, 5]));
        rt.nodes.insert(4, Shape::Number(7.0));
        rt.nodes.insert(5, Shape::List(vec![6]));
        rt.nodes.insert(6, Shape::Number(8.0));
        rt
    }

    #[test]
    fn absent_value_has_no_side_effects() {
        let rt = nested_runtime();
        assert_eq!(materialize(&rt, None).unwrap(), None);
        assert!(rt.released.borrow().is_empty());
    }

    #[test]
    fn nested_value_releases_every_handle_once() {
        let rt = nested_runtime();
        let value = materialize(&rt, Some(ForeignHandle::from_raw(1)))
            .unwrap()
            .unwrap();

        assert_eq!(value.field("x").unwrap().as_f64_vec("x").unwrap(), vec![0.0, 1.0]);
        let inner = value.field("inner").unwrap();
        assert_eq!(
            inner,
            &NativeValue::List(vec![
                NativeValue::Number(7.0),
                NativeValue::List(vec![NativeValue::Number(8.0)]),
            ])
        );

        let mut released = rt.released.borrow().clone();
        // top-level handle goes last
        assert_eq!(released.last(), Some(&1));
        released.sort_unstable();
        assert_eq!(released, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn runtime_failure_propagates_without_cleanup() {
        let mut rt = nested_runtime();
        rt.failing = Some(5);
        let err = materialize(&rt, Some(ForeignHandle::from_raw(1))).unwrap_err();
        assert!(matches!(err, EngineError::Foreign { .. }));
        assert!(rt.released.borrow().is_empty());
    }

    #[test]
    fn accessor_errors_name_the_field() {
        let value = NativeValue::Record(BTreeMap::from([(
            "x".to_string(),
            NativeValue::Text("nope".into()),
        )]));
        assert!(matches!(
            value.field("y"),
            Err(EngineError::MissingField { .. })
        ));
        assert!(matches!(
            value.number("x"),
            Err(EngineError::TypeMismatch { expected: "number", .. })
        ));
    }

    #[test]
    fn native_values_serialize_as_plain_json() {
        let value = NativeValue::Record(BTreeMap::from([
            (
                "x".to_string(),
                NativeValue::List(vec![NativeValue::Number(0.5), NativeValue::Null]),
            ),
            ("name".to_string(), NativeValue::Text("a".into())),
            ("ok".to_string(), NativeValue::Bool(true)),
        ]));
        assert_eq!(
            serde_json::to_value(&value).unwrap(),
            serde_json::json!({ "name": "a", "ok": true, "x": [0.5, null] })
        );
    }

    const FIELDS: [&str; 4] = ["a", "b", "c", "d"];

    #[derive(Clone, Debug)]
    enum Tree {
        Leaf(f64),
        Numbers(Vec<f64>),
        List(Vec<Tree>),
        Record(Vec<Tree>),
    }

    fn tree() -> impl Strategy<Value = Tree> {
        let leaf = prop_oneof![
            (-1.0e6_f64..1.0e6).prop_map(Tree::Leaf),
            prop::collection::vec(-1.0e6_f64..1.0e6, 0..4).prop_map(Tree::Numbers),
        ];
        leaf.prop_recursive(4, 32, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Tree::List),
                prop::collection::vec(inner, 0..=FIELDS.len()).prop_map(Tree::Record),
            ]
        })
    }

    /// Store `tree` in the table, ids assigned in pre-order from 1.
    fn store(rt: &mut TableRuntime, tree: &Tree, next: &mut u64) -> u64 {
        *next += 1;
        let id = *next;
        let shape = match tree {
            Tree::Leaf(v) => Shape::Number(*v),
            Tree::Numbers(values) => Shape::Numbers(values.clone()),
            Tree::List(items) => Shape::List(items.iter().map(|t| store(rt, t, next)).collect()),
            Tree::Record(items) => Shape::Record(
                FIELDS
                    .iter()
                    .zip(items)
                    .map(|(&name, t)| (name, store(rt, t, next)))
                    .collect(),
            ),
        };
        rt.nodes.insert(id, shape);
        id
    }

    fn native(tree: &Tree) -> NativeValue {
        match tree {
            Tree::Leaf(v) => NativeValue::Number(*v),
            Tree::Numbers(values) => {
                NativeValue::List(values.iter().map(|v| NativeValue::Number(*v)).collect())
            }
            Tree::List(items) => NativeValue::List(items.iter().map(native).collect()),
            Tree::Record(items) => NativeValue::Record(
                FIELDS
                    .iter()
                    .zip(items)
                    .map(|(name, t)| (name.to_string(), native(t)))
                    .collect(),
            ),
        }
    }

    proptest! {
        #[test]
        fn any_tree_is_released_exactly_once_root_last(tree in tree()) {
            let mut rt = TableRuntime::default();
            let mut next = 0;
            let root = store(&mut rt, &tree, &mut next);

            let value = materialize(&rt, Some(ForeignHandle::from_raw(root))).unwrap();
            prop_assert_eq!(value, Some(native(&tree)));

            let mut released = rt.released.borrow().clone();
            prop_assert_eq!(released.last(), Some(&root));
            released.sort_unstable();
            prop_assert_eq!(released, (1..=next).collect::<Vec<_>>());
        }
    }
}
