// tree.rs — Node kinds, pointer resolution, and the structural folds.
//
// Everything here works on plain `serde_json::Value` trees. A clone of a
// Value owns all of its children, so `clone()` is the deep copy used at
// every point where data crosses between the committed and working trees.

use serde_json::Value;

use crate::error::StoreError;
use crate::key::{Key, NamespacePath};

/// Shape of a node, decided by an explicit match on the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Mapping,
    List,
    Leaf,
}

impl NodeKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Object(_) => NodeKind::Mapping,
            Value::Array(_) => NodeKind::List,
            _ => NodeKind::Leaf,
        }
    }

    pub fn is_composite(self) -> bool {
        self != NodeKind::Leaf
    }
}

/// Child of a composite node, or `None` if absent (or if `node` is a leaf).
pub fn child<'a>(node: &'a Value, key: &Key) -> Option<&'a Value> {
    match (node, key) {
        (Value::Object(map), Key::Name(name)) => map.get(name),
        (Value::Object(map), Key::Index(i)) => map.get(&i.to_string()),
        (Value::Array(items), key) => key.as_index().and_then(|i| items.get(i)),
        _ => None,
    }
}

pub fn child_mut<'a>(node: &'a mut Value, key: &Key) -> Option<&'a mut Value> {
    match (node, key) {
        (Value::Object(map), Key::Name(name)) => map.get_mut(name),
        (Value::Object(map), Key::Index(i)) => map.get_mut(&i.to_string()),
        (Value::Array(items), key) => key.as_index().and_then(move |i| items.get_mut(i)),
        _ => None,
    }
}

/// Walk `path` from `root`. Side-effect free; `None` if any segment is absent.
pub fn resolve<'a>(root: &'a Value, path: &NamespacePath) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(root, |node, key| child(node, key))
}

pub fn resolve_mut<'a>(root: &'a mut Value, path: &NamespacePath) -> Option<&'a mut Value> {
    let mut node = root;
    for key in path.segments() {
        node = child_mut(node, key)?;
    }
    Some(node)
}

/// Keys of a composite node in enumeration order. `None` for leaves.
pub fn keys_of(node: &Value) -> Option<Vec<Key>> {
    match node {
        Value::Object(map) => Some(map.keys().map(|k| Key::Name(k.clone())).collect()),
        Value::Array(items) => Some((0..items.len()).map(Key::Index).collect()),
        _ => None,
    }
}

/// Consume a composite node into its `(key, value)` entries.
pub fn into_entries(
    node: Value,
    path: &NamespacePath,
) -> Result<(NodeKind, Vec<(Key, Value)>), StoreError> {
    match node {
        Value::Object(map) => Ok((
            NodeKind::Mapping,
            map.into_iter().map(|(k, v)| (Key::Name(k), v)).collect(),
        )),
        Value::Array(items) => Ok((
            NodeKind::List,
            items
                .into_iter()
                .enumerate()
                .map(|(i, v)| (Key::Index(i), v))
                .collect(),
        )),
        _ => Err(StoreError::NotComposite {
            path: path.to_string(),
        }),
    }
}

/// Write `value` at `key` inside `node`, returning what was there.
///
/// On a list, writing at `len` appends and writing past it pads with
/// `null`, which is how a sparse array renders as JSON.
pub fn put_child(
    node: &mut Value,
    key: &Key,
    value: Value,
    path: &NamespacePath,
) -> Result<Option<Value>, StoreError> {
    match node {
        Value::Object(map) => Ok(map.insert(key.as_name(), value)),
        Value::Array(items) => {
            let i = key.as_index().ok_or_else(|| StoreError::ShapeMismatch {
                path: path.to_string(),
                key: key.to_string(),
            })?;
            if i < items.len() {
                Ok(Some(std::mem::replace(&mut items[i], value)))
            } else {
                items.resize(i, Value::Null);
                items.push(value);
                Ok(None)
            }
        }
        _ => Err(StoreError::NotComposite {
            path: path.to_string(),
        }),
    }
}

/// Remove `key` from `node`. List elements after it shift down one place.
pub fn remove_child(
    node: &mut Value,
    key: &Key,
    path: &NamespacePath,
) -> Result<Option<Value>, StoreError> {
    match node {
        Value::Object(map) => Ok(map.shift_remove(&key.as_name())),
        Value::Array(items) => Ok(match key.as_index() {
            Some(i) if i < items.len() => Some(items.remove(i)),
            _ => None,
        }),
        _ => Err(StoreError::NotComposite {
            path: path.to_string(),
        }),
    }
}

/// Strict leaf equality; numbers compare by value so `1` equals `1.0`.
pub fn leaf_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            x == y || matches!((x.as_f64(), y.as_f64()), (Some(p), Some(q)) if p == q)
        }
        _ => a == b,
    }
}

/// True iff `working` differs from `committed` anywhere at or below this node.
///
/// Mappings: a key-count mismatch is divergence; otherwise every committed
/// key must be present in `working` and not diverge. Equal counts with every
/// committed key present means the key sets are equal, so working-only keys
/// cannot go unnoticed.
pub fn diverges(committed: &Value, working: &Value) -> bool {
    match (committed, working) {
        (Value::Object(c), Value::Object(w)) => {
            c.len() != w.len()
                || c.iter().any(|(k, cv)| match w.get(k) {
                    Some(wv) => diverges(cv, wv),
                    None => true,
                })
        }
        (Value::Array(c), Value::Array(w)) => {
            c.len() != w.len() || c.iter().zip(w).any(|(cv, wv)| diverges(cv, wv))
        }
        (c, w) if NodeKind::of(c) != NodeKind::of(w) => true,
        (c, w) => !leaf_eq(c, w),
    }
}

/// Make `working` value-equal to `committed`, in place where shapes agree.
///
/// Composite children present on both sides are folded recursively rather
/// than replaced; absent or reshaped children are deep-copied in; keys only
/// present in `working` are dropped.
pub fn fold_reset(working: &mut Value, committed: &Value) {
    match (working, committed) {
        (Value::Object(w), Value::Object(c)) => {
            for (k, cv) in c {
                if NodeKind::of(cv).is_composite() {
                    if let Some(wv) = w.get_mut(k) {
                        fold_reset(wv, cv);
                        continue;
                    }
                }
                w.insert(k.clone(), cv.clone());
            }
            w.retain(|k, _| c.contains_key(k));
        }
        (Value::Array(w), Value::Array(c)) => {
            w.truncate(c.len());
            for (i, cv) in c.iter().enumerate() {
                if i >= w.len() {
                    w.push(cv.clone());
                } else if NodeKind::of(cv).is_composite() {
                    fold_reset(&mut w[i], cv);
                } else {
                    w[i] = cv.clone();
                }
            }
        }
        (w, c) => *w = c.clone(),
    }
}
