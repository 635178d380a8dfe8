use serde_json::{Map, Value};

use crate::util::{array_index, is_integer};
use crate::PointerError;

/// The slot a pointer addresses inside a mutable document.
///
/// `target` is the immediate parent container of the addressed value and
/// `segment` the final path component inside it. A root pointer has no
/// parent: `target` is the whole document and `segment` is `None`.
///
/// `parents` holds the segments actually descended to reach `target`. Array
/// positions are concrete indexes there: a container created for `-` or an
/// index past the end records the slot it was appended at.
#[derive(Debug)]
pub struct PointerTarget<'a> {
    pub target: &'a mut Value,
    pub segment: Option<String>,
    pub parents: Vec<String>,
    /// The outermost intermediate the walk had to create, if any.
    pub created: Option<CreatedSlot>,
}

/// An intermediate container made by a creating walk.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedSlot {
    /// Position in `parents` of the segment addressing the container, so
    /// the container lives at `parents[..=index]`.
    pub index: usize,
    /// The scalar that was overwritten, `None` when the slot was new.
    pub previous: Option<Value>,
}

impl CreatedSlot {
    /// Segments addressing the created container, given the `parents` of the
    /// walk that reported it.
    pub fn path<'p>(&self, parents: &'p [String]) -> Option<&'p [String]> {
        parents.get(..=self.index)
    }
}

/// What stepping into one segment found.
enum Slot {
    Existing,
    Fresh,
    Overwritten(Value),
}

impl PointerTarget<'_> {
    /// The value currently stored in the addressed slot.
    pub fn value(&self) -> Option<&Value> {
        let Some(segment) = self.segment.as_deref() else {
            return Some(&*self.target);
        };
        match &*self.target {
            Value::Array(arr) => arr.get(array_index(segment, arr.len())?),
            Value::Object(map) => map.get(segment),
            _ => None,
        }
    }

    /// Returns true if the parent container is an array.
    pub fn is_array(&self) -> bool {
        self.segment.is_some() && self.target.is_array()
    }
}

/// Descend all but the last segment of a pointer.
///
/// With `create_missing`, absent or scalar intermediates are replaced by a
/// fresh container (an array when the following segment is numeric, an
/// object otherwise), so writes can build sparse structures. Without it, an
/// absent intermediate ends the walk with `Ok(None)`.
///
/// # Errors
///
/// - `PointerError::InvalidIndex` if a non-numeric segment indexes an array
/// - `PointerError::InvalidTarget` if the document root is a scalar and
///   `create_missing` is set
///
/// # Example
///
/// ```
/// use dojo_json_pointer::walk;
/// use serde_json::json;
///
/// let mut doc = json!({});
/// let target = walk(&["list", "0"], &mut doc, true).unwrap().unwrap();
/// assert_eq!(target.segment.as_deref(), Some("0"));
/// assert_eq!(doc, json!({"list": []}));
/// ```
pub fn walk<'a, S: AsRef<str>>(
    segments: &[S],
    object: &'a mut Value,
    create_missing: bool,
) -> Result<Option<PointerTarget<'a>>, PointerError> {
    let Some((last, parents)) = segments.split_last() else {
        return Ok(Some(PointerTarget {
            target: object,
            segment: None,
            parents: Vec::new(),
            created: None,
        }));
    };

    let mut current = object;
    let mut descended = Vec::with_capacity(parents.len());
    let mut created = None;
    for (i, segment) in parents.iter().enumerate() {
        let next = segments[i + 1].as_ref();
        let Some((child, concrete, slot)) =
            descend(current, segment.as_ref(), next, create_missing)?
        else {
            return Ok(None);
        };
        if created.is_none() {
            created = match slot {
                Slot::Existing => None,
                Slot::Fresh => Some(CreatedSlot { index: i, previous: None }),
                Slot::Overwritten(previous) => Some(CreatedSlot {
                    index: i,
                    previous: Some(previous),
                }),
            };
        }
        descended.push(concrete);
        current = child;
    }

    if !current.is_array() && !current.is_object() {
        if create_missing {
            return Err(PointerError::InvalidTarget);
        }
        return Ok(None);
    }

    Ok(Some(PointerTarget {
        target: current,
        segment: Some(last.as_ref().to_string()),
        parents: descended,
        created,
    }))
}

fn descend<'a>(
    current: &'a mut Value,
    segment: &str,
    next: &str,
    create_missing: bool,
) -> Result<Option<(&'a mut Value, String, Slot)>, PointerError> {
    let (slot, concrete, fresh) = match current {
        Value::Array(arr) => {
            let idx = array_index(segment, arr.len())
                .ok_or_else(|| PointerError::InvalidIndex(segment.to_string()))?;
            if idx >= arr.len() {
                if !create_missing {
                    return Ok(None);
                }
                arr.push(Value::Null);
                let end = arr.len() - 1;
                (&mut arr[end], end.to_string(), true)
            } else {
                (&mut arr[idx], idx.to_string(), false)
            }
        }
        Value::Object(map) => {
            let fresh = !map.contains_key(segment);
            if fresh && !create_missing {
                return Ok(None);
            }
            let slot = map.entry(segment.to_string()).or_insert(Value::Null);
            (slot, segment.to_string(), fresh)
        }
        _ if create_missing => return Err(PointerError::InvalidTarget),
        _ => return Ok(None),
    };

    if slot.is_array() || slot.is_object() {
        return Ok(Some((slot, concrete, Slot::Existing)));
    }
    if !create_missing {
        return Ok(None);
    }
    let previous = std::mem::replace(slot, empty_container(next));
    let filled = if fresh {
        Slot::Fresh
    } else {
        Slot::Overwritten(previous)
    };
    Ok(Some((slot, concrete, filled)))
}

fn empty_container(next: &str) -> Value {
    if is_integer(next) || next == "-" {
        Value::Array(Vec::new())
    } else {
        Value::Object(Map::new())
    }
}
