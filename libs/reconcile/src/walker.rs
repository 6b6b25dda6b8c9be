//! Bounded recursive walk over a Heat stack's resource tree.
//!
//! Magnum clusters materialize as a root stack whose resource groups are
//! nested stacks several levels deep. The walker inventories that tree
//! client-side: list the root's resources, then recurse into every child
//! that carries a physical identifier, down to a caller-set depth.

use std::collections::BTreeMap;

use coe_openstack::{Error, StackResource};
use futures_util::future::BoxFuture;
use serde_json::Value;
use tracing::debug;

use crate::api::ResourceLister;

/// Exact-match conjunction over a resource's serialized fields.
///
/// Every named field must equal its expected value for a resource to
/// pass; an empty filter passes everything. A resource lacking a named
/// field never passes.
#[derive(Debug, Clone, Default)]
pub struct ResourceFilter {
    fields: BTreeMap<String, Value>,
}

impl ResourceFilter {
    /// Empty filter; matches every resource.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field` to equal `value`.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Evaluate the conjunction against one resource.
    pub fn matches(&self, resource: &StackResource) -> bool {
        if self.fields.is_empty() {
            return true;
        }
        let Ok(Value::Object(fields)) = serde_json::to_value(resource) else {
            return false;
        };
        self.fields
            .iter()
            .all(|(field, expected)| fields.get(field) == Some(expected))
    }
}

impl FromIterator<(String, Value)> for ResourceFilter {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Inventory the resource tree beneath `root`.
///
/// Depth-first, parent before children, siblings in listing order.
/// `max_depth` bounds recursion below the root's immediate resources:
/// depth 0 lists only those; each increment descends one more level of
/// nested stacks. Children of filtered-out resources are still visited,
/// so a filter narrows the report without pruning the search.
///
/// A branch whose listing returns not-found is treated as empty: walking
/// races deletion in stacks under active reconciliation, and a vanished
/// nested stack is not an error.
pub async fn walk<L: ResourceLister>(
    lister: &L,
    root: &str,
    max_depth: u32,
    filter: &ResourceFilter,
) -> Result<Vec<StackResource>, Error> {
    let mut matched = Vec::new();
    collect(lister, root.to_string(), 0, max_depth, filter, &mut matched).await?;
    debug!(root = %root, max_depth, matched = matched.len(), "stack walk finished");
    Ok(matched)
}

/// Append `stack`'s resources, and recursively their children, to `out`.
///
/// Boxed because async recursion needs an indirection; the recursion is
/// bounded by `max_depth`, so cyclic physical identifiers cannot hang the
/// walk.
fn collect<'a, L: ResourceLister>(
    lister: &'a L,
    stack: String,
    depth: u32,
    max_depth: u32,
    filter: &'a ResourceFilter,
    out: &'a mut Vec<StackResource>,
) -> BoxFuture<'a, Result<(), Error>> {
    Box::pin(async move {
        if depth > max_depth {
            return Ok(());
        }
        let children = match lister.list_children(&stack).await {
            Ok(children) => children,
            Err(err) if err.is_not_found() => {
                debug!(stack = %stack, depth, "branch vanished during walk; skipping");
                return Ok(());
            }
            Err(err) => return Err(err),
        };
        for child in children {
            let physical = child.physical_resource_id.clone();
            if filter.matches(&child) {
                out.push(child);
            }
            if let Some(physical) = physical {
                if !physical.is_empty() {
                    collect(lister, physical, depth + 1, max_depth, filter, out).await?;
                }
            }
        }
        Ok(())
    })
}
