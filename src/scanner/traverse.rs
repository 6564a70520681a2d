use std::collections::{HashSet, VecDeque};

use tracing::warn;

use crate::error::InspectorError;
use crate::page::page_model::{FiberNode, NodeId};
use crate::page::surface::InspectionSurface;

pub const DEFAULT_MAX_VISITED: usize = 50_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TraversalStats {
    pub visited: usize,
    pub truncated: bool,
}

/// Breadth-first walk over `child` then `sibling` edges of every root.
///
/// One visited set spans all roots, so shared subtrees are reported once and
/// cycles terminate. Dangling edges are skipped. The walk stops after
/// `max_visited` nodes.
pub fn walk<S, F>(
    surface: &S,
    roots: &[NodeId],
    max_visited: usize,
    mut visit: F,
) -> Result<TraversalStats, InspectorError>
where
    S: InspectionSurface + ?Sized,
    F: FnMut(&FiberNode) -> Result<(), InspectorError>,
{
    let mut seen: HashSet<NodeId> = HashSet::new();
    let mut stats = TraversalStats::default();

    for root in roots {
        let mut queue = VecDeque::from([*root]);

        while let Some(id) = queue.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            let Some(node) = surface.node(id)? else {
                continue;
            };

            if stats.visited >= max_visited {
                warn!(max_visited, "traversal ceiling reached, walk truncated");
                stats.truncated = true;
                return Ok(stats);
            }
            stats.visited += 1;

            visit(node)?;

            if let Some(child) = node.child {
                queue.push_back(child);
            }
            if let Some(sibling) = node.sibling {
                queue.push_back(sibling);
            }
        }
    }

    Ok(stats)
}
