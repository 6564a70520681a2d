use std::collections::HashSet;

use tracing::debug;

use crate::page::page_model::{HostElement, NodeId};
use crate::page::surface::InspectionSurface;

/// Ids and attributes that commonly mark an application mount point.
const ROOT_ATTRIBUTE: &str = "data-reactroot";
const ROOT_IDS: [&str; 2] = ["root", "app"];

/// All root fibers reachable from the page, hook registry first.
///
/// Never fails: renderers that throw are skipped, and a page with nothing
/// resolvable yields no roots.
pub fn discover_roots<S: InspectionSurface + ?Sized>(surface: &S) -> Vec<NodeId> {
    let roots = roots_via_hook(surface);
    if !roots.is_empty() {
        return roots;
    }
    roots_via_containers(surface)
}

pub fn roots_via_hook<S: InspectionSurface + ?Sized>(surface: &S) -> Vec<NodeId> {
    let mut out = Vec::new();
    for renderer in surface.renderer_ids() {
        match surface.fiber_roots(renderer) {
            // A root missing from the graph is not obtainable; read errors
            // are left for the walk to report.
            Ok(roots) => out.extend(
                roots
                    .into_iter()
                    .filter(|id| !matches!(surface.node(*id), Ok(None))),
            ),
            Err(e) => debug!(renderer, error = %e, "fiber root query failed"),
        }
    }
    dedup(out)
}

pub fn roots_via_containers<S: InspectionSurface + ?Sized>(surface: &S) -> Vec<NodeId> {
    let containers: Vec<&HostElement> = surface
        .host_containers()
        .iter()
        .filter(|el| is_root_container(el))
        .collect();

    if containers.is_empty() {
        return vec![];
    }

    let mut out = Vec::new();
    for renderer in surface.renderer_ids() {
        for el in &containers {
            let Some(key) = el.lookup_key() else {
                continue;
            };
            match surface.find_fiber_by_host(renderer, key) {
                Ok(Some(fiber)) => out.push(climb_to_top(surface, fiber)),
                Ok(None) => {}
                Err(e) => debug!(renderer, host = key, error = %e, "host lookup failed"),
            }
        }
    }
    dedup(out)
}

pub fn is_root_container(el: &HostElement) -> bool {
    if el.attributes.contains_key(ROOT_ATTRIBUTE) {
        return true;
    }
    let Some(id) = el.id.as_deref() else {
        return false;
    };
    ROOT_IDS.iter().any(|pattern| id == *pattern || id.contains(pattern))
}

/// Follow `return` links up to the topmost ancestor.
fn climb_to_top<S: InspectionSurface + ?Sized>(surface: &S, start: NodeId) -> NodeId {
    let mut seen = HashSet::from([start]);
    let mut current = start;

    while let Ok(Some(node)) = surface.node(current) {
        match node.parent {
            Some(parent) if seen.insert(parent) && matches!(surface.node(parent), Ok(Some(_))) => {
                current = parent
            }
            _ => break,
        }
    }
    current
}

fn dedup(ids: Vec<NodeId>) -> Vec<NodeId> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}
