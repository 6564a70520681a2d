use crate::error::SurfaceError;
use crate::page::page_model::{FiberNode, HostElement, NodeId, Page, RendererId};

/// Read-only view of whatever introspection the host framework exposes.
///
/// The scanner only ever talks to the page through this trait, so a
/// different framework (or a test double) can stand in for the devtools hook.
pub trait InspectionSurface {
    fn renderer_ids(&self) -> Vec<RendererId>;

    /// Current fiber of every root mounted by `renderer`.
    fn fiber_roots(&self, renderer: RendererId) -> Result<Vec<NodeId>, SurfaceError>;

    /// Host elements that may contain an application root.
    fn host_containers(&self) -> &[HostElement];

    /// `Ok(None)` when the renderer has no host lookup or the host is unknown.
    fn find_fiber_by_host(
        &self,
        renderer: RendererId,
        host_key: &str,
    ) -> Result<Option<NodeId>, SurfaceError>;

    fn node(&self, id: NodeId) -> Result<Option<&FiberNode>, SurfaceError>;
}

impl InspectionSurface for Page {
    fn renderer_ids(&self) -> Vec<RendererId> {
        self.hook
            .as_ref()
            .map(|h| h.renderers.keys().copied().collect())
            .unwrap_or_default()
    }

    fn fiber_roots(&self, renderer: RendererId) -> Result<Vec<NodeId>, SurfaceError> {
        let Some(r) = self.hook.as_ref().and_then(|h| h.renderers.get(&renderer)) else {
            return Ok(vec![]);
        };
        if r.throws_on_root_query {
            return Err(SurfaceError::RootQuery(
                renderer,
                "getFiberRoots threw".into(),
            ));
        }
        Ok(r.roots.clone())
    }

    fn host_containers(&self) -> &[HostElement] {
        &self.containers
    }

    fn find_fiber_by_host(
        &self,
        renderer: RendererId,
        host_key: &str,
    ) -> Result<Option<NodeId>, SurfaceError> {
        let Some(r) = self.hook.as_ref().and_then(|h| h.renderers.get(&renderer)) else {
            return Ok(None);
        };
        if r.no_host_lookup {
            return Ok(None);
        }
        Ok(r.host_instances.get(host_key).copied())
    }

    fn node(&self, id: NodeId) -> Result<Option<&FiberNode>, SurfaceError> {
        Ok(self.hook.as_ref().and_then(|h| h.nodes.get(id)))
    }
}
