use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::InspectorError;

/// Identity of one fiber in the framework's render tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub type RendererId = u32;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextInfo {
    #[serde(default, rename = "displayName")]
    pub display_name: Option<String>,
    #[serde(default, rename = "_displayName")]
    pub legacy_display_name: Option<String>,
}

impl ContextInfo {
    pub fn name(&self) -> Option<&str> {
        self.display_name
            .as_deref()
            .or(self.legacy_display_name.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeType {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "_context")]
    pub context: Option<ContextInfo>,
}

/// One unit of the framework's render tree as seen through the devtools hook.
///
/// Edges are plain ids and may point at nodes that no longer exist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FiberNode {
    pub id: NodeId,
    #[serde(default, rename = "type")]
    pub node_type: Option<NodeType>,
    #[serde(default)]
    pub props: Option<Value>,
    #[serde(default)]
    pub child: Option<NodeId>,
    #[serde(default)]
    pub sibling: Option<NodeId>,
    #[serde(default, rename = "return")]
    pub parent: Option<NodeId>,
}

impl FiberNode {
    /// The "current value" payload carried by the node, if any.
    pub fn payload(&self) -> Option<&Value> {
        self.props.as_ref().and_then(|p| p.get("value"))
    }

    pub fn type_name(&self) -> Option<&str> {
        self.node_type.as_ref().and_then(|t| t.name.as_deref())
    }

    pub fn context_name(&self) -> Option<&str> {
        self.node_type
            .as_ref()
            .and_then(|t| t.context.as_ref())
            .and_then(|c| c.name())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FiberGraph {
    nodes: HashMap<NodeId, FiberNode>,
}

impl FiberGraph {
    pub fn get(&self, id: NodeId) -> Option<&FiberNode> {
        self.nodes.get(&id)
    }

    pub fn insert(&mut self, node: FiberNode) {
        self.nodes.insert(node.id, node);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl From<Vec<FiberNode>> for FiberGraph {
    fn from(nodes: Vec<FiberNode>) -> Self {
        Self {
            nodes: nodes.into_iter().map(|n| (n.id, n)).collect(),
        }
    }
}

impl<'de> Deserialize<'de> for FiberGraph {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<FiberNode>::deserialize(deserializer).map(FiberGraph::from)
    }
}

impl Serialize for FiberGraph {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut nodes: Vec<&FiberNode> = self.nodes.values().collect();
        nodes.sort_by_key(|n| n.id);
        nodes.serialize(serializer)
    }
}

/// One renderer registered with the devtools hook.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Renderer {
    /// Current fiber of every mounted root.
    #[serde(default)]
    pub roots: Vec<NodeId>,

    /// Host element key → fiber, backing `findFiberByHostInstance`.
    #[serde(default, rename = "hostInstances")]
    pub host_instances: BTreeMap<String, NodeId>,

    /// Renderer throws when asked for its roots.
    #[serde(default, rename = "throwsOnRootQuery")]
    pub throws_on_root_query: bool,

    /// Renderer does not implement host lookup.
    #[serde(default, rename = "noHostLookup")]
    pub no_host_lookup: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommitInfo {
    pub renderer: RendererId,
    pub root: Option<NodeId>,
}

/// Error reported by a commit callback the framework registered.
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackError(pub String);

impl fmt::Display for CallbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub type CommitCallback = Box<dyn FnMut(&CommitInfo) -> Result<(), CallbackError> + Send>;

/// The framework's exposed introspection registry.
#[derive(Default, Deserialize)]
pub struct DevtoolsHook {
    #[serde(default)]
    pub renderers: BTreeMap<RendererId, Renderer>,
    #[serde(default)]
    pub nodes: FiberGraph,
    #[serde(skip)]
    pub on_commit: Option<CommitCallback>,
}

impl fmt::Debug for DevtoolsHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DevtoolsHook")
            .field("renderers", &self.renderers)
            .field("nodes", &self.nodes.len())
            .field("on_commit", &self.on_commit.is_some())
            .finish()
    }
}

impl DevtoolsHook {
    /// Invoke whatever callback currently occupies the commit slot.
    pub fn dispatch_commit(&mut self, info: &CommitInfo) -> Result<(), CallbackError> {
        match self.on_commit.as_mut() {
            Some(callback) => callback(info),
            None => Ok(()),
        }
    }
}

/// A host DOM element that may contain an application root.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostElement {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Host key of the first child element.
    #[serde(default, rename = "firstChild")]
    pub first_child: Option<String>,
}

impl HostElement {
    /// Key used for host → fiber resolution: first child element, else the element.
    pub fn lookup_key(&self) -> Option<&str> {
        self.first_child.as_deref().or(self.id.as_deref())
    }
}

/// The observed page's execution context.
#[derive(Debug, Default, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub hook: Option<DevtoolsHook>,
    #[serde(default)]
    pub containers: Vec<HostElement>,
    #[serde(skip)]
    injected: bool,
}

impl Page {
    pub fn new(hook: Option<DevtoolsHook>, containers: Vec<HostElement>) -> Self {
        Self {
            hook,
            containers,
            injected: false,
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, InspectorError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Claim the page for one inspector instance.
    pub fn mark_injected(&mut self) -> Result<(), InspectorError> {
        if self.injected {
            return Err(InspectorError::AlreadyInjected);
        }
        self.injected = true;
        Ok(())
    }

    pub fn is_injected(&self) -> bool {
        self.injected
    }

    /// Replace the render tree and let the framework announce the commit.
    pub fn commit(&mut self, nodes: FiberGraph) -> Result<(), CallbackError> {
        let Some(hook) = self.hook.as_mut() else {
            return Ok(());
        };
        hook.nodes = nodes;

        let mut result = Ok(());
        let renderers: Vec<(RendererId, Option<NodeId>)> = hook
            .renderers
            .iter()
            .map(|(id, r)| (*id, r.roots.first().copied()))
            .collect();

        for (renderer, root) in renderers {
            if let Err(e) = hook.dispatch_commit(&CommitInfo { renderer, root }) {
                result = Err(e);
            }
        }
        result
    }
}
