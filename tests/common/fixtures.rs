#![allow(dead_code)]

use form_inspector::page::page_model::{
    DevtoolsHook, FiberGraph, FiberNode, HostElement, Page, Renderer,
};
use serde_json::{Value, json};

pub fn node(raw: Value) -> FiberNode {
    serde_json::from_value(raw).expect("valid fiber node")
}

/// A complete Formik bag: matches by shape alone.
pub fn bag(values: Value) -> Value {
    json!({
        "values": values,
        "errors": {},
        "touched": {},
        "isSubmitting": false,
        "handleSubmit": "[Function: handleSubmit]",
        "handleChange": "[Function: handleChange]",
    })
}

/// Anonymous provider node carrying `value`.
pub fn provider(id: u64, value: Value, child: Option<u64>, sibling: Option<u64>) -> FiberNode {
    node(json!({
        "id": id,
        "type": { "name": "Provider" },
        "props": { "value": value },
        "child": child,
        "sibling": sibling,
    }))
}

pub fn plain(id: u64, child: Option<u64>, sibling: Option<u64>) -> FiberNode {
    node(json!({ "id": id, "type": { "name": "div" }, "child": child, "sibling": sibling }))
}

pub fn graph(nodes: Vec<FiberNode>) -> FiberGraph {
    FiberGraph::from(nodes)
}

/// Page with one renderer whose single root is `root`.
pub fn page(nodes: Vec<FiberNode>, root: u64) -> Page {
    let mut hook = DevtoolsHook::default();
    hook.nodes = graph(nodes);
    hook.renderers.insert(
        1,
        Renderer {
            roots: vec![form_inspector::page::page_model::NodeId(root)],
            ..Renderer::default()
        },
    );
    Page::new(Some(hook), vec![])
}

/// Root 1 → child 2 (form a) → sibling 3 (form b).
pub fn two_form_page(a: Value, b: Value) -> Page {
    page(
        vec![
            plain(1, Some(2), None),
            provider(2, bag(a), None, Some(3)),
            provider(3, bag(b), None, None),
        ],
        1,
    )
}

pub fn container(id: &str, first_child: Option<&str>) -> HostElement {
    HostElement {
        id: Some(id.to_string()),
        first_child: first_child.map(str::to_string),
        ..HostElement::default()
    }
}
