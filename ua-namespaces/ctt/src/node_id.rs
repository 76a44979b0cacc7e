//! String node ids of the CTT subtree.
//!
//! Every id is a path rooted at `/<root>`; scalars live under
//! `/<root>/Static/AllProfiles/Scalar`, methods under `/<root>/Methods`.
use opcua::types::NodeId;

/// Keep `[A-Za-z0-9._-]`, replace everything else with `-`.
pub fn sanitize_nodeid_component(input: &str) -> String {
    input
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
                ch
            } else {
                '-'
            }
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct CttNodeIds {
    namespace_index: u16,
    root: String,
}

impl CttNodeIds {
    /// `root_name` is sanitized; the browse name of the root folder keeps
    /// it verbatim.
    pub fn new(namespace_index: u16, root_name: &str) -> Self {
        Self {
            namespace_index,
            root: format!("/{}", sanitize_nodeid_component(root_name)),
        }
    }

    fn node_id(&self, path: String) -> NodeId {
        NodeId::new(self.namespace_index, path)
    }

    pub fn root_folder(&self) -> NodeId {
        self.node_id(self.root.clone())
    }

    pub fn scalar(&self, name: &str) -> NodeId {
        self.node_id(format!("{}/Static/AllProfiles/Scalar/{name}", self.root))
    }

    pub fn methods_folder(&self) -> NodeId {
        self.node_id(format!("{}/Methods", self.root))
    }

    pub fn method(&self, name: &str) -> NodeId {
        self.node_id(format!("{}/Methods/{name}", self.root))
    }

    /// Property below a method, e.g. `InputArguments`.
    pub fn method_property(&self, method: &str, property: &str) -> NodeId {
        self.node_id(format!("{}/Methods/{method}/{property}", self.root))
    }
}
