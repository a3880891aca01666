//! Core types for nfvis-declare
//!
//! `ResourceKind` is the single table that tells the engine where each kind
//! lives on the appliance, how its collection is shaped and which
//! operations the API offers for it.

use serde::{Deserialize, Serialize};

/// Key used for singleton kinds, which have no key field on the wire
pub const SINGLETON_KEY: &str = "settings";

/// Resource kinds managed on the appliance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Bridge,
    Network,
    Vlan,
    SystemSettings,
    Deployment,
    ImagePackage,
}

/// How a fetched document holds the instances of a kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionShape {
    /// `{wrapper: {list: [ ... ]}}`, each entry identified by `key_field`
    List {
        wrapper: &'static str,
        list: &'static str,
        key_field: &'static str,
    },
    /// `{wrapper: { ... }}`, exactly one instance
    Singleton { wrapper: &'static str },
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Bridge,
        ResourceKind::Network,
        ResourceKind::Vlan,
        ResourceKind::SystemSettings,
        ResourceKind::Deployment,
        ResourceKind::ImagePackage,
    ];

    /// Path of the collection, relative to the API root
    pub fn collection_path(&self) -> &'static str {
        match self {
            ResourceKind::Bridge => "/config/bridges",
            ResourceKind::Network => "/config/networks",
            ResourceKind::Vlan => "/running/switch/vlan",
            ResourceKind::SystemSettings => "/config/system/settings",
            ResourceKind::Deployment => "/config/vm_lifecycle/tenants/tenant/admin/deployments",
            ResourceKind::ImagePackage => "/config/vm_lifecycle/images",
        }
    }

    /// Path used to read the current collection
    pub fn fetch_path(&self) -> String {
        match self.shape() {
            CollectionShape::List { .. } => format!("{}?deep", self.collection_path()),
            CollectionShape::Singleton { .. } => self.collection_path().to_string(),
        }
    }

    /// Path a create request is POSTed to
    pub fn create_path(&self) -> &'static str {
        match self {
            // VLANs are created on the switch container, not the list itself
            ResourceKind::Vlan => "/running/switch",
            _ => self.collection_path(),
        }
    }

    /// Path addressing one instance
    pub fn instance_path(&self, key: &str) -> String {
        match self.shape() {
            CollectionShape::List { .. } => {
                format!("{}/{}/{}", self.collection_path(), self.document_root(), key)
            }
            CollectionShape::Singleton { .. } => self.collection_path().to_string(),
        }
    }

    pub fn shape(&self) -> CollectionShape {
        match self {
            ResourceKind::Bridge => CollectionShape::List {
                wrapper: "network:bridges",
                list: "bridge",
                key_field: "name",
            },
            ResourceKind::Network => CollectionShape::List {
                wrapper: "network:networks",
                list: "network",
                key_field: "name",
            },
            ResourceKind::Vlan => CollectionShape::List {
                wrapper: "collection",
                list: "switch:vlan",
                key_field: "vlan-id",
            },
            ResourceKind::SystemSettings => CollectionShape::Singleton {
                wrapper: "system:settings",
            },
            ResourceKind::Deployment => CollectionShape::List {
                wrapper: "vmlc:deployments",
                list: "deployment",
                key_field: "name",
            },
            ResourceKind::ImagePackage => CollectionShape::List {
                wrapper: "vmlc:images",
                list: "image",
                key_field: "name",
            },
        }
    }

    /// Field that identifies an instance within its collection
    pub fn key_field(&self) -> Option<&'static str> {
        match self.shape() {
            CollectionShape::List { key_field, .. } => Some(key_field),
            CollectionShape::Singleton { .. } => None,
        }
    }

    /// Name of the object that wraps create and update bodies
    pub fn document_root(&self) -> &'static str {
        match self {
            ResourceKind::Bridge => "bridge",
            ResourceKind::Network => "network",
            ResourceKind::Vlan => "vlan",
            ResourceKind::SystemSettings => "settings",
            ResourceKind::Deployment => "deployment",
            ResourceKind::ImagePackage => "image",
        }
    }

    /// Media type requested when fetching the collection
    pub fn fetch_media(&self) -> MediaType {
        match self {
            ResourceKind::Vlan => MediaType::Collection,
            _ => MediaType::Data,
        }
    }

    /// Whether the API can create a new instance of this kind
    pub fn supports_create(&self) -> bool {
        !matches!(self, ResourceKind::SystemSettings)
    }

    /// Whether the API can change an existing instance in place
    pub fn supports_update(&self) -> bool {
        matches!(
            self,
            ResourceKind::Bridge | ResourceKind::Network | ResourceKind::SystemSettings
        )
    }

    /// Whether an instance of this kind can be removed
    pub fn supports_delete(&self) -> bool {
        !matches!(self, ResourceKind::SystemSettings)
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Bridge => write!(f, "bridge"),
            ResourceKind::Network => write!(f, "network"),
            ResourceKind::Vlan => write!(f, "vlan"),
            ResourceKind::SystemSettings => write!(f, "system settings"),
            ResourceKind::Deployment => write!(f, "deployment"),
            ResourceKind::ImagePackage => write!(f, "image package"),
        }
    }
}

/// Declared state of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum State {
    Present,
    Absent,
}

impl Default for State {
    fn default() -> Self {
        Self::Present
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            State::Present => write!(f, "present"),
            State::Absent => write!(f, "absent"),
        }
    }
}

impl std::str::FromStr for State {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "present" => Ok(State::Present),
            "absent" => Ok(State::Absent),
            other => Err(format!("unknown state '{}', expected present or absent", other)),
        }
    }
}

/// HTTP methods used against the configuration API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    /// Whether the method changes remote state
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Method::Get)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// YANG media types spoken by the appliance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Data,
    Collection,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Data => "application/vnd.yang.data+json",
            MediaType::Collection => "application/vnd.yang.collection+json",
        }
    }
}

/// Result of one reconciliation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "result", content = "reason")]
pub enum Outcome {
    Created,
    Updated,
    Deleted,
    Unchanged,
    Failed(String),
}

impl Outcome {
    /// Whether remote state was (or in preview, would be) mutated
    pub fn is_change(&self) -> bool {
        matches!(self, Outcome::Created | Outcome::Updated | Outcome::Deleted)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Created => write!(f, "created"),
            Outcome::Updated => write!(f, "updated"),
            Outcome::Deleted => write!(f, "deleted"),
            Outcome::Unchanged => write!(f, "unchanged"),
            Outcome::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Everything a caller learns from one invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub kind: ResourceKind,
    pub key: String,
    pub state: State,
    pub outcome: Outcome,
    pub changed: bool,
    #[serde(default)]
    pub changed_fields: Vec<String>,
    pub method: Option<Method>,
    pub path: Option<String>,
    pub payload: Option<serde_json::Value>,
    pub status: Option<u16>,
    pub response: Option<serde_json::Value>,
    /// Remote instance as fetched, before any mutation
    pub current: Option<serde_json::Value>,
    pub preview: bool,
    pub finished_at: chrono::DateTime<chrono::Utc>,
}
