//! Image package policy
//!
//! Registers an image archive that was already copied to the appliance.
//! Packages cannot be updated; presence of the name is enough.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use nfvis_common::{ResourceKind, Result};

use super::{require_non_empty, MergePolicy};

/// Upload directory used when none is given
pub const DEFAULT_UPLOAD_DIR: &str = "/data/intdatastore/uploads";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageSpec {
    pub name: String,

    /// Directory on the appliance holding `{name}.tar.gz`
    #[serde(default = "default_dest")]
    pub dest: String,
}

fn default_dest() -> String {
    DEFAULT_UPLOAD_DIR.to_string()
}

impl PackageSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dest: default_dest(),
        }
    }

    /// Location of the archive as the appliance sees it
    pub fn source(&self) -> String {
        format!("file://{}/{}.tar.gz", self.dest.trim_end_matches('/'), self.name)
    }
}

pub struct PackagePolicy;

impl MergePolicy for PackagePolicy {
    type Spec = PackageSpec;

    const KIND: ResourceKind = ResourceKind::ImagePackage;

    fn key(spec: &PackageSpec) -> String {
        spec.name.clone()
    }

    fn validate(spec: &PackageSpec) -> Result<()> {
        require_non_empty("name", &spec.name)?;
        require_non_empty("dest", &spec.dest)
    }

    fn build(spec: &PackageSpec) -> Result<Map<String, Value>> {
        let mut doc = Map::new();
        doc.insert("name".into(), json!(spec.name));
        doc.insert("src".into(), json!(spec.source()));
        Ok(doc)
    }
}
