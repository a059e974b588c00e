use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::exception::UploadResult;

/// Key spelling a provider expects in manifest entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagStyle {
    /// `{"etag": .., "part_number": ..}`
    SnakeCase,
    /// `{"etag": .., "partNumber": ..}`
    CamelCase,
}

impl TagStyle {
    fn part_key(self) -> &'static str {
        match self {
            TagStyle::SnakeCase => "part_number",
            TagStyle::CamelCase => "partNumber",
        }
    }
}

/// One manifest entry: the entity tag of an uploaded part and its 1-based number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyTag {
    pub etag: String,
    pub part_number: u64,
    pub style: TagStyle,
}

impl Serialize for AssemblyTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("etag", &self.etag)?;
        map.serialize_entry(self.style.part_key(), &self.part_number)?;
        map.end()
    }
}

/// Result of uploading one part, sent from a worker to the aggregator.
#[derive(Debug)]
pub struct PartOutcome {
    pub part_number: u64,
    pub result: UploadResult<AssemblyTag>,
}

/// Tags of the uploaded parts in arrival order.
///
/// Entries carry their own part number, so the order doesn't matter to assembly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AssemblyManifest {
    tags: Vec<AssemblyTag>,
}

impl AssemblyManifest {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tags: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, tag: AssemblyTag) {
        self.tags.push(tag);
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn tags(&self) -> &[AssemblyTag] {
        &self.tags
    }
}
