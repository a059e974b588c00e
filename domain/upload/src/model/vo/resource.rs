use std::collections::BTreeMap;
use std::fmt;

/// Placeholder for the part number in a server issued part upload url.
pub const PART_NUMBER_PLACEHOLDER: &str = "*";

/// Values substituted into `{key}` placeholders of a url template.
pub type Substitutions = BTreeMap<String, String>;

/// Build [`Substitutions`] from borrowed pairs.
pub fn substitutions<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Substitutions {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Remote operations a provider resolves urls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    CreateFile,
    GetFile,
    GetUpload,
    AssembleFile,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::CreateFile => "createFile",
            Action::GetFile => "getFile",
            Action::GetUpload => "getUpload",
            Action::AssembleFile => "assembleFile",
        })
    }
}

/// What a creation call tells us about the new remote resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedResource {
    /// Id used for assembling and polling.
    pub internal_id: String,
    /// Upload url; for multipart uploads it contains [`PART_NUMBER_PLACEHOLDER`].
    pub upload_url: String,
    /// Id handed back to the caller.
    pub external_id: String,
}

impl CreatedResource {
    pub fn part_url(&self, part_number: u64) -> String {
        self.upload_url
            .replace(PART_NUMBER_PLACEHOLDER, &part_number.to_string())
    }
}

/// State of a remote resource while it is processed after upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Pending,
    Available,
    /// Terminal failure, carries the status the provider reported.
    Failed(String),
}
