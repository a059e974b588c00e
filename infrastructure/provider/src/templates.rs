use std::collections::BTreeMap;

use domain_upload::{
    exception::{UploadException, UploadResult},
    model::vo::{Action, Substitutions},
};

/// Path templates of one provider, resolved against its base url.
///
/// Placeholders are written `{key}` and must all be substituted.
#[derive(Debug, Clone)]
pub struct UrlTemplates {
    base_url: String,
    paths: BTreeMap<Action, &'static str>,
}

impl UrlTemplates {
    pub fn new(
        base_url: impl Into<String>,
        paths: impl IntoIterator<Item = (Action, &'static str)>,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            paths: paths.into_iter().collect(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn resolve(&self, action: Action, substitutions: &Substitutions) -> UploadResult<String> {
        let path = self
            .paths
            .get(&action)
            .ok_or_else(|| UploadException::UrlNotResolved {
                action,
                reason: "no url is known for this action".to_string(),
            })?;
        let mut url = format!("{}{path}", self.base_url);
        for (key, value) in substitutions {
            url = url.replace(&format!("{{{key}}}"), value);
        }
        if let Some(start) = url.find('{') {
            let rest = &url[start + 1..];
            let name = rest.split('}').next().unwrap_or(rest);
            return Err(UploadException::UrlNotResolved {
                action,
                reason: format!("no value for placeholder `{name}`"),
            });
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use domain_upload::model::vo::substitutions;

    use super::*;

    fn templates() -> UrlTemplates {
        UrlTemplates::new(
            "https://store.local/api/",
            [
                (Action::CreateFile, "/spaces/{spaceId}/uploads?complete=True"),
                (Action::GetFile, "/spaces/{spaceId}/files/{fileId}"),
            ],
        )
    }

    #[test]
    fn substitutes_placeholders() {
        let url = templates()
            .resolve(
                Action::GetFile,
                &substitutions([("spaceId", "s1"), ("fileId", "f1"), ("unused", "x")]),
            )
            .unwrap();
        assert_eq!(url, "https://store.local/api/spaces/s1/files/f1");
    }

    #[test]
    fn keeps_query_of_the_template() {
        let url = templates()
            .resolve(Action::CreateFile, &substitutions([("spaceId", "s1")]))
            .unwrap();
        assert_eq!(url, "https://store.local/api/spaces/s1/uploads?complete=True");
    }

    #[test]
    fn unknown_action_is_not_resolved() {
        let err = templates()
            .resolve(Action::AssembleFile, &Substitutions::new())
            .unwrap_err();
        assert!(matches!(
            err,
            UploadException::UrlNotResolved { action: Action::AssembleFile, .. }
        ));
    }

    #[test]
    fn leftover_placeholder_is_not_resolved() {
        let err = templates()
            .resolve(Action::GetFile, &substitutions([("spaceId", "s1")]))
            .unwrap_err();
        assert!(
            matches!(err, UploadException::UrlNotResolved { ref reason, .. } if reason.contains("fileId"))
        );
    }
}
