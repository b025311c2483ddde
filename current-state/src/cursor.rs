use serde::Deserialize;
use std::str::FromStr;
use url::Url;

/// Opaque `start` token of a Code Engine list call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor(pub String);

impl Cursor {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Parses the `start` query parameter out of a `next.href` link.
impl FromStr for Cursor {
    type Err = CursorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(s)?;
        url.query_pairs()
            .find(|(key, _)| key == "start")
            .map(|(_, value)| Cursor(value.into_owned()))
            .filter(|cursor| !cursor.0.is_empty())
            .ok_or(CursorError::MissingStart)
    }
}

/// The `next` link of a list response. Its presence means more pages
/// are available.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone)]
pub struct NextLink {
    pub href: Option<String>,
    pub start: Option<String>,
}

impl NextLink {
    /// The explicit `start` token wins; otherwise it is taken from `href`.
    pub fn cursor(&self) -> Result<Cursor, CursorError> {
        match (&self.start, &self.href) {
            (Some(start), _) if !start.is_empty() => Ok(Cursor(start.clone())),
            (_, Some(href)) => href.parse(),
            _ => Err(CursorError::MissingStart),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CursorError {
    #[error("Invalid next link: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("next link carries no start token")]
    MissingStart,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_parse() {
        let cursor: Cursor =
            "https://api.us-south.codeengine.cloud.ibm.com/v2/projects?limit=100&start=eyJ0b2tlbiI6IjEifQ%3D%3D"
                .parse()
                .unwrap();
        assert_eq!(cursor.as_str(), "eyJ0b2tlbiI6IjEifQ==");
    }

    #[test]
    fn test_invalid_href() {
        let result: Result<Cursor, _> = "not a url".parse();
        assert!(matches!(result, Err(CursorError::InvalidUrl(_))));

        let result: Result<Cursor, _> = "https://example.com/v2/projects?limit=100".parse();
        assert_eq!(result, Err(CursorError::MissingStart));
    }

    #[test]
    fn test_next_link_prefers_start() {
        let link: NextLink = serde_json::from_value(serde_json::json!({
            "href": "https://example.com/v2/projects?start=from-href",
            "start": "explicit"
        }))
        .unwrap();
        assert_eq!(link.cursor().unwrap(), Cursor("explicit".into()));

        let link = NextLink {
            href: Some("https://example.com/v2/projects?start=from-href".into()),
            start: None,
        };
        assert_eq!(link.cursor().unwrap(), Cursor("from-href".into()));

        let link = NextLink {
            href: None,
            start: None,
        };
        assert_eq!(link.cursor(), Err(CursorError::MissingStart));
    }
}
