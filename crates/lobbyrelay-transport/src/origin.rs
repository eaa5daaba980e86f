//! Origin allow-list for the WebSocket handshake.

/// Which browser origins may open a connection.
///
/// Browsers always send an `Origin` header on WebSocket upgrades, so the
/// list is what keeps arbitrary pages from talking to the relay. Native
/// clients usually omit the header; they are only let in under
/// [`OriginPolicy::Any`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OriginPolicy {
    /// Accept every handshake.
    #[default]
    Any,
    /// Accept only handshakes whose `Origin` matches one of these exactly.
    List(Vec<String>),
}

impl OriginPolicy {
    /// Builds a policy from configured origin strings.
    ///
    /// A single `*` entry (or an empty list) yields [`OriginPolicy::Any`].
    pub fn from_origins<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let list: Vec<String> = origins
            .into_iter()
            .map(|o| normalize(o.as_ref()).to_string())
            .filter(|o| !o.is_empty())
            .collect();

        if list.is_empty() || list.iter().any(|o| o == "*") {
            Self::Any
        } else {
            Self::List(list)
        }
    }

    /// Returns `true` if a handshake carrying `origin` may proceed.
    pub fn allows(&self, origin: Option<&str>) -> bool {
        match self {
            Self::Any => true,
            Self::List(list) => match origin {
                Some(origin) => {
                    let origin = normalize(origin);
                    list.iter().any(|allowed| allowed == origin)
                }
                None => false,
            },
        }
    }

    /// The explicit allow-list, or `None` when every origin is accepted.
    pub fn origins(&self) -> Option<&[String]> {
        match self {
            Self::Any => None,
            Self::List(list) => Some(list),
        }
    }
}

fn normalize(origin: &str) -> &str {
    origin.trim().trim_end_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_means_any() {
        assert_eq!(OriginPolicy::from_origins(["*"]), OriginPolicy::Any);
        assert_eq!(
            OriginPolicy::from_origins(Vec::<String>::new()),
            OriginPolicy::Any
        );
    }

    #[test]
    fn test_list_matches_exactly_ignoring_trailing_slash() {
        let policy = OriginPolicy::from_origins([
            "http://localhost:3000/",
            " https://game.example.com ",
        ]);
        assert!(policy.allows(Some("http://localhost:3000")));
        assert!(policy.allows(Some("https://game.example.com/")));
        assert!(!policy.allows(Some("http://localhost:3001")));
        assert!(!policy.allows(Some("https://evil.example.com")));
    }

    #[test]
    fn test_missing_origin_only_allowed_under_any() {
        assert!(OriginPolicy::Any.allows(None));
        let policy = OriginPolicy::from_origins(["http://localhost:3000"]);
        assert!(!policy.allows(None));
    }

    #[test]
    fn test_origins_accessor() {
        assert!(OriginPolicy::Any.origins().is_none());
        let policy = OriginPolicy::from_origins(["http://a.test"]);
        assert_eq!(policy.origins(), Some(&["http://a.test".to_string()][..]));
    }
}
