//! Request path sanitation.

use url::form_urlencoded;

/// Joins raw path segments into a request path.
///
/// Each segment is prefixed with `/` and percent-encoded with
/// query-parameter escaping rules, so characters unsafe in a URL path,
/// including a literal `/` inside a segment, are escaped. An empty segment
/// list yields an empty string.
pub fn clean_path<I, S>(segments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut cleaned = String::new();
    for segment in segments {
        cleaned.push('/');
        cleaned.extend(form_urlencoded::byte_serialize(segment.as_ref().as_bytes()));
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_empty_path() {
        let path = clean_path(Vec::<&str>::new());
        assert_eq!(path, "");
    }

    #[test]
    fn segments_are_joined_with_leading_slashes() {
        assert_eq!(clean_path(["db", "docid"]), "/db/docid");
        assert_eq!(clean_path(["_all_dbs"]), "/_all_dbs");
    }

    #[test]
    fn unsafe_characters_are_escaped() {
        assert_eq!(clean_path(["my db"]), "/my+db");
        assert_eq!(clean_path(["a/b"]), "/a%2Fb");
        assert_eq!(clean_path(["q?x=1&y=2"]), "/q%3Fx%3D1%26y%3D2");
    }

    #[test]
    fn escaped_segments_round_trip() {
        let segments = ["data base", "doc/with/slashes", "100%"];
        let path = clean_path(segments);

        let decoded: Vec<String> = path
            .split('/')
            .skip(1)
            .map(|seg| {
                form_urlencoded::parse(format!("k={}", seg).as_bytes())
                    .next()
                    .unwrap()
                    .1
                    .into_owned()
            })
            .collect();
        assert_eq!(decoded, segments);
    }
}
