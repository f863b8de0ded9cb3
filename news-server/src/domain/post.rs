use serde::{Deserialize, Serialize};

/// Wire representation of a post. Keys keep their `PascalCase` names, and any
/// key missing from a request decodes to its zero value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub(crate) struct Post {
    pub(crate) id: i64,
    pub(crate) author: Author,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) created_at: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub(crate) struct Author {
    /// `0` means the author does not exist yet and the backend has to create it.
    pub(crate) id: i64,
    pub(crate) name: String,
}

impl Author {
    pub(crate) fn is_unassigned(&self) -> bool {
        self.id == 0
    }
}

#[cfg(test)]
mod tests {
    use super::{Author, Post};

    #[test]
    fn post_serializes_with_wire_field_names() {
        let post = Post {
            id: 7,
            author: Author {
                id: 3,
                name: "Jane".to_string(),
            },
            title: "title".to_string(),
            content: "content".to_string(),
            created_at: 1_652_431_685,
        };

        let json = serde_json::to_string(&post).expect("post must serialize");
        assert_eq!(
            json,
            r#"{"Id":7,"Author":{"Id":3,"Name":"Jane"},"Title":"title","Content":"content","CreatedAt":1652431685}"#
        );
    }

    #[test]
    fn missing_fields_decode_to_zero_values() {
        let post: Post =
            serde_json::from_str(r#"{"Id":99,"Title":"only title"}"#).expect("must decode");

        assert_eq!(post.id, 99);
        assert_eq!(post.title, "only title");
        assert_eq!(post.content, "");
        assert_eq!(post.created_at, 0);
        assert!(post.author.is_unassigned());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let post: Post = serde_json::from_str(r#"{"Id":1,"Extra":true}"#).expect("must decode");
        assert_eq!(post, Post { id: 1, ..Post::default() });
    }
}
