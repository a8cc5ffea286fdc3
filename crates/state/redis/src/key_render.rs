use dropshare_core::SessionKey;

/// Render the hash key holding a session.
///
/// The format is `prefix:session:kind:code`.
pub fn render_session_key(prefix: &str, key: &SessionKey) -> String {
    format!("{}{}", session_key_prefix(prefix), key.canonical())
}

/// Everything in a session key before `kind:code`.
pub fn session_key_prefix(prefix: &str) -> String {
    format!("{prefix}:session:")
}

/// Render the sorted-set key of the expiry index.
pub fn render_index_key(prefix: &str) -> String {
    format!("{prefix}:expiry_index")
}

#[cfg(test)]
mod tests {
    use dropshare_core::{ShareCode, ShareKind};

    use super::*;

    #[test]
    fn renders_session_key() {
        let key = SessionKey::new(ShareKind::Text, ShareCode::new("x7q2p9"));
        assert_eq!(render_session_key("dropshare", &key), "dropshare:session:text:x7q2p9");
    }

    #[test]
    fn renders_all_kinds() {
        let kinds = [
            (ShareKind::Text, "text"),
            (ShareKind::Link, "link"),
            (ShareKind::File, "file"),
        ];
        for (kind, segment) in kinds {
            let key = SessionKey::new(kind, ShareCode::new("abc"));
            assert_eq!(render_session_key("p", &key), format!("p:session:{segment}:abc"));
        }
    }

    #[test]
    fn prefix_and_member_compose_the_key() {
        let key = SessionKey::new(ShareKind::File, ShareCode::new("abc"));
        assert_eq!(
            format!("{}{}", session_key_prefix("p"), key.canonical()),
            render_session_key("p", &key)
        );
        assert_eq!(render_index_key("p"), "p:expiry_index");
    }
}
