fn main() {
    println!("Run `cargo test -p airlift-wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use airlift_protocol::{PruneCount, ServerResponse};
    use airlift_upload::{Classification, UploadError, classify_json, classify_upload};

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Raw bytes of a fixture, as the server would put them on the wire.
    fn load_fixture(name: &str) -> Vec<u8> {
        let path = fixtures_dir().join(name);
        fs::read(&path).unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    /// Deserializes a fixture, re-serializes it, and compares the JSON values.
    fn roundtrip_test<T>(name: &str)
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let raw = load_fixture(name);
        let fixture: serde_json::Value = serde_json::from_slice(&raw)
            .unwrap_or_else(|e| panic!("failed to parse fixture {name}: {e}"));
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));
        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  server: {fixture}\n  client: {reserialized}"
        );
    }

    // --- Response body shapes ---

    #[test]
    fn fixture_upload_created() {
        roundtrip_test::<ServerResponse>("upload_created.json");
    }

    #[test]
    fn fixture_upload_error() {
        roundtrip_test::<ServerResponse>("upload_error.json");
    }

    #[test]
    fn fixture_empty_response() {
        roundtrip_test::<ServerResponse>("empty_response.json");
    }

    #[test]
    fn fixture_prune_count() {
        roundtrip_test::<PruneCount>("prune_count.json");
    }

    // --- Classification of real bodies ---

    #[test]
    fn created_body_yields_locator() {
        match classify_upload(201, &load_fixture("upload_created.json")) {
            Classification::Success(fragment) => assert_eq!(fragment, "files.example.com/aB3dX"),
            other => panic!("unexpected classification: {other:?}"),
        }
    }

    #[test]
    fn error_body_yields_server_message() {
        match classify_upload(400, &load_fixture("upload_error.json")) {
            Classification::Failure(UploadError::Validation { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "Filename header missing");
            }
            other => panic!("unexpected classification: {other:?}"),
        }
    }

    #[test]
    fn empty_body_on_created_is_invalid() {
        assert!(matches!(
            classify_upload(201, &load_fixture("empty_response.json")),
            Classification::Failure(UploadError::Transport(_))
        ));
    }

    #[test]
    fn forbidden_ignores_body() {
        assert!(matches!(
            classify_upload(403, &load_fixture("upload_error.json")),
            Classification::AuthRequired
        ));
    }

    #[test]
    fn prune_count_body() {
        match classify_json::<PruneCount>(200, 200, &load_fixture("prune_count.json")) {
            Classification::Success(count) => assert_eq!(count.n, 12),
            other => panic!("unexpected classification: {other:?}"),
        }
    }
}
