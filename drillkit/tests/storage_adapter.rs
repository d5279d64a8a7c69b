use drillkit::load_config::SupabaseSettings;
use drillkit::storage::SupabaseStorage;
use drillkit_core::contract::ObjectStore;
use drillkit_core::DrillError;
use std::fs::write;
use tempfile::tempdir;
use wiremock::matchers::{body_bytes, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn storage(server: &MockServer) -> SupabaseStorage {
    SupabaseStorage::new(
        reqwest::Client::new(),
        &SupabaseSettings {
            url: server.uri(),
            service_role_key: "service-key".to_string(),
            bucket: "drills".to_string(),
        },
    )
    .expect("valid settings")
}

#[tokio::test]
async fn upload_posts_file_bytes_and_returns_public_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/storage/v1/object/drills/pdf/abc.pdf"))
        .and(header("authorization", "Bearer service-key"))
        .and(header("apikey", "service-key"))
        .and(header("x-upsert", "true"))
        .and(header("content-type", "application/pdf"))
        .and(body_bytes(b"%PDF-1.4 test".to_vec()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let file = dir.path().join("a.pdf");
    write(&file, b"%PDF-1.4 test").unwrap();

    let url = storage(&server)
        .upload(&file, "pdf/abc.pdf", "application/pdf")
        .await
        .expect("upload should succeed");
    assert_eq!(
        url,
        format!(
            "{}/storage/v1/object/public/drills/pdf/abc.pdf",
            server.uri()
        )
    );
}

#[tokio::test]
async fn rejected_upload_is_an_upload_error_with_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("row-level security"))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let file = dir.path().join("a.pdf");
    write(&file, b"%PDF").unwrap();

    let err = storage(&server)
        .upload(&file, "pdf/abc.pdf", "application/pdf")
        .await
        .unwrap_err();
    match err {
        DrillError::Upload(msg) => {
            assert!(msg.contains("403"), "{msg}");
            assert!(msg.contains("row-level security"), "{msg}");
        }
        other => panic!("expected upload error, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_local_file_fails_without_a_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = storage(&server)
        .upload(
            std::path::Path::new("/no/such/file.pdf"),
            "pdf/x.pdf",
            "application/pdf",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DrillError::Upload(_)));
}

#[tokio::test]
async fn delete_targets_the_object_key() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/storage/v1/object/drills/thumbnail/abc.jpg"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    storage(&server)
        .delete("thumbnail/abc.jpg")
        .await
        .expect("delete should succeed");
}

#[tokio::test]
async fn stored_url_resolves_back_to_its_key() {
    let server = MockServer::start().await;
    let s = storage(&server);
    let url = s.public_url_for("thumbnail/abc.jpg");
    assert_eq!(s.key_from_url(&url).unwrap(), "thumbnail/abc.jpg");
}

#[tokio::test]
async fn rejected_delete_is_a_backend_error_not_an_upload_error() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/storage/v1/object/drills/pdf/abc.pdf"))
        .respond_with(ResponseTemplate::new(404).set_body_string("object not found"))
        .mount(&server)
        .await;

    let err = storage(&server).delete("pdf/abc.pdf").await.unwrap_err();
    match &err {
        DrillError::Backend(msg) => {
            assert!(msg.contains("delete object pdf/abc.pdf"), "{msg}");
            assert!(msg.contains("404"), "{msg}");
        }
        other => panic!("expected backend error, got {other:?}"),
    }
    assert!(!err.to_string().contains("Upload failed"), "{err}");
}
