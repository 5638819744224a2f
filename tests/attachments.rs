use miette::{IntoDiagnostic, Result};
use reqwest::StatusCode;
use serde_json::json;
use time::macros::datetime;
use wiremock::matchers::{body_bytes, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use monzo_rs::Error;

use test_utils::USER_ID;

const TRANSACTION_ID: &str = "tx_00008zIcpb1TB4yeIFXMzx";
const ATTACHMENT_ID: &str = "attach_00009238aOAIvVqfb9LrZh";
const FILE_URL: &str = "https://s3-eu-west-1.amazonaws.com/mondo-image-uploads/user_00009237hliZellUicKuG1/LcCu4ogv1xW28OCcvOTL-foo.png";

fn attachment_body(file_url: &str) -> serde_json::Value {
    json!({
        "attachment": {
            "id": ATTACHMENT_ID,
            "user_id": USER_ID,
            "external_id": TRANSACTION_ID,
            "file_url": file_url,
            "file_type": "image/png",
            "created": "2015-11-12T18:37:02Z"
        }
    })
}

async fn mount_upload_url(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/attachment/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "file_url": FILE_URL,
            "upload_url": format!("{}/storage/foo.png?AWSAccessKeyId=AKIA&Signature=sig", server.uri())
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn request_upload_url() -> Result<()> {
    test_utils::do_setup();
    let server = MockServer::start().await;
    mount_upload_url(&server).await;

    let client = test_utils::authenticated_client(&server);
    let upload = client
        .attachments()
        .request_upload_url("foo.png", "image/png")
        .await
        .into_diagnostic()?;
    assert_eq!(upload.file_url, FILE_URL);
    assert!(upload.upload_url.ends_with("/storage/foo.png?AWSAccessKeyId=AKIA&Signature=sig"));

    let requests = server.received_requests().await.unwrap();
    let form = test_utils::form_body(&requests[0]);
    assert_eq!(form["file_name"], "foo.png");
    assert_eq!(form["file_type"], "image/png");
    Ok(())
}

#[tokio::test]
async fn register_hosted_file() -> Result<()> {
    test_utils::do_setup();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/attachment/register"))
        .respond_with(ResponseTemplate::new(200).set_body_json(attachment_body(
            "https://example.com/receipt.png",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_utils::authenticated_client(&server);
    let attachment = client
        .attachments()
        .register(TRANSACTION_ID, "https://example.com/receipt.png", "image/png")
        .await
        .into_diagnostic()?;

    assert_eq!(attachment.id, ATTACHMENT_ID);
    assert_eq!(attachment.external_id, TRANSACTION_ID);
    assert_eq!(attachment.created, datetime!(2015-11-12 18:37:02 UTC));

    let requests = server.received_requests().await.unwrap();
    let pairs = test_utils::form_pairs(&requests[0]);
    assert_eq!(
        pairs,
        vec![
            ("external_id".to_string(), TRANSACTION_ID.to_string()),
            ("file_type".to_string(), "image/png".to_string()),
            (
                "file_url".to_string(),
                "https://example.com/receipt.png".to_string()
            ),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn upload_puts_content_then_registers() -> Result<()> {
    test_utils::do_setup();
    let server = MockServer::start().await;
    mount_upload_url(&server).await;
    Mock::given(method("PUT"))
        .and(path("/storage/foo.png"))
        .and(header("content-type", "image/png"))
        .and(body_bytes(b"\x89PNG fake image".to_vec()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/attachment/register"))
        .respond_with(ResponseTemplate::new(200).set_body_json(attachment_body(FILE_URL)))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_utils::authenticated_client(&server);
    let attachment = client
        .attachments()
        .upload("foo.png", "image/png", TRANSACTION_ID, b"\x89PNG fake image".to_vec())
        .await
        .into_diagnostic()?;
    assert_eq!(attachment.file_url, FILE_URL);

    let requests = server.received_requests().await.unwrap();
    let paths: Vec<&str> = requests.iter().map(|r| r.url.path()).collect();
    assert_eq!(
        paths,
        ["/attachment/upload", "/storage/foo.png", "/attachment/register"]
    );

    let put = &requests[1];
    assert!(put.headers.get("authorization").is_none());

    let form = test_utils::form_body(&requests[2]);
    assert_eq!(form["external_id"], TRANSACTION_ID);
    assert_eq!(form["file_url"], FILE_URL);
    assert_eq!(form["file_type"], "image/png");
    Ok(())
}

#[tokio::test]
async fn failed_upload_skips_registration() {
    test_utils::do_setup();
    let server = MockServer::start().await;
    mount_upload_url(&server).await;
    Mock::given(method("PUT"))
        .and(path("/storage/foo.png"))
        .respond_with(ResponseTemplate::new(403).set_body_string(
            "<Error><Code>AccessDenied</Code><Message>Request has expired</Message></Error>",
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/attachment/register"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_utils::authenticated_client(&server);
    let error = client
        .attachments()
        .upload("foo.png", "image/png", TRANSACTION_ID, "content")
        .await
        .unwrap_err();

    assert!(matches!(error, Error::UploadFailed { .. }));
    assert_eq!(error.status_code(), Some(StatusCode::FORBIDDEN));
    assert!(error.response_body().unwrap().contains("AccessDenied"));
}

#[tokio::test]
async fn failed_registration_after_upload_returns_api_error() {
    test_utils::do_setup();
    let server = MockServer::start().await;
    mount_upload_url(&server).await;
    Mock::given(method("PUT"))
        .and(path("/storage/foo.png"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/attachment/register"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": "bad_request.invalid_external_id",
            "message": "Transaction not found"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_utils::authenticated_client(&server);
    let error = client
        .attachments()
        .upload("foo.png", "image/png", TRANSACTION_ID, "content")
        .await
        .unwrap_err();

    assert_eq!(error.status_code(), Some(StatusCode::BAD_REQUEST));
    match error {
        Error::Api(api) => assert_eq!(api.message, "Transaction not found"),
        other => panic!("expected an API error, got {other:?}"),
    }
}

#[tokio::test]
async fn failed_upload_url_request_skips_put() {
    test_utils::do_setup();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/attachment/upload"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/attachment/register"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_utils::authenticated_client(&server);
    let error = client
        .attachments()
        .upload("foo.png", "image/png", TRANSACTION_ID, "content")
        .await
        .unwrap_err();

    assert!(matches!(error, Error::Api(_)));
    assert_eq!(error.status_code(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    assert_eq!(error.response_body(), Some("internal error"));
}

#[tokio::test]
async fn deregister_attachment() -> Result<()> {
    test_utils::do_setup();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/attachment/deregister"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_utils::authenticated_client(&server);
    client
        .attachments()
        .delete(ATTACHMENT_ID)
        .await
        .into_diagnostic()?;

    let requests = server.received_requests().await.unwrap();
    let form = test_utils::form_body(&requests[0]);
    assert_eq!(form["id"], ATTACHMENT_ID);
    Ok(())
}

#[tokio::test]
async fn upload_validates_before_any_request() {
    test_utils::do_setup();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_utils::authenticated_client(&server);
    assert!(matches!(
        client
            .attachments()
            .upload("foo.png", "image/png", "", "content")
            .await,
        Err(Error::InvalidArgument { name: "external_id", .. })
    ));
    assert!(matches!(
        client.attachments().delete("").await,
        Err(Error::InvalidArgument { name: "attachment_id", .. })
    ));
}
