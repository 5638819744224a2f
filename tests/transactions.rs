use std::collections::HashMap;

use miette::{IntoDiagnostic, Result};
use serde_json::json;
use time::macros::datetime;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use monzo_rs::{DeclineReason, Error, Expand, PaginationOptions};

use test_utils::ACCOUNT_ID;

const TRANSACTION_ID: &str = "tx_00008zIcpb1TB4yeIFXMzx";

fn transaction(merchant: serde_json::Value) -> serde_json::Value {
    json!({
        "account_balance": 13013,
        "amount": -510,
        "created": "2015-08-22T12:20:18Z",
        "currency": "GBP",
        "description": "THE DE BEAUVOIR DELI C LONDON        GBR",
        "id": TRANSACTION_ID,
        "merchant": merchant,
        "metadata": {},
        "notes": "Salmon sandwich",
        "is_load": false,
        "settled": true,
        "category": "eating_out"
    })
}

fn expanded_merchant() -> serde_json::Value {
    json!({
        "address": {
            "address": "98 Southgate Road",
            "city": "London",
            "country": "GB",
            "latitude": 51.54151,
            "longitude": -0.08482400000002599,
            "postcode": "N1 3JD",
            "region": "Greater London"
        },
        "created": "2015-08-22T12:20:18Z",
        "group_id": "grp_00008zIcpbBOaAr7TTP3sv",
        "id": "merch_00008zIcpbAKe8shBxXUtl",
        "logo": "https://pbs.twimg.com/profile_images/527043602623389696/68_SgUWJ.jpeg",
        "emoji": "🍞",
        "name": "The De Beauvoir Deli Co.",
        "category": "eating_out"
    })
}

fn exact_query(expected: &'static str) -> impl Fn(&Request) -> bool + Send + Sync {
    move |req: &Request| req.url.query() == Some(expected)
}

#[tokio::test]
async fn retrieve_with_merchant_id() -> Result<()> {
    test_utils::do_setup();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/transactions/{TRANSACTION_ID}")))
        .and(exact_query("expand[]="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transaction": transaction(json!("merch_00008zIcpbAKe8shBxXUtl"))
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_utils::authenticated_client(&server);
    let tx = client
        .transactions()
        .get(TRANSACTION_ID, None)
        .await
        .into_diagnostic()?;

    assert_eq!(tx.amount, -510);
    assert_eq!(tx.created, datetime!(2015-08-22 12:20:18 UTC));
    let merchant = tx.merchant.expect("merchant id should decode");
    assert_eq!(merchant.id, "merch_00008zIcpbAKe8shBxXUtl");
    assert!(merchant.name.is_none());
    Ok(())
}

#[tokio::test]
async fn retrieve_with_expanded_merchant() -> Result<()> {
    test_utils::do_setup();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/transactions/{TRANSACTION_ID}")))
        .and(exact_query("expand[]=merchant"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transaction": transaction(expanded_merchant())
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_utils::authenticated_client(&server);
    let tx = client
        .transactions()
        .get(TRANSACTION_ID, Some(Expand::Merchant))
        .await
        .into_diagnostic()?;

    let merchant = tx.merchant.expect("expanded merchant should decode");
    assert!(merchant.is_expanded());
    assert_eq!(merchant.name.as_deref(), Some("The De Beauvoir Deli Co."));
    assert_eq!(merchant.group_id.as_deref(), Some("grp_00008zIcpbBOaAr7TTP3sv"));
    let address = merchant.address.expect("address should decode");
    assert_eq!(address.city, "London");
    assert_eq!(address.postcode, "N1 3JD");
    assert!((address.latitude - 51.54151).abs() < f64::EPSILON);
    Ok(())
}

#[tokio::test]
async fn list_sends_exact_query() -> Result<()> {
    test_utils::do_setup();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/transactions"))
        .and(exact_query(
            "account_id=acc_00009237aqC8c5umZmrRdh&expand[]=merchant\
             &limit=40&since=2015-04-05T18:01:32Z&before=2015-12-25T18:01:32Z",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transactions": [
                transaction(expanded_merchant()),
                transaction(json!(null)),
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let pagination = PaginationOptions::new()
        .limit(40)
        .since_time(datetime!(2015-04-05 18:01:32 UTC))
        .before_time(datetime!(2015-12-25 18:01:32 UTC));

    let client = test_utils::authenticated_client(&server);
    let transactions = client
        .transactions()
        .list(ACCOUNT_ID, Some(Expand::Merchant), Some(&pagination))
        .await
        .into_diagnostic()?;

    assert_eq!(transactions.len(), 2);
    assert!(transactions[0].merchant.is_some());
    assert!(transactions[1].merchant.is_none());
    Ok(())
}

#[tokio::test]
async fn list_without_options() -> Result<()> {
    test_utils::do_setup();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/transactions"))
        .and(exact_query("account_id=acc_00009237aqC8c5umZmrRdh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "transactions": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_utils::authenticated_client(&server);
    let transactions = client
        .transactions()
        .list(ACCOUNT_ID, None, None)
        .await
        .into_diagnostic()?;
    assert!(transactions.is_empty());
    Ok(())
}

#[tokio::test]
async fn list_with_since_id() -> Result<()> {
    test_utils::do_setup();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/transactions"))
        .and(exact_query(
            "account_id=acc_00009237aqC8c5umZmrRdh&limit=&since=tx_00009238aqC8c5umZmrRdh&before=",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "transactions": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_utils::authenticated_client(&server);
    client
        .transactions()
        .list(
            ACCOUNT_ID,
            None,
            Some(&PaginationOptions::new().since_id("tx_00009238aqC8c5umZmrRdh")),
        )
        .await
        .into_diagnostic()?;
    Ok(())
}

#[tokio::test]
async fn declined_transaction() -> Result<()> {
    test_utils::do_setup();
    let server = MockServer::start().await;
    let mut declined = transaction(json!(null));
    declined["decline_reason"] = json!("CARD_BLOCKED");
    declined.as_object_mut().unwrap().remove("settled");
    Mock::given(method("GET"))
        .and(path(format!("/transactions/{TRANSACTION_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "transaction": declined })))
        .mount(&server)
        .await;

    let client = test_utils::authenticated_client(&server);
    let tx = client
        .transactions()
        .get(TRANSACTION_ID, None)
        .await
        .into_diagnostic()?;
    assert_eq!(tx.decline_reason, Some(DeclineReason::CardBlocked));
    assert!(tx.is_declined());
    assert_eq!(tx.settled, None);
    Ok(())
}

#[tokio::test]
async fn annotate_sends_metadata_form() -> Result<()> {
    test_utils::do_setup();
    let server = MockServer::start().await;
    let mut annotated = transaction(json!("merch_00008zIcpbAKe8shBxXUtl"));
    annotated["metadata"] = json!({ "foo": "bar" });
    Mock::given(method("PATCH"))
        .and(path(format!("/transactions/{TRANSACTION_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "transaction": annotated })))
        .expect(1)
        .mount(&server)
        .await;

    let metadata = HashMap::from([
        ("foo".to_string(), "bar".to_string()),
        ("old_key".to_string(), String::new()),
    ]);

    let client = test_utils::authenticated_client(&server);
    let tx = client
        .transactions()
        .annotate(TRANSACTION_ID, &metadata)
        .await
        .into_diagnostic()?;
    assert_eq!(tx.metadata.get("foo").map(String::as_str), Some("bar"));

    let requests = server.received_requests().await.unwrap();
    let form = test_utils::form_body(&requests[0]);
    assert_eq!(form.len(), 2);
    assert_eq!(form["metadata[foo]"], "bar");
    assert_eq!(form["metadata[old_key]"], "");
    Ok(())
}

#[tokio::test]
async fn blank_ids_are_rejected() {
    test_utils::do_setup();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_utils::authenticated_client(&server);
    assert!(matches!(
        client.transactions().get("", None).await,
        Err(Error::InvalidArgument { name: "transaction_id", .. })
    ));
    assert!(matches!(
        client.transactions().list(" ", None, None).await,
        Err(Error::InvalidArgument { name: "account_id", .. })
    ));
    assert!(matches!(
        client.transactions().annotate("", &HashMap::new()).await,
        Err(Error::InvalidArgument { name: "transaction_id", .. })
    ));
}

#[tokio::test]
async fn malformed_transaction_is_a_decode_error() {
    test_utils::do_setup();
    let server = MockServer::start().await;
    let mut malformed = transaction(json!(null));
    malformed["settled"] = json!("2015-08-23T12:20:18Z");
    Mock::given(method("GET"))
        .and(path(format!("/transactions/{TRANSACTION_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "transaction": malformed })))
        .mount(&server)
        .await;

    let client = test_utils::authenticated_client(&server);
    let error = client
        .transactions()
        .get(TRANSACTION_ID, None)
        .await
        .unwrap_err();
    assert!(matches!(error, Error::DeserializationError(_, Some(_))));
}

#[tokio::test]
async fn malformed_merchant_is_a_decode_error() {
    test_utils::do_setup();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/transactions/{TRANSACTION_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transaction": transaction(json!({ "id": "merch_1", "created": "not-a-date" }))
        })))
        .mount(&server)
        .await;

    let client = test_utils::authenticated_client(&server);
    let error = client
        .transactions()
        .get(TRANSACTION_ID, Some(Expand::Merchant))
        .await
        .unwrap_err();
    assert!(matches!(error, Error::DeserializationError(_, Some(_))));
}
