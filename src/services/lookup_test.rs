use super::*;
use serde_json::json;

fn client() -> LookupClient {
    let config = LookupConfig { base_url: "http://127.0.0.1:9".into(), host: "lookup.test".into() };
    LookupClient::new(config, HttpTimeouts { request_secs: 2, connect_secs: 1 }).unwrap()
}

fn sample() -> String {
    json!({
        "search": {
            "results": [{
                "location": {"address": {
                    "street_number": "123",
                    "street_suffix": "St",
                    "city": "Austin",
                    "state_code": "TX"
                }},
                "list_price": 1_234_567,
                "description": {"text": "Bright corner lot."},
                "primary_photo": {"href": "https://img.test/house.jpg"}
            }]
        }
    })
    .to_string()
}

// =========================================================================
// parse_listing
// =========================================================================

#[test]
fn parses_first_result() {
    let listing = parse_listing(&sample()).unwrap();
    assert_eq!(
        listing,
        Listing {
            title: "123 St, Austin, TX".into(),
            price: "$1,234,567".into(),
            description: "Bright corner lot.".into(),
            image_url: Some("https://img.test/house.jpg".into()),
        }
    );
}

#[test]
fn missing_fields_fall_back() {
    let body = json!({"search": {"results": [{"location": {"address": {}}}]}}).to_string();
    let listing = parse_listing(&body).unwrap();
    assert_eq!(listing.title, NO_ADDRESS);
    assert_eq!(listing.price, NO_PRICE);
    assert_eq!(listing.description, NO_DESCRIPTION);
    assert!(listing.image_url.is_none());
}

#[test]
fn empty_results_is_unexpected_response() {
    let body = json!({"search": {"results": []}}).to_string();
    assert!(matches!(parse_listing(&body), Err(ClientError::UnexpectedResponse(_))));
    assert!(matches!(parse_listing("not json"), Err(ClientError::UnexpectedResponse(_))));
}

#[test]
fn address_skips_missing_parts() {
    let address = json!({"city": "Austin", "state_code": "TX"});
    assert_eq!(format_address(Some(&address)), "Austin, TX");
    assert_eq!(format_address(None), NO_ADDRESS);
}

#[test]
fn price_groups_thousands() {
    assert_eq!(format_price(&json!(0)).as_deref(), Some("$0"));
    assert_eq!(format_price(&json!(999)).as_deref(), Some("$999"));
    assert_eq!(format_price(&json!(1000)).as_deref(), Some("$1,000"));
    assert_eq!(format_price(&json!(450_000.5)).as_deref(), Some("$450,000.5"));
    assert_eq!(format_price(&json!(250_000.0)).as_deref(), Some("$250,000"));
    assert_eq!(format_price(&json!("n/a")), None);
}

// =========================================================================
// snippets
// =========================================================================

#[test]
fn snippets_match_insert_formats() {
    let listing = parse_listing(&sample()).unwrap();
    assert_eq!(listing.snippet(Snippet::Title).unwrap(), "Title: 123 St, Austin, TX");
    assert_eq!(listing.snippet(Snippet::Price).unwrap(), "Price: $1,234,567");
    assert_eq!(listing.snippet(Snippet::Description).unwrap(), "Description: Bright corner lot.");
    assert_eq!(
        listing.snippet(Snippet::Image).unwrap(),
        "Image: ![Property Image](https://img.test/house.jpg)"
    );
    assert_eq!(
        listing.snippet(Snippet::All).unwrap(),
        "Title: 123 St, Austin, TX\nPrice: $1,234,567\nDescription: Bright corner lot.\n\
         Image: ![Property Image](https://img.test/house.jpg)"
    );
}

#[test]
fn all_snippet_omits_missing_image() {
    let listing = Listing {
        title: "t".into(),
        price: NO_PRICE.into(),
        description: "d".into(),
        image_url: None,
    };
    assert!(listing.snippet(Snippet::Image).is_none());
    assert_eq!(listing.snippet(Snippet::All).unwrap(), "Title: t\nPrice: Price not available\nDescription: d");
}

// =========================================================================
// client guards
// =========================================================================

#[tokio::test]
async fn missing_key_fails_before_network() {
    let err = client().lookup(None, "TX123").await.unwrap_err();
    assert_eq!(err, ClientError::MissingCredential { provider: Provider::Lookup });
    assert_eq!(err.to_string(), "RapidAPI API key is not set. Please set it in the Admin Settings.");
}

#[tokio::test]
async fn blank_id_is_empty_input() {
    let err = client().lookup(Some("key"), "   ").await.unwrap_err();
    assert_eq!(err, ClientError::EmptyInput);
}

#[tokio::test]
async fn unreachable_host_is_retryable_provider_error() {
    let err = client().lookup(Some("key"), "TX123").await.unwrap_err();
    assert!(matches!(err, ClientError::Provider { status: None, .. }));
    assert!(crate::error::ErrorCode::retryable(&err));
}
