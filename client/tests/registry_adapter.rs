//! End-to-end coverage of the reqwest adapters against a fake backend.
//!
//! Forms run through the real `ReqwestRegistryApi` over a socket so the wire
//! shape (paths, headers, JSON and multipart bodies) is what the backend
//! receives.

mod support;

use std::sync::Arc;
use std::time::Duration;

use lifetag_client::domain::api::{OWNER_ID_HEADER, Upload, endpoints};
use lifetag_client::domain::forms::{
    AddCattleForm, FormController, InaphLoginForm, InaphLoginOutcome, LoginForm,
};
use lifetag_client::domain::ports::{Coordinates, MemoryKeyValueStore, ReverseGeocoder};
use lifetag_client::domain::submission::{INVALID_RESPONSE, NETWORK_ERROR};
use lifetag_client::domain::{Role, SessionRecord, SessionStore};
use lifetag_client::outbound::nominatim::{DEFAULT_USER_AGENT, NominatimGeocoder};
use lifetag_client::outbound::registry::ReqwestRegistryApi;
use serde_json::json;
use support::{FakeBackend, closed_port_url};

fn session() -> SessionStore {
    SessionStore::new(Arc::new(MemoryKeyValueStore::new()))
}

fn api_for(backend: &FakeBackend) -> ReqwestRegistryApi {
    ReqwestRegistryApi::new(backend.base_url(), Some(Duration::from_secs(5))).expect("client")
}

fn farmer_login() -> FormController<LoginForm> {
    let form = FormController::new(LoginForm);
    form.set("role", "farmer").expect("role");
    form.set("faadhar", "1234 5678 9012").expect("aadhaar");
    form.set("password", "secret").expect("password");
    form
}

fn cattle_form() -> FormController<AddCattleForm> {
    let form = FormController::new(AddCattleForm);
    for (field, value) in [
        ("species", "Buffalo"),
        ("breed", "Murrah"),
        ("sex", "Female"),
        ("dob", "2022-07-25"),
        ("weight", "410.5"),
    ] {
        form.set(field, value).expect("field accepted");
    }
    form
}

fn signed_in_farmer() -> SessionStore {
    let store = session();
    store
        .set(&SessionRecord::new(
            Some("7".into()),
            Some("Ravi".into()),
            Some(Role::Farmer),
        ))
        .expect("session");
    store
}

#[actix_rt::test]
async fn login_posts_json_and_stores_the_session() {
    let backend = FakeBackend::start();
    backend.respond(
        200,
        json!({"user_id": 7, "user_name": "Ravi", "role": "farmer", "farmerId": "7"}),
    );
    let session = session();

    let signed_in = farmer_login()
        .submit(&api_for(&backend), &session)
        .await
        .expect("login");

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, endpoints::LOGIN);
    assert_eq!(
        requests[0].json(),
        json!({"role": "farmer", "identifier": "123456789012", "password": "secret"})
    );
    assert_eq!(signed_in.record.user_id(), Some("7"));
    assert_eq!(session.owner_id().as_deref(), Some("7"));
}

#[actix_rt::test]
async fn login_error_body_is_shown_and_nothing_is_stored() {
    let backend = FakeBackend::start();
    backend.respond(401, json!({"error": "Invalid Credentials"}));
    let session = session();

    let err = farmer_login()
        .submit(&api_for(&backend), &session)
        .await
        .expect_err("rejected");

    assert_eq!(err.to_string(), "Invalid Credentials");
    assert!(!session.is_authenticated());
}

#[actix_rt::test]
async fn non_json_failure_is_reported_as_invalid_response() {
    let backend = FakeBackend::start();
    backend.respond_raw(502, "<html>Bad gateway</html>");

    let err = farmer_login()
        .submit(&api_for(&backend), &session())
        .await
        .expect_err("bad gateway");

    assert_eq!(err.to_string(), INVALID_RESPONSE);
}

#[actix_rt::test]
async fn cattle_with_photo_sends_multipart_with_owner_header() {
    let backend = FakeBackend::start();
    backend.respond(201, json!({"message": "Cattle added", "local_cattle_id": "LT-9"}));
    let form = cattle_form();
    form.set_file("photo", Upload::new("cow.png", b"\x89PNG-bytes".to_vec()))
        .expect("photo");

    let registered = form
        .submit(&api_for(&backend), &signed_in_farmer())
        .await
        .expect("registered");

    assert_eq!(registered.local_cattle_id, "LT-9");
    let request = &backend.requests()[0];
    assert_eq!(request.path, endpoints::ADD_CATTLE);
    assert_eq!(request.header(OWNER_ID_HEADER), Some("7"));
    assert!(
        request
            .header("content-type")
            .is_some_and(|value| value.starts_with("multipart/form-data; boundary="))
    );
    let body = request.body_text();
    assert!(body.contains("name=\"photo\"; filename=\"cow.png\""), "{body}");
    assert!(body.contains("Content-Type: image/png"), "{body}");
    assert!(body.contains("name=\"breed\"\r\n\r\nMurrah"), "{body}");
    assert!(body.contains("name=\"weight\"\r\n\r\n410.5"), "{body}");
    assert!(!body.contains("name=\"colour\""), "{body}");
}

#[actix_rt::test]
async fn cattle_without_photo_omits_the_part() {
    let backend = FakeBackend::start();
    backend.respond(201, json!({"message": "Cattle added", "local_cattle_id": 3}));

    cattle_form()
        .submit(&api_for(&backend), &signed_in_farmer())
        .await
        .expect("registered");

    let body = backend.requests()[0].body_text();
    assert!(!body.contains("name=\"photo\""), "{body}");
    assert!(body.contains("name=\"species\"\r\n\r\nBuffalo"), "{body}");
}

#[actix_rt::test]
async fn inaph_login_checks_the_password_first() {
    let backend = FakeBackend::start();
    backend.respond(200, json!({"has_password": false}));
    let form = FormController::new(InaphLoginForm);
    form.set("inaph_id", " IN-42 ").expect("id");

    let outcome = form
        .submit(&api_for(&backend), &session())
        .await
        .expect("checked");

    assert_eq!(
        outcome,
        InaphLoginOutcome::PasswordRequired {
            inaph_id: "IN-42".into()
        }
    );
    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].path, endpoints::INAPH_CHECK_PASSWORD);
    assert_eq!(requests[0].query, "inaph_id=IN-42");
}

#[actix_rt::test]
async fn closed_port_is_a_network_error() {
    let api = ReqwestRegistryApi::new(closed_port_url(), Some(Duration::from_secs(2)))
        .expect("client");

    let err = farmer_login()
        .submit(&api, &session())
        .await
        .expect_err("unreachable");

    assert_eq!(err.to_string(), NETWORK_ERROR);
}

#[actix_rt::test]
async fn slow_backend_times_out_as_a_network_error() {
    let backend = FakeBackend::start();
    backend.respond_slowly(Duration::from_secs(3));
    let api = ReqwestRegistryApi::new(backend.base_url(), Some(Duration::from_millis(200)))
        .expect("client");

    let err = farmer_login()
        .submit(&api, &session())
        .await
        .expect_err("timeout");

    assert_eq!(err.to_string(), NETWORK_ERROR);
}

#[actix_rt::test]
async fn nominatim_lookup_formats_the_address() {
    let backend = FakeBackend::start();
    backend.respond(
        200,
        json!({
            "display_name": "Somewhere, Rajasthan, India",
            "address": {
                "road": "MI Road",
                "suburb": "C-Scheme",
                "city": "Jaipur",
                "state": "Rajasthan",
                "postcode": "302001"
            }
        }),
    );
    let endpoint = backend.base_url().join("reverse").expect("endpoint");
    let geocoder = NominatimGeocoder::new(endpoint, Some(Duration::from_secs(5))).expect("client");

    let address = geocoder
        .reverse(Coordinates::new(26.91, 75.79))
        .await
        .expect("address");

    assert_eq!(
        address.formatted().as_deref(),
        Some("MI Road, C-Scheme, Jaipur, Rajasthan, 302001")
    );
    let request = &backend.requests()[0];
    assert_eq!(request.path, "/reverse");
    assert_eq!(
        request.query,
        "lat=26.91&lon=75.79&format=json&addressdetails=1"
    );
    assert_eq!(request.header("user-agent"), Some(DEFAULT_USER_AGENT));
}
