//! Fake registry backend served by Actix on an ephemeral port.
//!
//! Every request is recorded and answered from a script. An empty script
//! answers `404` with an empty JSON object.

use std::collections::VecDeque;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_web::dev::ServerHandle;
use actix_web::http::StatusCode;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use reqwest::Url;

/// One request as the backend saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("JSON request body")
    }
}

#[derive(Debug, Clone)]
struct Scripted {
    status: u16,
    body: String,
    delay: Option<Duration>,
}

#[derive(Debug, Clone, Default)]
struct Shared {
    recorded: Arc<Mutex<Vec<Recorded>>>,
    script: Arc<Mutex<VecDeque<Scripted>>>,
}

/// Running fake backend; stops when dropped.
pub struct FakeBackend {
    base_url: Url,
    handle: ServerHandle,
    shared: Shared,
}

impl FakeBackend {
    /// Bind to `127.0.0.1:0` and start serving. Must run inside an Actix
    /// system, e.g. under `#[actix_rt::test]`.
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        let shared = Shared::default();
        let data = web::Data::new(shared.clone());

        let server = HttpServer::new(move || {
            App::new()
                .app_data(data.clone())
                .default_service(web::to(handle))
        })
        .disable_signals()
        .workers(1)
        .listen(listener)
        .expect("listen")
        .run();
        let handle = server.handle();
        actix_web::rt::spawn(server);

        Self {
            base_url: Url::parse(&format!("http://{addr}/")).expect("base url"),
            handle,
            shared,
        }
    }

    pub fn base_url(&self) -> Url {
        self.base_url.clone()
    }

    /// Queue a JSON response.
    pub fn respond(&self, status: u16, body: serde_json::Value) {
        self.respond_raw(status, body.to_string());
    }

    /// Queue a response with an arbitrary body.
    pub fn respond_raw(&self, status: u16, body: impl Into<String>) {
        self.push(Scripted {
            status,
            body: body.into(),
            delay: None,
        });
    }

    /// Queue a response that is held back for `delay`.
    pub fn respond_slowly(&self, delay: Duration) {
        self.push(Scripted {
            status: 200,
            body: "{}".to_owned(),
            delay: Some(delay),
        });
    }

    fn push(&self, scripted: Scripted) {
        self.shared
            .script
            .lock()
            .expect("script lock")
            .push_back(scripted);
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.shared.recorded.lock().expect("recorded lock").clone()
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        drop(self.handle.stop(false));
    }
}

async fn handle(request: HttpRequest, body: web::Bytes, shared: web::Data<Shared>) -> HttpResponse {
    shared.recorded.lock().expect("recorded lock").push(Recorded {
        method: request.method().as_str().to_owned(),
        path: request.path().to_owned(),
        query: request.query_string().to_owned(),
        headers: request
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_owned(),
                    value.to_str().unwrap_or_default().to_owned(),
                )
            })
            .collect(),
        body: body.to_vec(),
    });

    let next = shared.script.lock().expect("script lock").pop_front();
    let Some(scripted) = next else {
        return HttpResponse::NotFound()
            .content_type("application/json")
            .body("{}");
    };
    if let Some(delay) = scripted.delay {
        actix_web::rt::time::sleep(delay).await;
    }
    HttpResponse::build(StatusCode::from_u16(scripted.status).expect("status code"))
        .content_type("application/json")
        .body(scripted.body)
}

/// A URL on which nothing is listening.
pub fn closed_port_url() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    Url::parse(&format!("http://{addr}/")).expect("url")
}
