//! Test helpers: build the router over in-memory stores and drive it with `oneshot`.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use helloworld_api::setup::initialize_app;
use helloworld_api::state::AppState;
use helloworld_core::HelloworldConfig;
use image::{ImageBuffer, ImageFormat, Rgb};
use serde_json::Value;
use std::io::Cursor;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

pub const BOUNDARY: &str = "----helloworld-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub media: TempDir,
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {}).await
}

pub async fn setup_test_app_with(customize: impl FnOnce(&mut HelloworldConfig)) -> TestApp {
    let media = TempDir::new().unwrap();
    let mut config = HelloworldConfig {
        media_root: media.path().to_path_buf(),
        ..HelloworldConfig::default()
    };
    customize(&mut config);

    let (state, router) = initialize_app(config).await.unwrap();
    TestApp {
        router,
        state,
        media,
    }
}

/// A visitor's session: cookie plus the token to present with the next post
pub struct Visitor {
    pub cookie: String,
    pub token: String,
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Start a session and fetch a token for it
    pub async fn visitor(&self) -> Visitor {
        let response = self
            .send(Request::get("/helloworld/token").body(Body::empty()).unwrap())
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let cookie = response
            .headers()
            .get(SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .expect("session cookie")
            .to_string();
        let body = json_body(response).await;
        let token = body["token"].as_str().expect("token").to_string();

        Visitor { cookie, token }
    }

    /// Fresh token for an existing session
    pub async fn refresh_token(&self, visitor: &mut Visitor) {
        let response = self
            .send(
                Request::get("/helloworld/token")
                    .header(COOKIE, &visitor.cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert!(response.headers().get(SET_COOKIE).is_none());
        visitor.token = json_body(response).await["token"]
            .as_str()
            .unwrap()
            .to_string();
    }

    pub async fn submit(&self, visitor: &Visitor, parts: Vec<Part>) -> Response<Body> {
        let request = Request::post("/helloworld")
            .header(COOKIE, &visitor.cookie)
            .header("x-csrf-token", &visitor.token)
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(&parts)))
            .unwrap();
        self.send(request).await
    }

    /// `{ data, messages }` of the form page
    pub async fn form_state(&self, visitor: &Visitor) -> Value {
        let response = self
            .send(
                Request::get("/helloworld/form")
                    .header(COOKIE, &visitor.cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        json_body(response).await
    }
}

pub enum Part {
    Text(&'static str, String),
    File {
        name: &'static str,
        filename: String,
        content_type: &'static str,
        data: Vec<u8>,
    },
}

impl Part {
    pub fn greeting(text: &str) -> Self {
        Part::Text("jform[greeting]", text.to_string())
    }

    pub fn image(filename: &str, content_type: &'static str, data: Vec<u8>) -> Self {
        Part::File {
            name: "jform[imageinfo][image]",
            filename: filename.to_string(),
            content_type,
            data,
        }
    }
}

pub fn multipart_body(parts: &[Part]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                filename,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, filename, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// Message keys queued for the form page, in order
pub fn message_keys(form_state: &Value) -> Vec<String> {
    form_state["messages"]
        .as_array()
        .map(|messages| {
            messages
                .iter()
                .filter_map(|m| m["key"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

pub fn png_bytes() -> Vec<u8> {
    let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_pixel(8, 8, Rgb([0, 90, 30]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}
