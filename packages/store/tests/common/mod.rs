//! A wiremock responder that behaves like the remote store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const TOKEN: &str = "test-token";

/// Keeps values per URL path; answers in the service's envelope shape.
#[derive(Clone, Default)]
pub struct MemoryService {
    data: Arc<Mutex<HashMap<String, Value>>>,
}

impl MemoryService {
    pub async fn mount(server: &MockServer) -> Self {
        let service = Self::default();
        Mock::given(any())
            .respond_with(service.clone())
            .mount(server)
            .await;
        service
    }

    pub fn stored(&self, path: &str) -> Option<Value> {
        self.data.lock().unwrap().get(path).cloned()
    }
}

impl Respond for MemoryService {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let key = request.url.path().to_string();
        let mut data = self.data.lock().unwrap();

        match request.method.as_str() {
            "GET" => {
                let result = data.get(&key).cloned().unwrap_or(Value::Null);
                ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": result}))
            }
            "PUT" | "POST" => match serde_json::from_slice::<Value>(&request.body) {
                Ok(body) => {
                    data.insert(key, body);
                    ResponseTemplate::new(201).set_body_json(json!({"ok": true}))
                }
                Err(e) => ResponseTemplate::new(400)
                    .set_body_json(json!({"ok": false, "error": e.to_string()})),
            },
            "DELETE" => {
                data.remove(&key);
                ResponseTemplate::new(200).set_body_json(json!({"ok": true}))
            }
            _ => ResponseTemplate::new(405),
        }
    }
}
