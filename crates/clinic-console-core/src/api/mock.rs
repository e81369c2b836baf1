//! In-memory stand-in for the clinic API, used by tests.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, VecDeque};

use serde_json::{json, Map, Value};

use super::{ApiRequest, ApiResponse, Method, Transport, TransportError};

const COLLECTIONS: &[&str] = &["patients", "rendezvous", "ordonnances", "factures", "users"];

#[derive(Debug, Default)]
struct MockState {
    /// email -> (password, user record)
    accounts: HashMap<String, (String, Value)>,
    /// token -> user record
    sessions: HashMap<String, Value>,
    collections: BTreeMap<String, Vec<Value>>,
    required: HashMap<String, Vec<String>>,
    statistics: Value,
    envelope: bool,
    failures: VecDeque<(u16, String)>,
    requests: Vec<ApiRequest>,
    issued: u64,
}

/// Fake server holding collections in memory.
///
/// Mirrors the real API closely enough for screen tests: bearer tokens are
/// checked, POST assigns ids, missing required fields yield a 422 and
/// unknown ids a 404.
#[derive(Debug, Default)]
pub struct MockApi {
    state: RefCell<MockState>,
}

impl MockApi {
    pub fn new() -> Self {
        let api = Self::default();
        {
            let mut state = api.state.borrow_mut();
            for name in COLLECTIONS {
                state.collections.insert((*name).to_string(), Vec::new());
            }
            state.statistics = json!({});
        }
        api
    }

    /// Register a login for a user with `role`.
    pub fn with_account(self, email: &str, password: &str, role: &str) -> Self {
        {
            let mut state = self.state.borrow_mut();
            let id = state.accounts.len() as u64 + 1;
            let name = email.split('@').next().unwrap_or(email).to_string();
            let user = json!({ "id": id, "name": name, "email": email, "role": role });
            state
                .accounts
                .insert(email.to_string(), (password.to_string(), user));
        }
        self
    }

    /// Accept `token` as an already-issued session for an administrative user.
    pub fn with_session(self, token: &str) -> Self {
        self.with_session_user(
            token,
            json!({ "id": 1, "name": "Admin", "email": "admin@clinic.test", "role": "administratif" }),
        )
    }

    /// Accept `token` as a session for `user`.
    pub fn with_session_user(self, token: &str, user: Value) -> Self {
        self.state
            .borrow_mut()
            .sessions
            .insert(token.to_string(), user);
        self
    }

    pub fn with_records(self, collection: &str, records: Vec<Value>) -> Self {
        self.state
            .borrow_mut()
            .collections
            .insert(collection.to_string(), records);
        self
    }

    /// Reject POSTs to `collection` that leave any of `fields` blank.
    pub fn with_required_fields(self, collection: &str, fields: &[&str]) -> Self {
        self.state.borrow_mut().required.insert(
            collection.to_string(),
            fields.iter().map(|f| f.to_string()).collect(),
        );
        self
    }

    pub fn with_statistics(self, statistics: Value) -> Self {
        self.state.borrow_mut().statistics = statistics;
        self
    }

    /// Wrap list and item responses in `{ "data": ... }`.
    pub fn with_envelope(self) -> Self {
        self.state.borrow_mut().envelope = true;
        self
    }

    /// Make the next request fail with `status` and `message`.
    pub fn fail_next(&self, status: u16, message: &str) {
        self.state
            .borrow_mut()
            .failures
            .push_back((status, message.to_string()));
    }

    /// Invalidate every issued token, as when sessions expire server-side.
    pub fn revoke_all_tokens(&self) {
        self.state.borrow_mut().sessions.clear();
    }

    /// Current server-side contents of a collection.
    pub fn records(&self, collection: &str) -> Vec<Value> {
        self.state
            .borrow()
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.state.borrow().requests.clone()
    }

    fn handle(&self, request: &ApiRequest) -> ApiResponse {
        let mut state = self.state.borrow_mut();
        state.requests.push(request.clone());

        if let Some((status, message)) = state.failures.pop_front() {
            let body = if message.is_empty() {
                Value::Null
            } else {
                json!({ "message": message })
            };
            return ApiResponse::new(status, body);
        }

        if request.method == Method::Post && request.path == "login" {
            return state.login(request.body.as_ref());
        }

        let user = match request
            .bearer
            .as_ref()
            .and_then(|token| state.sessions.get(token))
        {
            Some(user) => user.clone(),
            None => return error(401, "Unauthenticated."),
        };

        match (request.method, request.path.as_str()) {
            (Method::Get, "user") => return ApiResponse::new(200, user),
            (Method::Get, "statistiques") => {
                let body = state.wrap(state.statistics.clone());
                return ApiResponse::new(200, body);
            }
            _ => {}
        }

        let (collection, id) = match request.path.split_once('/') {
            Some((collection, id)) => match id.parse::<u64>() {
                Ok(id) => (collection.to_string(), Some(id)),
                Err(_) => return error(404, "Not found"),
            },
            None => (request.path.clone(), None),
        };
        if !state.collections.contains_key(&collection) {
            return error(404, "Not found");
        }

        match (request.method, id) {
            (Method::Get, None) => {
                let items = Value::Array(state.collections[&collection].clone());
                ApiResponse::new(200, state.wrap(items))
            }
            (Method::Post, None) => state.create(&collection, request.body.as_ref()),
            (Method::Put, Some(id)) => state.update(&collection, id, request.body.as_ref()),
            (Method::Delete, Some(id)) => state.delete(&collection, id),
            _ => error(405, "Method not allowed"),
        }
    }
}

impl MockState {
    fn wrap(&self, body: Value) -> Value {
        if self.envelope {
            json!({ "data": body })
        } else {
            body
        }
    }

    fn login(&mut self, body: Option<&Value>) -> ApiResponse {
        let field = |name: &str| {
            body.and_then(|b| b.get(name))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let (email, password) = (field("email"), field("password"));

        let user = match self.accounts.get(&email) {
            Some((expected, user)) if *expected == password => user.clone(),
            _ => return error(401, "Invalid credentials"),
        };

        self.issued += 1;
        let token = format!("token-{}", self.issued);
        self.sessions.insert(token.clone(), user.clone());
        ApiResponse::new(200, json!({ "token": token, "user": user }))
    }

    fn create(&mut self, collection: &str, body: Option<&Value>) -> ApiResponse {
        let mut fields = match body {
            Some(Value::Object(map)) => map.clone(),
            _ => return error(400, "Expected a JSON object"),
        };

        if let Some(response) = self.check_required(collection, &fields) {
            return response;
        }

        let records = self.collections.entry(collection.to_string()).or_default();
        let id = records
            .iter()
            .filter_map(|r| r.get("id").and_then(Value::as_u64))
            .max()
            .unwrap_or(0)
            + 1;
        fields.insert("id".into(), json!(id));
        if collection == "users" {
            fields.remove("password");
        }

        let record = Value::Object(fields);
        records.push(record.clone());
        ApiResponse::new(201, self.wrap(record))
    }

    fn update(&mut self, collection: &str, id: u64, body: Option<&Value>) -> ApiResponse {
        let changes = match body {
            Some(Value::Object(map)) => map.clone(),
            _ => return error(400, "Expected a JSON object"),
        };

        let records = self.collections.entry(collection.to_string()).or_default();
        let record = match records
            .iter_mut()
            .find(|r| r.get("id").and_then(Value::as_u64) == Some(id))
        {
            Some(record) => record,
            None => return error(404, "Not found"),
        };

        if let Value::Object(existing) = record {
            for (key, value) in changes {
                if key == "id" || (collection == "users" && key == "password") {
                    continue;
                }
                existing.insert(key, value);
            }
        }
        let updated = record.clone();
        ApiResponse::new(200, self.wrap(updated))
    }

    fn delete(&mut self, collection: &str, id: u64) -> ApiResponse {
        let records = self.collections.entry(collection.to_string()).or_default();
        let before = records.len();
        records.retain(|r| r.get("id").and_then(Value::as_u64) != Some(id));
        if records.len() == before {
            error(404, "Not found")
        } else {
            ApiResponse::new(204, Value::Null)
        }
    }

    fn check_required(&self, collection: &str, fields: &Map<String, Value>) -> Option<ApiResponse> {
        let required = self.required.get(collection)?;
        let mut errors = Map::new();
        for name in required {
            let blank = match fields.get(name) {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.trim().is_empty(),
                Some(_) => false,
            };
            if blank {
                errors.insert(
                    name.clone(),
                    json!([format!("The {} field is required.", name.replace('_', " "))]),
                );
            }
        }
        if errors.is_empty() {
            None
        } else {
            Some(ApiResponse::new(
                422,
                json!({ "message": "The given data was invalid.", "errors": errors }),
            ))
        }
    }
}

fn error(status: u16, message: &str) -> ApiResponse {
    ApiResponse::new(status, json!({ "message": message }))
}

impl Transport for MockApi {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        Ok(self.handle(request))
    }
}
