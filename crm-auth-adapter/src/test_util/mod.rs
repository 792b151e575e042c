//! In-memory fakes of the Supabase seams for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use crm_auth_common::{AccessParams, Credentials, Role};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::provider::AccessControl;
use crate::supabase::{AuthClient, Database, Query, Session, SessionUser};

pub fn test_session(user_id: Uuid) -> Session {
    Session {
        access_token: "test-access-token".to_string(),
        refresh_token: "test-refresh-token".to_string(),
        token_type: "bearer".to_string(),
        expires_in: Some(3600),
        expires_at: None,
        user: SessionUser {
            id: user_id,
            email: Some("jane@example.com".to_string()),
            role: Some("authenticated".to_string()),
        },
    }
}

/// A `sales` row as PostgREST returns it, including `user_id`.
pub fn sale_row(id: i64, user_id: Uuid, administrator: bool) -> Value {
    json!({
        "id": id,
        "user_id": user_id.to_string(),
        "first_name": "Jane",
        "last_name": "Doe",
        "email": "jane@example.com",
        "avatar": {"src": "https://cdn.example.com/jane.png", "title": "jane.png"},
        "administrator": administrator
    })
}

/// Table store answering equality-filtered queries.
#[derive(Default)]
pub struct FakeDatabase {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    queries: Mutex<Vec<Query>>,
    select_calls: AtomicUsize,
    select_single_calls: AtomicUsize,
    fail_next: AtomicBool,
}

impl FakeDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_rows(&self, table: &str, rows: Vec<Value>) {
        self.tables.lock().unwrap().insert(table.to_string(), rows);
    }

    /// Make the next query fail with a communication error.
    pub fn fail_next_select(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn select_calls(&self) -> usize {
        self.select_calls.load(Ordering::SeqCst)
    }

    pub fn select_single_calls(&self) -> usize {
        self.select_single_calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<Query> {
        self.queries.lock().unwrap().clone()
    }

    fn run(&self, query: &Query) -> Result<Vec<Value>> {
        self.queries.lock().unwrap().push(query.clone());
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(Error::Communication("injected failure".to_string()));
        }

        let tables = self.tables.lock().unwrap();
        let rows = tables.get(query.table_name()).cloned().unwrap_or_default();

        Ok(rows
            .into_iter()
            .filter(|row| {
                query.filters().iter().all(|(column, expected)| {
                    match row.get(column) {
                        Some(Value::String(actual)) => actual == expected,
                        Some(actual) => actual.to_string() == *expected,
                        None => false,
                    }
                })
            })
            .map(|row| project(row, query.columns()))
            .collect())
    }
}

fn project(row: Value, columns: &[String]) -> Value {
    if columns.is_empty() {
        return row;
    }
    let Value::Object(object) = row else {
        return row;
    };
    let projected: Map<String, Value> = object
        .into_iter()
        .filter(|(key, _)| columns.iter().any(|c| c == key))
        .collect();
    Value::Object(projected)
}

#[async_trait]
impl Database for FakeDatabase {
    async fn select(&self, query: &Query) -> Result<Vec<Value>> {
        self.select_calls.fetch_add(1, Ordering::SeqCst);
        self.run(query)
    }

    async fn select_single(&self, query: &Query) -> Result<Option<Value>> {
        self.select_single_calls.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.run(query)?;
        if rows.len() == 1 {
            Ok(rows.pop())
        } else {
            Ok(None)
        }
    }
}

/// Auth client recording every call.
#[derive(Default)]
pub struct FakeAuthClient {
    account: Mutex<Option<Session>>,
    session: Mutex<Option<Session>>,
    drop_session_on_sign_in: AtomicBool,
    fail_next_sign_out: AtomicBool,
    calls: Mutex<Vec<&'static str>>,
    recovery_emails: Mutex<Vec<String>>,
    password_updates: Mutex<Vec<(String, String)>>,
}

impl FakeAuthClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Client whose sign-in succeeds with `session`.
    pub fn with_account(session: Session) -> Self {
        let client = Self::new();
        *client.account.lock().unwrap() = Some(session);
        client
    }

    /// Simulate a backend that accepts the credentials but leaves no
    /// session behind.
    pub fn drop_session_on_sign_in(&self) {
        self.drop_session_on_sign_in.store(true, Ordering::SeqCst);
    }

    /// Make the next sign-out fail remotely after the local session is
    /// dropped.
    pub fn fail_next_sign_out(&self) {
        self.fail_next_sign_out.store(true, Ordering::SeqCst);
    }

    pub fn set_session(&self, session: Option<Session>) {
        *self.session.lock().unwrap() = session;
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls().iter().filter(|c| **c == name).count()
    }

    pub fn recovery_emails(&self) -> Vec<String> {
        self.recovery_emails.lock().unwrap().clone()
    }

    pub fn password_updates(&self) -> Vec<(String, String)> {
        self.password_updates.lock().unwrap().clone()
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().unwrap().push(name);
    }
}

#[async_trait]
impl AuthClient for FakeAuthClient {
    async fn sign_in_with_password(&self, _credentials: &Credentials) -> Result<Session> {
        self.record("sign_in");
        let account = self.account.lock().unwrap().clone();
        let session =
            account.ok_or_else(|| Error::InvalidCredentials("Invalid login credentials".to_string()))?;

        if !self.drop_session_on_sign_in.load(Ordering::SeqCst) {
            *self.session.lock().unwrap() = Some(session.clone());
        }
        Ok(session)
    }

    async fn get_session(&self) -> Result<Option<Session>> {
        self.record("get_session");
        Ok(self.session.lock().unwrap().clone())
    }

    async fn sign_out(&self) -> Result<()> {
        self.record("sign_out");
        *self.session.lock().unwrap() = None;
        if self.fail_next_sign_out.swap(false, Ordering::SeqCst) {
            return Err(Error::Communication("connection reset".to_string()));
        }
        Ok(())
    }

    async fn reset_password_for_email(&self, email: &str) -> Result<()> {
        self.record("reset_password");
        self.recovery_emails.lock().unwrap().push(email.to_string());
        Ok(())
    }

    async fn update_password(&self, access_token: &str, password: &str) -> Result<()> {
        self.record("update_password");
        self.password_updates
            .lock()
            .unwrap()
            .push((access_token.to_string(), password.to_string()));
        Ok(())
    }
}

/// Access control that records its inputs and answers a fixed value.
pub struct RecordingAccessControl {
    answer: bool,
    calls: Mutex<Vec<(Role, AccessParams)>>,
}

impl RecordingAccessControl {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(Role, AccessParams)> {
        self.calls.lock().unwrap().clone()
    }
}

impl AccessControl for RecordingAccessControl {
    fn can_access(&self, role: Role, params: &AccessParams) -> bool {
        self.calls.lock().unwrap().push((role, params.clone()));
        self.answer
    }
}
