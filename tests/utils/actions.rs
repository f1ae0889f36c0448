#![allow(dead_code)] // Test utilities may not all be used in every test

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt; // for `oneshot`

use super::assertions::EventStream;
use super::setup::TestSetup;

// ============================================================================
// Action Helpers
// ============================================================================

impl TestSetup {
    /// Sends one request as `user` and returns the status with the JSON body
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        user: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("Authorization", format!("Bearer {}", self.token(user)));

        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, user: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, user, None).await
    }

    pub async fn post(&self, uri: &str, user: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, user, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, user: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, user, None).await
    }

    /// Opens a live stream as `user`; panics unless the server accepts it
    pub async fn open_stream(&self, uri: &str, user: &str) -> EventStream {
        let status = self.try_open_stream(uri, user).await;
        match status {
            Ok(stream) => stream,
            Err(status) => panic!("stream {} rejected with {}", uri, status),
        }
    }

    pub async fn try_open_stream(&self, uri: &str, user: &str) -> Result<EventStream, StatusCode> {
        let request = Request::builder()
            .uri(uri)
            .header("Authorization", format!("Bearer {}", self.token(user)))
            .body(Body::empty())
            .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        if response.status() != StatusCode::OK {
            return Err(response.status());
        }
        Ok(EventStream::new(response.into_body().into_data_stream()))
    }

    // ============================================================================
    // Convenience Action Methods
    // ============================================================================

    /// Sends a challenge and returns the request id
    pub async fn challenge(&self, from: &str, to: &str) -> String {
        let (status, body) = self
            .post("/api/competitions/request", from, json!({ "friendId": to }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "challenge failed: {}", body);
        body["request"]["id"].as_str().unwrap().to_string()
    }

    /// Accepts a challenge and returns the competition id
    pub async fn accept(&self, user: &str, request_id: &str) -> String {
        let (status, body) = self
            .post(
                &format!("/api/competitions/request/{}/accept", request_id),
                user,
                json!({}),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "accept failed: {}", body);
        body["competition"]["id"].as_str().unwrap().to_string()
    }

    /// Challenge plus accept; returns the competition id
    pub async fn start_duel(&self, challenger: &str, opponent: &str) -> String {
        let request_id = self.challenge(challenger, opponent).await;
        self.accept(opponent, &request_id).await
    }

    pub async fn log_set(
        &self,
        user: &str,
        competition_id: &str,
        exercise: &str,
        weight: f64,
        reps: u32,
    ) -> (StatusCode, Value) {
        self.post(
            "/api/workouts/sets",
            user,
            json!({
                "competitionId": competition_id,
                "exercise": exercise,
                "weight": weight,
                "reps": reps,
            }),
        )
        .await
    }

    pub async fn end_duel(&self, user: &str, competition_id: &str) -> (StatusCode, Value) {
        self.post(
            &format!("/api/competitions/{}/end", competition_id),
            user,
            json!({}),
        )
        .await
    }

    /// Starts a solo session and returns its id
    pub async fn start_solo(&self, user: &str, name: Option<&str>) -> String {
        let body = match name {
            Some(name) => json!({ "name": name }),
            None => json!({}),
        };
        let (status, body) = self.post("/api/solo/sessions", user, body).await;
        assert_eq!(status, StatusCode::CREATED, "start failed: {}", body);
        body["session"]["id"].as_str().unwrap().to_string()
    }

    pub async fn log_solo_set(
        &self,
        user: &str,
        session_id: &str,
        exercise: &str,
        weight: f64,
        reps: u32,
    ) -> (StatusCode, Value) {
        self.post(
            "/api/solo/sets",
            user,
            json!({
                "sessionId": session_id,
                "exercise": exercise,
                "weight": weight,
                "reps": reps,
            }),
        )
        .await
    }
}
