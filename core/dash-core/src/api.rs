//! Typed operations over the ledger API.

use crate::error::TransportError;
use crate::transport::{interpret_response, ApiRequest, Transport};
use nightwatch_protocol::{
    Endpoint, NewTask, NotesUpdate, RecordId, Shift, StartShiftResponse, SystemSnapshot, Task,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug)]
pub struct ApiClient<T: Transport> {
    transport: T,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Single attempt at one endpoint. `None` means the server sent no content.
    pub async fn call(
        &self,
        endpoint: Endpoint,
        body: Option<Value>,
    ) -> Result<Option<Value>, TransportError> {
        tracing::debug!(method = %endpoint.method, path = %endpoint.path, "API request");
        let request = ApiRequest { endpoint, body };
        let response = self.transport.send(request).await?;
        interpret_response(response)
    }

    async fn call_optional<R: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        body: Option<Value>,
    ) -> Result<Option<R>, TransportError> {
        let context = endpoint.to_string();
        match self.call(endpoint, body).await? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|err| TransportError::Decode {
                    context,
                    details: err.to_string(),
                }),
            None => Ok(None),
        }
    }

    async fn call_required<R: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        body: Option<Value>,
    ) -> Result<R, TransportError> {
        let context = endpoint.to_string();
        self.call_optional(endpoint, body)
            .await?
            .ok_or_else(|| TransportError::Decode {
                context,
                details: "empty response body".to_string(),
            })
    }

    pub async fn current_shift(&self) -> Result<Option<Shift>, TransportError> {
        self.call_optional(Endpoint::current_shift(), None).await
    }

    pub async fn start_shift(&self) -> Result<StartShiftResponse, TransportError> {
        self.call_required(Endpoint::start_shift(), Some(empty_object()))
            .await
    }

    /// The response (ended shift or ack) is ignored; callers re-fetch.
    pub async fn end_shift(&self) -> Result<(), TransportError> {
        self.call(Endpoint::end_shift(), Some(empty_object()))
            .await
            .map(|_| ())
    }

    pub async fn save_notes(&self, shift_id: &RecordId, notes: &str) -> Result<Shift, TransportError> {
        let body = to_body(&NotesUpdate {
            notes: notes.to_string(),
        })?;
        self.call_required(Endpoint::shift_notes(shift_id), Some(body))
            .await
    }

    pub async fn current_tasks(&self) -> Result<Vec<Task>, TransportError> {
        Ok(self
            .call_optional(Endpoint::current_tasks(), None)
            .await?
            .unwrap_or_default())
    }

    /// The created task is ignored; its identity arrives with the next refresh.
    pub async fn create_task(&self, title: &str) -> Result<(), TransportError> {
        let body = to_body(&NewTask {
            title: title.to_string(),
        })?;
        self.call(Endpoint::create_task(), Some(body))
            .await
            .map(|_| ())
    }

    pub async fn set_task_completed(
        &self,
        task_id: &RecordId,
        completed: bool,
    ) -> Result<(), TransportError> {
        let endpoint = if completed {
            Endpoint::complete_task(task_id)
        } else {
            Endpoint::reopen_task(task_id)
        };
        self.call(endpoint, None).await.map(|_| ())
    }

    pub async fn delete_task(&self, task_id: &RecordId) -> Result<(), TransportError> {
        self.call(Endpoint::delete_task(task_id), None)
            .await
            .map(|_| ())
    }

    pub async fn system(&self) -> Result<SystemSnapshot, TransportError> {
        self.call_required(Endpoint::system(), None).await
    }
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

fn to_body<B: Serialize>(body: &B) -> Result<Value, TransportError> {
    serde_json::to_value(body)
        .map_err(|err| TransportError::Network(format!("Failed to serialize request: {}", err)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Reply, ScriptedTransport};

    #[tokio::test]
    async fn current_shift_null_is_none() {
        let transport = ScriptedTransport::new();
        transport.respond(Endpoint::current_shift(), Reply::json(serde_json::json!(null)));
        let api = ApiClient::new(transport);

        assert_eq!(api.current_shift().await, Ok(None));
    }

    #[tokio::test]
    async fn start_shift_posts_empty_object() {
        let transport = ScriptedTransport::new();
        transport.respond(
            Endpoint::start_shift(),
            Reply::json(serde_json::json!({
                "shift": {"id": 1, "started_at": "2024-01-01T00:00:00"}
            })),
        );
        let api = ApiClient::new(transport);

        let response = api.start_shift().await.unwrap();
        assert_eq!(response.shift.id.as_str(), "1");

        let requests = api.transport().requests();
        assert_eq!(requests[0].body, Some(serde_json::json!({})));
    }

    #[tokio::test]
    async fn save_notes_sends_notes_body_to_shift_path() {
        let transport = ScriptedTransport::new();
        let id = RecordId::from("s1");
        transport.respond(
            Endpoint::shift_notes(&id),
            Reply::json(serde_json::json!({
                "id": "s1", "started_at": "2024-01-01T00:00:00Z", "notes": "pump 3 noisy"
            })),
        );
        let api = ApiClient::new(transport);

        let shift = api.save_notes(&id, "pump 3 noisy").await.unwrap();
        assert_eq!(shift.notes, "pump 3 noisy");
        assert_eq!(
            api.transport().requests()[0].body,
            Some(serde_json::json!({"notes": "pump 3 noisy"}))
        );
    }

    #[tokio::test]
    async fn set_task_completed_picks_endpoint() {
        let transport = ScriptedTransport::new();
        let id = RecordId::from("t1");
        transport.respond(Endpoint::complete_task(&id), Reply::no_content());
        transport.respond(Endpoint::reopen_task(&id), Reply::no_content());
        let api = ApiClient::new(transport);

        api.set_task_completed(&id, true).await.unwrap();
        api.set_task_completed(&id, false).await.unwrap();

        let paths: Vec<String> = api
            .transport()
            .requests()
            .into_iter()
            .map(|request| request.endpoint.path)
            .collect();
        assert_eq!(paths, vec!["/api/tasks/t1/complete", "/api/tasks/t1/reopen"]);
    }

    #[tokio::test]
    async fn system_with_empty_body_is_decode_error() {
        let transport = ScriptedTransport::new();
        transport.respond(Endpoint::system(), Reply::no_content());
        let api = ApiClient::new(transport);

        assert!(matches!(
            api.system().await,
            Err(TransportError::Decode { .. })
        ));
    }

    #[tokio::test]
    async fn wrong_shape_is_decode_error_with_endpoint_context() {
        let transport = ScriptedTransport::new();
        transport.respond(
            Endpoint::current_tasks(),
            Reply::json(serde_json::json!({"tasks": []})),
        );
        let api = ApiClient::new(transport);

        match api.current_tasks().await {
            Err(TransportError::Decode { context, .. }) => {
                assert_eq!(context, "GET /api/tasks/current")
            }
            other => panic!("expected decode error, got {:?}", other),
        }
    }
}
