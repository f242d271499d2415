use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use bytes::Bytes;
use serde::Serialize;

use super::adapter::{
    RestBytes, RestError, RestFuture, RestRequest, RestResponse, RestResult, RestTransport,
};

/// Scripted transport-level behavior for the next request.
#[derive(Clone, Debug, Default)]
pub enum MockBehavior {
    #[default]
    Pass,
    /// Answer from the response queue after sleeping; `Delay` longer than
    /// the request timeout surfaces as a timeout.
    Delay(Duration),
    ConnectError {
        reason: String,
    },
    TimeoutError {
        reason: String,
    },
    ReceiveError {
        reason: String,
    },
}

impl MockBehavior {
    pub fn pass() -> Self {
        Self::Pass
    }

    pub fn delay(ms: u64) -> Self {
        Self::Delay(Duration::from_millis(ms))
    }

    pub fn connect_error(reason: impl Into<String>) -> Self {
        Self::ConnectError {
            reason: reason.into(),
        }
    }

    pub fn timeout_error(reason: impl Into<String>) -> Self {
        Self::TimeoutError {
            reason: reason.into(),
        }
    }

    pub fn receive_error(reason: impl Into<String>) -> Self {
        Self::ReceiveError {
            reason: reason.into(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct MockBehaviorPlan {
    request: VecDeque<MockBehavior>,
}

impl MockBehaviorPlan {
    pub fn push(&mut self, behavior: MockBehavior) -> &mut Self {
        self.request.push_back(behavior);
        self
    }

    fn pop(&mut self) -> MockBehavior {
        self.request.pop_front().unwrap_or_default()
    }
}

#[derive(Clone, Debug)]
pub struct MockResponse {
    pub status: u16,
    pub headers: Vec<(String, RestBytes)>,
    pub body: RestBytes,
}

impl MockResponse {
    pub fn new(status: u16, body: impl Into<RestBytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<RestBytes>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, body.into())
    }

    pub fn json<T: Serialize>(status: u16, payload: &T) -> RestResult<Self> {
        let body = sonic_rs::to_vec(payload).map_err(RestError::from_encode)?;
        Ok(Self::new(status, body).with_header("content-type", "application/json"))
    }
}

#[derive(Clone, Debug)]
pub struct MockRestStateSnapshot {
    pub request_count: usize,
    pub last_url: Option<String>,
    pub last_status: Option<u16>,
    pub last_error: Option<String>,
    pub behavior_remaining: usize,
    pub response_queue_len: usize,
}

#[derive(Debug, Default)]
struct MockRestAdapterState {
    request_count: usize,
    last_url: Option<String>,
    last_status: Option<u16>,
    last_error: Option<String>,
    behavior_plan: MockBehaviorPlan,
    response_queue: VecDeque<MockResponse>,
    outbound_log: Vec<RestRequest>,
}

impl MockRestAdapterState {
    fn snapshot(&self) -> MockRestStateSnapshot {
        MockRestStateSnapshot {
            request_count: self.request_count,
            last_url: self.last_url.clone(),
            last_status: self.last_status,
            last_error: self.last_error.clone(),
            behavior_remaining: self.behavior_plan.request.len(),
            response_queue_len: self.response_queue.len(),
        }
    }
}

/// In-memory transport that records every outbound request and answers from
/// a queue. An empty queue answers `200` with an empty body.
#[derive(Clone, Debug, Default)]
pub struct MockRestAdapter {
    state: Arc<Mutex<MockRestAdapterState>>,
}

impl MockRestAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_behavior_plan(behavior_plan: MockBehaviorPlan) -> Self {
        let state = MockRestAdapterState {
            behavior_plan,
            ..MockRestAdapterState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn with_behavior(behavior: MockBehavior) -> Self {
        let mut plan = MockBehaviorPlan::default();
        plan.push(behavior);
        Self::with_behavior_plan(plan)
    }

    pub fn snapshot(&self) -> MockRestStateSnapshot {
        self.state
            .lock()
            .expect("mock-restapi mutex poisoned while taking snapshot")
            .snapshot()
    }

    pub fn queue_response(&self, response: MockResponse) {
        self.state
            .lock()
            .expect("mock-restapi mutex poisoned while queueing response")
            .response_queue
            .push_back(response);
    }

    pub fn queue_json<T: Serialize>(&self, status: u16, payload: &T) -> RestResult<()> {
        self.queue_response(MockResponse::json(status, payload)?);
        Ok(())
    }

    pub fn outbound_count(&self) -> usize {
        self.state
            .lock()
            .expect("mock-restapi mutex poisoned while reading outbound count")
            .outbound_log
            .len()
    }

    pub fn last_request(&self) -> Option<RestRequest> {
        self.state
            .lock()
            .expect("mock-restapi mutex poisoned while reading outbound log")
            .outbound_log
            .last()
            .cloned()
    }

    fn begin(&self, request: &RestRequest) -> MockBehavior {
        let mut state = self
            .state
            .lock()
            .expect("mock-restapi mutex poisoned while updating state before execute");
        state.request_count += 1;
        state.last_url = Some(request.url.clone());
        state.last_error = None;
        state.outbound_log.push(request.clone());
        state.behavior_plan.pop()
    }

    fn fail(&self, error: RestError) -> RestError {
        let mut state = self
            .state
            .lock()
            .expect("mock-restapi mutex poisoned while recording error");
        state.last_error = Some(error.message.clone());
        state.last_status = error.status;
        error
    }

    fn respond(&self, start: Instant) -> RestResponse {
        let mut state = self
            .state
            .lock()
            .expect("mock-restapi mutex poisoned while selecting response");
        let response = state
            .response_queue
            .pop_front()
            .unwrap_or_else(|| MockResponse::new(200, Bytes::new()));
        state.last_status = Some(response.status);
        RestResponse {
            status: response.status,
            headers: response.headers,
            body: response.body,
            elapsed: start.elapsed(),
        }
    }
}

impl RestTransport for MockRestAdapter {
    fn execute(&self, request: RestRequest) -> RestFuture<RestResult<RestResponse>> {
        let adapter = self.clone();
        Box::pin(async move {
            let start = Instant::now();
            let behavior = adapter.begin(&request);

            match behavior {
                MockBehavior::ConnectError { reason } => {
                    return Err(adapter.fail(RestError::connect(reason)));
                }
                MockBehavior::TimeoutError { reason } => {
                    return Err(adapter.fail(RestError::timeout(reason)));
                }
                MockBehavior::ReceiveError { reason } => {
                    return Err(adapter.fail(RestError::receive(reason)));
                }
                MockBehavior::Delay(duration) => {
                    if let Some(timeout) = request.timeout.filter(|timeout| duration > *timeout) {
                        std::thread::sleep(timeout);
                        return Err(adapter.fail(RestError::timeout(format!(
                            "mock transport timed out after {timeout:?}"
                        ))));
                    }
                    std::thread::sleep(duration);
                }
                MockBehavior::Pass => {}
            }

            Ok(adapter.respond(start))
        })
    }
}
