//! Smoke-test client for a task-intake server: posts one fixed task over a
//! thin reqwest wrapper and reports what came back. The mock transport keeps
//! tests deterministic.

pub mod adapter;
pub mod config;
pub mod logging;
pub mod mock;
pub mod probe;
pub mod report;
pub mod task;

pub use reqwest::Method;

pub use adapter::{
    Client, ReqwestTransport, RestBytes, RestError, RestErrorKind, RestFuture, RestRequest,
    RestResponse, RestResult, RestTransport,
};
pub use config::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT, ProbeConfig};
pub use mock::{MockBehavior, MockBehaviorPlan, MockResponse, MockRestAdapter, MockRestStateSnapshot};
pub use probe::{Outcome, Probe, Reply, run};
pub use task::TaskRequest;
