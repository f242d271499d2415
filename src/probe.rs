use std::io::{self, Write};

use sonic_rs::Value;

use crate::adapter::{Client, RestError, RestResult};
use crate::config::ProbeConfig;
use crate::report;
use crate::task::TaskRequest;

/// A decoded answer from the intake server, whatever its status.
#[derive(Clone, Debug, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub body: Value,
}

impl Reply {
    pub fn is_accepted(&self) -> bool {
        self.status == 200
    }
}

#[derive(Clone, Debug)]
pub enum Outcome {
    Responded(Reply),
    /// Nothing accepted the connection.
    Unreachable(RestError),
    /// Timeouts, unreadable or non-JSON bodies, and encode failures alike.
    Failed(RestError),
}

#[derive(Clone)]
pub struct Probe {
    client: Client,
    config: ProbeConfig,
}

impl Probe {
    pub fn new(config: ProbeConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: ProbeConfig) -> Self {
        Self { client, config }
    }

    /// Sends `task` exactly once. Never retries.
    pub async fn submit(&self, task: &TaskRequest) -> Outcome {
        match self.exchange(task).await {
            Ok(reply) => {
                tracing::debug!(status = reply.status, "intake server replied");
                Outcome::Responded(reply)
            }
            Err(err) if err.is_connect() => {
                tracing::warn!(endpoint = %self.config.endpoint, error = %err, "intake server unreachable");
                Outcome::Unreachable(err)
            }
            Err(err) => {
                tracing::warn!(kind = ?err.kind(), error = %err, "task submission failed");
                Outcome::Failed(err)
            }
        }
    }

    async fn exchange(&self, task: &TaskRequest) -> RestResult<Reply> {
        let response = self
            .client
            .post_json(self.config.endpoint.as_str(), task, self.config.timeout)
            .await?;
        // Decoded before anything is reported: a non-JSON body is a failure,
        // not a reply.
        let body = response.json::<Value>()?;
        Ok(Reply {
            status: response.status(),
            body,
        })
    }
}

/// Preview, one exchange, then the outcome. The preview is flushed before the
/// request goes out.
pub async fn run<W: Write>(probe: &Probe, task: &TaskRequest, out: &mut W) -> io::Result<Outcome> {
    report::write_preview(out, task)?;
    out.flush()?;
    let outcome = probe.submit(task).await;
    report::write_outcome(out, task, &outcome)?;
    out.flush()?;
    Ok(outcome)
}
