use std::io;

use task_intake_probe::{Probe, ProbeConfig, TaskRequest, logging, run};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    logging::init();

    let task = TaskRequest::sample();
    let probe = Probe::new(ProbeConfig::default());
    let mut stdout = io::stdout().lock();

    // Every outcome is reported on stdout; the exit status stays zero.
    if let Err(err) = run(&probe, &task, &mut stdout).await {
        tracing::error!(error = %err, "failed to write report");
    }
}
