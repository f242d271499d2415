use serde::{Deserialize, Serialize};
use sonic_rs::Value;

/// Shared secret checked by the intake server.
// Replace with the secret from the server's .env file.
pub const USER_SECRET: &str = "ansh2014";

/// Payload accepted by the task-intake endpoint. Field order is wire order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskRequest {
    pub secret: String,
    pub email: String,
    /// Also the name of the repository the server creates.
    pub task: String,
    pub brief: String,
    pub round: u32,
    pub nonce: String,
    pub evaluation_url: String,
    pub checks: Vec<String>,
    pub attachments: Vec<Value>,
}

impl TaskRequest {
    /// The fixed smoke-test task.
    pub fn sample() -> Self {
        Self {
            secret: USER_SECRET.to_string(),
            email: "your-email@example.com".to_string(),
            task: "my-test-app-001".to_string(),
            brief: "Create a simple HTML page with a blue heading that says 'Hello World' \
                    and a button that shows an alert when clicked"
                .to_string(),
            round: 1,
            nonce: "test-12345".to_string(),
            // Placeholder; a real inbox can be taken from webhook.site.
            evaluation_url: "https://webhook.site/#!/view/your-unique-id".to_string(),
            checks: vec![
                "Must have a heading".to_string(),
                "Must have a button".to_string(),
                "Button must be interactive".to_string(),
            ],
            attachments: Vec::new(),
        }
    }
}
