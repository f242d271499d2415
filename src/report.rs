//! Console rendering of a probe run.

use std::io::{self, Write};

use sonic_rs::Value;

use crate::probe::{Outcome, Reply};
use crate::task::TaskRequest;

pub const SEPARATOR_WIDTH: usize = 50;
pub const START_SERVER_HINT: &str = "uvicorn app.main:app --reload";

pub fn write_preview<W: Write>(out: &mut W, task: &TaskRequest) -> io::Result<()> {
    writeln!(out, "📤 Sending request to local server...")?;
    writeln!(out, "Task: {}", task.task)?;
    writeln!(out, "Brief: {}", task.brief)?;
    writeln!(out, "{}", "-".repeat(SEPARATOR_WIDTH))
}

pub fn write_outcome<W: Write>(out: &mut W, task: &TaskRequest, outcome: &Outcome) -> io::Result<()> {
    match outcome {
        Outcome::Responded(reply) => write_reply(out, task, reply),
        Outcome::Unreachable(_) => {
            writeln!(out, "\n❌ ERROR: Cannot connect to server!")?;
            writeln!(out, "Make sure the server is running:")?;
            writeln!(out, "   {START_SERVER_HINT}")
        }
        Outcome::Failed(err) => writeln!(out, "\n❌ ERROR: {err}"),
    }
}

fn write_reply<W: Write>(out: &mut W, task: &TaskRequest, reply: &Reply) -> io::Result<()> {
    writeln!(out, "\n✅ Status Code: {}", reply.status)?;
    writeln!(out, "📨 Response:")?;
    writeln!(out, "{}", pretty_json(&reply.body)?)?;

    // Only a hint; the repository is created asynchronously and never checked.
    if reply.is_accepted() {
        writeln!(out, "\n🎉 SUCCESS! Your server accepted the request.")?;
        writeln!(out, "⏳ It's now processing in the background...")?;
        writeln!(out, "📂 Check your GitHub account in a few minutes for a new repo!")?;
        writeln!(out, "   Repo name will be: {}", task.task)?;
    }
    Ok(())
}

/// Two-space indented JSON, keys in received order.
pub fn pretty_json(value: &Value) -> io::Result<String> {
    sonic_rs::to_string_pretty(value).map_err(io::Error::other)
}
