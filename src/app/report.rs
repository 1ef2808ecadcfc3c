use crate::domain::model::{RunSummary, StoredMessage};
use crate::domain::ports::DialogueStore;
use crate::utils::error::Result;
use std::fmt::Write;

const BANNER_WIDTH: usize = 80;
const MESSAGE_RULE_WIDTH: usize = 40;

/// Reply banner: a `=` rule, the centered title, another rule, the body and a `-` rule.
pub fn section_banner(title: &str, body: &str) -> String {
    let rule = "=".repeat(BANNER_WIDTH);
    format!(
        "\n{rule}\n{:=^width$}\n{rule}\n{body}\n{}",
        format!(" {} ", title),
        "-".repeat(BANNER_WIDTH),
        width = BANNER_WIDTH,
    )
}

pub fn render_run(run: &RunSummary, messages: &[StoredMessage]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n=== Test: {} ===", run.test_name);
    let _ = writeln!(out, "Time: {}", run.timestamp);

    for msg in messages {
        let _ = writeln!(out, "\nModel: {}", msg.model_name);
        if let Some(aspect) = msg.aspect.as_deref().filter(|a| !a.is_empty()) {
            let _ = writeln!(out, "Aspect: {}", aspect);
        }
        let _ = writeln!(out, "Type: {}", msg.message_type);
        let _ = writeln!(out, "Message: {}", msg.message_content);
        let _ = writeln!(out, "{}", "-".repeat(MESSAGE_RULE_WIDTH));
    }

    out
}

/// The `limit` most recent runs, newest first, with all their messages.
pub fn view_latest<S: DialogueStore + ?Sized>(store: &S, limit: usize) -> Result<String> {
    let runs = store.latest_runs(limit)?;
    tracing::debug!("Rendering {} stored run(s)", runs.len());

    let mut out = String::new();
    for run in &runs {
        let messages = store.get_dialogue(&run.test_name)?;
        out.push_str(&render_run(run, &messages));
    }
    Ok(out)
}
