//! Sending one query to a built agent and collecting what it printed.

use super::DispatchError;
use crate::agent::Agent;
use crate::output::{Console, RenderCallback};

/// Run `query` on `agent` with `console` captured, returning the captured
/// text: the tool-call trace followed by the response.
///
/// `on_render` receives the accumulated text after every write, so a caller
/// streaming the response can show it before the call completes. The console
/// is restored on every exit path, including when the future is dropped.
pub async fn dispatch_query(
    agent: &Agent,
    query: &str,
    console: &Console,
    stream: bool,
    on_render: Option<RenderCallback>,
) -> Result<String, DispatchError> {
    if query.trim().is_empty() {
        return Err(DispatchError::EmptyQuery);
    }

    let capture = console.capture(on_render);
    agent.print_response(query, stream, console).await?;
    Ok(capture.finish())
}
