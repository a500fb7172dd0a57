//! `kubeclaw ask`: Answer one question from the terminal.

use kubeclaw_core::message::{Conversation, Message, Role};

pub async fn run(question: &str, transcript: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    super::require_api_key(&config)?;

    let agent = kubeclaw_gateway::build_agent(&config).await?;

    eprint!("  Thinking...");
    let outcome = agent.run(question).await;
    eprint!("\r              \r");
    let outcome = outcome?;

    if transcript {
        print_transcript(&outcome.conversation);
        println!();
    }
    println!("{}", outcome.answer);

    Ok(())
}

fn print_transcript(conversation: &Conversation) {
    for message in conversation.messages() {
        println!("{}", describe(message));
    }
}

fn describe(message: &Message) -> String {
    match message.role {
        Role::User => format!("[user] {}", message.text()),
        Role::Assistant if message.has_tool_calls() => {
            let calls: Vec<String> = message
                .tool_calls
                .iter()
                .map(|c| format!("{}({})", c.name, c.arguments))
                .collect();
            format!("[assistant] calls {}", calls.join(", "))
        }
        Role::Assistant => format!("[assistant] {}", message.text()),
        Role::Tool => {
            let marker = if message.is_error { "tool error" } else { "tool" };
            format!(
                "[{marker} {}] {}",
                message.tool_call_id.as_deref().unwrap_or("?"),
                message.text()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kubeclaw_core::message::MessageToolCall;

    #[test]
    fn describes_each_role() {
        assert_eq!(describe(&Message::user("list pods")), "[user] list pods");
        assert_eq!(describe(&Message::assistant("web-1")), "[assistant] web-1");

        let calls = Message::assistant_with_calls(
            None,
            vec![MessageToolCall {
                id: "c1".into(),
                name: "list_pods".into(),
                arguments: r#"{"namespace":"demo"}"#.into(),
            }],
        );
        assert_eq!(
            describe(&calls),
            r#"[assistant] calls list_pods({"namespace":"demo"})"#
        );

        let failed = Message::tool_result("c2", "tool 'delete_pod' not found", false);
        assert_eq!(
            describe(&failed),
            "[tool error c2] tool 'delete_pod' not found"
        );
    }
}
