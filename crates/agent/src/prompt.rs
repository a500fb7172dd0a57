//! The system prompt sent with every model call.

use kubeclaw_core::provider::ToolDefinition;

const PREAMBLE: &str = "You are a helpful Kubernetes assistant. Your task is to answer questions \
about the state of a Kubernetes cluster in natural language.";

const READ_ONLY_RULES: &str = "You are a read-only assistant and are strictly forbidden from \
performing any destructive actions like deleting resources. If a user asks you to perform a \
destructive action, you must decline and explain that you can only perform read-only operations.";

const LISTING_RULES: &str = "When asked to list resources, reply with only the names the tool \
returned, one per line, with no extra commentary.";

/// Build the system prompt, listing the tools the model may call.
pub fn system_prompt(tools: &[ToolDefinition]) -> String {
    let mut prompt = String::from(PREAMBLE);
    prompt.push_str("\n\nYou have access to the following tools to get information:\n");
    for tool in tools {
        prompt.push_str(&format!("- {}: {}\n", tool.name, tool.description));
    }
    prompt.push('\n');
    prompt.push_str(LISTING_RULES);
    prompt.push_str("\n\n");
    prompt.push_str(READ_ONLY_RULES);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_tools_and_read_only_rules() {
        let tools = vec![ToolDefinition {
            name: "list_pods".into(),
            description: "Lists pod names".into(),
            parameters: serde_json::json!({}),
        }];
        let prompt = system_prompt(&tools);
        assert!(prompt.starts_with("You are a helpful Kubernetes assistant."));
        assert!(prompt.contains("- list_pods: Lists pod names"));
        assert!(prompt.contains("must decline"));
        assert!(prompt.contains("one per line, with no extra commentary"));
    }

    #[test]
    fn empty_catalog_still_has_rules() {
        let prompt = system_prompt(&[]);
        assert!(prompt.contains("read-only"));
    }
}
