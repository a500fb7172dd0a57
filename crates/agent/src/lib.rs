//! The tool-calling conversation loop: the heart of KubeClaw.
//!
//! One question runs through a **Propose → Dispatch → Append** cycle:
//!
//! 1. **Seed** a conversation with the user's question
//! 2. **Propose**: send the conversation and tool catalog to the model
//! 3. **Dispatch**: if the reply proposes tool calls, run each one
//! 4. **Append**: add one tool result per call, loop back to step 2
//! 5. **Answer**: a reply without tool calls is the final answer
//!
//! The phases and their transitions live in [`state`] as a pure function;
//! [`AgentLoop`] only performs the I/O each phase asks for.

pub mod dispatcher;
pub mod loop_runner;
pub mod prompt;
pub mod state;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use dispatcher::Dispatcher;
pub use loop_runner::{AgentLoop, TurnOutcome};
pub use state::{Event, Step, TransitionError, TurnPhase, transition};
