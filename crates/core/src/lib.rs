//! # KubeClaw Core
//!
//! Domain types, traits, and error definitions for the KubeClaw cluster
//! assistant. This crate has **no framework dependencies**: it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Both external collaborators are traits here:
//! - [`Provider`]: the inference service that proposes tool calls or answers
//! - [`ClusterClient`]: read-only Kubernetes queries
//!
//! Implementations live in their own crates, so the agent loop can be tested
//! with scripted fakes for both.

pub mod cluster;
pub mod error;
pub mod event;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use cluster::{ClusterClient, ContainerState, PodDetails};
pub use error::{ClusterError, Error, ProviderError, RegistryError, Result, ToolError, TurnError};
pub use event::{DomainEvent, EventBus};
pub use message::{Conversation, ConversationId, Message, MessageToolCall, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
pub use tool::{Access, ParamKind, ParamSpec, Tool, ToolArgs, ToolCall, ToolRegistry, ToolResult};
