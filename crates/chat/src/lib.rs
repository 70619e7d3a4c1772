//! Chat display layer for product recommendations.
//!
//! - **Blocks** (`blocks`) - typed message blocks and a builder
//! - **Records** (`record`) - parses the upstream `key: value` recommendation text
//! - **Messages** (`messages`) - welcome, recommendation, alternative and error templates
//! - **Conversation** (`conversation`) - ordered chat history and replay
//!
//! Nothing here draws pixels: every template is a serializable [`blocks::MessageTemplate`]
//! that a chat front end renders.

pub mod blocks;
pub mod conversation;
pub mod messages;
pub mod record;

pub use blocks::{Block, MessageBuilder, MessageTemplate};
pub use conversation::{ConversationLog, Role, Turn};
pub use messages::{DisplaySettings, Recommendation, SuggestedAlternative};
pub use record::{parse_recommendation, RecordError};
