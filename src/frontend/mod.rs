//! Chat front-end lifecycle
//!
//! [`ChatFrontend`] holds one chat session: it greets the user, forwards each
//! message to the agents service, and clears the remote session when the chat
//! ends. It returns text to display rather than printing, so any surface (the
//! `ledger-chat` terminal loop, a web widget) can render it.

use crate::client::{ChatClient, ClientError};
use tracing::{info, warn};
use uuid::Uuid;

/// Shown when the agents service fails its health check
pub const SERVICE_UNAVAILABLE_WARNING: &str =
    "⚠️ Warning: Agents service is not responding. Please check if all services are running.";

/// Shown while waiting for an answer
pub const THINKING_INDICATOR: &str = "🤔 Thinking...";

pub const WELCOME_MESSAGE: &str = r#"👋 Welcome to your Ledger AI Assistant!

I can answer questions about the finances recorded in your GnuCash books:

📊 **Account balances** for any account or group of accounts
💰 **Transactions**, filtered by account, date or description
📈 **Income and expenses** over any period
🔍 **Spending by category** to see where the money goes
💡 **Insights** on trends and changes in your finances

Try asking something like:
- "What is the balance of my checking account?"
- "How much did I spend on groceries last month?"
- "Show my income versus expenses for this year"

What would you like to know?"#;

/// Render an error with the troubleshooting steps shown to the user
pub fn format_error(error: &ClientError) -> String {
    format!(
        "❌ Error communicating with the AI agent.\n\n\
         **Error details:** {}\n\n\
         **Troubleshooting:**\n\
         1. Check if all services are running: `docker compose ps`\n\
         2. Check agents service logs: `docker compose logs agents`\n\
         3. Verify your OPENAI_API_KEY is set correctly\n\n\
         Please try again or contact support if the issue persists.",
        error
    )
}

/// One chat session as seen from the front-end
pub struct ChatFrontend {
    client: ChatClient,
    session_id: String,
}

impl ChatFrontend {
    /// Start a chat with a freshly generated session id
    pub fn new(client: ChatClient) -> Self {
        Self::with_session_id(client, Uuid::new_v4().to_string())
    }

    pub fn with_session_id(client: ChatClient, session_id: impl Into<String>) -> Self {
        Self {
            client,
            session_id: session_id.into(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Greeting for a new chat: the welcome text, or a warning if the service
    /// is down
    pub async fn on_chat_start(&self) -> String {
        info!(session_id = %self.session_id, "Chat started");
        if self.client.health_check().await {
            WELCOME_MESSAGE.to_string()
        } else {
            SERVICE_UNAVAILABLE_WARNING.to_string()
        }
    }

    /// Forward a user message and return what to display
    pub async fn on_message(&self, message: &str) -> String {
        match self.client.send_message(message, &self.session_id).await {
            Ok(response) => response,
            Err(e) => {
                warn!(session_id = %self.session_id, error = %e, "Chat message failed");
                format_error(&e)
            }
        }
    }

    /// Release the remote session. Failures are logged and otherwise ignored.
    pub async fn on_chat_end(&self) {
        match self.client.clear_session(&self.session_id).await {
            Ok(()) => info!(session_id = %self.session_id, "Chat ended"),
            Err(e) => warn!(
                session_id = %self.session_id,
                error = %e,
                "Failed to clear remote session"
            ),
        }
    }
}
