//! The conversation controller.
//!
//! One request/response cycle per submission: the user's turn goes into the
//! transcript and onto the surface right away, a pending indicator is shown,
//! and when the reply settles the indicator is swapped for the reply (or an
//! apology). The transcript and surface are only touched here, on the
//! caller's thread; the network call itself is handed out as a
//! [`PendingReply`] so the caller decides where to await it.

use anyhow::Result;

use crate::ai::{ChatClient, ExchangeError};
use crate::config::Config;
use crate::state::{ChatMessage, Transcript};
use crate::surface::{Entry, Surface};
use crate::truncation;

/// Shown in place of a reply when the exchange fails for any reason.
pub const APOLOGY: &str = "Sorry, I'm having trouble connecting right now. Please try again!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// A reply is in flight; further submissions are refused
    Pending,
}

/// A request that has been recorded but not yet sent.
#[derive(Clone)]
pub struct PendingReply {
    client: ChatClient,
    messages: Vec<ChatMessage>,
}

impl PendingReply {
    /// The conversation as it stood at submission, system prompt first.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub async fn resolve(self) -> Result<String, ExchangeError> {
        self.client.complete(&self.messages).await
    }
}

pub enum Submission {
    /// Input was blank; nothing happened
    Empty,
    /// A reply is still pending; nothing happened
    Busy,
    Dispatched(PendingReply),
}

/// How a settled exchange ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Turn {
    Replied {
        /// Exactly what the endpoint returned (what the transcript stores)
        reply: String,
        /// What the surface shows, possibly with a truncation caveat
        displayed: String,
    },
    Failed,
}

pub struct Conversation<S: Surface> {
    client: ChatClient,
    transcript: Transcript,
    surface: S,
    truncation_hint: bool,
    phase: Phase,
}

impl<S: Surface> Conversation<S> {
    pub fn new(client: ChatClient, system_prompt: impl Into<String>, surface: S) -> Self {
        Self {
            client,
            transcript: Transcript::new(system_prompt),
            surface,
            truncation_hint: false,
            phase: Phase::Idle,
        }
    }

    /// Build from config, showing the configured greeting if there is one.
    pub fn from_config(config: &Config, surface: S) -> Result<Self> {
        let mut conversation = Self::new(config.client()?, config.system_prompt.clone(), surface)
            .with_truncation_hint(config.truncation_hint);
        if let Some(greeting) = config.greeting() {
            conversation.greet(greeting);
        }
        Ok(conversation)
    }

    pub fn with_truncation_hint(mut self, enabled: bool) -> Self {
        self.truncation_hint = enabled;
        self
    }

    /// Show an assistant entry that is not part of the transcript.
    pub fn greet(&mut self, text: &str) {
        self.surface.append(Entry::assistant(text));
        self.surface.scroll_to_bottom();
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn client(&self) -> &ChatClient {
        &self.client
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_pending(&self) -> bool {
        self.phase == Phase::Pending
    }

    /// Record the user's turn and hand back the request to send.
    ///
    /// Blank input leaves `input` untouched. On dispatch `input` is cleared.
    pub fn submit(&mut self, input: &mut String) -> Submission {
        let text = input.trim();
        if text.is_empty() {
            return Submission::Empty;
        }
        if self.is_pending() {
            tracing::debug!("submission refused while a reply is pending");
            return Submission::Busy;
        }

        let text = text.to_string();
        input.clear();

        self.surface.append(Entry::user(text.clone()));
        self.transcript.push_user(text);
        self.surface.append(Entry::pending());
        self.surface.scroll_to_bottom();
        self.phase = Phase::Pending;

        tracing::debug!(turns = self.transcript.turn_count(), "dispatching chat request");
        Submission::Dispatched(PendingReply {
            client: self.client.clone(),
            messages: self.transcript.messages().to_vec(),
        })
    }

    /// Apply the outcome of the request returned by [`Self::submit`].
    pub fn settle(&mut self, outcome: Result<String, ExchangeError>) -> Turn {
        self.phase = Phase::Idle;

        if self.surface.last().is_some_and(|e| e.kind.is_transient()) {
            self.surface.remove_last();
        } else {
            tracing::warn!("settled a reply with no pending indicator on screen");
        }

        let turn = match outcome {
            Ok(reply) => {
                let displayed = if self.truncation_hint {
                    truncation::annotate(&reply)
                } else {
                    reply.clone()
                };
                self.surface.append(Entry::assistant(displayed.clone()));
                self.transcript.push_assistant(reply.clone());
                Turn::Replied { reply, displayed }
            }
            Err(err) => {
                tracing::warn!(kind = ?err.kind(), error = %err, "chat exchange failed");
                self.surface.append(Entry::assistant(APOLOGY));
                Turn::Failed
            }
        };

        self.surface.scroll_to_bottom();
        turn
    }

    /// Submit, wait for the reply, and settle it. `None` if nothing was sent.
    pub async fn exchange(&mut self, input: &mut String) -> Option<Turn> {
        match self.submit(input) {
            Submission::Dispatched(pending) => {
                let outcome = pending.resolve().await;
                Some(self.settle(outcome))
            }
            Submission::Empty | Submission::Busy => None,
        }
    }
}
