// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jason Ish

//! Session controller.
//!
//! Drives the Selecting -> Active -> Selecting loop. While a conversation is
//! active, inbound messages from its subscription and submitted input lines
//! are multiplexed on one task. Only an interrupt reaches Terminated.

use std::future::Future;

use tokio::sync::mpsc;

use crate::backend::{Backend, SubscriptionToken};
use crate::commands::{self, Dispatcher, Flow, QUIT_SENTINEL};
use crate::config::Config;
use crate::error::Result;
use crate::model::{Conversation, ConversationId, Message, Participant};
use crate::output::{self, OutputContext};
use crate::render::{RenderOptions, Renderer};
use crate::roster::Index;

/// One unit of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum InputEvent {
    Line(String),
    /// Top-level cancellation (Ctrl+C, or end of input).
    Interrupt,
}

/// Where user input comes from.
///
/// `next_line` is raced against inbound messages and may be dropped before it
/// completes. Implementations must keep partial input in `self`, not in the
/// future.
pub(crate) trait InputSource {
    /// Read the numeric conversation choice.
    fn menu_choice(&mut self) -> impl Future<Output = Result<InputEvent>>;

    /// Read the next line to send. `index` backs completion.
    fn next_line(&mut self, index: &Index) -> impl Future<Output = Result<InputEvent>>;
}

#[derive(Debug)]
enum State {
    Selecting,
    Active(Conversation, Index),
    Terminated,
}

/// The live subscription of the active conversation. At most one exists.
struct ActiveSubscription {
    token: SubscriptionToken,
    conversation: ConversationId,
    inbound: mpsc::UnboundedReceiver<Message>,
}

/// Parse a 1-based menu choice into an index below `len`.
pub(crate) fn parse_choice(input: &str, len: usize) -> std::result::Result<usize, &'static str> {
    let n: i64 = input
        .trim()
        .parse()
        .map_err(|_| "Please enter a valid number.")?;
    if n >= 1 && (n as u64) <= len as u64 {
        Ok(n as usize - 1)
    } else {
        Err("Invalid number.")
    }
}

fn account_name(me: &Participant) -> String {
    if let Some(handle) = me.handle() {
        return handle.to_string();
    }
    match me.first_name.as_deref().filter(|n| !n.is_empty()) {
        Some(name) => name.to_string(),
        None => me.id.to_string(),
    }
}

enum Step {
    Inbound(Option<Message>),
    Input(Result<InputEvent>),
}

pub(crate) struct Session<'a, B, I> {
    backend: &'a B,
    input: I,
    renderer: Renderer<'a, B>,
    output: OutputContext,
    history_limit: usize,
    dialog_limit: usize,
    subscription: Option<ActiveSubscription>,
}

impl<'a, B: Backend, I: InputSource> Session<'a, B, I> {
    pub(crate) fn new(backend: &'a B, input: I, config: &Config, output: OutputContext) -> Self {
        Self {
            backend,
            input,
            renderer: Renderer::new(backend, RenderOptions::from(config), output.clone()),
            output,
            history_limit: config.history_limit,
            dialog_limit: config.dialog_limit,
            subscription: None,
        }
    }

    /// Run until interrupted. A backend failure outside a single action ends
    /// the session; it is reported here before the farewell.
    pub(crate) async fn run(&mut self) -> Result<()> {
        let result = self.drive().await;
        self.release().await;
        if let Err(e) = &result {
            tracing::error!(error = %e, "Session failed");
            output::print_error(&self.output, &format!("Error: {e}"));
        }
        output::print_info(&self.output, "byebye!");
        result
    }

    async fn drive(&mut self) -> Result<()> {
        let me = self.backend.me().await?;
        output::print_info(&self.output, &format!("Logged in as: {}", account_name(&me)));

        let mut state = State::Selecting;
        loop {
            state = match state {
                State::Selecting => self.select().await?,
                State::Active(conversation, index) => self.active(conversation, index).await?,
                State::Terminated => return Ok(()),
            };
        }
    }

    async fn select(&mut self) -> Result<State> {
        let conversations: Vec<Conversation> = self
            .backend
            .conversations(self.dialog_limit)
            .await?
            .into_iter()
            .filter(Conversation::is_listable)
            .collect();

        if conversations.is_empty() {
            output::print_notice(&self.output, "No chats available.");
        } else {
            output::print_info(&self.output, "Your recent chats:");
        }
        for (idx, conversation) in conversations.iter().enumerate() {
            output::print_info(
                &self.output,
                &format!("{}. {}", idx + 1, conversation.title()),
            );
        }

        loop {
            let line = match self.input.menu_choice().await {
                Ok(InputEvent::Line(line)) => line,
                Ok(InputEvent::Interrupt) => return Ok(State::Terminated),
                Err(e) if e.is_interrupt() => return Ok(State::Terminated),
                Err(e) => return Err(e),
            };
            match parse_choice(&line, conversations.len()) {
                Ok(idx) => return self.enter(conversations[idx].clone()).await,
                Err(reason) => output::print_notice(&self.output, reason),
            }
        }
    }

    /// Build the index, print history, and subscribe. Any failure goes back to
    /// the menu.
    async fn enter(&mut self, conversation: Conversation) -> Result<State> {
        // Built once per entry. Not refreshed while the conversation is active.
        let (index, history) = match Index::build(self.backend, &conversation, self.history_limit)
            .await
        {
            Ok(built) => built,
            Err(e) => {
                tracing::warn!(conversation = conversation.id, error = %e, "Failed to open chat");
                output::print_error(&self.output, &format!("Failed to open chat: {e}"));
                return Ok(State::Selecting);
            }
        };

        output::print_info(
            &self.output,
            &format!("Joined chat: {}", conversation.title()),
        );
        output::print_info(&self.output, &format!("Type '{QUIT_SENTINEL}' to quit."));
        for message in history.iter().rev() {
            let line = self.renderer.render(conversation.id, message).await;
            output::print_message(&self.output, &line);
        }

        if let Err(e) = self.resubscribe(conversation.id).await {
            tracing::warn!(conversation = conversation.id, error = %e, "Subscribe failed");
            output::print_error(&self.output, &format!("Failed to open chat: {e}"));
            return Ok(State::Selecting);
        }
        Ok(State::Active(conversation, index))
    }

    /// Replace the active subscription: the old one is torn down before the
    /// new one is created.
    async fn resubscribe(&mut self, conversation: ConversationId) -> Result<()> {
        self.release().await;

        let (tx, rx) = mpsc::unbounded_channel();
        let token = self.backend.subscribe(conversation, tx).await?;
        tracing::debug!(conversation, token = token.id(), "Subscribed");
        self.subscription = Some(ActiveSubscription {
            token,
            conversation,
            inbound: rx,
        });
        Ok(())
    }

    /// Drop the active subscription, if any.
    async fn release(&mut self) {
        let Some(sub) = self.subscription.take() else {
            return;
        };
        let id = sub.token.id();
        if let Err(e) = self.backend.unsubscribe(sub.token).await {
            tracing::warn!(
                conversation = sub.conversation,
                token = id,
                error = %e,
                "Unsubscribe failed"
            );
        } else {
            tracing::debug!(conversation = sub.conversation, token = id, "Unsubscribed");
        }
    }

    async fn active(&mut self, conversation: Conversation, index: Index) -> Result<State> {
        loop {
            let Some(sub) = self.subscription.as_mut() else {
                return Ok(State::Selecting);
            };

            let step = tokio::select! {
                biased;
                message = sub.inbound.recv() => Step::Inbound(message),
                event = self.input.next_line(&index) => Step::Input(event),
            };

            match step {
                Step::Inbound(Some(message)) => {
                    let line = self.renderer.render(conversation.id, &message).await;
                    output::print_message(&self.output, &line);
                }
                Step::Inbound(None) => {
                    output::print_error(&self.output, "Lost connection to chat.");
                    self.release().await;
                    return Ok(State::Selecting);
                }
                Step::Input(Ok(InputEvent::Interrupt)) => return Ok(State::Terminated),
                Step::Input(Err(e)) if e.is_interrupt() => return Ok(State::Terminated),
                Step::Input(Err(e)) => return Err(e),
                Step::Input(Ok(InputEvent::Line(line))) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let dispatcher =
                        Dispatcher::new(self.backend, &self.renderer, &self.output, &conversation);
                    if dispatcher.execute(commands::classify(&line)).await == Flow::Quit {
                        self.release().await;
                        output::print_info(&self.output, "Returning to chat list...");
                        return Ok(State::Selecting);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::backend::memory::testing::*;
    use crate::backend::memory::{MemoryBackend, Op};
    use crate::model::ConversationKind;
    use crate::output::testing::recording;

    enum Script {
        Line(&'static str),
        Interrupt,
        /// Push a message through the backend as if it just arrived.
        Deliver(Message),
        /// Assert the conversations that currently hold a subscription.
        Subscribed(Vec<ConversationId>),
    }

    struct ScriptedInput {
        backend: MemoryBackend,
        script: VecDeque<Script>,
        completions: Vec<Vec<String>>,
    }

    impl ScriptedInput {
        fn new(backend: &MemoryBackend, script: Vec<Script>) -> Self {
            Self {
                backend: backend.clone(),
                script: script.into(),
                completions: Vec::new(),
            }
        }

        async fn next(&mut self) -> Result<InputEvent> {
            loop {
                match self.script.pop_front() {
                    Some(Script::Line(line)) => return Ok(InputEvent::Line(line.to_string())),
                    Some(Script::Interrupt) | None => return Ok(InputEvent::Interrupt),
                    Some(Script::Deliver(message)) => {
                        self.backend.deliver(message)?;
                        // Let the inbound branch win the race.
                        tokio::task::yield_now().await;
                    }
                    Some(Script::Subscribed(expected)) => {
                        assert_eq!(self.backend.active_subscriptions(), expected);
                    }
                }
            }
        }
    }

    impl InputSource for ScriptedInput {
        async fn menu_choice(&mut self) -> Result<InputEvent> {
            self.next().await
        }

        async fn next_line(&mut self, index: &Index) -> Result<InputEvent> {
            self.completions.push(index.handles().to_vec());
            self.next().await
        }
    }

    fn config() -> Config {
        Config {
            auto_download_image: false,
            ascii_color: false,
            ..Config::default()
        }
    }

    async fn run(backend: &MemoryBackend, script: Vec<Script>) -> Vec<String> {
        let (output, listener) = recording();
        let input = ScriptedInput::new(backend, script);
        let mut session = Session::new(backend, input, &config(), output);
        session.run().await.unwrap();
        listener.lines()
    }

    #[test]
    fn test_parse_choice() {
        assert_eq!(parse_choice("1", 3), Ok(0));
        assert_eq!(parse_choice(" 3 ", 3), Ok(2));
        assert_eq!(parse_choice("0", 3), Err("Invalid number."));
        assert_eq!(parse_choice("4", 3), Err("Invalid number."));
        assert_eq!(parse_choice("-1", 3), Err("Invalid number."));
        assert_eq!(parse_choice("two", 3), Err("Please enter a valid number."));
        assert_eq!(parse_choice("", 3), Err("Please enter a valid number."));
    }

    #[tokio::test]
    async fn test_join_prints_history_oldest_first() {
        let backend = backend();
        let lines = run(&backend, vec![Script::Line("1"), Script::Interrupt]).await;

        assert_eq!(
            lines,
            vec![
                "Logged in as: me",
                "Your recent chats:",
                "1. Rustaceans",
                "2. Off-topic",
                "Joined chat: Rustaceans",
                "Type ':wq' to quit.",
                "[10] Alice (alice): hello",
                "[11] bob: hi alice",
                "[12] Alice (alice): how are you?",
                "byebye!",
            ]
        );
        assert!(backend.active_subscriptions().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_menu_input_reprompts() {
        let backend = backend();
        let lines = run(
            &backend,
            vec![Script::Line("abc"), Script::Line("9"), Script::Interrupt],
        )
        .await;

        assert!(lines.contains(&"Please enter a valid number.".to_string()));
        assert!(lines.contains(&"Invalid number.".to_string()));
        assert!(!lines.iter().any(|l| l.starts_with("Joined chat")));
        assert_eq!(lines.last().unwrap(), "byebye!");
    }

    #[tokio::test]
    async fn test_unlisted_conversations_are_hidden() {
        let backend = backend();
        backend.add_conversation(
            Conversation {
                id: 300,
                name: "Announcements".into(),
                kind: ConversationKind::Broadcast,
                peer: None,
                restricted: false,
                megagroup: false,
            },
            vec![ME],
        );
        let lines = run(&backend, vec![Script::Line("3"), Script::Interrupt]).await;

        assert!(!lines.iter().any(|l| l.contains("Announcements")));
        assert!(lines.contains(&"Invalid number.".to_string()));
    }

    #[tokio::test]
    async fn test_direct_chat_with_bot_is_hidden() {
        let backend = backend();
        backend.add_user(Participant {
            id: 5,
            handle: Some("weatherbot".into()),
            bot: true,
            ..Participant::default()
        });
        backend.add_conversation(
            Conversation {
                id: 300,
                name: "Weather".into(),
                kind: ConversationKind::Direct,
                peer: None,
                restricted: false,
                megagroup: false,
            },
            vec![ME, 5],
        );
        let lines = run(&backend, vec![Script::Interrupt]).await;

        assert!(!lines.iter().any(|l| l.contains("Weather")));
        assert!(lines.contains(&"2. Off-topic".to_string()));
    }

    #[tokio::test]
    async fn test_empty_menu_reprompts_until_interrupt() {
        let backend = MemoryBackend::new(user(ME, Some("me"), None));
        backend.add_conversation(
            Conversation {
                id: 300,
                name: "Announcements".into(),
                kind: ConversationKind::Broadcast,
                peer: None,
                restricted: false,
                megagroup: false,
            },
            vec![ME],
        );
        let lines = run(&backend, vec![Script::Line("1"), Script::Interrupt]).await;

        assert_eq!(
            lines,
            vec![
                "Logged in as: me",
                "No chats available.",
                "Invalid number.",
                "byebye!",
            ]
        );
    }

    #[tokio::test]
    async fn test_backend_failure_reported_before_farewell() {
        let backend = backend();
        backend.fail(Op::Conversations);
        let (output, listener) = recording();
        let input = ScriptedInput::new(&backend, vec![Script::Line("1")]);
        let mut session = Session::new(&backend, input, &config(), output);

        assert!(session.run().await.is_err());
        assert_eq!(
            listener.lines(),
            vec![
                "Logged in as: me",
                "Error: Backend error: Conversations failed",
                "byebye!",
            ]
        );
    }

    #[tokio::test]
    async fn test_switching_keeps_one_subscription() {
        let backend = backend();
        run(
            &backend,
            vec![
                Script::Line("1"),
                Script::Subscribed(vec![GROUP]),
                Script::Line(":wq"),
                Script::Subscribed(vec![]),
                Script::Line("2"),
                Script::Subscribed(vec![OTHER_GROUP]),
                Script::Line(":wq"),
                Script::Line("1"),
                Script::Subscribed(vec![GROUP]),
                Script::Interrupt,
            ],
        )
        .await;
        assert!(backend.active_subscriptions().is_empty());
    }

    #[tokio::test]
    async fn test_quit_returns_to_menu() {
        let backend = backend();
        let lines = run(
            &backend,
            vec![Script::Line("1"), Script::Line(":wq"), Script::Interrupt],
        )
        .await;

        let menus = lines.iter().filter(|l| *l == "Your recent chats:").count();
        assert_eq!(menus, 2);
        assert!(lines.contains(&"Returning to chat list...".to_string()));
    }

    #[tokio::test]
    async fn test_inbound_message_is_rendered() {
        let backend = backend();
        let lines = run(
            &backend,
            vec![
                Script::Line("1"),
                Script::Deliver(message(20, BOB, "new one")),
                Script::Interrupt,
            ],
        )
        .await;

        assert_eq!(lines[lines.len() - 2], "[20] bob: new one");
    }

    #[tokio::test]
    async fn test_sending_from_active_loop() {
        let backend = backend();
        run(
            &backend,
            vec![
                Script::Line("1"),
                Script::Line(""),
                Script::Line("hello all"),
                Script::Interrupt,
            ],
        )
        .await;

        let sent = backend.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text, "hello all");
        assert_eq!(sent[0].conversation, GROUP);
    }

    #[tokio::test]
    async fn test_index_build_failure_returns_to_menu() {
        let backend = backend();
        backend.fail(Op::Participants);
        let lines = run(&backend, vec![Script::Line("1"), Script::Interrupt]).await;

        assert!(lines.iter().any(|l| l.starts_with("Failed to open chat:")));
        assert!(!lines.iter().any(|l| l.starts_with("Joined chat")));
        let menus = lines.iter().filter(|l| *l == "Your recent chats:").count();
        assert_eq!(menus, 2);
        assert!(backend.active_subscriptions().is_empty());
    }

    #[tokio::test]
    async fn test_index_is_passed_to_input() {
        let backend = backend();
        let (output, _listener) = recording();
        let input = ScriptedInput::new(&backend, vec![Script::Line("1"), Script::Interrupt]);
        let mut session = Session::new(&backend, input, &config(), output);
        session.run().await.unwrap();

        assert_eq!(session.input.completions, vec![vec!["alice", "bob", "me"]]);
    }
}
