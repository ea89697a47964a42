use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The rolling conversation window of a single user.
///
/// Holds at most `limit` messages. A system message, if any, is always the
/// first one; once the window is full it is evicted like any other message.
#[derive(Debug)]
pub(crate) struct Session {
    messages: VecDeque<ChatMessage>,
    limit: usize,
}

impl Session {
    pub fn new(limit: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(limit + 2),
            limit,
        }
    }

    pub fn has_system_message(&self) -> bool {
        self.messages.iter().any(|m| m.role == Role::System)
    }

    /// Puts `content` in front of the conversation unless a system message
    /// is already there. Returns whether a message was inserted.
    pub fn ensure_system_message(&mut self, content: &str) -> bool {
        if self.has_system_message() {
            return false;
        }
        self.messages.push_front(ChatMessage::system(content));
        true
    }

    /// Appends all of `msgs` and only then drops the oldest messages
    /// exceeding the limit.
    pub fn extend<I>(&mut self, msgs: I)
    where
        I: IntoIterator<Item = ChatMessage>,
    {
        self.messages.extend(msgs);
        while self.messages.len() > self.limit {
            self.messages.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn get_history_messages(&self) -> Vec<ChatMessage> {
        self.messages.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_system_message() {
        let mut session = Session::new(10);
        assert!(session.ensure_system_message("be nice"));
        assert!(!session.ensure_system_message("be rude"));
        assert_eq!(
            session.get_history_messages(),
            vec![ChatMessage::system("be nice")]
        );

        session.extend([ChatMessage::user("hi")]);
        assert!(!session.ensure_system_message("be nice"));
        assert_eq!(session.len(), 2);
    }

    #[test]
    fn test_window() {
        let mut session = Session::new(10);
        session.ensure_system_message("sys");
        for i in 0..4 {
            session.extend([
                ChatMessage::user(format!("q{}", i)),
                ChatMessage::assistant(format!("a{}", i)),
            ]);
        }
        assert_eq!(session.len(), 9);
        assert!(session.has_system_message());

        session.extend([ChatMessage::user("q4"), ChatMessage::assistant("a4")]);
        assert_eq!(session.len(), 10);

        // The window is full, so the system message is the first to go.
        let history = session.get_history_messages();
        assert!(!session.has_system_message());
        assert_eq!(history.first(), Some(&ChatMessage::user("q0")));
        assert_eq!(history.last(), Some(&ChatMessage::assistant("a4")));
    }

    #[test]
    fn test_system_message_comes_back() {
        let mut session = Session::new(4);
        session.extend([
            ChatMessage::user("q0"),
            ChatMessage::assistant("a0"),
            ChatMessage::user("q1"),
            ChatMessage::assistant("a1"),
        ]);
        assert!(session.ensure_system_message("sys"));
        assert_eq!(session.len(), 5);
        assert_eq!(session.get_history_messages()[0], ChatMessage::system("sys"));

        session.extend([ChatMessage::user("q2")]);
        assert_eq!(session.len(), 4);
        assert!(!session.has_system_message());
    }
}
