use std::fmt;
use std::sync::Arc;

use anyhow::Error;
use teloxide::prelude::*;
use teloxide::types::{ChatMemberStatus, Recipient};

/// The channel users must be subscribed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ChannelRef {
    /// A public channel, stored without the leading `@`.
    Username(String),
    Id(ChatId),
}

impl ChannelRef {
    pub fn parse(value: &str) -> Result<Self, Error> {
        let value = value.trim();
        if let Some(username) = value.strip_prefix('@') {
            if username.is_empty() {
                return Err(anyhow!("Channel username is empty"));
            }
            return Ok(Self::Username(username.to_owned()));
        }

        match value.parse::<i64>() {
            Ok(id) => Ok(Self::Id(ChatId(id))),
            Err(_) if !value.is_empty() && !value.contains(char::is_whitespace) => {
                Ok(Self::Username(value.to_owned()))
            }
            Err(_) => Err(anyhow!("Invalid channel: \"{}\"", value)),
        }
    }

    pub fn recipient(&self) -> Recipient {
        match self {
            Self::Username(username) => Recipient::ChannelUsername(format!("@{}", username)),
            Self::Id(id) => Recipient::Id(*id),
        }
    }

    /// A `t.me` link to the channel. Private channels addressed by id
    /// have no public link.
    pub fn link(&self) -> Option<String> {
        match self {
            Self::Username(username) => Some(format!("https://t.me/{}", username)),
            Self::Id(_) => None,
        }
    }
}

impl fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Username(username) => write!(f, "@{}", username),
            Self::Id(id) => write!(f, "{}", id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MembershipStatus {
    Creator,
    Administrator,
    Member,
    Restricted,
    Left,
    Kicked,
}

impl From<ChatMemberStatus> for MembershipStatus {
    fn from(status: ChatMemberStatus) -> Self {
        match status {
            ChatMemberStatus::Owner => Self::Creator,
            ChatMemberStatus::Administrator => Self::Administrator,
            ChatMemberStatus::Member => Self::Member,
            ChatMemberStatus::Restricted => Self::Restricted,
            ChatMemberStatus::Left => Self::Left,
            ChatMemberStatus::Banned => Self::Kicked,
        }
    }
}

/// Outcome of a single membership query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SubscriptionCheck {
    Status(MembershipStatus),
    Failed,
}

/// How a [`SubscriptionCheck`] is turned into an access decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GatePolicy {
    /// Only members, administrators and the creator pass. Failed queries
    /// are denied.
    Strict,
    /// Everyone but users who left or were kicked passes. Failed queries
    /// are allowed.
    Lenient,
}

impl GatePolicy {
    pub fn allows(self, check: SubscriptionCheck) -> bool {
        use MembershipStatus::*;

        match (self, check) {
            (Self::Strict, SubscriptionCheck::Status(status)) => {
                matches!(status, Creator | Administrator | Member)
            }
            (Self::Strict, SubscriptionCheck::Failed) => false,
            (Self::Lenient, SubscriptionCheck::Status(status)) => !matches!(status, Left | Kicked),
            (Self::Lenient, SubscriptionCheck::Failed) => true,
        }
    }
}

#[async_trait]
pub(crate) trait MembershipProvider: Send + Sync {
    async fn membership_status(
        &self,
        channel: &ChannelRef,
        user_id: UserId,
    ) -> Result<MembershipStatus, Error>;
}

/// Queries membership through the Bot API `getChatMember` method.
pub(crate) struct TelegramMembership {
    bot: Bot,
}

impl TelegramMembership {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl MembershipProvider for TelegramMembership {
    async fn membership_status(
        &self,
        channel: &ChannelRef,
        user_id: UserId,
    ) -> Result<MembershipStatus, Error> {
        let member = self
            .bot
            .get_chat_member(channel.recipient(), user_id)
            .await?;
        Ok(member.kind.status().into())
    }
}

#[derive(Clone)]
pub(crate) struct SubscriptionGate {
    provider: Arc<dyn MembershipProvider>,
    channel: ChannelRef,
}

impl SubscriptionGate {
    pub fn new<P>(provider: P, channel: ChannelRef) -> Self
    where
        P: MembershipProvider + 'static,
    {
        Self {
            provider: Arc::new(provider),
            channel,
        }
    }

    pub fn channel(&self) -> &ChannelRef {
        &self.channel
    }

    pub async fn check(&self, user_id: UserId) -> SubscriptionCheck {
        match self
            .provider
            .membership_status(&self.channel, user_id)
            .await
        {
            Ok(status) => {
                debug!("User {} is {:?} in {}", user_id, status, self.channel);
                SubscriptionCheck::Status(status)
            }
            Err(err) => {
                warn!(
                    "Failed to check subscription of user {} in {}: {}",
                    user_id, self.channel, err
                );
                SubscriptionCheck::Failed
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Answers every query with a fixed status, or fails when `None`.
    pub(crate) struct FixedMembership(pub Option<MembershipStatus>);

    #[async_trait]
    impl MembershipProvider for FixedMembership {
        async fn membership_status(
            &self,
            _channel: &ChannelRef,
            _user_id: UserId,
        ) -> Result<MembershipStatus, Error> {
            self.0.ok_or_else(|| anyhow!("Bad Request: user not found"))
        }
    }

    pub(crate) fn fixed_gate(status: Option<MembershipStatus>) -> SubscriptionGate {
        SubscriptionGate::new(
            FixedMembership(status),
            ChannelRef::Username("smartgdz_news".to_owned()),
        )
    }

    #[test]
    fn test_parse_channel() {
        let channel = ChannelRef::parse("@smartgdz_news").unwrap();
        assert_eq!(channel, ChannelRef::Username("smartgdz_news".to_owned()));
        assert_eq!(channel.link().as_deref(), Some("https://t.me/smartgdz_news"));
        assert_eq!(channel.to_string(), "@smartgdz_news");
        assert_eq!(
            channel.recipient(),
            Recipient::ChannelUsername("@smartgdz_news".to_owned())
        );

        let channel = ChannelRef::parse("-1001234567890").unwrap();
        assert_eq!(channel, ChannelRef::Id(ChatId(-1001234567890)));
        assert_eq!(channel.link(), None);

        let channel = ChannelRef::parse("smartgdz_news").unwrap();
        assert_eq!(channel, ChannelRef::Username("smartgdz_news".to_owned()));

        assert!(ChannelRef::parse("@").is_err());
        assert!(ChannelRef::parse("").is_err());
        assert!(ChannelRef::parse("two words").is_err());
    }

    #[test]
    fn test_policies() {
        use MembershipStatus::*;

        let allowed_by = |policy: GatePolicy| {
            [Creator, Administrator, Member, Restricted, Left, Kicked]
                .into_iter()
                .filter(|s| policy.allows(SubscriptionCheck::Status(*s)))
                .collect::<Vec<_>>()
        };

        assert_eq!(
            allowed_by(GatePolicy::Strict),
            vec![Creator, Administrator, Member]
        );
        assert_eq!(
            allowed_by(GatePolicy::Lenient),
            vec![Creator, Administrator, Member, Restricted]
        );

        assert!(!GatePolicy::Strict.allows(SubscriptionCheck::Failed));
        assert!(GatePolicy::Lenient.allows(SubscriptionCheck::Failed));
    }

    #[tokio::test]
    async fn test_gate_check() {
        let gate = fixed_gate(Some(MembershipStatus::Kicked));
        assert_eq!(
            gate.check(UserId(42)).await,
            SubscriptionCheck::Status(MembershipStatus::Kicked)
        );

        let gate = fixed_gate(None);
        assert_eq!(gate.check(UserId(42)).await, SubscriptionCheck::Failed);
    }
}
