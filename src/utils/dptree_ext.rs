use teloxide::prelude::*;
use teloxide::types::Me;

/// Builds a filter that passes messages carrying the `/cmd` command.
pub fn command_filter(cmd: &'static str) -> impl Fn(Message, Me) -> bool {
    move |msg: Message, me: Me| {
        msg.text()
            .map(|text| is_command(text, cmd, me.username.as_deref()))
            .unwrap_or(false)
    }
}

pub(crate) fn is_command(text: &str, cmd: &str, bot_username: Option<&str>) -> bool {
    let Some(rest) = text.strip_prefix('/').and_then(|t| t.strip_prefix(cmd)) else {
        return false;
    };

    // Drop the arguments, if any.
    let target = rest.split(char::is_whitespace).next().unwrap_or("");
    if target.is_empty() {
        return true;
    }

    // When sending commands in a group, a mention suffix may be attached to
    // the text. For example: "/start@xxxx_bot".
    match target.strip_prefix('@') {
        Some(mention) => bot_username.map(|n| n == mention).unwrap_or(false),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::is_command;

    #[test]
    fn test_is_command() {
        assert!(is_command("/start", "start", Some("smartgdz_bot")));
        assert!(is_command("/start payload", "start", Some("smartgdz_bot")));
        assert!(is_command("/start@smartgdz_bot", "start", Some("smartgdz_bot")));
        assert!(!is_command("/start@other_bot", "start", Some("smartgdz_bot")));
        assert!(!is_command("/starting", "start", Some("smartgdz_bot")));
        assert!(!is_command("start", "start", Some("smartgdz_bot")));
        assert!(!is_command("/start@smartgdz_bot", "start", None));
    }

    #[test]
    fn test_is_command_with_payload() {
        // Deep links arrive as "/start <payload>".
        assert!(is_command("/start ref_42", "start", Some("smartgdz_bot")));
        assert!(is_command("/start\nref_42", "start", Some("smartgdz_bot")));
        assert!(is_command("/start@smartgdz_bot ref_42", "start", Some("smartgdz_bot")));
        assert!(!is_command("/start@other_bot ref_42", "start", Some("smartgdz_bot")));
        assert!(!is_command("/startx ref_42", "start", Some("smartgdz_bot")));
    }
}
