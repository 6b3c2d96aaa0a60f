//! Casual conversation
//!
//! Small-talk categories checked in order; the first category whose phrases
//! or words appear in the message answers with a random reply from its
//! pool. Chinese messages draw from the Chinese pool when one exists.

use ops_assistant_text_processing::matching::{is_cjk, Normalized};
use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatCategory {
    SmallTalk,
    Sad,
    Happy,
    Tired,
    Joke,
    Compliment,
    Thanks,
    Farewell,
}

struct CategoryRule {
    category: ChatCategory,
    /// Substring phrases
    phrases: &'static [&'static str],
    /// Whole words, for short tokens that would otherwise match fragments
    words: &'static [&'static str],
    replies: &'static [&'static str],
    replies_zh: &'static [&'static str],
}

const RULES: &[CategoryRule] = &[
    CategoryRule {
        category: ChatCategory::SmallTalk,
        phrases: &[
            "how are you",
            "how's it going",
            "how is it going",
            "what's up",
            "how do you do",
            "你好吗",
            "最近怎么样",
        ],
        words: &["sup"],
        replies: &[
            "I'm doing great, thanks for asking! How can I help you today?",
            "All systems running smoothly. What can I do for you?",
            "Pretty good! Ready to dig into some data whenever you are.",
        ],
        replies_zh: &["我很好，谢谢关心！今天有什么可以帮您？", "一切正常！需要我帮您查点什么吗？"],
    },
    CategoryRule {
        category: ChatCategory::Sad,
        phrases: &[
            "i'm sad",
            "i am sad",
            "feeling down",
            "feel down",
            "depressed",
            "unhappy",
            "bad day",
            "难过",
            "伤心",
        ],
        words: &["sad"],
        replies: &[
            "I'm sorry you're feeling that way. \
             Take a short break if you can; I'll be here when you're back.",
            "Rough days happen. If there's anything I can take off your plate, just ask.",
        ],
        replies_zh: &["听到您不开心我很难过。休息一下吧，我随时在这里。"],
    },
    CategoryRule {
        category: ChatCategory::Happy,
        phrases: &[
            "i'm happy",
            "i am happy",
            "feeling great",
            "feel great",
            "good mood",
            "excited",
            "开心",
            "高兴",
        ],
        words: &[],
        replies: &[
            "That's wonderful to hear! Let's keep the good momentum going.",
            "Love the energy! What shall we tackle next?",
        ],
        replies_zh: &["太好了！保持好心情！"],
    },
    CategoryRule {
        category: ChatCategory::Tired,
        phrases: &["exhausted", "sleepy", "worn out", "累了", "好累"],
        words: &["tired"],
        replies: &[
            "Sounds like a long shift. Grab some water and stretch for a minute.",
            "Rest matters. I can pull up the reports so you don't have to dig for them.",
        ],
        replies_zh: &["辛苦了！记得休息一下，喝点水。"],
    },
    CategoryRule {
        category: ChatCategory::Joke,
        phrases: &["tell me a joke", "say something funny", "make me laugh", "讲个笑话", "笑话"],
        words: &["joke"],
        replies: &[
            "Why did the bank teller quit? She lost interest.",
            "I told my computer I needed a break. It gave me a KitKat error.",
            "Why don't banks ever get lonely? They have too many branches.",
        ],
        replies_zh: &["为什么银行从不孤单？因为它有很多分行。"],
    },
    CategoryRule {
        category: ChatCategory::Compliment,
        phrases: &[
            "you're great",
            "you are great",
            "you're smart",
            "you are smart",
            "good job",
            "well done",
            "good bot",
            "you're awesome",
            "你真棒",
            "真厉害",
        ],
        words: &[],
        replies: &["Thank you, that made my day!", "You're too kind. Happy to help anytime."],
        replies_zh: &["谢谢夸奖！很高兴能帮到您。"],
    },
    CategoryRule {
        category: ChatCategory::Thanks,
        phrases: &["thank you", "thanks", "appreciate it", "谢谢", "多谢"],
        words: &["thx", "ty"],
        replies: &[
            "You're welcome!",
            "Anytime! Let me know if you need anything else.",
            "Glad I could help.",
        ],
        replies_zh: &["不客气！", "随时为您服务。"],
    },
    CategoryRule {
        category: ChatCategory::Farewell,
        phrases: &["goodbye", "see you", "good night", "talk later", "再见", "拜拜"],
        words: &["bye", "cya"],
        replies: &["Goodbye! Have a great day.", "See you soon!", "Take care!"],
        replies_zh: &["再见！祝您愉快。"],
    },
];

#[derive(Debug, Clone, Copy, Default)]
pub struct CasualChat;

impl CasualChat {
    pub fn new() -> Self {
        Self
    }

    /// First matching category in rule order
    pub fn categorize(&self, message: &str) -> Option<ChatCategory> {
        self.rule_for(message).map(|rule| rule.category)
    }

    pub fn respond(&self, message: &str) -> Option<String> {
        self.respond_with(message, &mut rand::thread_rng())
    }

    pub fn respond_with<R: Rng + ?Sized>(&self, message: &str, rng: &mut R) -> Option<String> {
        let rule = self.rule_for(message)?;
        let chinese = message.chars().any(is_cjk);
        let pool = if chinese && !rule.replies_zh.is_empty() {
            rule.replies_zh
        } else {
            rule.replies
        };
        tracing::debug!(category = ?rule.category, "Casual chat reply");
        pool.choose(rng).map(|reply| reply.to_string())
    }

    fn rule_for(&self, message: &str) -> Option<&'static CategoryRule> {
        let text = Normalized::new(message);
        RULES
            .iter()
            .find(|rule| text.contains_any(rule.phrases) || text.has_any_word(rule.words))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_category_order() {
        let chat = CasualChat::new();
        assert_eq!(chat.categorize("hey, how are you?"), Some(ChatCategory::SmallTalk));
        assert_eq!(chat.categorize("I'm sad today"), Some(ChatCategory::Sad));
        assert_eq!(chat.categorize("so tired"), Some(ChatCategory::Tired));
        assert_eq!(chat.categorize("tell me a joke"), Some(ChatCategory::Joke));
        assert_eq!(chat.categorize("thanks a lot"), Some(ChatCategory::Thanks));
        assert_eq!(chat.categorize("ok bye"), Some(ChatCategory::Farewell));
        // compliment is checked before thanks
        assert_eq!(chat.categorize("good job, thanks"), Some(ChatCategory::Compliment));
    }

    #[test]
    fn test_words_do_not_match_fragments() {
        let chat = CasualChat::new();
        assert_eq!(chat.categorize("show type of records"), None);
        assert_eq!(chat.categorize("bank issues by Tyler"), None);
    }

    #[test]
    fn test_reply_comes_from_pool() {
        let chat = CasualChat::new();
        let mut rng = StdRng::seed_from_u64(7);
        let reply = chat.respond_with("thank you", &mut rng).unwrap();
        let rule = RULES.iter().find(|r| r.category == ChatCategory::Thanks).unwrap();
        assert!(rule.replies.contains(&reply.as_str()));
    }

    #[test]
    fn test_chinese_pool() {
        let chat = CasualChat::new();
        let reply = chat.respond("谢谢").unwrap();
        assert!(["不客气！", "随时为您服务。"].contains(&reply.as_str()));
    }

    #[test]
    fn test_no_match() {
        assert!(CasualChat::new().respond("show stock mail").is_none());
    }
}
