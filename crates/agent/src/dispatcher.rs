//! Message dispatch
//!
//! `Assistant::respond` runs one message through an ordered list of stages.
//! Each stage either answers or passes; the first answer wins and the
//! fallback stage always answers. Account flows come first so an active
//! flow owns every message until it completes or expires.

use std::sync::Arc;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use ops_assistant_config::Settings;
use ops_assistant_core::{
    AccountCallbacks, BotResponse, Clock, ConversationStore, DataSources, Intent, IntentClassifier,
    Language, SystemClock, UserInfo,
};
use ops_assistant_text_processing::calculator::format_number;
use ops_assistant_text_processing::entities::{format_record_date, normalize_date, parse_date};
use ops_assistant_text_processing::matching::{is_cjk, Normalized};
use ops_assistant_text_processing::{
    localize_to_chinese, Calculator, CalculatorError, EntityExtractor, KeywordIntentClassifier,
    PhraseTranslator, ScriptDetector,
};
use ops_assistant_tools::{CasualChat, DataQueryService, KnowledgeBase, ProblemSolver};
use rand::seq::SliceRandom;
use regex::Regex;

use crate::account::{AccountAction, AccountFlowEngine};
use crate::metrics::record_stage;
use crate::state::InMemoryConversationStore;
use crate::AgentError;

/// Pipeline stages in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ActiveFlow,
    AccountAction,
    CasualChat,
    Calculator,
    Translator,
    LanguageQuery,
    LatestIssue,
    Greeting,
    ProblemSolver,
    Help,
    Fallback,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ActiveFlow => "active_flow",
            Self::AccountAction => "account_action",
            Self::CasualChat => "casual_chat",
            Self::Calculator => "calculator",
            Self::Translator => "translator",
            Self::LanguageQuery => "language_query",
            Self::LatestIssue => "latest_issue",
            Self::Greeting => "greeting",
            Self::ProblemSolver => "problem_solver",
            Self::Help => "help",
            Self::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Messages starting with a command word skip small talk
const COMMAND_PREFIXES: &[&str] = &["translate", "翻译", "calculate", "calc", "compute"];

const LANGUAGE_QUERY_PHRASES: &[&str] = &[
    "what language",
    "which language",
    "detect language",
    "detect the language",
    "什么语言",
    "哪种语言",
];

static LATEST_ISSUE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:latest|last|most\s+recent|newest)\s+(?:bank\s+)?issues?\b|最新(?:的)?(?:银行)?问题",
    )
    .unwrap()
});

const GREETING_PHRASES: &[&str] = &[
    "good morning",
    "good afternoon",
    "good evening",
    "selamat pagi",
    "你好",
    "您好",
    "早上好",
    "下午好",
    "晚上好",
    "こんにちは",
    "안녕하세요",
];
const GREETING_WORDS: &[&str] =
    &["hello", "hi", "hey", "hiya", "howdy", "hola", "bonjour", "salam"];

/// Greetings only count in short messages
const GREETING_MAX_WORDS: usize = 4;
const GREETING_MAX_CJK_CHARS: usize = 6;

static HELP_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bhelp\b|what can you do|what do you do|帮助|你能做什么").unwrap()
});

static HELP_REQUEST_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\bhelp\s+me\s+(?:to\s+)?(?:check|send|find|show|get|look|list|search|see)\b",
    )
    .unwrap()
});

const HELP_MESSAGE: &str = "Here's what I can do:\n\
• Look up records: bank issues, follow-ups, stock mail, last in/out, transactions, \
C-operations, agents, wealth and daily reports\n\
• Filter by date, amount, ID, agent, email or status (e.g. \"pending bank issues for 3/5/2024\")\n\
• Answer bank questions: hotlines, transfer limits, registration and scam advice\n\
• Reset your password or change your display name\n\
• Quick maths (\"calculate 12*7\") and common phrase translation\n\
Just ask in English or Chinese!";

const HELP_MESSAGE_ZH: &str = "我可以帮您：\n\
• 查询记录：银行问题、跟进、库存邮件、最近转入/转出、交易、C操作、代理、财富和日报\n\
• 按日期、金额、编号、代理、邮箱或状态筛选\n\
• 回答银行问题：客服热线、转账限额、注册和防诈骗建议\n\
• 重置密码或修改显示名称\n\
• 简单计算和常用语翻译";

const UNSURE_MESSAGE: &str = "I'm not sure I understand. Could you rephrase?";

/// Answers for messages no stage, intent or bank name matched
const DEFLECTION_JOKES: &[&str] = &[
    "I tried to look that up, but my search came back emptier than a Monday inbox. \
     Could you ask it another way? Try \"help\" to see what I know.",
    "Why did the chatbot cross the road? To find a question it understood. \
     That one wasn't it, but try asking about bank issues or transactions!",
    "I asked my database about that and it just shrugged. \
     Maybe rephrase, or type \"help\" for ideas.",
    "That one's above my pay grade, and I don't get paid. \
     Try asking about records, banks or your account instead.",
];

/// Rule-based operations assistant
pub struct Assistant {
    store: Arc<dyn ConversationStore>,
    clock: Arc<dyn Clock>,
    accounts: AccountFlowEngine,
    classifier: Box<dyn IntentClassifier>,
    extractor: EntityExtractor,
    detector: ScriptDetector,
    calculator: Calculator,
    translator: PhraseTranslator,
    chat: CasualChat,
    problems: ProblemSolver,
    query: DataQueryService,
    knowledge: KnowledgeBase,
    settings: Settings,
}

/// Everything a stage needs about the current message
struct Turn<'a> {
    message: &'a str,
    sources: &'a DataSources,
    user: Option<&'a UserInfo>,
    callbacks: Option<&'a dyn AccountCallbacks>,
    user_key: String,
    today: NaiveDate,
}

impl Assistant {
    pub const PIPELINE: [Stage; 11] = [
        Stage::ActiveFlow,
        Stage::AccountAction,
        Stage::CasualChat,
        Stage::Calculator,
        Stage::Translator,
        Stage::LanguageQuery,
        Stage::LatestIssue,
        Stage::Greeting,
        Stage::ProblemSolver,
        Stage::Help,
        Stage::Fallback,
    ];

    /// Assistant with an in-memory state store and the wall clock
    pub fn new(settings: &Settings) -> Result<Self, AgentError> {
        settings.validate()?;
        let knowledge = KnowledgeBase::from_config(&settings.knowledge)?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let store: Arc<dyn ConversationStore> =
            Arc::new(InMemoryConversationStore::from_config(&settings.conversation, clock.clone()));

        tracing::info!(
            banks = knowledge.len(),
            state_ttl_secs = settings.conversation.state_ttl_secs,
            distributed_store = store.is_distributed(),
            "Assistant initialized"
        );

        Ok(Self {
            accounts: AccountFlowEngine::new(&settings.security, store.clone(), clock.clone()),
            store,
            clock,
            classifier: Box::new(KeywordIntentClassifier::new()),
            extractor: EntityExtractor::new(),
            detector: ScriptDetector::new(),
            calculator: Calculator::new(),
            translator: PhraseTranslator::new(),
            chat: CasualChat::new(),
            problems: ProblemSolver::new(),
            query: DataQueryService::new(&settings.query),
            knowledge,
            settings: settings.clone(),
        })
    }

    /// Replace the conversation store
    pub fn with_store(mut self, store: Arc<dyn ConversationStore>) -> Self {
        tracing::debug!(distributed = store.is_distributed(), "Conversation store replaced");
        self.store = store;
        self.rebuild_accounts();
        self
    }

    /// Replace the clock used for TOTP checks and relative dates
    ///
    /// The store keeps its own clock; pass a store built on the same clock
    /// through `with_store` when both must agree.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self.rebuild_accounts();
        self
    }

    pub fn with_classifier(mut self, classifier: Box<dyn IntentClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_knowledge(mut self, knowledge: KnowledgeBase) -> Self {
        self.knowledge = knowledge;
        self
    }

    pub fn store(&self) -> &Arc<dyn ConversationStore> {
        &self.store
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    fn rebuild_accounts(&mut self) {
        self.accounts =
            AccountFlowEngine::new(&self.settings.security, self.store.clone(), self.clock.clone());
    }

    /// Answer one message
    ///
    /// Never fails: store and callback errors become scripted replies.
    /// Overlapping calls for the same user are not serialized.
    pub async fn respond(
        &self,
        message: &str,
        sources: &DataSources,
        user: Option<&UserInfo>,
        callbacks: Option<&dyn AccountCallbacks>,
    ) -> BotResponse {
        let turn = Turn {
            message: message.trim(),
            sources,
            user,
            callbacks,
            user_key: user
                .and_then(UserInfo::state_key)
                .unwrap_or(self.settings.conversation.default_user_key.as_str())
                .to_string(),
            today: self.clock.now().date_naive(),
        };

        for stage in Self::PIPELINE {
            if let Some(response) = self.run_stage(stage, &turn).await {
                tracing::debug!(
                    stage = %stage,
                    user_key = %turn.user_key,
                    records = sources.total_records(),
                    "Stage answered"
                );
                record_stage(stage.as_str());
                return response;
            }
        }

        // the fallback stage always answers
        BotResponse::text(UNSURE_MESSAGE)
    }

    async fn run_stage(&self, stage: Stage, turn: &Turn<'_>) -> Option<BotResponse> {
        match stage {
            Stage::ActiveFlow => self.active_flow(turn).await,
            Stage::AccountAction => self.account_action(turn).await,
            Stage::CasualChat => self.casual_chat(turn),
            Stage::Calculator => self.calculate(turn),
            Stage::Translator => self.translate(turn),
            Stage::LanguageQuery => self.language_query(turn),
            Stage::LatestIssue => self.latest_issue(turn),
            Stage::Greeting => self.greeting(turn),
            Stage::ProblemSolver => self.problem_solver(turn),
            Stage::Help => self.help(turn),
            Stage::Fallback => Some(self.fallback(turn)),
        }
    }

    async fn active_flow(&self, turn: &Turn<'_>) -> Option<BotResponse> {
        let state = self.accounts.active_state(&turn.user_key).await?;
        Some(
            self.accounts
                .continue_flow(state, turn.message, turn.user, turn.callbacks)
                .await,
        )
    }

    async fn account_action(&self, turn: &Turn<'_>) -> Option<BotResponse> {
        let action = AccountAction::detect(turn.message)?;
        Some(
            self.accounts
                .start(action, &turn.user_key, turn.message, turn.user, turn.callbacks)
                .await,
        )
    }

    fn casual_chat(&self, turn: &Turn<'_>) -> Option<BotResponse> {
        let lower = turn.message.to_lowercase();
        if COMMAND_PREFIXES.iter().any(|p| lower.starts_with(p)) {
            return None;
        }
        self.chat.respond(turn.message).map(BotResponse::text)
    }

    fn calculate(&self, turn: &Turn<'_>) -> Option<BotResponse> {
        let expression = self.calculator.extract_expression(turn.message)?;
        let message = match self.calculator.evaluate(&expression) {
            Ok(value) => format!("{} = {}", expression, format_number(value)),
            Err(CalculatorError::DivisionByZero) => "Oops, that would mean dividing by zero, \
                and not even I can do that. Try another calculation!"
                .to_string(),
            Err(e) => {
                tracing::debug!(error = %e, "Calculator rejected expression");
                format!(
                    "Sorry, I couldn't work out \"{}\". Please check the expression and try again.",
                    expression
                )
            }
        };
        Some(BotResponse::text(message))
    }

    fn translate(&self, turn: &Turn<'_>) -> Option<BotResponse> {
        let request = self.translator.parse(turn.message)?;
        Some(BotResponse::text(self.translator.respond(&request)))
    }

    fn language_query(&self, turn: &Turn<'_>) -> Option<BotResponse> {
        let text = Normalized::new(turn.message);
        let phrase = LANGUAGE_QUERY_PHRASES.iter().find(|p| text.contains(p))?;

        // detect the text after the question, falling back to the whole message
        let lower = turn.message.to_lowercase();
        let subject = lower
            .find(*phrase)
            .map(|i| {
                lower[i + phrase.len()..].trim_start_matches(|c: char| {
                    c.is_ascii_punctuation() || c.is_whitespace() || "是：".contains(c)
                })
            })
            .filter(|rest| !rest.trim().is_empty())
            .unwrap_or(&lower);
        let language = self.detector.detect(subject);

        let message = if self.detector.detect(turn.message).is_chinese() {
            format!("这段文字看起来是{}。", chinese_language_name(language))
        } else {
            format!("That looks like {}.", language.display_name())
        };
        Some(BotResponse::text(message))
    }

    fn latest_issue(&self, turn: &Turn<'_>) -> Option<BotResponse> {
        if !LATEST_ISSUE_PATTERN.is_match(turn.message) {
            return None;
        }

        let date = self
            .extractor
            .extract_date(turn.message)
            .and_then(|raw| normalize_date(&raw, turn.today))
            .and_then(|normalized| parse_date(&normalized))
            .unwrap_or(turn.today);
        let day = format_record_date(date);

        let response = match self.query.latest_bank_issue(turn.sources, date) {
            Some(record) => BotResponse::for_page(
                Intent::BankIssues.page().unwrap_or_default(),
                format!(
                    "Latest bank issue for {}:\n{}",
                    day,
                    self.query.describe(Intent::BankIssues, record)
                ),
            )
            .with_has_data(true),
            None => BotResponse::for_page(
                Intent::BankIssues.page().unwrap_or_default(),
                format!("No bank issues recorded for {}.", day),
            )
            .with_has_data(false),
        };
        Some(response)
    }

    fn greeting(&self, turn: &Turn<'_>) -> Option<BotResponse> {
        let text = Normalized::new(turn.message);
        let cjk_chars = turn
            .message
            .chars()
            .filter(|c| is_cjk(*c))
            .count();
        let short = if cjk_chars > 0 {
            turn.message.chars().count() <= GREETING_MAX_CJK_CHARS
        } else {
            text.word_count() <= GREETING_MAX_WORDS
        };
        if !short || !(text.contains_any(GREETING_PHRASES) || text.has_any_word(GREETING_WORDS)) {
            return None;
        }

        let name = turn.user.and_then(UserInfo::first_name);
        let chinese = self.detector.detect(turn.message).is_chinese();
        let message = match (name, chinese) {
            (Some(name), false) => format!("Hello {}! How can I help you today?", name),
            (None, false) => "Hello! How can I help you today?".to_string(),
            (Some(name), true) => format!("你好，{}！今天有什么可以帮您？", name),
            (None, true) => "你好！今天有什么可以帮您？".to_string(),
        };
        Some(BotResponse::text(message))
    }

    fn problem_solver(&self, turn: &Turn<'_>) -> Option<BotResponse> {
        let solution = self.problems.diagnose(turn.message)?;
        Some(BotResponse::text(solution.format()))
    }

    fn help(&self, turn: &Turn<'_>) -> Option<BotResponse> {
        if !HELP_PATTERN.is_match(turn.message) || HELP_REQUEST_PATTERN.is_match(turn.message) {
            return None;
        }
        let message = if self.detector.detect(turn.message).is_chinese() {
            HELP_MESSAGE_ZH
        } else {
            HELP_MESSAGE
        };
        Some(BotResponse::text(message))
    }

    fn fallback(&self, turn: &Turn<'_>) -> BotResponse {
        let intent = self.classifier.classify(turn.message);
        tracing::debug!(
            intent = %intent,
            classifier = self.classifier.name(),
            "Classified message"
        );

        let response = match intent {
            Intent::BankInfo => self.bank_answer(turn),
            Intent::Unknown => match self.knowledge.find_in_message(turn.message) {
                Some(_) => self.bank_answer(turn),
                None => {
                    tracing::debug!("Nothing matched, deflecting");
                    BotResponse::text(deflection())
                }
            },
            data_intent => {
                let filter = self.extractor.extract_filter(turn.message, turn.today);
                let result = self.query.query(data_intent, turn.sources, &filter);
                let mut response =
                    BotResponse::text(result.message.clone()).with_has_data(result.has_data());
                response.page = data_intent.page().map(str::to_string);
                if filter.is_empty() {
                    response
                } else {
                    response.with_filter(filter)
                }
            }
        };

        self.localize(turn, response)
    }

    fn bank_answer(&self, turn: &Turn<'_>) -> BotResponse {
        let page = Intent::BankInfo.page().unwrap_or_default();
        match self.knowledge.find_in_message(turn.message) {
            Some(entry) => {
                BotResponse::for_page(page, self.knowledge.format_response(entry, turn.message))
            }
            None => BotResponse::for_page(
                page,
                format!(
                    "Which bank do you mean? I have information on: {}.",
                    self.knowledge.bank_names().join(", ")
                ),
            ),
        }
    }

    fn localize(&self, turn: &Turn<'_>, mut response: BotResponse) -> BotResponse {
        if self.detector.detect(turn.message) == Language::Chinese {
            response.message = localize_to_chinese(&response.message);
        }
        response
    }
}

/// A light-hearted nudge for a message nothing understood
fn deflection() -> &'static str {
    DEFLECTION_JOKES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(UNSURE_MESSAGE)
}

fn chinese_language_name(language: Language) -> &'static str {
    match language {
        Language::English => "英语",
        Language::Chinese => "中文",
        Language::Japanese => "日语",
        Language::Korean => "韩语",
        Language::Thai => "泰语",
        Language::Arabic => "阿拉伯语",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assistant() -> Assistant {
        Assistant::new(&Settings::default()).unwrap()
    }

    async fn ask(assistant: &Assistant, message: &str) -> BotResponse {
        assistant.respond(message, &DataSources::default(), None, None).await
    }

    #[test]
    fn test_pipeline_order() {
        assert_eq!(Assistant::PIPELINE.first(), Some(&Stage::ActiveFlow));
        assert_eq!(Assistant::PIPELINE.last(), Some(&Stage::Fallback));
        let pos = |s| Assistant::PIPELINE.iter().position(|x| *x == s).unwrap();
        assert!(pos(Stage::CasualChat) < pos(Stage::Calculator));
        assert!(pos(Stage::LatestIssue) < pos(Stage::Greeting));
        assert!(pos(Stage::Help) < pos(Stage::Fallback));
    }

    #[tokio::test]
    async fn test_calculator_stage() {
        let a = assistant();
        assert!(ask(&a, "calculate 2+2*3").await.message.ends_with("= 8"));
        assert!(ask(&a, "what is 10/0").await.message.contains("dividing by zero"));
    }

    #[tokio::test]
    async fn test_translate_is_not_small_talk() {
        let reply = ask(&assistant(), "translate to chinese: thank you").await;
        assert!(reply.message.contains("谢谢"));
    }

    #[tokio::test]
    async fn test_language_query() {
        let reply = ask(&assistant(), "what language is this: こんにちは").await;
        assert_eq!(reply.message, "That looks like Japanese.");
    }

    #[tokio::test]
    async fn test_greeting_uses_first_name() {
        let a = assistant();
        let user = UserInfo::new("jtan", "Jamie Tan", "jamie@example.com");
        let reply = a.respond("hi", &DataSources::default(), Some(&user), None).await;
        assert_eq!(reply.message, "Hello Jamie! How can I help you today?");

        // long messages with a greeting fall through
        let data = DataSources::default();
        let reply = a
            .respond("hi, show me the pending bank issues", &data, Some(&user), None)
            .await;
        assert_ne!(reply.message, "Hello Jamie! How can I help you today?");
    }

    #[tokio::test]
    async fn test_help_excludes_requests() {
        let a = assistant();
        assert!(ask(&a, "help").await.message.starts_with("Here's what I can do"));
        let reply = ask(&a, "help me check stock mail").await;
        assert!(!reply.message.starts_with("Here's what I can do"));
    }

    #[tokio::test]
    async fn test_unknown_message_deflects() {
        let reply = ask(&assistant(), "purple elephants dancing").await;
        assert!(DEFLECTION_JOKES.contains(&reply.message.as_str()));
        assert!(reply.page.is_none());
    }

    #[tokio::test]
    async fn test_bank_question_without_bank() {
        let reply = ask(&assistant(), "what is the transfer limit").await;
        assert!(reply.message.starts_with("Which bank do you mean?"));
        assert_eq!(reply.page.as_deref(), Some("/bank-info"));
    }
}
