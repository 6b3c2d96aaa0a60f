//! Problem solver
//!
//! Recognises common banking, account and technical problems and answers
//! with a scripted solution. Problems are checked in order, most urgent
//! first, and the first match wins.

use std::fmt;

use ops_assistant_text_processing::matching::Normalized;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProblemCategory {
    Banking,
    Account,
    Technical,
}

impl fmt::Display for ProblemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Banking => write!(f, "Banking"),
            Self::Account => write!(f, "Account"),
            Self::Technical => write!(f, "Technical"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
            Self::Critical => write!(f, "Critical"),
        }
    }
}

/// Scripted answer to a recognised problem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub problem: String,
    pub category: ProblemCategory,
    pub steps: Vec<String>,
    pub tips: Vec<String>,
    pub related_topics: Vec<String>,
    pub urgency: Urgency,
}

impl Solution {
    /// Render for the chat window
    pub fn format(&self) -> String {
        let mut out = format!(
            "{} ({} problem, urgency: {})\n\nSteps:\n",
            self.problem, self.category, self.urgency
        );
        for (i, step) in self.steps.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, step));
        }
        if !self.tips.is_empty() {
            out.push_str("\nTips:\n");
            for tip in &self.tips {
                out.push_str(&format!("- {}\n", tip));
            }
        }
        if !self.related_topics.is_empty() {
            out.push_str(&format!("\nRelated: {}", self.related_topics.join(", ")));
        }
        out.trim_end().to_string()
    }
}

struct ProblemRule {
    keywords: &'static [&'static str],
    problem: &'static str,
    category: ProblemCategory,
    urgency: Urgency,
    steps: &'static [&'static str],
    tips: &'static [&'static str],
    related: &'static [&'static str],
}

impl ProblemRule {
    fn solution(&self) -> Solution {
        let owned =
            |items: &[&str]| -> Vec<String> { items.iter().map(|s| s.to_string()).collect() };
        Solution {
            problem: self.problem.to_string(),
            category: self.category,
            steps: owned(self.steps),
            tips: owned(self.tips),
            related_topics: owned(self.related),
            urgency: self.urgency,
        }
    }
}

const RULES: &[ProblemRule] = &[
    ProblemRule {
        keywords: &[
            "lost my card",
            "lost card",
            "card stolen",
            "stolen card",
            "card was stolen",
            "卡丢了",
            "卡被偷",
        ],
        problem: "Lost or stolen card",
        category: ProblemCategory::Banking,
        urgency: Urgency::Critical,
        steps: &[
            "Lock the card immediately in the bank's app or call the 24-hour hotline",
            "Review recent transactions for anything you don't recognise",
            "Request a replacement card",
            "File a police report if the card was stolen",
        ],
        tips: &["Update recurring payments once the new card arrives"],
        related: &["unauthorised transactions", "card replacement"],
    },
    ProblemRule {
        keywords: &[
            "unauthorized",
            "unauthorised",
            "didn't make this transaction",
            "did not make this transaction",
            "suspicious transaction",
            "money missing",
            "盗刷",
        ],
        problem: "Unauthorised transaction",
        category: ProblemCategory::Banking,
        urgency: Urgency::Critical,
        steps: &[
            "Call the bank's fraud hotline right away",
            "Freeze the affected card or account",
            "Dispute the transaction in writing",
            "Change your online banking password",
        ],
        tips: &["Never share OTPs, even with someone claiming to be from the bank"],
        related: &["scam advice", "password reset"],
    },
    ProblemRule {
        keywords: &[
            "transfer failed",
            "failed transfer",
            "transfer pending",
            "money not received",
            "not received my money",
            "转账失败",
            "没收到钱",
        ],
        problem: "Transfer failed or delayed",
        category: ProblemCategory::Banking,
        urgency: Urgency::High,
        steps: &[
            "Check the transfer status and reference number in your transaction history",
            "Confirm the recipient's account number or PayNow/DuitNow ID",
            "Wait up to 3 working days for interbank transfers",
            "Contact the bank with the reference number if it is still missing",
        ],
        tips: &["Instant transfers may be held for security review after a limit change"],
        related: &["transfer limits", "bank contacts"],
    },
    ProblemRule {
        keywords: &[
            "account locked",
            "account frozen",
            "account suspended",
            "account blocked",
            "账户被冻结",
            "账户被锁",
        ],
        problem: "Account locked",
        category: ProblemCategory::Account,
        urgency: Urgency::High,
        steps: &[
            "Wait 30 minutes if the lock followed several wrong password attempts",
            "Reset your password if you no longer remember it",
            "Contact support if the account stays locked",
        ],
        tips: &["Say \"forgot password\" to start a password reset here"],
        related: &["password reset", "two-factor authentication"],
    },
    ProblemRule {
        keywords: &[
            "otp not received",
            "didn't receive otp",
            "did not receive otp",
            "no otp",
            "code not received",
            "收不到验证码",
            "没收到验证码",
        ],
        problem: "One-time password not received",
        category: ProblemCategory::Account,
        urgency: Urgency::Medium,
        steps: &[
            "Check that your phone has signal and is not blocking short codes",
            "Wait 60 seconds before requesting another code",
            "Confirm the registered mobile number with the bank",
        ],
        tips: &["An authenticator app avoids SMS delays entirely"],
        related: &["two-factor authentication"],
    },
    ProblemRule {
        keywords: &[
            "app crash",
            "app keeps crashing",
            "app not working",
            "app won't open",
            "app is not working",
            "闪退",
            "打不开",
        ],
        problem: "App not working",
        category: ProblemCategory::Technical,
        urgency: Urgency::Medium,
        steps: &[
            "Force close and reopen the app",
            "Update the app to the latest version",
            "Clear the app cache or reinstall it",
            "Restart your phone",
        ],
        tips: &["Rooted or jailbroken phones are often blocked by banking apps"],
        related: &["registration"],
    },
    ProblemRule {
        keywords: &[
            "not loading",
            "won't load",
            "page is blank",
            "very slow",
            "running slow",
            "timeout",
            "加载不了",
            "很慢",
        ],
        problem: "Page slow or not loading",
        category: ProblemCategory::Technical,
        urgency: Urgency::Low,
        steps: &[
            "Refresh the page",
            "Check your internet connection",
            "Clear the browser cache and cookies",
            "Try another browser",
        ],
        tips: &[],
        related: &[],
    },
];

#[derive(Debug, Clone, Copy, Default)]
pub struct ProblemSolver;

impl ProblemSolver {
    pub fn new() -> Self {
        Self
    }

    pub fn diagnose(&self, message: &str) -> Option<Solution> {
        let text = Normalized::new(message);
        let solution = RULES
            .iter()
            .find(|rule| text.contains_any(rule.keywords))
            .map(ProblemRule::solution)?;
        tracing::debug!(
            problem = %solution.problem,
            urgency = %solution.urgency,
            "Matched problem"
        );
        Some(solution)
    }
}
