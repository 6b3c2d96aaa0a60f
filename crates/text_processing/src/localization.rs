//! English to Chinese response substitution
//!
//! Fallback replies are built from English templates. When the user wrote in
//! Chinese, fixed phrases are swapped for their Chinese equivalents. Longer
//! phrases come first so that a short phrase never splits a longer one.

const SUBSTITUTIONS: &[(&str, &str)] = &[
    ("No data available for the given criteria.", "没有找到符合条件的数据。"),
    ("I'm not sure I understand", "我不太明白"),
    ("Could you rephrase", "您能换个说法吗"),
    ("Here are the", "以下是"),
    ("Showing", "显示"),
    ("records", "条记录"),
    ("record", "条记录"),
    ("Bank Issues", "银行问题"),
    ("Follow-ups", "跟进记录"),
    ("Stock Mail", "库存邮件"),
    ("Last In", "签到记录"),
    ("Last Out", "签退记录"),
    ("Transactions", "交易记录"),
    ("C-Operations", "C操作"),
    ("Agents", "代理"),
    ("Wealth", "财富"),
    ("Daily Reports", "日报"),
    ("Daily limit", "每日限额"),
    ("Monthly limit", "每月限额"),
    ("Customer service", "客服"),
    ("Hotline", "热线"),
    ("Email", "邮箱"),
    ("Website", "网站"),
    ("How to register", "注册方式"),
    ("Common issues", "常见问题"),
    ("Scam warning", "防诈骗提醒"),
    ("Transfer notes", "转账说明"),
    ("Status", "状态"),
    ("Amount", "金额"),
    ("Date", "日期"),
    ("Agent", "代理"),
    ("found", "找到"),
    ("for", "关于"),
];

/// Apply the fixed phrase substitutions
pub fn localize_to_chinese(message: &str) -> String {
    SUBSTITUTIONS
        .iter()
        .fold(message.to_string(), |text, (english, chinese)| {
            replace_phrase(&text, english, chinese)
        })
}

/// Replace whole-phrase occurrences; a phrase glued to ASCII letters on
/// either side is part of a longer word and stays
fn replace_phrase(text: &str, english: &str, chinese: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find(english) {
        let before = rest[..pos].chars().next_back();
        let after = rest[pos + english.len()..].chars().next();
        let bounded = !before.map_or(false, |c| c.is_ascii_alphanumeric())
            && !after.map_or(false, |c| c.is_ascii_alphanumeric());

        out.push_str(&rest[..pos]);
        out.push_str(if bounded { chinese } else { english });
        rest = &rest[pos + english.len()..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_data_message() {
        assert_eq!(
            localize_to_chinese("No data available for the given criteria."),
            "没有找到符合条件的数据。"
        );
    }

    #[test]
    fn test_partial_words_untouched() {
        let out = localize_to_chinese("Showing 3 records, before format");
        assert!(out.starts_with("显示 3 条记录"));
        assert!(out.contains("before format"));
    }

    #[test]
    fn test_labels() {
        assert_eq!(localize_to_chinese("Daily limit: S$1,000"), "每日限额: S$1,000");
    }
}
