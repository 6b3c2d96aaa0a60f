//! Stage priority and fallback answers

mod common;

use common::{assistant_with_clock, manual_clock};
use ops_assistant_core::{DataSources, Intent};
use ops_assistant_tools::{KnowledgeBase, NO_DATA_MESSAGE};
use serde_json::json;

fn sources() -> DataSources {
    DataSources {
        bank_issues: vec![
            json!({
                "id": 101,
                "date": "3/15/2024",
                "bank": "DBS",
                "issue": "Login error",
                "status": "open",
                "handler": "Ravi"
            }),
            json!({
                "id": 102,
                "date": "3/15/2024",
                "bank": "OCBC",
                "issue": "Transfer delay",
                "status": "pending",
                "handler": "Mei"
            }),
            json!({
                "id": 103,
                "date": "3/14/2024",
                "bank": "UOB",
                "issue": "Card declined",
                "status": "resolved",
                "handler": "Ravi"
            }),
        ],
        stock_mail: vec![json!({"id": 7, "date": "3/15/2024", "bank": "DBS", "status": "sent"})],
        ..Default::default()
    }
}

#[tokio::test]
async fn test_stock_mail_outranks_bank_info() {
    let (assistant, _) = assistant_with_clock(manual_clock());
    let reply = assistant.respond("show stock mail from the bank", &sources(), None, None).await;
    assert_eq!(reply.page.as_deref(), Intent::StockMail.page());
    assert_eq!(reply.has_data, Some(true));
}

#[tokio::test]
async fn test_empty_bank_issues() {
    let (assistant, _) = assistant_with_clock(manual_clock());
    let reply = assistant
        .respond("show bank issues", &DataSources::default(), None, None)
        .await;
    assert_eq!(reply.message, NO_DATA_MESSAGE);
    assert_eq!(reply.has_data, Some(false));
    assert_eq!(reply.page.as_deref(), Some("/bank-issues"));
}

#[tokio::test]
async fn test_filtered_listing_carries_filter() {
    let (assistant, _) = assistant_with_clock(manual_clock());
    let reply = assistant
        .respond("show pending bank issues", &sources(), None, None)
        .await;
    assert!(reply.message.contains("Transfer delay"));
    assert!(!reply.message.contains("Login error"));
    assert_eq!(reply.filter.and_then(|f| f.status).as_deref(), Some("pending"));
}

#[tokio::test]
async fn test_latest_issue_is_last_match_for_today() {
    let (assistant, _) = assistant_with_clock(manual_clock());
    let reply = assistant.respond("latest issue", &sources(), None, None).await;
    assert!(reply.message.contains("Transfer delay"));
    assert_eq!(reply.has_data, Some(true));

    let reply = assistant.respond("最新问题", &DataSources::default(), None, None).await;
    assert_eq!(reply.message, "No bank issues recorded for 3/15/2024.");

    let reply = assistant
        .respond("latest issue on 2024-03-14", &sources(), None, None)
        .await;
    assert!(reply.message.contains("Card declined"));
}

#[tokio::test]
async fn test_calculator_sanitizes_input() {
    let (assistant, _) = assistant_with_clock(manual_clock());
    let reply = assistant.respond("calculate 2+2*3", &DataSources::default(), None, None).await;
    assert!(reply.message.ends_with("= 8"));

    let reply = assistant
        .respond("calculate 2+alert(1)", &DataSources::default(), None, None)
        .await;
    assert!(!reply.message.contains("alert"));
    assert!(reply.message.ends_with("= 3"));
}

#[tokio::test]
async fn test_questions_with_dates_reach_the_data_query() {
    let (assistant, _) = assistant_with_clock(manual_clock());

    let reply = assistant
        .respond("what is the daily report for 3/15/2024", &sources(), None, None)
        .await;
    assert_eq!(reply.page.as_deref(), Some("/daily-report"));
    assert!(!reply.message.contains(" = "));

    let reply = assistant
        .respond("what is on the bank issue list for 2024-03-14", &sources(), None, None)
        .await;
    assert_eq!(reply.page.as_deref(), Some("/bank-issues"));
    assert!(reply.message.contains("Card declined"));
    assert_eq!(reply.has_data, Some(true));
}

#[tokio::test]
async fn test_listing_with_miss_wording_is_kept() {
    let (assistant, _) = assistant_with_clock(manual_clock());
    let mut data = sources();
    data.bank_issues.push(json!({
        "id": 104,
        "date": "3/15/2024",
        "bank": "HSBC",
        "issue": "Payee not found",
        "status": "open",
        "handler": "Mei"
    }));

    let reply = assistant.respond("show bank issues", &data, None, None).await;
    assert_eq!(reply.has_data, Some(true));
    assert!(reply.message.contains("Payee not found"));
    assert!(reply.message.contains("Login error"));
}

#[tokio::test]
async fn test_bank_alias_answers_match() {
    let (assistant, _) = assistant_with_clock(manual_clock());
    let kb = assistant.knowledge();
    let posb = kb.get_bank_info("posb").unwrap();
    let dbs = kb.get_bank_info("DBS").unwrap();
    assert!(std::ptr::eq(posb, dbs));

    let data = DataSources::default();
    let by_alias = assistant.respond("posb hotline", &data, None, None).await;
    let by_name = assistant.respond("dbs hotline", &data, None, None).await;
    assert_eq!(by_alias.message, by_name.message);
    assert_eq!(by_alias.page.as_deref(), Some("/bank-info"));
}

#[tokio::test]
async fn test_mentioned_alias_prefers_exact_key() {
    let catalogue = "banks:
  - key: Alpha
    name: Alpha Bank
    aliases: [beta]
    support:
      hotline: \"1111\"
  - key: Beta
    name: Beta Bank
    support:
      hotline: \"2222\"
";
    let (assistant, _) = assistant_with_clock(manual_clock());
    let assistant = assistant.with_knowledge(KnowledgeBase::from_yaml(catalogue).unwrap());

    let reply = assistant
        .respond("beta hotline", &DataSources::default(), None, None)
        .await;
    assert!(reply.message.starts_with("Beta Bank Customer service:"));
    assert!(reply.message.contains("Hotline: 2222"));
}

#[tokio::test]
async fn test_chinese_fallback_is_localized() {
    let (assistant, _) = assistant_with_clock(manual_clock());
    let reply = assistant.respond("显示银行问题", &DataSources::default(), None, None).await;
    assert_eq!(reply.message, "没有找到符合条件的数据。");
}

#[tokio::test]
async fn test_small_talk_before_fallback() {
    let (assistant, _) = assistant_with_clock(manual_clock());
    let reply = assistant.respond("thank you!", &DataSources::default(), None, None).await;
    assert!(reply.page.is_none());
    assert!(reply.filter.is_none());
}
