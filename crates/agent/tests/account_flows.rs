//! Password reset and profile edit through the dispatcher

mod common;

use std::sync::Arc;

use chrono::Duration;
use common::{assistant_with_clock, manual_clock, secret_from_uri, MockAccounts, UnavailableStore};
use ops_assistant_agent::Totp;
use ops_assistant_core::{Clock, ConversationStore, DataSources, FlowStep, UserInfo};

const EMAIL: &str = "jamie@example.com";

#[tokio::test]
async fn test_password_reset_end_to_end() {
    let clock = manual_clock();
    let (assistant, store) = assistant_with_clock(clock.clone());
    let accounts = MockAccounts::with_email(EMAIL);
    let data = DataSources::default();

    let reply = assistant.respond("I forgot my password", &data, None, Some(&accounts)).await;
    assert!(reply.message.contains("email"));
    let state = store.get_state("anonymous").await.unwrap().unwrap();
    assert_eq!(state.step, FlowStep::AwaitingEmail);

    let reply = assistant.respond("it's Jamie@Example.com", &data, None, Some(&accounts)).await;
    let uri = reply.qr_code.expect("challenge carries a provisioning URI");
    assert!(uri.starts_with("otpauth://totp/OpsAssistant:jamie@example.com?secret="));
    assert!(uri.ends_with("&algorithm=SHA1&digits=6&period=30"));

    let secret = secret_from_uri(&uri);
    let totp = Totp::default();
    let valid = totp.code_at(&secret, clock.now()).unwrap();
    let wrong = format!("{:06}", (valid.parse::<u32>().unwrap() + 500_000) % 1_000_000);

    let reply = assistant.respond(&wrong, &data, None, Some(&accounts)).await;
    assert!(reply.message.contains("incorrect"));
    assert_eq!(accounts.password_update_count(), 0);

    // still within the ±1 step window
    clock.advance(Duration::seconds(20));
    let reply = assistant
        .respond(&format!("my code is {}", valid), &data, None, Some(&accounts))
        .await;

    assert_eq!(accounts.password_update_count(), 1);
    let password = accounts.last_password.lock().clone().unwrap();
    assert_eq!(password.len(), 12);
    assert!(reply.message.contains(&password));
    assert!(store.get_state("anonymous").await.unwrap().is_none());
}

#[tokio::test]
async fn test_reset_with_email_in_trigger() {
    let (assistant, store) = assistant_with_clock(manual_clock());
    let accounts = MockAccounts::with_email(EMAIL);
    let user = UserInfo::new("jtan", "Jamie Tan", EMAIL);

    let data = DataSources::default();
    let reply = assistant
        .respond("reset password for jamie@example.com", &data, Some(&user), Some(&accounts))
        .await;
    assert!(reply.qr_code.is_some());
    let state = store.get_state(EMAIL).await.unwrap().unwrap();
    assert_eq!(state.step, FlowStep::AwaitingCode);
}

#[tokio::test]
async fn test_unknown_email_clears_state() {
    let (assistant, store) = assistant_with_clock(manual_clock());
    let accounts = MockAccounts::with_email(EMAIL);
    let data = DataSources::default();

    assistant.respond("can't login", &data, None, Some(&accounts)).await;
    let reply = assistant.respond("nobody@example.com", &data, None, Some(&accounts)).await;

    assert!(reply.message.contains("No account is registered"));
    assert!(reply.qr_code.is_none());
    assert!(store.get_state("anonymous").await.unwrap().is_none());
    assert_eq!(accounts.password_update_count(), 0);
}

#[tokio::test]
async fn test_missing_callbacks_abort_flow() {
    let (assistant, store) = assistant_with_clock(manual_clock());
    let data = DataSources::default();

    assistant.respond("forgot password", &data, None, None).await;
    let reply = assistant.respond(EMAIL, &data, None, None).await;

    assert!(reply.message.contains("something went wrong"));
    assert!(store.get_state("anonymous").await.unwrap().is_none());
}

#[tokio::test]
async fn test_too_many_wrong_codes() {
    let clock = manual_clock();
    let (assistant, store) = assistant_with_clock(clock.clone());
    let accounts = MockAccounts::with_email(EMAIL);
    let data = DataSources::default();

    assistant.respond("forgot password", &data, None, Some(&accounts)).await;
    let reply = assistant.respond(EMAIL, &data, None, Some(&accounts)).await;
    let secret = secret_from_uri(&reply.qr_code.unwrap());
    let valid = Totp::default().code_at(&secret, clock.now()).unwrap();
    let wrong = format!("{:06}", (valid.parse::<u32>().unwrap() + 500_000) % 1_000_000);

    for _ in 0..4 {
        let reply = assistant.respond(&wrong, &data, None, Some(&accounts)).await;
        assert!(reply.message.contains("attempts left"));
    }
    let reply = assistant.respond(&wrong, &data, None, Some(&accounts)).await;
    assert!(reply.message.contains("Too many incorrect codes"));
    assert!(store.get_state("anonymous").await.unwrap().is_none());

    // the old code no longer resets anything
    assistant.respond(&valid, &data, None, Some(&accounts)).await;
    assert_eq!(accounts.password_update_count(), 0);
}

#[tokio::test]
async fn test_failing_password_callback_degrades() {
    let clock = manual_clock();
    let (assistant, store) = assistant_with_clock(clock.clone());
    let accounts = MockAccounts {
        fail_updates: true,
        ..MockAccounts::with_email(EMAIL)
    };
    let data = DataSources::default();

    assistant.respond("forgot password", &data, None, Some(&accounts)).await;
    let reply = assistant.respond(EMAIL, &data, None, Some(&accounts)).await;
    let secret = secret_from_uri(&reply.qr_code.unwrap());
    let code = Totp::default().code_at(&secret, clock.now()).unwrap();

    let reply = assistant.respond(&code, &data, None, Some(&accounts)).await;
    assert!(reply.message.contains("something went wrong"));
    assert_eq!(accounts.password_update_count(), 1);
    assert!(store.get_state("anonymous").await.unwrap().is_none());
}

#[tokio::test]
async fn test_chinese_flow_stays_chinese() {
    let (assistant, _) = assistant_with_clock(manual_clock());
    let accounts = MockAccounts::with_email(EMAIL);
    let data = DataSources::default();

    let reply = assistant.respond("我忘记密码了", &data, None, Some(&accounts)).await;
    assert!(reply.message.contains("邮箱"));
    let reply = assistant.respond("not an email", &data, None, Some(&accounts)).await;
    assert!(reply.message.contains("邮箱"));
}

#[tokio::test]
async fn test_profile_edit_in_one_step() {
    let (assistant, store) = assistant_with_clock(manual_clock());
    let accounts = MockAccounts::with_email(EMAIL);
    let user = UserInfo::new("jtan", "Jamie Tan", EMAIL);

    let data = DataSources::default();
    let reply = assistant
        .respond("change my name to Alex Tan", &data, Some(&user), Some(&accounts))
        .await;

    assert_eq!(reply.requires_refresh, Some(true));
    assert!(reply.message.contains("Alex Tan"));
    assert_eq!(
        accounts.profile_updates.lock().as_slice(),
        &[(EMAIL.to_string(), Some("Alex Tan".to_string()), Some("Alex Tan".to_string()))]
    );
    assert!(store.get_state(EMAIL).await.unwrap().is_none());
}

#[tokio::test]
async fn test_profile_edit_asks_for_name() {
    let (assistant, store) = assistant_with_clock(manual_clock());
    let accounts = MockAccounts::with_email(EMAIL);
    let user = UserInfo::new("jtan", "Jamie Tan", EMAIL);
    let data = DataSources::default();

    let reply = assistant.respond("edit my profile", &data, Some(&user), Some(&accounts)).await;
    assert!(reply.message.contains("new name"));
    assert_eq!(store.get_state(EMAIL).await.unwrap().unwrap().step, FlowStep::AwaitingName);

    let reply = assistant
        .respond("please could you tell me more", &data, Some(&user), Some(&accounts))
        .await;
    assert!(reply.requires_refresh.is_none());

    let reply = assistant.respond("Lex", &data, Some(&user), Some(&accounts)).await;
    assert_eq!(reply.requires_refresh, Some(true));
    assert_eq!(accounts.profile_updates.lock().len(), 1);
}

#[tokio::test]
async fn test_profile_edit_requires_sign_in() {
    let (assistant, store) = assistant_with_clock(manual_clock());
    let accounts = MockAccounts::with_email(EMAIL);

    let data = DataSources::default();

    let reply = assistant
        .respond("change my name to Alex", &data, None, Some(&accounts))
        .await;
    assert!(reply.message.contains("new name"));
    let state = store.get_state("anonymous").await.unwrap().unwrap();
    assert_eq!(state.step, FlowStep::AwaitingName);

    let reply = assistant.respond("Alex", &data, None, Some(&accounts)).await;
    assert!(reply.message.contains("signed in"));
    assert!(accounts.profile_updates.lock().is_empty());
    assert_eq!(store.active_count(), 0);
}

#[tokio::test]
async fn test_unavailable_store_degrades() {
    let (assistant, _) = assistant_with_clock(manual_clock());
    let assistant = assistant.with_store(Arc::new(UnavailableStore));
    let accounts = MockAccounts::with_email(EMAIL);
    let data = DataSources::default();

    let reply = assistant.respond("forgot password", &data, None, Some(&accounts)).await;
    assert!(reply.message.starts_with("Sorry, something went wrong"));

    // no flow can be read back, so the next message is handled from scratch
    let reply = assistant.respond("jamie@example.com", &data, None, Some(&accounts)).await;
    assert!(reply.qr_code.is_none());
    assert_eq!(accounts.verify_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_expired_flow_is_forgotten() {
    let clock = manual_clock();
    let (assistant, store) = assistant_with_clock(clock.clone());
    let accounts = MockAccounts::with_email(EMAIL);
    let data = DataSources::default();

    assistant.respond("forgot password", &data, None, Some(&accounts)).await;
    clock.advance(Duration::seconds(301));

    assert!(store.get_state("anonymous").await.unwrap().is_none());
    assert_eq!(store.active_count(), 0);

    // the email is no longer consumed by a flow
    assistant.respond(EMAIL, &data, None, Some(&accounts)).await;
    assert_eq!(accounts.verify_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}
