//! Integration tests for signup.
//!
//! Drives `RegistrationService::sign_up` against in-memory stores and checks
//! what was persisted and mailed.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::Duration;

use enlist_core::EmailValidator;
use enlist_integration_tests::{BASE_URL, TestContext, start_time};
use enlist_server::services::{Argon2Hasher, RegistrationError, SignUpOutcome, SignUpRequest};

fn ann() -> SignUpRequest {
    SignUpRequest::new("Ann", "Lee", "ann@x.com", "secret")
}

// =============================================================================
// New Accounts
// =============================================================================

#[tokio::test]
async fn test_signup_creates_one_pending_user_one_token_one_send() {
    let ctx = TestContext::new();

    let outcome = ctx.service().sign_up(&ann()).await.unwrap();
    assert!(matches!(outcome, SignUpOutcome::Registered { .. }));

    let users = ctx.users.all();
    assert_eq!(users.len(), 1);
    assert!(!users[0].enabled);
    assert_eq!(users[0].first_name, "Ann");
    assert_eq!(users[0].last_name, "Lee");

    let tokens = ctx.tokens.all();
    assert_eq!(tokens.len(), 1);
    assert_eq!(&tokens[0].token, outcome.token());
    assert_eq!(tokens[0].owner_email.as_str(), "ann@x.com");
    assert_eq!(tokens[0].created_at, start_time());
    assert_eq!(tokens[0].expires_at, start_time() + Duration::minutes(15));
    assert!(tokens[0].confirmed_at.is_none());

    assert_eq!(ctx.mailer.sent().len(), 1);
}

#[tokio::test]
async fn test_signup_mail_greets_user_and_links_to_token() {
    let ctx = TestContext::new();

    let outcome = ctx.service().sign_up(&ann()).await.unwrap();

    let sent = ctx.mailer.sent();
    assert_eq!(sent[0].to.as_str(), "ann@x.com");
    assert!(sent[0].html.contains("Hello Ann,"));

    let expected_link = format!("{BASE_URL}/registration/confirm?token={}", outcome.token());
    assert!(sent[0].html.contains(&expected_link));
    assert_eq!(sent[0].token().as_deref(), Some(outcome.token().as_str()));
}

#[tokio::test]
async fn test_signup_does_not_store_plain_password() {
    let ctx = TestContext::with_hasher(Arc::new(Argon2Hasher::new()));

    ctx.service().sign_up(&ann()).await.unwrap();

    let user = ctx.users.get("ann@x.com").unwrap();
    assert_ne!(user.password_hash, "secret");
    assert!(user.password_hash.starts_with("$argon2"));
}

#[tokio::test]
async fn test_signup_trims_names_and_email() {
    let ctx = TestContext::new();
    let request = SignUpRequest::new("  Ann ", " Lee", " ann@x.com ", "secret");

    ctx.service().sign_up(&request).await.unwrap();

    let user = ctx.users.get("ann@x.com").unwrap();
    assert_eq!(user.first_name, "Ann");
    assert_eq!(user.last_name, "Lee");
}

// =============================================================================
// Existing Accounts
// =============================================================================

#[tokio::test]
async fn test_repeat_signup_for_pending_user_resends() {
    let ctx = TestContext::new();

    let first = ctx.service().sign_up(&ann()).await.unwrap();
    let second = ctx.service().sign_up(&ann()).await.unwrap();

    assert!(matches!(second, SignUpOutcome::ConfirmationResent { .. }));
    assert_ne!(first.token(), second.token());
    assert_eq!(ctx.users.all().len(), 1);
    assert_eq!(ctx.tokens.for_email("ann@x.com").len(), 2);

    let sent = ctx.mailer.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].token().as_deref(), Some(second.token().as_str()));
}

#[tokio::test]
async fn test_repeat_signup_with_real_hasher_resends() {
    let ctx = TestContext::with_hasher(Arc::new(Argon2Hasher::new()));

    ctx.service().sign_up(&ann()).await.unwrap();
    let second = ctx.service().sign_up(&ann()).await.unwrap();

    assert!(matches!(second, SignUpOutcome::ConfirmationResent { .. }));
}

#[tokio::test]
async fn test_repeat_signup_for_enabled_user_is_rejected() {
    let ctx = TestContext::new();

    let first = ctx.service().sign_up(&ann()).await.unwrap();
    ctx.service().confirm_token(first.token()).await.unwrap();

    let err = ctx.service().sign_up(&ann()).await.unwrap_err();

    assert!(matches!(err, RegistrationError::EmailTaken));
    assert_eq!(ctx.mailer.sent().len(), 1);
    assert_eq!(ctx.tokens.all().len(), 1);
}

#[tokio::test]
async fn test_signup_with_different_details_is_rejected() {
    let ctx = TestContext::new();
    ctx.service().sign_up(&ann()).await.unwrap();

    let variants = [
        SignUpRequest::new("Anne", "Lee", "ann@x.com", "secret"),
        SignUpRequest::new("Ann", "Li", "ann@x.com", "secret"),
        SignUpRequest::new("Ann", "Lee", "ann@x.com", "other-secret"),
    ];

    for request in &variants {
        let err = ctx.service().sign_up(request).await.unwrap_err();
        assert!(
            matches!(err, RegistrationError::EmailTaken),
            "expected EmailTaken for {request:?}"
        );
    }

    assert_eq!(ctx.users.all().len(), 1);
    assert_eq!(ctx.tokens.all().len(), 1);
    assert_eq!(ctx.mailer.sent().len(), 1);
}

#[tokio::test]
async fn test_concurrent_insert_reports_email_taken() {
    let ctx = TestContext::new();
    ctx.service().sign_up(&ann()).await.unwrap();

    // The second request misses the account on lookup and hits the unique
    // constraint on insert.
    ctx.users.hide_next_lookup();
    let err = ctx.service().sign_up(&ann()).await.unwrap_err();

    assert!(matches!(err, RegistrationError::EmailTaken));
    assert_eq!(ctx.users.all().len(), 1);
    assert_eq!(ctx.mailer.sent().len(), 1);
}

#[tokio::test]
async fn test_email_is_compared_as_given() {
    let ctx = TestContext::new();

    ctx.service().sign_up(&ann()).await.unwrap();
    let outcome = ctx
        .service()
        .sign_up(&SignUpRequest::new("Ann", "Lee", "Ann@X.com", "secret"))
        .await
        .unwrap();

    assert!(matches!(outcome, SignUpOutcome::Registered { .. }));
    assert_eq!(ctx.users.all().len(), 2);
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn test_invalid_email_is_rejected_before_anything_is_stored() {
    let ctx = TestContext::new();

    for email in ["", "no-at-sign", "a@b.toolongtld"] {
        let request = SignUpRequest::new("Ann", "Lee", email, "secret");
        let err = ctx.service().sign_up(&request).await.unwrap_err();
        assert!(
            matches!(err, RegistrationError::InvalidEmail(_)),
            "expected InvalidEmail for {email:?}"
        );
    }

    assert!(ctx.users.all().is_empty());
    assert!(ctx.tokens.all().is_empty());
    assert!(ctx.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_plus_addressing_is_accepted() {
    let ctx = TestContext::new();
    let request = SignUpRequest::new("Ann", "Lee", "user.name+tag@example.co", "secret");

    assert!(ctx.service().sign_up(&request).await.is_ok());
}

#[tokio::test]
async fn test_blank_fields_are_rejected() {
    let ctx = TestContext::new();

    let requests = [
        SignUpRequest::new(" ", "Lee", "ann@x.com", "secret"),
        SignUpRequest::new("Ann", "", "ann@x.com", "secret"),
        SignUpRequest::new("Ann", "Lee", "ann@x.com", ""),
    ];

    for request in &requests {
        let err = ctx.service().sign_up(request).await.unwrap_err();
        assert!(matches!(err, RegistrationError::InvalidRequest(_)));
    }

    assert!(ctx.users.all().is_empty());
}

#[tokio::test]
async fn test_custom_email_pattern_is_applied() {
    let validator = EmailValidator::new(r"^[a-z]+@corp\.example$").unwrap();
    let ctx = TestContext::with_validator(validator);

    let err = ctx.service().sign_up(&ann()).await.unwrap_err();
    assert!(matches!(err, RegistrationError::InvalidEmail(_)));

    let request = SignUpRequest::new("Ann", "Lee", "ann@corp.example", "secret");
    assert!(ctx.service().sign_up(&request).await.is_ok());
}

// =============================================================================
// Mail Failures
// =============================================================================

#[tokio::test]
async fn test_mail_failure_keeps_user_and_token() {
    let ctx = TestContext::new();
    ctx.mailer.fail_sends();

    let outcome = ctx.service().sign_up(&ann()).await.unwrap();

    assert!(matches!(outcome, SignUpOutcome::Registered { .. }));
    assert_eq!(ctx.users.all().len(), 1);
    assert!(ctx.tokens.get(outcome.token()).is_some());
    assert_eq!(ctx.mailer.sent().len(), 1);
}

#[tokio::test]
async fn test_mail_failure_on_resend_keeps_new_token() {
    let ctx = TestContext::new();
    ctx.service().sign_up(&ann()).await.unwrap();

    ctx.mailer.fail_sends();
    let second = ctx.service().sign_up(&ann()).await.unwrap();

    assert!(matches!(second, SignUpOutcome::ConfirmationResent { .. }));
    assert!(ctx.tokens.get(second.token()).is_some());
    assert!(ctx.service().confirm_token(second.token()).await.is_ok());
}

// =============================================================================
// Lookup
// =============================================================================

#[tokio::test]
async fn test_find_user() {
    let ctx = TestContext::new();
    ctx.service().sign_up(&ann()).await.unwrap();

    let user = ctx.service().find_user("ann@x.com").await.unwrap();
    assert_eq!(user.first_name, "Ann");
    assert!(!user.enabled);

    let err = ctx.service().find_user("bob@x.com").await.unwrap_err();
    assert!(matches!(err, RegistrationError::UserNotFound));

    let err = ctx.service().find_user("not-an-email").await.unwrap_err();
    assert!(matches!(err, RegistrationError::InvalidEmail(_)));
}
