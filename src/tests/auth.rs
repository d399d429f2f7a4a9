use chrono::{DateTime, Duration};

use super::*;

use crate::account::{
    auth::{authenticate, authenticate_at},
    otp,
};

async fn member_with_code(fx: &Fixture, now: DateTime<Utc>) -> (Account, Code) {
    let root = fx.admin("root", Role::SuperAdmin, "root-password");
    let gaam = fx.gaam("Navagam", None);
    let member = fx.approved_member("Asha", "asha@x.com", &gaam, &root).await;
    otp::request_at(&fx.global, "asha", now).await.unwrap();
    let code = fx.mailer.last_otp("asha@x.com").unwrap();
    (member, code)
}

#[tokio::test]
async fn approved_members_log_in_with_a_code() {
    let fx = Fixture::new();
    let now = Utc::now();
    let (member, code) = member_with_code(&fx, now).await;
    let code = code.to_string();

    let account = authenticate_at(&fx.global, "ASHA@x.com", None, Some(&code), now).unwrap();
    assert_eq!(account.id, member.id);
    assert!(account.otp.is_none());

    // Single use.
    assert!(matches!(
        authenticate_at(&fx.global, "asha", None, Some(&code), now),
        Err(Error::InvalidOtp)
    ));
}

#[tokio::test]
async fn code_in_password_field_is_accepted() {
    let fx = Fixture::new();
    let now = Utc::now();
    let (member, code) = member_with_code(&fx, now).await;

    let account =
        authenticate_at(&fx.global, "asha", Some(&code.to_string()), None, now).unwrap();
    assert_eq!(account.id, member.id);
}

#[tokio::test]
async fn codes_expire_after_fifteen_minutes() {
    let fx = Fixture::new();
    let now = Utc::now();
    let (_, code) = member_with_code(&fx, now).await;
    let code = code.to_string();

    let late = now + Duration::minutes(otp::Otp::TTL_MINUTES) + Duration::seconds(1);
    assert!(matches!(
        authenticate_at(&fx.global, "asha", None, Some(&code), late),
        Err(Error::OtpExpired)
    ));
    // Expiry does not consume the code.
    let edge = now + Duration::minutes(otp::Otp::TTL_MINUTES);
    authenticate_at(&fx.global, "asha", None, Some(&code), edge).unwrap();
}

#[tokio::test]
async fn wrong_or_missing_codes_are_refused() {
    let fx = Fixture::new();
    let now = Utc::now();
    let (member, code) = member_with_code(&fx, now).await;
    let wrong = if code.to_string() == "123456" { "654321" } else { "123456" };

    assert!(matches!(
        authenticate_at(&fx.global, "asha", None, Some(wrong), now),
        Err(Error::InvalidOtp)
    ));
    assert!(matches!(
        authenticate_at(&fx.global, "asha", None, Some("12345"), now),
        Err(Error::InvalidOtp)
    ));
    assert!(matches!(
        authenticate_at(&fx.global, "asha", None, None, now),
        Err(Error::OtpRequired)
    ));
    assert!(matches!(
        authenticate_at(&fx.global, "asha", Some(""), Some("  "), now),
        Err(Error::OtpRequired)
    ));
    // A wrong attempt leaves the pending code usable.
    assert!(fx.store().account(&member.id).unwrap().otp.is_some());
    authenticate_at(&fx.global, "asha", None, Some(&code.to_string()), now).unwrap();
}

#[tokio::test]
async fn new_code_replaces_the_old_one() {
    let fx = Fixture::new();
    let now = Utc::now();
    let (_, first) = member_with_code(&fx, now).await;
    otp::request_at(&fx.global, "asha", now).await.unwrap();
    let second = fx.mailer.last_otp("asha@x.com").unwrap();

    if first != second {
        assert!(matches!(
            authenticate_at(&fx.global, "asha", None, Some(&first.to_string()), now),
            Err(Error::InvalidOtp)
        ));
    }
    authenticate_at(&fx.global, "asha", None, Some(&second.to_string()), now).unwrap();
}

#[tokio::test]
async fn undecided_registrations_signal_their_status() {
    let fx = Fixture::new();
    let root = fx.admin("root", Role::SuperAdmin, "root-password");
    let gaam = fx.gaam("Navagam", None);
    fx.register("Asha", "asha@x.com", &gaam).await;
    let kiran = fx.register("Kiran", "kiran@x.com", &gaam).await;
    crate::account::registration::review(
        &fx.global,
        &root.id,
        kiran.id.as_str(),
        Status::Rejected,
        None,
    )
    .await
    .unwrap();

    assert!(matches!(
        authenticate(&fx.global, "asha", None, Some("123456")),
        Err(Error::PendingVerification)
    ));
    assert!(matches!(
        authenticate(&fx.global, "kiran@x.com", Some("whatever"), None),
        Err(Error::RegistrationRejected)
    ));
}

#[tokio::test]
async fn ineligible_accounts_get_no_code() {
    let fx = Fixture::new();
    fx.admin("root", Role::SuperAdmin, "root-password");
    let gaam = fx.gaam("Navagam", None);
    let pending = fx.register("Asha", "asha@x.com", &gaam).await;
    let before = fx.mailer.sent().len();

    otp::request(&fx.global, "asha").await.unwrap();
    otp::request(&fx.global, "root").await.unwrap();
    otp::request(&fx.global, "nobody@x.com").await.unwrap();

    assert_eq!(fx.mailer.sent().len(), before);
    assert!(fx.store().account(&pending.id).unwrap().otp.is_none());
}

#[tokio::test]
async fn undelivered_codes_fail_the_request() {
    let fx = Fixture::new();
    let root = fx.admin("root", Role::SuperAdmin, "root-password");
    let gaam = fx.gaam("Navagam", None);
    let member = fx.approved_member("Asha", "asha@x.com", &gaam, &root).await;

    fx.mailer.set_failing(true);
    assert!(otp::request(&fx.global, "asha").await.is_err());
    assert!(fx.store().account(&member.id).unwrap().otp.is_none());
    // Unknown identifiers still answer the same way.
    otp::request(&fx.global, "nobody").await.unwrap();
}

#[tokio::test]
async fn undelivered_code_keeps_the_delivered_one() {
    let fx = Fixture::new();
    let now = Utc::now();
    let (member, delivered) = member_with_code(&fx, now).await;

    fx.mailer.set_failing(true);
    assert!(otp::request_at(&fx.global, "asha", now).await.is_err());

    let pending = fx.store().account(&member.id).unwrap().otp.unwrap();
    assert_eq!(pending.code, delivered);
    authenticate_at(&fx.global, "asha", None, Some(&delivered.to_string()), now).unwrap();
}

#[tokio::test]
async fn concurrent_logins_consume_a_code_once() {
    const ATTEMPTS: usize = 8;
    let fx = Fixture::new();
    let now = Utc::now();
    let (member, code) = member_with_code(&fx, now).await;
    let code = code.to_string();
    let barrier = std::sync::Barrier::new(ATTEMPTS);

    let results: Vec<Result<Account, Error>> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..ATTEMPTS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    otp::verify_at(&fx.global, &member.id, &code, now)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|err| matches!(err, Error::InvalidOtp)));
    assert!(fx.store().account(&member.id).unwrap().otp.is_none());
}

#[tokio::test]
async fn admins_log_in_with_their_password() {
    let fx = Fixture::new();
    let root = fx.admin("root", Role::SuperAdmin, "root-password");
    let ravi = fx.admin("ravi", Role::GaamAdmin, "admin-password");

    assert_eq!(
        authenticate(&fx.global, "root", Some("root-password"), None)
            .unwrap()
            .id,
        root.id
    );
    assert_eq!(
        authenticate(&fx.global, "RAVI@gaam.test", Some("admin-password"), None)
            .unwrap()
            .id,
        ravi.id
    );
    assert!(matches!(
        authenticate(&fx.global, "root", Some("admin-password"), None),
        Err(Error::InvalidCredentials)
    ));
    assert!(matches!(
        authenticate(&fx.global, "root", None, Some("123456")),
        Err(Error::InvalidCredentials)
    ));
}

#[tokio::test]
async fn unknown_identifiers_look_like_wrong_passwords() {
    let fx = Fixture::new();
    fx.admin("root", Role::SuperAdmin, "root-password");

    let unknown = authenticate(&fx.global, "nobody", Some("root-password"), None).unwrap_err();
    let wrong = authenticate(&fx.global, "root", Some("nope"), None).unwrap_err();
    assert!(matches!(unknown, Error::InvalidCredentials));
    assert_eq!(unknown.to_string(), wrong.to_string());
    assert_eq!(unknown.to_status_code(), wrong.to_status_code());
}
