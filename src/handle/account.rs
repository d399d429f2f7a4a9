use axum::{extract::State, Json};
use gaam_shared::account::{
    handle::{LoginDescriptor, LoginResult, RegisterDescriptor, RegisterResult, RequestOtpDescriptor},
    AccountInfo,
};

use crate::{
    account::{auth, otp, registration},
    session::Auth,
    Error, Global,
};

pub async fn register(
    State(global): State<Global>,
    Json(desc): Json<RegisterDescriptor>,
) -> Result<Json<RegisterResult>, Error> {
    let account = registration::submit(&global, &desc.full_name, &desc.email, &desc.gaam).await?;
    Ok(Json(RegisterResult {
        id: account.id,
        username: account.username,
        status: account.status,
    }))
}

/// Answers the same way whether or not a code was sent.
pub async fn request_otp(
    State(global): State<Global>,
    Json(RequestOtpDescriptor { identifier }): Json<RequestOtpDescriptor>,
) -> Result<(), Error> {
    otp::request(&global, &identifier).await
}

pub async fn login(
    State(global): State<Global>,
    Json(desc): Json<LoginDescriptor>,
) -> Result<Json<LoginResult>, Error> {
    let account = auth::authenticate(
        &global,
        &desc.identifier,
        desc.password.as_deref(),
        desc.otp.as_deref(),
    )?;
    let (token, expire_at) = global.sessions.issue(&account.id);
    tracing::info!("{} logged in", account.id);
    Ok(Json(LoginResult {
        token,
        expire_at,
        account: account.info(),
    }))
}

pub async fn logout(State(global): State<Global>, auth: Auth) -> Result<(), Error> {
    global.sessions.revoke(&auth.token);
    Ok(())
}

pub async fn self_info(
    State(global): State<Global>,
    auth: Auth,
) -> Result<Json<AccountInfo>, Error> {
    global
        .store
        .account(&auth.account)
        .map(|account| Json(account.info()))
        .ok_or(Error::AccountNotFound)
}
