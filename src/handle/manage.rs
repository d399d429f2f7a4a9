//! Handlers only admins get anything out of.

use axum::{extract::State, Json};
use gaam_shared::{
    account::{
        handle::manage::{CreateAdminDescriptor, ListRegistrationsDescriptor, ReviewDescriptor},
        AccountInfo,
    },
    gaam::{
        handle::{AdminGaamsDescriptor, CreateGaamDescriptor, SetAssignmentsDescriptor},
        GaamInfo,
    },
    Page,
};

use crate::{
    account::{manage, registration},
    gaam::{self, Gaam},
    session::Auth,
    store::Store,
    Error, Global,
};

fn infos(store: &dyn Store, gaams: Vec<Gaam>) -> Vec<GaamInfo> {
    gaams.iter().map(|g| g.info(store)).collect()
}

pub async fn registrations(
    State(global): State<Global>,
    auth: Auth,
    Json(desc): Json<ListRegistrationsDescriptor>,
) -> Result<Json<Page<AccountInfo>>, Error> {
    registration::list(
        &global,
        &auth.account,
        registration::ListQuery {
            status: desc.status,
            gaam: desc.gaam,
            page: desc.page,
            limit: desc.limit,
        },
    )
    .map(Json)
}

pub async fn review(
    State(global): State<Global>,
    auth: Auth,
    Json(desc): Json<ReviewDescriptor>,
) -> Result<Json<AccountInfo>, Error> {
    let account = registration::review(
        &global,
        &auth.account,
        &desc.target,
        desc.decision,
        desc.notes.as_deref(),
    )
    .await?;
    Ok(Json(account.info()))
}

pub async fn assignments(
    State(global): State<Global>,
    auth: Auth,
    Json(desc): Json<AdminGaamsDescriptor>,
) -> Result<Json<Vec<GaamInfo>>, Error> {
    let gaams = gaam::admin_gaams(&global, &auth.account, &desc.admin)?;
    Ok(Json(infos(global.store.as_ref(), gaams)))
}

pub async fn set_assignments(
    State(global): State<Global>,
    auth: Auth,
    Json(desc): Json<SetAssignmentsDescriptor>,
) -> Result<Json<Vec<GaamInfo>>, Error> {
    let gaams = gaam::set_assignments(&global, &auth.account, &desc.admin, &desc.gaams)?;
    Ok(Json(infos(global.store.as_ref(), gaams)))
}

pub async fn create_gaam(
    State(global): State<Global>,
    auth: Auth,
    Json(desc): Json<CreateGaamDescriptor>,
) -> Result<Json<GaamInfo>, Error> {
    let gaam = gaam::create(&global, &auth.account, &desc.name, desc.admin.as_deref())?;
    Ok(Json(gaam.info(global.store.as_ref())))
}

pub async fn create_admin(
    State(global): State<Global>,
    auth: Auth,
    Json(desc): Json<CreateAdminDescriptor>,
) -> Result<Json<AccountInfo>, Error> {
    let account =
        manage::create_admin(&global, &auth.account, &desc.full_name, &desc.email, desc.role)
            .await?;
    Ok(Json(account.info()))
}
