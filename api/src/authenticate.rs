use entity::user;

use rocket::http::{Cookie, CookieJar, Status};
use rocket::outcome::{IntoOutcome, Outcome};
use rocket::serde::json::Json;
use rocket::{
    get, post,
    request::{self, FromRequest},
    Request, State,
};

use rocket_okapi::{openapi, request::OpenApiFromRequest};
use sea_orm::DatabaseConnection;

use service::dto::{LoginInput, Me};
use service::error::{AuthError, GenericError};
use service::sync::Synchronizer;

const AUTH_COOKIE: &str = "auth";

/// The signed-in participant, read from the private `auth` cookie.
#[derive(OpenApiFromRequest, Debug)]
pub struct UserAuthentication(pub user::Model);

/// A signed-in participant with the administrator flag.
#[derive(OpenApiFromRequest, Debug)]
pub struct AdminAuthentication(pub user::Model);

impl UserAuthentication {
    pub fn user(&self) -> &user::Model {
        &self.0
    }

    fn remove_from_jar(cookies: &CookieJar<'_>) {
        cookies.remove_private(AUTH_COOKIE);
    }
}

impl AdminAuthentication {
    pub fn user(&self) -> &user::Model {
        &self.0
    }
}

#[rocket::async_trait]
impl<'a> FromRequest<'a> for UserAuthentication {
    type Error = AuthError;

    async fn from_request(request: &'a Request<'_>) -> request::Outcome<Self, Self::Error> {
        let Some(db) = request.rocket().state::<DatabaseConnection>() else {
            return Outcome::Error((
                Status::InternalServerError,
                AuthError::Missing("Database not available"),
            ));
        };

        let user_id = match request
            .cookies()
            .get_private(AUTH_COOKIE)
            .map(|c| c.value().parse::<i32>())
        {
            Some(Ok(id)) => id,
            Some(Err(_)) => {
                return Outcome::Error((Status::Forbidden, AuthError::Invalid("Malformed cookie")))
            }
            None => {
                return Outcome::Error((Status::Unauthorized, AuthError::Missing("No cookie found")))
            }
        };

        service::user_by_id(db, user_id)
            .await
            .ok()
            .map(UserAuthentication)
            .or_error((
                Status::Forbidden,
                AuthError::Invalid("You do not have permission to do that"),
            ))
    }
}

#[rocket::async_trait]
impl<'a> FromRequest<'a> for AdminAuthentication {
    type Error = AuthError;

    async fn from_request(request: &'a Request<'_>) -> request::Outcome<Self, Self::Error> {
        match request.guard::<UserAuthentication>().await {
            Outcome::Success(UserAuthentication(user)) if user.is_admin => {
                Outcome::Success(AdminAuthentication(user))
            }
            Outcome::Success(_) => Outcome::Error((
                Status::Forbidden,
                AuthError::NotAdmin("Only the pool administrator can do that"),
            )),
            Outcome::Error(e) => Outcome::Error(e),
            Outcome::Forward(s) => Outcome::Forward(s),
        }
    }
}

/// # Sign in
///
/// The first sign-in of a participant sets their PIN. Later sign-ins must repeat it.
///
/// # Returns
///
/// The signed-in participant, together with a private `auth` cookie.
#[openapi(tag = "User")]
#[post("/login", format = "json", data = "<login_data>")]
pub(crate) async fn login(
    login_data: Json<LoginInput>,
    db: &State<DatabaseConnection>,
    synchronizer: &State<Synchronizer>,
    cookies: &CookieJar<'_>,
) -> Result<Json<Me>, GenericError> {
    let login_data = login_data.into_inner();
    let (user, pin_set) = service::sign_in(db.inner(), &login_data.name, &login_data.pin).await?;
    if pin_set {
        synchronizer.persist_users(db.inner()).await;
    }
    cookies.add_private(Cookie::new(AUTH_COOKIE, user.id.to_string()));
    Ok(Json(Me::from(&user)))
}

#[openapi(tag = "User")]
#[post("/logout")]
pub(crate) async fn logout(cookies: &CookieJar<'_>) -> &'static str {
    UserAuthentication::remove_from_jar(cookies);
    "Successfully logged out"
}

#[openapi(tag = "User")]
#[get("/me")]
pub(crate) async fn me(user: UserAuthentication) -> Json<Me> {
    Json(Me::from(user.user()))
}
