pub mod account;
pub mod auth;
pub mod health;
pub mod registration;
pub mod scan;
pub mod sessions;
pub mod swagger;
pub mod users;

use actix_web::web;

/// Registers every route; shared state (`SessionRegistry`, `UserRepository`) comes from app data
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        // Health
        .route("/health", web::get().to(health::health_check))
        // Stateless OCR parsing
        .service(web::scope("/api/v1/scan").route("/parse", web::post().to(scan::parse_card)))
        .service(
            web::scope("/api/v1/sessions")
                .route("", web::post().to(sessions::create_session))
                .route("/{id}", web::get().to(sessions::get_session))
                .route("/{id}", web::delete().to(sessions::end_session)),
        )
        // Session-scoped (X-Session-Id)
        .service(
            web::scope("/api/v1/auth")
                .route("/register", web::post().to(auth::register))
                .route("/login", web::post().to(auth::login))
                .route("/confirm-login", web::post().to(auth::confirm_login))
                .route("/resend-verification", web::post().to(auth::resend_verification))
                .route("/check-verification", web::post().to(auth::check_verification))
                .route("/sign-out", web::post().to(auth::sign_out))
                .route("/state", web::get().to(auth::get_state)),
        )
        .service(
            web::scope("/api/v1/registration")
                .route("", web::get().to(registration::get_progress))
                .route("/scan", web::post().to(registration::scan_card))
                .route("/credentials", web::post().to(registration::submit_credentials))
                .route("/verify", web::post().to(registration::confirm_verification))
                .route("/complete", web::post().to(registration::complete))
                .route("/reset", web::post().to(registration::reset)),
        )
        .service(
            web::scope("/api/v1/account")
                .route("/password-reset", web::post().to(account::password_reset))
                .route("/password-change", web::post().to(account::password_change))
                .route(
                    "/email-change/reauthenticate",
                    web::post().to(account::email_change_reauthenticate),
                )
                .route("/email-change", web::post().to(account::email_change)),
        )
        // User records
        .service(
            web::scope("/api/v1/users")
                .route("", web::get().to(users::list_users))
                .route("/{email}/nfc", web::put().to(users::update_nfc))
                .route("/{identifier}", web::get().to(users::get_user))
                .route("/{email}", web::delete().to(users::delete_user)),
        );
}
