mod auth;
mod cache;
mod clients;
mod config;
mod database;
mod errors;
mod handlers;
mod listings;
mod models;

use std::time::Duration;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};

use crate::cache::ResponseCache;
use crate::clients::{mail::Mailer, payments::PaymentGatewayClient, sms::SmsClient};
use crate::config::AppConfig;
use crate::database::Database;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env()
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidInput, err))?;
    let bind_address = config.bind_address();

    let db = Database::connect(&config.database_url).await.map_err(|err| {
        log::error!("Failed to initialize database: {err:?}");
        std::io::Error::new(std::io::ErrorKind::Other, err)
    })?;

    std::fs::create_dir_all(format!("{}/images", config.upload_dir))?;
    std::fs::create_dir_all(format!("{}/proofs", config.upload_dir))?;

    let cache = ResponseCache::new(Duration::from_secs(config.cache_ttl_secs));
    let gateway = PaymentGatewayClient::new(
        config.payment_gateway_url.clone(),
        config.payment_gateway_secret.clone(),
    );
    let mailer = Mailer::new(
        config.mail_api_url.clone(),
        config.mail_api_key.clone(),
        config.mail_from.clone(),
    );
    let sms = SmsClient::new(config.sms_api_url.clone(), config.sms_api_key.clone());

    let upload_dir = config.upload_dir.clone();
    let config_data = web::Data::new(config);
    let db_data = web::Data::new(db);
    let cache_data = web::Data::new(cache);
    let gateway_data = web::Data::new(gateway);
    let mailer_data = web::Data::new(mailer);
    let sms_data = web::Data::new(sms);

    log::info!("🚀 Starting LocalDex Directory Service on {}", bind_address);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(config_data.clone())
            .app_data(db_data.clone())
            .app_data(cache_data.clone())
            .app_data(gateway_data.clone())
            .app_data(mailer_data.clone())
            .app_data(sms_data.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .service(
                web::scope("/api/v1")
                    // Health
                    .service(handlers::health_check)
                    // Accounts
                    .service(handlers::users::login)
                    .service(handlers::users::oauth_login)
                    .service(handlers::users::get_profile)
                    .service(handlers::users::update_profile)
                    .service(handlers::users::change_password)
                    .service(handlers::users::forgot_password)
                    .service(handlers::users::reset_password)
                    // Businesses ("mine" before the id catch-all)
                    .service(handlers::businesses::register_business)
                    .service(handlers::businesses::list_businesses)
                    .service(handlers::businesses::my_businesses)
                    .service(handlers::businesses::businesses_by_category)
                    .service(handlers::businesses::get_business)
                    .service(handlers::businesses::update_business)
                    .service(handlers::businesses::delete_business)
                    // Services
                    .service(handlers::services::register_service)
                    .service(handlers::services::list_services)
                    .service(handlers::services::my_services)
                    .service(handlers::services::services_by_category)
                    .service(handlers::services::get_service)
                    .service(handlers::services::update_service)
                    .service(handlers::services::delete_service)
                    // Combined listing search
                    .service(handlers::listings::search_listings)
                    .service(handlers::listings::list_categories)
                    // Reviews ("mine" before the typed path catch-all)
                    .service(handlers::reviews::create_review)
                    .service(handlers::reviews::my_reviews)
                    .service(handlers::reviews::list_reviews)
                    .service(handlers::reviews::reply_to_review)
                    .service(handlers::reviews::delete_review)
                    // Claims
                    .service(handlers::claims::create_claim)
                    .service(handlers::claims::my_claims)
                    .service(handlers::claims::list_claims)
                    .service(handlers::claims::get_claim)
                    .service(handlers::claims::approve_claim)
                    .service(handlers::claims::reject_claim)
                    // Payments
                    .service(handlers::payments::initialize_payment)
                    .service(handlers::payments::verify_payment)
                    .service(handlers::payments::my_payments)
                    .service(handlers::payments::list_payments)
                    // Admin
                    .service(handlers::admin::pending_listings)
                    .service(handlers::admin::set_business_status)
                    .service(handlers::admin::set_service_status)
                    .service(handlers::admin::admin_stats)
                    .service(handlers::admin::list_users)
                    .service(handlers::admin::delete_user)
                    .service(handlers::admin::list_settings)
                    .service(handlers::admin::upsert_setting)
                    // Phone verification
                    .service(handlers::otp::send_otp)
                    .service(handlers::otp::verify_otp)
                    // File handling
                    .service(handlers::uploads::upload_files),
            )
            // Proof downloads and public images live at the root, matching
            // the paths the upload endpoint hands back.
            .service(handlers::uploads::download_file)
            .service(actix_files::Files::new(
                "/uploads",
                format!("{}/images", upload_dir),
            ))
    })
    .bind(&bind_address)?
    .run()
    .await
}
