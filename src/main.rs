use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, middleware::Logger, web};
use anyhow::Result;

use leaveflow::database::init_database;
use leaveflow::{Config, EscalationScheduler, WorkflowEngine, postgres_ports, routes};

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now()
    }))
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    env_logger::init();

    let config = Config::from_env()?;
    let payroll_timezone = config.payroll_timezone()?;
    log::info!(
        "Configuration loaded (environment: {}, payroll timezone: {})",
        config.environment,
        payroll_timezone
    );

    let pool = init_database(&config.database_url).await?;
    log::info!("Database initialized");

    let ports = postgres_ports(pool);
    let engine = WorkflowEngine::new(ports.clone(), payroll_timezone);

    // Runs beside the HTTP server, never inside a request
    let scheduler = EscalationScheduler::new(ports, config.escalation_settings());
    let _escalation_task = scheduler.spawn();

    let engine_data = web::Data::new(engine);
    let cors_origin = config.cors_allowed_origin.clone();
    let server_address = config.server_address();
    log::info!("Server starting on http://{}", server_address);

    HttpServer::new(move || {
        App::new()
            .app_data(engine_data.clone())
            .wrap(
                Cors::default()
                    .allowed_origin(&cors_origin)
                    .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
                    .allowed_headers(vec!["Content-Type", "Accept"])
                    .max_age(3600),
            )
            .wrap(Logger::new(r#"%a "%r" %s %b "%{User-Agent}i" %T"#))
            .service(health)
            .configure(routes::configure)
    })
    .bind(&server_address)?
    .run()
    .await?;

    Ok(())
}
