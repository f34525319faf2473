use actix_web::{App, HttpServer, web};
use anyhow::Result;

use payday::{AppState, Config, PayrollService, SubmissionService, database, routes};

#[actix_web::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = Config::from_env()?;
    log::info!(
        "Starting payday backend on {} ({})",
        config.server_address(),
        config.environment
    );

    let pool = database::init_database(&config.database_url).await?;

    let state = web::Data::new(AppState {
        submissions: SubmissionService::new(pool.clone()),
        payroll: PayrollService::new(pool.clone(), config.payroll_workers),
    });
    let config_data = web::Data::new(config.clone());

    let address = config.server_address();
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(config_data.clone())
            .configure(routes::configure)
    })
    .bind(address)?
    .run()
    .await?;

    Ok(())
}
