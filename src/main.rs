use std::{process::ExitCode, sync::Arc};

use exam_admin::{
    app_state::AppState,
    config::Config,
    errors::{AppError, ErrorResponse},
    storage::FileStorage,
};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let response = ErrorResponse::from(&err);
            log::error!("{} ({})", response.error, response.code);
            if matches!(err, AppError::Configuration(_)) {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

async fn run() -> Result<(), AppError> {
    let config = Config::from_env();
    log::info!(
        "API base URL: {} (auth: {:?}, upload: {:?})",
        config.api_base_url,
        config.auth_strategy,
        config.upload_strategy
    );

    let storage = Arc::new(FileStorage::open(&config.storage_dir)?);
    let state = AppState::new(config, storage)?;

    let session = state.session.restore();
    log::info!("Session: {}", session);

    let Some(user) = session.user() else {
        log::info!("No stored session; sign in to use the dashboard");
        return Ok(());
    };
    log::info!("Signed in as {}", user.display_name());

    let (summary, recent) = futures::try_join!(
        state.admin_service.dashboard(),
        state.admin_service.recent_histories(),
    )?;

    log::info!(
        "Users: {}, exams: {}, attempts: {}",
        summary.totals.users,
        summary.totals.exams,
        summary.totals.exam_histories
    );
    for history in recent.data {
        log::info!(
            "  {} scored {} on {} ({})",
            history.user.as_ref().map(|u| u.display_name()).unwrap_or("?"),
            history.score.unwrap_or_default(),
            history
                .exam
                .as_ref()
                .and_then(|e| e.title.as_deref())
                .unwrap_or("?"),
            history.time_spent_label().unwrap_or_else(|| "-".to_string())
        );
    }

    Ok(())
}
