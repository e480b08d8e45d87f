use clap::Parser;
use contest_provisioner::api::{self, AppState};
use contest_provisioner::commands;
use contest_provisioner::config::DataDir;
use contest_provisioner::utils::logger;
use contest_provisioner::{CliCommand, CliConfig, Provisioner};
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_logger(config.verbose);

    tracing::info!("Starting contest-provisioner");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    let provisioner = match Provisioner::open(DataDir::new(&config.data_dir)) {
        Ok(provisioner) => provisioner,
        Err(e) => {
            tracing::error!("❌ Startup failed: {} (Category: {:?})", e, e.category());
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    match config.command {
        CliCommand::Serve => serve(provisioner).await,
        CliCommand::Contest { args } => {
            let outcome = commands::execute(&provisioner.orchestrator, &args).await;
            match &outcome {
                commands::CommandOutcome::Created(_) => println!("✅ {}", outcome.message()),
                commands::CommandOutcome::Usage => eprintln!("{}", outcome.message()),
                commands::CommandOutcome::Failed(e) => {
                    eprintln!("❌ {}", outcome.message());
                    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
                }
            }
            std::process::exit(outcome.exit_code());
        }
    }
}

async fn serve(provisioner: Provisioner) -> anyhow::Result<()> {
    // 重新註冊已存在的隊伍伺服器
    provisioner.orchestrator.restore_routes().await;

    let state = AppState::new(provisioner.orchestrator.clone(), provisioner.bearer_token());
    let router = api::create_router(state, provisioner.settings.server.origin_host.as_deref());

    let addr = SocketAddr::from(([0, 0, 0, 0], provisioner.settings.server.http_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutdown requested"),
            // 無法監聽 Ctrl-C 時保持運行，發送端不可釋放
            Err(e) => {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        }
        let _ = shutdown_tx.send(true);
    });

    let console = tokio::spawn(commands::run_console(
        provisioner.orchestrator.clone(),
        commands::spawn_stdin_reader(),
        shutdown_rx.clone(),
    ));

    let mut api_shutdown = shutdown_rx;
    api::serve(listener, router, async move {
        if api_shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    })
    .await?;

    // 等待進行中的指令與建立流程完成
    if let Err(e) = console.await {
        tracing::warn!("Console task ended abnormally: {}", e);
    }
    provisioner.orchestrator.drain().await;

    tracing::info!("contest-provisioner stopped");
    Ok(())
}
