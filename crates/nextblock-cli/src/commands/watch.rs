use nextblock_core::{
    ActivityWatchClient, Config, DesktopNotifier, FileSessionStore, NotificationTracker, Watcher,
};

/// Run the poll loop until Ctrl-C.
pub fn run(testing: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let store = FileSessionStore::open_default()?;
    let poll_interval = config.poll_interval();
    let sink = ActivityWatchClient::from_config(&config.server, testing, poll_interval)?;
    let notifier = DesktopNotifier::new(config.notifications.app_name.clone());
    let tracker = NotificationTracker::new(config.threshold_policy());

    tracing::info!(
        state = %store.path().display(),
        bucket = sink.bucket_id(),
        server = %config.server.base_url(testing),
        testing,
        "starting watcher"
    );

    let mut watcher = Watcher::new(store, sink, notifier, tracker, poll_interval)
        .with_time_scale(config.time_scale(testing));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(watcher.run(shutdown_signal()));
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for Ctrl-C; stop the process to exit");
        std::future::pending::<()>().await;
    }
}
