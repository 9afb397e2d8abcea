use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tributary::app::AppContext;
use tributary::cli::{report, Cli};
use tributary::config::Manifest;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        EnvFilter::new("tributary=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tributary=info"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mut manifest = Manifest::load(&cli.config)?;
    cli.apply(&mut manifest);
    manifest.validate()?;

    for path in manifest.duplicate_paths() {
        tracing::warn!("{} is listed more than once; the last download wins", path);
    }

    let ctx = AppContext::new(&manifest)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling outstanding downloads");
            on_interrupt.cancel();
        }
    });

    tracing::info!(
        "Mirroring {} items into {}",
        manifest.items.len(),
        manifest.output_dir.display()
    );
    let batch = ctx.runner.run_with_cancel(&manifest.items, cancel).await;

    print!("{}", report::render(&batch));

    if report::should_fail(&batch, cli.strict) {
        std::process::exit(1);
    }

    Ok(())
}
