use eframe::egui;
use eframe::egui::Visuals;
use gene_explorer::api::ApiClient;
use gene_explorer::config::Config;
use gene_explorer::loader::Loader;
use gene_explorer::models::AppState;
use gene_explorer::observer::DebugLog;
use gene_explorer::ui;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub struct MyApp {
    state: AppState,
    // Dropping the runtime cancels every in-flight request.
    _runtime: Runtime,
}

impl eframe::App for MyApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(Visuals::light());

        self.state.loader.poll();
        self.state.debug_output = self.state.debug_log.snapshot();

        ui::debug_panel(ctx, &mut self.state);
        ui::central_panel(ctx, &mut self.state);
        ui::toasts(ctx, &mut self.state);

        if !self.state.loader.is_idle() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gene_explorer=info")),
        )
        .init();

    let config = Config::from_env()?;
    info!(api = %config.api_base_url, "starting gene explorer");

    let runtime = Runtime::new()?;
    let debug_log = DebugLog::new();
    let client = ApiClient::new(&config, Arc::new(debug_log.clone()))?;
    let mut loader = Loader::new(runtime.handle().clone(), Arc::new(client), config);
    loader.refresh_catalogue();

    let app = MyApp {
        state: AppState::new(loader, debug_log),
        _runtime: runtime,
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1200.0, 820.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Gene Expression Explorer",
        options,
        Box::new(|_cc| Ok(Box::new(app))),
    )?;

    Ok(())
}
