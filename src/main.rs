use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tokio::signal::unix::{signal as unix_signal, Signal, SignalKind};
use tracing::{error, info, warn};

mod actions;
mod bindings;
mod config;
mod error;
mod events;
pub mod mappings;
mod motion;
mod platform;
mod services;
mod utils;

use config::Config;
use events::{Monitor, Point, Rect, WindowId};
use platform::{EvdevHotkeyBackend, FakeDesktop, Platform, UinputInjector};
use services::{
    create_keyboard_listener, create_mouse_listener, engine_channel, EngineEvent, EngineMessage, EngineSnapshot,
    Orchestrator,
};

#[derive(Parser, Debug)]
#[command(name = "hotgrip")]
#[command(about = "Перемещение и изменение размера окна под курсором по сочетаниям клавиш и жестам мыши")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "hotgrip.toml")]
    config: String,

    /// Режим сухого запуска (рабочий стол в памяти, ОС не затрагивается)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования (по умолчанию из конфигурации)
    #[arg(long)]
    log_level: Option<String>,

    /// Логировать каждое событие движка
    #[arg(long)]
    print_events: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(&args.config)?;

    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    init_tracing(level)?;

    info!("Запуск hotgrip v{}", env!("CARGO_PKG_VERSION"));
    info!("Конфигурация загружена из: {}", args.config);

    if args.dry_run {
        warn!("Режим сухого запуска - реальные действия отключены");
    } else {
        utils::permissions::check_permissions()?;
    }

    // Таблица глобальных сочетаний разделяется оркестратором (регистрация) и слушателем (сопоставление)
    let hotkeys = Arc::new(EvdevHotkeyBackend::new());
    let platform = if args.dry_run {
        Platform::fake(Arc::new(dry_run_desktop()))
    } else {
        let injector = match UinputInjector::new(false) {
            Ok(injector) => injector,
            Err(e) => {
                warn!("Виртуальное устройство недоступно ({}), привязка к краю только логируется", e);
                UinputInjector::new(true)?
            }
        };
        Platform::x11(hotkeys.clone(), Arc::new(injector))
    };

    let snapshot = EngineSnapshot::from_config(&config);
    let (sender, receiver) = engine_channel();
    let orchestrator = Orchestrator::new(platform, snapshot, sender.clone());

    if args.print_events {
        spawn_event_printer(orchestrator.subscribe());
    }

    let keyboard_listener = create_keyboard_listener(&config, hotkeys.clone(), sender.clone(), args.dry_run)?;
    let mouse_listener = match create_mouse_listener(&config, sender.clone(), args.dry_run) {
        Ok(listener) => Some(listener),
        Err(e) => {
            warn!("Мышь не найдена, жесты мыши отключены: {}", e);
            None
        }
    };

    info!("Все компоненты инициализированы");

    let orchestrator_handle = tokio::spawn(async move {
        if let Err(e) = orchestrator.run(receiver).await {
            error!("Ошибка в Orchestrator: {}", e);
        }
    });
    let keyboard_handle = tokio::spawn(async move {
        if let Err(e) = keyboard_listener.run().await {
            error!("Ошибка в KeyboardListener: {}", e);
        }
    });
    let mouse_handle = mouse_listener.map(|listener| {
        tokio::spawn(async move {
            if let Err(e) = listener.run().await {
                error!("Ошибка в MouseListener: {}", e);
            }
        })
    });

    info!("Все сервисы запущены");

    wait_for_shutdown(&args.config, config.general.gestures_enabled, &sender).await;

    info!("Завершение работы...");

    if sender.send(EngineMessage::Shutdown).is_err() {
        warn!("Оркестратор уже остановлен");
    }

    keyboard_handle.abort();
    if let Some(handle) = &mouse_handle {
        handle.abort();
    }

    let shutdown_timeout = tokio::time::Duration::from_secs(5);
    let shutdown_result = tokio::time::timeout(shutdown_timeout, async {
        let _ = orchestrator_handle.await;
        let _ = keyboard_handle.await;
        if let Some(handle) = mouse_handle {
            let _ = handle.await;
        }
    })
    .await;

    match shutdown_result {
        Ok(_) => info!("Все сервисы завершили работу корректно"),
        Err(_) => warn!("Таймаут при завершении сервисов"),
    }

    info!("hotgrip завершил работу");
    Ok(())
}

/// Ждёт Ctrl+C. SIGHUP перечитывает конфигурацию и подменяет снимок целиком;
/// при ошибке загрузки остаётся прежний снимок. SIGUSR1 включает и выключает жесты.
async fn wait_for_shutdown(
    config_path: &str,
    gestures_enabled: bool,
    sender: &services::orchestrator::EngineSender,
) {
    let mut hangup = subscribe_signal(SignalKind::hangup(), "SIGHUP");
    let mut user1 = subscribe_signal(SignalKind::user_defined1(), "SIGUSR1");
    let mut gestures_enabled = gestures_enabled;

    loop {
        let reload = next_signal(&mut hangup);
        let toggle = next_signal(&mut user1);

        tokio::select! {
            result = signal::ctrl_c() => {
                match result {
                    Ok(()) => info!("Получен сигнал завершения (Ctrl+C)"),
                    Err(err) => error!("Ошибка при ожидании сигнала завершения: {}", err),
                }
                return;
            }
            _ = reload => {
                info!("Получен SIGHUP, перечитываем {}", config_path);
                match Config::load(config_path) {
                    Ok(config) => {
                        let snapshot = EngineSnapshot::from_config(&config);
                        if sender.send(EngineMessage::Rebuild(snapshot)).is_err() {
                            warn!("Оркестратор остановлен, новая конфигурация не применена");
                        }
                    }
                    Err(e) => error!("Конфигурация не перезагружена, используется прежняя: {:#}", e),
                }
            }
            _ = toggle => {
                gestures_enabled = !gestures_enabled;
                info!("Получен SIGUSR1, жесты {}", if gestures_enabled { "включены" } else { "выключены" });
                if sender.send(EngineMessage::SetGesturesEnabled(gestures_enabled)).is_err() {
                    warn!("Оркестратор остановлен");
                }
            }
        }
    }
}

fn subscribe_signal(kind: SignalKind, name: &str) -> Option<Signal> {
    match unix_signal(kind) {
        Ok(signal) => Some(signal),
        Err(e) => {
            warn!("Не удалось подписаться на {}: {}", name, e);
            None
        }
    }
}

async fn next_signal(signal: &mut Option<Signal>) -> Option<()> {
    match signal.as_mut() {
        Some(signal) => signal.recv().await,
        None => std::future::pending().await,
    }
}

/// Рабочий стол сухого режима: один монитор и одно окно под курсором
fn dry_run_desktop() -> FakeDesktop {
    let desktop = FakeDesktop::new(vec![Monitor::new(
        Rect::new(0, 0, 1920, 1080),
        Rect::new(0, 0, 1920, 1040),
    )])
    .verbose();
    desktop.add_window(WindowId(0x1), Rect::new(480, 270, 960, 540));
    desktop.set_cursor(Point::new(960, 540));
    desktop
}

fn spawn_event_printer(mut events: tokio::sync::broadcast::Receiver<EngineEvent>) {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => info!("Событие: {:?}", event),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Пропущено событий: {}", skipped)
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact())
        .init();

    Ok(())
}
