use color_eyre::Result;
use padbridge::config::Preset;
use padbridge::gamepad::{GamepadNavigator, NoNativeGamepads};
use padbridge::input::{InputEvent, ListenerHandle};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Reads host events line by line from stdin, e.g. `keydown KeyW`, `wheel -120`, `lock`,
/// plus the commands `enable`, `disable`, `status`, `poll` and `quit`.
#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let preset_path = std::env::args().nth(1).map(PathBuf::from);
    let preset = Preset::load_or_default(preset_path.as_deref()).await?;
    info!("Using preset '{}'", preset.name);

    let mut handle = ListenerHandle::spawn(preset.emulator.clone());
    let mut navigator = GamepadNavigator::new(Box::new(NoNativeGamepads));
    navigator.install(handle.gamepad())?;

    enable(&handle, &preset).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "" => continue,
            "enable" => enable(&handle, &preset).await?,
            "disable" => handle.disable().await?,
            "status" => info!("Listening status: {}", handle.status()),
            "poll" => poll(&navigator),
            "quit" => break,
            other => match other.parse::<InputEvent>() {
                Ok(event) => {
                    let disposition = handle.dispatch(event).await?;
                    debug!("{} -> {:?}", other, disposition);
                }
                Err(e) => warn!("Ignoring line '{}': {}", other, e),
            },
        }
    }

    info!("Input closed, shutting down");
    handle.disable().await?;
    navigator.uninstall()?;
    handle.shutdown().await?;
    Ok(())
}

async fn enable(handle: &ListenerHandle, preset: &Preset) -> Result<()> {
    let invalid = handle.enable(preset.config.clone()).await?;
    for binding in &invalid {
        warn!(
            "Binding {} -> {} ignored, target already used by {}",
            binding.code, binding.binding, binding.claimed_by
        );
    }
    Ok(())
}

fn poll(navigator: &GamepadNavigator) {
    for (slot, gamepad) in navigator.get_gamepads().iter().enumerate() {
        match gamepad {
            Some(gamepad) => {
                let pressed: Vec<usize> = (0..gamepad.buttons.len())
                    .filter(|index| gamepad.is_pressed(*index))
                    .collect();
                info!(
                    "Slot {}: {} pressed={:?} axes={:?} t={}",
                    slot, gamepad.id, pressed, gamepad.axes, gamepad.timestamp
                );
            }
            None => debug!("Slot {}: empty", slot),
        }
    }
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
