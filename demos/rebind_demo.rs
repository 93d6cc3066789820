use std::sync::Arc;
use std::time::Duration;

use stickup_actions::backends::VirtualGamepads;
use stickup_actions::signal::KeySignal;
use stickup_actions::{
    sink, Bindable, DeviceType, EventFilter, EventLogger, GamepadAdapter, InputAction,
    InputConfig, InputManager, KeyboardAdapter, Rebinder, SignalBus, SnapshotStore, Surface,
};
use tracing_subscriber::EnvFilter;

const CONFIG: &str = r#"
[[actions]]
id = "jump"
label = "Jump"
device_types = ["keyboard", "gamepad"]

[[actions]]
id = "steer"
label = "Steer"
device_types = ["gamepad"]

[keyboard]
bindings = { Space = "jump" }

[gamepad]
deadzone = 0.2
buttons = { "0" = "jump" }
axes = { "0" = "steer" }
"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    let config = InputConfig::from_toml_str(CONFIG)?;
    let mut manager = InputManager::new();
    config.register_actions(manager.router());
    manager.register_action(
        InputAction::new("dash", "Dash").with_devices([DeviceType::Gamepad]),
    );

    let _printer = manager.on_action(|event, action| {
        println!(
            "{:>8} {:<6} {:?} {:?}",
            event.device_type, action.label, event.phase, event.value
        );
    });

    // Rebinder in front, router + snapshot + logger behind it. Only gamepad events
    // are logged, with their raw payload.
    let snapshot = SnapshotStore::new();
    let rebinder = Rebinder::new(
        sink::fan_out(vec![
            manager.event_sink(),
            snapshot.sink(),
            sink::filtered(
                EventFilter::Device(DeviceType::Gamepad),
                EventLogger::new().with_raw(true).sink(),
            ),
        ]),
        Vec::new(),
    );

    let keys = SignalBus::<KeySignal>::shared();
    // A host-side key listener, muted while the demo drives the keyboard.
    let hotkeys = keys.add_listener(Arc::new(|signal: &mut KeySignal| {
        if signal.code == "F1" {
            println!("help requested");
        }
    }));
    keys.disable(hotkeys);
    let keyboard =
        KeyboardAdapter::new(config.keyboard_options(rebinder.sink()).surface(keys.clone()));

    let pads = VirtualGamepads::new();
    pads.connect(0, 4, 2);
    let gamepad = GamepadAdapter::new(
        config
            .gamepad_options(rebinder.sink())?
            .source(Arc::new(pads.clone())),
    );
    let gamepad_bindings = gamepad.binding_cell();

    rebinder.add_target(keyboard.rebind_target());
    rebinder.add_target(gamepad.rebind_target());
    manager.add_adapter(keyboard);
    manager.add_adapter(gamepad);
    manager.start();

    keys.dispatch(KeySignal::down("Space", " "));
    keys.dispatch(KeySignal::up("Space", " "));
    keys.dispatch(KeySignal::down("F1", "F1"));
    keys.enable(hotkeys);
    keys.dispatch(KeySignal::down("F1", "F1"));

    pads.set_axis(0, 0, 0.1);
    manager.frame();
    pads.set_axis(0, 0, 0.6);
    manager.frame();
    println!(
        "jump held: {}, steer: {:.2}",
        snapshot.is_pressed("jump"),
        snapshot.value("steer")
    );

    // Move the next gamepad control pressed over to "dash". Only bound controls emit,
    // so this takes over button 0 from "jump".
    let capture = rebinder.capture_next(
        "dash",
        Some(DeviceType::Gamepad),
        Some(Duration::from_secs(2)),
    );
    pads.press_button(0, 0);
    manager.frame();
    let captured = capture.await?;
    println!("dash captured from {:?}", captured.raw);
    println!("button 0 is now {:?}", gamepad_bindings.get().button(0));

    pads.release_button(0, 0);
    manager.frame();
    pads.press_button(0, 0);
    manager.frame();

    // Nothing pressed within the timeout.
    match rebinder.capture_next("jump", None, Some(Duration::from_millis(100))).await {
        Ok(event) => println!("unexpected capture: {event:?}"),
        Err(e) => println!("second capture: {e}"),
    }

    manager.stop();
    Ok(())
}
