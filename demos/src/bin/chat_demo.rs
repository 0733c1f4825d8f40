use std::time::Duration;

use serde_json::{json, Value};
use xbus::{
    filter_fn, handler_fn, init_logging, Client, ClientConfig, Frame, InMemoryHub, LoggingConfig,
    Settings, Verdict,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Уровень логирования настраивается через XBUS_LOG_LEVEL / XBUS_LOG
    let settings = Settings::load()?;
    init_logging(&LoggingConfig::from_settings(&settings))?;

    println!("=== xbus chat demo ===\n");

    let hub = InMemoryHub::new();
    let alice = Client::new(hub.endpoint(), ClientConfig::with_node_id("alice"))?;
    let bob = Client::new(hub.endpoint(), ClientConfig::with_node_id("bob"))?;

    // Оба слушают общую комнату; своих сообщений они не услышат
    alice.on(
        "chat.room",
        handler_fn(|payload: Value, channel| async move {
            println!("[alice] {channel} <- {payload}");
            Ok(())
        }),
    );
    bob.on(
        "chat.room",
        handler_fn(|payload: Value, channel| async move {
            println!("[bob]   {channel} <- {payload}");
            Ok(())
        }),
    );

    // Исходящий фильтр Алисы подписывает сообщения и прячет черновики
    alice.filter_out(filter_fn(|mut frame: Frame| async move {
        match &*frame.channel {
            "chat.draft" => Ok(Verdict::Drop),
            "chat.room" => {
                frame.envelope.data = json!({
                    "from": "alice",
                    "text": frame.envelope.data,
                });
                Ok(Verdict::Forward(frame))
            }
            _ => Ok(Verdict::Forward(frame)),
        }
    }));

    println!("-- Alice greets the room (signed by her outbound filter)");
    alice.emit("chat.room", json!("hello everyone"));
    tokio::time::sleep(Duration::from_millis(50)).await;

    println!("\n-- Bob answers; Alice sees it, Bob does not hear himself");
    bob.emit("chat.room", json!("hi alice!"));
    tokio::time::sleep(Duration::from_millis(50)).await;

    println!("\n-- Alice's draft is vetoed by her own filter, nothing arrives");
    alice.emit("chat.draft", json!("unfinished thought"));
    tokio::time::sleep(Duration::from_millis(50)).await;

    println!("\n-- emit_to_self: Bob talks to his own subscribers too");
    bob.emit_to_self("chat.room", json!("note to self"));
    tokio::time::sleep(Duration::from_millis(50)).await;

    println!("\n-- Bob leaves the room");
    let removed = bob.off("chat.room");
    println!("   removed {removed} binding(s)");
    alice.emit("chat.room", json!("anyone here?"));
    tokio::time::sleep(Duration::from_millis(50)).await;

    println!("\n=== demo finished ===");
    Ok(())
}
