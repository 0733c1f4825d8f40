use std::time::Duration;

use xbus::{init_logging, Client, ClientConfig, InMemoryHub, LockArbiter, LoggingConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(&LoggingConfig::default())?;

    println!("=== xbus distributed lock demo ===\n");

    let hub = InMemoryHub::new();

    // Узел-арбитр: раздаёт блокировки всей шине
    let arbiter_client = Client::new(hub.endpoint(), ClientConfig::with_node_id("arbiter"))?;
    let _arbiter = LockArbiter::attach(&arbiter_client);

    let first = Client::new(hub.endpoint(), ClientConfig::with_node_id("worker-1"))?;
    let second = Client::new(hub.endpoint(), ClientConfig::with_node_id("worker-2"))?;
    let third = Client::new(hub.endpoint(), ClientConfig::with_node_id("worker-3"))?;

    println!("-- worker-1 takes the printer and holds it for 300 ms");
    first.lock("printer", |unlock| {
        println!("   worker-1 acquired '{}'", unlock.lock_id());
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            println!("   worker-1 releases the printer");
            unlock.unlock();
        });
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    println!("-- worker-2 queues up behind worker-1");
    second.lock("printer", |unlock| {
        println!("   worker-2 acquired '{}', releasing at once", unlock.lock_id());
        unlock.unlock();
    });

    tokio::time::sleep(Duration::from_millis(500)).await;

    println!("\n-- worker-3 takes the lock with a 200 ms advisory timeout and forgets it");
    third.lock_with_timeout("printer", Duration::from_millis(200), |unlock| {
        println!("   worker-3 acquired '{}' and walks away", unlock.lock_id());
        // ручка роняется без unlock, арбитр отберёт её по таймауту
        drop(unlock);
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    println!("-- worker-1 waits; the arbiter reclaims the lost lock for him");
    first.lock("printer", |unlock| {
        println!("   worker-1 acquired '{}' after the reclaim", unlock.lock_id());
        unlock.unlock();
    });

    tokio::time::sleep(Duration::from_millis(400)).await;

    println!("\n=== demo finished ===");
    Ok(())
}
