use std::time::Duration;

use shapes_client::{connect, spawn_client, spawn_service, LogAffordance, LogRenderer};
use shapes_client::{ClientHandle, ServiceConfig};
use system::{serde_json, AssignmentState, PickResult, PointerEvent, SessionConfig};

const PLAYERS: [&str; 4] = ["alice", "bob", "carol", "dave"];
const FRAME_BUFFER: usize = 256;

fn load_config() -> SessionConfig {
    let path = match std::env::var("SHAPES_CONFIG") {
        Ok(path) => path,
        Err(_) => return SessionConfig::default(),
    };
    match std::fs::read_to_string(&path)
        .map_err(|e| e.to_string())
        .and_then(|json| SessionConfig::from_json(&json).map_err(|e| e.to_string()))
    {
        Ok(config) => config,
        Err(e) => {
            log::error!("Couldn't load config from {}: {}. Using defaults.", path, e);
            SessionConfig::default()
        }
    }
}

async fn wait_assigned(client: &ClientHandle) -> bool {
    client
        .wait_for(
            |view| view.assignment == AssignmentState::Assigned,
            Duration::from_secs(2),
        )
        .await
        .is_some()
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let config = load_config();
    let service = spawn_service(ServiceConfig::default());

    let mut clients = Vec::new();
    for name in PLAYERS.iter() {
        match connect(&service, name, FRAME_BUFFER).await {
            Ok(connection) => {
                let (client, _) = spawn_client(
                    connection,
                    config.clone(),
                    LogRenderer::new(name),
                    LogAffordance::new(name),
                );
                clients.push(client);
            }
            Err(e) => {
                log::error!("Couldn't connect to room: {}", e);
                return;
            }
        }
    }

    let (alice, bob) = (&clients[0], &clients[1]);
    if !wait_assigned(alice).await || !wait_assigned(bob).await {
        log::error!("Shapes were never assigned");
        return;
    }

    let shape = match alice
        .view()
        .await
        .and_then(|view| view.owned_by(alice.participant_id()).first().cloned())
    {
        Some(shape) => shape,
        None => {
            log::error!("alice has no shapes to send");
            return;
        }
    };

    let [x, _, z] = config.send_zone.center;
    alice
        .pointer(PointerEvent::Down(PickResult::on(&shape, 0.0, 0.0)))
        .await;
    alice
        .pointer(PointerEvent::Move(PickResult::ground(x, z)))
        .await;
    alice.pointer(PointerEvent::Up).await;
    alice.send_to(bob.participant_id()).await;

    let bob_id = bob.participant_id().clone();
    let received = bob
        .wait_for(
            |view| view.owned_by(&bob_id).contains(&shape),
            Duration::from_secs(2),
        )
        .await;
    match received.and_then(|view| serde_json::to_string_pretty(&view).ok()) {
        Some(json) => println!("{}", json),
        None => log::error!("bob never received {}", shape),
    }

    for client in &clients {
        client.leave().await;
    }
}
