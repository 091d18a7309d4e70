use std::time::Duration;

use anyhow::Result;
use futures_util::TryStreamExt;
use rand::Rng;
use reqwest::Client;
use reqwest_websocket::{Message, RequestBuilderExt};
use serde::Deserialize;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::sleep,
};

use crate::constants::ORDER_UPDATE_EVENT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushEvent {
    OrderUpdate,
}

#[derive(Deserialize)]
struct PushMessage {
    #[serde(rename = "type")]
    kind: String,
}

/// Only `{"type":"ORDER_UPDATE"}` means anything; everything else is ignored.
pub fn parse_push_message(text: &str) -> Option<PushEvent> {
    match serde_json::from_str::<PushMessage>(text) {
        Ok(msg) if msg.kind == ORDER_UPDATE_EVENT => Some(PushEvent::OrderUpdate),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconnectPolicy {
    pub initial: Duration,
    pub max: Duration,
    /// Upper bound of the random extra delay, as a fraction of the base delay.
    pub jitter: f64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        ReconnectPolicy {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(30),
            jitter: 0.2,
        }
    }
}

/// Doubling delay, capped; reset after each successful connect.
#[derive(Debug)]
pub struct Backoff {
    policy: ReconnectPolicy,
    next: Duration,
}

// floor for both bounds so a misconfigured policy never reconnects in a tight loop
pub const MIN_RECONNECT_DELAY: Duration = Duration::from_millis(100);

impl Backoff {
    pub fn new(policy: ReconnectPolicy) -> Self {
        let initial = policy.initial.max(MIN_RECONNECT_DELAY);
        let policy = ReconnectPolicy {
            initial,
            max: policy.max.max(initial),
            ..policy
        };
        Backoff {
            next: policy.initial,
            policy,
        }
    }

    pub fn next_delay(&mut self) -> Duration {
        let current = self.next;
        self.next = (current * 2).min(self.policy.max);
        current
    }

    pub fn reset(&mut self) {
        self.next = self.policy.initial;
    }

    pub fn jittered(&self, base: Duration) -> Duration {
        if self.policy.jitter <= 0.0 {
            return base;
        }
        let extra = rand::thread_rng().gen_range(0.0..=self.policy.jitter);
        base.mul_f64(1.0 + extra)
    }
}

/// A push channel kept open (and reopened) until `close` is called.
pub struct LiveUpdates {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl LiveUpdates {
    pub fn open(url: String, policy: ReconnectPolicy) -> (Self, mpsc::UnboundedReceiver<PushEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            run_push_channel(url, policy, event_tx, shutdown_rx).await;
        });

        (
            LiveUpdates {
                shutdown: shutdown_tx,
                task,
            },
            event_rx,
        )
    }

    pub async fn close(self) {
        // receiver may already be gone if the task ended on its own
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            log::error!("Push channel task ended abnormally: {}", e);
        }
        log::debug!("Push channel closed");
    }
}

async fn run_push_channel(
    url: String,
    policy: ReconnectPolicy,
    event_tx: mpsc::UnboundedSender<PushEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut backoff = Backoff::new(policy);

    loop {
        let outcome = tokio::select! {
            outcome = listen(&url, &event_tx, &mut backoff) => outcome,
            _ = shutdown.changed() => break,
        };

        match outcome {
            Ok(()) => log::warn!("Push channel closed by server"),
            Err(e) => log::error!("Push channel failed: {}", e),
        }

        if event_tx.is_closed() {
            break;
        }

        let base = backoff.next_delay();
        let delay = backoff.jittered(base);
        log::info!("Reconnecting push channel in {:.2?}", delay);
        tokio::select! {
            _ = sleep(delay) => {}
            _ = shutdown.changed() => break,
        }
    }
}

async fn listen(
    url: &str,
    event_tx: &mpsc::UnboundedSender<PushEvent>,
    backoff: &mut Backoff,
) -> Result<()> {
    let response = Client::default()
        .get(url)
        .upgrade() // Prepares the WebSocket upgrade.
        .send()
        .await?;

    let mut websocket = response.into_websocket().await?;
    log::info!("Push channel connected to {}", url);
    backoff.reset();

    while let Some(message) = websocket.try_next().await? {
        if let Message::Text(text) = message {
            match parse_push_message(&text) {
                Some(event) => {
                    if event_tx.send(event).is_err() {
                        return Ok(());
                    }
                }
                None => log::debug!("Ignoring push message: {}", text),
            }
        }
    }

    Ok(())
}
