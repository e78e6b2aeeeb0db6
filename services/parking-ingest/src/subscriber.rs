//! MQTT subscriber for sensor status messages
//!
//! Owns the broker connection. Each inbound publish on the status topic is
//! handed synchronously to [`OccupancyState::ingest_bytes`], which is cheap
//! and bounded, so per-source order is preserved and the loop never waits
//! on alert delivery. After every acknowledged subscription a time-sync
//! message is published so that sensor clocks follow the server.

use chrono::{DateTime, Local, TimeZone};
use parkwatch_core::{MqttConfig, RetryConfig};
use parkwatch_domain::OccupancyState;
use rand::Rng;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS, SubscribeReasonCode};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Client request channel capacity
const REQUEST_CAPACITY: usize = 16;

/// `<prefix><8 random lowercase hex chars>`
pub fn client_id(prefix: &str) -> String {
    let suffix: u32 = rand::thread_rng().gen();
    format!("{}{:08x}", prefix, suffix)
}

/// Time-sync payload, `DDMMYYYYHHMMSS`
pub fn time_sync_payload<Tz>(now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    now.format("%d%m%Y%H%M%S").to_string()
}

/// Capped exponential backoff between failed polls
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    next: Duration,
}

impl Backoff {
    /// Backoff described by `retry`
    pub fn new(retry: &RetryConfig) -> Self {
        let initial = Duration::from_millis(retry.initial_delay_ms);
        Self {
            initial,
            max: Duration::from_millis(retry.max_delay_ms),
            next: initial,
        }
    }

    /// Delay to wait now; doubles the following one up to the cap
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = (self.next * 2).min(self.max);
        delay
    }

    /// Back to the initial delay after a successful connection
    pub fn reset(&mut self) {
        self.next = self.initial;
    }
}

/// What the subscriber did with one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    /// Connected; subscription requested
    SubscribeRequested,
    /// Subscription acknowledged; time sync queued
    TimeSyncSent,
    /// Broker refused the subscription
    SubscriptionRejected,
    /// Status message applied to the occupancy state
    Applied,
    /// Status message dropped by the pipeline
    Dropped,
    /// Publish on another topic
    OtherTopic,
    /// Nothing to do
    Idle,
}

/// Broker subscriber feeding the occupancy state
pub struct Subscriber {
    config: MqttConfig,
    state: Arc<OccupancyState>,
}

impl Subscriber {
    /// Subscriber for `config`
    pub fn new(config: MqttConfig, state: Arc<OccupancyState>) -> Self {
        Self { config, state }
    }

    fn connect(&self) -> (AsyncClient, EventLoop) {
        let id = client_id(&self.config.client_id_prefix);
        info!(
            client_id = %id,
            broker = %format!("{}:{}", self.config.host, self.config.port),
            "Connecting to MQTT broker"
        );

        let mut options = MqttOptions::new(id, self.config.host.clone(), self.config.port);
        options.set_keep_alive(Duration::from_secs(self.config.keep_alive_secs));
        options.set_clean_session(true);

        let (client, mut eventloop) = AsyncClient::new(options, REQUEST_CAPACITY);
        eventloop
            .network_options
            .set_connection_timeout(self.config.connect_timeout_secs);
        (client, eventloop)
    }

    /// Run forever; connection errors are logged and retried with backoff.
    pub async fn run(self) {
        let (client, mut eventloop) = self.connect();
        let mut backoff = Backoff::new(&self.config.retry);

        loop {
            match eventloop.poll().await {
                Ok(event) => {
                    if matches!(event, Event::Incoming(Packet::ConnAck(_))) {
                        backoff.reset();
                    }
                    let handled = self.handle_event(&client, event);
                    debug!(?handled, "MQTT event handled");
                }
                Err(e) => {
                    let delay = backoff.next_delay();
                    error!(
                        error = %e,
                        retry_in_ms = delay.as_millis() as u64,
                        "MQTT connection error"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    fn handle_event(&self, client: &AsyncClient, event: Event) -> Handled {
        match event {
            Event::Incoming(Packet::ConnAck(_)) => {
                info!(broker = %self.config.host, "Connected to broker");
                if let Err(e) = client.try_subscribe(&self.config.status_topic, QoS::AtMostOnce) {
                    error!(error = %e, topic = %self.config.status_topic, "Subscription request failed");
                }
                Handled::SubscribeRequested
            }
            Event::Incoming(Packet::SubAck(ack)) => {
                if ack
                    .return_codes
                    .iter()
                    .any(|code| matches!(code, SubscribeReasonCode::Failure))
                {
                    error!(topic = %self.config.status_topic, "Subscription rejected by broker");
                    return Handled::SubscriptionRejected;
                }
                info!(topic = %self.config.status_topic, "Subscribed");
                self.publish_time_sync(client)
            }
            Event::Incoming(Packet::Publish(publish)) => {
                if publish.topic != self.config.status_topic {
                    debug!(topic = %publish.topic, "Ignoring message on unexpected topic");
                    return Handled::OtherTopic;
                }
                match self.state.ingest_bytes(&publish.payload) {
                    Ok(outcome) => {
                        debug!(
                            source = %outcome.source,
                            sequence = outcome.sequence,
                            total = outcome.totals.total,
                            "Status message applied"
                        );
                        Handled::Applied
                    }
                    Err(_) => Handled::Dropped,
                }
            }
            Event::Incoming(Packet::Disconnect) => {
                warn!("Broker sent disconnect");
                Handled::Idle
            }
            _ => Handled::Idle,
        }
    }

    fn publish_time_sync(&self, client: &AsyncClient) -> Handled {
        let payload = time_sync_payload(&Local::now());
        match client.try_publish(
            &self.config.time_topic,
            QoS::AtLeastOnce,
            false,
            payload.clone().into_bytes(),
        ) {
            Ok(()) => {
                info!(payload = %payload, "[SYNC] Time synchronization sent");
                Handled::TimeSyncSent
            }
            Err(e) => {
                error!(error = %e, "Time synchronization publish failed");
                Handled::Idle
            }
        }
    }
}
