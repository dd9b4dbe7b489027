mod rumqtt_client;

pub use rumqtt_client::{RumqttBrokerClient, RumqttEventSource};
