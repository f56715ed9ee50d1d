//! Stage-1: location, local network, public network, battery

use async_trait::async_trait;

use super::Stage;
use crate::data::{
    BatterySnapshot, LocationFix, NetworkSnapshot, PublicNetSnapshot, Quad, SourceKind,
};
use crate::error::Result;
use crate::stream::{SlotReader, StateStream};

pub struct Stage1 {
    location: SlotReader<Option<LocationFix>>,
    network: SlotReader<NetworkSnapshot>,
    public_net: SlotReader<Option<PublicNetSnapshot>>,
    battery: SlotReader<BatterySnapshot>,
}

impl Stage1 {
    pub fn new(
        location: &StateStream<Option<LocationFix>>,
        network: &StateStream<NetworkSnapshot>,
        public_net: &StateStream<Option<PublicNetSnapshot>>,
        battery: &StateStream<BatterySnapshot>,
    ) -> Self {
        Self {
            location: SlotReader::new(SourceKind::Location, location),
            network: SlotReader::new(SourceKind::Network, network),
            public_net: SlotReader::new(SourceKind::PublicNetwork, public_net),
            battery: SlotReader::new(SourceKind::Battery, battery),
        }
    }

    fn terminated(&self) -> Vec<SourceKind> {
        [
            (self.location.kind(), self.location.is_terminated()),
            (self.network.kind(), self.network.is_terminated()),
            (self.public_net.kind(), self.public_net.is_terminated()),
            (self.battery.kind(), self.battery.is_terminated()),
        ]
        .into_iter()
        .filter_map(|(kind, dead)| if dead { kind } else { None })
        .collect()
    }
}

#[async_trait]
impl Stage for Stage1 {
    type Output = Quad;

    fn name(&self) -> &'static str {
        "stage-1"
    }

    async fn changed(&mut self) {
        tokio::select! {
            _ = self.location.changed() => {}
            _ = self.network.changed() => {}
            _ = self.public_net.changed() => {}
            _ = self.battery.changed() => {}
        }
    }

    fn combine(&self) -> Result<Quad> {
        Ok(Quad {
            location: self.location.value().clone(),
            network: self.network.value().clone(),
            public_net: self.public_net.value().clone(),
            battery: self.battery.value().clone(),
            terminated: self.terminated(),
        })
    }

    fn fallback(&self) -> Quad {
        Quad::default()
    }
}
