//! Stage-3: attach the fingerprint to the full snapshot

use std::sync::Arc;

use async_trait::async_trait;

use super::Stage;
use crate::data::{FinalState, FullSnapshot};
use crate::error::Result;
use crate::fingerprint::{assemble_with, EntropyModel, FingerprintBundle, FrequencyTable};
use crate::stream::{SlotReader, StateStream};

pub struct Stage3 {
    snapshot: SlotReader<FullSnapshot>,
    table: Arc<FrequencyTable>,
    model: EntropyModel,
}

impl Stage3 {
    pub fn new(snapshot: &StateStream<FullSnapshot>, table: Arc<FrequencyTable>, model: EntropyModel) -> Self {
        Self {
            snapshot: SlotReader::from_stage("stage-2", snapshot),
            table,
            model,
        }
    }
}

#[async_trait]
impl Stage for Stage3 {
    type Output = FinalState;

    fn name(&self) -> &'static str {
        "stage-3"
    }

    async fn changed(&mut self) {
        self.snapshot.changed().await
    }

    fn combine(&self) -> Result<FinalState> {
        let snapshot = self.snapshot.value();
        let fingerprint = assemble_with(snapshot, &self.table, self.model)?;
        Ok(FinalState {
            snapshot: snapshot.clone(),
            fingerprint,
        })
    }

    fn fallback(&self) -> FinalState {
        FinalState {
            snapshot: self.snapshot.value().clone(),
            fingerprint: FingerprintBundle::empty(),
        }
    }
}
