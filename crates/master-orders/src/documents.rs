//! Bulk document events.
//!
//! Printing packing slips for a master order is what moves it into the
//! warehouse. The document collaborator reports each produced document as a
//! typed [`DocumentEvent`]; only packing slips have an effect here.

use crate::clients::MasterOrderClient;
use crate::error::EngineError;
use crate::model::{MasterOrderId, MasterStatus};
use crate::status_machine::{StatusMachine, TransitionMode, TransitionReport};
use store_actor::StoreClient;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentType {
    PackingSlip,
    Invoice,
    CreditNote,
    DeliveryNote,
}

/// Documents of one type were produced for these master orders.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentEvent {
    pub document: DocumentType,
    pub masters: Vec<MasterOrderId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DocumentOutcome {
    /// The master order moved from `validated` to `warehouse`.
    Advanced(TransitionReport),
    AlreadyInWarehouse,
    /// Nothing to do for this document or this master order's status.
    Ignored,
}

#[derive(Clone)]
pub struct DocumentTrigger {
    masters: MasterOrderClient,
    machine: StatusMachine,
}

impl DocumentTrigger {
    pub fn new(masters: MasterOrderClient, machine: StatusMachine) -> Self {
        Self { masters, machine }
    }

    /// Handles every master order of the event independently.
    #[instrument(skip(self, event), fields(document = ?event.document, count = event.masters.len()))]
    pub async fn on_document_produced(
        &self,
        event: &DocumentEvent,
    ) -> Vec<(MasterOrderId, Result<DocumentOutcome, EngineError>)> {
        let mut outcomes = Vec::with_capacity(event.masters.len());
        for &master in &event.masters {
            let outcome = match event.document {
                DocumentType::PackingSlip => self.packing_slip_printed(master).await,
                other => {
                    debug!(%master, document = ?other, "Document has no status effect");
                    Ok(DocumentOutcome::Ignored)
                }
            };
            outcomes.push((master, outcome));
        }
        outcomes
    }

    async fn packing_slip_printed(
        &self,
        master: MasterOrderId,
    ) -> Result<DocumentOutcome, EngineError> {
        let order = self
            .masters
            .fetch(master)
            .await?
            .ok_or(EngineError::MasterNotFound(master))?;

        match order.status {
            MasterStatus::Validated => {
                let report = self
                    .machine
                    .transition_with(master, MasterStatus::Warehouse, TransitionMode::System)
                    .await?;
                if report.changed() {
                    Ok(DocumentOutcome::Advanced(report))
                } else {
                    Ok(DocumentOutcome::AlreadyInWarehouse)
                }
            }
            MasterStatus::Warehouse => Ok(DocumentOutcome::AlreadyInWarehouse),
            MasterStatus::Prepared | MasterStatus::Complete => {
                debug!(%master, status = %order.status, "Packing slip reprinted, status kept");
                Ok(DocumentOutcome::Ignored)
            }
        }
    }
}
