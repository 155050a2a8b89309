//! Storage commitment N-ACTION request

use dicom_dictionary_std::tags;
use dicom_object::InMemDicomObject;
use dimse::types::{put_sequence, put_uid};
use dimse::{AssociationId, DimseCommand, DimseError, DimseMessage, DimseStatus, ServiceProfile};
use tracing::{debug, error, info, warn};

use crate::commitment::CommitmentManager;
use crate::models::{RequestDescriptor, TargetResult};

/// What happened to one commitment request
///
/// `association` is set whenever an association was opened, even if the
/// request was not accepted; the caller decides whether to close or abort it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOutcome {
    pub association: Option<AssociationId>,
    pub transaction_uid: String,
    pub accepted: bool,
}

/// Build the N-ACTION data set referencing every committable file.
///
/// Returns the data set and the number of referenced instances.
pub fn build_commit_request(result: &TargetResult, verbose: bool) -> (InMemDicomObject, usize) {
    let mut ds = InMemDicomObject::new_empty();
    put_uid(&mut ds, tags::TRANSACTION_UID, &result.transaction_uid);

    let items: Vec<InMemDicomObject> = result
        .committable()
        .map(|file| {
            if verbose {
                info!("Requesting commitment of {} ({})", file.sop_instance_uid, file.path.display());
            }
            let mut item = InMemDicomObject::new_empty();
            put_uid(&mut item, tags::REFERENCED_SOP_CLASS_UID, &file.sop_class_uid);
            put_uid(&mut item, tags::REFERENCED_SOP_INSTANCE_UID, &file.sop_instance_uid);
            item
        })
        .collect();

    let skipped = result.files.len() - items.len();
    if skipped > 0 {
        debug!("{} file(s) without SOP class/instance UID left out of the request", skipped);
    }

    let count = items.len();
    put_sequence(&mut ds, tags::REFERENCED_SOP_SEQUENCE, items);
    (ds, count)
}

/// Open an association to the target, send the commitment request and wait for its response.
///
/// The transaction UID is stored in the descriptor's result before the request
/// goes out, so a confirmation can never arrive ahead of it.
pub async fn send_commit_request(
    manager: &CommitmentManager,
    descriptor: &mut RequestDescriptor,
) -> RequestOutcome {
    let node = &descriptor.node;
    let transport = manager.transport();

    let connect_timeout = manager.dimse_config().connect_timeout();
    let opened = tokio::time::timeout(
        connect_timeout,
        transport.open_association(node, ServiceProfile::StorageCommitmentRequest),
    )
    .await
    .unwrap_or_else(|_| {
        Err(DimseError::timeout(format!(
            "no association after {:?}",
            connect_timeout
        )))
    });

    let association = match opened {
        Ok(id) => id,
        Err(e) => {
            error!("Failed to open storage commitment association to {}: {}", node, e);
            return RequestOutcome {
                association: None,
                transaction_uid: String::new(),
                accepted: false,
            };
        }
    };

    let transaction_uid = manager.next_transaction_uid();
    descriptor.result.transaction_uid = transaction_uid.clone();

    let mut outcome = RequestOutcome {
        association: Some(association),
        transaction_uid,
        accepted: false,
    };

    let (dataset, referenced) = build_commit_request(&descriptor.result, descriptor.verbose);
    info!(
        "Requesting storage commitment of {} instance(s) from {} (transaction {})",
        referenced, node, outcome.transaction_uid
    );

    let request = DimseMessage::n_action_rq(manager.next_message_id(), dataset);
    if let Err(e) = transport.send_request(association, request).await {
        error!("Failed to send storage commitment request to {}: {}", node, e);
        return outcome;
    }

    let response = match transport
        .read_message(association, manager.config().ack_timeout())
        .await
    {
        Ok(response) => response,
        Err(e) => {
            error!("No storage commitment response from {}: {}", node, e);
            return outcome;
        }
    };

    if response.command != DimseCommand::NActionRsp {
        error!(
            "Expected N-ACTION-RSP from {} but received {}",
            node, response.command
        );
        return outcome;
    }

    match response.status {
        Some(DimseStatus::Success) => {
            debug!("{} accepted storage commitment request", node);
            outcome.accepted = true;
        }
        Some(status) if status == DimseStatus::NO_SUCH_SOP_INSTANCE => warn!(
            "{} rejected storage commitment request: it does not know the commitment SOP instance ({})",
            node, status
        ),
        Some(status) if status == DimseStatus::PROCESSING_FAILURE => warn!(
            "{} could not process storage commitment request ({})",
            node, status
        ),
        Some(status) => warn!(
            "{} rejected storage commitment request with status {}",
            node, status
        ),
        None => warn!("{} answered storage commitment request without a status", node),
    }

    outcome
}
