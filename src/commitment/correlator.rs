//! Maps an N-EVENT-REPORT onto the files of the request it answers

use dicom_dictionary_std::tags;
use dicom_object::InMemDicomObject;
use dimse::types::{
    string_attr, u16_attr, EVENT_TYPE_COMMITMENT_FAILURE, EVENT_TYPE_COMMITMENT_SUCCESS,
};
use dimse::DimseMessage;
use tracing::{debug, info, warn};

use crate::models::{CommitOutcome, TargetResult};

/// Apply a commitment result to `result`.
///
/// Returns `false` only when the transaction UID does not match the request, in
/// which case nothing is changed. Items naming instances that were never
/// requested are logged and skipped.
pub fn correlate(message: &DimseMessage, result: &mut TargetResult, verbose: bool) -> bool {
    let transaction_uid = message.string(tags::TRANSACTION_UID).unwrap_or_default();
    if transaction_uid != result.transaction_uid {
        warn!(
            "Ignoring commitment result for transaction '{}', expected '{}'",
            transaction_uid, result.transaction_uid
        );
        return false;
    }

    match message.type_id {
        Some(EVENT_TYPE_COMMITMENT_SUCCESS) => {
            debug!("Commitment result {} reports success", transaction_uid)
        }
        Some(EVENT_TYPE_COMMITMENT_FAILURE) => {
            info!("Commitment result {} reports failures", transaction_uid);
            for item in message.items(tags::FAILED_SOP_SEQUENCE) {
                apply_item(item, result, CommitOutcome::Failure, verbose);
            }
        }
        other => warn!(
            "Commitment result {} has invalid event type {:?}",
            transaction_uid, other
        ),
    }

    // Sent alongside failures as well, so always checked.
    for item in message.items(tags::REFERENCED_SOP_SEQUENCE) {
        apply_item(item, result, CommitOutcome::Success, verbose);
    }

    true
}

fn apply_item(
    item: &InMemDicomObject,
    result: &mut TargetResult,
    outcome: CommitOutcome,
    verbose: bool,
) {
    let (Some(class_uid), Some(instance_uid)) = (
        string_attr(item, tags::REFERENCED_SOP_CLASS_UID),
        string_attr(item, tags::REFERENCED_SOP_INSTANCE_UID),
    ) else {
        warn!("Skipping commitment result item without SOP class/instance UID");
        return;
    };

    if result.mark(&class_uid, &instance_uid, outcome) == 0 {
        warn!(
            "Commitment {:?} reported for {} / {} which was not part of the request",
            outcome, class_uid, instance_uid
        );
        return;
    }

    let path = result
        .find(&class_uid, &instance_uid)
        .map(|file| file.path.display().to_string())
        .unwrap_or_default();

    match outcome {
        CommitOutcome::Failure => {
            let reason = u16_attr(item, tags::FAILURE_REASON)
                .map(|code| format!("0x{:04X}", code))
                .unwrap_or_else(|| "unspecified".to_string());
            warn!(
                "Commitment failed for {} ({}), reason {}",
                instance_uid, path, reason
            );
        }
        _ if verbose => info!("Committed {} ({})", instance_uid, path),
        _ => debug!("Committed {} ({})", instance_uid, path),
    }
}
