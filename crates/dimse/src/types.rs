//! Common types for DIMSE operations

use dicom_core::value::DataSetSequence;
use dicom_core::{DataElement, PrimitiveValue, Tag, VR};
use dicom_object::InMemDicomObject;
use serde::{Deserialize, Serialize};

/// Storage Commitment Push Model SOP Class UID
pub const STORAGE_COMMITMENT_PUSH_MODEL: &str = "1.2.840.10008.1.20.1";

/// Well-known Storage Commitment Push Model SOP Instance UID
pub const STORAGE_COMMITMENT_PUSH_MODEL_INSTANCE: &str = "1.2.840.10008.1.20.1.1";

/// N-ACTION type requesting storage commitment
pub const ACTION_TYPE_REQUEST_COMMITMENT: u16 = 1;

/// N-EVENT-REPORT type: every referenced instance was committed
pub const EVENT_TYPE_COMMITMENT_SUCCESS: u16 = 1;

/// N-EVENT-REPORT type: at least one referenced instance failed
pub const EVENT_TYPE_COMMITMENT_FAILURE: u16 = 2;

/// Opaque identifier of one association owned by a transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssociationId(pub u32);

impl std::fmt::Display for AssociationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "assoc#{}", self.0)
    }
}

/// Presentation contexts negotiated for an association
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceProfile {
    /// Outbound association proposing only Storage Commitment Push Model as SCU
    StorageCommitmentRequest,
    /// Inbound association on which the remote SCP delivers results (SCP/SCU role reversal)
    StorageCommitmentResults,
}

/// DIMSE command types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DimseCommand {
    /// N-ACTION request
    NActionRq,
    /// N-ACTION response
    NActionRsp,
    /// N-EVENT-REPORT request
    NEventReportRq,
    /// N-EVENT-REPORT response
    NEventReportRsp,
}

impl std::fmt::Display for DimseCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DimseCommand::NActionRq => write!(f, "N-ACTION-RQ"),
            DimseCommand::NActionRsp => write!(f, "N-ACTION-RSP"),
            DimseCommand::NEventReportRq => write!(f, "N-EVENT-REPORT-RQ"),
            DimseCommand::NEventReportRsp => write!(f, "N-EVENT-REPORT-RSP"),
        }
    }
}

/// DIMSE operation status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimseStatus {
    /// Operation completed successfully
    Success,
    /// Operation is pending (more responses to follow)
    Pending,
    /// Operation cancelled by user
    Cancel,
    /// Operation failed with error
    Failure(u16), // DICOM status code
    /// Warning occurred during operation
    Warning(u16), // DICOM status code
}

impl DimseStatus {
    /// 0x0110
    pub const PROCESSING_FAILURE: DimseStatus = DimseStatus::Failure(0x0110);
    /// 0x0112
    pub const NO_SUCH_SOP_INSTANCE: DimseStatus = DimseStatus::Failure(0x0112);

    /// Interpret a raw status code as defined in PS3.7 Annex C
    pub fn from_code(code: u16) -> Self {
        match code {
            0x0000 => DimseStatus::Success,
            0xFF00 | 0xFF01 => DimseStatus::Pending,
            0xFE00 => DimseStatus::Cancel,
            0x0001 | 0x0107 | 0x0116 | 0xB000..=0xBFFF => DimseStatus::Warning(code),
            other => DimseStatus::Failure(other),
        }
    }

    /// Raw status code
    pub fn code(&self) -> u16 {
        match self {
            DimseStatus::Success => 0x0000,
            DimseStatus::Pending => 0xFF00,
            DimseStatus::Cancel => 0xFE00,
            DimseStatus::Failure(code) | DimseStatus::Warning(code) => *code,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DimseStatus::Success)
    }
}

impl std::fmt::Display for DimseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            DimseStatus::Success => "success",
            DimseStatus::Pending => "pending",
            DimseStatus::Cancel => "cancel",
            DimseStatus::Warning(_) => "warning",
            DimseStatus::Failure(0x0110) => "processing failure",
            DimseStatus::Failure(0x0112) => "no such SOP instance",
            DimseStatus::Failure(0x0118) => "no such SOP class",
            DimseStatus::Failure(0x0119) => "class-instance conflict",
            DimseStatus::Failure(0x0123) => "no such action",
            DimseStatus::Failure(_) => "failure",
        };
        write!(f, "{} (0x{:04X})", label, self.code())
    }
}

/// A DIMSE message: command fields plus an optional data set
#[derive(Debug, Clone)]
pub struct DimseMessage {
    /// Command field
    pub command: DimseCommand,
    /// Message ID of a request; zero on responses
    pub message_id: u16,
    /// Message ID Being Responded To, set on responses
    pub responded_message_id: Option<u16>,
    /// Affected / Requested SOP Class UID
    pub sop_class_uid: String,
    /// Affected / Requested SOP Instance UID
    pub sop_instance_uid: String,
    /// Action Type ID (N-ACTION) or Event Type ID (N-EVENT-REPORT)
    pub type_id: Option<u16>,
    /// Status, set on responses
    pub status: Option<DimseStatus>,
    /// Data set following the command, if any
    pub dataset: Option<InMemDicomObject>,
}

impl DimseMessage {
    /// Storage commitment N-ACTION request
    pub fn n_action_rq(message_id: u16, dataset: InMemDicomObject) -> Self {
        Self {
            command: DimseCommand::NActionRq,
            message_id,
            responded_message_id: None,
            sop_class_uid: STORAGE_COMMITMENT_PUSH_MODEL.to_string(),
            sop_instance_uid: STORAGE_COMMITMENT_PUSH_MODEL_INSTANCE.to_string(),
            type_id: Some(ACTION_TYPE_REQUEST_COMMITMENT),
            status: None,
            dataset: Some(dataset),
        }
    }

    /// N-ACTION response to `request`
    pub fn n_action_rsp(request: &DimseMessage, status: DimseStatus) -> Self {
        Self {
            command: DimseCommand::NActionRsp,
            message_id: 0,
            responded_message_id: Some(request.message_id),
            sop_class_uid: request.sop_class_uid.clone(),
            sop_instance_uid: request.sop_instance_uid.clone(),
            type_id: request.type_id,
            status: Some(status),
            dataset: None,
        }
    }

    /// Storage commitment N-EVENT-REPORT request
    pub fn n_event_report_rq(message_id: u16, event_type_id: u16, dataset: InMemDicomObject) -> Self {
        Self {
            command: DimseCommand::NEventReportRq,
            message_id,
            responded_message_id: None,
            sop_class_uid: STORAGE_COMMITMENT_PUSH_MODEL.to_string(),
            sop_instance_uid: STORAGE_COMMITMENT_PUSH_MODEL_INSTANCE.to_string(),
            type_id: Some(event_type_id),
            status: None,
            dataset: Some(dataset),
        }
    }

    /// N-EVENT-REPORT response to `request`
    pub fn n_event_report_rsp(request: &DimseMessage, status: DimseStatus) -> Self {
        Self {
            command: DimseCommand::NEventReportRsp,
            message_id: 0,
            responded_message_id: Some(request.message_id),
            sop_class_uid: request.sop_class_uid.clone(),
            sop_instance_uid: request.sop_instance_uid.clone(),
            type_id: request.type_id,
            status: Some(status),
            dataset: None,
        }
    }

    /// Read a string attribute of the data set
    pub fn string(&self, tag: Tag) -> Option<String> {
        self.dataset.as_ref().and_then(|ds| string_attr(ds, tag))
    }

    /// Items of a sequence attribute of the data set (empty when absent)
    pub fn items(&self, tag: Tag) -> &[InMemDicomObject] {
        self.dataset
            .as_ref()
            .map(|ds| sequence_items(ds, tag))
            .unwrap_or(&[])
    }
}

/// Read a string attribute, stripping DICOM padding
///
/// Absent, empty and non-textual attributes all yield `None`.
pub fn string_attr(obj: &InMemDicomObject, tag: Tag) -> Option<String> {
    let element = obj.element(tag).ok()?;
    let value = element.to_str().ok()?;
    let trimmed = value.trim_end_matches(|c: char| c == '\0' || c.is_whitespace()).trim_start();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Read an unsigned short attribute
pub fn u16_attr(obj: &InMemDicomObject, tag: Tag) -> Option<u16> {
    obj.element(tag).ok()?.to_int::<u16>().ok()
}

/// Items of a sequence attribute (empty when absent or not a sequence)
pub fn sequence_items(obj: &InMemDicomObject, tag: Tag) -> &[InMemDicomObject] {
    obj.element(tag)
        .ok()
        .and_then(|element| element.items())
        .unwrap_or(&[])
}

/// Set a UID attribute
pub fn put_uid(obj: &mut InMemDicomObject, tag: Tag, uid: &str) {
    obj.put(DataElement::new(tag, VR::UI, PrimitiveValue::from(uid)));
}

/// Set an unsigned short attribute
pub fn put_u16(obj: &mut InMemDicomObject, tag: Tag, value: u16) {
    obj.put(DataElement::new(tag, VR::US, PrimitiveValue::from(value)));
}

/// Set a sequence attribute from its items
pub fn put_sequence(obj: &mut InMemDicomObject, tag: Tag, items: Vec<InMemDicomObject>) {
    obj.put(DataElement::new(tag, VR::SQ, DataSetSequence::from(items)));
}
