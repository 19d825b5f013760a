//! Data-driven dispatch tables
//!
//! One row per IE, extension and message. `register` walks the tables and
//! populates a registry builder; this is the only place where numeric keys
//! and decode functions meet, so adding protocol coverage means adding
//! rows, not writing dispatch code.

use crate::constants::{extensions, ies, procedures, PROTOCOL_PREFIX};
use crate::ies as codecs;
use ranper_codec::PerDecoder;
use ranper_container::{
    decode_standard_message, DispatchRegistry, ProtocolNamespaces, RegistryBuilder,
};
use ranper_core::{Criticality, MessageKind, PerResult, PerValue, ProtocolIeId};

type IeFn = fn(&mut PerDecoder<'_>, &DispatchRegistry) -> PerResult<PerValue>;

/// One IE table row
pub struct IeDef {
    pub id: u16,
    pub name: &'static str,
    pub decode: IeFn,
}

/// One message table row: the `(procedure, kind)` dispatch key and the
/// mandatory IEs with the criticality to apply when one is absent
pub struct MessageDef {
    pub procedure: u8,
    pub kind: MessageKind,
    pub name: &'static str,
    pub required: &'static [(u16, Criticality)],
}

/// Protocol IE table
pub const PROTOCOL_IES: &[IeDef] = &[
    IeDef {
        id: ies::CAUSE,
        name: "Cause",
        decode: codecs::decode_cause,
    },
    IeDef {
        id: ies::CRITICALITY_DIAGNOSTICS,
        name: "CriticalityDiagnostics",
        decode: codecs::decode_criticality_diagnostics,
    },
    IeDef {
        id: ies::UE_POSITION_ESTIMATE,
        name: "UE-PositionEstimate",
        decode: codecs::decode_ue_position_estimate,
    },
    IeDef {
        id: ies::HORIZONTAL_ACCURACY_CODE,
        name: "HorizontalAccuracyCode",
        decode: codecs::decode_horizontal_accuracy,
    },
    IeDef {
        id: ies::VERTICAL_ACCURACY_CODE,
        name: "VerticalAccuracyCode",
        decode: codecs::decode_vertical_accuracy,
    },
    IeDef {
        id: ies::RESPONSE_TIME,
        name: "ResponseTime",
        decode: codecs::decode_response_time,
    },
    IeDef {
        id: ies::POSITIONING_PRIORITY,
        name: "PositioningPriority",
        decode: codecs::decode_positioning_priority,
    },
    IeDef {
        id: ies::CLIENT_TYPE,
        name: "ClientType",
        decode: codecs::decode_client_type,
    },
    IeDef {
        id: ies::POSITIONING_METHOD,
        name: "PositioningMethod",
        decode: codecs::decode_positioning_method,
    },
    IeDef {
        id: ies::GPS_MEASURED_RESULTS_LIST,
        name: "GPS-MeasuredResultsList",
        decode: codecs::decode_gps_measured_results_list,
    },
    IeDef {
        id: ies::REQUEST_TYPE,
        name: "RequestType",
        decode: codecs::decode_request_type,
    },
    IeDef {
        id: ies::UE_POSITIONING_CAPABILITY,
        name: "UE-PositioningCapability",
        decode: codecs::decode_ue_positioning_capability,
    },
];

/// Protocol extension table
pub const EXTENSION_IES: &[IeDef] = &[IeDef {
    id: extensions::GPS_REFERENCE_TIME,
    name: "GPS-ReferenceTime",
    decode: codecs::decode_gps_reference_time,
}];

/// Message table
pub const MESSAGES: &[MessageDef] = &[
    MessageDef {
        procedure: procedures::POSITION_CALCULATION,
        kind: MessageKind::InitiatingMessage,
        name: "PositionCalculationRequest",
        required: &[
            (ies::POSITIONING_METHOD, Criticality::Reject),
            (ies::CLIENT_TYPE, Criticality::Notify),
        ],
    },
    MessageDef {
        procedure: procedures::POSITION_CALCULATION,
        kind: MessageKind::SuccessfulOutcome,
        name: "PositionCalculationResponse",
        required: &[(ies::UE_POSITION_ESTIMATE, Criticality::Reject)],
    },
    MessageDef {
        procedure: procedures::POSITION_CALCULATION,
        kind: MessageKind::UnsuccessfulOutcome,
        name: "PositionCalculationFailure",
        required: &[(ies::CAUSE, Criticality::Reject)],
    },
    MessageDef {
        procedure: procedures::INFORMATION_EXCHANGE,
        kind: MessageKind::InitiatingMessage,
        name: "InformationExchangeInitiationRequest",
        required: &[(ies::REQUEST_TYPE, Criticality::Reject)],
    },
    MessageDef {
        procedure: procedures::INFORMATION_EXCHANGE,
        kind: MessageKind::Outcome,
        name: "InformationReport",
        required: &[],
    },
    MessageDef {
        procedure: procedures::POSITION_PARAMETER_MODIFICATION,
        kind: MessageKind::InitiatingMessage,
        name: "PositionParameterModification",
        required: &[],
    },
    MessageDef {
        procedure: procedures::POSITION_INITIATION,
        kind: MessageKind::InitiatingMessage,
        name: "PositionInitiationRequest",
        required: &[(ies::REQUEST_TYPE, Criticality::Reject)],
    },
    MessageDef {
        procedure: procedures::POSITION_ACTIVATION,
        kind: MessageKind::InitiatingMessage,
        name: "PositionActivationRequest",
        required: &[],
    },
    MessageDef {
        procedure: procedures::ABORT,
        kind: MessageKind::InitiatingMessage,
        name: "Abort",
        required: &[(ies::CAUSE, Criticality::Ignore)],
    },
    MessageDef {
        procedure: procedures::POSITION_PERIODIC_REPORT,
        kind: MessageKind::Outcome,
        name: "PositionPeriodicReport",
        required: &[],
    },
];

/// Namespaces of this protocol's dispatch tables.
pub fn namespaces() -> ProtocolNamespaces {
    ProtocolNamespaces::new(PROTOCOL_PREFIX)
}

/// Populate `builder` from the tables.
pub fn register(builder: &mut RegistryBuilder) {
    let ns = namespaces();
    for def in PROTOCOL_IES {
        builder.register_ie(ns.ies(), u32::from(def.id), def.decode);
    }
    for def in EXTENSION_IES {
        builder.register_ie(ns.extensions(), u32::from(def.id), def.decode);
    }
    for def in MESSAGES {
        let ies_namespace = ns.ies();
        let extensions_namespace = ns.extensions();
        let required: Vec<(ProtocolIeId, Criticality)> = def
            .required
            .iter()
            .map(|&(id, criticality)| (ProtocolIeId::new(id), criticality))
            .collect();
        builder.register_procedure(
            ns.procedure(def.kind),
            u32::from(def.procedure),
            move |input, registry, diagnostics| {
                decode_standard_message(
                    input,
                    registry,
                    &ies_namespace,
                    &extensions_namespace,
                    &required,
                    diagnostics,
                )
            },
        );
    }
    log::debug!("registered {} protocol tables", PROTOCOL_PREFIX);
}

/// Build a registry holding exactly this protocol's tables.
pub fn registry() -> DispatchRegistry {
    let mut builder = RegistryBuilder::new();
    register(&mut builder);
    builder.build()
}
