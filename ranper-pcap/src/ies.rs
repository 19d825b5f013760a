//! Concrete IE codecs for the positioning protocol subset
//!
//! Each decoder has the registry signature so the schema tables can point
//! at it directly. Encoders exist for the IEs that request and response
//! builders need.

use ranper_codec::{ChoiceIndex, PerDecoder, PerEncoder, SizeBounds};
use ranper_container::DispatchRegistry;
use ranper_core::{CriticalityDiagnostics, PerError, PerResult, PerValue, SequenceField, TypeOfError};

/// Upper bound of the GNSS reference time field (milliseconds)
pub const GPS_REFERENCE_TIME_MAX: i64 = 2_322_431_999_999;

fn enum_value(value: ranper_codec::EnumValue) -> PerValue {
    PerValue::Enumerated {
        index: value.index,
        extended: value.extended,
        known: value.known,
    }
}

/// Cause: an extensible CHOICE over four enumerated cause groups.
pub fn decode_cause(input: &mut PerDecoder<'_>, _registry: &DispatchRegistry) -> PerResult<PerValue> {
    match input.decode_choice_index(true, 4)? {
        ChoiceIndex::Root(index) => {
            let root_count = match index {
                0 => 8, // radio network layer
                1 => 2, // transport layer
                2 => 7, // protocol
                3 => 5, // miscellaneous
                _ => {
                    return Err(PerError::InvalidData(format!(
                        "cause group index {} out of range",
                        index
                    )));
                }
            };
            let value = input.decode_enumerated(root_count, Some(0))?;
            Ok(PerValue::Choice {
                index,
                extended: false,
                value: Box::new(enum_value(value)),
            })
        }
        ChoiceIndex::Extension(index) => {
            let data = input.decode_open_type()?;
            Ok(PerValue::Choice {
                index,
                extended: true,
                value: Box::new(PerValue::Unknown {
                    key: Some(index),
                    data,
                }),
            })
        }
    }
}

/// Encode a cause from the root groups.
pub fn encode_cause(output: &mut PerEncoder, group: u32, value: u64) -> PerResult<()> {
    let root_count = match group {
        0 => 8,
        1 => 2,
        2 => 7,
        3 => 5,
        _ => {
            return Err(PerError::ConstraintViolation(format!(
                "cause group index {} out of range",
                group
            )));
        }
    };
    output.encode_choice_index(group, 4, true)?;
    output.encode_enumerated(value, root_count, true)
}

fn decode_ellipsoid_point(input: &mut PerDecoder<'_>) -> PerResult<Vec<SequenceField>> {
    let latitude_sign = input.decode_enumerated(2, None)?;
    let latitude = input.decode_constrained_integer(0, 8_388_607)?;
    let longitude = input.decode_constrained_integer(-8_388_608, 8_388_607)?;
    Ok(vec![
        SequenceField::new("latitude-sign", enum_value(latitude_sign)),
        SequenceField::new("latitude", PerValue::Integer(latitude)),
        SequenceField::new("longitude", PerValue::Integer(longitude)),
    ])
}

/// UE position estimate: a geographic point, optionally with altitude.
pub fn decode_ue_position_estimate(
    input: &mut PerDecoder<'_>,
    _registry: &DispatchRegistry,
) -> PerResult<PerValue> {
    match input.decode_choice_index(true, 2)? {
        ChoiceIndex::Root(0) => Ok(PerValue::Choice {
            index: 0,
            extended: false,
            value: Box::new(PerValue::Sequence(decode_ellipsoid_point(input)?)),
        }),
        ChoiceIndex::Root(_) => {
            let mut fields = decode_ellipsoid_point(input)?;
            let altitude_direction = input.decode_enumerated(2, None)?;
            let altitude = input.decode_constrained_integer(0, 32767)?;
            fields.push(SequenceField::new(
                "altitude-direction",
                enum_value(altitude_direction),
            ));
            fields.push(SequenceField::new("altitude", PerValue::Integer(altitude)));
            Ok(PerValue::Choice {
                index: 1,
                extended: false,
                value: Box::new(PerValue::Sequence(fields)),
            })
        }
        ChoiceIndex::Extension(index) => {
            let data = input.decode_open_type()?;
            Ok(PerValue::Choice {
                index,
                extended: true,
                value: Box::new(PerValue::Unknown {
                    key: Some(index),
                    data,
                }),
            })
        }
    }
}

/// Encode an ellipsoid-point position estimate (no altitude).
pub fn encode_ellipsoid_point(
    output: &mut PerEncoder,
    latitude_sign: u64,
    latitude: i64,
    longitude: i64,
) -> PerResult<()> {
    output.encode_choice_index(0, 2, true)?;
    output.encode_enumerated(latitude_sign, 2, false)?;
    output.encode_constrained_integer(latitude, 0, 8_388_607)?;
    output.encode_constrained_integer(longitude, -8_388_608, 8_388_607)
}

/// Horizontal accuracy code (uncertainty exponent scale).
pub fn decode_horizontal_accuracy(
    input: &mut PerDecoder<'_>,
    _registry: &DispatchRegistry,
) -> PerResult<PerValue> {
    Ok(PerValue::Integer(input.decode_constrained_integer(0, 127)?))
}

/// Vertical accuracy code.
pub fn decode_vertical_accuracy(
    input: &mut PerDecoder<'_>,
    _registry: &DispatchRegistry,
) -> PerResult<PerValue> {
    Ok(PerValue::Integer(input.decode_constrained_integer(0, 127)?))
}

/// Response time: low delay or delay tolerant.
pub fn decode_response_time(
    input: &mut PerDecoder<'_>,
    _registry: &DispatchRegistry,
) -> PerResult<PerValue> {
    Ok(enum_value(input.decode_enumerated(2, Some(0))?))
}

/// Positioning priority: high or normal.
pub fn decode_positioning_priority(
    input: &mut PerDecoder<'_>,
    _registry: &DispatchRegistry,
) -> PerResult<PerValue> {
    Ok(enum_value(input.decode_enumerated(2, Some(0))?))
}

/// Requesting client category.
pub fn decode_client_type(
    input: &mut PerDecoder<'_>,
    _registry: &DispatchRegistry,
) -> PerResult<PerValue> {
    Ok(enum_value(input.decode_enumerated(8, Some(0))?))
}

/// Positioning method selector.
pub fn decode_positioning_method(
    input: &mut PerDecoder<'_>,
    _registry: &DispatchRegistry,
) -> PerResult<PerValue> {
    Ok(enum_value(input.decode_enumerated(4, Some(0))?))
}

/// One satellite measurement set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpsMeasurement {
    pub satellite_id: i64,
    pub carrier_noise_ratio: i64,
    pub doppler: i64,
    pub whole_chips: i64,
    pub fractional_chips: i64,
    pub multipath_indicator: u64,
    pub pseudorange_rms_error: i64,
}

/// GPS measured results: one to sixteen satellite measurement sets.
pub fn decode_gps_measured_results_list(
    input: &mut PerDecoder<'_>,
    _registry: &DispatchRegistry,
) -> PerResult<PerValue> {
    let items = input.decode_sequence_of(SizeBounds::range(1, 16), |element| {
        let satellite_id = element.decode_constrained_integer(0, 63)?;
        let carrier_noise_ratio = element.decode_constrained_integer(0, 63)?;
        let doppler = element.decode_constrained_integer(-32768, 32767)?;
        let whole_chips = element.decode_constrained_integer(0, 1022)?;
        let fractional_chips = element.decode_constrained_integer(0, 1023)?;
        let multipath_indicator = element.decode_enumerated(4, None)?;
        let pseudorange_rms_error = element.decode_constrained_integer(0, 63)?;
        Ok(PerValue::Sequence(vec![
            SequenceField::new("satellite-id", PerValue::Integer(satellite_id)),
            SequenceField::new("carrier-noise-ratio", PerValue::Integer(carrier_noise_ratio)),
            SequenceField::new("doppler", PerValue::Integer(doppler)),
            SequenceField::new("whole-chips", PerValue::Integer(whole_chips)),
            SequenceField::new("fractional-chips", PerValue::Integer(fractional_chips)),
            SequenceField::new("multipath-indicator", enum_value(multipath_indicator)),
            SequenceField::new(
                "pseudorange-rms-error",
                PerValue::Integer(pseudorange_rms_error),
            ),
        ]))
    })?;
    Ok(PerValue::SequenceOf(items))
}

/// Encode a GPS measured results list.
pub fn encode_gps_measured_results_list(
    output: &mut PerEncoder,
    measurements: &[GpsMeasurement],
) -> PerResult<()> {
    output.encode_sequence_of(measurements, SizeBounds::range(1, 16), |enc, m| {
        enc.encode_constrained_integer(m.satellite_id, 0, 63)?;
        enc.encode_constrained_integer(m.carrier_noise_ratio, 0, 63)?;
        enc.encode_constrained_integer(m.doppler, -32768, 32767)?;
        enc.encode_constrained_integer(m.whole_chips, 0, 1022)?;
        enc.encode_constrained_integer(m.fractional_chips, 0, 1023)?;
        enc.encode_enumerated(m.multipath_indicator, 4, false)?;
        enc.encode_constrained_integer(m.pseudorange_rms_error, 0, 63)
    })
}

/// Request type: event kind, report area, optional accuracy code.
pub fn decode_request_type(
    input: &mut PerDecoder<'_>,
    _registry: &DispatchRegistry,
) -> PerResult<PerValue> {
    let header = input.decode_sequence_header(true, 1)?;
    let event = input.decode_enumerated(4, Some(0))?;
    let report_area = input.decode_enumerated(2, Some(0))?;
    let mut fields = vec![
        SequenceField::new("event", enum_value(event)),
        SequenceField::new("report-area", enum_value(report_area)),
    ];
    if header.optional_present(0) {
        fields.push(SequenceField::new(
            "horizontal-accuracy-code",
            PerValue::Integer(input.decode_constrained_integer(0, 127)?),
        ));
    }
    if header.extended {
        append_unknown_additions(input, &mut fields)?;
    }
    Ok(PerValue::Sequence(fields))
}

/// Encode a request type.
pub fn encode_request_type(
    output: &mut PerEncoder,
    event: u64,
    report_area: u64,
    horizontal_accuracy: Option<i64>,
) -> PerResult<()> {
    output.encode_sequence_header(true, false, &[horizontal_accuracy.is_some()])?;
    output.encode_enumerated(event, 4, true)?;
    output.encode_enumerated(report_area, 2, true)?;
    if let Some(accuracy) = horizontal_accuracy {
        output.encode_constrained_integer(accuracy, 0, 127)?;
    }
    Ok(())
}

/// UE positioning capability flags.
pub fn decode_ue_positioning_capability(
    input: &mut PerDecoder<'_>,
    _registry: &DispatchRegistry,
) -> PerResult<PerValue> {
    let header = input.decode_sequence_header(true, 2)?;
    let mut fields = vec![
        SequenceField::new(
            "standalone-location-methods",
            PerValue::Boolean(input.decode_bool()?),
        ),
        SequenceField::new("ue-based-otdoa", PerValue::Boolean(input.decode_bool()?)),
        SequenceField::new(
            "network-assisted-gps",
            enum_value(input.decode_enumerated(3, Some(0))?),
        ),
        SequenceField::new(
            "gps-timing-of-cell-frames",
            PerValue::Boolean(input.decode_bool()?),
        ),
        SequenceField::new("ipdl", PerValue::Boolean(input.decode_bool()?)),
        SequenceField::new(
            "rx-tx-time-difference",
            PerValue::Boolean(input.decode_bool()?),
        ),
    ];
    if header.optional_present(0) {
        fields.push(SequenceField::new(
            "ue-agps-in-cell-pch",
            PerValue::Boolean(input.decode_bool()?),
        ));
    }
    if header.optional_present(1) {
        fields.push(SequenceField::new(
            "sfn-sfn-time-difference",
            PerValue::Boolean(input.decode_bool()?),
        ));
    }
    if header.extended {
        append_unknown_additions(input, &mut fields)?;
    }
    Ok(PerValue::Sequence(fields))
}

/// Capability flags accepted by the capability encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct UeCapabilityFlags {
    pub standalone_location_methods: bool,
    pub ue_based_otdoa: bool,
    pub network_assisted_gps: u64,
    pub gps_timing_of_cell_frames: bool,
    pub ipdl: bool,
    pub rx_tx_time_difference: bool,
    pub ue_agps_in_cell_pch: Option<bool>,
    pub sfn_sfn_time_difference: Option<bool>,
}

/// Encode UE positioning capability flags.
pub fn encode_ue_positioning_capability(
    output: &mut PerEncoder,
    flags: &UeCapabilityFlags,
) -> PerResult<()> {
    output.encode_sequence_header(
        true,
        false,
        &[
            flags.ue_agps_in_cell_pch.is_some(),
            flags.sfn_sfn_time_difference.is_some(),
        ],
    )?;
    output.encode_bool(flags.standalone_location_methods);
    output.encode_bool(flags.ue_based_otdoa);
    output.encode_enumerated(flags.network_assisted_gps, 3, true)?;
    output.encode_bool(flags.gps_timing_of_cell_frames);
    output.encode_bool(flags.ipdl);
    output.encode_bool(flags.rx_tx_time_difference);
    if let Some(v) = flags.ue_agps_in_cell_pch {
        output.encode_bool(v);
    }
    if let Some(v) = flags.sfn_sfn_time_difference {
        output.encode_bool(v);
    }
    Ok(())
}

/// GNSS reference time, a wide constrained integer (extension IE).
pub fn decode_gps_reference_time(
    input: &mut PerDecoder<'_>,
    _registry: &DispatchRegistry,
) -> PerResult<PerValue> {
    Ok(PerValue::Integer(
        input.decode_constrained_integer(0, GPS_REFERENCE_TIME_MAX)?,
    ))
}

/// Encode the GNSS reference time extension.
pub fn encode_gps_reference_time(output: &mut PerEncoder, value: i64) -> PerResult<()> {
    output.encode_constrained_integer(value, 0, GPS_REFERENCE_TIME_MAX)
}

/// Criticality diagnostics as carried on the wire.
pub fn decode_criticality_diagnostics(
    input: &mut PerDecoder<'_>,
    _registry: &DispatchRegistry,
) -> PerResult<PerValue> {
    let header = input.decode_sequence_header(true, 5)?;
    let mut fields = Vec::new();
    if header.optional_present(0) {
        fields.push(SequenceField::new(
            "procedure-code",
            PerValue::Integer(input.decode_constrained_integer(0, 255)?),
        ));
    }
    if header.optional_present(1) {
        fields.push(SequenceField::new(
            "triggering-message",
            enum_value(input.decode_enumerated(4, None)?),
        ));
    }
    if header.optional_present(2) {
        fields.push(SequenceField::new(
            "procedure-criticality",
            enum_value(input.decode_enumerated(3, None)?),
        ));
    }
    if header.optional_present(3) {
        let transaction = ranper_container::decode_transaction_id(input)?;
        fields.push(SequenceField::new(
            "transaction-id",
            PerValue::Integer(i64::from(transaction.value())),
        ));
    }
    if header.optional_present(4) {
        let entries = input.decode_sequence_of(SizeBounds::range(1, 256), |element| {
            let entry_header = element.decode_sequence_header(true, 1)?;
            let criticality = element.decode_enumerated(3, None)?;
            let ie_id = element.decode_constrained_integer(0, 65535)?;
            let mut entry = vec![
                SequenceField::new("ie-criticality", enum_value(criticality)),
                SequenceField::new("ie-id", PerValue::Integer(ie_id)),
            ];
            if entry_header.optional_present(0) {
                entry.push(SequenceField::new(
                    "repetition-number",
                    PerValue::Integer(element.decode_constrained_integer(0, 255)?),
                ));
            }
            entry.push(SequenceField::new(
                "type-of-error",
                enum_value(element.decode_enumerated(2, Some(0))?),
            ));
            if entry_header.extended {
                let mut extra = Vec::new();
                append_unknown_additions(element, &mut extra)?;
                entry.extend(extra);
            }
            Ok(PerValue::Sequence(entry))
        })?;
        fields.push(SequenceField::new(
            "ie-criticality-diagnostics",
            PerValue::SequenceOf(entries),
        ));
    }
    if header.extended {
        append_unknown_additions(input, &mut fields)?;
    }
    Ok(PerValue::Sequence(fields))
}

/// Encode a diagnostics record for an outgoing response.
pub fn encode_criticality_diagnostics(
    output: &mut PerEncoder,
    diagnostics: &CriticalityDiagnostics,
) -> PerResult<()> {
    output.encode_sequence_header(
        true,
        false,
        &[
            diagnostics.procedure_code.is_some(),
            diagnostics.triggering_message.is_some(),
            diagnostics.procedure_criticality.is_some(),
            diagnostics.transaction_id.is_some(),
            !diagnostics.ie_errors.is_empty(),
        ],
    )?;
    if let Some(code) = diagnostics.procedure_code {
        output.encode_constrained_integer(i64::from(code.value()), 0, 255)?;
    }
    if let Some(kind) = diagnostics.triggering_message {
        output.encode_enumerated(u64::from(kind.choice_index()), 4, false)?;
    }
    if let Some(criticality) = diagnostics.procedure_criticality {
        output.encode_enumerated(criticality.index(), 3, false)?;
    }
    if let Some(transaction) = diagnostics.transaction_id {
        ranper_container::encode_transaction_id(output, transaction)?;
    }
    if !diagnostics.ie_errors.is_empty() {
        output.encode_sequence_of(
            &diagnostics.ie_errors,
            SizeBounds::range(1, 256),
            |enc, entry| {
                enc.encode_sequence_header(
                    true,
                    false,
                    &[entry.repetition_number.is_some()],
                )?;
                enc.encode_enumerated(entry.criticality.index(), 3, false)?;
                enc.encode_constrained_integer(i64::from(entry.ie_id.value()), 0, 65535)?;
                if let Some(repetition) = entry.repetition_number {
                    enc.encode_constrained_integer(i64::from(repetition), 0, 255)?;
                }
                let error_index = match entry.type_of_error {
                    TypeOfError::NotUnderstood => 0,
                    TypeOfError::Missing => 1,
                };
                enc.encode_enumerated(error_index, 2, true)
            },
        )?;
    }
    Ok(())
}

/// Read any extension additions and retain the unknown ones as opaque
/// fields.
fn append_unknown_additions(
    input: &mut PerDecoder<'_>,
    fields: &mut Vec<SequenceField>,
) -> PerResult<()> {
    for (slot, payload) in input.decode_extension_additions()?.into_iter().enumerate() {
        if let Some(data) = payload {
            fields.push(SequenceField::new(
                format!("extension-{}", slot),
                PerValue::Unknown {
                    key: Some(slot as u32),
                    data,
                },
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ranper_container::RegistryBuilder;
    use ranper_core::{Criticality, MessageKind, ProcedureCode, ProtocolIeId, TransactionId};

    fn empty_registry() -> DispatchRegistry {
        RegistryBuilder::new().build()
    }

    #[test]
    fn test_cause_round_trip() {
        let mut enc = PerEncoder::new();
        encode_cause(&mut enc, 2, 4).unwrap();
        let bytes = enc.into_bytes();
        let mut dec = PerDecoder::new(&bytes);
        let value = decode_cause(&mut dec, &empty_registry()).unwrap();
        let (group, inner) = value.as_choice().unwrap();
        assert_eq!(group, 2);
        assert_eq!(inner.as_enumerated(), Some(4));
    }

    #[test]
    fn test_position_estimate_round_trip() {
        let mut enc = PerEncoder::new();
        encode_ellipsoid_point(&mut enc, 1, 2_097_152, -4_194_304).unwrap();
        let bytes = enc.into_bytes();
        let mut dec = PerDecoder::new(&bytes);
        let value = decode_ue_position_estimate(&mut dec, &empty_registry()).unwrap();
        let (index, point) = value.as_choice().unwrap();
        assert_eq!(index, 0);
        assert_eq!(
            point.field("latitude").and_then(PerValue::as_integer),
            Some(2_097_152)
        );
        assert_eq!(
            point.field("longitude").and_then(PerValue::as_integer),
            Some(-4_194_304)
        );
    }

    #[test]
    fn test_request_type_presence_combinations() {
        for accuracy in [None, Some(31)] {
            let mut enc = PerEncoder::new();
            encode_request_type(&mut enc, 1, 0, accuracy).unwrap();
            let bytes = enc.into_bytes();
            let mut dec = PerDecoder::new(&bytes);
            let value = decode_request_type(&mut dec, &empty_registry()).unwrap();
            assert_eq!(
                value
                    .field("horizontal-accuracy-code")
                    .and_then(PerValue::as_integer),
                accuracy
            );
        }
    }

    #[test]
    fn test_capability_round_trip() {
        let flags = UeCapabilityFlags {
            standalone_location_methods: true,
            ue_based_otdoa: false,
            network_assisted_gps: 2,
            gps_timing_of_cell_frames: true,
            ipdl: false,
            rx_tx_time_difference: true,
            ue_agps_in_cell_pch: Some(false),
            sfn_sfn_time_difference: None,
        };
        let mut enc = PerEncoder::new();
        encode_ue_positioning_capability(&mut enc, &flags).unwrap();
        let bytes = enc.into_bytes();
        let mut dec = PerDecoder::new(&bytes);
        let value = decode_ue_positioning_capability(&mut dec, &empty_registry()).unwrap();
        assert_eq!(
            value
                .field("standalone-location-methods")
                .and_then(PerValue::as_boolean),
            Some(true)
        );
        assert_eq!(
            value
                .field("ue-agps-in-cell-pch")
                .and_then(PerValue::as_boolean),
            Some(false)
        );
        assert!(value.field("sfn-sfn-time-difference").is_none());
    }

    #[test]
    fn test_gps_measurements_round_trip() {
        let measurements = [
            GpsMeasurement {
                satellite_id: 12,
                carrier_noise_ratio: 45,
                doppler: -1200,
                whole_chips: 512,
                fractional_chips: 300,
                multipath_indicator: 1,
                pseudorange_rms_error: 20,
            },
            GpsMeasurement {
                satellite_id: 30,
                carrier_noise_ratio: 38,
                doppler: 32767,
                whole_chips: 1022,
                fractional_chips: 1023,
                multipath_indicator: 3,
                pseudorange_rms_error: 63,
            },
        ];
        let mut enc = PerEncoder::new();
        encode_gps_measured_results_list(&mut enc, &measurements).unwrap();
        let bytes = enc.into_bytes();
        let mut dec = PerDecoder::new(&bytes);
        let value = decode_gps_measured_results_list(&mut dec, &empty_registry()).unwrap();
        let items = value.as_sequence_of().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(
            items[1].field("doppler").and_then(PerValue::as_integer),
            Some(32767)
        );
        assert_eq!(
            items[1]
                .field("fractional-chips")
                .and_then(PerValue::as_integer),
            Some(1023)
        );
    }

    #[test]
    fn test_gps_reference_time_round_trip() {
        for value in [0, 1_234_567_890_123, GPS_REFERENCE_TIME_MAX] {
            let mut enc = PerEncoder::new();
            encode_gps_reference_time(&mut enc, value).unwrap();
            let bytes = enc.into_bytes();
            let mut dec = PerDecoder::new(&bytes);
            let decoded = decode_gps_reference_time(&mut dec, &empty_registry()).unwrap();
            assert_eq!(decoded.as_integer(), Some(value));
        }
    }

    #[test]
    fn test_criticality_diagnostics_round_trip() {
        let record = CriticalityDiagnostics {
            procedure_code: Some(ProcedureCode::new(1)),
            triggering_message: Some(MessageKind::InitiatingMessage),
            procedure_criticality: Some(Criticality::Reject),
            transaction_id: Some(TransactionId::Short(5)),
            ie_errors: vec![ranper_core::IeCriticalityDiagnostics {
                criticality: Criticality::Notify,
                ie_id: ProtocolIeId::new(42),
                repetition_number: Some(1),
                message_structure: None,
                type_of_error: TypeOfError::Missing,
            }],
        };
        let mut enc = PerEncoder::new();
        encode_criticality_diagnostics(&mut enc, &record).unwrap();
        let bytes = enc.into_bytes();
        let mut dec = PerDecoder::new(&bytes);
        let value = decode_criticality_diagnostics(&mut dec, &empty_registry()).unwrap();

        assert_eq!(
            value.field("procedure-code").and_then(PerValue::as_integer),
            Some(1)
        );
        let entries = value
            .field("ie-criticality-diagnostics")
            .and_then(PerValue::as_sequence_of)
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].field("ie-id").and_then(PerValue::as_integer),
            Some(42)
        );
        assert_eq!(
            entries[0]
                .field("type-of-error")
                .and_then(PerValue::as_enumerated),
            Some(1)
        );
    }

    #[test]
    fn test_unknown_cause_group_decodes_opaque() {
        // an extension alternative the schema does not know
        let mut enc = PerEncoder::new();
        enc.encode_choice_extension(7).unwrap();
        enc.encode_open_type(&[0x01, 0x02, 0x03]).unwrap();
        let bytes = enc.into_bytes();
        let mut dec = PerDecoder::new(&bytes);
        let value = decode_cause(&mut dec, &empty_registry()).unwrap();
        assert!(value.is_unknown());
        let (index, inner) = value.as_choice().unwrap();
        assert_eq!(index, 7);
        match inner {
            PerValue::Unknown { data, .. } => assert_eq!(data.len(), 3),
            other => panic!("expected opaque value, got {:?}", other),
        }
    }
}
