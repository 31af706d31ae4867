//! Binary serialization and deserialization of compiled programs.
//!
//! This module provides a stable binary format for persisting a compiled
//! [`Program`](crate::Program) between the compile and emission stages. The format
//! consists of a 32-byte fixed header followed by a bincode-encoded payload.
//!
//! ## Wire Format
//!
//! ```text
//! Offset  Size  Field
//! 0       4     Magic bytes: b"RULR"
//! 4       2     Format version (u16, little-endian)
//! 6       2     Engine version (u16, little-endian)
//! 8       4     Flags (u32, reserved)
//! 12      4     Payload length in bytes (u32, little-endian)
//! 16      16    BLAKE3 hash of the payload (truncated to 16 bytes)
//! 32..    var   Bincode-encoded payload
//! ```
//!
//! ## Versioning
//!
//! The format version in the header must match exactly. If it does not,
//! deserialization fails immediately with [`DeserializeError::IncompatibleVersion`].
//! The engine version is informational only.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{
    GroupSpec, InputType, OutputPlan, Program, RequiredInput, RuleGroupConfig, RuleGroupSpec,
    RuleNode, TypeRegistry, Value,
};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const MAGIC: &[u8; 4] = b"RULR";
const FORMAT_VERSION: u16 = 1;
const ENGINE_VERSION: u16 = 1;
const HEADER_SIZE: usize = 32;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when serializing a [`Program`](crate::Program) to bytes.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("failed to encode program: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("encoded program is {len} bytes, the frame holds at most 4 GiB")]
    PayloadTooLarge { len: usize },

    #[error("I/O error during serialization: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur when deserializing a [`Program`](crate::Program) from bytes.
#[derive(Debug, Error)]
pub enum DeserializeError {
    #[error("not a ruller binary: invalid magic bytes")]
    BadMagic,

    #[error("incompatible format version: blob is v{blob}, engine supports v{supported}")]
    IncompatibleVersion { blob: u16, supported: u16 },

    #[error("integrity check failed: BLAKE3 checksum mismatch")]
    ChecksumMismatch,

    #[error("payload length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: u32, actual: usize },

    #[error("failed to decode payload: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("I/O error during deserialization: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Serialized type hierarchy
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct SerializedProgram {
    metadata: ProgramMetadata,
    rule_groups: Vec<SerializedRuleGroup>,
    input_types: Vec<(String, InputType)>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ProgramMetadata {
    rule_group_count: usize,
    node_count: usize,
    input_count: usize,
    source_digest: Option<[u8; 32]>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializedRuleGroup {
    name: String,
    config: RuleGroupConfig,
    groups: Vec<(String, GroupSpec)>,
    input_types: Vec<(String, InputType)>,
    required_inputs: Vec<RequiredInput>,
    nodes: Vec<SerializedNode>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializedNode {
    id: u32,
    parent: Option<u32>,
    condition_source: String,
    explicit_condition: bool,
    compiled_condition: String,
    static_attributes: Vec<(String, Value)>,
    output: OutputPlan,
}

fn registry_pairs(registry: &TypeRegistry) -> Vec<(String, InputType)> {
    registry
        .iter()
        .map(|(name, ty)| (name.to_owned(), ty))
        .collect()
}

// ---------------------------------------------------------------------------
// Program -> SerializedProgram
// ---------------------------------------------------------------------------

fn program_to_serialized(program: &Program, source_text: Option<&str>) -> SerializedProgram {
    let source_digest = source_text.map(|s| *blake3::hash(s.as_bytes()).as_bytes());

    let rule_groups: Vec<SerializedRuleGroup> = program
        .rule_groups
        .iter()
        .map(|g| SerializedRuleGroup {
            name: g.name.clone(),
            config: g.config.clone(),
            groups: g
                .groups
                .iter()
                .map(|(name, spec)| (name.clone(), spec.clone()))
                .collect(),
            input_types: registry_pairs(&g.type_registry),
            required_inputs: g.required_inputs.clone(),
            nodes: g
                .nodes
                .iter()
                .map(|n| SerializedNode {
                    id: n.id,
                    parent: n.parent,
                    condition_source: n.condition_source.clone(),
                    explicit_condition: n.explicit_condition,
                    compiled_condition: n.compiled_condition.clone(),
                    static_attributes: n
                        .static_attributes
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect(),
                    output: n.output.clone(),
                })
                .collect(),
        })
        .collect();

    SerializedProgram {
        metadata: ProgramMetadata {
            rule_group_count: rule_groups.len(),
            node_count: rule_groups.iter().map(|g| g.nodes.len()).sum(),
            input_count: program.types.len(),
            source_digest,
        },
        rule_groups,
        input_types: registry_pairs(&program.types),
    }
}

// ---------------------------------------------------------------------------
// SerializedProgram -> Program
// ---------------------------------------------------------------------------

fn serialized_to_program(ser: SerializedProgram) -> Result<Program, DeserializeError> {
    validate(&ser)?;

    let rule_groups = ser
        .rule_groups
        .into_iter()
        .map(|g| {
            let name = g.name;
            let nodes = g
                .nodes
                .into_iter()
                .map(|n| RuleNode {
                    id: n.id,
                    parent: n.parent,
                    rule_group: name.clone(),
                    condition_source: n.condition_source,
                    explicit_condition: n.explicit_condition,
                    compiled_condition: n.compiled_condition,
                    static_attributes: n.static_attributes.into_iter().collect(),
                    output: n.output,
                })
                .collect();
            RuleGroupSpec {
                name,
                config: g.config,
                groups: g.groups.into_iter().collect(),
                type_registry: g.input_types.into_iter().collect(),
                required_inputs: g.required_inputs,
                nodes,
            }
        })
        .collect();

    Ok(Program {
        rule_groups,
        types: ser.input_types.into_iter().collect(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(ser: &SerializedProgram) -> Result<(), DeserializeError> {
    let node_count: usize = ser.rule_groups.iter().map(|g| g.nodes.len()).sum();

    // Metadata consistency
    if ser.metadata.rule_group_count != ser.rule_groups.len() {
        return Err(DeserializeError::Validation(format!(
            "metadata says {} rule groups but payload has {}",
            ser.metadata.rule_group_count,
            ser.rule_groups.len()
        )));
    }
    if ser.metadata.node_count != node_count {
        return Err(DeserializeError::Validation(format!(
            "metadata says {} nodes but payload has {}",
            ser.metadata.node_count, node_count
        )));
    }
    if ser.metadata.input_count != ser.input_types.len() {
        return Err(DeserializeError::Validation(format!(
            "metadata says {} inputs but payload has {}",
            ser.metadata.input_count,
            ser.input_types.len()
        )));
    }

    // Rule groups in strictly ascending name order
    for window in ser.rule_groups.windows(2) {
        if window[0].name >= window[1].name {
            return Err(DeserializeError::Validation(format!(
                "rule groups '{}' and '{}' are not in ascending name order",
                window[0].name, window[1].name
            )));
        }
    }

    let mut expected_id: u32 = 1;
    for group in &ser.rule_groups {
        validate_nodes(group, &mut expected_id)?;

        if !group.config.lazy_evaluation && !group.required_inputs.is_empty() {
            return Err(DeserializeError::Validation(format!(
                "rule group '{}' lists required inputs without lazy evaluation",
                group.name
            )));
        }
        for required in &group.required_inputs {
            if required.rule_group != group.name {
                return Err(DeserializeError::Validation(format!(
                    "required input '{}' belongs to '{}' but is listed under '{}'",
                    required.input, required.rule_group, group.name
                )));
            }
        }
    }

    Ok(())
}

/// Ids must continue the global sequence and every parent must be an earlier node of
/// the same rule group.
fn validate_nodes(
    group: &SerializedRuleGroup,
    expected_id: &mut u32,
) -> Result<(), DeserializeError> {
    let mut seen = HashSet::with_capacity(group.nodes.len());
    for node in &group.nodes {
        if node.id != *expected_id {
            return Err(DeserializeError::Validation(format!(
                "node id {} in rule group '{}' breaks the id sequence (expected {})",
                node.id, group.name, expected_id
            )));
        }
        if let Some(parent) = node.parent {
            if !seen.contains(&parent) {
                return Err(DeserializeError::Validation(format!(
                    "node {} references parent {} which is not an earlier node of rule group '{}'",
                    node.id, parent, group.name
                )));
            }
        }
        seen.insert(node.id);
        *expected_id += 1;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// Fixed-size frame preceding the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Header {
    format_version: u16,
    engine_version: u16,
    payload_len: u32,
    digest: [u8; 16],
}

impl Header {
    fn for_payload(payload: &[u8]) -> Result<Self, SerializeError> {
        let payload_len = u32::try_from(payload.len())
            .map_err(|_| SerializeError::PayloadTooLarge { len: payload.len() })?;
        Ok(Self {
            format_version: FORMAT_VERSION,
            engine_version: ENGINE_VERSION,
            payload_len,
            digest: truncated_digest(payload),
        })
    }

    fn to_bytes(self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..4].copy_from_slice(MAGIC);
        out[4..6].copy_from_slice(&self.format_version.to_le_bytes());
        out[6..8].copy_from_slice(&self.engine_version.to_le_bytes());
        // 8..12: flags, always zero
        out[12..16].copy_from_slice(&self.payload_len.to_le_bytes());
        out[16..32].copy_from_slice(&self.digest);
        out
    }

    #[allow(clippy::cast_possible_truncation)]
    fn parse(bytes: &[u8]) -> Result<Self, DeserializeError> {
        let Some(frame) = bytes.get(..HEADER_SIZE) else {
            return Err(DeserializeError::LengthMismatch {
                expected: HEADER_SIZE as u32,
                actual: bytes.len(),
            });
        };
        if &frame[0..4] != MAGIC {
            return Err(DeserializeError::BadMagic);
        }
        let mut digest = [0u8; 16];
        digest.copy_from_slice(&frame[16..32]);
        Ok(Self {
            format_version: u16::from_le_bytes([frame[4], frame[5]]),
            engine_version: u16::from_le_bytes([frame[6], frame[7]]),
            payload_len: u32::from_le_bytes([frame[12], frame[13], frame[14], frame[15]]),
            digest,
        })
    }
}

fn truncated_digest(payload: &[u8]) -> [u8; 16] {
    let mut digest = [0u8; 16];
    digest.copy_from_slice(&blake3::hash(payload).as_bytes()[..16]);
    digest
}

// ---------------------------------------------------------------------------
// Public encode/decode
// ---------------------------------------------------------------------------

pub(crate) fn encode(
    program: &Program,
    source_text: Option<&str>,
) -> Result<Vec<u8>, SerializeError> {
    let serialized = program_to_serialized(program, source_text);
    let payload = bincode::serde::encode_to_vec(&serialized, bincode::config::standard())?;
    let header = Header::for_payload(&payload)?;

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    buf.extend_from_slice(&header.to_bytes());
    buf.extend_from_slice(&payload);
    Ok(buf)
}

pub(crate) fn decode(bytes: &[u8]) -> Result<Program, DeserializeError> {
    let header = Header::parse(bytes)?;
    if header.format_version != FORMAT_VERSION {
        return Err(DeserializeError::IncompatibleVersion {
            blob: header.format_version,
            supported: FORMAT_VERSION,
        });
    }

    let body = &bytes[HEADER_SIZE..];
    let Some(payload) = body.get(..header.payload_len as usize) else {
        return Err(DeserializeError::LengthMismatch {
            expected: header.payload_len,
            actual: body.len(),
        });
    };
    if truncated_digest(payload) != header.digest {
        return Err(DeserializeError::ChecksumMismatch);
    }

    let (serialized, _): (SerializedProgram, usize) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard())?;
    serialized_to_program(serialized)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_program() -> Program {
        Program::from_json_str(
            "menu",
            r#"{"_config": {"lazy_evaluation": true},
                "_items": [{"_condition": "input:age > 3", "label": "a"}, {"_items": {"x": 1}}]}"#,
        )
        .unwrap()
    }

    fn serialized() -> SerializedProgram {
        program_to_serialized(&sample_program(), None)
    }

    #[test]
    fn program_round_trip_through_mirror() {
        let program = sample_program();
        let restored = serialized_to_program(program_to_serialized(&program, None)).unwrap();
        assert_eq!(restored, program);
    }

    #[test]
    fn metadata_counts() {
        let ser = serialized();
        assert_eq!(ser.metadata.rule_group_count, 1);
        assert_eq!(ser.metadata.node_count, 4);
        assert_eq!(ser.metadata.input_count, 1);
    }

    // -- Header --

    #[test]
    fn header_frames_payload() {
        let payload = b"compiled rule groups";
        let header = Header::for_payload(payload).unwrap();
        let bytes = header.to_bytes();
        assert_eq!(&bytes[0..4], MAGIC);
        assert_eq!(&bytes[8..12], &[0, 0, 0, 0]);

        let parsed = Header::parse(&bytes).unwrap();
        assert_eq!(parsed, header);
        assert_eq!(parsed.payload_len as usize, payload.len());
        assert_eq!(parsed.digest, truncated_digest(payload));
    }

    #[test]
    fn header_rejects_foreign_magic() {
        let mut bytes = Header::for_payload(b"x").unwrap().to_bytes();
        bytes[0..4].copy_from_slice(b"JSON");
        assert!(matches!(Header::parse(&bytes), Err(DeserializeError::BadMagic)));
    }

    #[test]
    fn header_needs_full_frame() {
        assert!(matches!(
            Header::parse(&[0u8; 10]),
            Err(DeserializeError::LengthMismatch { expected: 32, actual: 10 })
        ));
    }

    #[test]
    fn payload_shorter_than_declared() {
        let bytes = sample_program().to_bytes(None).unwrap();
        assert!(matches!(
            decode(&bytes[..bytes.len() - 3]),
            Err(DeserializeError::LengthMismatch { .. })
        ));
    }

    // -- Validation --

    #[test]
    fn validate_accepts_compiled_program() {
        assert!(validate(&serialized()).is_ok());
    }

    #[test]
    fn validate_id_gap() {
        let mut ser = serialized();
        ser.rule_groups[0].nodes[2].id = 9;
        assert!(matches!(validate(&ser), Err(DeserializeError::Validation(_))));
    }

    #[test]
    fn validate_parent_after_child() {
        let mut ser = serialized();
        ser.rule_groups[0].nodes[1].parent = Some(3);
        assert!(matches!(validate(&ser), Err(DeserializeError::Validation(_))));
    }

    #[test]
    fn validate_required_inputs_without_lazy() {
        let mut ser = serialized();
        ser.rule_groups[0].config.lazy_evaluation = false;
        assert!(matches!(validate(&ser), Err(DeserializeError::Validation(_))));
    }

    #[test]
    fn validate_metadata_mismatch() {
        let mut ser = serialized();
        ser.metadata.node_count = 7;
        assert!(matches!(validate(&ser), Err(DeserializeError::Validation(_))));
    }

    #[test]
    fn validate_group_order() {
        let mut ser = serialized();
        let mut copy = program_to_serialized(&sample_program(), None);
        let mut second = copy.rule_groups.remove(0);
        second.name = "aaa".into();
        second.nodes.clear();
        second.required_inputs.clear();
        ser.rule_groups.push(second);
        ser.metadata.rule_group_count = 2;
        assert!(matches!(validate(&ser), Err(DeserializeError::Validation(_))));
    }
}
