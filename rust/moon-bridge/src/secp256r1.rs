//! The secp256r1 signature verification co-instruction.
//!
//! The native verifier program checks one P-256 signature whose key,
//! signature and message all live inside this instruction's own data:
//!
//! ```text
//! offset  0   count = 1 (u8)
//!         1   padding = 0 (u8)
//!         2   signature_offset              = 49     (u16 LE)
//!         4   signature_instruction_index   = 0xFFFF
//!         6   public_key_offset             = 16
//!         8   public_key_instruction_index  = 0xFFFF
//!        10   message_data_offset           = 113
//!        12   message_data_size             = len(message)
//!        14   message_instruction_index     = 0xFFFF
//!        16   compressed public key (33)
//!        49   r ‖ s (64)
//!       113   message
//! ```
//!
//! An instruction index of `0xFFFF` means "this instruction".

use crate::BridgeError;
use moon_credentials::key::{COMPRESSED_KEY_LENGTH, CompressedPublicKey};
use moon_credentials::signature::{RAW_SIGNATURE_LENGTH, RawSignature};
use moon_encoding::pubkey::SECP256R1_PROGRAM_ID;
use moon_encoding::reader::AccountReader;
use moon_encoding::DecodeError;
use solana_instruction::Instruction;
use static_assertions::const_assert_eq;

/// Signatures verified by one instruction.
pub const SIGNATURE_COUNT: u8 = 1;

/// Length of the count byte, padding byte and one offsets record.
pub const HEADER_LENGTH: usize = 2 + 7 * 2;

/// Where the compressed public key starts.
pub const PUBLIC_KEY_OFFSET: u16 = HEADER_LENGTH as u16;

/// Where the `r ‖ s` signature starts.
pub const SIGNATURE_OFFSET: u16 = PUBLIC_KEY_OFFSET + COMPRESSED_KEY_LENGTH as u16;

/// Where the signed message starts.
pub const MESSAGE_OFFSET: u16 = SIGNATURE_OFFSET + RAW_SIGNATURE_LENGTH as u16;

/// Instruction index that refers to the verifier instruction itself.
pub const CURRENT_INSTRUCTION: u16 = u16::MAX;

/// Longest message the offsets record can describe.
pub const MAX_MESSAGE_LENGTH: usize = u16::MAX as usize;

const_assert_eq!(PUBLIC_KEY_OFFSET, 16);
const_assert_eq!(SIGNATURE_OFFSET, 49);
const_assert_eq!(MESSAGE_OFFSET, 113);

/// Knobs for [`verifier_instruction`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerifierOptions {
    /// Swap the key's `02`/`03` parity prefix before embedding it.
    ///
    /// Compatibility switch for a deployed program build that expected the
    /// opposite parity. Off by default, and a correctly built program rejects
    /// signatures embedded with it on. Remove once no such deployment remains.
    pub flip_key_parity: bool,
}

/// The offsets record of a verifier instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Secp256r1Offsets {
    /// Number of signatures the instruction claims to carry.
    pub signature_count: u8,
    /// Offset of the signature.
    pub signature_offset: u16,
    /// Instruction holding the signature.
    pub signature_instruction_index: u16,
    /// Offset of the compressed public key.
    pub public_key_offset: u16,
    /// Instruction holding the public key.
    pub public_key_instruction_index: u16,
    /// Offset of the message.
    pub message_data_offset: u16,
    /// Length of the message.
    pub message_data_size: u16,
    /// Instruction holding the message.
    pub message_instruction_index: u16,
}

impl Secp256r1Offsets {
    /// The record for a self-contained instruction over `message_length`
    /// bytes.
    pub fn self_contained(message_length: u16) -> Self {
        Self {
            signature_count: SIGNATURE_COUNT,
            signature_offset: SIGNATURE_OFFSET,
            signature_instruction_index: CURRENT_INSTRUCTION,
            public_key_offset: PUBLIC_KEY_OFFSET,
            public_key_instruction_index: CURRENT_INSTRUCTION,
            message_data_offset: MESSAGE_OFFSET,
            message_data_size: message_length,
            message_instruction_index: CURRENT_INSTRUCTION,
        }
    }

    /// Read the header of a verifier instruction back out of its data.
    ///
    /// Only the first offsets record is read.
    pub fn parse(data: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = AccountReader::new(data);
        let signature_count = reader.read_u8("signature_count")?;
        reader.skip(1, "padding")?;
        let mut read_u16 =
            |field: &'static str| reader.read_array::<2>(field).map(u16::from_le_bytes);

        Ok(Self {
            signature_count,
            signature_offset: read_u16("signature_offset")?,
            signature_instruction_index: read_u16("signature_instruction_index")?,
            public_key_offset: read_u16("public_key_offset")?,
            public_key_instruction_index: read_u16("public_key_instruction_index")?,
            message_data_offset: read_u16("message_data_offset")?,
            message_data_size: read_u16("message_data_size")?,
            message_instruction_index: read_u16("message_instruction_index")?,
        })
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.signature_count);
        out.push(0);
        for field in [
            self.signature_offset,
            self.signature_instruction_index,
            self.public_key_offset,
            self.public_key_instruction_index,
            self.message_data_offset,
            self.message_data_size,
            self.message_instruction_index,
        ] {
            out.extend_from_slice(&field.to_le_bytes());
        }
    }
}

/// Build the verifier instruction data for an already validated key and
/// signature.
pub fn verifier_instruction_data(
    public_key: &CompressedPublicKey,
    signature: &RawSignature,
    message: &[u8],
    options: VerifierOptions,
) -> Result<Vec<u8>, BridgeError> {
    let message_length =
        u16::try_from(message.len()).map_err(|_| BridgeError::MessageTooLong {
            length: message.len(),
            max: MAX_MESSAGE_LENGTH,
        })?;

    let public_key = if options.flip_key_parity {
        public_key.with_flipped_parity()
    } else {
        *public_key
    };

    let mut data = Vec::with_capacity(MESSAGE_OFFSET as usize + message.len());
    Secp256r1Offsets::self_contained(message_length).encode(&mut data);
    data.extend_from_slice(public_key.as_bytes());
    data.extend_from_slice(signature.as_bytes());
    data.extend_from_slice(message);
    Ok(data)
}

/// Build the verifier instruction from raw bytes.
///
/// `public_key` must be a 33-byte compressed key with a `02` or `03` prefix
/// and `signature` a 64-byte `r ‖ s` pair; anything else is rejected rather
/// than embedded for the verifier to fail on.
///
/// # Errors
///
/// [`FormatError::InvalidKeyFormat`](moon_credentials::FormatError::InvalidKeyFormat),
/// [`FormatError::InvalidKeyPrefix`](moon_credentials::FormatError::InvalidKeyPrefix),
/// [`FormatError::InvalidSignatureFormat`](moon_credentials::FormatError::InvalidSignatureFormat)
/// and [`BridgeError::MessageTooLong`].
pub fn verifier_instruction(
    public_key: &[u8],
    signature: &[u8],
    message: &[u8],
    options: VerifierOptions,
) -> Result<Instruction, BridgeError> {
    let public_key = CompressedPublicKey::try_from(public_key)?;
    let signature = RawSignature::try_from(signature)?;
    let data = verifier_instruction_data(&public_key, &signature, message, options)?;
    Ok(Instruction {
        program_id: SECP256R1_PROGRAM_ID,
        accounts: Vec::new(),
        data,
    })
}
