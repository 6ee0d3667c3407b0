//! Instruction and account discriminators published by the wallet program.
//!
//! These are contract data: they must equal the program's values byte for
//! byte and are never computed at runtime.

pub const INITIALIZE_MULTISIG: [u8; 8] = [220, 130, 117, 21, 27, 227, 78, 213];
pub const CONFIGURE_WEBAUTHN: [u8; 8] = [40, 149, 116, 224, 148, 48, 159, 54];
pub const ADD_GUARDIAN: [u8; 8] = [167, 189, 170, 27, 74, 240, 201, 241];
pub const CREATE_PROPOSAL: [u8; 8] = [132, 116, 68, 174, 216, 160, 198, 22];
pub const APPROVE_PROPOSAL: [u8; 8] = [136, 108, 102, 85, 98, 114, 7, 147];
pub const EXECUTE_PROPOSAL: [u8; 8] = [186, 60, 116, 133, 108, 128, 111, 28];
pub const VERIFY_AND_EXECUTE: [u8; 8] = [37, 165, 237, 189, 225, 188, 58, 41];

/// Leading bytes of every `Proposal` account.
pub const PROPOSAL_ACCOUNT: [u8; 8] = [26, 94, 189, 187, 116, 136, 53, 33];
