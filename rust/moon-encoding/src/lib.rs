//! Anchor-style instruction and account codecs for the Moon multisig wallet
//! program.
//!
//! The program has no self-describing wire format. Instruction data is an
//! 8-byte discriminator followed by Borsh-serialized arguments, and accounts
//! are laid out the same way. This crate holds both directions:
//!
//! - [`instruction`]: one payload type per program instruction
//! - [`reader`] and [`proposal`]: bounds-checked decoding of proposal accounts
//! - [`pubkey`]: well-known program and sysvar ids
//!
//! # Example
//!
//! ```rust
//! use moon_encoding::instruction::{ExecuteProposal, ProgramInstruction, ProposalId};
//!
//! let data = ExecuteProposal { proposal_id: ProposalId(3) }.to_bytes()?;
//! assert_eq!(data.len(), 16);
//! assert_eq!(&data[8..], &3u64.to_le_bytes());
//! # Ok::<(), moon_encoding::EncodeError>(())
//! ```

mod error;
pub use error::*;

pub mod discriminator;
pub mod instruction;
pub mod proposal;
pub mod pubkey;
pub mod reader;

pub use solana_pubkey::Pubkey;
