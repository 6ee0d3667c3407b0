//! Compiling and signing wallet transactions.
//!
//! Message layout and signing come from `solana-message` and
//! `solana-transaction`. The checks here turn the conditions those crates
//! panic or fail opaquely on into [`BridgeError`]s first.

use crate::BridgeError;
use moon_encoding::Pubkey;
use solana_hash::Hash;
use solana_instruction::Instruction;
use solana_keypair::Keypair;
use solana_message::Message;
use solana_signature::Signature;
use solana_signer::Signer;
use solana_transaction::Transaction;
use std::collections::BTreeSet;

/// Most distinct accounts a message can index with a `u8`.
pub const MAX_ACCOUNTS: usize = u8::MAX as usize + 1;

/// Compile and sign `instructions`.
///
/// `fee_payer` pays and signs first. Every other signer the instructions
/// require must be among `signers`; keys nothing requires are ignored.
///
/// # Errors
///
/// [`BridgeError::TooManyAccounts`] when the instructions reference more
/// than [`MAX_ACCOUNTS`] distinct addresses, [`BridgeError::MissingSigner`]
/// for the first required signer without a key.
pub fn build_transaction(
    fee_payer: &Keypair,
    signers: &[&Keypair],
    instructions: &[Instruction],
    recent_blockhash: Hash,
) -> Result<Transaction, BridgeError> {
    let payer = fee_payer.pubkey();

    let count = distinct_accounts(&payer, instructions);
    if count > MAX_ACCOUNTS {
        return Err(BridgeError::TooManyAccounts {
            count,
            max: MAX_ACCOUNTS,
        });
    }

    let message = Message::new_with_blockhash(instructions, Some(&payer), &recent_blockhash);
    let required = &message.account_keys[..message.header.num_required_signatures as usize];

    let mut keys: Vec<&Keypair> = Vec::with_capacity(required.len());
    for address in required {
        let key = std::iter::once(fee_payer)
            .chain(signers.iter().copied())
            .find(|key| key.pubkey() == *address)
            .ok_or(BridgeError::MissingSigner(*address))?;
        keys.push(key);
    }

    let mut transaction = Transaction::new_unsigned(message);
    transaction.try_sign(keys.as_slice(), recent_blockhash)?;
    Ok(transaction)
}

/// The fee payer's signature, which identifies the transaction.
pub fn transaction_id(transaction: &Transaction) -> Option<Signature> {
    transaction.signatures.first().copied()
}

fn distinct_accounts(fee_payer: &Pubkey, instructions: &[Instruction]) -> usize {
    let mut addresses = BTreeSet::from([*fee_payer]);
    for instruction in instructions {
        addresses.insert(instruction.program_id);
        addresses.extend(instruction.accounts.iter().map(|meta| meta.pubkey));
    }
    addresses.len()
}
