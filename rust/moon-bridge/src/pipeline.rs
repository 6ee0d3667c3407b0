//! From a WebAuthn assertion to the instruction pair the wallet program
//! accepts, and from there to a confirmed transaction.

use crate::BridgeError;
use crate::accounts::WalletAccounts;
use crate::ledger::{ConfirmPolicy, Ledger, Submission, submit_and_confirm};
use crate::secp256r1::{VerifierOptions, verifier_instruction_data};
use crate::transaction::build_transaction;
use moon_credentials::key::PublicKey;
use moon_credentials::signature::is_low_s;
use moon_credentials::webauthn::WebAuthnAssertion;
use moon_encoding::Pubkey;
use moon_encoding::instruction::{ApproveProposal, CreateProposal, GuardianId, VerifyAndExecute};
use moon_encoding::pubkey::SECP256R1_PROGRAM_ID;
use solana_instruction::Instruction;
use solana_keypair::Keypair;

/// Pairs passkey assertions with wallet program instructions.
///
/// Every method that takes an assertion returns the verifier instruction
/// first and the program instruction second. The program looks for the
/// verifier immediately before itself, so the pair must be submitted in
/// that order and without anything in between.
#[derive(Debug, Clone, Copy)]
pub struct SignatureBridge {
    wallet: WalletAccounts,
    options: VerifierOptions,
}

impl SignatureBridge {
    /// A bridge for `wallet` with default verifier options.
    pub fn new(wallet: WalletAccounts) -> Self {
        Self {
            wallet,
            options: VerifierOptions::default(),
        }
    }

    /// Use `options` when building verifier instructions.
    pub fn with_options(mut self, options: VerifierOptions) -> Self {
        self.options = options;
        self
    }

    /// The wallet this bridge builds for.
    pub fn wallet(&self) -> &WalletAccounts {
        &self.wallet
    }

    /// The secp256r1 verifier instruction for `assertion`, signed by
    /// `public_key`.
    ///
    /// The signed message is exactly `authenticatorData ‖
    /// SHA-256(clientDataJSON)`; the signature is converted from DER and
    /// Low-S normalized.
    pub fn verifier_instruction(
        &self,
        assertion: &WebAuthnAssertion,
        public_key: &PublicKey,
    ) -> Result<Instruction, BridgeError> {
        let signature = assertion.normalized_signature()?;
        let message = assertion.verification_data();
        let public_key = public_key.to_compressed();

        if self.options.flip_key_parity {
            tracing::warn!("Embedding secp256r1 key with flipped parity");
        }
        let data = verifier_instruction_data(&public_key, &signature, &message, self.options)?;
        tracing::debug!(
            der_len = assertion.signature.len(),
            message_len = message.len(),
            data_len = data.len(),
            low_s = is_low_s(&signature),
            "Built secp256r1 verifier instruction"
        );

        Ok(Instruction {
            program_id: SECP256R1_PROGRAM_ID,
            accounts: Vec::new(),
            data,
        })
    }

    /// Verifier plus `create_proposal`, for a proposer who signs with a
    /// passkey.
    pub fn create_proposal(
        &self,
        assertion: &WebAuthnAssertion,
        public_key: &PublicKey,
        args: &CreateProposal,
        payer: Pubkey,
    ) -> Result<[Instruction; 2], BridgeError> {
        Ok([
            self.verifier_instruction(assertion, public_key)?,
            self.wallet.create_proposal(args, payer)?,
        ])
    }

    /// Verifier plus `approve_proposal`.
    pub fn approve(
        &self,
        assertion: &WebAuthnAssertion,
        public_key: &PublicKey,
        args: &ApproveProposal,
        payer: Pubkey,
    ) -> Result<[Instruction; 2], BridgeError> {
        Ok([
            self.verifier_instruction(assertion, public_key)?,
            self.wallet.approve_proposal(args, payer)?,
        ])
    }

    /// Verifier plus `verify_and_execute`.
    pub fn verify_and_execute(
        &self,
        assertion: &WebAuthnAssertion,
        public_key: &PublicKey,
        args: &VerifyAndExecute,
        guardian_id: GuardianId,
        payer: Pubkey,
        destination: Pubkey,
    ) -> Result<[Instruction; 2], BridgeError> {
        Ok([
            self.verifier_instruction(assertion, public_key)?,
            self.wallet
                .verify_and_execute(args, guardian_id, payer, destination)?,
        ])
    }
}

/// Sign `instructions` on a fresh block hash and wait for the outcome.
///
/// `fee_payer` pays and signs; `signers` covers any other signer the
/// instructions name.
pub async fn sign_and_submit(
    ledger: &dyn Ledger,
    fee_payer: &Keypair,
    signers: &[&Keypair],
    instructions: &[Instruction],
    policy: ConfirmPolicy,
) -> Result<Submission, BridgeError> {
    let blockhash = ledger.latest_blockhash().await?;
    let transaction = build_transaction(fee_payer, signers, instructions, blockhash)?;
    tracing::debug!(
        instructions = instructions.len(),
        %blockhash,
        "Submitting transaction"
    );
    Ok(submit_and_confirm(ledger, &transaction, policy).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::tests::ScriptedLedger;
    use crate::ledger::{Confirmation, TransactionStatus};
    use crate::secp256r1::{MESSAGE_OFFSET, Secp256r1Offsets};
    use moon_credentials::signature::SECP256R1_HALF_ORDER;
    use moon_credentials::webauthn::verification_data;
    use moon_encoding::discriminator;
    use moon_encoding::instruction::ProposalId;
    use moon_encoding::pubkey::MOON_WALLET_PROGRAM_ID;
    use p256::ecdsa::signature::{Signer, Verifier};
    use p256::ecdsa::{Signature, SigningKey as P256SigningKey};
    use pretty_assertions::assert_eq;
    use solana_hash::Hash;
    use solana_signer::Signer as _;
    use std::time::Duration;

    const AUTHENTICATOR_DATA: [u8; 37] = [0x49; 37];
    const CLIENT_DATA: &[u8] =
        br#"{"type":"webauthn.get","challenge":"AAAA","origin":"https://moon.example"}"#;

    fn bridge() -> SignatureBridge {
        SignatureBridge::new(WalletAccounts::new(MOON_WALLET_PROGRAM_ID, Pubkey::new_from_array([8; 32])))
    }

    fn guardian() -> (P256SigningKey, PublicKey) {
        let key = P256SigningKey::from_bytes(&[31u8; 32].into()).unwrap();
        let point = key.verifying_key().to_encoded_point(false);
        let public_key = PublicKey::try_from(point.as_bytes()).unwrap();
        (key, public_key)
    }

    /// Sign like an authenticator, optionally forcing a high `s`.
    fn assertion(key: &P256SigningKey, high_s: bool) -> WebAuthnAssertion {
        let signature: Signature = key.sign(&verification_data(&AUTHENTICATOR_DATA, CLIENT_DATA));
        let signature = signature.normalize_s().unwrap_or(signature);
        let signature = if high_s {
            let (r, s) = signature.split_scalars();
            Signature::from_scalars(r, -*s).unwrap()
        } else {
            signature
        };
        WebAuthnAssertion::new(
            signature.to_der().as_bytes().to_vec(),
            AUTHENTICATOR_DATA.to_vec(),
            CLIENT_DATA.to_vec(),
        )
    }

    fn approval() -> ApproveProposal {
        ApproveProposal {
            proposal_id: ProposalId(4),
            guardian_id: GuardianId(2),
            timestamp: 1_700_000_000,
            message: "approve:proposal_4,guardian_2,timestamp:1700000000,pubkey:000000000000".into(),
        }
    }

    #[test]
    fn the_verifier_precedes_the_program_instruction() -> anyhow::Result<()> {
        let (key, public_key) = guardian();
        let [verifier, program] = bridge().approve(
            &assertion(&key, false),
            &public_key,
            &approval(),
            Pubkey::new_from_array([1; 32]),
        )?;

        assert_eq!(verifier.program_id, SECP256R1_PROGRAM_ID);
        assert_eq!(program.program_id, MOON_WALLET_PROGRAM_ID);
        assert_eq!(program.data[..8], discriminator::APPROVE_PROPOSAL);
        Ok(())
    }

    #[test]
    fn proposals_can_be_created_with_a_passkey() -> anyhow::Result<()> {
        let (key, public_key) = guardian();
        let payer = Pubkey::new_from_array([1; 32]);
        let args = CreateProposal {
            proposal_id: ProposalId(5),
            description: "rent".into(),
            proposer_guardian_id: GuardianId(2),
            action: "transfer".into(),
            amount: Some(1_000),
            destination: Some(Pubkey::new_from_array([3; 32])),
            token_mint: None,
        };
        let [verifier, program] =
            bridge().create_proposal(&assertion(&key, true), &public_key, &args, payer)?;

        assert_eq!(verifier.program_id, SECP256R1_PROGRAM_ID);
        let signature = Signature::from_slice(&verifier.data[49..113])?;
        assert!(signature.s().to_bytes().as_slice() <= SECP256R1_HALF_ORDER.as_slice());

        assert_eq!(program, bridge().wallet().create_proposal(&args, payer)?);
        assert_eq!(program.data[..8], discriminator::CREATE_PROPOSAL);
        Ok(())
    }

    #[test]
    fn the_embedded_signature_verifies_over_the_embedded_message() -> anyhow::Result<()> {
        let (key, public_key) = guardian();
        for high_s in [false, true] {
            let verifier = bridge().verifier_instruction(&assertion(&key, high_s), &public_key)?;
            let offsets = Secp256r1Offsets::parse(&verifier.data)?;
            let data = &verifier.data;

            let message = &data[MESSAGE_OFFSET as usize..];
            assert_eq!(message, verification_data(&AUTHENTICATOR_DATA, CLIENT_DATA));
            assert_eq!(offsets.message_data_size as usize, AUTHENTICATOR_DATA.len() + 32);

            let embedded_key = p256::ecdsa::VerifyingKey::from_sec1_bytes(&data[16..49])?;
            let signature = Signature::from_slice(&data[49..113])?;
            assert!(signature.s().to_bytes().as_slice() <= SECP256R1_HALF_ORDER.as_slice());
            embedded_key.verify(message, &signature)?;
        }
        Ok(())
    }

    #[test]
    fn malformed_signatures_stop_the_pipeline() {
        let (key, public_key) = guardian();
        let mut broken = assertion(&key, false);
        broken.signature[0] = 0x31;
        assert!(matches!(
            bridge().verifier_instruction(&broken, &public_key),
            Err(BridgeError::Format(_))
        ));
    }

    #[test]
    fn flipped_parity_changes_only_the_key_prefix() -> anyhow::Result<()> {
        let (key, public_key) = guardian();
        let assertion = assertion(&key, false);
        let plain = bridge().verifier_instruction(&assertion, &public_key)?;
        let flipped = bridge()
            .with_options(VerifierOptions {
                flip_key_parity: true,
            })
            .verifier_instruction(&assertion, &public_key)?;

        assert_eq!(plain.data[16] ^ flipped.data[16], 0x01);
        assert_eq!(plain.data[17..], flipped.data[17..]);
        Ok(())
    }

    #[tokio::test]
    async fn it_submits_the_pair_in_order() -> anyhow::Result<()> {
        let (key, public_key) = guardian();
        let payer = Keypair::new_from_array([5; 32]);
        let payer_address = payer.pubkey();
        let instructions =
            bridge().approve(&assertion(&key, false), &public_key, &approval(), payer_address)?;

        let ledger = ScriptedLedger::with_statuses([Ok(TransactionStatus::Succeeded)]);
        let submission = sign_and_submit(
            &ledger,
            &payer,
            &[],
            &instructions,
            ConfirmPolicy {
                timeout: Duration::from_millis(50),
                poll_interval: Duration::from_millis(1),
            },
        )
        .await?;
        assert_eq!(submission.confirmation, Confirmation::Success);

        let sent = ledger.sent.lock().unwrap();
        let message = &sent[0].message;
        let programs: Vec<Pubkey> = message
            .instructions
            .iter()
            .map(|instruction| message.account_keys[instruction.program_id_index as usize])
            .collect();
        assert_eq!(programs, vec![SECP256R1_PROGRAM_ID, MOON_WALLET_PROGRAM_ID]);
        assert_eq!(message.recent_blockhash, Hash::new_from_array([0x42; 32]));
        Ok(())
    }
}
