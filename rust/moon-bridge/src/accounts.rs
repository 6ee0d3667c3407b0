//! Program-derived addresses and the account list of each wallet
//! instruction.
//!
//! Wallet state lives in accounts derived from the multisig address:
//!
//! ```text
//! guardian   ["guardian",  multisig, guardian_id LE8]
//! proposal   ["proposal",  multisig, proposal_id LE8]
//! signature  ["signature", proposal, guardian_id LE8]
//! ```
//!
//! The order of each account list is part of the program's interface.

use crate::BridgeError;
use moon_encoding::instruction::{
    AddGuardian, ApproveProposal, ConfigureCredential, CreateProposal, ExecuteProposal,
    GuardianId, InitializeWallet, ProgramInstruction, ProposalId, VerifyAndExecute,
};
use moon_encoding::pubkey::{SYSTEM_PROGRAM_ID, SYSVAR_CLOCK_ID, SYSVAR_INSTRUCTIONS_ID};
use moon_encoding::Pubkey;
use solana_instruction::{AccountMeta, Instruction};

const GUARDIAN_SEED: &[u8] = b"guardian";
const PROPOSAL_SEED: &[u8] = b"proposal";
const SIGNATURE_SEED: &[u8] = b"signature";

/// Builds the instructions of one multisig wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalletAccounts {
    program_id: Pubkey,
    multisig: Pubkey,
}

impl WalletAccounts {
    /// Accounts of the wallet at `multisig`, owned by `program_id`.
    pub fn new(program_id: Pubkey, multisig: Pubkey) -> Self {
        Self {
            program_id,
            multisig,
        }
    }

    /// The wallet program.
    pub fn program_id(&self) -> &Pubkey {
        &self.program_id
    }

    /// The multisig account.
    pub fn multisig(&self) -> &Pubkey {
        &self.multisig
    }

    /// Address of a guardian's record.
    pub fn guardian_address(&self, guardian_id: GuardianId) -> Result<Pubkey, BridgeError> {
        self.derive(
            &[GUARDIAN_SEED, self.multisig.as_ref(), &guardian_id.to_seed()],
            "guardian",
        )
    }

    /// Address of a proposal.
    pub fn proposal_address(&self, proposal_id: ProposalId) -> Result<Pubkey, BridgeError> {
        self.derive(
            &[PROPOSAL_SEED, self.multisig.as_ref(), &proposal_id.to_seed()],
            "proposal",
        )
    }

    /// Address of the record of one guardian's approval of one proposal.
    pub fn signature_address(
        &self,
        proposal: &Pubkey,
        guardian_id: GuardianId,
    ) -> Result<Pubkey, BridgeError> {
        self.derive(
            &[SIGNATURE_SEED, proposal.as_ref(), &guardian_id.to_seed()],
            "signature",
        )
    }

    fn derive(&self, seeds: &[&[u8]], kind: &'static str) -> Result<Pubkey, BridgeError> {
        Pubkey::try_find_program_address(seeds, &self.program_id)
            .map(|(address, _)| address)
            .ok_or(BridgeError::AddressDerivation { kind })
    }

    fn instruction(
        &self,
        accounts: Vec<AccountMeta>,
        args: &impl ProgramInstruction,
    ) -> Result<Instruction, BridgeError> {
        Ok(Instruction::new_with_bytes(
            self.program_id,
            &args.to_bytes()?,
            accounts,
        ))
    }

    /// `initialize_multisig`
    pub fn initialize(
        &self,
        args: &InitializeWallet,
        fee_payer: Pubkey,
    ) -> Result<Instruction, BridgeError> {
        self.instruction(
            vec![
                AccountMeta::new(self.multisig, false),
                AccountMeta::new(fee_payer, true),
                AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
            ],
            args,
        )
    }

    /// `configure_webauthn`
    pub fn configure_credential(
        &self,
        args: &ConfigureCredential,
        owner: Pubkey,
    ) -> Result<Instruction, BridgeError> {
        self.instruction(
            vec![
                AccountMeta::new(self.multisig, false),
                AccountMeta::new_readonly(owner, true),
            ],
            args,
        )
    }

    /// `add_guardian`, recording the guardian under `guardian_id`.
    ///
    /// The guardian's own key signs and pays for its record.
    pub fn add_guardian(
        &self,
        args: &AddGuardian,
        guardian_id: GuardianId,
    ) -> Result<Instruction, BridgeError> {
        self.instruction(
            vec![
                AccountMeta::new(self.multisig, false),
                AccountMeta::new(self.guardian_address(guardian_id)?, false),
                AccountMeta::new(args.guardian_pubkey, true),
                AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
            ],
            args,
        )
    }

    /// `create_proposal`
    pub fn create_proposal(
        &self,
        args: &CreateProposal,
        payer: Pubkey,
    ) -> Result<Instruction, BridgeError> {
        self.instruction(
            vec![
                AccountMeta::new(self.multisig, false),
                AccountMeta::new(self.proposal_address(args.proposal_id)?, false),
                AccountMeta::new_readonly(self.guardian_address(args.proposer_guardian_id)?, false),
                AccountMeta::new(payer, true),
                AccountMeta::new_readonly(SYSVAR_CLOCK_ID, false),
                AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
            ],
            args,
        )
    }

    /// `approve_proposal`. Must directly follow its verifier instruction.
    pub fn approve_proposal(
        &self,
        args: &ApproveProposal,
        payer: Pubkey,
    ) -> Result<Instruction, BridgeError> {
        let proposal = self.proposal_address(args.proposal_id)?;
        self.instruction(
            vec![
                AccountMeta::new(self.multisig, false),
                AccountMeta::new(proposal, false),
                AccountMeta::new(self.signature_address(&proposal, args.guardian_id)?, false),
                AccountMeta::new_readonly(self.guardian_address(args.guardian_id)?, false),
                AccountMeta::new(payer, true),
                AccountMeta::new_readonly(SYSVAR_INSTRUCTIONS_ID, false),
                AccountMeta::new_readonly(SYSVAR_CLOCK_ID, false),
                AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
            ],
            args,
        )
    }

    /// `execute_proposal`. Transfers need the `destination` they pay out to.
    pub fn execute_proposal(
        &self,
        args: &ExecuteProposal,
        payer: Pubkey,
        destination: Option<Pubkey>,
    ) -> Result<Instruction, BridgeError> {
        let mut accounts = vec![
            AccountMeta::new(self.multisig, false),
            AccountMeta::new(self.proposal_address(args.proposal_id)?, false),
            AccountMeta::new(payer, true),
        ];
        accounts.extend(destination.map(|destination| AccountMeta::new(destination, false)));
        accounts.push(AccountMeta::new_readonly(SYSVAR_CLOCK_ID, false));
        accounts.push(AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false));

        self.instruction(accounts, args)
    }

    /// `verify_and_execute`. Must directly follow its verifier instruction.
    pub fn verify_and_execute(
        &self,
        args: &VerifyAndExecute,
        guardian_id: GuardianId,
        payer: Pubkey,
        destination: Pubkey,
    ) -> Result<Instruction, BridgeError> {
        self.instruction(
            vec![
                AccountMeta::new(self.multisig, false),
                AccountMeta::new_readonly(self.guardian_address(guardian_id)?, false),
                AccountMeta::new_readonly(SYSVAR_CLOCK_ID, false),
                AccountMeta::new_readonly(SYSVAR_INSTRUCTIONS_ID, false),
                AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
                AccountMeta::new(payer, true),
                AccountMeta::new(destination, false),
            ],
            args,
        )
    }
}
