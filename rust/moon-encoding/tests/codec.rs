//! Instruction and account codec tests against hand-laid byte fixtures.

use moon_encoding::instruction::{
    ApproveProposal, CreateProposal, GuardianId, ProgramInstruction, ProposalId,
};
use moon_encoding::proposal::{ProposalStatus, decode_proposal_account, decode_proposal_body};
use moon_encoding::{DecodeError, Pubkey, discriminator};
use pretty_assertions::assert_eq;

#[test]
fn a_transfer_proposal_encodes_to_95_bytes() {
    let destination: Pubkey = "5tFJskbgqrPxb992SUf6JzcQWJGbJuvsta2pRnZBcygN"
        .parse()
        .unwrap();
    let data = CreateProposal {
        proposal_id: ProposalId(1),
        description: "Transfer SOL".into(),
        proposer_guardian_id: GuardianId(1),
        action: "transfer".into(),
        amount: Some(500_000_000),
        destination: Some(destination),
        token_mint: None,
    }
    .to_bytes()
    .unwrap();

    assert_eq!(data.len(), 95);
    assert_eq!(data[..8], discriminator::CREATE_PROPOSAL);
    assert_eq!(data[94], 0x00);
    assert_eq!(&data[62..94], destination.as_ref());
}

#[test]
fn an_approval_round_trips_through_a_program_shaped_account() {
    // What the program writes after creation and one approval
    let mut account = discriminator::PROPOSAL_ACCOUNT.to_vec();
    account.extend(Pubkey::new_from_array([7; 32]).as_ref());
    account.extend(9u64.to_le_bytes());
    account.extend(4u32.to_le_bytes());
    account.extend(b"rent");
    account.extend(8u32.to_le_bytes());
    account.extend(b"transfer");
    account.extend([0, 1, 2]);
    account.extend(1_700_000_123i64.to_le_bytes());
    account.extend([5; 32]);

    let decoded = decode_proposal_account(&account).unwrap();
    assert_eq!(decoded.multisig, Pubkey::new_from_array([7; 32]));
    assert_eq!(decoded.body.status, ProposalStatus::Pending);
    assert_eq!(decoded.body.signatures_count, 1);

    let approval = ApproveProposal {
        proposal_id: decoded.body.proposal_id,
        guardian_id: GuardianId(2),
        timestamp: 1_700_000_200,
        message: "approve:proposal_9,guardian_2,timestamp:1700000200,pubkey:abcdef012345".into(),
    };
    assert_eq!(approval.to_bytes().unwrap()[8..16], 9u64.to_le_bytes());
}

#[test]
fn truncated_accounts_never_read_out_of_bounds() {
    let mut account = discriminator::PROPOSAL_ACCOUNT.to_vec();
    account.extend([0u8; 32]);
    account.extend(1u64.to_le_bytes());
    account.extend([0x10, 0x00]);

    assert_eq!(
        decode_proposal_body(&account),
        Err(DecodeError::CorruptAccountData {
            field: "description",
            needed: 4,
            available: 2,
        })
    );

    let mut account = discriminator::PROPOSAL_ACCOUNT.to_vec();
    account.extend([0u8; 32]);
    account.extend(1u64.to_le_bytes());
    account.extend(100u32.to_le_bytes());
    account.extend(b"short");
    assert_eq!(
        decode_proposal_body(&account),
        Err(DecodeError::CorruptAccountData {
            field: "description",
            needed: 100,
            available: 5,
        })
    );
}

#[test]
fn a_guardian_record_is_not_mistaken_for_a_proposal() {
    // Same multisig at offset 8, but tagged as a Guardian account
    let mut account = vec![57, 234, 122, 214, 12, 246, 9, 45];
    account.extend(Pubkey::new_from_array([7; 32]).as_ref());
    account.extend(2u64.to_le_bytes());
    account.extend([0u8; 64]);

    assert!(matches!(
        decode_proposal_account(&account),
        Err(DecodeError::UnexpectedAccountType { kind: "Proposal", .. })
    ));
}
